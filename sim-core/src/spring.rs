use glam::Vec2;

/// A damped spring-mass point anchored to a fixed rest position.
///
/// Mass and timestep are implicitly `1`. Forces are accumulated with
/// [`SpringNode::apply_force`] and consumed by [`SpringNode::integrate`],
/// which leaves the accumulator at zero.
///
/// State is kept as an offset from the anchor, so small corrections are not
/// lost to f32 rounding when the anchor sits far from the origin.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct SpringNode {
    rest_position: Vec2,
    displacement: Vec2,
    pub velocity: Vec2,
    force: Vec2,
    stiffness: f32,
    damping: f32,
}

impl SpringNode {
    /// Creates a node at rest on its anchor.
    pub fn new(rest_position: Vec2, stiffness: f32, damping: f32) -> Self {
        Self {
            rest_position,
            displacement: Vec2::ZERO,
            velocity: Vec2::ZERO,
            force: Vec2::ZERO,
            stiffness,
            damping,
        }
    }

    #[inline]
    pub fn rest_position(&self) -> Vec2 {
        self.rest_position
    }

    /// Current position of the tip.
    #[inline]
    pub fn position(&self) -> Vec2 {
        self.rest_position + self.displacement
    }

    /// Moves the tip to `position` without touching its velocity.
    #[inline]
    pub fn set_position(&mut self, position: Vec2) {
        self.displacement = position - self.rest_position;
    }

    /// Force accumulated since the last integration step.
    #[inline]
    pub fn force(&self) -> Vec2 {
        self.force
    }

    #[inline]
    pub fn stiffness(&self) -> f32 {
        self.stiffness
    }

    #[inline]
    pub fn damping(&self) -> f32 {
        self.damping
    }

    /// Offset of the current position from the anchor.
    #[inline]
    pub fn displacement(&self) -> Vec2 {
        self.displacement
    }

    #[inline]
    pub fn apply_force(&mut self, force: Vec2) {
        self.force += force;
    }

    /// Advances the node by one tick.
    ///
    /// The spring pull is added to the accumulated force, the sum is added to
    /// the velocity and the result is damped as a whole, so damping also
    /// scales this tick's force. No stability guard is applied.
    pub fn integrate(&mut self) {
        let restoring = -self.displacement * self.stiffness;
        self.force += restoring;
        self.velocity = (self.velocity + self.force) * self.damping;
        self.displacement += self.velocity;
        self.force = Vec2::ZERO;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn new_node_sits_on_anchor() {
        let node = SpringNode::new(Vec2::new(3.0, -4.0), 0.2, 0.9);
        assert_eq!(node.position(), node.rest_position());
        assert_eq!(node.velocity, Vec2::ZERO);
        assert_eq!(node.force(), Vec2::ZERO);
        assert_eq!(node.displacement(), Vec2::ZERO);
    }

    #[test]
    fn single_step_from_displaced_position() {
        let mut node = SpringNode::new(Vec2::ZERO, 0.25, 0.9);
        node.set_position(Vec2::new(10.0, 0.0));

        node.integrate();

        // restoring = -2.5, velocity = (0 - 2.5) * 0.9 = -2.25, position = 7.75
        assert!((node.velocity.x + 2.25).abs() < 1e-5, "{:?}", node.velocity);
        assert!((node.position().x - 7.75).abs() < 1e-5, "{:?}", node.position());
        assert_eq!(node.position().y, 0.0);
        assert_eq!(node.force(), Vec2::ZERO);
    }

    #[test]
    fn forces_accumulate_until_integrated() {
        let mut node = SpringNode::new(Vec2::ZERO, 0.1, 0.5);
        node.apply_force(Vec2::new(1.0, 0.0));
        node.apply_force(Vec2::new(0.5, 2.0));
        assert_eq!(node.force(), Vec2::new(1.5, 2.0));

        node.integrate();

        // At rest, so the spring contributes nothing on the first tick.
        assert_eq!(node.velocity, Vec2::new(0.75, 1.0));
        assert_eq!(node.position(), Vec2::new(0.75, 1.0));
        assert_eq!(node.force(), Vec2::ZERO);
    }

    #[test]
    fn free_oscillation_decays_to_rest() {
        let rest = Vec2::new(100.0, 50.0);
        for &(k, d) in &[(0.25, 0.9), (0.05, 0.9), (0.5, 0.5), (0.9, 0.95), (0.01, 0.2)] {
            let mut node = SpringNode::new(rest, k, d);
            node.set_position(rest + Vec2::new(-30.0, 12.0));
            node.velocity = Vec2::new(4.0, -1.0);

            let start = node.displacement().length();
            for _ in 0..5000 {
                node.integrate();
            }
            let end = node.displacement().length();

            assert!(end < 1e-3, "k={k} d={d}: did not settle, |x|={end}");
            assert!(end < start);
            assert!(node.velocity.length() < 1e-3);
        }
    }

    #[test]
    fn slow_decay_far_from_origin_keeps_converging() {
        // Per-tick corrections here are far below one ulp of the anchor.
        let rest = Vec2::new(5000.0, 4000.0);
        let mut node = SpringNode::new(rest, 0.01, 0.2);
        node.set_position(rest + Vec2::new(-30.0, 12.0));

        let mut previous = node.displacement().length();
        for tick in 0..10_000 {
            node.integrate();
            let now = node.displacement().length();
            assert!(now <= previous, "tick {tick}: grew from {previous} to {now}");
            previous = now;
        }
        assert!(previous < 1e-6, "|x| = {previous}");
    }

    #[test]
    fn constant_force_settles_at_offset_equilibrium() {
        // At equilibrium v = 0, so f + k (r - x) = 0, i.e. x = r + f / k.
        let mut node = SpringNode::new(Vec2::ZERO, 0.25, 0.9);
        for _ in 0..5000 {
            node.apply_force(Vec2::new(0.5, 0.0));
            node.integrate();
        }
        assert!((node.position().x - 2.0).abs() < 1e-3, "{:?}", node.position());
    }
}
