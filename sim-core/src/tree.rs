use glam::Vec2;
use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::{
    config::{GrowthConfig, RenderConfig},
    error::{SimError, SimResult},
    math::rotate_deg,
    render::DrawSink,
    spring::SpringNode,
    types::NodeId,
};

/// Squared displacement below which a leaf mark keeps the branch direction.
const LEAF_MARK_MIN_DISPLACEMENT_SQ: f32 = 1e-8;

/// One segment of a tree: a fixed stem from `origin` to a spring-driven tip.
#[derive(Clone, Debug)]
pub struct Branch {
    origin: Vec2,
    direction: Vec2,
    length: f32,
    depth: u32,
    tip: SpringNode,
    parent: Option<NodeId>,
    children: Vec<NodeId>,
    is_leaf: bool,
}

impl Branch {
    fn new(
        origin: Vec2,
        direction: Vec2,
        length: f32,
        depth: u32,
        parent: Option<NodeId>,
        cfg: &GrowthConfig,
    ) -> Self {
        let tip = SpringNode::new(
            origin + direction * length,
            cfg.stiffness_at(depth),
            cfg.damping,
        );
        Self {
            origin,
            direction,
            length,
            depth,
            tip,
            parent,
            children: Vec::with_capacity(cfg.max_splits as usize),
            is_leaf: depth >= cfg.max_depth,
        }
    }

    #[inline]
    pub fn origin(&self) -> Vec2 {
        self.origin
    }

    #[inline]
    pub fn direction(&self) -> Vec2 {
        self.direction
    }

    #[inline]
    pub fn length(&self) -> f32 {
        self.length
    }

    #[inline]
    pub fn depth(&self) -> u32 {
        self.depth
    }

    #[inline]
    pub fn tip(&self) -> &SpringNode {
        &self.tip
    }

    #[inline]
    pub fn parent(&self) -> Option<NodeId> {
        self.parent
    }

    #[inline]
    pub fn children(&self) -> &[NodeId] {
        &self.children
    }

    #[inline]
    pub fn is_leaf(&self) -> bool {
        self.is_leaf
    }

    /// Direction of the terminal mark drawn on a leaf.
    ///
    /// Points along the tip's displacement, or along the branch itself when
    /// the tip is within a hair of its anchor.
    pub fn leaf_mark_direction(&self) -> Vec2 {
        let displacement = self.tip.displacement();
        if displacement.length_squared() > LEAF_MARK_MIN_DISPLACEMENT_SQ {
            displacement.normalize()
        } else {
            self.direction
        }
    }
}

/// A single rooted tree stored as an arena of [`Branch`]es.
///
/// Branches are stored in depth-first pre-order, so iterating the arena
/// visits every parent before its children.
#[derive(Clone, Debug)]
pub struct Tree {
    nodes: Vec<Branch>,
}

/// Static shape of one branch, as exported by [`Tree::geometry`].
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct BranchGeometry {
    pub parent: Option<NodeId>,
    pub origin: Vec2,
    pub direction: Vec2,
    pub length: f32,
    pub depth: u32,
}

/// Static shape of a whole tree in pre-order.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct TreeGeometry {
    pub branches: Vec<BranchGeometry>,
}

impl Tree {
    pub const ROOT: NodeId = 0;

    /// Grows a tree whose root starts at depth 0.
    ///
    /// See [`Tree::generate_from_depth`].
    pub fn generate<R: Rng + ?Sized>(
        origin: Vec2,
        direction: Vec2,
        length: f32,
        cfg: &GrowthConfig,
        rng: &mut R,
    ) -> SimResult<Self> {
        Self::generate_from_depth(origin, direction, length, 0, cfg, rng)
    }

    /// Grows a tree recursively from a root branch at `depth`.
    ///
    /// Every non-leaf branch draws a split count from
    /// `cfg.min_splits..=cfg.max_splits`, then for each child a rotation in
    /// `±cfg.spread_deg` and a length scale in
    /// `cfg.length_scale_min..=cfg.length_scale_max`. Children start at
    /// their parent's tip rest position. All randomness is drawn here, so
    /// the same `rng` state always yields the same tree.
    ///
    /// ### Errors
    /// - [`SimError::InvalidLength`] if `length` is not finite and positive.
    /// - [`SimError::InvalidDirection`] if `direction` cannot be normalized.
    /// - [`SimError::InvalidConfig`] if `cfg` fails validation.
    pub fn generate_from_depth<R: Rng + ?Sized>(
        origin: Vec2,
        direction: Vec2,
        length: f32,
        depth: u32,
        cfg: &GrowthConfig,
        rng: &mut R,
    ) -> SimResult<Self> {
        cfg.validate()?;
        let direction = check_segment(origin, direction, length)?;

        let mut tree = Self { nodes: Vec::new() };
        tree.grow(None, origin, direction, length, depth, cfg, rng);
        Ok(tree)
    }

    #[allow(clippy::too_many_arguments)]
    fn grow<R: Rng + ?Sized>(
        &mut self,
        parent: Option<NodeId>,
        origin: Vec2,
        direction: Vec2,
        length: f32,
        depth: u32,
        cfg: &GrowthConfig,
        rng: &mut R,
    ) -> NodeId {
        let id = self.nodes.len();
        let branch = Branch::new(origin, direction, length, depth, parent, cfg);
        let tip_rest = branch.tip.rest_position();
        let is_leaf = branch.is_leaf;
        self.nodes.push(branch);

        if !is_leaf {
            let splits = rng.random_range(cfg.min_splits..=cfg.max_splits);
            for _ in 0..splits {
                let angle = rng.random_range(-cfg.spread_deg..=cfg.spread_deg);
                let child_dir = rotate_deg(direction, angle);
                let scale = rng.random_range(cfg.length_scale_min..=cfg.length_scale_max);

                let child = self.grow(
                    Some(id),
                    tip_rest,
                    child_dir,
                    length * scale,
                    depth + 1,
                    cfg,
                    rng,
                );
                self.nodes[id].children.push(child);
            }
        }
        id
    }

    /// Rebuilds a tree from exported geometry without drawing any randomness.
    ///
    /// Entries must be in pre-order: the first entry is the only root and
    /// every other entry names an earlier entry as its parent. Directions
    /// must already be unit length and are used as stored, so exported
    /// trees come back with identical rest positions.
    ///
    /// ### Errors
    /// - [`SimError::EmptyGeometry`] for an empty list.
    /// - [`SimError::InvalidParent`] for a missing, forward or extra root.
    /// - [`SimError::InvalidGeometry`] when a branch hangs off a leaf, skips
    ///   a depth, does not start at its parent's tip, or when a parent ends
    ///   up with a split count outside `cfg`.
    /// - The segment errors of [`Tree::generate`].
    pub fn from_geometry(geometry: &TreeGeometry, cfg: &GrowthConfig) -> SimResult<Self> {
        if geometry.branches.is_empty() {
            return Err(SimError::EmptyGeometry);
        }

        let mut nodes: Vec<Branch> = Vec::with_capacity(geometry.branches.len());
        for (index, g) in geometry.branches.iter().enumerate() {
            let parent_ok = match g.parent {
                None => index == Self::ROOT,
                Some(p) => index != Self::ROOT && p < index,
            };
            if !parent_ok {
                return Err(SimError::InvalidParent {
                    index,
                    parent: g.parent,
                });
            }
            check_segment(g.origin, g.direction, g.length)?;
            if !g.direction.is_normalized() {
                return Err(SimError::InvalidDirection(g.direction));
            }

            if let Some(p) = g.parent {
                let parent = &nodes[p];
                let reason = if parent.is_leaf {
                    Some("parent is a leaf")
                } else if g.depth != parent.depth + 1 {
                    Some("depth is not one below the parent")
                } else if parent.children.len() as u32 >= cfg.max_splits {
                    Some("parent already has the maximum number of children")
                } else {
                    let rest = parent.tip.rest_position();
                    let tolerance = 1e-3 * (1.0 + rest.length());
                    ((g.origin - rest).length() > tolerance)
                        .then_some("origin is not the parent's tip rest position")
                };
                if let Some(reason) = reason {
                    return Err(SimError::InvalidGeometry { index, reason });
                }
            }

            nodes.push(Branch::new(
                g.origin,
                g.direction,
                g.length,
                g.depth,
                g.parent,
                cfg,
            ));
            if let Some(p) = g.parent {
                nodes[p].children.push(index);
            }
        }

        if let Some(index) = nodes
            .iter()
            .position(|b| !b.is_leaf && (b.children.len() as u32) < cfg.min_splits)
        {
            return Err(SimError::InvalidGeometry {
                index,
                reason: "branch above the leaf depth has too few children",
            });
        }
        Ok(Self { nodes })
    }

    /// Exports the static shape of every branch in pre-order.
    pub fn geometry(&self) -> TreeGeometry {
        TreeGeometry {
            branches: self
                .nodes
                .iter()
                .map(|b| BranchGeometry {
                    parent: b.parent,
                    origin: b.origin,
                    direction: b.direction,
                    length: b.length,
                    depth: b.depth,
                })
                .collect(),
        }
    }

    #[inline]
    pub fn root(&self) -> &Branch {
        &self.nodes[Self::ROOT]
    }

    #[inline]
    pub fn branches(&self) -> &[Branch] {
        &self.nodes
    }

    #[inline]
    pub fn branch(&self, id: NodeId) -> &Branch {
        &self.nodes[id]
    }

    #[inline]
    pub fn branch_count(&self) -> usize {
        self.nodes.len()
    }

    pub fn leaves(&self) -> impl Iterator<Item = &Branch> + '_ {
        self.nodes.iter().filter(|b| b.is_leaf)
    }

    /// Deepest branch depth in the tree.
    pub fn max_depth(&self) -> u32 {
        self.nodes.iter().map(|b| b.depth).max().unwrap_or(0)
    }

    /// Adds `force` to every tip, parent before children.
    pub fn propagate_wind(&mut self, force: Vec2) {
        self.propagate_wind_from(Self::ROOT, force);
    }

    fn propagate_wind_from(&mut self, id: NodeId, force: Vec2) {
        self.nodes[id].tip.apply_force(force);
        for i in 0..self.nodes[id].children.len() {
            let child = self.nodes[id].children[i];
            self.propagate_wind_from(child, force);
        }
    }

    /// Integrates every tip once, parent before children.
    pub fn step(&mut self) {
        self.step_from(Self::ROOT);
    }

    fn step_from(&mut self, id: NodeId) {
        self.nodes[id].tip.integrate();
        for i in 0..self.nodes[id].children.len() {
            let child = self.nodes[id].children[i];
            self.step_from(child);
        }
    }

    /// Emits the draw instructions for the whole tree.
    ///
    /// Each branch draws its stem from `origin` to the current tip position,
    /// then its children, then (for leaves) a short mark along the tip's
    /// displacement.
    pub fn render<S: DrawSink + ?Sized>(&self, sink: &mut S, cfg: &RenderConfig) {
        self.render_from(Self::ROOT, sink, cfg);
    }

    fn render_from<S: DrawSink + ?Sized>(&self, id: NodeId, sink: &mut S, cfg: &RenderConfig) {
        let branch = &self.nodes[id];
        let tip = branch.tip.position();
        sink.draw_line(branch.origin, tip, cfg.stroke_at(branch.depth));

        for &child in &branch.children {
            self.render_from(child, sink, cfg);
        }

        if branch.is_leaf {
            let mark = branch.leaf_mark_direction() * cfg.leaf_mark_length;
            sink.draw_line(tip, tip + mark, cfg.leaf_mark_stroke);
        }
    }
}

/// Validates a segment and returns its normalized direction.
fn check_segment(origin: Vec2, direction: Vec2, length: f32) -> SimResult<Vec2> {
    if !origin.is_finite() {
        return Err(SimError::InvalidOrigin(origin));
    }
    if !(length.is_finite() && length > 0.0) {
        return Err(SimError::InvalidLength(length));
    }
    direction
        .try_normalize()
        .ok_or(SimError::InvalidDirection(direction))
}
