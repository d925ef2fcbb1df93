//! Per-frame simulation phases over a set of independent trees.
//!
//! The typical frame looks like:
//! 1. [`wind_phase`] — the frame's wind force is added to every tip.
//! 2. [`integrate_phase`] — every tip takes one spring/damping step.
//! 3. [`render_phase`] — the background is cleared and every tree emits
//!    its draw instructions.
//!
//! Trees share no state, so running each phase over all trees gives the
//! same tip positions and the same draw order as running all three phases
//! tree by tree.

use glam::Vec2;

use crate::{config::RenderConfig, render::DrawSink, tree::Tree};

/// Broadcasts one wind force to every tip of every tree.
///
/// ### Parameters
/// - `trees` - Trees to push; only the tips' force accumulators change.
/// - `wind` - Force for this frame, typically from
///   [`crate::wind::WindField::sample`].
pub fn wind_phase(trees: &mut [Tree], wind: Vec2) {
    for tree in trees.iter_mut() {
        tree.propagate_wind(wind);
    }
}

/// Integrates every tip of every tree once.
///
/// After this phase every tip's accumulated force is back to zero.
pub fn integrate_phase(trees: &mut [Tree]) {
    for tree in trees.iter_mut() {
        tree.step();
    }
}

/// Clears the canvas and renders all trees in insertion order.
///
/// ### Parameters
/// - `trees` - Trees to draw, back to front.
/// - `sink` - Receiver of the draw instructions.
/// - `cfg` - Background gray and stroke settings.
pub fn render_phase<S: DrawSink + ?Sized>(trees: &[Tree], sink: &mut S, cfg: &RenderConfig) {
    sink.clear_background(cfg.background);
    for tree in trees {
        tree.render(sink, cfg);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        config::GrowthConfig,
        render::{CommandBuffer, DrawCommand},
    };
    use rand::{SeedableRng, rngs::StdRng};

    fn forest(seed: u64, count: usize) -> Vec<Tree> {
        let mut rng = StdRng::seed_from_u64(seed);
        (0..count)
            .map(|i| {
                Tree::generate(
                    Vec2::new(40.0 * i as f32, 300.0),
                    Vec2::new(0.0, -1.0),
                    50.0,
                    &GrowthConfig::default(),
                    &mut rng,
                )
                .unwrap()
            })
            .collect()
    }

    #[test]
    fn phases_match_per_tree_updates() {
        let mut phased = forest(1, 4);
        let mut per_tree = phased.clone();
        let wind = Vec2::new(-0.3, 0.0);

        for _ in 0..20 {
            wind_phase(&mut phased, wind);
            integrate_phase(&mut phased);

            for tree in per_tree.iter_mut().rev() {
                tree.propagate_wind(wind);
                tree.step();
            }
        }

        let cfg = RenderConfig::default();
        let mut a = CommandBuffer::new();
        let mut b = CommandBuffer::new();
        render_phase(&phased, &mut a, &cfg);
        render_phase(&per_tree, &mut b, &cfg);
        assert_eq!(a.commands(), b.commands());
    }

    #[test]
    fn integrate_phase_consumes_wind() {
        let mut trees = forest(2, 3);
        wind_phase(&mut trees, Vec2::new(0.5, 0.0));
        assert!(
            trees
                .iter()
                .flat_map(|t| t.branches())
                .all(|b| b.tip().force() == Vec2::new(0.5, 0.0))
        );

        integrate_phase(&mut trees);
        assert!(
            trees
                .iter()
                .flat_map(|t| t.branches())
                .all(|b| b.tip().force() == Vec2::ZERO)
        );
    }

    #[test]
    fn render_phase_clears_first_and_keeps_tree_order() {
        let trees = forest(3, 3);
        let cfg = RenderConfig::default();
        let mut buf = CommandBuffer::new();
        render_phase(&trees, &mut buf, &cfg);

        assert_eq!(buf.commands()[0], DrawCommand::Clear { gray: 255 });
        assert!(
            buf.commands()[1..]
                .iter()
                .all(|c| matches!(c, DrawCommand::Line { .. }))
        );

        // Each tree's root stem starts its block of lines.
        let mut offset = 1;
        for tree in &trees {
            match buf.commands()[offset] {
                DrawCommand::Line { from, .. } => assert_eq!(from, tree.root().origin()),
                other => panic!("unexpected {other:?}"),
            }
            offset += tree.branch_count() + tree.leaves().count();
        }
        assert_eq!(offset, buf.commands().len());
    }
}
