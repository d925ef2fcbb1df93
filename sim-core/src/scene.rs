//! Scene setup and the frame cycle.

use glam::Vec2;
use rand::Rng;
use tracing::{debug, trace};

use crate::{
    config::{Config, GrowthConfig, Layout, MAX_ROOTS},
    error::{SimError, SimResult},
    math::from_angle_deg,
    phases,
    render::DrawSink,
    tree::Tree,
    wind::{NoiseSource, PerlinNoise, WindField},
};

/// A set of independent trees swaying in one wind field.
#[derive(Clone, Debug)]
pub struct Scene<N = PerlinNoise> {
    trees: Vec<Tree>,
    wind: WindField<N>,
    config: Config,
    canvas: Vec2,
    frame: u64,
}

impl Scene<PerlinNoise> {
    /// Sets up a scene whose wind drift comes from Perlin noise seeded with
    /// `config.wind.noise_seed`.
    pub fn with_perlin<R: Rng + ?Sized>(
        config: Config,
        canvas: Vec2,
        rng: &mut R,
    ) -> SimResult<Self> {
        let noise = PerlinNoise::new(config.wind.noise_seed);
        Self::setup(config, canvas, rng, noise)
    }
}

impl<N: NoiseSource> Scene<N> {
    /// Seeds the root trees according to `config.scene.layout`.
    ///
    /// ### Parameters
    /// - `config` - Growth, wind, render and layout settings.
    /// - `canvas` - Canvas size in pixels; y grows downwards.
    /// - `rng` - Source of every random draw made while seeding and growing.
    /// - `noise` - Smooth noise driving the wind drift.
    pub fn setup<R: Rng + ?Sized>(
        config: Config,
        canvas: Vec2,
        rng: &mut R,
        noise: N,
    ) -> SimResult<Self> {
        config.validate()?;
        if !(canvas.is_finite() && canvas.min_element() >= 0.0) {
            return Err(SimError::InvalidConfig(format!(
                "canvas size {canvas} must be finite and non-negative"
            )));
        }
        let trees = seed_trees(&config.scene.layout, canvas, &config.growth, rng)?;

        let branches: usize = trees.iter().map(Tree::branch_count).sum();
        debug!(
            trees = trees.len(),
            branches,
            layout = ?config.scene.layout,
            "Seeded scene"
        );

        Ok(Self {
            trees,
            wind: WindField::new(noise, config.wind),
            config,
            canvas,
            frame: 0,
        })
    }

    #[inline]
    pub fn trees(&self) -> &[Tree] {
        &self.trees
    }

    #[inline]
    pub fn config(&self) -> &Config {
        &self.config
    }

    #[inline]
    pub fn canvas(&self) -> Vec2 {
        self.canvas
    }

    #[inline]
    pub fn wind(&self) -> &WindField<N> {
        &self.wind
    }

    /// Number of frames advanced so far.
    #[inline]
    pub fn frame_index(&self) -> u64 {
        self.frame
    }

    /// Simulation time of the current frame.
    #[inline]
    pub fn time(&self) -> f32 {
        self.wind.time_at(self.frame)
    }

    pub fn branch_count(&self) -> usize {
        self.trees.iter().map(Tree::branch_count).sum()
    }

    /// Advances the simulation by one frame without drawing.
    ///
    /// The frame index is incremented first, so the first frame samples the
    /// wind at `time_step`.
    ///
    /// ### Returns
    /// The wind force applied this frame.
    pub fn advance(&mut self) -> Vec2 {
        self.frame += 1;
        let wind = self.wind.sample(self.time());
        trace!(frame = self.frame, wind = wind.x, "Advancing scene");

        phases::wind_phase(&mut self.trees, wind);
        phases::integrate_phase(&mut self.trees);
        wind
    }

    /// Clears the background and draws every tree in insertion order.
    pub fn render<S: DrawSink + ?Sized>(&self, sink: &mut S) {
        phases::render_phase(&self.trees, sink, &self.config.render);
    }

    /// Runs one full frame: wind, integration, then rendering.
    pub fn frame<S: DrawSink + ?Sized>(&mut self, sink: &mut S) -> Vec2 {
        let wind = self.advance();
        self.render(sink);
        wind
    }
}

/// Places and grows the root trees of a layout.
///
/// ### Errors
/// [`SimError::InvalidConfig`] if the layout fails validation or would seed
/// more than [`MAX_ROOTS`] roots on this canvas, plus any error of
/// [`Tree::generate`].
pub fn seed_trees<R: Rng + ?Sized>(
    layout: &Layout,
    canvas: Vec2,
    growth: &GrowthConfig,
    rng: &mut R,
) -> SimResult<Vec<Tree>> {
    layout.validate()?;
    match *layout {
        Layout::Fan {
            count,
            angle_range_deg,
            length_range,
        } => (0..count)
            .map(|_| {
                let origin = Vec2::new(
                    rng.random_range(0.0..=canvas.x),
                    rng.random_range(0.0..=canvas.y),
                );
                let angle = rng.random_range(angle_range_deg[0]..=angle_range_deg[1]);
                let length = rng.random_range(length_range[0]..=length_range[1]);
                Tree::generate(origin, from_angle_deg(angle), length, growth, &mut *rng)
            })
            .collect(),

        Layout::GroundRow {
            start_x,
            spacing,
            angle_deg,
            jitter_deg,
            length_range,
        } => {
            let mut trees = Vec::new();
            for i in 0..=MAX_ROOTS {
                let x = start_x + i as f32 * spacing;
                if x.is_nan() || x >= canvas.x {
                    break;
                }
                if i == MAX_ROOTS {
                    return Err(SimError::InvalidConfig(format!(
                        "ground row from {start_x} every {spacing} seeds more than {MAX_ROOTS} roots across {}",
                        canvas.x
                    )));
                }
                let length = rng.random_range(length_range[0]..=length_range[1]);
                let angle = angle_deg + rng.random_range(-jitter_deg..=jitter_deg);
                trees.push(Tree::generate(
                    Vec2::new(x, canvas.y),
                    from_angle_deg(angle),
                    length,
                    growth,
                    rng,
                )?);
            }
            Ok(trees)
        }
    }
}
