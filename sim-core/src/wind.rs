//! The global wind force.
//!
//! Wind is a single horizontal force shared by every tip in a frame. It is a
//! coherent-noise drift plus a sinusoidal gust:
//!
//! `x = map(noise(t), 0, 1, -base, base) + sin(t * gust_frequency) * gust_amplitude`

use glam::Vec2;
use noise::{NoiseFn, Perlin};

use crate::{config::WindConfig, math::map_range};

/// Smooth pseudo-random function of one scalar.
///
/// Implementations must return values in `[0, 1]` and be deterministic:
/// the same `t` yields the same value for the lifetime of the source.
pub trait NoiseSource {
    fn noise(&self, t: f32) -> f32;
}

/// Perlin noise sampled along a line, remapped to `[0, 1]`.
#[derive(Clone, Debug)]
pub struct PerlinNoise {
    perlin: Perlin,
}

impl PerlinNoise {
    /// Sampling row, kept off the lattice so integer `t` is not always 0.5.
    const ROW: f64 = 0.5;

    pub fn new(seed: u32) -> Self {
        Self {
            perlin: Perlin::new(seed),
        }
    }
}

impl NoiseSource for PerlinNoise {
    fn noise(&self, t: f32) -> f32 {
        let v = self.perlin.get([t as f64, Self::ROW]) as f32;
        ((v + 1.0) * 0.5).clamp(0.0, 1.0)
    }
}

/// Noise source that always returns the same value.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ConstantNoise(pub f32);

impl NoiseSource for ConstantNoise {
    fn noise(&self, _t: f32) -> f32 {
        self.0
    }
}

#[derive(Clone, Debug)]
pub struct WindField<N> {
    noise: N,
    cfg: WindConfig,
}

impl<N: NoiseSource> WindField<N> {
    pub fn new(noise: N, cfg: WindConfig) -> Self {
        Self { noise, cfg }
    }

    #[inline]
    pub fn config(&self) -> &WindConfig {
        &self.cfg
    }

    /// Simulation time at a frame index.
    #[inline]
    pub fn time_at(&self, frame: u64) -> f32 {
        frame as f32 * self.cfg.time_step
    }

    /// Wind force at time `t`. Always horizontal.
    pub fn sample(&self, t: f32) -> Vec2 {
        let amp = self.cfg.base_amplitude;
        let base = map_range(self.noise.noise(t), 0.0, 1.0, -amp, amp);
        let gust = (t * self.cfg.gust_frequency).sin() * self.cfg.gust_amplitude;
        Vec2::new(base + gust, 0.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn neutral_noise_leaves_only_the_gust() {
        let wind = WindField::new(ConstantNoise(0.5), WindConfig::default());
        for t in [0.0f32, 0.01, 0.25, 0.5, 1.0, 1.37, 2.0, 10.0, 123.45] {
            let w = wind.sample(t);
            assert_eq!(w, Vec2::new((t * 2.3).sin() * 0.6, 0.0), "t = {t}");
        }
    }

    #[test]
    fn gust_table() {
        let wind = WindField::new(ConstantNoise(0.5), WindConfig::default());
        let table = [
            (0.0, 0.0),
            (1.0, 0.447_423_1),
            (2.0, -0.596_214_6),
            (-1.0, -0.447_423_1),
        ];
        for (t, x) in table {
            let w = wind.sample(t);
            assert!((w.x - x).abs() < 1e-5, "t = {t}: {} vs {x}", w.x);
        }
    }

    #[test]
    fn noise_extremes_shift_by_base_amplitude() {
        let cfg = WindConfig::default();
        let lo = WindField::new(ConstantNoise(0.0), cfg);
        let hi = WindField::new(ConstantNoise(1.0), cfg);
        let mid = WindField::new(ConstantNoise(0.5), cfg);
        let t = 0.7;
        assert!((lo.sample(t).x - (mid.sample(t).x - 0.4)).abs() < 1e-6);
        assert!((hi.sample(t).x - (mid.sample(t).x + 0.4)).abs() < 1e-6);
    }

    #[test]
    fn perlin_noise_is_bounded_and_deterministic() {
        let a = PerlinNoise::new(7);
        let b = PerlinNoise::new(7);
        for i in 0..500 {
            let t = i as f32 * 0.037;
            let v = a.noise(t);
            assert!((0.0..=1.0).contains(&v), "noise({t}) = {v}");
            assert_eq!(v, b.noise(t));
        }
    }

    #[test]
    fn perlin_wind_is_horizontal_and_bounded() {
        let cfg = WindConfig::default();
        let wind = WindField::new(PerlinNoise::new(1), cfg);
        let bound = cfg.base_amplitude + cfg.gust_amplitude + 1e-5;
        for frame in 0..1000 {
            let w = wind.sample(wind.time_at(frame));
            assert_eq!(w.y, 0.0);
            assert!(w.x.abs() <= bound, "frame {frame}: {w:?}");
        }
    }

    #[test]
    fn time_advances_by_time_step_per_frame() {
        let wind = WindField::new(ConstantNoise(0.5), WindConfig::default());
        assert_eq!(wind.time_at(0), 0.0);
        assert!((wind.time_at(100) - 1.0).abs() < 1e-6);
    }
}
