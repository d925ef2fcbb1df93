use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::{SimError, SimResult};
use crate::math::map_range;

/// Deepest leaf depth accepted by [`GrowthConfig::validate`].
pub const MAX_DEPTH_LIMIT: u32 = 8;
/// Largest split count accepted by [`GrowthConfig::validate`].
pub const MAX_SPLITS_LIMIT: u32 = 4;
/// Most root trees a layout may seed.
pub const MAX_ROOTS: usize = 1000;

/// All tunables of a scene.
///
/// Every section falls back to its defaults, so a config file only needs
/// to list the values it changes.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub growth: GrowthConfig,
    pub wind: WindConfig,
    pub render: RenderConfig,
    pub scene: SceneConfig,
}

impl Config {
    pub fn load_from_file(path: impl AsRef<Path>) -> SimResult<Self> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path).map_err(|source| SimError::ConfigIo {
            path: path.to_path_buf(),
            source,
        })?;
        let config = Self::from_toml_str(&text)?;
        tracing::debug!("Loaded config from {path:?}");
        Ok(config)
    }

    pub fn from_toml_str(text: &str) -> SimResult<Self> {
        let config: Self = toml::from_str(text)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> SimResult<()> {
        self.growth.validate()?;
        self.wind.validate()?;
        self.render.validate()?;
        self.scene.validate()
    }
}

/// Parameters of the recursive branch generation and the tip springs.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GrowthConfig {
    /// Branches at this depth are leaves.
    pub max_depth: u32,
    pub min_splits: u32,
    pub max_splits: u32,
    /// Children deviate from the parent direction by up to this many degrees.
    pub spread_deg: f32,
    pub length_scale_min: f32,
    pub length_scale_max: f32,
    /// Spring stiffness at depth 0.
    pub stiffness_root: f32,
    /// Spring stiffness at `stiffness_depth_span`.
    pub stiffness_tip: f32,
    pub stiffness_depth_span: f32,
    pub damping: f32,
}

impl Default for GrowthConfig {
    fn default() -> Self {
        Self {
            max_depth: 4,
            min_splits: 1,
            max_splits: 2,
            spread_deg: 30.0,
            length_scale_min: 0.6,
            length_scale_max: 0.8,
            stiffness_root: 0.25,
            stiffness_tip: 0.05,
            stiffness_depth_span: 5.0,
            damping: 0.9,
        }
    }
}

impl GrowthConfig {
    /// Spring constant for a tip at `depth`, linear in depth and unclamped.
    pub fn stiffness_at(&self, depth: u32) -> f32 {
        map_range(
            depth as f32,
            0.0,
            self.stiffness_depth_span,
            self.stiffness_root,
            self.stiffness_tip,
        )
    }

    pub fn validate(&self) -> SimResult<()> {
        if self.max_depth > MAX_DEPTH_LIMIT {
            return Err(SimError::InvalidConfig(format!(
                "max depth {} exceeds the limit of {MAX_DEPTH_LIMIT}",
                self.max_depth
            )));
        }
        if self.min_splits == 0
            || self.min_splits > self.max_splits
            || self.max_splits > MAX_SPLITS_LIMIT
        {
            return Err(SimError::InvalidConfig(format!(
                "split range {}..={} must be non-empty, start at 1 or more and end at {MAX_SPLITS_LIMIT} or less",
                self.min_splits, self.max_splits
            )));
        }
        if !(is_sampling_range(self.length_scale_min, self.length_scale_max)
            && self.length_scale_min > 0.0)
        {
            return Err(SimError::InvalidConfig(format!(
                "length scale range {}..={} must be finite, positive and ordered",
                self.length_scale_min, self.length_scale_max
            )));
        }
        if !(is_sampling_range(-self.spread_deg, self.spread_deg) && self.spread_deg >= 0.0) {
            return Err(SimError::InvalidConfig(format!(
                "spread {} must be a finite non-negative angle",
                self.spread_deg
            )));
        }
        if !(self.stiffness_root.is_finite()
            && self.stiffness_tip.is_finite()
            && self.stiffness_depth_span.is_finite()
            && self.stiffness_depth_span != 0.0)
        {
            return Err(SimError::InvalidConfig(format!(
                "stiffness {}..{} over depth span {} must be finite with a non-zero span",
                self.stiffness_root, self.stiffness_tip, self.stiffness_depth_span
            )));
        }
        if !(0.0..=1.0).contains(&self.damping) {
            return Err(SimError::InvalidConfig(format!(
                "damping {} must lie in [0, 1]",
                self.damping
            )));
        }
        Ok(())
    }
}

/// Parameters of the horizontal wind force.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct WindConfig {
    /// Noise contributes a force in `[-base_amplitude, base_amplitude]`.
    pub base_amplitude: f32,
    pub gust_frequency: f32,
    pub gust_amplitude: f32,
    /// Simulation time added per frame.
    pub time_step: f32,
    pub noise_seed: u32,
}

impl WindConfig {
    pub fn validate(&self) -> SimResult<()> {
        let values = [
            self.base_amplitude,
            self.gust_frequency,
            self.gust_amplitude,
            self.time_step,
        ];
        if !values.iter().all(|v| v.is_finite()) {
            return Err(SimError::InvalidConfig(format!(
                "wind settings must be finite, got {self:?}"
            )));
        }
        Ok(())
    }
}

impl Default for WindConfig {
    fn default() -> Self {
        Self {
            base_amplitude: 0.4,
            gust_frequency: 2.3,
            gust_amplitude: 0.6,
            time_step: 0.01,
            noise_seed: 0,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RenderConfig {
    /// Gray level the canvas is cleared to every frame.
    pub background: u8,
    pub root_stroke: f32,
    pub leaf_stroke: f32,
    /// Depth at which the stroke reaches `leaf_stroke`.
    pub stroke_depth_span: f32,
    pub leaf_mark_length: f32,
    pub leaf_mark_stroke: f32,
}

impl Default for RenderConfig {
    fn default() -> Self {
        Self {
            background: 255,
            root_stroke: 2.0,
            leaf_stroke: 0.5,
            stroke_depth_span: 4.0,
            leaf_mark_length: 8.0,
            leaf_mark_stroke: 0.7,
        }
    }
}

impl RenderConfig {
    /// Stem stroke weight at `depth`, clamped to the root/leaf range.
    pub fn stroke_at(&self, depth: u32) -> f32 {
        let lo = self.root_stroke.min(self.leaf_stroke);
        let hi = self.root_stroke.max(self.leaf_stroke);
        map_range(
            depth as f32,
            0.0,
            self.stroke_depth_span,
            self.root_stroke,
            self.leaf_stroke,
        )
        .clamp(lo, hi)
    }

    pub fn validate(&self) -> SimResult<()> {
        let values = [
            self.root_stroke,
            self.leaf_stroke,
            self.stroke_depth_span,
            self.leaf_mark_length,
            self.leaf_mark_stroke,
        ];
        if !values.iter().all(|v| v.is_finite()) || self.stroke_depth_span == 0.0 {
            return Err(SimError::InvalidConfig(format!(
                "render settings must be finite with a non-zero stroke span, got {self:?}"
            )));
        }
        Ok(())
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SceneConfig {
    pub canvas_width: f32,
    pub canvas_height: f32,
    pub layout: Layout,
}

impl SceneConfig {
    pub fn validate(&self) -> SimResult<()> {
        let (w, h) = (self.canvas_width, self.canvas_height);
        if !(w.is_finite() && h.is_finite() && w >= 0.0 && h >= 0.0) {
            return Err(SimError::InvalidConfig(format!(
                "canvas size {w}x{h} must be finite and non-negative"
            )));
        }
        self.layout.validate()
    }
}

impl Default for SceneConfig {
    fn default() -> Self {
        Self {
            canvas_width: 600.0,
            canvas_height: 400.0,
            layout: Layout::default(),
        }
    }
}

/// How root branches are placed on the canvas.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Layout {
    /// Roots scattered over the whole canvas, fanning out in random directions.
    Fan {
        count: usize,
        angle_range_deg: [f32; 2],
        length_range: [f32; 2],
    },
    /// A row of roots standing on the bottom edge of the canvas.
    GroundRow {
        start_x: f32,
        spacing: f32,
        angle_deg: f32,
        jitter_deg: f32,
        length_range: [f32; 2],
    },
}

impl Default for Layout {
    fn default() -> Self {
        Self::fan()
    }
}

impl Layout {
    pub fn fan() -> Self {
        Self::Fan {
            count: 20,
            angle_range_deg: [-90.0, 90.0],
            length_range: [40.0, 70.0],
        }
    }

    pub fn ground_row() -> Self {
        Self::GroundRow {
            start_x: 50.0,
            spacing: 30.0,
            angle_deg: -90.0,
            jitter_deg: 15.0,
            length_range: [30.0, 50.0],
        }
    }

    pub fn validate(&self) -> SimResult<()> {
        let length_range = match *self {
            Layout::Fan {
                count,
                angle_range_deg,
                length_range,
            } => {
                if count > MAX_ROOTS {
                    return Err(SimError::InvalidConfig(format!(
                        "fan count {count} exceeds the limit of {MAX_ROOTS}"
                    )));
                }
                if !is_sampling_range(angle_range_deg[0], angle_range_deg[1]) {
                    return Err(SimError::InvalidConfig(format!(
                        "fan angle range {angle_range_deg:?} must be finite and ordered"
                    )));
                }
                length_range
            }
            Layout::GroundRow {
                start_x,
                spacing,
                angle_deg,
                jitter_deg,
                length_range,
            } => {
                if !(start_x.is_finite() && angle_deg.is_finite()) {
                    return Err(SimError::InvalidConfig(format!(
                        "ground row start {start_x} and angle {angle_deg} must be finite"
                    )));
                }
                if !(spacing.is_finite() && spacing > 0.0) {
                    return Err(SimError::InvalidConfig(format!(
                        "ground row spacing must be finite and positive, got {spacing}"
                    )));
                }
                if !(is_sampling_range(-jitter_deg, jitter_deg) && jitter_deg >= 0.0) {
                    return Err(SimError::InvalidConfig(format!(
                        "ground row jitter must be finite and non-negative, got {jitter_deg}"
                    )));
                }
                length_range
            }
        };
        if !(is_sampling_range(length_range[0], length_range[1]) && length_range[0] > 0.0) {
            return Err(SimError::InvalidConfig(format!(
                "root length range {length_range:?} must be finite, positive and ordered"
            )));
        }
        Ok(())
    }
}

/// `true` if `lo..=hi` can be sampled uniformly: both ends finite, ordered,
/// and the width itself finite.
fn is_sampling_range(lo: f32, hi: f32) -> bool {
    lo.is_finite() && hi.is_finite() && lo <= hi && (hi - lo).is_finite()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn stiffness_follows_depth_linearly() {
        let cfg = GrowthConfig::default();
        assert_eq!(cfg.stiffness_at(0), 0.25);
        assert!((cfg.stiffness_at(4) - 0.09).abs() < 1e-6);
        assert!((cfg.stiffness_at(5) - 0.05).abs() < 1e-6);
        // Not clamped past the span.
        assert!(cfg.stiffness_at(6) < 0.05);
    }

    #[test]
    fn stroke_is_clamped_past_leaf_depth() {
        let cfg = RenderConfig::default();
        assert_eq!(cfg.stroke_at(0), 2.0);
        assert_eq!(cfg.stroke_at(2), 1.25);
        assert_eq!(cfg.stroke_at(4), 0.5);
        assert_eq!(cfg.stroke_at(9), 0.5);
    }

    #[test]
    fn partial_toml_keeps_defaults() {
        let cfg = Config::from_toml_str(
            r#"
            [wind]
            gust_amplitude = 1.5

            [scene.layout]
            kind = "ground_row"
            start_x = 20.0
            spacing = 40.0
            angle_deg = -90.0
            jitter_deg = 5.0
            length_range = [10.0, 20.0]
            "#,
        )
        .unwrap();

        assert_eq!(cfg.wind.gust_amplitude, 1.5);
        assert_eq!(cfg.wind.gust_frequency, 2.3);
        assert_eq!(cfg.growth, GrowthConfig::default());
        assert!(matches!(
            cfg.scene.layout,
            Layout::GroundRow { spacing, .. } if spacing == 40.0
        ));
    }

    #[test]
    fn default_config_survives_toml_roundtrip() {
        let text = toml::to_string(&Config::default()).unwrap();
        let back = Config::from_toml_str(&text).unwrap();
        assert_eq!(back, Config::default());
    }

    #[test]
    fn invalid_values_are_rejected() {
        let mut growth = GrowthConfig::default();
        growth.min_splits = 0;
        assert!(matches!(growth.validate(), Err(SimError::InvalidConfig(_))));

        let mut growth = GrowthConfig::default();
        growth.length_scale_min = 0.9;
        assert!(matches!(growth.validate(), Err(SimError::InvalidConfig(_))));

        let row = Layout::GroundRow {
            start_x: 0.0,
            spacing: 0.0,
            angle_deg: -90.0,
            jitter_deg: 0.0,
            length_range: [1.0, 2.0],
        };
        assert!(matches!(row.validate(), Err(SimError::InvalidConfig(_))));
    }

    #[test]
    fn non_finite_values_are_rejected() {
        for text in [
            "[growth]\nlength_scale_max = inf",
            "[growth]\nspread_deg = nan",
            "[growth]\nstiffness_tip = -inf",
            "[growth]\ndamping = nan",
            "[wind]\ntime_step = nan",
            "[render]\nleaf_mark_length = inf",
            "[scene]\ncanvas_width = inf",
            "[scene.layout]\nkind = \"fan\"\ncount = 3\nangle_range_deg = [nan, 0.0]\nlength_range = [1.0, 2.0]",
            "[scene.layout]\nkind = \"fan\"\ncount = 3\nangle_range_deg = [-3e38, 3e38]\nlength_range = [1.0, 2.0]",
            "[scene.layout]\nkind = \"fan\"\ncount = 3\nangle_range_deg = [0.0, 10.0]\nlength_range = [1.0, inf]",
        ] {
            let err = Config::from_toml_str(text).unwrap_err();
            assert!(matches!(err, SimError::InvalidConfig(_)), "{text}: {err}");
        }

        let row = |start_x: f32, spacing: f32, jitter_deg: f32| Layout::GroundRow {
            start_x,
            spacing,
            angle_deg: -90.0,
            jitter_deg,
            length_range: [1.0, 2.0],
        };
        for layout in [
            row(f32::NAN, 30.0, 0.0),
            row(f32::NEG_INFINITY, 30.0, 0.0),
            row(0.0, f32::INFINITY, 0.0),
            row(0.0, f32::NAN, 0.0),
            row(0.0, 30.0, f32::NAN),
            row(0.0, 30.0, f32::INFINITY),
        ] {
            assert!(
                matches!(layout.validate(), Err(SimError::InvalidConfig(_))),
                "{layout:?}"
            );
        }
    }

    #[test]
    fn recursion_and_root_counts_are_capped() {
        let mut growth = GrowthConfig::default();
        growth.max_depth = MAX_DEPTH_LIMIT;
        assert!(growth.validate().is_ok());
        growth.max_depth = 40;
        assert!(matches!(growth.validate(), Err(SimError::InvalidConfig(_))));

        let mut growth = GrowthConfig::default();
        growth.max_splits = MAX_SPLITS_LIMIT;
        assert!(growth.validate().is_ok());
        growth.max_splits = MAX_SPLITS_LIMIT + 1;
        assert!(matches!(growth.validate(), Err(SimError::InvalidConfig(_))));

        let fan = |count| Layout::Fan {
            count,
            angle_range_deg: [0.0, 10.0],
            length_range: [1.0, 2.0],
        };
        assert!(fan(MAX_ROOTS).validate().is_ok());
        assert!(matches!(
            fan(MAX_ROOTS + 1).validate(),
            Err(SimError::InvalidConfig(_))
        ));
    }

    #[test]
    fn shipped_sample_config_matches_defaults() {
        let path = concat!(env!("CARGO_MANIFEST_DIR"), "/../windbranch.toml");
        let cfg = Config::load_from_file(path).unwrap();
        assert_eq!(cfg, Config::default());
    }

    #[test]
    fn malformed_toml_is_a_parse_error() {
        let err = Config::from_toml_str("[growth\nmax_depth = ").unwrap_err();
        assert!(matches!(err, SimError::ConfigParse(_)));
    }

    #[test]
    fn missing_file_reports_path() {
        let err = Config::load_from_file("does/not/exist.toml").unwrap_err();
        match err {
            SimError::ConfigIo { path, .. } => assert!(path.ends_with("exist.toml")),
            other => panic!("unexpected error {other:?}"),
        }
    }
}
