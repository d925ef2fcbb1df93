//! Error type for tree construction, geometry import and config loading.

use std::path::PathBuf;

use glam::Vec2;

pub type SimResult<T> = Result<T, SimError>;

#[derive(Debug, thiserror::Error)]
pub enum SimError {
    #[error("Branch length must be finite and positive, got {0}")]
    InvalidLength(f32),
    #[error("Branch direction must be finite, non-zero and unit length where stored, got {0}")]
    InvalidDirection(Vec2),
    #[error("Branch origin must be finite, got {0}")]
    InvalidOrigin(Vec2),
    #[error("Tree geometry contains no branches")]
    EmptyGeometry,
    #[error("Branch {index} has invalid parent {parent:?}")]
    InvalidParent { index: usize, parent: Option<usize> },
    #[error("Branch {index} does not fit its tree\n  - {reason}")]
    InvalidGeometry { index: usize, reason: &'static str },
    #[error("Invalid config: {0}")]
    InvalidConfig(String),
    #[error("Failed to read config file {path:?}\n  - {source}")]
    ConfigIo {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("Failed to parse config\n  - {0}")]
    ConfigParse(#[from] toml::de::Error),
}
