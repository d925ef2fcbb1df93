//! Core library for wind-swept branching trees.
//!
//! Main components:
//! - [`spring`] — damped spring-mass tips.
//! - [`tree`] — recursive branch generation and per-node traversal.
//! - [`wind`] — the global time-varying wind force and noise sources.
//! - [`phases`] — per-frame pipeline steps over a set of trees.
//! - [`scene`] — seeding layouts and the frame cycle.
//! - [`render`] — draw-instruction sink contract and a recording sink.
//! - [`config`] — tunables for growth, wind, rendering and seeding.
//! - [`error`] — the error type shared by the fallible operations.
//! - [`math`] — small scalar/vector helpers.
//! - [`types`] — shared type aliases and IDs.

pub mod config;
pub mod error;
pub mod math;
pub mod phases;
pub mod render;
pub mod scene;
pub mod spring;
pub mod tree;
pub mod types;
pub mod wind;

pub use error::{SimError, SimResult};
