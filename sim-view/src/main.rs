//! Application entry point for the wind-swept tree viewer.
//!
//! This binary parses the command line, sets up logging, loads the scene
//! config and delegates all interactive logic and rendering to [`Viewer`]
//! from the `viewer` module.

mod viewer;

use std::{path::PathBuf, process::ExitCode};

use clap::{Parser, ValueEnum};
use tracing::{error, info};
use tracing_subscriber::{filter::LevelFilter, fmt, prelude::*};
use viewer::Viewer;
use windbranch_core::{
    SimResult,
    config::{Config, Layout},
};

#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
pub enum LayoutArg {
    Fan,
    GroundRow,
}

impl LayoutArg {
    pub fn to_layout(self) -> Layout {
        match self {
            LayoutArg::Fan => Layout::fan(),
            LayoutArg::GroundRow => Layout::ground_row(),
        }
    }
}

#[derive(Parser, Debug)]
#[command(author, version, about = "Procedural trees swaying in the wind")]
struct Cli {
    /// Path to a TOML config file.
    #[arg(short, long)]
    config: Option<PathBuf>,
    /// Seed for tree generation; random when omitted.
    #[arg(short, long)]
    seed: Option<u64>,
    /// Overrides the layout from the config file.
    #[arg(short, long, value_enum)]
    layout: Option<LayoutArg>,
}

fn load_config(cli: &Cli) -> SimResult<Config> {
    let mut config = match &cli.config {
        Some(path) => Config::load_from_file(path)?,
        None => Config::default(),
    };
    if let Some(layout) = cli.layout {
        config.scene.layout = layout.to_layout();
    }
    Ok(config)
}

fn main() -> ExitCode {
    tracing_subscriber::registry()
        .with(fmt::layer())
        .with(LevelFilter::INFO)
        .init();

    let cli = Cli::parse();

    let config = match load_config(&cli) {
        Ok(config) => config,
        Err(e) => {
            error!("{e}");
            return ExitCode::FAILURE;
        }
    };
    let seed = cli.seed.unwrap_or_else(rand::random);
    info!("Starting with seed {seed}");

    let viewer = match Viewer::new(config, seed) {
        Ok(viewer) => viewer,
        Err(e) => {
            error!("Failed to set up scene: {e}");
            return ExitCode::FAILURE;
        }
    };

    let options = eframe::NativeOptions::default();
    let result = eframe::run_native("Wind Branches", options, Box::new(|_cc| Ok(Box::new(viewer))));

    match result {
        Ok(()) => {
            info!("Shutdown");
            ExitCode::SUCCESS
        }
        Err(e) => {
            error!("Viewer exited with error: {e}");
            ExitCode::FAILURE
        }
    }
}
