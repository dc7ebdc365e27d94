//! Command-line parsing for the force-sensor calibration tool.
//!
//! The goal of this module is to keep **argument parsing** and **command dispatch**
//! separate from the modeling/math code.

use std::path::PathBuf;

use clap::builder::RangedU64ValueParser;
use clap::{ArgAction, Args, Parser, Subcommand};

use crate::domain::ColumnRef;

/// Top-level CLI.
#[derive(Debug, Parser)]
#[command(name = "fcal", version, about = "Force sensor calibration by curve-model selection")]
pub struct Cli {
    /// Increase log verbosity (-v info, -vv debug). `RUST_LOG` takes precedence.
    #[arg(short, long, action = ArgAction::Count, global = true)]
    pub verbose: u8,

    #[command(subcommand)]
    pub command: Command,
}

/// CLI subcommands.
#[derive(Debug, Subcommand)]
pub enum Command {
    /// Calibrate a sensor from a CSV of (raw reading, force) pairs.
    Calibrate(CalibrateArgs),
    /// Write a synthetic power-law sensor dataset to CSV.
    Sample(SampleArgs),
}

/// Options for `fcal calibrate`.
#[derive(Debug, Args, Clone)]
pub struct CalibrateArgs {
    /// Input CSV with a header row.
    #[arg(value_name = "CSV")]
    pub csv: PathBuf,

    /// Number of calibration points drawn from the dataset.
    #[arg(short = 'n', long, env = "FCAL_POINTS", default_value_t = 10)]
    pub points: usize,

    /// x column (raw reading): header name or zero-based index.
    #[arg(long, default_value = "0")]
    pub x_col: ColumnRef,

    /// y column (force): header name or zero-based index.
    #[arg(long, default_value = "1")]
    pub y_col: ColumnRef,

    /// Only fit these models (comma-separated names, e.g. `Linear,Power`).
    #[arg(long, value_delimiter = ',')]
    pub models: Option<Vec<String>>,

    /// Iteration cap per model fit (>= 1).
    #[arg(
        long = "max-iter",
        env = "FCAL_MAX_ITER",
        default_value_t = 400,
        value_parser = RangedU64ValueParser::<usize>::new().range(1..)
    )]
    pub max_iterations: usize,

    /// Fit models concurrently (same result as sequential).
    #[arg(long, env = "FCAL_PARALLEL")]
    pub parallel: bool,

    /// Export the report (model, diagnostics, plot series) to JSON.
    #[arg(long = "export-report", value_name = "JSON")]
    pub export_report: Option<PathBuf>,

    /// Export per-observation predictions and residuals to CSV.
    #[arg(long = "export-predictions", value_name = "CSV")]
    pub export_predictions: Option<PathBuf>,

    /// Grid size for the exported plot series.
    #[arg(long, default_value_t = 101)]
    pub grid_points: usize,
}

/// Options for `fcal sample`.
#[derive(Debug, Args, Clone)]
pub struct SampleArgs {
    /// Output CSV path.
    #[arg(short, long, value_name = "CSV")]
    pub output: PathBuf,

    /// Number of readings to generate.
    #[arg(short = 'n', long, default_value_t = 200)]
    pub count: usize,

    /// Random seed.
    #[arg(long, default_value_t = 42)]
    pub seed: u64,

    /// Minimum raw reading.
    #[arg(long, default_value_t = 10.0)]
    pub raw_min: f64,

    /// Maximum raw reading.
    #[arg(long, default_value_t = 1000.0)]
    pub raw_max: f64,

    /// Power-law scale (force = scale * raw^exponent).
    #[arg(long, default_value_t = 0.02)]
    pub scale: f64,

    /// Power-law exponent.
    #[arg(long, default_value_t = 1.35)]
    pub exponent: f64,

    /// Standard deviation of the force noise.
    #[arg(long, default_value_t = 0.5)]
    pub noise: f64,
}
