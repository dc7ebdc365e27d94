//! Top-level application orchestration.
//!
//! `src/main.rs` is intentionally tiny; this module is the "real main" that:
//! - loads `.env` and parses CLI arguments
//! - sets up logging
//! - runs calibration + model selection and prints the report
//! - writes optional exports
//! - generates synthetic samples

use clap::Parser;
use log::LevelFilter;

use crate::cli::{CalibrateArgs, Cli, Command, SampleArgs};
use crate::data::{SampleConfig, generate_sample, write_sample_csv};
use crate::domain::CalibConfig;
use crate::error::AppError;

pub mod pipeline;

/// Entry point for the `fcal` binary.
pub fn run() -> Result<(), AppError> {
    // `FCAL_*` defaults may live in a local `.env`.
    dotenvy::dotenv().ok();
    let cli = Cli::parse();
    init_logging(cli.verbose);

    match cli.command {
        Command::Calibrate(args) => handle_calibrate(args),
        Command::Sample(args) => handle_sample(args),
    }
}

fn init_logging(verbose: u8) {
    let level = match verbose {
        0 => LevelFilter::Warn,
        1 => LevelFilter::Info,
        _ => LevelFilter::Debug,
    };
    // RUST_LOG, when set, overrides the flag.
    let _ = env_logger::Builder::new()
        .filter_level(level)
        .format_timestamp(None)
        .parse_default_env()
        .try_init();
}

fn handle_calibrate(args: CalibrateArgs) -> Result<(), AppError> {
    let config = calib_config_from_args(&args);
    let run = pipeline::run_calibrate(&config)?;

    println!(
        "{}",
        crate::report::format_run_summary(&run.ingest, &run.report, &config)
    );

    // Optional exports.
    if let Some(path) = &config.export_report {
        crate::io::export::write_report_json(path, &run.report, &run.ingest, &config.csv_path, config.grid_points)?;
    }
    if let Some(path) = &config.export_predictions {
        crate::io::export::write_predictions_csv(path, &run.ingest.points, &run.report)?;
    }

    Ok(())
}

fn handle_sample(args: SampleArgs) -> Result<(), AppError> {
    let config = SampleConfig {
        count: args.count,
        seed: args.seed,
        x_min: args.raw_min,
        x_max: args.raw_max,
        scale: args.scale,
        exponent: args.exponent,
        noise: args.noise,
    };
    let points = generate_sample(&config)?;
    write_sample_csv(&args.output, &points)?;
    println!("Wrote {} readings to {}", points.len(), args.output.display());
    Ok(())
}

pub fn calib_config_from_args(args: &CalibrateArgs) -> CalibConfig {
    CalibConfig {
        csv_path: args.csv.clone(),
        x_col: args.x_col.clone(),
        y_col: args.y_col.clone(),
        points: args.points,
        models: args.models.clone(),
        max_iterations: args.max_iterations,
        parallel: args.parallel,
        export_report: args.export_report.clone(),
        export_predictions: args.export_predictions.clone(),
        grid_points: args.grid_points,
    }
}
