//! Domain types used throughout the pipeline.
//!
//! This module defines:
//!
//! - paired sensor/reference readings (`Observation`)
//! - fit outputs (`FitResult`, `CalibrationReport`)
//! - run configuration (`CalibConfig`) and export schema (`ReportFile`)

pub mod types;

pub use types::*;
