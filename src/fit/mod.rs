//! Calibration orchestration.
//!
//! Responsibilities:
//!
//! - pick evenly spread calibration points (`points`)
//! - fit each catalogue model with Levenberg–Marquardt (`fitter`)
//! - score fits by R² / RMSE (`evaluator`)
//! - select the best model and re-score it on the full dataset (`selection`)

pub mod evaluator;
pub mod fitter;
pub mod points;
pub mod selection;

pub use evaluator::*;
pub use fitter::*;
pub use points::*;
pub use selection::*;
