//! `force-calib` library crate.
//!
//! The binary (`fcal`) is a thin wrapper around this library so that:
//!
//! - core logic is testable without spawning processes
//! - the calibration core can be embedded in other tools (firmware tooling, notebooks)
//! - code stays easy to navigate as the project grows

pub mod app;
pub mod cli;
pub mod data;
pub mod domain;
pub mod error;
pub mod fit;
pub mod io;
pub mod math;
pub mod models;
pub mod report;
