//! Candidate calibration models.
//!
//! Models are a tagged enum with pure predict/Jacobian functions so that the
//! fitting code can stay generic over the catalogue.

pub mod model;
pub mod registry;

pub use model::*;
pub use registry::*;
