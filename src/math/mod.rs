//! Mathematical utilities: damped least squares and Levenberg–Marquardt.

pub mod lm;
pub mod ols;

pub use lm::*;
pub use ols::*;
