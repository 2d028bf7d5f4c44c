//! Strategy module
//!
//! Residual computation and z-score driven spread signals.

pub mod residual;
pub mod signal;
pub mod evaluator;

pub use residual::*;
pub use signal::*;
pub use evaluator::*;
