//! Data management module
//!
//! Price ticks for the two legs, per-leg freshness and the pair join.

pub mod tick;
pub mod synchronizer;

pub use tick::*;
pub use synchronizer::*;
