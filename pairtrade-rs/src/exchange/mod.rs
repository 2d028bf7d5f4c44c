//! Exchange integration module
//!
//! Order requests and the execution port the engine submits them to.

pub mod order;
pub mod sink;

pub use order::*;
pub use sink::*;
