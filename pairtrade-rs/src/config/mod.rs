//! Configuration module

pub mod engine;
pub mod risk;

pub use engine::*;
pub use risk::*;
