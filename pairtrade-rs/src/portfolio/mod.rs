//! Portfolio management module

pub mod position;
pub mod coordinator;
pub mod risk;

pub use position::*;
pub use coordinator::*;
pub use risk::*;
