//! Engine error types

use crate::data::LegId;
use crate::exchange::OrderRequest;
use thiserror::Error;

/// Errors raised by the pairs engine and its components.
#[derive(Debug, Error)]
pub enum EngineError {
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("Missing leg: {0} symbol is not configured")]
    MissingLeg(LegId),

    #[error("Rolling window not ready: have {have} samples, need {need}")]
    WindowNotReady { have: usize, need: usize },

    #[error("Unknown symbol {0}: not one of the configured legs")]
    UnknownSymbol(String),

    #[error("Order submission failed: {0}")]
    Execution(#[from] ExecutionError),

    /// Leg1's order was accepted but leg2's was not, so the pair is unhedged.
    #[error("Inconsistent hedge: {accepted} accepted, {failed} failed ({source}); compensated: {compensated}")]
    InconsistentHedge {
        accepted: OrderRequest,
        failed: OrderRequest,
        compensated: bool,
        #[source]
        source: ExecutionError,
    },
}

/// Errors reported by an execution port when an order cannot be submitted.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ExecutionError {
    #[error("Order rejected: {0}")]
    Rejected(String),

    #[error("Execution venue unavailable: {0}")]
    Unavailable(String),
}
