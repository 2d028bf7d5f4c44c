//! Execution port

use crate::data::LegId;
use crate::error::ExecutionError;
use crate::exchange::OrderRequest;
use tracing::debug;

/// Accepts order requests; fills, retries and venue rounding are the port's
/// responsibility. Returning `Ok` means the order was accepted.
pub trait OrderSink {
    fn submit(&mut self, order: &OrderRequest) -> Result<(), ExecutionError>;
}

impl<F> OrderSink for F
where
    F: FnMut(&OrderRequest) -> Result<(), ExecutionError>,
{
    fn submit(&mut self, order: &OrderRequest) -> Result<(), ExecutionError> {
        self(order)
    }
}

/// Paper execution port that keeps every accepted order
#[derive(Debug, Default)]
pub struct RecordingSink {
    orders: Vec<OrderRequest>,
    rejected_legs: Vec<LegId>,
}

impl RecordingSink {
    pub fn new() -> Self {
        Self::default()
    }

    /// Reject every subsequent order on `leg`
    pub fn reject_leg(&mut self, leg: LegId) {
        if !self.rejected_legs.contains(&leg) {
            self.rejected_legs.push(leg);
        }
    }

    /// Accept orders on every leg again
    pub fn accept_all(&mut self) {
        self.rejected_legs.clear();
    }

    /// Accepted orders, oldest first
    pub fn orders(&self) -> &[OrderRequest] {
        &self.orders
    }

    /// Remove and return accepted orders
    pub fn drain(&mut self) -> Vec<OrderRequest> {
        std::mem::take(&mut self.orders)
    }
}

impl OrderSink for RecordingSink {
    fn submit(&mut self, order: &OrderRequest) -> Result<(), ExecutionError> {
        if self.rejected_legs.contains(&order.leg) {
            return Err(ExecutionError::Rejected(format!(
                "{} orders are disabled",
                order.leg
            )));
        }
        debug!(%order, "Order accepted");
        self.orders.push(order.clone());
        Ok(())
    }
}
