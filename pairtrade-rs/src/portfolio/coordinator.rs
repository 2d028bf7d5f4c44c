//! Two-leg order coordination
//!
//! Turns spread transitions into leg orders. Existing exposure is closed before
//! new exposure is opened, and within each step leg1's order is submitted
//! before leg2's. Nothing is rolled back automatically unless the hedge
//! failure policy asks for a compensating order.

use crate::config::{EngineConfig, HedgeFailurePolicy};
use crate::data::{LegId, PairedPrices};
use crate::error::{EngineError, ExecutionError};
use crate::exchange::{OrderRequest, OrderSide, OrderSink};
use crate::portfolio::PositionState;
use crate::strategy::SpreadSignal;
use crate::Result;
use tracing::{error, info, warn};

/// Orders needed to move from the held position to a target state
#[derive(Debug, Clone, Default, PartialEq)]
pub struct OrderPlan {
    /// Unwinds of currently held exposure, leg1 first
    pub close: Vec<OrderRequest>,
    /// New hedge-ratio-weighted exposure, leg1 first
    pub open: Vec<OrderRequest>,
}

impl OrderPlan {
    pub fn is_empty(&self) -> bool {
        self.close.is_empty() && self.open.is_empty()
    }

    /// All orders in submission order
    pub fn orders(&self) -> impl Iterator<Item = &OrderRequest> {
        self.close.iter().chain(self.open.iter())
    }
}

/// Sizes and submits leg orders for spread transitions
#[derive(Debug, Clone)]
pub struct PositionCoordinator {
    symbols: [String; 2],
    volumes: [f64; 2],
    hedge_failure: HedgeFailurePolicy,
}

impl PositionCoordinator {
    /// Create coordinator with the configured volumes (`V`, `V * beta`)
    pub fn new(config: &EngineConfig) -> Self {
        Self {
            symbols: [config.leg1.clone(), config.leg2.clone()],
            volumes: [config.leg1_entry_volume(), config.leg2_entry_volume()],
            hedge_failure: config.hedge_failure,
        }
    }

    fn symbol(&self, leg: LegId) -> &str {
        &self.symbols[leg.index()]
    }

    /// Entry volume for one leg
    pub fn entry_volume(&self, leg: LegId) -> f64 {
        self.volumes[leg.index()]
    }

    /// Orders that take `position` to `target`
    pub fn plan(&self, position: &PositionState, target: SpreadSignal) -> OrderPlan {
        let close = LegId::BOTH
            .iter()
            .filter(|&&leg| !position.leg(leg).is_flat())
            .map(|&leg| {
                let held = position.quantity(leg);
                OrderRequest::new(leg, self.symbol(leg), OrderSide::for_delta(-held), held.abs())
            })
            .collect();

        let open = match target {
            SpreadSignal::Flat => Vec::new(),
            SpreadSignal::SpreadLong => self.open_orders(OrderSide::Buy),
            SpreadSignal::SpreadShort => self.open_orders(OrderSide::Sell),
        };

        OrderPlan { close, open }
    }

    fn open_orders(&self, leg1_side: OrderSide) -> Vec<OrderRequest> {
        vec![
            OrderRequest::new(
                LegId::Leg1,
                self.symbol(LegId::Leg1),
                leg1_side,
                self.entry_volume(LegId::Leg1),
            ),
            OrderRequest::new(
                LegId::Leg2,
                self.symbol(LegId::Leg2),
                leg1_side.opposite(),
                self.entry_volume(LegId::Leg2),
            ),
        ]
    }

    /// Submit the orders for `target` and record accepted exposure at `prices`.
    ///
    /// Returns the accepted orders. On error `position` reflects exactly the
    /// orders the port accepted before the failure.
    pub fn apply_transition<S: OrderSink>(
        &self,
        position: &mut PositionState,
        target: SpreadSignal,
        prices: &PairedPrices,
        sink: &mut S,
    ) -> Result<Vec<OrderRequest>> {
        let plan = self.plan(position, target);
        let mut accepted = Vec::with_capacity(4);

        for step in [plan.close, plan.open] {
            self.submit_step(step, position, prices, sink, &mut accepted)?;
        }

        Ok(accepted)
    }

    fn submit_step<S: OrderSink>(
        &self,
        step: Vec<OrderRequest>,
        position: &mut PositionState,
        prices: &PairedPrices,
        sink: &mut S,
        accepted: &mut Vec<OrderRequest>,
    ) -> Result<()> {
        let mut leg1_order: Option<OrderRequest> = None;

        for order in step {
            if let Err(source) = sink.submit(&order) {
                return match (order.leg, leg1_order.take()) {
                    (LegId::Leg2, Some(leg1)) => {
                        Err(self.broken_hedge(leg1, order, source, position, prices, sink))
                    }
                    _ => {
                        warn!(%order, error = %source, "Order rejected, transition aborted");
                        Err(EngineError::Execution(source))
                    }
                };
            }

            position.apply(order.leg, order.signed_volume(), prices.price(order.leg));
            info!(%order, price = prices.price(order.leg), "Order submitted");
            if order.leg == LegId::Leg1 {
                leg1_order = Some(order.clone());
            }
            accepted.push(order);
        }

        Ok(())
    }

    fn broken_hedge<S: OrderSink>(
        &self,
        accepted: OrderRequest,
        failed: OrderRequest,
        source: ExecutionError,
        position: &mut PositionState,
        prices: &PairedPrices,
        sink: &mut S,
    ) -> EngineError {
        error!(
            accepted = %accepted,
            failed = %failed,
            error = %source,
            leg1_quantity = position.quantity(LegId::Leg1),
            leg2_quantity = position.quantity(LegId::Leg2),
            "UNHEDGED: leg2 order failed after leg1 was accepted"
        );

        let mut compensated = false;
        if self.hedge_failure == HedgeFailurePolicy::Compensate {
            let reverse = accepted.reversed();
            match sink.submit(&reverse) {
                Ok(()) => {
                    position.apply(reverse.leg, reverse.signed_volume(), prices.price(reverse.leg));
                    warn!(order = %reverse, "Compensating order submitted, leg1 exposure restored");
                    compensated = true;
                }
                Err(err) => {
                    error!(order = %reverse, error = %err, "Compensating order failed, position remains unhedged");
                }
            }
        }

        EngineError::InconsistentHedge {
            accepted,
            failed,
            compensated,
            source,
        }
    }
}
