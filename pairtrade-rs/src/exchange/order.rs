//! Order requests

use crate::data::LegId;
use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

/// Order side
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum OrderSide {
    /// Buy
    Buy,
    /// Sell
    Sell,
}

impl OrderSide {
    /// The side that unwinds this one
    pub fn opposite(self) -> OrderSide {
        match self {
            OrderSide::Buy => OrderSide::Sell,
            OrderSide::Sell => OrderSide::Buy,
        }
    }

    /// +1 for buys, -1 for sells
    pub fn sign(self) -> f64 {
        match self {
            OrderSide::Buy => 1.0,
            OrderSide::Sell => -1.0,
        }
    }

    /// Side needed to move exposure by `delta`
    pub fn for_delta(delta: f64) -> OrderSide {
        if delta >= 0.0 {
            OrderSide::Buy
        } else {
            OrderSide::Sell
        }
    }
}

impl fmt::Display for OrderSide {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            OrderSide::Buy => write!(f, "buy"),
            OrderSide::Sell => write!(f, "sell"),
        }
    }
}

/// Market order handed to the execution port
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OrderRequest {
    /// Client order ID
    pub id: String,
    /// Leg the order trades
    pub leg: LegId,
    /// Symbol of that leg
    pub symbol: String,
    /// Order side
    pub side: OrderSide,
    /// Quantity, already rounded to the venue increment
    pub volume: f64,
}

impl OrderRequest {
    /// Create new order request with a fresh client order ID
    pub fn new(leg: LegId, symbol: impl Into<String>, side: OrderSide, volume: f64) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            leg,
            symbol: symbol.into(),
            side,
            volume,
        }
    }

    /// Signed change in exposure this order causes once accepted
    pub fn signed_volume(&self) -> f64 {
        self.side.sign() * self.volume
    }

    /// Order that exactly unwinds this one
    pub fn reversed(&self) -> OrderRequest {
        OrderRequest::new(self.leg, self.symbol.clone(), self.side.opposite(), self.volume)
    }
}

impl fmt::Display for OrderRequest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {} {} ({})", self.side, self.volume, self.symbol, self.leg)
    }
}
