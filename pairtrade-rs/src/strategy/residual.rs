//! Spread residual between the two legs

use crate::data::PairedPrices;

/// Computes `leg1 - beta * leg2` for synchronized prices
#[derive(Debug, Clone, Copy)]
pub struct ResidualComputer {
    beta: f64,
}

impl ResidualComputer {
    /// Create computer for a fixed hedge ratio
    pub fn new(beta: f64) -> Self {
        Self { beta }
    }

    /// Hedge ratio
    pub fn beta(&self) -> f64 {
        self.beta
    }

    /// Residual of a synchronized pair, `None` if either price is unusable
    pub fn residual(&self, prices: &PairedPrices) -> Option<f64> {
        Self::compute(Some(prices.leg1), Some(prices.leg2), self.beta)
    }

    /// `price1 - beta * price2`; missing, zero or non-finite prices yield `None`
    pub fn compute(price1: Option<f64>, price2: Option<f64>, beta: f64) -> Option<f64> {
        let usable = |p: f64| p.is_finite() && p != 0.0;
        match (price1, price2) {
            (Some(p1), Some(p2)) if usable(p1) && usable(p2) => Some(p1 - beta * p2),
            _ => None,
        }
    }
}
