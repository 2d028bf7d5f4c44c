//! Per-leg position tracking

use crate::data::{LegId, PairedPrices};
use crate::strategy::SpreadSignal;
use serde::{Deserialize, Serialize};

/// Quantities below this are treated as flat
const QUANTITY_EPSILON: f64 = 1e-9;

/// Signed exposure on one leg
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct LegPosition {
    /// Signed quantity (positive long, negative short)
    pub quantity: f64,
    /// Volume-weighted entry price of the open quantity
    pub entry_price: f64,
}

impl LegPosition {
    pub fn is_flat(&self) -> bool {
        self.quantity.abs() < QUANTITY_EPSILON
    }

    /// Apply a signed quantity change at `price`, returning realized P&L
    pub fn apply(&mut self, delta: f64, price: f64) -> f64 {
        let old = self.quantity;
        let new = old + delta;
        let mut realized = 0.0;

        if old == 0.0 || old.signum() == delta.signum() {
            // opening or adding: blend entry price
            let total = old.abs() + delta.abs();
            if total > 0.0 {
                self.entry_price = (self.entry_price * old.abs() + price * delta.abs()) / total;
            }
        } else {
            // reducing, closing or flipping
            let closed = delta.abs().min(old.abs());
            realized = closed * (price - self.entry_price) * old.signum();
            if new.abs() >= QUANTITY_EPSILON && new.signum() != old.signum() {
                self.entry_price = price;
            }
        }

        if new.abs() < QUANTITY_EPSILON {
            self.quantity = 0.0;
            self.entry_price = 0.0;
        } else {
            self.quantity = new;
        }
        realized
    }

    /// Unrealized P&L at `price`
    pub fn unrealized_pnl(&self, price: f64) -> f64 {
        self.quantity * (price - self.entry_price)
    }

    /// Absolute value of the open quantity at entry
    pub fn entry_notional(&self) -> f64 {
        self.quantity.abs() * self.entry_price
    }
}

/// Signed exposure on both legs of the pair
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PositionState {
    legs: [LegPosition; 2],
    realized_pnl: f64,
}

impl PositionState {
    pub fn new() -> Self {
        Self::default()
    }

    /// Position on one leg
    pub fn leg(&self, leg: LegId) -> &LegPosition {
        &self.legs[leg.index()]
    }

    /// Signed quantity held on one leg
    pub fn quantity(&self, leg: LegId) -> f64 {
        self.legs[leg.index()].quantity
    }

    /// Record an accepted order's exposure change at `price`
    pub fn apply(&mut self, leg: LegId, delta: f64, price: f64) -> f64 {
        let realized = self.legs[leg.index()].apply(delta, price);
        self.realized_pnl += realized;
        realized
    }

    /// No exposure on either leg
    pub fn is_flat(&self) -> bool {
        self.legs.iter().all(LegPosition::is_flat)
    }

    /// Both legs open with opposite signs
    pub fn is_hedged(&self) -> bool {
        let (q1, q2) = (self.legs[0].quantity, self.legs[1].quantity);
        !self.legs[0].is_flat() && !self.legs[1].is_flat() && q1.signum() != q2.signum()
    }

    /// Spread state implied by leg1's exposure
    pub fn implied_signal(&self) -> SpreadSignal {
        let leg1 = &self.legs[0];
        if leg1.is_flat() {
            SpreadSignal::Flat
        } else if leg1.quantity > 0.0 {
            SpreadSignal::SpreadLong
        } else {
            SpreadSignal::SpreadShort
        }
    }

    /// Combined unrealized P&L of both legs
    pub fn unrealized_pnl(&self, prices: &PairedPrices) -> f64 {
        LegId::BOTH
            .iter()
            .map(|&leg| self.leg(leg).unrealized_pnl(prices.price(leg)))
            .sum()
    }

    /// Gross notional of both legs at entry prices
    pub fn entry_notional(&self) -> f64 {
        self.legs.iter().map(LegPosition::entry_notional).sum()
    }

    /// Loss as a fraction of entry notional (positive when losing)
    pub fn adverse_excursion(&self, prices: &PairedPrices) -> Option<f64> {
        let notional = self.entry_notional();
        if notional <= 0.0 {
            return None;
        }
        Some(-self.unrealized_pnl(prices) / notional)
    }

    /// P&L realized by reducing or closing exposure so far
    pub fn realized_pnl(&self) -> f64 {
        self.realized_pnl
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    fn prices(leg1: f64, leg2: f64) -> PairedPrices {
        PairedPrices {
            leg1,
            leg2,
            timestamp: Utc::now(),
        }
    }

    #[test]
    fn test_open_add_close_long() {
        let mut leg = LegPosition::default();
        assert_eq!(leg.apply(10.0, 100.0), 0.0);
        assert_eq!(leg.apply(10.0, 110.0), 0.0);
        assert_eq!(leg.entry_price, 105.0);

        let realized = leg.apply(-20.0, 115.0);
        assert_eq!(realized, 200.0);
        assert!(leg.is_flat());
        assert_eq!(leg.entry_price, 0.0);
    }

    #[test]
    fn test_short_realizes_on_fall() {
        let mut leg = LegPosition::default();
        leg.apply(-5.0, 50.0);
        assert_eq!(leg.unrealized_pnl(45.0), 25.0);
        assert_eq!(leg.apply(5.0, 45.0), 25.0);
    }

    #[test]
    fn test_flip_resets_entry() {
        let mut leg = LegPosition::default();
        leg.apply(5.0, 10.0);
        let realized = leg.apply(-8.0, 12.0);
        assert_eq!(realized, 10.0);
        assert_eq!(leg.quantity, -3.0);
        assert_eq!(leg.entry_price, 12.0);
    }

    #[test]
    fn test_hedged_and_implied_signal() {
        let mut position = PositionState::new();
        assert!(position.is_flat());
        assert_eq!(position.implied_signal(), SpreadSignal::Flat);

        position.apply(LegId::Leg1, -10.0, 50.0);
        assert!(!position.is_hedged());
        assert_eq!(position.implied_signal(), SpreadSignal::SpreadShort);

        position.apply(LegId::Leg2, 10.0, 40.0);
        assert!(position.is_hedged());
        assert_eq!(position.quantity(LegId::Leg2), 10.0);
    }

    #[test]
    fn test_adverse_excursion() {
        let mut position = PositionState::new();
        assert_eq!(position.adverse_excursion(&prices(50.0, 40.0)), None);

        // short 10 @ 50, long 10 @ 40: notional 900
        position.apply(LegId::Leg1, -10.0, 50.0);
        position.apply(LegId::Leg2, 10.0, 40.0);

        // leg1 +5 against us, leg2 -4 against us: -90 / 900
        let excursion = position.adverse_excursion(&prices(55.0, 36.0)).unwrap();
        assert!((excursion - 0.1).abs() < 1e-12);

        // spread converged in our favour
        let excursion = position.adverse_excursion(&prices(45.0, 41.0)).unwrap();
        assert!(excursion < 0.0);
    }
}
