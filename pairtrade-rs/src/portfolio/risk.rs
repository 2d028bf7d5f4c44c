//! Risk management

use crate::config::RiskConfig;
use crate::data::PairedPrices;
use crate::portfolio::PositionState;

/// Forces a flatten when the combined spread loses more than the stop
#[derive(Debug, Clone)]
pub struct ProtectiveExit {
    stop_loss_pct: Option<f64>,
}

impl ProtectiveExit {
    /// Create from risk configuration
    pub fn new(config: &RiskConfig) -> Self {
        Self {
            stop_loss_pct: config.stop_loss_pct,
        }
    }

    pub fn is_enabled(&self) -> bool {
        self.stop_loss_pct.is_some()
    }

    /// Adverse excursion that breached the stop, if any
    pub fn check(&self, position: &PositionState, prices: &PairedPrices) -> Option<f64> {
        let stop = self.stop_loss_pct?;
        let excursion = position.adverse_excursion(prices)?;
        (excursion > stop).then_some(excursion)
    }
}
