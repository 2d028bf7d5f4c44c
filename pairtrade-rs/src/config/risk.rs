//! Risk management configuration

use crate::config::engine::ensure_positive;
use crate::Result;
use serde::{Deserialize, Serialize};

/// Risk management configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RiskConfig {
    /// Maximum adverse excursion of the combined spread before a forced
    /// flatten (as fraction of entry notional, e.g., 0.05 = 5%)
    pub stop_loss_pct: Option<f64>,
}

impl RiskConfig {
    /// Protective exit at the given adverse excursion
    pub fn with_stop_loss(stop_loss_pct: f64) -> Self {
        Self {
            stop_loss_pct: Some(stop_loss_pct),
        }
    }

    /// Validate configured limits
    pub fn validate(&self) -> Result<()> {
        if let Some(pct) = self.stop_loss_pct {
            ensure_positive("stop_loss_pct", pct)?;
        }
        Ok(())
    }
}
