//! Pairs engine configuration

use crate::data::LegId;
use crate::error::EngineError;
use crate::Result;
use chrono::Duration;
use serde::{Deserialize, Serialize};

/// What the feed synchronizer does when one leg stops updating.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(tag = "mode", rename_all = "snake_case")]
pub enum StalenessPolicy {
    /// A pending price waits for its partner indefinitely.
    #[default]
    Wait,
    /// A pending price older than `max_age_ms` (measured against the arriving
    /// tick's timestamp) is dropped instead of being paired.
    Expire { max_age_ms: i64 },
}

impl StalenessPolicy {
    /// Maximum age of a pending price, if the policy expires them
    pub fn max_age(&self) -> Option<Duration> {
        match self {
            StalenessPolicy::Wait => None,
            StalenessPolicy::Expire { max_age_ms } => Some(Duration::milliseconds(*max_age_ms)),
        }
    }
}

/// What the coordinator does when leg2's order fails after leg1's was accepted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum HedgeFailurePolicy {
    /// Keep leg1's exposure, log loudly and surface the error.
    #[default]
    Alert,
    /// Submit the reverse of leg1's order to restore the previous exposure.
    Compensate,
}

/// Pairs engine configuration, immutable once the engine is built
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EngineConfig {
    /// First leg symbol (the dependent side of the residual)
    pub leg1: String,
    /// Second leg symbol (weighted by `beta`)
    pub leg2: String,
    /// Rolling window length in residual samples
    pub period: usize,
    /// |z| above which a flat engine opens a spread
    pub entry_threshold: f64,
    /// |z| below which an open spread is flattened
    pub exit_band: f64,
    /// Hedge ratio applied to leg2's price and volume
    pub beta: f64,
    /// Base volume traded on leg1 per entry
    pub base_volume: f64,
    /// Venue minimum volume increment; leg volumes are rounded to it
    pub volume_step: Option<f64>,
    /// Stale leg handling
    #[serde(default)]
    pub staleness: StalenessPolicy,
    /// Unhedged leg handling
    #[serde(default)]
    pub hedge_failure: HedgeFailurePolicy,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            leg1: String::new(),
            leg2: String::new(),
            period: 20,
            entry_threshold: 2.0,
            exit_band: 0.5,
            beta: 1.0,
            base_volume: 1.0,
            volume_step: None,
            staleness: StalenessPolicy::Wait,
            hedge_failure: HedgeFailurePolicy::Alert,
        }
    }
}

impl EngineConfig {
    /// Create a config for a specific pair with default parameters
    pub fn new(leg1: impl Into<String>, leg2: impl Into<String>) -> Self {
        Self {
            leg1: leg1.into(),
            leg2: leg2.into(),
            ..Default::default()
        }
    }

    /// Builder: set window length
    pub fn with_period(mut self, period: usize) -> Self {
        self.period = period;
        self
    }

    /// Builder: set entry threshold and exit band
    pub fn with_thresholds(mut self, entry_threshold: f64, exit_band: f64) -> Self {
        self.entry_threshold = entry_threshold;
        self.exit_band = exit_band;
        self
    }

    /// Builder: set hedge ratio
    pub fn with_beta(mut self, beta: f64) -> Self {
        self.beta = beta;
        self
    }

    /// Builder: set base volume
    pub fn with_base_volume(mut self, base_volume: f64) -> Self {
        self.base_volume = base_volume;
        self
    }

    /// Builder: set venue volume increment
    pub fn with_volume_step(mut self, step: f64) -> Self {
        self.volume_step = Some(step);
        self
    }

    /// Builder: set staleness policy
    pub fn with_staleness(mut self, staleness: StalenessPolicy) -> Self {
        self.staleness = staleness;
        self
    }

    /// Builder: set hedge failure policy
    pub fn with_hedge_failure(mut self, policy: HedgeFailurePolicy) -> Self {
        self.hedge_failure = policy;
        self
    }

    /// Symbol configured for a leg
    pub fn symbol(&self, leg: LegId) -> &str {
        match leg {
            LegId::Leg1 => &self.leg1,
            LegId::Leg2 => &self.leg2,
        }
    }

    /// Leg owning `symbol`, if any
    pub fn leg_for(&self, symbol: &str) -> Option<LegId> {
        if symbol == self.leg1 {
            Some(LegId::Leg1)
        } else if symbol == self.leg2 {
            Some(LegId::Leg2)
        } else {
            None
        }
    }

    /// Round a volume to the configured venue increment
    pub fn round_volume(&self, volume: f64) -> f64 {
        match self.volume_step {
            Some(step) => (volume / step).round() * step,
            None => volume,
        }
    }

    /// Leg1 volume opened on every entry
    pub fn leg1_entry_volume(&self) -> f64 {
        self.round_volume(self.base_volume)
    }

    /// Leg2 volume opened on every entry (`V * beta`)
    pub fn leg2_entry_volume(&self) -> f64 {
        self.round_volume(self.base_volume * self.beta)
    }

    /// Reject any configuration the engine cannot trade with
    pub fn validate(&self) -> Result<()> {
        if self.leg1.trim().is_empty() {
            return Err(EngineError::MissingLeg(LegId::Leg1));
        }
        if self.leg2.trim().is_empty() {
            return Err(EngineError::MissingLeg(LegId::Leg2));
        }
        if self.leg1 == self.leg2 {
            return Err(EngineError::InvalidConfig(format!(
                "both legs trade the same symbol {}",
                self.leg1
            )));
        }
        if self.period == 0 {
            return Err(EngineError::InvalidConfig("period must be greater than 0".to_string()));
        }

        ensure_positive("entry_threshold", self.entry_threshold)?;
        ensure_positive("exit_band", self.exit_band)?;
        ensure_positive("beta", self.beta)?;
        ensure_positive("base_volume", self.base_volume)?;
        if let Some(step) = self.volume_step {
            ensure_positive("volume_step", step)?;
        }
        if let StalenessPolicy::Expire { max_age_ms } = self.staleness {
            if max_age_ms <= 0 {
                return Err(EngineError::InvalidConfig(
                    "staleness max_age_ms must be greater than 0".to_string(),
                ));
            }
        }

        if self.exit_band >= self.entry_threshold {
            return Err(EngineError::InvalidConfig(format!(
                "exit_band ({}) must be smaller than entry_threshold ({})",
                self.exit_band, self.entry_threshold
            )));
        }

        if self.leg1_entry_volume() <= 0.0 || self.leg2_entry_volume() <= 0.0 {
            return Err(EngineError::InvalidConfig(format!(
                "entry volumes round to zero (leg1 {}, leg2 {})",
                self.leg1_entry_volume(),
                self.leg2_entry_volume()
            )));
        }

        Ok(())
    }
}

/// Fail unless `value` is finite and strictly positive
pub(crate) fn ensure_positive(name: &str, value: f64) -> Result<()> {
    if value.is_finite() && value > 0.0 {
        Ok(())
    } else {
        Err(EngineError::InvalidConfig(format!(
            "{} must be a finite value greater than 0, got {}",
            name, value
        )))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_pair_is_valid() {
        let config = EngineConfig::new("KO", "PEP");
        assert!(config.validate().is_ok());
        assert_eq!(config.symbol(LegId::Leg1), "KO");
        assert_eq!(config.leg_for("PEP"), Some(LegId::Leg2));
        assert_eq!(config.leg_for("MSFT"), None);
    }

    #[test]
    fn test_missing_second_leg_fails_fast() {
        let config = EngineConfig::new("KO", "");
        assert!(matches!(
            config.validate(),
            Err(EngineError::MissingLeg(LegId::Leg2))
        ));
    }

    #[test]
    fn test_non_positive_parameters_rejected() {
        let base = EngineConfig::new("KO", "PEP");

        assert!(base.clone().with_period(0).validate().is_err());
        assert!(base.clone().with_beta(0.0).validate().is_err());
        assert!(base.clone().with_beta(f64::NAN).validate().is_err());
        assert!(base.clone().with_base_volume(-1.0).validate().is_err());
        assert!(base.clone().with_thresholds(0.0, 0.5).validate().is_err());
        assert!(base.clone().with_thresholds(2.0, 0.0).validate().is_err());
        assert!(base
            .clone()
            .with_staleness(StalenessPolicy::Expire { max_age_ms: 0 })
            .validate()
            .is_err());
    }

    #[test]
    fn test_exit_band_must_sit_inside_entry_threshold() {
        let config = EngineConfig::new("KO", "PEP").with_thresholds(1.0, 1.5);
        assert!(matches!(config.validate(), Err(EngineError::InvalidConfig(_))));
    }

    #[test]
    fn test_volume_rounding() {
        let config = EngineConfig::new("KO", "PEP")
            .with_base_volume(10.0)
            .with_beta(0.73)
            .with_volume_step(0.5);

        assert_eq!(config.leg1_entry_volume(), 10.0);
        // 7.3 rounds to the nearest half lot
        assert_eq!(config.leg2_entry_volume(), 7.5);

        let too_small = EngineConfig::new("KO", "PEP")
            .with_base_volume(1.0)
            .with_beta(0.1)
            .with_volume_step(1.0);
        assert!(too_small.validate().is_err());
    }

    #[test]
    fn test_config_deserializes_with_policy_defaults() {
        let json = r#"{
            "leg1": "KO",
            "leg2": "PEP",
            "period": 30,
            "entry_threshold": 2.5,
            "exit_band": 0.25,
            "beta": 0.8,
            "base_volume": 100.0,
            "volume_step": null
        }"#;

        let config: EngineConfig = serde_json::from_str(json).unwrap();
        assert_eq!(config.period, 30);
        assert_eq!(config.staleness, StalenessPolicy::Wait);
        assert_eq!(config.hedge_failure, HedgeFailurePolicy::Alert);

        let expire: StalenessPolicy =
            serde_json::from_str(r#"{"mode": "expire", "max_age_ms": 5000}"#).unwrap();
        assert_eq!(expire.max_age(), Some(Duration::seconds(5)));
    }
}
