//! Z-score signal evaluation

use crate::indicators::RollingStatistics;
use crate::strategy::SpreadSignal;
use crate::Result;

/// Result of scoring one residual against the trailing window
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Evaluation {
    pub z_score: f64,
    pub next: SpreadSignal,
}

/// Maps z-scores through entry/exit thresholds with hysteresis
#[derive(Debug, Clone, Copy)]
pub struct SignalEvaluator {
    entry_threshold: f64,
    exit_band: f64,
}

impl SignalEvaluator {
    /// Create evaluator; thresholds are validated by `EngineConfig`
    pub fn new(entry_threshold: f64, exit_band: f64) -> Self {
        Self {
            entry_threshold,
            exit_band,
        }
    }

    pub fn entry_threshold(&self) -> f64 {
        self.entry_threshold
    }

    pub fn exit_band(&self) -> f64 {
        self.exit_band
    }

    /// Standard deviations between `residual` and the window mean
    pub fn z_score(residual: f64, stats: &RollingStatistics) -> Result<f64> {
        let mean = stats.mean()?;
        let std_dev = stats.std_dev()?;
        Ok((residual - mean) / std_dev)
    }

    /// Transition table: entries only from Flat, exits only into Flat
    pub fn next_signal(&self, current: SpreadSignal, z_score: f64) -> SpreadSignal {
        match current {
            SpreadSignal::Flat if z_score < -self.entry_threshold => SpreadSignal::SpreadLong,
            SpreadSignal::Flat if z_score > self.entry_threshold => SpreadSignal::SpreadShort,
            SpreadSignal::SpreadLong | SpreadSignal::SpreadShort
                if z_score.abs() < self.exit_band =>
            {
                SpreadSignal::Flat
            }
            held => held,
        }
    }

    /// Score `residual` against `stats`; `None` until the window is full
    pub fn evaluate(
        &self,
        current: SpreadSignal,
        residual: f64,
        stats: &RollingStatistics,
    ) -> Result<Option<Evaluation>> {
        if !stats.is_ready() {
            return Ok(None);
        }
        let z_score = Self::z_score(residual, stats)?;
        Ok(Some(Evaluation {
            z_score,
            next: self.next_signal(current, z_score),
        }))
    }
}
