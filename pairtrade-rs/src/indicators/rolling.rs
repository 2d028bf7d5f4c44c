//! Rolling window statistics with O(1) updates

use crate::error::EngineError;
use crate::indicators::Indicator;
use crate::Result;
use std::collections::VecDeque;

/// Variance substituted when the running sums cancel to zero or below
pub const VARIANCE_FLOOR: f64 = 1e-4;

/// Bounded window of samples with running sum and sum of squares.
///
/// `sum` and `sum_sq` always describe exactly the samples in `window`; every
/// push adjusts them for the appended sample and, once the window is full,
/// for the evicted one.
#[derive(Debug, Clone)]
pub struct RollingStatistics {
    period: usize,
    window: VecDeque<f64>,
    sum: f64,
    sum_sq: f64,
}

impl RollingStatistics {
    /// Create an empty window holding at most `period` samples
    pub fn new(period: usize) -> Self {
        Self {
            period,
            window: VecDeque::with_capacity(period + 1),
            sum: 0.0,
            sum_sq: 0.0,
        }
    }

    /// Append a sample, returning the evicted one once the window slides
    pub fn push(&mut self, value: f64) -> Option<f64> {
        self.window.push_back(value);
        self.sum += value;
        self.sum_sq += value * value;

        if self.window.len() > self.period {
            let evicted = self.window.pop_front()?;
            self.sum -= evicted;
            self.sum_sq -= evicted * evicted;
            Some(evicted)
        } else {
            None
        }
    }

    /// Window length
    pub fn period(&self) -> usize {
        self.period
    }

    /// Number of samples currently held
    pub fn len(&self) -> usize {
        self.window.len()
    }

    /// Check if the window holds no samples
    pub fn is_empty(&self) -> bool {
        self.window.is_empty()
    }

    /// True once `period` samples have been pushed
    pub fn is_ready(&self) -> bool {
        self.window.len() == self.period
    }

    /// Samples oldest first
    pub fn samples(&self) -> impl Iterator<Item = f64> + '_ {
        self.window.iter().copied()
    }

    /// Running sum of the held samples
    pub fn sum(&self) -> f64 {
        self.sum
    }

    /// Running sum of squares of the held samples
    pub fn sum_of_squares(&self) -> f64 {
        self.sum_sq
    }

    fn ensure_ready(&self) -> Result<()> {
        if self.is_ready() {
            Ok(())
        } else {
            Err(EngineError::WindowNotReady {
                have: self.window.len(),
                need: self.period,
            })
        }
    }

    /// Mean of the window
    pub fn mean(&self) -> Result<f64> {
        self.ensure_ready()?;
        Ok(self.sum / self.period as f64)
    }

    /// Population variance of the window, floored at [`VARIANCE_FLOOR`]
    pub fn variance(&self) -> Result<f64> {
        let mean = self.mean()?;
        let variance = self.sum_sq / self.period as f64 - mean * mean;
        if variance > 0.0 {
            Ok(variance)
        } else {
            Ok(VARIANCE_FLOOR)
        }
    }

    /// Standard deviation of the window
    pub fn std_dev(&self) -> Result<f64> {
        Ok(self.variance()?.sqrt())
    }

    /// Whether the variance is currently the floor value rather than measured
    pub fn is_variance_floored(&self) -> bool {
        match self.mean() {
            Ok(mean) => self.sum_sq / self.period as f64 - mean * mean <= 0.0,
            Err(_) => false,
        }
    }
}

impl Indicator for RollingStatistics {
    fn name(&self) -> &str {
        "RollingStatistics"
    }

    fn update(&mut self, value: f64) {
        self.push(value);
    }

    fn value(&self) -> Option<f64> {
        self.mean().ok()
    }

    fn is_ready(&self) -> bool {
        RollingStatistics::is_ready(self)
    }
}
