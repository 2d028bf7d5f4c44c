//! Price tick data structures

use anyhow::Context;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::io::BufRead;

/// One of the two traded instruments
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum LegId {
    /// Dependent leg of the residual
    Leg1,
    /// Hedge leg, weighted by beta
    Leg2,
}

impl LegId {
    /// Both legs, in submission order
    pub const BOTH: [LegId; 2] = [LegId::Leg1, LegId::Leg2];

    /// The paired leg
    pub fn other(self) -> LegId {
        match self {
            LegId::Leg1 => LegId::Leg2,
            LegId::Leg2 => LegId::Leg1,
        }
    }

    pub(crate) fn index(self) -> usize {
        match self {
            LegId::Leg1 => 0,
            LegId::Leg2 => 1,
        }
    }
}

impl fmt::Display for LegId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LegId::Leg1 => write!(f, "leg1"),
            LegId::Leg2 => write!(f, "leg2"),
        }
    }
}

/// Close price of one completed bar or tick for one instrument
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PriceTick {
    /// Symbol (e.g., "KO")
    pub symbol: String,
    /// Close price
    pub price: f64,
    /// Bar close / tick time
    pub timestamp: DateTime<Utc>,
}

impl PriceTick {
    /// Create new tick
    pub fn new(symbol: impl Into<String>, price: f64, timestamp: DateTime<Utc>) -> Self {
        Self {
            symbol: symbol.into(),
            price,
            timestamp,
        }
    }
}

/// Ordered collection of ticks for both legs, replayed in arrival order
#[derive(Debug, Clone, Default)]
pub struct TickSeries {
    ticks: Vec<PriceTick>,
}

impl TickSeries {
    /// Create new empty series
    pub fn new() -> Self {
        Self { ticks: Vec::new() }
    }

    /// Create from vector of ticks
    pub fn from_vec(ticks: Vec<PriceTick>) -> Self {
        Self { ticks }
    }

    /// Parse one JSON tick object per line; blank lines are ignored
    pub fn from_json_lines<R: BufRead>(reader: R) -> anyhow::Result<Self> {
        let mut ticks = Vec::new();
        for (index, line) in reader.lines().enumerate() {
            let line = line.with_context(|| format!("Failed to read tick line {}", index + 1))?;
            let line = line.trim();
            if line.is_empty() {
                continue;
            }
            let tick: PriceTick = serde_json::from_str(line)
                .with_context(|| format!("Malformed tick on line {}", index + 1))?;
            ticks.push(tick);
        }
        Ok(Self { ticks })
    }

    /// Add a tick
    pub fn push(&mut self, tick: PriceTick) {
        self.ticks.push(tick);
    }

    /// Get number of ticks
    pub fn len(&self) -> usize {
        self.ticks.len()
    }

    /// Check if series is empty
    pub fn is_empty(&self) -> bool {
        self.ticks.is_empty()
    }

    /// Get all ticks
    pub fn ticks(&self) -> &[PriceTick] {
        &self.ticks
    }

    /// Ticks for one symbol
    pub fn for_symbol<'a>(&'a self, symbol: &'a str) -> impl Iterator<Item = &'a PriceTick> + 'a {
        self.ticks.iter().filter(move |t| t.symbol == symbol)
    }
}

impl From<Vec<PriceTick>> for TickSeries {
    fn from(ticks: Vec<PriceTick>) -> Self {
        Self::from_vec(ticks)
    }
}

impl IntoIterator for TickSeries {
    type Item = PriceTick;
    type IntoIter = std::vec::IntoIter<PriceTick>;

    fn into_iter(self) -> Self::IntoIter {
        self.ticks.into_iter()
    }
}
