//! Spread signal states and transitions

use crate::exchange::OrderRequest;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Discrete spread state; exactly one is active at a time
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum SpreadSignal {
    /// No exposure on either leg
    #[default]
    Flat,
    /// Long leg1, short leg2 (residual expected to rise)
    SpreadLong,
    /// Short leg1, long leg2 (residual expected to fall)
    SpreadShort,
}

impl SpreadSignal {
    pub fn is_flat(&self) -> bool {
        *self == SpreadSignal::Flat
    }

    /// Sign of leg1's exposure in this state (+1 long, -1 short, 0 flat)
    pub fn leg1_sign(&self) -> f64 {
        match self {
            SpreadSignal::Flat => 0.0,
            SpreadSignal::SpreadLong => 1.0,
            SpreadSignal::SpreadShort => -1.0,
        }
    }
}

impl fmt::Display for SpreadSignal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            SpreadSignal::Flat => "Flat",
            SpreadSignal::SpreadLong => "SpreadLong",
            SpreadSignal::SpreadShort => "SpreadShort",
        };
        f.write_str(label)
    }
}

/// What triggered a transition
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum TransitionReason {
    /// Z-score crossed an entry threshold or came back inside the exit band
    ZScore,
    /// Adverse excursion on the combined spread exceeded the stop
    ProtectiveExit,
    /// Leftover exposure closed while the engine was already flat
    Unwind,
}

/// A signal change together with the orders it produced
#[derive(Debug, Clone, PartialEq)]
pub struct Transition {
    pub from: SpreadSignal,
    pub to: SpreadSignal,
    pub z_score: f64,
    pub reason: TransitionReason,
    /// Orders accepted by the execution port, leg1 first
    pub orders: Vec<OrderRequest>,
}
