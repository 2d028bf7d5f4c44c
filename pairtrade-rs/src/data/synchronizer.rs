//! Dual-feed synchronization
//!
//! Buffers the latest price of each leg and emits a pair only once both legs
//! have updated since the previous pair. At most one pending price is kept per
//! leg: a newer update for the same leg replaces the older one.

use crate::config::StalenessPolicy;
use crate::data::LegId;
use chrono::{DateTime, Utc};
use tracing::{debug, warn};

/// Latest known state of one leg's feed
#[derive(Debug, Clone, Default)]
pub struct Leg {
    /// Last price received, if any
    pub last_price: Option<f64>,
    /// Whether `last_price` arrived after the previous pair was emitted
    pub has_fresh_update: bool,
    /// Timestamp of the last update
    pub updated_at: Option<DateTime<Utc>>,
}

/// Both legs' prices for one synchronized tick
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PairedPrices {
    pub leg1: f64,
    pub leg2: f64,
    /// Timestamp of the update that completed the pair
    pub timestamp: DateTime<Utc>,
}

impl PairedPrices {
    /// Price of one leg
    pub fn price(&self, leg: LegId) -> f64 {
        match leg {
            LegId::Leg1 => self.leg1,
            LegId::Leg2 => self.leg2,
        }
    }
}

/// "Wait for both" join over the two price feeds
#[derive(Debug, Clone)]
pub struct FeedSynchronizer {
    legs: [Leg; 2],
    policy: StalenessPolicy,
    pairs_emitted: u64,
    expired: u64,
}

impl FeedSynchronizer {
    /// Create synchronizer with no prices yet
    pub fn new(policy: StalenessPolicy) -> Self {
        Self {
            legs: [Leg::default(), Leg::default()],
            policy,
            pairs_emitted: 0,
            expired: 0,
        }
    }

    /// Record a price update and return the pair if both legs are now fresh
    pub fn on_leg_update(
        &mut self,
        leg: LegId,
        price: f64,
        timestamp: DateTime<Utc>,
    ) -> Option<PairedPrices> {
        let slot = &mut self.legs[leg.index()];
        if slot.has_fresh_update {
            debug!(%leg, previous = ?slot.last_price, price, "Replacing unpaired price");
        }
        slot.last_price = Some(price);
        slot.has_fresh_update = true;
        slot.updated_at = Some(timestamp);

        let other = leg.other();
        if !self.legs[other.index()].has_fresh_update {
            return None;
        }

        if let Some(max_age) = self.policy.max_age() {
            let pending = &mut self.legs[other.index()];
            let age = pending.updated_at.map(|at| timestamp - at);
            if age.map_or(false, |age| age > max_age) {
                warn!(
                    leg = %other,
                    age_ms = age.map(|a| a.num_milliseconds()),
                    max_age_ms = max_age.num_milliseconds(),
                    "Dropping stale pending price"
                );
                pending.has_fresh_update = false;
                self.expired += 1;
                return None;
            }
        }

        let [leg1, leg2] = &mut self.legs;
        leg1.has_fresh_update = false;
        leg2.has_fresh_update = false;
        self.pairs_emitted += 1;

        Some(PairedPrices {
            leg1: leg1.last_price?,
            leg2: leg2.last_price?,
            timestamp,
        })
    }

    /// State of one leg
    pub fn leg(&self, leg: LegId) -> &Leg {
        &self.legs[leg.index()]
    }

    /// Last known price of one leg, fresh or not
    pub fn last_price(&self, leg: LegId) -> Option<f64> {
        self.legs[leg.index()].last_price
    }

    /// Number of pairs emitted so far
    pub fn pairs_emitted(&self) -> u64 {
        self.pairs_emitted
    }

    /// Number of pending prices dropped by the staleness policy
    pub fn expired(&self) -> u64 {
        self.expired
    }
}
