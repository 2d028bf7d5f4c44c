//! Pairtrade-RS: a statistical pairs-trading engine
//!
//! Tracks two independently arriving price streams, computes the weighted
//! residual `leg1 - beta * leg2` once both legs are fresh, keeps a bounded
//! rolling window of residuals with incremental mean/variance, derives a
//! z-score and drives a two-leg position state machine.
//!
//! # Features
//!
//! - **Data**: price ticks, per-leg freshness tracking and the pair join
//! - **Indicators**: O(1) rolling mean/variance over the residual window
//! - **Strategy**: residual computation and z-score entry/exit signals
//! - **Portfolio**: signed per-leg exposure, hedge-ratio sizing, protective exit
//! - **Exchange**: order requests and the execution port trait
//! - **Backtesting**: tick replay with simulated fills and performance metrics
//!
//! # Example
//!
//! ```no_run
//! use pairtrade_rs::prelude::*;
//! use chrono::Utc;
//!
//! fn main() -> pairtrade_rs::Result<()> {
//!     let config = EngineConfig::new("KO", "PEP")
//!         .with_period(20)
//!         .with_thresholds(2.0, 0.5);
//!     let sink = |order: &OrderRequest| -> std::result::Result<(), ExecutionError> {
//!         println!("{:?} {} {}", order.side, order.volume, order.symbol);
//!         Ok(())
//!     };
//!     let mut engine = PairsEngine::new(config, RiskConfig::default(), sink)?;
//!     engine.on_leg_update(LegId::Leg1, 61.2, Utc::now())?;
//!     engine.on_leg_update(LegId::Leg2, 171.9, Utc::now())?;
//!     Ok(())
//! }
//! ```

pub mod config;
pub mod data;
pub mod engine;
pub mod error;
pub mod exchange;
pub mod indicators;
pub mod portfolio;
pub mod strategy;
pub mod backtest;

// Re-export commonly used types
pub mod prelude {
    pub use crate::config::*;
    pub use crate::data::*;
    pub use crate::engine::*;
    pub use crate::error::*;
    pub use crate::exchange::*;
    pub use crate::indicators::*;
    pub use crate::portfolio::*;
    pub use crate::strategy::*;
    pub use crate::backtest::*;
}

/// Result type alias
pub type Result<T> = std::result::Result<T, error::EngineError>;
