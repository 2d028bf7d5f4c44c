//! Backtesting engine

use crate::config::{EngineConfig, RiskConfig};
use crate::backtest::MetricsCalculator;
use crate::data::{LegId, PairedPrices, PriceTick, TickSeries};
use crate::engine::{PairsEngine, UpdateOutcome};
use crate::error::EngineError;
use crate::exchange::RecordingSink;
use crate::strategy::{SpreadSignal, Transition, TransitionReason};
use anyhow::Context;
use chrono::{DateTime, Utc};
use serde::Serialize;
use tracing::{debug, info};

/// Backtest result
#[derive(Debug, Clone, Serialize)]
pub struct BacktestResult {
    /// Starting balance
    pub start_balance: f64,
    /// Ending balance (open spread marked to market)
    pub end_balance: f64,
    /// Total return
    pub total_return: f64,
    /// Total return percentage
    pub total_return_percent: f64,
    /// Number of closed spread trades
    pub num_trades: usize,
    /// Winning trades
    pub winning_trades: usize,
    /// Losing trades
    pub losing_trades: usize,
    /// Win rate
    pub win_rate: f64,
    /// Average profit
    pub avg_profit: f64,
    /// Average loss
    pub avg_loss: f64,
    /// Maximum drawdown
    pub max_drawdown: f64,
    /// Sharpe ratio
    pub sharpe_ratio: f64,
    /// Trades closed by the protective exit
    pub protective_exits: usize,
    /// Ticks replayed
    pub ticks_processed: usize,
    /// Pairs skipped for unusable prices
    pub skipped_pairs: usize,
    /// Closed trades, oldest first
    pub trades: Vec<SpreadTrade>,
}

/// One round trip on the spread
#[derive(Debug, Clone, Serialize)]
pub struct SpreadTrade {
    pub direction: SpreadSignal,
    pub entry_time: DateTime<Utc>,
    pub exit_time: DateTime<Utc>,
    pub entry_z: f64,
    pub exit_z: f64,
    pub exit_reason: TransitionReason,
    /// Combined P&L of both legs
    pub pnl: f64,
    /// P&L as percentage of gross entry notional
    pub pnl_percent: f64,
}

#[derive(Debug, Clone)]
struct OpenTrade {
    direction: SpreadSignal,
    entry_time: DateTime<Utc>,
    entry_z: f64,
    realized_before: f64,
    entry_notional: f64,
}

/// Replays ticks through a pairs engine that fills every order instantly at
/// the synchronized prices
pub struct BacktestEngine {
    /// Initial balance
    pub initial_balance: f64,
}

impl BacktestEngine {
    /// Create new backtest engine
    pub fn new(initial_balance: f64) -> Self {
        Self { initial_balance }
    }

    /// Run backtest over a complete series
    pub fn run(
        &mut self,
        config: EngineConfig,
        risk: RiskConfig,
        ticks: &TickSeries,
    ) -> anyhow::Result<BacktestResult> {
        let mut session = BacktestSession::new(self.initial_balance, config, risk)?;
        for tick in ticks.ticks() {
            session.on_tick(tick)?;
        }
        Ok(session.finish())
    }
}

/// Incremental backtest fed one tick at a time
pub struct BacktestSession {
    engine: PairsEngine<RecordingSink>,
    initial_balance: f64,
    balance: f64,
    trades: Vec<SpreadTrade>,
    open: Option<OpenTrade>,
    ticks_processed: usize,
    skipped_pairs: usize,
}

impl BacktestSession {
    /// Build the engine over a paper execution port
    pub fn new(initial_balance: f64, config: EngineConfig, risk: RiskConfig) -> anyhow::Result<Self> {
        let engine = PairsEngine::new(config, risk, RecordingSink::new())
            .context("Invalid engine configuration")?;
        Ok(Self {
            engine,
            initial_balance,
            balance: initial_balance,
            trades: Vec::new(),
            open: None,
            ticks_processed: 0,
            skipped_pairs: 0,
        })
    }

    /// Feed one tick; `None` for symbols outside the pair
    pub fn on_tick(&mut self, tick: &PriceTick) -> anyhow::Result<Option<UpdateOutcome>> {
        self.ticks_processed += 1;
        let outcome = match self.engine.on_tick(tick) {
            Ok(outcome) => outcome,
            Err(EngineError::UnknownSymbol(symbol)) => {
                debug!(%symbol, "Ignoring tick for unrelated symbol");
                return Ok(None);
            }
            Err(err) => {
                return Err(err).with_context(|| format!("Engine failed at {}", tick.timestamp))
            }
        };

        match &outcome {
            UpdateOutcome::Skipped { .. } => self.skipped_pairs += 1,
            UpdateOutcome::Evaluated {
                transition: Some(transition),
                ..
            } => self.record_transition(transition, tick.timestamp),
            _ => {}
        }
        // fills are taken from the engine's position, not the sink
        for order in self.engine.sink_mut().drain() {
            debug!(id = %order.id, %order, "Paper order filled");
        }
        Ok(Some(outcome))
    }

    /// Engine driven by this session
    pub fn engine(&self) -> &PairsEngine<RecordingSink> {
        &self.engine
    }

    fn record_transition(&mut self, transition: &Transition, timestamp: DateTime<Utc>) {
        let position = self.engine.position();

        if !transition.to.is_flat() {
            self.open = Some(OpenTrade {
                direction: transition.to,
                entry_time: timestamp,
                entry_z: transition.z_score,
                realized_before: position.realized_pnl(),
                entry_notional: position.entry_notional(),
            });
            return;
        }

        if let Some(open) = self.open.take() {
            let pnl = position.realized_pnl() - open.realized_before;
            let pnl_percent = if open.entry_notional > 0.0 {
                pnl / open.entry_notional * 100.0
            } else {
                0.0
            };
            self.balance += pnl;
            self.trades.push(SpreadTrade {
                direction: open.direction,
                entry_time: open.entry_time,
                exit_time: timestamp,
                entry_z: open.entry_z,
                exit_z: transition.z_score,
                exit_reason: transition.reason,
                pnl,
                pnl_percent,
            });
        }
    }

    /// Mark any open spread to market and summarise the closed trades
    pub fn finish(self) -> BacktestResult {
        let synchronizer = self.engine.synchronizer();
        let open_pnl = match (
            synchronizer.last_price(LegId::Leg1),
            synchronizer.last_price(LegId::Leg2),
        ) {
            (Some(leg1), Some(leg2)) => self.engine.position().unrealized_pnl(&PairedPrices {
                leg1,
                leg2,
                timestamp: Utc::now(),
            }),
            _ => 0.0,
        };

        info!(
            ticks = self.ticks_processed,
            trades = self.trades.len(),
            open_pnl,
            "Backtest finished"
        );

        let trades = self.trades;
        let end_balance = self.balance + open_pnl;
        let total_return = end_balance - self.initial_balance;

        BacktestResult {
            start_balance: self.initial_balance,
            end_balance,
            total_return,
            total_return_percent: total_return / self.initial_balance * 100.0,
            num_trades: trades.len(),
            winning_trades: trades.iter().filter(|t| t.pnl > 0.0).count(),
            losing_trades: trades.iter().filter(|t| t.pnl < 0.0).count(),
            win_rate: MetricsCalculator::win_rate(&trades),
            avg_profit: MetricsCalculator::avg_profit(&trades),
            avg_loss: MetricsCalculator::avg_loss(&trades),
            max_drawdown: MetricsCalculator::max_drawdown(self.initial_balance, &trades),
            sharpe_ratio: MetricsCalculator::sharpe_ratio(&trades),
            protective_exits: trades
                .iter()
                .filter(|t| t.exit_reason == TransitionReason::ProtectiveExit)
                .count(),
            ticks_processed: self.ticks_processed,
            skipped_pairs: self.skipped_pairs,
            trades,
        }
    }
}
