//! Pairs engine
//!
//! Wires the feed synchronizer, residual window, signal evaluator and position
//! coordinator together. All mutation goes through [`PairsEngine::on_leg_update`]
//! (or [`PairsEngine::on_tick`]); each call runs synchronously to completion.

use crate::config::{EngineConfig, RiskConfig};
use crate::data::{FeedSynchronizer, LegId, PairedPrices, PriceTick};
use crate::error::EngineError;
use crate::exchange::OrderSink;
use crate::indicators::RollingStatistics;
use crate::portfolio::{PositionCoordinator, PositionState, ProtectiveExit};
use crate::strategy::{ResidualComputer, SignalEvaluator, SpreadSignal, Transition, TransitionReason};
use crate::Result;
use chrono::{DateTime, Utc};
use tracing::{debug, error, info, warn};

/// Everything the engine mutates while trading
#[derive(Debug, Clone)]
pub struct EngineState {
    /// Trailing residual window
    pub window: RollingStatistics,
    /// Exposure accepted by the execution port
    pub position: PositionState,
    /// Active spread state
    pub signal: SpreadSignal,
    /// False after a protective exit until |z| returns inside the exit band
    pub entries_armed: bool,
}

impl EngineState {
    fn new(period: usize) -> Self {
        Self {
            window: RollingStatistics::new(period),
            position: PositionState::new(),
            signal: SpreadSignal::Flat,
            entries_armed: true,
        }
    }
}

/// What one price update did
#[derive(Debug, Clone, PartialEq)]
pub enum UpdateOutcome {
    /// Waiting for the other leg
    Pending,
    /// The pair had an unusable price; nothing was pushed or evaluated
    Skipped { leg1: f64, leg2: f64 },
    /// Residual pushed, window not full yet
    WarmingUp { samples: usize },
    /// Residual scored and pushed
    Evaluated {
        residual: f64,
        z_score: f64,
        signal: SpreadSignal,
        transition: Option<Transition>,
    },
}

impl UpdateOutcome {
    /// Transition taken on this update, if any
    pub fn transition(&self) -> Option<&Transition> {
        match self {
            UpdateOutcome::Evaluated { transition, .. } => transition.as_ref(),
            _ => None,
        }
    }
}

/// Statistical pairs-trading engine over an injected execution port
pub struct PairsEngine<S: OrderSink> {
    config: EngineConfig,
    synchronizer: FeedSynchronizer,
    residuals: ResidualComputer,
    evaluator: SignalEvaluator,
    coordinator: PositionCoordinator,
    protective_exit: ProtectiveExit,
    state: EngineState,
    sink: S,
}

impl<S: OrderSink> PairsEngine<S> {
    /// Validate configuration and build an engine with an empty window
    pub fn new(config: EngineConfig, risk: RiskConfig, sink: S) -> Result<Self> {
        config.validate()?;
        risk.validate()?;

        info!(
            leg1 = %config.leg1,
            leg2 = %config.leg2,
            period = config.period,
            entry_threshold = config.entry_threshold,
            exit_band = config.exit_band,
            beta = config.beta,
            base_volume = config.base_volume,
            stop_loss_pct = ?risk.stop_loss_pct,
            "Pairs engine initialized"
        );

        Ok(Self {
            synchronizer: FeedSynchronizer::new(config.staleness),
            residuals: ResidualComputer::new(config.beta),
            evaluator: SignalEvaluator::new(config.entry_threshold, config.exit_band),
            coordinator: PositionCoordinator::new(&config),
            protective_exit: ProtectiveExit::new(&risk),
            state: EngineState::new(config.period),
            config,
            sink,
        })
    }

    /// Route a tick to its leg by symbol
    pub fn on_tick(&mut self, tick: &PriceTick) -> Result<UpdateOutcome> {
        let leg = self
            .config
            .leg_for(&tick.symbol)
            .ok_or_else(|| EngineError::UnknownSymbol(tick.symbol.clone()))?;
        self.on_leg_update(leg, tick.price, tick.timestamp)
    }

    /// Process one price update for one leg
    pub fn on_leg_update(
        &mut self,
        leg: LegId,
        price: f64,
        timestamp: DateTime<Utc>,
    ) -> Result<UpdateOutcome> {
        match self.synchronizer.on_leg_update(leg, price, timestamp) {
            Some(pair) => self.process_pair(pair),
            None => Ok(UpdateOutcome::Pending),
        }
    }

    fn process_pair(&mut self, pair: PairedPrices) -> Result<UpdateOutcome> {
        let Some(residual) = self.residuals.residual(&pair) else {
            warn!(leg1 = pair.leg1, leg2 = pair.leg2, "Unusable price, skipping tick");
            return Ok(UpdateOutcome::Skipped {
                leg1: pair.leg1,
                leg2: pair.leg2,
            });
        };

        // Scored against the trailing window, then pushed
        let evaluation = self
            .evaluator
            .evaluate(self.state.signal, residual, &self.state.window)?;
        self.state.window.push(residual);

        let Some(evaluation) = evaluation else {
            debug!(residual, samples = self.state.window.len(), "Window warming up");
            return Ok(UpdateOutcome::WarmingUp {
                samples: self.state.window.len(),
            });
        };
        let z_score = evaluation.z_score;
        debug!(residual, z_score, signal = %self.state.signal, "Residual scored");

        if let Some(excursion) = self.protective_exit.check(&self.state.position, &pair) {
            warn!(excursion, z_score, "Protective exit triggered");
            self.state.entries_armed = false;
            let transition =
                self.transition(SpreadSignal::Flat, z_score, TransitionReason::ProtectiveExit, &pair)?;
            return Ok(self.evaluated(residual, z_score, Some(transition)));
        }

        if !self.state.entries_armed && z_score.abs() < self.evaluator.exit_band() {
            info!(z_score, "Spread back inside exit band, entries re-armed");
            self.state.entries_armed = true;
        }

        let mut next = evaluation.next;
        if self.state.signal.is_flat() && !next.is_flat() && !self.state.entries_armed {
            debug!(z_score, target = %next, "Entry suppressed after protective exit");
            next = SpreadSignal::Flat;
        }

        let transition = if next != self.state.signal {
            Some(self.transition(next, z_score, TransitionReason::ZScore, &pair)?)
        } else if next.is_flat() && !self.state.position.is_flat() {
            // a flatten that failed part-way is retried until both legs are closed
            warn!(
                leg1_quantity = self.state.position.quantity(LegId::Leg1),
                leg2_quantity = self.state.position.quantity(LegId::Leg2),
                "Flat with open exposure, retrying flatten"
            );
            Some(self.transition(SpreadSignal::Flat, z_score, TransitionReason::Unwind, &pair)?)
        } else {
            None
        };

        Ok(self.evaluated(residual, z_score, transition))
    }

    fn evaluated(&self, residual: f64, z_score: f64, transition: Option<Transition>) -> UpdateOutcome {
        UpdateOutcome::Evaluated {
            residual,
            z_score,
            signal: self.state.signal,
            transition,
        }
    }

    fn transition(
        &mut self,
        to: SpreadSignal,
        z_score: f64,
        reason: TransitionReason,
        pair: &PairedPrices,
    ) -> Result<Transition> {
        let from = self.state.signal;
        match self
            .coordinator
            .apply_transition(&mut self.state.position, to, pair, &mut self.sink)
        {
            Ok(orders) => {
                self.state.signal = to;
                info!(%from, %to, z_score, ?reason, orders = orders.len(), "Spread transition");
                Ok(Transition {
                    from,
                    to,
                    z_score,
                    reason,
                    orders,
                })
            }
            Err(err) => {
                self.state.signal = self.state.position.implied_signal();
                error!(
                    %from,
                    %to,
                    z_score,
                    signal = %self.state.signal,
                    error = %err,
                    "Spread transition failed"
                );
                Err(err)
            }
        }
    }

    /// Active spread state
    pub fn signal(&self) -> SpreadSignal {
        self.state.signal
    }

    /// Exposure held on both legs
    pub fn position(&self) -> &PositionState {
        &self.state.position
    }

    /// Full engine state
    pub fn state(&self) -> &EngineState {
        &self.state
    }

    /// Feed synchronizer state
    pub fn synchronizer(&self) -> &FeedSynchronizer {
        &self.synchronizer
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// Execution port
    pub fn sink(&self) -> &S {
        &self.sink
    }

    /// Execution port, mutable
    pub fn sink_mut(&mut self) -> &mut S {
        &mut self.sink
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::exchange::RecordingSink;

    fn t(secs: i64) -> DateTime<Utc> {
        DateTime::from_timestamp(1_700_000_000 + secs, 0).unwrap()
    }

    fn engine(period: usize) -> PairsEngine<RecordingSink> {
        let config = EngineConfig::new("A", "B")
            .with_period(period)
            .with_thresholds(2.0, 0.5)
            .with_base_volume(10.0);
        PairsEngine::new(config, RiskConfig::default(), RecordingSink::new()).unwrap()
    }

    /// Feed a pair whose residual is `residual` (leg2 fixed at 100, beta 1)
    fn push(engine: &mut PairsEngine<RecordingSink>, step: i64, residual: f64) -> UpdateOutcome {
        engine.on_leg_update(LegId::Leg1, 100.0 + residual, t(step)).unwrap();
        engine.on_leg_update(LegId::Leg2, 100.0, t(step)).unwrap()
    }

    #[test]
    fn test_construction_validates() {
        let config = EngineConfig::new("A", "");
        let result = PairsEngine::new(config, RiskConfig::default(), RecordingSink::new());
        assert!(matches!(result, Err(EngineError::MissingLeg(LegId::Leg2))));

        let risk = RiskConfig::with_stop_loss(-0.1);
        let result = PairsEngine::new(EngineConfig::new("A", "B"), risk, RecordingSink::new());
        assert!(matches!(result, Err(EngineError::InvalidConfig(_))));
    }

    #[test]
    fn test_unknown_symbol() {
        let mut engine = engine(3);
        let result = engine.on_tick(&PriceTick::new("C", 1.0, t(0)));
        assert!(matches!(result, Err(EngineError::UnknownSymbol(s)) if s == "C"));
    }

    #[test]
    fn test_pending_until_both_legs() {
        let mut engine = engine(3);
        let outcome = engine.on_leg_update(LegId::Leg1, 101.0, t(0)).unwrap();
        assert_eq!(outcome, UpdateOutcome::Pending);
        let outcome = engine.on_leg_update(LegId::Leg2, 100.0, t(0)).unwrap();
        assert_eq!(outcome, UpdateOutcome::WarmingUp { samples: 1 });
    }

    #[test]
    fn test_zero_price_skips_without_touching_window() {
        let mut engine = engine(3);
        engine.on_leg_update(LegId::Leg1, 0.0, t(0)).unwrap();
        let outcome = engine.on_leg_update(LegId::Leg2, 100.0, t(0)).unwrap();

        assert_eq!(
            outcome,
            UpdateOutcome::Skipped {
                leg1: 0.0,
                leg2: 100.0
            }
        );
        assert!(engine.state().window.is_empty());
    }

    #[test]
    fn test_holding_does_not_reorder() {
        let mut engine = engine(3);
        for step in 0..3 {
            push(&mut engine, step, 1.0);
        }

        let first = push(&mut engine, 3, -5.0);
        assert_eq!(first.transition().map(|t| t.to), Some(SpreadSignal::SpreadLong));
        assert_eq!(engine.sink().orders().len(), 2);

        // Still far below the trailing mean: held, not re-entered
        let second = push(&mut engine, 4, -20.0);
        assert!(second.transition().is_none());
        assert_eq!(engine.signal(), SpreadSignal::SpreadLong);
        assert_eq!(engine.sink().orders().len(), 2);
    }

    #[test]
    fn test_failed_hedge_leaves_engine_in_implied_state() {
        let mut engine = engine(3);
        for step in 0..3 {
            push(&mut engine, step, 1.0);
        }
        engine.sink_mut().reject_leg(LegId::Leg2);

        engine.on_leg_update(LegId::Leg1, 105.0, t(3)).unwrap();
        let err = engine.on_leg_update(LegId::Leg2, 100.0, t(3)).unwrap_err();

        assert!(matches!(err, EngineError::InconsistentHedge { .. }));
        assert_eq!(engine.signal(), SpreadSignal::SpreadShort);
        assert!(!engine.position().is_hedged());
        // the residual was still recorded
        assert_eq!(engine.state().window.len(), 3);
        assert_eq!(engine.state().window.samples().last(), Some(5.0));
    }

    #[test]
    fn test_partial_flatten_is_retried() {
        let mut engine = engine(3);
        for step in 0..3 {
            push(&mut engine, step, 1.0);
        }
        push(&mut engine, 3, 5.0);
        assert_eq!(engine.signal(), SpreadSignal::SpreadShort);

        // leg1 closes, leg2 close is rejected
        engine.sink_mut().reject_leg(LegId::Leg2);
        engine.sink_mut().drain();
        engine.on_leg_update(LegId::Leg1, 102.3, t(4)).unwrap();
        let err = engine.on_leg_update(LegId::Leg2, 100.0, t(4)).unwrap_err();
        assert!(matches!(err, EngineError::InconsistentHedge { .. }));
        assert_eq!(engine.signal(), SpreadSignal::Flat);
        assert_eq!(engine.position().quantity(LegId::Leg1), 0.0);
        assert_eq!(engine.position().quantity(LegId::Leg2), 10.0);

        // window [1, 5, 2.3]: 2.7 is in band, nothing to enter, leg2 still open
        engine.sink_mut().accept_all();
        engine.sink_mut().drain();
        let outcome = push(&mut engine, 5, 2.7);
        let transition = outcome.transition().unwrap();
        assert_eq!(transition.reason, TransitionReason::Unwind);
        assert_eq!(transition.from, SpreadSignal::Flat);
        assert_eq!(transition.to, SpreadSignal::Flat);
        assert_eq!(engine.sink().orders().len(), 1);
        assert_eq!(engine.sink().orders()[0].leg, LegId::Leg2);
        assert!(engine.position().is_flat());

        // once flat, nothing further is sent
        let outcome = push(&mut engine, 6, 2.6);
        assert!(outcome.transition().is_none());
        assert_eq!(engine.sink().orders().len(), 1);
    }

    #[test]
    fn test_protective_exit_and_rearm() {
        let config = EngineConfig::new("A", "B")
            .with_period(3)
            .with_thresholds(2.0, 0.5)
            .with_base_volume(10.0);
        let mut engine = PairsEngine::new(
            config,
            RiskConfig::with_stop_loss(0.02),
            RecordingSink::new(),
        )
        .unwrap();

        for step in 0..3 {
            push(&mut engine, step, 1.0);
        }
        // residual 5: short spread, leg1 short 10 @ 105, leg2 long 10 @ 100
        push(&mut engine, 3, 5.0);
        assert_eq!(engine.signal(), SpreadSignal::SpreadShort);

        // residual widens to 15: leg1 at 115 loses 100 on 2050 notional (~4.9%)
        let outcome = push(&mut engine, 4, 15.0);
        let transition = outcome.transition().unwrap();
        assert_eq!(transition.reason, TransitionReason::ProtectiveExit);
        assert_eq!(transition.to, SpreadSignal::Flat);
        assert!(engine.position().is_flat());
        assert!(!engine.state().entries_armed);

        // window now [1, 5, 15]; a residual far above it would normally enter
        let outcome = push(&mut engine, 5, 60.0);
        assert!(outcome.transition().is_none());
        assert_eq!(engine.signal(), SpreadSignal::Flat);
    }
}
