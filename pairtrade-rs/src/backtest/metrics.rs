//! Backtest performance metrics

use crate::backtest::{BacktestResult, SpreadTrade};
use crate::strategy::SpreadSignal;
use chrono::Duration;

/// Calculate additional metrics from backtest result
pub struct MetricsCalculator;

impl MetricsCalculator {
    /// Percentage of closed trades with positive P&L
    pub fn win_rate(trades: &[SpreadTrade]) -> f64 {
        if trades.is_empty() {
            return 0.0;
        }
        let wins = trades.iter().filter(|t| t.pnl > 0.0).count();
        wins as f64 * 100.0 / trades.len() as f64
    }

    /// Mean P&L of winning trades
    pub fn avg_profit(trades: &[SpreadTrade]) -> f64 {
        mean(trades.iter().map(|t| t.pnl).filter(|pnl| *pnl > 0.0))
    }

    /// Mean P&L of losing trades, negative
    pub fn avg_loss(trades: &[SpreadTrade]) -> f64 {
        mean(trades.iter().map(|t| t.pnl).filter(|pnl| *pnl < 0.0))
    }

    /// Deepest fall of the closed-trade equity curve below its running
    /// peak, as a fraction of that peak
    pub fn max_drawdown(start_balance: f64, trades: &[SpreadTrade]) -> f64 {
        trades
            .iter()
            .scan((start_balance, start_balance), |(equity, peak), trade| {
                *equity += trade.pnl;
                *peak = peak.max(*equity);
                Some(if *peak > 0.0 { (*peak - *equity) / *peak } else { 0.0 })
            })
            .fold(0.0, f64::max)
    }

    /// Per-trade Sharpe ratio of fractional returns, unannualised
    pub fn sharpe_ratio(trades: &[SpreadTrade]) -> f64 {
        if trades.len() < 2 {
            return 0.0;
        }
        let returns = || trades.iter().map(|t| t.pnl_percent / 100.0);
        let avg = mean(returns());
        let std_dev = mean(returns().map(|r| (r - avg).powi(2))).sqrt();
        if std_dev > 0.0 {
            avg / std_dev
        } else {
            0.0
        }
    }

    /// Gross profit over gross loss
    pub fn profit_factor(result: &BacktestResult) -> f64 {
        let gross_loss: f64 = result.trades.iter().filter(|t| t.pnl < 0.0).map(|t| t.pnl).sum();
        if gross_loss == 0.0 {
            return 0.0;
        }
        let gross_profit: f64 = result.trades.iter().filter(|t| t.pnl > 0.0).map(|t| t.pnl).sum();
        gross_profit / gross_loss.abs()
    }

    /// Calculate expectancy
    pub fn expectancy(result: &BacktestResult) -> f64 {
        if result.num_trades == 0 {
            return 0.0;
        }
        (result.win_rate / 100.0 * result.avg_profit)
            - ((100.0 - result.win_rate) / 100.0 * result.avg_loss.abs())
    }

    /// Mean holding time of closed trades
    pub fn avg_trade_duration(result: &BacktestResult) -> Option<Duration> {
        if result.trades.is_empty() {
            return None;
        }
        let total: i64 = result
            .trades
            .iter()
            .map(|t| (t.exit_time - t.entry_time).num_milliseconds())
            .sum();
        Some(Duration::milliseconds(total / result.trades.len() as i64))
    }

    /// Combined P&L of trades entered in one direction
    pub fn pnl_by_direction(result: &BacktestResult, direction: SpreadSignal) -> f64 {
        Self::trades_in(result, direction).map(|t| t.pnl).sum()
    }

    fn trades_in(
        result: &BacktestResult,
        direction: SpreadSignal,
    ) -> impl Iterator<Item = &SpreadTrade> {
        result.trades.iter().filter(move |t| t.direction == direction)
    }
}

fn mean(values: impl Iterator<Item = f64>) -> f64 {
    let (sum, count) = values.fold((0.0, 0usize), |(sum, count), v| (sum + v, count + 1));
    if count == 0 {
        0.0
    } else {
        sum / count as f64
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::strategy::TransitionReason;
    use chrono::{DateTime, Utc};

    fn trade(direction: SpreadSignal, minutes: i64, pnl: f64) -> SpreadTrade {
        let entry_time: DateTime<Utc> = DateTime::from_timestamp(1_700_000_000, 0).unwrap();
        SpreadTrade {
            direction,
            entry_time,
            exit_time: entry_time + Duration::minutes(minutes),
            entry_z: 2.5,
            exit_z: 0.1,
            exit_reason: TransitionReason::ZScore,
            pnl,
            pnl_percent: pnl / 10.0,
        }
    }

    fn result(trades: Vec<SpreadTrade>) -> BacktestResult {
        let winning = trades.iter().filter(|t| t.pnl > 0.0).count();
        let losing = trades.iter().filter(|t| t.pnl < 0.0).count();
        BacktestResult {
            start_balance: 1_000.0,
            end_balance: 1_000.0 + trades.iter().map(|t| t.pnl).sum::<f64>(),
            total_return: 0.0,
            total_return_percent: 0.0,
            num_trades: trades.len(),
            winning_trades: winning,
            losing_trades: losing,
            win_rate: 0.0,
            avg_profit: 0.0,
            avg_loss: 0.0,
            max_drawdown: 0.0,
            sharpe_ratio: 0.0,
            protective_exits: 0,
            ticks_processed: 0,
            skipped_pairs: 0,
            trades,
        }
    }

    #[test]
    fn test_profit_factor() {
        let r = result(vec![
            trade(SpreadSignal::SpreadLong, 10, 30.0),
            trade(SpreadSignal::SpreadShort, 20, -10.0),
            trade(SpreadSignal::SpreadShort, 30, 10.0),
        ]);
        assert_eq!(MetricsCalculator::profit_factor(&r), 4.0);
        assert_eq!(MetricsCalculator::pnl_by_direction(&r, SpreadSignal::SpreadShort), 0.0);
        assert_eq!(
            MetricsCalculator::avg_trade_duration(&r),
            Some(Duration::minutes(20))
        );
    }

    #[test]
    fn test_trade_statistics() {
        let trades = vec![
            trade(SpreadSignal::SpreadLong, 10, 30.0),
            trade(SpreadSignal::SpreadShort, 20, -10.0),
            trade(SpreadSignal::SpreadShort, 30, 10.0),
            trade(SpreadSignal::SpreadLong, 10, -20.0),
        ];
        assert_eq!(MetricsCalculator::win_rate(&trades), 50.0);
        assert_eq!(MetricsCalculator::avg_profit(&trades), 20.0);
        assert_eq!(MetricsCalculator::avg_loss(&trades), -15.0);
    }

    #[test]
    fn test_max_drawdown_tracks_running_peak() {
        // equity 1000 -> 1100 -> 1045 -> 1155 -> 880
        let trades = vec![
            trade(SpreadSignal::SpreadLong, 1, 100.0),
            trade(SpreadSignal::SpreadLong, 1, -55.0),
            trade(SpreadSignal::SpreadLong, 1, 110.0),
            trade(SpreadSignal::SpreadLong, 1, -275.0),
        ];
        let drawdown = MetricsCalculator::max_drawdown(1_000.0, &trades);
        assert!((drawdown - 275.0 / 1_155.0).abs() < 1e-12);
        assert_eq!(MetricsCalculator::max_drawdown(1_000.0, &trades[..1]), 0.0);
    }

    #[test]
    fn test_sharpe_ratio() {
        // returns 0.3 and -0.1: mean 0.1, population std 0.2
        let trades = vec![
            trade(SpreadSignal::SpreadLong, 1, 300.0),
            trade(SpreadSignal::SpreadShort, 1, -100.0),
        ];
        assert!((MetricsCalculator::sharpe_ratio(&trades) - 0.5).abs() < 1e-12);
        assert_eq!(MetricsCalculator::sharpe_ratio(&trades[..1]), 0.0);
    }

    #[test]
    fn test_no_trades() {
        let r = result(Vec::new());
        assert_eq!(MetricsCalculator::win_rate(&r.trades), 0.0);
        assert_eq!(MetricsCalculator::avg_loss(&r.trades), 0.0);
        assert_eq!(MetricsCalculator::max_drawdown(1_000.0, &r.trades), 0.0);
        assert_eq!(MetricsCalculator::profit_factor(&r), 0.0);
        assert_eq!(MetricsCalculator::expectancy(&r), 0.0);
        assert_eq!(MetricsCalculator::avg_trade_duration(&r), None);
    }
}
