//! Backtest report generation

use crate::backtest::BacktestResult;
use crate::backtest::MetricsCalculator;
use crate::strategy::SpreadSignal;
use anyhow::Context;
use serde::Serialize;

/// Backtest report
#[derive(Debug, Serialize)]
pub struct BacktestReport {
    result: BacktestResult,
    profit_factor: f64,
    expectancy: f64,
    avg_trade_minutes: Option<i64>,
}

impl BacktestReport {
    /// Create new report from result
    pub fn new(result: BacktestResult) -> Self {
        let profit_factor = MetricsCalculator::profit_factor(&result);
        let expectancy = MetricsCalculator::expectancy(&result);
        let avg_trade_minutes =
            MetricsCalculator::avg_trade_duration(&result).map(|d| d.num_minutes());

        Self {
            result,
            profit_factor,
            expectancy,
            avg_trade_minutes,
        }
    }

    /// Format report as string
    pub fn format(&self) -> String {
        let avg_duration = self
            .avg_trade_minutes
            .map(|m| format!("{m} min"))
            .unwrap_or_else(|| "n/a".to_string());

        format!(
            r#"
Backtest Results
================
Ticks Processed: {}
Skipped Pairs: {}
Starting Balance: ${:.2}
Ending Balance: ${:.2}
Total Return: ${:.2} ({:.2}%)
Number of Trades: {}
  SpreadLong P&L: ${:.2}
  SpreadShort P&L: ${:.2}
Winning Trades: {}
Losing Trades: {}
Protective Exits: {}
Win Rate: {:.2}%
Average Profit: ${:.2}
Average Loss: ${:.2}
Average Holding Time: {}
Profit Factor: {:.2}
Expectancy: ${:.2}
Maximum Drawdown: {:.2}%
Sharpe Ratio: {:.2}
"#,
            self.result.ticks_processed,
            self.result.skipped_pairs,
            self.result.start_balance,
            self.result.end_balance,
            self.result.total_return,
            self.result.total_return_percent,
            self.result.num_trades,
            MetricsCalculator::pnl_by_direction(&self.result, SpreadSignal::SpreadLong),
            MetricsCalculator::pnl_by_direction(&self.result, SpreadSignal::SpreadShort),
            self.result.winning_trades,
            self.result.losing_trades,
            self.result.protective_exits,
            self.result.win_rate,
            self.result.avg_profit,
            self.result.avg_loss,
            avg_duration,
            self.profit_factor,
            self.expectancy,
            self.result.max_drawdown * 100.0,
            self.result.sharpe_ratio,
        )
    }

    /// Serialize the report, trades included
    pub fn to_json(&self) -> anyhow::Result<String> {
        serde_json::to_string_pretty(self).context("Failed to serialize backtest report")
    }

    /// Get result reference
    pub fn result(&self) -> &BacktestResult {
        &self.result
    }
}
