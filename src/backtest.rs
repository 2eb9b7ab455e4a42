//! Backtest orchestration
//!
//! Owns the end-to-end run: config validation, feeding bars through the
//! strategy engine in sequence, and assembling the summary.

use thiserror::Error;
use tracing::info;

use crate::config::{ConfigError, GridConfig};
use crate::strategy::GridStrategyEngine;
use crate::types::{round2, Bar, BacktestResult, InvalidBarError};

/// Errors a run can fail with
#[derive(Debug, Error)]
pub enum BacktestError {
    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error(transparent)]
    InvalidBar(#[from] InvalidBarError),
}

/// Runs one strategy configuration over one price series
pub struct BacktestRunner {
    config: GridConfig,
}

impl BacktestRunner {
    pub fn new(config: GridConfig) -> Self {
        BacktestRunner { config }
    }

    /// Run the backtest over bars ordered ascending by date.
    ///
    /// A run with no completed round trip (zero sells) reports the
    /// initial-cash summary with an empty trade log, discarding any
    /// unrealized position: open levels that never sold are not performance.
    pub fn run(&self, bars: &[Bar]) -> Result<BacktestResult, BacktestError> {
        self.config.validate()?;

        let mut engine = GridStrategyEngine::new(self.config.clone());
        let initial_cash = engine.ledger().cash;

        for bar in bars {
            engine.process_bar(bar)?;
        }

        let final_value = match bars.last() {
            Some(last) => engine.ledger().mark_to_market(last.close),
            None => initial_cash,
        };

        info!(
            bars = bars.len(),
            buys = engine.buy_count(),
            sells = engine.sell_count(),
            "run finished"
        );

        if engine.sell_count() == 0 {
            return Ok(BacktestResult {
                initial_cash: round2(initial_cash),
                final_value: round2(initial_cash),
                profit: 0.0,
                profit_pct: 0.0,
                buy_count: 0,
                sell_count: 0,
                trades: Vec::new(),
            });
        }

        let profit = final_value - initial_cash;
        let profit_pct = profit / initial_cash * 100.0;

        Ok(BacktestResult {
            initial_cash: round2(initial_cash),
            final_value: round2(final_value),
            profit: round2(profit),
            profit_pct: round2(profit_pct),
            buy_count: engine.buy_count(),
            sell_count: engine.sell_count(),
            trades: engine.into_trades(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn bar(day: u32, close: f64) -> Bar {
        Bar {
            date: NaiveDate::from_ymd_opt(2024, 1, day).unwrap(),
            open: close,
            high: close,
            low: close,
            close,
            volume: 10_000,
        }
    }

    #[test]
    fn test_empty_series_yields_degenerate_summary() {
        let result = BacktestRunner::new(GridConfig::default()).run(&[]).unwrap();

        assert_eq!(result.initial_cash, 100_000.0);
        assert_eq!(result.final_value, 100_000.0);
        assert_eq!(result.profit, 0.0);
        assert_eq!(result.profit_pct, 0.0);
        assert_eq!(result.buy_count, 0);
        assert_eq!(result.sell_count, 0);
        assert!(result.trades.is_empty());
    }

    #[test]
    fn test_invalid_config_rejected_before_any_bar() {
        let config = GridConfig {
            grid_up_pct: 2.0,
            ..Default::default()
        };
        // The series would also fail, but config validation wins
        let bars = vec![bar(2, 0.0)];
        let err = BacktestRunner::new(config).run(&bars).unwrap_err();
        assert!(matches!(err, BacktestError::Config(_)));
    }

    #[test]
    fn test_buys_without_sells_report_as_if_nothing_happened() {
        // Entry then a steady decline: several buys, never a sell
        let bars = vec![bar(2, 100.0), bar(3, 97.9), bar(4, 95.8), bar(5, 93.7)];
        let result = BacktestRunner::new(GridConfig::default()).run(&bars).unwrap();

        assert_eq!(result.buy_count, 0);
        assert_eq!(result.sell_count, 0);
        assert_eq!(result.final_value, result.initial_cash);
        assert_eq!(result.profit, 0.0);
        assert_eq!(result.profit_pct, 0.0);
        assert!(result.trades.is_empty());
    }
}
