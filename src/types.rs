//! Core data types used across the backtest

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Error raised when a bar carries a price the strategy cannot trade on
#[derive(Debug, Error)]
#[error("invalid bar on {date}: non-positive close price {close}")]
pub struct InvalidBarError {
    pub date: NaiveDate,
    pub close: f64,
}

/// Daily OHLCV bar
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Bar {
    pub date: NaiveDate,
    pub open: f64,
    pub high: f64,
    pub low: f64,
    pub close: f64,
    pub volume: u64,
}

impl Bar {
    /// Validate that the bar is tradable (NaN close fails the comparison too)
    pub fn validate(&self) -> Result<(), InvalidBarError> {
        if !(self.close > 0.0) {
            return Err(InvalidBarError {
                date: self.date,
                close: self.close,
            });
        }
        Ok(())
    }
}

/// Kind of executed transaction
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum TradeAction {
    #[serde(rename = "BUY INIT")]
    BuyInit,
    #[serde(rename = "BUY")]
    Buy,
    #[serde(rename = "SELL")]
    Sell,
}

impl std::fmt::Display for TradeAction {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            TradeAction::BuyInit => write!(f, "BUY INIT"),
            TradeAction::Buy => write!(f, "BUY"),
            TradeAction::Sell => write!(f, "SELL"),
        }
    }
}

/// Executed transaction record
///
/// `cash` and `value` are the ledger state immediately after the transaction,
/// already rounded to the output precision (price 3 dp, cash/value 2 dp).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Trade {
    pub date: NaiveDate,
    pub action: TradeAction,
    pub price: f64,
    pub size: u64,
    pub cash: f64,
    pub value: f64,
}

/// Summary of a completed backtest run
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BacktestResult {
    pub initial_cash: f64,
    pub final_value: f64,
    pub profit: f64,
    pub profit_pct: f64,
    pub buy_count: u32,
    pub sell_count: u32,
    pub trades: Vec<Trade>,
}

/// Round to 2 decimal places for cash/value output fields
pub(crate) fn round2(x: f64) -> f64 {
    (x * 100.0).round() / 100.0
}

/// Round to 3 decimal places for price output fields
pub(crate) fn round3(x: f64) -> f64 {
    (x * 1000.0).round() / 1000.0
}

#[cfg(test)]
mod tests {
    use super::*;

    fn bar(close: f64) -> Bar {
        Bar {
            date: NaiveDate::from_ymd_opt(2024, 1, 2).unwrap(),
            open: close,
            high: close,
            low: close,
            close,
            volume: 1_000,
        }
    }

    #[test]
    fn test_bar_validation_rejects_non_positive_close() {
        assert!(bar(1.316).validate().is_ok());
        assert!(bar(0.0).validate().is_err());
        assert!(bar(-1.0).validate().is_err());
        assert!(bar(f64::NAN).validate().is_err());
    }

    #[test]
    fn test_trade_action_serializes_with_spaces() {
        let json = serde_json::to_string(&TradeAction::BuyInit).unwrap();
        assert_eq!(json, "\"BUY INIT\"");
        let json = serde_json::to_string(&TradeAction::Sell).unwrap();
        assert_eq!(json, "\"SELL\"");

        let action: TradeAction = serde_json::from_str("\"BUY\"").unwrap();
        assert_eq!(action, TradeAction::Buy);
    }

    #[test]
    fn test_rounding_helpers() {
        assert_eq!(round2(90001.032), 90001.03);
        assert_eq!(round2(0.1 + 0.2), 0.3);
        assert_eq!(round3(1.3164), 1.316);
        assert_eq!(round3(1.37), 1.37);
    }
}
