//! Grid trading backtest for CN-listed ETFs
//!
//! Simulates a fixed-percentage grid strategy bar-by-bar over a daily price
//! series: buy one unit on a configured drop from the reference price, sell
//! one unit on a configured rise from the last buy price. The run produces a
//! deterministic trade log and a summary that only reports performance when
//! at least one round trip completed.
//!
//! Historical data comes from Sina's public kline endpoint and is cached as
//! CSV; a parallel sweep over grid percentage combinations is included.
//!
//! # Example
//! ```no_run
//! use grid_backtest::{BacktestRunner, GridConfig};
//!
//! fn main() -> anyhow::Result<()> {
//!     let bars = grid_backtest::data::load_csv("data/513520_daily.csv")?;
//!     let result = BacktestRunner::new(GridConfig::default()).run(&bars)?;
//!     println!("profit: {:.2} ({:.2}%)", result.profit, result.profit_pct);
//!     Ok(())
//! }
//! ```

pub mod backtest;
pub mod config;
pub mod data;
pub mod ledger;
pub mod optimizer;
pub mod sina;
pub mod strategy;
pub mod types;

pub use backtest::{BacktestError, BacktestRunner};
pub use config::{BuyReference, ConfigError, GridConfig};
pub use ledger::Ledger;
pub use strategy::GridStrategyEngine;
pub use types::{BacktestResult, Bar, InvalidBarError, Trade, TradeAction};

// Re-export the data client for convenience
pub use sina::SinaClient;
