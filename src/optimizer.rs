//! Parallel parameter sweep across grid percentage combinations
//!
//! Each combination runs an independent backtest with its own engine and
//! ledger; runs share nothing but the immutable price series, so they can
//! execute concurrently without synchronization.

use indicatif::ProgressBar;
use rayon::prelude::*;

use crate::backtest::{BacktestError, BacktestRunner};
use crate::config::GridConfig;
use crate::types::{BacktestResult, Bar};

/// Outcome of one sweep combination
#[derive(Debug, Clone)]
pub struct SweepResult {
    pub grid_up_pct: f64,
    pub grid_down_pct: f64,
    pub profit: f64,
    pub profit_pct: f64,
    pub buy_count: u32,
    pub sell_count: u32,
}

impl SweepResult {
    fn from_run(config: &GridConfig, result: &BacktestResult) -> Self {
        SweepResult {
            grid_up_pct: config.grid_up_pct,
            grid_down_pct: config.grid_down_pct,
            profit: result.profit,
            profit_pct: result.profit_pct,
            buy_count: result.buy_count,
            sell_count: result.sell_count,
        }
    }
}

/// Cartesian product of the percentage lists over a base config
pub fn combinations(base: &GridConfig, up_pcts: &[f64], down_pcts: &[f64]) -> Vec<GridConfig> {
    let mut configs = Vec::with_capacity(up_pcts.len() * down_pcts.len());
    for &up in up_pcts {
        for &down in down_pcts {
            let mut config = base.clone();
            config.grid_up_pct = up;
            config.grid_down_pct = down;
            configs.push(config);
        }
    }
    configs
}

/// Run all combinations in parallel
pub fn sweep(
    bars: &[Bar],
    configs: &[GridConfig],
    progress: Option<&ProgressBar>,
) -> Result<Vec<SweepResult>, BacktestError> {
    tracing::info!("Testing {} parameter combinations", configs.len());

    configs
        .par_iter()
        .map(|config| {
            let result = BacktestRunner::new(config.clone()).run(bars)?;
            if let Some(pb) = progress {
                pb.inc(1);
            }
            Ok(SweepResult::from_run(config, &result))
        })
        .collect()
}

/// Run all combinations sequentially (debugging aid)
pub fn sweep_sequential(
    bars: &[Bar],
    configs: &[GridConfig],
) -> Result<Vec<SweepResult>, BacktestError> {
    tracing::info!("Testing {} parameter combinations sequentially", configs.len());

    configs
        .iter()
        .map(|config| {
            let result = BacktestRunner::new(config.clone()).run(bars)?;
            Ok(SweepResult::from_run(config, &result))
        })
        .collect()
}

/// Sort results by realized return, best first
pub fn sort_results(results: &mut [SweepResult]) {
    results.sort_by(|a, b| {
        b.profit_pct
            .partial_cmp(&a.profit_pct)
            .unwrap_or(std::cmp::Ordering::Equal)
    });
}
