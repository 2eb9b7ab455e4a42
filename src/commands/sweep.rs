//! Sweep command implementation

use anyhow::{Context, Result};
use indicatif::{ProgressBar, ProgressStyle};
use tracing::info;

use grid_backtest::{data, optimizer, GridConfig};

/// Parse comma-separated floats
fn parse_float_list(s: &str) -> Result<Vec<f64>> {
    s.split(',')
        .map(|v| {
            let v = v.trim();
            v.parse::<f64>()
                .context(format!("Failed to parse percentage: {}", v))
        })
        .collect()
}

#[allow(clippy::too_many_arguments)]
pub fn run(
    symbol: String,
    start_date: Option<String>,
    end_date: Option<String>,
    base: GridConfig,
    up_pcts: String,
    down_pcts: String,
    top: usize,
    sequential: bool,
    data_dir: String,
    datalen: u32,
) -> Result<()> {
    info!("Starting sweep for {}", symbol);

    let up_pcts = parse_float_list(&up_pcts)?;
    let down_pcts = parse_float_list(&down_pcts)?;

    let start = start_date.as_deref().map(data::parse_date).transpose()?;
    let end = end_date.as_deref().map(data::parse_date).transpose()?;

    let bars = data::ensure_data_available_sync(&data_dir, &symbol, datalen)?;
    let bars = data::filter_by_date(bars, start, end);
    info!("Loaded {} bars for {}", bars.len(), symbol);

    let configs = optimizer::combinations(&base, &up_pcts, &down_pcts);

    let mut results = if sequential {
        optimizer::sweep_sequential(&bars, &configs)?
    } else {
        let pb = ProgressBar::new(configs.len() as u64);
        pb.set_style(
            ProgressStyle::default_bar()
                .template("{percent:>3}%|{bar:40}| {pos}/{len} [{elapsed}<{eta}]")
                .context("Invalid progress bar template")?
                .progress_chars("█░ "),
        );
        let results = optimizer::sweep(&bars, &configs, Some(&pb))?;
        pb.finish_and_clear();
        results
    };

    optimizer::sort_results(&mut results);

    println!("\n{}", "=".repeat(72));
    println!("SWEEP RESULTS ({} combinations, top {})", results.len(), top);
    println!("{}", "=".repeat(72));
    println!(
        "{:<10} {:<10} {:>12} {:>11} {:>6} {:>6}",
        "up_pct", "down_pct", "profit", "profit_pct", "buys", "sells"
    );
    println!("{}", "-".repeat(72));
    for result in results.iter().take(top) {
        println!(
            "{:<10.3} {:<10.3} {:>12.2} {:>10.2}% {:>6} {:>6}",
            result.grid_up_pct,
            result.grid_down_pct,
            result.profit,
            result.profit_pct,
            result.buy_count,
            result.sell_count
        );
    }
    println!("{}", "=".repeat(72));

    info!("Sweep completed successfully");

    Ok(())
}
