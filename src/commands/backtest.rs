//! Backtest command implementation

use anyhow::Result;
use tracing::info;

use grid_backtest::backtest::BacktestRunner;
use grid_backtest::types::BacktestResult;
use grid_backtest::{data, GridConfig};

#[allow(clippy::too_many_arguments)]
pub fn run(
    symbol: String,
    start_date: Option<String>,
    end_date: Option<String>,
    config: GridConfig,
    json_only: bool,
    json_output: Option<String>,
    data_dir: String,
    datalen: u32,
) -> Result<()> {
    info!("Starting backtest for {}", symbol);

    let start = start_date.as_deref().map(data::parse_date).transpose()?;
    let end = end_date.as_deref().map(data::parse_date).transpose()?;

    let bars = data::ensure_data_available_sync(&data_dir, &symbol, datalen)?;
    let bars = data::filter_by_date(bars, start, end);
    info!("Loaded {} bars for {}", bars.len(), symbol);

    let result = BacktestRunner::new(config).run(&bars)?;

    if !json_only {
        print_trades(&result);
        print_summary(&result);
    }

    let json_str = serde_json::to_string_pretty(&result)?;
    println!("\n{}", "=".repeat(60));
    println!("JSON RESULT");
    println!("{}", "=".repeat(60));
    println!("{}", json_str);

    if let Some(path) = json_output {
        std::fs::write(&path, &json_str)?;
        println!("JSON result written to: {}", path);
    }

    info!("Backtest completed successfully");

    Ok(())
}

fn print_trades(result: &BacktestResult) {
    println!("\n{}", "=".repeat(60));
    println!("TRADE DETAILS");
    println!("{}", "=".repeat(60));
    if result.trades.is_empty() {
        println!("(no completed round trips)");
        return;
    }
    for trade in &result.trades {
        println!(
            "{} {:<8} {:.3} x {:<6}  cash={:.2}  value={:.2}",
            trade.date,
            trade.action.to_string(),
            trade.price,
            trade.size,
            trade.cash,
            trade.value
        );
    }
}

fn print_summary(result: &BacktestResult) {
    println!("\n{}", "=".repeat(60));
    println!("BACKTEST RESULTS");
    println!("{}", "=".repeat(60));
    println!("Initial Cash:       {:.2}", result.initial_cash);
    println!("Final Value:        {:.2}", result.final_value);
    println!("Profit:             {:.2}", result.profit);
    println!("Profit Pct:         {:.2}%", result.profit_pct);
    println!("Total Buys:         {}", result.buy_count);
    println!("Total Sells:        {}", result.sell_count);
    println!("{}", "=".repeat(60));
}
