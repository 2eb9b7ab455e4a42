//! Grid backtest - main entry point
//!
//! This binary provides three subcommands:
//! - backtest: Run a grid strategy backtest for one ETF
//! - sweep: Run a parameter sweep over grid percentage combinations
//! - download: Download historical ETF data from Sina

use anyhow::Result;
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use grid_backtest::{BuyReference, GridConfig};

mod commands;

#[derive(Parser, Debug)]
#[command(name = "grid-backtest")]
#[command(about = "Grid trading backtest for CN-listed ETFs", long_about = None)]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Verbose output
    #[arg(short, long, global = true)]
    verbose: bool,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Run a grid strategy backtest
    Backtest {
        /// ETF code, bare or Sina-prefixed (e.g. 513520 or sh513520)
        #[arg(short, long, default_value = "513520")]
        symbol: String,

        /// Start date (YYYY-MM-DD)
        #[arg(long)]
        start_date: Option<String>,

        /// End date (YYYY-MM-DD)
        #[arg(long)]
        end_date: Option<String>,

        /// Rise from the last buy that triggers a sell
        #[arg(long, default_value = "0.02")]
        grid_up_pct: f64,

        /// Drop from the reference price that triggers a buy
        #[arg(long, default_value = "0.02")]
        grid_down_pct: f64,

        /// Cash committed per grid level
        #[arg(long, default_value = "10000")]
        unit_cash: f64,

        /// Maximum number of open grid levels
        #[arg(long, default_value = "10")]
        total_units: u32,

        /// Buy reference price: by_latest_buy or by_latest_sell
        #[arg(long, default_value = "by_latest_buy")]
        buy_reference: String,

        /// Only print the JSON result, skip the trade/summary tables
        #[arg(long)]
        json_only: bool,

        /// Write the JSON result to this file
        #[arg(long)]
        json_output: Option<String>,

        /// Data cache directory
        #[arg(long, default_value = "data")]
        data_dir: String,

        /// Number of daily bars to request when fetching
        #[arg(long, default_value = "1023")]
        datalen: u32,
    },

    /// Run a parameter sweep over grid percentage combinations
    Sweep {
        /// ETF code, bare or Sina-prefixed
        #[arg(short, long, default_value = "513520")]
        symbol: String,

        /// Start date (YYYY-MM-DD)
        #[arg(long)]
        start_date: Option<String>,

        /// End date (YYYY-MM-DD)
        #[arg(long)]
        end_date: Option<String>,

        /// Sell thresholds to test (comma-separated). E.g., "0.01,0.02,0.03"
        #[arg(long, default_value = "0.01,0.02,0.03")]
        up_pcts: String,

        /// Buy thresholds to test (comma-separated). E.g., "0.01,0.02,0.03"
        #[arg(long, default_value = "0.01,0.02,0.03")]
        down_pcts: String,

        /// Cash committed per grid level
        #[arg(long, default_value = "10000")]
        unit_cash: f64,

        /// Maximum number of open grid levels
        #[arg(long, default_value = "10")]
        total_units: u32,

        /// Buy reference price: by_latest_buy or by_latest_sell
        #[arg(long, default_value = "by_latest_buy")]
        buy_reference: String,

        /// Number of top results to show
        #[arg(short, long, default_value = "10")]
        top: usize,

        /// Run sequentially instead of parallel
        #[arg(long)]
        sequential: bool,

        /// Data cache directory
        #[arg(long, default_value = "data")]
        data_dir: String,

        /// Number of daily bars to request when fetching
        #[arg(long, default_value = "1023")]
        datalen: u32,
    },

    /// Download historical ETF data from Sina
    Download {
        /// ETF codes to download (comma-separated). E.g., "513520,159915"
        #[arg(short, long, default_value = "513520")]
        symbols: String,

        /// Number of daily bars to request per symbol
        #[arg(short, long, default_value = "1023")]
        datalen: u32,

        /// Output directory
        #[arg(short, long, default_value = "data")]
        output: String,
    },
}

fn setup_logging(verbose: bool, command_name: &str, file_only: bool) -> Result<()> {
    // Create logs directory
    std::fs::create_dir_all("logs")?;

    // Log file naming pattern: {command}_{date}.log
    let log_filename = format!(
        "{}_{}.log",
        command_name,
        chrono::Local::now().format("%Y-%m-%d_%H-%M-%S")
    );
    let log_path = PathBuf::from("logs").join(&log_filename);

    // Set log level - filter out noisy external crates
    let level = if verbose { "debug" } else { "info" };
    let filter_str = format!(
        "{},hyper=warn,hyper_util=warn,reqwest=warn,rustls=warn,h2=warn",
        level
    );
    let env_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&filter_str));

    let file_appender = tracing_appender::rolling::never("logs", &log_filename);

    if file_only {
        // For the sweep: only log to file, keep console clean for the progress bar
        let file_layer = tracing_subscriber::fmt::layer()
            .with_writer(file_appender)
            .with_target(true)
            .with_line_number(true)
            .with_file(true)
            .with_ansi(false);

        tracing_subscriber::registry()
            .with(env_filter)
            .with(file_layer)
            .init();
    } else {
        let console_layer = tracing_subscriber::fmt::layer()
            .with_target(true)
            .with_thread_ids(false)
            .with_thread_names(false)
            .with_line_number(true)
            .with_file(true)
            .with_ansi(true);

        let file_layer = tracing_subscriber::fmt::layer()
            .with_writer(file_appender)
            .with_target(true)
            .with_line_number(true)
            .with_file(true)
            .with_ansi(false);

        tracing_subscriber::registry()
            .with(env_filter)
            .with(console_layer)
            .with(file_layer)
            .init();

        info!("Logging initialized");
        info!("Log file: {}", log_path.display());
    }

    Ok(())
}

fn parse_buy_reference(s: &str) -> Result<BuyReference> {
    s.parse().map_err(|e: String| anyhow::anyhow!(e))
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let (command_name, file_only) = match &cli.command {
        Commands::Backtest { .. } => ("backtest", false),
        Commands::Sweep { .. } => ("sweep", true), // File-only for clean progress bar
        Commands::Download { .. } => ("download", false),
    };

    setup_logging(cli.verbose, command_name, file_only)?;

    match cli.command {
        Commands::Backtest {
            symbol,
            start_date,
            end_date,
            grid_up_pct,
            grid_down_pct,
            unit_cash,
            total_units,
            buy_reference,
            json_only,
            json_output,
            data_dir,
            datalen,
        } => {
            let config = GridConfig {
                grid_up_pct,
                grid_down_pct,
                unit_cash,
                total_units,
                buy_reference: parse_buy_reference(&buy_reference)?,
            };
            commands::backtest::run(
                symbol,
                start_date,
                end_date,
                config,
                json_only,
                json_output,
                data_dir,
                datalen,
            )
        }

        Commands::Sweep {
            symbol,
            start_date,
            end_date,
            up_pcts,
            down_pcts,
            unit_cash,
            total_units,
            buy_reference,
            top,
            sequential,
            data_dir,
            datalen,
        } => {
            let base = GridConfig {
                grid_up_pct: 0.02,
                grid_down_pct: 0.02,
                unit_cash,
                total_units,
                buy_reference: parse_buy_reference(&buy_reference)?,
            };
            commands::sweep::run(
                symbol, start_date, end_date, base, up_pcts, down_pcts, top, sequential, data_dir,
                datalen,
            )
        }

        Commands::Download {
            symbols,
            datalen,
            output,
        } => commands::download::run(symbols, datalen, output),
    }
}
