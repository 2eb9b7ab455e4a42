//! Download command implementation

use anyhow::Result;
use tracing::{info, warn};

use grid_backtest::{data, SinaClient};

pub fn run(symbols: String, datalen: u32, output: String) -> Result<()> {
    let symbols: Vec<String> = symbols
        .split(',')
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
        .collect();

    info!("Downloading {} symbols to {}", symbols.len(), output);

    let rt = tokio::runtime::Runtime::new()?;
    rt.block_on(async {
        let client = SinaClient::new();
        let mut failed = Vec::new();

        for symbol in &symbols {
            info!("Fetching {}...", symbol);
            match client.fetch_daily(symbol, datalen).await {
                Ok(bars) if !bars.is_empty() => {
                    let path = data::csv_path(&output, symbol);
                    data::save_csv(&path, &bars)?;
                    info!("  ✓ Saved {} bars to {}", bars.len(), path.display());
                }
                Ok(_) => {
                    warn!("  ✗ No data returned for {}", symbol);
                    failed.push(symbol.clone());
                }
                Err(e) => {
                    warn!("  ✗ Failed to fetch {}: {}", symbol, e);
                    failed.push(symbol.clone());
                }
            }
        }

        if !failed.is_empty() {
            warn!(
                "Could not download {} symbols: {}",
                failed.len(),
                failed.join(", ")
            );
        }

        Ok::<(), anyhow::Error>(())
    })?;

    info!("Download completed");

    Ok(())
}
