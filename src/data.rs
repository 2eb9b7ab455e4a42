//! Price series loading and caching
//!
//! Fetched series are cached as CSV under the data directory, one file per
//! symbol, with a `date,open,high,low,close,volume` header. Date-range
//! filtering happens here, before a series reaches the backtest core.

use anyhow::{Context, Result};
use chrono::NaiveDate;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{info, warn};

use crate::sina::SinaClient;
use crate::types::Bar;

/// Cache file path for a symbol's daily series
pub fn csv_path(data_dir: impl AsRef<Path>, symbol: &str) -> PathBuf {
    data_dir.as_ref().join(format!("{}_daily.csv", symbol))
}

/// Load bars from a CSV cache file
pub fn load_csv(path: impl AsRef<Path>) -> Result<Vec<Bar>> {
    let path = path.as_ref();
    let mut reader = csv::Reader::from_path(path).context("Failed to open CSV file")?;

    let mut bars = Vec::new();

    for (row_idx, result) in reader.records().enumerate() {
        let record = result.context(format!("Failed to read row {}", row_idx + 1))?;

        let date_str = record.get(0).context("Missing date column")?;
        let date = date_str
            .parse::<NaiveDate>()
            .context(format!("Failed to parse date: {}", date_str))?;

        let open: f64 = record
            .get(1)
            .context("Missing open column")?
            .parse()
            .context("Failed to parse open")?;
        let high: f64 = record
            .get(2)
            .context("Missing high column")?
            .parse()
            .context("Failed to parse high")?;
        let low: f64 = record
            .get(3)
            .context("Missing low column")?
            .parse()
            .context("Failed to parse low")?;
        let close: f64 = record
            .get(4)
            .context("Missing close column")?
            .parse()
            .context("Failed to parse close")?;
        let volume: u64 = record
            .get(5)
            .context("Missing volume column")?
            .parse()
            .context("Failed to parse volume")?;

        bars.push(Bar {
            date,
            open,
            high,
            low,
            close,
            volume,
        });
    }

    Ok(bars)
}

/// Write bars to a CSV cache file, creating parent directories as needed
pub fn save_csv(path: impl AsRef<Path>, bars: &[Bar]) -> Result<()> {
    let path = path.as_ref();
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).context("Failed to create data directory")?;
    }

    let mut writer = csv::Writer::from_path(path).context("Failed to create CSV file")?;
    writer.write_record(["date", "open", "high", "low", "close", "volume"])?;

    for bar in bars {
        writer.write_record([
            bar.date.to_string(),
            bar.open.to_string(),
            bar.high.to_string(),
            bar.low.to_string(),
            bar.close.to_string(),
            bar.volume.to_string(),
        ])?;
    }

    writer.flush()?;
    Ok(())
}

/// Filter bars to an inclusive date range
pub fn filter_by_date(
    bars: Vec<Bar>,
    start: Option<NaiveDate>,
    end: Option<NaiveDate>,
) -> Vec<Bar> {
    bars.into_iter()
        .filter(|b| {
            let after_start = start.is_none_or(|s| b.date >= s);
            let before_end = end.is_none_or(|e| b.date <= e);
            after_start && before_end
        })
        .collect()
}

/// Parse a YYYY-MM-DD date argument
pub fn parse_date(date_str: &str) -> Result<NaiveDate> {
    NaiveDate::parse_from_str(date_str, "%Y-%m-%d").context(format!(
        "Failed to parse date: {}. Use YYYY-MM-DD format",
        date_str
    ))
}

/// Load a symbol's series from the cache, fetching from Sina on a miss
pub async fn ensure_data_available(
    data_dir: impl AsRef<Path>,
    symbol: &str,
    datalen: u32,
) -> Result<Vec<Bar>> {
    let path = csv_path(&data_dir, symbol);

    if path.exists() {
        info!("Loading cached data from {}", path.display());
        return load_csv(&path);
    }

    info!("No cached data for {}, fetching from Sina...", symbol);
    let client = SinaClient::new();
    let bars = client.fetch_daily(symbol, datalen).await?;

    if bars.is_empty() {
        warn!("Sina returned no bars for {}", symbol);
    } else {
        save_csv(&path, &bars)?;
        info!("Saved {} bars to {}", bars.len(), path.display());
    }

    Ok(bars)
}

/// Blocking wrapper for callers outside an async context
pub fn ensure_data_available_sync(
    data_dir: impl AsRef<Path>,
    symbol: &str,
    datalen: u32,
) -> Result<Vec<Bar>> {
    let rt = tokio::runtime::Runtime::new()?;
    rt.block_on(ensure_data_available(data_dir, symbol, datalen))
}

#[cfg(test)]
mod tests {
    use super::*;

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
    fn test_filter_bounds_are_inclusive() {
        let bars = vec![bar(1, 1.0), bar(2, 1.0), bar(3, 1.0), bar(4, 1.0)];
        let start = NaiveDate::from_ymd_opt(2024, 1, 2);
        let end = NaiveDate::from_ymd_opt(2024, 1, 3);

        let filtered = filter_by_date(bars, start, end);
        assert_eq!(filtered.len(), 2);
        assert_eq!(filtered[0].date.to_string(), "2024-01-02");
        assert_eq!(filtered[1].date.to_string(), "2024-01-03");
    }

    #[test]
    fn test_filter_without_bounds_keeps_everything() {
        let bars = vec![bar(1, 1.0), bar(2, 1.0)];
        assert_eq!(filter_by_date(bars, None, None).len(), 2);
    }

    #[test]
    fn test_parse_date_accepts_iso_days_only() {
        assert!(parse_date("2024-01-02").is_ok());
        assert!(parse_date("02/01/2024").is_err());
        assert!(parse_date("2024-01-02 10:00:00").is_err());
    }

    #[test]
    fn test_csv_round_trip() {
        let bars = vec![bar(2, 1.316), bar(3, 1.37)];
        let path = std::env::temp_dir().join("grid_backtest_csv_roundtrip.csv");

        save_csv(&path, &bars).unwrap();
        let loaded = load_csv(&path).unwrap();
        fs::remove_file(&path).ok();

        assert_eq!(loaded.len(), 2);
        assert_eq!(loaded[0].date, bars[0].date);
        assert_eq!(loaded[0].close, bars[0].close);
        assert_eq!(loaded[1].volume, bars[1].volume);
    }
}
