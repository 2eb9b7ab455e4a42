//! Sina market-data client for fetching historical ETF kline data
//!
//! No API key required for the public kline endpoint.
//!
//! # Example
//! ```no_run
//! use grid_backtest::sina::SinaClient;
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let client = SinaClient::new();
//!     let bars = client.fetch_daily("513520", 250).await?;
//!     println!("Fetched {} bars", bars.len());
//!     Ok(())
//! }
//! ```

use anyhow::{Context, Result};
use chrono::NaiveDate;
use reqwest::Client;
use serde::Deserialize;
use std::time::Duration as StdDuration;
use tracing::{debug, info};

use crate::types::Bar;

/// Kline endpoint for CN market data
const SINA_KLINE_URL: &str =
    "https://money.finance.sina.com.cn/quotes_service/api/json_v2.php/CN_MarketData.getKLineData";

/// Daily bars use the 240-minute scale on this endpoint
const DAILY_SCALE: u32 = 240;

/// Map a bare ETF code to Sina's exchange-prefixed form ("513520" -> "sh513520").
/// Codes already carrying a prefix pass through unchanged.
pub fn to_sina_code(code: &str) -> String {
    if code.starts_with("sh") || code.starts_with("sz") {
        return code.to_string();
    }
    let prefix = if code.starts_with('5') { "sh" } else { "sz" };
    format!("{}{}", prefix, code)
}

/// Raw kline row as returned by Sina (every field is a string)
#[derive(Debug, Clone, Deserialize)]
pub struct SinaKline {
    pub day: String,
    pub open: String,
    pub high: String,
    pub low: String,
    pub close: String,
    pub volume: String,
}

impl SinaKline {
    /// Parse into a Bar; rows with malformed fields yield None
    pub fn to_bar(&self) -> Option<Bar> {
        Some(Bar {
            date: NaiveDate::parse_from_str(&self.day, "%Y-%m-%d").ok()?,
            open: self.open.parse().ok()?,
            high: self.high.parse().ok()?,
            low: self.low.parse().ok()?,
            close: self.close.parse().ok()?,
            volume: self.volume.parse::<f64>().ok()? as u64,
        })
    }
}

/// Sina API client
#[derive(Debug, Clone)]
pub struct SinaClient {
    client: Client,
}

impl Default for SinaClient {
    fn default() -> Self {
        Self::new()
    }
}

impl SinaClient {
    pub fn new() -> Self {
        let client = Client::builder()
            .timeout(StdDuration::from_secs(30))
            .build()
            .expect("Failed to create HTTP client");

        SinaClient { client }
    }

    /// Fetch the most recent `datalen` daily bars for an ETF, oldest first
    pub async fn fetch_daily(&self, symbol: &str, datalen: u32) -> Result<Vec<Bar>> {
        let sina_code = to_sina_code(symbol);

        let params = vec![
            ("symbol", sina_code.clone()),
            ("scale", DAILY_SCALE.to_string()),
            ("ma", "no".to_string()),
            ("datalen", datalen.to_string()),
        ];

        debug!("Fetching klines: symbol={}, datalen={}", sina_code, datalen);

        let response = self
            .client
            .get(SINA_KLINE_URL)
            .query(&params)
            .send()
            .await
            .context("Failed to send request to Sina")?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            anyhow::bail!("Sina API error {}: {}", status, body);
        }

        let klines: Vec<SinaKline> = response
            .json()
            .await
            .context("Failed to parse Sina response")?;

        let mut bars: Vec<Bar> = klines.iter().filter_map(SinaKline::to_bar).collect();

        // Sort and deduplicate by date
        bars.sort_by_key(|b| b.date);
        bars.dedup_by_key(|b| b.date);

        info!("Fetched {} bars for {}", bars.len(), sina_code);

        Ok(bars)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sina_code_mapping() {
        assert_eq!(to_sina_code("513520"), "sh513520");
        assert_eq!(to_sina_code("159915"), "sz159915");
        assert_eq!(to_sina_code("sh513520"), "sh513520");
    }

    #[test]
    fn test_kline_parses_into_bar() {
        let kline = SinaKline {
            day: "2024-01-02".to_string(),
            open: "1.310".to_string(),
            high: "1.320".to_string(),
            low: "1.305".to_string(),
            close: "1.316".to_string(),
            volume: "273310".to_string(),
        };

        let bar = kline.to_bar().unwrap();
        assert_eq!(bar.date.to_string(), "2024-01-02");
        assert_eq!(bar.close, 1.316);
        assert_eq!(bar.volume, 273_310);
    }

    #[test]
    fn test_malformed_kline_is_dropped() {
        let kline = SinaKline {
            day: "not-a-date".to_string(),
            open: "1.310".to_string(),
            high: "1.320".to_string(),
            low: "1.305".to_string(),
            close: "1.316".to_string(),
            volume: "273310".to_string(),
        };
        assert!(kline.to_bar().is_none());
    }
}
