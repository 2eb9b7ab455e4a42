//! Strategy configuration

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Validation errors for strategy parameters
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("grid_up_pct ({0}) must be within (0, 1)")]
    GridUpPctOutOfRange(f64),

    #[error("grid_down_pct ({0}) must be within (0, 1)")]
    GridDownPctOutOfRange(f64),

    #[error("unit_cash ({0}) must be positive")]
    NonPositiveUnitCash(f64),

    #[error("total_units ({0}) must be at least 1")]
    ZeroTotalUnits(u32),
}

/// Reference price the next buy threshold is measured against
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BuyReference {
    /// Measure the drop from the most recent buy price
    ByLatestBuy,
    /// Measure the drop from the most recent sell price
    ByLatestSell,
}

impl std::str::FromStr for BuyReference {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "by_latest_buy" => Ok(BuyReference::ByLatestBuy),
            "by_latest_sell" => Ok(BuyReference::ByLatestSell),
            _ => Err(format!(
                "Unknown buy reference: {}. Use 'by_latest_buy' or 'by_latest_sell'",
                s
            )),
        }
    }
}

impl std::fmt::Display for BuyReference {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            BuyReference::ByLatestBuy => write!(f, "by_latest_buy"),
            BuyReference::ByLatestSell => write!(f, "by_latest_sell"),
        }
    }
}

/// Grid strategy parameters
///
/// The run starts with `unit_cash * total_units` in cash. Each grid level is
/// sized to `unit_cash` at the price it opens at.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GridConfig {
    /// Rise from the last buy price that triggers a sell (e.g. 0.02 = 2%)
    pub grid_up_pct: f64,

    /// Drop from the reference price that triggers a buy (e.g. 0.02 = 2%)
    pub grid_down_pct: f64,

    /// Cash committed per grid level
    pub unit_cash: f64,

    /// Maximum number of simultaneously open grid levels
    pub total_units: u32,

    /// Which transaction price anchors the buy threshold
    #[serde(default = "default_buy_reference")]
    pub buy_reference: BuyReference,
}

fn default_buy_reference() -> BuyReference {
    BuyReference::ByLatestBuy
}

impl Default for GridConfig {
    fn default() -> Self {
        GridConfig {
            grid_up_pct: 0.02,
            grid_down_pct: 0.02,
            unit_cash: 10_000.0,
            total_units: 10,
            buy_reference: BuyReference::ByLatestBuy,
        }
    }
}

impl GridConfig {
    /// Check all parameters; NaN percentages fail the range comparisons
    pub fn validate(&self) -> Result<(), ConfigError> {
        if !(self.grid_up_pct > 0.0 && self.grid_up_pct < 1.0) {
            return Err(ConfigError::GridUpPctOutOfRange(self.grid_up_pct));
        }
        if !(self.grid_down_pct > 0.0 && self.grid_down_pct < 1.0) {
            return Err(ConfigError::GridDownPctOutOfRange(self.grid_down_pct));
        }
        if !(self.unit_cash > 0.0) {
            return Err(ConfigError::NonPositiveUnitCash(self.unit_cash));
        }
        if self.total_units < 1 {
            return Err(ConfigError::ZeroTotalUnits(self.total_units));
        }
        Ok(())
    }

    /// Starting cash for a run
    pub fn initial_cash(&self) -> f64 {
        self.unit_cash * self.total_units as f64
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_is_valid() {
        assert!(GridConfig::default().validate().is_ok());
    }

    #[test]
    fn test_percentages_must_be_strictly_between_zero_and_one() {
        for bad in [0.0, 1.0, -0.5, 1.5, f64::NAN] {
            let config = GridConfig {
                grid_up_pct: bad,
                ..Default::default()
            };
            assert!(matches!(
                config.validate(),
                Err(ConfigError::GridUpPctOutOfRange(_))
            ));

            let config = GridConfig {
                grid_down_pct: bad,
                ..Default::default()
            };
            assert!(matches!(
                config.validate(),
                Err(ConfigError::GridDownPctOutOfRange(_))
            ));
        }
    }

    #[test]
    fn test_unit_cash_must_be_positive() {
        let config = GridConfig {
            unit_cash: 0.0,
            ..Default::default()
        };
        assert!(matches!(
            config.validate(),
            Err(ConfigError::NonPositiveUnitCash(_))
        ));
    }

    #[test]
    fn test_total_units_must_be_at_least_one() {
        let config = GridConfig {
            total_units: 0,
            ..Default::default()
        };
        assert!(matches!(
            config.validate(),
            Err(ConfigError::ZeroTotalUnits(0))
        ));
    }

    #[test]
    fn test_buy_reference_round_trips_through_serde_and_str() {
        let json = serde_json::to_string(&BuyReference::ByLatestSell).unwrap();
        assert_eq!(json, "\"by_latest_sell\"");

        let parsed: BuyReference = "by_latest_buy".parse().unwrap();
        assert_eq!(parsed, BuyReference::ByLatestBuy);
        assert!("by_magic".parse::<BuyReference>().is_err());
    }

    #[test]
    fn test_initial_cash_scales_with_units() {
        let config = GridConfig::default();
        assert_eq!(config.initial_cash(), 100_000.0);
    }
}
