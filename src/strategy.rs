//! Grid trading strategy engine
//!
//! Applies the grid rules to one bar at a time, in a fixed order, using only
//! the bar's closing price:
//!
//! 1. Initial entry: with no open level and enough cash, buy one unit.
//!    Nothing else is evaluated on that bar.
//! 2. Sell check: with an open level and the close at or above
//!    `last_buy_price * (1 + grid_up_pct)`, sell one unit. The sell price
//!    becomes the new buy reference.
//! 3. Buy check: with a reference price set, a free level, enough cash, and
//!    the close at or below `reference * (1 - grid_down_pct)`, buy one unit.
//!
//! Trade sizes are always recomputed as `floor(unit_cash / close)` at
//! execution time, for sells as well as buys. A sell therefore does not
//! return the exact share count of the level it closes, and the share ledger
//! keeps the remainder; `units_bought` alone decides grid-rule eligibility.

use tracing::debug;

use crate::config::{BuyReference, GridConfig};
use crate::ledger::Ledger;
use crate::types::{round2, round3, Bar, InvalidBarError, Trade, TradeAction};

/// Strategy state machine for one backtest run
pub struct GridStrategyEngine {
    config: GridConfig,
    ledger: Ledger,
    trades: Vec<Trade>,
    buy_count: u32,
    sell_count: u32,
}

impl GridStrategyEngine {
    pub fn new(config: GridConfig) -> Self {
        let ledger = Ledger::new(config.initial_cash());
        GridStrategyEngine {
            config,
            ledger,
            trades: Vec::new(),
            buy_count: 0,
            sell_count: 0,
        }
    }

    pub fn ledger(&self) -> &Ledger {
        &self.ledger
    }

    pub fn trades(&self) -> &[Trade] {
        &self.trades
    }

    pub fn buy_count(&self) -> u32 {
        self.buy_count
    }

    pub fn sell_count(&self) -> u32 {
        self.sell_count
    }

    pub fn into_trades(self) -> Vec<Trade> {
        self.trades
    }

    /// Process the next bar in the series
    pub fn process_bar(&mut self, bar: &Bar) -> Result<(), InvalidBarError> {
        bar.validate()?;
        let price = bar.close;

        // Initial entry opens the first level as soon as cash allows and
        // skips the sell/buy checks for the rest of the bar.
        if self.ledger.units_bought == 0 && self.ledger.cash >= self.config.unit_cash {
            let size = self.unit_size(price);
            let (cash, value) = self.ledger.apply_buy(price, size);
            self.ledger.units_bought = 1;
            self.ledger.last_buy_price = Some(price);
            self.buy_count += 1;
            debug!(date = %bar.date, price, size, "grid entry");
            self.record(bar, TradeAction::BuyInit, price, size, cash, value);
            return Ok(());
        }

        // Sell one level when the close clears the up threshold. The sell
        // price replaces the buy reference, so the buy check below cannot
        // fire on the same bar for a positive grid_down_pct.
        if let Some(last_buy) = self.ledger.last_buy_price {
            if self.ledger.units_bought > 0 && price >= last_buy * (1.0 + self.config.grid_up_pct)
            {
                let size = self.unit_size(price);
                let (cash, value) = self.ledger.apply_sell(price, size);
                self.ledger.units_bought -= 1;
                self.ledger.last_sell_price = Some(price);
                self.ledger.last_buy_price = Some(price);
                self.sell_count += 1;
                debug!(date = %bar.date, price, size, "grid sell");
                self.record(bar, TradeAction::Sell, price, size, cash, value);
            }
        }

        // Buy check, evaluated against the configured reference price as it
        // stands after the sell check. No fallback between references: an
        // unset reference means no buy.
        let reference = match self.config.buy_reference {
            BuyReference::ByLatestBuy => self.ledger.last_buy_price,
            BuyReference::ByLatestSell => self.ledger.last_sell_price,
        };
        if let Some(reference) = reference {
            if self.ledger.units_bought < self.config.total_units
                && self.ledger.cash >= self.config.unit_cash
                && price <= reference * (1.0 - self.config.grid_down_pct)
            {
                let size = self.unit_size(price);
                let (cash, value) = self.ledger.apply_buy(price, size);
                self.ledger.units_bought += 1;
                self.ledger.last_buy_price = Some(price);
                self.buy_count += 1;
                debug!(date = %bar.date, price, size, "grid buy");
                self.record(bar, TradeAction::Buy, price, size, cash, value);
            }
        }

        Ok(())
    }

    /// Whole shares one unit of cash buys at the given price
    fn unit_size(&self, price: f64) -> u64 {
        (self.config.unit_cash / price).floor() as u64
    }

    fn record(&mut self, bar: &Bar, action: TradeAction, price: f64, size: u64, cash: f64, value: f64) {
        self.trades.push(Trade {
            date: bar.date,
            action,
            price: round3(price),
            size,
            cash: round2(cash),
            value: round2(value),
        });
    }
}
