//! Cash and share bookkeeping for a single backtest run

/// Broker-style account state, mutated only by the strategy engine.
///
/// `units_bought` counts open grid levels and governs grid-rule eligibility.
/// `held_shares` tracks real shares for mark-to-market valuation; the two can
/// diverge because sell sizes are recomputed from the sell price rather than
/// taken from the buy batch being closed.
#[derive(Debug, Clone)]
pub struct Ledger {
    pub cash: f64,
    pub units_bought: u32,
    pub held_shares: u64,
    pub last_buy_price: Option<f64>,
    pub last_sell_price: Option<f64>,
}

impl Ledger {
    pub fn new(initial_cash: f64) -> Self {
        Ledger {
            cash: initial_cash,
            units_bought: 0,
            held_shares: 0,
            last_buy_price: None,
            last_sell_price: None,
        }
    }

    /// Account value at the given close: cash plus held shares marked to market
    pub fn mark_to_market(&self, close: f64) -> f64 {
        self.cash + self.held_shares as f64 * close
    }

    /// Execute a buy; returns the post-trade (cash, value) pair
    pub fn apply_buy(&mut self, price: f64, size: u64) -> (f64, f64) {
        self.cash -= size as f64 * price;
        self.held_shares += size;
        (self.cash, self.mark_to_market(price))
    }

    /// Execute a sell; returns the post-trade (cash, value) pair.
    ///
    /// The caller recomputes the sell size from the sell price, so it can
    /// exceed the shares still held; the share count saturates at zero
    /// instead of going short.
    pub fn apply_sell(&mut self, price: f64, size: u64) -> (f64, f64) {
        self.cash += size as f64 * price;
        self.held_shares = self.held_shares.saturating_sub(size);
        (self.cash, self.mark_to_market(price))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_buy_moves_cash_into_shares() {
        let mut ledger = Ledger::new(100_000.0);
        let (cash, value) = ledger.apply_buy(1.316, 7598);

        assert_relative_eq!(cash, 100_000.0 - 7598.0 * 1.316, epsilon = 1e-9);
        assert_eq!(ledger.held_shares, 7598);
        // Buying at the mark leaves total value unchanged
        assert_relative_eq!(value, 100_000.0, epsilon = 1e-9);
    }

    #[test]
    fn test_sell_moves_shares_back_into_cash() {
        let mut ledger = Ledger::new(100_000.0);
        ledger.apply_buy(1.316, 7598);
        let (cash, _) = ledger.apply_sell(1.370, 7299);

        let expected = 100_000.0 - 7598.0 * 1.316 + 7299.0 * 1.370;
        assert_relative_eq!(cash, expected, epsilon = 1e-9);
        assert_eq!(ledger.held_shares, 7598 - 7299);
    }

    #[test]
    fn test_oversell_saturates_share_count_at_zero() {
        let mut ledger = Ledger::new(100_000.0);
        ledger.apply_buy(2.0, 100);
        ledger.apply_sell(2.5, 150);
        assert_eq!(ledger.held_shares, 0);
    }

    #[test]
    fn test_mark_to_market_includes_held_shares() {
        let mut ledger = Ledger::new(10_000.0);
        ledger.apply_buy(10.0, 500);
        assert_relative_eq!(ledger.mark_to_market(12.0), 5_000.0 + 500.0 * 12.0);
    }
}
