//! Genesis parameters for a new ledger
//!
//! Every replica must start from an identical configuration; two replicas
//! with different genesis values will never converge no matter how the
//! transaction stream is applied.

use serde::{Deserialize, Serialize};

/// Ticker table used when no explicit listing is configured.
pub const DEFAULT_TICKERS: [&str; 10] = [
    "ARDL", "BRYO", "CLMP", "DRIF", "EMBR", "FLUX", "GRAV", "HOLM", "IRID", "JUNC",
];

/// Starting parameters agreed before the first transaction.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GenesisConfig {
    /// Ticker symbol per listed instrument, in instrument-id order.
    pub tickers: Vec<String>,
    /// Starting cash per member, in cents.
    pub initial_balance_cents: i64,
    /// Starting share count per member, per instrument.
    pub initial_holdings: i64,
    /// Starting last-trade price for every instrument, in cents.
    pub initial_price_cents: u8,
    /// How many past trades each snapshot retains.
    pub trade_ring_capacity: usize,
}

impl Default for GenesisConfig {
    fn default() -> Self {
        Self {
            tickers: DEFAULT_TICKERS.iter().map(|t| t.to_string()).collect(),
            initial_balance_cents: 20_000,
            initial_holdings: 200,
            initial_price_cents: 64,
            trade_ring_capacity: 200,
        }
    }
}

impl GenesisConfig {
    pub fn instrument_count(&self) -> usize {
        self.tickers.len()
    }
}
