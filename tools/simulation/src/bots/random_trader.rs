//! Random quoting bot.
//!
//! Stands in for a member placing speculative quotes: each round it walks
//! the listed instruments and, with a coin flip per instrument, offers to
//! buy or sell one share near the last traded price. Seeded RNG keeps
//! every run reproducible.

use rand::Rng;
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use serde::{Deserialize, Serialize};

use types::command::Command;
use types::ids::{InstrumentId, ParticipantId};
use types::ledger::LedgerSnapshot;

/// Tunables for the random quoting bot.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TraderConfig {
    /// Chance of quoting each instrument per round, 0.0 to 1.0.
    pub quote_probability: f64,
    /// Largest distance between the quote and the last traded price,
    /// in cents.
    pub max_offset_cents: i64,
}

impl Default for TraderConfig {
    fn default() -> Self {
        Self {
            quote_probability: 0.5,
            max_offset_cents: 2,
        }
    }
}

/// A quoting bot bound to one member.
pub struct RandomTrader {
    pub participant: ParticipantId,
    pub config: TraderConfig,
    pub quotes_generated: usize,
    rng: ChaCha8Rng,
}

impl RandomTrader {
    /// Creates a trader with a deterministic seed.
    pub fn new(participant: ParticipantId, config: TraderConfig, seed: u64) -> Self {
        Self {
            participant,
            config,
            quotes_generated: 0,
            rng: ChaCha8Rng::seed_from_u64(seed),
        }
    }

    /// One quoting round over the listed instruments.
    ///
    /// Prices land within `max_offset_cents` of the instrument's last
    /// traded price, clamped to 0..=127. A clamp to zero still goes out;
    /// the ledger rejects zero-priced quotes on delivery.
    pub fn round(&mut self, snapshot: &LedgerSnapshot) -> Vec<Vec<u8>> {
        let mut payloads = Vec::new();
        for (index, book) in snapshot.books().iter().enumerate() {
            if !self.rng.gen_bool(self.config.quote_probability) {
                continue;
            }
            let instrument = InstrumentId::new(index as u8);
            let sell = self.rng.gen_bool(0.5);
            let offset = self
                .rng
                .gen_range(-self.config.max_offset_cents..=self.config.max_offset_cents);
            let price_cents = (book.last_price.as_cents() + offset).clamp(0, 127) as u8;
            let command = if sell {
                Command::PlaceAsk {
                    instrument,
                    price_cents,
                }
            } else {
                Command::PlaceBid {
                    instrument,
                    price_cents,
                }
            };
            payloads.push(codec::encode(command));
            self.quotes_generated += 1;
        }
        payloads
    }
}
