//! Ticker symbol generation.
//!
//! Every replica must boot with the identical instrument list, so symbols
//! come from a seeded generator instead of OS entropy. Symbols are four
//! capital letters, matching the fictitious listings the exchange trades.

use std::collections::HashSet;

use rand::Rng;
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;

/// Letters per ticker symbol.
pub const SYMBOL_LEN: usize = 4;

/// Generates `count` distinct ticker symbols from a seed.
///
/// The same seed always yields the same symbols in the same order.
/// Panics when `count` exceeds the number of distinct four-letter
/// symbols.
pub fn generate_tickers(count: usize, seed: u64) -> Vec<String> {
    let distinct = 26usize.pow(SYMBOL_LEN as u32);
    assert!(count <= distinct, "only {distinct} distinct symbols exist");

    let mut rng = ChaCha8Rng::seed_from_u64(seed);
    let mut seen = HashSet::with_capacity(count);
    let mut symbols = Vec::with_capacity(count);
    while symbols.len() < count {
        let symbol: String = (0..SYMBOL_LEN)
            .map(|_| char::from(b'A' + rng.gen_range(0..26u8)))
            .collect();
        if seen.insert(symbol.clone()) {
            symbols.push(symbol);
        }
    }
    symbols
}
