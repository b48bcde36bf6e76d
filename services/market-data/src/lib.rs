//! Read-side market data projections.
//!
//! Everything here is a pure function of one published [`LedgerSnapshot`]:
//! callers clone the current `Arc` out of their view once and hand a
//! reference in. No function blocks the ledger writer, and because
//! snapshots are immutable no projection can observe a half-applied
//! transaction.
//!
//! - [`quotes`]: per-instrument quote rows (outstanding ask/bid, last price).
//! - [`summary`]: per-participant account summaries.
//! - [`tape`]: trade lookup, ring windows, and the polling tape cursor.
//!
//! All dollar amounts are `rust_decimal` values derived from ledger cents;
//! no floating point is involved anywhere.
//!
//! [`LedgerSnapshot`]: types::ledger::LedgerSnapshot

pub mod quotes;
pub mod summary;
pub mod tape;

pub use quotes::{latest_quotes, InstrumentQuote, QuoteSide};
pub use summary::{participant_summaries, participant_summary, ParticipantSummary};
pub use tape::{ring_window, tape_line, trade, trade_count, TapeCursor, TapePoll};

use rust_decimal::Decimal;

/// Converts a cent amount into a dollar `Decimal` with two decimal places.
pub fn dollars(cents: i64) -> Decimal {
    Decimal::new(cents, 2)
}

/// Renders a dollar amount with a leading `$`, keeping the sign in front.
pub fn format_dollars(amount: Decimal) -> String {
    if amount.is_sign_negative() {
        format!("-${}", -amount)
    } else {
        format!("${}", amount)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_dollars_keeps_two_decimal_places() {
        assert_eq!(dollars(20_000).to_string(), "200.00");
        assert_eq!(dollars(64).to_string(), "0.64");
        assert_eq!(dollars(0).to_string(), "0.00");
    }

    #[test]
    fn test_format_dollars_sign_placement() {
        assert_eq!(format_dollars(dollars(123)), "$1.23");
        assert_eq!(format_dollars(dollars(-66)), "-$0.66");
        assert_eq!(format_dollars(dollars(0)), "$0.00");
    }
}
