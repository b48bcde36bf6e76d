//! Trade tape access.
//!
//! The ledger keeps a bounded ring of recent trades plus a global counter,
//! so a tape consumer can both fetch individual records and detect the
//! ones it was too slow to see. [`TapeCursor`] packages that pattern:
//! poll it with successive snapshots and it returns each retained trade
//! exactly once, oldest first, counting evictions it skipped over.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use tracing::debug;
use types::ledger::LedgerSnapshot;
use types::trade::TradeRecord;

use crate::{dollars, format_dollars};

/// Fetches one trade by global sequence number.
///
/// `None` means the sequence has not happened yet or the record was
/// already evicted from the ring; neither case is an error.
pub fn trade(snapshot: &LedgerSnapshot, seq: u64) -> Option<TradeRecord> {
    snapshot.trades().get(seq).copied()
}

/// Total number of trades settled since genesis.
pub fn trade_count(snapshot: &LedgerSnapshot) -> u64 {
    snapshot.trades().total()
}

/// First and last sequence numbers still retrievable from the ring, or
/// `None` when no trade has settled yet.
pub fn ring_window(snapshot: &LedgerSnapshot) -> Option<(u64, u64)> {
    let log = snapshot.trades();
    log.first_retained_seq().map(|first| (first, log.total()))
}

/// One batch of records returned by [`TapeCursor::poll`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TapePoll {
    /// Records this cursor had not seen before, oldest first.
    pub records: Vec<TradeRecord>,
    /// Count of records evicted before this poll could read them.
    /// Non-zero only when the caller polls slower than the market trades.
    pub missed: u64,
}

/// Stateful poller over the trade ring.
///
/// Remembers the next unseen sequence number between calls. Every settled
/// trade is either returned by exactly one poll or counted as missed by
/// exactly one poll, never both.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TapeCursor {
    next_seq: u64,
}

impl TapeCursor {
    /// Cursor positioned before the first trade.
    pub fn new() -> Self {
        Self { next_seq: 1 }
    }

    /// Sequence number the next poll will start from.
    pub fn next_seq(&self) -> u64 {
        self.next_seq
    }

    /// Returns the trades settled since the previous poll that are still
    /// inside the ring, oldest first, and advances past them.
    pub fn poll(&mut self, snapshot: &LedgerSnapshot) -> TapePoll {
        let log = snapshot.trades();
        let total = log.total();

        let mut missed = 0;
        if let Some(first) = log.first_retained_seq() {
            if self.next_seq < first {
                missed = first - self.next_seq;
                self.next_seq = first;
                debug!(missed, resume_seq = first, "tape cursor fell behind the ring");
            }
        }

        let expected = (total + 1).saturating_sub(self.next_seq) as usize;
        let mut records = Vec::with_capacity(expected);
        while self.next_seq <= total {
            if let Some(record) = log.get(self.next_seq) {
                records.push(*record);
            }
            self.next_seq += 1;
        }

        TapePoll { records, missed }
    }
}

impl Default for TapeCursor {
    fn default() -> Self {
        Self::new()
    }
}

/// Renders one record as a human tape line.
///
/// Columns: sequence, ticker, execution price, direction mark, absolute
/// price move, move as a percentage of the previous price, seller->buyer.
pub fn tape_line(snapshot: &LedgerSnapshot, record: &TradeRecord) -> String {
    let ticker = snapshot.ticker(record.instrument).unwrap_or("?");
    let seller = snapshot.roster().name(record.seller).unwrap_or("?");
    let buyer = snapshot.roster().name(record.buyer).unwrap_or("?");

    let change = record.change_cents();
    let mark = match change {
        c if c > 0 => '^',
        c if c < 0 => 'v',
        _ => ' ',
    };

    let price = format_dollars(record.price.as_dollars());
    let moved = format_dollars(dollars(change.abs()));
    let percent = format!("{}%", change_percent(record));

    format!(
        "{:>6} {:>6} {:>7} {} {:>6} {:>7}  {}->{}",
        record.seq, ticker, price, mark, moved, percent, seller, buyer
    )
}

/// Absolute price move as a percentage of the previous trade price,
/// rounded to one decimal place.
pub fn change_percent(record: &TradeRecord) -> Decimal {
    let numerator = Decimal::from(record.change_cents().abs() * 100);
    (numerator / Decimal::from(record.prev_price.as_cents())).round_dp(1)
}
