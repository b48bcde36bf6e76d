//! Trade records and the bounded trade history ring
//!
//! Every settled trade is assigned a global 1-based sequence number. The
//! ledger retains only the most recent `capacity` records; older entries
//! are evicted but the total count keeps growing, so readers can detect
//! gaps in what they have seen.

use std::sync::Arc;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::ids::{InstrumentId, ParticipantId};
use crate::price::Price;

/// Interchange line version emitted by [`TradeRecord::canonical_line`].
pub const TRADE_LINE_VERSION: &str = "v1";

/// A single settled trade.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TradeRecord {
    /// Global 1-based sequence number.
    pub seq: u64,
    pub instrument: InstrumentId,
    /// Execution price.
    pub price: Price,
    /// Last trade price for this instrument before this one.
    pub prev_price: Price,
    pub seller: ParticipantId,
    pub buyer: ParticipantId,
    /// Seller cash after settlement, in cents.
    pub seller_balance_cents: i64,
    /// Buyer cash after settlement, in cents.
    pub buyer_balance_cents: i64,
}

impl TradeRecord {
    /// Signed price move against the previous trade, in cents.
    pub fn change_cents(&self) -> i64 {
        self.price.as_cents() - self.prev_price.as_cents()
    }

    /// Renders the pipe-delimited interchange form of this record.
    ///
    /// The line is stable across versions of this crate and is what
    /// snapshot interchange embeds for each retained ring slot.
    pub fn canonical_line(&self) -> String {
        format!(
            "{}|{}|{}|{}|{}|{}|{}|{}|{}",
            TRADE_LINE_VERSION,
            self.seq,
            self.instrument.as_u8(),
            self.price.as_u8(),
            self.prev_price.as_u8(),
            self.seller.as_u32(),
            self.buyer.as_u32(),
            self.seller_balance_cents,
            self.buyer_balance_cents,
        )
    }

    /// Parses a line produced by [`canonical_line`](Self::canonical_line).
    pub fn parse_line(line: &str) -> Result<Self, TradeLineError> {
        let fields: Vec<&str> = line.split('|').collect();
        if fields.len() != 9 {
            return Err(TradeLineError::FieldCount(fields.len()));
        }
        if fields[0] != TRADE_LINE_VERSION {
            return Err(TradeLineError::UnsupportedVersion(fields[0].to_string()));
        }

        fn field<T: std::str::FromStr>(name: &'static str, raw: &str) -> Result<T, TradeLineError> {
            raw.parse().map_err(|_| TradeLineError::BadField {
                field: name,
                value: raw.to_string(),
            })
        }

        let price = Price::try_new(field("price", fields[3])?).map_err(|_| {
            TradeLineError::BadField {
                field: "price",
                value: fields[3].to_string(),
            }
        })?;
        let prev_price = Price::try_new(field("prev_price", fields[4])?).map_err(|_| {
            TradeLineError::BadField {
                field: "prev_price",
                value: fields[4].to_string(),
            }
        })?;

        Ok(Self {
            seq: field("seq", fields[1])?,
            instrument: InstrumentId::new(field("instrument", fields[2])?),
            price,
            prev_price,
            seller: ParticipantId::new(field("seller", fields[5])?),
            buyer: ParticipantId::new(field("buyer", fields[6])?),
            seller_balance_cents: field("seller_balance", fields[7])?,
            buyer_balance_cents: field("buyer_balance", fields[8])?,
        })
    }
}

/// Failure to parse a trade interchange line.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum TradeLineError {
    #[error("unsupported trade line version {0:?}")]
    UnsupportedVersion(String),
    #[error("expected 9 trade line fields, found {0}")]
    FieldCount(usize),
    #[error("invalid {field} field {value:?}")]
    BadField { field: &'static str, value: String },
}

/// Fixed-capacity ring of the most recent trades.
///
/// The write cursor advances before each write, so the first record lands
/// in slot 1 and slot 0 stays empty until the ring wraps. Lookup is by
/// global sequence number, not slot index.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TradeLog {
    slots: Arc<[Option<TradeRecord>]>,
    cursor: usize,
    stored: usize,
    total: u64,
}

impl TradeLog {
    /// Creates an empty ring.
    ///
    /// # Panics
    ///
    /// Panics if `capacity` is zero.
    pub fn new(capacity: usize) -> Self {
        assert!(capacity > 0, "trade ring capacity must be positive");
        Self {
            slots: vec![None; capacity].into(),
            cursor: 0,
            stored: 0,
            total: 0,
        }
    }

    /// Reassembles a ring from interchange parts, or `None` if the parts
    /// are mutually inconsistent.
    pub fn from_parts(
        slots: Vec<Option<TradeRecord>>,
        cursor: usize,
        stored: usize,
        total: u64,
    ) -> Option<Self> {
        let capacity = slots.len();
        if capacity == 0 || cursor >= capacity || stored > capacity || stored as u64 > total {
            return None;
        }
        let log = Self {
            slots: slots.into(),
            cursor,
            stored,
            total,
        };
        // Every retained sequence number must resolve to a record that
        // agrees about its own position.
        for seq in log.first_retained_seq().unwrap_or(1)..=total {
            match log.get(seq) {
                Some(record) if record.seq == seq => {}
                _ => return None,
            }
        }
        Some(log)
    }

    pub fn capacity(&self) -> usize {
        self.slots.len()
    }

    /// Count of records still retained.
    pub fn stored(&self) -> usize {
        self.stored
    }

    /// Slot index of the most recent record.
    pub fn cursor(&self) -> usize {
        self.cursor
    }

    /// Count of trades ever appended, including evicted ones.
    pub fn total(&self) -> u64 {
        self.total
    }

    /// Raw slot array, in slot order.
    pub fn slots(&self) -> &[Option<TradeRecord>] {
        &self.slots
    }

    /// Oldest sequence number still retained, if any.
    pub fn first_retained_seq(&self) -> Option<u64> {
        if self.stored == 0 {
            None
        } else {
            Some(self.total - self.stored as u64 + 1)
        }
    }

    /// Appends a record, evicting the oldest once the ring is full.
    pub fn append(&mut self, record: TradeRecord) {
        debug_assert_eq!(record.seq, self.total + 1);
        let capacity = self.slots.len();
        let mut slots = self.slots.to_vec();
        self.total += 1;
        self.stored = usize::min(capacity, self.stored + 1);
        self.cursor = (self.cursor + 1) % capacity;
        slots[self.cursor] = Some(record);
        self.slots = slots.into();
    }

    /// Looks up a trade by global sequence number.
    ///
    /// Returns `None` for sequence numbers never assigned or already
    /// evicted from the ring.
    pub fn get(&self, seq: u64) -> Option<&TradeRecord> {
        if seq == 0 || seq > self.total {
            return None;
        }
        let age = self.total - seq;
        if age >= self.stored as u64 {
            return None;
        }
        let capacity = self.slots.len();
        let idx = (self.cursor + capacity - age as usize) % capacity;
        self.slots[idx].as_ref()
    }

    /// The most recent `n` retained records, oldest first.
    pub fn window(&self, n: usize) -> Vec<&TradeRecord> {
        let take = usize::min(n, self.stored) as u64;
        let lo = self.total - take + 1;
        (lo..=self.total).filter_map(|seq| self.get(seq)).collect()
    }
}
