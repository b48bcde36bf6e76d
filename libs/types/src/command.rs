//! Transaction commands and delivery finality
//!
//! A command is the decoded form of one transaction payload. Decoding and
//! validation are deliberately separate steps: a command carries the raw
//! instrument and price bytes it arrived with, and range checking happens
//! only when the command is applied to a snapshot.

use crate::ids::InstrumentId;
use serde::{Deserialize, Serialize};

/// Gossip pacing a member can request for the whole network.
///
/// Wire ordinals are fixed: slow = 0, fast = 1. Append-only.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum SyncSpeed {
    Slow,
    Fast,
}

impl SyncSpeed {
    pub fn ordinal(&self) -> u8 {
        match self {
            SyncSpeed::Slow => 0,
            SyncSpeed::Fast => 1,
        }
    }

    pub fn from_ordinal(byte: u8) -> Option<Self> {
        match byte {
            0 => Some(SyncSpeed::Slow),
            1 => Some(SyncSpeed::Fast),
            _ => None,
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            SyncSpeed::Slow => "slow",
            SyncSpeed::Fast => "fast",
        }
    }
}

/// One decoded transaction payload.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Command {
    /// Ask the transport to pace gossip faster or slower.
    SetSyncSpeed(SyncSpeed),
    /// Offer to sell one share of the instrument.
    PlaceAsk {
        instrument: InstrumentId,
        price_cents: u8,
    },
    /// Offer to buy one share of the instrument.
    PlaceBid {
        instrument: InstrumentId,
        price_cents: u8,
    },
}

impl Command {
    /// Short name for logs and counters.
    pub fn label(&self) -> &'static str {
        match self {
            Command::SetSyncSpeed(_) => "set_sync_speed",
            Command::PlaceAsk { .. } => "place_ask",
            Command::PlaceBid { .. } => "place_bid",
        }
    }
}

/// Delivery stage of a transaction relative to consensus.
///
/// The ordering layer may hand the same transaction over several times
/// provisionally before the single final delivery that fixes its place
/// in the total order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Finality {
    /// Early delivery with an estimated timestamp; may repeat.
    Provisional,
    /// Order and timestamp are now immutable; delivered exactly once.
    Final,
}

impl Finality {
    pub fn is_final(&self) -> bool {
        matches!(self, Finality::Final)
    }
}
