//! Identifier types for roster members and listed instruments
//!
//! Both identifiers are small integers assigned by external agreement:
//! a participant id is the member's position in the roster, an instrument
//! id is the position in the genesis ticker table. Neither is ever
//! reassigned while a ledger generation is running.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Identifier of a roster member.
///
/// Equal to the member's position in the roster, so it doubles as the
/// index into the balance and holdings tables.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ParticipantId(u32);

impl ParticipantId {
    pub const fn new(raw: u32) -> Self {
        Self(raw)
    }

    pub fn as_u32(&self) -> u32 {
        self.0
    }

    /// Index into per-participant tables.
    pub fn index(&self) -> usize {
        self.0 as usize
    }
}

impl fmt::Display for ParticipantId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<u32> for ParticipantId {
    fn from(raw: u32) -> Self {
        Self(raw)
    }
}

/// Identifier of a listed instrument.
///
/// One byte on the wire; the value is the index into the ticker table.
/// A decoded id may point past the table, so lookups through it are
/// fallible and an out-of-range id rejects the command carrying it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct InstrumentId(u8);

impl InstrumentId {
    pub const fn new(raw: u8) -> Self {
        Self(raw)
    }

    pub fn as_u8(&self) -> u8 {
        self.0
    }

    /// Index into per-instrument tables.
    pub fn index(&self) -> usize {
        self.0 as usize
    }
}

impl fmt::Display for InstrumentId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<u8> for InstrumentId {
    fn from(raw: u8) -> Self {
        Self(raw)
    }
}
