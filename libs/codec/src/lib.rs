//! Wire codec for exchange transactions
//!
//! Transactions travel through the ordering layer as opaque byte arrays.
//! The first byte selects the command kind; quote commands carry two more
//! bytes for the instrument and the price in cents. Decoding tolerates
//! trailing bytes so that replicas stay compatible with producers that pad
//! their payloads, but encoding always emits the canonical short form.
//!
//! Layout:
//! - `[0]` set sync speed to slow
//! - `[1]` set sync speed to fast
//! - `[2, instrument, price]` place a bid
//! - `[3, instrument, price]` place an ask

use thiserror::Error;

use types::command::{Command, SyncSpeed};
use types::ids::InstrumentId;

/// Kind byte for [`Command::SetSyncSpeed`] with [`SyncSpeed::Slow`].
pub const KIND_SPEED_SLOW: u8 = 0;
/// Kind byte for [`Command::SetSyncSpeed`] with [`SyncSpeed::Fast`].
pub const KIND_SPEED_FAST: u8 = 1;
/// Kind byte for [`Command::PlaceBid`].
pub const KIND_PLACE_BID: u8 = 2;
/// Kind byte for [`Command::PlaceAsk`].
pub const KIND_PLACE_ASK: u8 = 3;

/// Byte length of an encoded quote command.
pub const QUOTE_LEN: usize = 3;

/// Failure to decode a transaction payload.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum CodecError {
    #[error("empty transaction payload")]
    Empty,
    #[error("unknown transaction kind byte {0}")]
    UnknownKind(u8),
    #[error("kind {kind} payload truncated: {len} bytes, need {need}")]
    Truncated { kind: u8, len: usize, need: usize },
}

/// Decodes a transaction payload.
///
/// Bytes past the encoded command are ignored. The price byte is passed
/// through unvalidated; range checking is the matching engine's job.
pub fn decode(payload: &[u8]) -> Result<Command, CodecError> {
    let kind = *payload.first().ok_or(CodecError::Empty)?;
    match kind {
        KIND_SPEED_SLOW => Ok(Command::SetSyncSpeed(SyncSpeed::Slow)),
        KIND_SPEED_FAST => Ok(Command::SetSyncSpeed(SyncSpeed::Fast)),
        KIND_PLACE_BID | KIND_PLACE_ASK => {
            if payload.len() < QUOTE_LEN {
                return Err(CodecError::Truncated {
                    kind,
                    len: payload.len(),
                    need: QUOTE_LEN,
                });
            }
            let instrument = InstrumentId::new(payload[1]);
            let price_cents = payload[2];
            if kind == KIND_PLACE_BID {
                Ok(Command::PlaceBid {
                    instrument,
                    price_cents,
                })
            } else {
                Ok(Command::PlaceAsk {
                    instrument,
                    price_cents,
                })
            }
        }
        other => Err(CodecError::UnknownKind(other)),
    }
}

/// Encodes a command in canonical form: one byte for speed changes, three
/// for quotes.
pub fn encode(command: Command) -> Vec<u8> {
    match command {
        Command::SetSyncSpeed(SyncSpeed::Slow) => vec![KIND_SPEED_SLOW],
        Command::SetSyncSpeed(SyncSpeed::Fast) => vec![KIND_SPEED_FAST],
        Command::PlaceBid {
            instrument,
            price_cents,
        } => vec![KIND_PLACE_BID, instrument.as_u8(), price_cents],
        Command::PlaceAsk {
            instrument,
            price_cents,
        } => vec![KIND_PLACE_ASK, instrument.as_u8(), price_cents],
    }
}
