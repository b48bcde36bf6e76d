//! Ledger snapshot interchange and at-rest storage.
//!
//! A replica that falls behind, or joins late, receives a peer's ledger
//! through the encoding in [`interchange`] instead of replaying history.
//! [`wire`] holds the primitive field framing, [`digest`] derives the
//! SHA-256 convergence digest from the same canonical bytes, and
//! [`store`] persists snapshots to disk with atomic writes and optional
//! zstd compression.
//!
//! The roster is never part of the encoding. Membership is agreed out of
//! band, so a decoder attaches its own roster and rejects streams whose
//! member count disagrees.

pub mod digest;
pub mod interchange;
pub mod store;
pub mod wire;

pub use digest::state_digest;
pub use interchange::{decode_snapshot, encode_snapshot, read_snapshot, write_snapshot};
pub use store::{SnapshotStore, StoreError};
pub use wire::InterchangeError;
