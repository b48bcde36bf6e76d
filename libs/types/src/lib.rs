//! Types library for the replicated exchange
//!
//! This library provides the core type definitions shared by every replica:
//! the immutable ledger snapshot, the transaction commands that advance it,
//! and the supporting identifier and price types. Everything here is plain
//! data with deterministic behavior; replicas that apply the same commands
//! to the same snapshot must end up with bit-identical values.
//!
//! # Modules
//! - `ids`: Integer identifiers (ParticipantId, InstrumentId)
//! - `price`: Single-byte cent prices with the crossing arithmetic
//! - `command`: Transaction commands and delivery finality
//! - `roster`: Ordered membership list
//! - `genesis`: Starting parameters every replica agrees on
//! - `trade`: Trade records and the bounded trade history ring
//! - `ledger`: The snapshot value and its mutation draft

// Public modules
pub mod command;
pub mod genesis;
pub mod ids;
pub mod ledger;
pub mod price;
pub mod roster;
pub mod trade;

// Library version constant
pub const LIB_VERSION: &str = "1.0.0";

/// Prelude module for convenient imports
pub mod prelude {
    pub use crate::command::*;
    pub use crate::genesis::*;
    pub use crate::ids::*;
    pub use crate::ledger::*;
    pub use crate::price::*;
    pub use crate::roster::*;
    pub use crate::trade::*;
}
