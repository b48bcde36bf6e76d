//! Replica Service
//!
//! Drives one replica of the exchange: transactions arrive already
//! ordered, go through the matching engine one at a time, and each
//! successor snapshot is published for readers. The driver also owns the
//! replica-local concerns the ledger itself stays free of, namely the
//! gossip pacing requested by speed commands and per-replica counters.
//!
//! **Key Invariants:**
//! - One writer per replica; readers share immutable snapshots
//! - Readers never observe a half-applied transaction
//! - Replicas fed the same stream converge on equal ledgers

pub mod determinism;
pub mod replica;
pub mod view;

pub use replica::{Delivery, Replica, ReplicaConfig, ReplicaStats};
pub use view::LedgerView;
