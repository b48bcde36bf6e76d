//! Matching Engine Service
//!
//! Deterministic continuous double auction over the replicated ledger.
//! Each instrument remembers at most one ask and one bid; a quote that
//! beats the remembered offer replaces it, and when ask meets bid one
//! share settles at the rounded midpoint.
//!
//! **Key Invariants:**
//! - Applying a transaction never mutates the input snapshot
//! - Same snapshot + same transaction → same outcome, bit for bit
//! - Cash and share totals are conserved by every trade
//! - A book never stays crossed: ask ≤ bid settles immediately

pub mod engine;
pub mod matching;
pub mod outcome;

pub use engine::apply;
pub use outcome::{ApplyOutcome, Disposition, RejectReason};
