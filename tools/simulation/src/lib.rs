//! Exchange cluster simulation.
//!
//! Boots several replicas over one roster, feeds them an identical
//! ordered transaction stream through a simulated ordering layer, and
//! drives seeded trader bots against the market. Every run doubles as a
//! convergence check: the replicas must end on the same ledger digest.
//!
//! # Modules
//! - `tickers`: Seeded ticker symbol generation
//! - `sequencer`: Deterministic stand-in for the ordering layer
//! - `bots`: Seeded trader bots
//! - `harness`: Cluster assembly, run loop, and the final report

pub mod tickers;
pub mod sequencer;
pub mod bots;
pub mod harness;

/// Crate version constant
pub const VERSION: &str = "1.0.0";
