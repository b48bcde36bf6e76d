//! Trading bots for the simulated cluster.
//!
//! Seeded random quoting, one bot per member.

pub mod random_trader;
