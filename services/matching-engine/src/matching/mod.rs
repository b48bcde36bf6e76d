//! Matching logic module
//!
//! Crossing detection over the remembered quote pair, and settlement of
//! the single-share trade a cross produces.

pub mod crossing;
pub mod settlement;

pub use crossing::{can_cross, crossed};
pub use settlement::settle;
