//! Prices in integer cents
//!
//! Every price travels as a single byte between 1 and 127 cents, and all
//! price arithmetic is done on integers. Decimal values exist only at the
//! display edge; nothing in the core touches floating point.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

/// Lowest valid price, in cents.
pub const MIN_PRICE_CENTS: u8 = 1;
/// Highest valid price, in cents.
pub const MAX_PRICE_CENTS: u8 = 127;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum PriceError {
    #[error("price {0} is outside the 1..=127 cent range")]
    OutOfRange(u8),
}

/// A validated price in cents.
///
/// Construction checks the range once; every `Price` in a snapshot is
/// known to be between 1 and 127 cents inclusive.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "u8", into = "u8")]
pub struct Price(u8);

impl Price {
    pub fn try_new(cents: u8) -> Result<Self, PriceError> {
        if (MIN_PRICE_CENTS..=MAX_PRICE_CENTS).contains(&cents) {
            Ok(Self(cents))
        } else {
            Err(PriceError::OutOfRange(cents))
        }
    }

    pub fn as_u8(&self) -> u8 {
        self.0
    }

    pub fn as_cents(&self) -> i64 {
        i64::from(self.0)
    }

    /// Dollar value for display, exact to the cent.
    pub fn as_dollars(&self) -> Decimal {
        Decimal::new(self.as_cents(), 2)
    }

    /// Price of a trade between a crossed ask and bid.
    ///
    /// Integer mean of the two prices; a half-cent mean rounds to the
    /// even cent. Two valid inputs always produce a valid output, and
    /// the result never leaves the closed interval between them.
    pub fn crossing_midpoint(ask: Price, bid: Price) -> Price {
        let sum = u16::from(ask.0) + u16::from(bid.0);
        Price((sum / 2 + (sum % 4) / 3) as u8)
    }
}

impl fmt::Display for Price {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "${}", self.as_dollars())
    }
}

impl TryFrom<u8> for Price {
    type Error = PriceError;

    fn try_from(cents: u8) -> Result<Self, Self::Error> {
        Self::try_new(cents)
    }
}

impl From<Price> for u8 {
    fn from(price: Price) -> Self {
        price.0
    }
}
