//! Per-instrument quote rows.
//!
//! [`latest_quotes`] flattens one snapshot into self-contained rows: ticker
//! and participant names are resolved up front so a feed consumer never
//! needs the roster that produced them.

use std::fmt;

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use types::ids::{InstrumentId, ParticipantId};
use types::ledger::{LedgerSnapshot, Offer};

use crate::format_dollars;

/// One side of a quote book, resolved for publication.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct QuoteSide {
    /// Offered price in dollars.
    pub price: Decimal,
    /// Roster index of the participant behind the offer.
    pub participant: ParticipantId,
    /// Display name of that participant.
    pub participant_name: String,
}

/// Public quote row for a single instrument.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InstrumentQuote {
    pub instrument: InstrumentId,
    pub ticker: String,
    /// Lowest outstanding offer to sell, if any.
    pub ask: Option<QuoteSide>,
    /// Highest outstanding offer to buy, if any.
    pub bid: Option<QuoteSide>,
    /// Price of the most recent trade in this instrument, in dollars.
    pub last_price: Decimal,
}

/// Builds one [`InstrumentQuote`] per listed instrument, in listing order.
pub fn latest_quotes(snapshot: &LedgerSnapshot) -> Vec<InstrumentQuote> {
    let resolve = |offer: Offer| QuoteSide {
        price: offer.price.as_dollars(),
        participant: offer.participant,
        participant_name: snapshot
            .roster()
            .name(offer.participant)
            .unwrap_or("?")
            .to_string(),
    };

    snapshot
        .books()
        .iter()
        .enumerate()
        .map(|(index, book)| InstrumentQuote {
            instrument: InstrumentId::new(index as u8),
            ticker: snapshot.tickers()[index].clone(),
            ask: book.ask.map(resolve),
            bid: book.bid.map(resolve),
            last_price: book.last_price.as_dollars(),
        })
        .collect()
}

impl fmt::Display for InstrumentQuote {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{:<6} last {}",
            self.ticker,
            format_dollars(self.last_price)
        )?;
        match &self.ask {
            Some(side) => write!(
                f,
                "  ask {} ({})",
                format_dollars(side.price),
                side.participant_name
            )?,
            None => write!(f, "  ask -")?,
        }
        match &self.bid {
            Some(side) => write!(
                f,
                "  bid {} ({})",
                format_dollars(side.price),
                side.participant_name
            ),
            None => write!(f, "  bid -"),
        }
    }
}
