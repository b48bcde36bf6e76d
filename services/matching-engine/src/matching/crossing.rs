//! Crossing detection logic
//!
//! A book crosses when both a remembered ask and a remembered bid exist
//! and the ask does not exceed the bid.

use types::ledger::{Offer, QuoteBook};
use types::price::Price;

/// Check whether an ask and a bid can trade at the given prices.
pub fn can_cross(ask_price: Price, bid_price: Price) -> bool {
    ask_price <= bid_price
}

/// Returns the crossing `(ask, bid)` pair, or `None` while the book has
/// at most one side or a spread.
pub fn crossed(book: &QuoteBook) -> Option<(Offer, Offer)> {
    match (book.ask, book.bid) {
        (Some(ask), Some(bid)) if can_cross(ask.price, bid.price) => Some((ask, bid)),
        _ => None,
    }
}
