//! Trade settlement
//!
//! Moves one share and the execution price between the two sides of a
//! crossed book, records the trade, and clears both remembered offers.

use types::ids::InstrumentId;
use types::ledger::{Offer, SnapshotDraft};
use types::price::Price;
use types::trade::TradeRecord;

/// Settles a crossed `(ask, bid)` pair on the draft and returns the
/// recorded trade.
///
/// The execution price is the midpoint of the two quotes, rounded to the
/// nearest even cent. Cash moves first, then the share, so a self-trade
/// nets out to no change apart from the recorded trade itself.
pub fn settle(
    draft: &mut SnapshotDraft,
    instrument: InstrumentId,
    ask: Offer,
    bid: Offer,
) -> TradeRecord {
    let price = Price::crossing_midpoint(ask.price, bid.price);
    let seller = ask.participant;
    let buyer = bid.participant;
    let prev_price = draft.book(instrument).last_price;

    draft.adjust_balance(seller, price.as_cents());
    draft.adjust_balance(buyer, -price.as_cents());
    draft.adjust_holdings(seller, instrument, -1);
    draft.adjust_holdings(buyer, instrument, 1);

    let record = TradeRecord {
        seq: draft.next_trade_seq(),
        instrument,
        price,
        prev_price,
        seller,
        buyer,
        seller_balance_cents: draft.balance_cents(seller),
        buyer_balance_cents: draft.balance_cents(buyer),
    };
    draft.record_trade(record);

    let book = draft.book_mut(instrument);
    book.last_price = price;
    book.ask = None;
    book.bid = None;
    record
}
