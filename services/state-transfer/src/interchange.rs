//! Snapshot interchange
//!
//! One fixed field order shared by every replica: member count, ticker
//! table, balance array, holdings matrix, trade ring slots, ring
//! occupancy, ring cursor, global trade counter, then the per-instrument
//! book columns (ask prices, bid prices, ask owners, bid owners, last
//! prices). The roster travels out of band; the receiver supplies its own
//! copy and the member count is checked against it.
//!
//! Occupied ring slots carry the record's canonical `v1` line; empty
//! slots are null strings. A cleared book side writes owner -1 and price
//! byte 0.

use std::io::{Read, Write};

use types::ids::ParticipantId;
use types::ledger::{LedgerSnapshot, Offer, QuoteBook};
use types::price::Price;
use types::roster::Roster;
use types::trade::TradeLog;

use crate::wire::{self, InterchangeError};

/// Owner id marking a cleared book side.
const NO_OWNER: i64 = -1;
/// Price byte written for a cleared book side.
const NO_PRICE: u8 = 0;

// ── Encoding ────────────────────────────────────────────────────────

/// Streams one snapshot in interchange order.
pub fn write_snapshot(
    w: &mut impl Write,
    snapshot: &LedgerSnapshot,
) -> Result<(), InterchangeError> {
    wire::write_i32(w, snapshot.participant_count() as i32)?;
    wire::write_string_array(w, snapshot.tickers())?;
    wire::write_i64_array(w, snapshot.balances())?;

    wire::write_len(w, snapshot.participant_count())?;
    for id in snapshot.roster().ids() {
        let row = snapshot
            .holdings_row(id)
            .expect("roster ids resolve their own holdings rows");
        wire::write_i64_array(w, row)?;
    }

    let log = snapshot.trades();
    wire::write_len(w, log.capacity())?;
    for slot in log.slots() {
        let line = slot.as_ref().map(|record| record.canonical_line());
        wire::write_opt_string(w, line.as_deref())?;
    }
    wire::write_i32(w, log.stored() as i32)?;
    wire::write_i32(w, log.cursor() as i32)?;
    wire::write_i64(w, log.total() as i64)?;

    let books = snapshot.books();
    let ask_prices: Vec<u8> = books
        .iter()
        .map(|b| b.ask.map_or(NO_PRICE, |o| o.price.as_u8()))
        .collect();
    let bid_prices: Vec<u8> = books
        .iter()
        .map(|b| b.bid.map_or(NO_PRICE, |o| o.price.as_u8()))
        .collect();
    let ask_owners: Vec<i64> = books
        .iter()
        .map(|b| b.ask.map_or(NO_OWNER, |o| i64::from(o.participant.as_u32())))
        .collect();
    let bid_owners: Vec<i64> = books
        .iter()
        .map(|b| b.bid.map_or(NO_OWNER, |o| i64::from(o.participant.as_u32())))
        .collect();
    let last_prices: Vec<u8> = books.iter().map(|b| b.last_price.as_u8()).collect();

    wire::write_byte_array(w, &ask_prices)?;
    wire::write_byte_array(w, &bid_prices)?;
    wire::write_i64_array(w, &ask_owners)?;
    wire::write_i64_array(w, &bid_owners)?;
    wire::write_byte_array(w, &last_prices)?;
    Ok(())
}

/// Encodes one snapshot into a standalone buffer.
pub fn encode_snapshot(snapshot: &LedgerSnapshot) -> Result<Vec<u8>, InterchangeError> {
    let mut buf = Vec::new();
    write_snapshot(&mut buf, snapshot)?;
    Ok(buf)
}

// ── Decoding ────────────────────────────────────────────────────────

/// Reads one snapshot in interchange order, attaching the local roster.
pub fn read_snapshot(
    r: &mut impl Read,
    roster: &Roster,
) -> Result<LedgerSnapshot, InterchangeError> {
    let members = wire::read_i32(r)?;
    if members < 0 {
        return Err(InterchangeError::NegativeLength(members));
    }
    let members = members as usize;
    if members != roster.len() {
        return Err(InterchangeError::RosterMismatch {
            expected: roster.len(),
            found: members,
        });
    }

    let tickers = wire::read_string_array(r)?;
    let balances = wire::read_i64_array(r)?;

    let row_count = wire::read_len(r)?;
    if row_count != members {
        return Err(InterchangeError::Inconsistent(format!(
            "holdings matrix has {row_count} rows for {members} members"
        )));
    }
    let mut holdings = Vec::with_capacity(row_count);
    for _ in 0..row_count {
        holdings.push(wire::read_i64_array(r)?);
    }

    let slot_count = wire::read_len(r)?;
    let mut slots = Vec::with_capacity(slot_count);
    for _ in 0..slot_count {
        let record = match wire::read_opt_string(r)? {
            Some(line) => Some(types::trade::TradeRecord::parse_line(&line)?),
            None => None,
        };
        slots.push(record);
    }
    let stored = wire::read_i32(r)?;
    let cursor = wire::read_i32(r)?;
    let total = wire::read_i64(r)?;
    if stored < 0 || cursor < 0 || total < 0 {
        return Err(InterchangeError::Inconsistent(
            "negative ring bookkeeping".to_string(),
        ));
    }
    let trades = TradeLog::from_parts(slots, cursor as usize, stored as usize, total as u64)
        .ok_or_else(|| {
            InterchangeError::Inconsistent("ring bookkeeping does not match its slots".to_string())
        })?;

    let ask_prices = wire::read_byte_array(r)?;
    let bid_prices = wire::read_byte_array(r)?;
    let ask_owners = wire::read_i64_array(r)?;
    let bid_owners = wire::read_i64_array(r)?;
    let last_prices = wire::read_byte_array(r)?;

    let instruments = tickers.len();
    let column_lens = [
        ask_prices.len(),
        bid_prices.len(),
        ask_owners.len(),
        bid_owners.len(),
        last_prices.len(),
    ];
    if column_lens.iter().any(|&len| len != instruments) {
        return Err(InterchangeError::Inconsistent(format!(
            "book columns do not all cover {instruments} instruments"
        )));
    }

    let mut books = Vec::with_capacity(instruments);
    for i in 0..instruments {
        let ask = read_offer(ask_prices[i], ask_owners[i], members, "ask")?;
        let bid = read_offer(bid_prices[i], bid_owners[i], members, "bid")?;
        let last_price = Price::try_new(last_prices[i]).map_err(|_| {
            InterchangeError::Inconsistent(format!(
                "last price {} is outside the quotable range",
                last_prices[i]
            ))
        })?;
        books.push(QuoteBook {
            ask,
            bid,
            last_price,
        });
    }

    LedgerSnapshot::from_parts(roster.clone(), tickers, balances, holdings, books, trades).ok_or_else(
        || {
            InterchangeError::Inconsistent(
                "column shapes disagree or the ledger is unreachable".to_string(),
            )
        },
    )
}

/// Decodes a standalone interchange buffer.
pub fn decode_snapshot(bytes: &[u8], roster: &Roster) -> Result<LedgerSnapshot, InterchangeError> {
    read_snapshot(&mut &bytes[..], roster)
}

fn read_offer(
    price: u8,
    owner: i64,
    members: usize,
    side: &str,
) -> Result<Option<Offer>, InterchangeError> {
    if owner == NO_OWNER {
        return Ok(None);
    }
    if owner < 0 || owner as usize >= members {
        return Err(InterchangeError::Inconsistent(format!(
            "{side} owner {owner} is not on the roster"
        )));
    }
    let price = Price::try_new(price).map_err(|_| {
        InterchangeError::Inconsistent(format!(
            "{side} price {price} is outside the quotable range"
        ))
    })?;
    Ok(Some(Offer {
        price,
        participant: ParticipantId::new(owner as u32),
    }))
}

// ── Tests ───────────────────────────────────────────────────────────


// ── Property-Based Tests ────────────────────────────────────────────
