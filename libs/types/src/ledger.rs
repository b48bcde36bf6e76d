//! Immutable ledger snapshots and the draft used to advance them
//!
//! A [`LedgerSnapshot`] is a complete, frozen view of replicated state:
//! cash balances, per-instrument holdings, the remembered quotes, and the
//! recent trade ring. Applying a transaction never mutates a published
//! snapshot; the engine opens a [`SnapshotDraft`], edits it, and freezes a
//! successor. Unchanged columns are shared with the parent by reference,
//! so a draft only pays for what it touches.

use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::genesis::GenesisConfig;
use crate::ids::{InstrumentId, ParticipantId};
use crate::price::Price;
use crate::roster::Roster;
use crate::trade::{TradeLog, TradeRecord};

/// A remembered one-share quote.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Offer {
    pub price: Price,
    pub participant: ParticipantId,
}

/// Per-instrument quote state: at most one remembered ask, one remembered
/// bid, and the price of the most recent trade.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct QuoteBook {
    pub ask: Option<Offer>,
    pub bid: Option<Offer>,
    pub last_price: Price,
}

/// Frozen replicated state after some prefix of the transaction stream.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LedgerSnapshot {
    roster: Roster,
    tickers: Arc<[String]>,
    balances: Arc<[i64]>,
    holdings: Arc<[Arc<[i64]>]>,
    books: Arc<[QuoteBook]>,
    trades: TradeLog,
}

impl LedgerSnapshot {
    /// Builds the pre-stream state every replica starts from.
    ///
    /// # Panics
    ///
    /// Panics if the configuration lists no instruments, lists more than
    /// 256 (instrument ids are 8-bit), sets a starting price outside the
    /// quotable range, or sets a zero trade ring capacity.
    pub fn genesis(roster: Roster, config: &GenesisConfig) -> Self {
        assert!(
            !config.tickers.is_empty(),
            "genesis must list at least one instrument"
        );
        assert!(
            config.tickers.len() <= 256,
            "instrument ids are 8-bit, at most 256 listings"
        );
        let initial_price = Price::try_new(config.initial_price_cents)
            .expect("genesis price outside quotable range");

        let members = roster.len();
        let instruments = config.tickers.len();
        let row: Arc<[i64]> = vec![config.initial_holdings; instruments].into();
        Self {
            roster,
            tickers: config.tickers.clone().into(),
            balances: vec![config.initial_balance_cents; members].into(),
            holdings: (0..members).map(|_| Arc::clone(&row)).collect(),
            books: vec![
                QuoteBook {
                    ask: None,
                    bid: None,
                    last_price: initial_price,
                };
                instruments
            ]
            .into(),
            trades: TradeLog::new(config.trade_ring_capacity),
        }
    }

    /// Reassembles a snapshot from interchange parts.
    ///
    /// Returns `None` when the column shapes disagree with the roster and
    /// listing counts, or when the parts describe a state no transaction
    /// stream can reach: negative holdings, an offer owned by someone
    /// outside the roster, or a book left crossed.
    pub fn from_parts(
        roster: Roster,
        tickers: Vec<String>,
        balances: Vec<i64>,
        holdings: Vec<Vec<i64>>,
        books: Vec<QuoteBook>,
        trades: TradeLog,
    ) -> Option<Self> {
        let members = roster.len();
        let instruments = tickers.len();
        if instruments == 0 || instruments > 256 {
            return None;
        }
        if balances.len() != members || holdings.len() != members || books.len() != instruments {
            return None;
        }
        if holdings.iter().any(|row| row.len() != instruments) {
            return None;
        }
        if holdings.iter().flatten().any(|&h| h < 0) {
            return None;
        }
        for book in &books {
            let owners = [book.ask, book.bid];
            if owners
                .into_iter()
                .flatten()
                .any(|offer| offer.participant.index() >= members)
            {
                return None;
            }
            if let (Some(ask), Some(bid)) = (book.ask, book.bid) {
                if ask.price <= bid.price {
                    return None;
                }
            }
        }
        Some(Self {
            roster,
            tickers: tickers.into(),
            balances: balances.into(),
            holdings: holdings.into_iter().map(Into::into).collect(),
            books: books.into(),
            trades,
        })
    }

    pub fn roster(&self) -> &Roster {
        &self.roster
    }

    /// Ticker symbols in instrument-id order.
    pub fn tickers(&self) -> &[String] {
        &self.tickers
    }

    pub fn ticker(&self, instrument: InstrumentId) -> Option<&str> {
        self.tickers.get(instrument.index()).map(String::as_str)
    }

    pub fn instrument_count(&self) -> usize {
        self.tickers.len()
    }

    pub fn participant_count(&self) -> usize {
        self.roster.len()
    }

    /// Cash balance in cents. `None` for ids outside the roster.
    pub fn balance_cents(&self, participant: ParticipantId) -> Option<i64> {
        self.balances.get(participant.index()).copied()
    }

    /// All balances in participant-id order, in cents.
    pub fn balances(&self) -> &[i64] {
        &self.balances
    }

    /// Shares held by one participant in one instrument.
    pub fn holdings(&self, participant: ParticipantId, instrument: InstrumentId) -> Option<i64> {
        self.holdings
            .get(participant.index())?
            .get(instrument.index())
            .copied()
    }

    /// One participant's holdings in instrument-id order.
    pub fn holdings_row(&self, participant: ParticipantId) -> Option<&[i64]> {
        self.holdings.get(participant.index()).map(|row| &row[..])
    }

    pub fn book(&self, instrument: InstrumentId) -> Option<QuoteBook> {
        self.books.get(instrument.index()).copied()
    }

    /// All quote books in instrument-id order.
    pub fn books(&self) -> &[QuoteBook] {
        &self.books
    }

    pub fn trades(&self) -> &TradeLog {
        &self.trades
    }

    /// Opens a mutable draft seeded from this snapshot.
    pub fn draft(&self) -> SnapshotDraft {
        SnapshotDraft {
            roster: self.roster.clone(),
            tickers: Arc::clone(&self.tickers),
            balances: self.balances.to_vec(),
            holdings: self.holdings.to_vec(),
            books: self.books.to_vec(),
            trades: self.trades.clone(),
        }
    }
}

/// In-progress successor of a [`LedgerSnapshot`].
///
/// Lookups index directly: the engine validates participant and
/// instrument ids before opening a draft, so an out-of-range id here is a
/// bug, not an input error.
#[derive(Debug)]
pub struct SnapshotDraft {
    roster: Roster,
    tickers: Arc<[String]>,
    balances: Vec<i64>,
    holdings: Vec<Arc<[i64]>>,
    books: Vec<QuoteBook>,
    trades: TradeLog,
}

impl SnapshotDraft {
    /// Cash balance in cents.
    ///
    /// # Panics
    ///
    /// Panics if the participant is outside the roster.
    pub fn balance_cents(&self, participant: ParticipantId) -> i64 {
        self.balances[participant.index()]
    }

    pub fn adjust_balance(&mut self, participant: ParticipantId, delta_cents: i64) {
        self.balances[participant.index()] += delta_cents;
    }

    /// Shares held by one participant in one instrument.
    ///
    /// # Panics
    ///
    /// Panics if either id is out of range.
    pub fn holdings(&self, participant: ParticipantId, instrument: InstrumentId) -> i64 {
        self.holdings[participant.index()][instrument.index()]
    }

    /// Adjusts shares held by one participant in one instrument.
    ///
    /// # Panics
    ///
    /// Panics if either id is out of range or the holding would go
    /// negative. A negative share count means replicated state is already
    /// corrupt, so the replica must stop rather than diverge.
    pub fn adjust_holdings(
        &mut self,
        participant: ParticipantId,
        instrument: InstrumentId,
        delta: i64,
    ) {
        let mut row = self.holdings[participant.index()].to_vec();
        row[instrument.index()] += delta;
        assert!(
            row[instrument.index()] >= 0,
            "holdings went negative for participant {} in instrument {}",
            participant,
            instrument
        );
        self.holdings[participant.index()] = row.into();
    }

    /// # Panics
    ///
    /// Panics if the instrument is out of range.
    pub fn book(&self, instrument: InstrumentId) -> &QuoteBook {
        &self.books[instrument.index()]
    }

    pub fn book_mut(&mut self, instrument: InstrumentId) -> &mut QuoteBook {
        &mut self.books[instrument.index()]
    }

    /// Sequence number the next recorded trade will carry.
    pub fn next_trade_seq(&self) -> u64 {
        self.trades.total() + 1
    }

    pub fn record_trade(&mut self, record: TradeRecord) {
        self.trades.append(record);
    }

    /// Freezes the draft into a published snapshot.
    pub fn freeze(self) -> Arc<LedgerSnapshot> {
        Arc::new(LedgerSnapshot {
            roster: self.roster,
            tickers: self.tickers,
            balances: self.balances.into(),
            holdings: self.holdings.into(),
            books: self.books.into(),
            trades: self.trades,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn two_member_genesis() -> LedgerSnapshot {
        let roster = Roster::new(vec!["alice".to_string(), "bob".to_string()]);
        LedgerSnapshot::genesis(roster, &GenesisConfig::default())
    }

    #[test]
    fn test_genesis_layout() {
        let snapshot = two_member_genesis();
        assert_eq!(snapshot.participant_count(), 2);
        assert_eq!(snapshot.instrument_count(), 10);
        assert!(snapshot.balances().iter().all(|&b| b == 20_000));
        for participant in snapshot.roster().ids() {
            let row = snapshot.holdings_row(participant).unwrap();
            assert!(row.iter().all(|&h| h == 200));
        }
        for book in snapshot.books() {
            assert!(book.ask.is_none());
            assert!(book.bid.is_none());
            assert_eq!(book.last_price.as_u8(), 64);
        }
        assert_eq!(snapshot.trades().capacity(), 200);
        assert_eq!(snapshot.trades().total(), 0);
    }

    #[test]
    fn test_out_of_range_lookups() {
        let snapshot = two_member_genesis();
        assert!(snapshot.balance_cents(ParticipantId::new(2)).is_none());
        assert!(snapshot.ticker(InstrumentId::new(10)).is_none());
        assert!(snapshot.book(InstrumentId::new(10)).is_none());
        assert!(snapshot
            .holdings(ParticipantId::new(0), InstrumentId::new(10))
            .is_none());
    }

    #[test]
    fn test_draft_leaves_parent_untouched() {
        let parent = two_member_genesis();
        let alice = ParticipantId::new(0);
        let clmp = InstrumentId::new(2);

        let mut draft = parent.draft();
        draft.adjust_balance(alice, -75);
        draft.adjust_holdings(alice, clmp, 1);
        draft.book_mut(clmp).last_price = Price::try_new(75).unwrap();
        let child = draft.freeze();

        assert_eq!(parent.balance_cents(alice), Some(20_000));
        assert_eq!(parent.holdings(alice, clmp), Some(200));
        assert_eq!(parent.book(clmp).unwrap().last_price.as_u8(), 64);

        assert_eq!(child.balance_cents(alice), Some(19_925));
        assert_eq!(child.holdings(alice, clmp), Some(201));
        assert_eq!(child.book(clmp).unwrap().last_price.as_u8(), 75);
    }

    #[test]
    fn test_draft_shares_untouched_holdings_rows() {
        let parent = two_member_genesis();
        let mut draft = parent.draft();
        draft.adjust_holdings(ParticipantId::new(0), InstrumentId::new(0), -1);
        let child = draft.freeze();

        let parent_rows = &parent.holdings;
        let child_rows = &child.holdings;
        assert!(!Arc::ptr_eq(&parent_rows[0], &child_rows[0]));
        assert!(Arc::ptr_eq(&parent_rows[1], &child_rows[1]));
    }

    #[test]
    fn test_draft_records_trades_in_sequence() {
        let parent = two_member_genesis();
        let mut draft = parent.draft();
        assert_eq!(draft.next_trade_seq(), 1);
        draft.record_trade(TradeRecord {
            seq: 1,
            instrument: InstrumentId::new(0),
            price: Price::try_new(64).unwrap(),
            prev_price: Price::try_new(64).unwrap(),
            seller: ParticipantId::new(0),
            buyer: ParticipantId::new(1),
            seller_balance_cents: 20_064,
            buyer_balance_cents: 19_936,
        });
        let child = draft.freeze();
        assert_eq!(parent.trades().total(), 0);
        assert_eq!(child.trades().total(), 1);
        assert_eq!(child.trades().get(1).unwrap().seq, 1);
    }

    #[test]
    fn test_from_parts_validates_shape() {
        let snapshot = two_member_genesis();
        let roster = snapshot.roster().clone();
        let tickers = snapshot.tickers().to_vec();
        let balances = snapshot.balances().to_vec();
        let holdings: Vec<Vec<i64>> = snapshot
            .roster()
            .ids()
            .map(|p| snapshot.holdings_row(p).unwrap().to_vec())
            .collect();
        let books = snapshot.books().to_vec();

        let rebuilt = LedgerSnapshot::from_parts(
            roster.clone(),
            tickers.clone(),
            balances.clone(),
            holdings.clone(),
            books.clone(),
            snapshot.trades().clone(),
        )
        .unwrap();
        assert_eq!(rebuilt, snapshot);

        // One balance too few.
        assert!(LedgerSnapshot::from_parts(
            roster.clone(),
            tickers.clone(),
            balances[..1].to_vec(),
            holdings.clone(),
            books.clone(),
            snapshot.trades().clone(),
        )
        .is_none());

        // Ragged holdings row.
        let mut ragged = holdings.clone();
        ragged[1].pop();
        assert!(LedgerSnapshot::from_parts(
            roster.clone(),
            tickers.clone(),
            balances.clone(),
            ragged,
            books.clone(),
            snapshot.trades().clone(),
        )
        .is_none());

        // Book count disagrees with the listing count.
        assert!(LedgerSnapshot::from_parts(
            roster,
            tickers,
            balances,
            holdings,
            books[..9].to_vec(),
            snapshot.trades().clone(),
        )
        .is_none());
    }

    #[test]
    fn test_from_parts_rejects_unreachable_states() {
        let snapshot = two_member_genesis();
        let roster = snapshot.roster().clone();
        let tickers = snapshot.tickers().to_vec();
        let balances = snapshot.balances().to_vec();
        let holdings: Vec<Vec<i64>> = snapshot
            .roster()
            .ids()
            .map(|p| snapshot.holdings_row(p).unwrap().to_vec())
            .collect();
        let books = snapshot.books().to_vec();
        let price = |cents| Price::try_new(cents).unwrap();
        let offer = |cents, who| Offer {
            price: price(cents),
            participant: ParticipantId::new(who),
        };

        // Negative holdings.
        let mut negative = holdings.clone();
        negative[0][3] = -1;
        assert!(LedgerSnapshot::from_parts(
            roster.clone(),
            tickers.clone(),
            balances.clone(),
            negative,
            books.clone(),
            snapshot.trades().clone(),
        )
        .is_none());

        // Offer owned by someone outside the roster.
        let mut foreign = books.clone();
        foreign[0].ask = Some(offer(70, 9));
        assert!(LedgerSnapshot::from_parts(
            roster.clone(),
            tickers.clone(),
            balances.clone(),
            holdings.clone(),
            foreign,
            snapshot.trades().clone(),
        )
        .is_none());

        // A crossed book would have settled before ever being frozen.
        let mut crossed = books.clone();
        crossed[0].ask = Some(offer(60, 0));
        crossed[0].bid = Some(offer(70, 1));
        assert!(LedgerSnapshot::from_parts(
            roster.clone(),
            tickers.clone(),
            balances.clone(),
            holdings.clone(),
            crossed,
            snapshot.trades().clone(),
        )
        .is_none());

        // An uncrossed two-sided book is fine.
        let mut spread = books;
        spread[0].ask = Some(offer(70, 0));
        spread[0].bid = Some(offer(60, 1));
        assert!(LedgerSnapshot::from_parts(
            roster,
            tickers,
            balances,
            holdings,
            spread,
            snapshot.trades().clone(),
        )
        .is_some());
    }
}
