//! Transaction application core
//!
//! [`apply`] is the single state transition of the exchange: one ordered
//! transaction in, one successor snapshot out. It never mutates its input
//! and consults nothing but its arguments, so replicas that feed it the
//! same stream converge on bit-identical ledgers.
//!
//! A quote moves through three steps, each touching only the submitted
//! instrument:
//!
//! 1. clear the remembered opposite offer if its owner can no longer
//!    perform (a bidder short on cash, an asker out of shares)
//! 2. remember the quote if it beats the remembered offer on its own
//!    side (strictly lower ask, strictly higher bid; ties keep the
//!    incumbent)
//! 3. if the book now holds both sides with ask not above bid, settle
//!    one share at the rounded midpoint and clear both offers

use std::sync::Arc;

use types::command::{Command, Finality, SyncSpeed};
use types::ids::{InstrumentId, ParticipantId};
use types::ledger::{LedgerSnapshot, Offer, SnapshotDraft};
use types::price::Price;

use crate::matching;
use crate::outcome::{ApplyOutcome, Disposition, RejectReason};

/// Applies one transaction to a snapshot.
///
/// Speed commands act at any finality. Quotes seen before their order is
/// final are held without touching the ledger; invalid quotes are
/// rejected the same way. The returned outcome says which of these
/// happened and carries the successor snapshot.
pub fn apply(
    snapshot: &Arc<LedgerSnapshot>,
    submitter: ParticipantId,
    command: Command,
    finality: Finality,
) -> ApplyOutcome {
    match command {
        Command::SetSyncSpeed(speed) => ApplyOutcome {
            snapshot: Arc::clone(snapshot),
            trade: None,
            pacing: Some(speed),
            disposition: Disposition::SpeedChange(speed),
        },
        Command::PlaceAsk {
            instrument,
            price_cents,
        } => place_ask(snapshot, submitter, instrument, price_cents, finality),
        Command::PlaceBid {
            instrument,
            price_cents,
        } => place_bid(snapshot, submitter, instrument, price_cents, finality),
    }
}

/// Validation common to both quote sides.
///
/// Bids are screened the same as asks: the submitter must hold at least
/// one share of the instrument, whichever side they quote.
fn screen_quote(
    snapshot: &LedgerSnapshot,
    submitter: ParticipantId,
    instrument: InstrumentId,
    price_cents: u8,
    finality: Finality,
) -> Result<Price, Disposition> {
    if !finality.is_final() {
        return Err(Disposition::ProvisionalHold);
    }
    let price = Price::try_new(price_cents)
        .map_err(|_| Disposition::Rejected(RejectReason::PriceOutOfRange))?;
    if instrument.index() >= snapshot.instrument_count() {
        return Err(Disposition::Rejected(RejectReason::UnknownInstrument));
    }
    let Some(holdings) = snapshot.holdings(submitter, instrument) else {
        return Err(Disposition::Rejected(RejectReason::UnknownParticipant));
    };
    if holdings == 0 {
        return Err(Disposition::Rejected(RejectReason::NoHoldings));
    }
    Ok(price)
}

fn place_ask(
    snapshot: &Arc<LedgerSnapshot>,
    submitter: ParticipantId,
    instrument: InstrumentId,
    price_cents: u8,
    finality: Finality,
) -> ApplyOutcome {
    let price = match screen_quote(snapshot, submitter, instrument, price_cents, finality) {
        Ok(price) => price,
        Err(disposition) => return ApplyOutcome::unchanged(snapshot, disposition),
    };
    let book = snapshot.book(instrument).expect("instrument id was screened");

    // A remembered bidder who can no longer cover their own bid is
    // forgotten before this ask is considered.
    let clear_stale = book.bid.is_some_and(|offer| {
        let balance = snapshot
            .balance_cents(offer.participant)
            .expect("offer owners are roster-checked");
        balance < offer.price.as_cents()
    });
    let remember = book.ask.map_or(true, |offer| price < offer.price);

    if !clear_stale && !remember {
        return ApplyOutcome::unchanged(snapshot, Disposition::Superseded);
    }
    let mut draft = snapshot.draft();
    if clear_stale {
        draft.book_mut(instrument).bid = None;
    }
    if remember {
        draft.book_mut(instrument).ask = Some(Offer {
            price,
            participant: submitter,
        });
    }
    finish(draft, instrument, remember)
}

fn place_bid(
    snapshot: &Arc<LedgerSnapshot>,
    submitter: ParticipantId,
    instrument: InstrumentId,
    price_cents: u8,
    finality: Finality,
) -> ApplyOutcome {
    let price = match screen_quote(snapshot, submitter, instrument, price_cents, finality) {
        Ok(price) => price,
        Err(disposition) => return ApplyOutcome::unchanged(snapshot, disposition),
    };
    let book = snapshot.book(instrument).expect("instrument id was screened");

    // A remembered asker who has run out of shares is forgotten before
    // this bid is considered.
    let clear_stale = book.ask.is_some_and(|offer| {
        let holdings = snapshot
            .holdings(offer.participant, instrument)
            .expect("offer owners are roster-checked");
        holdings == 0
    });
    let remember = book.bid.map_or(true, |offer| price > offer.price);

    if !clear_stale && !remember {
        return ApplyOutcome::unchanged(snapshot, Disposition::Superseded);
    }
    let mut draft = snapshot.draft();
    if clear_stale {
        draft.book_mut(instrument).ask = None;
    }
    if remember {
        draft.book_mut(instrument).bid = Some(Offer {
            price,
            participant: submitter,
        });
    }
    finish(draft, instrument, remember)
}

/// Runs the cross check on the touched book and freezes the draft.
fn finish(mut draft: SnapshotDraft, instrument: InstrumentId, remembered: bool) -> ApplyOutcome {
    let crossed = matching::crossed(draft.book(instrument));
    let trade = crossed.map(|(ask, bid)| matching::settle(&mut draft, instrument, ask, bid));

    // The very first trade in the stream slows gossip down for watching.
    let pacing = match trade {
        Some(record) if record.seq == 1 => Some(SyncSpeed::Slow),
        _ => None,
    };
    let disposition = if trade.is_some() {
        Disposition::Traded
    } else if remembered {
        Disposition::Quoted
    } else {
        Disposition::Superseded
    };
    ApplyOutcome {
        snapshot: draft.freeze(),
        trade,
        pacing,
        disposition,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use types::genesis::GenesisConfig;
    use types::ledger::QuoteBook;
    use types::roster::Roster;
    use types::trade::TradeLog;

    fn market_with(members: &[&str], config: &GenesisConfig) -> Arc<LedgerSnapshot> {
        let names = members.iter().map(|m| m.to_string()).collect();
        Arc::new(LedgerSnapshot::genesis(Roster::new(names), config))
    }

    fn market(members: &[&str]) -> Arc<LedgerSnapshot> {
        market_with(members, &GenesisConfig::default())
    }

    fn ask(snapshot: &Arc<LedgerSnapshot>, who: u32, instrument: u8, price_cents: u8) -> ApplyOutcome {
        apply(
            snapshot,
            ParticipantId::new(who),
            Command::PlaceAsk {
                instrument: InstrumentId::new(instrument),
                price_cents,
            },
            Finality::Final,
        )
    }

    fn bid(snapshot: &Arc<LedgerSnapshot>, who: u32, instrument: u8, price_cents: u8) -> ApplyOutcome {
        apply(
            snapshot,
            ParticipantId::new(who),
            Command::PlaceBid {
                instrument: InstrumentId::new(instrument),
                price_cents,
            },
            Finality::Final,
        )
    }

    #[test]
    fn test_speed_commands_apply_before_finality() {
        let snapshot = market(&["alice", "bob"]);
        let outcome = apply(
            &snapshot,
            ParticipantId::new(0),
            Command::SetSyncSpeed(SyncSpeed::Fast),
            Finality::Provisional,
        );
        assert!(Arc::ptr_eq(&outcome.snapshot, &snapshot));
        assert_eq!(outcome.pacing, Some(SyncSpeed::Fast));
        assert_eq!(
            outcome.disposition,
            Disposition::SpeedChange(SyncSpeed::Fast)
        );
        assert!(outcome.trade.is_none());
    }

    #[test]
    fn test_provisional_quotes_are_held() {
        let snapshot = market(&["alice", "bob"]);
        let outcome = apply(
            &snapshot,
            ParticipantId::new(0),
            Command::PlaceAsk {
                instrument: InstrumentId::new(0),
                price_cents: 60,
            },
            Finality::Provisional,
        );
        assert!(Arc::ptr_eq(&outcome.snapshot, &snapshot));
        assert_eq!(outcome.disposition, Disposition::ProvisionalHold);
    }

    #[test]
    fn test_rejects_out_of_range_price() {
        let snapshot = market(&["alice", "bob"]);
        for bad_price in [0u8, 128, 200, 255] {
            let outcome = ask(&snapshot, 0, 0, bad_price);
            assert!(Arc::ptr_eq(&outcome.snapshot, &snapshot));
            assert_eq!(
                outcome.disposition,
                Disposition::Rejected(RejectReason::PriceOutOfRange)
            );
        }
        assert_eq!(ask(&snapshot, 0, 0, 1).disposition, Disposition::Quoted);
        assert_eq!(bid(&snapshot, 1, 1, 127).disposition, Disposition::Quoted);
    }

    #[test]
    fn test_rejects_unknown_instrument() {
        let snapshot = market(&["alice", "bob"]);
        let outcome = ask(&snapshot, 0, 10, 60);
        assert_eq!(
            outcome.disposition,
            Disposition::Rejected(RejectReason::UnknownInstrument)
        );
    }

    #[test]
    fn test_rejects_unknown_participant() {
        let snapshot = market(&["alice", "bob"]);
        let outcome = bid(&snapshot, 7, 0, 60);
        assert_eq!(
            outcome.disposition,
            Disposition::Rejected(RejectReason::UnknownParticipant)
        );
    }

    #[test]
    fn test_rejects_quotes_without_holdings() {
        let config = GenesisConfig {
            initial_holdings: 0,
            ..GenesisConfig::default()
        };
        let snapshot = market_with(&["alice", "bob"], &config);
        let outcome = ask(&snapshot, 0, 0, 60);
        assert_eq!(
            outcome.disposition,
            Disposition::Rejected(RejectReason::NoHoldings)
        );
        assert!(Arc::ptr_eq(&outcome.snapshot, &snapshot));
        // Bids are screened on holdings too, not on cash.
        assert_eq!(
            bid(&snapshot, 1, 0, 60).disposition,
            Disposition::Rejected(RejectReason::NoHoldings)
        );
    }

    #[test]
    fn test_matching_quotes_settle_at_midpoint() {
        let snapshot = market(&["alice", "bob"]);
        let instrument = InstrumentId::new(4);

        let quoted = ask(&snapshot, 0, 4, 60);
        assert_eq!(quoted.disposition, Disposition::Quoted);
        assert!(quoted.trade.is_none());

        let traded = bid(&quoted.snapshot, 1, 4, 70);
        assert_eq!(traded.disposition, Disposition::Traded);
        let record = traded.trade.unwrap();
        assert_eq!(record.seq, 1);
        assert_eq!(record.price.as_u8(), 65);
        assert_eq!(record.seller, ParticipantId::new(0));
        assert_eq!(record.buyer, ParticipantId::new(1));
        assert_eq!(record.seller_balance_cents, 20_065);
        assert_eq!(record.buyer_balance_cents, 19_935);

        let after = traded.snapshot;
        assert_eq!(after.balance_cents(ParticipantId::new(0)), Some(20_065));
        assert_eq!(after.balance_cents(ParticipantId::new(1)), Some(19_935));
        assert_eq!(after.holdings(ParticipantId::new(0), instrument), Some(199));
        assert_eq!(after.holdings(ParticipantId::new(1), instrument), Some(201));
        let book = after.book(instrument).unwrap();
        assert!(book.ask.is_none() && book.bid.is_none());
        assert_eq!(book.last_price.as_u8(), 65);
    }

    #[test]
    fn test_midpoint_rounds_half_to_even() {
        // 51 x 52 and 52 x 53 both sit on a half cent and both land on 52.
        let snapshot = market(&["alice", "bob"]);
        let outcome = bid(&ask(&snapshot, 0, 0, 51).snapshot, 1, 0, 52);
        assert_eq!(outcome.trade.unwrap().price.as_u8(), 52);

        let snapshot = market(&["alice", "bob"]);
        let outcome = bid(&ask(&snapshot, 0, 0, 52).snapshot, 1, 0, 53);
        assert_eq!(outcome.trade.unwrap().price.as_u8(), 52);
    }

    #[test]
    fn test_raised_bid_crosses_resting_ask() {
        let snapshot = market(&["alice", "bob"]);
        let snapshot = ask(&snapshot, 0, 0, 50).snapshot;

        // A bid under the ask rests without trading.
        let resting = bid(&snapshot, 1, 0, 40);
        assert_eq!(resting.disposition, Disposition::Quoted);
        assert!(resting.trade.is_none());
        let book = resting.snapshot.book(InstrumentId::new(0)).unwrap();
        assert_eq!(book.ask.unwrap().price.as_u8(), 50);
        assert_eq!(book.bid.unwrap().price.as_u8(), 40);

        // Raising it past the ask trades immediately.
        let raised = bid(&resting.snapshot, 1, 0, 55);
        assert_eq!(raised.disposition, Disposition::Traded);
        assert_eq!(raised.trade.unwrap().price.as_u8(), 52);
    }

    #[test]
    fn test_better_ask_replaces_worse() {
        let snapshot = market(&["alice", "bob", "carol"]);
        let snapshot = ask(&snapshot, 0, 0, 70).snapshot;
        let outcome = ask(&snapshot, 2, 0, 65);
        assert_eq!(outcome.disposition, Disposition::Quoted);
        let offer = outcome.snapshot.book(InstrumentId::new(0)).unwrap().ask.unwrap();
        assert_eq!(offer.price.as_u8(), 65);
        assert_eq!(offer.participant, ParticipantId::new(2));

        // A higher ask changes nothing.
        let worse = ask(&outcome.snapshot, 1, 0, 70);
        assert_eq!(worse.disposition, Disposition::Superseded);
        assert!(Arc::ptr_eq(&worse.snapshot, &outcome.snapshot));

        // So does an equal one: ties keep the incumbent.
        let tie = ask(&outcome.snapshot, 1, 0, 65);
        assert_eq!(tie.disposition, Disposition::Superseded);
        let kept = tie.snapshot.book(InstrumentId::new(0)).unwrap().ask.unwrap();
        assert_eq!(kept.participant, ParticipantId::new(2));
    }

    #[test]
    fn test_higher_bid_replaces_lower() {
        let snapshot = market(&["alice", "bob", "carol"]);
        let snapshot = bid(&snapshot, 0, 3, 40).snapshot;
        let outcome = bid(&snapshot, 1, 3, 45);
        assert_eq!(outcome.disposition, Disposition::Quoted);
        let offer = outcome.snapshot.book(InstrumentId::new(3)).unwrap().bid.unwrap();
        assert_eq!(offer.price.as_u8(), 45);
        assert_eq!(offer.participant, ParticipantId::new(1));

        let worse = bid(&outcome.snapshot, 2, 3, 40);
        assert_eq!(worse.disposition, Disposition::Superseded);
        assert!(Arc::ptr_eq(&worse.snapshot, &outcome.snapshot));
    }

    #[test]
    fn test_broke_bidder_cleared_on_next_ask() {
        let config = GenesisConfig {
            initial_balance_cents: 10,
            ..GenesisConfig::default()
        };
        let snapshot = market_with(&["alice", "bob"], &config);

        // Bob's bid is remembered even though he cannot cover it.
        let snapshot = bid(&snapshot, 1, 0, 50).snapshot;
        assert!(snapshot.book(InstrumentId::new(0)).unwrap().bid.is_some());

        // The next ask notices and forgets him instead of trading.
        let outcome = ask(&snapshot, 0, 0, 80);
        assert_eq!(outcome.disposition, Disposition::Quoted);
        let book = outcome.snapshot.book(InstrumentId::new(0)).unwrap();
        assert!(book.bid.is_none());
        assert_eq!(book.ask.unwrap().price.as_u8(), 80);

        // Staleness is only checked when an ask arrives: a fresh bid from
        // the same broke bidder crosses and overdraws him.
        let traded = bid(&outcome.snapshot, 1, 0, 90);
        assert_eq!(traded.disposition, Disposition::Traded);
        assert_eq!(traded.trade.unwrap().price.as_u8(), 85);
        assert_eq!(traded.snapshot.balance_cents(ParticipantId::new(1)), Some(-75));
    }

    #[test]
    fn test_sold_out_asker_cleared_on_next_bid() {
        // A remembered ask whose owner has no shares left only occurs in
        // ledgers assembled from interchange, so build one directly.
        let roster = Roster::new(vec!["alice".to_string(), "bob".to_string()]);
        let price = |cents| Price::try_new(cents).unwrap();
        let books = vec![
            QuoteBook {
                ask: Some(Offer {
                    price: price(100),
                    participant: ParticipantId::new(0),
                }),
                bid: None,
                last_price: price(64),
            },
            QuoteBook {
                ask: None,
                bid: None,
                last_price: price(64),
            },
        ];
        let snapshot = Arc::new(
            LedgerSnapshot::from_parts(
                roster,
                vec!["ARDL".to_string(), "BRYO".to_string()],
                vec![20_000, 20_000],
                vec![vec![0, 5], vec![5, 5]],
                books,
                TradeLog::new(8),
            )
            .unwrap(),
        );

        let outcome = bid(&snapshot, 1, 0, 50);
        assert_eq!(outcome.disposition, Disposition::Quoted);
        let book = outcome.snapshot.book(InstrumentId::new(0)).unwrap();
        assert!(book.ask.is_none());
        assert_eq!(book.bid.unwrap().participant, ParticipantId::new(1));
        assert!(outcome.trade.is_none());
    }

    #[test]
    fn test_self_trade_is_permitted() {
        let snapshot = market(&["alice", "bob"]);
        let snapshot = ask(&snapshot, 0, 2, 60).snapshot;
        let outcome = bid(&snapshot, 0, 2, 70);
        assert_eq!(outcome.disposition, Disposition::Traded);
        let record = outcome.trade.unwrap();
        assert_eq!(record.seller, record.buyer);
        // Settlement nets out; only the record and last price remain.
        let after = outcome.snapshot;
        assert_eq!(after.balance_cents(ParticipantId::new(0)), Some(20_000));
        assert_eq!(
            after.holdings(ParticipantId::new(0), InstrumentId::new(2)),
            Some(200)
        );
        assert_eq!(after.trades().total(), 1);
    }

    #[test]
    fn test_repeated_trades_can_overdraw_cash() {
        let mut snapshot = market(&["alice", "bob"]);
        for _ in 0..158 {
            snapshot = ask(&snapshot, 0, 0, 127).snapshot;
            let outcome = bid(&snapshot, 1, 0, 127);
            assert_eq!(outcome.disposition, Disposition::Traded);
            snapshot = outcome.snapshot;
        }
        // Bids screen holdings, not cash, so bob keeps buying past zero.
        assert_eq!(snapshot.balance_cents(ParticipantId::new(1)), Some(-66));
        assert_eq!(snapshot.balance_cents(ParticipantId::new(0)), Some(40_066));
        assert_eq!(snapshot.balances().iter().sum::<i64>(), 40_000);
        assert_eq!(
            snapshot.holdings(ParticipantId::new(0), InstrumentId::new(0)),
            Some(42)
        );
        assert_eq!(
            snapshot.holdings(ParticipantId::new(1), InstrumentId::new(0)),
            Some(358)
        );
    }

    #[test]
    fn test_ring_retains_recent_trades() {
        let mut snapshot = market(&["alice", "bob"]);
        // alternate direction so neither wallet runs out of shares
        for round in 0..205 {
            let (seller, buyer) = if round % 2 == 0 { (0, 1) } else { (1, 0) };
            snapshot = ask(&snapshot, seller, 0, 64).snapshot;
            snapshot = bid(&snapshot, buyer, 0, 64).snapshot;
        }
        let trades = snapshot.trades();
        assert_eq!(trades.total(), 205);
        assert_eq!(trades.stored(), 200);
        assert_eq!(trades.first_retained_seq(), Some(6));
        assert!(trades.get(5).is_none());
        assert_eq!(trades.get(6).unwrap().seq, 6);
        let seqs: Vec<u64> = trades.window(3).iter().map(|r| r.seq).collect();
        assert_eq!(seqs, vec![203, 204, 205]);
    }

    #[test]
    fn test_pacing_hint_fires_on_first_trade_only() {
        let snapshot = market(&["alice", "bob"]);
        let snapshot = ask(&snapshot, 0, 0, 64).snapshot;
        let first = bid(&snapshot, 1, 0, 64);
        assert_eq!(first.pacing, Some(SyncSpeed::Slow));

        let snapshot = ask(&first.snapshot, 0, 0, 64).snapshot;
        let second = bid(&snapshot, 1, 0, 64);
        assert!(second.trade.is_some());
        assert_eq!(second.pacing, None);
    }

    #[test]
    fn test_untouched_ledger_shares_snapshot() {
        let snapshot = market(&["alice", "bob"]);
        let rejected = ask(&snapshot, 0, 0, 0);
        assert!(Arc::ptr_eq(&rejected.snapshot, &snapshot));

        let quoted = ask(&snapshot, 0, 0, 70).snapshot;
        let superseded = ask(&quoted, 1, 0, 80);
        assert!(Arc::ptr_eq(&superseded.snapshot, &quoted));
    }
}
