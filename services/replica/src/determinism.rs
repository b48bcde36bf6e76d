//! Replay comparison for convergence checks
//!
//! Replicas fed the same ordered stream must hold equal ledgers. These
//! helpers replay recorded streams against fresh replicas and diff the
//! resulting ledger columns, which is how divergence bugs surface in
//! tests long before two live replicas could disagree.

use std::sync::Arc;

use types::command::Finality;
use types::genesis::GenesisConfig;
use types::ids::ParticipantId;
use types::ledger::LedgerSnapshot;
use types::roster::Roster;

use crate::replica::{Replica, ReplicaConfig};

// ── Recorded Stream ─────────────────────────────────────────────────

/// One transaction as the ordering layer delivered it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecordedTransaction {
    pub submitter: ParticipantId,
    pub finality: Finality,
    /// Consensus timestamp assigned by the ordering layer.
    pub timestamp_nanos: i64,
    pub payload: Vec<u8>,
}

impl RecordedTransaction {
    pub fn new(
        submitter: ParticipantId,
        finality: Finality,
        timestamp_nanos: i64,
        payload: Vec<u8>,
    ) -> Self {
        Self {
            submitter,
            finality,
            timestamp_nanos,
            payload,
        }
    }
}

// ── Divergence Report ───────────────────────────────────────────────

/// Column-by-column comparison of two ledgers.
#[derive(Debug, Clone)]
pub struct DivergenceReport {
    pub balances_match: bool,
    pub holdings_match: bool,
    pub books_match: bool,
    pub trades_match: bool,
    pub detail: String,
}

impl DivergenceReport {
    /// Check if the two ledgers are identical.
    pub fn is_match(&self) -> bool {
        self.balances_match && self.holdings_match && self.books_match && self.trades_match
    }
}

// ── Replay ──────────────────────────────────────────────────────────

/// Replays the stream twice from the same genesis and compares results.
pub fn verify_double_replay(
    roster: &Roster,
    genesis: &GenesisConfig,
    stream: &[RecordedTransaction],
) -> DivergenceReport {
    let first = run_replay(roster, genesis, stream);
    let second = run_replay(roster, genesis, stream);
    compare_snapshots(&first, &second)
}

/// Feeds a recorded stream to a fresh replica and returns its ledger.
pub fn run_replay(
    roster: &Roster,
    genesis: &GenesisConfig,
    stream: &[RecordedTransaction],
) -> Arc<LedgerSnapshot> {
    let mut replica = Replica::new(roster.clone(), genesis, ReplicaConfig::default());
    for tx in stream {
        replica.on_transaction(tx.submitter, tx.finality, tx.timestamp_nanos, &tx.payload);
    }
    Arc::clone(replica.snapshot())
}

/// Generate a divergence report from two ledgers.
pub fn compare_snapshots(a: &LedgerSnapshot, b: &LedgerSnapshot) -> DivergenceReport {
    let balances_match = a.balances() == b.balances();
    let holdings_match = a.participant_count() == b.participant_count()
        && a.roster()
            .ids()
            .all(|p| a.holdings_row(p) == b.holdings_row(p));
    let books_match = a.books() == b.books();
    let trades_match = a.trades() == b.trades();

    let mut details = Vec::new();
    if !balances_match {
        details.push("balances differ".to_string());
    }
    if !holdings_match {
        details.push("holdings differ".to_string());
    }
    if !books_match {
        details.push("quote books differ".to_string());
    }
    if !trades_match {
        details.push(format!(
            "trade rings differ: {} vs {} recorded",
            a.trades().total(),
            b.trades().total()
        ));
    }
    let detail = if details.is_empty() {
        "ledgers are identical".to_string()
    } else {
        details.join("; ")
    };

    DivergenceReport {
        balances_match,
        holdings_match,
        books_match,
        trades_match,
        detail,
    }
}

// ── Tests ───────────────────────────────────────────────────────────


// ── Property-Based Tests ────────────────────────────────────────────
