//! Per-participant account summaries.

use std::fmt;

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use types::ids::ParticipantId;
use types::ledger::LedgerSnapshot;

use crate::{dollars, format_dollars};

/// Point-in-time account view for one participant.
///
/// `balance` may be negative: the ledger admits overdrafts when a
/// remembered bid settles after the bidder's cash has drained.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ParticipantSummary {
    pub participant: ParticipantId,
    pub name: String,
    /// Cash balance in dollars.
    pub balance: Decimal,
    /// Shares held, indexed by instrument listing order.
    pub holdings: Vec<i64>,
    /// Shares held across all instruments.
    pub total_shares: i64,
}

/// Builds the summary for one participant, or `None` if the id is not on
/// the roster.
pub fn participant_summary(
    snapshot: &LedgerSnapshot,
    participant: ParticipantId,
) -> Option<ParticipantSummary> {
    let balance_cents = snapshot.balance_cents(participant)?;
    let holdings = snapshot.holdings_row(participant)?.to_vec();
    let name = snapshot.roster().name(participant)?.to_string();

    Some(ParticipantSummary {
        participant,
        name,
        balance: dollars(balance_cents),
        total_shares: holdings.iter().sum(),
        holdings,
    })
}

/// Summaries for every roster member, in roster order.
pub fn participant_summaries(snapshot: &LedgerSnapshot) -> Vec<ParticipantSummary> {
    snapshot
        .roster()
        .ids()
        .filter_map(|id| participant_summary(snapshot, id))
        .collect()
}

impl fmt::Display for ParticipantSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} has {} and shares: {:?}",
            self.name,
            format_dollars(self.balance),
            self.holdings
        )
    }
}
