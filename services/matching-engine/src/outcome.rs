//! Result of applying one transaction to a ledger snapshot

use std::sync::Arc;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use types::command::SyncSpeed;
use types::ledger::LedgerSnapshot;
use types::trade::TradeRecord;

/// Everything a replica needs to know after one transaction.
#[derive(Debug, Clone)]
pub struct ApplyOutcome {
    /// The snapshot after the transaction. When the transaction left the
    /// ledger untouched this is the input snapshot, not a copy.
    pub snapshot: Arc<LedgerSnapshot>,
    /// The trade this transaction settled, if it crossed the book.
    pub trade: Option<TradeRecord>,
    /// Requested gossip pacing, from an explicit speed command or from
    /// the first trade slowing the stream down.
    pub pacing: Option<SyncSpeed>,
    /// What became of the command itself.
    pub disposition: Disposition,
}

impl ApplyOutcome {
    /// Outcome for a transaction that left the ledger untouched.
    pub(crate) fn unchanged(snapshot: &Arc<LedgerSnapshot>, disposition: Disposition) -> Self {
        Self {
            snapshot: Arc::clone(snapshot),
            trade: None,
            pacing: None,
            disposition,
        }
    }
}

/// The fate of a single command.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Disposition {
    /// A pacing command took effect; the ledger itself is untouched.
    SpeedChange(SyncSpeed),
    /// A quote seen before its order was final; it is dropped here and
    /// arrives again once ordered.
    ProvisionalHold,
    /// The quote failed validation and was ignored.
    Rejected(RejectReason),
    /// The quote is now the remembered offer on its side.
    Quoted,
    /// A remembered offer at least as good already existed.
    Superseded,
    /// The quote crossed the book and settled a trade.
    Traded,
}

impl Disposition {
    /// Short name for log fields.
    pub fn label(&self) -> &'static str {
        match self {
            Disposition::SpeedChange(_) => "speed_change",
            Disposition::ProvisionalHold => "provisional_hold",
            Disposition::Rejected(_) => "rejected",
            Disposition::Quoted => "quoted",
            Disposition::Superseded => "superseded",
            Disposition::Traded => "traded",
        }
    }
}

/// Why a quote was ignored.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error, Serialize, Deserialize)]
pub enum RejectReason {
    #[error("submitter is not in the roster")]
    UnknownParticipant,
    #[error("instrument is not listed")]
    UnknownInstrument,
    #[error("price outside the quotable range")]
    PriceOutOfRange,
    #[error("submitter holds no shares of the instrument")]
    NoHoldings,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_disposition_labels() {
        assert_eq!(Disposition::Traded.label(), "traded");
        assert_eq!(
            Disposition::SpeedChange(SyncSpeed::Fast).label(),
            "speed_change"
        );
        assert_eq!(
            Disposition::Rejected(RejectReason::NoHoldings).label(),
            "rejected"
        );
    }

    #[test]
    fn test_reject_reason_messages() {
        assert_eq!(
            RejectReason::PriceOutOfRange.to_string(),
            "price outside the quotable range"
        );
        assert_eq!(
            RejectReason::NoHoldings.to_string(),
            "submitter holds no shares of the instrument"
        );
    }
}
