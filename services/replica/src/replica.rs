//! Replica driver
//!
//! Consumes the ordered transaction stream for one replica. Each payload
//! is decoded, run through the matching engine against the current head
//! snapshot, and the successor is published for readers. Pacing requests
//! and counters live here; they are replica-local and never serialized
//! with the ledger.

use std::sync::Arc;
use std::time::Duration;

use tracing::{debug, info, trace};

use matching_engine::{apply, Disposition};
use types::command::{Finality, SyncSpeed};
use types::genesis::GenesisConfig;
use types::ids::ParticipantId;
use types::ledger::LedgerSnapshot;
use types::roster::Roster;
use types::trade::TradeRecord;

use crate::view::{LedgerView, SnapshotCell};

/// Gossip delays behind the two sync speeds.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ReplicaConfig {
    pub fast_sync_delay: Duration,
    pub slow_sync_delay: Duration,
}

impl Default for ReplicaConfig {
    fn default() -> Self {
        Self {
            fast_sync_delay: Duration::ZERO,
            slow_sync_delay: Duration::from_millis(1000),
        }
    }
}

/// Counters over everything this replica has consumed.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ReplicaStats {
    /// Every delivered transaction, whatever became of it.
    pub transactions: u64,
    /// Final quotes the engine accepted (quoted, superseded, or traded).
    pub quotes_applied: u64,
    /// Trades settled.
    pub trades: u64,
    /// Provisional quotes held for their final delivery.
    pub held: u64,
    /// Quotes that failed validation.
    pub rejected: u64,
    /// Payloads the codec could not decode.
    pub malformed: u64,
    /// Explicit speed commands.
    pub speed_changes: u64,
}

/// What the replica did with one delivered transaction.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Delivery {
    /// A final quote went through the engine.
    Applied { trade: Option<TradeRecord> },
    /// A speed command retuned gossip pacing.
    PacingChanged(SyncSpeed),
    /// A provisional quote; it arrives again once ordered.
    Held,
    /// Malformed payload or failed validation.
    Dropped,
}

/// One replica of the exchange.
///
/// The replica is the single writer of its snapshot chain. Readers hold
/// [`LedgerView`]s and are unaffected by writer progress.
#[derive(Debug)]
pub struct Replica {
    cell: Arc<SnapshotCell>,
    head: Arc<LedgerSnapshot>,
    pacing: SyncSpeed,
    config: ReplicaConfig,
    stats: ReplicaStats,
}

impl Replica {
    /// Starts a replica at genesis, syncing fast.
    pub fn new(roster: Roster, genesis: &GenesisConfig, config: ReplicaConfig) -> Self {
        let snapshot = Arc::new(LedgerSnapshot::genesis(roster, genesis));
        Self::with_snapshot(snapshot, SyncSpeed::Fast, config)
    }

    /// Starts a replica from a transferred snapshot.
    ///
    /// A ledger that has already traded starts slow, matching the pacing
    /// its peers switched to on the first trade.
    pub fn from_snapshot(snapshot: Arc<LedgerSnapshot>, config: ReplicaConfig) -> Self {
        let pacing = if snapshot.trades().total() > 0 {
            SyncSpeed::Slow
        } else {
            SyncSpeed::Fast
        };
        Self::with_snapshot(snapshot, pacing, config)
    }

    fn with_snapshot(snapshot: Arc<LedgerSnapshot>, pacing: SyncSpeed, config: ReplicaConfig) -> Self {
        info!(
            members = snapshot.participant_count(),
            instruments = snapshot.instrument_count(),
            trades = snapshot.trades().total(),
            pacing = pacing.label(),
            "replica started"
        );
        Self {
            cell: Arc::new(SnapshotCell::new(Arc::clone(&snapshot))),
            head: snapshot,
            pacing,
            config,
            stats: ReplicaStats::default(),
        }
    }

    /// Read handle that tracks this replica's published snapshots.
    pub fn view(&self) -> LedgerView {
        LedgerView::new(Arc::clone(&self.cell))
    }

    /// The writer's current head. Identical to what the view observes.
    pub fn snapshot(&self) -> &Arc<LedgerSnapshot> {
        &self.head
    }

    pub fn pacing(&self) -> SyncSpeed {
        self.pacing
    }

    /// Delay the gossip layer should wait between syncs.
    pub fn pacing_delay(&self) -> Duration {
        match self.pacing {
            SyncSpeed::Fast => self.config.fast_sync_delay,
            SyncSpeed::Slow => self.config.slow_sync_delay,
        }
    }

    pub fn stats(&self) -> ReplicaStats {
        self.stats
    }

    /// Feeds one transaction from the ordering layer.
    ///
    /// `timestamp_nanos` is the consensus timestamp assigned by that
    /// layer. The ledger itself never reads it; it is recorded here for
    /// diagnostics only.
    pub fn on_transaction(
        &mut self,
        submitter: ParticipantId,
        finality: Finality,
        timestamp_nanos: i64,
        payload: &[u8],
    ) -> Delivery {
        self.stats.transactions += 1;
        trace!(
            submitter = submitter.as_u32(),
            is_final = finality.is_final(),
            timestamp_nanos,
            len = payload.len(),
            "transaction delivered"
        );
        let command = match codec::decode(payload) {
            Ok(command) => command,
            Err(err) => {
                self.stats.malformed += 1;
                debug!(submitter = submitter.as_u32(), %err, "dropping malformed transaction");
                return Delivery::Dropped;
            }
        };

        let outcome = apply(&self.head, submitter, command, finality);
        if let Some(speed) = outcome.pacing {
            if speed != self.pacing {
                info!(from = self.pacing.label(), to = speed.label(), "sync pacing changed");
            }
            self.pacing = speed;
        }
        if !Arc::ptr_eq(&outcome.snapshot, &self.head) {
            self.head = Arc::clone(&outcome.snapshot);
            self.cell.publish(outcome.snapshot);
        }

        match outcome.disposition {
            Disposition::SpeedChange(speed) => {
                self.stats.speed_changes += 1;
                Delivery::PacingChanged(speed)
            }
            Disposition::ProvisionalHold => {
                self.stats.held += 1;
                trace!(
                    submitter = submitter.as_u32(),
                    command = command.label(),
                    "holding provisional quote"
                );
                Delivery::Held
            }
            Disposition::Rejected(reason) => {
                self.stats.rejected += 1;
                debug!(
                    submitter = submitter.as_u32(),
                    command = command.label(),
                    %reason,
                    "rejected quote"
                );
                Delivery::Dropped
            }
            Disposition::Quoted | Disposition::Superseded => {
                self.stats.quotes_applied += 1;
                Delivery::Applied { trade: None }
            }
            Disposition::Traded => {
                self.stats.quotes_applied += 1;
                self.stats.trades += 1;
                if let Some(record) = outcome.trade {
                    info!(
                        seq = record.seq,
                        ticker = self.head.ticker(record.instrument).unwrap_or("?"),
                        price_cents = record.price.as_cents(),
                        seller = record.seller.as_u32(),
                        buyer = record.buyer.as_u32(),
                        "trade settled"
                    );
                }
                Delivery::Applied {
                    trade: outcome.trade,
                }
            }
        }
    }
}
