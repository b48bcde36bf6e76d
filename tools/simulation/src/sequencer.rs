//! Deterministic stand-in for the ordering layer.
//!
//! Real deployments receive transactions from a consensus network that
//! timestamps and totally orders them. The simulation replaces that
//! network with a bounded FIFO queue: submissions beyond the queue
//! capacity are rejected, and draining the queue assigns consensus
//! timestamps from a fixed-step virtual clock before delivering every
//! transaction to every replica in the same order.

use std::collections::VecDeque;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::{debug, trace};
use uuid::Uuid;

use replica::Replica;
use types::command::Finality;
use types::ids::ParticipantId;

/// Tunables for the simulated ordering layer.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SequencerConfig {
    /// Most transactions the queue holds before rejecting submissions.
    pub queue_capacity: usize,
    /// Deliver each transaction once without finality before the final
    /// delivery, the way gossip exposes transactions ahead of consensus.
    pub provisional_pass: bool,
    /// Nanoseconds between consecutive consensus timestamps.
    pub timestamp_step_nanos: i64,
}

impl Default for SequencerConfig {
    fn default() -> Self {
        Self {
            queue_capacity: 1024,
            provisional_pass: true,
            timestamp_step_nanos: 1_000,
        }
    }
}

/// A submitted transaction waiting for its consensus slot.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PendingTransaction {
    /// Envelope id, unique per submission.
    pub envelope_id: Uuid,
    /// Member whose replica submitted the transaction.
    pub submitter: ParticipantId,
    /// Raw payload as it will reach every replica.
    pub payload: Vec<u8>,
    /// Wall-clock submission time. Diagnostics only; consensus
    /// timestamps come from the virtual clock.
    pub submitted_at: DateTime<Utc>,
}

/// Bounded FIFO queue that orders transactions and fans them out.
pub struct Sequencer {
    config: SequencerConfig,
    queue: VecDeque<PendingTransaction>,
    clock_nanos: i64,
    ordered: u64,
    rejected: u64,
}

impl Sequencer {
    pub fn new(config: SequencerConfig) -> Self {
        Self {
            config,
            queue: VecDeque::new(),
            clock_nanos: 0,
            ordered: 0,
            rejected: 0,
        }
    }

    /// Queues a transaction for ordering.
    ///
    /// Returns false when the queue is full; the transaction is dropped
    /// and counted.
    pub fn submit(&mut self, submitter: ParticipantId, payload: Vec<u8>) -> bool {
        if self.queue.len() >= self.config.queue_capacity {
            self.rejected += 1;
            debug!(
                submitter = submitter.as_u32(),
                capacity = self.config.queue_capacity,
                "queue full, rejecting transaction"
            );
            return false;
        }
        self.queue.push_back(PendingTransaction {
            envelope_id: Uuid::now_v7(),
            submitter,
            payload,
            submitted_at: Utc::now(),
        });
        true
    }

    /// Transactions waiting to be ordered.
    pub fn pending(&self) -> usize {
        self.queue.len()
    }

    /// Queued envelopes in submission order.
    pub fn queued(&self) -> impl Iterator<Item = &PendingTransaction> {
        self.queue.iter()
    }

    /// Transactions ordered so far.
    pub fn ordered(&self) -> u64 {
        self.ordered
    }

    /// Submissions rejected by a full queue.
    pub fn rejected(&self) -> u64 {
        self.rejected
    }

    /// The consensus timestamp the next ordered transaction will get.
    pub fn next_timestamp_nanos(&self) -> i64 {
        self.clock_nanos
    }

    /// Orders every queued transaction and delivers it to every replica.
    ///
    /// Each transaction gets the next virtual-clock timestamp. With the
    /// provisional pass enabled every replica sees it once without
    /// finality first; the final delivery then follows in queue order.
    /// Returns how many transactions were ordered.
    pub fn drain(&mut self, replicas: &mut [Replica]) -> usize {
        let mut delivered = 0;
        while let Some(tx) = self.queue.pop_front() {
            let timestamp = self.clock_nanos;
            self.clock_nanos += self.config.timestamp_step_nanos;
            if self.config.provisional_pass {
                for replica in replicas.iter_mut() {
                    replica.on_transaction(
                        tx.submitter,
                        Finality::Provisional,
                        timestamp,
                        &tx.payload,
                    );
                }
            }
            for replica in replicas.iter_mut() {
                replica.on_transaction(tx.submitter, Finality::Final, timestamp, &tx.payload);
            }
            trace!(
                envelope = %tx.envelope_id,
                submitter = tx.submitter.as_u32(),
                timestamp,
                "transaction ordered"
            );
            self.ordered += 1;
            delivered += 1;
        }
        delivered
    }
}
