//! Multi-replica exchange simulation.
//!
//! Boots a cluster of replicas over one roster, drives seeded trader
//! bots through the deterministic sequencer, and reports whether every
//! replica converged on the same ledger digest.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use tracing::info;

use market_data::{latest_quotes, participant_summaries, InstrumentQuote, ParticipantSummary};
use replica::{Replica, ReplicaConfig};
use state_transfer::{state_digest, InterchangeError};
use types::genesis::GenesisConfig;
use types::ids::ParticipantId;
use types::roster::Roster;

use crate::bots::random_trader::{RandomTrader, TraderConfig};
use crate::sequencer::{Sequencer, SequencerConfig};
use crate::tickers::generate_tickers;

/// Member names; clusters larger than the pool fall back to numbered
/// names.
const MEMBER_NAMES: [&str; 8] = [
    "alice", "bob", "carol", "dave", "erin", "frank", "grace", "heidi",
];

/// Cluster-wide simulation parameters.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SimConfig {
    /// Number of replicas, one trading member each.
    pub members: usize,
    /// Number of listed instruments.
    pub instruments: usize,
    /// Quoting rounds to run.
    pub rounds: usize,
    /// Master seed; the tickers and every bot derive from it.
    pub seed: u64,
    /// Trade ring capacity for every replica.
    pub trade_ring_capacity: usize,
    pub sequencer: SequencerConfig,
    pub trader: TraderConfig,
}

impl Default for SimConfig {
    fn default() -> Self {
        Self {
            members: 4,
            instruments: 10,
            rounds: 50,
            seed: 42,
            trade_ring_capacity: 200,
            sequencer: SequencerConfig::default(),
            trader: TraderConfig::default(),
        }
    }
}

/// Final state of a simulation run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SimReport {
    pub version: String,
    pub members: usize,
    pub instruments: usize,
    pub rounds: usize,
    pub seed: u64,
    pub transactions_ordered: u64,
    pub transactions_rejected: u64,
    pub trades: u64,
    /// Whether every replica ended on the same digest.
    pub converged: bool,
    /// The first replica's ledger digest.
    pub digest: String,
    /// Sum of all wallets; settlement moves cash, never creates it.
    pub total_cash: Decimal,
    /// Sum of all holdings across members and instruments.
    pub total_shares: i64,
    pub quotes: Vec<InstrumentQuote>,
    pub summaries: Vec<ParticipantSummary>,
}

/// A cluster of replicas, their bots, and the ordering layer.
pub struct ExchangeSim {
    config: SimConfig,
    roster: Roster,
    replicas: Vec<Replica>,
    sequencer: Sequencer,
    bots: Vec<RandomTrader>,
    rounds_run: usize,
}

impl ExchangeSim {
    /// Builds the cluster: one replica and one bot per member, all
    /// replicas booted from the same genesis.
    ///
    /// Panics on an empty cluster or an instrument count that does not
    /// fit the one-byte instrument id.
    pub fn new(config: SimConfig) -> Self {
        assert!(config.members >= 1, "a cluster needs at least one member");
        assert!(
            config.instruments >= 1 && config.instruments <= 256,
            "instrument ids are one byte, so 1..=256 instruments"
        );

        let roster = Roster::new(member_names(config.members));
        let genesis = GenesisConfig {
            tickers: generate_tickers(config.instruments, config.seed),
            trade_ring_capacity: config.trade_ring_capacity,
            ..GenesisConfig::default()
        };
        let replicas = (0..config.members)
            .map(|_| Replica::new(roster.clone(), &genesis, ReplicaConfig::default()))
            .collect();
        let bots = (0..config.members)
            .map(|i| {
                RandomTrader::new(
                    ParticipantId::new(i as u32),
                    config.trader.clone(),
                    config.seed.wrapping_add(i as u64 + 1),
                )
            })
            .collect();
        let sequencer = Sequencer::new(config.sequencer.clone());
        info!(
            members = config.members,
            instruments = config.instruments,
            seed = config.seed,
            "simulation cluster ready"
        );
        Self {
            config,
            roster,
            replicas,
            sequencer,
            bots,
            rounds_run: 0,
        }
    }

    /// One quoting round: every bot quotes off its own replica's ledger,
    /// then the sequencer orders and delivers the batch. Returns how
    /// many transactions were ordered.
    pub fn step(&mut self) -> usize {
        for (bot, replica) in self.bots.iter_mut().zip(&self.replicas) {
            for payload in bot.round(replica.snapshot()) {
                self.sequencer.submit(bot.participant, payload);
            }
        }
        self.rounds_run += 1;
        self.sequencer.drain(&mut self.replicas)
    }

    /// Runs the configured number of rounds and reports the outcome.
    pub fn run(&mut self) -> Result<SimReport, InterchangeError> {
        for _ in 0..self.config.rounds {
            self.step();
        }
        let report = self.report()?;
        info!(
            rounds = report.rounds,
            ordered = report.transactions_ordered,
            trades = report.trades,
            converged = report.converged,
            "simulation run complete"
        );
        Ok(report)
    }

    /// Builds a report from the cluster's current state.
    pub fn report(&self) -> Result<SimReport, InterchangeError> {
        let digests = self.digests()?;
        let converged = digests.windows(2).all(|pair| pair[0] == pair[1]);
        let head = self.replicas[0].snapshot();
        let summaries = participant_summaries(head);
        let total_cash: Decimal = summaries.iter().map(|summary| summary.balance).sum();
        let total_shares: i64 = summaries.iter().map(|summary| summary.total_shares).sum();
        Ok(SimReport {
            version: crate::VERSION.to_string(),
            members: self.config.members,
            instruments: self.config.instruments,
            rounds: self.rounds_run,
            seed: self.config.seed,
            transactions_ordered: self.sequencer.ordered(),
            transactions_rejected: self.sequencer.rejected(),
            trades: head.trades().total(),
            converged,
            digest: digests[0].clone(),
            total_cash,
            total_shares,
            quotes: latest_quotes(head),
            summaries,
        })
    }

    /// State digest per replica, in member order.
    pub fn digests(&self) -> Result<Vec<String>, InterchangeError> {
        self.replicas
            .iter()
            .map(|replica| state_digest(replica.snapshot()))
            .collect()
    }

    pub fn config(&self) -> &SimConfig {
        &self.config
    }

    pub fn roster(&self) -> &Roster {
        &self.roster
    }

    pub fn replicas(&self) -> &[Replica] {
        &self.replicas
    }

    pub fn rounds_run(&self) -> usize {
        self.rounds_run
    }
}

fn member_names(count: usize) -> Vec<String> {
    (0..count)
        .map(|i| match MEMBER_NAMES.get(i) {
            Some(name) => (*name).to_string(),
            None => format!("member-{i}"),
        })
        .collect()
}
