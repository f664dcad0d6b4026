//! Per-round observations and the outcome they reduce to.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::types::{ChainSelector, Commit, Message, OracleId, Price, SeqNum};

/// One node's view of the world for a single round.
///
/// Produced fresh each round and never mutated once emitted.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Observation {
    /// Latest committed sequence number per source chain, as seen on the
    /// destination chain. Only nodes reading the destination chain fill this.
    pub latest_committed_seq_nums: BTreeMap<ChainSelector, SeqNum>,
    /// Messages newer than the previous outcome, per source chain.
    pub new_msgs: BTreeMap<ChainSelector, Vec<Message>>,
    /// Token prices keyed by token identifier.
    pub token_prices: BTreeMap<String, Price>,
    /// Gas prices per chain.
    pub gas_prices: BTreeMap<ChainSelector, Price>,
    /// This node's view of the per-chain fault tolerance.
    pub f_chain: BTreeMap<ChainSelector, u32>,
}

impl Observation {
    /// Total number of messages across all chains.
    pub fn msg_count(&self) -> usize {
        self.new_msgs.values().map(Vec::len).sum()
    }

    /// Iterate every `(chain, message)` pair.
    pub fn messages(&self) -> impl Iterator<Item = (ChainSelector, &Message)> {
        self.new_msgs
            .iter()
            .flat_map(|(chain, msgs)| msgs.iter().map(move |m| (*chain, m)))
    }
}

/// An observation tagged with the oracle that produced it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AttributedObservation {
    pub oracle: OracleId,
    pub observation: Observation,
}

impl AttributedObservation {
    pub fn new(oracle: OracleId, observation: Observation) -> Self {
        Self {
            oracle,
            observation,
        }
    }
}

/// The agreed result of one round.
///
/// Becomes the sole input to the next round's observation phase and to
/// report construction.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Outcome {
    pub latest_committed_seq_nums: BTreeMap<ChainSelector, SeqNum>,
    pub commits: BTreeMap<ChainSelector, Commit>,
    pub token_prices: BTreeMap<String, Price>,
    pub gas_prices: BTreeMap<ChainSelector, Price>,
}

impl Outcome {
    /// True when there is nothing to report.
    pub fn is_empty(&self) -> bool {
        self.commits.is_empty() && self.token_prices.is_empty() && self.gas_prices.is_empty()
    }

    /// The latest committed sequence number for a chain, if known.
    pub fn latest_committed(&self, chain: &ChainSelector) -> Option<SeqNum> {
        self.latest_committed_seq_nums.get(chain).copied()
    }
}
