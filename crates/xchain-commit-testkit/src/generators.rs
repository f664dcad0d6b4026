//! Proptest generators for property-based testing.

use proptest::prelude::*;

use xchain_commit_core::{Bytes32, ChainSelector, Message, Observation, Price, SeqNum};

use crate::fixtures::message_id;

/// The chain every generated scenario commits from.
pub const SCENARIO_CHAIN: ChainSelector = ChainSelector(1);

/// Generate a non-zero price.
pub fn price() -> impl Strategy<Value = Price> {
    1u128..=u64::MAX as u128
}

/// Generate a list of reported prices.
pub fn prices(max_len: usize) -> impl Strategy<Value = Vec<Price>> {
    prop::collection::vec(price(), 1..=max_len)
}

/// One chain's worth of observations from `3f+1` oracles.
///
/// Hashes are drawn from a pool of three so conflicting votes are common,
/// and every oracle may skip any sequence number.
#[derive(Debug, Clone)]
pub struct ReduceScenario {
    pub f: u32,
    pub base: SeqNum,
    pub observations: Vec<Observation>,
}

/// The hash every honest oracle reports for a sequence number in a scenario.
pub fn pool_hash(seq_num: SeqNum, choice: u8) -> Bytes32 {
    let mut hash = [choice + 1; 32];
    hash[24..].copy_from_slice(&seq_num.to_be_bytes());
    Bytes32(hash)
}

/// Generate a [`ReduceScenario`].
pub fn reduce_scenario() -> impl Strategy<Value = ReduceScenario> {
    (1u32..=3, 0u64..1_000, 1usize..=8).prop_flat_map(|(f, base, window)| {
        let oracles = 3 * f as usize + 1;
        // Per oracle, per sequence number: skip it or vote for hash 0..3.
        let votes = prop::collection::vec(
            prop::collection::vec(prop::option::weighted(0.85, 0u8..3), window),
            oracles,
        );
        let reported = prop::collection::vec(prop::option::of(base..base + 3), oracles);
        (Just(f), Just(base), votes, reported).prop_map(|(f, base, votes, reported)| {
            let observations = votes
                .into_iter()
                .zip(reported)
                .map(|(choices, latest)| scenario_observation(f, base, &choices, latest))
                .collect();
            ReduceScenario {
                f,
                base,
                observations,
            }
        })
    })
}

fn scenario_observation(
    f: u32,
    base: SeqNum,
    choices: &[Option<u8>],
    latest: Option<SeqNum>,
) -> Observation {
    let mut obs = Observation::default();
    obs.f_chain.insert(SCENARIO_CHAIN, f);
    if let Some(latest) = latest {
        obs.latest_committed_seq_nums.insert(SCENARIO_CHAIN, latest);
    }

    let msgs: Vec<Message> = choices
        .iter()
        .enumerate()
        .filter_map(|(i, choice)| {
            let seq_num = base + 1 + i as SeqNum;
            choice.map(|c| {
                Message::new(seq_num, message_id(SCENARIO_CHAIN, seq_num), pool_hash(seq_num, c))
            })
        })
        .collect();
    if !msgs.is_empty() {
        obs.new_msgs.insert(SCENARIO_CHAIN, msgs);
    }
    obs
}
