//! Outcome reduction: the deterministic core of a round.
//!
//! [`reduce`] turns the admitted quorum set into the next [`Outcome`]. It
//! performs no I/O and never depends on the order of its inputs: every vote
//! is tallied into ordered maps and every tie is broken by value.
//!
//! The reduction runs four steps:
//! 1. Fault tolerance: plurality vote on each chain's `f`.
//! 2. Sequence numbers: the `(f+1)`-th smallest reported latest committed
//!    sequence number, given at least `2f+1` reports.
//! 3. Commits: plurality vote on each message hash, `2f+1` votes to accept,
//!    truncated at the first gap.
//! 4. Prices: lower median of the reported values, given at least `2f+1`
//!    reports, where `f` is the destination chain's.

use std::collections::BTreeMap;

use tracing::{debug, info};

use crate::config::Config;
use crate::crypto::MerkleBuilder;
use crate::observation::{Observation, Outcome};
use crate::types::{Bytes32, ChainSelector, Commit, Interval, Price, SeqNum};

/// Votes required for a value with fault tolerance `f`.
pub fn quorum_threshold(f: u32) -> usize {
    2 * f as usize + 1
}

/// Reduce the admitted observations to the next outcome.
///
/// `previous` is the outcome of the last round: chains that fail to reach
/// sequence number consensus keep its values, and no chain ever moves
/// backwards.
pub fn reduce(
    observations: &[Observation],
    previous: &Outcome,
    config: &Config,
    merkle: &dyn MerkleBuilder,
) -> Outcome {
    let f_chain = f_chain_consensus(observations);
    let latest_committed_seq_nums = seq_nums_consensus(observations, &f_chain, previous);
    let commits = commits_consensus(
        observations,
        &f_chain,
        &latest_committed_seq_nums,
        config.max_merkle_leaves,
        merkle,
    );
    let (token_prices, gas_prices) = match f_chain.get(&config.dest_chain) {
        Some(&f) => (
            token_prices_consensus(observations, f),
            gas_prices_consensus(observations, f),
        ),
        None => {
            debug!(dest = %config.dest_chain, "no fault tolerance consensus for destination, skipping prices");
            (BTreeMap::new(), BTreeMap::new())
        }
    };

    info!(
        observations = observations.len(),
        commits = commits.len(),
        token_prices = token_prices.len(),
        gas_prices = gas_prices.len(),
        "reduced outcome"
    );

    Outcome {
        latest_committed_seq_nums,
        commits,
        token_prices,
        gas_prices,
    }
}

/// Most frequent value and its count. Ties go to the smallest value.
pub fn plurality<T: Ord + Copy>(votes: impl IntoIterator<Item = T>) -> Option<(T, usize)> {
    let mut counts: BTreeMap<T, usize> = BTreeMap::new();
    for vote in votes {
        *counts.entry(vote).or_insert(0) += 1;
    }

    let mut best: Option<(T, usize)> = None;
    for (value, count) in counts {
        // Ascending iteration: only a strictly higher count displaces.
        if best.map_or(true, |(_, best_count)| count > best_count) {
            best = Some((value, count));
        }
    }
    best
}

/// Lower median: for an even count, the smaller of the two middle values.
pub fn lower_median(mut values: Vec<Price>) -> Option<Price> {
    if values.is_empty() {
        return None;
    }
    values.sort_unstable();
    Some(values[(values.len() - 1) / 2])
}

/// Plurality vote on every chain's fault tolerance.
pub fn f_chain_consensus(observations: &[Observation]) -> BTreeMap<ChainSelector, u32> {
    let mut votes: BTreeMap<ChainSelector, Vec<u32>> = BTreeMap::new();
    for obs in observations {
        for (chain, f) in &obs.f_chain {
            votes.entry(*chain).or_default().push(*f);
        }
    }

    votes
        .into_iter()
        .filter_map(|(chain, values)| plurality(values).map(|(f, _)| (chain, f)))
        .collect()
}

/// Order-statistic consensus on the latest committed sequence numbers.
pub fn seq_nums_consensus(
    observations: &[Observation],
    f_chain: &BTreeMap<ChainSelector, u32>,
    previous: &Outcome,
) -> BTreeMap<ChainSelector, SeqNum> {
    let mut reported: BTreeMap<ChainSelector, Vec<SeqNum>> = BTreeMap::new();
    for obs in observations {
        for (chain, seq_num) in &obs.latest_committed_seq_nums {
            reported.entry(*chain).or_default().push(*seq_num);
        }
    }

    let mut consensus = previous.latest_committed_seq_nums.clone();
    for (chain, mut values) in reported {
        let Some(&f) = f_chain.get(&chain) else {
            debug!(chain = %chain, "no fault tolerance consensus, keeping previous seq num");
            continue;
        };
        if values.len() < quorum_threshold(f) {
            debug!(
                chain = %chain,
                reports = values.len(),
                needed = quorum_threshold(f),
                "not enough seq num reports, keeping previous"
            );
            continue;
        }

        values.sort_unstable();
        let agreed = values[f as usize];
        let entry = consensus.entry(chain).or_insert(agreed);
        *entry = (*entry).max(agreed);
    }

    consensus
}

/// Build one commit per chain from the quorate, gap-free prefix of new messages.
pub fn commits_consensus(
    observations: &[Observation],
    f_chain: &BTreeMap<ChainSelector, u32>,
    latest: &BTreeMap<ChainSelector, SeqNum>,
    max_leaves: usize,
    merkle: &dyn MerkleBuilder,
) -> BTreeMap<ChainSelector, Commit> {
    let mut commits = BTreeMap::new();

    for (chain, f) in f_chain {
        let Some(&base) = latest.get(chain) else {
            continue;
        };
        let Some(first) = base.checked_add(1) else {
            debug!(chain = %chain, base, "sequence numbers exhausted");
            continue;
        };

        let accepted = accepted_hashes(observations, *chain, base, quorum_threshold(*f));
        let leaves = contiguous_prefix(&accepted, base, max_leaves);
        if leaves.is_empty() {
            continue;
        }

        let Some(max) = base.checked_add(leaves.len() as SeqNum) else {
            continue;
        };
        let Some(interval) = Interval::new(first, max) else {
            continue;
        };
        let root = merkle.build_root(&leaves);

        debug!(chain = %chain, interval = %interval, root = %root, "commit");
        commits.insert(*chain, Commit { interval, root });
    }

    commits
}

/// Winning hash per sequence number above `base`, kept only with `threshold` votes.
fn accepted_hashes(
    observations: &[Observation],
    chain: ChainSelector,
    base: SeqNum,
    threshold: usize,
) -> BTreeMap<SeqNum, Bytes32> {
    let mut votes: BTreeMap<SeqNum, Vec<Bytes32>> = BTreeMap::new();
    for obs in observations {
        let Some(msgs) = obs.new_msgs.get(&chain) else {
            continue;
        };
        for msg in msgs.iter().filter(|m| m.seq_num > base) {
            votes.entry(msg.seq_num).or_default().push(msg.hash);
        }
    }

    votes
        .into_iter()
        .filter_map(|(seq_num, hashes)| {
            let (hash, count) = plurality(hashes)?;
            if count < threshold {
                debug!(chain = %chain, seq_num, votes = count, threshold, "hash below quorum");
                return None;
            }
            Some((seq_num, hash))
        })
        .collect()
}

/// Leaves for `base+1, base+2, ...` up to the first gap or `max_leaves`.
fn contiguous_prefix(
    accepted: &BTreeMap<SeqNum, Bytes32>,
    base: SeqNum,
    max_leaves: usize,
) -> Vec<Bytes32> {
    let mut leaves = Vec::new();
    let mut expected = base.checked_add(1);
    for (seq_num, hash) in accepted {
        if expected != Some(*seq_num) || leaves.len() == max_leaves {
            break;
        }
        leaves.push(*hash);
        expected = seq_num.checked_add(1);
    }
    leaves
}

/// Lower median of each token price reported by at least `2f+1` observations.
pub fn token_prices_consensus(observations: &[Observation], f: u32) -> BTreeMap<String, Price> {
    let mut reported: BTreeMap<String, Vec<Price>> = BTreeMap::new();
    for obs in observations {
        for (token, price) in &obs.token_prices {
            reported.entry(token.clone()).or_default().push(*price);
        }
    }

    reported
        .into_iter()
        .filter(|(token, prices)| has_price_quorum(token, prices, f))
        .filter_map(|(token, prices)| lower_median(prices).map(|p| (token, p)))
        .collect()
}

/// Lower median of each chain's gas price reported by at least `2f+1` observations.
pub fn gas_prices_consensus(observations: &[Observation], f: u32) -> BTreeMap<ChainSelector, Price> {
    let mut reported: BTreeMap<ChainSelector, Vec<Price>> = BTreeMap::new();
    for obs in observations {
        for (chain, price) in &obs.gas_prices {
            reported.entry(*chain).or_default().push(*price);
        }
    }

    reported
        .into_iter()
        .filter(|(chain, prices)| has_price_quorum(chain, prices, f))
        .filter_map(|(chain, prices)| lower_median(prices).map(|p| (chain, p)))
        .collect()
}

fn has_price_quorum(key: &impl std::fmt::Display, prices: &[Price], f: u32) -> bool {
    let threshold = quorum_threshold(f);
    if prices.len() < threshold {
        debug!(key = %key, reports = prices.len(), threshold, "price below quorum");
        return false;
    }
    true
}
