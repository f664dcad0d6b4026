//! Property tests for the reduction.

use std::collections::BTreeMap;

use proptest::prelude::*;

use xchain_commit::core::consensus::{lower_median, quorum_threshold};
use xchain_commit::core::{reduce, Blake3MerkleBuilder, Bytes32, MerkleBuilder, SeqNum};
use xchain_commit::{ChainSelector, Config, Observation, OracleId, Outcome};
use xchain_commit_testkit::generators::{prices, reduce_scenario, ReduceScenario, SCENARIO_CHAIN};

fn config(f: u32) -> Config {
    let mut config = Config::new(OracleId(0), ChainSelector(99));
    config.f_chain.insert(SCENARIO_CHAIN, f);
    config
}

fn reduce_scenario_with(scenario: &ReduceScenario, observations: &[Observation], previous: &Outcome) -> Outcome {
    reduce(observations, previous, &config(scenario.f), &Blake3MerkleBuilder)
}

/// Votes per hash at each sequence number.
fn tally(observations: &[Observation]) -> BTreeMap<SeqNum, BTreeMap<Bytes32, usize>> {
    let mut votes: BTreeMap<SeqNum, BTreeMap<Bytes32, usize>> = BTreeMap::new();
    for msg in observations.iter().flat_map(|o| o.new_msgs.get(&SCENARIO_CHAIN)).flatten() {
        *votes.entry(msg.seq_num).or_default().entry(msg.hash).or_insert(0) += 1;
    }
    votes
}

proptest! {
    #[test]
    fn reduction_ignores_observation_order(
        (scenario, shuffled) in reduce_scenario().prop_flat_map(|s| {
            let obs = s.observations.clone();
            (Just(s), Just(obs).prop_shuffle())
        })
    ) {
        let previous = Outcome::default();
        let a = reduce_scenario_with(&scenario, &scenario.observations, &previous);
        let b = reduce_scenario_with(&scenario, &shuffled, &previous);
        prop_assert_eq!(a, b);
    }

    #[test]
    fn committed_leaves_have_quorum(scenario in reduce_scenario()) {
        let outcome = reduce_scenario_with(&scenario, &scenario.observations, &Outcome::default());
        let Some(commit) = outcome.commits.get(&SCENARIO_CHAIN) else {
            return Ok(());
        };

        let votes = tally(&scenario.observations);
        let threshold = quorum_threshold(scenario.f);
        let mut leaves = Vec::new();
        for seq_num in commit.interval.min..=commit.interval.max {
            let (hash, count) = votes[&seq_num]
                .iter()
                .max_by(|a, b| a.1.cmp(b.1).then(b.0.cmp(a.0)))
                .map(|(h, c)| (*h, *c))
                .unwrap();
            prop_assert!(count >= threshold, "seq {} has {} votes", seq_num, count);
            leaves.push(hash);
        }
        prop_assert_eq!(commit.root, Blake3MerkleBuilder.build_root(&leaves));
    }

    #[test]
    fn commits_start_right_after_latest(scenario in reduce_scenario()) {
        let outcome = reduce_scenario_with(&scenario, &scenario.observations, &Outcome::default());
        if let Some(commit) = outcome.commits.get(&SCENARIO_CHAIN) {
            let latest = outcome.latest_committed_seq_nums[&SCENARIO_CHAIN];
            prop_assert_eq!(commit.interval.min, latest + 1);
            prop_assert!(commit.interval.max >= commit.interval.min);
        }
    }

    #[test]
    fn latest_never_moves_backwards(scenario in reduce_scenario(), bump in 0u64..5) {
        let mut previous = Outcome::default();
        previous
            .latest_committed_seq_nums
            .insert(SCENARIO_CHAIN, scenario.base + bump);

        let outcome = reduce_scenario_with(&scenario, &scenario.observations, &previous);
        prop_assert!(outcome.latest_committed_seq_nums[&SCENARIO_CHAIN] >= scenario.base + bump);
    }

    #[test]
    fn median_lies_within_reports(values in prices(31)) {
        let median = lower_median(values.clone()).unwrap();
        let below = values.iter().filter(|v| **v < median).count();
        let above = values.iter().filter(|v| **v > median).count();
        prop_assert!(below <= (values.len() - 1) / 2);
        prop_assert!(above <= values.len() / 2);
    }
}
