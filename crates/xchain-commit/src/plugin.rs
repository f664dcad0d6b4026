//! The commit plugin: the interface the reporting runtime drives each round.

use std::collections::BTreeMap;
use std::sync::Arc;

use tracing::{info, warn};
use xchain_commit_core::{
    build_report, gate, reduce, validate_observation, AttributedObservation, Blake3MerkleBuilder,
    ChainSelector, Config, MerkleBuilder, MessageHasher, Observation, Outcome, SeqNum,
};

use crate::error::Result;
use crate::observer::{ObservationBuilder, Readers};

/// One node's commit plugin.
///
/// Everything except [`CommitPlugin::observation`] and
/// [`CommitPlugin::should_transmit`] is pure: the same inputs give the same
/// output on every node.
pub struct CommitPlugin {
    builder: ObservationBuilder,
    merkle: Arc<dyn MerkleBuilder>,
}

impl CommitPlugin {
    pub fn new(readers: Readers) -> Self {
        Self {
            builder: ObservationBuilder::new(readers),
            merkle: Arc::new(Blake3MerkleBuilder),
        }
    }

    pub fn with_merkle(mut self, merkle: Arc<dyn MerkleBuilder>) -> Self {
        self.merkle = merkle;
        self
    }

    pub fn with_hasher(mut self, hasher: Arc<dyn MessageHasher>) -> Self {
        self.builder = self.builder.with_hasher(hasher);
        self
    }

    /// Build the local observation for this round.
    pub async fn observation(&self, previous: &Outcome, config: &Config) -> Observation {
        self.builder.build(previous, config).await
    }

    /// Whether a peer observation may join the quorum set.
    pub fn validate_observation(&self, observation: &AttributedObservation, config: &Config) -> bool {
        match validate_observation(&observation.observation, observation.oracle, config) {
            Ok(()) => true,
            Err(e) => {
                warn!(oracle = %observation.oracle, error = %e, "dropping observation");
                false
            }
        }
    }

    /// The observations that pass validation, in input order.
    pub fn admit(&self, observations: &[AttributedObservation], config: &Config) -> Vec<Observation> {
        observations
            .iter()
            .filter(|ao| self.validate_observation(ao, config))
            .map(|ao| ao.observation.clone())
            .collect()
    }

    /// Reduce admitted observations to the next outcome.
    pub fn outcome(&self, admitted: &[Observation], previous: &Outcome, config: &Config) -> Outcome {
        reduce(admitted, previous, config, self.merkle.as_ref())
    }

    /// Serialize an outcome.
    pub fn report(&self, outcome: &Outcome) -> Result<Vec<u8>> {
        Ok(build_report(outcome)?)
    }

    pub fn should_accept(&self, report: &[u8]) -> bool {
        gate::should_accept(report)
    }

    /// Gate a report against freshly read destination state.
    ///
    /// The destination is read once. A failed read means no transmission.
    pub async fn should_transmit(&self, report: &[u8], config: &Config) -> bool {
        let onchain_next = match self.onchain_next(config).await {
            Ok(next) => next,
            Err(e) => {
                warn!(oracle = %config.oracle, error = %e, "cannot read destination, not transmitting");
                return false;
            }
        };

        let transmit = gate::should_transmit(report, config, &onchain_next);
        info!(oracle = %config.oracle, transmit, "transmission decision");
        transmit
    }

    async fn onchain_next(&self, config: &Config) -> Result<BTreeMap<ChainSelector, SeqNum>> {
        let chains: Vec<ChainSelector> = config.source_chains().collect();
        let read = self.builder.readers().offramp.next_seq_nums(&chains);
        match tokio::time::timeout(config.read_timeout(), read).await {
            Ok(result) => Ok(result?),
            Err(_) => Err(xchain_commit_reader::ReaderError::Timeout(config.read_timeout()).into()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use xchain_commit_core::{Bytes32, Commit, Interval, Message, OracleId, OracleInfo};
    use xchain_commit_reader::{MemoryOffRamp, MemoryOnRamp, MemoryPriceReader};

    const C1: ChainSelector = ChainSelector(1);
    const DEST: ChainSelector = ChainSelector(9);

    fn plugin(offramp: Arc<MemoryOffRamp>) -> CommitPlugin {
        let prices = Arc::new(MemoryPriceReader::new());
        CommitPlugin::new(Readers {
            onramp: Arc::new(MemoryOnRamp::new()),
            offramp,
            token_prices: prices.clone(),
            gas_prices: prices,
        })
    }

    fn config() -> Config {
        let mut config = Config::new(OracleId(0), DEST);
        config.f_chain.insert(C1, 1);
        config.f_chain.insert(DEST, 1);
        config
            .oracle_info
            .insert(OracleId(0), OracleInfo::new([C1, DEST], true));
        config
            .oracle_info
            .insert(OracleId(1), OracleInfo::new([C1], false));
        config
    }

    fn outcome_with_commit(min: SeqNum, max: SeqNum) -> Outcome {
        let mut outcome = Outcome::default();
        outcome.commits.insert(
            C1,
            Commit {
                interval: Interval::new(min, max).unwrap(),
                root: Bytes32([7; 32]),
            },
        );
        outcome
    }

    #[test]
    fn test_admit_drops_invalid() {
        let plugin = plugin(Arc::new(MemoryOffRamp::new(DEST)));

        let mut bad = Observation::default();
        bad.latest_committed_seq_nums.insert(C1, 3);
        let mut dup = Observation::default();
        dup.new_msgs.insert(
            C1,
            vec![
                Message::new(4, Bytes32([1; 32]), Bytes32([1; 32])),
                Message::new(4, Bytes32([2; 32]), Bytes32([2; 32])),
            ],
        );

        let observations = vec![
            AttributedObservation::new(OracleId(0), Observation::default()),
            AttributedObservation::new(OracleId(1), bad),
            AttributedObservation::new(OracleId(1), dup),
            AttributedObservation::new(OracleId(5), Observation::default()),
        ];

        assert_eq!(plugin.admit(&observations, &config()).len(), 1);
    }

    #[tokio::test]
    async fn test_should_transmit_reads_destination() {
        let offramp = Arc::new(MemoryOffRamp::new(DEST));
        offramp.set_next(C1, 6).await;
        let plugin = plugin(offramp.clone());

        let report = plugin.report(&outcome_with_commit(6, 8)).unwrap();
        assert!(plugin.should_accept(&report));
        assert!(plugin.should_transmit(&report, &config()).await);

        offramp.set_next(C1, 7).await;
        assert!(!plugin.should_transmit(&report, &config()).await);
    }

    #[tokio::test]
    async fn test_should_transmit_false_on_read_failure() {
        let offramp = Arc::new(MemoryOffRamp::new(DEST));
        offramp.set_next(C1, 6).await;
        offramp.set_failing(true).await;
        let plugin = plugin(offramp);

        let report = plugin.report(&outcome_with_commit(6, 8)).unwrap();
        assert!(!plugin.should_transmit(&report, &config()).await);
    }

    #[test]
    fn test_empty_outcome_not_accepted() {
        let plugin = plugin(Arc::new(MemoryOffRamp::new(DEST)));
        let report = plugin.report(&Outcome::default()).unwrap();
        assert!(report.is_empty());
        assert!(!plugin.should_accept(&report));
    }
}
