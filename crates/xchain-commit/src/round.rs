//! Per-round state machine.
//!
//! ```text
//! Idle → Observing → Validating → Reducing → ReportBuilding → GateCheck → {Transmit | Suppress} → Idle
//! ```
//!
//! Gathering observations from peers is the transport's job and happens
//! between [`RoundDriver::observe`] and [`RoundDriver::finish`].

use std::fmt;
use std::sync::Arc;

use tracing::{debug, info, warn};
use xchain_commit_core::{AttributedObservation, Config, Observation, Outcome};
use xchain_commit_reader::ConfigSync;

use crate::error::{PluginError, Result};
use crate::plugin::CommitPlugin;

/// Where a round currently is.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RoundPhase {
    Idle,
    Observing,
    Validating,
    Reducing,
    ReportBuilding,
    GateCheck,
    Transmit,
    Suppress,
}

impl fmt::Display for RoundPhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Idle => "idle",
            Self::Observing => "observing",
            Self::Validating => "validating",
            Self::Reducing => "reducing",
            Self::ReportBuilding => "report-building",
            Self::GateCheck => "gate-check",
            Self::Transmit => "transmit",
            Self::Suppress => "suppress",
        };
        f.write_str(name)
    }
}

/// A round that produced an outcome.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CompletedRound {
    pub round: u64,
    pub outcome: Outcome,
    pub report: Vec<u8>,
    pub accepted: bool,
    pub transmit: bool,
}

/// How a round ended.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RoundResult {
    /// Too few admitted observations. The outcome did not advance.
    Abandoned { admitted: usize, needed: usize },
    Completed(CompletedRound),
}

/// Drives one node through successive rounds.
pub struct RoundDriver {
    plugin: Arc<CommitPlugin>,
    config_sync: Arc<dyn ConfigSync>,
    round: u64,
    phase: RoundPhase,
    trail: Vec<RoundPhase>,
    config: Option<Config>,
    previous: Outcome,
}

impl RoundDriver {
    pub fn new(plugin: Arc<CommitPlugin>, config_sync: Arc<dyn ConfigSync>) -> Self {
        Self {
            plugin,
            config_sync,
            round: 0,
            phase: RoundPhase::Idle,
            trail: Vec::new(),
            config: None,
            previous: Outcome::default(),
        }
    }

    /// Start from a known outcome instead of the empty one.
    pub fn with_outcome(mut self, outcome: Outcome) -> Self {
        self.previous = outcome;
        self
    }

    pub fn phase(&self) -> RoundPhase {
        self.phase
    }

    /// Phases visited by the most recent round.
    pub fn trail(&self) -> &[RoundPhase] {
        &self.trail
    }

    pub fn round(&self) -> u64 {
        self.round
    }

    pub fn previous_outcome(&self) -> &Outcome {
        &self.previous
    }

    fn enter(&mut self, phase: RoundPhase) {
        debug!(round = self.round, from = %self.phase, to = %phase, "phase");
        self.phase = phase;
        self.trail.push(phase);
    }

    /// Begin a round: pin the config snapshot and build the local observation.
    pub async fn observe(&mut self) -> Result<AttributedObservation> {
        if self.phase != RoundPhase::Idle {
            return Err(PluginError::InvalidOperation(format!(
                "cannot observe while {}",
                self.phase
            )));
        }

        let config = self.config_sync.current().await?;
        self.round += 1;
        self.trail.clear();
        self.trail.push(RoundPhase::Idle);
        self.enter(RoundPhase::Observing);

        let observation = self.plugin.observation(&self.previous, &config).await;
        let attributed = AttributedObservation::new(config.oracle, observation);
        self.config = Some(config);
        Ok(attributed)
    }

    /// Finish the round over the observations the transport gathered.
    pub async fn finish(&mut self, observations: &[AttributedObservation]) -> Result<RoundResult> {
        if self.phase != RoundPhase::Observing {
            return Err(PluginError::InvalidOperation(format!(
                "cannot finish while {}",
                self.phase
            )));
        }
        let Some(config) = self.config.take() else {
            return Err(PluginError::InvalidOperation("no config for round".into()));
        };

        self.enter(RoundPhase::Validating);
        let admitted: Vec<Observation> = self.plugin.admit(observations, &config);
        let needed = config.min_observations();
        if admitted.len() < needed {
            warn!(
                round = self.round,
                admitted = admitted.len(),
                needed,
                "not enough observations, abandoning round"
            );
            self.enter(RoundPhase::Idle);
            return Ok(RoundResult::Abandoned {
                admitted: admitted.len(),
                needed,
            });
        }

        self.enter(RoundPhase::Reducing);
        let outcome = self.plugin.outcome(&admitted, &self.previous, &config);

        self.enter(RoundPhase::ReportBuilding);
        let report = match self.plugin.report(&outcome) {
            Ok(report) => report,
            Err(e) => {
                self.enter(RoundPhase::Idle);
                return Err(e);
            }
        };

        self.enter(RoundPhase::GateCheck);
        let accepted = self.plugin.should_accept(&report);
        let transmit = accepted && self.plugin.should_transmit(&report, &config).await;
        self.enter(if transmit {
            RoundPhase::Transmit
        } else {
            RoundPhase::Suppress
        });

        info!(
            round = self.round,
            oracle = %config.oracle,
            commits = outcome.commits.len(),
            accepted,
            transmit,
            "round complete"
        );

        self.previous = outcome.clone();
        self.enter(RoundPhase::Idle);

        Ok(RoundResult::Completed(CompletedRound {
            round: self.round,
            outcome,
            report,
            accepted,
            transmit,
        }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::observer::Readers;
    use xchain_commit_core::{ChainSelector, OracleId, OracleInfo};
    use xchain_commit_reader::{MemoryOffRamp, MemoryOnRamp, MemoryPriceReader, StaticConfigSync};

    const DEST: ChainSelector = ChainSelector(9);

    fn driver() -> RoundDriver {
        let prices = Arc::new(MemoryPriceReader::new());
        let plugin = CommitPlugin::new(Readers {
            onramp: Arc::new(MemoryOnRamp::new()),
            offramp: Arc::new(MemoryOffRamp::new(DEST)),
            token_prices: prices.clone(),
            gas_prices: prices,
        });

        let mut config = Config::new(OracleId(0), DEST);
        config.f_chain.insert(DEST, 1);
        config
            .oracle_info
            .insert(OracleId(0), OracleInfo::new([DEST], true));
        let sync = StaticConfigSync::new(config).unwrap();

        RoundDriver::new(Arc::new(plugin), Arc::new(sync))
    }

    #[tokio::test]
    async fn test_finish_before_observe_rejected() {
        let mut driver = driver();
        assert!(matches!(
            driver.finish(&[]).await,
            Err(PluginError::InvalidOperation(_))
        ));
    }

    #[tokio::test]
    async fn test_round_abandoned_without_quorum() {
        let mut driver = driver();
        let own = driver.observe().await.unwrap();
        assert_eq!(driver.phase(), RoundPhase::Observing);

        let result = driver.finish(&[own]).await.unwrap();
        assert_eq!(
            result,
            RoundResult::Abandoned {
                admitted: 1,
                needed: 3
            }
        );
        assert_eq!(driver.phase(), RoundPhase::Idle);
        assert_eq!(driver.previous_outcome(), &Outcome::default());
        assert_eq!(
            driver.trail(),
            &[RoundPhase::Idle, RoundPhase::Observing, RoundPhase::Validating, RoundPhase::Idle]
        );
    }

    #[tokio::test]
    async fn test_empty_round_is_suppressed() {
        let mut driver = driver();
        let own = driver.observe().await.unwrap();
        let observations = vec![own.clone(), own.clone(), own];

        let RoundResult::Completed(done) = driver.finish(&observations).await.unwrap() else {
            panic!("round should complete");
        };
        assert!(done.report.is_empty());
        assert!(!done.accepted);
        assert!(!done.transmit);
        assert_eq!(
            driver.trail(),
            &[
                RoundPhase::Idle,
                RoundPhase::Observing,
                RoundPhase::Validating,
                RoundPhase::Reducing,
                RoundPhase::ReportBuilding,
                RoundPhase::GateCheck,
                RoundPhase::Suppress,
                RoundPhase::Idle,
            ]
        );
        assert_eq!(driver.round(), 1);
    }

    #[tokio::test]
    async fn test_observe_twice_rejected() {
        let mut driver = driver();
        driver.observe().await.unwrap();
        assert!(driver.observe().await.is_err());
    }
}
