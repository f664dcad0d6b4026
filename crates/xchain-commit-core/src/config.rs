//! Per-round configuration snapshot.
//!
//! A [`Config`] is supplied externally (see the reader crate's `ConfigSync`)
//! and is read-only for the duration of a round. Each snapshot is validated
//! once with [`Config::validate`] before it is used.

use std::collections::{BTreeMap, BTreeSet};
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::ConfigError;
use crate::types::{ChainSelector, OracleId};

/// Default number of messages fetched per chain per round.
pub const DEFAULT_MSG_SCAN_BATCH_SIZE: usize = 256;

/// Default upper bound on leaves in one commitment.
pub const DEFAULT_MAX_MERKLE_LEAVES: usize = 256;

/// Default per-read timeout in milliseconds.
pub const DEFAULT_READ_TIMEOUT_MS: u64 = 5_000;

/// What an oracle is able to do.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct OracleInfo {
    /// Chains this oracle can read.
    #[serde(default)]
    pub reads: BTreeSet<ChainSelector>,
    /// Whether this oracle may transmit reports to the destination chain.
    #[serde(default)]
    pub writer: bool,
}

impl OracleInfo {
    pub fn new(reads: impl IntoIterator<Item = ChainSelector>, writer: bool) -> Self {
        Self {
            reads: reads.into_iter().collect(),
            writer,
        }
    }
}

/// Static per-round parameters.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Config {
    /// The local oracle.
    pub oracle: OracleId,
    /// The chain reports are committed to.
    pub dest_chain: ChainSelector,
    /// Maximum faulty observers per chain.
    pub f_chain: BTreeMap<ChainSelector, u32>,
    /// Capabilities of every oracle in the network.
    pub oracle_info: BTreeMap<OracleId, OracleInfo>,
    /// Tokens whose prices are observed and reported.
    #[serde(default)]
    pub priced_tokens: Vec<String>,
    /// Maximum faulty oracles in the network as a whole.
    #[serde(default = "default_f_role_don")]
    pub f_role_don: u32,
    #[serde(default = "default_msg_scan_batch_size")]
    pub msg_scan_batch_size: usize,
    #[serde(default = "default_max_merkle_leaves")]
    pub max_merkle_leaves: usize,
    #[serde(default = "default_read_timeout_ms")]
    pub read_timeout_ms: u64,
}

fn default_f_role_don() -> u32 {
    1
}

fn default_msg_scan_batch_size() -> usize {
    DEFAULT_MSG_SCAN_BATCH_SIZE
}

fn default_max_merkle_leaves() -> usize {
    DEFAULT_MAX_MERKLE_LEAVES
}

fn default_read_timeout_ms() -> u64 {
    DEFAULT_READ_TIMEOUT_MS
}

impl Config {
    /// Create a config with default limits.
    pub fn new(oracle: OracleId, dest_chain: ChainSelector) -> Self {
        Self {
            oracle,
            dest_chain,
            f_chain: BTreeMap::new(),
            oracle_info: BTreeMap::new(),
            priced_tokens: Vec::new(),
            f_role_don: default_f_role_don(),
            msg_scan_batch_size: DEFAULT_MSG_SCAN_BATCH_SIZE,
            max_merkle_leaves: DEFAULT_MAX_MERKLE_LEAVES,
            read_timeout_ms: DEFAULT_READ_TIMEOUT_MS,
        }
    }

    /// Parse a config from JSON.
    pub fn from_json(json: &str) -> Result<Self, ConfigError> {
        serde_json::from_str(json).map_err(|e| ConfigError::Parse(e.to_string()))
    }

    /// Load and validate a config from a JSON file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let raw = std::fs::read_to_string(path)?;
        let config = Self::from_json(&raw)?;
        config.validate()?;
        Ok(config)
    }

    /// Check the snapshot is internally consistent.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if !self.f_chain.contains_key(&self.dest_chain) {
            return Err(ConfigError::MissingDestFChain(self.dest_chain));
        }
        if !self.oracle_info.contains_key(&self.oracle) {
            return Err(ConfigError::UnknownOracle(self.oracle));
        }

        let mut seen = BTreeSet::new();
        for token in &self.priced_tokens {
            if !seen.insert(token.as_str()) {
                return Err(ConfigError::DuplicateToken(token.clone()));
            }
        }

        if self.msg_scan_batch_size == 0 {
            return Err(ConfigError::ZeroLimit("msg_scan_batch_size"));
        }
        if self.max_merkle_leaves == 0 {
            return Err(ConfigError::ZeroLimit("max_merkle_leaves"));
        }

        Ok(())
    }

    /// Whether `oracle` is configured to read `chain`.
    pub fn supports(&self, oracle: OracleId, chain: ChainSelector) -> bool {
        self.oracle_info
            .get(&oracle)
            .is_some_and(|info| info.reads.contains(&chain))
    }

    /// Whether `oracle` reads the destination chain.
    pub fn supports_dest(&self, oracle: OracleId) -> bool {
        self.supports(oracle, self.dest_chain)
    }

    /// Whether `oracle` is a designated writer for the destination chain.
    pub fn is_writer(&self, oracle: OracleId) -> bool {
        self.oracle_info
            .get(&oracle)
            .is_some_and(|info| info.writer && info.reads.contains(&self.dest_chain))
    }

    /// Chains messages are committed from: every chain with a fault
    /// tolerance entry except the destination.
    pub fn source_chains(&self) -> impl Iterator<Item = ChainSelector> + '_ {
        self.f_chain
            .keys()
            .copied()
            .filter(move |chain| *chain != self.dest_chain)
    }

    /// Source chains the local oracle can read.
    pub fn readable_source_chains(&self) -> Vec<ChainSelector> {
        self.source_chains()
            .filter(|chain| self.supports(self.oracle, *chain))
            .collect()
    }

    /// Whether `token` is in the priced token set.
    pub fn is_priced_token(&self, token: &str) -> bool {
        self.priced_tokens.iter().any(|t| t == token)
    }

    /// Admitted observations needed for a round to proceed.
    pub fn min_observations(&self) -> usize {
        2 * self.f_role_don as usize + 1
    }

    pub fn read_timeout(&self) -> std::time::Duration {
        std::time::Duration::from_millis(self.read_timeout_ms)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn sample_config() -> Config {
        let mut config = Config::new(OracleId(0), ChainSelector(3));
        config.f_chain.insert(ChainSelector(1), 1);
        config.f_chain.insert(ChainSelector(2), 1);
        config.f_chain.insert(ChainSelector(3), 1);
        config.oracle_info.insert(
            OracleId(0),
            OracleInfo::new([ChainSelector(1), ChainSelector(3)], true),
        );
        config.oracle_info.insert(
            OracleId(1),
            OracleInfo::new([ChainSelector(2)], false),
        );
        config.priced_tokens = vec!["0x1".into(), "0x2".into()];
        config
    }

    #[test]
    fn test_valid_config() {
        assert!(sample_config().validate().is_ok());
    }

    #[test]
    fn test_missing_dest_f_chain() {
        let mut config = sample_config();
        config.f_chain.remove(&ChainSelector(3));
        assert!(matches!(
            config.validate(),
            Err(ConfigError::MissingDestFChain(ChainSelector(3)))
        ));
    }

    #[test]
    fn test_unknown_local_oracle() {
        let mut config = sample_config();
        config.oracle = OracleId(9);
        assert!(matches!(
            config.validate(),
            Err(ConfigError::UnknownOracle(OracleId(9)))
        ));
    }

    #[test]
    fn test_duplicate_priced_token() {
        let mut config = sample_config();
        config.priced_tokens.push("0x1".into());
        assert!(matches!(config.validate(), Err(ConfigError::DuplicateToken(_))));
    }

    #[test]
    fn test_zero_batch_size() {
        let mut config = sample_config();
        config.msg_scan_batch_size = 0;
        assert!(matches!(config.validate(), Err(ConfigError::ZeroLimit(_))));
    }

    #[test]
    fn test_capabilities() {
        let config = sample_config();
        assert!(config.supports(OracleId(0), ChainSelector(1)));
        assert!(!config.supports(OracleId(0), ChainSelector(2)));
        assert!(!config.supports(OracleId(7), ChainSelector(1)));
        assert!(config.supports_dest(OracleId(0)));
        assert!(!config.supports_dest(OracleId(1)));
        assert!(config.is_writer(OracleId(0)));
        assert!(!config.is_writer(OracleId(1)));
        assert_eq!(
            config.source_chains().collect::<Vec<_>>(),
            vec![ChainSelector(1), ChainSelector(2)]
        );
        assert_eq!(config.readable_source_chains(), vec![ChainSelector(1)]);
        assert_eq!(config.min_observations(), 3);
    }

    #[test]
    fn test_from_json_applies_defaults() {
        let json = r#"{
            "oracle": 0,
            "dest_chain": 3,
            "f_chain": {"1": 1, "3": 1},
            "oracle_info": {"0": {"reads": [1, 3], "writer": true}}
        }"#;
        let config = Config::from_json(json).unwrap();
        assert_eq!(config.dest_chain, ChainSelector(3));
        assert_eq!(config.msg_scan_batch_size, DEFAULT_MSG_SCAN_BATCH_SIZE);
        assert_eq!(config.max_merkle_leaves, DEFAULT_MAX_MERKLE_LEAVES);
        assert_eq!(config.f_role_don, 1);
        assert!(config.priced_tokens.is_empty());
        assert!(config.is_writer(OracleId(0)));
    }

    #[test]
    fn test_from_json_malformed() {
        assert!(matches!(
            Config::from_json("{not json"),
            Err(ConfigError::Parse(_))
        ));
    }

    #[test]
    fn test_load_from_file() {
        let config = sample_config();
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(serde_json::to_string(&config).unwrap().as_bytes())
            .unwrap();

        let loaded = Config::load(file.path()).unwrap();
        assert_eq!(loaded, config);
    }

    #[test]
    fn test_load_rejects_invalid_snapshot() {
        let mut config = sample_config();
        config.max_merkle_leaves = 0;
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(serde_json::to_string(&config).unwrap().as_bytes())
            .unwrap();

        assert!(Config::load(file.path()).is_err());
    }
}
