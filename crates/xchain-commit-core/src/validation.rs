//! Observation validation: eligibility and structural checks.
//!
//! A rejected observation is dropped from the quorum set. Rejection never
//! aborts the round.

use std::collections::BTreeSet;

use crate::config::Config;
use crate::error::ValidationError;
use crate::observation::Observation;
use crate::types::OracleId;

/// Validate an observation attributed to `oracle`.
///
/// This performs:
/// - Oracle lookup
/// - Destination chain eligibility
/// - Source chain eligibility
/// - Sequence number uniqueness per chain
/// - Message id and hash uniqueness across the whole observation
/// - Price checks
pub fn validate_observation(
    observation: &Observation,
    oracle: OracleId,
    config: &Config,
) -> Result<(), ValidationError> {
    // 1. Oracle must be known
    if !config.oracle_info.contains_key(&oracle) {
        return Err(ValidationError::UnknownOracle(oracle));
    }

    // 2. Only destination readers report committed sequence numbers
    if !observation.latest_committed_seq_nums.is_empty() && !config.supports_dest(oracle) {
        return Err(ValidationError::UnsupportedDestChain(oracle));
    }

    // 3. Messages: eligibility, ordering and uniqueness
    validate_messages(observation, oracle, config)?;

    // 4. Prices
    validate_prices(observation, config)?;

    Ok(())
}

/// Boolean form of [`validate_observation`].
pub fn is_valid_observation(observation: &Observation, oracle: OracleId, config: &Config) -> bool {
    validate_observation(observation, oracle, config).is_ok()
}

fn validate_messages(
    observation: &Observation,
    oracle: OracleId,
    config: &Config,
) -> Result<(), ValidationError> {
    let mut ids = BTreeSet::new();
    let mut hashes = BTreeSet::new();

    for (chain, msgs) in &observation.new_msgs {
        if msgs.is_empty() {
            continue;
        }
        if !config.supports(oracle, *chain) {
            return Err(ValidationError::UnsupportedChain {
                oracle,
                chain: *chain,
            });
        }

        let latest = observation.latest_committed_seq_nums.get(chain).copied();
        let mut seq_nums = BTreeSet::new();

        for msg in msgs {
            if !seq_nums.insert(msg.seq_num) {
                return Err(ValidationError::DuplicateSeqNum {
                    chain: *chain,
                    seq_num: msg.seq_num,
                });
            }
            if let Some(latest) = latest {
                if msg.seq_num <= latest {
                    return Err(ValidationError::StaleMessage {
                        chain: *chain,
                        seq_num: msg.seq_num,
                        latest,
                    });
                }
            }
            if !ids.insert(msg.id) {
                return Err(ValidationError::DuplicateMessageId(msg.id));
            }
            if !hashes.insert(msg.hash) {
                return Err(ValidationError::DuplicateMessageHash(msg.hash));
            }
        }
    }

    Ok(())
}

fn validate_prices(observation: &Observation, config: &Config) -> Result<(), ValidationError> {
    for (token, price) in &observation.token_prices {
        if !config.is_priced_token(token) {
            return Err(ValidationError::UnpricedToken(token.clone()));
        }
        if *price == 0 {
            return Err(ValidationError::ZeroTokenPrice(token.clone()));
        }
    }

    for (chain, price) in &observation.gas_prices {
        if *price == 0 {
            return Err(ValidationError::ZeroGasPrice(*chain));
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::OracleInfo;
    use crate::types::{Bytes32, ChainSelector, Message};

    const DEST: ChainSelector = ChainSelector(3);

    fn config() -> Config {
        let mut config = Config::new(OracleId(0), DEST);
        config.f_chain.insert(ChainSelector(1), 1);
        config.f_chain.insert(ChainSelector(2), 1);
        config.f_chain.insert(DEST, 1);
        config.oracle_info.insert(
            OracleId(0),
            OracleInfo::new([ChainSelector(1), ChainSelector(2), DEST], true),
        );
        config
            .oracle_info
            .insert(OracleId(1), OracleInfo::new([ChainSelector(1)], false));
        config.priced_tokens = vec!["0x1".into()];
        config
    }

    fn msg(seq_num: u64, id: u8, hash: u8) -> Message {
        Message::new(seq_num, Bytes32([id; 32]), Bytes32([hash; 32]))
    }

    #[test]
    fn test_empty_observation_is_valid() {
        assert!(validate_observation(&Observation::default(), OracleId(1), &config()).is_ok());
    }

    #[test]
    fn test_valid_full_observation() {
        let mut obs = Observation::default();
        obs.latest_committed_seq_nums.insert(ChainSelector(1), 10);
        obs.new_msgs
            .insert(ChainSelector(1), vec![msg(11, 1, 1), msg(12, 2, 2)]);
        obs.new_msgs.insert(ChainSelector(2), vec![msg(21, 3, 3)]);
        obs.token_prices.insert("0x1".into(), 100);
        obs.gas_prices.insert(ChainSelector(1), 7);
        obs.f_chain.insert(ChainSelector(1), 1);

        assert!(is_valid_observation(&obs, OracleId(0), &config()));
    }

    #[test]
    fn test_unknown_oracle() {
        let result = validate_observation(&Observation::default(), OracleId(9), &config());
        assert_eq!(result, Err(ValidationError::UnknownOracle(OracleId(9))));
    }

    #[test]
    fn test_unsupported_chain() {
        let mut obs = Observation::default();
        obs.new_msgs.insert(ChainSelector(2), vec![msg(21, 1, 1)]);

        let result = validate_observation(&obs, OracleId(1), &config());
        assert_eq!(
            result,
            Err(ValidationError::UnsupportedChain {
                oracle: OracleId(1),
                chain: ChainSelector(2)
            })
        );
    }

    #[test]
    fn test_dest_data_from_non_dest_oracle() {
        let mut obs = Observation::default();
        obs.latest_committed_seq_nums.insert(ChainSelector(1), 10);

        let result = validate_observation(&obs, OracleId(1), &config());
        assert_eq!(result, Err(ValidationError::UnsupportedDestChain(OracleId(1))));
    }

    #[test]
    fn test_duplicate_seq_num() {
        let mut obs = Observation::default();
        obs.new_msgs.insert(
            ChainSelector(1),
            vec![msg(12, 1, 1), msg(13, 2, 2), msg(14, 3, 3), msg(13, 4, 4)],
        );

        let result = validate_observation(&obs, OracleId(0), &config());
        assert_eq!(
            result,
            Err(ValidationError::DuplicateSeqNum {
                chain: ChainSelector(1),
                seq_num: 13
            })
        );
    }

    #[test]
    fn test_same_seq_num_on_different_chains_is_fine() {
        let mut obs = Observation::default();
        obs.new_msgs.insert(ChainSelector(1), vec![msg(12, 1, 1)]);
        obs.new_msgs.insert(ChainSelector(2), vec![msg(12, 2, 2)]);

        assert!(validate_observation(&obs, OracleId(0), &config()).is_ok());
    }

    #[test]
    fn test_duplicate_message_id_across_chains() {
        let mut obs = Observation::default();
        obs.new_msgs.insert(ChainSelector(1), vec![msg(12, 1, 1)]);
        obs.new_msgs.insert(ChainSelector(2), vec![msg(22, 1, 2)]);

        let result = validate_observation(&obs, OracleId(0), &config());
        assert_eq!(result, Err(ValidationError::DuplicateMessageId(Bytes32([1; 32]))));
    }

    #[test]
    fn test_duplicate_message_hash_across_chains() {
        let mut obs = Observation::default();
        obs.new_msgs.insert(ChainSelector(1), vec![msg(12, 1, 5)]);
        obs.new_msgs.insert(ChainSelector(2), vec![msg(22, 2, 5)]);

        let result = validate_observation(&obs, OracleId(0), &config());
        assert_eq!(
            result,
            Err(ValidationError::DuplicateMessageHash(Bytes32([5; 32])))
        );
    }

    #[test]
    fn test_message_at_or_below_reported_latest() {
        let mut obs = Observation::default();
        obs.latest_committed_seq_nums.insert(ChainSelector(1), 10);
        obs.new_msgs
            .insert(ChainSelector(1), vec![msg(12, 1, 1), msg(10, 2, 2)]);

        let result = validate_observation(&obs, OracleId(0), &config());
        assert!(matches!(result, Err(ValidationError::StaleMessage { seq_num: 10, .. })));
    }

    #[test]
    fn test_unpriced_token() {
        let mut obs = Observation::default();
        obs.token_prices.insert("0xdead".into(), 1);

        let result = validate_observation(&obs, OracleId(0), &config());
        assert_eq!(result, Err(ValidationError::UnpricedToken("0xdead".into())));
    }

    #[test]
    fn test_zero_prices() {
        let mut obs = Observation::default();
        obs.token_prices.insert("0x1".into(), 0);
        assert!(matches!(
            validate_observation(&obs, OracleId(0), &config()),
            Err(ValidationError::ZeroTokenPrice(_))
        ));

        let mut obs = Observation::default();
        obs.gas_prices.insert(ChainSelector(2), 0);
        assert_eq!(
            validate_observation(&obs, OracleId(0), &config()),
            Err(ValidationError::ZeroGasPrice(ChainSelector(2)))
        );
    }
}
