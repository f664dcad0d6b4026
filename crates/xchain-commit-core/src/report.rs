//! Report construction and the report wire codec.
//!
//! A report is the canonical CBOR encoding of a map with integer keys:
//!
//! | key | contents                                            |
//! |-----|-----------------------------------------------------|
//! | 0   | commits: `[chain, min, max, root]`, ordered by chain |
//! | 1   | token prices: `[token, price]`, ordered by token     |
//! | 2   | gas prices: `[chain, price]`, ordered by chain       |
//!
//! Prices are 16-byte big-endian byte strings. An outcome with nothing to
//! report encodes to zero bytes.

use ciborium::value::Value;

use crate::canonical::{
    as_array, as_bytes32, as_u128, as_u64, decode_value, encode_canonical, map_get,
};
use crate::error::CoreError;
use crate::observation::Outcome;
use crate::types::{Bytes32, ChainSelector, Interval, Price};

mod keys {
    pub const COMMITS: u64 = 0;
    pub const TOKEN_PRICES: u64 = 1;
    pub const GAS_PRICES: u64 = 2;
}

/// One chain's entry in a report.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ChainCommit {
    pub chain: ChainSelector,
    pub interval: Interval,
    pub root: Bytes32,
}

/// Decoded form of a report.
///
/// Decoding does not enforce content rules; that is the gate's job.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CommitReport {
    pub commits: Vec<ChainCommit>,
    pub token_prices: Vec<(String, Price)>,
    pub gas_prices: Vec<(ChainSelector, Price)>,
}

impl CommitReport {
    /// Project an outcome onto its reportable parts.
    pub fn from_outcome(outcome: &Outcome) -> Self {
        Self {
            commits: outcome
                .commits
                .iter()
                .map(|(chain, commit)| ChainCommit {
                    chain: *chain,
                    interval: commit.interval,
                    root: commit.root,
                })
                .collect(),
            token_prices: outcome
                .token_prices
                .iter()
                .map(|(token, price)| (token.clone(), *price))
                .collect(),
            gas_prices: outcome
                .gas_prices
                .iter()
                .map(|(chain, price)| (*chain, *price))
                .collect(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.commits.is_empty() && self.token_prices.is_empty() && self.gas_prices.is_empty()
    }

    /// Encode to canonical bytes. An empty report is zero bytes.
    pub fn encode(&self) -> Result<Vec<u8>, CoreError> {
        if self.is_empty() {
            return Ok(Vec::new());
        }
        encode_canonical(&self.to_cbor_value())
    }

    /// Decode canonical bytes produced by [`CommitReport::encode`].
    ///
    /// Input that decodes but does not re-encode to the same bytes is
    /// rejected, so every report has exactly one byte representation.
    pub fn decode(bytes: &[u8]) -> Result<Self, CoreError> {
        if bytes.is_empty() {
            return Ok(Self::default());
        }

        let value = decode_value(bytes)?;
        let report = Self::from_cbor_value(&value)?;

        if report.encode()? != bytes {
            return Err(CoreError::MalformedReport("non-canonical encoding".into()));
        }
        Ok(report)
    }

    fn to_cbor_value(&self) -> Value {
        let commits = self
            .commits
            .iter()
            .map(|c| {
                Value::Array(vec![
                    Value::Integer(c.chain.as_u64().into()),
                    Value::Integer(c.interval.min.into()),
                    Value::Integer(c.interval.max.into()),
                    Value::Bytes(c.root.as_bytes().to_vec()),
                ])
            })
            .collect();

        let token_prices = self
            .token_prices
            .iter()
            .map(|(token, price)| {
                Value::Array(vec![Value::Text(token.clone()), price_value(*price)])
            })
            .collect();

        let gas_prices = self
            .gas_prices
            .iter()
            .map(|(chain, price)| {
                Value::Array(vec![Value::Integer(chain.as_u64().into()), price_value(*price)])
            })
            .collect();

        Value::Map(vec![
            (Value::Integer(keys::COMMITS.into()), Value::Array(commits)),
            (Value::Integer(keys::TOKEN_PRICES.into()), Value::Array(token_prices)),
            (Value::Integer(keys::GAS_PRICES.into()), Value::Array(gas_prices)),
        ])
    }

    fn from_cbor_value(value: &Value) -> Result<Self, CoreError> {
        let Value::Map(map) = value else {
            return Err(CoreError::MalformedReport("expected map".into()));
        };

        let mut report = Self::default();

        if let Some(commits) = map_get(map, keys::COMMITS) {
            for entry in as_array(commits, "commits")? {
                let [chain, min, max, root] = as_array(entry, "commit")? else {
                    return Err(CoreError::MalformedReport("commit: expected 4 fields".into()));
                };
                report.commits.push(ChainCommit {
                    chain: ChainSelector(as_u64(chain, "commit chain")?),
                    // Built directly so that inverted intervals survive
                    // decoding and are rejected by the gate.
                    interval: Interval {
                        min: as_u64(min, "commit min")?,
                        max: as_u64(max, "commit max")?,
                    },
                    root: as_bytes32(root, "commit root")?,
                });
            }
        }

        if let Some(prices) = map_get(map, keys::TOKEN_PRICES) {
            for entry in as_array(prices, "token prices")? {
                let [Value::Text(token), price] = as_array(entry, "token price")? else {
                    return Err(CoreError::MalformedReport("token price: expected [text, bytes]".into()));
                };
                report
                    .token_prices
                    .push((token.clone(), as_u128(price, "token price")?));
            }
        }

        if let Some(prices) = map_get(map, keys::GAS_PRICES) {
            for entry in as_array(prices, "gas prices")? {
                let [chain, price] = as_array(entry, "gas price")? else {
                    return Err(CoreError::MalformedReport("gas price: expected 2 fields".into()));
                };
                report.gas_prices.push((
                    ChainSelector(as_u64(chain, "gas price chain")?),
                    as_u128(price, "gas price")?,
                ));
            }
        }

        Ok(report)
    }
}

fn price_value(price: Price) -> Value {
    Value::Bytes(price.to_be_bytes().to_vec())
}

/// Serialize an outcome into a report.
pub fn build_report(outcome: &Outcome) -> Result<Vec<u8>, CoreError> {
    CommitReport::from_outcome(outcome).encode()
}

/// Parse report bytes.
pub fn decode_report(bytes: &[u8]) -> Result<CommitReport, CoreError> {
    CommitReport::decode(bytes)
}
