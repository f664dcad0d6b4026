//! Golden report vectors for deterministic verification.
//!
//! Every node must serialize the same outcome to the same bytes. These
//! vectors pin the report encoding so any change to it is caught.

use xchain_commit_core::{Bytes32, ChainSelector, Commit, Interval, Outcome, Price, SeqNum};

/// A golden report vector.
#[derive(Debug, Clone)]
pub struct GoldenVector {
    /// Human-readable name for the vector.
    pub name: &'static str,
    /// `(chain, min, max, root byte)` per commit.
    pub commits: &'static [(u64, SeqNum, SeqNum, u8)],
    pub token_prices: &'static [(&'static str, Price)],
    pub gas_prices: &'static [(u64, Price)],
    /// Expected report bytes (hex).
    pub expected_report: &'static str,
}

impl GoldenVector {
    /// The outcome this vector encodes.
    pub fn outcome(&self) -> Outcome {
        let mut outcome = Outcome::default();
        for &(chain, min, max, root) in self.commits {
            if let Some(interval) = Interval::new(min, max) {
                outcome.commits.insert(
                    ChainSelector(chain),
                    Commit {
                        interval,
                        root: Bytes32([root; 32]),
                    },
                );
            }
        }
        for &(token, price) in self.token_prices {
            outcome.token_prices.insert(token.to_string(), price);
        }
        for &(chain, price) in self.gas_prices {
            outcome.gas_prices.insert(ChainSelector(chain), price);
        }
        outcome
    }
}

/// Get all golden report vectors.
pub fn all_vectors() -> Vec<GoldenVector> {
    vec![
        GoldenVector {
            name: "empty outcome",
            commits: &[],
            token_prices: &[],
            gas_prices: &[],
            expected_report: "",
        },
        GoldenVector {
            name: "single commit, no prices",
            commits: &[(1, 1, 1, 0x11)],
            token_prices: &[],
            gas_prices: &[],
            expected_report: "a3008184010101582011111111111111111111111111111111111111111111111111111111111111110180\
                              0280",
        },
        GoldenVector {
            name: "two chains with prices",
            commits: &[
                (5009297550715157269, 100, 355, 0xbb),
                (1, 11, 13, 0xaa),
            ],
            token_prices: &[("0x2", 1_000_000_000_000_000_000), ("0x1", 5)],
            gas_prices: &[(5009297550715157269, 2000), (1, 30)],
            expected_report: "a3008284010b0d5820aaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaa\
                              841b45849994fc9c7b1518641901635820bbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbb\
                              01828263307831500000000000000000000000000000000058263307832500000000000000000de0b6b3a7640000\
                              02828201500000000000000000000000000000001e821b45849994fc9c7b1550000000000000000000000000000007d0",
        },
    ]
}

/// Check every vector against `encode`, returning the names that mismatch.
pub fn verify_all_vectors(encode: impl Fn(&Outcome) -> Vec<u8>) -> Vec<&'static str> {
    all_vectors()
        .into_iter()
        .filter(|v| hex::encode(encode(&v.outcome())) != v.expected_report)
        .map(|v| v.name)
        .collect()
}
