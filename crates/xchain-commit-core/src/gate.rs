//! Transmission gate.
//!
//! Both predicates are pure and never fail loudly: a rejected report is a
//! `false`, logged at `warn`.

use std::collections::BTreeMap;

use tracing::{info, warn};

use crate::config::Config;
use crate::error::GateError;
use crate::report::{decode_report, CommitReport};
use crate::types::{ChainSelector, SeqNum};

/// Structural and content checks on a report.
pub fn check_accept(report: &[u8]) -> Result<CommitReport, GateError> {
    if report.is_empty() {
        return Err(GateError::EmptyReport);
    }

    let decoded = decode_report(report).map_err(|e| GateError::Undecodable(e.to_string()))?;
    if decoded.commits.is_empty() {
        return Err(GateError::NoCommits);
    }

    let mut prev: Option<ChainSelector> = None;
    for commit in &decoded.commits {
        if prev.is_some_and(|p| p >= commit.chain) {
            return Err(GateError::UnsortedChains(commit.chain));
        }
        prev = Some(commit.chain);

        let interval = commit.interval;
        if interval.min == 0 || interval.min > interval.max {
            return Err(GateError::InvalidInterval {
                chain: commit.chain,
                min: interval.min,
                max: interval.max,
            });
        }
        if commit.root.is_zero() {
            return Err(GateError::ZeroRoot(commit.chain));
        }
    }

    for (token, price) in &decoded.token_prices {
        if *price == 0 {
            return Err(GateError::ZeroTokenPrice(token.clone()));
        }
    }
    for (chain, price) in &decoded.gas_prices {
        if *price == 0 {
            return Err(GateError::ZeroGasPrice(*chain));
        }
    }

    Ok(decoded)
}

/// Checks for relaying a report from the local oracle.
///
/// `onchain_next` maps each source chain to the next sequence number the
/// destination chain expects to be committed.
pub fn check_transmit(
    report: &[u8],
    config: &Config,
    onchain_next: &BTreeMap<ChainSelector, SeqNum>,
) -> Result<CommitReport, GateError> {
    let decoded = check_accept(report)?;

    if !config.is_writer(config.oracle) {
        return Err(GateError::NotWriter(config.oracle));
    }

    for commit in &decoded.commits {
        let Some(&expected) = onchain_next.get(&commit.chain) else {
            return Err(GateError::MissingOnchainSeqNum(commit.chain));
        };
        if commit.interval.min != expected {
            return Err(GateError::StaleInterval {
                chain: commit.chain,
                expected,
                min: commit.interval.min,
            });
        }
    }

    Ok(decoded)
}

pub fn should_accept(report: &[u8]) -> bool {
    match check_accept(report) {
        Ok(_) => true,
        Err(e) => {
            warn!(error = %e, "report not accepted");
            false
        }
    }
}

pub fn should_transmit(
    report: &[u8],
    config: &Config,
    onchain_next: &BTreeMap<ChainSelector, SeqNum>,
) -> bool {
    match check_transmit(report, config, onchain_next) {
        Ok(decoded) => {
            info!(oracle = %config.oracle, commits = decoded.commits.len(), "report cleared for transmission");
            true
        }
        Err(e) => {
            warn!(oracle = %config.oracle, error = %e, "report not transmitted");
            false
        }
    }
}
