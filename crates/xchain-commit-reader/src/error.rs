//! Error types for collaborator reads.

use std::time::Duration;

use thiserror::Error;
use xchain_commit_core::{ChainSelector, ConfigError};

/// Errors that can occur while reading chain, price or config state.
#[derive(Debug, Error)]
pub enum ReaderError {
    /// A chain RPC call failed.
    #[error("rpc error on chain {chain}: {reason}")]
    Rpc { chain: ChainSelector, reason: String },

    /// A read did not complete within its timebox.
    #[error("read timed out after {0:?}")]
    Timeout(Duration),

    /// A price source answered with the wrong number of values.
    #[error("expected {expected} values, got {got}")]
    LengthMismatch { expected: usize, got: usize },

    /// A price source failed.
    #[error("price source error: {0}")]
    PriceSource(String),

    /// No usable configuration snapshot.
    #[error("config error: {0}")]
    Config(#[from] ConfigError),
}

/// Result type for reader operations.
pub type Result<T> = std::result::Result<T, ReaderError>;
