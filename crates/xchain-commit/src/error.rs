//! Error types for the commit plugin.

use thiserror::Error;
use xchain_commit_core::{ConfigError, CoreError};
use xchain_commit_reader::ReaderError;

/// Errors that can occur while driving a round.
#[derive(Debug, Error)]
pub enum PluginError {
    /// Reader error.
    #[error("reader error: {0}")]
    Reader(#[from] ReaderError),

    /// Config snapshot error.
    #[error("config error: {0}")]
    Config(#[from] ConfigError),

    /// Report codec error.
    #[error("report error: {0}")]
    Report(#[from] CoreError),

    /// Invalid operation for the current round phase.
    #[error("invalid operation: {0}")]
    InvalidOperation(String),
}

/// Result type for plugin operations.
pub type Result<T> = std::result::Result<T, PluginError>;
