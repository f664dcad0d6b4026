//! Error types for the commit core.

use thiserror::Error;

use crate::types::{ChainSelector, MessageHash, MessageId, OracleId, SeqNum};

/// Errors from report encoding and decoding.
#[derive(Debug, Error)]
pub enum CoreError {
    #[error("malformed report: {0}")]
    MalformedReport(String),

    #[error("encoding error: {0}")]
    EncodingError(String),

    #[error("decoding error: {0}")]
    DecodingError(String),
}

/// Reasons a peer observation is excluded from the quorum set.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("oracle {0} is not configured")]
    UnknownOracle(OracleId),

    #[error("oracle {oracle} reported messages for unsupported chain {chain}")]
    UnsupportedChain { oracle: OracleId, chain: ChainSelector },

    #[error("oracle {0} reported destination chain data without reading the destination chain")]
    UnsupportedDestChain(OracleId),

    #[error("duplicate sequence number {seq_num} on chain {chain}")]
    DuplicateSeqNum { chain: ChainSelector, seq_num: SeqNum },

    #[error("duplicate message id {0}")]
    DuplicateMessageId(MessageId),

    #[error("duplicate message hash {0}")]
    DuplicateMessageHash(MessageHash),

    #[error("message {seq_num} on chain {chain} is not above the reported latest committed {latest}")]
    StaleMessage {
        chain: ChainSelector,
        seq_num: SeqNum,
        latest: SeqNum,
    },

    #[error("token {0} is not a priced token")]
    UnpricedToken(String),

    #[error("zero price for token {0}")]
    ZeroTokenPrice(String),

    #[error("zero gas price for chain {0}")]
    ZeroGasPrice(ChainSelector),
}

/// Configuration snapshot errors.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("destination chain {0} has no fault tolerance entry")]
    MissingDestFChain(ChainSelector),

    #[error("local oracle {0} has no oracle info")]
    UnknownOracle(OracleId),

    #[error("priced token {0} listed more than once")]
    DuplicateToken(String),

    #[error("{0} must be greater than zero")]
    ZeroLimit(&'static str),

    #[error("config parse error: {0}")]
    Parse(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Reasons the transmission gate refuses a report.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum GateError {
    #[error("empty report")]
    EmptyReport,

    #[error("undecodable report: {0}")]
    Undecodable(String),

    #[error("report has no commits")]
    NoCommits,

    #[error("commit chains are not strictly ascending at {0}")]
    UnsortedChains(ChainSelector),

    #[error("invalid interval [{min}, {max}] for chain {chain}")]
    InvalidInterval {
        chain: ChainSelector,
        min: SeqNum,
        max: SeqNum,
    },

    #[error("zero root for chain {0}")]
    ZeroRoot(ChainSelector),

    #[error("zero price for token {0}")]
    ZeroTokenPrice(String),

    #[error("zero gas price for chain {0}")]
    ZeroGasPrice(ChainSelector),

    #[error("oracle {0} is not a designated writer")]
    NotWriter(OracleId),

    #[error("no on-chain sequence number for chain {0}")]
    MissingOnchainSeqNum(ChainSelector),

    #[error("chain {chain} expects interval to start at {expected}, report starts at {min}")]
    StaleInterval {
        chain: ChainSelector,
        expected: SeqNum,
        min: SeqNum,
    },
}
