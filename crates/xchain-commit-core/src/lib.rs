//! # Cross-Chain Commit Core
//!
//! Pure primitives for the cross-chain commit protocol: the data model,
//! observation validation, outcome reduction, the report codec and the
//! transmission gate.
//!
//! This crate contains no I/O and no networking. Every function is a
//! deterministic computation over its arguments.
//!
//! ## Key Types
//!
//! - [`Observation`] - One node's view of the world for a round
//! - [`Outcome`] - The agreed result of a round
//! - [`Config`] - The per-round configuration snapshot
//! - [`CommitReport`] - Decoded form of a transmittable report
//!
//! ## Round Flow
//!
//! Observations are checked with [`validate_observation`], reduced with
//! [`reduce`], serialized with [`build_report`] and finally gated by
//! [`should_accept`] and [`should_transmit`].

pub mod canonical;
pub mod config;
pub mod consensus;
pub mod crypto;
pub mod error;
pub mod gate;
pub mod observation;
pub mod report;
pub mod types;
pub mod validation;

pub use config::{Config, OracleInfo};
pub use consensus::reduce;
pub use crypto::{Blake3MerkleBuilder, Blake3MessageHasher, MerkleBuilder, MessageHasher};
pub use error::{ConfigError, CoreError, GateError, ValidationError};
pub use gate::{should_accept, should_transmit};
pub use observation::{AttributedObservation, Observation, Outcome};
pub use report::{build_report, decode_report, ChainCommit, CommitReport};
pub use types::{
    Bytes32, ChainSelector, Commit, Interval, Message, MessageHash, MessageId, OracleId, Price,
    SeqNum,
};
pub use validation::{is_valid_observation, validate_observation};
