//! # Cross-Chain Commit Readers
//!
//! Interfaces to everything an observer reads: source chain messages,
//! destination chain commit progress, token and gas prices, and the config
//! snapshot. In-memory implementations are provided for tests and
//! simulation.
//!
//! ## Key Types
//!
//! - [`OnRampReader`] - Sent messages on a source chain
//! - [`OffRampReader`] - Commit progress on the destination chain
//! - [`TokenPriceReader`] / [`GasPriceReader`] - Price feeds
//! - [`ConfigSync`] - Source of config snapshots
//!
//! Every read is fallible. Callers decide how a failure degrades; the
//! observation builder omits the affected entry.

pub mod error;
pub mod memory;
pub mod traits;

pub use error::{ReaderError, Result};
pub use memory::{MemoryOffRamp, MemoryOnRamp, MemoryPriceReader, StaticConfigSync};
pub use traits::{
    ConfigSync, GasPriceReader, OffRampReader, OnRampReader, SourceMessage, TokenPriceReader,
};
