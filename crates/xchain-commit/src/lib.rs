//! # Cross-Chain Commit
//!
//! The commit plugin for a network of observer nodes that agree, once per
//! round, on which cross-chain messages to commit and at what prices.
//!
//! ## Overview
//!
//! Each round every node:
//!
//! 1. Builds an [`Observation`] from its readers ([`ObservationBuilder`])
//! 2. Validates the observations its peers sent
//! 3. Reduces the admitted set to the next [`Outcome`]
//! 4. Serializes the outcome into a report
//! 5. Gates the report before transmitting it
//!
//! [`RoundDriver`] runs those steps as a state machine; [`CommitPlugin`]
//! exposes each step on its own for runtimes that drive rounds themselves.
//!
//! ## Usage
//!
//! ```rust,no_run
//! use std::sync::Arc;
//! use xchain_commit::{CommitPlugin, Readers, RoundDriver, RoundResult};
//! use xchain_commit::reader::{MemoryOffRamp, MemoryOnRamp, MemoryPriceReader, StaticConfigSync};
//! use xchain_commit::core::{ChainSelector, Config};
//!
//! async fn example(config: Config) {
//!     let prices = Arc::new(MemoryPriceReader::new());
//!     let plugin = CommitPlugin::new(Readers {
//!         onramp: Arc::new(MemoryOnRamp::new()),
//!         offramp: Arc::new(MemoryOffRamp::new(config.dest_chain)),
//!         token_prices: prices.clone(),
//!         gas_prices: prices,
//!     });
//!     let sync = StaticConfigSync::new(config).unwrap();
//!     let mut driver = RoundDriver::new(Arc::new(plugin), Arc::new(sync));
//!
//!     let own = driver.observe().await.unwrap();
//!     // ... gather peer observations through the transport ...
//!     let gathered = vec![own];
//!     match driver.finish(&gathered).await.unwrap() {
//!         RoundResult::Completed(round) => println!("transmit: {}", round.transmit),
//!         RoundResult::Abandoned { .. } => {}
//!     }
//! }
//! ```
//!
//! ## Re-exports
//!
//! - `xchain_commit::core` - Data model, reduction, report codec, gate
//! - `xchain_commit::reader` - Reader traits and in-memory readers

pub mod error;
pub mod observer;
pub mod plugin;
pub mod round;

pub use xchain_commit_core as core;
pub use xchain_commit_reader as reader;

pub use error::{PluginError, Result};
pub use observer::{ObservationBuilder, Readers};
pub use plugin::CommitPlugin;
pub use round::{CompletedRound, RoundDriver, RoundPhase, RoundResult};

pub use xchain_commit_core::{
    AttributedObservation, ChainSelector, Commit, Config, Interval, Observation, OracleId,
    Outcome,
};
