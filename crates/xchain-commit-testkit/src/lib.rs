//! # Cross-Chain Commit Testkit
//!
//! Testing utilities for the cross-chain commit crates.
//!
//! ## Overview
//!
//! This crate provides:
//!
//! - **Golden vectors**: Known outcomes with their expected report bytes
//! - **Generators**: Proptest strategies for property-based testing
//! - **Fixtures**: Deterministic messages, observation builders and a
//!   simulated multi-oracle network
//!
//! ## Golden Vectors
//!
//! ```rust
//! use xchain_commit_core::build_report;
//! use xchain_commit_testkit::vectors::verify_all_vectors;
//!
//! let failed = verify_all_vectors(|outcome| build_report(outcome).unwrap());
//! assert!(failed.is_empty(), "mismatched vectors: {failed:?}");
//! ```
//!
//! ## Property Testing
//!
//! ```rust,ignore
//! use proptest::prelude::*;
//! use xchain_commit_testkit::generators::reduce_scenario;
//!
//! proptest! {
//!     #[test]
//!     fn reduction_is_deterministic(scenario in reduce_scenario()) {
//!         // ...
//!     }
//! }
//! ```
//!
//! ## Test Fixtures
//!
//! ```rust
//! use xchain_commit_core::ChainSelector;
//! use xchain_commit_testkit::fixtures::ObservationFixture;
//!
//! let obs = ObservationFixture::new()
//!     .latest(ChainSelector(1), 10)
//!     .msgs(ChainSelector(1), 11..=13)
//!     .f_chain(ChainSelector(1), 1)
//!     .build();
//! assert_eq!(obs.msg_count(), 3);
//! ```

pub mod fixtures;
pub mod generators;
pub mod vectors;

pub use fixtures::{message, message_id, source_message, NetworkFixture, ObservationFixture};
pub use generators::{reduce_scenario, ReduceScenario};
pub use vectors::{all_vectors, verify_all_vectors, GoldenVector};
