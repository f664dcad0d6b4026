//! Reader traits: the abstract interface to chains, price feeds and config.
//!
//! The observation builder only ever talks to these traits, so the commit
//! logic is agnostic to the RPC stack behind them. In-memory implementations
//! live in [`crate::memory`].

use std::collections::BTreeMap;

use async_trait::async_trait;
use bytes::Bytes;
use xchain_commit_core::{ChainSelector, Config, MessageId, Price, SeqNum};

use crate::error::Result;

/// A message as read from a source chain, before hashing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceMessage {
    pub seq_num: SeqNum,
    pub id: MessageId,
    pub payload: Bytes,
}

impl SourceMessage {
    pub fn new(seq_num: SeqNum, id: MessageId, payload: impl Into<Bytes>) -> Self {
        Self {
            seq_num,
            id,
            payload: payload.into(),
        }
    }
}

/// Reads sent messages from source chains.
#[async_trait]
pub trait OnRampReader: Send + Sync {
    /// Messages on `chain` with `seq_num >= start`, ascending, at most `limit`.
    async fn get_messages(
        &self,
        chain: ChainSelector,
        start: SeqNum,
        limit: usize,
    ) -> Result<Vec<SourceMessage>>;
}

/// Reads commit progress from the destination chain.
#[async_trait]
pub trait OffRampReader: Send + Sync {
    /// Next sequence number the destination expects per source chain.
    ///
    /// Chains the destination knows nothing about are absent.
    async fn next_seq_nums(
        &self,
        chains: &[ChainSelector],
    ) -> Result<BTreeMap<ChainSelector, SeqNum>>;

    /// Latest committed sequence number per source chain.
    async fn latest_committed_seq_nums(
        &self,
        chains: &[ChainSelector],
    ) -> Result<BTreeMap<ChainSelector, SeqNum>> {
        let next = self.next_seq_nums(chains).await?;
        Ok(next
            .into_iter()
            .map(|(chain, seq_num)| (chain, seq_num.saturating_sub(1)))
            .collect())
    }
}

/// Reads token prices.
#[async_trait]
pub trait TokenPriceReader: Send + Sync {
    /// One price per requested token, in request order. Zero means unknown.
    async fn token_prices(&self, tokens: &[String]) -> Result<Vec<Price>>;
}

/// Reads gas prices.
#[async_trait]
pub trait GasPriceReader: Send + Sync {
    /// Prices for the requested chains. Chains without a price are absent.
    async fn gas_prices(&self, chains: &[ChainSelector]) -> Result<BTreeMap<ChainSelector, Price>>;
}

/// Hands out configuration snapshots.
#[async_trait]
pub trait ConfigSync: Send + Sync {
    /// The snapshot to use for the next round.
    async fn current(&self) -> Result<Config>;
}
