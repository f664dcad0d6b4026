//! In-memory implementations of the reader traits.
//!
//! These are primarily for testing and local simulation. Each one can be
//! told to fail or stall per chain, which is how read degradation is
//! exercised.

use std::collections::{BTreeMap, BTreeSet};
use std::time::Duration;

use async_trait::async_trait;
use tokio::sync::RwLock;
use tracing::debug;
use xchain_commit_core::{ChainSelector, Config, Interval, Price, SeqNum};

use crate::error::{ReaderError, Result};
use crate::traits::{
    ConfigSync, GasPriceReader, OffRampReader, OnRampReader, SourceMessage, TokenPriceReader,
};

/// How long a stalled read hangs. Far beyond any sane read timeout.
const STALL: Duration = Duration::from_secs(3600);

/// Per-chain failure injection shared by the in-memory readers.
#[derive(Default)]
struct Faults {
    failing: BTreeSet<ChainSelector>,
    stalled: BTreeSet<ChainSelector>,
}

impl Faults {
    fn for_chain(&self, chain: ChainSelector) -> ChainFaults {
        ChainFaults {
            chain,
            stalled: self.stalled.contains(&chain),
            failing: self.failing.contains(&chain),
        }
    }
}

/// Faults of one chain, copied out so no lock is held while stalling.
#[derive(Clone, Copy)]
struct ChainFaults {
    chain: ChainSelector,
    stalled: bool,
    failing: bool,
}

impl ChainFaults {
    async fn apply(self) -> Result<()> {
        if self.stalled {
            tokio::time::sleep(STALL).await;
        }
        if self.failing {
            return Err(ReaderError::Rpc {
                chain: self.chain,
                reason: "injected failure".into(),
            });
        }
        Ok(())
    }
}

/// In-memory source chains.
#[derive(Default)]
pub struct MemoryOnRamp {
    messages: RwLock<BTreeMap<ChainSelector, BTreeMap<SeqNum, SourceMessage>>>,
    faults: RwLock<Faults>,
}

impl MemoryOnRamp {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a message, replacing any message at the same sequence number.
    pub async fn send(&self, chain: ChainSelector, message: SourceMessage) {
        self.messages
            .write()
            .await
            .entry(chain)
            .or_default()
            .insert(message.seq_num, message);
    }

    /// Make every read of `chain` fail.
    pub async fn fail_chain(&self, chain: ChainSelector) {
        self.faults.write().await.failing.insert(chain);
    }

    /// Make every read of `chain` hang.
    pub async fn stall_chain(&self, chain: ChainSelector) {
        self.faults.write().await.stalled.insert(chain);
    }

    /// Clear all injected faults.
    pub async fn heal(&self) {
        *self.faults.write().await = Faults::default();
    }
}

#[async_trait]
impl OnRampReader for MemoryOnRamp {
    async fn get_messages(
        &self,
        chain: ChainSelector,
        start: SeqNum,
        limit: usize,
    ) -> Result<Vec<SourceMessage>> {
        let faults = self.faults.read().await.for_chain(chain);
        faults.apply().await?;

        let messages = self.messages.read().await;
        let found: Vec<SourceMessage> = messages
            .get(&chain)
            .map(|msgs| msgs.range(start..).take(limit).map(|(_, m)| m.clone()).collect())
            .unwrap_or_default();

        debug!(chain = %chain, start, found = found.len(), "read messages");
        Ok(found)
    }
}

/// In-memory destination chain commit state.
pub struct MemoryOffRamp {
    dest_chain: ChainSelector,
    next: RwLock<BTreeMap<ChainSelector, SeqNum>>,
    failing: RwLock<bool>,
}

impl MemoryOffRamp {
    pub fn new(dest_chain: ChainSelector) -> Self {
        Self {
            dest_chain,
            next: RwLock::new(BTreeMap::new()),
            failing: RwLock::new(false),
        }
    }

    /// Set the next expected sequence number for a source chain.
    pub async fn set_next(&self, chain: ChainSelector, next: SeqNum) {
        self.next.write().await.insert(chain, next);
    }

    /// Apply a commit: the chain now expects `interval.max + 1`.
    pub async fn commit(&self, chain: ChainSelector, interval: Interval) {
        let mut next = self.next.write().await;
        let entry = next.entry(chain).or_insert(interval.min);
        *entry = (*entry).max(interval.max.saturating_add(1));
    }

    pub async fn set_failing(&self, failing: bool) {
        *self.failing.write().await = failing;
    }
}

#[async_trait]
impl OffRampReader for MemoryOffRamp {
    async fn next_seq_nums(
        &self,
        chains: &[ChainSelector],
    ) -> Result<BTreeMap<ChainSelector, SeqNum>> {
        if *self.failing.read().await {
            return Err(ReaderError::Rpc {
                chain: self.dest_chain,
                reason: "injected failure".into(),
            });
        }

        let next = self.next.read().await;
        Ok(chains
            .iter()
            .filter_map(|chain| next.get(chain).map(|seq_num| (*chain, *seq_num)))
            .collect())
    }
}

/// In-memory token and gas price feed.
#[derive(Default)]
pub struct MemoryPriceReader {
    token_prices: RwLock<BTreeMap<String, Price>>,
    gas_prices: RwLock<BTreeMap<ChainSelector, Price>>,
    failing: RwLock<bool>,
}

impl MemoryPriceReader {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn set_token_price(&self, token: impl Into<String>, price: Price) {
        self.token_prices.write().await.insert(token.into(), price);
    }

    pub async fn set_gas_price(&self, chain: ChainSelector, price: Price) {
        self.gas_prices.write().await.insert(chain, price);
    }

    pub async fn set_failing(&self, failing: bool) {
        *self.failing.write().await = failing;
    }

    async fn check(&self) -> Result<()> {
        if *self.failing.read().await {
            return Err(ReaderError::PriceSource("injected failure".into()));
        }
        Ok(())
    }
}

#[async_trait]
impl TokenPriceReader for MemoryPriceReader {
    async fn token_prices(&self, tokens: &[String]) -> Result<Vec<Price>> {
        self.check().await?;
        let prices = self.token_prices.read().await;
        Ok(tokens
            .iter()
            .map(|token| prices.get(token).copied().unwrap_or(0))
            .collect())
    }
}

#[async_trait]
impl GasPriceReader for MemoryPriceReader {
    async fn gas_prices(&self, chains: &[ChainSelector]) -> Result<BTreeMap<ChainSelector, Price>> {
        self.check().await?;
        let prices = self.gas_prices.read().await;
        Ok(chains
            .iter()
            .filter_map(|chain| prices.get(chain).map(|p| (*chain, *p)))
            .collect())
    }
}

/// A config source that hands out whatever snapshot it was last given.
pub struct StaticConfigSync {
    config: RwLock<Config>,
}

impl StaticConfigSync {
    /// Validates the snapshot before accepting it.
    pub fn new(config: Config) -> Result<Self> {
        config.validate()?;
        Ok(Self {
            config: RwLock::new(config),
        })
    }

    /// Replace the snapshot used from the next round on.
    pub async fn update(&self, config: Config) -> Result<()> {
        config.validate()?;
        *self.config.write().await = config;
        Ok(())
    }
}

#[async_trait]
impl ConfigSync for StaticConfigSync {
    async fn current(&self) -> Result<Config> {
        Ok(self.config.read().await.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use xchain_commit_core::{Bytes32, OracleId, OracleInfo};

    const C1: ChainSelector = ChainSelector(1);

    fn msg(seq_num: SeqNum) -> SourceMessage {
        SourceMessage::new(seq_num, Bytes32([seq_num as u8; 32]), vec![seq_num as u8])
    }

    #[tokio::test]
    async fn test_onramp_range_and_limit() {
        let onramp = MemoryOnRamp::new();
        for seq in 1..=10 {
            onramp.send(C1, msg(seq)).await;
        }

        let msgs = onramp.get_messages(C1, 4, 3).await.unwrap();
        let seqs: Vec<_> = msgs.iter().map(|m| m.seq_num).collect();
        assert_eq!(seqs, vec![4, 5, 6]);

        assert!(onramp.get_messages(ChainSelector(2), 1, 10).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_onramp_failure_injection() {
        let onramp = MemoryOnRamp::new();
        onramp.send(C1, msg(1)).await;
        onramp.fail_chain(C1).await;
        assert!(matches!(
            onramp.get_messages(C1, 1, 10).await,
            Err(ReaderError::Rpc { chain: C1, .. })
        ));

        onramp.heal().await;
        assert_eq!(onramp.get_messages(C1, 1, 10).await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_heal_not_blocked_by_stalled_read() {
        let onramp = std::sync::Arc::new(MemoryOnRamp::new());
        onramp.send(C1, msg(1)).await;
        onramp.stall_chain(C1).await;

        let reader = onramp.clone();
        let stalled = tokio::spawn(async move { reader.get_messages(C1, 1, 10).await });
        tokio::task::yield_now().await;

        tokio::time::timeout(Duration::from_secs(1), onramp.heal())
            .await
            .expect("heal blocked behind a stalled read");
        assert_eq!(onramp.get_messages(C1, 1, 10).await.unwrap().len(), 1);
        stalled.abort();
    }

    #[tokio::test]
    async fn test_offramp_commit_advances_next() {
        let offramp = MemoryOffRamp::new(ChainSelector(9));
        offramp.set_next(C1, 6).await;
        offramp.commit(C1, Interval::new(6, 9).unwrap()).await;

        let next = offramp.next_seq_nums(&[C1, ChainSelector(2)]).await.unwrap();
        assert_eq!(next.get(&C1), Some(&10));
        assert!(!next.contains_key(&ChainSelector(2)));

        let latest = offramp.latest_committed_seq_nums(&[C1]).await.unwrap();
        assert_eq!(latest.get(&C1), Some(&9));
    }

    #[tokio::test]
    async fn test_price_reader() {
        let prices = MemoryPriceReader::new();
        prices.set_token_price("0x1", 100).await;
        prices.set_gas_price(C1, 7).await;

        let tokens = prices
            .token_prices(&["0x1".to_string(), "0x2".to_string()])
            .await
            .unwrap();
        assert_eq!(tokens, vec![100, 0]);

        let gas = prices.gas_prices(&[C1, ChainSelector(2)]).await.unwrap();
        assert_eq!(gas.len(), 1);

        prices.set_failing(true).await;
        assert!(prices.gas_prices(&[C1]).await.is_err());
    }

    #[tokio::test]
    async fn test_static_config_sync_validates() {
        let mut config = Config::new(OracleId(0), C1);
        assert!(StaticConfigSync::new(config.clone()).is_err());

        config.f_chain.insert(C1, 1);
        config.oracle_info.insert(OracleId(0), OracleInfo::new([C1], true));
        let sync = StaticConfigSync::new(config.clone()).unwrap();
        assert_eq!(sync.current().await.unwrap(), config);

        config.max_merkle_leaves = 0;
        assert!(sync.update(config).await.is_err());
    }
}
