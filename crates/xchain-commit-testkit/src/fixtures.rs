//! Test fixtures and helpers.
//!
//! Common setup code for unit and integration tests.

use std::sync::Arc;

use xchain_commit_core::{
    Blake3MessageHasher, Bytes32, ChainSelector, Config, Message, MessageHasher, Observation,
    OracleId, OracleInfo, Price, SeqNum,
};
use xchain_commit_reader::{MemoryOffRamp, MemoryOnRamp, MemoryPriceReader, SourceMessage};

/// Deterministic message id for `(chain, seq_num)`.
pub fn message_id(chain: ChainSelector, seq_num: SeqNum) -> Bytes32 {
    let mut id = [0u8; 32];
    id[..8].copy_from_slice(&chain.as_u64().to_be_bytes());
    id[8..16].copy_from_slice(&seq_num.to_be_bytes());
    Bytes32(id)
}

/// Deterministic payload for `(chain, seq_num)`.
pub fn payload(chain: ChainSelector, seq_num: SeqNum) -> Vec<u8> {
    format!("msg-{}-{}", chain.as_u64(), seq_num).into_bytes()
}

/// The source message the fixtures send for `(chain, seq_num)`.
pub fn source_message(chain: ChainSelector, seq_num: SeqNum) -> SourceMessage {
    SourceMessage::new(seq_num, message_id(chain, seq_num), payload(chain, seq_num))
}

/// The observed form of [`source_message`], hashed with the default hasher.
pub fn message(chain: ChainSelector, seq_num: SeqNum) -> Message {
    let id = message_id(chain, seq_num);
    let hash = Blake3MessageHasher.hash_message(chain, seq_num, &id, &payload(chain, seq_num));
    Message::new(seq_num, id, hash)
}

/// Builder for hand-written observations.
#[derive(Debug, Clone, Default)]
pub struct ObservationFixture {
    observation: Observation,
}

impl ObservationFixture {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn latest(mut self, chain: ChainSelector, seq_num: SeqNum) -> Self {
        self.observation
            .latest_committed_seq_nums
            .insert(chain, seq_num);
        self
    }

    /// Add fixture messages for each sequence number.
    pub fn msgs(mut self, chain: ChainSelector, seq_nums: impl IntoIterator<Item = SeqNum>) -> Self {
        let entry = self.observation.new_msgs.entry(chain).or_default();
        entry.extend(seq_nums.into_iter().map(|seq| message(chain, seq)));
        self
    }

    /// Add one message with an explicit hash.
    pub fn msg_with_hash(mut self, chain: ChainSelector, seq_num: SeqNum, hash: Bytes32) -> Self {
        self.observation
            .new_msgs
            .entry(chain)
            .or_default()
            .push(Message::new(seq_num, message_id(chain, seq_num), hash));
        self
    }

    pub fn f_chain(mut self, chain: ChainSelector, f: u32) -> Self {
        self.observation.f_chain.insert(chain, f);
        self
    }

    pub fn token_price(mut self, token: &str, price: Price) -> Self {
        self.observation.token_prices.insert(token.to_string(), price);
        self
    }

    pub fn gas_price(mut self, chain: ChainSelector, price: Price) -> Self {
        self.observation.gas_prices.insert(chain, price);
        self
    }

    pub fn build(self) -> Observation {
        self.observation
    }
}

/// A simulated network: shared in-memory chains and one config per oracle.
pub struct NetworkFixture {
    pub dest: ChainSelector,
    pub sources: Vec<ChainSelector>,
    pub onramp: Arc<MemoryOnRamp>,
    pub offramp: Arc<MemoryOffRamp>,
    pub prices: Arc<MemoryPriceReader>,
    configs: Vec<Config>,
}

impl NetworkFixture {
    /// `oracles` nodes that all read every chain and may all write.
    ///
    /// Every chain, including the destination, gets fault tolerance `f`,
    /// and the network as a whole tolerates `f` faulty oracles.
    pub fn new(oracles: u8, f: u32, sources: &[u64], dest: u64) -> Self {
        let dest = ChainSelector(dest);
        let sources: Vec<ChainSelector> = sources.iter().copied().map(ChainSelector).collect();

        let mut base = Config::new(OracleId(0), dest);
        base.f_role_don = f;
        base.f_chain.insert(dest, f);
        for chain in &sources {
            base.f_chain.insert(*chain, f);
        }
        let reads: Vec<ChainSelector> = sources.iter().copied().chain([dest]).collect();
        for i in 0..oracles {
            base.oracle_info
                .insert(OracleId(i), OracleInfo::new(reads.iter().copied(), true));
        }

        let configs = (0..oracles)
            .map(|i| {
                let mut config = base.clone();
                config.oracle = OracleId(i);
                config
            })
            .collect();

        Self {
            dest,
            sources,
            onramp: Arc::new(MemoryOnRamp::new()),
            offramp: Arc::new(MemoryOffRamp::new(dest)),
            prices: Arc::new(MemoryPriceReader::new()),
            configs,
        }
    }

    pub fn oracles(&self) -> usize {
        self.configs.len()
    }

    /// Config snapshot for one oracle.
    pub fn config(&self, oracle: u8) -> Config {
        self.configs[oracle as usize].clone()
    }

    /// Apply a change to every oracle's config.
    pub fn update_configs(&mut self, f: impl Fn(&mut Config)) {
        self.configs.iter_mut().for_each(f);
    }

    /// Send fixture messages on a source chain.
    pub async fn send(&self, chain: ChainSelector, seq_nums: impl IntoIterator<Item = SeqNum>) {
        for seq in seq_nums {
            self.onramp.send(chain, source_message(chain, seq)).await;
        }
    }
}
