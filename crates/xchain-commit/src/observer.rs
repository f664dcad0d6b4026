//! Observation building.
//!
//! Every read is timeboxed on its own. A read that fails or times out drops
//! only its own entry from the observation; the rest is still reported.

use std::collections::BTreeMap;
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use tokio::task::JoinSet;
use tracing::{debug, warn};
use xchain_commit_core::{
    Blake3MessageHasher, ChainSelector, Config, Message, MessageHasher, Observation, Outcome,
    Price, SeqNum,
};
use xchain_commit_reader::{
    GasPriceReader, OffRampReader, OnRampReader, ReaderError, SourceMessage, TokenPriceReader,
};

/// The collaborators an observer reads from.
#[derive(Clone)]
pub struct Readers {
    pub onramp: Arc<dyn OnRampReader>,
    pub offramp: Arc<dyn OffRampReader>,
    pub token_prices: Arc<dyn TokenPriceReader>,
    pub gas_prices: Arc<dyn GasPriceReader>,
}

/// Builds the local node's observation for a round.
pub struct ObservationBuilder {
    readers: Readers,
    hasher: Arc<dyn MessageHasher>,
}

impl ObservationBuilder {
    /// Create a builder hashing messages with [`Blake3MessageHasher`].
    pub fn new(readers: Readers) -> Self {
        Self {
            readers,
            hasher: Arc::new(Blake3MessageHasher),
        }
    }

    pub fn with_hasher(mut self, hasher: Arc<dyn MessageHasher>) -> Self {
        self.hasher = hasher;
        self
    }

    pub fn readers(&self) -> &Readers {
        &self.readers
    }

    /// Build an observation on top of the previous round's outcome.
    pub async fn build(&self, previous: &Outcome, config: &Config) -> Observation {
        let timeout = config.read_timeout();
        let reads_dest = config.supports_dest(config.oracle);

        let starts = self.start_points(previous, config, reads_dest, timeout).await;

        let (new_msgs, token_prices, gas_prices) = tokio::join!(
            self.read_messages(&starts, config, timeout),
            self.read_token_prices(config, timeout),
            self.read_gas_prices(config, timeout),
        );

        let observation = Observation {
            latest_committed_seq_nums: if reads_dest { starts } else { BTreeMap::new() },
            new_msgs,
            token_prices,
            gas_prices,
            f_chain: config.f_chain.clone(),
        };

        debug!(
            oracle = %config.oracle,
            msgs = observation.msg_count(),
            token_prices = observation.token_prices.len(),
            gas_prices = observation.gas_prices.len(),
            "built observation"
        );
        observation
    }

    /// Latest committed sequence number to scan from, per source chain.
    ///
    /// Destination readers merge the previous outcome with what is on chain,
    /// taking the larger value. Everyone else relies on the previous outcome.
    async fn start_points(
        &self,
        previous: &Outcome,
        config: &Config,
        reads_dest: bool,
        timeout: Duration,
    ) -> BTreeMap<ChainSelector, SeqNum> {
        let chains: Vec<ChainSelector> = config.source_chains().collect();
        let mut starts: BTreeMap<ChainSelector, SeqNum> = chains
            .iter()
            .filter_map(|chain| previous.latest_committed(chain).map(|seq| (*chain, seq)))
            .collect();

        if !reads_dest {
            return starts;
        }

        match timed(timeout, self.readers.offramp.latest_committed_seq_nums(&chains)).await {
            Ok(onchain) => {
                for (chain, seq_num) in onchain {
                    let entry = starts.entry(chain).or_insert(seq_num);
                    *entry = (*entry).max(seq_num);
                }
            }
            Err(e) => {
                warn!(error = %e, "failed to read committed sequence numbers");
            }
        }
        starts
    }

    async fn read_messages(
        &self,
        starts: &BTreeMap<ChainSelector, SeqNum>,
        config: &Config,
        timeout: Duration,
    ) -> BTreeMap<ChainSelector, Vec<Message>> {
        let mut tasks = JoinSet::new();
        for chain in config.readable_source_chains() {
            let Some(&start) = starts.get(&chain) else {
                debug!(chain = %chain, "no known start point, skipping chain");
                continue;
            };
            let Some(first) = start.checked_add(1) else {
                debug!(chain = %chain, start, "sequence numbers exhausted, skipping chain");
                continue;
            };
            let onramp = Arc::clone(&self.readers.onramp);
            let limit = config.msg_scan_batch_size;
            tasks.spawn(async move {
                let result = timed(timeout, onramp.get_messages(chain, first, limit)).await;
                (chain, start, result)
            });
        }

        let mut new_msgs = BTreeMap::new();
        while let Some(joined) = tasks.join_next().await {
            let (chain, start, result) = match joined {
                Ok(done) => done,
                Err(e) => {
                    warn!(error = %e, "message read task failed");
                    continue;
                }
            };
            match result {
                Ok(msgs) => {
                    new_msgs.insert(chain, self.hash_messages(chain, start, msgs));
                }
                Err(e) => {
                    warn!(chain = %chain, error = %e, "failed to read messages");
                }
            }
        }
        new_msgs
    }

    fn hash_messages(
        &self,
        chain: ChainSelector,
        start: SeqNum,
        msgs: Vec<SourceMessage>,
    ) -> Vec<Message> {
        msgs.into_iter()
            .filter(|m| m.seq_num > start)
            .map(|m| {
                let hash = self.hasher.hash_message(chain, m.seq_num, &m.id, &m.payload);
                Message::new(m.seq_num, m.id, hash)
            })
            .collect()
    }

    async fn read_token_prices(&self, config: &Config, timeout: Duration) -> BTreeMap<String, Price> {
        if config.priced_tokens.is_empty() {
            return BTreeMap::new();
        }

        let prices = match timed(timeout, self.readers.token_prices.token_prices(&config.priced_tokens)).await {
            Ok(prices) if prices.len() == config.priced_tokens.len() => prices,
            Ok(prices) => {
                let e = ReaderError::LengthMismatch {
                    expected: config.priced_tokens.len(),
                    got: prices.len(),
                };
                warn!(error = %e, "discarding token prices");
                return BTreeMap::new();
            }
            Err(e) => {
                warn!(error = %e, "failed to read token prices");
                return BTreeMap::new();
            }
        };

        config
            .priced_tokens
            .iter()
            .zip(prices)
            .filter(|(_, price)| *price > 0)
            .map(|(token, price)| (token.clone(), price))
            .collect()
    }

    async fn read_gas_prices(
        &self,
        config: &Config,
        timeout: Duration,
    ) -> BTreeMap<ChainSelector, Price> {
        let chains = config.readable_source_chains();
        if chains.is_empty() {
            return BTreeMap::new();
        }

        match timed(timeout, self.readers.gas_prices.gas_prices(&chains)).await {
            Ok(prices) => prices
                .into_iter()
                .filter(|(chain, price)| *price > 0 && chains.contains(chain))
                .collect(),
            Err(e) => {
                warn!(error = %e, "failed to read gas prices");
                BTreeMap::new()
            }
        }
    }
}

/// Run a read under a timeout.
async fn timed<T>(
    timeout: Duration,
    read: impl Future<Output = xchain_commit_reader::Result<T>>,
) -> xchain_commit_reader::Result<T> {
    match tokio::time::timeout(timeout, read).await {
        Ok(result) => result,
        Err(_) => Err(ReaderError::Timeout(timeout)),
    }
}
