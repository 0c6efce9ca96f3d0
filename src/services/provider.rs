use crate::error::ProviderError;
use crate::models::{wei, BlockSample, Chain, MempoolVisibility, RecentBlocks};
use async_trait::async_trait;
use chrono::Utc;
use ethers::types::U256;
use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::RwLock;

/// Upstream source of recent chain activity.
#[async_trait]
pub trait ChainDataProvider: Send + Sync {
    /// Most recent `count` blocks, newest first. May be empty.
    async fn get_recent_blocks(&self, chain: Chain, count: usize) -> Result<RecentBlocks, ProviderError>;

    async fn get_pending_tx_count(&self, chain: Chain) -> Result<u64, ProviderError>;

    fn mempool_visibility(&self, chain: Chain) -> MempoolVisibility;
}

#[derive(Debug, Clone)]
struct MockChain {
    blocks: Vec<BlockSample>,
    pending_tx_count: u64,
    visibility: MempoolVisibility,
    failure: Option<String>,
}

/// Deterministic in-memory provider. Serves synthetic history for every
/// chain unless overridden, and counts block fetches.
#[derive(Debug)]
pub struct MockChainDataProvider {
    chains: RwLock<HashMap<Chain, MockChain>>,
    block_fetches: AtomicUsize,
}

/// Typical base fee used to seed synthetic history.
fn typical_base_fee(chain: Chain) -> U256 {
    match chain {
        Chain::Ethereum => wei::gwei(30),
        Chain::Polygon => wei::gwei(45),
        Chain::Base => U256::from(50_000_000u64),
        Chain::Optimism => U256::from(60_000_000u64),
        Chain::Arbitrum => U256::from(10_000_000u64),
    }
}

fn typical_gas_limit(chain: Chain) -> U256 {
    match chain {
        Chain::Ethereum | Chain::Polygon => U256::from(30_000_000u64),
        Chain::Base | Chain::Optimism => U256::from(60_000_000u64),
        Chain::Arbitrum => U256::from(32_000_000u64),
    }
}

/// Synthetic newest-first history ending at `head_timestamp_ms`.
///
/// Base fees wobble within a few percent, utilization cycles between 35% and
/// 75%, and each block carries eight tips of roughly a tenth of the base fee.
pub fn synthetic_history(chain: Chain, count: usize, head_timestamp_ms: u64) -> Vec<BlockSample> {
    let config = chain.config();
    let base = typical_base_fee(chain);
    let gas_limit = typical_gas_limit(chain);
    let head_number = 19_000_000u64;

    (0..count as u64)
        .map(|i| {
            let wobble = 97 + (i * 3) % 7;
            let base_fee = base * U256::from(wobble) / U256::from(100u64);
            let utilization = 35 + (i * 13) % 41;
            let gas_used = gas_limit * U256::from(utilization) / U256::from(100u64);
            let tip_unit = (base / U256::from(40u64)).max(U256::one());
            let priority_fees = (1..=8u64)
                .map(|j| tip_unit * U256::from(j + i % 3))
                .collect();

            BlockSample {
                number: head_number - i,
                timestamp_ms: head_timestamp_ms.saturating_sub(i * config.block_time_ms),
                base_fee,
                gas_used,
                gas_limit,
                tx_count: 100 + i * 3,
                priority_fees,
            }
        })
        .collect()
}

fn default_visibility(chain: Chain) -> MempoolVisibility {
    match chain {
        Chain::Ethereum | Chain::Polygon => MempoolVisibility::Full,
        Chain::Base | Chain::Optimism | Chain::Arbitrum => MempoolVisibility::Partial,
    }
}

impl MockChainDataProvider {
    /// 64 synthetic blocks per chain, the newest stamped `head_timestamp_ms`.
    pub fn synthetic(head_timestamp_ms: u64) -> Self {
        let chains = Chain::ALL
            .iter()
            .map(|&chain| {
                let state = MockChain {
                    blocks: synthetic_history(chain, 64, head_timestamp_ms),
                    pending_tx_count: 1_200,
                    visibility: default_visibility(chain),
                    failure: None,
                };
                (chain, state)
            })
            .collect();

        Self {
            chains: RwLock::new(chains),
            block_fetches: AtomicUsize::new(0),
        }
    }

    /// Synthetic history whose newest block was produced just now.
    pub fn fresh() -> Self {
        Self::synthetic(Utc::now().timestamp_millis().max(0) as u64)
    }

    fn update(&self, chain: Chain, apply: impl FnOnce(&mut MockChain)) {
        let mut chains = self.chains.write().unwrap_or_else(|e| e.into_inner());
        if let Some(state) = chains.get_mut(&chain) {
            apply(state);
        }
    }

    pub fn with_blocks(self, chain: Chain, blocks: Vec<BlockSample>) -> Self {
        self.update(chain, |state| state.blocks = blocks);
        self
    }

    pub fn with_pending_tx_count(self, chain: Chain, count: u64) -> Self {
        self.update(chain, |state| state.pending_tx_count = count);
        self
    }

    pub fn with_visibility(self, chain: Chain, visibility: MempoolVisibility) -> Self {
        self.update(chain, |state| state.visibility = visibility);
        self
    }

    pub fn with_failure(self, chain: Chain, message: impl Into<String>) -> Self {
        let message = message.into();
        self.update(chain, |state| state.failure = Some(message));
        self
    }

    /// Replace a chain's history after construction.
    pub fn set_blocks(&self, chain: Chain, blocks: Vec<BlockSample>) {
        self.update(chain, |state| state.blocks = blocks);
    }

    pub fn block_fetches(&self) -> usize {
        self.block_fetches.load(Ordering::SeqCst)
    }

    fn state(&self, chain: Chain) -> Result<MockChain, ProviderError> {
        let chains = self.chains.read().unwrap_or_else(|e| e.into_inner());
        let state = chains
            .get(&chain)
            .cloned()
            .ok_or(ProviderError::ChainNotConfigured(chain))?;
        match &state.failure {
            Some(message) => Err(ProviderError::Unavailable(message.clone())),
            None => Ok(state),
        }
    }
}

#[async_trait]
impl ChainDataProvider for MockChainDataProvider {
    async fn get_recent_blocks(&self, chain: Chain, count: usize) -> Result<RecentBlocks, ProviderError> {
        self.block_fetches.fetch_add(1, Ordering::SeqCst);
        let state = self.state(chain)?;
        let samples = state.blocks.into_iter().take(count).collect();
        Ok(RecentBlocks::live(samples))
    }

    async fn get_pending_tx_count(&self, chain: Chain) -> Result<u64, ProviderError> {
        Ok(self.state(chain)?.pending_tx_count)
    }

    fn mempool_visibility(&self, chain: Chain) -> MempoolVisibility {
        self.chains
            .read()
            .unwrap_or_else(|e| e.into_inner())
            .get(&chain)
            .map(|state| state.visibility)
            .unwrap_or(MempoolVisibility::None)
    }
}
