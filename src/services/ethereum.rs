use crate::{
    config::RpcEndpoints,
    error::ProviderError,
    models::{BlockSample, Chain, DataSource, MempoolVisibility, RecentBlocks},
    services::provider::ChainDataProvider,
};
use anyhow::Result;
use async_trait::async_trait;
use ethers::{
    prelude::*,
    providers::{Http, Provider},
    types::{Block, BlockNumber, Transaction},
};
use futures::future::try_join_all;
use std::collections::HashMap;
use std::sync::Arc;

struct ChainProviders {
    primary: Arc<Provider<Http>>,
    fallback: Option<Arc<Provider<Http>>>,
}

/// JSON-RPC backed provider with an optional fallback endpoint per chain.
pub struct RpcChainDataProvider {
    chains: HashMap<Chain, ChainProviders>,
}

impl RpcChainDataProvider {
    pub async fn new(endpoints: &HashMap<Chain, RpcEndpoints>) -> Result<Self> {
        let mut chains = HashMap::new();

        for (&chain, urls) in endpoints {
            let primary = Arc::new(Provider::<Http>::try_from(urls.primary.as_str())?);
            let fallback = match &urls.fallback {
                Some(url) => Some(Arc::new(Provider::<Http>::try_from(url.as_str())?)),
                None => None,
            };

            // Test connection; a chain that is down at startup still gets served later
            match primary.get_block_number().await {
                Ok(block_number) => {
                    tracing::info!("{} RPC connected, current block: {}", chain, block_number)
                }
                Err(e) => tracing::warn!("{} RPC not reachable at startup: {}", chain, e),
            }

            chains.insert(chain, ChainProviders { primary, fallback });
        }

        Ok(Self { chains })
    }

    fn providers(&self, chain: Chain) -> Result<&ChainProviders, ProviderError> {
        self.chains
            .get(&chain)
            .ok_or(ProviderError::ChainNotConfigured(chain))
    }

    async fn get_block_number(&self, providers: &ChainProviders) -> Result<(u64, DataSource), ProviderError> {
        match providers.primary.get_block_number().await {
            Ok(num) => Ok((num.as_u64(), DataSource::Live)),
            Err(e) => match &providers.fallback {
                Some(fallback) => {
                    tracing::warn!("Primary RPC failed ({}), trying fallback", e);
                    let num = fallback.get_block_number().await?;
                    Ok((num.as_u64(), DataSource::Fallback))
                }
                None => Err(e.into()),
            },
        }
    }

    async fn get_block(
        &self,
        providers: &ChainProviders,
        block_number: u64,
    ) -> Result<(Option<Block<Transaction>>, DataSource), ProviderError> {
        match providers.primary.get_block_with_txs(block_number).await {
            Ok(block) => Ok((block, DataSource::Live)),
            Err(e) => match &providers.fallback {
                Some(fallback) => {
                    tracing::warn!("Primary RPC failed for block {} ({}), trying fallback", block_number, e);
                    let block = fallback.get_block_with_txs(block_number).await?;
                    Ok((block, DataSource::Fallback))
                }
                None => Err(e.into()),
            },
        }
    }
}

/// Tip a transaction actually pays above `base_fee`.
pub fn effective_priority_fee(tx: &Transaction, base_fee: U256) -> Option<U256> {
    match (tx.max_fee_per_gas, tx.max_priority_fee_per_gas) {
        (Some(max_fee), Some(max_priority)) => Some(max_priority.min(max_fee.saturating_sub(base_fee))),
        _ => tx.gas_price.map(|price| price.saturating_sub(base_fee)),
    }
}

pub fn block_to_sample(block: &Block<Transaction>) -> Result<BlockSample, ProviderError> {
    let number = block
        .number
        .ok_or_else(|| ProviderError::Malformed("block without number".to_string()))?
        .as_u64();
    let base_fee = block.base_fee_per_gas.unwrap_or_default();

    let priority_fees = block
        .transactions
        .iter()
        .filter_map(|tx| effective_priority_fee(tx, base_fee))
        .collect();

    Ok(BlockSample {
        number,
        timestamp_ms: block.timestamp.low_u64().saturating_mul(1000),
        base_fee,
        gas_used: block.gas_used,
        gas_limit: block.gas_limit,
        tx_count: block.transactions.len() as u64,
        priority_fees,
    })
}

#[async_trait]
impl ChainDataProvider for RpcChainDataProvider {
    async fn get_recent_blocks(&self, chain: Chain, count: usize) -> Result<RecentBlocks, ProviderError> {
        let providers = self.providers(chain)?;
        let (latest, head_source) = self.get_block_number(providers).await?;

        let numbers = (0..count as u64).map_while(|i| latest.checked_sub(i));
        let fetched = try_join_all(numbers.map(|n| self.get_block(providers, n))).await?;

        let mut source = head_source;
        let mut samples = Vec::with_capacity(fetched.len());
        for (block, block_source) in fetched {
            if block_source == DataSource::Fallback {
                source = DataSource::Fallback;
            }
            match block {
                Some(block) => samples.push(block_to_sample(&block)?),
                None => tracing::warn!("{} block missing while sampling below {}", chain, latest),
            }
        }

        tracing::debug!("Fetched {} {} blocks from {:?} source", samples.len(), chain, source);
        Ok(RecentBlocks { samples, source })
    }

    async fn get_pending_tx_count(&self, chain: Chain) -> Result<u64, ProviderError> {
        let providers = self.providers(chain)?;
        let pending = match providers.primary.get_block(BlockNumber::Pending).await {
            Ok(block) => block,
            Err(e) => match &providers.fallback {
                Some(fallback) => {
                    tracing::warn!("Primary RPC failed for pending block ({}), trying fallback", e);
                    fallback.get_block(BlockNumber::Pending).await?
                }
                None => return Err(e.into()),
            },
        };
        Ok(pending.map(|b| b.transactions.len() as u64).unwrap_or(0))
    }

    fn mempool_visibility(&self, chain: Chain) -> MempoolVisibility {
        if !self.chains.contains_key(&chain) {
            return MempoolVisibility::None;
        }
        match chain {
            // public mempool, but a single node only sees part of it
            Chain::Ethereum | Chain::Polygon => MempoolVisibility::Partial,
            // sequencer-ordered, no public mempool
            Chain::Base | Chain::Arbitrum | Chain::Optimism => MempoolVisibility::None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::wei::gwei;
    use ethers::types::U64;

    fn eip1559_tx(max_fee: U256, max_priority: U256) -> Transaction {
        Transaction {
            max_fee_per_gas: Some(max_fee),
            max_priority_fee_per_gas: Some(max_priority),
            ..Default::default()
        }
    }

    fn legacy_tx(gas_price: U256) -> Transaction {
        Transaction {
            gas_price: Some(gas_price),
            ..Default::default()
        }
    }

    #[test]
    fn test_effective_priority_fee() {
        let base = gwei(30);
        assert_eq!(effective_priority_fee(&eip1559_tx(gwei(50), gwei(2)), base), Some(gwei(2)));
        // cap leaves less headroom than the requested tip
        assert_eq!(effective_priority_fee(&eip1559_tx(gwei(31), gwei(2)), base), Some(gwei(1)));
        assert_eq!(effective_priority_fee(&legacy_tx(gwei(33)), base), Some(gwei(3)));
        assert_eq!(effective_priority_fee(&legacy_tx(gwei(20)), base), Some(U256::zero()));
        assert_eq!(effective_priority_fee(&Transaction::default(), base), None);
    }

    #[test]
    fn test_block_to_sample() {
        let block = Block::<Transaction> {
            number: Some(U64::from(18_000_000u64)),
            timestamp: U256::from(1_700_000_000u64),
            base_fee_per_gas: Some(gwei(30)),
            gas_used: U256::from(15_000_000u64),
            gas_limit: U256::from(30_000_000u64),
            transactions: vec![eip1559_tx(gwei(40), gwei(2)), legacy_tx(gwei(35))],
            ..Default::default()
        };

        let sample = block_to_sample(&block).unwrap();
        assert_eq!(sample.number, 18_000_000);
        assert_eq!(sample.timestamp_ms, 1_700_000_000_000);
        assert_eq!(sample.tx_count, 2);
        assert_eq!(sample.priority_fees, vec![gwei(2), gwei(5)]);
    }

    #[test]
    fn test_block_without_number_is_malformed() {
        let block = Block::<Transaction>::default();
        assert!(matches!(block_to_sample(&block), Err(ProviderError::Malformed(_))));
    }

    #[tokio::test]
    async fn test_unconfigured_chain_is_rejected() {
        let provider = RpcChainDataProvider::new(&HashMap::new()).await.unwrap();
        let err = provider.get_recent_blocks(Chain::Base, 5).await.unwrap_err();
        assert!(matches!(err, ProviderError::ChainNotConfigured(Chain::Base)));
        assert_eq!(provider.mempool_visibility(Chain::Base), MempoolVisibility::None);
    }
}
