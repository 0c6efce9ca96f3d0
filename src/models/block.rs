use crate::models::{freshness::DataSource, wei};
use ethers::types::U256;
use serde::{Deserialize, Serialize};

/// One historical block as seen by the estimation engine.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BlockSample {
    pub number: u64,
    pub timestamp_ms: u64,
    #[serde(with = "wei::decimal")]
    pub base_fee: U256,
    #[serde(with = "wei::decimal")]
    pub gas_used: U256,
    #[serde(with = "wei::decimal")]
    pub gas_limit: U256,
    pub tx_count: u64,
    #[serde(with = "wei::decimal_seq")]
    pub priority_fees: Vec<U256>,
}

/// Recent blocks for a chain, newest first, plus where they came from.
#[derive(Debug, Clone)]
pub struct RecentBlocks {
    pub samples: Vec<BlockSample>,
    pub source: DataSource,
}

impl RecentBlocks {
    pub fn live(samples: Vec<BlockSample>) -> Self {
        Self {
            samples,
            source: DataSource::Live,
        }
    }

    /// Base fees in provider order (newest first).
    pub fn base_fees(&self) -> Vec<U256> {
        self.samples.iter().map(|b| b.base_fee).collect()
    }

    /// Priority fees of every sampled block pooled together.
    pub fn pooled_priority_fees(&self) -> Vec<U256> {
        self.samples
            .iter()
            .flat_map(|b| b.priority_fees.iter().copied())
            .collect()
    }
}

/// How much of the pending transaction pool the upstream can observe.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MempoolVisibility {
    Full,
    Partial,
    None,
}
