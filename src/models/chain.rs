use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// EVM chains the oracle quotes fees for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Chain {
    Ethereum,
    Base,
    Arbitrum,
    Optimism,
    Polygon,
}

/// Gas utilization boundaries (percent) between congestion states.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct CongestionThresholds {
    pub low_max: f64,
    pub moderate_max: f64,
    pub high_max: f64,
}

/// Static per-chain constants. Never mutated at runtime.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct ChainConfig {
    pub name: &'static str,
    pub block_time_ms: u64,
    pub cache_ttl_ms: u64,
    pub native_token_price_usd: f64,
    pub congestion_thresholds: CongestionThresholds,
}

const L1_THRESHOLDS: CongestionThresholds = CongestionThresholds {
    low_max: 50.0,
    moderate_max: 80.0,
    high_max: 95.0,
};

// Rollup blocks are sized generously, so sustained usage above 40% is already notable.
const ROLLUP_THRESHOLDS: CongestionThresholds = CongestionThresholds {
    low_max: 40.0,
    moderate_max: 70.0,
    high_max: 90.0,
};

const ETH_PRICE_USD: f64 = 3000.0;

impl Chain {
    pub const ALL: [Chain; 5] = [
        Chain::Ethereum,
        Chain::Base,
        Chain::Arbitrum,
        Chain::Optimism,
        Chain::Polygon,
    ];

    pub const fn config(self) -> ChainConfig {
        match self {
            Chain::Ethereum => ChainConfig {
                name: "ethereum",
                block_time_ms: 12_000,
                cache_ttl_ms: 12_000,
                native_token_price_usd: ETH_PRICE_USD,
                congestion_thresholds: L1_THRESHOLDS,
            },
            Chain::Base => ChainConfig {
                name: "base",
                block_time_ms: 2_000,
                cache_ttl_ms: 2_000,
                native_token_price_usd: ETH_PRICE_USD,
                congestion_thresholds: ROLLUP_THRESHOLDS,
            },
            Chain::Arbitrum => ChainConfig {
                name: "arbitrum",
                block_time_ms: 250,
                cache_ttl_ms: 1_000,
                native_token_price_usd: ETH_PRICE_USD,
                congestion_thresholds: ROLLUP_THRESHOLDS,
            },
            Chain::Optimism => ChainConfig {
                name: "optimism",
                block_time_ms: 2_000,
                cache_ttl_ms: 2_000,
                native_token_price_usd: ETH_PRICE_USD,
                congestion_thresholds: ROLLUP_THRESHOLDS,
            },
            Chain::Polygon => ChainConfig {
                name: "polygon",
                block_time_ms: 2_000,
                cache_ttl_ms: 2_000,
                native_token_price_usd: 0.70,
                congestion_thresholds: CongestionThresholds {
                    low_max: 50.0,
                    moderate_max: 75.0,
                    high_max: 90.0,
                },
            },
        }
    }

    pub const fn name(self) -> &'static str {
        self.config().name
    }

    /// Prefix used for `{PREFIX}_RPC_URL` style environment variables.
    pub fn env_prefix(self) -> String {
        self.name().to_uppercase()
    }
}

impl fmt::Display for Chain {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.pad(self.name())
    }
}

impl FromStr for Chain {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "ethereum" | "eth" | "mainnet" => Ok(Chain::Ethereum),
            "base" => Ok(Chain::Base),
            "arbitrum" | "arb" => Ok(Chain::Arbitrum),
            "optimism" | "op" => Ok(Chain::Optimism),
            "polygon" | "matic" => Ok(Chain::Polygon),
            other => Err(format!("unsupported chain: {}", other)),
        }
    }
}
