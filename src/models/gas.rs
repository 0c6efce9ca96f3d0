use crate::models::{
    chain::Chain,
    freshness::{Annotated, Confidence, FreshnessMetadata},
    wei,
};
use ethers::types::U256;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Urgency {
    Low,
    Medium,
    High,
    Urgent,
}

impl Urgency {
    /// Number of blocks the base fee is projected forward.
    pub const fn target_blocks(self) -> u32 {
        match self {
            Urgency::Low => 10,
            Urgency::Medium => 5,
            Urgency::High => 3,
            Urgency::Urgent => 1,
        }
    }

    /// Percentile of recent priority fees used as the tip.
    pub const fn tip_percentile(self) -> u32 {
        match self {
            Urgency::Low => 50,
            Urgency::Medium => 70,
            Urgency::High => 90,
            Urgency::Urgent => 95,
        }
    }

    const fn as_str(self) -> &'static str {
        match self {
            Urgency::Low => "low",
            Urgency::Medium => "medium",
            Urgency::High => "high",
            Urgency::Urgent => "urgent",
        }
    }
}

impl fmt::Display for Urgency {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.pad(self.as_str())
    }
}

impl FromStr for Urgency {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "low" => Ok(Urgency::Low),
            "medium" => Ok(Urgency::Medium),
            "high" => Ok(Urgency::High),
            "urgent" => Ok(Urgency::Urgent),
            other => Err(format!("unknown urgency: {}", other)),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TxType {
    Transfer,
    Erc20Transfer,
    Swap,
    NftMint,
    ContractDeploy,
}

impl TxType {
    /// Representative gas units, used only for the USD cost figure.
    pub const fn gas_units(self) -> u64 {
        match self {
            TxType::Transfer => 21_000,
            TxType::Erc20Transfer => 65_000,
            TxType::Swap => 180_000,
            TxType::NftMint => 120_000,
            TxType::ContractDeploy => 1_500_000,
        }
    }

    const fn as_str(self) -> &'static str {
        match self {
            TxType::Transfer => "transfer",
            TxType::Erc20Transfer => "erc20_transfer",
            TxType::Swap => "swap",
            TxType::NftMint => "nft_mint",
            TxType::ContractDeploy => "contract_deploy",
        }
    }
}

impl fmt::Display for TxType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.pad(self.as_str())
    }
}

impl FromStr for TxType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().replace('-', "_").as_str() {
            "transfer" => Ok(TxType::Transfer),
            "erc20_transfer" | "token_transfer" => Ok(TxType::Erc20Transfer),
            "swap" => Ok(TxType::Swap),
            "nft_mint" | "mint" => Ok(TxType::NftMint),
            "contract_deploy" | "deploy" => Ok(TxType::ContractDeploy),
            other => Err(format!("unknown tx_type: {}", other)),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct GasEstimate {
    #[serde(with = "wei::decimal")]
    pub recommended_max_fee: U256,
    #[serde(with = "wei::decimal")]
    pub priority_fee: U256,
}

impl GasEstimate {
    /// Worst-case spend in USD for `gas_units` at the recommended max fee.
    pub fn cost_usd(&self, gas_units: u64, native_token_price_usd: f64) -> f64 {
        let native = wei::to_f64(self.recommended_max_fee) * gas_units as f64 / 1e18;
        let usd = native * native_token_price_usd;
        (usd * 1e6).round() / 1e6
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EstimateReport {
    pub chain: Chain,
    pub urgency: Urgency,
    pub tx_type: TxType,
    #[serde(flatten)]
    pub estimate: GasEstimate,
    #[serde(with = "wei::decimal")]
    pub base_fee: U256,
    pub target_blocks: u32,
    pub cost_usd: f64,
    pub freshness: FreshnessMetadata,
    pub confidence: Confidence,
}

impl Annotated for EstimateReport {
    fn freshness(&self) -> &FreshnessMetadata {
        &self.freshness
    }

    fn freshness_mut(&mut self) -> &mut FreshnessMetadata {
        &mut self.freshness
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display_honours_width() {
        assert_eq!(format!("[{:>6}]", Urgency::Low), "[   low]");
        assert_eq!(format!("[{:<10}]", TxType::Swap), "[swap      ]");
        assert_eq!(format!("[{:^9}]", Chain::Base), "[  base   ]");
    }

    #[test]
    fn test_calculate_transaction_cost() {
        let estimate = GasEstimate {
            recommended_max_fee: wei::gwei(50),
            priority_fee: wei::gwei(2),
        };
        // 50 gwei * 21000 = 0.00105 ETH
        assert_eq!(estimate.cost_usd(TxType::Transfer.gas_units(), 3000.0), 3.15);
    }

    #[test]
    fn test_urgency_tables_are_monotonic() {
        let levels = [Urgency::Low, Urgency::Medium, Urgency::High, Urgency::Urgent];
        for pair in levels.windows(2) {
            assert!(pair[0].target_blocks() > pair[1].target_blocks());
            assert!(pair[0].tip_percentile() < pair[1].tip_percentile());
        }
    }

    #[test]
    fn test_tx_type_parsing() {
        assert_eq!("erc20-transfer".parse::<TxType>().unwrap(), TxType::Erc20Transfer);
        assert_eq!(TxType::NftMint.to_string(), "nft_mint");
        assert!("bridge".parse::<TxType>().is_err());
        assert_eq!("URGENT".parse::<Urgency>().unwrap(), Urgency::Urgent);
    }
}
