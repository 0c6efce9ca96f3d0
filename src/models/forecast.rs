use crate::models::{
    chain::Chain,
    freshness::{Annotated, Confidence, FreshnessMetadata},
    wei,
};
use ethers::types::U256;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BaseFeeTrend {
    Rising,
    Falling,
    Stable,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InclusionCurvePoint {
    #[serde(with = "wei::decimal")]
    pub max_fee: U256,
    #[serde(with = "wei::decimal")]
    pub priority_fee: U256,
    /// Probability of inclusion by `target_block`, cumulative.
    pub inclusion_probability: f64,
    pub target_block: u32,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ForecastReport {
    pub chain: Chain,
    pub curve: Vec<InclusionCurvePoint>,
    pub forecast_horizon_blocks: u32,
    pub trend: BaseFeeTrend,
    pub freshness: FreshnessMetadata,
    pub confidence: Confidence,
}

impl Annotated for ForecastReport {
    fn freshness(&self) -> &FreshnessMetadata {
        &self.freshness
    }

    fn freshness_mut(&mut self) -> &mut FreshnessMetadata {
        &mut self.freshness
    }
}
