use crate::models::{
    block::MempoolVisibility,
    chain::Chain,
    forecast::BaseFeeTrend,
    freshness::{Annotated, Confidence, FreshnessMetadata},
    wei,
};
use ethers::types::U256;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CongestionState {
    Low,
    Moderate,
    High,
    Extreme,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RecommendedAction {
    Proceed,
    Wait,
    UrgentOnly,
}

impl From<CongestionState> for RecommendedAction {
    fn from(state: CongestionState) -> Self {
        match state {
            CongestionState::Low | CongestionState::Moderate => RecommendedAction::Proceed,
            CongestionState::High => RecommendedAction::Wait,
            CongestionState::Extreme => RecommendedAction::UrgentOnly,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CongestionResult {
    pub congestion_state: CongestionState,
    pub gas_utilization_pct: f64,
    pub pending_tx_count: u64,
    #[serde(with = "wei::decimal")]
    pub base_fee: U256,
    pub base_fee_trend: BaseFeeTrend,
    pub recommended_action: RecommendedAction,
    pub mempool_visibility: MempoolVisibility,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CongestionReport {
    pub chain: Chain,
    #[serde(flatten)]
    pub congestion: CongestionResult,
    pub freshness: FreshnessMetadata,
    pub confidence: Confidence,
}

impl Annotated for CongestionReport {
    fn freshness(&self) -> &FreshnessMetadata {
        &self.freshness
    }

    fn freshness_mut(&mut self) -> &mut FreshnessMetadata {
        &mut self.freshness
    }
}
