use crate::models::{BaseFeeTrend, InclusionCurvePoint, TxType, Urgency};
use crate::services::{
    congestion::detect_base_fee_trend,
    fee_estimator::{estimate_fee, FeeRequest, NEUTRAL_FAILURE_TOLERANCE},
    inclusion::{build_inclusion_curve, CurveParams},
};
use ethers::types::U256;

#[derive(Debug, Clone)]
pub struct ForecastInput<'a> {
    pub current_base_fee: U256,
    pub recent_priority_fees: &'a [U256],
    /// Newest first.
    pub recent_base_fees: &'a [U256],
    pub target_blocks: u32,
    pub steepness: f64,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Forecast {
    pub curve: Vec<InclusionCurvePoint>,
    pub forecast_horizon_blocks: u32,
    pub trend: BaseFeeTrend,
}

/// Inclusion curve for a representative medium-urgency quote.
pub fn build_forecast(input: &ForecastInput<'_>) -> Forecast {
    let quote = estimate_fee(&FeeRequest {
        urgency: Urgency::Medium,
        tx_type: TxType::Transfer,
        recent_failure_tolerance: NEUTRAL_FAILURE_TOLERANCE,
        current_base_fee: input.current_base_fee,
        recent_priority_fees: input.recent_priority_fees,
    });

    let curve = build_inclusion_curve(&CurveParams {
        max_fee: quote.recommended_max_fee,
        priority_fee: quote.priority_fee,
        current_base_fee: input.current_base_fee,
        recent_priority_fees: input.recent_priority_fees,
        target_blocks: input.target_blocks,
        steepness: input.steepness,
    });

    Forecast {
        curve,
        forecast_horizon_blocks: input.target_blocks,
        trend: detect_base_fee_trend(input.recent_base_fees),
    }
}
