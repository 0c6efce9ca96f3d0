use crate::models::{
    wei, BaseFeeTrend, BlockSample, Chain, CongestionResult, CongestionState, MempoolVisibility,
    RecommendedAction,
};
use ethers::types::U256;

pub const TREND_WINDOW: usize = 20;
const RISING_RATIO: f64 = 1.05;
const FALLING_RATIO: f64 = 0.95;

/// Percentage of the gas limit used, to two decimals. Zero for a zero limit.
pub fn gas_utilization_pct(gas_used: U256, gas_limit: U256) -> f64 {
    if gas_limit.is_zero() {
        return 0.0;
    }
    let basis_points = gas_used.saturating_mul(U256::from(10_000u64)) / gas_limit;
    let basis_points = basis_points.min(U256::from(10_000u64)).low_u64();
    basis_points as f64 / 100.0
}

pub fn classify(chain: Chain, utilization_pct: f64) -> CongestionState {
    let thresholds = chain.config().congestion_thresholds;
    if utilization_pct < thresholds.low_max {
        CongestionState::Low
    } else if utilization_pct < thresholds.moderate_max {
        CongestionState::Moderate
    } else if utilization_pct < thresholds.high_max {
        CongestionState::High
    } else {
        CongestionState::Extreme
    }
}

/// EMA over `values` (oldest first), seeded with the oldest value.
pub fn exponential_moving_average(values: &[f64], window: usize) -> Option<f64> {
    let (first, rest) = values.split_first()?;
    let alpha = 2.0 / (window as f64 + 1.0);
    Some(rest.iter().fold(*first, |ema, v| alpha * v + (1.0 - alpha) * ema))
}

/// Compares the latest base fee with the EMA of the last `TREND_WINDOW`
/// samples. Input is newest first, as providers return it.
pub fn detect_base_fee_trend(recent_base_fees: &[U256]) -> BaseFeeTrend {
    if recent_base_fees.len() < 2 {
        return BaseFeeTrend::Stable;
    }

    let oldest_first: Vec<f64> = recent_base_fees
        .iter()
        .take(TREND_WINDOW)
        .rev()
        .map(|fee| wei::to_f64(*fee))
        .collect();
    let latest = wei::to_f64(recent_base_fees[0]);

    let Some(ema) = exponential_moving_average(&oldest_first, TREND_WINDOW) else {
        return BaseFeeTrend::Stable;
    };
    if ema <= 0.0 {
        return if latest > 0.0 {
            BaseFeeTrend::Rising
        } else {
            BaseFeeTrend::Stable
        };
    }

    let ratio = latest / ema;
    if ratio > RISING_RATIO {
        BaseFeeTrend::Rising
    } else if ratio < FALLING_RATIO {
        BaseFeeTrend::Falling
    } else {
        BaseFeeTrend::Stable
    }
}

#[derive(Debug, Clone)]
pub struct CongestionInput<'a> {
    pub chain: Chain,
    pub block: &'a BlockSample,
    pub recent_base_fees: &'a [U256],
    pub mempool_visibility: MempoolVisibility,
    pub pending_tx_count: Option<u64>,
}

pub fn detect_congestion(input: &CongestionInput<'_>) -> CongestionResult {
    let utilization = gas_utilization_pct(input.block.gas_used, input.block.gas_limit);
    let state = classify(input.chain, utilization);

    CongestionResult {
        congestion_state: state,
        gas_utilization_pct: utilization,
        pending_tx_count: input.pending_tx_count.unwrap_or(0),
        base_fee: input.block.base_fee,
        base_fee_trend: detect_base_fee_trend(input.recent_base_fees),
        recommended_action: RecommendedAction::from(state),
        mempool_visibility: input.mempool_visibility,
    }
}
