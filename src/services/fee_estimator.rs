use crate::models::{wei, GasEstimate, TxType, Urgency};
use ethers::types::U256;

/// Failure tolerance at which the tip is taken unadjusted.
pub const NEUTRAL_FAILURE_TOLERANCE: f64 = 0.05;

const TOLERANCE_SLOPE: f64 = 4.0;

#[derive(Debug, Clone)]
pub struct FeeRequest<'a> {
    pub urgency: Urgency,
    pub tx_type: TxType,
    pub recent_failure_tolerance: f64,
    pub current_base_fee: U256,
    pub recent_priority_fees: &'a [U256],
}

/// `floor(fee * 9 / 8)` applied `blocks` times, saturating at `U256::MAX`.
pub fn project_base_fee(current_base_fee: U256, blocks: u32) -> U256 {
    let eight = U256::from(8u64);
    // floor(fee * 9 / 8) == fee + floor(fee / 8), without the overflowing product
    (0..blocks).fold(current_base_fee, |fee, _| fee.saturating_add(fee / eight))
}

/// Value at index `floor(percentile / 100 * len)`, clamped to the last element.
/// Zero for an empty pool.
pub fn percentile(fees: &[U256], percentile: u32) -> U256 {
    if fees.is_empty() {
        return U256::zero();
    }
    let mut sorted = fees.to_vec();
    sorted.sort_unstable();
    let index = (percentile as usize * sorted.len() / 100).min(sorted.len() - 1);
    sorted[index]
}

/// Lower tolerance for failure means paying a larger tip.
pub fn tolerance_multiplier(recent_failure_tolerance: f64) -> f64 {
    1.0 + (NEUTRAL_FAILURE_TOLERANCE - recent_failure_tolerance) * TOLERANCE_SLOPE
}

/// Scales the tip by the tolerance multiplier. Never below 1 wei.
pub fn adjust_tip(tip: U256, recent_failure_tolerance: f64) -> U256 {
    let multiplier = tolerance_multiplier(recent_failure_tolerance);
    let adjusted = wei::from_f64(wei::to_f64(tip) * multiplier);
    adjusted.max(U256::one())
}

pub fn estimate_fee(request: &FeeRequest<'_>) -> GasEstimate {
    let projected = project_base_fee(request.current_base_fee, request.urgency.target_blocks());
    let tip = percentile(request.recent_priority_fees, request.urgency.tip_percentile());
    let priority_fee = adjust_tip(tip, request.recent_failure_tolerance);

    tracing::debug!(
        urgency = %request.urgency,
        tx_type = %request.tx_type,
        projected_base = %projected,
        tip = %tip,
        priority_fee = %priority_fee,
        "Fee estimate computed"
    );

    GasEstimate {
        recommended_max_fee: projected.saturating_add(priority_fee),
        priority_fee,
    }
}
