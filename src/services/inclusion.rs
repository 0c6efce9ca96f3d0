use crate::models::{wei, InclusionCurvePoint};
use crate::services::fee_estimator::project_base_fee;
use ethers::types::U256;

pub const DEFAULT_STEEPNESS: f64 = 4.0;

#[derive(Debug, Clone)]
pub struct CurveParams<'a> {
    pub max_fee: U256,
    pub priority_fee: U256,
    pub current_base_fee: U256,
    pub recent_priority_fees: &'a [U256],
    pub target_blocks: u32,
    pub steepness: f64,
}

/// Median of the pool, floored at 1 wei so it is always a safe divisor.
pub fn median_tip(recent_priority_fees: &[U256]) -> U256 {
    let mut sorted = recent_priority_fees.to_vec();
    sorted.sort_unstable();

    let len = sorted.len();
    let median = match len {
        0 => U256::zero(),
        _ if len % 2 == 1 => sorted[len / 2],
        _ => sorted[len / 2 - 1].saturating_add(sorted[len / 2]) / 2,
    };
    median.max(U256::one())
}

fn sigmoid_probability(
    max_fee: U256,
    current_base_fee: U256,
    median_tip: U256,
    target_block: u32,
    steepness: f64,
) -> f64 {
    let projected_base = project_base_fee(current_base_fee, target_block);
    if max_fee <= projected_base {
        return 0.0;
    }
    let effective_tip = max_fee - projected_base;

    let ratio = wei::to_f64(effective_tip) / wei::to_f64(median_tip);
    let p = 1.0 / (1.0 + (-steepness * (ratio - 1.0)).exp());
    if p.is_nan() {
        return 0.0;
    }
    p.clamp(0.0, 1.0)
}

/// Probability that a transaction capped at `max_fee` is included in the
/// block `target_block` blocks ahead.
pub fn inclusion_probability(
    max_fee: U256,
    current_base_fee: U256,
    recent_priority_fees: &[U256],
    target_block: u32,
    steepness: f64,
) -> f64 {
    sigmoid_probability(
        max_fee,
        current_base_fee,
        median_tip(recent_priority_fees),
        target_block,
        steepness,
    )
}

fn round3(value: f64) -> f64 {
    (value * 1000.0).round() / 1000.0
}

/// Cumulative "included by block N" curve for N in `1..=target_blocks`.
pub fn build_inclusion_curve(params: &CurveParams<'_>) -> Vec<InclusionCurvePoint> {
    let median = median_tip(params.recent_priority_fees);
    let mut miss = 1.0;

    (1..=params.target_blocks)
        .map(|target_block| {
            let p = sigmoid_probability(
                params.max_fee,
                params.current_base_fee,
                median,
                target_block,
                params.steepness,
            );
            miss *= 1.0 - p;
            InclusionCurvePoint {
                max_fee: params.max_fee,
                priority_fee: params.priority_fee,
                inclusion_probability: round3(1.0 - miss),
                target_block,
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::wei::gwei;

    fn pool() -> Vec<U256> {
        vec![gwei(1), gwei(2), gwei(2), gwei(3)]
    }

    #[test]
    fn test_median_tip() {
        assert_eq!(median_tip(&pool()), gwei(2));
        assert_eq!(median_tip(&[gwei(4), gwei(1), gwei(9)]), gwei(4));
        assert_eq!(median_tip(&[gwei(1), gwei(4)]), U256::from(2_500_000_000u64));
        assert_eq!(median_tip(&[]), U256::one());
        assert_eq!(median_tip(&[U256::zero(), U256::zero()]), U256::one());
    }

    #[test]
    fn test_fee_below_projected_base_is_zero() {
        // projected base for one block is 33.75 gwei
        let p = inclusion_probability(gwei(33), gwei(30), &pool(), 1, DEFAULT_STEEPNESS);
        assert_eq!(p, 0.0);
        assert_eq!(
            inclusion_probability(U256::zero(), U256::zero(), &pool(), 1, DEFAULT_STEEPNESS),
            0.0
        );
    }

    #[test]
    fn test_fee_below_base_near_max_is_zero() {
        let base = U256::MAX / 2;
        let p = inclusion_probability(base - 1, base, &[U256::one()], 1, DEFAULT_STEEPNESS);
        assert_eq!(p, 0.0);
    }

    #[test]
    fn test_tip_at_median_is_even_odds() {
        let max_fee = project_base_fee(gwei(30), 1) + gwei(2);
        let p = inclusion_probability(max_fee, gwei(30), &pool(), 1, DEFAULT_STEEPNESS);
        assert!((p - 0.5).abs() < 1e-12);
    }

    #[test]
    fn test_huge_fee_approaches_one() {
        let p = inclusion_probability(gwei(1_000_000), gwei(30), &pool(), 1, DEFAULT_STEEPNESS);
        assert!(p > 0.999_999);
        assert!(p <= 1.0);
    }

    #[test]
    fn test_degenerate_inputs_are_finite() {
        let zeros = vec![U256::zero(); 8];
        for max_fee in [U256::zero(), U256::one(), gwei(5), U256::MAX] {
            for target in 1..=5 {
                let p = inclusion_probability(max_fee, U256::zero(), &zeros, target, DEFAULT_STEEPNESS);
                assert!(p.is_finite());
                assert!((0.0..=1.0).contains(&p));
            }
        }
    }

    #[test]
    fn test_curve_is_monotonic_and_ordered() {
        let tips = pool();
        let curve = build_inclusion_curve(&CurveParams {
            max_fee: gwei(60),
            priority_fee: gwei(2),
            current_base_fee: gwei(30),
            recent_priority_fees: &tips,
            target_blocks: 20,
            steepness: DEFAULT_STEEPNESS,
        });

        assert_eq!(curve.len(), 20);
        for (i, point) in curve.iter().enumerate() {
            assert_eq!(point.target_block, i as u32 + 1);
            assert_eq!(point.max_fee, gwei(60));
            assert!((0.0..=1.0).contains(&point.inclusion_probability));
        }
        for pair in curve.windows(2) {
            assert!(pair[1].inclusion_probability >= pair[0].inclusion_probability);
        }
    }

    #[test]
    fn test_curve_converges_with_negligible_base_fee() {
        let tips = pool();
        let curve = build_inclusion_curve(&CurveParams {
            max_fee: gwei(2) + U256::one(),
            priority_fee: gwei(2),
            current_base_fee: U256::one(),
            recent_priority_fees: &tips,
            target_blocks: 50,
            steepness: DEFAULT_STEEPNESS,
        });
        assert!(curve[49].inclusion_probability >= 0.9);
    }

    #[test]
    fn test_curve_points_rounded_to_three_decimals() {
        let tips = pool();
        let curve = build_inclusion_curve(&CurveParams {
            max_fee: gwei(37),
            priority_fee: gwei(3),
            current_base_fee: gwei(30),
            recent_priority_fees: &tips,
            target_blocks: 5,
            steepness: DEFAULT_STEEPNESS,
        });
        for point in curve {
            let scaled = point.inclusion_probability * 1000.0;
            assert!((scaled - scaled.round()).abs() < 1e-9);
        }
    }

    #[test]
    fn test_zero_fee_curve_stays_at_zero() {
        let tips = pool();
        let curve = build_inclusion_curve(&CurveParams {
            max_fee: U256::zero(),
            priority_fee: U256::zero(),
            current_base_fee: gwei(30),
            recent_priority_fees: &tips,
            target_blocks: 10,
            steepness: DEFAULT_STEEPNESS,
        });
        assert!(curve.iter().all(|p| p.inclusion_probability == 0.0));
    }
}
