use crate::models::{wei, Confidence, DataSource, FreshnessMetadata, MempoolVisibility};
use chrono::{DateTime, Utc};
use ethers::types::U256;

pub const DEFAULT_STALE_THRESHOLD_MS: u64 = 30_000;

pub fn build_freshness(
    block_number: u64,
    block_timestamp_ms: u64,
    now: DateTime<Utc>,
    stale_threshold_ms: Option<u64>,
    data_source: DataSource,
) -> FreshnessMetadata {
    let now_ms = now.timestamp_millis().max(0) as u64;
    let block_age_ms = now_ms.saturating_sub(block_timestamp_ms);
    let threshold = stale_threshold_ms.unwrap_or(DEFAULT_STALE_THRESHOLD_MS);

    FreshnessMetadata {
        fetched_at: now,
        block_number,
        block_age_ms,
        stale: block_age_ms > threshold,
        data_source,
    }
}

#[derive(Debug, Clone)]
pub struct ConfidenceInputs<'a> {
    pub sample_size: usize,
    pub base_fees: &'a [U256],
    pub block_age_ms: u64,
    pub mempool_visibility: MempoolVisibility,
}

/// Population coefficient of variation; zero when the mean is zero.
pub fn coefficient_of_variation(values: &[U256]) -> f64 {
    if values.is_empty() {
        return 0.0;
    }
    let xs: Vec<f64> = values.iter().map(|v| wei::to_f64(*v)).collect();
    let n = xs.len() as f64;
    let mean = xs.iter().sum::<f64>() / n;
    if mean <= 0.0 {
        return 0.0;
    }
    let variance = xs.iter().map(|x| (x - mean).powi(2)).sum::<f64>() / n;
    variance.sqrt() / mean
}

pub fn compute_confidence(inputs: &ConfidenceInputs<'_>) -> Confidence {
    let mut score: f64 = 1.0;
    let mut factors = Vec::with_capacity(4);

    let (penalty, label) = match inputs.sample_size {
        n if n >= 20 => (0.0, "high"),
        n if n >= 10 => (0.10, "medium"),
        _ => (0.25, "low"),
    };
    score -= penalty;
    factors.push(format!("sample_size:{}", label));

    let cv = coefficient_of_variation(inputs.base_fees);
    let (penalty, label) = if cv < 0.1 {
        (0.0, "low")
    } else if cv < 0.3 {
        (0.10, "medium")
    } else {
        (0.25, "high")
    };
    score -= penalty;
    factors.push(format!("volatility:{}", label));

    let (penalty, label) = match inputs.block_age_ms {
        age if age < 5_000 => (0.0, "fresh"),
        age if age < 15_000 => (0.05, "recent"),
        _ => (0.15, "stale"),
    };
    score -= penalty;
    factors.push(format!("block_age:{}", label));

    let (penalty, label) = match inputs.mempool_visibility {
        MempoolVisibility::Full => (0.0, "full"),
        MempoolVisibility::Partial => (0.05, "partial"),
        MempoolVisibility::None => (0.10, "none"),
    };
    score -= penalty;
    factors.push(format!("mempool:{}", label));

    Confidence {
        score: (score.clamp(0.0, 1.0) * 100.0).round() / 100.0,
        factors,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::wei::gwei;
    use chrono::TimeZone;

    fn at(ms: i64) -> DateTime<Utc> {
        Utc.timestamp_millis_opt(ms).unwrap()
    }

    #[test]
    fn test_block_age_and_staleness() {
        let f = build_freshness(10, 1_000_000, at(1_012_000), None, DataSource::Live);
        assert_eq!(f.block_age_ms, 12_000);
        assert!(!f.stale);
        assert_eq!(f.block_number, 10);

        // exactly at the threshold is still fresh
        let f = build_freshness(10, 1_000_000, at(1_030_000), None, DataSource::Live);
        assert_eq!(f.block_age_ms, 30_000);
        assert!(!f.stale);

        let f = build_freshness(10, 1_000_000, at(1_030_001), None, DataSource::Live);
        assert!(f.stale);

        let f = build_freshness(10, 1_000_000, at(1_012_000), Some(10_000), DataSource::Fallback);
        assert!(f.stale);
        assert_eq!(f.data_source, DataSource::Fallback);
    }

    #[test]
    fn test_future_block_timestamp_floors_age() {
        let f = build_freshness(1, 2_000_000, at(1_000_000), None, DataSource::Live);
        assert_eq!(f.block_age_ms, 0);
        assert!(!f.stale);
    }

    #[test]
    fn test_confidence_perfect_inputs() {
        let fees = vec![gwei(30); 20];
        let c = compute_confidence(&ConfidenceInputs {
            sample_size: 20,
            base_fees: &fees,
            block_age_ms: 1_000,
            mempool_visibility: MempoolVisibility::Full,
        });
        assert_eq!(c.score, 1.0);
        assert_eq!(
            c.factors,
            vec!["sample_size:high", "volatility:low", "block_age:fresh", "mempool:full"]
        );
    }

    #[test]
    fn test_confidence_penalties_accumulate() {
        let fees = vec![gwei(10), gwei(50), gwei(10), gwei(50)];
        let c = compute_confidence(&ConfidenceInputs {
            sample_size: 4,
            base_fees: &fees,
            block_age_ms: 20_000,
            mempool_visibility: MempoolVisibility::None,
        });
        // 1 - 0.25 - 0.25 - 0.15 - 0.10
        assert_eq!(c.score, 0.25);
        assert!(c.factors.contains(&"volatility:high".to_string()));
        assert!(c.factors.contains(&"block_age:stale".to_string()));
    }

    #[test]
    fn test_confidence_medium_bands() {
        let fees: Vec<U256> = (0..12).map(|i| gwei(if i % 2 == 0 { 24 } else { 36 })).collect();
        let c = compute_confidence(&ConfidenceInputs {
            sample_size: 12,
            base_fees: &fees,
            block_age_ms: 6_000,
            mempool_visibility: MempoolVisibility::Partial,
        });
        // cv = 6 / 30 = 0.2 -> medium; 1 - 0.10 - 0.10 - 0.05 - 0.05
        assert_eq!(c.score, 0.7);
    }

    #[test]
    fn test_cv_degenerate() {
        assert_eq!(coefficient_of_variation(&[]), 0.0);
        assert_eq!(coefficient_of_variation(&[U256::zero(); 3]), 0.0);
    }
}
