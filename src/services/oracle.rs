use crate::{
    error::OracleError,
    models::{
        Annotated, Chain, Confidence, CongestionReport, DataSource, EstimateReport,
        ForecastReport, FreshnessMetadata, RecentBlocks, TxType, Urgency,
    },
    services::{
        cache::{OracleCache, QueryCache},
        congestion::{detect_congestion, CongestionInput},
        fee_estimator::{estimate_fee, FeeRequest},
        forecast::{build_forecast, ForecastInput},
        freshness::{build_freshness, compute_confidence, ConfidenceInputs, DEFAULT_STALE_THRESHOLD_MS},
        inclusion::DEFAULT_STEEPNESS,
        provider::ChainDataProvider,
    },
};
use chrono::Utc;
use std::future::Future;
use std::sync::Arc;

#[derive(Debug, Clone)]
pub struct OracleSettings {
    pub block_sample_count: usize,
    pub stale_threshold_ms: u64,
    pub inclusion_steepness: f64,
}

impl Default for OracleSettings {
    fn default() -> Self {
        Self {
            block_sample_count: 20,
            stale_threshold_ms: DEFAULT_STALE_THRESHOLD_MS,
            inclusion_steepness: DEFAULT_STEEPNESS,
        }
    }
}

/// Entry point for fee quotes, inclusion forecasts and congestion reports.
///
/// Pure computation over a provider snapshot, fronted by the injected cache.
/// Concurrent misses for one key may each compute; results are identical
/// replacements, so the last write wins harmlessly.
pub struct FeeOracle {
    provider: Arc<dyn ChainDataProvider>,
    cache: Arc<OracleCache>,
    settings: OracleSettings,
}

impl FeeOracle {
    pub fn new(provider: Arc<dyn ChainDataProvider>, cache: Arc<OracleCache>, settings: OracleSettings) -> Self {
        Self {
            provider,
            cache,
            settings,
        }
    }

    pub fn cache(&self) -> &Arc<OracleCache> {
        &self.cache
    }

    pub async fn estimate(
        &self,
        chain: Chain,
        urgency: Urgency,
        tx_type: TxType,
        recent_failure_tolerance: f64,
    ) -> Result<EstimateReport, OracleError> {
        let key = format!("estimate:{}:{}:{}:{}", chain, urgency, tx_type, recent_failure_tolerance);

        self.through_cache(&self.cache.estimates, chain, key, async {
            let window = self.fetch_window(chain).await?;
            let newest = &window.samples[0];
            let tips = window.pooled_priority_fees();

            let estimate = estimate_fee(&FeeRequest {
                urgency,
                tx_type,
                recent_failure_tolerance,
                current_base_fee: newest.base_fee,
                recent_priority_fees: &tips,
            });
            let config = chain.config();
            let cost_usd = estimate.cost_usd(tx_type.gas_units(), config.native_token_price_usd);

            tracing::info!(
                "{} estimate ({}, {}): max_fee={} wei, priority_fee={} wei, cost=${:.4}",
                chain,
                urgency,
                tx_type,
                estimate.recommended_max_fee,
                estimate.priority_fee,
                cost_usd
            );

            let (freshness, confidence) = self.annotate(chain, &window);
            Ok(EstimateReport {
                chain,
                urgency,
                tx_type,
                estimate,
                base_fee: newest.base_fee,
                target_blocks: urgency.target_blocks(),
                cost_usd,
                freshness,
                confidence,
            })
        })
        .await
    }

    pub async fn forecast(&self, chain: Chain, target_blocks: u32) -> Result<ForecastReport, OracleError> {
        let key = format!("forecast:{}:{}", chain, target_blocks);

        self.through_cache(&self.cache.forecasts, chain, key, async {
            let window = self.fetch_window(chain).await?;
            let tips = window.pooled_priority_fees();
            let base_fees = window.base_fees();

            let forecast = build_forecast(&ForecastInput {
                current_base_fee: window.samples[0].base_fee,
                recent_priority_fees: &tips,
                recent_base_fees: &base_fees,
                target_blocks,
                steepness: self.settings.inclusion_steepness,
            });

            tracing::info!(
                "{} forecast over {} blocks: trend={:?}, p(last)={:.3}",
                chain,
                target_blocks,
                forecast.trend,
                forecast.curve.last().map(|p| p.inclusion_probability).unwrap_or(0.0)
            );

            let (freshness, confidence) = self.annotate(chain, &window);
            Ok(ForecastReport {
                chain,
                curve: forecast.curve,
                forecast_horizon_blocks: forecast.forecast_horizon_blocks,
                trend: forecast.trend,
                freshness,
                confidence,
            })
        })
        .await
    }

    pub async fn congestion(&self, chain: Chain) -> Result<CongestionReport, OracleError> {
        let key = format!("congestion:{}", chain);

        self.through_cache(&self.cache.congestion, chain, key, async {
            let (window, pending_tx_count) = tokio::try_join!(self.fetch_window(chain), async {
                self.provider
                    .get_pending_tx_count(chain)
                    .await
                    .map_err(OracleError::from)
            })?;
            let base_fees = window.base_fees();

            let congestion = detect_congestion(&CongestionInput {
                chain,
                block: &window.samples[0],
                recent_base_fees: &base_fees,
                mempool_visibility: self.provider.mempool_visibility(chain),
                pending_tx_count: Some(pending_tx_count),
            });

            tracing::info!(
                "{} congestion: {:?} at {:.2}% utilization, trend={:?}",
                chain,
                congestion.congestion_state,
                congestion.gas_utilization_pct,
                congestion.base_fee_trend
            );

            let (freshness, confidence) = self.annotate(chain, &window);
            Ok(CongestionReport {
                chain,
                congestion,
                freshness,
                confidence,
            })
        })
        .await
    }

    /// Fetches a single block to confirm the provider can serve `chain`.
    pub async fn check_provider(&self, chain: Chain) -> Result<(), OracleError> {
        let window = self.provider.get_recent_blocks(chain, 1).await?;
        if window.samples.is_empty() {
            return Err(OracleError::NoBlockData { chain });
        }
        Ok(())
    }

    async fn through_cache<T, F>(
        &self,
        cache: &QueryCache<T>,
        chain: Chain,
        key: String,
        compute: F,
    ) -> Result<T, OracleError>
    where
        T: Annotated + Clone + Send + Sync + 'static,
        F: Future<Output = Result<T, OracleError>>,
    {
        if let Some(mut hit) = cache.get(&key).await {
            hit.freshness_mut().data_source = DataSource::Cached;
            return Ok(hit);
        }

        let report = compute.await?;
        cache.insert(key, chain, report.clone()).await;
        Ok(report)
    }

    async fn fetch_window(&self, chain: Chain) -> Result<RecentBlocks, OracleError> {
        let window = self
            .provider
            .get_recent_blocks(chain, self.settings.block_sample_count)
            .await?;
        if window.samples.is_empty() {
            tracing::warn!("Provider returned no blocks for {}", chain);
            return Err(OracleError::NoBlockData { chain });
        }
        Ok(window)
    }

    fn annotate(&self, chain: Chain, window: &RecentBlocks) -> (FreshnessMetadata, Confidence) {
        let newest = &window.samples[0];
        let freshness = build_freshness(
            newest.number,
            newest.timestamp_ms,
            Utc::now(),
            Some(self.settings.stale_threshold_ms),
            window.source,
        );
        let base_fees = window.base_fees();
        let confidence = compute_confidence(&ConfidenceInputs {
            sample_size: window.samples.len(),
            base_fees: &base_fees,
            block_age_ms: freshness.block_age_ms,
            mempool_visibility: self.provider.mempool_visibility(chain),
        });
        (freshness, confidence)
    }
}
