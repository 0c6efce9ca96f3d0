use crate::{
    error::OracleError,
    models::{
        Annotated, ApiResponse, Chain, CongestionReport, EstimateReport, ForecastReport, TxType,
        Urgency,
    },
    services::{fee_estimator::NEUTRAL_FAILURE_TOLERANCE, Analytics, FeeOracle, Operation},
};
use axum::{
    extract::{Query, State},
    Json,
};
use serde::Deserialize;
use std::future::Future;
use std::sync::Arc;
use std::time::Instant;

pub const MAX_FORECAST_BLOCKS: u32 = 100;
const DEFAULT_FORECAST_BLOCKS: u32 = 10;

#[derive(Clone)]
pub struct AppState {
    pub oracle: Arc<FeeOracle>,
    pub analytics: Arc<Analytics>,
}

#[derive(Debug, Deserialize)]
pub struct EstimateQuery {
    pub chain: String,
    pub urgency: Option<String>,
    pub tx_type: Option<String>,
    pub recent_failure_tolerance: Option<f64>,
}

#[derive(Debug, Deserialize)]
pub struct ForecastQuery {
    pub chain: String,
    pub target_blocks: Option<u32>,
}

#[derive(Debug, Deserialize)]
pub struct ChainQuery {
    pub chain: String,
}

fn parse_chain(raw: &str) -> Result<Chain, OracleError> {
    raw.parse().map_err(OracleError::InvalidInput)
}

impl EstimateQuery {
    fn validate(&self) -> Result<(Chain, Urgency, TxType, f64), OracleError> {
        let chain = parse_chain(&self.chain)?;
        let urgency = match &self.urgency {
            Some(raw) => raw.parse().map_err(OracleError::InvalidInput)?,
            None => Urgency::Medium,
        };
        let tx_type = match &self.tx_type {
            Some(raw) => raw.parse().map_err(OracleError::InvalidInput)?,
            None => TxType::Transfer,
        };
        let tolerance = self
            .recent_failure_tolerance
            .unwrap_or(NEUTRAL_FAILURE_TOLERANCE);
        if !(0.0..=1.0).contains(&tolerance) {
            return Err(OracleError::InvalidInput(format!(
                "recent_failure_tolerance must be within [0, 1], got {}",
                tolerance
            )));
        }
        Ok((chain, urgency, tx_type, tolerance))
    }
}

impl ForecastQuery {
    fn validate(&self) -> Result<(Chain, u32), OracleError> {
        let chain = parse_chain(&self.chain)?;
        let target_blocks = self.target_blocks.unwrap_or(DEFAULT_FORECAST_BLOCKS);
        if !(1..=MAX_FORECAST_BLOCKS).contains(&target_blocks) {
            return Err(OracleError::InvalidInput(format!(
                "target_blocks must be between 1 and {}, got {}",
                MAX_FORECAST_BLOCKS, target_blocks
            )));
        }
        Ok((chain, target_blocks))
    }
}

/// Runs an oracle call, records it in analytics and wraps it in the response envelope.
async fn respond<T, F>(
    analytics: &Analytics,
    operation: Operation,
    chain: Chain,
    call: F,
) -> Result<Json<ApiResponse<T>>, OracleError>
where
    T: Annotated,
    F: Future<Output = Result<T, OracleError>>,
{
    let started = Instant::now();
    let result = call.await;
    analytics.record_request(operation, started.elapsed(), result.is_ok());

    let report = result?;
    Ok(Json(ApiResponse::from_report(report, chain.name())))
}

pub async fn get_estimate(
    State(state): State<AppState>,
    Query(query): Query<EstimateQuery>,
) -> Result<Json<ApiResponse<EstimateReport>>, OracleError> {
    let (chain, urgency, tx_type, tolerance) = query.validate()?;

    respond(
        &state.analytics,
        Operation::Estimate,
        chain,
        state.oracle.estimate(chain, urgency, tx_type, tolerance),
    )
    .await
}

pub async fn get_forecast(
    State(state): State<AppState>,
    Query(query): Query<ForecastQuery>,
) -> Result<Json<ApiResponse<ForecastReport>>, OracleError> {
    let (chain, target_blocks) = query.validate()?;

    respond(
        &state.analytics,
        Operation::Forecast,
        chain,
        state.oracle.forecast(chain, target_blocks),
    )
    .await
}

pub async fn get_congestion(
    State(state): State<AppState>,
    Query(query): Query<ChainQuery>,
) -> Result<Json<ApiResponse<CongestionReport>>, OracleError> {
    let chain = parse_chain(&query.chain)?;

    respond(
        &state.analytics,
        Operation::Congestion,
        chain,
        state.oracle.congestion(chain),
    )
    .await
}

#[cfg(test)]
mod tests {
    use super::*;

    fn estimate_query(tolerance: Option<f64>) -> EstimateQuery {
        EstimateQuery {
            chain: "eth".to_string(),
            urgency: None,
            tx_type: Some("swap".to_string()),
            recent_failure_tolerance: tolerance,
        }
    }

    #[test]
    fn test_estimate_defaults() {
        let (chain, urgency, tx_type, tolerance) = estimate_query(None).validate().unwrap();
        assert_eq!(chain, Chain::Ethereum);
        assert_eq!(urgency, Urgency::Medium);
        assert_eq!(tx_type, TxType::Swap);
        assert_eq!(tolerance, NEUTRAL_FAILURE_TOLERANCE);
    }

    #[test]
    fn test_tolerance_out_of_range() {
        assert!(matches!(
            estimate_query(Some(1.5)).validate(),
            Err(OracleError::InvalidInput(_))
        ));
        assert!(estimate_query(Some(f64::NAN)).validate().is_err());
    }

    #[test]
    fn test_forecast_bounds() {
        let query = |n| ForecastQuery {
            chain: "base".to_string(),
            target_blocks: Some(n),
        };
        assert!(query(0).validate().is_err());
        assert!(query(MAX_FORECAST_BLOCKS + 1).validate().is_err());
        assert_eq!(query(1).validate().unwrap(), (Chain::Base, 1));

        let default = ForecastQuery {
            chain: "base".to_string(),
            target_blocks: None,
        };
        assert_eq!(default.validate().unwrap().1, 10);
    }

    #[test]
    fn test_unknown_chain() {
        assert!(matches!(parse_chain("solana"), Err(OracleError::InvalidInput(_))));
    }
}
