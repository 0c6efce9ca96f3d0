use crate::{
    error::ErrorResponse,
    models::{
        ApiResponse, Chain, CongestionReport, EstimateReport, ForecastReport, HealthStatus, TxType,
        Urgency,
    },
};
use anyhow::{bail, Context, Result};
use reqwest::Client;
use serde::de::DeserializeOwned;
use std::time::Duration;

/// Typed HTTP client for a running fee oracle.
pub struct OracleClient {
    http: Client,
    base_url: String,
}

impl OracleClient {
    pub fn new(base_url: impl Into<String>) -> Result<Self> {
        let http = Client::builder()
            .timeout(Duration::from_secs(10))
            .build()
            .context("Failed to build HTTP client")?;

        Ok(Self {
            http,
            base_url: base_url.into().trim_end_matches('/').to_string(),
        })
    }

    pub async fn estimate(
        &self,
        chain: Chain,
        urgency: Urgency,
        tx_type: TxType,
        recent_failure_tolerance: f64,
    ) -> Result<ApiResponse<EstimateReport>> {
        self.get(
            "/api/gas/estimate",
            &[
                ("chain", chain.to_string()),
                ("urgency", urgency.to_string()),
                ("tx_type", tx_type.to_string()),
                ("recent_failure_tolerance", recent_failure_tolerance.to_string()),
            ],
        )
        .await
    }

    pub async fn forecast(&self, chain: Chain, target_blocks: u32) -> Result<ApiResponse<ForecastReport>> {
        self.get(
            "/api/gas/forecast",
            &[
                ("chain", chain.to_string()),
                ("target_blocks", target_blocks.to_string()),
            ],
        )
        .await
    }

    pub async fn congestion(&self, chain: Chain) -> Result<ApiResponse<CongestionReport>> {
        self.get("/api/gas/congestion", &[("chain", chain.to_string())])
            .await
    }

    pub async fn health(&self) -> Result<HealthStatus> {
        self.get("/health", &[]).await
    }

    async fn get<T: DeserializeOwned>(&self, path: &str, query: &[(&str, String)]) -> Result<T> {
        let url = format!("{}{}", self.base_url, path);
        let response = self
            .http
            .get(&url)
            .query(query)
            .send()
            .await
            .with_context(|| format!("Request to {} failed", url))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            match serde_json::from_str::<ErrorResponse>(&body) {
                Ok(err) => bail!("{} returned {} ({}): {}", path, status, err.error_code, err.error),
                Err(_) => bail!("{} returned {}: {}", path, status, body),
            }
        }

        response
            .json()
            .await
            .with_context(|| format!("Invalid response body from {}", path))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{CongestionState, DataSource};
    use mockito::Matcher;

    const CONGESTION_BODY: &str = r#"{
        "success": true,
        "data": {
            "chain": "base",
            "congestion_state": "moderate",
            "gas_utilization_pct": 55.0,
            "pending_tx_count": 1200,
            "base_fee": "1000000",
            "base_fee_trend": "stable",
            "recommended_action": "proceed",
            "mempool_visibility": "partial",
            "freshness": {
                "fetched_at": "2026-01-01T00:00:00Z",
                "block_number": 100,
                "block_age_ms": 800,
                "stale": false,
                "data_source": "cached"
            },
            "confidence": { "score": 0.95, "factors": ["mempool:partial"] }
        },
        "timestamp": "2026-01-01T00:00:00Z",
        "cache_hit": true,
        "data_source": "base",
        "request_id": "req-1"
    }"#;

    #[tokio::test]
    async fn test_congestion_decodes_envelope() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("GET", "/api/gas/congestion")
            .match_query(Matcher::UrlEncoded("chain".into(), "base".into()))
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(CONGESTION_BODY)
            .create_async()
            .await;

        let client = OracleClient::new(server.url()).unwrap();
        let response = client.congestion(Chain::Base).await.unwrap();

        mock.assert_async().await;
        assert!(response.cache_hit);
        assert_eq!(response.data.chain, Chain::Base);
        assert_eq!(response.data.congestion.congestion_state, CongestionState::Moderate);
        assert_eq!(response.data.congestion.base_fee.as_u64(), 1_000_000);
        assert_eq!(response.data.freshness.data_source, DataSource::Cached);
    }

    #[tokio::test]
    async fn test_error_body_is_reported() {
        let mut server = mockito::Server::new_async().await;
        let _mock = server
            .mock("GET", "/api/gas/forecast")
            .match_query(Matcher::Any)
            .with_status(400)
            .with_header("content-type", "application/json")
            .with_body(
                r#"{"success":false,"error":"Invalid input: target_blocks must be between 1 and 100, got 500","error_code":"INVALID_INPUT","timestamp":"2026-01-01T00:00:00Z","request_id":"req-2"}"#,
            )
            .create_async()
            .await;

        let client = OracleClient::new(format!("{}/", server.url())).unwrap();
        let err = client.forecast(Chain::Ethereum, 500).await.unwrap_err();
        let message = err.to_string();
        assert!(message.contains("INVALID_INPUT"), "{}", message);
        assert!(message.contains("400"), "{}", message);
    }
}
