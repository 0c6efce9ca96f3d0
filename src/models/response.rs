use crate::models::freshness::{Annotated, DataSource};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Serialize, Deserialize, Debug)]
pub struct ApiResponse<T> {
    pub success: bool,
    pub data: T,
    pub timestamp: DateTime<Utc>,
    pub cache_hit: bool,
    pub data_source: String,
    pub request_id: String,
}

impl<T: Annotated> ApiResponse<T> {
    pub fn from_report(data: T, data_source: impl Into<String>) -> Self {
        let cache_hit = data.freshness().data_source == DataSource::Cached;
        Self {
            success: true,
            data,
            timestamp: Utc::now(),
            cache_hit,
            data_source: data_source.into(),
            request_id: Uuid::new_v4().to_string(),
        }
    }
}

#[derive(Serialize, Deserialize, Debug)]
pub struct ChainHealth {
    pub chain: String,
    pub provider_ok: bool,
}

#[derive(Serialize, Deserialize, Debug)]
pub struct HealthStatus {
    pub status: String,
    pub version: String,
    pub chains: Vec<ChainHealth>,
    pub uptime_seconds: u64,
    pub timestamp: DateTime<Utc>,
}

#[derive(Serialize, Deserialize, Debug)]
pub struct Stats {
    pub total_requests: u64,
    pub estimate_requests: u64,
    pub forecast_requests: u64,
    pub congestion_requests: u64,
    pub failed_requests: u64,
    pub cache_hit_rate: f64,
    pub avg_response_time_ms: f64,
    pub uptime_seconds: u64,
}
