use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DataSource {
    Live,
    Cached,
    Fallback,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FreshnessMetadata {
    pub fetched_at: DateTime<Utc>,
    pub block_number: u64,
    pub block_age_ms: u64,
    pub stale: bool,
    pub data_source: DataSource,
}

/// Diagnostic trust score. Never feeds back into fee or probability math.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Confidence {
    pub score: f64,
    pub factors: Vec<String>,
}

/// Results that carry freshness metadata, so a cache hit can be re-labelled.
pub trait Annotated {
    fn freshness(&self) -> &FreshnessMetadata;
    fn freshness_mut(&mut self) -> &mut FreshnessMetadata;
}
