use crate::models::{Chain, CongestionReport, EstimateReport, ForecastReport};
use chrono::Utc;
use moka::future::Cache;
use moka::ops::compute::Op;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;

/// Hard ceiling on entry lifetime, regardless of chain TTL.
const MAX_ENTRY_LIFETIME: Duration = Duration::from_secs(300);

#[derive(Debug, Default)]
pub struct CacheMetrics {
    hits: AtomicU64,
    misses: AtomicU64,
}

impl CacheMetrics {
    pub fn record_hit(&self) {
        self.hits.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_miss(&self) {
        self.misses.fetch_add(1, Ordering::Relaxed);
    }

    pub fn hits(&self) -> u64 {
        self.hits.load(Ordering::Relaxed)
    }

    pub fn misses(&self) -> u64 {
        self.misses.load(Ordering::Relaxed)
    }

    /// Hit rate in 0.0-1.0, zero before any lookup.
    pub fn hit_rate(&self) -> f64 {
        let total = self.hits() + self.misses();
        if total == 0 {
            return 0.0;
        }
        self.hits() as f64 / total as f64
    }
}

/// Immutable once inserted; an update is always a whole replacement.
#[derive(Debug, Clone)]
pub struct CacheEntry<T> {
    pub data: T,
    pub timestamp_ms: i64,
    pub chain: Chain,
}

/// TTL cache keyed by the full request parameter tuple.
///
/// The TTL is read from the entry's chain config at lookup time, so entries
/// expire by wall-clock age even if a deployment changes the chain's TTL.
pub struct QueryCache<T> {
    entries: Cache<String, CacheEntry<T>>,
    metrics: Arc<CacheMetrics>,
}

impl<T> QueryCache<T>
where
    T: Clone + Send + Sync + 'static,
{
    pub fn new(max_capacity: u64, metrics: Arc<CacheMetrics>) -> Self {
        let entries = Cache::builder()
            .max_capacity(max_capacity)
            .time_to_live(MAX_ENTRY_LIFETIME)
            .build();
        Self { entries, metrics }
    }

    pub async fn get(&self, key: &str) -> Option<T> {
        self.get_at(key, Utc::now().timestamp_millis()).await
    }

    pub async fn get_at(&self, key: &str, now_ms: i64) -> Option<T> {
        let Some(entry) = self.entries.get(key).await else {
            self.metrics.record_miss();
            tracing::debug!("Cache miss for key: {}", key);
            return None;
        };

        let ttl_ms = entry.chain.config().cache_ttl_ms as i64;
        if now_ms.saturating_sub(entry.timestamp_ms) >= ttl_ms {
            self.evict_if_unchanged(key, entry.timestamp_ms).await;
            self.metrics.record_miss();
            tracing::debug!("Cache entry expired for key: {}", key);
            return None;
        }

        self.metrics.record_hit();
        tracing::debug!("Cache hit for key: {}", key);
        Some(entry.data)
    }

    // A concurrent insert may already have replaced the expired entry.
    async fn evict_if_unchanged(&self, key: &str, expired_timestamp_ms: i64) {
        self.entries
            .entry(key.to_string())
            .and_compute_with(|current| {
                let op = match current {
                    Some(current) if current.value().timestamp_ms == expired_timestamp_ms => Op::Remove,
                    _ => Op::Nop,
                };
                std::future::ready(op)
            })
            .await;
    }

    pub async fn insert(&self, key: String, chain: Chain, data: T) {
        self.insert_at(key, chain, data, Utc::now().timestamp_millis()).await;
    }

    pub async fn insert_at(&self, key: String, chain: Chain, data: T, now_ms: i64) {
        let entry = CacheEntry {
            data,
            timestamp_ms: now_ms,
            chain,
        };
        self.entries.insert(key, entry).await;
    }

    /// Entries inserted before this call are never returned afterwards.
    pub fn clear(&self) {
        self.entries.invalidate_all();
    }
}

/// Handle over every query cache the oracle uses, shared by injection.
pub struct OracleCache {
    pub estimates: QueryCache<EstimateReport>,
    pub forecasts: QueryCache<ForecastReport>,
    pub congestion: QueryCache<CongestionReport>,
    metrics: Arc<CacheMetrics>,
}

impl OracleCache {
    pub fn new(max_capacity: u64) -> Self {
        let metrics = Arc::new(CacheMetrics::default());
        tracing::info!("Query cache initialized (capacity {} per operation)", max_capacity);
        Self {
            estimates: QueryCache::new(max_capacity, metrics.clone()),
            forecasts: QueryCache::new(max_capacity, metrics.clone()),
            congestion: QueryCache::new(max_capacity, metrics.clone()),
            metrics,
        }
    }

    pub fn metrics(&self) -> &CacheMetrics {
        &self.metrics
    }

    pub fn clear(&self) {
        self.estimates.clear();
        self.forecasts.clear();
        self.congestion.clear();
        tracing::info!("Query cache cleared");
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn cache() -> QueryCache<u32> {
        QueryCache::new(100, Arc::new(CacheMetrics::default()))
    }

    #[tokio::test]
    async fn test_cache_hit_miss() {
        let cache = cache();

        assert!(cache.get_at("forecast:base:10", 0).await.is_none());
        assert_eq!(cache.metrics.misses(), 1);

        cache.insert_at("forecast:base:10".into(), Chain::Base, 42, 0).await;
        assert_eq!(cache.get_at("forecast:base:10", 500).await, Some(42));
        assert_eq!(cache.metrics.hits(), 1);
        assert_eq!(cache.metrics.hit_rate(), 0.5);
    }

    #[tokio::test]
    async fn test_ttl_comes_from_chain_config() {
        let cache = cache();
        cache.insert_at("congestion:ethereum".into(), Chain::Ethereum, 1, 0).await;
        cache.insert_at("congestion:arbitrum".into(), Chain::Arbitrum, 2, 0).await;

        // arbitrum TTL is 1s, ethereum 12s
        assert_eq!(cache.get_at("congestion:arbitrum", 999).await, Some(2));
        assert_eq!(cache.get_at("congestion:arbitrum", 1_000).await, None);
        assert_eq!(cache.get_at("congestion:ethereum", 11_999).await, Some(1));
        assert_eq!(cache.get_at("congestion:ethereum", 12_000).await, None);

        // expired entries are evicted, not resurrected by a clock going backwards
        assert_eq!(cache.get_at("congestion:ethereum", 0).await, None);
    }

    #[tokio::test]
    async fn test_expiry_keeps_a_newer_replacement() {
        let cache = cache();
        cache.insert_at("congestion:base".into(), Chain::Base, 1, 0).await;
        // another request refreshed the slot after this reader saw the old entry
        cache.insert_at("congestion:base".into(), Chain::Base, 2, 4_000).await;

        cache.evict_if_unchanged("congestion:base", 0).await;
        assert_eq!(cache.get_at("congestion:base", 4_500).await, Some(2));

        cache.evict_if_unchanged("congestion:base", 4_000).await;
        assert_eq!(cache.get_at("congestion:base", 4_500).await, None);
    }

    #[tokio::test]
    async fn test_insert_replaces_whole_entry() {
        let cache = cache();
        cache.insert_at("k".into(), Chain::Base, 1, 0).await;
        cache.insert_at("k".into(), Chain::Base, 2, 1_500).await;
        assert_eq!(cache.get_at("k", 3_000).await, Some(2));
    }

    #[tokio::test]
    async fn test_clear_empties_everything() {
        let oracle_cache = OracleCache::new(100);
        let cache = cache();
        for i in 0..10u32 {
            cache.insert_at(format!("k{}", i), Chain::Polygon, i, 0).await;
        }
        cache.clear();
        for i in 0..10u32 {
            assert_eq!(cache.get_at(&format!("k{}", i), 1).await, None);
        }

        oracle_cache.clear();
        assert_eq!(oracle_cache.metrics().hit_rate(), 0.0);
    }
}
