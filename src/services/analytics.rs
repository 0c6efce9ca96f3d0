use crate::{models::Stats, services::OracleCache};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Operation {
    Estimate,
    Forecast,
    Congestion,
}

pub struct Analytics {
    cache: Arc<OracleCache>,
    estimate_requests: AtomicU64,
    forecast_requests: AtomicU64,
    congestion_requests: AtomicU64,
    failed_requests: AtomicU64,
    total_latency_us: AtomicU64,
    start_time: Instant,
}

impl Analytics {
    pub fn new(cache: Arc<OracleCache>) -> Self {
        Self {
            cache,
            estimate_requests: AtomicU64::new(0),
            forecast_requests: AtomicU64::new(0),
            congestion_requests: AtomicU64::new(0),
            failed_requests: AtomicU64::new(0),
            total_latency_us: AtomicU64::new(0),
            start_time: Instant::now(),
        }
    }

    pub fn record_request(&self, operation: Operation, elapsed: Duration, succeeded: bool) {
        let counter = match operation {
            Operation::Estimate => &self.estimate_requests,
            Operation::Forecast => &self.forecast_requests,
            Operation::Congestion => &self.congestion_requests,
        };
        counter.fetch_add(1, Ordering::Relaxed);
        if !succeeded {
            self.failed_requests.fetch_add(1, Ordering::Relaxed);
        }
        self.total_latency_us
            .fetch_add(elapsed.as_micros() as u64, Ordering::Relaxed);

        tracing::debug!(
            "{:?} request served in {:.2}ms (ok: {})",
            operation,
            elapsed.as_secs_f64() * 1000.0,
            succeeded
        );
    }

    pub fn get_stats(&self) -> Stats {
        let estimate_requests = self.estimate_requests.load(Ordering::Relaxed);
        let forecast_requests = self.forecast_requests.load(Ordering::Relaxed);
        let congestion_requests = self.congestion_requests.load(Ordering::Relaxed);
        let total_requests = estimate_requests + forecast_requests + congestion_requests;

        let avg_response_time_ms = if total_requests == 0 {
            0.0
        } else {
            self.total_latency_us.load(Ordering::Relaxed) as f64 / total_requests as f64 / 1000.0
        };

        Stats {
            total_requests,
            estimate_requests,
            forecast_requests,
            congestion_requests,
            failed_requests: self.failed_requests.load(Ordering::Relaxed),
            cache_hit_rate: self.cache.metrics().hit_rate(),
            avg_response_time_ms,
            uptime_seconds: self.uptime_seconds(),
        }
    }

    pub fn uptime_seconds(&self) -> u64 {
        self.start_time.elapsed().as_secs()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_stats_aggregate_requests() {
        let analytics = Analytics::new(Arc::new(OracleCache::new(10)));
        analytics.record_request(Operation::Estimate, Duration::from_millis(4), true);
        analytics.record_request(Operation::Estimate, Duration::from_millis(2), false);
        analytics.record_request(Operation::Congestion, Duration::from_millis(6), true);

        let stats = analytics.get_stats();
        assert_eq!(stats.total_requests, 3);
        assert_eq!(stats.estimate_requests, 2);
        assert_eq!(stats.forecast_requests, 0);
        assert_eq!(stats.failed_requests, 1);
        assert_eq!(stats.avg_response_time_ms, 4.0);
        assert_eq!(stats.cache_hit_rate, 0.0);
    }
}
