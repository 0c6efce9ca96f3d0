use crate::{
    handlers::AppState,
    models::{Chain, ChainHealth, HealthStatus},
};
use axum::{extract::State, Json};
use chrono::Utc;
use futures::future::join_all;

pub async fn health_check(State(state): State<AppState>) -> Json<HealthStatus> {
    let probes = Chain::ALL.into_iter().map(|chain| {
        let oracle = state.oracle.clone();
        async move {
            let result = oracle.check_provider(chain).await;
            if let Err(e) = &result {
                tracing::warn!("Health probe failed for {}: {}", chain, e);
            }
            ChainHealth {
                chain: chain.name().to_string(),
                provider_ok: result.is_ok(),
            }
        }
    });
    let chains = join_all(probes).await;

    let healthy = chains.iter().filter(|c| c.provider_ok).count();
    let status = if healthy == chains.len() {
        "healthy"
    } else if healthy > 0 {
        "degraded"
    } else {
        "unhealthy"
    };

    Json(HealthStatus {
        status: status.to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        chains,
        uptime_seconds: state.analytics.uptime_seconds(),
        timestamp: Utc::now(),
    })
}
