pub mod gas;
pub mod health;
pub mod stats;

pub use gas::*;
pub use health::*;
pub use stats::*;

use axum::{routing::get, Router};
use tower_http::{
    cors::CorsLayer,
    trace::{DefaultMakeSpan, TraceLayer},
};

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health_check))
        .route("/stats", get(get_stats))
        .route("/api/gas/estimate", get(get_estimate))
        .route("/api/gas/forecast", get(get_forecast))
        .route("/api/gas/congestion", get(get_congestion))
        .with_state(state)
        .layer(
            TraceLayer::new_for_http()
                .make_span_with(DefaultMakeSpan::default().include_headers(true)),
        )
        .layer(CorsLayer::permissive())
}
