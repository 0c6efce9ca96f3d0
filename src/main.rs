use anyhow::{Context, Result};
use fee_oracle::{
    config::{Config, ProviderMode},
    handlers::{router, AppState},
    services::*,
};
use std::sync::Arc;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with(tracing_subscriber::fmt::layer())
        .init();

    // Load configuration
    let config = Config::from_env().context("Failed to load configuration")?;

    tracing::info!("Starting fee oracle v{}", env!("CARGO_PKG_VERSION"));
    tracing::info!("Environment: {:?}", config.environment);

    // Initialize services
    let provider: Arc<dyn ChainDataProvider> = match config.provider_mode {
        ProviderMode::Rpc => Arc::new(
            RpcChainDataProvider::new(&config.rpc_endpoints)
                .await
                .context("Failed to initialize RPC providers")?,
        ),
        ProviderMode::Mock => {
            tracing::warn!("Serving synthetic chain data from the mock provider");
            Arc::new(MockChainDataProvider::fresh())
        }
    };
    let cache = Arc::new(OracleCache::new(config.cache_max_capacity));
    let oracle = Arc::new(FeeOracle::new(provider, cache.clone(), config.oracle_settings()));
    let analytics = Arc::new(Analytics::new(cache));

    let app = router(AppState { oracle, analytics });

    // Start server
    let addr = format!("{}:{}", config.host, config.port);
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .with_context(|| format!("Failed to bind {}", addr))?;

    tracing::info!("Server listening on http://{}", addr);
    tracing::info!("Health check: http://{}/health", addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!("Failed to listen for ctrl+c: {}", e);
        std::future::pending::<()>().await;
    }
    tracing::info!("Shutting down gracefully...");
}
