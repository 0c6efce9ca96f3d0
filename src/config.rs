use crate::models::Chain;
use crate::services::{freshness::DEFAULT_STALE_THRESHOLD_MS, OracleSettings};
use anyhow::{bail, Context, Result};
use std::collections::HashMap;
use std::str::FromStr;

#[derive(Debug, Clone, PartialEq)]
pub enum Environment {
    Development,
    Testnet,
    Production,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProviderMode {
    Mock,
    Rpc,
}

#[derive(Debug, Clone, PartialEq)]
pub struct RpcEndpoints {
    pub primary: String,
    pub fallback: Option<String>,
}

#[derive(Debug, Clone)]
pub struct Config {
    pub environment: Environment,
    pub host: String,
    pub port: u16,

    // Chain data
    pub provider_mode: ProviderMode,
    pub rpc_endpoints: HashMap<Chain, RpcEndpoints>,

    // Engine
    pub block_sample_count: usize,
    pub stale_threshold_ms: u64,

    // Cache
    pub cache_max_capacity: u64,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        dotenvy::dotenv().ok();
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let environment = Self::parse_environment(lookup("ENVIRONMENT"))?;

        let mut rpc_endpoints = HashMap::new();
        for chain in Chain::ALL {
            let prefix = chain.env_prefix();
            if let Some(primary) = lookup(&format!("{}_RPC_URL", prefix)) {
                rpc_endpoints.insert(
                    chain,
                    RpcEndpoints {
                        primary,
                        fallback: lookup(&format!("{}_RPC_FALLBACK", prefix)),
                    },
                );
            }
        }

        let provider_mode = match lookup("DATA_PROVIDER").as_deref().map(str::to_lowercase).as_deref() {
            Some("mock") => ProviderMode::Mock,
            Some("rpc") => ProviderMode::Rpc,
            Some(other) => bail!("Unknown DATA_PROVIDER: {}", other),
            None if rpc_endpoints.is_empty() => ProviderMode::Mock,
            None => ProviderMode::Rpc,
        };

        let config = Self {
            environment,
            host: lookup("HOST").unwrap_or_else(|| "0.0.0.0".to_string()),
            port: parse_or(&lookup, "PORT", 8080)?,
            provider_mode,
            rpc_endpoints,
            block_sample_count: parse_or(&lookup, "BLOCK_SAMPLE_COUNT", 20)?,
            stale_threshold_ms: parse_or(&lookup, "STALE_THRESHOLD_MS", DEFAULT_STALE_THRESHOLD_MS)?,
            cache_max_capacity: parse_or(&lookup, "CACHE_MAX_CAPACITY", 10_000)?,
        };

        config.validate()?;
        Ok(config)
    }

    fn parse_environment(raw: Option<String>) -> Result<Environment> {
        let env = raw.unwrap_or_else(|| "development".to_string());

        match env.to_lowercase().as_str() {
            "development" | "dev" => Ok(Environment::Development),
            "testnet" | "test" => Ok(Environment::Testnet),
            "production" | "prod" => Ok(Environment::Production),
            _ => bail!("Unknown environment: {}", env),
        }
    }

    fn validate(&self) -> Result<()> {
        for (chain, endpoints) in &self.rpc_endpoints {
            let urls = std::iter::once(&endpoints.primary).chain(endpoints.fallback.as_ref());
            for url in urls {
                if !url.starts_with("http") {
                    bail!("{} RPC URL must be HTTP(S) URL", chain);
                }
            }
        }

        if self.provider_mode == ProviderMode::Rpc && self.rpc_endpoints.is_empty() {
            bail!("DATA_PROVIDER=rpc requires at least one {{CHAIN}}_RPC_URL");
        }
        if !(2..=1024).contains(&self.block_sample_count) {
            bail!("BLOCK_SAMPLE_COUNT must be between 2 and 1024");
        }
        if self.stale_threshold_ms == 0 {
            bail!("STALE_THRESHOLD_MS must be positive");
        }
        if self.cache_max_capacity == 0 {
            bail!("CACHE_MAX_CAPACITY must be positive");
        }

        tracing::info!(
            "Configuration validated for {:?} environment ({:?} provider, {} RPC chains)",
            self.environment,
            self.provider_mode,
            self.rpc_endpoints.len()
        );

        Ok(())
    }

    pub fn oracle_settings(&self) -> OracleSettings {
        OracleSettings {
            block_sample_count: self.block_sample_count,
            stale_threshold_ms: self.stale_threshold_ms,
            ..OracleSettings::default()
        }
    }
}

fn parse_or<T>(lookup: &impl Fn(&str) -> Option<String>, key: &str, default: T) -> Result<T>
where
    T: FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    match lookup(key) {
        Some(raw) => raw.trim().parse().with_context(|| format!("Invalid {}", key)),
        None => Ok(default),
    }
}
