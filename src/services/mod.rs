pub mod analytics;
pub mod cache;
pub mod congestion;
pub mod ethereum;
pub mod fee_estimator;
pub mod forecast;
pub mod freshness;
pub mod inclusion;
pub mod oracle;
pub mod provider;

pub use analytics::{Analytics, Operation};
pub use cache::{CacheMetrics, OracleCache, QueryCache};
pub use ethereum::RpcChainDataProvider;
pub use oracle::{FeeOracle, OracleSettings};
pub use provider::{ChainDataProvider, MockChainDataProvider};
