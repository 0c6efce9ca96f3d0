use crate::models::Chain;
use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use chrono::Utc;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use uuid::Uuid;

/// Failures raised by a chain data provider.
#[derive(Error, Debug)]
pub enum ProviderError {
    #[error("RPC error: {0}")]
    Rpc(#[from] ethers::providers::ProviderError),

    #[error("Malformed chain data: {0}")]
    Malformed(String),

    #[error("No data source configured for {0}")]
    ChainNotConfigured(Chain),

    #[error("Provider unavailable: {0}")]
    Unavailable(String),
}

#[derive(Error, Debug)]
pub enum OracleError {
    #[error("No block data available for {chain}")]
    NoBlockData { chain: Chain },

    #[error("Provider error: {0}")]
    Provider(#[from] ProviderError),

    #[error("Invalid input: {0}")]
    InvalidInput(String),
}

impl OracleError {
    pub fn error_code(&self) -> &'static str {
        match self {
            OracleError::NoBlockData { .. } => "NO_BLOCK_DATA",
            OracleError::Provider(_) => "UPSTREAM_ERROR",
            OracleError::InvalidInput(_) => "INVALID_INPUT",
        }
    }

    pub fn status_code(&self) -> StatusCode {
        match self {
            OracleError::NoBlockData { .. } => StatusCode::SERVICE_UNAVAILABLE,
            OracleError::Provider(_) => StatusCode::BAD_GATEWAY,
            OracleError::InvalidInput(_) => StatusCode::BAD_REQUEST,
        }
    }
}

#[derive(Serialize, Deserialize, Debug)]
pub struct ErrorResponse {
    pub success: bool,
    pub error: String,
    pub error_code: String,
    pub timestamp: chrono::DateTime<Utc>,
    pub request_id: String,
}

impl IntoResponse for OracleError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        let error_code = self.error_code();

        let body = ErrorResponse {
            success: false,
            error: self.to_string(),
            error_code: error_code.to_string(),
            timestamp: Utc::now(),
            request_id: Uuid::new_v4().to_string(),
        };

        if status.is_server_error() {
            tracing::error!(error = ?self, error_code = error_code, "Request failed");
        } else {
            tracing::debug!(error = ?self, error_code = error_code, "Request rejected");
        }

        (status, Json(body)).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_mapping() {
        let cases = [
            (OracleError::InvalidInput("x".into()), StatusCode::BAD_REQUEST),
            (
                OracleError::Provider(ProviderError::Unavailable("down".into())),
                StatusCode::BAD_GATEWAY,
            ),
            (
                OracleError::NoBlockData { chain: Chain::Base },
                StatusCode::SERVICE_UNAVAILABLE,
            ),
        ];
        for (err, status) in cases {
            assert_eq!(err.into_response().status(), status);
        }
    }

    #[test]
    fn test_provider_error_message_is_preserved() {
        let err = OracleError::from(ProviderError::Malformed("block 7 missing number".into()));
        assert_eq!(
            err.to_string(),
            "Provider error: Malformed chain data: block 7 missing number"
        );
        assert_eq!(err.error_code(), "UPSTREAM_ERROR");
    }
}
