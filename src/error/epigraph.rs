use axum::{Json, http::StatusCode, response::IntoResponse};
use serde::Serialize;
use thiserror::Error as ThisError;

use super::IsRetryable;

#[derive(Debug, ThisError)]
pub enum EpigraphError {
    /// Production tier booted without a secret store endpoint. Never
    /// recoverable by fallback.
    #[error("production tier requires a configured secret store endpoint")]
    ProductionVaultRequired,

    #[error("no quote source configured for tier '{0}'")]
    NoQuoteSource(String),

    #[error("secret store error: {0}")]
    SecretStore(String),

    #[error("credential acquisition failed: {0}")]
    Credential(String),

    #[error("secret store responded with status: {0}")]
    UpstreamStatus(StatusCode),

    #[error("no seed file found at any candidate path")]
    SeedFilesMissing,

    #[error("database not configured")]
    DatabaseNotConfigured,

    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("base64 decode error: {0}")]
    Base64(#[from] base64::DecodeError),

    #[error("HTTP request error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("URL parse error: {0}")]
    Url(#[from] url::ParseError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("actor error: {0}")]
    Ractor(String),
}

/// Fixed error payload for HTTP responses. Connection strings, credentials,
/// and raw database error text must never reach a response body.
#[derive(Serialize)]
pub struct ApiErrorBody {
    pub error: &'static str,
}

impl IntoResponse for EpigraphError {
    fn into_response(self) -> axum::response::Response {
        let (status, body) = match self {
            EpigraphError::DatabaseNotConfigured
            | EpigraphError::Database(_)
            | EpigraphError::Ractor(_) => (
                StatusCode::SERVICE_UNAVAILABLE,
                ApiErrorBody {
                    error: "database_unavailable",
                },
            ),

            EpigraphError::ProductionVaultRequired
            | EpigraphError::NoQuoteSource(_)
            | EpigraphError::SecretStore(_)
            | EpigraphError::Credential(_)
            | EpigraphError::UpstreamStatus(_)
            | EpigraphError::SeedFilesMissing
            | EpigraphError::Json(_)
            | EpigraphError::Base64(_)
            | EpigraphError::Http(_)
            | EpigraphError::Url(_)
            | EpigraphError::Io(_) => (
                StatusCode::INTERNAL_SERVER_ERROR,
                ApiErrorBody {
                    error: "internal_error",
                },
            ),
        };
        (status, Json(body)).into_response()
    }
}

impl IsRetryable for EpigraphError {
    fn is_retryable(&self) -> bool {
        match self {
            EpigraphError::Http(_) => true,
            EpigraphError::UpstreamStatus(status) => {
                status.is_server_error() || *status == StatusCode::TOO_MANY_REQUESTS
            }
            _ => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn database_errors_map_to_service_unavailable() {
        let resp = EpigraphError::DatabaseNotConfigured.into_response();
        assert_eq!(resp.status(), StatusCode::SERVICE_UNAVAILABLE);
    }

    #[test]
    fn config_errors_are_not_retryable() {
        assert!(!EpigraphError::ProductionVaultRequired.is_retryable());
        assert!(EpigraphError::UpstreamStatus(StatusCode::BAD_GATEWAY).is_retryable());
        assert!(!EpigraphError::UpstreamStatus(StatusCode::FORBIDDEN).is_retryable());
    }
}
