//! services/api/src/error.rs
//!
//! Defines the primary error type for the entire API service and how each
//! variant is turned into an HTTP response.

use agrivision_core::{AdvisoryError, PortError};
use axum::{
    extract::rejection::JsonRejection,
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use tracing::error;

use crate::config::ConfigError;

/// The primary error type for the `api` service.
#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    /// Represents an error that occurred during configuration loading.
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    /// Represents an error that propagated up from one of the core service ports.
    #[error("Service Port Error: {0}")]
    Port(#[from] PortError),

    /// Represents an error from the underlying database library.
    #[error("Database Error: {0}")]
    Database(#[from] sqlx::Error),

    /// Represents an error while running the embedded migrations.
    #[error("Migration Error: {0}")]
    Migration(#[from] sqlx::migrate::MigrateError),

    /// Represents a standard Input/Output error (e.g., binding to a network socket).
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// A request was missing fields or carried invalid ones.
    #[error("{0}")]
    Validation(String),

    /// Bad email or password. Deliberately says nothing about which one.
    #[error("Invalid credentials")]
    InvalidCredentials,

    /// No session cookie, or one that failed verification.
    #[error("{0}")]
    Unauthenticated(String),

    #[error("{0}")]
    NotFound(String),

    /// A newer request from the same user replaced this one.
    #[error("{0}")]
    Superseded(String),

    /// An external provider failed; the message is safe to show to users.
    #[error("{0}")]
    Upstream(String),

    #[error(transparent)]
    Advisory(#[from] AdvisoryError),

    /// A catch-all for any other unexpected errors.
    #[error("An unexpected internal error occurred: {0}")]
    Internal(String),
}

/// Malformed or wrongly typed JSON bodies are a validation failure like any other.
impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        ApiError::Validation(rejection.body_text())
    }
}

impl ApiError {
    pub fn status(&self) -> StatusCode {
        match self {
            ApiError::Validation(_) | ApiError::InvalidCredentials => StatusCode::BAD_REQUEST,
            ApiError::Unauthenticated(_) => StatusCode::UNAUTHORIZED,
            ApiError::NotFound(_) => StatusCode::NOT_FOUND,
            ApiError::Superseded(_) => StatusCode::CONFLICT,
            ApiError::Upstream(_) => StatusCode::BAD_GATEWAY,
            ApiError::Advisory(AdvisoryError::AllBusy { .. }) => StatusCode::SERVICE_UNAVAILABLE,
            ApiError::Advisory(AdvisoryError::Provider(_)) => StatusCode::BAD_GATEWAY,
            ApiError::Port(PortError::NotFound(_)) => StatusCode::NOT_FOUND,
            ApiError::Port(PortError::AlreadyExists(_)) => StatusCode::BAD_REQUEST,
            ApiError::Port(PortError::Unauthorized) => StatusCode::UNAUTHORIZED,
            ApiError::Port(PortError::Unavailable(_)) => StatusCode::SERVICE_UNAVAILABLE,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        let body = match &self {
            ApiError::Advisory(AdvisoryError::Provider(e)) => {
                error!("Advisory provider error: {:?}", e);
                json!({ "message": "Advisory provider failed. Please try again later." })
            }
            _ if status == StatusCode::INTERNAL_SERVER_ERROR => {
                error!("Internal error: {:?}", self);
                json!({ "message": "Something went wrong", "error": self.to_string() })
            }
            _ => json!({ "message": self.to_string() }),
        };
        (status, Json(body)).into_response()
    }
}

/// A convenience type alias for handler results.
pub type ApiResult<T> = Result<T, ApiError>;
