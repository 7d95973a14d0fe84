//! Error types for the Animals API.
//!
//! `StoreError` is what a datastore backend reports; `ApiError` is what a
//! handler answers with. Handlers decide how one maps onto the other.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use thiserror::Error;
use utoipa::ToSchema;

/// Message returned for any failure not converted into a structured response.
pub const INTERNAL_ERROR_MESSAGE: &str = "Internal server error";

/// Message returned when an id matches no row.
pub const NOT_FOUND_MESSAGE: &str = "Animal not found for this ID";

/// Errors reported by a datastore backend.
#[derive(Debug, Error)]
pub enum StoreError {
    /// The datastore rejected the call. The message is the datastore's own.
    #[error("{0}")]
    Query(String),

    /// The datastore could not be reached.
    #[error("{0}")]
    Transport(String),

    /// The datastore answered with something that is not an animal row.
    #[error("Malformed datastore response: {0}")]
    Decode(String),
}

impl StoreError {
    /// Whether this error was reported by (or on the way to) the datastore,
    /// as opposed to a response we failed to interpret.
    pub fn is_upstream(&self) -> bool {
        matches!(self, StoreError::Query(_) | StoreError::Transport(_))
    }
}

impl From<sqlx::Error> for StoreError {
    fn from(e: sqlx::Error) -> Self {
        match e {
            sqlx::Error::Database(db) => StoreError::Query(db.message().to_string()),
            other @ (sqlx::Error::ColumnDecode { .. } | sqlx::Error::Decode(_)) => {
                StoreError::Decode(other.to_string())
            }
            other => StoreError::Transport(other.to_string()),
        }
    }
}

impl From<reqwest::Error> for StoreError {
    fn from(e: reqwest::Error) -> Self {
        if e.is_decode() {
            StoreError::Decode(e.to_string())
        } else {
            StoreError::Transport(e.to_string())
        }
    }
}

impl From<serde_json::Error> for StoreError {
    fn from(e: serde_json::Error) -> Self {
        StoreError::Decode(e.to_string())
    }
}

/// Errors returned from HTTP handlers.
#[derive(Debug, Error)]
pub enum ApiError {
    #[error("Invalid request: {0}")]
    BadRequest(String),

    #[error("Resource not found: {0}")]
    NotFound(String),

    #[error("Failed to create animal")]
    CreateFailed,

    #[error("Internal error: {0}")]
    Internal(String),
}

impl ApiError {
    pub fn not_found() -> Self {
        ApiError::NotFound(NOT_FOUND_MESSAGE.to_string())
    }
}

impl From<StoreError> for ApiError {
    /// Datastore errors are client-caused unless we could not read the reply.
    fn from(e: StoreError) -> Self {
        if e.is_upstream() {
            ApiError::BadRequest(e.to_string())
        } else {
            ApiError::Internal(e.to_string())
        }
    }
}

/// Error response body for API clients.
#[derive(Debug, Serialize, ToSchema)]
pub struct ErrorResponse {
    pub error: String,
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, message) = match self {
            ApiError::BadRequest(msg) => (StatusCode::BAD_REQUEST, msg),
            ApiError::NotFound(msg) => (StatusCode::NOT_FOUND, msg),
            ApiError::CreateFailed => (
                StatusCode::INTERNAL_SERVER_ERROR,
                "Failed to create animal".to_string(),
            ),
            ApiError::Internal(msg) => {
                tracing::error!(error = %msg, "Internal error");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    INTERNAL_ERROR_MESSAGE.to_string(),
                )
            }
        };

        (status, Json(ErrorResponse { error: message })).into_response()
    }
}

/// Result type alias for handlers.
pub type ApiResult<T> = Result<T, ApiError>;

/// Result type alias for datastore backends.
pub type StoreResult<T> = Result<T, StoreError>;
