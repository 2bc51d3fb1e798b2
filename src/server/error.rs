//! Mapping of operation failures to HTTP responses.
//!
//! Every failure becomes `{"error": ..., "details"?: ...}` with a matching
//! status code. Store failures are logged here since they are the only
//! errors that point at a problem on our side.

use axum::{
    extract::rejection::JsonRejection,
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use thiserror::Error;

use crate::catalog::CatalogError;

/// Errors returned from request handlers.
#[derive(Debug, Error)]
pub enum ApiError {
    /// No usable `Authorization: Bearer` header.
    #[error("Unauthorized")]
    Unauthorized,
    /// Wrong admin password on `/auth`.
    #[error("Invalid password")]
    InvalidPassword,
    /// The request body could not be parsed.
    #[error("Invalid request: {0}")]
    MalformedRequest(String),
    /// A catalog operation failed; `context` names the operation.
    #[error("{context}: {source}")]
    Catalog {
        context: &'static str,
        source: CatalogError,
    },
}

impl ApiError {
    /// Wraps a catalog error with the name of the failed operation.
    pub fn during(context: &'static str) -> impl FnOnce(CatalogError) -> ApiError {
        move |source| ApiError::Catalog { context, source }
    }
}

impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        ApiError::MalformedRequest(rejection.body_text())
    }
}

#[derive(Debug, Serialize)]
struct ErrorBody {
    error: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    details: Option<String>,
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, error, details) = match self {
            ApiError::Unauthorized => (StatusCode::UNAUTHORIZED, "Unauthorized".to_string(), None),
            ApiError::InvalidPassword => {
                (StatusCode::UNAUTHORIZED, "Invalid password".to_string(), None)
            }
            ApiError::MalformedRequest(reason) => {
                (StatusCode::BAD_REQUEST, "Invalid request".to_string(), Some(reason))
            }
            ApiError::Catalog { context, source } => match source {
                CatalogError::Unauthorized => {
                    (StatusCode::UNAUTHORIZED, source.to_string(), None)
                }
                CatalogError::InvalidInput(_) | CatalogError::Conflict { .. } => {
                    (StatusCode::BAD_REQUEST, source.to_string(), None)
                }
                CatalogError::NotFound { .. } => (StatusCode::NOT_FOUND, source.to_string(), None),
                CatalogError::Store(e) => {
                    tracing::error!("{}: {}", context, e);
                    (
                        StatusCode::INTERNAL_SERVER_ERROR,
                        context.to_string(),
                        Some(e.to_string()),
                    )
                }
            },
        };

        (status, Json(ErrorBody { error, details })).into_response()
    }
}
