use axum::{extract::FromRequestParts, http::header, http::request::Parts};

use super::error::ApiError;

/// Credential taken from an `Authorization: Bearer <credential>` header.
///
/// Only the header shape is checked here; the catalog verifies the value.
#[derive(Debug, Clone)]
pub struct BearerCredential(pub String);

impl<S: Send + Sync> FromRequestParts<S> for BearerCredential {
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let auth_header = parts
            .headers
            .get(header::AUTHORIZATION)
            .and_then(|h| h.to_str().ok());

        match auth_header {
            Some(h) if h.starts_with("Bearer ") => Ok(Self(h[7..].to_string())),
            _ => Err(ApiError::Unauthorized),
        }
    }
}
