//! Request-boundary error taxonomy and response mapping.
//!
//! Every error response carries the shape `{"error": <message>}`.
//! Store-layer surprises become 500s with a generic body; the real
//! cause is logged, never leaked and never swallowed.

use axum::Json;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde_json::json;

use keywarden_core::WardenError;

/// Message for both a missing and an invalid/expired token, so the
/// response never reveals whether a bearer scheme was attempted.
pub const UNAUTHORIZED_MSG: &str = "Missing or invalid authorization token";

/// Exact credential-failure message of the token endpoint; identical
/// for unknown usernames and wrong passwords.
pub const BAD_CREDENTIALS_MSG: &str = "Bad username or password";

#[derive(Debug, thiserror::Error)]
pub enum RestError {
    /// Bad field value, attributable to one input field (400).
    #[error("{0}")]
    Validation(String),

    /// Missing, invalid, or expired token (401).
    #[error("Missing or invalid authorization token")]
    Unauthorized,

    /// Failed username/password authentication (401).
    #[error("Bad username or password")]
    BadCredentials,

    /// Authenticated but lacking the required permission (403).
    #[error("{0}")]
    PermissionDenied(String),

    /// The id does not resolve (404).
    #[error("{0}")]
    NotFound(String),

    /// Unexpected failure; fatal for the request (500).
    #[error("{0}")]
    Internal(String),
}

impl RestError {
    pub fn not_found(entity: &str) -> Self {
        Self::NotFound(format!("{entity} not found"))
    }
}

impl From<WardenError> for RestError {
    fn from(err: WardenError) -> Self {
        match err {
            WardenError::Validation { message } => RestError::Validation(message),
            WardenError::AlreadyExists { entity } => {
                RestError::Validation(format!("{entity} already exists"))
            }
            WardenError::AuthenticationFailed { .. } => RestError::Unauthorized,
            WardenError::AuthorizationDenied { reason } => RestError::PermissionDenied(reason),
            WardenError::NotFound { entity, .. } => RestError::not_found(&entity),
            WardenError::Database(msg) | WardenError::Crypto(msg) | WardenError::Internal(msg) => {
                RestError::Internal(msg)
            }
        }
    }
}

impl IntoResponse for RestError {
    fn into_response(self) -> Response {
        let (status, message) = match self {
            RestError::Validation(msg) => (StatusCode::BAD_REQUEST, msg),
            RestError::Unauthorized => (StatusCode::UNAUTHORIZED, UNAUTHORIZED_MSG.to_string()),
            RestError::BadCredentials => {
                (StatusCode::UNAUTHORIZED, BAD_CREDENTIALS_MSG.to_string())
            }
            RestError::PermissionDenied(msg) => (StatusCode::FORBIDDEN, msg),
            RestError::NotFound(msg) => (StatusCode::NOT_FOUND, msg),
            RestError::Internal(msg) => {
                tracing::error!(error = %msg, "request failed");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "Internal server error".to_string(),
                )
            }
        };

        (status, Json(json!({ "error": message }))).into_response()
    }
}
