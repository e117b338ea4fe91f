//! Error types for the Keywarden system.
//!
//! The first five variants are recoverable at the request boundary and
//! map 1:1 onto REST error responses; the rest are fatal for the
//! request and surface as 500s.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum WardenError {
    #[error("{entity} not found: {id}")]
    NotFound { entity: String, id: String },

    #[error("{entity} already exists")]
    AlreadyExists { entity: String },

    #[error("Authentication failed: {reason}")]
    AuthenticationFailed { reason: String },

    #[error("Authorization denied: {reason}")]
    AuthorizationDenied { reason: String },

    #[error("{message}")]
    Validation { message: String },

    #[error("Database error: {0}")]
    Database(String),

    #[error("Cryptography error: {0}")]
    Crypto(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl WardenError {
    pub fn validation(message: impl Into<String>) -> Self {
        Self::Validation {
            message: message.into(),
        }
    }
}

pub type WardenResult<T> = Result<T, WardenError>;
