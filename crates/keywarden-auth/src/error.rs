//! Authentication error types.

use keywarden_core::WardenError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum AuthError {
    /// Unknown username and wrong password collapse into this single
    /// variant so responses cannot be used to enumerate usernames.
    #[error("invalid credentials")]
    InvalidCredentials,

    #[error("token has expired")]
    TokenExpired,

    #[error("invalid token: {0}")]
    TokenInvalid(String),

    #[error("cryptography error: {0}")]
    Crypto(String),
}

impl From<AuthError> for WardenError {
    fn from(err: AuthError) -> Self {
        match err {
            AuthError::InvalidCredentials
            | AuthError::TokenExpired
            | AuthError::TokenInvalid(_) => WardenError::AuthenticationFailed {
                reason: err.to_string(),
            },
            AuthError::Crypto(msg) => WardenError::Crypto(msg),
        }
    }
}
