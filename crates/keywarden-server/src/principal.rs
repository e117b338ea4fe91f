//! The authenticated principal for one request.
//!
//! Built from the verified access-token claims and dropped when the
//! request ends. Authorization decisions trust these claims alone;
//! nothing is re-read from the store during a request.

use axum::http::{HeaderMap, header};
use uuid::Uuid;

use keywarden_auth::config::AuthConfig;
use keywarden_auth::token;
use keywarden_core::IdentityClaims;

use crate::errors::RestError;

/// Verified identity for the lifetime of one request.
#[derive(Debug, Clone)]
pub struct Principal {
    claims: IdentityClaims,
}

impl Principal {
    pub fn id(&self) -> Uuid {
        self.claims.id
    }

    pub fn username(&self) -> &str {
        &self.claims.username
    }

    /// Capability check against the effective permission set baked
    /// into the token.
    pub fn has_rights(&self, permission: &str) -> bool {
        self.claims.has_permission(permission)
    }

    pub fn claims(&self) -> &IdentityClaims {
        &self.claims
    }
}

/// Pull the bearer token out of the Authorization header.
pub fn bearer_token(headers: &HeaderMap) -> Option<&str> {
    let header = headers.get(header::AUTHORIZATION)?.to_str().ok()?;
    let token = header.strip_prefix("Bearer ")?.trim();
    if token.is_empty() { None } else { Some(token) }
}

/// Authenticate a request that requires a principal.
///
/// A missing token and a bad token produce the same error so the
/// response does not reveal whether a bearer scheme was attempted.
pub fn require_principal(headers: &HeaderMap, config: &AuthConfig) -> Result<Principal, RestError> {
    let token = bearer_token(headers).ok_or(RestError::Unauthorized)?;
    let claims = token::decode_access_token(token, config).map_err(|_| RestError::Unauthorized)?;
    Ok(Principal {
        claims: claims.identity,
    })
}

/// Authenticate a request where the operation allows anonymity: no
/// token yields no principal, but a presented-yet-invalid token still
/// fails the request.
pub fn optional_principal(
    headers: &HeaderMap,
    config: &AuthConfig,
) -> Result<Option<Principal>, RestError> {
    match bearer_token(headers) {
        None => Ok(None),
        Some(token) => {
            let claims =
                token::decode_access_token(token, config).map_err(|_| RestError::Unauthorized)?;
            Ok(Some(Principal {
                claims: claims.identity,
            }))
        }
    }
}
