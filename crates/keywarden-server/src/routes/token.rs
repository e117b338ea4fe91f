//! Token issuance and refresh endpoints.
//!
//! `POST /api/iam/token` authenticates username + password and returns
//! an access/refresh pair. Unknown usernames and wrong passwords
//! produce the identical 401 body. `GET /api/iam/token` takes a bearer
//! artifact (access or refresh), re-fetches the user from the store,
//! and mints a fresh access token — the one point where claim
//! staleness is deliberately reduced.

use std::sync::Arc;

use axum::extract::State;
use axum::http::HeaderMap;
use axum::response::{IntoResponse, Response};
use axum::routing::post;
use axum::{Json, Router};
use serde_json::{Value, json};

use keywarden_auth::AuthService;
use keywarden_core::WardenError;
use keywarden_db::repository::{
    SurrealGroupRepository, SurrealPermissionRepository, SurrealUserRepository,
};

use crate::errors::RestError;
use crate::principal::bearer_token;

pub type Auth = AuthService<
    SurrealUserRepository<super::Db>,
    SurrealGroupRepository<super::Db>,
    SurrealPermissionRepository<super::Db>,
>;

pub fn router(auth: Arc<Auth>) -> Router {
    Router::new()
        .route("/token", post(issue_token).get(refresh_token))
        .with_state(auth)
}

async fn issue_token(
    State(auth): State<Arc<Auth>>,
    body: Option<Json<Value>>,
) -> Result<Response, RestError> {
    let body = body.map(|Json(v)| v).unwrap_or(Value::Null);
    let username = body
        .get("username")
        .and_then(Value::as_str)
        .unwrap_or_default();
    let password = body
        .get("password")
        .and_then(Value::as_str)
        .unwrap_or_default();

    match auth.login(username, password).await {
        Ok(tokens) => Ok(Json(json!({
            "error": null,
            "access_token": tokens.access_token,
            "refresh_token": tokens.refresh_token,
        }))
        .into_response()),
        Err(WardenError::AuthenticationFailed { .. }) => Err(RestError::BadCredentials),
        Err(e) => Err(e.into()),
    }
}

async fn refresh_token(
    State(auth): State<Arc<Auth>>,
    headers: HeaderMap,
) -> Result<Response, RestError> {
    let bearer = bearer_token(&headers).ok_or(RestError::Unauthorized)?;

    match auth.refresh(bearer).await {
        Ok(token) => Ok(Json(json!({ "error": null, "token": token })).into_response()),
        Err(WardenError::AuthenticationFailed { .. }) => Err(RestError::Unauthorized),
        Err(e) => Err(e.into()),
    }
}
