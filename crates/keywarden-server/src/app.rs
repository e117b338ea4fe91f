//! Router assembly.

use std::sync::Arc;

use axum::{Router, routing::get};
use surrealdb::Surreal;

use keywarden_auth::{AuthConfig, AuthService};
use keywarden_db::repository::{
    SurrealGroupRepository, SurrealPermissionRepository, SurrealUserRepository,
};

use crate::crud::{EntityController, crud_router};
use crate::routes::{self, group::GroupHooks, permission::PermissionHooks, token, user::UserHooks};

/// Build the full HTTP router (public entrypoint used by `main.rs`
/// and the black-box tests).
pub fn build_app(db: Surreal<routes::Db>, auth_config: AuthConfig) -> Router {
    let pepper = auth_config.pepper.clone();
    let users = match pepper.clone() {
        Some(p) => SurrealUserRepository::with_pepper(db.clone(), p),
        None => SurrealUserRepository::new(db.clone()),
    };
    let groups = SurrealGroupRepository::new(db.clone());
    let permissions = SurrealPermissionRepository::new(db);

    let auth_service = Arc::new(AuthService::new(
        users.clone(),
        groups.clone(),
        permissions.clone(),
        auth_config.clone(),
    ));
    let auth_config = Arc::new(auth_config);

    let api = Router::new()
        .merge(crud_router(EntityController::new(
            UserHooks::new(users, groups.clone(), permissions.clone(), pepper),
            auth_config.clone(),
        )))
        .merge(crud_router(EntityController::new(
            GroupHooks::new(groups, permissions.clone()),
            auth_config.clone(),
        )))
        .merge(crud_router(EntityController::new(
            PermissionHooks::new(permissions),
            auth_config,
        )))
        .merge(token::router(auth_service));

    Router::new()
        .route("/health", get(health))
        .nest("/api/iam", api)
}

async fn health() -> &'static str {
    "ok"
}
