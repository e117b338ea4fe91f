//! Idempotent default data.
//!
//! Creates whatever is missing on startup: the `users` group that
//! self-registration assigns, the `admins` group, the three IAM
//! management permissions (granted to `admins`), and an initial
//! `admin` user. Safe to run on every boot.

use surrealdb::{Connection, Surreal};
use tracing::{info, warn};

use keywarden_core::WardenError;
use keywarden_core::error::WardenResult;
use keywarden_core::models::{CreateGroup, CreatePermission, CreateUser, Group, Permission};
use keywarden_core::repository::{GroupRepository, PermissionRepository, UserRepository};

use crate::repository::{SurrealGroupRepository, SurrealPermissionRepository, SurrealUserRepository};

/// Group every self-registered user is placed into.
pub const DEFAULT_GROUP: &str = "users";
/// Group holding the IAM management permissions.
pub const ADMIN_GROUP: &str = "admins";

const DEFAULT_PERMISSIONS: &[(&str, &str)] = &[
    ("iam_users_manage", "Allows to manage any user account"),
    ("iam_group_manage", "Allows to manage groups"),
    ("iam_permission_manage", "Allows to manage permissions"),
];

async fn ensure_group<C: Connection>(
    repo: &SurrealGroupRepository<C>,
    name: &str,
) -> WardenResult<Group> {
    match repo.get_by_name(name).await {
        Ok(group) => Ok(group),
        Err(WardenError::NotFound { .. }) => {
            info!(group = name, "Seeding default group");
            repo.create(CreateGroup { name: name.into() }).await
        }
        Err(e) => Err(e),
    }
}

async fn ensure_permission<C: Connection>(
    repo: &SurrealPermissionRepository<C>,
    name: &str,
    description: &str,
) -> WardenResult<Permission> {
    match repo.get_by_name(name).await {
        Ok(permission) => Ok(permission),
        Err(WardenError::NotFound { .. }) => {
            info!(permission = name, "Seeding default permission");
            repo.create(CreatePermission {
                name: name.into(),
                description: Some(description.into()),
            })
            .await
        }
        Err(e) => Err(e),
    }
}

/// Create any missing default groups, permissions, and the initial
/// admin account.
pub async fn seed_defaults<C: Connection>(
    db: &Surreal<C>,
    pepper: Option<String>,
) -> WardenResult<()> {
    let users = match pepper.clone() {
        Some(p) => SurrealUserRepository::with_pepper(db.clone(), p),
        None => SurrealUserRepository::new(db.clone()),
    };
    let groups = SurrealGroupRepository::new(db.clone());
    let permissions = SurrealPermissionRepository::new(db.clone());

    ensure_group(&groups, DEFAULT_GROUP).await?;
    let admins = ensure_group(&groups, ADMIN_GROUP).await?;

    let mut granted = permissions.get_for_group(admins.id).await?;
    let mut changed = false;
    for (name, description) in DEFAULT_PERMISSIONS {
        let permission = ensure_permission(&permissions, name, description).await?;
        if !granted.iter().any(|p| p.id == permission.id) {
            granted.push(permission);
            changed = true;
        }
    }
    if changed {
        groups
            .replace_permissions(admins.id, granted.iter().map(|p| p.id).collect())
            .await?;
    }

    match users.get_by_username("admin").await {
        Ok(_) => {}
        Err(WardenError::NotFound { .. }) => {
            warn!("Seeding default admin account with password 'admin' — change it");
            users
                .create(CreateUser {
                    username: "admin".into(),
                    name: "admin".into(),
                    password: "admin".into(),
                    active: true,
                    group_ids: vec![admins.id],
                })
                .await?;
        }
        Err(e) => return Err(e),
    }

    Ok(())
}
