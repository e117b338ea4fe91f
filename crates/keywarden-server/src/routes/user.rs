//! User entity hooks for the generic controller.
//!
//! The user entity specializes the generic machinery in three ways,
//! all expressed through hooks:
//!
//! - create is the unauthenticated self-service registration: it
//!   validates username/password/name, assigns the default `users`
//!   group, and persists the account inactive;
//! - the sentinel id `self` in get/edit/delete resolves to the
//!   caller's own identity, and acting on one's own id never needs a
//!   permission — any other id requires `iam_users_manage`;
//! - edit gates password changes on a correct `old_password` (or the
//!   manage permission) and group/active changes on the manage
//!   permission unconditionally.

use serde_json::Value;
use uuid::Uuid;

use keywarden_auth::password::verify_password;
use keywarden_core::WardenError;
use keywarden_core::models::{CreateUser, UpdateUser, User};
use keywarden_core::projection;
use keywarden_core::rbac::{GroupGrants, IdentityClaims};
use keywarden_core::repository::{
    GroupRepository as _, PaginatedResult, Pagination, PermissionRepository as _,
    UserRepository as _,
};
use keywarden_core::validate::{validate_display_name, validate_password, validate_username};
use keywarden_db::DEFAULT_GROUP;
use keywarden_db::repository::{
    SurrealGroupRepository, SurrealPermissionRepository, SurrealUserRepository,
};

use crate::crud::{CrudPolicy, EntityHooks, OpPolicy, Operation, enforce};
use crate::errors::RestError;
use crate::principal::Principal;

pub const USERS_MANAGE: &str = "iam_users_manage";

/// Sentinel path id resolving to the caller's own account.
const SELF_ID: &str = "self";

#[derive(Clone)]
pub struct UserHooks {
    users: SurrealUserRepository<super::Db>,
    groups: SurrealGroupRepository<super::Db>,
    permissions: SurrealPermissionRepository<super::Db>,
    pepper: Option<String>,
}

impl UserHooks {
    pub fn new(
        users: SurrealUserRepository<super::Db>,
        groups: SurrealGroupRepository<super::Db>,
        permissions: SurrealPermissionRepository<super::Db>,
        pepper: Option<String>,
    ) -> Self {
        Self {
            users,
            groups,
            permissions,
            pepper,
        }
    }

    async fn ensure_username_free(&self, username: &str) -> Result<(), RestError> {
        match self.users.get_by_username(username).await {
            Ok(_) => Err(RestError::Validation("Username already exists.".into())),
            Err(WardenError::NotFound { .. }) => Ok(()),
            Err(e) => Err(e.into()),
        }
    }

    async fn resolve_group_names(&self, names: &[String]) -> Result<Vec<Uuid>, RestError> {
        let mut ids = Vec::with_capacity(names.len());
        for name in names {
            match self.groups.get_by_name(name).await {
                Ok(group) => ids.push(group.id),
                Err(WardenError::NotFound { .. }) => {
                    return Err(RestError::Validation(format!("Unknown group \"{name}\"")));
                }
                Err(e) => return Err(e.into()),
            }
        }
        Ok(ids)
    }

    fn deny(principal: &Principal) -> RestError {
        RestError::PermissionDenied(format!(
            "User {} has no \"{USERS_MANAGE}\" permissions",
            principal.username()
        ))
    }
}

/// Edit payload: field updates plus an optional wholesale membership
/// replacement.
pub struct UserEdit {
    update: UpdateUser,
    group_ids: Option<Vec<Uuid>>,
}

fn string_list(value: &Value) -> Option<Vec<String>> {
    let items = value.as_array()?;
    items
        .iter()
        .map(|v| v.as_str().map(str::to_string))
        .collect()
}

impl EntityHooks for UserHooks {
    type Entity = User;
    type CreateData = CreateUser;
    type EditData = UserEdit;

    const CODE: &'static str = "user";

    fn policy(&self) -> CrudPolicy {
        CrudPolicy {
            create: OpPolicy::open(),
            delete: OpPolicy::authenticated(),
            list: OpPolicy::requires(USERS_MANAGE),
            get: OpPolicy::authenticated(),
            edit: OpPolicy::authenticated(),
        }
    }

    fn prepare_id(&self, principal: Option<&Principal>, raw: &str) -> Result<Uuid, RestError> {
        if raw == SELF_ID {
            return principal.map(Principal::id).ok_or(RestError::Unauthorized);
        }
        Uuid::parse_str(raw).map_err(|_| RestError::not_found(Self::CODE))
    }

    /// Acting on your own account is always allowed; anything else
    /// needs the user-management permission.
    fn authorize(
        &self,
        op: Operation,
        principal: Option<&Principal>,
        target: Option<Uuid>,
    ) -> Result<(), RestError> {
        match op {
            Operation::Get | Operation::Edit | Operation::Delete => {
                let principal = principal.ok_or(RestError::Unauthorized)?;
                if target == Some(principal.id()) || principal.has_rights(USERS_MANAGE) {
                    Ok(())
                } else {
                    Err(Self::deny(principal))
                }
            }
            _ => enforce(self.policy().for_op(op), principal),
        }
    }

    async fn prepare_create(
        &self,
        _principal: Option<&Principal>,
        body: &Value,
    ) -> Result<CreateUser, RestError> {
        let username = body
            .get("username")
            .and_then(Value::as_str)
            .ok_or_else(|| RestError::Validation("Username can't be null.".into()))?;
        validate_username(username)?;
        self.ensure_username_free(username).await?;

        let password = body
            .get("password")
            .and_then(Value::as_str)
            .ok_or_else(|| RestError::Validation("Password can't be null".into()))?;
        validate_password(password)?;

        let name = body.get("name").and_then(Value::as_str).unwrap_or("");
        validate_display_name(name)?;
        let name = if name.is_empty() { username } else { name };

        // Every self-registered account lands in the default group.
        let default_group = self.groups.get_by_name(DEFAULT_GROUP).await.map_err(|e| {
            match e {
                WardenError::NotFound { .. } => {
                    RestError::Internal(format!("default group \"{DEFAULT_GROUP}\" is missing"))
                }
                other => other.into(),
            }
        })?;

        Ok(CreateUser {
            username: username.to_string(),
            name: name.to_string(),
            password: password.to_string(),
            active: false,
            group_ids: vec![default_group.id],
        })
    }

    async fn prepare_edit(
        &self,
        principal: Option<&Principal>,
        entity: &User,
        body: &Value,
    ) -> Result<UserEdit, RestError> {
        let principal = principal.ok_or(RestError::Unauthorized)?;
        let manager = principal.has_rights(USERS_MANAGE);

        let mut update = UpdateUser::default();

        if let Some(name) = body.get("name").and_then(Value::as_str) {
            validate_display_name(name)?;
            update.name = Some(name.to_string());
        }

        if let Some(password) = body.get("password").and_then(Value::as_str) {
            let old_password = body.get("old_password").and_then(Value::as_str);
            let old_ok = match old_password {
                Some(old) => {
                    verify_password(old, &entity.password_hash, self.pepper.as_deref())
                        .map_err(WardenError::from)?
                }
                None => false,
            };
            if !old_ok && !manager {
                return Err(RestError::Validation("Old password is not correct".into()));
            }
            validate_password(password)?;
            update.password = Some(password.to_string());
        }

        if let Some(active) = body.get("active").and_then(Value::as_bool) {
            if !manager {
                return Err(Self::deny(principal));
            }
            update.active = Some(active);
        }

        let group_ids = match body.get("groups") {
            None => None,
            Some(value) => {
                if !manager {
                    return Err(Self::deny(principal));
                }
                let names = string_list(value).ok_or_else(|| {
                    RestError::Validation("Groups must be a list of group names.".into())
                })?;
                Some(self.resolve_group_names(&names).await?)
            }
        };

        Ok(UserEdit { update, group_ids })
    }

    async fn insert(&self, data: CreateUser) -> Result<(), RestError> {
        self.users.create(data).await?;
        Ok(())
    }

    async fn find(&self, id: Uuid) -> Result<User, RestError> {
        Ok(self.users.get_by_id(id).await?)
    }

    async fn apply_edit(&self, id: Uuid, data: UserEdit) -> Result<(), RestError> {
        self.users.update(id, data.update).await?;
        if let Some(group_ids) = data.group_ids {
            self.groups.set_user_groups(id, group_ids).await?;
        }
        Ok(())
    }

    async fn remove(&self, id: Uuid) -> Result<(), RestError> {
        self.users.delete(id).await?;
        Ok(())
    }

    async fn search_page(
        &self,
        search: Option<String>,
        pagination: Pagination,
    ) -> Result<PaginatedResult<User>, RestError> {
        Ok(self.users.list(search, pagination).await?)
    }

    fn short(&self, entity: &User) -> Value {
        serde_json::to_value(projection::user_short(entity)).unwrap_or(Value::Null)
    }

    /// The user's full view is its identity shape: group names plus
    /// the effective permission set, freshly resolved from the store.
    async fn full(&self, entity: &User) -> Result<Value, RestError> {
        let groups = self.groups.get_user_groups(entity.id).await?;
        let mut grants = Vec::with_capacity(groups.len());
        for group in groups {
            let permissions = self.permissions.get_for_group(group.id).await?;
            grants.push(GroupGrants { group, permissions });
        }
        let claims = IdentityClaims::resolve(entity, &grants);
        serde_json::to_value(claims).map_err(|e| RestError::Internal(e.to_string()))
    }
}
