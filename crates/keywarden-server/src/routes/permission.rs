//! Permission entity hooks for the generic controller.
//!
//! Every operation requires `iam_permission_manage`.

use serde_json::Value;
use uuid::Uuid;

use keywarden_core::WardenError;
use keywarden_core::models::{CreatePermission, Permission, UpdatePermission};
use keywarden_core::projection;
use keywarden_core::repository::{
    PaginatedResult, Pagination, PermissionRepository as _,
};
use keywarden_core::validate::validate_permission_name;
use keywarden_db::repository::SurrealPermissionRepository;

use crate::crud::{CrudPolicy, EntityHooks};
use crate::errors::RestError;
use crate::principal::Principal;

pub const PERMISSION_MANAGE: &str = "iam_permission_manage";

#[derive(Clone)]
pub struct PermissionHooks {
    permissions: SurrealPermissionRepository<super::Db>,
}

impl PermissionHooks {
    pub fn new(permissions: SurrealPermissionRepository<super::Db>) -> Self {
        Self { permissions }
    }

    /// Reject a name already taken by a different permission.
    async fn ensure_name_free(&self, name: &str, except: Option<Uuid>) -> Result<(), RestError> {
        match self.permissions.get_by_name(name).await {
            Ok(existing) if Some(existing.id) != except => {
                Err(RestError::Validation("Permission already exists.".into()))
            }
            Ok(_) => Ok(()),
            Err(WardenError::NotFound { .. }) => Ok(()),
            Err(e) => Err(e.into()),
        }
    }
}

fn body_str<'a>(body: &'a Value, field: &str) -> Option<&'a str> {
    body.get(field).and_then(Value::as_str)
}

impl EntityHooks for PermissionHooks {
    type Entity = Permission;
    type CreateData = CreatePermission;
    type EditData = UpdatePermission;

    const CODE: &'static str = "permission";

    fn policy(&self) -> CrudPolicy {
        CrudPolicy::uniform(PERMISSION_MANAGE)
    }

    async fn prepare_create(
        &self,
        _principal: Option<&Principal>,
        body: &Value,
    ) -> Result<CreatePermission, RestError> {
        let name = body_str(body, "name")
            .ok_or_else(|| RestError::Validation("Permission name can't be null.".into()))?;
        validate_permission_name(name)?;
        self.ensure_name_free(name, None).await?;

        Ok(CreatePermission {
            name: name.to_string(),
            description: body_str(body, "description").map(str::to_string),
        })
    }

    async fn prepare_edit(
        &self,
        _principal: Option<&Principal>,
        entity: &Permission,
        body: &Value,
    ) -> Result<UpdatePermission, RestError> {
        let mut update = UpdatePermission::default();

        if let Some(name) = body_str(body, "name") {
            validate_permission_name(name)?;
            self.ensure_name_free(name, Some(entity.id)).await?;
            update.name = Some(name.to_string());
        }
        if let Some(description) = body_str(body, "description") {
            update.description = Some(description.to_string());
        }

        Ok(update)
    }

    async fn insert(&self, data: CreatePermission) -> Result<(), RestError> {
        self.permissions.create(data).await?;
        Ok(())
    }

    async fn find(&self, id: Uuid) -> Result<Permission, RestError> {
        Ok(self.permissions.get_by_id(id).await?)
    }

    async fn apply_edit(&self, id: Uuid, data: UpdatePermission) -> Result<(), RestError> {
        self.permissions.update(id, data).await?;
        Ok(())
    }

    async fn remove(&self, id: Uuid) -> Result<(), RestError> {
        self.permissions.delete(id).await?;
        Ok(())
    }

    async fn search_page(
        &self,
        search: Option<String>,
        pagination: Pagination,
    ) -> Result<PaginatedResult<Permission>, RestError> {
        Ok(self.permissions.list(search, pagination).await?)
    }

    fn short(&self, entity: &Permission) -> Value {
        serde_json::to_value(projection::permission_short(entity)).unwrap_or(Value::Null)
    }

    async fn full(&self, entity: &Permission) -> Result<Value, RestError> {
        let groups = self.permissions.get_groups_holding(entity.id).await?;
        let full = projection::permission_full(entity, &groups);
        serde_json::to_value(full).map_err(|e| RestError::Internal(e.to_string()))
    }
}
