//! Group entity hooks for the generic controller.
//!
//! Every operation requires `iam_group_manage`. Edit accepts a new
//! `name` and/or a `permissions` list of permission names; the list
//! replaces the group's grant set wholesale.

use serde_json::Value;
use uuid::Uuid;

use keywarden_core::WardenError;
use keywarden_core::models::{CreateGroup, Group, UpdateGroup};
use keywarden_core::projection;
use keywarden_core::repository::{
    GroupRepository as _, PaginatedResult, Pagination, PermissionRepository as _,
};
use keywarden_core::validate::validate_group_name;
use keywarden_db::repository::{SurrealGroupRepository, SurrealPermissionRepository};

use crate::crud::{CrudPolicy, EntityHooks};
use crate::errors::RestError;
use crate::principal::Principal;

pub const GROUP_MANAGE: &str = "iam_group_manage";

#[derive(Clone)]
pub struct GroupHooks {
    groups: SurrealGroupRepository<super::Db>,
    permissions: SurrealPermissionRepository<super::Db>,
}

impl GroupHooks {
    pub fn new(
        groups: SurrealGroupRepository<super::Db>,
        permissions: SurrealPermissionRepository<super::Db>,
    ) -> Self {
        Self {
            groups,
            permissions,
        }
    }

    /// Reject a name already taken by a different group.
    async fn ensure_name_free(&self, name: &str, except: Option<Uuid>) -> Result<(), RestError> {
        match self.groups.get_by_name(name).await {
            Ok(existing) if Some(existing.id) != except => {
                Err(RestError::Validation("Group already exists.".into()))
            }
            Ok(_) => Ok(()),
            Err(WardenError::NotFound { .. }) => Ok(()),
            Err(e) => Err(e.into()),
        }
    }

    /// Resolve a list of permission names to ids; unknown names are a
    /// validation error rather than silently dropped.
    async fn resolve_permission_names(&self, names: &[String]) -> Result<Vec<Uuid>, RestError> {
        let mut ids = Vec::with_capacity(names.len());
        for name in names {
            match self.permissions.get_by_name(name).await {
                Ok(permission) => ids.push(permission.id),
                Err(WardenError::NotFound { .. }) => {
                    return Err(RestError::Validation(format!(
                        "Unknown permission \"{name}\""
                    )));
                }
                Err(e) => return Err(e.into()),
            }
        }
        Ok(ids)
    }
}

/// Edit payload: an optional rename plus an optional wholesale grant
/// replacement.
pub struct GroupEdit {
    update: UpdateGroup,
    permission_ids: Option<Vec<Uuid>>,
}

fn string_list(value: &Value) -> Option<Vec<String>> {
    let items = value.as_array()?;
    items
        .iter()
        .map(|v| v.as_str().map(str::to_string))
        .collect()
}

impl EntityHooks for GroupHooks {
    type Entity = Group;
    type CreateData = CreateGroup;
    type EditData = GroupEdit;

    const CODE: &'static str = "group";

    fn policy(&self) -> CrudPolicy {
        CrudPolicy::uniform(GROUP_MANAGE)
    }

    async fn prepare_create(
        &self,
        _principal: Option<&Principal>,
        body: &Value,
    ) -> Result<CreateGroup, RestError> {
        let name = body
            .get("name")
            .and_then(Value::as_str)
            .ok_or_else(|| RestError::Validation("Group name can't be null.".into()))?;
        validate_group_name(name)?;
        self.ensure_name_free(name, None).await?;

        Ok(CreateGroup {
            name: name.to_string(),
        })
    }

    async fn prepare_edit(
        &self,
        _principal: Option<&Principal>,
        entity: &Group,
        body: &Value,
    ) -> Result<GroupEdit, RestError> {
        let mut update = UpdateGroup::default();

        if let Some(name) = body.get("name").and_then(Value::as_str) {
            validate_group_name(name)?;
            self.ensure_name_free(name, Some(entity.id)).await?;
            update.name = Some(name.to_string());
        }

        let permission_ids = match body.get("permissions") {
            None => None,
            Some(value) => {
                let names = string_list(value).ok_or_else(|| {
                    RestError::Validation("Permissions must be a list of permission names.".into())
                })?;
                Some(self.resolve_permission_names(&names).await?)
            }
        };

        Ok(GroupEdit {
            update,
            permission_ids,
        })
    }

    async fn insert(&self, data: CreateGroup) -> Result<(), RestError> {
        self.groups.create(data).await?;
        Ok(())
    }

    async fn find(&self, id: Uuid) -> Result<Group, RestError> {
        Ok(self.groups.get_by_id(id).await?)
    }

    async fn apply_edit(&self, id: Uuid, data: GroupEdit) -> Result<(), RestError> {
        if data.update.name.is_some() {
            self.groups.update(id, data.update).await?;
        }
        if let Some(permission_ids) = data.permission_ids {
            self.groups.replace_permissions(id, permission_ids).await?;
        }
        Ok(())
    }

    async fn remove(&self, id: Uuid) -> Result<(), RestError> {
        self.groups.delete(id).await?;
        Ok(())
    }

    async fn search_page(
        &self,
        search: Option<String>,
        pagination: Pagination,
    ) -> Result<PaginatedResult<Group>, RestError> {
        Ok(self.groups.list(search, pagination).await?)
    }

    fn short(&self, entity: &Group) -> Value {
        serde_json::to_value(projection::group_short(entity)).unwrap_or(Value::Null)
    }

    async fn full(&self, entity: &Group) -> Result<Value, RestError> {
        let members = self.groups.get_members(entity.id).await?;
        let permissions = self.permissions.get_for_group(entity.id).await?;
        let full = projection::group_full(entity, &members, &permissions);
        serde_json::to_value(full).map_err(|e| RestError::Internal(e.to_string()))
    }
}
