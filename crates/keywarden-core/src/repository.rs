//! Repository trait definitions for data access abstraction.
//!
//! All repository operations are async. List operations take an
//! optional search term (substring match on the entity's primary name
//! field, case-insensitive) alongside pagination.

use uuid::Uuid;

use crate::error::WardenResult;
use crate::models::{
    group::{CreateGroup, Group, UpdateGroup},
    permission::{CreatePermission, Permission, UpdatePermission},
    user::{CreateUser, UpdateUser, User},
};

/// Pagination parameters for list queries.
#[derive(Debug, Clone, Copy)]
pub struct Pagination {
    pub offset: u64,
    pub limit: u64,
}

impl Default for Pagination {
    fn default() -> Self {
        Self {
            offset: 0,
            limit: 10,
        }
    }
}

/// A paginated result set.
#[derive(Debug, Clone)]
pub struct PaginatedResult<T> {
    pub items: Vec<T>,
    pub total: u64,
    pub offset: u64,
    pub limit: u64,
}

pub trait UserRepository: Send + Sync {
    /// Persist a new user together with its initial group memberships
    /// as one atomic write.
    fn create(&self, input: CreateUser) -> impl Future<Output = WardenResult<User>> + Send;
    fn get_by_id(&self, id: Uuid) -> impl Future<Output = WardenResult<User>> + Send;
    fn get_by_username(&self, username: &str)
    -> impl Future<Output = WardenResult<User>> + Send;
    fn update(
        &self,
        id: Uuid,
        input: UpdateUser,
    ) -> impl Future<Output = WardenResult<User>> + Send;
    /// Hard delete; removes the user's membership edges in the same
    /// transaction. Groups are untouched.
    fn delete(&self, id: Uuid) -> impl Future<Output = WardenResult<()>> + Send;
    /// List users, optionally filtered by a username substring.
    fn list(
        &self,
        search: Option<String>,
        pagination: Pagination,
    ) -> impl Future<Output = WardenResult<PaginatedResult<User>>> + Send;
}

pub trait GroupRepository: Send + Sync {
    fn create(&self, input: CreateGroup) -> impl Future<Output = WardenResult<Group>> + Send;
    fn get_by_id(&self, id: Uuid) -> impl Future<Output = WardenResult<Group>> + Send;
    fn get_by_name(&self, name: &str) -> impl Future<Output = WardenResult<Group>> + Send;
    fn update(
        &self,
        id: Uuid,
        input: UpdateGroup,
    ) -> impl Future<Output = WardenResult<Group>> + Send;
    /// Hard delete; removes the group's membership and grant edges in
    /// the same transaction. Users and permissions are untouched.
    fn delete(&self, id: Uuid) -> impl Future<Output = WardenResult<()>> + Send;
    fn list(
        &self,
        search: Option<String>,
        pagination: Pagination,
    ) -> impl Future<Output = WardenResult<PaginatedResult<Group>>> + Send;

    /// Add a user to a group (`member_of` edge, set semantics).
    fn add_member(
        &self,
        user_id: Uuid,
        group_id: Uuid,
    ) -> impl Future<Output = WardenResult<()>> + Send;

    /// Remove a user from a group.
    fn remove_member(
        &self,
        user_id: Uuid,
        group_id: Uuid,
    ) -> impl Future<Output = WardenResult<()>> + Send;

    /// All members of a group.
    fn get_members(&self, group_id: Uuid) -> impl Future<Output = WardenResult<Vec<User>>> + Send;

    /// All groups a user belongs to.
    fn get_user_groups(
        &self,
        user_id: Uuid,
    ) -> impl Future<Output = WardenResult<Vec<Group>>> + Send;

    /// Replace a user's memberships wholesale, as one atomic write.
    fn set_user_groups(
        &self,
        user_id: Uuid,
        group_ids: Vec<Uuid>,
    ) -> impl Future<Output = WardenResult<()>> + Send;

    /// Replace a group's permission grants wholesale, as one atomic
    /// write.
    fn replace_permissions(
        &self,
        group_id: Uuid,
        permission_ids: Vec<Uuid>,
    ) -> impl Future<Output = WardenResult<()>> + Send;
}

pub trait PermissionRepository: Send + Sync {
    fn create(
        &self,
        input: CreatePermission,
    ) -> impl Future<Output = WardenResult<Permission>> + Send;
    fn get_by_id(&self, id: Uuid) -> impl Future<Output = WardenResult<Permission>> + Send;
    fn get_by_name(&self, name: &str) -> impl Future<Output = WardenResult<Permission>> + Send;
    fn update(
        &self,
        id: Uuid,
        input: UpdatePermission,
    ) -> impl Future<Output = WardenResult<Permission>> + Send;
    /// Hard delete; removes the permission's grant edges in the same
    /// transaction. Groups are untouched.
    fn delete(&self, id: Uuid) -> impl Future<Output = WardenResult<()>> + Send;
    fn list(
        &self,
        search: Option<String>,
        pagination: Pagination,
    ) -> impl Future<Output = WardenResult<PaginatedResult<Permission>>> + Send;

    /// All permissions granted to a group.
    fn get_for_group(
        &self,
        group_id: Uuid,
    ) -> impl Future<Output = WardenResult<Vec<Permission>>> + Send;

    /// All groups holding a permission (for the full projection).
    fn get_groups_holding(
        &self,
        permission_id: Uuid,
    ) -> impl Future<Output = WardenResult<Vec<Group>>> + Send;
}
