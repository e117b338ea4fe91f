//! SurrealDB implementation of [`PermissionRepository`].

use chrono::{DateTime, Utc};
use surrealdb::{Connection, Surreal};
use surrealdb_types::SurrealValue;
use uuid::Uuid;

use keywarden_core::error::WardenResult;
use keywarden_core::models::group::Group;
use keywarden_core::models::permission::{CreatePermission, Permission, UpdatePermission};
use keywarden_core::repository::{PaginatedResult, Pagination, PermissionRepository};

use crate::error::DbError;

/// DB-side row struct for queries where the UUID is already known.
#[derive(Debug, SurrealValue)]
struct PermissionRow {
    name: String,
    description: Option<String>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

/// DB-side row struct that includes the record ID via `meta::id(id)`.
#[derive(Debug, SurrealValue)]
struct PermissionRowWithId {
    record_id: String,
    name: String,
    description: Option<String>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl PermissionRow {
    fn into_permission(self, id: Uuid) -> Permission {
        Permission {
            id,
            name: self.name,
            description: self.description,
            created_at: self.created_at,
            updated_at: self.updated_at,
        }
    }
}

impl PermissionRowWithId {
    fn try_into_permission(self) -> Result<Permission, DbError> {
        let id = Uuid::parse_str(&self.record_id)
            .map_err(|e| DbError::Query(format!("invalid UUID: {e}")))?;
        Ok(Permission {
            id,
            name: self.name,
            description: self.description,
            created_at: self.created_at,
            updated_at: self.updated_at,
        })
    }
}

/// DB-side row struct for groups returned from edge queries.
#[derive(Debug, SurrealValue)]
struct HolderRow {
    record_id: String,
    name: String,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl HolderRow {
    fn try_into_group(self) -> Result<Group, DbError> {
        let id = Uuid::parse_str(&self.record_id)
            .map_err(|e| DbError::Query(format!("invalid UUID: {e}")))?;
        Ok(Group {
            id,
            name: self.name,
            created_at: self.created_at,
            updated_at: self.updated_at,
        })
    }
}

/// Row struct for count queries.
#[derive(Debug, SurrealValue)]
struct CountRow {
    total: u64,
}

/// SurrealDB implementation of the Permission repository.
#[derive(Clone)]
pub struct SurrealPermissionRepository<C: Connection> {
    db: Surreal<C>,
}

impl<C: Connection> SurrealPermissionRepository<C> {
    pub fn new(db: Surreal<C>) -> Self {
        Self { db }
    }
}

impl<C: Connection> PermissionRepository for SurrealPermissionRepository<C> {
    async fn create(&self, input: CreatePermission) -> WardenResult<Permission> {
        let id = Uuid::new_v4();
        let id_str = id.to_string();

        let mut sets = vec!["name = $name"];
        if input.description.is_some() {
            sets.push("description = $description");
        }
        let query = format!(
            "CREATE type::record('permission', $id) SET {}",
            sets.join(", ")
        );

        let mut builder = self
            .db
            .query(&query)
            .bind(("id", id_str.clone()))
            .bind(("name", input.name));
        if let Some(description) = input.description {
            builder = builder.bind(("description", description));
        }

        let result = builder.await.map_err(DbError::from)?;

        let mut result = result
            .check()
            .map_err(|e| DbError::from_statement(e, "permission"))?;

        let rows: Vec<PermissionRow> = result.take(0).map_err(DbError::from)?;
        let row = rows.into_iter().next().ok_or_else(|| DbError::NotFound {
            entity: "permission".into(),
            id: id_str,
        })?;

        Ok(row.into_permission(id))
    }

    async fn get_by_id(&self, id: Uuid) -> WardenResult<Permission> {
        let id_str = id.to_string();

        let mut result = self
            .db
            .query("SELECT * FROM type::record('permission', $id)")
            .bind(("id", id_str.clone()))
            .await
            .map_err(DbError::from)?;

        let rows: Vec<PermissionRow> = result.take(0).map_err(DbError::from)?;
        let row = rows.into_iter().next().ok_or_else(|| DbError::NotFound {
            entity: "permission".into(),
            id: id_str,
        })?;

        Ok(row.into_permission(id))
    }

    async fn get_by_name(&self, name: &str) -> WardenResult<Permission> {
        let mut result = self
            .db
            .query("SELECT meta::id(id) AS record_id, * FROM permission WHERE name = $name")
            .bind(("name", name.to_string()))
            .await
            .map_err(DbError::from)?;

        let rows: Vec<PermissionRowWithId> = result.take(0).map_err(DbError::from)?;
        let row = rows.into_iter().next().ok_or_else(|| DbError::NotFound {
            entity: "permission".into(),
            id: format!("name={name}"),
        })?;

        Ok(row.try_into_permission()?)
    }

    async fn update(&self, id: Uuid, input: UpdatePermission) -> WardenResult<Permission> {
        let id_str = id.to_string();

        let mut sets = Vec::new();
        if input.name.is_some() {
            sets.push("name = $name");
        }
        if input.description.is_some() {
            sets.push("description = $description");
        }
        sets.push("updated_at = time::now()");

        let query = format!(
            "UPDATE type::record('permission', $id) SET {}",
            sets.join(", ")
        );

        let mut builder = self.db.query(&query).bind(("id", id_str.clone()));
        if let Some(name) = input.name {
            builder = builder.bind(("name", name));
        }
        if let Some(description) = input.description {
            builder = builder.bind(("description", description));
        }

        let result = builder.await.map_err(DbError::from)?;
        let mut result = result
            .check()
            .map_err(|e| DbError::from_statement(e, "permission"))?;

        let rows: Vec<PermissionRow> = result.take(0).map_err(DbError::from)?;
        let row = rows.into_iter().next().ok_or_else(|| DbError::NotFound {
            entity: "permission".into(),
            id: id_str,
        })?;

        Ok(row.into_permission(id))
    }

    async fn delete(&self, id: Uuid) -> WardenResult<()> {
        let id_str = id.to_string();

        // Grant edges go with the record; groups stay.
        let query = format!(
            "BEGIN TRANSACTION;\n\
             DELETE grants WHERE out = permission:`{id_str}`;\n\
             DELETE type::record('permission', $id);\n\
             COMMIT TRANSACTION;"
        );

        self.db
            .query(query)
            .bind(("id", id_str))
            .await
            .map_err(DbError::from)?
            .check()
            .map_err(|e| DbError::Query(e.to_string()))?;

        Ok(())
    }

    async fn list(
        &self,
        search: Option<String>,
        pagination: Pagination,
    ) -> WardenResult<PaginatedResult<Permission>> {
        let search = search.filter(|s| !s.is_empty());

        let filter = "WHERE string::contains(string::lowercase(name), \
                      string::lowercase($search)) ";
        let (count_query, select_query) = match &search {
            Some(_) => (
                format!("SELECT count() AS total FROM permission {filter}GROUP ALL"),
                format!(
                    "SELECT meta::id(id) AS record_id, * FROM permission {filter}\
                     ORDER BY created_at ASC LIMIT $limit START $offset"
                ),
            ),
            None => (
                "SELECT count() AS total FROM permission GROUP ALL".to_string(),
                "SELECT meta::id(id) AS record_id, * FROM permission \
                 ORDER BY created_at ASC LIMIT $limit START $offset"
                    .to_string(),
            ),
        };

        let mut count_builder = self.db.query(&count_query);
        if let Some(term) = &search {
            count_builder = count_builder.bind(("search", term.clone()));
        }
        let mut count_result = count_builder.await.map_err(DbError::from)?;
        let count_rows: Vec<CountRow> = count_result.take(0).map_err(DbError::from)?;
        let total = count_rows.first().map(|r| r.total).unwrap_or(0);

        let mut builder = self
            .db
            .query(&select_query)
            .bind(("limit", pagination.limit))
            .bind(("offset", pagination.offset));
        if let Some(term) = search {
            builder = builder.bind(("search", term));
        }
        let mut result = builder.await.map_err(DbError::from)?;

        let rows: Vec<PermissionRowWithId> = result.take(0).map_err(DbError::from)?;
        let items = rows
            .into_iter()
            .map(|row| row.try_into_permission())
            .collect::<Result<Vec<_>, DbError>>()?;

        Ok(PaginatedResult {
            items,
            total,
            offset: pagination.offset,
            limit: pagination.limit,
        })
    }

    async fn get_for_group(&self, group_id: Uuid) -> WardenResult<Vec<Permission>> {
        let mut result = self
            .db
            .query(
                "SELECT meta::id(id) AS record_id, * FROM permission \
                 WHERE id IN (\
                     SELECT VALUE out FROM grants \
                     WHERE in = type::record('group', $group_id)\
                 ) \
                 ORDER BY created_at ASC",
            )
            .bind(("group_id", group_id.to_string()))
            .await
            .map_err(DbError::from)?;

        let rows: Vec<PermissionRowWithId> = result.take(0).map_err(DbError::from)?;
        let permissions = rows
            .into_iter()
            .map(|row| row.try_into_permission())
            .collect::<Result<Vec<_>, DbError>>()?;

        Ok(permissions)
    }

    async fn get_groups_holding(&self, permission_id: Uuid) -> WardenResult<Vec<Group>> {
        let mut result = self
            .db
            .query(
                "SELECT meta::id(id) AS record_id, * FROM group \
                 WHERE id IN (\
                     SELECT VALUE in FROM grants \
                     WHERE out = type::record('permission', $permission_id)\
                 ) \
                 ORDER BY created_at ASC",
            )
            .bind(("permission_id", permission_id.to_string()))
            .await
            .map_err(DbError::from)?;

        let rows: Vec<HolderRow> = result.take(0).map_err(DbError::from)?;
        let groups = rows
            .into_iter()
            .map(|row| row.try_into_group())
            .collect::<Result<Vec<_>, DbError>>()?;

        Ok(groups)
    }
}
