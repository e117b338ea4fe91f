//! SurrealDB implementation of [`GroupRepository`].

use chrono::{DateTime, Utc};
use surrealdb::{Connection, Surreal};
use surrealdb_types::SurrealValue;
use uuid::Uuid;

use keywarden_core::error::WardenResult;
use keywarden_core::models::group::{CreateGroup, Group, UpdateGroup};
use keywarden_core::models::user::User;
use keywarden_core::repository::{GroupRepository, PaginatedResult, Pagination};

use crate::error::DbError;

/// DB-side row struct for queries where the UUID is already known.
#[derive(Debug, SurrealValue)]
struct GroupRow {
    name: String,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

/// DB-side row struct that includes the record ID via `meta::id(id)`.
#[derive(Debug, SurrealValue)]
struct GroupRowWithId {
    record_id: String,
    name: String,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl GroupRow {
    fn into_group(self, id: Uuid) -> Group {
        Group {
            id,
            name: self.name,
            created_at: self.created_at,
            updated_at: self.updated_at,
        }
    }
}

impl GroupRowWithId {
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

/// DB-side row struct for user members returned from edge queries.
#[derive(Debug, SurrealValue)]
struct MemberRow {
    record_id: String,
    active: bool,
    username: String,
    name: String,
    password_hash: String,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl MemberRow {
    fn try_into_user(self) -> Result<User, DbError> {
        let id = Uuid::parse_str(&self.record_id)
            .map_err(|e| DbError::Query(format!("invalid UUID: {e}")))?;
        Ok(User {
            id,
            active: self.active,
            username: self.username,
            name: self.name,
            password_hash: self.password_hash,
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

/// SurrealDB implementation of the Group repository.
#[derive(Clone)]
pub struct SurrealGroupRepository<C: Connection> {
    db: Surreal<C>,
}

impl<C: Connection> SurrealGroupRepository<C> {
    pub fn new(db: Surreal<C>) -> Self {
        Self { db }
    }
}

impl<C: Connection> GroupRepository for SurrealGroupRepository<C> {
    async fn create(&self, input: CreateGroup) -> WardenResult<Group> {
        let id = Uuid::new_v4();
        let id_str = id.to_string();

        let result = self
            .db
            .query("CREATE type::record('group', $id) SET name = $name")
            .bind(("id", id_str.clone()))
            .bind(("name", input.name))
            .await
            .map_err(DbError::from)?;

        let mut result = result
            .check()
            .map_err(|e| DbError::from_statement(e, "group"))?;

        let rows: Vec<GroupRow> = result.take(0).map_err(DbError::from)?;
        let row = rows.into_iter().next().ok_or_else(|| DbError::NotFound {
            entity: "group".into(),
            id: id_str,
        })?;

        Ok(row.into_group(id))
    }

    async fn get_by_id(&self, id: Uuid) -> WardenResult<Group> {
        let id_str = id.to_string();

        let mut result = self
            .db
            .query("SELECT * FROM type::record('group', $id)")
            .bind(("id", id_str.clone()))
            .await
            .map_err(DbError::from)?;

        let rows: Vec<GroupRow> = result.take(0).map_err(DbError::from)?;
        let row = rows.into_iter().next().ok_or_else(|| DbError::NotFound {
            entity: "group".into(),
            id: id_str,
        })?;

        Ok(row.into_group(id))
    }

    async fn get_by_name(&self, name: &str) -> WardenResult<Group> {
        let mut result = self
            .db
            .query("SELECT meta::id(id) AS record_id, * FROM group WHERE name = $name")
            .bind(("name", name.to_string()))
            .await
            .map_err(DbError::from)?;

        let rows: Vec<GroupRowWithId> = result.take(0).map_err(DbError::from)?;
        let row = rows.into_iter().next().ok_or_else(|| DbError::NotFound {
            entity: "group".into(),
            id: format!("name={name}"),
        })?;

        Ok(row.try_into_group()?)
    }

    async fn update(&self, id: Uuid, input: UpdateGroup) -> WardenResult<Group> {
        let id_str = id.to_string();

        let mut sets = Vec::new();
        if input.name.is_some() {
            sets.push("name = $name");
        }
        sets.push("updated_at = time::now()");

        let query = format!("UPDATE type::record('group', $id) SET {}", sets.join(", "));

        let mut builder = self.db.query(&query).bind(("id", id_str.clone()));
        if let Some(name) = input.name {
            builder = builder.bind(("name", name));
        }

        let result = builder.await.map_err(DbError::from)?;
        let mut result = result
            .check()
            .map_err(|e| DbError::from_statement(e, "group"))?;

        let rows: Vec<GroupRow> = result.take(0).map_err(DbError::from)?;
        let row = rows.into_iter().next().ok_or_else(|| DbError::NotFound {
            entity: "group".into(),
            id: id_str,
        })?;

        Ok(row.into_group(id))
    }

    async fn delete(&self, id: Uuid) -> WardenResult<()> {
        let id_str = id.to_string();

        // Membership and grant edges go with the record; users and
        // permissions stay.
        let query = format!(
            "BEGIN TRANSACTION;\n\
             DELETE member_of WHERE out = group:`{id_str}`;\n\
             DELETE grants WHERE in = group:`{id_str}`;\n\
             DELETE type::record('group', $id);\n\
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
    ) -> WardenResult<PaginatedResult<Group>> {
        let search = search.filter(|s| !s.is_empty());

        let filter = "WHERE string::contains(string::lowercase(name), \
                      string::lowercase($search)) ";
        let (count_query, select_query) = match &search {
            Some(_) => (
                format!("SELECT count() AS total FROM group {filter}GROUP ALL"),
                format!(
                    "SELECT meta::id(id) AS record_id, * FROM group {filter}\
                     ORDER BY created_at ASC LIMIT $limit START $offset"
                ),
            ),
            None => (
                "SELECT count() AS total FROM group GROUP ALL".to_string(),
                "SELECT meta::id(id) AS record_id, * FROM group \
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

        let rows: Vec<GroupRowWithId> = result.take(0).map_err(DbError::from)?;
        let items = rows
            .into_iter()
            .map(|row| row.try_into_group())
            .collect::<Result<Vec<_>, DbError>>()?;

        Ok(PaginatedResult {
            items,
            total,
            offset: pagination.offset,
            limit: pagination.limit,
        })
    }

    async fn add_member(&self, user_id: Uuid, group_id: Uuid) -> WardenResult<()> {
        let user_id_str = user_id.to_string();
        let group_id_str = group_id.to_string();

        // Verify both endpoints exist before creating the edge.
        let mut check = self
            .db
            .query(
                "SELECT count() AS total FROM user \
                 WHERE id = type::record('user', $user_id) GROUP ALL; \
                 SELECT count() AS total FROM group \
                 WHERE id = type::record('group', $group_id) GROUP ALL;",
            )
            .bind(("user_id", user_id_str.clone()))
            .bind(("group_id", group_id_str.clone()))
            .await
            .map_err(DbError::from)?;

        let user_count: Vec<CountRow> = check.take(0).map_err(DbError::from)?;
        if user_count.first().map(|r| r.total).unwrap_or(0) == 0 {
            return Err(DbError::NotFound {
                entity: "user".into(),
                id: user_id_str,
            }
            .into());
        }

        let group_count: Vec<CountRow> = check.take(1).map_err(DbError::from)?;
        if group_count.first().map(|r| r.total).unwrap_or(0) == 0 {
            return Err(DbError::NotFound {
                entity: "group".into(),
                id: group_id_str,
            }
            .into());
        }

        let query = format!("RELATE user:`{user_id_str}` -> member_of -> group:`{group_id_str}`;");

        // The unique (in, out) index gives the edge set semantics;
        // re-adding an existing member is a no-op.
        match self
            .db
            .query(query)
            .await
            .map_err(DbError::from)?
            .check()
            .map_err(|e| DbError::from_statement(e, "member_of"))
        {
            Ok(_) | Err(DbError::AlreadyExists { .. }) => Ok(()),
            Err(e) => Err(e.into()),
        }
    }

    async fn remove_member(&self, user_id: Uuid, group_id: Uuid) -> WardenResult<()> {
        self.db
            .query(
                "DELETE member_of WHERE \
                 in = type::record('user', $user_id) AND \
                 out = type::record('group', $group_id)",
            )
            .bind(("user_id", user_id.to_string()))
            .bind(("group_id", group_id.to_string()))
            .await
            .map_err(DbError::from)?;

        Ok(())
    }

    async fn get_members(&self, group_id: Uuid) -> WardenResult<Vec<User>> {
        let mut result = self
            .db
            .query(
                "SELECT meta::id(id) AS record_id, * FROM user \
                 WHERE id IN (\
                     SELECT VALUE in FROM member_of \
                     WHERE out = type::record('group', $group_id)\
                 ) \
                 ORDER BY created_at ASC",
            )
            .bind(("group_id", group_id.to_string()))
            .await
            .map_err(DbError::from)?;

        let rows: Vec<MemberRow> = result.take(0).map_err(DbError::from)?;
        let users = rows
            .into_iter()
            .map(|row| row.try_into_user())
            .collect::<Result<Vec<_>, DbError>>()?;

        Ok(users)
    }

    async fn get_user_groups(&self, user_id: Uuid) -> WardenResult<Vec<Group>> {
        let mut result = self
            .db
            .query(
                "SELECT meta::id(id) AS record_id, * FROM group \
                 WHERE id IN (\
                     SELECT VALUE out FROM member_of \
                     WHERE in = type::record('user', $user_id)\
                 ) \
                 ORDER BY created_at ASC",
            )
            .bind(("user_id", user_id.to_string()))
            .await
            .map_err(DbError::from)?;

        let rows: Vec<GroupRowWithId> = result.take(0).map_err(DbError::from)?;
        let groups = rows
            .into_iter()
            .map(|row| row.try_into_group())
            .collect::<Result<Vec<_>, DbError>>()?;

        Ok(groups)
    }

    async fn set_user_groups(&self, user_id: Uuid, group_ids: Vec<Uuid>) -> WardenResult<()> {
        let user_id_str = user_id.to_string();

        // Wholesale replacement: drop existing memberships and relate
        // the new set, all in one transaction.
        let mut statements = String::from("BEGIN TRANSACTION;\n");
        statements.push_str(&format!("DELETE member_of WHERE in = user:`{user_id_str}`;\n"));
        for group_id in &group_ids {
            statements.push_str(&format!(
                "RELATE user:`{user_id_str}` -> member_of -> group:`{group_id}`;\n"
            ));
        }
        statements.push_str("COMMIT TRANSACTION;");

        self.db
            .query(statements)
            .await
            .map_err(DbError::from)?
            .check()
            .map_err(|e| DbError::Query(e.to_string()))?;

        Ok(())
    }

    async fn replace_permissions(
        &self,
        group_id: Uuid,
        permission_ids: Vec<Uuid>,
    ) -> WardenResult<()> {
        let group_id_str = group_id.to_string();

        // Wholesale replacement, not additive.
        let mut statements = String::from("BEGIN TRANSACTION;\n");
        statements.push_str(&format!("DELETE grants WHERE in = group:`{group_id_str}`;\n"));
        for permission_id in &permission_ids {
            statements.push_str(&format!(
                "RELATE group:`{group_id_str}` -> grants -> permission:`{permission_id}`;\n"
            ));
        }
        statements.push_str("COMMIT TRANSACTION;");

        self.db
            .query(statements)
            .await
            .map_err(DbError::from)?
            .check()
            .map_err(|e| DbError::Query(e.to_string()))?;

        Ok(())
    }
}
