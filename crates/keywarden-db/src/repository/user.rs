//! SurrealDB implementation of [`UserRepository`].
//!
//! Password hashing uses Argon2id with OWASP-recommended parameters
//! (memory: 19 MiB, iterations: 2, parallelism: 1) and a random salt
//! per hash. An optional pepper (server-side secret) can be provided
//! at construction time and must match the one used at verification.

use argon2::password_hash::SaltString;
use argon2::{Argon2, PasswordHasher};
use chrono::{DateTime, Utc};
use surrealdb::{Connection, Surreal};
use surrealdb_types::SurrealValue;
use uuid::Uuid;

use keywarden_core::WardenError;
use keywarden_core::error::WardenResult;
use keywarden_core::models::user::{CreateUser, UpdateUser, User};
use keywarden_core::repository::{PaginatedResult, Pagination, UserRepository};

use crate::error::DbError;

/// DB-side row struct for queries where the UUID is already known.
#[derive(Debug, SurrealValue)]
struct UserRow {
    active: bool,
    username: String,
    name: String,
    password_hash: String,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

/// DB-side row struct that includes the record ID via `meta::id(id)`.
#[derive(Debug, SurrealValue)]
struct UserRowWithId {
    record_id: String,
    active: bool,
    username: String,
    name: String,
    password_hash: String,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl UserRow {
    fn into_user(self, id: Uuid) -> User {
        User {
            id,
            active: self.active,
            username: self.username,
            name: self.name,
            password_hash: self.password_hash,
            created_at: self.created_at,
            updated_at: self.updated_at,
        }
    }
}

impl UserRowWithId {
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

/// Hash a password with Argon2id using OWASP-recommended parameters.
fn hash_password(password: &str, pepper: Option<&str>) -> Result<String, WardenError> {
    // OWASP ASVS recommended: m=19456 (19 MiB), t=2, p=1
    let params = argon2::Params::new(19456, 2, 1, None)
        .map_err(|e| WardenError::Crypto(format!("argon2 params error: {e}")))?;
    let argon2 = Argon2::new(argon2::Algorithm::Argon2id, argon2::Version::V0x13, params);

    let peppered: String;
    let input = match pepper {
        Some(p) => {
            peppered = format!("{p}{password}");
            peppered.as_bytes()
        }
        None => password.as_bytes(),
    };

    let salt = SaltString::generate(&mut argon2::password_hash::rand_core::OsRng);
    let hash = argon2
        .hash_password(input, &salt)
        .map_err(|e| WardenError::Crypto(format!("password hash error: {e}")))?;

    Ok(hash.to_string())
}

/// SurrealDB implementation of the User repository.
#[derive(Clone)]
pub struct SurrealUserRepository<C: Connection> {
    db: Surreal<C>,
    /// Optional server-side pepper for password hashing.
    pepper: Option<String>,
}

impl<C: Connection> SurrealUserRepository<C> {
    pub fn new(db: Surreal<C>) -> Self {
        Self { db, pepper: None }
    }

    pub fn with_pepper(db: Surreal<C>, pepper: String) -> Self {
        Self {
            db,
            pepper: Some(pepper),
        }
    }
}

impl<C: Connection> UserRepository for SurrealUserRepository<C> {
    async fn create(&self, input: CreateUser) -> WardenResult<User> {
        let id = Uuid::new_v4();
        let id_str = id.to_string();

        let password_hash = hash_password(&input.password, self.pepper.as_deref())?;

        // The user record and its initial membership edges commit as
        // one unit.
        let mut statements = String::from("BEGIN TRANSACTION;\n");
        statements.push_str(
            "CREATE type::record('user', $id) SET \
             active = $active, username = $username, \
             name = $name, password_hash = $password_hash;\n",
        );
        for group_id in &input.group_ids {
            statements
                .push_str(&format!("RELATE user:`{id_str}` -> member_of -> group:`{group_id}`;\n"));
        }
        statements.push_str("COMMIT TRANSACTION;");

        let result = self
            .db
            .query(statements)
            .bind(("id", id_str.clone()))
            .bind(("active", input.active))
            .bind(("username", input.username))
            .bind(("name", input.name))
            .bind(("password_hash", password_hash))
            .await
            .map_err(DbError::from)?;

        result
            .check()
            .map_err(|e| DbError::from_statement(e, "user"))?;

        self.get_by_id(id).await
    }

    async fn get_by_id(&self, id: Uuid) -> WardenResult<User> {
        let id_str = id.to_string();

        let mut result = self
            .db
            .query("SELECT * FROM type::record('user', $id)")
            .bind(("id", id_str.clone()))
            .await
            .map_err(DbError::from)?;

        let rows: Vec<UserRow> = result.take(0).map_err(DbError::from)?;
        let row = rows.into_iter().next().ok_or_else(|| DbError::NotFound {
            entity: "user".into(),
            id: id_str,
        })?;

        Ok(row.into_user(id))
    }

    async fn get_by_username(&self, username: &str) -> WardenResult<User> {
        let mut result = self
            .db
            .query(
                "SELECT meta::id(id) AS record_id, * FROM user \
                 WHERE username = $username",
            )
            .bind(("username", username.to_string()))
            .await
            .map_err(DbError::from)?;

        let rows: Vec<UserRowWithId> = result.take(0).map_err(DbError::from)?;
        let row = rows.into_iter().next().ok_or_else(|| DbError::NotFound {
            entity: "user".into(),
            id: format!("username={username}"),
        })?;

        Ok(row.try_into_user()?)
    }

    async fn update(&self, id: Uuid, input: UpdateUser) -> WardenResult<User> {
        let id_str = id.to_string();

        let password_hash = match &input.password {
            Some(password) => Some(hash_password(password, self.pepper.as_deref())?),
            None => None,
        };

        let mut sets = Vec::new();
        if input.name.is_some() {
            sets.push("name = $name");
        }
        if password_hash.is_some() {
            sets.push("password_hash = $password_hash");
        }
        if input.active.is_some() {
            sets.push("active = $active");
        }
        sets.push("updated_at = time::now()");

        let query = format!(
            "UPDATE type::record('user', $id) SET {}",
            sets.join(", ")
        );

        let mut builder = self.db.query(&query).bind(("id", id_str.clone()));

        if let Some(name) = input.name {
            builder = builder.bind(("name", name));
        }
        if let Some(hash) = password_hash {
            builder = builder.bind(("password_hash", hash));
        }
        if let Some(active) = input.active {
            builder = builder.bind(("active", active));
        }

        let result = builder.await.map_err(DbError::from)?;
        let mut result = result
            .check()
            .map_err(|e| DbError::from_statement(e, "user"))?;

        let rows: Vec<UserRow> = result.take(0).map_err(DbError::from)?;
        let row = rows.into_iter().next().ok_or_else(|| DbError::NotFound {
            entity: "user".into(),
            id: id_str,
        })?;

        Ok(row.into_user(id))
    }

    async fn delete(&self, id: Uuid) -> WardenResult<()> {
        let id_str = id.to_string();

        // Membership edges go with the record; groups stay.
        let query = format!(
            "BEGIN TRANSACTION;\n\
             DELETE member_of WHERE in = user:`{id_str}`;\n\
             DELETE type::record('user', $id);\n\
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
    ) -> WardenResult<PaginatedResult<User>> {
        let search = search.filter(|s| !s.is_empty());

        // Substring match on the username, case-insensitive.
        let filter = "WHERE string::contains(string::lowercase(username), \
                      string::lowercase($search)) ";
        let (count_query, select_query) = match &search {
            Some(_) => (
                format!("SELECT count() AS total FROM user {filter}GROUP ALL"),
                format!(
                    "SELECT meta::id(id) AS record_id, * FROM user {filter}\
                     ORDER BY created_at ASC LIMIT $limit START $offset"
                ),
            ),
            None => (
                "SELECT count() AS total FROM user GROUP ALL".to_string(),
                "SELECT meta::id(id) AS record_id, * FROM user \
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

        let rows: Vec<UserRowWithId> = result.take(0).map_err(DbError::from)?;
        let items = rows
            .into_iter()
            .map(|row| row.try_into_user())
            .collect::<Result<Vec<_>, DbError>>()?;

        Ok(PaginatedResult {
            items,
            total,
            offset: pagination.offset,
            limit: pagination.limit,
        })
    }
}
