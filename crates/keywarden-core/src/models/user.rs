//! User domain model.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct User {
    pub id: Uuid,
    /// Inactive until an administrator flips the flag. Self-registered
    /// accounts always start inactive.
    pub active: bool,
    pub username: String,
    /// Display name; defaults to the username when left blank.
    pub name: String,
    pub password_hash: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateUser {
    pub username: String,
    pub name: String,
    /// Raw password; hashed with Argon2id at the store boundary.
    pub password: String,
    pub active: bool,
    /// Initial group memberships, persisted in the same transaction as
    /// the user record itself.
    pub group_ids: Vec<Uuid>,
}

/// Partial update: only `Some` fields are touched.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct UpdateUser {
    pub name: Option<String>,
    /// Raw password; hashed with Argon2id at the store boundary.
    pub password: Option<String>,
    pub active: Option<bool>,
}
