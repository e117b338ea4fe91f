//! Permission domain model.
//!
//! Permission names are free-form strings agreed by convention (e.g.
//! `iam_users_manage`), not a closed enum: new permissions are ordinary
//! rows created at runtime.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Permission {
    pub id: Uuid,
    pub name: String,
    pub description: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreatePermission {
    pub name: String,
    pub description: Option<String>,
}

/// Partial update: only `Some` fields are touched.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct UpdatePermission {
    pub name: Option<String>,
    pub description: Option<String>,
}
