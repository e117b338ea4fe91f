//! Group domain model.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// A named set of users carrying a set of permissions. A user's
/// effective rights are the union of its groups' permission grants.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Group {
    pub id: Uuid,
    pub name: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateGroup {
    pub name: String,
}

/// Partial update: only `Some` fields are touched.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct UpdateGroup {
    pub name: Option<String>,
}
