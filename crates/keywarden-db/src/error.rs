//! Database-specific error types and conversions.

use keywarden_core::WardenError;

/// Database-layer error type.
#[derive(Debug, thiserror::Error)]
pub enum DbError {
    #[error("SurrealDB error: {0}")]
    Surreal(#[from] surrealdb::Error),

    #[error("Query failed: {0}")]
    Query(String),

    #[error("Record not found: {entity} with id {id}")]
    NotFound { entity: String, id: String },

    #[error("Record already exists: {entity}")]
    AlreadyExists { entity: String },
}

impl DbError {
    /// Classify a statement failure, surfacing unique-index violations
    /// as `AlreadyExists` so the REST layer can answer 400 instead of
    /// 500.
    pub(crate) fn from_statement(err: surrealdb::Error, entity: &str) -> Self {
        if err.to_string().contains("already contains") {
            DbError::AlreadyExists {
                entity: entity.into(),
            }
        } else {
            DbError::Query(err.to_string())
        }
    }
}

impl From<DbError> for WardenError {
    fn from(err: DbError) -> Self {
        match err {
            DbError::NotFound { entity, id } => WardenError::NotFound { entity, id },
            DbError::AlreadyExists { entity } => WardenError::AlreadyExists { entity },
            other => WardenError::Database(other.to_string()),
        }
    }
}
