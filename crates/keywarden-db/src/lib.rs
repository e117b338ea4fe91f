//! Keywarden Database — SurrealDB connection management, schema
//! migrations, seed data, and repository implementations.
//!
//! The identity graph is stored as three record tables (`user`,
//! `group`, `permission`) plus two relation tables: `member_of`
//! (user → group) and `grants` (group → permission). Edges carry
//! nothing beyond their endpoints.

mod connection;
mod error;
mod schema;
mod seed;

pub mod repository;

pub use connection::{DbConfig, DbManager};
pub use error::DbError;
pub use schema::run_migrations;
pub use seed::{ADMIN_GROUP, DEFAULT_GROUP, seed_defaults};
