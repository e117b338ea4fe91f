//! HTTP routes: per-entity controller hooks plus the token endpoints.

pub mod group;
pub mod permission;
pub mod token;
pub mod user;

/// The server runs against the `any` engine so the same binary serves
/// an embedded in-memory store and a remote SurrealDB.
pub type Db = surrealdb::engine::any::Any;
