//! Keywarden Core — domain models, repository traits, the RBAC
//! resolver, and response projections.
//!
//! This crate is pure: no I/O, no HTTP, no storage engine. Everything
//! here is shared by the auth, db, and server crates.

pub mod error;
pub mod models;
pub mod projection;
pub mod rbac;
pub mod repository;
pub mod validate;

pub use error::{WardenError, WardenResult};
pub use rbac::{GroupGrants, IdentityClaims};
