//! Keywarden Server — the HTTP surface.
//!
//! Layout:
//! - `crud.rs`: the generic entity controller (the reusable engine)
//! - `routes/`: per-entity hooks and the token endpoints
//! - `principal.rs`: request authentication
//! - `errors.rs`: consistent error responses
//! - `app.rs`: router assembly
//! - `config.rs`: environment configuration

pub mod app;
pub mod config;
pub mod crud;
pub mod errors;
pub mod principal;
pub mod routes;
