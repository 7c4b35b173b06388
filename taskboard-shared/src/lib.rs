//! # Taskboard Shared Library
//!
//! Domain types and the query/patch/referential-integrity engine used by the
//! Taskboard API server.
//!
//! ## Module Organization
//!
//! - `models`: Users, task statuses, labels and tasks, plus their DTOs
//! - `patch`: `PatchField`, the tri-state update wrapper
//! - `filter`: Composable task predicates and the filter builder
//! - `repository`: Storage contract (repositories, unit of work, store)
//! - `store`: In-memory and PostgreSQL implementations of the contract
//! - `patcher`: Applies update payloads to entities
//! - `guard`: Pre-delete referential checks
//! - `service`: Generic CRUD orchestration per entity kind
//! - `auth`: Password hashing, JWT and credential checks
//! - `db`: Connection pool and migrations
//! - `error`: Service-level error type

pub mod auth;
pub mod db;
pub mod error;
pub mod filter;
pub mod guard;
pub mod models;
pub mod patch;
pub mod patcher;
pub mod repository;
pub mod service;
pub mod store;

/// Current version of the Taskboard shared library
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_version_is_set() {
        assert!(!VERSION.is_empty());
    }
}
