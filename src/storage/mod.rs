//! Persistence backends for crmsync.
//!
//! This module provides the key-value layer under the record store:
//! - [`backend`] - The `PersistenceBackend` contract and listener registry
//! - [`sqlite`] - Durable SQLite backend (WAL mode, transactional writes)
//! - [`memory`] - In-process backend with failure injection
//! - [`schema`] - Database schema definitions

pub mod backend;
pub mod memory;
pub mod schema;
pub mod sqlite;

pub use backend::{
    ChangeEvent, ChangeListener, DEFAULT_QUOTA_BYTES, ListenerId, PersistenceBackend,
};
pub use memory::MemoryBackend;
pub use sqlite::SqliteBackend;
