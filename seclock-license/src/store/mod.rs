//! Persistence collaborators.
//!
//! The license core only talks to the [`KeyStore`], [`GrantStore`] and
//! [`CycleCache`] traits. Two backends implement all three:
//! - [`MemoryStore`] for tests and ephemeral deployments
//! - [`SqliteStore`] for a single-file durable store

mod backend;
pub mod memory;
pub mod sqlite;

pub use backend::{CycleCache, GrantStore, KeyStore};
pub use memory::MemoryStore;
pub use sqlite::SqliteStore;
