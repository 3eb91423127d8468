//! strata-stores - Triple store implementations for strata.
//!
//! This crate provides backends for the current-state triple store consumed
//! by the versioning layer.
//!
//! # Supported Backends
//!
//! - **Memory** - in-process, tenant-keyed maps (embedded use, tests)
//! - **SQLite** - rusqlite-backed persistent store

mod factory;
mod memory;
mod sqlite;

pub use factory::TripleStoreFactory;
pub use memory::MemoryTripleStore;
pub use sqlite::SqliteTripleStore;

// Re-export core types
pub use strata_core::traits::{TripleStore, TripleStoreConfig, TripleStoreProvider};
