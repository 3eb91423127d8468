//! strata-core - Core library for strata.
//!
//! This crate provides the core types, traits, and the bitemporal versioning
//! layer for multi-tenant knowledge graphs: an append-only version log with
//! strictly monotonic per-fact sequencing, temporal queries (as-of, range,
//! by-version), field-level version diffs, and named whole-tenant snapshots
//! with atomic restore.
//!
//! # Example
//!
//! ```ignore
//! use std::sync::Arc;
//! use strata_core::{ChangeType, MemoryVersionLog, Triple, VersioningConfig, VersioningManager};
//!
//! let config = VersioningConfig::default();
//! let manager = VersioningManager::new(config, store, Arc::new(MemoryVersionLog::new()));
//!
//! // Record the creation of a fact
//! let triple = Triple::new("tenant-a", "person:a", "rel:worksFor", "org:b", "g:default");
//! let version = manager
//!     .record_version(&triple, ChangeType::Creation, "tenant-a", None, None)
//!     .await?;
//!
//! // What did the graph look like last week?
//! let state = manager
//!     .query_temporal(&TemporalQuery::as_of(last_week), "tenant-a")
//!     .await?;
//! ```

pub mod config;
pub mod error;
pub mod traits;
pub mod types;
pub mod versioning;

// Re-export commonly used types
pub use config::{VersionLogConfig, VersionLogProvider, VersioningConfig};
pub use error::{ErrorCode, StrataError, StrataResult};
pub use traits::{
    TripleQuery, TripleQueryResult, TripleStore, TripleStoreConfig, TripleStoreProvider,
};
pub use types::{
    FieldChange, SnapshotMetadata, TemporalQuery, TemporalQueryResult, Triple, VersionDiff,
};
pub use versioning::{
    ChangeType, MemoryVersionLog, SnapshotManager, SqliteVersionLog, TemporalQueryEvaluator,
    TripleVersion, VersionLog, VersionSummary, VersioningManager,
};
