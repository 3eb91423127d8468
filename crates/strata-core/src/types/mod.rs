//! Core types for the strata versioning layer.

mod diff;
mod snapshot;
mod temporal;
mod triple;

pub use diff::{FieldChange, VersionDiff};
pub use snapshot::SnapshotMetadata;
pub use temporal::{TemporalQuery, TemporalQueryResult};
pub use triple::Triple;
