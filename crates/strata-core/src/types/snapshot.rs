//! Snapshot metadata types.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Metadata for a named, immutable snapshot of a tenant's graph.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SnapshotMetadata {
    /// Snapshot name, unique per tenant.
    pub name: String,
    /// Tenant the snapshot belongs to.
    pub tenant_id: String,
    /// When the snapshot was captured.
    pub created_at: DateTime<Utc>,
    /// Number of triples captured.
    pub triple_count: usize,
}
