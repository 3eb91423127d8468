//! Triple version types for audit trails and point-in-time queries.
//!
//! Provides immutable snapshots of a fact's fields at each mutation,
//! enabling queries like "who did person A work for last March?"

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::types::Triple;

/// Kind of mutation that created a version.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ChangeType {
    /// The fact was created.
    Creation,
    /// The fact's fields were updated (including version restores).
    Update,
    /// The fact was deleted.
    Deletion,
}

impl ChangeType {
    /// Convert to string for storage.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Creation => "creation",
            Self::Update => "update",
            Self::Deletion => "deletion",
        }
    }

    /// Parse from string.
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "creation" => Some(Self::Creation),
            "update" => Some(Self::Update),
            "deletion" => Some(Self::Deletion),
            _ => None,
        }
    }
}

/// An immutable snapshot of a fact's fields at one point in its history.
///
/// Version numbers start at 1 and are strictly increasing per
/// `(tenant_id, triple_id)` with no gaps or duplicates; the log's conditional
/// append enforces this. Once written, a version is never mutated or deleted.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TripleVersion {
    /// Unique version record identifier.
    pub version_id: Uuid,
    /// The fact this version belongs to.
    pub triple_id: Uuid,
    /// Tenant that owns the fact.
    pub tenant_id: String,
    /// Sequential version number within this fact (1, 2, 3...).
    pub version_number: u32,
    /// Kind of mutation that created this version.
    pub change_type: ChangeType,
    /// User who made the change, if known.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub changed_by: Option<String>,
    /// Optional description of the change.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub change_comment: Option<String>,
    /// When this version was recorded.
    pub created_at: DateTime<Utc>,
    /// Subject at this version.
    pub subject_id: String,
    /// Predicate at this version.
    pub predicate_uri: String,
    /// Object at this version.
    pub object_id: String,
}

impl TripleVersion {
    /// Snapshot a live fact's fields into a new version record.
    ///
    /// The fact's `version` field is the authoritative sequence number: the
    /// caller increments it before recording (1 at creation, +1 per
    /// subsequent mutation).
    pub fn from_triple(triple: &Triple, change_type: ChangeType) -> Self {
        Self {
            version_id: Uuid::new_v4(),
            triple_id: triple.id,
            tenant_id: triple.tenant_id.clone(),
            version_number: triple.version,
            change_type,
            changed_by: None,
            change_comment: None,
            created_at: Utc::now(),
            subject_id: triple.subject_id.clone(),
            predicate_uri: triple.predicate_uri.clone(),
            object_id: triple.object_id.clone(),
        }
    }

    /// Builder: set the user who made the change.
    pub fn changed_by(mut self, user: impl Into<String>) -> Self {
        self.changed_by = Some(user.into());
        self
    }

    /// Builder: set the change comment.
    pub fn with_comment(mut self, comment: impl Into<String>) -> Self {
        self.change_comment = Some(comment.into());
        self
    }

    /// Reconstruct a fact from this version's copied fields.
    ///
    /// Only subject/predicate/object travel with a version, so the graph URI
    /// comes from configuration and the remaining attributes take their
    /// defaults.
    pub fn reconstruct(&self, graph_uri: impl Into<String>) -> Triple {
        Triple {
            id: self.triple_id,
            tenant_id: self.tenant_id.clone(),
            subject_id: self.subject_id.clone(),
            predicate_uri: self.predicate_uri.clone(),
            object_id: self.object_id.clone(),
            is_literal: false,
            graph_uri: graph_uri.into(),
            confidence_score: 1.0,
            version: self.version_number,
        }
    }
}

/// Summary of a fact's version history.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VersionSummary {
    pub triple_id: Uuid,
    pub total_versions: u32,
    pub latest_version: u32,
    pub first_created: DateTime<Utc>,
    pub last_modified: DateTime<Utc>,
    pub creations: u32,
    pub updates: u32,
    pub deletions: u32,
}
