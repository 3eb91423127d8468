//! Triple (fact) types.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// A subject-predicate-object fact scoped to a tenant and graph.
///
/// Triples are owned by the triple store; the versioning layer reads them
/// when recording or restoring versions. `version` is the authoritative
/// sequence number for the fact: 1 at creation, incremented by the caller
/// before each subsequent mutation is recorded.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Triple {
    /// Unique identifier for the triple.
    pub id: Uuid,
    /// Tenant that owns the triple.
    pub tenant_id: String,
    /// Subject entity identifier.
    pub subject_id: String,
    /// Predicate URI.
    pub predicate_uri: String,
    /// Object entity identifier, or literal value when `is_literal` is set.
    pub object_id: String,
    /// Whether the object is a literal value rather than an entity reference.
    #[serde(default)]
    pub is_literal: bool,
    /// Named graph the triple belongs to.
    pub graph_uri: String,
    /// Extraction confidence, in `[0.0, 1.0]`.
    pub confidence_score: f32,
    /// Current version number (>= 1).
    pub version: u32,
}

impl Triple {
    /// Create a new triple at version 1 with a fresh id.
    pub fn new(
        tenant_id: impl Into<String>,
        subject_id: impl Into<String>,
        predicate_uri: impl Into<String>,
        object_id: impl Into<String>,
        graph_uri: impl Into<String>,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            tenant_id: tenant_id.into(),
            subject_id: subject_id.into(),
            predicate_uri: predicate_uri.into(),
            object_id: object_id.into(),
            is_literal: false,
            graph_uri: graph_uri.into(),
            confidence_score: 1.0,
            version: 1,
        }
    }

    /// Builder: mark the object as a literal value.
    pub fn literal(mut self) -> Self {
        self.is_literal = true;
        self
    }

    /// Builder: set the confidence score.
    pub fn with_confidence(mut self, score: f32) -> Self {
        self.confidence_score = score;
        self
    }
}
