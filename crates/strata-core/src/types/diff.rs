//! Version diff types.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Change record for a single field between two versions.
///
/// Both values are recorded verbatim even when unchanged, so callers can
/// render a full before/after view without a second lookup.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FieldChange {
    /// Whether the field differs between the two versions.
    pub has_changed: bool,
    /// Value in the `from` version.
    pub old_value: String,
    /// Value in the `to` version.
    pub new_value: String,
}

impl FieldChange {
    /// Compare two field values.
    pub fn compare(old_value: impl Into<String>, new_value: impl Into<String>) -> Self {
        let old_value = old_value.into();
        let new_value = new_value.into();
        Self {
            has_changed: old_value != new_value,
            old_value,
            new_value,
        }
    }
}

/// Field-level comparison between two versions of the same fact.
///
/// The diff is directional (`old` comes from `from_version`, `new` from
/// `to_version`) but argument order is not validated; `from_version` may be
/// greater than `to_version`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VersionDiff {
    /// The fact being compared.
    pub triple_id: Uuid,
    /// Version supplying the old values.
    pub from_version: u32,
    /// Version supplying the new values.
    pub to_version: u32,
    /// Subject change record.
    pub subject_change: FieldChange,
    /// Predicate change record.
    pub predicate_change: FieldChange,
    /// Object change record.
    pub object_change: FieldChange,
}

impl VersionDiff {
    /// Whether any of the three fields changed.
    pub fn has_changes(&self) -> bool {
        self.subject_change.has_changed
            || self.predicate_change.has_changed
            || self.object_change.has_changed
    }
}
