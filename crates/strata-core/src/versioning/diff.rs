//! Field-level comparison between two versions of a fact.

use crate::types::{FieldChange, VersionDiff};
use crate::versioning::TripleVersion;

/// Compare two versions of the same fact field by field.
///
/// The diff is directional: `from` supplies the old values and `to` the new
/// ones. Argument order is not validated; callers may diff backwards.
pub fn diff_versions(from: &TripleVersion, to: &TripleVersion) -> VersionDiff {
    VersionDiff {
        triple_id: from.triple_id,
        from_version: from.version_number,
        to_version: to.version_number,
        subject_change: FieldChange::compare(&from.subject_id, &to.subject_id),
        predicate_change: FieldChange::compare(&from.predicate_uri, &to.predicate_uri),
        object_change: FieldChange::compare(&from.object_id, &to.object_id),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::Triple;
    use crate::versioning::ChangeType;

    #[test]
    fn test_diff_identical_versions_reports_no_changes() {
        let triple = Triple::new("tenant-a", "person:a", "rel:worksFor", "org:b", "g");
        let v1 = TripleVersion::from_triple(&triple, ChangeType::Creation);
        let v2 = TripleVersion::from_triple(&triple, ChangeType::Update);

        let diff = diff_versions(&v1, &v2);
        assert!(!diff.has_changes());
        assert!(!diff.subject_change.has_changed);
        assert!(!diff.predicate_change.has_changed);
        assert!(!diff.object_change.has_changed);
        // Values are recorded verbatim even when unchanged
        assert_eq!(diff.object_change.old_value, "org:b");
        assert_eq!(diff.object_change.new_value, "org:b");
    }

    #[test]
    fn test_diff_reports_changed_object() {
        let triple = Triple::new("tenant-a", "person:a", "rel:worksFor", "org:b", "g");
        let v1 = TripleVersion::from_triple(&triple, ChangeType::Creation);

        let mut updated = triple.clone();
        updated.object_id = "org:c".to_string();
        updated.version = 2;
        let v2 = TripleVersion::from_triple(&updated, ChangeType::Update);

        let diff = diff_versions(&v1, &v2);
        assert_eq!(diff.from_version, 1);
        assert_eq!(diff.to_version, 2);
        assert!(diff.object_change.has_changed);
        assert_eq!(diff.object_change.old_value, "org:b");
        assert_eq!(diff.object_change.new_value, "org:c");
        assert!(!diff.subject_change.has_changed);
    }

    #[test]
    fn test_diff_is_directional_not_order_validated() {
        let triple = Triple::new("tenant-a", "s", "p", "org:b", "g");
        let v1 = TripleVersion::from_triple(&triple, ChangeType::Creation);

        let mut updated = triple.clone();
        updated.object_id = "org:c".to_string();
        updated.version = 2;
        let v2 = TripleVersion::from_triple(&updated, ChangeType::Update);

        // Reversed order swaps old/new, nothing more
        let diff = diff_versions(&v2, &v1);
        assert_eq!(diff.from_version, 2);
        assert_eq!(diff.to_version, 1);
        assert_eq!(diff.object_change.old_value, "org:c");
        assert_eq!(diff.object_change.new_value, "org:b");
    }
}
