//! The versioning facade: records versions, serves history, restores
//! versions and snapshots, and answers temporal queries.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use uuid::Uuid;

use crate::config::VersioningConfig;
use crate::error::{StrataError, StrataResult};
use crate::traits::{TripleQuery, TripleStore};
use crate::types::{SnapshotMetadata, TemporalQuery, TemporalQueryResult, Triple, VersionDiff};
use crate::versioning::{
    diff_versions, ChangeType, SnapshotManager, TemporalQueryEvaluator, TripleVersion, VersionLog,
    VersionSummary,
};

/// Bounded retries when a restore races another writer on the next version
/// number.
const MAX_CONFLICT_RETRIES: u32 = 3;

/// Public facade over the version log, temporal evaluator, diff engine, and
/// snapshot manager. The only component that writes to the version log or
/// invokes snapshot capture/restore.
///
/// Calls on independent facts and tenants run concurrently; version-number
/// assignment per fact is linearized by the log's conditional append.
pub struct VersioningManager {
    config: VersioningConfig,
    store: Arc<dyn TripleStore>,
    log: Arc<dyn VersionLog>,
    evaluator: TemporalQueryEvaluator,
    snapshots: SnapshotManager,
}

impl VersioningManager {
    /// Create a new manager over the given collaborators.
    pub fn new(
        config: VersioningConfig,
        store: Arc<dyn TripleStore>,
        log: Arc<dyn VersionLog>,
    ) -> Self {
        let evaluator = TemporalQueryEvaluator::new(log.clone(), config.default_graph_uri.clone());
        let snapshots = SnapshotManager::new(
            store.clone(),
            config.default_graph_uri.clone(),
            config.query_timeout_seconds,
        );
        Self {
            config,
            store,
            log,
            evaluator,
            snapshots,
        }
    }

    /// Record a new version of a fact.
    ///
    /// The fact's `version` field is the authoritative sequence number; the
    /// caller increments it before each call (1 at creation). A conflict
    /// means the caller raced another writer on the same fact and is
    /// surfaced immediately with full context.
    pub async fn record_version(
        &self,
        triple: &Triple,
        change_type: ChangeType,
        tenant_id: &str,
        changed_by: Option<&str>,
        comment: Option<&str>,
    ) -> StrataResult<TripleVersion> {
        Self::validate_tenant(tenant_id)?;
        if triple.version == 0 {
            return Err(StrataError::validation(
                "Triple version numbers start at 1",
            ));
        }

        let mut version = TripleVersion::from_triple(triple, change_type);
        version.tenant_id = tenant_id.to_string();
        if let Some(user) = changed_by {
            version = version.changed_by(user);
        }
        if let Some(comment) = comment {
            version = version.with_comment(comment);
        }

        self.log.append(&version).await?;
        tracing::debug!(
            tenant_id,
            triple_id = %triple.id,
            version_number = version.version_number,
            change_type = change_type.as_str(),
            "version recorded"
        );
        Ok(version)
    }

    /// Get a fact's full history, most recent version first. Returns an
    /// empty list (not an error) for an unknown fact.
    pub async fn get_version_history(
        &self,
        triple_id: Uuid,
        tenant_id: &str,
    ) -> StrataResult<Vec<TripleVersion>> {
        Self::validate_tenant(tenant_id)?;
        self.log.history(tenant_id, triple_id).await
    }

    /// Get a specific version of a fact.
    pub async fn get_version(
        &self,
        triple_id: Uuid,
        version_number: u32,
        tenant_id: &str,
    ) -> StrataResult<Option<TripleVersion>> {
        Self::validate_tenant(tenant_id)?;
        self.log.get(tenant_id, triple_id, version_number).await
    }

    /// Get a summary of a fact's history.
    pub async fn get_version_summary(
        &self,
        triple_id: Uuid,
        tenant_id: &str,
    ) -> StrataResult<Option<VersionSummary>> {
        Self::validate_tenant(tenant_id)?;
        self.log.summary(tenant_id, triple_id).await
    }

    /// Restore a fact to a historical version's field values.
    ///
    /// Restore appends, never rewrites: the fact gets a *new* version number
    /// (`current max + 1`) recorded as an `Update`, and all prior versions
    /// remain untouched. Conflicts with concurrent writers are retried with
    /// a freshly computed version number up to a bounded count.
    ///
    /// The version record commits before the live graph is written. A
    /// `Store` error therefore means the log leads the live state; the call
    /// is safe to retry, appending a fresh version and reapplying the
    /// fields.
    pub async fn restore_version(
        &self,
        triple_id: Uuid,
        version_number: u32,
        tenant_id: &str,
        changed_by: &str,
        comment: &str,
    ) -> StrataResult<Triple> {
        Self::validate_tenant(tenant_id)?;

        let target = self
            .log
            .get(tenant_id, triple_id, version_number)
            .await?
            .ok_or_else(|| StrataError::version_not_found(triple_id, version_number))?;

        let live = self.find_live(triple_id, tenant_id).await?;

        let mut attempts = 0;
        let recorded = loop {
            let max = self
                .log
                .max_version(tenant_id, triple_id)
                .await?
                .unwrap_or(version_number);
            let next = max + 1;

            let mut restored = match &live {
                Some(current) => {
                    let mut t = current.clone();
                    t.subject_id = target.subject_id.clone();
                    t.predicate_uri = target.predicate_uri.clone();
                    t.object_id = target.object_id.clone();
                    t
                }
                None => target.reconstruct(self.config.default_graph_uri.as_str()),
            };
            restored.version = next;

            let record = TripleVersion::from_triple(&restored, ChangeType::Update)
                .changed_by(changed_by)
                .with_comment(comment);

            match self.log.append(&record).await {
                Ok(()) => break restored,
                Err(err) if err.is_conflict() && attempts < MAX_CONFLICT_RETRIES => {
                    attempts += 1;
                    tracing::debug!(
                        tenant_id,
                        triple_id = %triple_id,
                        attempt = attempts,
                        "restore raced a concurrent writer, recomputing version"
                    );
                }
                Err(err) => return Err(err),
            }
        };

        // Apply the restored field values to the live graph. A fact that is
        // no longer live (e.g. after a deletion) is re-added.
        let updated = self.store.update_triple(&recorded, tenant_id).await?;
        if !updated {
            self.store.add_triple(&recorded, tenant_id).await?;
        }

        tracing::debug!(
            tenant_id,
            triple_id = %triple_id,
            from_version = version_number,
            new_version = recorded.version,
            "version restored"
        );
        Ok(recorded)
    }

    /// Evaluate a temporal query.
    pub async fn query_temporal(
        &self,
        query: &TemporalQuery,
        tenant_id: &str,
    ) -> StrataResult<TemporalQueryResult> {
        Self::validate_tenant(tenant_id)?;
        self.evaluator.evaluate(query, tenant_id).await
    }

    /// Compare two versions of a fact field by field.
    ///
    /// `from_version` need not be less than `to_version`; the diff is
    /// directional but not order-validated.
    pub async fn get_version_diff(
        &self,
        triple_id: Uuid,
        from_version: u32,
        to_version: u32,
        tenant_id: &str,
    ) -> StrataResult<VersionDiff> {
        Self::validate_tenant(tenant_id)?;

        let from = self
            .log
            .get(tenant_id, triple_id, from_version)
            .await?
            .ok_or_else(|| StrataError::version_not_found(triple_id, from_version))?;
        let to = self
            .log
            .get(tenant_id, triple_id, to_version)
            .await?
            .ok_or_else(|| StrataError::version_not_found(triple_id, to_version))?;

        Ok(diff_versions(&from, &to))
    }

    /// Capture the tenant's current graph under a name.
    pub async fn create_snapshot(&self, name: &str, tenant_id: &str) -> StrataResult<bool> {
        self.snapshots.create_snapshot(name, tenant_id).await
    }

    /// List snapshot metadata for a tenant, keyed by name.
    pub async fn get_available_snapshots(
        &self,
        tenant_id: &str,
    ) -> StrataResult<HashMap<String, SnapshotMetadata>> {
        Self::validate_tenant(tenant_id)?;
        self.snapshots.get_available_snapshots(tenant_id).await
    }

    /// Wipe the tenant's graph and reload it from the named snapshot.
    pub async fn restore_snapshot(&self, name: &str, tenant_id: &str) -> StrataResult<bool> {
        Self::validate_tenant(tenant_id)?;
        self.snapshots.restore_snapshot(name, tenant_id).await
    }

    /// The configuration this manager was built with.
    pub fn config(&self) -> &VersioningConfig {
        &self.config
    }

    async fn find_live(&self, triple_id: Uuid, tenant_id: &str) -> StrataResult<Option<Triple>> {
        let query = TripleQuery::by_id(triple_id);
        let timeout = Duration::from_secs(self.config.query_timeout_seconds);
        let result = tokio::time::timeout(timeout, self.store.query(&query, tenant_id))
            .await
            .map_err(|_| StrataError::store_timeout(self.config.query_timeout_seconds))??;
        Ok(result.triples.into_iter().next())
    }

    fn validate_tenant(tenant_id: &str) -> StrataResult<()> {
        if tenant_id.trim().is_empty() {
            return Err(StrataError::missing_field("tenant_id"));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::traits::TripleQueryResult;
    use crate::versioning::test_util::MockStore;
    use crate::versioning::MemoryVersionLog;
    use async_trait::async_trait;

    fn manager_with(store: MockStore) -> VersioningManager {
        VersioningManager::new(
            VersioningConfig::default(),
            Arc::new(store),
            Arc::new(MemoryVersionLog::new()),
        )
    }

    #[tokio::test]
    async fn test_record_version_validates_tenant() {
        let manager = manager_with(MockStore::new());
        let triple = Triple::new("tenant-a", "s", "p", "o", "g");

        let err = manager
            .record_version(&triple, ChangeType::Creation, "  ", None, None)
            .await
            .unwrap_err();
        assert!(matches!(err, StrataError::Validation { .. }));
    }

    #[tokio::test]
    async fn test_record_version_rejects_version_zero() {
        let manager = manager_with(MockStore::new());
        let mut triple = Triple::new("tenant-a", "s", "p", "o", "g");
        triple.version = 0;

        let err = manager
            .record_version(&triple, ChangeType::Creation, "tenant-a", None, None)
            .await
            .unwrap_err();
        assert!(matches!(err, StrataError::Validation { .. }));
    }

    #[tokio::test]
    async fn test_record_and_history() {
        let manager = manager_with(MockStore::new());
        let mut triple = Triple::new("tenant-a", "person:a", "rel:worksFor", "org:b", "g");

        let v1 = manager
            .record_version(
                &triple,
                ChangeType::Creation,
                "tenant-a",
                Some("alice"),
                None,
            )
            .await
            .unwrap();
        assert_eq!(v1.version_number, 1);
        assert_eq!(v1.changed_by.as_deref(), Some("alice"));

        triple.object_id = "org:c".to_string();
        triple.version = 2;
        manager
            .record_version(
                &triple,
                ChangeType::Update,
                "tenant-a",
                None,
                Some("changed employer"),
            )
            .await
            .unwrap();

        let history = manager
            .get_version_history(triple.id, "tenant-a")
            .await
            .unwrap();
        assert_eq!(history.len(), 2);
        assert_eq!(history[0].version_number, 2);
        assert_eq!(history[0].object_id, "org:c");
        assert_eq!(history[1].version_number, 1);

        // Unknown fact: empty history, not an error
        let empty = manager
            .get_version_history(Uuid::new_v4(), "tenant-a")
            .await
            .unwrap();
        assert!(empty.is_empty());
    }

    #[tokio::test]
    async fn test_record_version_conflict_carries_context() {
        let manager = manager_with(MockStore::new());
        let triple = Triple::new("tenant-a", "s", "p", "o", "g");

        manager
            .record_version(&triple, ChangeType::Creation, "tenant-a", None, None)
            .await
            .unwrap();
        // Same version number again: the caller failed to increment
        let err = manager
            .record_version(&triple, ChangeType::Update, "tenant-a", None, None)
            .await
            .unwrap_err();
        match err {
            StrataError::Conflict {
                triple_id,
                version_number,
                ..
            } => {
                assert_eq!(triple_id, triple.id);
                assert_eq!(version_number, 1);
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_restore_version_appends_new_version() {
        let mut store = MockStore::new();
        let mut triple = Triple::new("tenant-a", "person:a", "rel:worksFor", "org:b", "g");
        let live = {
            let mut t = triple.clone();
            t.object_id = "org:c".to_string();
            t.version = 2;
            t
        };
        let for_query = live.clone();
        store.expect_query().returning(move |_, _| {
            Ok(TripleQueryResult {
                triples: vec![for_query.clone()],
            })
        });
        store
            .expect_update_triple()
            .times(1)
            .returning(|_, _| Ok(true));

        let manager = manager_with(store);

        manager
            .record_version(&triple, ChangeType::Creation, "tenant-a", None, None)
            .await
            .unwrap();
        triple.object_id = "org:c".to_string();
        triple.version = 2;
        manager
            .record_version(&triple, ChangeType::Update, "tenant-a", None, None)
            .await
            .unwrap();

        let restored = manager
            .restore_version(triple.id, 1, "tenant-a", "admin", "undo rename")
            .await
            .unwrap();
        assert_eq!(restored.version, 3);
        assert_eq!(restored.object_id, "org:b");

        // History grew; earlier versions are untouched
        let history = manager
            .get_version_history(triple.id, "tenant-a")
            .await
            .unwrap();
        assert_eq!(history.len(), 3);
        assert_eq!(history[0].version_number, 3);
        assert_eq!(history[0].change_type, ChangeType::Update);
        assert_eq!(history[0].object_id, "org:b");
        assert_eq!(history[2].version_number, 1);
        assert_eq!(history[2].object_id, "org:b");
        assert_eq!(history[1].object_id, "org:c");
    }

    #[tokio::test]
    async fn test_store_failure_after_restore_keeps_log_ahead() {
        let mut store = MockStore::new();
        let triple = Triple::new("tenant-a", "s", "p", "o", "g");
        let for_query = triple.clone();
        store.expect_query().returning(move |_, _| {
            Ok(TripleQueryResult {
                triples: vec![for_query.clone()],
            })
        });
        store
            .expect_update_triple()
            .times(1)
            .returning(|_, _| Err(StrataError::store("store went away")));

        let manager = manager_with(store);
        manager
            .record_version(&triple, ChangeType::Creation, "tenant-a", None, None)
            .await
            .unwrap();

        let err = manager
            .restore_version(triple.id, 1, "tenant-a", "admin", "x")
            .await
            .unwrap_err();
        assert!(matches!(err, StrataError::Store { .. }));

        // The restore record committed before the store failed: the log
        // leads the live graph and a retry would append version 3.
        let history = manager
            .get_version_history(triple.id, "tenant-a")
            .await
            .unwrap();
        assert_eq!(history.len(), 2);
        assert_eq!(history[0].version_number, 2);
        assert_eq!(history[0].change_type, ChangeType::Update);
    }

    #[tokio::test]
    async fn test_restore_missing_version_is_not_found() {
        let manager = manager_with(MockStore::new());
        let err = manager
            .restore_version(Uuid::new_v4(), 5, "tenant-a", "admin", "x")
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            StrataError::NotFound {
                version_number: Some(5),
                ..
            }
        ));
    }

    #[tokio::test]
    async fn test_restore_readds_fact_missing_from_store() {
        let mut store = MockStore::new();
        store.expect_query().returning(|_, _| {
            Ok(TripleQueryResult {
                triples: Vec::new(),
            })
        });
        store
            .expect_update_triple()
            .times(1)
            .returning(|_, _| Ok(false));
        store
            .expect_add_triple()
            .times(1)
            .returning(|_, _| Ok(true));

        let manager = manager_with(store);
        let triple = Triple::new("tenant-a", "s", "p", "o", "g");
        manager
            .record_version(&triple, ChangeType::Creation, "tenant-a", None, None)
            .await
            .unwrap();

        let restored = manager
            .restore_version(triple.id, 1, "tenant-a", "admin", "revive")
            .await
            .unwrap();
        assert_eq!(restored.version, 2);
        assert_eq!(restored.graph_uri, manager.config().default_graph_uri);
    }

    #[tokio::test]
    async fn test_diff_missing_version_names_it() {
        let manager = manager_with(MockStore::new());
        let triple = Triple::new("tenant-a", "s", "p", "o", "g");
        manager
            .record_version(&triple, ChangeType::Creation, "tenant-a", None, None)
            .await
            .unwrap();

        let err = manager
            .get_version_diff(triple.id, 1, 9, "tenant-a")
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            StrataError::NotFound {
                version_number: Some(9),
                ..
            }
        ));
    }

    /// Log that accepts a fixed number of appends and conflicts on the rest.
    struct ContentiousLog {
        inner: MemoryVersionLog,
        allowed: std::sync::atomic::AtomicU32,
    }

    impl ContentiousLog {
        fn allowing(appends: u32) -> Self {
            Self {
                inner: MemoryVersionLog::new(),
                allowed: std::sync::atomic::AtomicU32::new(appends),
            }
        }
    }

    #[async_trait]
    impl VersionLog for ContentiousLog {
        async fn append(&self, version: &TripleVersion) -> StrataResult<()> {
            use std::sync::atomic::Ordering;
            if self
                .allowed
                .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| n.checked_sub(1))
                .is_ok()
            {
                self.inner.append(version).await
            } else {
                Err(StrataError::conflict(
                    &version.tenant_id,
                    version.triple_id,
                    version.version_number,
                ))
            }
        }

        async fn get(
            &self,
            tenant_id: &str,
            triple_id: Uuid,
            version_number: u32,
        ) -> StrataResult<Option<TripleVersion>> {
            self.inner.get(tenant_id, triple_id, version_number).await
        }

        async fn history(
            &self,
            tenant_id: &str,
            triple_id: Uuid,
        ) -> StrataResult<Vec<TripleVersion>> {
            self.inner.history(tenant_id, triple_id).await
        }

        async fn latest(
            &self,
            tenant_id: &str,
            triple_id: Uuid,
        ) -> StrataResult<Option<TripleVersion>> {
            self.inner.latest(tenant_id, triple_id).await
        }

        async fn max_version(&self, tenant_id: &str, triple_id: Uuid) -> StrataResult<Option<u32>> {
            self.inner.max_version(tenant_id, triple_id).await
        }

        async fn version_at(
            &self,
            tenant_id: &str,
            triple_id: Uuid,
            at: chrono::DateTime<chrono::Utc>,
        ) -> StrataResult<Option<TripleVersion>> {
            self.inner.version_at(tenant_id, triple_id, at).await
        }

        async fn versions_in_range(
            &self,
            tenant_id: &str,
            from: chrono::DateTime<chrono::Utc>,
            to: chrono::DateTime<chrono::Utc>,
        ) -> StrataResult<Vec<TripleVersion>> {
            self.inner.versions_in_range(tenant_id, from, to).await
        }

        async fn versions_with_number(
            &self,
            tenant_id: &str,
            version_number: u32,
        ) -> StrataResult<Vec<TripleVersion>> {
            self.inner
                .versions_with_number(tenant_id, version_number)
                .await
        }

        async fn triple_ids(&self, tenant_id: &str) -> StrataResult<Vec<Uuid>> {
            self.inner.triple_ids(tenant_id).await
        }

        async fn summary(
            &self,
            tenant_id: &str,
            triple_id: Uuid,
        ) -> StrataResult<Option<crate::versioning::VersionSummary>> {
            self.inner.summary(tenant_id, triple_id).await
        }

        async fn count(&self, tenant_id: &str) -> StrataResult<usize> {
            self.inner.count(tenant_id).await
        }
    }

    #[tokio::test]
    async fn test_restore_surfaces_conflict_after_retries_exhausted() {
        let mut store = MockStore::new();
        store.expect_query().returning(|_, _| {
            Ok(TripleQueryResult {
                triples: Vec::new(),
            })
        });

        // One append for the creation record, then every restore attempt
        // (initial try plus bounded retries) conflicts.
        let manager = VersioningManager::new(
            VersioningConfig::default(),
            Arc::new(store),
            Arc::new(ContentiousLog::allowing(1)),
        );

        let triple = Triple::new("tenant-a", "s", "p", "o", "g");
        manager
            .record_version(&triple, ChangeType::Creation, "tenant-a", None, None)
            .await
            .unwrap();

        let err = manager
            .restore_version(triple.id, 1, "tenant-a", "admin", "x")
            .await
            .unwrap_err();
        assert!(err.is_conflict());
    }

    /// Store whose queries never finish in time.
    struct SlowStore;

    #[async_trait]
    impl crate::traits::TripleStore for SlowStore {
        async fn add_triple(&self, _: &Triple, _: &str) -> StrataResult<bool> {
            Ok(true)
        }
        async fn add_triples(&self, triples: &[Triple], _: &str) -> StrataResult<usize> {
            Ok(triples.len())
        }
        async fn update_triple(&self, _: &Triple, _: &str) -> StrataResult<bool> {
            Ok(true)
        }
        async fn remove_graph(&self, _: &str, _: &str) -> StrataResult<bool> {
            Ok(true)
        }
        async fn query(&self, _: &TripleQuery, _: &str) -> StrataResult<TripleQueryResult> {
            tokio::time::sleep(Duration::from_secs(60)).await;
            Ok(TripleQueryResult::default())
        }
    }

    #[tokio::test]
    async fn test_query_timeout_surfaces_store_error() {
        // Zero-second budget: the deadline has passed before the slow query
        // can complete its first poll.
        let config = VersioningConfig {
            query_timeout_seconds: 0,
            ..Default::default()
        };
        let manager = VersioningManager::new(
            config,
            Arc::new(SlowStore),
            Arc::new(MemoryVersionLog::new()),
        );
        let triple = Triple::new("tenant-a", "s", "p", "o", "g");
        manager
            .record_version(&triple, ChangeType::Creation, "tenant-a", None, None)
            .await
            .unwrap();

        let err = manager
            .restore_version(triple.id, 1, "tenant-a", "admin", "x")
            .await
            .unwrap_err();
        match err {
            StrataError::Store { code, .. } => {
                assert_eq!(code, crate::error::ErrorCode::StoTimeout)
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }
}
