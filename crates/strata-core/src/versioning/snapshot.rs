//! Named snapshots of a tenant's current graph, with atomic restore.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use tokio::sync::{Mutex, RwLock};

use crate::error::{StrataError, StrataResult};
use crate::traits::{TripleQuery, TripleStore};
use crate::types::{SnapshotMetadata, Triple};

/// An immutable point-in-time copy of a tenant's graph.
#[derive(Debug, Clone)]
struct GraphSnapshot {
    metadata: SnapshotMetadata,
    triples: Vec<Triple>,
}

/// Captures and restores named snapshots of the triple store.
///
/// Snapshots are owned, tenant-scoped state of this manager instance; their
/// lifetime is tied to it. Capture is read-committed with respect to
/// concurrent writers: it copies whatever the store's query returns, with no
/// stronger isolation. Restore holds a per-tenant lock so no restore-path
/// reader observes a partially reloaded graph.
pub struct SnapshotManager {
    store: Arc<dyn TripleStore>,
    default_graph_uri: String,
    query_timeout: Duration,
    // (tenant, name) -> snapshot; a single write lock makes overwrite atomic
    snapshots: RwLock<HashMap<(String, String), GraphSnapshot>>,
    restore_locks: Mutex<HashMap<String, Arc<Mutex<()>>>>,
}

impl SnapshotManager {
    /// Create a snapshot manager over the given store.
    pub fn new(
        store: Arc<dyn TripleStore>,
        default_graph_uri: impl Into<String>,
        query_timeout_seconds: u64,
    ) -> Self {
        Self {
            store,
            default_graph_uri: default_graph_uri.into(),
            query_timeout: Duration::from_secs(query_timeout_seconds),
            snapshots: RwLock::new(HashMap::new()),
            restore_locks: Mutex::new(HashMap::new()),
        }
    }

    /// Capture the tenant's current graph under a name.
    ///
    /// Overwriting an existing name is permitted; the replacement happens
    /// under a single write lock so concurrent readers see either the old or
    /// the new snapshot, never a partial one.
    pub async fn create_snapshot(&self, name: &str, tenant_id: &str) -> StrataResult<bool> {
        if name.trim().is_empty() {
            return Err(StrataError::missing_field("name"));
        }
        if tenant_id.trim().is_empty() {
            return Err(StrataError::missing_field("tenant_id"));
        }

        let triples = self.current_graph(tenant_id).await?;
        let snapshot = GraphSnapshot {
            metadata: SnapshotMetadata {
                name: name.to_string(),
                tenant_id: tenant_id.to_string(),
                created_at: Utc::now(),
                triple_count: triples.len(),
            },
            triples,
        };

        tracing::debug!(
            tenant_id,
            name,
            triple_count = snapshot.metadata.triple_count,
            "snapshot captured"
        );

        let mut snapshots = self.snapshots.write().await;
        snapshots.insert((tenant_id.to_string(), name.to_string()), snapshot);
        Ok(true)
    }

    /// List snapshot metadata for a tenant, keyed by name.
    pub async fn get_available_snapshots(
        &self,
        tenant_id: &str,
    ) -> StrataResult<HashMap<String, SnapshotMetadata>> {
        let snapshots = self.snapshots.read().await;
        Ok(snapshots
            .iter()
            .filter(|((tenant, _), _)| tenant == tenant_id)
            .map(|((_, name), snapshot)| (name.clone(), snapshot.metadata.clone()))
            .collect())
    }

    /// Wipe the tenant's graph and reload it from the named snapshot.
    ///
    /// Fails with `NotFound` (and performs no mutation) when the name is
    /// unknown. On a mid-restore store failure the previous contents are
    /// rolled back; if the rollback itself fails, `RestoreFailed` surfaces
    /// naming the inconsistency. No per-fact version records are written:
    /// restoring a snapshot is a bulk replace, not a versioned edit.
    pub async fn restore_snapshot(&self, name: &str, tenant_id: &str) -> StrataResult<bool> {
        let snapshot = {
            let snapshots = self.snapshots.read().await;
            snapshots
                .get(&(tenant_id.to_string(), name.to_string()))
                .cloned()
                .ok_or_else(|| StrataError::snapshot_not_found(name))?
        };

        let tenant_lock = self.tenant_restore_lock(tenant_id).await;
        let _guard = tenant_lock.lock().await;

        // Pre-state for rollback if the reload fails partway
        let previous = self.current_graph(tenant_id).await?;

        self.store
            .remove_graph(&self.default_graph_uri, tenant_id)
            .await?;

        match self.store.add_triples(&snapshot.triples, tenant_id).await {
            Ok(inserted) if inserted == snapshot.triples.len() => {
                tracing::debug!(tenant_id, name, inserted, "snapshot restored");
                Ok(true)
            }
            Ok(inserted) => {
                tracing::warn!(
                    tenant_id,
                    name,
                    inserted,
                    expected = snapshot.triples.len(),
                    "snapshot reload was partial, rolling back"
                );
                self.rollback(tenant_id, name, &previous).await?;
                Err(StrataError::store(format!(
                    "Snapshot reload inserted {} of {} triples; previous contents restored",
                    inserted,
                    snapshot.triples.len()
                )))
            }
            Err(err) => {
                tracing::warn!(tenant_id, name, error = %err, "snapshot reload failed, rolling back");
                self.rollback(tenant_id, name, &previous).await?;
                Err(err)
            }
        }
    }

    async fn rollback(
        &self,
        tenant_id: &str,
        name: &str,
        previous: &[Triple],
    ) -> StrataResult<()> {
        let result: StrataResult<()> = async {
            self.store
                .remove_graph(&self.default_graph_uri, tenant_id)
                .await?;
            let restored = self.store.add_triples(previous, tenant_id).await?;
            if restored != previous.len() {
                return Err(StrataError::store(format!(
                    "rollback reinserted {} of {} triples",
                    restored,
                    previous.len()
                )));
            }
            Ok(())
        }
        .await;

        result.map_err(|err| {
            StrataError::restore_failed(
                format!(
                    "Graph is neither fully restored nor rolled back ({} previous triples): {}",
                    previous.len(),
                    err
                ),
                name,
                tenant_id,
            )
        })
    }

    async fn current_graph(&self, tenant_id: &str) -> StrataResult<Vec<Triple>> {
        let query = TripleQuery::by_graph(&self.default_graph_uri);
        let result = tokio::time::timeout(self.query_timeout, self.store.query(&query, tenant_id))
            .await
            .map_err(|_| StrataError::store_timeout(self.query_timeout.as_secs()))??;
        Ok(result.triples)
    }

    async fn tenant_restore_lock(&self, tenant_id: &str) -> Arc<Mutex<()>> {
        let mut locks = self.restore_locks.lock().await;
        locks
            .entry(tenant_id.to_string())
            .or_insert_with(|| Arc::new(Mutex::new(())))
            .clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::traits::TripleQueryResult;
    use crate::versioning::test_util::MockStore;
    use mockall::predicate::eq;

    fn sample_triples(n: usize) -> Vec<Triple> {
        (0..n)
            .map(|i| Triple::new("tenant-a", format!("s{i}"), "p", format!("o{i}"), "g"))
            .collect()
    }

    #[tokio::test]
    async fn test_create_snapshot_records_metadata() {
        let mut store = MockStore::new();
        let triples = sample_triples(3);
        let captured = triples.clone();
        store.expect_query().times(1).returning(move |_, _| {
            Ok(TripleQueryResult {
                triples: captured.clone(),
            })
        });

        let manager = SnapshotManager::new(Arc::new(store), "g", 30);
        assert!(manager.create_snapshot("s1", "tenant-a").await.unwrap());

        let available = manager.get_available_snapshots("tenant-a").await.unwrap();
        assert_eq!(available.len(), 1);
        assert_eq!(available["s1"].triple_count, 3);
        assert_eq!(available["s1"].tenant_id, "tenant-a");

        // Other tenants see nothing
        assert!(manager
            .get_available_snapshots("tenant-b")
            .await
            .unwrap()
            .is_empty());
    }

    #[tokio::test]
    async fn test_create_snapshot_validates_inputs() {
        let manager = SnapshotManager::new(Arc::new(MockStore::new()), "g", 30);
        assert!(manager.create_snapshot("", "tenant-a").await.is_err());
        assert!(manager.create_snapshot("s1", " ").await.is_err());
    }

    #[tokio::test]
    async fn test_restore_unknown_snapshot_is_not_found_and_mutates_nothing() {
        // No expectations set: any store call would panic the mock
        let manager = SnapshotManager::new(Arc::new(MockStore::new()), "g", 30);
        let err = manager
            .restore_snapshot("missing", "tenant-a")
            .await
            .unwrap_err();
        assert!(matches!(err, StrataError::NotFound { .. }));
    }

    #[tokio::test]
    async fn test_restore_failure_rolls_back_previous_contents() {
        let mut store = MockStore::new();
        let snapshot_triples = sample_triples(2);
        let current = sample_triples(1);

        // Capture
        let for_capture = snapshot_triples.clone();
        store.expect_query().times(1).returning(move |_, _| {
            Ok(TripleQueryResult {
                triples: for_capture.clone(),
            })
        });
        // Restore reads the pre-state for rollback
        let for_prestate = current.clone();
        store.expect_query().times(1).returning(move |_, _| {
            Ok(TripleQueryResult {
                triples: for_prestate.clone(),
            })
        });
        store
            .expect_remove_graph()
            .with(eq("g"), eq("tenant-a"))
            .times(2)
            .returning(|_, _| Ok(true));
        // Reload fails, rollback reinsert succeeds
        store
            .expect_add_triples()
            .times(1)
            .returning(|_, _| Err(StrataError::store("store went away")));
        store
            .expect_add_triples()
            .times(1)
            .returning(|triples, _| Ok(triples.len()));

        let manager = SnapshotManager::new(Arc::new(store), "g", 30);
        manager.create_snapshot("s1", "tenant-a").await.unwrap();

        let err = manager.restore_snapshot("s1", "tenant-a").await.unwrap_err();
        assert!(matches!(err, StrataError::Store { .. }));
    }

    #[tokio::test]
    async fn test_failed_rollback_surfaces_restore_failed() {
        let mut store = MockStore::new();
        let snapshot_triples = sample_triples(2);

        let for_capture = snapshot_triples.clone();
        store.expect_query().times(1).returning(move |_, _| {
            Ok(TripleQueryResult {
                triples: for_capture.clone(),
            })
        });
        store.expect_query().times(1).returning(|_, _| {
            Ok(TripleQueryResult {
                triples: Vec::new(),
            })
        });
        store
            .expect_remove_graph()
            .times(2)
            .returning(|_, _| Ok(true));
        store
            .expect_add_triples()
            .times(1)
            .returning(|_, _| Err(StrataError::store("reload failed")));
        store
            .expect_add_triples()
            .times(1)
            .returning(|_, _| Err(StrataError::store("rollback failed too")));

        let manager = SnapshotManager::new(Arc::new(store), "g", 30);
        manager.create_snapshot("s1", "tenant-a").await.unwrap();

        let err = manager.restore_snapshot("s1", "tenant-a").await.unwrap_err();
        assert!(matches!(err, StrataError::RestoreFailed { .. }));
    }

    #[tokio::test]
    async fn test_overwriting_snapshot_replaces_it() {
        let mut store = MockStore::new();
        let first = sample_triples(1);
        let second = sample_triples(4);

        let a = first.clone();
        store
            .expect_query()
            .times(1)
            .returning(move |_, _| Ok(TripleQueryResult { triples: a.clone() }));
        let b = second.clone();
        store
            .expect_query()
            .times(1)
            .returning(move |_, _| Ok(TripleQueryResult { triples: b.clone() }));

        let manager = SnapshotManager::new(Arc::new(store), "g", 30);
        manager.create_snapshot("s1", "tenant-a").await.unwrap();
        manager.create_snapshot("s1", "tenant-a").await.unwrap();

        let available = manager.get_available_snapshots("tenant-a").await.unwrap();
        assert_eq!(available.len(), 1);
        assert_eq!(available["s1"].triple_count, 4);
    }
}
