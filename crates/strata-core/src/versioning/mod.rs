//! Bitemporal versioning layer: append-only version log, temporal queries,
//! version diffs, and named snapshots over a triple store.

mod diff;
mod log;
mod manager;
mod snapshot;
mod temporal;
mod version;

pub use diff::diff_versions;
pub use log::{MemoryVersionLog, SqliteVersionLog, VersionLog};
pub use manager::VersioningManager;
pub use snapshot::SnapshotManager;
pub use temporal::TemporalQueryEvaluator;
pub use version::{ChangeType, TripleVersion, VersionSummary};

#[cfg(test)]
pub(crate) mod test_util {
    use async_trait::async_trait;
    use mockall::mock;

    use crate::error::StrataResult;
    use crate::traits::{TripleQuery, TripleQueryResult, TripleStore};
    use crate::types::Triple;

    mock! {
        pub Store {}

        #[async_trait]
        impl TripleStore for Store {
            async fn add_triple(&self, triple: &Triple, tenant_id: &str) -> StrataResult<bool>;
            async fn add_triples(&self, triples: &[Triple], tenant_id: &str) -> StrataResult<usize>;
            async fn update_triple(&self, triple: &Triple, tenant_id: &str) -> StrataResult<bool>;
            async fn remove_graph(&self, graph_uri: &str, tenant_id: &str) -> StrataResult<bool>;
            async fn query(&self, query: &TripleQuery, tenant_id: &str) -> StrataResult<TripleQueryResult>;
        }
    }
}
