//! In-process triple store.

use std::collections::HashMap;

use async_trait::async_trait;
use tokio::sync::RwLock;
use uuid::Uuid;

use strata_core::error::StrataResult;
use strata_core::traits::{TripleQuery, TripleQueryResult, TripleStore};
use strata_core::types::Triple;

/// In-memory triple store backend.
///
/// Tenant-keyed maps behind a `tokio` RwLock. Suitable for embedded use and
/// tests; contents do not survive the process.
#[derive(Default)]
pub struct MemoryTripleStore {
    // tenant -> triple id -> triple
    triples: RwLock<HashMap<String, HashMap<Uuid, Triple>>>,
}

impl MemoryTripleStore {
    /// Create an empty store.
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl TripleStore for MemoryTripleStore {
    async fn add_triple(&self, triple: &Triple, tenant_id: &str) -> StrataResult<bool> {
        let mut tenants = self.triples.write().await;
        let facts = tenants.entry(tenant_id.to_string()).or_default();
        if facts.contains_key(&triple.id) {
            return Ok(false);
        }
        facts.insert(triple.id, triple.clone());
        Ok(true)
    }

    async fn add_triples(&self, triples: &[Triple], tenant_id: &str) -> StrataResult<usize> {
        let mut tenants = self.triples.write().await;
        let facts = tenants.entry(tenant_id.to_string()).or_default();
        let mut inserted = 0;
        for triple in triples {
            if !facts.contains_key(&triple.id) {
                facts.insert(triple.id, triple.clone());
                inserted += 1;
            }
        }
        Ok(inserted)
    }

    async fn update_triple(&self, triple: &Triple, tenant_id: &str) -> StrataResult<bool> {
        let mut tenants = self.triples.write().await;
        match tenants
            .get_mut(tenant_id)
            .and_then(|facts| facts.get_mut(&triple.id))
        {
            Some(existing) => {
                *existing = triple.clone();
                Ok(true)
            }
            None => Ok(false),
        }
    }

    async fn remove_graph(&self, graph_uri: &str, tenant_id: &str) -> StrataResult<bool> {
        let mut tenants = self.triples.write().await;
        let Some(facts) = tenants.get_mut(tenant_id) else {
            return Ok(false);
        };
        let before = facts.len();
        facts.retain(|_, triple| triple.graph_uri != graph_uri);
        let removed = before - facts.len();
        tracing::debug!(tenant_id, graph_uri, removed, "graph removed");
        Ok(removed > 0)
    }

    async fn query(&self, query: &TripleQuery, tenant_id: &str) -> StrataResult<TripleQueryResult> {
        let tenants = self.triples.read().await;
        let triples = tenants
            .get(tenant_id)
            .map(|facts| {
                facts
                    .values()
                    .filter(|triple| query.matches(triple))
                    .cloned()
                    .collect()
            })
            .unwrap_or_default();
        Ok(TripleQueryResult { triples })
    }
}
