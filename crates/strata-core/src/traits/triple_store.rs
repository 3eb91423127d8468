//! Triple store trait and related types.
//!
//! The triple store holds the *current* state of facts. The versioning layer
//! consumes this contract; storage, indexing, and persistence are backend
//! concerns (see the `strata-stores` crate).

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::StrataResult;
use crate::types::Triple;

/// Filters for querying current triples.
#[derive(Debug, Clone, Default)]
pub struct TripleQuery {
    /// Restrict to one triple by id.
    pub triple_id: Option<Uuid>,
    /// Filter by named graph.
    pub graph_uri: Option<String>,
    /// Filter by subject.
    pub subject_id: Option<String>,
    /// Filter by predicate.
    pub predicate_uri: Option<String>,
    /// Filter by object.
    pub object_id: Option<String>,
}

impl TripleQuery {
    /// Query for a single triple by id.
    pub fn by_id(triple_id: Uuid) -> Self {
        Self {
            triple_id: Some(triple_id),
            ..Default::default()
        }
    }

    /// Query for all triples in a named graph.
    pub fn by_graph(graph_uri: impl Into<String>) -> Self {
        Self {
            graph_uri: Some(graph_uri.into()),
            ..Default::default()
        }
    }

    /// Whether a triple matches these filters.
    pub fn matches(&self, triple: &Triple) -> bool {
        if let Some(id) = self.triple_id {
            if triple.id != id {
                return false;
            }
        }
        if let Some(graph) = &self.graph_uri {
            if &triple.graph_uri != graph {
                return false;
            }
        }
        if let Some(subject) = &self.subject_id {
            if &triple.subject_id != subject {
                return false;
            }
        }
        if let Some(predicate) = &self.predicate_uri {
            if &triple.predicate_uri != predicate {
                return false;
            }
        }
        if let Some(object) = &self.object_id {
            if &triple.object_id != object {
                return false;
            }
        }
        true
    }
}

/// Result of a triple store query.
#[derive(Debug, Clone, Default)]
pub struct TripleQueryResult {
    /// Matching triples.
    pub triples: Vec<Triple>,
}

/// Core TripleStore trait - all triple store backends implement this.
///
/// All operations are scoped by tenant; backends must never return triples
/// across tenant boundaries. Operations are cancelled by dropping the future.
#[async_trait]
pub trait TripleStore: Send + Sync {
    /// Add a triple. Returns `false` if a triple with the same id exists.
    async fn add_triple(&self, triple: &Triple, tenant_id: &str) -> StrataResult<bool>;

    /// Add a batch of triples. Returns the number actually inserted.
    async fn add_triples(&self, triples: &[Triple], tenant_id: &str) -> StrataResult<usize>;

    /// Replace a triple's fields by id. Returns `false` if it does not exist.
    async fn update_triple(&self, triple: &Triple, tenant_id: &str) -> StrataResult<bool>;

    /// Remove every triple in a named graph. Returns `false` when the graph
    /// was already empty.
    async fn remove_graph(&self, graph_uri: &str, tenant_id: &str) -> StrataResult<bool>;

    /// Query current triples.
    async fn query(&self, query: &TripleQuery, tenant_id: &str) -> StrataResult<TripleQueryResult>;
}

/// Triple store configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TripleStoreConfig {
    /// Provider type.
    pub provider: TripleStoreProvider,
    /// Connection URL or database path (ignored by the memory provider).
    pub url: String,
}

impl Default for TripleStoreConfig {
    fn default() -> Self {
        Self {
            provider: TripleStoreProvider::Memory,
            url: ":memory:".to_string(),
        }
    }
}

/// Triple store provider type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum TripleStoreProvider {
    #[default]
    Memory,
    Sqlite,
}
