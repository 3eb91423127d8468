//! SQLite-backed triple store.

use std::path::Path;
use std::sync::Mutex;

use async_trait::async_trait;
use rusqlite::{params, Connection};
use uuid::Uuid;

use strata_core::error::{StrataError, StrataResult};
use strata_core::traits::{TripleQuery, TripleQueryResult, TripleStore};
use strata_core::types::Triple;

/// SQLite-backed triple store.
///
/// Thread-safe via a Mutex on the connection.
pub struct SqliteTripleStore {
    conn: Mutex<Connection>,
}

impl SqliteTripleStore {
    /// Create a new store at the given database path.
    pub fn new(db_path: impl AsRef<Path>) -> StrataResult<Self> {
        let conn = Connection::open(db_path)?;
        let store = Self {
            conn: Mutex::new(conn),
        };
        store.init_schema()?;
        Ok(store)
    }

    /// Create a new in-memory store.
    pub fn in_memory() -> StrataResult<Self> {
        let conn = Connection::open_in_memory()?;
        let store = Self {
            conn: Mutex::new(conn),
        };
        store.init_schema()?;
        Ok(store)
    }

    fn init_schema(&self) -> StrataResult<()> {
        let conn = self.lock_conn()?;
        conn.execute_batch(
            r#"
            CREATE TABLE IF NOT EXISTS triples (
                id TEXT NOT NULL,
                tenant_id TEXT NOT NULL,
                subject_id TEXT NOT NULL,
                predicate_uri TEXT NOT NULL,
                object_id TEXT NOT NULL,
                is_literal INTEGER NOT NULL DEFAULT 0,
                graph_uri TEXT NOT NULL,
                confidence_score REAL NOT NULL DEFAULT 1.0,
                version INTEGER NOT NULL,
                PRIMARY KEY (tenant_id, id)
            );

            CREATE INDEX IF NOT EXISTS idx_triples_graph
                ON triples(tenant_id, graph_uri);
            CREATE INDEX IF NOT EXISTS idx_triples_subject
                ON triples(tenant_id, subject_id);
        "#,
        )?;
        Ok(())
    }

    fn lock_conn(&self) -> StrataResult<std::sync::MutexGuard<'_, Connection>> {
        self.conn
            .lock()
            .map_err(|e| StrataError::internal(e.to_string()))
    }

    fn row_to_triple(row: &rusqlite::Row<'_>) -> StrataResult<Triple> {
        let id: String = row.get(0)?;
        Ok(Triple {
            id: Uuid::parse_str(&id).map_err(|e| StrataError::internal(e.to_string()))?,
            tenant_id: row.get(1)?,
            subject_id: row.get(2)?,
            predicate_uri: row.get(3)?,
            object_id: row.get(4)?,
            is_literal: row.get::<_, i64>(5)? != 0,
            graph_uri: row.get(6)?,
            confidence_score: row.get::<_, f64>(7)? as f32,
            version: row.get(8)?,
        })
    }

    fn insert(conn: &Connection, triple: &Triple, tenant_id: &str) -> StrataResult<bool> {
        let inserted = conn.execute(
            r#"INSERT OR IGNORE INTO triples
               (id, tenant_id, subject_id, predicate_uri, object_id,
                is_literal, graph_uri, confidence_score, version)
               VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)"#,
            params![
                triple.id.to_string(),
                tenant_id,
                triple.subject_id,
                triple.predicate_uri,
                triple.object_id,
                triple.is_literal as i64,
                triple.graph_uri,
                triple.confidence_score as f64,
                triple.version,
            ],
        )?;
        Ok(inserted > 0)
    }
}

#[async_trait]
impl TripleStore for SqliteTripleStore {
    async fn add_triple(&self, triple: &Triple, tenant_id: &str) -> StrataResult<bool> {
        let conn = self.lock_conn()?;
        Self::insert(&conn, triple, tenant_id)
    }

    async fn add_triples(&self, triples: &[Triple], tenant_id: &str) -> StrataResult<usize> {
        let conn = self.lock_conn()?;
        let mut inserted = 0;
        for triple in triples {
            if Self::insert(&conn, triple, tenant_id)? {
                inserted += 1;
            }
        }
        Ok(inserted)
    }

    async fn update_triple(&self, triple: &Triple, tenant_id: &str) -> StrataResult<bool> {
        let conn = self.lock_conn()?;
        let updated = conn.execute(
            r#"UPDATE triples SET
                 subject_id = ?3, predicate_uri = ?4, object_id = ?5,
                 is_literal = ?6, graph_uri = ?7, confidence_score = ?8, version = ?9
               WHERE tenant_id = ?1 AND id = ?2"#,
            params![
                tenant_id,
                triple.id.to_string(),
                triple.subject_id,
                triple.predicate_uri,
                triple.object_id,
                triple.is_literal as i64,
                triple.graph_uri,
                triple.confidence_score as f64,
                triple.version,
            ],
        )?;
        Ok(updated > 0)
    }

    async fn remove_graph(&self, graph_uri: &str, tenant_id: &str) -> StrataResult<bool> {
        let conn = self.lock_conn()?;
        let removed = conn.execute(
            "DELETE FROM triples WHERE tenant_id = ?1 AND graph_uri = ?2",
            params![tenant_id, graph_uri],
        )?;
        tracing::debug!(tenant_id, graph_uri, removed, "graph removed");
        Ok(removed > 0)
    }

    async fn query(&self, query: &TripleQuery, tenant_id: &str) -> StrataResult<TripleQueryResult> {
        let conn = self.lock_conn()?;
        let mut stmt = conn.prepare(
            r#"SELECT id, tenant_id, subject_id, predicate_uri, object_id,
                      is_literal, graph_uri, confidence_score, version
               FROM triples WHERE tenant_id = ?1"#,
        )?;

        let rows = stmt.query_map(params![tenant_id], |row| Ok(Self::row_to_triple(row)))?;
        let mut triples = Vec::new();
        for row in rows {
            let triple = row.map_err(StrataError::from)??;
            if query.matches(&triple) {
                triples.push(triple);
            }
        }
        Ok(TripleQueryResult { triples })
    }
}
