//! Append-only version log with conditional-append sequencing.
//!
//! The log is the single source of truth for a fact's history. Appends are
//! conditional on the expected next version number, which linearizes writers
//! racing on the same `(tenant, triple)` pair: the loser gets a
//! [`StrataError::Conflict`] instead of a duplicate or skipped number.
//! Readers never block writers on the SQLite backend and take a shared lock
//! on the memory backend.

use std::collections::HashMap;
use std::path::Path;
use std::sync::Mutex;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use rusqlite::{params, Connection, OptionalExtension};
use tokio::sync::RwLock;
use uuid::Uuid;

use crate::error::{StrataError, StrataResult};
use crate::versioning::{ChangeType, TripleVersion, VersionSummary};

/// Trait for version log storage operations.
#[async_trait]
pub trait VersionLog: Send + Sync {
    /// Append a version record.
    ///
    /// Rejects with [`StrataError::Conflict`] unless `version_number` is
    /// exactly one greater than the current maximum for the fact (or 1 for a
    /// fact with no history). The append is all-or-nothing.
    async fn append(&self, version: &TripleVersion) -> StrataResult<()>;

    /// Get a specific version by number.
    async fn get(
        &self,
        tenant_id: &str,
        triple_id: Uuid,
        version_number: u32,
    ) -> StrataResult<Option<TripleVersion>>;

    /// Get all versions of a fact, most recent first.
    async fn history(&self, tenant_id: &str, triple_id: Uuid) -> StrataResult<Vec<TripleVersion>>;

    /// Get the latest version of a fact.
    async fn latest(&self, tenant_id: &str, triple_id: Uuid)
        -> StrataResult<Option<TripleVersion>>;

    /// Get the current maximum version number for a fact.
    async fn max_version(&self, tenant_id: &str, triple_id: Uuid) -> StrataResult<Option<u32>>;

    /// Get the version in effect at a point in time: the one with the
    /// largest `created_at <= at`.
    async fn version_at(
        &self,
        tenant_id: &str,
        triple_id: Uuid,
        at: DateTime<Utc>,
    ) -> StrataResult<Option<TripleVersion>>;

    /// Get every version across all facts with `from <= created_at <= to`,
    /// ordered by `created_at`.
    async fn versions_in_range(
        &self,
        tenant_id: &str,
        from: DateTime<Utc>,
        to: DateTime<Utc>,
    ) -> StrataResult<Vec<TripleVersion>>;

    /// Get every version across all facts with the given version number.
    async fn versions_with_number(
        &self,
        tenant_id: &str,
        version_number: u32,
    ) -> StrataResult<Vec<TripleVersion>>;

    /// Get the ids of all facts with at least one version.
    async fn triple_ids(&self, tenant_id: &str) -> StrataResult<Vec<Uuid>>;

    /// Get a history summary for a fact.
    async fn summary(
        &self,
        tenant_id: &str,
        triple_id: Uuid,
    ) -> StrataResult<Option<VersionSummary>>;

    /// Count all versions recorded for a tenant.
    async fn count(&self, tenant_id: &str) -> StrataResult<usize>;
}

fn summarize(triple_id: Uuid, versions: &[TripleVersion]) -> Option<VersionSummary> {
    if versions.is_empty() {
        return None;
    }
    let mut creations = 0;
    let mut updates = 0;
    let mut deletions = 0;
    for v in versions {
        match v.change_type {
            ChangeType::Creation => creations += 1,
            ChangeType::Update => updates += 1,
            ChangeType::Deletion => deletions += 1,
        }
    }
    Some(VersionSummary {
        triple_id,
        total_versions: versions.len() as u32,
        latest_version: versions.iter().map(|v| v.version_number).max().unwrap_or(0),
        first_created: versions.iter().map(|v| v.created_at).min().unwrap_or_else(Utc::now),
        last_modified: versions.iter().map(|v| v.created_at).max().unwrap_or_else(Utc::now),
        creations,
        updates,
        deletions,
    })
}

/// In-memory version log.
///
/// Tenant-scoped maps owned by the log instance, guarded by a `tokio` RwLock:
/// any number of concurrent readers, writers serialized.
#[derive(Default)]
pub struct MemoryVersionLog {
    // tenant -> triple -> versions ordered by version_number ascending
    versions: RwLock<HashMap<String, HashMap<Uuid, Vec<TripleVersion>>>>,
}

impl MemoryVersionLog {
    /// Create an empty log.
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl VersionLog for MemoryVersionLog {
    async fn append(&self, version: &TripleVersion) -> StrataResult<()> {
        let mut tenants = self.versions.write().await;
        let facts = tenants.entry(version.tenant_id.clone()).or_default();
        let history = facts.entry(version.triple_id).or_default();

        let expected = history.last().map(|v| v.version_number + 1).unwrap_or(1);
        if version.version_number != expected {
            return Err(StrataError::conflict(
                &version.tenant_id,
                version.triple_id,
                version.version_number,
            ));
        }

        history.push(version.clone());
        Ok(())
    }

    async fn get(
        &self,
        tenant_id: &str,
        triple_id: Uuid,
        version_number: u32,
    ) -> StrataResult<Option<TripleVersion>> {
        let tenants = self.versions.read().await;
        Ok(tenants
            .get(tenant_id)
            .and_then(|facts| facts.get(&triple_id))
            .and_then(|history| {
                history
                    .iter()
                    .find(|v| v.version_number == version_number)
                    .cloned()
            }))
    }

    async fn history(&self, tenant_id: &str, triple_id: Uuid) -> StrataResult<Vec<TripleVersion>> {
        let tenants = self.versions.read().await;
        let mut history = tenants
            .get(tenant_id)
            .and_then(|facts| facts.get(&triple_id))
            .cloned()
            .unwrap_or_default();
        history.sort_by(|a, b| b.version_number.cmp(&a.version_number));
        Ok(history)
    }

    async fn latest(
        &self,
        tenant_id: &str,
        triple_id: Uuid,
    ) -> StrataResult<Option<TripleVersion>> {
        let tenants = self.versions.read().await;
        Ok(tenants
            .get(tenant_id)
            .and_then(|facts| facts.get(&triple_id))
            .and_then(|history| history.last().cloned()))
    }

    async fn max_version(&self, tenant_id: &str, triple_id: Uuid) -> StrataResult<Option<u32>> {
        let tenants = self.versions.read().await;
        Ok(tenants
            .get(tenant_id)
            .and_then(|facts| facts.get(&triple_id))
            .and_then(|history| history.last().map(|v| v.version_number)))
    }

    async fn version_at(
        &self,
        tenant_id: &str,
        triple_id: Uuid,
        at: DateTime<Utc>,
    ) -> StrataResult<Option<TripleVersion>> {
        let tenants = self.versions.read().await;
        Ok(tenants
            .get(tenant_id)
            .and_then(|facts| facts.get(&triple_id))
            .and_then(|history| {
                history
                    .iter()
                    .filter(|v| v.created_at <= at)
                    .max_by_key(|v| (v.created_at, v.version_number))
                    .cloned()
            }))
    }

    async fn versions_in_range(
        &self,
        tenant_id: &str,
        from: DateTime<Utc>,
        to: DateTime<Utc>,
    ) -> StrataResult<Vec<TripleVersion>> {
        let tenants = self.versions.read().await;
        let mut matches: Vec<TripleVersion> = tenants
            .get(tenant_id)
            .map(|facts| {
                facts
                    .values()
                    .flatten()
                    .filter(|v| v.created_at >= from && v.created_at <= to)
                    .cloned()
                    .collect()
            })
            .unwrap_or_default();
        matches.sort_by_key(|v| (v.created_at, v.version_number));
        Ok(matches)
    }

    async fn versions_with_number(
        &self,
        tenant_id: &str,
        version_number: u32,
    ) -> StrataResult<Vec<TripleVersion>> {
        let tenants = self.versions.read().await;
        let mut matches: Vec<TripleVersion> = tenants
            .get(tenant_id)
            .map(|facts| {
                facts
                    .values()
                    .flatten()
                    .filter(|v| v.version_number == version_number)
                    .cloned()
                    .collect()
            })
            .unwrap_or_default();
        matches.sort_by_key(|v| v.created_at);
        Ok(matches)
    }

    async fn triple_ids(&self, tenant_id: &str) -> StrataResult<Vec<Uuid>> {
        let tenants = self.versions.read().await;
        Ok(tenants
            .get(tenant_id)
            .map(|facts| facts.keys().copied().collect())
            .unwrap_or_default())
    }

    async fn summary(
        &self,
        tenant_id: &str,
        triple_id: Uuid,
    ) -> StrataResult<Option<VersionSummary>> {
        let tenants = self.versions.read().await;
        Ok(tenants
            .get(tenant_id)
            .and_then(|facts| facts.get(&triple_id))
            .and_then(|history| summarize(triple_id, history)))
    }

    async fn count(&self, tenant_id: &str) -> StrataResult<usize> {
        let tenants = self.versions.read().await;
        Ok(tenants
            .get(tenant_id)
            .map(|facts| facts.values().map(Vec::len).sum())
            .unwrap_or(0))
    }
}

/// SQLite-backed version log.
pub struct SqliteVersionLog {
    conn: Mutex<Connection>,
}

impl SqliteVersionLog {
    /// Create a new log at the given path.
    pub fn new(path: impl AsRef<Path>) -> StrataResult<Self> {
        let conn = Connection::open(path)?;
        let log = Self {
            conn: Mutex::new(conn),
        };
        log.init_schema()?;
        Ok(log)
    }

    /// Create an in-memory log (for testing).
    pub fn in_memory() -> StrataResult<Self> {
        let conn = Connection::open_in_memory()?;
        let log = Self {
            conn: Mutex::new(conn),
        };
        log.init_schema()?;
        Ok(log)
    }

    fn init_schema(&self) -> StrataResult<()> {
        let conn = self.lock_conn()?;
        conn.execute_batch(
            r#"
            CREATE TABLE IF NOT EXISTS triple_versions (
                version_id TEXT PRIMARY KEY,
                triple_id TEXT NOT NULL,
                tenant_id TEXT NOT NULL,
                version_number INTEGER NOT NULL,
                change_type TEXT NOT NULL,
                changed_by TEXT,
                change_comment TEXT,
                created_at TEXT NOT NULL,
                subject_id TEXT NOT NULL,
                predicate_uri TEXT NOT NULL,
                object_id TEXT NOT NULL,
                UNIQUE(tenant_id, triple_id, version_number)
            );

            -- Index for point-in-time queries
            CREATE INDEX IF NOT EXISTS idx_versions_triple_time
                ON triple_versions(tenant_id, triple_id, created_at);

            -- Index for latest-version lookups
            CREATE INDEX IF NOT EXISTS idx_versions_triple_num
                ON triple_versions(tenant_id, triple_id, version_number DESC);
        "#,
        )?;
        Ok(())
    }

    fn lock_conn(&self) -> StrataResult<std::sync::MutexGuard<'_, Connection>> {
        self.conn
            .lock()
            .map_err(|e| StrataError::internal(e.to_string()))
    }

    fn row_to_version(row: &rusqlite::Row<'_>) -> StrataResult<TripleVersion> {
        let version_id: String = row.get(0)?;
        let triple_id: String = row.get(1)?;
        let tenant_id: String = row.get(2)?;
        let version_number: u32 = row.get(3)?;
        let change_type: String = row.get(4)?;
        let changed_by: Option<String> = row.get(5)?;
        let change_comment: Option<String> = row.get(6)?;
        let created_at: String = row.get(7)?;
        let subject_id: String = row.get(8)?;
        let predicate_uri: String = row.get(9)?;
        let object_id: String = row.get(10)?;

        Ok(TripleVersion {
            version_id: Uuid::parse_str(&version_id)
                .map_err(|e| StrataError::internal(e.to_string()))?,
            triple_id: Uuid::parse_str(&triple_id)
                .map_err(|e| StrataError::internal(e.to_string()))?,
            tenant_id,
            version_number,
            change_type: ChangeType::parse(&change_type)
                .ok_or_else(|| StrataError::internal(format!("unknown change type: {change_type}")))?,
            changed_by,
            change_comment,
            created_at: DateTime::parse_from_rfc3339(&created_at)
                .map(|dt| dt.with_timezone(&Utc))
                .map_err(|e| StrataError::internal(e.to_string()))?,
            subject_id,
            predicate_uri,
            object_id,
        })
    }

    const SELECT_COLUMNS: &'static str = "version_id, triple_id, tenant_id, version_number, \
         change_type, changed_by, change_comment, created_at, subject_id, predicate_uri, object_id";
}

#[async_trait]
impl VersionLog for SqliteVersionLog {
    async fn append(&self, version: &TripleVersion) -> StrataResult<()> {
        let conn = self.lock_conn()?;

        // The connection mutex serializes writers, so the check-then-insert
        // pair is race-free; the UNIQUE constraint backstops it.
        let max: Option<u32> = conn.query_row(
            "SELECT MAX(version_number) FROM triple_versions WHERE tenant_id = ?1 AND triple_id = ?2",
            params![version.tenant_id, version.triple_id.to_string()],
            |row| row.get(0),
        )?;
        let expected = max.map(|m| m + 1).unwrap_or(1);
        if version.version_number != expected {
            return Err(StrataError::conflict(
                &version.tenant_id,
                version.triple_id,
                version.version_number,
            ));
        }

        conn.execute(
            r#"INSERT INTO triple_versions
               (version_id, triple_id, tenant_id, version_number, change_type,
                changed_by, change_comment, created_at, subject_id, predicate_uri, object_id)
               VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11)"#,
            params![
                version.version_id.to_string(),
                version.triple_id.to_string(),
                version.tenant_id,
                version.version_number,
                version.change_type.as_str(),
                version.changed_by,
                version.change_comment,
                version.created_at.to_rfc3339(),
                version.subject_id,
                version.predicate_uri,
                version.object_id,
            ],
        )
        .map_err(|e| match e {
            rusqlite::Error::SqliteFailure(code, _)
                if code.code == rusqlite::ErrorCode::ConstraintViolation =>
            {
                StrataError::conflict(&version.tenant_id, version.triple_id, version.version_number)
            }
            other => other.into(),
        })?;
        Ok(())
    }

    async fn get(
        &self,
        tenant_id: &str,
        triple_id: Uuid,
        version_number: u32,
    ) -> StrataResult<Option<TripleVersion>> {
        let conn = self.lock_conn()?;
        let mut stmt = conn.prepare(&format!(
            "SELECT {} FROM triple_versions \
             WHERE tenant_id = ?1 AND triple_id = ?2 AND version_number = ?3",
            Self::SELECT_COLUMNS
        ))?;

        stmt.query_row(
            params![tenant_id, triple_id.to_string(), version_number],
            |row| Ok(Self::row_to_version(row)),
        )
        .optional()?
        .transpose()
    }

    async fn history(&self, tenant_id: &str, triple_id: Uuid) -> StrataResult<Vec<TripleVersion>> {
        let conn = self.lock_conn()?;
        let mut stmt = conn.prepare(&format!(
            "SELECT {} FROM triple_versions \
             WHERE tenant_id = ?1 AND triple_id = ?2 \
             ORDER BY version_number DESC",
            Self::SELECT_COLUMNS
        ))?;

        let results = stmt.query_map(params![tenant_id, triple_id.to_string()], |row| {
            Ok(Self::row_to_version(row))
        })?;
        results
            .map(|r| r.map_err(StrataError::from).and_then(|inner| inner))
            .collect()
    }

    async fn latest(
        &self,
        tenant_id: &str,
        triple_id: Uuid,
    ) -> StrataResult<Option<TripleVersion>> {
        let conn = self.lock_conn()?;
        let mut stmt = conn.prepare(&format!(
            "SELECT {} FROM triple_versions \
             WHERE tenant_id = ?1 AND triple_id = ?2 \
             ORDER BY version_number DESC LIMIT 1",
            Self::SELECT_COLUMNS
        ))?;

        stmt.query_row(params![tenant_id, triple_id.to_string()], |row| {
            Ok(Self::row_to_version(row))
        })
        .optional()?
        .transpose()
    }

    async fn max_version(&self, tenant_id: &str, triple_id: Uuid) -> StrataResult<Option<u32>> {
        let conn = self.lock_conn()?;
        let max: Option<u32> = conn.query_row(
            "SELECT MAX(version_number) FROM triple_versions WHERE tenant_id = ?1 AND triple_id = ?2",
            params![tenant_id, triple_id.to_string()],
            |row| row.get(0),
        )?;
        Ok(max)
    }

    async fn version_at(
        &self,
        tenant_id: &str,
        triple_id: Uuid,
        at: DateTime<Utc>,
    ) -> StrataResult<Option<TripleVersion>> {
        let conn = self.lock_conn()?;
        let mut stmt = conn.prepare(&format!(
            "SELECT {} FROM triple_versions \
             WHERE tenant_id = ?1 AND triple_id = ?2 AND created_at <= ?3 \
             ORDER BY created_at DESC, version_number DESC LIMIT 1",
            Self::SELECT_COLUMNS
        ))?;

        stmt.query_row(
            params![tenant_id, triple_id.to_string(), at.to_rfc3339()],
            |row| Ok(Self::row_to_version(row)),
        )
        .optional()?
        .transpose()
    }

    async fn versions_in_range(
        &self,
        tenant_id: &str,
        from: DateTime<Utc>,
        to: DateTime<Utc>,
    ) -> StrataResult<Vec<TripleVersion>> {
        let conn = self.lock_conn()?;
        let mut stmt = conn.prepare(&format!(
            "SELECT {} FROM triple_versions \
             WHERE tenant_id = ?1 AND created_at >= ?2 AND created_at <= ?3 \
             ORDER BY created_at ASC, version_number ASC",
            Self::SELECT_COLUMNS
        ))?;

        let results = stmt.query_map(
            params![tenant_id, from.to_rfc3339(), to.to_rfc3339()],
            |row| Ok(Self::row_to_version(row)),
        )?;
        results
            .map(|r| r.map_err(StrataError::from).and_then(|inner| inner))
            .collect()
    }

    async fn versions_with_number(
        &self,
        tenant_id: &str,
        version_number: u32,
    ) -> StrataResult<Vec<TripleVersion>> {
        let conn = self.lock_conn()?;
        let mut stmt = conn.prepare(&format!(
            "SELECT {} FROM triple_versions \
             WHERE tenant_id = ?1 AND version_number = ?2 \
             ORDER BY created_at ASC",
            Self::SELECT_COLUMNS
        ))?;

        let results = stmt.query_map(params![tenant_id, version_number], |row| {
            Ok(Self::row_to_version(row))
        })?;
        results
            .map(|r| r.map_err(StrataError::from).and_then(|inner| inner))
            .collect()
    }

    async fn triple_ids(&self, tenant_id: &str) -> StrataResult<Vec<Uuid>> {
        let conn = self.lock_conn()?;
        let mut stmt = conn
            .prepare("SELECT DISTINCT triple_id FROM triple_versions WHERE tenant_id = ?1")?;
        let results = stmt.query_map(params![tenant_id], |row| {
            let id: String = row.get(0)?;
            Ok(id)
        })?;

        results
            .map(|r| {
                r.map_err(StrataError::from).and_then(|id| {
                    Uuid::parse_str(&id).map_err(|e| StrataError::internal(e.to_string()))
                })
            })
            .collect()
    }

    async fn summary(
        &self,
        tenant_id: &str,
        triple_id: Uuid,
    ) -> StrataResult<Option<VersionSummary>> {
        let history = self.history(tenant_id, triple_id).await?;
        Ok(summarize(triple_id, &history))
    }

    async fn count(&self, tenant_id: &str) -> StrataResult<usize> {
        let conn = self.lock_conn()?;
        let count: i64 = conn.query_row(
            "SELECT COUNT(*) FROM triple_versions WHERE tenant_id = ?1",
            params![tenant_id],
            |row| row.get(0),
        )?;
        Ok(count as usize)
    }
}
