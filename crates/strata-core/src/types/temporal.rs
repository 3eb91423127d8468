//! Temporal query types.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::{StrataError, StrataResult};
use crate::types::Triple;
use crate::versioning::{ChangeType, TripleVersion};

/// A temporal query over a tenant's version history.
///
/// Modes are mutually exclusive by construction; ambiguous combinations of
/// point-in-time, range, and version-number filters cannot be represented.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "mode", rename_all = "snake_case")]
pub enum TemporalQuery {
    /// Reconstruct the state of all facts as of a past instant.
    AsOf { as_of: DateTime<Utc> },
    /// Versions recorded within `[from, to]`.
    Range {
        from: DateTime<Utc>,
        to: DateTime<Utc>,
        /// Restrict to these change kinds (no filter when `None`).
        #[serde(skip_serializing_if = "Option::is_none")]
        change_types: Option<Vec<ChangeType>>,
        /// `true` returns the raw version records; `false` returns the
        /// reconstructed state (as of `to`) of facts that changed in range.
        #[serde(default)]
        include_all_versions: bool,
    },
    /// Every version record, across all facts, with this version number.
    AtVersion { version_number: u32 },
}

impl TemporalQuery {
    /// Point-in-time query.
    pub fn as_of(as_of: DateTime<Utc>) -> Self {
        Self::AsOf { as_of }
    }

    /// Range query returning raw version records.
    pub fn range(from: DateTime<Utc>, to: DateTime<Utc>) -> Self {
        Self::Range {
            from,
            to,
            change_types: None,
            include_all_versions: true,
        }
    }

    /// Exact version-number query.
    pub fn at_version(version_number: u32) -> Self {
        Self::AtVersion { version_number }
    }

    /// Validate the query. Runs before any I/O.
    pub fn validate(&self) -> StrataResult<()> {
        match self {
            Self::Range { from, to, .. } if from > to => {
                Err(StrataError::ambiguous_query(format!(
                    "Invalid temporal range: from ({}) is after to ({})",
                    from, to
                )))
            }
            Self::AtVersion { version_number: 0 } => Err(StrataError::validation(
                "Version numbers start at 1".to_string(),
            )),
            _ => Ok(()),
        }
    }
}

/// Result of a temporal query.
///
/// As-of queries and non-raw range queries populate `triples` (reconstructed
/// state); raw range and version-number queries populate `triple_versions`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TemporalQueryResult {
    /// Reconstructed facts.
    pub triples: Vec<Triple>,
    /// Raw version records.
    pub triple_versions: Vec<TripleVersion>,
    /// The query that produced this result.
    pub query: TemporalQuery,
}

impl TemporalQueryResult {
    /// Create an empty result for the given query.
    pub fn empty(query: TemporalQuery) -> Self {
        Self {
            triples: Vec::new(),
            triple_versions: Vec::new(),
            query,
        }
    }
}
