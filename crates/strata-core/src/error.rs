//! Error types for strata operations.
//!
//! This module provides a structured error hierarchy with stable error codes
//! and enough context (tenant, triple id, version numbers) for callers to log
//! and retry. Storage-layer errors never leak through the public contract;
//! they are wrapped into [`StrataError::Store`].

use std::collections::HashMap;
use thiserror::Error;
use uuid::Uuid;

/// Result type alias for strata operations.
pub type StrataResult<T> = Result<T, StrataError>;

/// Main error type for all strata operations.
#[derive(Error, Debug)]
pub enum StrataError {
    /// Input validation failed. Raised synchronously, before any I/O.
    #[error("Validation error: {message}")]
    Validation {
        message: String,
        code: ErrorCode,
        details: HashMap<String, String>,
        suggestion: Option<String>,
    },

    /// A triple, version, or snapshot was not found.
    #[error("Not found: {message}")]
    NotFound {
        message: String,
        code: ErrorCode,
        triple_id: Option<Uuid>,
        version_number: Option<u32>,
        snapshot: Option<String>,
    },

    /// Two writers raced on the same fact's next version number.
    #[error("Version conflict: {message}")]
    Conflict {
        message: String,
        tenant_id: String,
        triple_id: Uuid,
        version_number: u32,
    },

    /// The triple store collaborator failed. Never retried internally; the
    /// caller applies its own backoff policy.
    #[error("Triple store error: {message}")]
    Store {
        message: String,
        code: ErrorCode,
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    /// Snapshot restore left the graph in an inconsistent state: the old
    /// contents were removed and neither the snapshot nor the rollback could
    /// be fully applied.
    #[error("Snapshot restore failed: {message}")]
    RestoreFailed {
        message: String,
        snapshot: String,
        tenant_id: String,
    },

    /// Configuration error.
    #[error("Configuration error: {0}")]
    Configuration(String),

    /// IO error.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON serialization error.
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Internal error.
    #[error("Internal error: {0}")]
    Internal(String),
}

/// Error codes for programmatic handling.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCode {
    // Validation (VAL_xxx)
    ValInvalidInput,
    ValMissingField,
    ValAmbiguousQuery,

    // Versioning (VER_xxx)
    VerTripleNotFound,
    VerVersionNotFound,
    VerConflict,

    // Snapshot (SNP_xxx)
    SnpNotFound,
    SnpRestoreFailed,

    // Triple store (STO_xxx)
    StoUnavailable,
    StoOperationFailed,
    StoTimeout,

    // Internal
    Internal,
}

impl ErrorCode {
    /// Get the string representation of the error code.
    pub fn as_str(&self) -> &'static str {
        match self {
            ErrorCode::ValInvalidInput => "VAL_001",
            ErrorCode::ValMissingField => "VAL_002",
            ErrorCode::ValAmbiguousQuery => "VAL_003",
            ErrorCode::VerTripleNotFound => "VER_001",
            ErrorCode::VerVersionNotFound => "VER_002",
            ErrorCode::VerConflict => "VER_003",
            ErrorCode::SnpNotFound => "SNP_001",
            ErrorCode::SnpRestoreFailed => "SNP_002",
            ErrorCode::StoUnavailable => "STO_001",
            ErrorCode::StoOperationFailed => "STO_002",
            ErrorCode::StoTimeout => "STO_003",
            ErrorCode::Internal => "INT_001",
        }
    }
}

impl StrataError {
    /// Create a validation error.
    pub fn validation(message: impl Into<String>) -> Self {
        Self::Validation {
            message: message.into(),
            code: ErrorCode::ValInvalidInput,
            details: HashMap::new(),
            suggestion: None,
        }
    }

    /// Create a validation error for a query whose parts contradict each
    /// other.
    pub fn ambiguous_query(message: impl Into<String>) -> Self {
        Self::Validation {
            message: message.into(),
            code: ErrorCode::ValAmbiguousQuery,
            details: HashMap::new(),
            suggestion: None,
        }
    }

    /// Create a validation error for a missing or empty required field.
    pub fn missing_field(field: impl Into<String>) -> Self {
        let field = field.into();
        Self::Validation {
            message: format!("Required field '{}' is missing or empty", field),
            code: ErrorCode::ValMissingField,
            details: HashMap::from([("field".to_string(), field)]),
            suggestion: None,
        }
    }

    /// Create a not-found error for a triple.
    pub fn triple_not_found(triple_id: Uuid) -> Self {
        Self::NotFound {
            message: format!("Triple '{}' not found", triple_id),
            code: ErrorCode::VerTripleNotFound,
            triple_id: Some(triple_id),
            version_number: None,
            snapshot: None,
        }
    }

    /// Create a not-found error for a specific version of a triple.
    pub fn version_not_found(triple_id: Uuid, version_number: u32) -> Self {
        Self::NotFound {
            message: format!(
                "Version {} of triple '{}' not found",
                version_number, triple_id
            ),
            code: ErrorCode::VerVersionNotFound,
            triple_id: Some(triple_id),
            version_number: Some(version_number),
            snapshot: None,
        }
    }

    /// Create a not-found error for a snapshot.
    pub fn snapshot_not_found(name: impl Into<String>) -> Self {
        let name = name.into();
        Self::NotFound {
            message: format!("Snapshot '{}' not found", name),
            code: ErrorCode::SnpNotFound,
            triple_id: None,
            version_number: None,
            snapshot: Some(name),
        }
    }

    /// Create a version conflict error.
    pub fn conflict(tenant_id: impl Into<String>, triple_id: Uuid, version_number: u32) -> Self {
        let tenant_id = tenant_id.into();
        Self::Conflict {
            message: format!(
                "Version {} already recorded or out of sequence for triple '{}' (tenant '{}')",
                version_number, triple_id, tenant_id
            ),
            tenant_id,
            triple_id,
            version_number,
        }
    }

    /// Create a triple store error.
    pub fn store(message: impl Into<String>) -> Self {
        Self::Store {
            message: message.into(),
            code: ErrorCode::StoOperationFailed,
            source: None,
        }
    }

    /// Create a triple store error wrapping an underlying cause.
    pub fn store_with_source(
        message: impl Into<String>,
        source: impl std::error::Error + Send + Sync + 'static,
    ) -> Self {
        Self::Store {
            message: message.into(),
            code: ErrorCode::StoUnavailable,
            source: Some(Box::new(source)),
        }
    }

    /// Create a store timeout error.
    pub fn store_timeout(seconds: u64) -> Self {
        Self::Store {
            message: format!("Triple store query timed out after {}s", seconds),
            code: ErrorCode::StoTimeout,
            source: None,
        }
    }

    /// Create a restore-failed error.
    pub fn restore_failed(
        message: impl Into<String>,
        snapshot: impl Into<String>,
        tenant_id: impl Into<String>,
    ) -> Self {
        Self::RestoreFailed {
            message: message.into(),
            snapshot: snapshot.into(),
            tenant_id: tenant_id.into(),
        }
    }

    /// Create an internal error.
    pub fn internal(message: impl Into<String>) -> Self {
        Self::Internal(message.into())
    }

    /// Get the error code for this error, if it carries one.
    pub fn code(&self) -> Option<ErrorCode> {
        match self {
            Self::Validation { code, .. }
            | Self::NotFound { code, .. }
            | Self::Store { code, .. } => Some(*code),
            Self::Conflict { .. } => Some(ErrorCode::VerConflict),
            Self::RestoreFailed { .. } => Some(ErrorCode::SnpRestoreFailed),
            _ => None,
        }
    }

    /// Whether this error is a version conflict that a sequencing owner may
    /// retry with a freshly computed version number.
    pub fn is_conflict(&self) -> bool {
        matches!(self, Self::Conflict { .. })
    }
}

impl From<rusqlite::Error> for StrataError {
    fn from(err: rusqlite::Error) -> Self {
        // Constraint violations on the version log's unique index mean a
        // writer raced; everything else is a store failure. The caller maps
        // constraint errors to Conflict where it has the identifiers.
        Self::Store {
            message: format!("SQLite error: {}", err),
            code: ErrorCode::StoOperationFailed,
            source: Some(Box::new(err)),
        }
    }
}
