//! Error types for card_import

use crate::source::SourceType;
use thiserror::Error;
use uuid::Uuid;

/// Unified error type for card_import operations
#[derive(Debug, Error)]
pub enum ImportError {
    /// Status queried for a job id this process never issued
    #[error("Import job not found: {0}")]
    JobNotFound(Uuid),
    /// HTTP request failed (network error, timeout, etc.)
    #[error("Network error: {0}")]
    Network(#[from] reqwest::Error),
    /// Upstream returned a non-success status code
    #[error("HTTP error from {source_type} on page {page}: {status}")]
    HttpStatus {
        source_type: SourceType,
        page: u32,
        status: reqwest::StatusCode,
    },
    /// Failed to parse JSON response
    #[error("Parse error: {0}")]
    Parse(#[from] serde_json::Error),
    /// Database operation failed
    #[error("Database error: {0}")]
    Database(#[from] rusqlite::Error),
    /// Shared database connection was poisoned by a panicking holder
    #[error("Database connection lock poisoned")]
    LockPoisoned,
    /// Source identifier did not match any known catalog
    #[error("Unknown source type: {0}")]
    UnknownSource(String),
}

impl ImportError {
    /// Upstream fetch failures (network, status, payload)
    pub fn is_source_failure(&self) -> bool {
        matches!(
            self,
            ImportError::Network(_) | ImportError::HttpStatus { .. } | ImportError::Parse(_)
        )
    }

    /// Persistence failures (records or checkpoints)
    pub fn is_store_failure(&self) -> bool {
        matches!(self, ImportError::Database(_) | ImportError::LockPoisoned)
    }
}

/// Result alias for card_import operations
pub type Result<T> = std::result::Result<T, ImportError>;
