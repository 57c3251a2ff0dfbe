//! Error types for RELOG.
//!
//! This module provides the error hierarchy using `thiserror`.
//! The in-memory store only ever raises [`RelogError::InvalidArgument`];
//! the remaining variants belong to configuration and persistence.

use thiserror::Error;

/// Result type alias using `RelogError`.
pub type Result<T> = std::result::Result<T, RelogError>;

/// Main error type for all RELOG operations.
#[derive(Debug, Error)]
pub enum RelogError {
    // ═══════════════════════════════════════════════════════════════════════════
    // VALIDATION ERRORS
    // ═══════════════════════════════════════════════════════════════════════════

    /// Missing or empty owner/label on insert.
    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    /// A record failed structural validation (e.g. while importing).
    #[error("Invalid record: {0}")]
    InvalidRecord(String),

    /// A record with this id is already stored.
    #[error("Duplicate record ID: {0}")]
    DuplicateRecord(u64),

    /// Store configuration is unusable.
    #[error("Configuration error: {0}")]
    ConfigError(String),

    // ═══════════════════════════════════════════════════════════════════════════
    // STORAGE ERRORS
    // ═══════════════════════════════════════════════════════════════════════════

    /// Store file is truncated or corrupted.
    #[error("Store file error: {0}")]
    StoreFileError(String),

    /// Store file was written by an incompatible format version.
    #[error("Store file version mismatch: expected {expected}, got {actual}")]
    VersionMismatch {
        /// Version this build reads
        expected: u8,
        /// Version found in the file
        actual: u8,
    },

    /// File I/O error.
    #[error("I/O error: {0}")]
    IoError(#[from] std::io::Error),

    /// JSON serialization/deserialization error.
    #[error("JSON error: {0}")]
    JsonError(#[from] serde_json::Error),

    // ═══════════════════════════════════════════════════════════════════════════
    // INTERNAL ERRORS
    // ═══════════════════════════════════════════════════════════════════════════

    /// Internal invariant violation (should never happen).
    #[error("Internal error: {0}")]
    InternalError(String),
}

impl RelogError {
    /// Returns true if the caller supplied bad input (maps to a 4xx).
    pub fn is_client_error(&self) -> bool {
        matches!(
            self,
            RelogError::InvalidArgument(_)
                | RelogError::InvalidRecord(_)
                | RelogError::DuplicateRecord(_)
        )
    }

    /// Returns true if this error came from the persistence layer.
    pub fn is_storage_error(&self) -> bool {
        matches!(
            self,
            RelogError::StoreFileError(_)
                | RelogError::VersionMismatch { .. }
                | RelogError::IoError(_)
                | RelogError::JsonError(_)
        )
    }
}
