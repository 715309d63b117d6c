//! Error types for ClinicDB
//!
//! This module defines all error types used throughout the store.
//! We use `thiserror` for automatic `Display` and `Error` trait implementations.
//!
//! Every failure a caller can observe maps to exactly one variant. Nothing in
//! the store retries a failed mutation, so the variant a caller receives is
//! the definitive outcome of the call.

use crate::schema::TableId;
use std::io;
use std::path::PathBuf;
use thiserror::Error;

/// Result type alias for ClinicDB operations
pub type Result<T> = std::result::Result<T, Error>;

/// Error types for the clinic store
#[derive(Debug, Error)]
pub enum Error {
    /// Malformed arguments (pagination, filters, field values, immutable fields)
    #[error("Validation error: {0}")]
    Validation(String),

    /// A uniqueness-constrained column already holds this value
    #[error("Duplicate key in {table}: {column} = {value:?} already exists")]
    DuplicateKey {
        /// Table the write targeted
        table: TableId,
        /// Unique column that collided
        column: &'static str,
        /// Offending value
        value: String,
    },

    /// A foreign key does not resolve to an existing row
    #[error("Referential integrity violation in {table}: {column} = {id} has no row in {target}")]
    ReferentialIntegrity {
        /// Table the write targeted
        table: TableId,
        /// Foreign-key column
        column: &'static str,
        /// Referenced table
        target: TableId,
        /// Referenced id that does not exist
        id: i64,
    },

    /// Id lookup miss
    #[error("Row not found in {table}: id {id}")]
    NotFound {
        /// Table that was queried
        table: TableId,
        /// Missing id
        id: i64,
    },

    /// On-disk container does not match the expected layout
    #[error("Corrupt container {path}: {reason}")]
    CorruptContainer {
        /// Container path
        path: PathBuf,
        /// What failed to parse
        reason: String,
    },

    /// I/O error while persisting or exporting
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    /// Configuration file could not be read or parsed
    #[error("Configuration error: {0}")]
    Config(String),
}

impl Error {
    /// Shorthand for [`Error::Validation`]
    pub fn validation(msg: impl Into<String>) -> Self {
        Error::Validation(msg.into())
    }

    /// Shorthand for [`Error::CorruptContainer`]
    pub fn corrupt(path: impl Into<PathBuf>, reason: impl Into<String>) -> Self {
        Error::CorruptContainer {
            path: path.into(),
            reason: reason.into(),
        }
    }

    /// Whether the error was caused by the caller's input rather than the store
    pub fn is_client_error(&self) -> bool {
        matches!(
            self,
            Error::Validation(_)
                | Error::DuplicateKey { .. }
                | Error::ReferentialIntegrity { .. }
                | Error::NotFound { .. }
        )
    }
}
