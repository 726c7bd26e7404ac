//! Error types for flatdb
//!
//! Provides a unified error type for all operations.

use std::path::PathBuf;

use thiserror::Error;

/// Result type alias using FlatDbError
pub type Result<T> = std::result::Result<T, FlatDbError>;

/// Unified error type for flatdb operations
#[derive(Debug, Error)]
pub enum FlatDbError {
    // -------------------------------------------------------------------------
    // I/O Errors
    // -------------------------------------------------------------------------
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    // -------------------------------------------------------------------------
    // Registry Errors
    // -------------------------------------------------------------------------
    #[error("Database not connected")]
    NotConnected,

    #[error("Table not found: {0}")]
    TableNotFound(String),

    #[error("Manifest error on line {line}: {reason}")]
    Manifest { line: usize, reason: String },

    // -------------------------------------------------------------------------
    // Entry Errors
    // -------------------------------------------------------------------------
    #[error("Entry {id} not found in table {table}")]
    EntryNotFound { table: String, id: u64 },

    #[error("Missing value for field: {0}")]
    MissingField(String),

    #[error("Too many fields: schema defines {expected}, got {got}")]
    TooManyFields { expected: usize, got: usize },

    #[error("Value for field {field} contains the reserved separator")]
    ReservedSequence { field: String },

    #[error("Corrupt entry: {0}")]
    CorruptEntry(String),

    #[error("Entry {0} already exists")]
    DuplicateId(u64),

    #[error("Transform failed: {0}")]
    Transform(String),

    // -------------------------------------------------------------------------
    // Serialization Errors
    // -------------------------------------------------------------------------
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    // -------------------------------------------------------------------------
    // Concurrency Errors
    // -------------------------------------------------------------------------
    #[error("Table is locked (lock file: {})", .0.display())]
    TableLocked(PathBuf),

    // -------------------------------------------------------------------------
    // Configuration Errors
    // -------------------------------------------------------------------------
    #[error("Configuration error: {0}")]
    Config(String),
}
