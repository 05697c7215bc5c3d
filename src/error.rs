//! Custom error types for mtb-tools

use std::path::PathBuf;
use thiserror::Error;

/// Main error type for mtb-tools operations
#[derive(Error, Debug)]
pub enum Error {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("TOML parse error: {0}")]
    TomlParse(#[from] toml::de::Error),

    #[error("TOML serialize error: {0}")]
    TomlSerialize(#[from] toml::ser::Error),

    #[error("Directory walk error: {0}")]
    Walk(#[from] walkdir::Error),

    #[error("Database file not found: {}", .0.display())]
    DatabaseNotFound(PathBuf),

    #[error("No table matching '{pattern}' found (tables: {})", .tables.join(", "))]
    TableNotFound { pattern: String, tables: Vec<String> },

    #[error(
        "Table '{table}' does not have the expected columns (available: {}; required: {})",
        .available.join(", "),
        .required.join(", ")
    )]
    SchemaMismatch {
        table: String,
        available: Vec<String>,
        required: Vec<String>,
    },

    #[error("Cache alias '{alias}' not found (available: {})", .available.join(", "))]
    UnknownCacheAlias { alias: String, available: Vec<String> },

    #[error("{capability} is not supported by the '{backend}' backend of cache '{alias}'")]
    BackendUnsupported {
        alias: String,
        backend: String,
        capability: String,
    },

    #[error("Invalid phase: {0}")]
    InvalidPhase(String),
}

impl Error {
    /// True for the "missing input" family (source file or expected table)
    pub fn is_not_found(&self) -> bool {
        matches!(
            self,
            Error::DatabaseNotFound(_) | Error::TableNotFound { .. }
        )
    }
}

/// Result type alias for mtb-tools
pub type Result<T> = std::result::Result<T, Error>;
