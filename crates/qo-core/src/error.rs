//! Error types for qo-core

use thiserror::Error;

/// Core error type for qopt
#[derive(Error, Debug)]
pub enum CoreError {
    /// E001: Configuration file not found
    #[error("[E001] Config file not found: {path}")]
    ConfigNotFound { path: String },

    /// E002: Invalid configuration value
    #[error("[E002] Invalid config: {message}")]
    ConfigInvalid { message: String },

    /// E003: Table id not registered in this compilation
    #[error("[E003] Unknown table id: {id}")]
    UnknownTable { id: u32 },

    /// E004: Column id not registered in this compilation
    #[error("[E004] Unknown column id: {id}")]
    UnknownColumn { id: u32 },

    /// E005: Sequence id not registered in this compilation
    #[error("[E005] Unknown sequence id: {id}")]
    UnknownSequence { id: u32 },

    /// E006: Index ordinal out of range for a table
    #[error("[E006] Table '{table}' has no index with ordinal {index}")]
    UnknownIndex { table: String, index: u32 },

    /// E007: Table name lookup failed
    #[error("[E007] Unknown table '{name}'")]
    UnknownTableName { name: String },

    /// E008: Invalid catalog definition
    #[error("[E008] Invalid catalog definition for '{name}': {message}")]
    CatalogInvalid { name: String, message: String },

    /// E009: Duplicate table name in one compilation
    #[error("[E009] Duplicate table name: {name}")]
    DuplicateTable { name: String },

    /// IO error with file path context
    #[error("IO error at {path}: {source}")]
    IoWithPath {
        path: String,
        source: std::io::Error,
    },

    /// YAML parse error
    #[error("YAML parse error: {0}")]
    YamlParse(#[from] serde_yaml::Error),
}

/// Result type alias for CoreError
pub type CoreResult<T> = Result<T, CoreError>;
