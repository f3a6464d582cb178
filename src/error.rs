//! Error types for flatsql.
//!
//! Minimal error types without any storage-engine dependencies. A clause
//! fragment that fails its grammar is *not* an error (parsers return `None`);
//! these variants cover genuinely fatal conditions only.

use thiserror::Error;

/// flatsql error type
#[derive(Error, Debug)]
pub enum FlatSqlError {
    #[error("Table not found: {0}")]
    TableNotFound(String),

    #[error("Unknown option: {0}")]
    UnknownOption(String),

    #[error("Malformed source data: {0}")]
    MalformedData(String),

    #[error("Execution error: {0}")]
    ExecutionError(String),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    JsonError(#[from] serde_json::Error),

    #[error("CSV error: {0}")]
    CsvError(#[from] csv::Error),
}

/// Result type for flatsql operations
pub type FlatSqlResult<T> = Result<T, FlatSqlError>;

impl serde::Serialize for FlatSqlError {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        serializer.collect_str(self)
    }
}
