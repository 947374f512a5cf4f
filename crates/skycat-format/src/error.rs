//! Error types for catalog format operations

use thiserror::Error;

use crate::pixel::HealpixPixel;

/// Errors raised while reading or writing catalog artifacts
#[derive(Debug, Error)]
pub enum FormatError {
    /// Storage backend rejected an operation
    #[error("storage operation failed for '{path}': {source}")]
    Storage {
        path: String,
        #[source]
        source: opendal::Error,
    },

    /// A catalog directory is occupied by something else
    #[error("'{path}' exists and is not a directory")]
    NotADirectory { path: String },

    /// Catalog path cannot be used as a storage location
    #[error("invalid catalog path '{path}': {reason}")]
    InvalidPath { path: String, reason: String },

    /// Storage configuration cannot be turned into an operator
    #[error("invalid storage configuration: {0}")]
    InvalidConfig(String),

    #[error("parquet error: {0}")]
    Parquet(#[from] parquet::errors::ParquetError),

    #[error("arrow error: {0}")]
    Arrow(#[from] arrow::error::ArrowError),

    /// JSON document could not be encoded or decoded
    #[error("invalid JSON in '{path}': {source}")]
    Json {
        path: String,
        #[source]
        source: serde_json::Error,
    },

    /// Data file does not share the schema of the files before it
    #[error("parquet schema of '{path}' does not match '{expected_from}'")]
    SchemaMismatch { path: String, expected_from: String },

    /// partition_info.csv is missing columns or holds bad values
    #[error("malformed partition info in '{path}': {reason}")]
    PartitionInfo { path: String, reason: String },

    /// Two partitions were registered for the same tile
    #[error("duplicate partition for {0}")]
    DuplicatePartition(HealpixPixel),

    /// A lazily materialized partition could not be computed
    #[error("failed to compute partition: {0}")]
    Compute(String),
}

impl FormatError {
    pub(crate) fn storage(path: impl Into<String>, source: opendal::Error) -> Self {
        Self::Storage {
            path: path.into(),
            source,
        }
    }

    pub(crate) fn json(path: impl Into<String>, source: serde_json::Error) -> Self {
        Self::Json {
            path: path.into(),
            source,
        }
    }

    /// True when the underlying storage reported a missing object
    pub fn is_not_found(&self) -> bool {
        matches!(
            self,
            Self::Storage { source, .. } if source.kind() == opendal::ErrorKind::NotFound
        )
    }
}

/// Result type alias for FormatError
pub type Result<T> = std::result::Result<T, FormatError>;
