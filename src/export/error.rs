//! Error types for catalog export.

use std::fmt;

use skycat_format::{FormatError, HealpixPixel};
use thiserror::Error;

/// Error codes for programmatic handling
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCode {
    /// E001: Destination directory could not be created
    E001DirectoryCreation,
    /// E002: A partition could not be computed or written
    E002PartitionWrite,
    /// E003: A metadata artifact could not be written
    E003MetadataWrite,
}

impl ErrorCode {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::E001DirectoryCreation => "E001",
            Self::E002PartitionWrite => "E002",
            Self::E003MetadataWrite => "E003",
        }
    }
}

/// Metadata files written after the partitions
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MetadataArtifact {
    ParquetMetadata,
    PartitionInfo,
    CatalogInfo,
    Provenance,
}

impl fmt::Display for MetadataArtifact {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::ParquetMetadata => "parquet metadata",
            Self::PartitionInfo => "partition info",
            Self::CatalogInfo => "catalog info",
            Self::Provenance => "provenance info",
        };
        f.write_str(name)
    }
}

/// Errors that abort a catalog export.
///
/// None are retried. A failed export may leave a partially written
/// directory behind; treat it as invalid until an export succeeds.
#[derive(Debug, Error)]
pub enum ExportError {
    #[error("[{code}] Failed to create catalog directory '{path}': {source}")]
    DirectoryCreation {
        code: &'static str,
        path: String,
        #[source]
        source: FormatError,
    },

    #[error("[{code}] Failed to write partition ({pixel}) to '{path}': {source}")]
    PartitionWrite {
        code: &'static str,
        pixel: HealpixPixel,
        path: String,
        #[source]
        source: FormatError,
    },

    #[error("[{code}] Failed to write {artifact} for catalog at '{path}': {source}")]
    MetadataWrite {
        code: &'static str,
        artifact: MetadataArtifact,
        path: String,
        #[source]
        source: FormatError,
    },
}

impl ExportError {
    pub fn directory_creation(path: impl Into<String>, source: FormatError) -> Self {
        Self::DirectoryCreation {
            code: ErrorCode::E001DirectoryCreation.as_str(),
            path: path.into(),
            source,
        }
    }

    pub fn partition_write(pixel: HealpixPixel, path: impl Into<String>, source: FormatError) -> Self {
        Self::PartitionWrite {
            code: ErrorCode::E002PartitionWrite.as_str(),
            pixel,
            path: path.into(),
            source,
        }
    }

    pub fn metadata_write(
        artifact: MetadataArtifact,
        path: impl Into<String>,
        source: FormatError,
    ) -> Self {
        Self::MetadataWrite {
            code: ErrorCode::E003MetadataWrite.as_str(),
            artifact,
            path: path.into(),
            source,
        }
    }

    pub fn code(&self) -> ErrorCode {
        match self {
            Self::DirectoryCreation { .. } => ErrorCode::E001DirectoryCreation,
            Self::PartitionWrite { .. } => ErrorCode::E002PartitionWrite,
            Self::MetadataWrite { .. } => ErrorCode::E003MetadataWrite,
        }
    }
}

/// Result type alias for ExportError
pub type Result<T> = std::result::Result<T, ExportError>;

#[cfg(test)]
mod tests {
    use super::*;
    use std::error::Error as _;

    #[test]
    fn test_messages_carry_code_and_cause() {
        let err = ExportError::partition_write(
            HealpixPixel::new(1, 44),
            "out/Norder=1/Dir=0/Npix=44.parquet",
            FormatError::Compute("worker died".to_string()),
        );

        let message = err.to_string();
        assert!(message.starts_with("[E002]"));
        assert!(message.contains("Order: 1, Pixel: 44"));
        assert!(message.contains("worker died"));
        assert_eq!(err.code(), ErrorCode::E002PartitionWrite);
        assert!(err.source().is_some());
    }

    #[test]
    fn test_metadata_artifact_names() {
        let err = ExportError::metadata_write(
            MetadataArtifact::Provenance,
            "out",
            FormatError::Compute("x".to_string()),
        );
        assert!(err.to_string().contains("provenance info"));
        assert_eq!(err.code().as_str(), "E003");
    }
}
