//! skycat - write partitioned sky catalogs in HiPSCat layout
//!
//! A `Catalog` maps HEALPix tiles to lazily computed partitions. `Exporter`
//! writes one Parquet file per tile plus the metadata artifacts that let
//! other readers (and `read_hipscat`) open the result.

// FormatError carries the full OpenDAL error plus the failing path.
#![allow(clippy::result_large_err)]

mod catalog;
mod export;
mod init;
mod loader;

pub use catalog::{Catalog, CatalogStructure, InMemoryPartition, Partition, StoredPartition};
pub use export::{ErrorCode, ExportError, Exporter, MetadataArtifact, TOOL_NAME};
pub use init::{init_tracing, log_storage};
pub use loader::read_hipscat;

pub use skycat_config as config;
pub use skycat_format as format;
