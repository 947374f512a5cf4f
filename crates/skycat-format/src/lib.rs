//! HiPSCat on-disk catalog format
//!
//! Everything a catalog directory is made of: tile-addressed Parquet
//! partition files, consolidated Parquet metadata, the partition index,
//! the catalog descriptor, and provenance. All I/O goes through an OpenDAL
//! operator built from `skycat_config::StorageConfig`.

// Storage errors carry the full OpenDAL error plus the failing path.
#![allow(clippy::result_large_err)]

mod catalog_info;
mod encoding;
mod error;
mod parquet_metadata;
mod partition_info;
mod paths;
mod pixel;
mod provenance;
mod storage;

pub use catalog_info::{
    read_catalog_info, write_catalog_info, CatalogInfo, CatalogInfoBuilder, CatalogType,
    DEFAULT_DEC_COLUMN, DEFAULT_EPOCH, DEFAULT_RA_COLUMN,
};
pub use encoding::{
    decode_batch, encode_batch, read_parquet_file, write_dataframe_to_parquet, EncodingOptions,
    DEFAULT_ROW_GROUP_SIZE,
};
pub use error::{FormatError, Result};
pub use parquet_metadata::{
    read_footer, read_parquet_schema, write_parquet_metadata, ConsolidatedMetadata,
};
pub use partition_info::{
    read_partition_info, write_partition_info, PartitionInfo, PartitionInfoEntry, PartitionRecord,
};
pub use paths::{
    join_path, normalize_catalog_path, CATALOG_INFO_FILENAME, PARQUET_COMMON_METADATA_FILENAME,
    PARQUET_METADATA_FILENAME, PARTITION_INFO_FILENAME, PROVENANCE_INFO_FILENAME,
};
pub use pixel::{pixel_catalog_file, pixel_directory, HealpixPixel};
pub use provenance::{read_provenance_info, write_provenance_info, ProvenanceInfo, ToolArgs};
pub use storage::{build_operator, exists, make_directory};

// Re-export the storage crate so callers build operators against the same version
pub use opendal;
