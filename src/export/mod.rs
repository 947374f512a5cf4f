//! Write a partitioned catalog to storage in HiPSCat layout.
//!
//! Partition files are written first, then the four metadata artifacts
//! (`_metadata`/`_common_metadata`, `partition_info.csv`,
//! `catalog_info.json`, `provenance_info.json`). The first failure aborts.

mod error;

use std::collections::BTreeMap;

use serde_json::Value;
use skycat_format::opendal::Operator;
use skycat_format::{
    make_directory, normalize_catalog_path, pixel_catalog_file, write_catalog_info,
    write_dataframe_to_parquet, write_parquet_metadata, write_partition_info,
    write_provenance_info, EncodingOptions, FormatError, HealpixPixel, PartitionInfo, ToolArgs,
};

use crate::catalog::{Catalog, CatalogStructure};

pub use error::{ErrorCode, ExportError, MetadataArtifact, Result};

/// Name recorded in provenance for catalogs written by this crate
pub const TOOL_NAME: &str = "skycat";

/// Writes catalogs through one storage operator.
#[derive(Debug, Clone)]
pub struct Exporter {
    operator: Operator,
    tool_version: String,
    encoding: EncodingOptions,
}

impl Exporter {
    /// `tool_version` is recorded in every provenance file this exporter writes.
    pub fn new(operator: Operator, tool_version: impl Into<String>) -> Self {
        Self {
            operator,
            tool_version: tool_version.into(),
            encoding: EncodingOptions::default(),
        }
    }

    pub fn with_row_group_size(mut self, row_group_size: usize) -> Self {
        self.encoding = EncodingOptions::with_row_group_size(row_group_size);
        self
    }

    pub fn operator(&self) -> &Operator {
        &self.operator
    }

    pub fn tool_version(&self) -> &str {
        &self.tool_version
    }

    /// Export `catalog` to `destination`, optionally under a new name.
    ///
    /// Re-running against the same destination overwrites every partition
    /// file and metadata artifact. On error the destination may hold a
    /// partial catalog.
    pub async fn export(
        &self,
        catalog: &Catalog,
        destination: &str,
        catalog_name: Option<&str>,
    ) -> Result<()> {
        let base = normalize_catalog_path(destination)
            .map_err(|e| ExportError::directory_creation(destination, e))?;
        make_directory(&self.operator, &base)
            .await
            .map_err(|e| ExportError::directory_creation(&base, e))?;

        tracing::info!(
            "Exporting catalog '{}' ({} partitions) to '{}'",
            catalog.catalog_info().catalog_name,
            catalog.num_partitions(),
            base
        );

        let written = self.write_partitions(catalog, &base).await?;

        write_parquet_metadata(&self.operator, &base, &written.files, catalog.schema())
            .await
            .map_err(|e| ExportError::metadata_write(MetadataArtifact::ParquetMetadata, &base, e))?;

        let partition_info = PartitionInfo::from_row_counts(&written.row_counts);
        write_partition_info(&self.operator, &base, &partition_info)
            .await
            .map_err(|e| ExportError::metadata_write(MetadataArtifact::PartitionInfo, &base, e))?;

        let name = catalog_name
            .filter(|name| !name.is_empty())
            .unwrap_or_else(|| catalog.structure().catalog_name());
        let structure = catalog
            .structure()
            .with_overrides(name, &base, partition_info.total_rows());
        write_catalog_info(&self.operator, &base, &structure.catalog_info)
            .await
            .map_err(|e| ExportError::metadata_write(MetadataArtifact::CatalogInfo, &base, e))?;

        let tool_args = self.tool_args(&structure);
        write_provenance_info(&self.operator, &base, &structure.catalog_info, &tool_args)
            .await
            .map_err(|e| ExportError::metadata_write(MetadataArtifact::Provenance, &base, e))?;

        tracing::info!(
            "✓ Exported '{}' to '{}': {} partitions, {} rows",
            structure.catalog_name(),
            base,
            partition_info.len(),
            structure.catalog_info.total_rows
        );
        Ok(())
    }

    /// Compute and write each partition in tile order.
    async fn write_partitions(&self, catalog: &Catalog, base: &str) -> Result<WrittenPartitions> {
        let mut written = WrittenPartitions::default();

        for (pixel, partition) in catalog.partitions() {
            let path = pixel_catalog_file(base, *pixel);
            let batch = partition
                .compute()
                .await
                .map_err(|e| ExportError::partition_write(*pixel, &path, e))?;

            // Every partition must share the catalog's columns
            if batch.schema().fields() != catalog.schema().fields() {
                return Err(ExportError::partition_write(
                    *pixel,
                    &path,
                    FormatError::SchemaMismatch {
                        path: path.clone(),
                        expected_from: "catalog schema".to_string(),
                    },
                ));
            }

            write_dataframe_to_parquet(&self.operator, &batch, &path, &self.encoding)
                .await
                .map_err(|e| ExportError::partition_write(*pixel, &path, e))?;

            written.row_counts.insert(*pixel, batch.num_rows() as u64);
            written.files.push(path);
        }

        Ok(written)
    }

    fn tool_args(&self, structure: &CatalogStructure) -> ToolArgs {
        let info = &structure.catalog_info;
        let path = structure.catalog_path.clone().map_or(Value::Null, Value::from);

        let runtime_args = BTreeMap::from([
            ("catalog_name".to_string(), Value::from(info.catalog_name.as_str())),
            ("output_path".to_string(), path.clone()),
            ("output_catalog_name".to_string(), Value::from(info.catalog_name.as_str())),
            ("catalog_path".to_string(), path),
            ("epoch".to_string(), Value::from(info.epoch.as_str())),
            ("catalog_type".to_string(), Value::from(info.catalog_type.as_str())),
            ("ra_column".to_string(), Value::from(info.ra_column.as_str())),
            ("dec_column".to_string(), Value::from(info.dec_column.as_str())),
        ]);

        ToolArgs {
            tool_name: TOOL_NAME.to_string(),
            version: self.tool_version.clone(),
            runtime_args,
        }
    }
}

/// Partition files produced by one export, in tile order
#[derive(Debug, Default)]
struct WrittenPartitions {
    row_counts: BTreeMap<HealpixPixel, u64>,
    files: Vec<String>,
}
