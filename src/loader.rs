//! Open an on-disk catalog as a lazily loaded `Catalog`.

use std::sync::Arc;

use arrow::datatypes::SchemaRef;
use skycat_format::opendal::Operator;
use skycat_format::{
    join_path, normalize_catalog_path, pixel_catalog_file, read_catalog_info,
    read_parquet_schema, read_partition_info, FormatError, PartitionRecord,
    PARQUET_COMMON_METADATA_FILENAME,
};

use crate::catalog::{Catalog, CatalogStructure, StoredPartition};

/// Load the catalog rooted at `path`.
///
/// Reads `catalog_info.json` and `partition_info.csv` and registers one
/// `StoredPartition` per tile; partition files are only read when computed.
/// The schema comes from `_common_metadata`, or from the first partition
/// file when the consolidated metadata is missing.
pub async fn read_hipscat(operator: &Operator, path: &str) -> skycat_format::Result<Catalog> {
    let base = normalize_catalog_path(path)?;

    let catalog_info = read_catalog_info(operator, &base).await?;
    let records = read_partition_info(operator, &base).await?;
    let schema = resolve_schema(operator, &base, &records).await?;

    let structure = CatalogStructure {
        catalog_info,
        catalog_path: Some(base.clone()),
        on_disk: true,
    };

    let mut catalog = Catalog::new(structure, schema);
    for record in &records {
        let partition = StoredPartition::new(
            operator.clone(),
            pixel_catalog_file(&base, record.pixel),
        );
        catalog.add_partition(record.pixel, Arc::new(partition))?;
    }

    tracing::info!(
        "Loaded catalog '{}' from '{}' ({} partitions)",
        catalog.catalog_info().catalog_name,
        base,
        catalog.num_partitions()
    );
    Ok(catalog)
}

async fn resolve_schema(
    operator: &Operator,
    base: &str,
    records: &[PartitionRecord],
) -> skycat_format::Result<SchemaRef> {
    let common = join_path(base, PARQUET_COMMON_METADATA_FILENAME);
    match read_parquet_schema(operator, &common).await {
        Ok(schema) => return Ok(schema),
        Err(e) if e.is_not_found() => {
            tracing::debug!("No '{}', reading schema from a partition file", common);
        }
        Err(e) => return Err(e),
    }

    let first = records.first().ok_or_else(|| FormatError::PartitionInfo {
        path: base.to_string(),
        reason: "catalog has neither _common_metadata nor partitions to take a schema from"
            .to_string(),
    })?;
    read_parquet_schema(operator, &pixel_catalog_file(base, first.pixel)).await
}
