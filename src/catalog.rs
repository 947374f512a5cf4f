//! In-memory partitioned catalogs.
//!
//! A `Catalog` maps every HEALPix tile to exactly one lazily materialized
//! partition. Nothing is read or computed until `Partition::compute` runs.

use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;

use arrow::array::RecordBatch;
use arrow::datatypes::SchemaRef;
use async_trait::async_trait;
use skycat_format::opendal::Operator;
use skycat_format::{read_parquet_file, CatalogInfo, FormatError, HealpixPixel};

/// Tabular data for one tile, produced on demand.
#[async_trait]
pub trait Partition: Send + Sync + fmt::Debug {
    /// Materialize the partition. Blocks the caller until the data exists.
    async fn compute(&self) -> skycat_format::Result<RecordBatch>;
}

/// A partition whose rows are already in memory
#[derive(Debug, Clone)]
pub struct InMemoryPartition {
    batch: RecordBatch,
}

impl InMemoryPartition {
    pub fn new(batch: RecordBatch) -> Self {
        Self { batch }
    }
}

#[async_trait]
impl Partition for InMemoryPartition {
    async fn compute(&self) -> skycat_format::Result<RecordBatch> {
        Ok(self.batch.clone())
    }
}

/// A partition backed by a Parquet file, read when computed
#[derive(Clone)]
pub struct StoredPartition {
    operator: Operator,
    path: String,
}

impl StoredPartition {
    pub fn new(operator: Operator, path: impl Into<String>) -> Self {
        Self {
            operator,
            path: path.into(),
        }
    }

    pub fn path(&self) -> &str {
        &self.path
    }
}

impl fmt::Debug for StoredPartition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("StoredPartition")
            .field("path", &self.path)
            .finish()
    }
}

#[async_trait]
impl Partition for StoredPartition {
    async fn compute(&self) -> skycat_format::Result<RecordBatch> {
        tracing::debug!("Reading partition from '{}'", self.path);
        read_parquet_file(&self.operator, &self.path).await
    }
}

/// Descriptor of a catalog: its info record plus where it lives.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CatalogStructure {
    pub catalog_info: CatalogInfo,
    pub catalog_path: Option<String>,
    pub on_disk: bool,
}

impl CatalogStructure {
    /// Descriptor for a catalog that exists only in memory.
    pub fn in_memory(catalog_info: CatalogInfo) -> Self {
        Self {
            catalog_info,
            catalog_path: None,
            on_disk: false,
        }
    }

    pub fn catalog_name(&self) -> &str {
        &self.catalog_info.catalog_name
    }

    /// New descriptor for a copy written to `catalog_path` under `catalog_name`.
    ///
    /// Only the name, path, on-disk flag and row count change; `self` is not
    /// modified and shares nothing mutable with the result.
    pub fn with_overrides(&self, catalog_name: &str, catalog_path: &str, total_rows: u64) -> Self {
        Self {
            catalog_info: self
                .catalog_info
                .to_builder()
                .catalog_name(catalog_name)
                .total_rows(total_rows)
                .build(),
            catalog_path: Some(catalog_path.to_string()),
            on_disk: true,
        }
    }
}

/// A catalog split into disjoint, tile-addressed partitions.
#[derive(Debug, Clone)]
pub struct Catalog {
    structure: CatalogStructure,
    schema: SchemaRef,
    partitions: BTreeMap<HealpixPixel, Arc<dyn Partition>>,
}

impl Catalog {
    pub fn new(structure: CatalogStructure, schema: SchemaRef) -> Self {
        Self {
            structure,
            schema,
            partitions: BTreeMap::new(),
        }
    }

    /// Register the partition for `pixel`. Each tile may be registered once.
    pub fn add_partition(
        &mut self,
        pixel: HealpixPixel,
        partition: Arc<dyn Partition>,
    ) -> skycat_format::Result<()> {
        if self.partitions.contains_key(&pixel) {
            return Err(FormatError::DuplicatePartition(pixel));
        }
        self.partitions.insert(pixel, partition);
        Ok(())
    }

    /// Builder-style `add_partition` for in-memory batches.
    pub fn with_batch(
        mut self,
        pixel: HealpixPixel,
        batch: RecordBatch,
    ) -> skycat_format::Result<Self> {
        self.add_partition(pixel, Arc::new(InMemoryPartition::new(batch)))?;
        Ok(self)
    }

    pub fn structure(&self) -> &CatalogStructure {
        &self.structure
    }

    pub fn catalog_info(&self) -> &CatalogInfo {
        &self.structure.catalog_info
    }

    pub fn schema(&self) -> &SchemaRef {
        &self.schema
    }

    /// Tiles in ascending `(order, pixel)` order.
    pub fn pixels(&self) -> impl Iterator<Item = &HealpixPixel> {
        self.partitions.keys()
    }

    /// Tile/partition pairs in ascending `(order, pixel)` order.
    pub fn partitions(&self) -> impl Iterator<Item = (&HealpixPixel, &Arc<dyn Partition>)> {
        self.partitions.iter()
    }

    pub fn partition(&self, pixel: &HealpixPixel) -> Option<&Arc<dyn Partition>> {
        self.partitions.get(pixel)
    }

    pub fn num_partitions(&self) -> usize {
        self.partitions.len()
    }
}
