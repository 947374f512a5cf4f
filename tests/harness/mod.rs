//! Shared fixtures for the integration tests
//!
//! Reference catalogs, built in memory with deterministic values:
//! - `small_sky`: one order-0 tile (pixel 11), 131 rows
//! - `small_sky_order1`: order-1 tiles 44..=47 with 42, 29, 29, 31 rows
//! - `small_sky_no_metadata`: `small_sky` on storage without `_metadata`
//!   and `_common_metadata`

#![allow(dead_code)]

use std::path::Path;
use std::sync::Arc;

use arrow::array::{Float64Array, Int64Array, RecordBatch};
use arrow::datatypes::{DataType, Field, Schema, SchemaRef};
use skycat::format::opendal::{services, Operator};
use skycat::format::{CatalogInfo, CatalogType, HealpixPixel};
use skycat::{Catalog, CatalogStructure, Exporter};

pub const SMALL_SKY_ROWS: usize = 131;
pub const SMALL_SKY_ORDER1_ROWS: [(u64, usize); 4] = [(44, 42), (45, 29), (46, 29), (47, 31)];

pub const TEST_VERSION: &str = "0.0.0-test";

/// In-memory storage, isolated per call
pub fn memory_operator() -> Operator {
    Operator::new(services::Memory::default())
        .expect("Failed to create memory operator")
        .finish()
}

/// Filesystem storage rooted at `root`
pub fn fs_operator(root: &Path) -> Operator {
    let builder = services::Fs::default().root(&root.to_string_lossy());
    Operator::new(builder)
        .expect("Failed to create fs operator")
        .finish()
}

pub fn exporter(op: &Operator) -> Exporter {
    Exporter::new(op.clone(), TEST_VERSION)
}

pub fn sky_schema() -> SchemaRef {
    Arc::new(Schema::new(vec![
        Field::new("id", DataType::Int64, false),
        Field::new("ra", DataType::Float64, false),
        Field::new("dec", DataType::Float64, false),
        Field::new("ra_error", DataType::Int64, false),
        Field::new("dec_error", DataType::Int64, false),
    ]))
}

/// `rows` objects with ids starting at `first_id`
pub fn sky_batch(first_id: i64, rows: usize) -> RecordBatch {
    let ids: Vec<i64> = (first_id..first_id + rows as i64).collect();
    let ra = ids.iter().map(|id| 280.0 + (id % 400) as f64 * 0.05);
    let dec = ids.iter().map(|id| -40.0 + (id % 200) as f64 * 0.05);
    let errors = ids.iter().map(|id| id % 100);

    RecordBatch::try_new(
        sky_schema(),
        vec![
            Arc::new(Int64Array::from(ids.clone())),
            Arc::new(Float64Array::from_iter_values(ra)),
            Arc::new(Float64Array::from_iter_values(dec)),
            Arc::new(Int64Array::from_iter_values(errors.clone())),
            Arc::new(Int64Array::from_iter_values(errors)),
        ],
    )
    .expect("Failed to build sky batch")
}

pub fn structure(name: &str, total_rows: u64) -> CatalogStructure {
    CatalogStructure::in_memory(
        CatalogInfo::builder(name, CatalogType::Object)
            .total_rows(total_rows)
            .ra_column("ra")
            .dec_column("dec")
            .build(),
    )
}

/// Catalog with one in-memory partition per `(pixel, rows)` at `order`
pub fn catalog_with(name: &str, order: u8, tiles: &[(u64, usize)]) -> Catalog {
    let total: usize = tiles.iter().map(|(_, rows)| rows).sum();
    let mut catalog = Catalog::new(structure(name, total as u64), sky_schema());

    let mut next_id = 700;
    for &(pixel, rows) in tiles {
        catalog = catalog
            .with_batch(HealpixPixel::new(order, pixel), sky_batch(next_id, rows))
            .expect("Duplicate tile in fixture");
        next_id += rows as i64;
    }
    catalog
}

pub fn small_sky() -> Catalog {
    catalog_with("small_sky", 0, &[(11, SMALL_SKY_ROWS)])
}

pub fn small_sky_order1() -> Catalog {
    catalog_with("small_sky_order1", 1, &SMALL_SKY_ORDER1_ROWS)
}

/// Write `small_sky` to `path` and remove its consolidated Parquet metadata.
pub async fn small_sky_no_metadata(op: &Operator, path: &str) {
    exporter(op)
        .export(&small_sky(), path, Some("small_sky_no_metadata"))
        .await
        .expect("Failed to write small_sky");

    op.delete(&format!("{}/_metadata", path))
        .await
        .expect("Failed to delete _metadata");
    op.delete(&format!("{}/_common_metadata", path))
        .await
        .expect("Failed to delete _common_metadata");
}

/// Read a whole file from storage
pub async fn read_bytes(op: &Operator, path: &str) -> bytes::Bytes {
    op.read(path)
        .await
        .unwrap_or_else(|e| panic!("Failed to read {}: {}", path, e))
        .to_bytes()
}

pub async fn read_json(op: &Operator, path: &str) -> serde_json::Value {
    serde_json::from_slice(&read_bytes(op, path).await)
        .unwrap_or_else(|e| panic!("Invalid JSON in {}: {}", path, e))
}
