//! Partition index: which tiles a catalog holds and how many rows each has.
//!
//! On disk this is `partition_info.csv` with the header
//! `Norder,Dir,Npix,num_rows`, one line per tile.

use std::collections::BTreeMap;
use std::sync::Arc;

use arrow::array::{ArrayRef, AsArray, RecordBatch, UInt64Array, UInt8Array};
use arrow::csv::{ReaderBuilder, WriterBuilder};
use arrow::datatypes::{DataType, Field, Schema, UInt64Type, UInt8Type};
use opendal::Operator;

use crate::error::{FormatError, Result};
use crate::paths::{join_path, PARTITION_INFO_FILENAME};
use crate::pixel::HealpixPixel;
use crate::storage;

pub const ORDER_COLUMN: &str = "Norder";
pub const DIR_COLUMN: &str = "Dir";
pub const PIXEL_COLUMN: &str = "Npix";
pub const NUM_ROWS_COLUMN: &str = "num_rows";

/// Row count of one tile plus the destination pixels its rows were written to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PartitionInfoEntry {
    pub num_rows: u64,
    pub destination_pixels: Vec<u64>,
}

/// Tile key to entry, ordered by tile.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PartitionInfo {
    entries: BTreeMap<HealpixPixel, PartitionInfoEntry>,
}

impl PartitionInfo {
    /// One-to-one mapping: every tile's only destination is its own pixel.
    pub fn from_row_counts(row_counts: &BTreeMap<HealpixPixel, u64>) -> Self {
        let entries = row_counts
            .iter()
            .map(|(pixel, num_rows)| {
                (
                    *pixel,
                    PartitionInfoEntry {
                        num_rows: *num_rows,
                        destination_pixels: vec![pixel.pixel],
                    },
                )
            })
            .collect();
        Self { entries }
    }

    pub fn get(&self, pixel: &HealpixPixel) -> Option<&PartitionInfoEntry> {
        self.entries.get(pixel)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&HealpixPixel, &PartitionInfoEntry)> {
        self.entries.iter()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Sum of row counts over every tile.
    pub fn total_rows(&self) -> u64 {
        self.entries.values().map(|entry| entry.num_rows).sum()
    }
}

/// One line of `partition_info.csv`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PartitionRecord {
    pub pixel: HealpixPixel,
    pub num_rows: Option<u64>,
}

fn csv_schema(with_rows: bool) -> Arc<Schema> {
    let mut fields = vec![
        Field::new(ORDER_COLUMN, DataType::UInt8, false),
        Field::new(DIR_COLUMN, DataType::UInt64, false),
        Field::new(PIXEL_COLUMN, DataType::UInt64, false),
    ];
    if with_rows {
        fields.push(Field::new(NUM_ROWS_COLUMN, DataType::UInt64, false));
    }
    Arc::new(Schema::new(fields))
}

/// Write `partition_info.csv` under `base`.
pub async fn write_partition_info(op: &Operator, base: &str, info: &PartitionInfo) -> Result<()> {
    let path = join_path(base, PARTITION_INFO_FILENAME);

    let orders = UInt8Array::from_iter_values(info.iter().map(|(pixel, _)| pixel.order));
    let dirs = UInt64Array::from_iter_values(info.iter().map(|(pixel, _)| pixel.dir()));
    let pixels = UInt64Array::from_iter_values(info.iter().map(|(pixel, _)| pixel.pixel));
    let rows = UInt64Array::from_iter_values(info.iter().map(|(_, entry)| entry.num_rows));

    let batch = RecordBatch::try_new(
        csv_schema(true),
        vec![
            Arc::new(orders) as ArrayRef,
            Arc::new(dirs) as ArrayRef,
            Arc::new(pixels) as ArrayRef,
            Arc::new(rows) as ArrayRef,
        ],
    )?;

    let mut writer = WriterBuilder::new().with_header(true).build(Vec::new());
    writer.write(&batch)?;
    storage::write_bytes(op, &path, writer.into_inner()).await?;

    tracing::debug!("Wrote partition info for {} tiles to '{}'", info.len(), path);
    Ok(())
}

/// Read `partition_info.csv` from `base`.
///
/// Files written without the `num_rows` column are accepted; their records
/// carry `num_rows: None`.
pub async fn read_partition_info(op: &Operator, base: &str) -> Result<Vec<PartitionRecord>> {
    let path = join_path(base, PARTITION_INFO_FILENAME);
    let bytes = storage::read_bytes(op, &path).await?;

    let malformed = |reason: String| FormatError::PartitionInfo {
        path: path.clone(),
        reason,
    };

    let text = std::str::from_utf8(&bytes).map_err(|e| malformed(e.to_string()))?;
    let header: Vec<&str> = text
        .lines()
        .next()
        .unwrap_or_default()
        .split(',')
        .map(str::trim)
        .collect();
    let with_rows = match header.as_slice() {
        [ORDER_COLUMN, DIR_COLUMN, PIXEL_COLUMN, NUM_ROWS_COLUMN] => true,
        [ORDER_COLUMN, DIR_COLUMN, PIXEL_COLUMN] => false,
        _ => {
            return Err(malformed(format!(
                "expected header '{},{},{},{}', found '{}'",
                ORDER_COLUMN,
                DIR_COLUMN,
                PIXEL_COLUMN,
                NUM_ROWS_COLUMN,
                header.join(",")
            )))
        }
    };

    let reader = ReaderBuilder::new(csv_schema(with_rows))
        .with_header(true)
        .build(bytes.as_ref())?;

    let mut records = Vec::new();
    for batch in reader {
        let batch = batch?;
        let orders = batch.column(0).as_primitive::<UInt8Type>();
        let dirs = batch.column(1).as_primitive::<UInt64Type>();
        let pixels = batch.column(2).as_primitive::<UInt64Type>();
        let rows = with_rows.then(|| batch.column(3).as_primitive::<UInt64Type>());

        for i in 0..batch.num_rows() {
            let pixel = HealpixPixel::new(orders.value(i), pixels.value(i));
            if !pixel.is_valid() {
                return Err(malformed(format!("{} is outside the sphere", pixel)));
            }
            if pixel.dir() != dirs.value(i) {
                return Err(malformed(format!(
                    "{} listed under Dir={}, expected Dir={}",
                    pixel,
                    dirs.value(i),
                    pixel.dir()
                )));
            }
            records.push(PartitionRecord {
                pixel,
                num_rows: rows.map(|rows| rows.value(i)),
            });
        }
    }

    Ok(records)
}
