//! Consolidated Parquet metadata for a catalog directory.
//!
//! `_metadata` is a footer-only Parquet file that holds the row groups of
//! every partition file, with each column chunk's `file_path` pointing at the
//! partition file relative to the catalog root. `_common_metadata` carries
//! the same schema and key-value metadata with no row groups.

use std::sync::Arc;

use arrow::datatypes::{Schema, SchemaRef};
use bytes::Bytes;
use opendal::Operator;
use parquet::arrow::parquet_to_arrow_schema;
use parquet::file::metadata::{
    FileMetaData, ParquetMetaData, ParquetMetaDataWriter, RowGroupMetaData,
};
use parquet::file::reader::{FileReader, SerializedFileReader};

use crate::encoding::{encode_empty, EncodingOptions};
use crate::error::{FormatError, Result};
use crate::paths::{
    join_path, relative_to, PARQUET_COMMON_METADATA_FILENAME, PARQUET_METADATA_FILENAME,
};
use crate::storage;

const PARQUET_MAGIC: &[u8; 4] = b"PAR1";

/// Summary of a consolidation pass
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConsolidatedMetadata {
    pub data_files: usize,
    pub row_groups: usize,
    pub total_rows: i64,
}

/// Write `_metadata` and `_common_metadata` under `base` for `data_files`.
///
/// `data_files` are full operator paths below `base`, consolidated in the
/// order given. Nothing else in the directory is read, so files left over
/// from earlier writes never leak into the metadata. With no data files,
/// `schema` supplies the footer so both artifacts still describe the
/// catalog's columns.
pub async fn write_parquet_metadata(
    op: &Operator,
    base: &str,
    data_files: &[String],
    schema: &SchemaRef,
) -> Result<ConsolidatedMetadata> {
    let mut template: Option<(String, FileMetaData)> = None;
    let mut row_groups: Vec<RowGroupMetaData> = Vec::new();

    for path in data_files {
        let bytes = storage::read_bytes(op, path).await?;
        let metadata = read_footer(bytes)?;
        let rel = relative_to(base, path).unwrap_or(path.as_str()).to_string();

        match &template {
            Some((first_path, first)) => {
                if first.schema() != metadata.file_metadata().schema() {
                    return Err(FormatError::SchemaMismatch {
                        path: path.clone(),
                        expected_from: first_path.clone(),
                    });
                }
            }
            None => template = Some((path.clone(), metadata.file_metadata().clone())),
        }

        for row_group in metadata.row_groups() {
            let ordinal = i16::try_from(row_groups.len()).ok();
            row_groups.push(with_file_path(row_group, &rel, ordinal)?);
        }
    }

    let template = match template {
        Some((_, file_metadata)) => file_metadata,
        None => {
            let empty = encode_empty(schema.clone(), &EncodingOptions::default())?;
            read_footer(Bytes::from(empty))?.file_metadata().clone()
        }
    };

    let total_rows = row_groups.iter().map(RowGroupMetaData::num_rows).sum();
    let summary = ConsolidatedMetadata {
        data_files: data_files.len(),
        row_groups: row_groups.len(),
        total_rows,
    };

    let metadata = ParquetMetaData::new(footer_for(&template, total_rows), row_groups);
    let common = ParquetMetaData::new(footer_for(&template, 0), Vec::new());

    let metadata_path = join_path(base, PARQUET_METADATA_FILENAME);
    storage::write_bytes(op, &metadata_path, serialize_footer(&metadata)?).await?;

    let common_path = join_path(base, PARQUET_COMMON_METADATA_FILENAME);
    storage::write_bytes(op, &common_path, serialize_footer(&common)?).await?;

    tracing::debug!(
        "Consolidated {} row groups from {} files into '{}'",
        summary.row_groups,
        summary.data_files,
        metadata_path
    );
    Ok(summary)
}

/// Arrow schema stored in the footer of the Parquet (or footer-only) file at `path`.
pub async fn read_parquet_schema(op: &Operator, path: &str) -> Result<SchemaRef> {
    let bytes = storage::read_bytes(op, path).await?;
    let metadata = read_footer(bytes)?;
    let file_metadata = metadata.file_metadata();
    let schema: Schema = parquet_to_arrow_schema(
        file_metadata.schema_descr(),
        file_metadata.key_value_metadata(),
    )?;
    Ok(Arc::new(schema))
}

/// Read the full footer of a Parquet file held in memory.
pub fn read_footer(bytes: Bytes) -> Result<ParquetMetaData> {
    let reader = SerializedFileReader::new(bytes)?;
    Ok(reader.metadata().clone())
}

fn with_file_path(
    row_group: &RowGroupMetaData,
    rel: &str,
    ordinal: Option<i16>,
) -> Result<RowGroupMetaData> {
    let columns = row_group
        .columns()
        .iter()
        .map(|column| {
            column
                .clone()
                .into_builder()
                .set_file_path(rel.to_string())
                .build()
        })
        .collect::<std::result::Result<Vec<_>, _>>()?;

    let mut builder = RowGroupMetaData::builder(row_group.schema_descr_ptr())
        .set_num_rows(row_group.num_rows())
        .set_total_byte_size(row_group.total_byte_size())
        .set_column_metadata(columns);
    if let Some(ordinal) = ordinal {
        builder = builder.set_ordinal(ordinal);
    }
    Ok(builder.build()?)
}

fn footer_for(template: &FileMetaData, num_rows: i64) -> FileMetaData {
    FileMetaData::new(
        template.version(),
        num_rows,
        template.created_by().map(str::to_string),
        template.key_value_metadata().cloned(),
        template.schema_descr_ptr(),
        template.column_orders().cloned(),
    )
}

fn serialize_footer(metadata: &ParquetMetaData) -> Result<Vec<u8>> {
    let mut buffer = PARQUET_MAGIC.to_vec();
    ParquetMetaDataWriter::new(&mut buffer, metadata).finish()?;
    Ok(buffer)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::encoding::write_dataframe_to_parquet;
    use crate::pixel::{pixel_catalog_file, HealpixPixel};
    use arrow::array::{Int64Array, RecordBatch, StringArray};
    use arrow::datatypes::{DataType, Field};

    fn memory_operator() -> Operator {
        Operator::new(opendal::services::Memory::default())
            .unwrap()
            .finish()
    }

    fn batch(rows: i64) -> RecordBatch {
        let schema = Arc::new(Schema::new(vec![
            Field::new("id", DataType::Int64, false),
            Field::new("name", DataType::Utf8, false),
        ]));
        RecordBatch::try_new(
            schema,
            vec![
                Arc::new(Int64Array::from_iter_values(0..rows)),
                Arc::new(StringArray::from_iter_values(
                    (0..rows).map(|i| format!("star-{}", i)),
                )),
            ],
        )
        .unwrap()
    }

    #[tokio::test]
    async fn consolidates_every_partition_file() {
        let op = memory_operator();
        let options = EncodingOptions::default();
        let mut files = Vec::new();
        for (pixel, rows) in [(HealpixPixel::new(1, 44), 5), (HealpixPixel::new(1, 45), 7)] {
            let path = pixel_catalog_file("sky", pixel);
            write_dataframe_to_parquet(&op, &batch(rows), &path, &options)
                .await
                .unwrap();
            files.push(path);
        }

        let summary = write_parquet_metadata(&op, "sky", &files, &batch(0).schema())
            .await
            .unwrap();
        assert_eq!(summary.data_files, 2);
        assert_eq!(summary.total_rows, 12);

        let bytes = op.read("sky/_metadata").await.unwrap().to_bytes();
        assert!(bytes.starts_with(PARQUET_MAGIC));
        let metadata = read_footer(bytes).unwrap();
        assert_eq!(metadata.file_metadata().num_rows(), 12);
        let paths: Vec<_> = metadata
            .row_groups()
            .iter()
            .map(|rg| rg.column(0).file_path().unwrap().to_string())
            .collect();
        assert_eq!(
            paths,
            vec![
                "Norder=1/Dir=0/Npix=44.parquet",
                "Norder=1/Dir=0/Npix=45.parquet"
            ]
        );

        let common = op.read("sky/_common_metadata").await.unwrap().to_bytes();
        assert_eq!(read_footer(common).unwrap().num_row_groups(), 0);
    }

    #[tokio::test]
    async fn empty_catalog_uses_supplied_schema() {
        let op = memory_operator();
        op.create_dir("empty/").await.unwrap();
        let schema = batch(0).schema();

        let summary = write_parquet_metadata(&op, "empty", &[], &schema)
            .await
            .unwrap();
        assert_eq!(summary.data_files, 0);

        let read_back = read_parquet_schema(&op, "empty/_common_metadata")
            .await
            .unwrap();
        assert_eq!(read_back.fields(), schema.fields());
    }

    #[tokio::test]
    async fn mismatched_schemas_are_rejected() {
        let op = memory_operator();
        let options = EncodingOptions::default();
        let first = pixel_catalog_file("mixed", HealpixPixel::new(0, 1));
        write_dataframe_to_parquet(&op, &batch(3), &first, &options)
            .await
            .unwrap();

        let other_schema = Arc::new(Schema::new(vec![Field::new("x", DataType::Int64, false)]));
        let other = RecordBatch::try_new(
            other_schema,
            vec![Arc::new(Int64Array::from_iter_values(0..2))],
        )
        .unwrap();
        let second = pixel_catalog_file("mixed", HealpixPixel::new(0, 2));
        write_dataframe_to_parquet(&op, &other, &second, &options)
            .await
            .unwrap();

        let err = write_parquet_metadata(&op, "mixed", &[first, second], &batch(0).schema())
            .await
            .unwrap_err();
        assert!(matches!(err, FormatError::SchemaMismatch { .. }));
    }

    #[tokio::test]
    async fn unlisted_neighbours_are_ignored() {
        let op = memory_operator();
        let options = EncodingOptions::default();

        let listed = pixel_catalog_file("reused", HealpixPixel::new(1, 3));
        write_dataframe_to_parquet(&op, &batch(5), &listed, &options)
            .await
            .unwrap();

        // Leftover with another schema next to the listed file
        let other_schema = Arc::new(Schema::new(vec![Field::new("x", DataType::Int64, false)]));
        let other = RecordBatch::try_new(
            other_schema,
            vec![Arc::new(Int64Array::from_iter_values(0..9))],
        )
        .unwrap();
        let leftover = pixel_catalog_file("reused", HealpixPixel::new(1, 4));
        write_dataframe_to_parquet(&op, &other, &leftover, &options)
            .await
            .unwrap();

        let summary = write_parquet_metadata(&op, "reused", &[listed], &batch(0).schema())
            .await
            .unwrap();
        assert_eq!(summary.data_files, 1);
        assert_eq!(summary.total_rows, 5);

        let bytes = op.read("reused/_metadata").await.unwrap().to_bytes();
        assert_eq!(read_footer(bytes).unwrap().num_row_groups(), 1);
    }
}
