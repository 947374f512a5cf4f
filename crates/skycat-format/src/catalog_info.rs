//! Catalog descriptors and `catalog_info.json`.

use std::fmt;

use opendal::Operator;
use serde::{Deserialize, Serialize};

use crate::error::{FormatError, Result};
use crate::paths::{join_path, CATALOG_INFO_FILENAME};
use crate::storage;

pub const DEFAULT_EPOCH: &str = "J2000";
pub const DEFAULT_RA_COLUMN: &str = "ra";
pub const DEFAULT_DEC_COLUMN: &str = "dec";

/// Kind of catalog stored in a directory
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CatalogType {
    Object,
    Source,
    Margin,
    Association,
    Index,
}

impl CatalogType {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Object => "object",
            Self::Source => "source",
            Self::Margin => "margin",
            Self::Association => "association",
            Self::Index => "index",
        }
    }
}

impl fmt::Display for CatalogType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// The `catalog_info.json` record
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CatalogInfo {
    pub catalog_name: String,
    pub catalog_type: CatalogType,
    pub total_rows: u64,
    #[serde(default = "default_epoch")]
    pub epoch: String,
    #[serde(default = "default_ra_column")]
    pub ra_column: String,
    #[serde(default = "default_dec_column")]
    pub dec_column: String,
}

fn default_epoch() -> String {
    DEFAULT_EPOCH.to_string()
}

fn default_ra_column() -> String {
    DEFAULT_RA_COLUMN.to_string()
}

fn default_dec_column() -> String {
    DEFAULT_DEC_COLUMN.to_string()
}

impl CatalogInfo {
    /// Start a fresh descriptor with the default epoch and coordinate columns.
    pub fn builder(catalog_name: impl Into<String>, catalog_type: CatalogType) -> CatalogInfoBuilder {
        CatalogInfoBuilder {
            info: CatalogInfo {
                catalog_name: catalog_name.into(),
                catalog_type,
                total_rows: 0,
                epoch: default_epoch(),
                ra_column: default_ra_column(),
                dec_column: default_dec_column(),
            },
        }
    }

    /// Start a builder from a copy of this descriptor. `self` is left untouched.
    pub fn to_builder(&self) -> CatalogInfoBuilder {
        CatalogInfoBuilder { info: self.clone() }
    }
}

/// Builds a `CatalogInfo` by applying named overrides to a starting value.
#[derive(Debug, Clone)]
#[must_use]
pub struct CatalogInfoBuilder {
    info: CatalogInfo,
}

impl CatalogInfoBuilder {
    pub fn catalog_name(mut self, name: impl Into<String>) -> Self {
        self.info.catalog_name = name.into();
        self
    }

    pub fn catalog_type(mut self, catalog_type: CatalogType) -> Self {
        self.info.catalog_type = catalog_type;
        self
    }

    pub fn total_rows(mut self, total_rows: u64) -> Self {
        self.info.total_rows = total_rows;
        self
    }

    pub fn epoch(mut self, epoch: impl Into<String>) -> Self {
        self.info.epoch = epoch.into();
        self
    }

    pub fn ra_column(mut self, column: impl Into<String>) -> Self {
        self.info.ra_column = column.into();
        self
    }

    pub fn dec_column(mut self, column: impl Into<String>) -> Self {
        self.info.dec_column = column.into();
        self
    }

    pub fn build(self) -> CatalogInfo {
        self.info
    }
}

/// Write `catalog_info.json` under `base`.
pub async fn write_catalog_info(op: &Operator, base: &str, info: &CatalogInfo) -> Result<()> {
    let path = join_path(base, CATALOG_INFO_FILENAME);
    let json = serde_json::to_vec_pretty(info).map_err(|e| FormatError::json(&path, e))?;
    storage::write_bytes(op, &path, json).await?;

    tracing::debug!("Wrote catalog info for '{}' to '{}'", info.catalog_name, path);
    Ok(())
}

/// Read `catalog_info.json` from `base`.
pub async fn read_catalog_info(op: &Operator, base: &str) -> Result<CatalogInfo> {
    let path = join_path(base, CATALOG_INFO_FILENAME);
    let bytes = storage::read_bytes(op, &path).await?;
    serde_json::from_slice(&bytes).map_err(|e| FormatError::json(&path, e))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_builder_does_not_touch_original() {
        let original = CatalogInfo::builder("small_sky", CatalogType::Object)
            .total_rows(131)
            .build();

        let renamed = original
            .to_builder()
            .catalog_name("renamed")
            .total_rows(12)
            .build();

        assert_eq!(original.catalog_name, "small_sky");
        assert_eq!(original.total_rows, 131);
        assert_eq!(renamed.catalog_name, "renamed");
        assert_eq!(renamed.total_rows, 12);
        assert_eq!(renamed.ra_column, original.ra_column);
        assert_eq!(renamed.catalog_type, original.catalog_type);
    }

    #[test]
    fn test_json_shape() {
        let info = CatalogInfo::builder("small_sky", CatalogType::Source)
            .total_rows(17)
            .ra_column("source_ra")
            .build();
        let value = serde_json::to_value(&info).unwrap();

        assert_eq!(value["catalog_name"], "small_sky");
        assert_eq!(value["catalog_type"], "source");
        assert_eq!(value["total_rows"], 17);
        assert_eq!(value["epoch"], "J2000");
        assert_eq!(value["ra_column"], "source_ra");
        assert_eq!(value["dec_column"], "dec");
    }

    #[test]
    fn test_missing_optional_fields_use_defaults() {
        let info: CatalogInfo = serde_json::from_str(
            r#"{"catalog_name": "legacy", "catalog_type": "object", "total_rows": 3}"#,
        )
        .unwrap();
        assert_eq!(info.epoch, DEFAULT_EPOCH);
        assert_eq!(info.dec_column, DEFAULT_DEC_COLUMN);
    }

    #[tokio::test]
    async fn test_catalog_info_round_trip_through_storage() {
        let op = Operator::new(opendal::services::Memory::default())
            .unwrap()
            .finish();
        let info = CatalogInfo::builder("small_sky", CatalogType::Object)
            .total_rows(131)
            .build();

        write_catalog_info(&op, "small_sky", &info).await.unwrap();
        assert_eq!(read_catalog_info(&op, "small_sky").await.unwrap(), info);
    }

    #[tokio::test]
    async fn test_invalid_json_reports_path() {
        let op = Operator::new(opendal::services::Memory::default())
            .unwrap()
            .finish();
        op.write("broken/catalog_info.json", b"{not json".to_vec())
            .await
            .unwrap();

        let err = read_catalog_info(&op, "broken").await.unwrap_err();
        assert!(err.to_string().contains("broken/catalog_info.json"));
    }
}
