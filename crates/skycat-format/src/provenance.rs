//! `provenance_info.json`: who wrote a catalog, with which arguments.

use std::collections::BTreeMap;

use opendal::Operator;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::catalog_info::CatalogInfo;
use crate::error::{FormatError, Result};
use crate::paths::{join_path, PROVENANCE_INFO_FILENAME};
use crate::storage;

/// Tool identity and the arguments it ran with
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ToolArgs {
    pub tool_name: String,
    pub version: String,
    pub runtime_args: BTreeMap<String, Value>,
}

/// Full provenance document as written to disk
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProvenanceInfo {
    #[serde(flatten)]
    pub catalog_info: CatalogInfo,
    /// Version of the format writer
    pub version: String,
    /// UTC date formatted `%Y.%m.%d`
    pub generation_date: String,
    pub tool_args: ToolArgs,
}

/// Write `provenance_info.json` under `base`, stamped with today's UTC date.
pub async fn write_provenance_info(
    op: &Operator,
    base: &str,
    info: &CatalogInfo,
    tool_args: &ToolArgs,
) -> Result<()> {
    let provenance = ProvenanceInfo {
        catalog_info: info.clone(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        generation_date: chrono::Utc::now().format("%Y.%m.%d").to_string(),
        tool_args: tool_args.clone(),
    };

    let path = join_path(base, PROVENANCE_INFO_FILENAME);
    let json = serde_json::to_vec_pretty(&provenance).map_err(|e| FormatError::json(&path, e))?;
    storage::write_bytes(op, &path, json).await?;

    tracing::debug!(
        "Wrote provenance for '{}' ({} {}) to '{}'",
        info.catalog_name,
        tool_args.tool_name,
        tool_args.version,
        path
    );
    Ok(())
}

/// Read `provenance_info.json` from `base`.
pub async fn read_provenance_info(op: &Operator, base: &str) -> Result<ProvenanceInfo> {
    let path = join_path(base, PROVENANCE_INFO_FILENAME);
    let bytes = storage::read_bytes(op, &path).await?;
    serde_json::from_slice(&bytes).map_err(|e| FormatError::json(&path, e))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog_info::CatalogType;

    #[tokio::test]
    async fn test_provenance_document() {
        let op = Operator::new(opendal::services::Memory::default())
            .unwrap()
            .finish();
        let info = CatalogInfo::builder("small_sky", CatalogType::Object)
            .total_rows(131)
            .build();
        let tool_args = ToolArgs {
            tool_name: "skycat".to_string(),
            version: "9.9.9".to_string(),
            runtime_args: BTreeMap::from([("catalog_name".to_string(), Value::from("small_sky"))]),
        };

        write_provenance_info(&op, "small_sky", &info, &tool_args)
            .await
            .unwrap();

        let raw = op
            .read("small_sky/provenance_info.json")
            .await
            .unwrap()
            .to_bytes();
        let value: Value = serde_json::from_slice(&raw).unwrap();
        assert_eq!(value["catalog_name"], "small_sky");
        assert_eq!(value["total_rows"], 131);
        assert_eq!(value["version"], env!("CARGO_PKG_VERSION"));
        assert_eq!(value["tool_args"]["tool_name"], "skycat");
        assert_eq!(value["tool_args"]["runtime_args"]["catalog_name"], "small_sky");
        assert_eq!(value["generation_date"].as_str().unwrap().len(), 10);

        let parsed = read_provenance_info(&op, "small_sky").await.unwrap();
        assert_eq!(parsed.catalog_info, info);
        assert_eq!(parsed.tool_args, tool_args);
    }
}
