//! Artifact names and path helpers for catalog directories

use crate::error::{FormatError, Result};

pub const PARQUET_METADATA_FILENAME: &str = "_metadata";
pub const PARQUET_COMMON_METADATA_FILENAME: &str = "_common_metadata";
pub const PARTITION_INFO_FILENAME: &str = "partition_info.csv";
pub const CATALOG_INFO_FILENAME: &str = "catalog_info.json";
pub const PROVENANCE_INFO_FILENAME: &str = "provenance_info.json";

/// Join a relative path onto a catalog base path with exactly one separator.
pub fn join_path(base: &str, rel: &str) -> String {
    let base = base.trim_end_matches('/');
    let rel = rel.trim_start_matches('/');
    if base.is_empty() {
        rel.to_string()
    } else {
        format!("{}/{}", base, rel)
    }
}

/// Normalize a user-supplied catalog location into an operator-relative path.
///
/// Leading `./` and surrounding slashes are stripped; the result must not be
/// empty (the operator root itself is never a catalog directory).
pub fn normalize_catalog_path(path: &str) -> Result<String> {
    let trimmed = path.trim();
    let trimmed = trimmed.strip_prefix("./").unwrap_or(trimmed);
    let trimmed = trimmed.trim_matches('/');

    if trimmed.is_empty() || trimmed == "." {
        return Err(FormatError::InvalidPath {
            path: path.to_string(),
            reason: "catalog path must name a directory below the storage root".to_string(),
        });
    }

    if trimmed.split('/').any(|segment| segment == "..") {
        return Err(FormatError::InvalidPath {
            path: path.to_string(),
            reason: "'..' segments are not allowed".to_string(),
        });
    }

    Ok(trimmed.to_string())
}

/// Path of `path` relative to `base`, if it lives below it.
pub fn relative_to<'a>(base: &str, path: &'a str) -> Option<&'a str> {
    let base = base.trim_end_matches('/');
    path.strip_prefix(base)
        .and_then(|rest| rest.strip_prefix('/'))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_join_path() {
        assert_eq!(join_path("a/b", "c"), "a/b/c");
        assert_eq!(join_path("a/b/", "/c"), "a/b/c");
        assert_eq!(join_path("", "c"), "c");
    }

    #[test]
    fn test_normalize_catalog_path() {
        assert_eq!(normalize_catalog_path("./out/sky/").unwrap(), "out/sky");
        assert_eq!(normalize_catalog_path("/out").unwrap(), "out");
        assert!(normalize_catalog_path("").is_err());
        assert!(normalize_catalog_path("/").is_err());
        assert!(normalize_catalog_path("./").is_err());
        assert!(normalize_catalog_path("out/../../etc").is_err());
    }

    #[test]
    fn test_relative_to() {
        assert_eq!(
            relative_to("out/sky", "out/sky/Norder=0/Dir=0/Npix=11.parquet"),
            Some("Norder=0/Dir=0/Npix=11.parquet")
        );
        assert_eq!(relative_to("out/sky", "out/skyline/x"), None);
    }
}
