// Configuration validation
//
// Validates that required fields are present and values are sensible

use super::*;
use anyhow::{bail, Result};
use tracing::warn;

pub fn validate_config(config: &RuntimeConfig) -> Result<()> {
    validate_export_config(&config.export)?;
    validate_storage_config(&config.storage)?;
    validate_log_config(&config.log)?;
    Ok(())
}

fn validate_export_config(config: &ExportConfig) -> Result<()> {
    if config.row_group_size == 0 {
        bail!("export.row_group_size must be greater than 0");
    }

    if config.row_group_size > 10_000_000 {
        warn!(
            row_group_size = config.row_group_size,
            "export.row_group_size is very large; may cause memory issues"
        );
    }

    Ok(())
}

fn validate_storage_config(config: &StorageConfig) -> Result<()> {
    match config.backend {
        StorageBackend::Fs => {
            let fs = config
                .fs
                .as_ref()
                .ok_or_else(|| anyhow::anyhow!("fs storage backend requires 'fs' configuration"))?;

            if fs.path.is_empty() {
                bail!(
                    "Filesystem path is required\n\n\
                    How to fix:\n\
                      • Environment: export {}STORAGE_PATH=/data/catalogs\n\
                      • TOML: [storage.fs]\n              path = \"/data/catalogs\"\n",
                    ENV_PREFIX
                );
            }
        }
        StorageBackend::S3 => {
            let s3 = config
                .s3
                .as_ref()
                .ok_or_else(|| anyhow::anyhow!("s3 storage backend requires 's3' configuration"))?;

            if s3.bucket.is_empty() {
                bail!(
                    "S3 bucket name is required\n\n\
                    How to fix:\n\
                      • Environment: export {}S3_BUCKET=my-bucket\n\
                      • TOML: [storage.s3]\n              bucket = \"my-bucket\"\n",
                    ENV_PREFIX
                );
            }

            if s3.region.is_empty() {
                bail!(
                    "S3 region is required\n\n\
                    How to fix:\n\
                      • Environment: export {}S3_REGION=us-west-2\n\
                      • TOML: [storage.s3]\n              region = \"us-west-2\"\n",
                    ENV_PREFIX
                );
            }

            if s3.access_key_id.is_some() != s3.secret_access_key.is_some() {
                bail!("S3 access_key_id and secret_access_key must be set together");
            }
        }
        StorageBackend::Memory => {}
    }

    Ok(())
}

fn validate_log_config(config: &LogConfig) -> Result<()> {
    if config.level.trim().is_empty() {
        bail!("log.level must not be empty");
    }
    Ok(())
}
