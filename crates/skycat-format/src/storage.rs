//! Storage operator construction and thin I/O helpers.
//!
//! Every catalog artifact goes through one OpenDAL operator. The operator is
//! built once from `StorageConfig` and cloned (cheaply) into each caller, so
//! credentials stay fixed for the lifetime of an export.

use bytes::Bytes;
use opendal::{ErrorKind, Operator};
use skycat_config::{StorageBackend, StorageConfig};

use crate::error::{FormatError, Result};

/// Build an OpenDAL operator for the configured backend.
pub fn build_operator(config: &StorageConfig) -> Result<Operator> {
    let operator = match config.backend {
        StorageBackend::Fs => {
            let fs = config.fs.as_ref().ok_or_else(|| {
                FormatError::InvalidConfig("fs config required for filesystem backend".to_string())
            })?;

            let fs_builder = opendal::services::Fs::default().root(&fs.path);
            Operator::new(fs_builder)
                .map_err(|e| {
                    FormatError::InvalidConfig(format!(
                        "Failed to create filesystem operator: {}",
                        e
                    ))
                })?
                .finish()
        }
        StorageBackend::S3 => {
            let s3 = config.s3.as_ref().ok_or_else(|| {
                FormatError::InvalidConfig("s3 config required for S3 backend".to_string())
            })?;

            let mut s3_builder = opendal::services::S3::default()
                .bucket(&s3.bucket)
                .region(&s3.region);

            if let Some(endpoint) = &s3.endpoint {
                s3_builder = s3_builder.endpoint(endpoint);
            }
            if let Some(prefix) = &s3.prefix {
                s3_builder = s3_builder.root(prefix);
            }
            if let Some(key) = &s3.access_key_id {
                s3_builder = s3_builder.access_key_id(key);
            }
            if let Some(secret) = &s3.secret_access_key {
                s3_builder = s3_builder.secret_access_key(secret);
            }

            Operator::new(s3_builder)
                .map_err(|e| {
                    FormatError::InvalidConfig(format!("Failed to create S3 operator: {}", e))
                })?
                .finish()
        }
        StorageBackend::Memory => Operator::new(opendal::services::Memory::default())
            .map_err(|e| {
                FormatError::InvalidConfig(format!("Failed to create memory operator: {}", e))
            })?
            .finish(),
    };

    tracing::debug!("Storage operator initialized for backend {}", config.backend);
    Ok(operator)
}

/// Create `path` as a directory, failing if a non-directory already occupies it.
pub async fn make_directory(op: &Operator, path: &str) -> Result<()> {
    let path = path.trim_end_matches('/');

    match op.stat(path).await {
        Ok(meta) if meta.is_file() => {
            return Err(FormatError::NotADirectory {
                path: path.to_string(),
            });
        }
        Ok(_) => {}
        Err(e) if e.kind() == ErrorKind::NotFound => {}
        Err(e) => return Err(FormatError::storage(path, e)),
    }

    let dir = format!("{}/", path);
    op.create_dir(&dir)
        .await
        .map_err(|e| FormatError::storage(path, e))?;

    tracing::debug!("Ensured catalog directory: {}", dir);
    Ok(())
}

pub(crate) async fn read_bytes(op: &Operator, path: &str) -> Result<Bytes> {
    let buffer = op
        .read(path)
        .await
        .map_err(|e| FormatError::storage(path, e))?;
    Ok(buffer.to_bytes())
}

pub(crate) async fn write_bytes(op: &Operator, path: &str, bytes: Vec<u8>) -> Result<usize> {
    let len = bytes.len();
    op.write(path, bytes)
        .await
        .map_err(|e| FormatError::storage(path, e))?;
    Ok(len)
}

/// True if an object exists at `path`.
pub async fn exists(op: &Operator, path: &str) -> Result<bool> {
    match op.stat(path).await {
        Ok(_) => Ok(true),
        Err(e) if e.kind() == ErrorKind::NotFound => Ok(false),
        Err(e) => Err(FormatError::storage(path, e)),
    }
}
