// Logging/tracing setup

use skycat_config::{LogConfig, LogFormat, RuntimeConfig, StorageBackend};
use tracing::info;

/// Initialize tracing/logging from `LogConfig`.
///
/// Safe to call more than once; later calls leave the first subscriber in place.
pub fn init_tracing(config: &LogConfig) {
    use tracing_subscriber::{fmt, prelude::*, EnvFilter};

    let env_filter = EnvFilter::try_new(&config.level).unwrap_or_else(|_| EnvFilter::new("info"));

    let registry = tracing_subscriber::registry().with(env_filter);

    // Ignore the error if a global subscriber is already set
    let _ = match config.format {
        LogFormat::Json => {
            tracing::subscriber::set_global_default(registry.with(fmt::layer().json()))
        }
        LogFormat::Text => tracing::subscriber::set_global_default(registry.with(fmt::layer())),
    };
}

/// Log where catalogs will be read from and written to.
pub fn log_storage(config: &RuntimeConfig) {
    match config.storage.backend {
        StorageBackend::Fs => {
            if let Some(fs) = config.storage.fs.as_ref() {
                info!("Using filesystem storage at: {}", fs.path);
            } else {
                info!("Using filesystem storage");
            }
        }
        StorageBackend::S3 => {
            if let Some(s3) = config.storage.s3.as_ref() {
                info!(
                    "Using S3 storage: bucket={}, region={}",
                    s3.bucket, s3.region
                );
            } else {
                info!("Using S3 storage");
            }
        }
        StorageBackend::Memory => info!("Using in-memory storage"),
    }
}
