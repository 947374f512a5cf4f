use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use skycat::config::{RuntimeConfig, StorageBackend};
use skycat::format::build_operator;
use skycat::{read_hipscat, Exporter};
use std::path::PathBuf;

/// Export partitioned sky catalogs in HiPSCat layout
#[derive(Parser)]
#[command(name = "skycat")]
#[command(version)]
#[command(about = "Export partitioned sky catalogs in HiPSCat layout", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Path to configuration file
    #[arg(short, long, value_name = "FILE", global = true)]
    config: Option<PathBuf>,

    /// Storage root directory (filesystem backend only)
    #[arg(short, long, value_name = "DIR", global = true)]
    root: Option<PathBuf>,

    /// Log level: trace, debug, info, warn, error
    #[arg(short = 'v', long, value_name = "LEVEL", global = true)]
    log_level: Option<String>,
}

#[derive(Subcommand)]
enum Commands {
    /// Copy a catalog to a new location, optionally renaming it
    Export {
        /// Catalog to read, relative to the storage root
        source: String,
        /// Directory to write, relative to the storage root
        destination: String,
        /// Name recorded in the exported catalog's metadata
        #[arg(short, long)]
        name: Option<String>,
    },
    /// Print a catalog's descriptor and partition count
    Info {
        /// Catalog directory, relative to the storage root
        path: String,
    },
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()
        .context("Failed to build tokio runtime")?
        .block_on(async_main(cli))
}

async fn async_main(cli: Cli) -> Result<()> {
    let mut config = if let Some(config_path) = &cli.config {
        RuntimeConfig::load_from_path(config_path)
            .with_context(|| format!("Failed to load config from {}", config_path.display()))?
    } else {
        RuntimeConfig::load_or_default().context("Failed to load configuration")?
    };

    apply_cli_overrides(&mut config, &cli)?;
    config.validate().context("Invalid configuration")?;

    skycat::init_tracing(&config.log);
    skycat::log_storage(&config);

    let operator = build_operator(&config.storage).context("Failed to initialize storage")?;

    match cli.command {
        Commands::Export {
            source,
            destination,
            name,
        } => {
            let catalog = read_hipscat(&operator, &source)
                .await
                .with_context(|| format!("Failed to load catalog from '{}'", source))?;

            Exporter::new(operator, env!("CARGO_PKG_VERSION"))
                .with_row_group_size(config.export.row_group_size)
                .export(&catalog, &destination, name.as_deref())
                .await
                .with_context(|| format!("Failed to export catalog to '{}'", destination))?;

            println!("Exported '{}' to '{}'", source, destination);
        }
        Commands::Info { path } => {
            let catalog = read_hipscat(&operator, &path)
                .await
                .with_context(|| format!("Failed to load catalog from '{}'", path))?;

            let info = catalog.catalog_info();
            println!(
                "{}",
                serde_json::to_string_pretty(info).context("Failed to render catalog info")?
            );
            println!("partitions: {}", catalog.num_partitions());
        }
    }

    Ok(())
}

fn apply_cli_overrides(config: &mut RuntimeConfig, cli: &Cli) -> Result<()> {
    // Override storage root (only valid for fs backend)
    if let Some(root) = &cli.root {
        if config.storage.backend != StorageBackend::Fs {
            anyhow::bail!(
                "--root flag only works with filesystem backend, but backend is '{}'.\n\
                Either remove --root flag or set backend to 'fs' in config file.",
                config.storage.backend
            );
        }

        let fs_config = config.storage.fs.get_or_insert_with(Default::default);
        fs_config.path = root.to_string_lossy().to_string();
    }

    if let Some(level) = &cli.log_level {
        config.log.level = level.clone();
    }

    Ok(())
}
