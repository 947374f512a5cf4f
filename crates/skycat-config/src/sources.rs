// Configuration source loading.
//
// Priority order:
// 1. Environment variables (SKYCAT_* prefix)
// 2. Config file path from SKYCAT_CONFIG
// 3. Inline config content from SKYCAT_CONFIG_CONTENT
// 4. Default config files (./skycat.toml, ./.skycat.toml)
// 5. Built-in defaults

use crate::env_overrides::{self, EnvSource, ENV_PREFIX};
use crate::RuntimeConfig;
use anyhow::{Context, Result};
use std::env;
use std::path::Path;

const DEFAULT_CONFIG_FILES: [&str; 2] = ["skycat.toml", ".skycat.toml"];

/// Load configuration using native environment/file access.
pub fn load_config() -> Result<RuntimeConfig> {
    load_or_default()
}

/// Find and parse the config file named by `env`, or the first default file
/// present in `dir`. `Ok(None)` only when no file applies.
fn load_from_file<E: EnvSource>(env: &E, dir: &Path) -> Result<Option<RuntimeConfig>> {
    if let Some(path) = env.get("CONFIG") {
        return parse_file(Path::new(&path)).map(Some);
    }

    if let Some(content) = env.get("CONFIG_CONTENT") {
        let config: RuntimeConfig = toml::from_str(&content)
            .context("Failed to parse inline config from SKYCAT_CONFIG_CONTENT")?;
        return Ok(Some(config));
    }

    for name in DEFAULT_CONFIG_FILES {
        let path = dir.join(name);
        if path.exists() {
            return parse_file(&path).map(Some);
        }
    }

    Ok(None)
}

fn parse_file(path: &Path) -> Result<RuntimeConfig> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read config file: {}", path.display()))?;
    toml::from_str(&content)
        .with_context(|| format!("Failed to parse config file: {}", path.display()))
}

/// Load configuration from a specific file path (for CLI --config flag).
/// Returns error if file doesn't exist or can't be parsed.
pub fn load_from_file_path(path: impl AsRef<Path>) -> Result<RuntimeConfig> {
    let file_config = parse_file(path.as_ref())?;

    let mut config = RuntimeConfig::default();
    config.merge(file_config);

    env_overrides::apply_env_overrides(&mut config, &StdEnvSource)?;
    config.validate()?;
    Ok(config)
}

/// Load configuration, falling back to defaults when no config file exists.
/// A config file that exists but cannot be read or parsed is an error.
pub fn load_or_default() -> Result<RuntimeConfig> {
    load_or_default_with(&StdEnvSource, Path::new("."))
}

/// `load_or_default` with an explicit environment and default-file directory.
pub fn load_or_default_with<E: EnvSource>(env: &E, dir: &Path) -> Result<RuntimeConfig> {
    let mut config = RuntimeConfig::default();

    if let Some(file_config) = load_from_file(env, dir)? {
        config.merge(file_config);
    }

    env_overrides::apply_env_overrides(&mut config, env)?;
    config.validate()?;
    Ok(config)
}

struct StdEnvSource;

impl EnvSource for StdEnvSource {
    fn get(&self, key: &str) -> Option<String> {
        env::var(format!("{}{}", ENV_PREFIX, key)).ok()
    }

    fn get_raw(&self, key: &str) -> Option<String> {
        env::var(key).ok()
    }
}
