// src/config/loader.rs

use std::fs;
use std::path::{Path, PathBuf};

use tracing::info;

use crate::config::model::{Config, RawConfig};
use crate::errors::Result;

/// Load a configuration file from a given path and return the raw `RawConfig`.
///
/// This only performs TOML deserialization; it does **not** validate the
/// event list, pattern or durations. Use [`load_and_validate`] for that.
pub fn load_from_path(path: impl AsRef<Path>) -> Result<RawConfig> {
    let path = path.as_ref();
    let contents = fs::read_to_string(path)?;

    let config: RawConfig = toml::from_str(&contents)?;

    Ok(config)
}

/// Load a configuration file from path and validate it.
pub fn load_and_validate(path: impl AsRef<Path>) -> Result<Config> {
    let raw_config = load_from_path(&path)?;
    let config = Config::try_from(raw_config)?;
    Ok(config)
}

/// Persist a raw configuration as TOML, replacing any existing file.
pub fn write_to_path(path: impl AsRef<Path>, config: &RawConfig) -> Result<()> {
    let path = path.as_ref();
    let contents = toml::to_string_pretty(config)?;

    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            fs::create_dir_all(parent)?;
        }
    }
    fs::write(path, contents)?;

    info!(path = ?path, "wrote configuration");
    Ok(())
}

/// Config file used by `--write-config` when no `--config` path is given.
pub fn default_config_path() -> PathBuf {
    PathBuf::from(".watchf.toml")
}
