//! Configuration file loading and saving.

use crate::config::{Config, config_file_path, validate_config};
use crate::error::{Error, Result};
use std::path::{Path, PathBuf};
use tracing::debug;

/// Load configuration from a TOML file.
///
/// Returns the default configuration if the file does not exist. Missing
/// keys take their default values.
pub fn load_config_file(path: &Path) -> Result<Config> {
    if !path.exists() {
        debug!("No config file at {}, using defaults", path.display());
        return Ok(Config::default());
    }

    let contents = std::fs::read_to_string(path).map_err(|source| Error::ConfigRead {
        path: path.to_path_buf(),
        source,
    })?;
    let config: Config = toml::from_str(&contents).map_err(|source| Error::ConfigParse {
        path: path.to_path_buf(),
        source,
    })?;

    validate_config(&config)?;
    debug!("Loaded config from {}", path.display());
    Ok(config)
}

/// Load configuration from `explicit` or the platform-specific path.
///
/// An explicit path must exist. Without a platform config directory the
/// defaults are used.
pub fn load_default_config(explicit: Option<&Path>) -> Result<Config> {
    if let Some(path) = explicit {
        if !path.exists() {
            return Err(Error::ConfigRead {
                path: path.to_path_buf(),
                source: std::io::Error::from(std::io::ErrorKind::NotFound),
            });
        }
        return load_config_file(path);
    }
    config_file_path().map_or_else(|_| Ok(Config::default()), |path| load_config_file(&path))
}

/// Save configuration to a TOML file, creating parent directories.
pub fn save_config(config: &Config, path: &Path) -> Result<()> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent).map_err(|source| Error::ConfigWrite {
            path: path.to_path_buf(),
            source,
        })?;
    }

    let contents = toml::to_string_pretty(config).map_err(|source| Error::ConfigSerialize { source })?;

    std::fs::write(path, contents).map_err(|source| Error::ConfigWrite {
        path: path.to_path_buf(),
        source,
    })
}

/// Write a default configuration to the platform-specific path.
///
/// An existing file is kept unless `force` is set. Returns the path and
/// whether a file was written.
pub fn save_default_config(force: bool) -> Result<(PathBuf, bool)> {
    let path = config_file_path()?;
    if path.exists() && !force {
        return Ok((path, false));
    }
    save_config(&Config::default(), &path)?;
    Ok((path, true))
}
