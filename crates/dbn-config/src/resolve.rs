//! Configuration resolution and path discovery.
//!
//! Resolution order: explicit path → environment variables → XDG paths → defaults.

use std::path::{Path, PathBuf};

use crate::learn::LearnConfig;
use crate::validate::ValidationResult;

/// Where a configuration file was found.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum ConfigSource {
    /// Explicitly provided by the caller.
    Explicit,

    /// Set via environment variable.
    Environment,

    /// Found in XDG config directory.
    XdgConfig,

    /// Using built-in defaults.
    #[default]
    BuiltinDefault,
}

impl std::fmt::Display for ConfigSource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ConfigSource::Explicit => write!(f, "explicit path"),
            ConfigSource::Environment => write!(f, "environment variable"),
            ConfigSource::XdgConfig => write!(f, "XDG config"),
            ConfigSource::BuiltinDefault => write!(f, "builtin default"),
        }
    }
}

/// A resolved configuration file path.
#[derive(Debug, Clone, Default)]
pub struct ConfigPath {
    /// Path to the learn config (or None if not found).
    pub path: Option<PathBuf>,

    /// Where it came from (for diagnostics).
    pub source: ConfigSource,
}

/// Environment variable names.
pub const ENV_CONFIG_PATH: &str = "DBN_CONFIG";
pub const ENV_CONFIG_DIR: &str = "DBN_CONFIG_DIR";

/// Standard config file name.
const CONFIG_FILENAME: &str = "learn.toml";

/// Application name for XDG directories.
const APP_NAME: &str = "dbn";

/// Resolve the learn configuration path.
///
/// Resolution order:
/// 1. Explicit path (if provided and present)
/// 2. `DBN_CONFIG` environment variable
/// 3. `DBN_CONFIG_DIR` environment variable + `learn.toml`
/// 4. XDG config directory (`~/.config/dbn/learn.toml`)
/// 5. Built-in defaults (None)
pub fn resolve_config(explicit: Option<&Path>) -> ConfigPath {
    if let Some(path) = explicit {
        if path.exists() {
            return ConfigPath {
                path: Some(path.to_path_buf()),
                source: ConfigSource::Explicit,
            };
        }
    }

    if let Ok(env_path) = std::env::var(ENV_CONFIG_PATH) {
        let path = PathBuf::from(env_path);
        if path.exists() {
            return ConfigPath {
                path: Some(path),
                source: ConfigSource::Environment,
            };
        }
    }

    if let Ok(config_dir) = std::env::var(ENV_CONFIG_DIR) {
        let path = PathBuf::from(config_dir).join(CONFIG_FILENAME);
        if path.exists() {
            return ConfigPath {
                path: Some(path),
                source: ConfigSource::Environment,
            };
        }
    }

    if let Some(dir) = xdg_config_dir() {
        let path = dir.join(CONFIG_FILENAME);
        if path.exists() {
            return ConfigPath {
                path: Some(path),
                source: ConfigSource::XdgConfig,
            };
        }
    }

    ConfigPath::default()
}

/// Resolve, load and validate the learn configuration.
pub fn load_learn_config(explicit: Option<&Path>) -> ValidationResult<(LearnConfig, ConfigSource)> {
    let resolved = resolve_config(explicit);
    let config = match &resolved.path {
        Some(path) => LearnConfig::from_file(path)?,
        None => LearnConfig::default(),
    };
    config.validate()?;
    Ok((config, resolved.source))
}

/// Get the XDG config directory for dbn.
pub fn xdg_config_dir() -> Option<PathBuf> {
    dirs::config_dir().map(|d| d.join(APP_NAME))
}
