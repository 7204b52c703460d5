//! Surveyor configuration.
//!
//! Loaded from `~/.surveyor/config.toml`. Every key is optional and a
//! missing file means defaults.

use std::path::{Path, PathBuf};
use std::{fs, io};

use serde::Deserialize;

/// Surveyor configuration.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "kebab-case", deny_unknown_fields)]
pub struct Config {
    /// Employee to act as when neither `--as` nor `SURVEYOR_EMPLOYEE` is set.
    pub default_employee: Option<String>,

    /// Where project databases live. Defaults to `~/.surveyor/projects/`.
    pub storage_root: Option<PathBuf>,
}

impl Config {
    /// Load config from `~/.surveyor/config.toml`.
    /// Returns defaults if the file or home directory is missing.
    pub fn load() -> Result<Self, String> {
        match Self::path() {
            Some(path) => Self::load_from(&path),
            None => Ok(Self::default()),
        }
    }

    /// Load config from a specific file. A missing file yields defaults.
    pub fn load_from(path: &Path) -> Result<Self, String> {
        let contents = match fs::read_to_string(path) {
            Ok(s) => s,
            Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(Self::default()),
            Err(e) => return Err(format!("failed to read {}: {e}", path.display())),
        };

        toml::from_str(&contents).map_err(|e| format!("invalid config at {}: {e}", path.display()))
    }

    /// The config file path: `~/.surveyor/config.toml`.
    pub fn path() -> Option<PathBuf> {
        dirs::home_dir().map(|h| h.join(".surveyor").join("config.toml"))
    }
}
