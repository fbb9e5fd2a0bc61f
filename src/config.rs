// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Configuration for pod-store.
//!
//! Read from `~/.config/pod-store/config.toml` when present. Missing fields
//! fall back to defaults; the `POD_STORE_*` environment variables override
//! file values.

use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::Deserialize;

use crate::error::ConfigError;
use crate::http::DEFAULT_TIMEOUT;

pub const ENV_STORE_PATH: &str = "POD_STORE_PATH";
pub const ENV_STORE_FILE_NAME: &str = "POD_STORE_FILE_NAME";
pub const ENV_DOWNLOADS_PATH: &str = "POD_STORE_PODCAST_DOWNLOADS_PATH";

const DEFAULT_STORE_FILE_NAME: &str = "pod-store.json";

/// Main configuration struct.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Directory holding the store file (and the git repository)
    pub store_path: PathBuf,
    pub store_file_name: String,
    /// Where episode audio files are downloaded to
    pub downloads_path: PathBuf,
    pub request_timeout_secs: u64,
}

impl Default for Config {
    fn default() -> Self {
        let home = dirs::home_dir().unwrap_or_else(|| PathBuf::from("."));
        Self {
            store_path: home.join(".pod-store"),
            store_file_name: DEFAULT_STORE_FILE_NAME.to_string(),
            downloads_path: home.join("Podcasts"),
            request_timeout_secs: DEFAULT_TIMEOUT.as_secs(),
        }
    }
}

impl Config {
    /// Load configuration from `path`, or from the default location
    ///
    /// A missing file yields the defaults. Environment overrides are applied
    /// on top.
    pub fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        let path = match path {
            Some(p) => p.to_path_buf(),
            None => Self::default_config_path()?,
        };

        let mut config = if path.exists() {
            let content = std::fs::read_to_string(&path).map_err(|e| ConfigError::Io {
                path: path.clone(),
                source: e,
            })?;
            toml::from_str(&content).map_err(|e| ConfigError::Parse { path, source: e })?
        } else {
            Config::default()
        };

        config.apply_overrides(|key| std::env::var(key).ok());
        Ok(config)
    }

    /// Get the default config file path: `~/.config/pod-store/config.toml`
    pub fn default_config_path() -> Result<PathBuf, ConfigError> {
        let config_dir = dirs::config_dir().ok_or(ConfigError::NoHomeDir)?;
        Ok(config_dir.join("pod-store").join("config.toml"))
    }

    /// Apply `POD_STORE_*` overrides resolved through `lookup`
    pub fn apply_overrides(&mut self, lookup: impl Fn(&str) -> Option<String>) {
        if let Some(path) = lookup(ENV_STORE_PATH).filter(|v| !v.is_empty()) {
            self.store_path = PathBuf::from(path);
        }
        if let Some(name) = lookup(ENV_STORE_FILE_NAME).filter(|v| !v.is_empty()) {
            self.store_file_name = name;
        }
        if let Some(path) = lookup(ENV_DOWNLOADS_PATH).filter(|v| !v.is_empty()) {
            self.downloads_path = PathBuf::from(path);
        }
    }

    pub fn store(&self) -> StoreConfig {
        StoreConfig {
            root: self.store_path.clone(),
            file_name: self.store_file_name.clone(),
        }
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }
}

/// Location of a store on disk
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoreConfig {
    pub root: PathBuf,
    pub file_name: String,
}

impl StoreConfig {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self {
            root: root.into(),
            file_name: DEFAULT_STORE_FILE_NAME.to_string(),
        }
    }

    pub fn file_path(&self) -> PathBuf {
        self.root.join(&self.file_name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn missing_file_yields_defaults() {
        let dir = tempdir().unwrap();
        let config = Config::load(Some(&dir.path().join("absent.toml"))).unwrap();

        assert_eq!(config.request_timeout_secs, 30);
    }

    #[test]
    fn partial_file_keeps_remaining_defaults() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(&path, "store_path = \"/srv/pods\"\nrequest_timeout_secs = 5\n").unwrap();

        let config: Config = toml::from_str(&std::fs::read_to_string(&path).unwrap()).unwrap();
        assert_eq!(config.store_path, PathBuf::from("/srv/pods"));
        assert_eq!(config.request_timeout(), Duration::from_secs(5));
        assert_eq!(config.store_file_name, "pod-store.json");
    }

    #[test]
    fn malformed_file_is_an_error() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(&path, "store_path = [").unwrap();

        assert!(matches!(
            Config::load(Some(&path)),
            Err(ConfigError::Parse { .. })
        ));
    }

    #[test]
    fn environment_overrides_file_values() {
        let mut config = Config::default();
        config.apply_overrides(|key| match key {
            ENV_STORE_PATH => Some("/tmp/store".to_string()),
            ENV_STORE_FILE_NAME => Some("custom.json".to_string()),
            _ => None,
        });

        assert_eq!(config.store().file_path(), PathBuf::from("/tmp/store/custom.json"));
        assert_eq!(config.downloads_path, Config::default().downloads_path);
    }
}
