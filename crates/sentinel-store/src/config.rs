//! Store backend selection

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Which backend persists weekly state
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StoreBackend {
    /// SQLite database file
    #[default]
    Sqlite,
    /// Directory of JSON files, one per week
    File,
}

/// State store configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StoreConfig {
    /// Backend to use
    #[serde(default)]
    pub backend: StoreBackend,

    /// Database file (sqlite) or directory (file)
    #[serde(default = "default_path")]
    pub path: PathBuf,
}

fn default_path() -> PathBuf {
    PathBuf::from("sentinel-state.db")
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            backend: StoreBackend::default(),
            path: default_path(),
        }
    }
}

impl StoreConfig {
    /// Validate the configuration
    pub fn validate(&self) -> Result<(), String> {
        if self.path.as_os_str().is_empty() {
            return Err("store path must not be empty".to_string());
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_is_sqlite() {
        let config = StoreConfig::default();
        assert_eq!(config.backend, StoreBackend::Sqlite);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_parse_file_backend() {
        let config: StoreConfig = toml::from_str("backend = \"file\"\npath = \"/var/lib/sentinel\"").unwrap();
        assert_eq!(config.backend, StoreBackend::File);
        assert_eq!(config.path, PathBuf::from("/var/lib/sentinel"));
    }

    #[test]
    fn test_empty_path_invalid() {
        let config = StoreConfig { path: PathBuf::new(), ..StoreConfig::default() };
        assert!(config.validate().is_err());
    }
}
