//! # Config Module
//!
//! User settings: where the repository lives and where its catalog is.
//!
//! Stored as JSON at `<config dir>/photostat/config.json`, e.g.
//! `~/.config/photostat/config.json` on Linux.

use crate::error::ConfigError;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::debug;

const APP_DIR: &str = "photostat";
const CONFIG_FILE: &str = "config.json";

/// Persisted user settings
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Settings {
    /// Root of the photo repository
    pub repository_path: PathBuf,
    /// Catalog database; defaults to `<repository>/.photostat/catalog.db`
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub catalog_path: Option<PathBuf>,
}

impl Default for Settings {
    fn default() -> Self {
        let home = dirs::home_dir().unwrap_or_else(|| PathBuf::from("."));
        Self {
            repository_path: home.join("Photos"),
            catalog_path: None,
        }
    }
}

impl Settings {
    pub fn new(repository_path: impl Into<PathBuf>) -> Self {
        Self {
            repository_path: repository_path.into(),
            catalog_path: None,
        }
    }

    /// Default location of the settings file
    pub fn default_path() -> Result<PathBuf, ConfigError> {
        dirs::config_dir()
            .map(|dir| dir.join(APP_DIR).join(CONFIG_FILE))
            .ok_or(ConfigError::NoConfigDir)
    }

    /// Catalog database path, explicit or derived from the repository
    pub fn catalog_path(&self) -> PathBuf {
        self.catalog_path
            .clone()
            .unwrap_or_else(|| Self::catalog_path_for(&self.repository_path))
    }

    /// Default catalog location inside a repository
    pub fn catalog_path_for(repository: &Path) -> PathBuf {
        repository.join(".photostat").join("catalog.db")
    }

    /// Load settings from `path`, or `None` if the file does not exist
    pub fn load(path: &Path) -> Result<Option<Self>, ConfigError> {
        let contents = match fs::read_to_string(path) {
            Ok(contents) => contents,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
            Err(e) => {
                return Err(ConfigError::Read {
                    path: path.to_path_buf(),
                    reason: e.to_string(),
                })
            }
        };

        let settings = serde_json::from_str(&contents).map_err(|e| ConfigError::Read {
            path: path.to_path_buf(),
            reason: e.to_string(),
        })?;

        debug!(path = %path.display(), "loaded settings");
        Ok(Some(settings))
    }

    /// Write settings to `path`, creating parent directories
    pub fn save(&self, path: &Path) -> Result<(), ConfigError> {
        let write_error = |reason: String| ConfigError::Write {
            path: path.to_path_buf(),
            reason,
        };

        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).map_err(|e| write_error(e.to_string()))?;
        }

        let json = serde_json::to_string_pretty(self).map_err(|e| write_error(e.to_string()))?;
        fs::write(path, json).map_err(|e| write_error(e.to_string()))?;

        debug!(path = %path.display(), "saved settings");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn missing_file_loads_as_none() {
        let temp_dir = TempDir::new().unwrap();
        let loaded = Settings::load(&temp_dir.path().join("config.json")).unwrap();
        assert!(loaded.is_none());
    }

    #[test]
    fn settings_round_trip_through_file() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("nested").join("config.json");
        let settings = Settings::new("/srv/photos");

        settings.save(&path).unwrap();

        assert_eq!(Settings::load(&path).unwrap(), Some(settings));
    }

    #[test]
    fn catalog_defaults_to_repository() {
        let settings = Settings::new("/srv/photos");
        assert_eq!(
            settings.catalog_path(),
            PathBuf::from("/srv/photos/.photostat/catalog.db")
        );

        let explicit = Settings {
            catalog_path: Some(PathBuf::from("/var/lib/catalog.db")),
            ..settings
        };
        assert_eq!(explicit.catalog_path(), PathBuf::from("/var/lib/catalog.db"));
    }

    #[test]
    fn default_repository_is_photos_in_home() {
        let settings = Settings::default();
        assert!(settings.repository_path.ends_with("Photos"));
    }

    #[test]
    fn corrupt_file_is_a_read_error() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("config.json");
        fs::write(&path, "{ not json").unwrap();

        assert!(matches!(Settings::load(&path), Err(ConfigError::Read { .. })));
    }
}
