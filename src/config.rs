//! Configuration file handling.
//!
//! The configuration is an optional JSON file. Every key has a default, so a
//! missing file or a partial file both produce a usable configuration. The
//! log and backup directories are created on load.

use crate::error::{CleanerError, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

/// Default config file name, resolved against the working directory
pub const DEFAULT_CONFIG_FILE: &str = "config.json";

/// Application configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct AppConfig {
    /// Path to the adb executable
    pub adb_path: String,
    /// Package manifest path
    pub packages_file: PathBuf,
    /// Directory for the session log
    pub log_dir: PathBuf,
    /// Directory for selection backups
    pub backup_dir: PathBuf,
    /// Android user profile targeted by `pm uninstall --user`
    pub user_id: String,
    /// Display theme name
    pub theme: String,
    /// Pre-select SAFE packages after the manifest is loaded
    pub auto_select_safe: bool,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            adb_path: "adb".to_string(),
            packages_file: PathBuf::from("packs.txt"),
            log_dir: PathBuf::from("logs"),
            backup_dir: PathBuf::from("backups"),
            user_id: "0".to_string(),
            theme: "default".to_string(),
            auto_select_safe: false,
        }
    }
}

impl AppConfig {
    /// Load configuration from `path`, falling back to defaults when the
    /// file does not exist, then create the log and backup directories.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let config = if path.exists() {
            let content =
                fs::read_to_string(path).map_err(|e| CleanerError::io("read", path, e))?;
            let config: Self = serde_json::from_str(&content).map_err(|e| {
                CleanerError::parse(format!("invalid config {}: {}", path.display(), e))
            })?;
            info!("Loaded configuration from {}", path.display());
            config
        } else {
            debug!("No config at {}, using defaults", path.display());
            Self::default()
        };

        config.ensure_dirs()?;
        Ok(config)
    }

    /// Save configuration as pretty JSON to `path`
    pub fn save<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let path = path.as_ref();
        let json = serde_json::to_string_pretty(self)
            .map_err(|e| CleanerError::parse(format!("failed to serialize config: {}", e)))?;
        fs::write(path, json).map_err(|e| CleanerError::io("write", path, e))?;
        info!("Saved configuration to {}", path.display());
        Ok(())
    }

    /// Create the log and backup directories if absent
    pub fn ensure_dirs(&self) -> Result<()> {
        for dir in [&self.log_dir, &self.backup_dir] {
            fs::create_dir_all(dir).map_err(|e| CleanerError::io("create directory", dir, e))?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn config_in(dir: &TempDir) -> AppConfig {
        AppConfig {
            log_dir: dir.path().join("logs"),
            backup_dir: dir.path().join("backups"),
            ..AppConfig::default()
        }
    }

    #[test]
    fn test_defaults() {
        let config = AppConfig::default();
        assert_eq!(config.adb_path, "adb");
        assert_eq!(config.packages_file, PathBuf::from("packs.txt"));
        assert_eq!(config.user_id, "0");
        assert_eq!(config.theme, "default");
        assert!(!config.auto_select_safe);
    }

    #[test]
    fn test_partial_json_keeps_defaults() {
        let config: AppConfig =
            serde_json::from_str(r#"{"adbPath": "/opt/sdk/adb", "autoSelectSafe": true}"#)
                .expect("partial config should parse");
        assert_eq!(config.adb_path, "/opt/sdk/adb");
        assert!(config.auto_select_safe);
        assert_eq!(config.user_id, "0");
        assert_eq!(config.backup_dir, PathBuf::from("backups"));
    }

    #[test]
    fn test_missing_file_yields_defaults_and_creates_dirs() {
        let dir = TempDir::new().expect("tempdir");
        let path = dir.path().join("config.json");
        config_in(&dir).save(&path).expect("save");

        let loaded = AppConfig::load(&path).expect("load");
        assert!(loaded.log_dir.is_dir());
        assert!(loaded.backup_dir.is_dir());

        fs::remove_file(&path).expect("remove");
        let fallback = AppConfig::load(&path).expect("load without file");
        assert_eq!(fallback.adb_path, "adb");
    }

    #[test]
    fn test_save_load_round_trip() {
        let dir = TempDir::new().expect("tempdir");
        let path = dir.path().join("config.json");
        let mut config = config_in(&dir);
        config.user_id = "10".to_string();
        config.theme = "mono".to_string();

        config.save(&path).expect("save");
        let loaded = AppConfig::load(&path).expect("load");
        assert_eq!(loaded, config);
    }

    #[test]
    fn test_malformed_json_is_parse_error() {
        let dir = TempDir::new().expect("tempdir");
        let path = dir.path().join("config.json");
        fs::write(&path, "{ not json").expect("write");

        let err = AppConfig::load(&path).expect_err("should fail");
        assert!(matches!(err, CleanerError::Parse(_)));
    }

    #[test]
    fn test_serialized_keys_are_camel_case() {
        let json = serde_json::to_string(&AppConfig::default()).expect("serialize");
        for key in [
            "adbPath",
            "packagesFile",
            "logDir",
            "backupDir",
            "userId",
            "theme",
            "autoSelectSafe",
        ] {
            assert!(json.contains(key), "missing key {}", key);
        }
    }
}
