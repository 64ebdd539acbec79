//! Configuration management for sitedesk.
//!
//! This module provides configuration loading and validation using figment,
//! supporting TOML config files, environment variables, and defaults.

use std::path::PathBuf;
use std::time::Duration;

use figment::{
    providers::{Env, Format, Serialized, Toml},
    Figment,
};
use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

/// Default configuration file name.
const CONFIG_FILE_NAME: &str = "config.toml";

/// Default data directory name.
const DATA_DIR_NAME: &str = "sitedesk";

/// Default database file name.
const DATABASE_FILE_NAME: &str = "sitedesk.db";

/// Application configuration.
///
/// Configuration is loaded from (in order of precedence, highest first):
/// 1. Environment variables (prefixed with `SITEDESK_`)
/// 2. TOML config file at `~/.config/sitedesk/config.toml`
/// 3. Default values
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Storage configuration.
    pub storage: StorageConfig,
    /// Inbound message handling.
    pub ingest: IngestConfig,
    /// Management inbox polling.
    pub inbox: InboxConfig,
}

/// Storage-related configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct StorageConfig {
    /// Path to the database file.
    /// Defaults to `~/.local/share/sitedesk/sitedesk.db`
    pub database_path: Option<PathBuf>,
    /// Seed demo users and tickets into an empty database.
    pub seed_demo_data: bool,
}

/// Inbound message configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct IngestConfig {
    /// Number of characters of the message copied into the ticket title.
    pub title_preview_chars: usize,
    /// Appended to the sender when no account matches.
    pub unregistered_suffix: String,
}

/// Management inbox configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct InboxConfig {
    /// Address residents write to.
    pub address: String,
    /// Simulated delay of one inbox check in milliseconds.
    pub poll_delay_ms: u64,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            database_path: None, // Will be resolved to default at runtime
            seed_demo_data: true,
        }
    }
}

impl Default for IngestConfig {
    fn default() -> Self {
        Self {
            title_preview_chars: 30,
            unregistered_suffix: "(Kayıtsız)".to_string(),
        }
    }
}

impl Default for InboxConfig {
    fn default() -> Self {
        Self {
            address: "ugurhersek@gmail.com".to_string(),
            poll_delay_ms: 1500,
        }
    }
}

impl Config {
    /// Load configuration from all sources, reading the TOML file at
    /// `config_path` or at [`Config::default_config_path`].
    ///
    /// A missing file is not an error; defaults and environment still apply.
    ///
    /// # Errors
    ///
    /// Returns an error if configuration loading or parsing fails.
    pub fn load_from(config_path: Option<PathBuf>) -> Result<Self> {
        let config_file = config_path.unwrap_or_else(Self::default_config_path);

        let figment = Figment::new()
            .merge(Serialized::defaults(Config::default()))
            .merge(Toml::file(&config_file))
            .merge(Env::prefixed("SITEDESK_").split("__"));

        let config: Config = figment.extract()?;
        config.validate()?;
        Ok(config)
    }

    /// Get the default configuration file path.
    #[must_use]
    pub fn default_config_path() -> PathBuf {
        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from(".config"))
            .join(DATA_DIR_NAME)
            .join(CONFIG_FILE_NAME)
    }

    /// Get the default data directory path.
    #[must_use]
    pub fn default_data_dir() -> PathBuf {
        dirs::data_local_dir()
            .unwrap_or_else(|| PathBuf::from(".local/share"))
            .join(DATA_DIR_NAME)
    }

    /// Validate the configuration.
    ///
    /// # Errors
    ///
    /// Returns an error if any configuration values are invalid.
    pub fn validate(&self) -> Result<()> {
        if self.ingest.title_preview_chars == 0 {
            return Err(Error::ConfigValidation {
                message: "title_preview_chars must be greater than 0".to_string(),
            });
        }

        if self.ingest.unregistered_suffix.trim().is_empty() {
            return Err(Error::ConfigValidation {
                message: "unregistered_suffix must not be empty".to_string(),
            });
        }

        if !self.inbox.address.contains('@') {
            return Err(Error::ConfigValidation {
                message: format!("invalid inbox address: {}", self.inbox.address),
            });
        }

        Ok(())
    }

    /// Get the database path, resolving defaults if not set.
    #[must_use]
    pub fn database_path(&self) -> PathBuf {
        self.storage
            .database_path
            .clone()
            .unwrap_or_else(|| Self::default_data_dir().join(DATABASE_FILE_NAME))
    }

    /// Get the simulated inbox delay as a Duration.
    #[must_use]
    pub fn poll_delay(&self) -> Duration {
        Duration::from_millis(self.inbox.poll_delay_ms)
    }
}

#[cfg(test)]
mod tests {
    use figment::Jail;

    use super::*;

    #[test]
    fn test_default_config() {
        let config = Config::default();

        assert!(config.storage.seed_demo_data);
        assert!(config.storage.database_path.is_none());
        assert_eq!(config.ingest.title_preview_chars, 30);
        assert_eq!(config.ingest.unregistered_suffix, "(Kayıtsız)");
        assert_eq!(config.inbox.address, "ugurhersek@gmail.com");
        assert_eq!(config.inbox.poll_delay_ms, 1500);
    }

    #[test]
    fn test_validate_valid_config() {
        let config = Config::default();
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_validate_zero_title_preview() {
        let mut config = Config::default();
        config.ingest.title_preview_chars = 0;

        let err = config.validate().unwrap_err().to_string();
        assert!(err.contains("title_preview_chars"));
    }

    #[test]
    fn test_validate_blank_suffix() {
        let mut config = Config::default();
        config.ingest.unregistered_suffix = "  ".to_string();

        let err = config.validate().unwrap_err().to_string();
        assert!(err.contains("unregistered_suffix"));
    }

    #[test]
    fn test_validate_inbox_address() {
        let mut config = Config::default();
        config.inbox.address = "not-an-address".to_string();

        let err = config.validate().unwrap_err().to_string();
        assert!(err.contains("invalid inbox address"));
    }

    #[test]
    fn test_database_path_default() {
        let config = Config::default();
        let path = config.database_path();

        assert!(path.to_string_lossy().contains("sitedesk.db"));
    }

    #[test]
    fn test_database_path_custom() {
        let mut config = Config::default();
        config.storage.database_path = Some(PathBuf::from("/custom/path/db.sqlite"));

        assert_eq!(
            config.database_path(),
            PathBuf::from("/custom/path/db.sqlite")
        );
    }

    #[test]
    fn test_poll_delay() {
        let config = Config::default();
        assert_eq!(config.poll_delay(), Duration::from_millis(1500));
    }

    #[test]
    fn test_default_config_path() {
        let path = Config::default_config_path();
        assert!(path.to_string_lossy().contains("sitedesk"));
        assert!(path.to_string_lossy().contains("config.toml"));
    }

    #[test]
    fn test_default_data_dir() {
        let path = Config::default_data_dir();
        assert!(path.to_string_lossy().contains("sitedesk"));
    }

    #[test]
    fn test_load_nonexistent_config() {
        // Loading from a nonexistent path should work (uses defaults)
        Jail::expect_with(|_jail| {
            let config = Config::load_from(Some(PathBuf::from("/nonexistent/config.toml")))
                .map_err(|e| e.to_string())?;
            assert_eq!(config, Config::default());
            Ok(())
        });
    }

    #[test]
    fn test_load_from_toml_file() {
        Jail::expect_with(|jail| {
            jail.create_file(
                "config.toml",
                r#"
                [storage]
                database_path = "/srv/sitedesk/desk.db"
                seed_demo_data = false

                [ingest]
                title_preview_chars = 12

                [inbox]
                address = "yonetim@site.com"
                poll_delay_ms = 10
                "#,
            )?;

            let config = Config::load_from(Some(jail.directory().join("config.toml")))
                .map_err(|e| e.to_string())?;
            assert!(!config.storage.seed_demo_data);
            assert_eq!(
                config.database_path(),
                PathBuf::from("/srv/sitedesk/desk.db")
            );
            assert_eq!(config.ingest.title_preview_chars, 12);
            assert_eq!(config.ingest.unregistered_suffix, "(Kayıtsız)");
            assert_eq!(config.inbox.address, "yonetim@site.com");
            assert_eq!(config.poll_delay(), Duration::from_millis(10));
            Ok(())
        });
    }

    #[test]
    fn test_load_rejects_invalid_file() {
        Jail::expect_with(|jail| {
            jail.create_file("config.toml", "[ingest]\ntitle_preview_chars = 0\n")?;

            let result = Config::load_from(Some(jail.directory().join("config.toml")));
            assert!(matches!(result, Err(Error::ConfigValidation { .. })));
            Ok(())
        });
    }

    #[test]
    fn test_load_env_sets_database_path() {
        Jail::expect_with(|jail| {
            jail.set_env("SITEDESK_STORAGE__DATABASE_PATH", "/tmp/desk.db");

            let config = Config::load_from(Some(jail.directory().join("missing.toml")))
                .map_err(|e| e.to_string())?;
            assert_eq!(config.database_path(), PathBuf::from("/tmp/desk.db"));
            assert!(config.storage.seed_demo_data);
            Ok(())
        });
    }

    #[test]
    fn test_load_env_overrides_file() {
        Jail::expect_with(|jail| {
            jail.create_file(
                "config.toml",
                r#"
                [storage]
                seed_demo_data = true

                [ingest]
                title_preview_chars = 12
                "#,
            )?;
            jail.set_env("SITEDESK_INGEST__TITLE_PREVIEW_CHARS", "40");
            jail.set_env("SITEDESK_STORAGE__SEED_DEMO_DATA", "false");

            let config = Config::load_from(Some(jail.directory().join("config.toml")))
                .map_err(|e| e.to_string())?;
            assert_eq!(config.ingest.title_preview_chars, 40);
            assert!(!config.storage.seed_demo_data);
            Ok(())
        });
    }

    #[test]
    fn test_load_env_value_is_validated() {
        Jail::expect_with(|jail| {
            jail.set_env("SITEDESK_INBOX__ADDRESS", "yonetim");

            let result = Config::load_from(Some(jail.directory().join("missing.toml")));
            assert!(matches!(result, Err(Error::ConfigValidation { .. })));
            Ok(())
        });
    }

    #[test]
    fn test_config_serialize() {
        let config = Config::default();
        let json = serde_json::to_string(&config).unwrap();
        assert!(json.contains("seed_demo_data"));
        assert!(json.contains("title_preview_chars"));
        assert!(json.contains("poll_delay_ms"));
    }

    #[test]
    fn test_ingest_config_deserialize() {
        let json = r#"{"title_preview_chars": 40}"#;
        let ingest: IngestConfig = serde_json::from_str(json).unwrap();
        assert_eq!(ingest.title_preview_chars, 40);
        assert_eq!(ingest.unregistered_suffix, "(Kayıtsız)");
    }
}
