//! Configuration management for sgdash.
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
const DATA_DIR_NAME: &str = "sgdash";

/// Default database file name.
const DATABASE_FILE_NAME: &str = "snapshots.db";

/// Prefix for environment variable overrides.
const ENV_PREFIX: &str = "SGDASH_";

/// Application configuration.
///
/// Configuration is loaded from (in order of precedence, highest first):
/// 1. Environment variables (prefixed with `SGDASH_`, sections split on `__`)
/// 2. TOML config file at `~/.config/sgdash/config.toml`
/// 3. Default values
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Upstream API configuration.
    pub api: ApiConfig,
    /// Dataset cache configuration.
    pub cache: CacheConfig,
    /// Snapshot storage configuration.
    pub storage: StorageConfig,
    /// Polling configuration.
    pub poll: PollConfig,
    /// Camera reference table configuration.
    pub cameras: CamerasConfig,
}

/// Upstream API endpoints and credentials.
#[derive(Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ApiConfig {
    /// Base URL of the v1 Data.gov.sg API.
    pub data_gov_url: String,
    /// Base URL of the v2 Data.gov.sg realtime API.
    pub realtime_url: String,
    /// Base URL of the Data.gov.sg initiate-download dataset API.
    pub datasets_url: String,
    /// Base URL of LTA DataMall.
    pub datamall_url: String,
    /// Base URL of OneMap.
    pub onemap_url: String,
    /// Data.gov.sg API key, sent as `X-API-Key` when set.
    pub data_gov_api_key: Option<String>,
    /// LTA DataMall account key.
    pub lta_account_key: Option<String>,
    /// OneMap account email.
    pub onemap_email: Option<String>,
    /// OneMap account password.
    pub onemap_password: Option<String>,
    /// User agent sent with every request.
    pub user_agent: String,
    /// Per-request timeout in seconds.
    pub timeout_secs: u64,
}

/// Dataset cache configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CacheConfig {
    /// How long a downloaded dataset stays fresh, in hours.
    pub dataset_ttl_hours: u32,
}

/// Snapshot storage configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct StorageConfig {
    /// Path to the database file.
    /// Defaults to `~/.local/share/sgdash/snapshots.db`
    pub database_path: Option<PathBuf>,
    /// Maximum number of snapshots to retain.
    /// Set to 0 for unlimited.
    pub max_snapshots: usize,
    /// Maximum age of snapshots to retain in days.
    /// Set to 0 for unlimited.
    pub max_age_days: u32,
}

/// Polling configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PollConfig {
    /// Seconds between traffic-image fetches.
    pub interval_secs: u64,
    /// Download each new camera image to disk.
    pub download_images: bool,
    /// Where downloaded images go.
    /// Defaults to `~/.local/share/sgdash/images`
    pub image_dir: Option<PathBuf>,
}

/// Camera reference table configuration.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CamerasConfig {
    /// CSV file replacing the built-in camera table.
    pub table_path: Option<PathBuf>,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            data_gov_url: "https://api.data.gov.sg/v1".to_string(),
            realtime_url: "https://api-open.data.gov.sg/v2/real-time/api".to_string(),
            datasets_url: "https://api-open.data.gov.sg/v1/public/api/datasets".to_string(),
            datamall_url: "https://datamall2.mytransport.sg/ltaodataservice".to_string(),
            onemap_url: "https://www.onemap.gov.sg".to_string(),
            data_gov_api_key: None,
            lta_account_key: None,
            onemap_email: None,
            onemap_password: None,
            user_agent: concat!("sgdash/", env!("CARGO_PKG_VERSION")).to_string(),
            timeout_secs: 5,
        }
    }
}

// Credentials stay out of debug output.
impl std::fmt::Debug for ApiConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ApiConfig")
            .field("data_gov_url", &self.data_gov_url)
            .field("realtime_url", &self.realtime_url)
            .field("datasets_url", &self.datasets_url)
            .field("datamall_url", &self.datamall_url)
            .field("onemap_url", &self.onemap_url)
            .field("data_gov_api_key", &self.data_gov_api_key.as_ref().map(|_| "***"))
            .field("lta_account_key", &self.lta_account_key.as_ref().map(|_| "***"))
            .field("onemap_email", &self.onemap_email)
            .field("onemap_password", &self.onemap_password.as_ref().map(|_| "***"))
            .field("user_agent", &self.user_agent)
            .field("timeout_secs", &self.timeout_secs)
            .finish()
    }
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            dataset_ttl_hours: 24,
        }
    }
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            database_path: None,
            max_snapshots: 500_000,
            max_age_days: 14,
        }
    }
}

impl Default for PollConfig {
    fn default() -> Self {
        Self {
            // Data.gov.sg refreshes camera images roughly every 20 seconds.
            interval_secs: 60,
            download_images: false,
            image_dir: None,
        }
    }
}

impl Config {
    /// Load configuration from all sources.
    ///
    /// # Errors
    ///
    /// Returns an error if configuration loading or parsing fails.
    pub fn load() -> Result<Self> {
        Self::load_from(None)
    }

    /// Load configuration with an optional custom config path.
    ///
    /// # Errors
    ///
    /// Returns an error if configuration loading or parsing fails.
    pub fn load_from(config_path: Option<PathBuf>) -> Result<Self> {
        let config_file = config_path.unwrap_or_else(Self::default_config_path);
        Self::from_figment(Self::figment(&config_file))
    }

    /// Build the layered figment for a given config file.
    #[must_use]
    pub fn figment(config_file: &std::path::Path) -> Figment {
        Figment::new()
            .merge(Serialized::defaults(Config::default()))
            .merge(Toml::file(config_file))
            .merge(Env::prefixed(ENV_PREFIX).split("__"))
    }

    /// Extract and validate a configuration from a figment.
    ///
    /// # Errors
    ///
    /// Returns an error if extraction or validation fails.
    pub fn from_figment(figment: Figment) -> Result<Self> {
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
        if self.api.timeout_secs == 0 {
            return Err(Error::ConfigValidation {
                message: "timeout_secs must be greater than 0".to_string(),
            });
        }

        if self.poll.interval_secs == 0 {
            return Err(Error::ConfigValidation {
                message: "interval_secs must be greater than 0".to_string(),
            });
        }

        for (name, url) in [
            ("data_gov_url", &self.api.data_gov_url),
            ("realtime_url", &self.api.realtime_url),
            ("datasets_url", &self.api.datasets_url),
            ("datamall_url", &self.api.datamall_url),
            ("onemap_url", &self.api.onemap_url),
        ] {
            if reqwest::Url::parse(url).is_err() {
                return Err(Error::ConfigValidation {
                    message: format!("{name} is not a valid URL: {url}"),
                });
            }
        }

        if self.api.user_agent.trim().is_empty() {
            return Err(Error::ConfigValidation {
                message: "user_agent must not be empty".to_string(),
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

    /// Get the image directory, resolving defaults if not set.
    #[must_use]
    pub fn image_dir(&self) -> PathBuf {
        self.poll
            .image_dir
            .clone()
            .unwrap_or_else(|| Self::default_data_dir().join("images"))
    }

    /// Get the request timeout as a Duration.
    #[must_use]
    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.api.timeout_secs)
    }

    /// Get the poll interval as a Duration.
    #[must_use]
    pub fn poll_interval(&self) -> Duration {
        Duration::from_secs(self.poll.interval_secs)
    }

    /// Get the dataset cache TTL as a Duration.
    #[must_use]
    pub fn dataset_ttl(&self) -> Duration {
        Duration::from_secs(u64::from(self.cache.dataset_ttl_hours) * 60 * 60)
    }

    /// Get the max snapshot age as a Duration.
    #[must_use]
    pub fn max_age(&self) -> Option<Duration> {
        if self.storage.max_age_days == 0 {
            None
        } else {
            Some(Duration::from_secs(
                u64::from(self.storage.max_age_days) * 24 * 60 * 60,
            ))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = Config::default();

        assert!(config.api.lta_account_key.is_none());
        assert_eq!(config.api.timeout_secs, 5);
        assert_eq!(config.cache.dataset_ttl_hours, 24);
        assert_eq!(config.poll.interval_secs, 60);
        assert!(!config.poll.download_images);
        assert!(config.cameras.table_path.is_none());
    }

    #[test]
    fn test_default_api_urls() {
        let api = ApiConfig::default();
        assert_eq!(api.data_gov_url, "https://api.data.gov.sg/v1");
        assert!(api.realtime_url.ends_with("/v2/real-time/api"));
        assert!(api.datamall_url.contains("datamall2.mytransport.sg"));
        assert!(api.user_agent.starts_with("sgdash/"));
    }

    #[test]
    fn test_validate_valid_config() {
        assert!(Config::default().validate().is_ok());
    }

    #[test]
    fn test_validate_zero_timeout() {
        let mut config = Config::default();
        config.api.timeout_secs = 0;

        let err = config.validate().unwrap_err().to_string();
        assert!(err.contains("timeout_secs"));
    }

    #[test]
    fn test_validate_zero_interval() {
        let mut config = Config::default();
        config.poll.interval_secs = 0;

        let err = config.validate().unwrap_err().to_string();
        assert!(err.contains("interval_secs"));
    }

    #[test]
    fn test_validate_bad_url() {
        let mut config = Config::default();
        config.api.datamall_url = "not a url".to_string();

        let err = config.validate().unwrap_err().to_string();
        assert!(err.contains("datamall_url"));
    }

    #[test]
    fn test_validate_empty_user_agent() {
        let mut config = Config::default();
        config.api.user_agent = "  ".to_string();

        assert!(config.validate().is_err());
    }

    #[test]
    fn test_debug_redacts_credentials() {
        let mut config = Config::default();
        config.api.lta_account_key = Some("secret-key".to_string());
        config.api.onemap_password = Some("hunter2".to_string());
        config.api.data_gov_api_key = Some("open-data-key".to_string());

        let debug_str = format!("{config:?}");
        assert!(!debug_str.contains("secret-key"));
        assert!(!debug_str.contains("hunter2"));
        assert!(!debug_str.contains("open-data-key"));
        assert!(debug_str.contains("***"));
    }

    #[test]
    fn test_database_path_default() {
        let config = Config::default();
        assert!(config
            .database_path()
            .to_string_lossy()
            .contains("snapshots.db"));
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
    fn test_image_dir_default() {
        let config = Config::default();
        assert!(config.image_dir().ends_with("images"));
    }

    #[test]
    fn test_durations() {
        let config = Config::default();
        assert_eq!(config.request_timeout(), Duration::from_secs(5));
        assert_eq!(config.poll_interval(), Duration::from_secs(60));
        assert_eq!(config.dataset_ttl(), Duration::from_secs(24 * 60 * 60));
        assert_eq!(
            config.max_age(),
            Some(Duration::from_secs(14 * 24 * 60 * 60))
        );
    }

    #[test]
    fn test_max_age_none_when_zero() {
        let mut config = Config::default();
        config.storage.max_age_days = 0;
        assert!(config.max_age().is_none());
    }

    #[test]
    fn test_default_config_path() {
        let path = Config::default_config_path();
        assert!(path.to_string_lossy().contains("sgdash"));
        assert!(path.to_string_lossy().contains("config.toml"));
    }

    #[test]
    fn test_load_nonexistent_config() {
        let config = Config::load_from(Some(PathBuf::from("/nonexistent/config.toml"))).unwrap();
        assert_eq!(config, Config::default());
    }

    #[test]
    fn test_load_from_toml_file() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("config.toml");
        std::fs::write(
            &path,
            "[api]\ntimeout_secs = 10\nlta_account_key = \"abc\"\n\n[poll]\ninterval_secs = 30\n",
        )
        .unwrap();

        let config = Config::load_from(Some(path)).unwrap();
        assert_eq!(config.api.timeout_secs, 10);
        assert_eq!(config.api.lta_account_key.as_deref(), Some("abc"));
        assert_eq!(config.poll.interval_secs, 30);
        assert_eq!(config.cache, CacheConfig::default());
    }

    #[test]
    fn test_invalid_toml_value_fails_validation() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("config.toml");
        std::fs::write(&path, "[poll]\ninterval_secs = 0\n").unwrap();

        assert!(Config::load_from(Some(path)).is_err());
    }

    #[test]
    fn test_env_override() {
        figment::Jail::expect_with(|jail| {
            jail.set_env("SGDASH_API__TIMEOUT_SECS", "12");
            jail.set_env("SGDASH_STORAGE__MAX_AGE_DAYS", "3");

            let config =
                Config::from_figment(Config::figment(std::path::Path::new("missing.toml")))
                    .expect("config");
            assert_eq!(config.api.timeout_secs, 12);
            assert_eq!(config.storage.max_age_days, 3);
            Ok(())
        });
    }

    #[test]
    fn test_storage_config_deserialize() {
        let json = r#"{"max_snapshots": 5000, "max_age_days": 7}"#;
        let storage: StorageConfig = serde_json::from_str(json).unwrap();
        assert_eq!(storage.max_snapshots, 5000);
        assert_eq!(storage.max_age_days, 7);
        assert!(storage.database_path.is_none());
    }
}
