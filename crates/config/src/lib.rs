#![deny(clippy::pedantic, unsafe_code)]
#![allow(clippy::module_name_repetitions)]

//! Configuration management for patron
//!
//! This crate handles loading and merging configuration from:
//! - Default values (hard-coded)
//! - Configuration file (~/.config/patron/config.toml)
//! - Environment variables
//! - CLI flags

pub mod constants;
pub mod sections;

pub use sections::{
    CodeHostConfig, FeeConfig, GeneralConfig, LockConfig, NetworkConfig, ResolverConfig,
    ResourceConfig,
};

use patron_errors::{ConfigError, Error};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;
use tokio::fs;

/// Main configuration structure
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct Config {
    #[serde(default)]
    pub general: GeneralConfig,

    #[serde(default)]
    pub code_host: CodeHostConfig,

    #[serde(default)]
    pub network: NetworkConfig,

    #[serde(default)]
    pub lock: LockConfig,

    #[serde(default)]
    pub fees: FeeConfig,

    #[serde(default)]
    pub resources: ResourceConfig,

    #[serde(default)]
    pub resolver: ResolverConfig,
}

impl Config {
    /// Get the default config file path
    ///
    /// # Errors
    ///
    /// Returns an error if the system config directory cannot be determined.
    pub fn default_path() -> Result<PathBuf, Error> {
        let config_dir = dirs::config_dir().ok_or_else(|| ConfigError::NotFound {
            path: "config directory".to_string(),
        })?;
        Ok(config_dir.join("patron").join("config.toml"))
    }

    /// Load configuration from file
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or if the file contents
    /// contain invalid TOML syntax that cannot be parsed.
    pub async fn load_from_file(path: &Path) -> Result<Self, Error> {
        let contents = fs::read_to_string(path)
            .await
            .map_err(|_| ConfigError::NotFound {
                path: path.display().to_string(),
            })?;

        toml::from_str(&contents)
            .map_err(|e| ConfigError::ParseError {
                message: e.to_string(),
            })
            .map_err(Into::into)
    }

    /// Load configuration with fallback to defaults
    ///
    /// # Errors
    ///
    /// Returns an error if the configuration file exists but cannot be read
    /// or contains invalid TOML syntax.
    pub async fn load() -> Result<Self, Error> {
        let config_path = Self::default_path()?;

        if config_path.exists() {
            Self::load_from_file(&config_path).await
        } else {
            Ok(Self::default())
        }
    }

    /// Load configuration from an optional path or use default
    ///
    /// # Errors
    ///
    /// Returns an error if the config file cannot be read or parsed
    pub async fn load_or_default(path: Option<&Path>) -> Result<Self, Error> {
        match path {
            Some(config_path) => Self::load_from_file(config_path).await,
            None => Self::load().await,
        }
    }

    /// Merge with environment variables
    ///
    /// # Errors
    ///
    /// Returns an error if environment variables contain invalid values
    /// that cannot be parsed into the expected types.
    pub fn merge_env(&mut self) -> Result<(), Error> {
        if let Ok(path) = std::env::var("PATRON_DATABASE") {
            self.general.database_path = Some(PathBuf::from(path));
        }

        if let Ok(url) = std::env::var("PATRON_CODE_HOST_URL") {
            self.code_host.api_url = url;
        }

        if let Ok(token) = std::env::var("PATRON_CODE_HOST_TOKEN") {
            self.code_host.token = Some(token);
        }

        if let Ok(url) = std::env::var("PATRON_RESOLVER_URL") {
            self.resolver.url = Some(url);
        }

        if let Ok(ttl) = std::env::var("PATRON_LOCK_TTL") {
            self.lock.ttl = ttl.parse().map_err(|_| ConfigError::InvalidValue {
                field: "PATRON_LOCK_TTL".to_string(),
                value: ttl,
            })?;
        }

        if let Ok(downloads) = std::env::var("PATRON_CONCURRENT_DOWNLOADS") {
            self.resources.concurrent_downloads =
                downloads.parse().map_err(|_| ConfigError::InvalidValue {
                    field: "PATRON_CONCURRENT_DOWNLOADS".to_string(),
                    value: downloads,
                })?;
        }

        Ok(())
    }

    /// Check values that would otherwise fail deep inside processing
    ///
    /// # Errors
    ///
    /// Returns an error describing the first invalid value.
    pub fn validate(&self) -> Result<(), Error> {
        if self.fees.percent_fee_bps > 10_000 {
            return Err(ConfigError::InvalidValue {
                field: "fees.percent_fee_bps".to_string(),
                value: self.fees.percent_fee_bps.to_string(),
            }
            .into());
        }
        if self.resources.concurrent_downloads == 0 {
            return Err(ConfigError::InvalidValue {
                field: "resources.concurrent_downloads".to_string(),
                value: "0".to_string(),
            }
            .into());
        }
        if self.lock.ttl == 0 {
            return Err(ConfigError::InvalidValue {
                field: "lock.ttl".to_string(),
                value: "0".to_string(),
            }
            .into());
        }
        Ok(())
    }

    /// Get the database path (with default)
    #[must_use]
    pub fn database_path(&self) -> PathBuf {
        self.general
            .database_path
            .clone()
            .unwrap_or_else(|| PathBuf::from(constants::DB_PATH))
    }

    #[must_use]
    pub fn lock_ttl(&self) -> Duration {
        Duration::from_secs(self.lock.ttl)
    }

    /// Code host token, required by the static credential provider
    ///
    /// # Errors
    ///
    /// Returns an error if no token is configured.
    pub fn code_host_token(&self) -> Result<&str, Error> {
        self.code_host.token.as_deref().ok_or_else(|| {
            ConfigError::MissingField {
                field: "code_host.token".to_string(),
            }
            .into()
        })
    }

    /// Base URL of the weight resolver service
    ///
    /// # Errors
    ///
    /// Returns an error if no resolver URL is configured.
    pub fn resolver_url(&self) -> Result<&str, Error> {
        self.resolver.url.as_deref().ok_or_else(|| {
            ConfigError::MissingField {
                field: "resolver.url".to_string(),
            }
            .into()
        })
    }
}
