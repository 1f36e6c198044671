//! Configuration sections

use crate::constants;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// General application configuration
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct GeneralConfig {
    pub database_path: Option<PathBuf>,
}

/// Code host (GitHub-compatible REST API) configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CodeHostConfig {
    #[serde(default = "default_api_url")]
    pub api_url: String,
    /// Installation token used by the static credential provider
    pub token: Option<String>,
    #[serde(default = "default_max_rate_limit_wait")]
    pub max_rate_limit_wait: u64, // seconds
    #[serde(default = "default_page_size")]
    pub page_size: u32,
}

impl Default for CodeHostConfig {
    fn default() -> Self {
        Self {
            api_url: default_api_url(),
            token: None,
            max_rate_limit_wait: default_max_rate_limit_wait(),
            page_size: default_page_size(),
        }
    }
}

/// Network configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NetworkConfig {
    #[serde(default = "default_timeout")]
    pub timeout: u64, // seconds
    #[serde(default = "default_retries")]
    pub retries: u32,
    #[serde(default = "default_retry_delay")]
    pub retry_delay: u64, // seconds
}

impl Default for NetworkConfig {
    fn default() -> Self {
        Self {
            timeout: default_timeout(),
            retries: default_retries(),
            retry_delay: default_retry_delay(),
        }
    }
}

/// Organization lock configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LockConfig {
    #[serde(default = "default_lock_ttl")]
    pub ttl: u64, // seconds
}

impl Default for LockConfig {
    fn default() -> Self {
        Self {
            ttl: default_lock_ttl(),
        }
    }
}

/// Fee model applied to gross donations
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FeeConfig {
    #[serde(default = "default_percent_fee_bps")]
    pub percent_fee_bps: u32,
    #[serde(default = "default_flat_fee_cents")]
    pub flat_fee_cents: u64,
    /// Package shares below this many millicents are not written
    #[serde(default = "default_compensation_epsilon")]
    pub compensation_epsilon: u64,
}

impl Default for FeeConfig {
    fn default() -> Self {
        Self {
            percent_fee_bps: default_percent_fee_bps(),
            flat_fee_cents: default_flat_fee_cents(),
            compensation_epsilon: default_compensation_epsilon(),
        }
    }
}

/// Concurrency limits
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ResourceConfig {
    #[serde(default = "default_concurrent_downloads")]
    pub concurrent_downloads: usize,
}

impl Default for ResourceConfig {
    fn default() -> Self {
        Self {
            concurrent_downloads: default_concurrent_downloads(),
        }
    }
}

/// External weight resolver service
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct ResolverConfig {
    pub url: Option<String>,
}

// Default value functions for serde
fn default_api_url() -> String {
    constants::CODE_HOST_API_URL.to_string()
}

fn default_max_rate_limit_wait() -> u64 {
    constants::MAX_RATE_LIMIT_WAIT_SECS
}

fn default_page_size() -> u32 {
    constants::SEARCH_PAGE_SIZE
}

fn default_timeout() -> u64 {
    60
}

fn default_retries() -> u32 {
    3
}

fn default_retry_delay() -> u64 {
    1 // 1 second
}

fn default_lock_ttl() -> u64 {
    constants::LOCK_TTL_SECS
}

fn default_percent_fee_bps() -> u32 {
    constants::PERCENT_FEE_BPS
}

fn default_flat_fee_cents() -> u64 {
    constants::FLAT_FEE_CENTS
}

fn default_compensation_epsilon() -> u64 {
    constants::COMPENSATION_EPSILON_MILLICENTS
}

fn default_concurrent_downloads() -> usize {
    constants::CONCURRENT_DOWNLOADS
}
