//! Resource limit configuration

use patron_config::constants;
use serde::{Deserialize, Serialize};

/// Resource limit configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResourceLimits {
    /// Maximum number of concurrent manifest downloads per crawl
    pub concurrent_downloads: usize,
}

impl ResourceLimits {
    /// Create resource limits for testing (lower limits)
    #[must_use]
    pub fn for_testing() -> Self {
        Self {
            concurrent_downloads: 2,
        }
    }
}

impl Default for ResourceLimits {
    fn default() -> Self {
        Self {
            concurrent_downloads: constants::CONCURRENT_DOWNLOADS,
        }
    }
}

/// Trait for converting configuration sections into `ResourceLimits`
pub trait IntoResourceLimits {
    /// Convert this configuration into `ResourceLimits`
    fn into_resource_limits(self) -> ResourceLimits;
}

impl IntoResourceLimits for &patron_config::ResourceConfig {
    fn into_resource_limits(self) -> ResourceLimits {
        ResourceLimits {
            concurrent_downloads: self.concurrent_downloads.max(1),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_download_cap() {
        assert_eq!(ResourceLimits::default().concurrent_downloads, 30);
    }

    #[test]
    fn test_zero_from_config_is_clamped() {
        let config = patron_config::ResourceConfig {
            concurrent_downloads: 0,
        };
        assert_eq!(config.into_resource_limits().concurrent_downloads, 1);
    }
}
