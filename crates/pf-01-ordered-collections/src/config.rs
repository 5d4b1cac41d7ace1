//! Configuration for ordered collections

use crate::domain::errors::ConfigError;
use serde::{Deserialize, Serialize};
use std::env;
use std::time::Duration;

/// Coordinator configuration.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CollectionConfig {
    /// Budget for one read-plan-apply-commit unit of work, lock wait included
    pub store_timeout_ms: u64,
    /// Extra attempts after a version conflict
    pub max_conflict_retries: u32,
    /// Backoff step; attempt k waits k * this
    pub retry_backoff_ms: u64,
    /// TTL of single-item cache entries
    pub item_cache_ttl_secs: u64,
    /// TTL of listing cache entries
    pub listing_cache_ttl_secs: u64,
    /// Limit used when a listing request has none
    pub default_page_size: u32,
    /// Upper bound for listing limits
    pub max_page_size: u32,
}

impl Default for CollectionConfig {
    fn default() -> Self {
        Self {
            store_timeout_ms: 5_000,
            max_conflict_retries: 2,
            retry_backoff_ms: 25,
            item_cache_ttl_secs: 300,
            listing_cache_ttl_secs: 60,
            default_page_size: 20,
            max_page_size: 100,
        }
    }
}

impl CollectionConfig {
    /// Create configuration from environment variables.
    ///
    /// # Environment Variables
    ///
    /// - `PF_STORE_TIMEOUT_MS` (default: 5000)
    /// - `PF_MAX_CONFLICT_RETRIES` (default: 2)
    /// - `PF_RETRY_BACKOFF_MS` (default: 25)
    /// - `PF_ITEM_CACHE_TTL_SECS` (default: 300)
    /// - `PF_LISTING_CACHE_TTL_SECS` (default: 60)
    /// - `PF_DEFAULT_PAGE_SIZE` (default: 20)
    /// - `PF_MAX_PAGE_SIZE` (default: 100)
    ///
    /// Unparseable values fall back to the default; the result is validated.
    pub fn from_env() -> Result<Self, ConfigError> {
        let defaults = Self::default();

        let config = Self {
            store_timeout_ms: env_or("PF_STORE_TIMEOUT_MS", defaults.store_timeout_ms),
            max_conflict_retries: env_or("PF_MAX_CONFLICT_RETRIES", defaults.max_conflict_retries),
            retry_backoff_ms: env_or("PF_RETRY_BACKOFF_MS", defaults.retry_backoff_ms),
            item_cache_ttl_secs: env_or("PF_ITEM_CACHE_TTL_SECS", defaults.item_cache_ttl_secs),
            listing_cache_ttl_secs: env_or(
                "PF_LISTING_CACHE_TTL_SECS",
                defaults.listing_cache_ttl_secs,
            ),
            default_page_size: env_or("PF_DEFAULT_PAGE_SIZE", defaults.default_page_size),
            max_page_size: env_or("PF_MAX_PAGE_SIZE", defaults.max_page_size),
        };
        config.validate()?;
        Ok(config)
    }

    /// Reject settings the coordinator cannot run with.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.store_timeout_ms == 0 {
            return Err(ConfigError::InvalidTimeout(
                "store_timeout_ms cannot be 0".into(),
            ));
        }
        if self.default_page_size == 0 || self.max_page_size == 0 {
            return Err(ConfigError::InvalidPageSize(
                "page sizes cannot be 0".into(),
            ));
        }
        if self.default_page_size > self.max_page_size {
            return Err(ConfigError::InvalidPageSize(format!(
                "default_page_size {} exceeds max_page_size {}",
                self.default_page_size, self.max_page_size
            )));
        }
        Ok(())
    }

    pub fn store_timeout(&self) -> Duration {
        Duration::from_millis(self.store_timeout_ms)
    }

    pub fn retry_backoff(&self, attempt: u32) -> Duration {
        Duration::from_millis(self.retry_backoff_ms.saturating_mul(attempt as u64))
    }

    pub fn item_cache_ttl(&self) -> Duration {
        Duration::from_secs(self.item_cache_ttl_secs)
    }

    pub fn listing_cache_ttl(&self) -> Duration {
        Duration::from_secs(self.listing_cache_ttl_secs)
    }
}

fn env_or<T: std::str::FromStr>(name: &str, default: T) -> T {
    env::var(name)
        .ok()
        .and_then(|v| v.parse().ok())
        .unwrap_or(default)
}
