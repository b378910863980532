//! Application configuration structures.

use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::{AppError, Result};

/// Root application configuration.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct Config {
    /// Remote site settings
    #[serde(default)]
    pub site: SiteConfig,

    /// Crawl behavior settings
    #[serde(default)]
    pub crawl: CrawlConfig,

    /// Retry delays per failure class
    #[serde(default)]
    pub retry: RetryConfig,

    /// On-disk cache settings
    #[serde(default)]
    pub cache: CacheConfig,
}

impl Config {
    /// Load configuration from a TOML file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let content = fs::read_to_string(path)?;
        Ok(toml::from_str(&content)?)
    }

    /// Load configuration or return default if loading fails.
    pub fn load_or_default(path: impl AsRef<Path>) -> Self {
        Self::load(&path).unwrap_or_else(|e| {
            log::warn!(
                "Config load failed from {:?}: {}. Using defaults.",
                path.as_ref(),
                e
            );
            Self::default()
        })
    }

    /// Validate configuration values for basic sanity.
    pub fn validate(&self) -> Result<()> {
        if self.site.host.trim().is_empty() {
            return Err(AppError::validation("site.host is empty"));
        }
        if self.site.use_api && self.site.api_host.trim().is_empty() {
            return Err(AppError::validation(
                "site.use_api is set but site.api_host is empty",
            ));
        }
        if self.site.user_agent.trim().is_empty() {
            return Err(AppError::validation("site.user_agent is empty"));
        }
        if self.crawl.seed_word.is_empty() {
            return Err(AppError::validation("crawl.seed_word is empty"));
        }
        if self.crawl.workers == 0 {
            return Err(AppError::validation("crawl.workers must be > 0"));
        }
        if self.crawl.queue_capacity == Some(0) {
            return Err(AppError::validation("crawl.queue_capacity must be > 0"));
        }
        Ok(())
    }
}

/// Remote site settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SiteConfig {
    /// Host serving the browse and definition pages
    #[serde(default = "defaults::host")]
    pub host: String,

    /// Host serving the alternate JSON definition API
    #[serde(default = "defaults::api_host")]
    pub api_host: String,

    /// Fetch definitions through the API host instead of the HTML pages
    #[serde(default)]
    pub use_api: bool,

    /// User-Agent header for HTTP requests
    #[serde(default = "defaults::user_agent")]
    pub user_agent: String,
}

impl Default for SiteConfig {
    fn default() -> Self {
        Self {
            host: defaults::host(),
            api_host: defaults::api_host(),
            use_api: false,
            user_agent: defaults::user_agent(),
        }
    }
}

/// Crawl behavior settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CrawlConfig {
    /// Browse term the pagination walk starts from
    #[serde(default = "defaults::seed_word")]
    pub seed_word: String,

    /// Number of concurrent download workers
    #[serde(default = "defaults::workers")]
    pub workers: usize,

    /// Work queue capacity (defaults to 2x workers)
    #[serde(default)]
    pub queue_capacity: Option<usize>,
}

impl CrawlConfig {
    /// Effective work queue capacity.
    pub fn effective_queue_capacity(&self) -> usize {
        self.queue_capacity.unwrap_or(self.workers * 2).max(1)
    }
}

impl Default for CrawlConfig {
    fn default() -> Self {
        Self {
            seed_word: defaults::seed_word(),
            workers: defaults::workers(),
            queue_capacity: None,
        }
    }
}

/// Retry delays per failure class, in milliseconds.
///
/// Both classes retry indefinitely; only the delay differs.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RetryConfig {
    /// Delay after a connection-level failure
    #[serde(default = "defaults::connect_delay")]
    pub connect_delay_ms: u64,

    /// Delay after an HTTP 403 (rate-limit / defensive block)
    #[serde(default = "defaults::throttle_delay")]
    pub throttle_delay_ms: u64,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            connect_delay_ms: defaults::connect_delay(),
            throttle_delay_ms: defaults::throttle_delay(),
        }
    }
}

/// On-disk cache settings.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct CacheConfig {
    /// Cache root directory (defaults to ~/.cache/dictcrawl)
    #[serde(default)]
    pub root: Option<PathBuf>,
}

impl CacheConfig {
    /// Resolve the cache root, falling back to `~/.cache/dictcrawl`.
    pub fn resolved_root(&self) -> Result<PathBuf> {
        if let Some(root) = &self.root {
            return Ok(root.clone());
        }
        let home = std::env::var_os("HOME")
            .ok_or_else(|| AppError::config("cache.root not set and $HOME is not defined"))?;
        Ok(PathBuf::from(home).join(".cache").join("dictcrawl"))
    }
}

mod defaults {
    pub fn host() -> String {
        "www.urbandictionary.com".into()
    }
    pub fn api_host() -> String {
        "api.urbandictionary.com".into()
    }
    pub fn user_agent() -> String {
        "Mozilla/5.0 (compatible; dictcrawl/0.1)".into()
    }
    pub fn seed_word() -> String {
        "a".into()
    }
    pub fn workers() -> usize {
        16
    }
    pub fn connect_delay() -> u64 {
        500
    }
    pub fn throttle_delay() -> u64 {
        5_000
    }
}
