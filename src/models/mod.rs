// src/models/mod.rs

//! Domain models for the crawler application.

mod config;
mod stats;

// Re-export all public types
pub use config::{CacheConfig, Config, CrawlConfig, RetryConfig, SiteConfig};
pub use stats::{DownloadStats, WalkStats};
