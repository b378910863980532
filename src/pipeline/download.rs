// src/pipeline/download.rs

//! Download pipeline: turn the browse cache into definition pages.

use std::sync::Arc;

use tokio::sync::watch;

use crate::error::Result;
use crate::models::{Config, DownloadStats};
use crate::services::{DownloadScheduler, Fetcher};
use crate::storage::PageCache;
use crate::utils::urls::SiteUrls;

/// Enumerate the browse cache once and drain it through the worker pool.
pub async fn run_download(
    config: &Config,
    cache: Arc<PageCache>,
    fetcher: Arc<Fetcher>,
    shutdown: watch::Receiver<bool>,
) -> Result<DownloadStats> {
    cache.ensure_layout().await?;

    let keys = cache.browse_keys().await?;
    if keys.is_empty() {
        log::warn!(
            "browse cache at {:?} is empty; run the browse step first",
            cache.browse_dir()
        );
        return Ok(DownloadStats::default());
    }

    let urls = SiteUrls::from_config(&config.site);
    let scheduler = DownloadScheduler::new(fetcher, cache, urls, &config.crawl, shutdown);
    let stats = scheduler.run(keys).await?;

    log::info!(
        "download run done: {} pages, {} words seen, {} downloaded, {} skipped, {} failed, {} item errors",
        stats.pages,
        stats.words_seen,
        stats.downloaded,
        stats.skipped,
        stats.failed,
        stats.item_errors
    );

    Ok(stats)
}
