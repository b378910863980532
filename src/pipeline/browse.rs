// src/pipeline/browse.rs

//! Pagination pipeline: populate the browse cache from a seed word.

use std::sync::Arc;

use crate::error::Result;
use crate::models::{Config, WalkStats};
use crate::services::{Fetcher, PaginationWalker};
use crate::storage::PageCache;
use crate::utils::urls::SiteUrls;

/// Walk the browse index from the configured seed word.
pub async fn run_browse(
    config: &Config,
    cache: Arc<PageCache>,
    fetcher: Arc<Fetcher>,
) -> Result<WalkStats> {
    cache.ensure_layout().await?;

    log::info!(
        "starting pagination walk from '{}' against {}",
        config.crawl.seed_word,
        config.site.host
    );

    let urls = SiteUrls::from_config(&config.site);
    let walker = PaginationWalker::new(fetcher, cache, urls);
    let stats = walker.run(&config.crawl.seed_word).await?;

    log::info!(
        "pagination walk done: {} pages visited ({} fetched, {} from cache)",
        stats.pages_visited,
        stats.pages_fetched,
        stats.pages_cached
    );
    if stats.stopped_on_failure {
        log::warn!("walk stopped on a permanent fetch failure, not end of pagination");
    }

    Ok(stats)
}
