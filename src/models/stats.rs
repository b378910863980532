//! Run statistics for the crawl pipelines.

/// Summary of a pagination walk.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct WalkStats {
    /// Browse pages visited (fetched or loaded from cache)
    pub pages_visited: usize,
    /// Pages served from the on-disk cache
    pub pages_cached: usize,
    /// Pages fetched over the network
    pub pages_fetched: usize,
    /// Walk ended on a permanent fetch failure instead of a missing next link
    pub stopped_on_failure: bool,
}

/// Summary of a download run.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct DownloadStats {
    /// Browse pages processed
    pub pages: usize,
    /// Words encountered across all pages (duplicates included)
    pub words_seen: usize,
    /// Definition pages downloaded and persisted
    pub downloaded: usize,
    /// Words skipped because their cache entry already existed
    pub skipped: usize,
    /// Words given up on after a permanent fetch failure
    pub failed: usize,
    /// Items whose processing failed outright (I/O, bad cache key)
    pub item_errors: usize,
}

impl DownloadStats {
    /// Fold another worker's counters into this one.
    pub fn merge(&mut self, other: &DownloadStats) {
        self.pages += other.pages;
        self.words_seen += other.words_seen;
        self.downloaded += other.downloaded;
        self.skipped += other.skipped;
        self.failed += other.failed;
        self.item_errors += other.item_errors;
    }
}
