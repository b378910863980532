// src/services/scheduler.rs

//! Bounded work queue and worker pool for definition downloads.
//!
//! The producer enqueues every browse-cache filename exactly once; that
//! single enumeration is the whole work list for a run. The queue is a
//! bounded FIFO (2x the worker count by default) so a slow pool
//! backpressures the producer instead of buffering the directory
//! listing in memory. Each worker drains items forever: read the stored
//! browse page, extract its words, and download every word whose
//! definition is not already on disk.
//!
//! The existence check before each download is the idempotence gate.
//! There is no cross-worker lock around it: two workers racing on the
//! same word can at worst fetch it twice, and the second write lands
//! the same content at the same path.

use std::sync::Arc;

use tokio::sync::{Mutex, mpsc, watch};

use crate::error::Result;
use crate::models::{CrawlConfig, DownloadStats};
use crate::services::extract;
use crate::services::fetcher::{FetchOutcome, Fetcher};
use crate::storage::{PageCache, word_from_key};
use crate::utils::urls::SiteUrls;

/// Fans definition downloads out across a fixed worker pool.
pub struct DownloadScheduler {
    fetcher: Arc<Fetcher>,
    cache: Arc<PageCache>,
    urls: SiteUrls,
    workers: usize,
    queue_capacity: usize,
    shutdown: watch::Receiver<bool>,
}

/// Everything a worker needs, cloned once per worker.
#[derive(Clone)]
struct WorkerContext {
    fetcher: Arc<Fetcher>,
    cache: Arc<PageCache>,
    urls: SiteUrls,
    queue: Arc<Mutex<mpsc::Receiver<String>>>,
    shutdown: watch::Receiver<bool>,
}

/// How processing one browse page ended.
enum ItemOutcome {
    Done { word: String, downloaded: usize },
    Cancelled,
}

impl DownloadScheduler {
    pub fn new(
        fetcher: Arc<Fetcher>,
        cache: Arc<PageCache>,
        urls: SiteUrls,
        crawl: &CrawlConfig,
        shutdown: watch::Receiver<bool>,
    ) -> Self {
        Self {
            fetcher,
            cache,
            urls,
            workers: crawl.workers.max(1),
            queue_capacity: crawl.effective_queue_capacity(),
            shutdown,
        }
    }

    /// Drain the given browse-cache filenames through the worker pool.
    pub async fn run(&self, keys: Vec<String>) -> Result<DownloadStats> {
        let (tx, rx) = mpsc::channel::<String>(self.queue_capacity);
        let rx = Arc::new(Mutex::new(rx));

        log::info!(
            "downloading with {} workers (queue capacity {}) over {} browse pages",
            self.workers,
            self.queue_capacity,
            keys.len()
        );

        let mut handles = Vec::with_capacity(self.workers);
        for worker_id in 0..self.workers {
            let ctx = WorkerContext {
                fetcher: Arc::clone(&self.fetcher),
                cache: Arc::clone(&self.cache),
                urls: self.urls.clone(),
                queue: Arc::clone(&rx),
                shutdown: self.shutdown.clone(),
            };
            handles.push(tokio::spawn(worker_loop(worker_id, ctx)));
        }
        // The workers now hold the only receiver handles. When shutdown
        // makes them all exit, the channel closes and a producer parked
        // on a full queue gets its send error instead of waiting forever.
        drop(rx);

        for key in keys {
            if *self.shutdown.borrow() {
                log::info!("shutdown signaled, no further items will be queued");
                break;
            }
            // Blocks when the queue is full; errors only if every worker is gone
            if tx.send(key).await.is_err() {
                break;
            }
        }
        drop(tx);

        let mut stats = DownloadStats::default();
        for joined in futures::future::join_all(handles).await {
            match joined {
                Ok(worker_stats) => stats.merge(&worker_stats),
                Err(e) => log::error!("worker task failed: {e}"),
            }
        }
        Ok(stats)
    }
}

/// Unbounded consume loop: dequeue, process fully, repeat. A failed
/// item is logged and never takes the worker down with it.
async fn worker_loop(worker_id: usize, ctx: WorkerContext) -> DownloadStats {
    let mut stats = DownloadStats::default();
    loop {
        if *ctx.shutdown.borrow() {
            log::debug!("worker{worker_id}: shutting down");
            break;
        }

        let item = { ctx.queue.lock().await.recv().await };
        let Some(key) = item else {
            // Queue closed and drained: the run is over
            break;
        };

        match process_item(&ctx, &key, &mut stats).await {
            Ok(ItemOutcome::Done { word, downloaded }) => {
                log::info!("worker{worker_id}: downloaded {downloaded} words from '{word}'");
            }
            Ok(ItemOutcome::Cancelled) => {
                log::debug!("worker{worker_id}: cancelled mid-item");
                break;
            }
            Err(e) => {
                stats.item_errors += 1;
                log::warn!("worker{worker_id}: failed processing browse entry '{key}': {e}");
            }
        }
    }
    stats
}

/// Process one browse-cache entry: extract its words and ensure each
/// word's definition page is durably cached.
async fn process_item(
    ctx: &WorkerContext,
    key: &str,
    stats: &mut DownloadStats,
) -> Result<ItemOutcome> {
    let word = word_from_key(key)?;
    let text = ctx.cache.load_browse_key(key).await?;
    stats.pages += 1;

    let mut downloaded = 0;
    for term in extract::browse_words(&text) {
        stats.words_seen += 1;

        if ctx.cache.has_definition(&term).await {
            stats.skipped += 1;
            continue;
        }

        let url = ctx.urls.define(&term)?;
        match ctx.fetcher.fetch(&url).await {
            FetchOutcome::Success(page) => {
                ctx.cache.store_definition(&term, &page).await?;
                stats.downloaded += 1;
                downloaded += 1;
            }
            FetchOutcome::Permanent { status } => {
                // No cache entry is written: a later run may retry
                stats.failed += 1;
                log::debug!("skipping '{term}' after permanent failure (status {status:?})");
            }
            FetchOutcome::Cancelled => return Ok(ItemOutcome::Cancelled),
        }
    }

    Ok(ItemOutcome::Done { word, downloaded })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;
    use tempfile::TempDir;
    use tokio::time::timeout;
    use wiremock::matchers::{method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    use crate::services::fetcher::RetryPolicy;
    use crate::storage::browse_key;

    fn crawl_config(workers: usize) -> CrawlConfig {
        CrawlConfig {
            workers,
            queue_capacity: None,
            ..CrawlConfig::default()
        }
    }

    struct Harness {
        _tmp: TempDir,
        cache: Arc<PageCache>,
        scheduler: DownloadScheduler,
        shutdown: watch::Sender<bool>,
    }

    async fn harness(server: &MockServer, crawl: &CrawlConfig) -> Harness {
        let tmp = TempDir::new().unwrap();
        let cache = Arc::new(PageCache::new(tmp.path()));
        cache.ensure_layout().await.unwrap();

        let (tx, rx) = watch::channel(false);
        let fetcher = Arc::new(Fetcher::new(
            reqwest::Client::new(),
            RetryPolicy::immediate(),
            rx.clone(),
        ));
        let urls = SiteUrls::from_config(&crate::models::SiteConfig {
            host: server.uri(),
            ..crate::models::SiteConfig::default()
        });
        let scheduler = DownloadScheduler::new(fetcher, Arc::clone(&cache), urls, crawl, rx);
        Harness {
            _tmp: tmp,
            cache,
            scheduler,
            shutdown: tx,
        }
    }

    async fn mount_definition(server: &MockServer, term: &str, expect: u64) {
        Mock::given(method("GET"))
            .and(path("/define.php"))
            .and(query_param("term", term))
            .respond_with(
                ResponseTemplate::new(200).set_body_string(format!("<html>{term}</html>")),
            )
            .expect(expect)
            .mount(server)
            .await;
    }

    fn browse_body(terms: &[&str]) -> String {
        terms
            .iter()
            .map(|t| format!(r#"<a href="/define.php?term={t}">{t}</a>"#))
            .collect()
    }

    #[tokio::test]
    async fn downloads_every_word_from_seeded_browse_pages() {
        let server = MockServer::start().await;
        mount_definition(&server, "apple", 1).await;
        mount_definition(&server, "ant", 1).await;

        let h = harness(&server, &crawl_config(4)).await;
        h.cache
            .store_browse("a", &browse_body(&["apple", "ant"]))
            .await
            .unwrap();

        let keys = h.cache.browse_keys().await.unwrap();
        let stats = h.scheduler.run(keys).await.unwrap();

        assert_eq!(stats.pages, 1);
        assert_eq!(stats.words_seen, 2);
        assert_eq!(stats.downloaded, 2);
        assert!(h.cache.has_definition("apple").await);
        assert!(h.cache.has_definition("ant").await);
    }

    #[tokio::test]
    async fn cached_definitions_are_never_refetched() {
        let server = MockServer::start().await;
        // expect(1): the second run must not produce a second request
        mount_definition(&server, "apple", 1).await;

        let h = harness(&server, &crawl_config(2)).await;
        h.cache
            .store_browse("a", &browse_body(&["apple"]))
            .await
            .unwrap();

        let keys = h.cache.browse_keys().await.unwrap();
        let first = h.scheduler.run(keys.clone()).await.unwrap();
        assert_eq!(first.downloaded, 1);

        let second = h.scheduler.run(keys).await.unwrap();
        assert_eq!(second.downloaded, 0);
        assert_eq!(second.skipped, 1);
    }

    #[tokio::test]
    async fn duplicate_words_within_a_page_download_once() {
        let server = MockServer::start().await;
        mount_definition(&server, "apple", 1).await;

        let h = harness(&server, &crawl_config(1)).await;
        h.cache
            .store_browse("a", &browse_body(&["apple", "apple", "apple"]))
            .await
            .unwrap();

        let keys = h.cache.browse_keys().await.unwrap();
        let stats = h.scheduler.run(keys).await.unwrap();

        assert_eq!(stats.words_seen, 3);
        assert_eq!(stats.downloaded, 1);
        assert_eq!(stats.skipped, 2);
    }

    #[tokio::test]
    async fn permanent_failures_leave_no_cache_entry() {
        let server = MockServer::start().await;
        mount_definition(&server, "apple", 1).await;
        Mock::given(method("GET"))
            .and(path("/define.php"))
            .and(query_param("term", "gone"))
            .respond_with(ResponseTemplate::new(404))
            .mount(&server)
            .await;

        let h = harness(&server, &crawl_config(2)).await;
        h.cache
            .store_browse("a", &browse_body(&["gone", "apple"]))
            .await
            .unwrap();

        let keys = h.cache.browse_keys().await.unwrap();
        let stats = h.scheduler.run(keys).await.unwrap();

        assert_eq!(stats.downloaded, 1);
        assert_eq!(stats.failed, 1);
        assert!(!h.cache.has_definition("gone").await);
        assert!(h.cache.has_definition("apple").await);
    }

    #[tokio::test]
    async fn bad_cache_keys_are_contained_and_other_items_proceed() {
        let server = MockServer::start().await;
        mount_definition(&server, "apple", 1).await;

        let h = harness(&server, &crawl_config(1)).await;
        h.cache
            .store_browse("a", &browse_body(&["apple"]))
            .await
            .unwrap();

        // "zz" is not hex: the item fails, the worker keeps going
        let keys = vec!["zz".to_string(), browse_key("a")];
        let stats = h.scheduler.run(keys).await.unwrap();

        assert_eq!(stats.item_errors, 1);
        assert_eq!(stats.downloaded, 1);
    }

    #[tokio::test]
    async fn bounded_queue_backpressures_the_producer_and_still_drains() {
        let server = MockServer::start().await;
        // Slow definitions keep the single worker busy, so with five
        // keys and two queue slots the producer must park mid-run
        Mock::given(method("GET"))
            .and(path("/define.php"))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_string("<html>x</html>")
                    .set_delay(Duration::from_millis(100)),
            )
            .expect(5)
            .mount(&server)
            .await;

        let crawl = CrawlConfig {
            workers: 1,
            queue_capacity: Some(2),
            ..CrawlConfig::default()
        };
        let h = harness(&server, &crawl).await;
        for word in ["a", "b", "c", "d", "e"] {
            let term = format!("{word}{word}");
            h.cache
                .store_browse(word, &browse_body(&[term.as_str()]))
                .await
                .unwrap();
        }

        let keys = h.cache.browse_keys().await.unwrap();
        let started = std::time::Instant::now();
        let stats = timeout(Duration::from_secs(10), h.scheduler.run(keys))
            .await
            .expect("run should drain the queue after the producer parks")
            .unwrap();

        // Nothing is dropped while the producer waits for capacity
        assert_eq!(stats.pages, 5);
        assert_eq!(stats.downloaded, 5);
        // Five serialized slow downloads put a floor on the run time
        assert!(started.elapsed() >= Duration::from_millis(400));
    }

    #[tokio::test]
    async fn shutdown_stops_workers_before_the_queue_drains() {
        let server = MockServer::start().await;
        // Slow response so the run is in flight when shutdown lands
        Mock::given(method("GET"))
            .and(path("/define.php"))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_string("<html>x</html>")
                    .set_delay(Duration::from_millis(200)),
            )
            .mount(&server)
            .await;

        let h = harness(&server, &crawl_config(1)).await;
        for word in ["a", "b", "c", "d"] {
            let term = format!("{word}{word}");
            h.cache
                .store_browse(word, &browse_body(&[term.as_str()]))
                .await
                .unwrap();
        }

        let keys = h.cache.browse_keys().await.unwrap();
        let Harness {
            _tmp,
            cache: _,
            scheduler,
            shutdown,
        } = h;
        tokio::spawn(async move {
            tokio::time::sleep(Duration::from_millis(100)).await;
            let _ = shutdown.send(true);
        });

        let stats = timeout(Duration::from_secs(5), scheduler.run(keys))
            .await
            .expect("run should wind down after shutdown")
            .unwrap();

        // The in-flight item finishes; the rest are abandoned
        assert!(stats.pages < 4);
    }
}
