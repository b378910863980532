// src/services/walker.rs

//! Sequential pagination walk over the browse index.
//!
//! Starting from a seed word, each step loads that word's browse page
//! (from cache when present, over the network otherwise, persisting
//! the raw text before parsing) and follows the `rel="next"` link to
//! the next word. The walk ends when no next link remains, when a
//! browse page fails permanently (there is no way to learn the next
//! word without the page), or when shutdown is signaled.

use std::sync::Arc;

use crate::error::Result;
use crate::models::WalkStats;
use crate::services::extract;
use crate::services::fetcher::{FetchOutcome, Fetcher};
use crate::storage::PageCache;
use crate::utils::urls::SiteUrls;

/// What a single walk step produced.
enum Step {
    Page(String),
    Failed,
    Cancelled,
}

/// Walks the browse index, populating the browse cache.
pub struct PaginationWalker {
    fetcher: Arc<Fetcher>,
    cache: Arc<PageCache>,
    urls: SiteUrls,
}

impl PaginationWalker {
    pub fn new(fetcher: Arc<Fetcher>, cache: Arc<PageCache>, urls: SiteUrls) -> Self {
        Self {
            fetcher,
            cache,
            urls,
        }
    }

    /// Walk from the seed word until the chain ends.
    pub async fn run(&self, seed: &str) -> Result<WalkStats> {
        let mut stats = WalkStats::default();
        let mut current = Some(seed.to_string());

        while let Some(word) = current.take() {
            let text = match self.browse_page(&word, &mut stats).await? {
                Step::Page(text) => text,
                Step::Failed => {
                    stats.stopped_on_failure = true;
                    break;
                }
                Step::Cancelled => break,
            };
            stats.pages_visited += 1;

            current = extract::next_browse_word(&text);
            if current.is_none() {
                log::info!(
                    "pagination complete at '{}' after {} pages",
                    word,
                    stats.pages_visited
                );
            }
        }

        Ok(stats)
    }

    /// Cache-first load of one browse page.
    async fn browse_page(&self, word: &str, stats: &mut WalkStats) -> Result<Step> {
        if let Some(text) = self.cache.load_browse(word).await? {
            log::debug!("loaded browse page for '{word}' from cache");
            stats.pages_cached += 1;
            return Ok(Step::Page(text));
        }

        let url = self.urls.browse(word)?;
        match self.fetcher.fetch(&url).await {
            FetchOutcome::Success(text) => {
                self.cache.store_browse(word, &text).await?;
                log::info!("saved browse page for '{word}'");
                stats.pages_fetched += 1;
                Ok(Step::Page(text))
            }
            FetchOutcome::Permanent { status } => {
                log::warn!(
                    "browse page for '{word}' failed permanently (status {status:?}); \
                     stopping the walk"
                );
                Ok(Step::Failed)
            }
            FetchOutcome::Cancelled => Ok(Step::Cancelled),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;
    use tokio::sync::watch;
    use wiremock::matchers::{method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    use crate::services::fetcher::RetryPolicy;

    fn browse_body(words: &[&str], next: Option<&str>) -> String {
        let mut body = String::from("<html><body><ul>");
        for word in words {
            body.push_str(&format!(
                r#"<li><a href="/define.php?term={word}">{word}</a></li>"#
            ));
        }
        body.push_str("</ul>");
        if let Some(next) = next {
            body.push_str(&format!(r#"<a rel="next" href="/browse.php?word={next}">next</a>"#));
        }
        body.push_str("</body></html>");
        body
    }

    async fn walker(server: &MockServer, tmp: &TempDir) -> (PaginationWalker, Arc<PageCache>) {
        let cache = Arc::new(PageCache::new(tmp.path()));
        cache.ensure_layout().await.unwrap();
        let (_tx, rx) = watch::channel(false);
        let fetcher = Arc::new(Fetcher::new(
            reqwest::Client::new(),
            RetryPolicy::immediate(),
            rx,
        ));
        let urls = SiteUrls::from_config(&crate::models::SiteConfig {
            host: server.uri(),
            ..crate::models::SiteConfig::default()
        });
        (
            PaginationWalker::new(fetcher, Arc::clone(&cache), urls),
            cache,
        )
    }

    async fn mount_page(server: &MockServer, word: &str, body: String, expect: u64) {
        Mock::given(method("GET"))
            .and(path("/browse.php"))
            .and(query_param("word", word))
            .respond_with(ResponseTemplate::new(200).set_body_string(body))
            .expect(expect)
            .mount(server)
            .await;
    }

    #[tokio::test]
    async fn walks_the_next_chain_and_caches_every_page() {
        let server = MockServer::start().await;
        mount_page(&server, "a", browse_body(&["apple", "ant"], Some("b")), 1).await;
        mount_page(&server, "b", browse_body(&["bat"], None), 1).await;

        let tmp = TempDir::new().unwrap();
        let (walker, cache) = walker(&server, &tmp).await;
        let stats = walker.run("a").await.unwrap();

        assert_eq!(stats.pages_visited, 2);
        assert_eq!(stats.pages_fetched, 2);
        assert_eq!(stats.pages_cached, 0);
        assert!(!stats.stopped_on_failure);

        // hex("a") and hex("b")
        assert!(cache.browse_dir().join("61").is_file());
        assert!(cache.browse_dir().join("62").is_file());
    }

    #[tokio::test]
    async fn rerun_serves_pages_from_cache_without_refetching() {
        let server = MockServer::start().await;
        // expect(1) makes a second network hit fail verification
        mount_page(&server, "a", browse_body(&[], Some("b")), 1).await;
        mount_page(&server, "b", browse_body(&[], None), 1).await;

        let tmp = TempDir::new().unwrap();
        let (walker, _cache) = walker(&server, &tmp).await;

        walker.run("a").await.unwrap();
        let stats = walker.run("a").await.unwrap();

        assert_eq!(stats.pages_visited, 2);
        assert_eq!(stats.pages_cached, 2);
        assert_eq!(stats.pages_fetched, 0);
    }

    #[tokio::test]
    async fn stops_after_a_page_without_a_next_link() {
        let server = MockServer::start().await;
        mount_page(&server, "a", browse_body(&[], Some("b")), 1).await;
        mount_page(&server, "b", browse_body(&[], Some("c")), 1).await;
        mount_page(&server, "c", browse_body(&[], None), 1).await;

        let tmp = TempDir::new().unwrap();
        let (walker, _cache) = walker(&server, &tmp).await;
        let stats = walker.run("a").await.unwrap();

        assert_eq!(stats.pages_visited, 3);
    }

    #[tokio::test]
    async fn permanent_failure_stops_the_walk() {
        let server = MockServer::start().await;
        mount_page(&server, "a", browse_body(&[], Some("b")), 1).await;
        Mock::given(method("GET"))
            .and(path("/browse.php"))
            .and(query_param("word", "b"))
            .respond_with(ResponseTemplate::new(404))
            .mount(&server)
            .await;

        let tmp = TempDir::new().unwrap();
        let (walker, cache) = walker(&server, &tmp).await;
        let stats = walker.run("a").await.unwrap();

        assert_eq!(stats.pages_visited, 1);
        assert!(stats.stopped_on_failure);
        // No cache entry for the failed page: a later run may retry it
        assert!(!cache.browse_dir().join("62").exists());
    }
}
