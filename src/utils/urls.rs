// src/utils/urls.rs

//! Remote URL construction.

use url::Url;

use crate::error::Result;
use crate::models::SiteConfig;

/// Builds the browse and definition URLs for the configured site.
#[derive(Debug, Clone)]
pub struct SiteUrls {
    host: String,
    api_host: String,
    use_api: bool,
}

impl SiteUrls {
    pub fn from_config(site: &SiteConfig) -> Self {
        Self {
            host: site.host.clone(),
            api_host: site.api_host.clone(),
            use_api: site.use_api,
        }
    }

    /// Browse index page for a word.
    pub fn browse(&self, word: &str) -> Result<String> {
        build(&self.host, "browse.php", "word", word)
    }

    /// Definition page for a term, or the API endpoint when toggled.
    pub fn define(&self, term: &str) -> Result<String> {
        if self.use_api {
            build(&self.api_host, "v0/define", "term", term)
        } else {
            build(&self.host, "define.php", "term", term)
        }
    }
}

/// Hosts may carry an explicit scheme (handy for tests); bare hosts get https.
fn build(host: &str, path: &str, key: &str, value: &str) -> Result<String> {
    let base = if host.contains("://") {
        format!("{}/{}", host.trim_end_matches('/'), path)
    } else {
        format!("https://{host}/{path}")
    };
    let mut url = Url::parse(&base)?;
    url.query_pairs_mut().append_pair(key, value);
    Ok(url.into())
}
