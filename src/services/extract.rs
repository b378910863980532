// src/services/extract.rs

//! Term extraction from browse index pages.
//!
//! The site's browse markup is stable: every listed term is an anchor
//! to the definition lookup (`/define.php?term=...`) and the pagination
//! link carries `rel="next"`. The selectors below are deliberately
//! narrow; if the site broadens its markup, these are the two places to
//! change. Entity and percent decoding fall out of the parser stack,
//! so callers always see the literal term strings.

use std::sync::LazyLock;

use scraper::{Html, Selector};
use url::Url;

static DEFINE_LINKS: LazyLock<Selector> = LazyLock::new(|| {
    Selector::parse(r#"a[href*="define.php?term="]"#).expect("static selector")
});

static NEXT_LINK: LazyLock<Selector> =
    LazyLock::new(|| Selector::parse(r#"a[rel="next"]"#).expect("static selector"));

/// All terms linked from a browse page, in document order.
///
/// Duplicates are preserved; deduplication happens at download time via
/// the cache-existence check. A page with no matching anchors (or no
/// parseable markup at all) yields an empty list, never an error.
pub fn browse_words(html: &str) -> Vec<String> {
    let document = Html::parse_document(html);
    document
        .select(&DEFINE_LINKS)
        .filter_map(|anchor| anchor.value().attr("href"))
        .filter_map(|href| query_param(href, "term"))
        .filter(|term| !term.is_empty())
        .collect()
}

/// The word the `rel="next"` pagination anchor points at, if any.
pub fn next_browse_word(html: &str) -> Option<String> {
    let document = Html::parse_document(html);
    let anchor = document.select(&NEXT_LINK).next()?;
    let href = anchor.value().attr("href")?;
    let word = query_param(href, "word")?;
    (!word.is_empty()).then_some(word)
}

/// Decode one query parameter from an absolute or site-relative href.
fn query_param(href: &str, key: &str) -> Option<String> {
    let url = Url::parse(href).ok().or_else(|| {
        Url::parse("https://relative.invalid/")
            .ok()?
            .join(href)
            .ok()
    })?;
    url.query_pairs()
        .find(|(k, _)| k == key)
        .map(|(_, v)| v.into_owned())
}
