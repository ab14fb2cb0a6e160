pub mod douban;
pub mod goodreads;
pub mod http;
pub mod registry;

use async_trait::async_trait;
use scraper::{ElementRef, Selector};

use crate::app::{NovelRankError, Result};
use crate::domain::RawItem;

pub use douban::DoubanProvider;
pub use goodreads::GoodreadsProvider;
pub use http::HttpFetcher;
pub use registry::{ProviderRegistry, SourceEntry};

/// One book-listing site.
///
/// Implementations may fail freely; the aggregation engine turns any error
/// into an empty contribution.
#[async_trait]
pub trait Provider: Send + Sync {
    /// Source identifier, e.g. `"goodreads"`.
    fn id(&self) -> &str;

    /// Fetch the ranked list for `category`, addressed on the site by `lookup_key`.
    async fn fetch(&self, category: &str, lookup_key: &str) -> Result<Vec<RawItem>>;
}

pub(crate) fn selector(source_id: &str, css: &str) -> Result<Selector> {
    Selector::parse(css).map_err(|e| NovelRankError::Provider {
        source_id: source_id.to_string(),
        message: format!("bad selector {:?}: {}", css, e),
    })
}

/// Whitespace-collapsed text content of the first match.
pub(crate) fn first_text(element: &ElementRef<'_>, selector: &Selector) -> Option<String> {
    element
        .select(selector)
        .next()
        .map(|e| e.text().collect::<Vec<_>>().join(" "))
        .map(|s| s.split_whitespace().collect::<Vec<_>>().join(" "))
        .filter(|s| !s.is_empty())
}

pub(crate) fn first_attr(element: &ElementRef<'_>, selector: &Selector, attr: &str) -> Option<String> {
    element
        .select(selector)
        .next()
        .and_then(|e| e.value().attr(attr))
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
}
