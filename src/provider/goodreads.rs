use std::sync::Arc;

use async_trait::async_trait;
use scraper::Html;
use url::Url;

use crate::app::Result;
use crate::domain::{RawItem, RawRating};
use crate::provider::{first_attr, first_text, selector, HttpFetcher, Provider};

pub const SOURCE_ID: &str = "goodreads";

const SITE_ROOT: &str = "https://www.goodreads.com/";
const LIST_BASE: &str = "https://www.goodreads.com/list/show/";

/// Listopia list ids per category.
pub const CATEGORIES: [(&str, &str); 5] = [
    ("fantasy", "1.Best_Fantasy"),
    ("scifi", "3.Best_Science_Fiction"),
    ("romance", "45.Best_Romance_Novels"),
    ("mystery", "11.Best_Crime_Mystery_Books"),
    ("historical", "15.Best_Historical_Fiction"),
];

pub struct GoodreadsProvider {
    fetcher: Arc<HttpFetcher>,
}

impl GoodreadsProvider {
    pub fn new(fetcher: Arc<HttpFetcher>) -> Self {
        Self { fetcher }
    }

    /// Extract books from a Listopia page. Ratings are on a 5-point scale.
    pub fn parse_list(html: &str, category: &str) -> Result<Vec<RawItem>> {
        let document = Html::parse_document(html);
        let row = selector(SOURCE_ID, "tr[itemtype$='schema.org/Book']")?;
        let title = selector(SOURCE_ID, "a.bookTitle")?;
        let author = selector(SOURCE_ID, "a.authorName")?;
        let rating = selector(SOURCE_ID, "span.minirating")?;
        let cover = selector(SOURCE_ID, "img.bookCover")?;
        let root = Url::parse(SITE_ROOT)?;

        let items = document
            .select(&row)
            .map(|row| RawItem {
                title: first_text(&row, &title),
                author: first_text(&row, &author),
                rating: first_text(&row, &rating).map(|text| parse_minirating(&text)),
                category: Some(category.to_string()),
                source: Some(SOURCE_ID.to_string()),
                url: first_attr(&row, &title, "href")
                    .and_then(|href| root.join(&href).ok())
                    .map(String::from),
                cover: first_attr(&row, &cover, "src"),
            })
            .collect();

        Ok(items)
    }
}

/// `"4.26 avg rating — 1,234 ratings"` (sometimes prefixed with
/// `"really liked it"`): the first token that reads as a number.
fn parse_minirating(text: &str) -> RawRating {
    text.split_whitespace()
        .find_map(|token| token.parse::<f64>().ok())
        .map(RawRating::Number)
        .unwrap_or_else(|| RawRating::Text(text.to_string()))
}

#[async_trait]
impl Provider for GoodreadsProvider {
    fn id(&self) -> &str {
        SOURCE_ID
    }

    async fn fetch(&self, category: &str, lookup_key: &str) -> Result<Vec<RawItem>> {
        let url = Url::parse(LIST_BASE)?.join(lookup_key)?;
        let body = self.fetcher.get_text(&url).await?;
        Self::parse_list(&body, category)
    }
}
