use std::sync::Arc;

use async_trait::async_trait;
use scraper::Html;
use url::Url;

use crate::app::Result;
use crate::domain::{RawItem, RawRating};
use crate::provider::{first_attr, first_text, selector, HttpFetcher, Provider};

pub const SOURCE_ID: &str = "douban";

const TAG_BASE: &str = "https://book.douban.com/tag/";

/// Douban tag names per category.
pub const CATEGORIES: [(&str, &str); 5] = [
    ("fantasy", "奇幻"),
    ("scifi", "科幻"),
    ("romance", "言情"),
    ("mystery", "推理"),
    ("historical", "历史"),
];

pub struct DoubanProvider {
    fetcher: Arc<HttpFetcher>,
}

impl DoubanProvider {
    pub fn new(fetcher: Arc<HttpFetcher>) -> Self {
        Self { fetcher }
    }

    /// Extract books from a tag page.
    ///
    /// Douban rates out of 10; ratings are halved so they rank alongside
    /// 5-point sources.
    pub fn parse_tag_page(html: &str, category: &str) -> Result<Vec<RawItem>> {
        let document = Html::parse_document(html);
        let subject = selector(SOURCE_ID, "li.subject-item")?;
        let link = selector(SOURCE_ID, "div.info h2 a")?;
        let publication = selector(SOURCE_ID, "div.info div.pub")?;
        let rating = selector(SOURCE_ID, "span.rating_nums")?;
        let cover = selector(SOURCE_ID, "div.pic img")?;

        let items = document
            .select(&subject)
            .map(|subject| RawItem {
                title: first_attr(&subject, &link, "title").or_else(|| first_text(&subject, &link)),
                author: first_text(&subject, &publication).and_then(|pub_line| author_from_pub(&pub_line)),
                rating: first_text(&subject, &rating).map(|text| to_five_point(&text)),
                category: Some(category.to_string()),
                source: Some(SOURCE_ID.to_string()),
                url: first_attr(&subject, &link, "href"),
                cover: first_attr(&subject, &cover, "src"),
            })
            .collect();

        Ok(items)
    }
}

/// The publication line reads `author / [translator /] publisher / date / price`.
fn author_from_pub(pub_line: &str) -> Option<String> {
    pub_line
        .split('/')
        .next()
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(String::from)
}

fn to_five_point(text: &str) -> RawRating {
    match text.trim().parse::<f64>() {
        Ok(ten_point) => RawRating::Number(ten_point / 2.0),
        Err(_) => RawRating::Text(text.to_string()),
    }
}

#[async_trait]
impl Provider for DoubanProvider {
    fn id(&self) -> &str {
        SOURCE_ID
    }

    async fn fetch(&self, category: &str, lookup_key: &str) -> Result<Vec<RawItem>> {
        let url = Url::parse(TAG_BASE)?.join(lookup_key)?;
        let body = self.fetcher.get_text(&url).await?;
        Self::parse_tag_page(&body, category)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const TAG_SAMPLE: &str = r#"<html><body><ul class="subject-list">
<li class="subject-item">
  <div class="pic"><a href="https://book.douban.com/subject/1/"><img src="https://img.example.com/s1.jpg"></a></div>
  <div class="info">
    <h2><a href="https://book.douban.com/subject/1/" title="三体">三体</a></h2>
    <div class="pub">刘慈欣 / 重庆出版社 / 2008-1 / 23.00</div>
    <div class="star clearfix"><span class="rating_nums">8.9</span></div>
  </div>
</li>
<li class="subject-item">
  <div class="info">
    <h2><a href="https://book.douban.com/subject/2/">
      冰与火之歌
    </a></h2>
    <div class="pub"> [美] 乔治·R·R·马丁 / 谭光磊 / 重庆出版社 </div>
    <div class="star clearfix"><span class="rating_nums"></span></div>
  </div>
</li>
</ul></body></html>"#;

    #[test]
    fn test_parse_tag_page() {
        let items = DoubanProvider::parse_tag_page(TAG_SAMPLE, "scifi").unwrap();
        assert_eq!(items.len(), 2);

        assert_eq!(items[0].title.as_deref(), Some("三体"));
        assert_eq!(items[0].author.as_deref(), Some("刘慈欣"));
        assert_eq!(items[0].rating, Some(RawRating::Number(4.45)));
        assert_eq!(items[0].url.as_deref(), Some("https://book.douban.com/subject/1/"));
        assert_eq!(items[0].cover.as_deref(), Some("https://img.example.com/s1.jpg"));
    }

    #[test]
    fn test_title_falls_back_to_link_text() {
        let items = DoubanProvider::parse_tag_page(TAG_SAMPLE, "fantasy").unwrap();
        assert_eq!(items[1].title.as_deref(), Some("冰与火之歌"));
        assert_eq!(items[1].author.as_deref(), Some("[美] 乔治·R·R·马丁"));
        // Unrated books on Douban have an empty rating span.
        assert_eq!(items[1].rating, None);
        assert_eq!(items[1].cover, None);
    }

    #[test]
    fn test_author_from_pub() {
        assert_eq!(author_from_pub("a / b / c"), Some("a".into()));
        assert_eq!(author_from_pub(" / b"), None);
    }
}
