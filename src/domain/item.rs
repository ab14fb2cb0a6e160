use serde::{Deserialize, Serialize};

/// A rating exactly as a provider produced it. Pages give us text such as
/// `"4.32"` as often as numbers.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum RawRating {
    Number(f64),
    Text(String),
}

impl From<f64> for RawRating {
    fn from(value: f64) -> Self {
        RawRating::Number(value)
    }
}

impl From<&str> for RawRating {
    fn from(value: &str) -> Self {
        RawRating::Text(value.to_string())
    }
}

/// An unvalidated record returned by a provider.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RawItem {
    pub title: Option<String>,
    pub author: Option<String>,
    pub rating: Option<RawRating>,
    pub category: Option<String>,
    pub source: Option<String>,
    pub url: Option<String>,
    pub cover: Option<String>,
}

impl RawItem {
    pub fn new(title: impl Into<String>, author: impl Into<String>) -> Self {
        Self {
            title: Some(title.into()),
            author: Some(author.into()),
            ..Default::default()
        }
    }

    pub fn with_rating(mut self, rating: impl Into<RawRating>) -> Self {
        self.rating = Some(rating.into());
        self
    }
}

/// A ranked novel entry.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Item {
    pub title: String,
    pub author: String,
    /// Always finite and non-negative.
    pub rating: f64,
    pub category: String,
    pub source: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cover: Option<String>,
}

impl Item {
    /// Normalize a provider record. Bad fields are defaulted, never dropped:
    /// missing strings become empty, a bad rating becomes `0.0`, and an
    /// empty category or source is taken from the call that produced it.
    pub fn from_raw(raw: RawItem, source: &str, category: &str) -> Self {
        let rating = Self::coerce_rating(raw.rating.as_ref());

        Self {
            title: raw.title.unwrap_or_default(),
            author: raw.author.unwrap_or_default(),
            rating,
            category: non_empty(raw.category).unwrap_or_else(|| category.to_string()),
            source: non_empty(raw.source).unwrap_or_else(|| source.to_string()),
            url: non_empty(raw.url),
            cover: non_empty(raw.cover),
        }
    }

    /// Coerce a raw rating to a sortable number. Never returns `NaN`.
    pub fn coerce_rating(raw: Option<&RawRating>) -> f64 {
        let value = match raw {
            Some(RawRating::Number(n)) => Some(*n),
            Some(RawRating::Text(s)) => s.trim().parse::<f64>().ok(),
            None => None,
        };

        match value {
            Some(v) if v.is_finite() && v >= 0.0 => v,
            _ => 0.0,
        }
    }

    /// Identity used for deduplication.
    pub fn dedup_key(&self) -> (&str, &str) {
        (&self.title, &self.author)
    }
}

fn non_empty(value: Option<String>) -> Option<String> {
    value.filter(|s| !s.trim().is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_coerce_numeric_rating() {
        assert_eq!(Item::coerce_rating(Some(&RawRating::Number(4.5))), 4.5);
    }

    #[test]
    fn test_coerce_text_rating() {
        assert_eq!(Item::coerce_rating(Some(&RawRating::from(" 4.3 "))), 4.3);
    }

    #[test]
    fn test_coerce_unparseable_rating_is_zero() {
        assert_eq!(Item::coerce_rating(Some(&RawRating::from("n/a"))), 0.0);
        assert_eq!(Item::coerce_rating(Some(&RawRating::from(""))), 0.0);
        assert_eq!(Item::coerce_rating(None), 0.0);
    }

    #[test]
    fn test_coerce_never_yields_nan() {
        for raw in [
            RawRating::Number(f64::NAN),
            RawRating::Number(f64::INFINITY),
            RawRating::Number(-1.0),
            RawRating::from("NaN"),
            RawRating::from("inf"),
        ] {
            let value = Item::coerce_rating(Some(&raw));
            assert_eq!(value, 0.0, "{:?}", raw);
        }
    }

    #[test]
    fn test_from_raw_defaults_missing_fields() {
        let item = Item::from_raw(RawItem::default(), "goodreads", "fantasy");
        assert_eq!(item.title, "");
        assert_eq!(item.author, "");
        assert_eq!(item.rating, 0.0);
        assert_eq!(item.category, "fantasy");
        assert_eq!(item.source, "goodreads");
        assert_eq!(item.url, None);
        assert_eq!(item.cover, None);
    }

    #[test]
    fn test_from_raw_keeps_provider_category() {
        let mut raw = RawItem::new("Dune", "Frank Herbert").with_rating("4.5");
        raw.category = Some("scifi".into());
        raw.url = Some("  ".into());

        let item = Item::from_raw(raw, "douban", "fantasy");
        assert_eq!(item.category, "scifi");
        assert_eq!(item.rating, 4.5);
        assert_eq!(item.url, None);
    }

    #[test]
    fn test_raw_rating_deserializes_number_or_string() {
        let raw: RawItem = serde_json::from_str(r#"{"title":"A","rating":"4.1"}"#).unwrap();
        assert_eq!(raw.rating, Some(RawRating::Text("4.1".into())));

        let raw: RawItem = serde_json::from_str(r#"{"title":"A","rating":3.9}"#).unwrap();
        assert_eq!(raw.rating, Some(RawRating::Number(3.9)));
    }
}
