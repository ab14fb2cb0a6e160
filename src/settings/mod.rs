//! Resolution of user settings against their defaults.
//!
//! Settings are stored as loose key/value pairs (see [`keys`]), so any of
//! them can be missing or of the wrong type. Resolution never fails; every
//! field that cannot be read falls back to its default.

use std::sync::Arc;

use serde_json::{json, Value};

use crate::app::{NovelRankError, Result};
use crate::domain::{DisplayFlags, Settings, ALL_CATEGORIES, DEFAULT_REFRESH_INTERVAL_HOURS};
use crate::store::{keys, KeyValueStore, Record};

pub struct SettingsResolver {
    store: Arc<dyn KeyValueStore>,
    default_sources: Vec<String>,
}

impl SettingsResolver {
    /// `default_sources` is what "all sources enabled" means, normally the
    /// registry's source ids.
    pub fn new(store: Arc<dyn KeyValueStore>, default_sources: Vec<String>) -> Self {
        Self {
            store,
            default_sources,
        }
    }

    pub fn defaults(&self) -> Settings {
        Settings::with_sources(self.default_sources.iter().cloned())
    }

    pub async fn resolve(&self) -> Settings {
        match self.store.get(&keys::SETTINGS).await {
            Ok(record) => self.resolve_record(&record),
            Err(e) => {
                tracing::warn!("Failed to read settings, using defaults: {}", e);
                self.defaults()
            }
        }
    }

    pub fn resolve_record(&self, record: &Record) -> Settings {
        let defaults = self.defaults();

        let enabled_sources = record
            .get(keys::DATA_SOURCES)
            .and_then(Value::as_array)
            .map(|sources| {
                sources
                    .iter()
                    .filter_map(Value::as_str)
                    .map(String::from)
                    .collect::<Vec<_>>()
            })
            .filter(|sources| !sources.is_empty())
            .unwrap_or(defaults.enabled_sources);

        Settings {
            enabled_sources,
            refresh_interval_hours: record
                .get(keys::UPDATE_INTERVAL)
                .and_then(parse_interval_hours)
                .unwrap_or(DEFAULT_REFRESH_INTERVAL_HOURS),
            default_category: category(record, keys::DEFAULT_CATEGORY),
            last_category: category(record, keys::LAST_CATEGORY),
            display: DisplayFlags {
                show_rating: flag(record, keys::SHOW_RATING),
                show_author: flag(record, keys::SHOW_AUTHOR),
                show_category: flag(record, keys::SHOW_CATEGORY),
            },
        }
    }

    /// Replace the stored settings. At least one source and a non-zero
    /// interval are required.
    pub async fn save(&self, settings: &Settings) -> Result<()> {
        if settings.enabled_sources.is_empty() {
            return Err(NovelRankError::InvalidSettings(
                "select at least one data source".into(),
            ));
        }
        if settings.refresh_interval_hours == 0 {
            return Err(NovelRankError::InvalidSettings(
                "refresh interval must be at least one hour".into(),
            ));
        }

        let mut record = Record::new();
        record.insert(keys::DATA_SOURCES.into(), json!(settings.enabled_sources));
        record.insert(keys::UPDATE_INTERVAL.into(), json!(settings.refresh_interval_hours));
        record.insert(keys::SHOW_RATING.into(), json!(settings.display.show_rating));
        record.insert(keys::SHOW_AUTHOR.into(), json!(settings.display.show_author));
        record.insert(keys::SHOW_CATEGORY.into(), json!(settings.display.show_category));
        record.insert(keys::DEFAULT_CATEGORY.into(), json!(settings.default_category));
        record.insert(keys::LAST_CATEGORY.into(), json!(settings.last_category));

        self.store.set(record).await?;
        tracing::info!("Settings saved");
        Ok(())
    }

    /// Persist the category filter last chosen by the user.
    pub async fn remember_category(&self, category: &str) -> Result<()> {
        let mut record = Record::new();
        record.insert(keys::LAST_CATEGORY.into(), json!(category));
        self.store.set(record).await
    }
}

/// Accepts a positive number or a numeric string such as `"24"`.
/// Fractional hours are truncated either way.
fn parse_interval_hours(value: &Value) -> Option<u64> {
    let hours = match value {
        Value::Number(n) => n.as_u64().or_else(|| n.as_f64().and_then(whole_hours)),
        Value::String(s) => {
            let s = s.trim();
            s.parse::<u64>()
                .ok()
                .or_else(|| s.parse::<f64>().ok().and_then(whole_hours))
        }
        _ => None,
    };
    hours.filter(|h| *h > 0)
}

fn whole_hours(hours: f64) -> Option<u64> {
    Some(hours)
        .filter(|f| f.is_finite() && *f >= 1.0)
        .map(|f| f as u64)
}

/// Only an explicit `false` turns a display flag off.
fn flag(record: &Record, key: &str) -> bool {
    !matches!(record.get(key), Some(Value::Bool(false)))
}

fn category(record: &Record, key: &str) -> String {
    record
        .get(key)
        .and_then(Value::as_str)
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .unwrap_or(ALL_CATEGORIES)
        .to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::SqliteStore;
    use crate::testing::FlakyStore;

    fn resolver() -> (Arc<SqliteStore>, SettingsResolver) {
        let store = Arc::new(SqliteStore::in_memory().unwrap());
        let resolver = SettingsResolver::new(
            store.clone(),
            vec!["goodreads".to_string(), "douban".to_string()],
        );
        (store, resolver)
    }

    fn record(value: Value) -> Record {
        value.as_object().cloned().unwrap()
    }

    #[tokio::test]
    async fn test_defaults_when_nothing_stored() {
        let (_, resolver) = resolver();
        let settings = resolver.resolve().await;

        assert_eq!(settings.enabled_sources, vec!["goodreads", "douban"]);
        assert_eq!(settings.refresh_interval_hours, 24);
        assert_eq!(settings.default_category, "all");
        assert_eq!(settings.last_category, "all");
        assert_eq!(settings.display, DisplayFlags::default());
    }

    #[tokio::test]
    async fn test_interval_stored_as_string() {
        let (store, resolver) = resolver();
        store
            .set(record(json!({ "updateInterval": "12", "dataSources": ["douban"] })))
            .await
            .unwrap();

        let settings = resolver.resolve().await;
        assert_eq!(settings.refresh_interval_hours, 12);
        assert_eq!(settings.enabled_sources, vec!["douban"]);
    }

    #[test]
    fn test_malformed_fields_fall_back() {
        let (_, resolver) = resolver();
        let settings = resolver.resolve_record(&record(json!({
            "dataSources": "goodreads",
            "updateInterval": "soon",
            "showRating": "no",
            "showAuthor": false,
            "showCategory": null,
            "defaultCategory": 7,
            "lastCategory": "  "
        })));

        assert_eq!(settings.enabled_sources, vec!["goodreads", "douban"]);
        assert_eq!(settings.refresh_interval_hours, 24);
        assert!(settings.display.show_rating);
        assert!(!settings.display.show_author);
        assert!(settings.display.show_category);
        assert_eq!(settings.default_category, "all");
        assert_eq!(settings.last_category, "all");
    }

    #[test]
    fn test_interval_parsing() {
        assert_eq!(parse_interval_hours(&json!(6)), Some(6));
        assert_eq!(parse_interval_hours(&json!(1.5)), Some(1));
        assert_eq!(parse_interval_hours(&json!(" 48 ")), Some(48));
        assert_eq!(parse_interval_hours(&json!(0)), None);
        assert_eq!(parse_interval_hours(&json!(-3)), None);
        assert_eq!(parse_interval_hours(&json!(0.5)), None);
        assert_eq!(parse_interval_hours(&json!(true)), None);
    }

    #[test]
    fn test_fractional_interval_string_matches_number() {
        assert_eq!(parse_interval_hours(&json!("1.5")), Some(1));
        assert_eq!(
            parse_interval_hours(&json!("1.5")),
            parse_interval_hours(&json!(1.5))
        );
        assert_eq!(parse_interval_hours(&json!("0.5")), None);
        assert_eq!(parse_interval_hours(&json!("NaN")), None);
        assert_eq!(parse_interval_hours(&json!("soon")), None);
    }

    #[tokio::test]
    async fn test_empty_source_list_uses_defaults() {
        let (_, resolver) = resolver();
        let settings = resolver.resolve_record(&record(json!({ "dataSources": [] })));
        assert_eq!(settings.enabled_sources, vec!["goodreads", "douban"]);
    }

    #[tokio::test]
    async fn test_save_and_resolve() {
        let (_, resolver) = resolver();
        let mut settings = resolver.defaults();
        settings.enabled_sources = vec!["douban".into()];
        settings.refresh_interval_hours = 6;
        settings.default_category = "mystery".into();
        settings.display.show_rating = false;

        resolver.save(&settings).await.unwrap();
        assert_eq!(resolver.resolve().await, settings);
    }

    #[tokio::test]
    async fn test_save_rejects_invalid() {
        let (_, resolver) = resolver();

        let mut no_sources = resolver.defaults();
        no_sources.enabled_sources.clear();
        assert!(matches!(
            resolver.save(&no_sources).await,
            Err(NovelRankError::InvalidSettings(_))
        ));

        let mut zero_interval = resolver.defaults();
        zero_interval.refresh_interval_hours = 0;
        assert!(resolver.save(&zero_interval).await.is_err());
    }

    #[tokio::test]
    async fn test_remember_category() {
        let (_, resolver) = resolver();
        resolver.remember_category("romance").await.unwrap();

        let settings = resolver.resolve().await;
        assert_eq!(settings.last_category, "romance");
        assert_eq!(settings.default_category, "all");
    }

    #[tokio::test]
    async fn test_unreadable_storage_yields_defaults() {
        let store = Arc::new(FlakyStore::new());
        store.fail_reads(true);
        let resolver = SettingsResolver::new(store, vec!["goodreads".into()]);

        let settings = resolver.resolve().await;
        assert_eq!(settings.enabled_sources, vec!["goodreads"]);
        assert_eq!(settings.refresh_interval_hours, 24);
    }
}
