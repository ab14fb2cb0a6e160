pub mod sqlite;

use async_trait::async_trait;
use serde_json::{Map, Value};

use crate::app::Result;

pub use sqlite::SqliteStore;

/// A set of key/value pairs read or written in one call.
pub type Record = Map<String, Value>;

/// Storage keys shared by the coordinator and the settings resolver.
pub mod keys {
    pub const NOVEL_DATA: &str = "novelData";
    pub const LAST_UPDATE: &str = "lastUpdate";

    pub const DATA_SOURCES: &str = "dataSources";
    pub const UPDATE_INTERVAL: &str = "updateInterval";
    pub const SHOW_RATING: &str = "showRating";
    pub const SHOW_AUTHOR: &str = "showAuthor";
    pub const SHOW_CATEGORY: &str = "showCategory";
    pub const DEFAULT_CATEGORY: &str = "defaultCategory";
    pub const LAST_CATEGORY: &str = "lastCategory";

    pub const SNAPSHOT: [&str; 2] = [NOVEL_DATA, LAST_UPDATE];

    pub const SETTINGS: [&str; 7] = [
        DATA_SOURCES,
        UPDATE_INTERVAL,
        SHOW_RATING,
        SHOW_AUTHOR,
        SHOW_CATEGORY,
        DEFAULT_CATEGORY,
        LAST_CATEGORY,
    ];
}

/// Asynchronous key/value storage.
///
/// `set` must apply every pair of the record or none of them.
#[async_trait]
pub trait KeyValueStore: Send + Sync {
    /// Returns the stored pairs for `keys`; missing keys are simply absent.
    async fn get(&self, keys: &[&str]) -> Result<Record>;

    async fn set(&self, record: Record) -> Result<()>;

    async fn remove(&self, keys: &[&str]) -> Result<()>;
}
