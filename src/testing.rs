//! Test doubles for providers and storage.

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::time::Duration;

use async_trait::async_trait;

use crate::app::{NovelRankError, Result};
use crate::domain::RawItem;
use crate::provider::Provider;
use crate::store::{KeyValueStore, Record, SqliteStore};

/// Returns canned items per category and counts calls.
pub struct StaticProvider {
    id: String,
    responses: HashMap<String, Vec<RawItem>>,
    delays: HashMap<String, Duration>,
    default_delay: Option<Duration>,
    calls: AtomicUsize,
}

impl StaticProvider {
    pub fn new(id: &str) -> Self {
        Self {
            id: id.to_string(),
            responses: HashMap::new(),
            delays: HashMap::new(),
            default_delay: None,
            calls: AtomicUsize::new(0),
        }
    }

    pub fn with(mut self, category: &str, items: Vec<RawItem>) -> Self {
        self.responses.insert(category.to_string(), items);
        self
    }

    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.default_delay = Some(delay);
        self
    }

    pub fn with_delay_for(mut self, category: &str, delay: Duration) -> Self {
        self.delays.insert(category.to_string(), delay);
        self
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl Provider for StaticProvider {
    fn id(&self) -> &str {
        &self.id
    }

    async fn fetch(&self, category: &str, _lookup_key: &str) -> Result<Vec<RawItem>> {
        self.calls.fetch_add(1, Ordering::SeqCst);

        if let Some(delay) = self.delays.get(category).copied().or(self.default_delay) {
            tokio::time::sleep(delay).await;
        }

        Ok(self.responses.get(category).cloned().unwrap_or_default())
    }
}

pub struct FailingProvider {
    id: String,
}

impl FailingProvider {
    pub fn new(id: &str) -> Self {
        Self { id: id.to_string() }
    }
}

#[async_trait]
impl Provider for FailingProvider {
    fn id(&self) -> &str {
        &self.id
    }

    async fn fetch(&self, _category: &str, _lookup_key: &str) -> Result<Vec<RawItem>> {
        Err(NovelRankError::Provider {
            source_id: self.id.clone(),
            message: "HTTP error! status: 503".into(),
        })
    }
}

pub struct PanickingProvider;

#[async_trait]
impl Provider for PanickingProvider {
    fn id(&self) -> &str {
        "panicky"
    }

    async fn fetch(&self, _category: &str, _lookup_key: &str) -> Result<Vec<RawItem>> {
        panic!("parser blew up");
    }
}

/// In-memory store whose reads or writes can be switched off.
pub struct FlakyStore {
    inner: SqliteStore,
    fail_reads: AtomicBool,
    fail_writes: AtomicBool,
}

impl FlakyStore {
    pub fn new() -> Self {
        Self {
            inner: SqliteStore::in_memory().expect("in-memory store"),
            fail_reads: AtomicBool::new(false),
            fail_writes: AtomicBool::new(false),
        }
    }

    pub fn fail_reads(&self, fail: bool) {
        self.fail_reads.store(fail, Ordering::SeqCst);
    }

    pub fn fail_writes(&self, fail: bool) {
        self.fail_writes.store(fail, Ordering::SeqCst);
    }
}

impl Default for FlakyStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl KeyValueStore for FlakyStore {
    async fn get(&self, keys: &[&str]) -> Result<Record> {
        if self.fail_reads.load(Ordering::SeqCst) {
            return Err(NovelRankError::Storage("storage unavailable".into()));
        }
        self.inner.get(keys).await
    }

    async fn set(&self, record: Record) -> Result<()> {
        if self.fail_writes.load(Ordering::SeqCst) {
            return Err(NovelRankError::Storage("QUOTA_BYTES quota exceeded".into()));
        }
        self.inner.set(record).await
    }

    async fn remove(&self, keys: &[&str]) -> Result<()> {
        self.inner.remove(keys).await
    }
}

pub fn raw(title: &str, author: &str, rating: f64) -> RawItem {
    RawItem::new(title, author).with_rating(rating)
}
