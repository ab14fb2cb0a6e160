//! Staleness policy and refresh coordination for the persisted ranking.
//!
//! The coordinator is the only writer of the snapshot keys. A refresh
//! aggregates into a complete new [`Snapshot`] first and then writes
//! `novelData` and `lastUpdate` in a single `set`, so readers see either
//! the previous snapshot or the new one.
//!
//! Concurrent refreshes are coalesced: while one is running, further
//! callers await the same in-flight future instead of starting their own.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Instant;

use chrono::{DateTime, Utc};
use futures::future::{BoxFuture, FutureExt, Shared};
use serde_json::{json, Value};

use crate::aggregate::AggregationEngine;
use crate::app::{NovelRankError, Result};
use crate::domain::{Item, RawItem, Snapshot, Staleness};
use crate::settings::SettingsResolver;
use crate::store::{keys, KeyValueStore, Record};

type SharedRefresh =
    Shared<BoxFuture<'static, std::result::Result<Arc<Snapshot>, Arc<NovelRankError>>>>;

#[derive(Debug, Clone, PartialEq)]
pub enum RefreshOutcome {
    /// The stored snapshot was fresh; nothing was fetched.
    AlreadyFresh,
    Refreshed(Arc<Snapshot>),
}

#[derive(Clone)]
pub struct RefreshCoordinator {
    inner: Arc<Inner>,
}

struct Inner {
    engine: AggregationEngine,
    settings: Arc<SettingsResolver>,
    store: Arc<dyn KeyValueStore>,
    in_flight: Mutex<Option<SharedRefresh>>,
    /// Number of refreshes that have settled, successful or not.
    settled: AtomicU64,
    /// Error of the most recently settled refresh, `None` if it succeeded.
    last_failure: Mutex<Option<Arc<NovelRankError>>>,
    /// Serializes staleness checks so a burst of `ensure_fresh` calls
    /// triggers one refresh.
    gate: tokio::sync::Mutex<()>,
}

impl RefreshCoordinator {
    pub fn new(
        engine: AggregationEngine,
        settings: Arc<SettingsResolver>,
        store: Arc<dyn KeyValueStore>,
    ) -> Self {
        Self {
            inner: Arc::new(Inner {
                engine,
                settings,
                store,
                in_flight: Mutex::new(None),
                settled: AtomicU64::new(0),
                last_failure: Mutex::new(None),
                gate: tokio::sync::Mutex::new(()),
            }),
        }
    }

    pub fn engine(&self) -> &AggregationEngine {
        &self.inner.engine
    }

    /// The current snapshot, if one has been persisted.
    pub async fn snapshot(&self) -> Result<Option<Snapshot>> {
        self.inner.load_snapshot().await
    }

    pub async fn state(&self) -> Result<Staleness> {
        self.inner.state().await
    }

    /// Refresh only when the snapshot is absent or stale. A caller that
    /// queued behind a refresh that failed gets that failure instead of
    /// starting another one.
    pub async fn ensure_fresh(&self) -> Result<RefreshOutcome> {
        let seen = self.inner.settled.load(Ordering::SeqCst);
        let _gate = self.inner.gate.lock().await;

        if self.inner.settled.load(Ordering::SeqCst) != seen {
            if let Some(failure) = self.inner.last_failure() {
                tracing::debug!("Refresh failed while waiting, not retrying");
                return Err(NovelRankError::Refresh(failure));
            }
        }

        let state = self.inner.state().await?;
        if !state.needs_refresh() {
            tracing::debug!("Snapshot is fresh, skipping refresh");
            return Ok(RefreshOutcome::AlreadyFresh);
        }

        tracing::info!("Snapshot is {}, refreshing", state.label());
        self.force_refresh().await.map(RefreshOutcome::Refreshed)
    }

    /// Aggregate and persist unconditionally, or join the refresh that is
    /// already running. On failure the previous snapshot stays in place.
    pub async fn force_refresh(&self) -> Result<Arc<Snapshot>> {
        let refresh = {
            let mut slot = self.inner.lock_in_flight();
            match slot.as_ref() {
                Some(running) => {
                    tracing::debug!("Joining refresh already in flight");
                    running.clone()
                }
                None => {
                    let inner = self.inner.clone();
                    let refresh = async move {
                        let result = inner.run_refresh().await.map_err(Arc::new);
                        inner.settle(result.as_ref().err().cloned());
                        inner.lock_in_flight().take();
                        result
                    }
                    .boxed()
                    .shared();

                    *slot = Some(refresh.clone());
                    refresh
                }
            }
        };

        refresh.await.map_err(NovelRankError::Refresh)
    }

    /// Drop the persisted snapshot; the state becomes `Absent`.
    pub async fn clear(&self) -> Result<()> {
        self.inner.store.remove(&keys::SNAPSHOT).await?;
        tracing::info!("Cached rankings cleared");
        Ok(())
    }
}

impl Inner {
    fn lock_in_flight(&self) -> MutexGuard<'_, Option<SharedRefresh>> {
        self.in_flight.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn last_failure(&self) -> Option<Arc<NovelRankError>> {
        self.last_failure
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    fn settle(&self, failure: Option<Arc<NovelRankError>>) {
        *self.last_failure.lock().unwrap_or_else(PoisonError::into_inner) = failure;
        self.settled.fetch_add(1, Ordering::SeqCst);
    }

    async fn state(&self) -> Result<Staleness> {
        let interval = self.settings.resolve().await.refresh_interval_hours;
        let last_update = self.load_snapshot().await?.map(|s| s.last_update);
        Ok(Staleness::evaluate(last_update, interval, Utc::now()))
    }

    async fn load_snapshot(&self) -> Result<Option<Snapshot>> {
        let record = self.store.get(&keys::SNAPSHOT).await?;
        Ok(decode_snapshot(&record))
    }

    async fn run_refresh(&self) -> Result<Arc<Snapshot>> {
        let started = Instant::now();
        let settings = self.settings.resolve().await;

        let items = self.engine.aggregate(&settings.enabled_sources).await;
        let snapshot = Snapshot::new(items, Utc::now());

        self.store.set(encode_snapshot(&snapshot)?).await?;

        tracing::info!(
            "Refresh complete: {} novels ({:.1}s)",
            snapshot.items.len(),
            started.elapsed().as_secs_f64()
        );
        Ok(Arc::new(snapshot))
    }
}

/// Both snapshot keys in one record. `lastUpdate` is epoch milliseconds.
pub(crate) fn encode_snapshot(snapshot: &Snapshot) -> Result<Record> {
    let mut record = Record::new();
    record.insert(keys::NOVEL_DATA.into(), serde_json::to_value(&snapshot.items)?);
    record.insert(
        keys::LAST_UPDATE.into(),
        json!(snapshot.last_update.timestamp_millis()),
    );
    Ok(record)
}

/// A record missing either key, or holding garbage, reads as no snapshot.
/// Items are re-normalized so data with string ratings still loads.
pub(crate) fn decode_snapshot(record: &Record) -> Option<Snapshot> {
    let millis = record.get(keys::LAST_UPDATE).and_then(Value::as_i64)?;
    let last_update = DateTime::<Utc>::from_timestamp_millis(millis)?;

    let raw_items: Vec<RawItem> = match record.get(keys::NOVEL_DATA) {
        Some(value) => match serde_json::from_value(value.clone()) {
            Ok(items) => items,
            Err(e) => {
                tracing::warn!("Ignoring unreadable cached rankings: {}", e);
                return None;
            }
        },
        None => return None,
    };

    let items = raw_items
        .into_iter()
        .map(|raw| Item::from_raw(raw, "", ""))
        .collect();

    Some(Snapshot::new(items, last_update))
}
