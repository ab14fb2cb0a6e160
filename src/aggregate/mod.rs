use std::collections::HashSet;
use std::sync::Arc;

use tokio::sync::Semaphore;

use crate::domain::Item;
use crate::provider::{Provider, ProviderRegistry, SourceEntry};

/// Upper bound on the ranked list.
pub const MAX_ITEMS: usize = 50;

pub const DEFAULT_WORKERS: usize = 10;

/// Fans provider calls out over every enabled (source, category) pair and
/// folds the results into one ranked list.
pub struct AggregationEngine {
    registry: ProviderRegistry,
    semaphore: Arc<Semaphore>,
}

impl AggregationEngine {
    pub fn new(registry: ProviderRegistry) -> Self {
        Self::with_workers(registry, DEFAULT_WORKERS)
    }

    pub fn with_workers(registry: ProviderRegistry, workers: usize) -> Self {
        Self {
            registry,
            semaphore: Arc::new(Semaphore::new(workers.max(1))),
        }
    }

    pub fn registry(&self) -> &ProviderRegistry {
        &self.registry
    }

    /// Never fails: a source that errors contributes nothing, and "nothing
    /// at all" is a valid, empty ranking.
    pub async fn aggregate(&self, enabled_sources: &[String]) -> Vec<Item> {
        let partials = self.fetch_all(enabled_sources).await;
        let calls = partials.len();
        let fetched: usize = partials.iter().map(Vec::len).sum();

        let ranked = rank(partials.into_iter().flatten(), MAX_ITEMS);
        tracing::info!(
            "Aggregated {} items from {} provider calls into {} ranked entries",
            fetched,
            calls,
            ranked.len()
        );
        ranked
    }

    fn enabled_entries<'a>(
        &'a self,
        enabled_sources: &'a [String],
    ) -> impl Iterator<Item = &'a SourceEntry> + 'a {
        self.registry
            .sources()
            .filter(move |entry| enabled_sources.iter().any(|s| s == entry.id()))
    }

    /// One partial result per (source, category), in registry order no
    /// matter which call settles first.
    async fn fetch_all(&self, enabled_sources: &[String]) -> Vec<Vec<Item>> {
        for requested in enabled_sources {
            if self.registry.get(requested).is_none() {
                tracing::debug!("Ignoring unknown source {}", requested);
            }
        }

        let mut handles = Vec::new();

        for entry in self.enabled_entries(enabled_sources) {
            for (category, lookup_key) in &entry.categories {
                let provider = entry.provider.clone();
                let semaphore = self.semaphore.clone();
                let category = category.clone();
                let lookup_key = lookup_key.clone();
                let label = format!("{}/{}", entry.id(), category);

                let handle = tokio::spawn(async move {
                    let _permit = semaphore.acquire().await.ok();
                    fetch_category(provider.as_ref(), &category, &lookup_key).await
                });

                handles.push((label, handle));
            }
        }

        let mut partials = Vec::with_capacity(handles.len());
        for (label, handle) in handles {
            match handle.await {
                Ok(items) => partials.push(items),
                Err(e) => {
                    tracing::error!("Provider task {} aborted: {}", label, e);
                    partials.push(Vec::new());
                }
            }
        }

        partials
    }
}

async fn fetch_category(provider: &dyn Provider, category: &str, lookup_key: &str) -> Vec<Item> {
    match provider.fetch(category, lookup_key).await {
        Ok(raw_items) => {
            tracing::debug!(
                "{} returned {} items for {}",
                provider.id(),
                raw_items.len(),
                category
            );
            raw_items
                .into_iter()
                .map(|raw| Item::from_raw(raw, provider.id(), category))
                .collect()
        }
        Err(e) => {
            tracing::warn!(
                "Failed to fetch {} novels from {}: {}",
                category,
                provider.id(),
                e
            );
            Vec::new()
        }
    }
}

/// Dedup on `(title, author)` keeping the first occurrence, stable-sort by
/// rating descending, keep the top `max_items`.
pub fn rank<I>(items: I, max_items: usize) -> Vec<Item>
where
    I: IntoIterator<Item = Item>,
{
    let mut seen: HashSet<(String, String)> = HashSet::new();
    let mut unique: Vec<Item> = items
        .into_iter()
        .filter(|item| {
            let (title, author) = item.dedup_key();
            seen.insert((title.to_owned(), author.to_owned()))
        })
        .collect();

    // `sort_by` is stable, so equal ratings keep their post-dedup order.
    unique.sort_by(|a, b| sort_key(b.rating).total_cmp(&sort_key(a.rating)));
    unique.truncate(max_items);
    unique
}

fn sort_key(rating: f64) -> f64 {
    if rating.is_finite() && rating > 0.0 {
        rating
    } else {
        0.0
    }
}
