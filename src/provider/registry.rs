use std::sync::Arc;

use crate::provider::{douban, goodreads, DoubanProvider, GoodreadsProvider, HttpFetcher, Provider};

/// A registered source: its adapter and the categories it serves, each with
/// the site-specific key used to look it up.
#[derive(Clone)]
pub struct SourceEntry {
    pub provider: Arc<dyn Provider>,
    pub categories: Vec<(String, String)>,
}

impl SourceEntry {
    pub fn id(&self) -> &str {
        self.provider.id()
    }
}

/// Sources in declaration order. That order fixes merge precedence: when two
/// sources list the same novel, the one registered first wins.
#[derive(Clone, Default)]
pub struct ProviderRegistry {
    sources: Vec<SourceEntry>,
}

impl ProviderRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Goodreads then Douban, sharing one HTTP client.
    pub fn builtin(fetcher: Arc<HttpFetcher>) -> Self {
        let mut registry = Self::new();
        registry.register(
            Arc::new(GoodreadsProvider::new(fetcher.clone())),
            &goodreads::CATEGORIES,
        );
        registry.register(Arc::new(DoubanProvider::new(fetcher)), &douban::CATEGORIES);
        registry
    }

    /// Add a source, or replace the entry with the same id in place.
    pub fn register(&mut self, provider: Arc<dyn Provider>, categories: &[(&str, &str)]) {
        let entry = SourceEntry {
            provider,
            categories: categories
                .iter()
                .map(|(category, key)| (category.to_string(), key.to_string()))
                .collect(),
        };

        match self.sources.iter_mut().find(|s| s.id() == entry.id()) {
            Some(existing) => *existing = entry,
            None => self.sources.push(entry),
        }
    }

    pub fn get(&self, id: &str) -> Option<&SourceEntry> {
        self.sources.iter().find(|s| s.id() == id)
    }

    pub fn sources(&self) -> impl Iterator<Item = &SourceEntry> {
        self.sources.iter()
    }

    pub fn source_ids(&self) -> Vec<String> {
        self.sources.iter().map(|s| s.id().to_string()).collect()
    }

    /// Every category any source serves, in first-declared order.
    pub fn categories(&self) -> Vec<String> {
        let mut categories: Vec<String> = Vec::new();
        for (category, _) in self.sources.iter().flat_map(|s| s.categories.iter()) {
            if !categories.contains(category) {
                categories.push(category.clone());
            }
        }
        categories
    }
}
