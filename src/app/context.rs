use std::path::PathBuf;
use std::sync::Arc;

use serde::Serialize;

use crate::aggregate::AggregationEngine;
use crate::app::error::{NovelRankError, Result};
use crate::config::Config;
use crate::domain::Snapshot;
use crate::provider::{HttpFetcher, ProviderRegistry};
use crate::refresh::{RefreshCoordinator, RefreshOutcome};
use crate::settings::SettingsResolver;
use crate::store::{KeyValueStore, SqliteStore};

/// Result of a refresh request as reported to a front end.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RefreshResponse {
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

pub struct AppContext {
    pub config: Config,
    pub store: Arc<dyn KeyValueStore>,
    pub settings: Arc<SettingsResolver>,
    pub coordinator: RefreshCoordinator,
}

impl AppContext {
    pub fn new(config: Config, db_path: Option<PathBuf>) -> Result<Self> {
        let db_path = match db_path {
            Some(p) => p,
            None => Self::default_db_path()?,
        };

        let store: Arc<dyn KeyValueStore> = Arc::new(SqliteStore::new(&db_path)?);
        let fetcher = Arc::new(HttpFetcher::new(&config.fetch)?);
        Ok(Self::with_parts(config, store, ProviderRegistry::builtin(fetcher)))
    }

    /// Wire the components around an existing store and registry.
    pub fn with_parts(
        config: Config,
        store: Arc<dyn KeyValueStore>,
        registry: ProviderRegistry,
    ) -> Self {
        let settings = Arc::new(SettingsResolver::new(store.clone(), registry.source_ids()));
        let engine = AggregationEngine::with_workers(registry, config.fetch.workers);
        let coordinator = RefreshCoordinator::new(engine, settings.clone(), store.clone());

        Self {
            config,
            store,
            settings,
            coordinator,
        }
    }

    pub fn registry(&self) -> &ProviderRegistry {
        self.coordinator.engine().registry()
    }

    pub async fn snapshot(&self) -> Result<Option<Snapshot>> {
        self.coordinator.snapshot().await
    }

    /// `force` bypasses the staleness check. Failures are reported in the
    /// response rather than returned.
    pub async fn request_refresh(&self, force: bool) -> RefreshResponse {
        let result = if force {
            self.coordinator
                .force_refresh()
                .await
                .map(RefreshOutcome::Refreshed)
        } else {
            self.coordinator.ensure_fresh().await
        };

        match result {
            Ok(_) => RefreshResponse {
                success: true,
                error: None,
            },
            Err(e) => {
                tracing::error!("Refresh failed: {}", e);
                RefreshResponse {
                    success: false,
                    error: Some(e.to_string()),
                }
            }
        }
    }

    fn default_db_path() -> Result<PathBuf> {
        let data_dir = dirs::data_dir()
            .ok_or_else(|| NovelRankError::Config("Could not find data directory".into()))?;
        let novelrank_dir = data_dir.join("novelrank");
        std::fs::create_dir_all(&novelrank_dir)?;
        Ok(novelrank_dir.join("novelrank.db"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{raw, FlakyStore, StaticProvider};

    fn context(store: Arc<dyn KeyValueStore>) -> AppContext {
        let mut registry = ProviderRegistry::new();
        registry.register(
            Arc::new(StaticProvider::new("goodreads").with("fantasy", vec![raw("Mistborn", "Brandon Sanderson", 4.5)])),
            &[("fantasy", "1.Best_Fantasy")],
        );
        AppContext::with_parts(Config::default(), store, registry)
    }

    #[tokio::test]
    async fn test_request_refresh_success() {
        let ctx = context(Arc::new(SqliteStore::in_memory().unwrap()));

        let response = ctx.request_refresh(false).await;
        assert_eq!(
            response,
            RefreshResponse {
                success: true,
                error: None
            }
        );
        assert_eq!(ctx.snapshot().await.unwrap().unwrap().items.len(), 1);
        assert!(ctx.request_refresh(true).await.success);
    }

    #[tokio::test]
    async fn test_request_refresh_reports_failure() {
        let store = Arc::new(FlakyStore::new());
        store.fail_writes(true);
        let ctx = context(store);

        let response = ctx.request_refresh(true).await;
        assert!(!response.success);
        assert!(response.error.unwrap().contains("quota"));

        let json = serde_json::to_value(ctx.request_refresh(false).await).unwrap();
        assert_eq!(json["success"], serde_json::json!(false));
    }

    #[test]
    fn test_success_response_omits_error() {
        let json = serde_json::to_string(&RefreshResponse {
            success: true,
            error: None,
        })
        .unwrap();
        assert_eq!(json, r#"{"success":true}"#);
    }
}
