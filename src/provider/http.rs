use std::time::Duration;

use reqwest::Client;
use url::Url;

use crate::app::Result;
use crate::config::FetchConfig;

const DEFAULT_USER_AGENT: &str = concat!("novelrank/", env!("CARGO_PKG_VERSION"));

/// Shared HTTP client for the site providers.
pub struct HttpFetcher {
    client: Client,
}

impl HttpFetcher {
    pub fn new(config: &FetchConfig) -> Result<Self> {
        let user_agent = config
            .user_agent
            .clone()
            .unwrap_or_else(|| DEFAULT_USER_AGENT.to_string());

        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .gzip(true)
            .brotli(true)
            .user_agent(user_agent)
            .build()?;

        Ok(Self { client })
    }

    /// GET `url` and return the body as text. Non-2xx statuses are errors.
    pub async fn get_text(&self, url: &Url) -> Result<String> {
        let response = self.client.get(url.as_str()).send().await?;
        response.error_for_status_ref()?;

        let body = response.text().await?;
        tracing::debug!("Fetched {} ({} bytes)", url, body.len());
        Ok(body)
    }
}
