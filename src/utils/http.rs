//! HTTP client utilities.

use reqwest::Client;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, warn};
use url::Url;

use crate::config::HttpConfig;
use crate::sources::SourceError;

/// Default user agent sent to upstream services
pub const DEFAULT_USER_AGENT: &str = concat!(env!("CARGO_PKG_NAME"), "/", env!("CARGO_PKG_VERSION"));

/// Shared HTTP client with sensible defaults
#[derive(Debug, Clone)]
pub struct HttpClient {
    client: Arc<Client>,
}

impl HttpClient {
    /// Create a client from the `[http]` configuration section
    pub fn new(config: &HttpConfig) -> Result<Self, SourceError> {
        let user_agent = config.user_agent.as_deref().unwrap_or(DEFAULT_USER_AGENT);
        Self::with_user_agent(user_agent, Duration::from_secs(config.timeout_secs))
    }

    /// Create a client with a custom user agent and request timeout
    pub fn with_user_agent(user_agent: &str, timeout: Duration) -> Result<Self, SourceError> {
        let client = Client::builder()
            .user_agent(user_agent)
            .timeout(timeout)
            .connect_timeout(Duration::from_secs(10))
            .pool_idle_timeout(Duration::from_secs(90))
            .build()
            .map_err(|e| SourceError::Config(format!("Failed to create HTTP client: {}", e)))?;

        Ok(Self {
            client: Arc::new(client),
        })
    }

    /// Issue one GET and return the body as text.
    ///
    /// Any transport failure or non-success status is returned as an error;
    /// nothing is retried.
    pub async fn get_text(
        &self,
        url: &Url,
        params: &[(&str, String)],
        service: &str,
    ) -> Result<String, SourceError> {
        debug!(service, url = %url, ?params, "outbound request");

        let response = self
            .client
            .get(url.clone())
            .query(params)
            .send()
            .await
            .map_err(|e| SourceError::Network(format!("Failed to reach {}: {}", service, e)))?;

        let status = response.status();
        if !status.is_success() {
            warn!(service, %status, "upstream returned failure status");
            return Err(SourceError::Api(format!(
                "{} returned status: {}",
                service, status
            )));
        }

        response
            .text()
            .await
            .map_err(|e| SourceError::Network(format!("Failed to read {} response: {}", service, e)))
    }
}
