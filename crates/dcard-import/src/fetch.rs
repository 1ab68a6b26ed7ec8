//! Document fetching.
//!
//! [`DocumentFetcher`] is the seam between resolution logic and the network.
//! [`HttpFetcher`] is the production implementation: a `reqwest` client with
//! a per-request timeout and retry on transport errors.

use std::time::Duration;

use async_trait::async_trait;
use serde_json::Value;
use url::Url;

use crate::error::FetchError;
use crate::retry::retry_send;

/// Fetches a URL and parses the body as JSON.
#[async_trait]
pub trait DocumentFetcher: Send + Sync {
    /// GET `url` and decode the body. Non-2xx responses are errors.
    async fn fetch_json(&self, url: &Url) -> Result<Value, FetchError>;
}

/// `reqwest`-backed [`DocumentFetcher`].
#[derive(Debug, Clone)]
pub struct HttpFetcher {
    http: reqwest::Client,
}

impl HttpFetcher {
    /// Build a fetcher whose requests time out after `timeout`.
    pub fn new(timeout: Duration) -> Result<Self, FetchError> {
        let http = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(FetchError::Client)?;
        Ok(Self { http })
    }

    /// Wrap an existing client.
    pub fn with_client(http: reqwest::Client) -> Self {
        Self { http }
    }
}

#[async_trait]
impl DocumentFetcher for HttpFetcher {
    async fn fetch_json(&self, url: &Url) -> Result<Value, FetchError> {
        tracing::debug!(url = %url, "fetching document");
        let resp = retry_send(|| self.http.get(url.clone()).send())
            .await
            .map_err(|e| FetchError::Http {
                url: url.to_string(),
                source: e,
            })?;

        if !resp.status().is_success() {
            let status = resp.status().as_u16();
            let body = resp.text().await.unwrap_or_default();
            return Err(FetchError::Status {
                url: url.to_string(),
                status,
                body,
            });
        }

        resp.json().await.map_err(|e| FetchError::Decode {
            url: url.to_string(),
            source: e,
        })
    }
}
