//! Base HTTP JSON client.
//!
//! CometBFT and the Cosmos SDK REST server both answer plain GET requests with
//! JSON bodies, so `get()` is the only transport primitive needed. Supports a
//! configurable timeout and retry with exponential backoff on transient
//! failures.

use crate::error::RpcError;
use reqwest::header::{HeaderMap, HeaderValue, ACCEPT};
use serde::de::DeserializeOwned;
use serde_json::Value;
use std::time::Duration;

/// Configuration for an RPC client.
#[derive(Debug, Clone)]
pub struct RpcConfig {
    /// Base URL (e.g., `http://localhost:26657`).
    pub url: String,
    /// Request timeout.
    pub timeout: Duration,
    /// Number of retry attempts on transient failure.
    pub retries: u32,
    /// Initial delay between retries (doubles each attempt).
    pub retry_delay: Duration,
}

impl Default for RpcConfig {
    fn default() -> Self {
        Self {
            url: crate::endpoints::node_rpc(),
            timeout: Duration::from_secs(10),
            retries: 1,
            retry_delay: Duration::from_millis(250),
        }
    }
}

/// Async JSON-over-HTTP client bound to one base URL.
pub struct RpcClient {
    client: reqwest::Client,
    config: RpcConfig,
}

impl RpcClient {
    /// Create a new client with the given URL.
    pub fn new(url: &str) -> Result<Self, RpcError> {
        Self::with_config(RpcConfig {
            url: url.to_string(),
            ..Default::default()
        })
    }

    /// Create a new client with full configuration.
    pub fn with_config(mut config: RpcConfig) -> Result<Self, RpcError> {
        config.url = config.url.trim_end_matches('/').to_string();

        let mut headers = HeaderMap::new();
        headers.insert(ACCEPT, HeaderValue::from_static("application/json"));

        let client = reqwest::Client::builder()
            .timeout(config.timeout)
            .default_headers(headers)
            .pool_max_idle_per_host(2)
            .build()
            .map_err(|e| RpcError::Other(format!("failed to create HTTP client: {}", e)))?;

        Ok(Self { client, config })
    }

    /// Get the configured base URL.
    pub fn url(&self) -> &str {
        &self.config.url
    }

    /// GET `endpoint` and return the raw JSON body.
    pub async fn get(&self, endpoint: &str) -> Result<Value, RpcError> {
        let url = format!("{}{}", self.config.url, endpoint);

        let attempts = self.config.retries + 1;
        let mut last_err = RpcError::Other(format!("no attempt made for {}", endpoint));

        for attempt in 0..attempts {
            if attempt > 0 {
                let delay = self.config.retry_delay * 2u32.saturating_pow(attempt - 1);
                tokio::time::sleep(delay).await;
            }

            match self.do_get(&url, endpoint).await {
                Ok(val) => return Ok(val),
                Err(e) => {
                    let should_retry = e.is_transient() && attempt + 1 < attempts;
                    if !should_retry {
                        return Err(e);
                    }
                    log::debug!("retrying {} after: {}", endpoint, e);
                    last_err = e;
                }
            }
        }

        Err(last_err)
    }

    /// GET `endpoint` and deserialize the body into `T`.
    pub async fn get_json<T: DeserializeOwned>(&self, endpoint: &str) -> Result<T, RpcError> {
        let val = self.get(endpoint).await?;
        Ok(serde_json::from_value(val)?)
    }

    async fn do_get(&self, url: &str, endpoint: &str) -> Result<Value, RpcError> {
        let resp = self.client.get(url).send().await.map_err(|e| RpcError::Http {
            endpoint: endpoint.to_string(),
            url: url.to_string(),
            source: e,
        })?;

        let status = resp.status().as_u16();
        if status >= 400 {
            let body = resp.text().await.unwrap_or_default();
            return Err(RpcError::HttpStatus {
                endpoint: endpoint.to_string(),
                url: url.to_string(),
                status,
                body: body.chars().take(500).collect(),
            });
        }

        resp.json().await.map_err(|e| RpcError::Http {
            endpoint: endpoint.to_string(),
            url: url.to_string(),
            source: e,
        })
    }
}
