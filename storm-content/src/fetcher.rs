//! Bundle transport for downloading content from the CMS
//!
//! The coordinator only depends on the [`BundleTransport`] trait. With the
//! `http` feature an HTTP implementation is provided with:
//! - Size limits
//! - Proxy support
//! - Timeout configuration
//!
//! Cancellation is by drop: the coordinator drops the fetch future, which
//! aborts the in-progress transfer.

use async_trait::async_trait;
use thiserror::Error;

#[cfg(feature = "http")]
use reqwest::{Client, StatusCode};
#[cfg(feature = "http")]
use tracing::debug;

#[cfg(feature = "http")]
use super::config::ContentConfig;

/// Source of content bundles
///
/// `Ok(None)` means the server reported nothing new.
#[async_trait]
pub trait BundleTransport: Send + Sync {
    /// Download the complete bundle
    async fn fetch_full(&self) -> Result<Option<Vec<u8>>, FetchError>;

    /// Download the changes published after `since`
    async fn fetch_delta(&self, since: i64) -> Result<Option<Vec<u8>>, FetchError>;
}

/// Fetches bundles from the CMS over HTTP
#[cfg(feature = "http")]
pub struct HttpBundleTransport {
    client: Client,
    api_url: String,
    density: String,
    environment: &'static str,
    max_bundle_size: u64,
}

#[cfg(feature = "http")]
impl HttpBundleTransport {
    /// Create a new transport from config
    pub fn new(config: &ContentConfig) -> Result<Self, FetchError> {
        if config.content_base_url.is_empty() {
            return Err(FetchError::NotConfigured("content_base_url"));
        }
        if config.app_id.is_empty() {
            return Err(FetchError::NotConfigured("app_id"));
        }

        let mut builder = Client::builder().timeout(config.timeout).user_agent(format!(
            "StormContent/{}",
            env!("CARGO_PKG_VERSION")
        ));

        if let Some(proxy_url) = &config.proxy_url {
            builder = builder.proxy(reqwest::Proxy::all(proxy_url)?);
        }

        let api_url = format!(
            "{}/{}/apps/{}",
            config.content_base_url.trim_end_matches('/'),
            config.api_version.trim_matches('/'),
            config.app_id
        );

        Ok(Self {
            client: builder.build()?,
            api_url,
            density: config.density.clone(),
            environment: config.environment.as_str(),
            max_bundle_size: config.max_bundle_size,
        })
    }

    /// URL of the full bundle endpoint
    pub fn bundle_url(&self) -> String {
        format!("{}/bundle", self.api_url)
    }

    /// URL of the delta endpoint
    pub fn update_url(&self) -> String {
        format!("{}/update", self.api_url)
    }

    async fn download(
        &self,
        url: &str,
        since: Option<i64>,
    ) -> Result<Option<Vec<u8>>, FetchError> {
        let mut query: Vec<(&str, String)> = Vec::with_capacity(3);
        if let Some(since) = since {
            query.push(("since", since.to_string()));
        }
        query.push(("density", self.density.clone()));
        query.push(("environment", self.environment.to_string()));

        debug!("Requesting {}", url);
        let mut response = self.client.get(url).query(&query).send().await?;

        let status = response.status();
        if status == StatusCode::NO_CONTENT || status == StatusCode::NOT_MODIFIED {
            debug!("No new content at {} ({})", url, status.as_u16());
            return Ok(None);
        }
        if !status.is_success() {
            return Err(FetchError::HttpError(status.as_u16()));
        }

        // Check content length before downloading
        if let Some(len) = response.content_length() {
            if len > self.max_bundle_size {
                return Err(FetchError::TooLarge {
                    size: len,
                    max: self.max_bundle_size,
                });
            }
        }

        // Enforce the limit while streaming (content-length may be missing)
        let mut data = Vec::new();
        while let Some(chunk) = response.chunk().await? {
            let size = (data.len() + chunk.len()) as u64;
            if size > self.max_bundle_size {
                return Err(FetchError::TooLarge {
                    size,
                    max: self.max_bundle_size,
                });
            }
            data.extend_from_slice(&chunk);
        }

        Ok(Some(data))
    }
}

#[cfg(feature = "http")]
#[async_trait]
impl BundleTransport for HttpBundleTransport {
    async fn fetch_full(&self) -> Result<Option<Vec<u8>>, FetchError> {
        self.download(&self.bundle_url(), None).await
    }

    async fn fetch_delta(&self, since: i64) -> Result<Option<Vec<u8>>, FetchError> {
        self.download(&self.update_url(), Some(since)).await
    }
}

/// Errors that can occur during bundle fetching
#[derive(Debug, Error)]
pub enum FetchError {
    /// HTTP error with status code
    #[error("HTTP error: {0}")]
    HttpError(u16),

    /// Network/request error
    #[cfg(feature = "http")]
    #[error("Network error: {0}")]
    NetworkError(#[from] reqwest::Error),

    /// Bundle too large
    #[error("Bundle too large: {size} bytes (max {max})")]
    TooLarge {
        /// Actual size in bytes
        size: u64,
        /// Maximum allowed size in bytes
        max: u64,
    },

    /// A required configuration value is missing
    #[error("Transport not configured: missing {0}")]
    NotConfigured(&'static str),

    /// Failure reported by a non-HTTP transport
    #[error("Transport error: {0}")]
    Other(String),
}
