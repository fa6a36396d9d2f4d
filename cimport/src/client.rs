//! Contact service HTTP client
//!
//! Wraps a reqwest client whose default headers carry the account
//! authorization. One instance lives for one pipeline run.

use crate::credentials::Credentials;
use crate::error::{ImportError, Result};
use reqwest::Url;
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::time::Duration;
use thiserror::Error;

pub(crate) const USER_AGENT: &str = concat!("cimport/", env!("CARGO_PKG_VERSION"));

/// Failure of a single contact service call
///
/// Stage code maps this onto the stage's own error kind.
#[derive(Debug, Error)]
pub enum ServiceCallError {
    #[error("Network error: {0}")]
    Network(String),

    #[error("API error {0}: {1}")]
    Api(u16, String),

    #[error("Parse error: {0}")]
    Parse(String),

    #[error("Invalid URL: {0}")]
    Url(String),
}

/// Authenticated client for the contact service REST API
#[derive(Debug, Clone)]
pub struct ContactServiceClient {
    http_client: reqwest::Client,
    base_url: Url,
}

impl ContactServiceClient {
    pub fn new(host: &str, credentials: &Credentials, timeout: Duration) -> Result<Self> {
        let base_url = normalize_base_url(host)?;
        let http_client = reqwest::Client::builder()
            .user_agent(USER_AGENT)
            .default_headers(credentials.default_headers()?)
            .timeout(timeout)
            .build()
            .map_err(|e| ImportError::Config(format!("Failed to build HTTP client: {}", e)))?;

        Ok(Self {
            http_client,
            base_url,
        })
    }

    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    /// URL of a resource collection relative to the base URL
    pub fn resource_url(&self, resource: &str) -> std::result::Result<Url, ServiceCallError> {
        self.base_url
            .join(resource)
            .map_err(|e| ServiceCallError::Url(format!("{}{}: {}", self.base_url, resource, e)))
    }

    /// POST a JSON body and decode the JSON response
    ///
    /// Any 2xx status is accepted; other statuses surface with their body.
    pub async fn post_json<B, R>(
        &self,
        resource: &str,
        body: &B,
    ) -> std::result::Result<R, ServiceCallError>
    where
        B: Serialize + ?Sized,
        R: DeserializeOwned,
    {
        let url = self.resource_url(resource)?;
        tracing::debug!(url = %url, "POST to contact service");

        let response = self
            .http_client
            .post(url)
            .json(body)
            .send()
            .await
            .map_err(|e| ServiceCallError::Network(e.to_string()))?;

        let status = response.status();
        let text = response
            .text()
            .await
            .map_err(|e| ServiceCallError::Network(e.to_string()))?;

        if !status.is_success() {
            return Err(ServiceCallError::Api(status.as_u16(), text));
        }

        serde_json::from_str(&text).map_err(|e| ServiceCallError::Parse(e.to_string()))
    }
}

/// Parse the configured host and make sure it ends with `/`
///
/// Without the trailing slash, joining `uploads` onto `.../api/v1` would
/// replace `v1` instead of appending to it.
pub fn normalize_base_url(host: &str) -> Result<Url> {
    let trimmed = host.trim();
    let mut url = Url::parse(trimmed)
        .map_err(|e| ImportError::Config(format!("Invalid host URL '{}': {}", trimmed, e)))?;

    if url.scheme() != "http" && url.scheme() != "https" {
        return Err(ImportError::Config(format!(
            "Host URL must use http or https: {}",
            trimmed
        )));
    }

    if !url.path().ends_with('/') {
        let path = format!("{}/", url.path());
        url.set_path(&path);
    }
    Ok(url)
}
