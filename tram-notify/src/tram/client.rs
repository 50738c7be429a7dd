//! Tram location HTTP client.

use futures::future::BoxFuture;
use reqwest::header::{ACCEPT, CONTENT_TYPE, HeaderMap, HeaderValue, USER_AGENT};

use crate::domain::PositionReport;

use super::PositionSource;
use super::error::TramError;
use super::types::parse_positions;

/// Default base URL for the tram location service.
const DEFAULT_BASE_URL: &str = "https://www.kumamoto-city-tramway.jp/Sys";

const CLIENT_USER_AGENT: &str = "KumamotoTramNotify/1.0";

/// Configuration for the tram client.
#[derive(Debug, Clone)]
pub struct TramConfig {
    /// Base URL for the API (defaults to production)
    pub base_url: String,
    /// Request timeout in seconds
    pub timeout_secs: u64,
}

impl Default for TramConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            timeout_secs: 30,
        }
    }
}

impl TramConfig {
    pub fn new() -> Self {
        Self::default()
    }

    /// Set a custom base URL (for testing).
    pub fn with_base_url(mut self, url: impl Into<String>) -> Self {
        self.base_url = url.into();
        self
    }

    /// Set request timeout.
    pub fn with_timeout(mut self, secs: u64) -> Self {
        self.timeout_secs = secs;
        self
    }
}

/// Client for the `web01List` position snapshot.
#[derive(Debug, Clone)]
pub struct TramClient {
    http: reqwest::Client,
    base_url: String,
}

impl TramClient {
    pub fn new(config: TramConfig) -> Result<Self, TramError> {
        let mut headers = HeaderMap::new();
        headers.insert(USER_AGENT, HeaderValue::from_static(CLIENT_USER_AGENT));
        headers.insert(ACCEPT, HeaderValue::from_static("application/json"));

        let http = reqwest::Client::builder()
            .default_headers(headers)
            .timeout(std::time::Duration::from_secs(config.timeout_secs))
            .build()?;

        Ok(Self {
            http,
            base_url: config.base_url.trim_end_matches('/').to_string(),
        })
    }

    fn list_url(&self) -> String {
        format!("{}/web01List", self.base_url)
    }

    /// Fetch the current position of every running tram.
    pub async fn fetch_positions(&self) -> Result<Vec<PositionReport>, TramError> {
        let response = self
            .http
            .post(self.list_url())
            .header(CONTENT_TYPE, "application/x-www-form-urlencoded")
            .body("")
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(TramError::Api {
                status: status.as_u16(),
                message: body.chars().take(200).collect(),
            });
        }

        let body = response.text().await?;
        parse_positions(&body)
    }
}

impl PositionSource for TramClient {
    fn fetch_positions(&self) -> BoxFuture<'_, Result<Vec<PositionReport>, TramError>> {
        Box::pin(TramClient::fetch_positions(self))
    }
}
