//! LINE Messaging API client.

use std::sync::Arc;

use futures::future::BoxFuture;
use reqwest::header::{AUTHORIZATION, HeaderMap, HeaderValue};
use tokio::sync::Semaphore;

use super::Messenger;
use super::error::LineError;
use super::types::{Message, Profile, PushRequest, ReplyRequest};

/// Default base URL for the Messaging API.
const DEFAULT_BASE_URL: &str = "https://api.line.me";

/// Default maximum concurrent requests.
const DEFAULT_MAX_CONCURRENT: usize = 8;

/// Configuration for the LINE client.
#[derive(Debug, Clone)]
pub struct LineConfig {
    /// Channel access token
    pub access_token: String,
    /// Base URL for the API (defaults to production)
    pub base_url: String,
    /// Maximum concurrent requests
    pub max_concurrent: usize,
    /// Request timeout in seconds
    pub timeout_secs: u64,
}

impl LineConfig {
    pub fn new(access_token: impl Into<String>) -> Self {
        Self {
            access_token: access_token.into(),
            base_url: DEFAULT_BASE_URL.to_string(),
            max_concurrent: DEFAULT_MAX_CONCURRENT,
            timeout_secs: 10,
        }
    }

    /// Set a custom base URL (for testing).
    pub fn with_base_url(mut self, url: impl Into<String>) -> Self {
        self.base_url = url.into();
        self
    }

    pub fn with_timeout(mut self, secs: u64) -> Self {
        self.timeout_secs = secs;
        self
    }
}

/// Messaging API client.
///
/// A semaphore bounds concurrent requests so a large push batch does not
/// trip the platform's rate limit.
#[derive(Debug, Clone)]
pub struct LineClient {
    http: reqwest::Client,
    base_url: String,
    semaphore: Arc<Semaphore>,
}

impl LineClient {
    pub fn new(config: LineConfig) -> Result<Self, LineError> {
        let mut headers = HeaderMap::new();
        let bearer = HeaderValue::from_str(&format!("Bearer {}", config.access_token))
            .map_err(|_| LineError::InvalidToken)?;
        headers.insert(AUTHORIZATION, bearer);

        let http = reqwest::Client::builder()
            .default_headers(headers)
            .timeout(std::time::Duration::from_secs(config.timeout_secs))
            .build()?;

        Ok(Self {
            http,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            semaphore: Arc::new(Semaphore::new(config.max_concurrent.max(1))),
        })
    }

    fn url(&self, path: &str) -> String {
        format!("{}/v2/bot/{}", self.base_url, path)
    }

    async fn post_json<B: serde::Serialize>(&self, path: &str, body: &B) -> Result<(), LineError> {
        let _permit = self.semaphore.acquire().await.map_err(|_| LineError::Api {
            status: 0,
            message: "client closed".to_string(),
        })?;

        let response = self.http.post(self.url(path)).json(body).send().await?;
        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(LineError::Api {
                status: status.as_u16(),
                message: body,
            });
        }
        Ok(())
    }

    /// Reply to an event using its one-shot reply token.
    pub async fn reply(&self, reply_token: &str, messages: &[Message]) -> Result<(), LineError> {
        let request = ReplyRequest {
            reply_token,
            messages,
        };
        self.post_json("message/reply", &request).await
    }

    /// Push messages to a user outside a reply context.
    pub async fn push(&self, to: &str, messages: &[Message]) -> Result<(), LineError> {
        let request = PushRequest { to, messages };
        self.post_json("message/push", &request).await
    }

    /// Fetch a user's public profile.
    pub async fn profile(&self, user_id: &str) -> Result<Profile, LineError> {
        let _permit = self.semaphore.acquire().await.map_err(|_| LineError::Api {
            status: 0,
            message: "client closed".to_string(),
        })?;

        let response = self
            .http
            .get(self.url(&format!("profile/{user_id}")))
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(LineError::Api {
                status: status.as_u16(),
                message: body,
            });
        }

        let text = response.text().await?;
        serde_json::from_str(&text).map_err(|e| LineError::Json {
            message: e.to_string(),
        })
    }
}

impl Messenger for LineClient {
    fn reply<'a>(
        &'a self,
        reply_token: &'a str,
        messages: Vec<Message>,
    ) -> BoxFuture<'a, Result<(), LineError>> {
        Box::pin(async move { LineClient::reply(self, reply_token, &messages).await })
    }

    fn push<'a>(
        &'a self,
        to: &'a str,
        messages: Vec<Message>,
    ) -> BoxFuture<'a, Result<(), LineError>> {
        Box::pin(async move { LineClient::push(self, to, &messages).await })
    }

    fn profile<'a>(&'a self, user_id: &'a str) -> BoxFuture<'a, Result<Profile, LineError>> {
        Box::pin(LineClient::profile(self, user_id))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn config_defaults() {
        let config = LineConfig::new("token");
        assert_eq!(config.base_url, DEFAULT_BASE_URL);
        assert_eq!(config.max_concurrent, DEFAULT_MAX_CONCURRENT);
        assert_eq!(config.timeout_secs, 10);
    }

    #[test]
    fn endpoint_urls() {
        let client = LineClient::new(LineConfig::new("token").with_base_url("http://localhost:9/"))
            .unwrap();
        assert_eq!(client.url("message/push"), "http://localhost:9/v2/bot/message/push");
        assert_eq!(client.url("profile/U1"), "http://localhost:9/v2/bot/profile/U1");
    }

    #[test]
    fn token_with_newline_is_rejected() {
        assert!(matches!(
            LineClient::new(LineConfig::new("bad\ntoken")),
            Err(LineError::InvalidToken)
        ));
    }
}
