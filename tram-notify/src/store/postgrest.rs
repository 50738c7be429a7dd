//! Supabase / PostgREST store.
//!
//! Each trait call is one REST request against `{url}/rest/v1/{table}`.
//! Calls are not grouped into transactions.

use chrono::{DateTime, SecondsFormat, Utc};
use futures::future::BoxFuture;
use reqwest::header::{AUTHORIZATION, HeaderMap, HeaderName, HeaderValue};
use serde::Deserialize;
use serde::de::DeserializeOwned;
use serde_json::json;

use crate::domain::VehicleId;

use super::error::StoreError;
use super::types::{
    ActiveSubscription, NewSubscription, Subscription, SubscriptionId, User, UserId,
};
use super::{HistoryStore, SubscriptionStore, UserStore};

const USERS: &str = "users";
const SUBSCRIPTIONS: &str = "notification_settings";
const HISTORY: &str = "notification_history";

/// Configuration for the PostgREST store.
#[derive(Debug, Clone)]
pub struct PostgrestConfig {
    /// Project URL, e.g. `https://xyz.supabase.co`
    pub url: String,
    /// Anonymous (or service) API key
    pub api_key: String,
    /// Request timeout in seconds
    pub timeout_secs: u64,
}

impl PostgrestConfig {
    pub fn new(url: impl Into<String>, api_key: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            api_key: api_key.into(),
            timeout_secs: 30,
        }
    }

    pub fn with_timeout(mut self, secs: u64) -> Self {
        self.timeout_secs = secs;
        self
    }
}

/// Row shape of the subscription/user join.
#[derive(Debug, Deserialize)]
struct JoinedRow {
    #[serde(flatten)]
    subscription: Subscription,
    users: User,
}

#[derive(Debug, Deserialize)]
struct Counted {}

/// Store backed by a PostgREST endpoint.
#[derive(Debug, Clone)]
pub struct PostgrestStore {
    http: reqwest::Client,
    rest_url: String,
}

impl PostgrestStore {
    pub fn new(config: PostgrestConfig) -> Result<Self, StoreError> {
        let mut headers = HeaderMap::new();

        let invalid_key = || StoreError::Api {
            status: 0,
            message: "Invalid API key format".to_string(),
        };
        let api_key = HeaderValue::from_str(&config.api_key).map_err(|_| invalid_key())?;
        let bearer =
            HeaderValue::from_str(&format!("Bearer {}", config.api_key)).map_err(|_| invalid_key())?;
        headers.insert(HeaderName::from_static("apikey"), api_key);
        headers.insert(AUTHORIZATION, bearer);

        let http = reqwest::Client::builder()
            .default_headers(headers)
            .timeout(std::time::Duration::from_secs(config.timeout_secs))
            .build()?;

        Ok(Self {
            http,
            rest_url: format!("{}/rest/v1", config.url.trim_end_matches('/')),
        })
    }

    fn table(&self, table: &str) -> String {
        format!("{}/{}", self.rest_url, table)
    }

    /// Send a request and decode the JSON array body.
    async fn send<T: DeserializeOwned>(
        &self,
        request: reqwest::RequestBuilder,
    ) -> Result<Vec<T>, StoreError> {
        let response = request.send().await?;
        let status = response.status();

        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(StoreError::Api {
                status: status.as_u16(),
                message: body,
            });
        }

        let body = response.text().await?;
        if body.trim().is_empty() {
            return Ok(Vec::new());
        }

        serde_json::from_str(&body).map_err(|e| StoreError::Json {
            message: format!("{e} (body: {})", body.chars().take(200).collect::<String>()),
        })
    }

    /// Send a request whose response body is irrelevant.
    async fn send_empty(&self, request: reqwest::RequestBuilder) -> Result<(), StoreError> {
        let response = request.send().await?;
        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(StoreError::Api {
                status: status.as_u16(),
                message: body,
            });
        }
        Ok(())
    }

    fn returning(request: reqwest::RequestBuilder) -> reqwest::RequestBuilder {
        request.header("Prefer", "return=representation")
    }

    /// Send an update that must touch at least one row.
    async fn update(
        &self,
        request: reqwest::RequestBuilder,
        missing: impl FnOnce() -> String,
    ) -> Result<(), StoreError> {
        let request = Self::returning(request.query(&[("select", "id")]));
        if self.send::<Counted>(request).await?.is_empty() {
            return Err(StoreError::NotFound(missing()));
        }
        Ok(())
    }

    async fn create_user(
        &self,
        line_user_id: &str,
        display_name: Option<&str>,
    ) -> Result<User, StoreError> {
        let request = Self::returning(self.http.post(self.table(USERS)).json(&json!({
            "line_user_id": line_user_id,
            "display_name": display_name,
            "is_active": true,
        })));
        self.send::<User>(request)
            .await?
            .into_iter()
            .next()
            .ok_or_else(|| StoreError::NotFound(format!("created user {line_user_id}")))
    }
}

fn timestamp(at: DateTime<Utc>) -> String {
    at.to_rfc3339_opts(SecondsFormat::Millis, true)
}

impl UserStore for PostgrestStore {
    fn find_user<'a>(
        &'a self,
        line_user_id: &'a str,
    ) -> BoxFuture<'a, Result<Option<User>, StoreError>> {
        Box::pin(async move {
            let request = self.http.get(self.table(USERS)).query(&[
                ("select", "*".to_string()),
                ("line_user_id", format!("eq.{line_user_id}")),
                ("limit", "1".to_string()),
            ]);
            Ok(self.send::<User>(request).await?.into_iter().next())
        })
    }

    fn find_or_create_user<'a>(
        &'a self,
        line_user_id: &'a str,
        display_name: Option<&'a str>,
    ) -> BoxFuture<'a, Result<User, StoreError>> {
        Box::pin(async move {
            if let Some(user) = self.find_user(line_user_id).await? {
                return Ok(user);
            }
            self.create_user(line_user_id, display_name).await
        })
    }

    fn set_user_active(&self, user: UserId, active: bool) -> BoxFuture<'_, Result<(), StoreError>> {
        Box::pin(async move {
            let request = self
                .http
                .patch(self.table(USERS))
                .query(&[("id", format!("eq.{user}"))])
                .json(&json!({ "is_active": active }));
            self.update(request, || format!("user {user}")).await
        })
    }
}

impl SubscriptionStore for PostgrestStore {
    fn list_subscriptions(
        &self,
        user: UserId,
    ) -> BoxFuture<'_, Result<Vec<Subscription>, StoreError>> {
        Box::pin(async move {
            let request = self.http.get(self.table(SUBSCRIPTIONS)).query(&[
                ("select", "*".to_string()),
                ("user_id", format!("eq.{user}")),
                ("order", "created_at.desc".to_string()),
            ]);
            self.send(request).await
        })
    }

    fn active_subscriptions(&self) -> BoxFuture<'_, Result<Vec<ActiveSubscription>, StoreError>> {
        Box::pin(async move {
            let request = self.http.get(self.table(SUBSCRIPTIONS)).query(&[
                ("select", "*,users!inner(*)"),
                ("is_enabled", "eq.true"),
                ("users.is_active", "eq.true"),
                ("order", "created_at.asc"),
            ]);
            let rows: Vec<JoinedRow> = self.send(request).await?;
            Ok(rows
                .into_iter()
                .map(|row| ActiveSubscription {
                    subscription: row.subscription,
                    user: row.users,
                })
                .collect())
        })
    }

    fn create_subscription(
        &self,
        new: NewSubscription,
    ) -> BoxFuture<'_, Result<Subscription, StoreError>> {
        Box::pin(async move {
            let request = Self::returning(self.http.post(self.table(SUBSCRIPTIONS)).json(&new));
            self.send::<Subscription>(request)
                .await?
                .into_iter()
                .next()
                .ok_or_else(|| StoreError::NotFound("created subscription".to_string()))
        })
    }

    fn set_subscription_enabled(
        &self,
        id: SubscriptionId,
        enabled: bool,
    ) -> BoxFuture<'_, Result<(), StoreError>> {
        Box::pin(async move {
            let request = self
                .http
                .patch(self.table(SUBSCRIPTIONS))
                .query(&[("id", format!("eq.{id}"))])
                .json(&json!({
                    "is_enabled": enabled,
                    "updated_at": timestamp(Utc::now()),
                }));
            self.update(request, || format!("subscription {id}")).await
        })
    }

    fn set_all_enabled(
        &self,
        user: UserId,
        enabled: bool,
    ) -> BoxFuture<'_, Result<usize, StoreError>> {
        Box::pin(async move {
            let request = Self::returning(
                self.http
                    .patch(self.table(SUBSCRIPTIONS))
                    .query(&[("user_id", format!("eq.{user}")), ("select", "id".to_string())])
                    .json(&json!({
                        "is_enabled": enabled,
                        "updated_at": timestamp(Utc::now()),
                    })),
            );
            Ok(self.send::<Counted>(request).await?.len())
        })
    }

    fn delete_subscription(
        &self,
        user: UserId,
        id: SubscriptionId,
    ) -> BoxFuture<'_, Result<bool, StoreError>> {
        Box::pin(async move {
            let request = Self::returning(self.http.delete(self.table(SUBSCRIPTIONS)).query(&[
                ("id", format!("eq.{id}")),
                ("user_id", format!("eq.{user}")),
                ("select", "id".to_string()),
            ]));
            Ok(!self.send::<Counted>(request).await?.is_empty())
        })
    }

    fn delete_all_subscriptions(&self, user: UserId) -> BoxFuture<'_, Result<usize, StoreError>> {
        Box::pin(async move {
            let request = Self::returning(self.http.delete(self.table(SUBSCRIPTIONS)).query(&[
                ("user_id", format!("eq.{user}")),
                ("select", "id".to_string()),
            ]));
            Ok(self.send::<Counted>(request).await?.len())
        })
    }
}

impl HistoryStore for PostgrestStore {
    fn has_recent(
        &self,
        subscription: SubscriptionId,
        vehicle: VehicleId,
        since: DateTime<Utc>,
    ) -> BoxFuture<'_, Result<bool, StoreError>> {
        Box::pin(async move {
            let request = self.http.get(self.table(HISTORY)).query(&[
                ("select", "setting_id".to_string()),
                ("setting_id", format!("eq.{subscription}")),
                ("vehicle_id", format!("eq.{vehicle}")),
                ("notified_at", format!("gte.{}", timestamp(since))),
                ("limit", "1".to_string()),
            ]);
            Ok(!self.send::<Counted>(request).await?.is_empty())
        })
    }

    fn record(
        &self,
        subscription: SubscriptionId,
        vehicle: VehicleId,
        at: DateTime<Utc>,
    ) -> BoxFuture<'_, Result<(), StoreError>> {
        Box::pin(async move {
            let request = self.http.post(self.table(HISTORY)).json(&json!({
                "setting_id": subscription,
                "vehicle_id": vehicle,
                "notified_at": timestamp(at),
            }));
            self.send_empty(request).await
        })
    }

    fn purge_before(&self, cutoff: DateTime<Utc>) -> BoxFuture<'_, Result<usize, StoreError>> {
        Box::pin(async move {
            let request = Self::returning(self.http.delete(self.table(HISTORY)).query(&[
                ("notified_at", format!("lt.{}", timestamp(cutoff))),
                ("select", "setting_id".to_string()),
            ]));
            Ok(self.send::<Counted>(request).await?.len())
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn config_defaults() {
        let config = PostgrestConfig::new("https://example.supabase.co", "anon");
        assert_eq!(config.timeout_secs, 30);
        assert_eq!(config.with_timeout(5).timeout_secs, 5);
    }

    #[test]
    fn rest_url_strips_trailing_slash() {
        let store =
            PostgrestStore::new(PostgrestConfig::new("https://example.supabase.co/", "anon"))
                .unwrap();
        assert_eq!(store.table(USERS), "https://example.supabase.co/rest/v1/users");
    }

    #[test]
    fn rejects_unprintable_key() {
        let result = PostgrestStore::new(PostgrestConfig::new("https://x", "bad\nkey"));
        assert!(matches!(result, Err(StoreError::Api { status: 0, .. })));
    }

    #[test]
    fn joined_row_parses() {
        let json = r#"[{
            "id": "6f1f7f0e-3b7a-4c55-9d0c-2f6a3c1e9b01",
            "user_id": "0c3e8c4a-9a55-4b8e-b8f1-6d1a3b2c4d5e",
            "station_id": 8,
            "direction": "down",
            "trigger_stops": 2,
            "start_time": null,
            "end_time": null,
            "weekdays": null,
            "is_enabled": true,
            "created_at": "2024-04-01T08:00:00Z",
            "updated_at": "2024-04-01T08:00:00Z",
            "users": {
                "id": "0c3e8c4a-9a55-4b8e-b8f1-6d1a3b2c4d5e",
                "line_user_id": "U0123",
                "display_name": null,
                "is_active": true,
                "created_at": "2024-03-01T08:00:00Z"
            }
        }]"#;
        let rows: Vec<JoinedRow> = serde_json::from_str(json).unwrap();
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].users.line_user_id, "U0123");
        assert_eq!(rows[0].subscription.trigger_stops, 2);
    }

    /// Serve `body` for every request on an ephemeral local port.
    async fn serve(body: &'static str) -> PostgrestStore {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let app = axum::Router::new().fallback(move || async move { body });
        tokio::spawn(async move { axum::serve(listener, app).await.unwrap() });
        PostgrestStore::new(PostgrestConfig::new(format!("http://{addr}"), "anon")).unwrap()
    }

    #[tokio::test]
    async fn update_matching_no_rows_is_not_found() {
        let store = serve("[]").await;
        let user = UserId(uuid::Uuid::new_v4());
        assert!(matches!(
            store.set_user_active(user, false).await,
            Err(StoreError::NotFound(_))
        ));
        let id = SubscriptionId(uuid::Uuid::new_v4());
        assert!(matches!(
            store.set_subscription_enabled(id, true).await,
            Err(StoreError::NotFound(_))
        ));
    }

    #[tokio::test]
    async fn update_matching_a_row_succeeds() {
        let store = serve(r#"[{"id":"6f1f7f0e-3b7a-4c55-9d0c-2f6a3c1e9b01"}]"#).await;
        store
            .set_user_active(UserId(uuid::Uuid::new_v4()), true)
            .await
            .unwrap();
    }

    #[test]
    fn timestamps_are_utc_millis() {
        let at = DateTime::<Utc>::UNIX_EPOCH;
        assert_eq!(timestamp(at), "1970-01-01T00:00:00.000Z");
    }
}
