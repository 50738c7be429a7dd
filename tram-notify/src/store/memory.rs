//! In-process store.
//!
//! Keeps everything in vectors behind a single lock. Insertion order is the
//! store order; "newest first" listings walk it backwards.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use chrono::{DateTime, Utc};
use futures::future::BoxFuture;
use tokio::sync::RwLock;
use uuid::Uuid;

use crate::domain::VehicleId;

use super::error::StoreError;
use super::types::{
    ActiveSubscription, HistoryRecord, NewSubscription, Subscription, SubscriptionId, User, UserId,
};
use super::{HistoryStore, SubscriptionStore, UserStore};

#[derive(Debug, Default)]
struct Tables {
    users: Vec<User>,
    subscriptions: Vec<Subscription>,
    history: Vec<HistoryRecord>,
}

/// Store backed by process memory. Cloning shares the data.
#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    tables: Arc<RwLock<Tables>>,
    offline: Arc<AtomicBool>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make every call fail with a 503 until switched back.
    pub fn set_offline(&self, offline: bool) {
        self.offline.store(offline, Ordering::SeqCst);
    }

    fn check(&self) -> Result<(), StoreError> {
        if self.offline.load(Ordering::SeqCst) {
            return Err(StoreError::Api {
                status: 503,
                message: "memory store offline".to_string(),
            });
        }
        Ok(())
    }

    /// Number of history records currently held.
    pub async fn history_len(&self) -> usize {
        self.tables.read().await.history.len()
    }}

impl UserStore for MemoryStore {
    fn find_user<'a>(
        &'a self,
        line_user_id: &'a str,
    ) -> BoxFuture<'a, Result<Option<User>, StoreError>> {
        Box::pin(async move {
            self.check()?;
            let tables = self.tables.read().await;
            Ok(tables
                .users
                .iter()
                .find(|u| u.line_user_id == line_user_id)
                .cloned())
        })
    }

    fn find_or_create_user<'a>(
        &'a self,
        line_user_id: &'a str,
        display_name: Option<&'a str>,
    ) -> BoxFuture<'a, Result<User, StoreError>> {
        Box::pin(async move {
            self.check()?;
            let mut tables = self.tables.write().await;
            if let Some(existing) = tables.users.iter().find(|u| u.line_user_id == line_user_id) {
                return Ok(existing.clone());
            }
            let user = User {
                id: UserId(Uuid::new_v4()),
                line_user_id: line_user_id.to_string(),
                display_name: display_name.map(str::to_string),
                is_active: true,
                created_at: Utc::now(),
            };
            tables.users.push(user.clone());
            Ok(user)
        })
    }

    fn set_user_active(&self, user: UserId, active: bool) -> BoxFuture<'_, Result<(), StoreError>> {
        Box::pin(async move {
            self.check()?;
            let mut tables = self.tables.write().await;
            let row = tables
                .users
                .iter_mut()
                .find(|u| u.id == user)
                .ok_or_else(|| StoreError::NotFound(format!("user {user}")))?;
            row.is_active = active;
            Ok(())
        })
    }
}

impl SubscriptionStore for MemoryStore {
    fn list_subscriptions(
        &self,
        user: UserId,
    ) -> BoxFuture<'_, Result<Vec<Subscription>, StoreError>> {
        Box::pin(async move {
            self.check()?;
            let tables = self.tables.read().await;
            Ok(tables
                .subscriptions
                .iter()
                .rev()
                .filter(|s| s.user_id == user)
                .cloned()
                .collect())
        })
    }

    fn active_subscriptions(&self) -> BoxFuture<'_, Result<Vec<ActiveSubscription>, StoreError>> {
        Box::pin(async move {
            self.check()?;
            let tables = self.tables.read().await;
            Ok(tables
                .subscriptions
                .iter()
                .filter(|s| s.is_enabled)
                .filter_map(|s| {
                    let user = tables.users.iter().find(|u| u.id == s.user_id)?;
                    user.is_active.then(|| ActiveSubscription {
                        subscription: s.clone(),
                        user: user.clone(),
                    })
                })
                .collect())
        })
    }

    fn create_subscription(
        &self,
        new: NewSubscription,
    ) -> BoxFuture<'_, Result<Subscription, StoreError>> {
        Box::pin(async move {
            self.check()?;
            let mut tables = self.tables.write().await;
            if !tables.users.iter().any(|u| u.id == new.user_id) {
                return Err(StoreError::NotFound(format!("user {}", new.user_id)));
            }
            let now = Utc::now();
            let subscription = Subscription {
                id: SubscriptionId(Uuid::new_v4()),
                user_id: new.user_id,
                station_id: new.station_id,
                direction: new.direction,
                trigger_stops: new.trigger_stops,
                start_time: new.start_time,
                end_time: new.end_time,
                weekdays: new.weekdays,
                is_enabled: new.is_enabled,
                created_at: now,
                updated_at: now,
            };
            tables.subscriptions.push(subscription.clone());
            Ok(subscription)
        })
    }

    fn set_subscription_enabled(
        &self,
        id: SubscriptionId,
        enabled: bool,
    ) -> BoxFuture<'_, Result<(), StoreError>> {
        Box::pin(async move {
            self.check()?;
            let mut tables = self.tables.write().await;
            let row = tables
                .subscriptions
                .iter_mut()
                .find(|s| s.id == id)
                .ok_or_else(|| StoreError::NotFound(format!("subscription {id}")))?;
            row.is_enabled = enabled;
            row.updated_at = Utc::now();
            Ok(())
        })
    }

    fn set_all_enabled(
        &self,
        user: UserId,
        enabled: bool,
    ) -> BoxFuture<'_, Result<usize, StoreError>> {
        Box::pin(async move {
            self.check()?;
            let mut tables = self.tables.write().await;
            let now = Utc::now();
            let mut count = 0;
            for row in tables.subscriptions.iter_mut().filter(|s| s.user_id == user) {
                row.is_enabled = enabled;
                row.updated_at = now;
                count += 1;
            }
            Ok(count)
        })
    }

    fn delete_subscription(
        &self,
        user: UserId,
        id: SubscriptionId,
    ) -> BoxFuture<'_, Result<bool, StoreError>> {
        Box::pin(async move {
            self.check()?;
            let mut tables = self.tables.write().await;
            let before = tables.subscriptions.len();
            tables
                .subscriptions
                .retain(|s| !(s.id == id && s.user_id == user));
            Ok(tables.subscriptions.len() < before)
        })
    }

    fn delete_all_subscriptions(&self, user: UserId) -> BoxFuture<'_, Result<usize, StoreError>> {
        Box::pin(async move {
            self.check()?;
            let mut tables = self.tables.write().await;
            let before = tables.subscriptions.len();
            tables.subscriptions.retain(|s| s.user_id != user);
            Ok(before - tables.subscriptions.len())
        })
    }
}

impl HistoryStore for MemoryStore {
    fn has_recent(
        &self,
        subscription: SubscriptionId,
        vehicle: VehicleId,
        since: DateTime<Utc>,
    ) -> BoxFuture<'_, Result<bool, StoreError>> {
        Box::pin(async move {
            self.check()?;
            let tables = self.tables.read().await;
            Ok(tables.history.iter().any(|h| {
                h.subscription_id == subscription && h.vehicle_id == vehicle && h.notified_at >= since
            }))
        })
    }

    fn record(
        &self,
        subscription: SubscriptionId,
        vehicle: VehicleId,
        at: DateTime<Utc>,
    ) -> BoxFuture<'_, Result<(), StoreError>> {
        Box::pin(async move {
            self.check()?;
            self.tables.write().await.history.push(HistoryRecord {
                subscription_id: subscription,
                vehicle_id: vehicle,
                notified_at: at,
            });
            Ok(())
        })
    }

    fn purge_before(&self, cutoff: DateTime<Utc>) -> BoxFuture<'_, Result<usize, StoreError>> {
        Box::pin(async move {
            self.check()?;
            let mut tables = self.tables.write().await;
            let before = tables.history.len();
            tables.history.retain(|h| h.notified_at >= cutoff);
            Ok(before - tables.history.len())
        })
    }
}
