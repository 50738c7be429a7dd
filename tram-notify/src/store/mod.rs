//! Persistence for users, subscriptions and notification history.
//!
//! The core only needs simple CRUD calls, so the backends sit behind three
//! small object-safe traits. [`MemoryStore`] is used for development and
//! tests, [`PostgrestStore`] talks to a Supabase/PostgREST deployment.

mod error;
mod memory;
mod postgrest;
mod types;

use chrono::{DateTime, Utc};
use futures::future::BoxFuture;

use crate::domain::VehicleId;

pub use error::StoreError;
pub use memory::MemoryStore;
pub use postgrest::{PostgrestConfig, PostgrestStore};
pub use types::{
    ActiveSubscription, DEFAULT_TRIGGER_STOPS, HistoryRecord, NewSubscription, Subscription,
    SubscriptionId, User, UserId, clock_time,
};

/// Users, keyed by their messaging-platform id.
pub trait UserStore: Send + Sync {
    fn find_user<'a>(
        &'a self,
        line_user_id: &'a str,
    ) -> BoxFuture<'a, Result<Option<User>, StoreError>>;

    /// Return the existing user, or create an active one.
    fn find_or_create_user<'a>(
        &'a self,
        line_user_id: &'a str,
        display_name: Option<&'a str>,
    ) -> BoxFuture<'a, Result<User, StoreError>>;

    fn set_user_active(&self, user: UserId, active: bool) -> BoxFuture<'_, Result<(), StoreError>>;
}

/// Notification subscriptions.
pub trait SubscriptionStore: Send + Sync {
    /// A user's subscriptions, newest first.
    fn list_subscriptions(
        &self,
        user: UserId,
    ) -> BoxFuture<'_, Result<Vec<Subscription>, StoreError>>;

    /// Enabled subscriptions whose owner is active, in store order.
    fn active_subscriptions(&self) -> BoxFuture<'_, Result<Vec<ActiveSubscription>, StoreError>>;

    fn create_subscription(
        &self,
        new: NewSubscription,
    ) -> BoxFuture<'_, Result<Subscription, StoreError>>;

    fn set_subscription_enabled(
        &self,
        id: SubscriptionId,
        enabled: bool,
    ) -> BoxFuture<'_, Result<(), StoreError>>;

    /// Enable or disable every subscription of `user`; returns how many changed rows.
    fn set_all_enabled(&self, user: UserId, enabled: bool)
    -> BoxFuture<'_, Result<usize, StoreError>>;

    /// Delete one subscription, only if it belongs to `user`.
    fn delete_subscription(
        &self,
        user: UserId,
        id: SubscriptionId,
    ) -> BoxFuture<'_, Result<bool, StoreError>>;

    fn delete_all_subscriptions(&self, user: UserId) -> BoxFuture<'_, Result<usize, StoreError>>;
}

/// Append-only notification history.
pub trait HistoryStore: Send + Sync {
    /// Whether `vehicle` was notified for `subscription` at or after `since`.
    fn has_recent(
        &self,
        subscription: SubscriptionId,
        vehicle: VehicleId,
        since: DateTime<Utc>,
    ) -> BoxFuture<'_, Result<bool, StoreError>>;

    fn record(
        &self,
        subscription: SubscriptionId,
        vehicle: VehicleId,
        at: DateTime<Utc>,
    ) -> BoxFuture<'_, Result<(), StoreError>>;

    /// Delete records older than `cutoff`; returns how many were removed.
    fn purge_before(&self, cutoff: DateTime<Utc>) -> BoxFuture<'_, Result<usize, StoreError>>;
}

/// Everything the service needs from a backend.
pub trait Store: UserStore + SubscriptionStore + HistoryStore {}

impl<T: UserStore + SubscriptionStore + HistoryStore> Store for T {}
