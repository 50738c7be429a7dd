//! Stored entities.
//!
//! Field names follow the backing tables (`users`, `notification_settings`,
//! `notification_history`) so rows deserialize directly.

use std::fmt;

use chrono::{DateTime, NaiveTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::domain::{Direction, StationId, VehicleId};

/// Trigger distance used when none is chosen.
pub const DEFAULT_TRIGGER_STOPS: u8 = 2;

/// Internal user identifier.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct UserId(pub Uuid);

impl fmt::Debug for UserId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "UserId({})", self.0)
    }
}

impl fmt::Display for UserId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Subscription identifier.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SubscriptionId(pub Uuid);

impl SubscriptionId {
    pub fn parse(s: &str) -> Option<Self> {
        Uuid::parse_str(s.trim()).ok().map(SubscriptionId)
    }
}

impl fmt::Debug for SubscriptionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "SubscriptionId({})", self.0)
    }
}

impl fmt::Display for SubscriptionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A messaging-platform user known to the service.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    pub id: UserId,
    pub line_user_id: String,
    pub display_name: Option<String>,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
}

/// One "tell me when a tram is N stops from this station" request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Subscription {
    pub id: SubscriptionId,
    pub user_id: UserId,
    pub station_id: StationId,
    pub direction: Direction,
    pub trigger_stops: u8,
    #[serde(default, with = "clock_time")]
    pub start_time: Option<NaiveTime>,
    #[serde(default, with = "clock_time")]
    pub end_time: Option<NaiveTime>,
    /// Days on which the subscription is live, `0` = Sunday.
    #[serde(default)]
    pub weekdays: Option<Vec<u8>>,
    pub is_enabled: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Fields needed to create a subscription.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct NewSubscription {
    pub user_id: UserId,
    pub station_id: StationId,
    pub direction: Direction,
    pub trigger_stops: u8,
    #[serde(with = "clock_time")]
    pub start_time: Option<NaiveTime>,
    #[serde(with = "clock_time")]
    pub end_time: Option<NaiveTime>,
    pub weekdays: Option<Vec<u8>>,
    pub is_enabled: bool,
}

impl NewSubscription {
    pub fn new(user_id: UserId, station_id: StationId, direction: Direction) -> Self {
        Self {
            user_id,
            station_id,
            direction,
            trigger_stops: DEFAULT_TRIGGER_STOPS,
            start_time: None,
            end_time: None,
            weekdays: None,
            is_enabled: true,
        }
    }

    pub fn with_trigger(mut self, stops: u8) -> Self {
        self.trigger_stops = stops;
        self
    }

    /// Restrict to a daily time window (inclusive, may wrap midnight).
    pub fn with_window(mut self, start: NaiveTime, end: NaiveTime) -> Self {
        self.start_time = Some(start);
        self.end_time = Some(end);
        self
    }

    pub fn with_weekdays(mut self, weekdays: Vec<u8>) -> Self {
        self.weekdays = Some(weekdays);
        self
    }
}

/// An enabled subscription whose owner is active.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ActiveSubscription {
    pub subscription: Subscription,
    pub user: User,
}

/// Record of a dispatched notification, used for dedup.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HistoryRecord {
    #[serde(rename = "setting_id")]
    pub subscription_id: SubscriptionId,
    pub vehicle_id: VehicleId,
    pub notified_at: DateTime<Utc>,
}

/// Serde helpers for optional wall-clock times.
///
/// Accepts both `HH:MM` and `HH:MM:SS` (what Postgres `time` columns return)
/// and writes `HH:MM`.
pub mod clock_time {
    use chrono::NaiveTime;
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn parse(s: &str) -> Option<NaiveTime> {
        let s = s.trim();
        NaiveTime::parse_from_str(s, "%H:%M:%S")
            .or_else(|_| NaiveTime::parse_from_str(s, "%H:%M"))
            .ok()
    }

    pub fn serialize<S: Serializer>(value: &Option<NaiveTime>, s: S) -> Result<S::Ok, S::Error> {
        match value {
            Some(t) => s.serialize_str(&t.format("%H:%M").to_string()),
            None => s.serialize_none(),
        }
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(d: D) -> Result<Option<NaiveTime>, D::Error> {
        let raw: Option<String> = Option::deserialize(d)?;
        match raw {
            None => Ok(None),
            Some(s) if s.trim().is_empty() => Ok(None),
            Some(s) => parse(&s)
                .map(Some)
                .ok_or_else(|| serde::de::Error::custom(format!("invalid time of day: {s:?}"))),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn subscription_from_row() {
        let json = r#"{
            "id": "6f1f7f0e-3b7a-4c55-9d0c-2f6a3c1e9b01",
            "user_id": "0c3e8c4a-9a55-4b8e-b8f1-6d1a3b2c4d5e",
            "station_id": 8,
            "direction": "down",
            "trigger_stops": 3,
            "start_time": "07:00:00",
            "end_time": "09:30",
            "weekdays": [1, 2, 3, 4, 5],
            "is_enabled": true,
            "created_at": "2024-04-01T08:00:00.123456+00:00",
            "updated_at": "2024-04-01T08:00:00+00:00"
        }"#;
        let sub: Subscription = serde_json::from_str(json).unwrap();
        assert_eq!(sub.station_id, StationId(8));
        assert_eq!(sub.direction, Direction::Down);
        assert_eq!(sub.trigger_stops, 3);
        assert_eq!(sub.start_time, NaiveTime::from_hms_opt(7, 0, 0));
        assert_eq!(sub.end_time, NaiveTime::from_hms_opt(9, 30, 0));
        assert_eq!(sub.weekdays, Some(vec![1, 2, 3, 4, 5]));
    }

    #[test]
    fn subscription_with_null_window() {
        let json = r#"{
            "id": "6f1f7f0e-3b7a-4c55-9d0c-2f6a3c1e9b01",
            "user_id": "0c3e8c4a-9a55-4b8e-b8f1-6d1a3b2c4d5e",
            "station_id": 21,
            "direction": "up",
            "trigger_stops": 2,
            "start_time": null,
            "end_time": null,
            "weekdays": null,
            "is_enabled": false,
            "created_at": "2024-04-01T08:00:00Z",
            "updated_at": "2024-04-01T08:00:00Z"
        }"#;
        let sub: Subscription = serde_json::from_str(json).unwrap();
        assert_eq!(sub.start_time, None);
        assert_eq!(sub.weekdays, None);
        assert!(!sub.is_enabled);
    }

    #[test]
    fn new_subscription_payload() {
        let user = UserId(Uuid::nil());
        let new = NewSubscription::new(user, StationId(12), Direction::Up).with_window(
            NaiveTime::from_hms_opt(22, 0, 0).unwrap(),
            NaiveTime::from_hms_opt(6, 0, 0).unwrap(),
        );
        assert_eq!(new.trigger_stops, DEFAULT_TRIGGER_STOPS);
        let value = serde_json::to_value(&new).unwrap();
        assert_eq!(value["start_time"], "22:00");
        assert_eq!(value["end_time"], "06:00");
        assert_eq!(value["direction"], "up");
        assert_eq!(value["station_id"], 12);
    }

    #[test]
    fn history_uses_setting_id_column() {
        let record = HistoryRecord {
            subscription_id: SubscriptionId(Uuid::nil()),
            vehicle_id: VehicleId(1093),
            notified_at: DateTime::<Utc>::UNIX_EPOCH,
        };
        let value = serde_json::to_value(&record).unwrap();
        assert!(value.get("setting_id").is_some());
        assert_eq!(value["vehicle_id"], 1093);
    }

    #[test]
    fn clock_time_parse() {
        assert_eq!(clock_time::parse("7:05"), NaiveTime::from_hms_opt(7, 5, 0));
        assert_eq!(clock_time::parse("23:59:00"), NaiveTime::from_hms_opt(23, 59, 0));
        assert_eq!(clock_time::parse("25:00"), None);
    }
}
