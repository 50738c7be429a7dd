//! Morning digest and per-station status.
//!
//! Unlike the trigger evaluation, the digest ignores trigger distance,
//! dedup history and schedule windows: every active user gets one message
//! listing the soonest trams for each of their subscriptions.

use std::collections::HashMap;
use std::ops::RangeInclusive;

use chrono::{DateTime, TimeZone};
use serde::Serialize;
use tracing::{error, info, warn};

use crate::domain::{Direction, PositionReport, Station};
use crate::messages::{self, StationStatus, TramView};
use crate::resolver::{Target, approaching};
use crate::store::{User, UserId};
use crate::topology::Topology;

use super::NotifyError;
use super::evaluator::Notifier;

/// Counters for one digest run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct DigestSummary {
    pub users: usize,
    pub subscriptions: usize,
    pub sent: usize,
    pub failed: usize,
}

/// The closest `max` trams heading for `station` in `direction` whose
/// distance lies in `horizon`.
pub fn station_status(
    topology: &Topology,
    reports: &[PositionReport],
    station: &Station,
    direction: Direction,
    horizon: RangeInclusive<i32>,
    max: usize,
) -> StationStatus {
    let target = Target::new(station.id, direction);
    let mut found = approaching(topology, reports, &target, horizon);
    found.truncate(max);
    StationStatus {
        station: station.name.to_string(),
        direction: topology.direction_label(station, direction),
        trams: TramView::from_approaches(&found),
    }
}

impl Notifier {
    /// Send every active user a digest of their subscribed stations.
    pub async fn morning_digest<Tz: TimeZone>(
        &self,
        reports: &[PositionReport],
        now: &DateTime<Tz>,
    ) -> Result<DigestSummary, NotifyError> {
        let subscriptions = self.store.active_subscriptions().await?;

        let mut users: Vec<(User, Vec<StationStatus>)> = Vec::new();
        let mut index: HashMap<UserId, usize> = HashMap::new();
        for active in &subscriptions {
            let sub = &active.subscription;
            let Some(station) = self.topology.station(sub.station_id) else {
                warn!(
                    subscription = %sub.id,
                    station = %sub.station_id,
                    "unknown station in digest"
                );
                continue;
            };
            let status = station_status(
                &self.topology,
                reports,
                station,
                sub.direction,
                self.config.morning_horizon.clone(),
                self.config.morning_max_trams,
            );
            let slot = *index.entry(active.user.id).or_insert_with(|| {
                users.push((active.user.clone(), Vec::new()));
                users.len() - 1
            });
            users[slot].1.push(status);
        }

        let mut summary = DigestSummary {
            users: users.len(),
            subscriptions: subscriptions.len(),
            ..Default::default()
        };

        let time = now.time();
        for (user, entries) in &users {
            let message = messages::morning_digest(time, entries);
            match self.messenger.push(&user.line_user_id, vec![message]).await {
                Ok(()) => summary.sent += 1,
                Err(e) => {
                    error!(user = %user.line_user_id, error = %e, "failed to send morning digest");
                    summary.failed += 1;
                }
            }
        }

        info!(
            users = summary.users,
            sent = summary.sent,
            failed = summary.failed,
            "morning digest complete"
        );
        Ok(summary)
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use chrono::NaiveTime;
    use chrono_tz::Asia::Tokyo;

    use super::*;
    use crate::domain::{Line, StationId};
    use crate::line::RecordingMessenger;
    use crate::notify::NotifyConfig;
    use crate::store::{MemoryStore, NewSubscription, SubscriptionStore, UserStore};

    fn topology() -> Topology {
        Topology::builtin().unwrap()
    }

    fn down_a(code: u32, vehicle: u32) -> PositionReport {
        PositionReport::new(code, Line::A, Direction::Down, 1, vehicle)
    }

    #[test]
    fn status_keeps_closest_two_in_order() {
        let topology = topology();
        let station = topology.station(StationId(8)).unwrap();
        // code 18 is two stops out; codes 1 and 2 are further up the line
        let reports = vec![down_a(1, 10), down_a(18, 11), down_a(2, 12), down_a(3, 13)];

        let status = station_status(&topology, &reports, station, Direction::Down, 1..=15, 2);
        assert_eq!(status.trams.len(), 2);
        assert_eq!(status.trams[0].stops, 2);
        assert_eq!(status.trams[0].label, "次の電車");
        assert_eq!(status.trams[1].label, "その次");
        assert!(status.trams[0].stops < status.trams[1].stops);
        assert_eq!(status.direction, "健軍町方面");
    }

    #[test]
    fn status_without_trams() {
        let topology = topology();
        let station = topology.station(StationId(21)).unwrap();
        let status = station_status(&topology, &[], station, Direction::Down, 1..=15, 2);
        assert!(status.trams.is_empty());
        assert_eq!(status.station, "上熊本");
    }

    #[tokio::test]
    async fn one_digest_per_user() {
        let store = MemoryStore::new();
        let messenger = RecordingMessenger::new();
        let notifier = Notifier::new(
            Arc::new(topology()),
            Arc::new(store.clone()),
            Arc::new(messenger.clone()),
            NotifyConfig::default(),
        );

        let u1 = store.find_or_create_user("U1", None).await.unwrap();
        let u2 = store.find_or_create_user("U2", None).await.unwrap();
        for (user, station) in [(u1.id, 8), (u2.id, 12), (u1.id, 21)] {
            store
                .create_subscription(
                    NewSubscription::new(user, StationId(station), Direction::Down).with_window(
                        NaiveTime::from_hms_opt(22, 0, 0).unwrap(),
                        NaiveTime::from_hms_opt(23, 0, 0).unwrap(),
                    ),
                )
                .await
                .unwrap();
        }

        let now = Tokyo.with_ymd_and_hms(2024, 4, 1, 7, 25, 0).unwrap();
        let summary = notifier.morning_digest(&[down_a(18, 1)], &now).await.unwrap();
        assert_eq!(summary.users, 2);
        assert_eq!(summary.subscriptions, 3);
        assert_eq!(summary.sent, 2);

        let pushes = messenger.pushes_to("U1").await;
        assert_eq!(pushes.len(), 1);
        let text = pushes[0][0].summary();
        assert!(text.contains("7:25 現在の電車情報"));
        assert!(text.contains("📍 辛島町（健軍町方面）\n  次の電車: 2駅前 (約4分)"));
        assert!(text.contains("📍 上熊本（健軍町方面）\n  現在接近中の電車はありません"));
        let first = text.find("辛島町").unwrap();
        let second = text.find("上熊本").unwrap();
        assert!(first < second);
    }

    #[tokio::test]
    async fn failed_digest_is_counted() {
        let store = MemoryStore::new();
        let messenger = RecordingMessenger::new();
        messenger.fail_for("U1").await;
        let notifier = Notifier::new(
            Arc::new(topology()),
            Arc::new(store.clone()),
            Arc::new(messenger.clone()),
            NotifyConfig::default(),
        );
        let user = store.find_or_create_user("U1", None).await.unwrap();
        store
            .create_subscription(NewSubscription::new(user.id, StationId(8), Direction::Up))
            .await
            .unwrap();

        let now = Tokyo.with_ymd_and_hms(2024, 4, 1, 7, 25, 0).unwrap();
        let summary = notifier.morning_digest(&[], &now).await.unwrap();
        assert_eq!(summary.failed, 1);
        assert_eq!(summary.sent, 0);
    }
}
