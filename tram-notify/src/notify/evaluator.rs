//! Per-cycle notification decisions.

use std::sync::Arc;

use chrono::{DateTime, TimeZone, Utc};
use serde::Serialize;
use tracing::{debug, error, info, warn};

use crate::domain::PositionReport;
use crate::line::Messenger;
use crate::messages;
use crate::resolver::{Target, approaching};
use crate::store::{ActiveSubscription, Store, StoreError};
use crate::topology::Topology;

use super::NotifyError;
use super::config::NotifyConfig;
use super::schedule::{self, ScheduleGate};

/// What happened to one subscription, or one (subscription, vehicle) pair.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    OutsideWindow,
    WrongWeekday,
    UnknownStation,
    NoMatch,
    Deduplicated,
    Dispatched,
    DispatchFailed,
}

/// Counters for one evaluation cycle.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct EvaluationSummary {
    pub subscriptions: usize,
    pub outside_window: usize,
    pub wrong_weekday: usize,
    pub unknown_station: usize,
    pub no_match: usize,
    pub deduplicated: usize,
    pub dispatched: usize,
    pub dispatch_failed: usize,
}

impl EvaluationSummary {
    fn count(&mut self, outcome: Outcome) {
        let counter = match outcome {
            Outcome::OutsideWindow => &mut self.outside_window,
            Outcome::WrongWeekday => &mut self.wrong_weekday,
            Outcome::UnknownStation => &mut self.unknown_station,
            Outcome::NoMatch => &mut self.no_match,
            Outcome::Deduplicated => &mut self.deduplicated,
            Outcome::Dispatched => &mut self.dispatched,
            Outcome::DispatchFailed => &mut self.dispatch_failed,
        };
        *counter += 1;
    }

    /// Subscriptions or pairs that did not produce a notification.
    pub fn skipped(&self) -> usize {
        self.outside_window
            + self.wrong_weekday
            + self.unknown_station
            + self.no_match
            + self.deduplicated
            + self.dispatch_failed
    }
}

/// Decides and sends notifications.
///
/// Holds its collaborators explicitly so tests can substitute an in-memory
/// store and a recording messenger.
#[derive(Clone)]
pub struct Notifier {
    pub(super) topology: Arc<Topology>,
    pub(super) store: Arc<dyn Store>,
    pub(super) messenger: Arc<dyn Messenger>,
    pub(super) config: NotifyConfig,
}

impl Notifier {
    pub fn new(
        topology: Arc<Topology>,
        store: Arc<dyn Store>,
        messenger: Arc<dyn Messenger>,
        config: NotifyConfig,
    ) -> Self {
        Self {
            topology,
            store,
            messenger,
            config,
        }
    }

    pub fn topology(&self) -> &Topology {
        &self.topology
    }

    pub fn config(&self) -> &NotifyConfig {
        &self.config
    }

    /// Delete history recorded before `cutoff`.
    pub async fn purge_history(&self, cutoff: DateTime<Utc>) -> Result<usize, StoreError> {
        self.store.purge_before(cutoff).await
    }

    /// Evaluate every active subscription against `reports` at local time `now`.
    ///
    /// A store failure aborts the cycle. A failed push is logged, counted and
    /// not recorded, so the next cycle can retry it.
    pub async fn evaluate<Tz>(
        &self,
        reports: &[PositionReport],
        now: &DateTime<Tz>,
    ) -> Result<EvaluationSummary, NotifyError>
    where
        Tz: TimeZone,
        Tz::Offset: Send + Sync,
    {
        let subscriptions = self.store.active_subscriptions().await?;
        let now_utc = now.with_timezone(&Utc);
        let since = now_utc - self.config.dedup_window;

        let mut summary = EvaluationSummary {
            subscriptions: subscriptions.len(),
            ..Default::default()
        };

        for active in &subscriptions {
            match schedule::check(&active.subscription, now) {
                ScheduleGate::Open => {}
                ScheduleGate::OutsideWindow => {
                    summary.count(Outcome::OutsideWindow);
                    continue;
                }
                ScheduleGate::WrongWeekday => {
                    summary.count(Outcome::WrongWeekday);
                    continue;
                }
            }

            for outcome in self
                .evaluate_subscription(active, reports, since, now_utc)
                .await?
            {
                summary.count(outcome);
            }
        }

        info!(
            subscriptions = summary.subscriptions,
            dispatched = summary.dispatched,
            deduplicated = summary.deduplicated,
            failed = summary.dispatch_failed,
            "evaluation complete"
        );
        Ok(summary)
    }

    async fn evaluate_subscription(
        &self,
        active: &ActiveSubscription,
        reports: &[PositionReport],
        since: DateTime<Utc>,
        now: DateTime<Utc>,
    ) -> Result<Vec<Outcome>, NotifyError> {
        let subscription = &active.subscription;
        let Some(station) = self.topology.station(subscription.station_id) else {
            warn!(
                subscription = %subscription.id,
                station = %subscription.station_id,
                "subscription references unknown station"
            );
            return Ok(vec![Outcome::UnknownStation]);
        };

        let trigger = i32::from(subscription.trigger_stops);
        let target = Target::new(station.id, subscription.direction);
        let matches = approaching(&self.topology, reports, &target, trigger..=trigger);
        if matches.is_empty() {
            return Ok(vec![Outcome::NoMatch]);
        }

        let mut outcomes = Vec::with_capacity(matches.len());
        for approach in matches {
            let vehicle = approach.report.vehicle;
            if self.store.has_recent(subscription.id, vehicle, since).await? {
                debug!(subscription = %subscription.id, %vehicle, "already notified");
                outcomes.push(Outcome::Deduplicated);
                continue;
            }

            let message =
                messages::notification(&self.topology, station, approach.report, approach.distance);
            match self
                .messenger
                .push(&active.user.line_user_id, vec![message])
                .await
            {
                Ok(()) => {
                    self.store.record(subscription.id, vehicle, now).await?;
                    info!(
                        subscription = %subscription.id,
                        station = station.name,
                        %vehicle,
                        stops = approach.distance.stops_away,
                        "notification sent"
                    );
                    outcomes.push(Outcome::Dispatched);
                }
                Err(e) => {
                    error!(
                        subscription = %subscription.id,
                        user = %active.user.line_user_id,
                        error = %e,
                        "failed to send notification"
                    );
                    outcomes.push(Outcome::DispatchFailed);
                }
            }
        }
        Ok(outcomes)
    }
}
