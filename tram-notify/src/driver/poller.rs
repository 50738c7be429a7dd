//! Fetch-evaluate-dispatch cycles.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use chrono::{DateTime, TimeDelta, Utc};
use chrono_tz::Tz;
use serde::Serialize;
use thiserror::Error;
use tokio::sync::{Mutex, watch};
use tokio::task::{JoinHandle, JoinSet};
use tokio::time::MissedTickBehavior;
use tracing::{debug, error, info, warn};

use crate::notify::{DigestSummary, EvaluationSummary, Notifier, NotifyError};
use crate::store::StoreError;
use crate::tram::{PositionSource, TramError};

use super::hours::OperatingHours;

/// History older than this is purged by [`Poller::cleanup`].
pub const DEFAULT_RETENTION: TimeDelta = TimeDelta::hours(24);

/// Errors that fail a whole cycle.
#[derive(Debug, Error)]
pub enum DriverError {
    #[error("failed to fetch tram positions: {0}")]
    Fetch(#[from] TramError),

    #[error(transparent)]
    Notify(#[from] NotifyError),

    #[error("store error: {0}")]
    Store(#[from] StoreError),
}

/// Result of one poll cycle.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct PollReport {
    pub tram_count: usize,
    pub evaluation: EvaluationSummary,
}

/// Result of a gated poll.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PollOutcome {
    OutsideHours,
    Polled(PollReport),
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct CleanupReport {
    pub deleted: usize,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct MorningReport {
    pub tram_count: usize,
    pub digest: DigestSummary,
}

struct Running {
    stop: watch::Sender<bool>,
    handle: JoinHandle<()>,
}

/// Periodic orchestration of the notifier.
///
/// Clones share the same timer, so any clone can stop a poller another
/// clone started.
#[derive(Clone)]
pub struct Poller {
    source: Arc<dyn PositionSource>,
    notifier: Notifier,
    hours: OperatingHours,
    timezone: Tz,
    retention: TimeDelta,
    running: Arc<AtomicBool>,
    timer: Arc<Mutex<Option<Running>>>,
}

impl Poller {
    pub fn new(
        source: Arc<dyn PositionSource>,
        notifier: Notifier,
        hours: OperatingHours,
        timezone: Tz,
    ) -> Self {
        Self {
            source,
            notifier,
            hours,
            timezone,
            retention: DEFAULT_RETENTION,
            running: Arc::new(AtomicBool::new(false)),
            timer: Arc::new(Mutex::new(None)),
        }
    }

    pub fn with_hours(mut self, hours: OperatingHours) -> Self {
        self.hours = hours;
        self
    }

    /// Current time in the service time zone.
    pub fn now(&self) -> DateTime<Tz> {
        Utc::now().with_timezone(&self.timezone)
    }

    pub fn hours(&self) -> OperatingHours {
        self.hours
    }

    pub fn timezone(&self) -> Tz {
        self.timezone
    }

    pub fn notifier(&self) -> &Notifier {
        &self.notifier
    }

    /// Fetch positions and evaluate every subscription, regardless of the hour.
    pub async fn poll_once(&self) -> Result<PollReport, DriverError> {
        self.poll_at(&self.now()).await
    }

    pub async fn poll_at(&self, now: &DateTime<Tz>) -> Result<PollReport, DriverError> {
        let reports = self.source.fetch_positions().await?;
        debug!(trams = reports.len(), "fetched positions");
        let evaluation = self.notifier.evaluate(&reports, now).await?;
        Ok(PollReport {
            tram_count: reports.len(),
            evaluation,
        })
    }

    /// Poll only inside operating hours.
    pub async fn smart_poll(&self) -> Result<PollOutcome, DriverError> {
        self.smart_poll_at(&self.now()).await
    }

    pub async fn smart_poll_at(&self, now: &DateTime<Tz>) -> Result<PollOutcome, DriverError> {
        if !self.hours.contains(now) {
            debug!(hours = %self.hours, "outside operating hours, skipping poll");
            return Ok(PollOutcome::OutsideHours);
        }
        self.poll_at(now).await.map(PollOutcome::Polled)
    }

    /// Purge notification history older than the retention period.
    pub async fn cleanup(&self) -> Result<CleanupReport, DriverError> {
        let cutoff = Utc::now() - self.retention;
        let deleted = self.notifier.purge_history(cutoff).await?;
        info!(deleted, "purged notification history");
        Ok(CleanupReport { deleted })
    }

    /// Fetch positions and send the morning digest.
    pub async fn morning(&self) -> Result<MorningReport, DriverError> {
        self.morning_at(&self.now()).await
    }

    pub async fn morning_at(&self, now: &DateTime<Tz>) -> Result<MorningReport, DriverError> {
        let reports = self.source.fetch_positions().await?;
        let digest = self.notifier.morning_digest(&reports, now).await?;
        Ok(MorningReport {
            tram_count: reports.len(),
            digest,
        })
    }

    pub fn is_running(&self) -> bool {
        self.running.load(Ordering::SeqCst)
    }

    /// Start polling every `interval`. Returns `false` if already running.
    ///
    /// Each tick spawns an independent cycle; a slow cycle does not delay
    /// the next one.
    pub async fn start(&self, interval: Duration) -> bool {
        let mut timer = self.timer.lock().await;
        if timer.is_some() {
            warn!("polling already running");
            return false;
        }

        let (stop, mut stopped) = watch::channel(false);
        let poller = self.clone();
        let handle = tokio::spawn(async move {
            let mut ticker = tokio::time::interval(interval);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
            let mut cycles = JoinSet::new();

            loop {
                tokio::select! {
                    _ = stopped.changed() => break,
                    _ = ticker.tick() => {
                        let poller = poller.clone();
                        cycles.spawn(async move { poller.run_cycle().await });
                    }
                    Some(joined) = cycles.join_next(), if !cycles.is_empty() => {
                        log_join(joined);
                    }
                }
            }

            // Let in-flight cycles finish
            while let Some(joined) = cycles.join_next().await {
                log_join(joined);
            }
        });

        *timer = Some(Running { stop, handle });
        self.running.store(true, Ordering::SeqCst);
        info!(interval_secs = interval.as_secs(), "polling started");
        true
    }

    /// Stop the timer and wait for in-flight cycles. No-op if not running.
    pub async fn stop(&self) {
        let Some(running) = self.timer.lock().await.take() else {
            return;
        };
        let _ = running.stop.send(true);
        if let Err(e) = running.handle.await {
            error!(error = %e, "polling task ended abnormally");
        }
        self.running.store(false, Ordering::SeqCst);
        info!("polling stopped");
    }

    async fn run_cycle(&self) {
        match self.smart_poll().await {
            Ok(PollOutcome::OutsideHours) => {}
            Ok(PollOutcome::Polled(report)) => info!(
                trams = report.tram_count,
                notifications = report.evaluation.dispatched,
                "poll cycle complete"
            ),
            Err(e) => error!(error = %e, "poll cycle failed"),
        }
    }
}

fn log_join(joined: Result<(), tokio::task::JoinError>) {
    if let Err(e) = joined {
        error!(error = %e, "poll cycle panicked");
    }
}

#[cfg(test)]
mod tests {
    use chrono::TimeZone;
    use chrono_tz::Asia::Tokyo;

    use super::*;
    use crate::domain::{Direction, Line, PositionReport, StationId};
    use crate::line::RecordingMessenger;
    use crate::notify::NotifyConfig;
    use crate::store::{HistoryStore, MemoryStore, NewSubscription, SubscriptionStore, UserStore};
    use crate::topology::Topology;
    use crate::tram::MockTramSource;

    struct Fixture {
        store: MemoryStore,
        source: MockTramSource,
        messenger: RecordingMessenger,
        poller: Poller,
    }

    async fn fixture() -> Fixture {
        let store = MemoryStore::new();
        let messenger = RecordingMessenger::new();
        let source = MockTramSource::from_reports(vec![PositionReport::new(
            18,
            Line::A,
            Direction::Down,
            2,
            1093,
        )]);
        let notifier = Notifier::new(
            Arc::new(Topology::builtin().unwrap()),
            Arc::new(store.clone()),
            Arc::new(messenger.clone()),
            NotifyConfig::default(),
        );
        let poller = Poller::new(
            Arc::new(source.clone()),
            notifier,
            OperatingHours::default(),
            Tokyo,
        );

        let user = store.find_or_create_user("U1", None).await.unwrap();
        store
            .create_subscription(NewSubscription::new(user.id, StationId(8), Direction::Down))
            .await
            .unwrap();

        Fixture {
            store,
            source,
            messenger,
            poller,
        }
    }

    fn at(h: u32) -> DateTime<Tz> {
        Tokyo.with_ymd_and_hms(2024, 4, 1, h, 0, 0).unwrap()
    }

    #[tokio::test]
    async fn poll_dispatches() {
        let f = fixture().await;
        let report = f.poller.poll_at(&at(8)).await.unwrap();
        assert_eq!(report.tram_count, 1);
        assert_eq!(report.evaluation.dispatched, 1);
        assert_eq!(f.messenger.pushes_to("U1").await.len(), 1);
    }

    #[tokio::test]
    async fn poll_once_ignores_operating_hours() {
        let f = fixture().await;
        let poller = f.poller.with_hours(OperatingHours::new(23, 24).unwrap());
        let report = poller.poll_once().await.unwrap();
        assert_eq!(report.tram_count, 1);
        assert_eq!(f.source.fetch_count(), 1);
    }

    #[tokio::test]
    async fn smart_poll_respects_operating_hours() {
        let f = fixture().await;
        let outcome = f.poller.smart_poll_at(&at(3)).await.unwrap();
        assert_eq!(outcome, PollOutcome::OutsideHours);
        assert_eq!(f.source.fetch_count(), 0);

        let outcome = f.poller.smart_poll_at(&at(7)).await.unwrap();
        assert!(matches!(outcome, PollOutcome::Polled(r) if r.evaluation.dispatched == 1));
    }

    #[tokio::test]
    async fn fetch_failure_fails_the_cycle() {
        let f = fixture().await;
        f.source.fail_with_status(503).await;
        let result = f.poller.poll_at(&at(8)).await;
        assert!(matches!(result, Err(DriverError::Fetch(TramError::Api { status: 503, .. }))));
        assert!(f.messenger.deliveries().await.is_empty());
    }

    #[tokio::test]
    async fn cleanup_purges_old_history() {
        let f = fixture().await;
        let sub = f.store.active_subscriptions().await.unwrap()[0].subscription.id;
        let vehicle = crate::domain::VehicleId(1);
        f.store
            .record(sub, vehicle, Utc::now() - TimeDelta::hours(25))
            .await
            .unwrap();
        f.store
            .record(sub, vehicle, Utc::now() - TimeDelta::hours(1))
            .await
            .unwrap();

        let report = f.poller.cleanup().await.unwrap();
        assert_eq!(report.deleted, 1);
        assert_eq!(f.store.history_len().await, 1);
    }

    #[tokio::test]
    async fn morning_counts_trams_and_users() {
        let f = fixture().await;
        let report = f.poller.morning_at(&at(7)).await.unwrap();
        assert_eq!(report.tram_count, 1);
        assert_eq!(report.digest.sent, 1);
    }

    #[tokio::test(start_paused = true)]
    async fn start_and_stop() {
        let f = fixture().await;
        let poller = f.poller.with_hours(OperatingHours::new(0, 24).unwrap());
        assert!(!poller.is_running());

        assert!(poller.start(Duration::from_secs(30)).await);
        assert!(poller.is_running());
        assert!(!poller.clone().start(Duration::from_secs(30)).await);

        // First tick fires immediately, then every 30 s
        tokio::time::sleep(Duration::from_secs(65)).await;
        poller.stop().await;
        assert!(!poller.is_running());
        assert_eq!(f.source.fetch_count(), 3);
        assert_eq!(f.messenger.pushes_to("U1").await.len(), 1);

        // Stopping twice is harmless
        poller.stop().await;
    }
}
