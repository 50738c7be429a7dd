//! Once-a-day jobs: history cleanup and the morning digest.

use std::time::Duration;

use chrono::{DateTime, NaiveTime, TimeDelta, TimeZone};
use tokio::task::JoinSet;
use tracing::{error, info};

use super::poller::Poller;

/// How often history is purged.
pub const CLEANUP_INTERVAL: Duration = Duration::from_secs(24 * 60 * 60);

/// Time from `now` until the next local occurrence of `at`.
///
/// If `at` is exactly now, the next occurrence is tomorrow.
pub fn duration_until_next<Tz: TimeZone>(at: NaiveTime, now: &DateTime<Tz>) -> Duration {
    let tz = now.timezone();
    let today = now.date_naive();
    let next = [today, today + TimeDelta::days(1), today + TimeDelta::days(2)]
        .into_iter()
        .filter_map(|date| tz.from_local_datetime(&date.and_time(at)).earliest())
        .find(|candidate| candidate > now);

    match next {
        Some(next) => (next - now.clone()).to_std().unwrap_or_default(),
        None => Duration::from_secs(24 * 60 * 60),
    }
}

/// Spawn the cleanup and morning digest loops.
///
/// Dropping the returned set aborts them.
pub fn spawn_daily_jobs(poller: Poller, morning_at: NaiveTime) -> JoinSet<()> {
    let mut jobs = JoinSet::new();

    let cleanup = poller.clone();
    jobs.spawn(async move {
        let mut interval = tokio::time::interval(CLEANUP_INTERVAL);
        interval.tick().await; // First tick is immediate, skip it
        loop {
            interval.tick().await;
            match cleanup.cleanup().await {
                Ok(report) => info!(deleted = report.deleted, "history cleanup complete"),
                Err(e) => error!(error = %e, "history cleanup failed"),
            }
        }
    });

    jobs.spawn(async move {
        loop {
            let wait = duration_until_next(morning_at, &poller.now());
            info!(in_secs = wait.as_secs(), "next morning digest scheduled");
            tokio::time::sleep(wait).await;
            if let Err(e) = poller.morning().await {
                error!(error = %e, "morning digest failed");
            }
        }
    });

    jobs
}
