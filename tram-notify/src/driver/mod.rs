//! Polling driver.
//!
//! Runs fetch-evaluate-dispatch cycles on a fixed timer inside the daily
//! operating hours, plus the once-a-day cleanup and morning digest jobs.
//! The same operations back the `/cron/*` endpoints for deployments that
//! trigger them externally.

mod daily;
mod hours;
mod poller;

pub use daily::{CLEANUP_INTERVAL, duration_until_next, spawn_daily_jobs};
pub use hours::{InvalidHours, OperatingHours};
pub use poller::{
    CleanupReport, DEFAULT_RETENTION, DriverError, MorningReport, PollOutcome, PollReport, Poller,
};
