//! Notification evaluation.
//!
//! Each poll cycle checks every active subscription against the latest
//! position snapshot through three gates: the subscription's schedule, an
//! exact trigger-distance match, and a dedup window over the history store.

mod config;
mod evaluator;
mod morning;
mod schedule;

use thiserror::Error;

use crate::store::StoreError;

pub use config::NotifyConfig;
pub use evaluator::{EvaluationSummary, Notifier, Outcome};
pub use morning::{DigestSummary, station_status};
pub use schedule::{ScheduleGate, on_weekday, within_window};

/// Errors that abort an evaluation cycle.
#[derive(Debug, Error)]
pub enum NotifyError {
    #[error("store error: {0}")]
    Store(#[from] StoreError),
}
