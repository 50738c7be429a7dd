//! Notification policy knobs.

use std::ops::RangeInclusive;

use chrono::TimeDelta;

/// Configuration for the notification evaluator.
#[derive(Debug, Clone)]
pub struct NotifyConfig {
    /// No repeat notification for the same subscription and vehicle within this window.
    pub dedup_window: TimeDelta,

    /// Stops-away range considered by the morning digest.
    pub morning_horizon: RangeInclusive<i32>,

    /// Trams listed per station in the morning digest.
    pub morning_max_trams: usize,

    /// Stops-away range shown by the "now" command.
    pub now_horizon: RangeInclusive<i32>,

    /// Trams listed per station by the "now" command.
    pub now_max_trams: usize,
}

impl Default for NotifyConfig {
    fn default() -> Self {
        Self {
            dedup_window: TimeDelta::minutes(30),
            morning_horizon: 1..=15,
            morning_max_trams: 2,
            now_horizon: 0..=5,
            now_max_trams: 3,
        }
    }
}

impl NotifyConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_dedup_window(mut self, window: TimeDelta) -> Self {
        self.dedup_window = window;
        self
    }

    pub fn with_morning(mut self, horizon: RangeInclusive<i32>, max_trams: usize) -> Self {
        self.morning_horizon = horizon;
        self.morning_max_trams = max_trams;
        self
    }
}
