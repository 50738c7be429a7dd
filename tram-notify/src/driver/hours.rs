//! Daily service window.

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, TimeZone, Timelike};
use thiserror::Error;

/// Half-open local-clock hour range during which polling runs.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct OperatingHours {
    pub start_hour: u32,
    pub end_hour: u32,
}

impl Default for OperatingHours {
    fn default() -> Self {
        Self {
            start_hour: 6,
            end_hour: 23,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("invalid operating hours {0:?}, expected e.g. \"6-23\"")]
pub struct InvalidHours(String);

impl OperatingHours {
    pub fn new(start_hour: u32, end_hour: u32) -> Result<Self, InvalidHours> {
        if start_hour >= end_hour || end_hour > 24 {
            return Err(InvalidHours(format!("{start_hour}-{end_hour}")));
        }
        Ok(Self {
            start_hour,
            end_hour,
        })
    }

    /// Whether `now`'s local hour is in `start_hour..end_hour`.
    pub fn contains<Tz: TimeZone>(&self, now: &DateTime<Tz>) -> bool {
        (self.start_hour..self.end_hour).contains(&now.hour())
    }
}

impl FromStr for OperatingHours {
    type Err = InvalidHours;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let invalid = || InvalidHours(s.to_string());
        let (start, end) = s.trim().split_once('-').ok_or_else(invalid)?;
        let start = start.trim().parse().map_err(|_| invalid())?;
        let end = end.trim().parse().map_err(|_| invalid())?;
        Self::new(start, end).map_err(|_| invalid())
    }
}

impl fmt::Display for OperatingHours {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:02}:00-{:02}:00", self.start_hour, self.end_hour)
    }
}
