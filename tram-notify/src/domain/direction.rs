//! Travel direction.
//!
//! Direction is relative to each line's own orientation: `Up` runs toward
//! the line-specific terminus, `Down` runs toward the shared terminus. The
//! upstream feed encodes this as a flag (`0` = up, `1` = down).

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// Error returned for an unknown direction flag or name.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("invalid direction: {0}")]
pub struct InvalidDirection(pub String);

/// Travel direction of a tram or a subscription.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Direction {
    /// Toward the line-specific terminus (decreasing station index).
    Up,
    /// Toward the shared terminus (increasing station index).
    Down,
}

impl Direction {
    /// Decode the upstream `us` flag.
    pub fn from_flag(flag: u8) -> Result<Self, InvalidDirection> {
        match flag {
            0 => Ok(Direction::Up),
            1 => Ok(Direction::Down),
            other => Err(InvalidDirection(other.to_string())),
        }
    }

    /// The upstream `us` flag for this direction.
    pub fn flag(&self) -> u8 {
        match self {
            Direction::Up => 0,
            Direction::Down => 1,
        }
    }

    /// Parse the stored name ("up" / "down").
    pub fn parse(s: &str) -> Result<Self, InvalidDirection> {
        match s.trim().to_ascii_lowercase().as_str() {
            "up" => Ok(Direction::Up),
            "down" => Ok(Direction::Down),
            other => Err(InvalidDirection(other.to_string())),
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Direction::Up => "up",
            Direction::Down => "down",
        }
    }

    pub fn reversed(&self) -> Self {
        match self {
            Direction::Up => Direction::Down,
            Direction::Down => Direction::Up,
        }
    }
}

impl FromStr for Direction {
    type Err = InvalidDirection;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Direction::parse(s)
    }
}

impl fmt::Display for Direction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
