//! Station reference types.

use std::fmt;

use serde::{Deserialize, Serialize};

use super::Line;

/// Numeric station identifier, as stored in subscriptions.
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct StationId(pub u16);

impl fmt::Debug for StationId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "StationId({})", self.0)
    }
}

impl fmt::Display for StationId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A tram stop.
///
/// Immutable reference data; the full set is built once at startup.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Station {
    pub id: StationId,
    pub name: &'static str,
    pub kana: &'static str,
    pub lines: &'static [Line],
}

impl Station {
    /// Whether this station is served by `line`.
    pub fn serves(&self, line: Line) -> bool {
        self.lines.contains(&line)
    }

    /// Whether the station lies on the shared corridor.
    pub fn is_shared(&self) -> bool {
        self.serves(Line::A) && self.serves(Line::B)
    }

    /// The line used when labelling this station's directions.
    ///
    /// Shared stations are labelled using line A's terminus.
    pub fn primary_line(&self) -> Line {
        self.lines.first().copied().unwrap_or(Line::A)
    }
}
