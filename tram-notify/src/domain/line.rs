//! Tram line identifiers.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// Error returned when parsing an unknown line code.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("invalid line code: {0:?}")]
pub struct InvalidLine(pub String);

/// One of the two tram lines.
///
/// Both lines start at their own terminus and run into a shared corridor
/// that ends at the common terminus.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Line {
    A,
    B,
}

impl Line {
    /// Both lines, in canonical order.
    pub const ALL: [Line; 2] = [Line::A, Line::B];

    /// Parse the upstream `rosen` code ("A" or "B").
    pub fn parse(s: &str) -> Result<Self, InvalidLine> {
        match s.trim() {
            "A" | "a" => Ok(Line::A),
            "B" | "b" => Ok(Line::B),
            other => Err(InvalidLine(other.to_string())),
        }
    }

    /// The single-letter code.
    pub fn as_str(&self) -> &'static str {
        match self {
            Line::A => "A",
            Line::B => "B",
        }
    }
}

impl FromStr for Line {
    type Err = InvalidLine;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Line::parse(s)
    }
}

impl fmt::Display for Line {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
