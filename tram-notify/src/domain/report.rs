//! Vehicle position reports.
//!
//! One report per vehicle per poll. Reports are consumed by the evaluator
//! and discarded; nothing here is persisted.

use std::fmt;

use serde::{Deserialize, Serialize};

use super::{Direction, Line};

/// Opaque upstream interval identifier.
///
/// Only meaningful together with the line and direction it was reported on.
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct IntervalCode(pub u32);

impl fmt::Debug for IntervalCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "IntervalCode({})", self.0)
    }
}

impl fmt::Display for IntervalCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Upstream vehicle identifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct VehicleId(pub u32);

impl fmt::Display for VehicleId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Upstream vehicle category code.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct VehicleCategory(pub u8);

impl VehicleCategory {
    /// Category code used for super-low-floor cars.
    pub const SUPER_LOW_FLOOR: VehicleCategory = VehicleCategory(2);

    pub fn is_super_low_floor(&self) -> bool {
        *self == Self::SUPER_LOW_FLOOR
    }

    /// Rider-facing description of the car type.
    pub fn description(&self) -> &'static str {
        if self.is_super_low_floor() {
            "超低床車"
        } else {
            "一般車"
        }
    }
}

/// A single polled vehicle position.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PositionReport {
    pub interval: IntervalCode,
    pub line: Line,
    pub direction: Direction,
    pub category: VehicleCategory,
    pub vehicle: VehicleId,
}

impl PositionReport {
    pub fn new(
        interval: u32,
        line: Line,
        direction: Direction,
        category: u8,
        vehicle: u32,
    ) -> Self {
        Self {
            interval: IntervalCode(interval),
            line,
            direction,
            category: VehicleCategory(category),
            vehicle: VehicleId(vehicle),
        }
    }
}
