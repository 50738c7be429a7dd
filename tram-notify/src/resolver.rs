//! Position-to-distance resolution.
//!
//! Turns a raw position report and a target (station, direction) into a
//! signed stop count and an arrival estimate. Everything here is a pure
//! function over an immutable [`Topology`].

use std::ops::RangeInclusive;

use tracing::debug;

use crate::domain::{Direction, PositionReport, StationId};
use crate::topology::Topology;

/// Minutes a tram takes per stop, on average.
pub const PER_STOP_MINUTES: f64 = 2.0;

/// The stop and travel direction a rider cares about.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Target {
    pub station: StationId,
    pub direction: Direction,
}

impl Target {
    pub fn new(station: StationId, direction: Direction) -> Self {
        Self { station, direction }
    }
}

/// How far a tram is from a target.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Distance {
    /// Positive while approaching, zero or negative once at or past the target.
    pub stops_away: i32,
    pub estimated_minutes: u32,
}

impl Distance {
    pub fn from_stops(stops_away: i32) -> Self {
        Self {
            stops_away,
            estimated_minutes: estimate_minutes(stops_away),
        }
    }
}

/// Why a report says nothing about a target.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum Inapplicable {
    #[error("report direction differs from target direction")]
    DirectionMismatch,

    #[error("interval code does not resolve to a station")]
    UnknownInterval,

    #[error("target station is not on the report's line")]
    StationNotOnLine,
}

/// Stops from `current` to `target` for a tram travelling in `direction`.
///
/// Down-bound trams move toward higher indices, up-bound toward lower.
pub fn signed_stops(direction: Direction, current: usize, target: usize) -> i32 {
    let current = current as i32;
    let target = target as i32;
    match direction {
        Direction::Down => target - current,
        Direction::Up => current - target,
    }
}

/// Linear arrival estimate, never below one minute.
pub fn estimate_minutes(stops_away: i32) -> u32 {
    let minutes = (f64::from(stops_away) * PER_STOP_MINUTES).round();
    if minutes < 1.0 { 1 } else { minutes as u32 }
}

/// Distance of the tram in `report` from `target`.
///
/// Returns the raw signed value; whether a negative or large distance is
/// interesting is up to the caller.
pub fn resolve_distance(
    topology: &Topology,
    report: &PositionReport,
    target: &Target,
) -> Result<Distance, Inapplicable> {
    if report.direction != target.direction {
        return Err(Inapplicable::DirectionMismatch);
    }

    let placement = topology
        .resolve(report.line, report.direction, report.interval)
        .ok_or(Inapplicable::UnknownInterval)?;

    let target_index = topology
        .index_of(report.line, target.station)
        .ok_or(Inapplicable::StationNotOnLine)?;

    Ok(Distance::from_stops(signed_stops(
        target.direction,
        placement.index,
        target_index,
    )))
}

/// A report together with its distance from some target.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Approach<'a> {
    pub report: &'a PositionReport,
    pub distance: Distance,
}

/// Reports whose distance from `target` falls within `range`, closest first.
///
/// Ties keep their input order.
pub fn approaching<'a>(
    topology: &Topology,
    reports: &'a [PositionReport],
    target: &Target,
    range: RangeInclusive<i32>,
) -> Vec<Approach<'a>> {
    let mut found: Vec<Approach<'a>> = reports
        .iter()
        .filter_map(|report| match resolve_distance(topology, report, target) {
            Ok(distance) => Some(Approach { report, distance }),
            Err(Inapplicable::DirectionMismatch) => None,
            Err(reason) => {
                debug!(
                    vehicle = %report.vehicle,
                    interval = %report.interval,
                    line = %report.line,
                    %reason,
                    "skipping report"
                );
                None
            }
        })
        .filter(|approach| range.contains(&approach.distance.stops_away))
        .collect();

    found.sort_by_key(|approach| approach.distance.stops_away);
    found
}
