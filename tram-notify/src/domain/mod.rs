//! Domain types for the tram network.
//!
//! Lines, directions, stations and position reports. All types enforce
//! their invariants at construction time, so code receiving them can
//! trust their validity.

mod direction;
mod line;
mod report;
mod station;

pub use direction::{Direction, InvalidDirection};
pub use line::{InvalidLine, Line};
pub use report::{IntervalCode, PositionReport, VehicleCategory, VehicleId};
pub use station::{Station, StationId};
