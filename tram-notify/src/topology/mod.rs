//! Network topology: stations, per-line station orders and interval tables.
//!
//! The topology is built once at startup and is immutable afterwards, so a
//! single `Arc<Topology>` can be shared by every poll cycle and request
//! handler without locking.

mod data;
mod segments;

use std::collections::HashMap;

use crate::domain::{Direction, IntervalCode, Line, Station, StationId};

pub use segments::{GroupKind, IntervalTable, Placement, SegmentGroup};

/// Errors detected while building a topology.
///
/// Any of these means the built-in tables were edited incorrectly.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum TopologyError {
    #[error("line {line} order references unknown station {station}")]
    UnknownStation { line: Line, station: StationId },

    #[error("station {station} is in line {line} order but does not serve that line")]
    StationNotOnLine { line: Line, station: StationId },

    #[error("station {station} appears more than once in line {line} order")]
    DuplicateStation { line: Line, station: StationId },

    #[error("station id {0} is defined more than once")]
    DuplicateStationId(StationId),

    #[error("no definition for line {0}")]
    MissingLine(Line),

    #[error("{line}/{direction} group {position} breaks the at-station/between alternation")]
    BrokenParity {
        line: Line,
        direction: Direction,
        position: usize,
    },

    #[error("{line}/{direction} group {position} has no interval codes")]
    EmptyGroup {
        line: Line,
        direction: Direction,
        position: usize,
    },

    #[error("{line}/{direction} lists interval code {code} more than once")]
    DuplicateCode {
        line: Line,
        direction: Direction,
        code: IntervalCode,
    },
}

/// Authored description of one line.
#[derive(Debug, Clone, Copy)]
pub struct LineSpec {
    pub line: Line,
    /// Stations from the line-specific terminus to the shared terminus.
    pub order: &'static [StationId],
    pub up: &'static [SegmentGroup],
    pub down: &'static [SegmentGroup],
}

#[derive(Debug, Clone)]
struct LineData {
    order: &'static [StationId],
    index_of: HashMap<StationId, usize>,
    up: IntervalTable,
    down: IntervalTable,
}

impl LineData {
    fn table(&self, direction: Direction) -> &IntervalTable {
        match direction {
            Direction::Up => &self.up,
            Direction::Down => &self.down,
        }
    }
}

/// The whole tram network.
#[derive(Debug, Clone)]
pub struct Topology {
    stations: Vec<Station>,
    by_id: HashMap<StationId, usize>,
    a: LineData,
    b: LineData,
}

impl Topology {
    /// Validate and index a network description.
    pub fn new(stations: Vec<Station>, lines: &[LineSpec]) -> Result<Self, TopologyError> {
        let mut by_id = HashMap::with_capacity(stations.len());
        for (i, station) in stations.iter().enumerate() {
            if by_id.insert(station.id, i).is_some() {
                return Err(TopologyError::DuplicateStationId(station.id));
            }
        }

        let build_line = |line: Line| -> Result<LineData, TopologyError> {
            let spec = lines
                .iter()
                .find(|spec| spec.line == line)
                .ok_or(TopologyError::MissingLine(line))?;

            let mut index_of = HashMap::with_capacity(spec.order.len());
            for (index, &id) in spec.order.iter().enumerate() {
                let station = by_id
                    .get(&id)
                    .map(|&i| &stations[i])
                    .ok_or(TopologyError::UnknownStation { line, station: id })?;
                if !station.serves(line) {
                    return Err(TopologyError::StationNotOnLine { line, station: id });
                }
                if index_of.insert(id, index).is_some() {
                    return Err(TopologyError::DuplicateStation { line, station: id });
                }
            }

            Ok(LineData {
                order: spec.order,
                index_of,
                up: IntervalTable::build(line, Direction::Up, spec.up, spec.order)?,
                down: IntervalTable::build(line, Direction::Down, spec.down, spec.order)?,
            })
        };

        let a = build_line(Line::A)?;
        let b = build_line(Line::B)?;

        Ok(Self {
            stations,
            by_id,
            a,
            b,
        })
    }

    /// The Kumamoto city tram network.
    pub fn builtin() -> Result<Self, TopologyError> {
        Self::new(
            data::STATIONS.to_vec(),
            &[
                LineSpec {
                    line: Line::A,
                    order: &data::A_ORDER,
                    up: &data::A_UP,
                    down: &data::A_DOWN,
                },
                LineSpec {
                    line: Line::B,
                    order: &data::B_ORDER,
                    up: &data::B_UP,
                    down: &data::B_DOWN,
                },
            ],
        )
    }

    fn line(&self, line: Line) -> &LineData {
        match line {
            Line::A => &self.a,
            Line::B => &self.b,
        }
    }

    /// All stations, in definition order.
    pub fn stations(&self) -> &[Station] {
        &self.stations
    }

    pub fn station(&self, id: StationId) -> Option<&Station> {
        self.by_id.get(&id).map(|&i| &self.stations[i])
    }

    /// Look up a station by display name or kana reading.
    pub fn station_by_name(&self, name: &str) -> Option<&Station> {
        let name = name.trim();
        self.stations
            .iter()
            .find(|s| s.name == name || s.kana == name)
    }

    /// Station ids of `line`, from its own terminus to the shared terminus.
    pub fn station_order(&self, line: Line) -> &[StationId] {
        self.line(line).order
    }

    /// Position of `station` in `line`'s order, if the line serves it.
    pub fn index_of(&self, line: Line, station: StationId) -> Option<usize> {
        self.line(line).index_of.get(&station).copied()
    }

    pub fn segment_groups(&self, line: Line, direction: Direction) -> &'static [SegmentGroup] {
        self.line(line).table(direction).groups()
    }

    pub fn interval_table(&self, line: Line, direction: Direction) -> &IntervalTable {
        self.line(line).table(direction)
    }

    /// Where a raw interval code places a vehicle travelling on `line` in `direction`.
    pub fn resolve(
        &self,
        line: Line,
        direction: Direction,
        code: IntervalCode,
    ) -> Option<Placement> {
        self.line(line).table(direction).resolve(code)
    }

    /// The station a vehicle on `line` heading in `direction` terminates at.
    pub fn terminus(&self, line: Line, direction: Direction) -> Option<&Station> {
        let order = self.line(line).order;
        let id = match direction {
            Direction::Up => order.first(),
            Direction::Down => order.last(),
        }?;
        self.station(*id)
    }

    /// Rider-facing label for travelling from `station` in `direction`,
    /// e.g. "健軍町方面". Up-bound labels use the station's primary line.
    pub fn direction_label(&self, station: &Station, direction: Direction) -> String {
        self.line_direction_label(station.primary_line(), direction)
    }

    /// Label for a vehicle on `line` heading in `direction`.
    pub fn line_direction_label(&self, line: Line, direction: Direction) -> String {
        match self.terminus(line, direction) {
            Some(terminus) => format!("{}方面", terminus.name),
            None => format!("{line}系統 {direction}"),
        }
    }
}
