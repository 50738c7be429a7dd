//! Interval segmentation tables.
//!
//! Each (line, direction) pair has an authored, ordered list of groups of raw
//! interval codes. Groups alternate between "at a station" and "between two
//! stations", starting with a station. Replaying the list while advancing a
//! station cursor on every at-station group yields the code → station lookup.

use std::collections::{HashMap, HashSet};

use crate::domain::{Direction, IntervalCode, Line, StationId};

use super::TopologyError;

/// Whether a group represents standing at a station or running between two.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum GroupKind {
    AtStation,
    Between,
}

/// One authored group of interval codes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SegmentGroup {
    pub kind: GroupKind,
    pub codes: &'static [u32],
}

impl SegmentGroup {
    pub const fn at(codes: &'static [u32]) -> Self {
        Self {
            kind: GroupKind::AtStation,
            codes,
        }
    }

    pub const fn between(codes: &'static [u32]) -> Self {
        Self {
            kind: GroupKind::Between,
            codes,
        }
    }

    pub fn is_at_station(&self) -> bool {
        self.kind == GroupKind::AtStation
    }
}

/// Where a resolved interval code places a vehicle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Placement {
    /// The station the vehicle is at, or approaching.
    pub station: StationId,
    /// Index of `station` in the line's station order.
    pub index: usize,
    /// True for at-station groups, false for between-station groups.
    pub at_station: bool,
}

/// Resolved lookup for one (line, direction) pair.
#[derive(Debug, Clone)]
pub struct IntervalTable {
    groups: &'static [SegmentGroup],
    lookup: HashMap<IntervalCode, Placement>,
    unplaced: Vec<IntervalCode>,
}

impl IntervalTable {
    /// Replay `groups` against `order` and build the code lookup.
    ///
    /// For between-station groups the approached station depends on
    /// direction: going down it is the next unconsumed station, going up it
    /// is the station consumed last. Groups whose station index falls outside
    /// `order` are kept in the table but resolve to nothing.
    pub fn build(
        line: Line,
        direction: Direction,
        groups: &'static [SegmentGroup],
        order: &[StationId],
    ) -> Result<Self, TopologyError> {
        let mut lookup = HashMap::new();
        let mut unplaced = Vec::new();
        let mut seen = HashSet::new();
        let mut cursor = 0usize;

        for (position, group) in groups.iter().enumerate() {
            let expected = if position % 2 == 0 {
                GroupKind::AtStation
            } else {
                GroupKind::Between
            };
            if group.kind != expected {
                return Err(TopologyError::BrokenParity {
                    line,
                    direction,
                    position,
                });
            }
            if group.codes.is_empty() {
                return Err(TopologyError::EmptyGroup {
                    line,
                    direction,
                    position,
                });
            }

            let index = match group.kind {
                GroupKind::AtStation => {
                    let index = cursor;
                    cursor += 1;
                    Some(index)
                }
                GroupKind::Between => match direction {
                    Direction::Down => Some(cursor),
                    Direction::Up => cursor.checked_sub(1),
                },
            };

            let placement = index.and_then(|index| {
                order.get(index).map(|&station| Placement {
                    station,
                    index,
                    at_station: group.is_at_station(),
                })
            });

            for &raw in group.codes {
                let code = IntervalCode(raw);
                if !seen.insert(code) {
                    return Err(TopologyError::DuplicateCode {
                        line,
                        direction,
                        code,
                    });
                }
                match placement {
                    Some(placement) => {
                        lookup.insert(code, placement);
                    }
                    None => unplaced.push(code),
                }
            }
        }

        Ok(Self {
            groups,
            lookup,
            unplaced,
        })
    }

    pub fn groups(&self) -> &'static [SegmentGroup] {
        self.groups
    }

    pub fn resolve(&self, code: IntervalCode) -> Option<Placement> {
        self.lookup.get(&code).copied()
    }

    /// Codes present in the table that map to no station.
    pub fn unplaced(&self) -> &[IntervalCode] {
        &self.unplaced
    }}

#[cfg(test)]
mod tests {
    use super::*;

    const ORDER: [StationId; 3] = [StationId(1), StationId(2), StationId(3)];

    static SIMPLE: [SegmentGroup; 5] = [
        SegmentGroup::at(&[1]),
        SegmentGroup::between(&[2, 3]),
        SegmentGroup::at(&[4]),
        SegmentGroup::between(&[5]),
        SegmentGroup::at(&[6]),
    ];

    static OVERRUN: [SegmentGroup; 5] = [
        SegmentGroup::at(&[1]),
        SegmentGroup::between(&[2]),
        SegmentGroup::at(&[3]),
        SegmentGroup::between(&[4]),
        SegmentGroup::at(&[5]),
    ];

    static BROKEN: [SegmentGroup; 3] = [
        SegmentGroup::at(&[1]),
        SegmentGroup::at(&[2]),
        SegmentGroup::between(&[3]),
    ];

    static STARTS_BETWEEN: [SegmentGroup; 2] =
        [SegmentGroup::between(&[1]), SegmentGroup::at(&[2])];

    static DUPLICATED: [SegmentGroup; 3] = [
        SegmentGroup::at(&[1]),
        SegmentGroup::between(&[2, 1]),
        SegmentGroup::at(&[3]),
    ];

    static EMPTY: [SegmentGroup; 2] = [SegmentGroup::at(&[1]), SegmentGroup::between(&[])];

    fn placement(station: u16, index: usize, at_station: bool) -> Placement {
        Placement {
            station: StationId(station),
            index,
            at_station,
        }
    }

    #[test]
    fn at_station_groups_consume_stations_in_order() {
        let table = IntervalTable::build(Line::A, Direction::Down, &SIMPLE, &ORDER).unwrap();
        assert_eq!(table.resolve(IntervalCode(1)), Some(placement(1, 0, true)));
        assert_eq!(table.resolve(IntervalCode(4)), Some(placement(2, 1, true)));
        assert_eq!(table.resolve(IntervalCode(6)), Some(placement(3, 2, true)));
    }

    #[test]
    fn between_groups_approach_next_station_going_down() {
        let table = IntervalTable::build(Line::A, Direction::Down, &SIMPLE, &ORDER).unwrap();
        assert_eq!(table.resolve(IntervalCode(2)), Some(placement(2, 1, false)));
        assert_eq!(table.resolve(IntervalCode(3)), Some(placement(2, 1, false)));
        assert_eq!(table.resolve(IntervalCode(5)), Some(placement(3, 2, false)));
    }

    #[test]
    fn between_groups_approach_previous_station_going_up() {
        let table = IntervalTable::build(Line::A, Direction::Up, &SIMPLE, &ORDER).unwrap();
        assert_eq!(table.resolve(IntervalCode(2)), Some(placement(1, 0, false)));
        assert_eq!(table.resolve(IntervalCode(5)), Some(placement(2, 1, false)));
    }

    #[test]
    fn groups_past_the_last_station_are_unplaced() {
        let order = [StationId(1), StationId(2)];
        let down = IntervalTable::build(Line::A, Direction::Down, &OVERRUN, &order).unwrap();
        // Approaching a third station that does not exist, then standing at it.
        assert_eq!(down.resolve(IntervalCode(4)), None);
        assert_eq!(down.resolve(IntervalCode(5)), None);
        assert_eq!(down.unplaced(), &[IntervalCode(4), IntervalCode(5)]);

        let up = IntervalTable::build(Line::A, Direction::Up, &OVERRUN, &order).unwrap();
        assert_eq!(up.resolve(IntervalCode(4)), Some(placement(2, 1, false)));
        assert_eq!(up.resolve(IntervalCode(5)), None);
    }

    #[test]
    fn unknown_code_is_not_found() {
        let table = IntervalTable::build(Line::A, Direction::Down, &SIMPLE, &ORDER).unwrap();
        assert_eq!(table.resolve(IntervalCode(99)), None);
    }

    #[test]
    fn broken_parity_rejected() {
        let err = IntervalTable::build(Line::B, Direction::Up, &BROKEN, &ORDER).unwrap_err();
        assert!(matches!(
            err,
            TopologyError::BrokenParity {
                line: Line::B,
                direction: Direction::Up,
                position: 1
            }
        ));

        let err =
            IntervalTable::build(Line::A, Direction::Down, &STARTS_BETWEEN, &ORDER).unwrap_err();
        assert!(matches!(err, TopologyError::BrokenParity { position: 0, .. }));
    }

    #[test]
    fn duplicate_code_rejected() {
        let err = IntervalTable::build(Line::A, Direction::Down, &DUPLICATED, &ORDER).unwrap_err();
        assert!(matches!(
            err,
            TopologyError::DuplicateCode {
                code: IntervalCode(1),
                ..
            }
        ));
    }

    #[test]
    fn empty_group_rejected() {
        let err = IntervalTable::build(Line::A, Direction::Down, &EMPTY, &ORDER).unwrap_err();
        assert!(matches!(err, TopologyError::EmptyGroup { position: 1, .. }));
    }

    #[test]
    fn build_is_deterministic() {
        let a = IntervalTable::build(Line::A, Direction::Down, &SIMPLE, &ORDER).unwrap();
        let b = IntervalTable::build(Line::A, Direction::Down, &SIMPLE, &ORDER).unwrap();
        for code in 0..10 {
            assert_eq!(a.resolve(IntervalCode(code)), b.resolve(IntervalCode(code)));
        }
    }
}
