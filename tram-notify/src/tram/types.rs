//! Upstream position feed wire format.
//!
//! `web01List` returns a bare JSON array, one object per running vehicle:
//!
//! ```json
//! [{"interval_id": 18, "rosen": "A", "us": 1, "vehicle_type": 2, "vehicle_id": 1093}]
//! ```

use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;
use tracing::debug;

use crate::domain::{Direction, Line, PositionReport};

use super::error::TramError;

/// One element of the upstream array, before validation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RawPosition {
    pub interval_id: u32,
    pub rosen: String,
    pub us: u8,
    #[serde(default, deserialize_with = "lenient_category")]
    pub vehicle_type: u8,
    pub vehicle_id: u32,
}

impl RawPosition {
    /// Validate line and direction.
    pub fn to_report(&self) -> Option<PositionReport> {
        let line = Line::parse(&self.rosen).ok()?;
        let direction = Direction::from_flag(self.us).ok()?;
        Some(PositionReport::new(
            self.interval_id,
            line,
            direction,
            self.vehicle_type,
            self.vehicle_id,
        ))
    }
}

impl From<&PositionReport> for RawPosition {
    fn from(report: &PositionReport) -> Self {
        Self {
            interval_id: report.interval.0,
            rosen: report.line.as_str().to_string(),
            us: report.direction.flag(),
            vehicle_type: report.category.0,
            vehicle_id: report.vehicle.0,
        }
    }
}

/// Car type code; anything unrecognised counts as an ordinary car.
fn lenient_category<'de, D: Deserializer<'de>>(deserializer: D) -> Result<u8, D::Error> {
    let value = Value::deserialize(deserializer)?;
    let code = match &value {
        Value::Number(n) => n.as_u64().and_then(|n| u8::try_from(n).ok()),
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    };
    Ok(code.unwrap_or_default())
}

fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

/// Parse a feed body into reports.
///
/// A body that is not JSON, or not an array, is an error. Elements that do
/// not describe a known line and direction are dropped.
pub fn parse_positions(body: &str) -> Result<Vec<PositionReport>, TramError> {
    let value: Value = serde_json::from_str(body).map_err(|e| TramError::Json {
        message: e.to_string(),
        body: Some(body.chars().take(200).collect()),
    })?;

    let items = match value {
        Value::Array(items) => items,
        other => {
            return Err(TramError::NotAList {
                found: json_kind(&other),
            });
        }
    };

    let mut reports = Vec::with_capacity(items.len());
    for item in items {
        let report = serde_json::from_value::<RawPosition>(item.clone())
            .ok()
            .and_then(|raw| raw.to_report());
        match report {
            Some(report) => reports.push(report),
            None => debug!(%item, "skipping unrecognised position entry"),
        }
    }
    Ok(reports)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{IntervalCode, VehicleId};

    #[test]
    fn parse_feed() {
        let body = r#"[
            {"interval_id": 18, "rosen": "A", "us": 1, "vehicle_type": 2, "vehicle_id": 1093},
            {"interval_id": 205, "rosen": "B", "us": 0, "vehicle_type": 1, "vehicle_id": 8201}
        ]"#;
        let reports = parse_positions(body).unwrap();
        assert_eq!(reports.len(), 2);
        assert_eq!(reports[0].interval, IntervalCode(18));
        assert_eq!(reports[0].direction, Direction::Down);
        assert!(reports[0].category.is_super_low_floor());
        assert_eq!(reports[1].line, Line::B);
        assert_eq!(reports[1].vehicle, VehicleId(8201));
    }

    #[test]
    fn empty_array_is_ok() {
        assert!(parse_positions("[]").unwrap().is_empty());
    }

    #[test]
    fn non_list_is_rejected() {
        let err = parse_positions(r#"{"error": "maintenance"}"#).unwrap_err();
        assert!(matches!(err, TramError::NotAList { found: "object" }));
        let err = parse_positions("null").unwrap_err();
        assert!(matches!(err, TramError::NotAList { found: "null" }));
    }

    #[test]
    fn malformed_json_is_rejected() {
        let err = parse_positions("<html>").unwrap_err();
        assert!(matches!(err, TramError::Json { .. }));
    }

    #[test]
    fn unknown_entries_are_skipped() {
        let body = r#"[
            {"interval_id": 18, "rosen": "C", "us": 1, "vehicle_type": 1, "vehicle_id": 1},
            {"interval_id": 18, "rosen": "A", "us": 7, "vehicle_type": 1, "vehicle_id": 2},
            {"interval_id": "x", "rosen": "A", "us": 1, "vehicle_type": 1, "vehicle_id": 3},
            {"interval_id": 18, "rosen": "A", "us": 1, "vehicle_type": 1, "vehicle_id": 4}
        ]"#;
        let reports = parse_positions(body).unwrap();
        assert_eq!(reports.len(), 1);
        assert_eq!(reports[0].vehicle, VehicleId(4));
    }

    #[test]
    fn odd_vehicle_types_keep_the_entry() {
        let body = r#"[
            {"interval_id": 18, "rosen": "A", "us": 1, "vehicle_type": 300, "vehicle_id": 1},
            {"interval_id": 18, "rosen": "A", "us": 1, "vehicle_type": "2", "vehicle_id": 2},
            {"interval_id": 18, "rosen": "A", "us": 1, "vehicle_type": 1.5, "vehicle_id": 3},
            {"interval_id": 18, "rosen": "A", "us": 1, "vehicle_type": null, "vehicle_id": 4},
            {"interval_id": 18, "rosen": "A", "us": 1, "vehicle_id": 5}
        ]"#;
        let reports = parse_positions(body).unwrap();
        assert_eq!(reports.len(), 5);
        assert!(reports[1].category.is_super_low_floor());
        for i in [0, 2, 3, 4] {
            assert_eq!(reports[i].category.description(), "一般車");
        }
    }

    #[test]
    fn raw_round_trip() {
        let report = PositionReport::new(30, Line::B, Direction::Up, 2, 5);
        let raw = RawPosition::from(&report);
        assert_eq!(raw.rosen, "B");
        assert_eq!(raw.us, 0);
        assert_eq!(raw.to_report(), Some(report));
    }
}
