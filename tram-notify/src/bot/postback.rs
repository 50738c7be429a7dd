//! Postback data carried by buttons.
//!
//! Encoded as a form-style query string, e.g.
//! `action=select_trigger&station_id=8&direction=down&trigger=2`.

use std::collections::HashMap;
use std::fmt;

use thiserror::Error;

use crate::domain::{Direction, StationId};
use crate::store::SubscriptionId;

/// Trigger distances offered when creating a subscription.
pub const TRIGGER_CHOICES: std::ops::RangeInclusive<u8> = 1..=5;

/// A button press the bot understands.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Postback {
    NewSetting,
    SelectStation {
        station: StationId,
    },
    SelectDirection {
        station: StationId,
        direction: Direction,
    },
    SelectTrigger {
        station: StationId,
        direction: Direction,
        trigger: u8,
    },
    DeleteSetting {
        id: SubscriptionId,
    },
    ViewSettings,
}

/// Why postback data was rejected.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PostbackError {
    #[error("unknown action: {0:?}")]
    UnknownAction(String),

    #[error("missing field: {0}")]
    MissingField(&'static str),

    #[error("invalid {field}: {value:?}")]
    InvalidField { field: &'static str, value: String },
}

struct Fields<'a>(HashMap<&'a str, &'a str>);

impl<'a> Fields<'a> {
    fn parse(data: &'a str) -> Self {
        Self(
            data.split('&')
                .filter_map(|pair| pair.split_once('='))
                .map(|(k, v)| (k.trim(), v.trim()))
                .collect(),
        )
    }

    fn get(&self, field: &'static str) -> Result<&'a str, PostbackError> {
        self.0
            .get(field)
            .copied()
            .filter(|v| !v.is_empty())
            .ok_or(PostbackError::MissingField(field))
    }

    fn parse_with<T>(
        &self,
        field: &'static str,
        parse: impl FnOnce(&str) -> Option<T>,
    ) -> Result<T, PostbackError> {
        let value = self.get(field)?;
        parse(value).ok_or_else(|| PostbackError::InvalidField {
            field,
            value: value.to_string(),
        })
    }

    fn station(&self) -> Result<StationId, PostbackError> {
        self.parse_with("station_id", |v| v.parse().ok().map(StationId))
    }

    fn direction(&self) -> Result<Direction, PostbackError> {
        self.parse_with("direction", |v| Direction::parse(v).ok())
    }
}

impl Postback {
    pub fn parse(data: &str) -> Result<Self, PostbackError> {
        let fields = Fields::parse(data);
        let action = fields.0.get("action").copied().unwrap_or_default();

        match action {
            "new_setting" => Ok(Postback::NewSetting),
            "view_settings" => Ok(Postback::ViewSettings),
            "select_station" => Ok(Postback::SelectStation {
                station: fields.station()?,
            }),
            "select_direction" => Ok(Postback::SelectDirection {
                station: fields.station()?,
                direction: fields.direction()?,
            }),
            "select_trigger" => Ok(Postback::SelectTrigger {
                station: fields.station()?,
                direction: fields.direction()?,
                trigger: fields.parse_with("trigger", |v| {
                    v.parse().ok().filter(|n| TRIGGER_CHOICES.contains(n))
                })?,
            }),
            "delete_setting" => Ok(Postback::DeleteSetting {
                id: fields.parse_with("setting_id", SubscriptionId::parse)?,
            }),
            other => Err(PostbackError::UnknownAction(other.to_string())),
        }
    }
}

impl fmt::Display for Postback {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Postback::NewSetting => write!(f, "action=new_setting"),
            Postback::ViewSettings => write!(f, "action=view_settings"),
            Postback::SelectStation { station } => {
                write!(f, "action=select_station&station_id={station}")
            }
            Postback::SelectDirection { station, direction } => write!(
                f,
                "action=select_direction&station_id={station}&direction={}",
                direction.as_str()
            ),
            Postback::SelectTrigger {
                station,
                direction,
                trigger,
            } => write!(
                f,
                "action=select_trigger&station_id={station}&direction={}&trigger={trigger}",
                direction.as_str()
            ),
            Postback::DeleteSetting { id } => write!(f, "action=delete_setting&setting_id={id}"),
        }
    }
}
