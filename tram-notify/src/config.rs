//! Service configuration from environment variables.

use std::net::SocketAddr;
use std::path::PathBuf;
use std::time::Duration;

use chrono::NaiveTime;
use chrono_tz::Tz;
use thiserror::Error;

use crate::driver::OperatingHours;
use crate::store::PostgrestConfig;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConfigError {
    /// A required variable is unset or empty.
    #[error("{0} must be set")]
    Missing(&'static str),

    /// A variable could not be parsed.
    #[error("invalid {var}={value:?}: {reason}")]
    Invalid {
        var: &'static str,
        value: String,
        reason: String,
    },

    /// Only one half of a variable pair is set.
    #[error("{present} is set but {missing} is not")]
    IncompletePair {
        present: &'static str,
        missing: &'static str,
    },
}

/// Everything read from the environment at startup.
#[derive(Debug, Clone)]
pub struct AppConfig {
    /// LINE channel access token; `None` only in dry-run mode
    pub line_token: Option<String>,
    /// Key for webhook signature verification
    pub channel_secret: String,
    /// Record messages instead of calling LINE
    pub dry_run: bool,
    /// Supabase connection; `None` selects the in-memory store
    pub store: Option<PostgrestConfig>,
    pub cron_secret: Option<String>,
    pub bind_addr: SocketAddr,
    pub poll_interval: Duration,
    pub polling_enabled: bool,
    /// Override for the position API base URL
    pub tram_api_url: Option<String>,
    /// Serve positions from this snapshot instead of the live API
    pub tram_mock_file: Option<PathBuf>,
    pub timezone: Tz,
    pub morning_time: NaiveTime,
    pub operating_hours: OperatingHours,
}

impl AppConfig {
    /// Read the process environment.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Read configuration through `lookup`. Empty values count as unset.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let get = |name: &str| lookup(name).filter(|v| !v.trim().is_empty());

        let dry_run = parse_flag(&get, "LINE_DRY_RUN", false)?;
        let line_token = get("LINE_CHANNEL_ACCESS_TOKEN");
        if line_token.is_none() && !dry_run {
            return Err(ConfigError::Missing("LINE_CHANNEL_ACCESS_TOKEN"));
        }
        let channel_secret =
            get("LINE_CHANNEL_SECRET").ok_or(ConfigError::Missing("LINE_CHANNEL_SECRET"))?;

        let store = match (get("SUPABASE_URL"), get("SUPABASE_ANON_KEY")) {
            (Some(url), Some(key)) => Some(PostgrestConfig::new(url, key)),
            (None, None) => None,
            (Some(_), None) => {
                return Err(ConfigError::IncompletePair {
                    present: "SUPABASE_URL",
                    missing: "SUPABASE_ANON_KEY",
                });
            }
            (None, Some(_)) => {
                return Err(ConfigError::IncompletePair {
                    present: "SUPABASE_ANON_KEY",
                    missing: "SUPABASE_URL",
                });
            }
        };

        let bind_addr = parse(&get, "BIND_ADDR", "127.0.0.1:3000", |s| {
            s.parse::<SocketAddr>().map_err(|e| e.to_string())
        })?;
        let poll_interval = parse(&get, "POLL_INTERVAL_SECS", "30", |s| {
            match s.parse::<u64>() {
                Ok(0) => Err("must be positive".to_string()),
                Ok(secs) => Ok(Duration::from_secs(secs)),
                Err(e) => Err(e.to_string()),
            }
        })?;
        let timezone = parse(&get, "TZ_NAME", "Asia/Tokyo", |s| {
            s.parse::<Tz>().map_err(|_| "unknown time zone".to_string())
        })?;
        let morning_time = parse(&get, "MORNING_TIME", "07:25", |s| {
            NaiveTime::parse_from_str(s, "%H:%M").map_err(|e| e.to_string())
        })?;
        let operating_hours = parse(&get, "OPERATING_HOURS", "6-23", |s| {
            s.parse::<OperatingHours>().map_err(|e| e.to_string())
        })?;

        Ok(Self {
            line_token,
            channel_secret,
            dry_run,
            store,
            cron_secret: get("CRON_SECRET"),
            bind_addr,
            poll_interval,
            polling_enabled: parse_flag(&get, "POLLING_ENABLED", true)?,
            tram_api_url: get("TRAM_API_URL"),
            tram_mock_file: get("TRAM_MOCK_FILE").map(PathBuf::from),
            timezone,
            morning_time,
            operating_hours,
        })
    }
}

fn parse<T>(
    get: &impl Fn(&str) -> Option<String>,
    var: &'static str,
    default: &str,
    parser: impl Fn(&str) -> Result<T, String>,
) -> Result<T, ConfigError> {
    let value = get(var).unwrap_or_else(|| default.to_string());
    parser(value.trim()).map_err(|reason| ConfigError::Invalid {
        var,
        value,
        reason,
    })
}

fn parse_flag(
    get: &impl Fn(&str) -> Option<String>,
    var: &'static str,
    default: bool,
) -> Result<bool, ConfigError> {
    let Some(value) = get(var) else {
        return Ok(default);
    };
    match value.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Ok(true),
        "0" | "false" | "no" | "off" => Ok(false),
        _ => Err(ConfigError::Invalid {
            var,
            value,
            reason: "expected true or false".to_string(),
        }),
    }
}
