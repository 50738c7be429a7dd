//! Data transfer objects for web responses.

use serde::Serialize;

use crate::driver::{CleanupReport, MorningReport, PollOutcome};

/// Result of a cron-triggered job.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CronResponse {
    /// `success`, or `skipped` outside operating hours
    pub status: &'static str,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub tram_count: Option<usize>,

    /// Users (morning) or subscriptions (poll) notified
    #[serde(skip_serializing_if = "Option::is_none")]
    pub notification_count: Option<usize>,

    /// Subscriptions evaluated but not notified
    #[serde(skip_serializing_if = "Option::is_none")]
    pub skipped: Option<usize>,

    /// History rows purged
    #[serde(skip_serializing_if = "Option::is_none")]
    pub deleted: Option<usize>,
}

impl CronResponse {
    fn success() -> Self {
        Self {
            status: "success",
            tram_count: None,
            notification_count: None,
            skipped: None,
            deleted: None,
        }
    }

    pub fn from_poll(outcome: PollOutcome) -> Self {
        match outcome {
            PollOutcome::OutsideHours => Self {
                status: "skipped",
                ..Self::success()
            },
            PollOutcome::Polled(report) => Self {
                tram_count: Some(report.tram_count),
                notification_count: Some(report.evaluation.dispatched),
                skipped: Some(report.evaluation.skipped()),
                ..Self::success()
            },
        }
    }

    pub fn from_cleanup(report: CleanupReport) -> Self {
        Self {
            deleted: Some(report.deleted),
            ..Self::success()
        }
    }

    pub fn from_morning(report: MorningReport) -> Self {
        Self {
            tram_count: Some(report.tram_count),
            notification_count: Some(report.digest.sent),
            ..Self::success()
        }
    }
}

/// Polling state.
#[derive(Debug, Serialize)]
pub struct StatusResponse {
    pub polling: bool,

    /// e.g. `06:00-23:00`
    pub operating_hours: String,

    pub timezone: String,
}

/// Error response.
#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    /// Always `error`
    pub status: &'static str,

    /// Error message
    pub error: String,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::driver::PollReport;
    use crate::notify::{DigestSummary, EvaluationSummary};

    #[test]
    fn poll_response_counts() {
        let outcome = PollOutcome::Polled(PollReport {
            tram_count: 12,
            evaluation: EvaluationSummary {
                subscriptions: 5,
                no_match: 3,
                deduplicated: 1,
                dispatched: 1,
                ..Default::default()
            },
        });
        let json = serde_json::to_value(CronResponse::from_poll(outcome)).unwrap();
        assert_eq!(
            json,
            serde_json::json!({
                "status": "success",
                "tram_count": 12,
                "notification_count": 1,
                "skipped": 4,
            })
        );
    }

    #[test]
    fn outside_hours_is_skipped() {
        let json = serde_json::to_value(CronResponse::from_poll(PollOutcome::OutsideHours)).unwrap();
        assert_eq!(json, serde_json::json!({ "status": "skipped" }));
    }

    #[test]
    fn cleanup_and_morning_responses() {
        let cleanup = CronResponse::from_cleanup(CleanupReport { deleted: 7 });
        assert_eq!(cleanup.deleted, Some(7));
        assert_eq!(cleanup.tram_count, None);

        let morning = CronResponse::from_morning(MorningReport {
            tram_count: 20,
            digest: DigestSummary {
                users: 3,
                subscriptions: 4,
                sent: 2,
                failed: 1,
            },
        });
        assert_eq!(morning.notification_count, Some(2));
        assert_eq!(morning.status, "success");
    }
}
