//! Mock position source for development without the live feed.
//!
//! Serves a fixed snapshot, loaded from a JSON file in the upstream format
//! or supplied directly, as if it were the live API response.

use std::path::Path;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

use futures::future::BoxFuture;
use tokio::sync::RwLock;

use crate::domain::PositionReport;

use super::PositionSource;
use super::error::TramError;
use super::types::parse_positions;

#[derive(Debug, Clone)]
enum Snapshot {
    Reports(Vec<PositionReport>),
    Failing(u16),
}

/// Position source that serves a snapshot instead of calling the API.
#[derive(Debug, Clone)]
pub struct MockTramSource {
    snapshot: Arc<RwLock<Snapshot>>,
    fetches: Arc<AtomicUsize>,
}

impl MockTramSource {
    /// Load a snapshot file (a `web01List` response body).
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, TramError> {
        let path = path.as_ref();
        let body = std::fs::read_to_string(path).map_err(|e| TramError::Snapshot {
            path: path.display().to_string(),
            message: e.to_string(),
        })?;
        let reports = parse_positions(&body).map_err(|e| TramError::Snapshot {
            path: path.display().to_string(),
            message: e.to_string(),
        })?;
        Ok(Self::from_reports(reports))
    }

    pub fn from_reports(reports: Vec<PositionReport>) -> Self {
        Self {
            snapshot: Arc::new(RwLock::new(Snapshot::Reports(reports))),
            fetches: Arc::new(AtomicUsize::new(0)),
        }
    }

    /// Replace the served snapshot.
    pub async fn set_reports(&self, reports: Vec<PositionReport>) {
        *self.snapshot.write().await = Snapshot::Reports(reports);
    }

    /// Make subsequent fetches fail as if upstream returned `status`.
    pub async fn fail_with_status(&self, status: u16) {
        *self.snapshot.write().await = Snapshot::Failing(status);
    }

    /// How many fetches have been served.
    pub fn fetch_count(&self) -> usize {
        self.fetches.load(Ordering::SeqCst)
    }
}

impl PositionSource for MockTramSource {
    fn fetch_positions(&self) -> BoxFuture<'_, Result<Vec<PositionReport>, TramError>> {
        Box::pin(async move {
            self.fetches.fetch_add(1, Ordering::SeqCst);
            match &*self.snapshot.read().await {
                Snapshot::Reports(reports) => Ok(reports.clone()),
                Snapshot::Failing(status) => Err(TramError::Api {
                    status: *status,
                    message: "mock failure".to_string(),
                }),
            }
        })
    }
}

#[cfg(test)]
mod tests {
    use std::io::Write;

    use super::*;
    use crate::domain::{Direction, Line};

    #[tokio::test]
    async fn serves_file_snapshot() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(
            file,
            r#"[{{"interval_id": 18, "rosen": "A", "us": 1, "vehicle_type": 2, "vehicle_id": 1093}}]"#
        )
        .unwrap();

        let source = MockTramSource::from_file(file.path()).unwrap();
        let reports = source.fetch_positions().await.unwrap();
        assert_eq!(reports.len(), 1);
        assert_eq!(reports[0].line, Line::A);
        assert_eq!(source.fetch_count(), 1);
    }

    #[tokio::test]
    async fn missing_file_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let result = MockTramSource::from_file(dir.path().join("nope.json"));
        assert!(matches!(result, Err(TramError::Snapshot { .. })));
    }

    #[tokio::test]
    async fn non_list_file_is_an_error() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, r#"{{"positions": []}}"#).unwrap();
        assert!(MockTramSource::from_file(file.path()).is_err());
    }

    #[tokio::test]
    async fn snapshot_can_be_swapped_and_failed() {
        let source = MockTramSource::from_reports(vec![]);
        assert!(source.fetch_positions().await.unwrap().is_empty());

        source
            .set_reports(vec![PositionReport::new(1, Line::B, Direction::Up, 1, 7)])
            .await;
        assert_eq!(source.fetch_positions().await.unwrap().len(), 1);

        source.fail_with_status(502).await;
        assert!(matches!(
            source.fetch_positions().await,
            Err(TramError::Api { status: 502, .. })
        ));
        assert_eq!(source.fetch_count(), 3);
    }
}
