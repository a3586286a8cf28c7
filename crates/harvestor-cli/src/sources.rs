use std::path::PathBuf;

use async_trait::async_trait;
use harvestor_core::{HarvestorError, HarvestorResult, OpKind, Target, WorkerAgent};
use harvestor_dispatch::{Dispatcher, FleetSource, TargetSource};
use tracing::info;

/// Fleet snapshot backed by a JSON file of workers, re-read every cycle so
/// edits by the discovery tooling show up at the next planning pass.
pub struct FileFleetSource {
    path: PathBuf,
}

impl FileFleetSource {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }
}

#[async_trait]
impl FleetSource for FileFleetSource {
    async fn read_workers(&self) -> HarvestorResult<Vec<WorkerAgent>> {
        let text = tokio::fs::read_to_string(&self.path).await.map_err(|e| {
            HarvestorError::Snapshot(format!("fleet snapshot {}: {e}", self.path.display()))
        })?;
        serde_json::from_str(&text).map_err(|e| {
            HarvestorError::Snapshot(format!("fleet snapshot {}: {e}", self.path.display()))
        })
    }
}

/// Target snapshot backed by a JSON file, re-read every cycle.
pub struct FileTargetSource {
    path: PathBuf,
}

impl FileTargetSource {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }
}

#[async_trait]
impl TargetSource for FileTargetSource {
    async fn read_target(&self, id: &str) -> HarvestorResult<Target> {
        let text = tokio::fs::read_to_string(&self.path).await.map_err(|e| {
            HarvestorError::Snapshot(format!("target snapshot {}: {e}", self.path.display()))
        })?;
        let target: Target = serde_json::from_str(&text).map_err(|e| {
            HarvestorError::Snapshot(format!("target snapshot {}: {e}", self.path.display()))
        })?;
        if target.id != id {
            return Err(HarvestorError::Snapshot(format!(
                "target snapshot {} holds '{}', not '{id}'",
                self.path.display(),
                target.id
            )));
        }
        target.validate()?;
        Ok(target)
    }
}

/// Presentation-layer dispatcher: logs each request instead of reaching a
/// fleet transport. Stands in where no execution rights are wired up.
pub struct TracingDispatcher;

#[async_trait]
impl Dispatcher for TracingDispatcher {
    async fn dispatch(&self, worker_id: &str, kind: OpKind, units: u64, start_delay_ms: u64) {
        info!(
            worker = worker_id,
            kind = %kind,
            units,
            start_delay_ms,
            "dispatch"
        );
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;
    use std::io::Write;

    fn write_temp(contents: &str) -> tempfile::NamedTempFile {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(contents.as_bytes()).unwrap();
        file
    }

    #[tokio::test]
    async fn test_fleet_source_round_trip() {
        let file = write_temp(
            r#"[
                {"id": "W1", "capacity": 21},
                {"id": "W2", "capacity": 66, "cores": 4}
            ]"#,
        );
        let source = FileFleetSource::new(file.path());
        let workers = source.read_workers().await.unwrap();
        assert_eq!(workers.len(), 2);
        assert_eq!(workers[0].id, "W1");
        assert_eq!(workers[0].cores, 1);
        assert_eq!(workers[1].capacity, 66);
        assert_eq!(workers[1].cores, 4);
    }

    #[tokio::test]
    async fn test_fleet_source_missing_file_is_snapshot_error() {
        let source = FileFleetSource::new("/nonexistent/fleet.json");
        let err = source.read_workers().await.unwrap_err();
        assert!(matches!(err, HarvestorError::Snapshot(_)));
    }

    #[tokio::test]
    async fn test_target_source_reads_matching_id() {
        let file = write_temp(
            r#"{
                "id": "alpha",
                "instability": 5.0,
                "min_instability": 1.0,
                "yield_current": 900.0,
                "yield_max": 1000.0,
                "extract_fraction": 0.002,
                "extract_ms": 100,
                "fortify_ms": 400,
                "amplify_ms": 250
            }"#,
        );
        let source = FileTargetSource::new(file.path());
        let target = source.read_target("alpha").await.unwrap();
        assert_eq!(target.fortify_ms, 400);
    }

    #[tokio::test]
    async fn test_target_source_rejects_wrong_id() {
        let file = write_temp(
            r#"{
                "id": "alpha",
                "instability": 5.0,
                "min_instability": 1.0,
                "yield_current": 900.0,
                "yield_max": 1000.0,
                "extract_fraction": 0.002,
                "extract_ms": 100,
                "fortify_ms": 400,
                "amplify_ms": 250
            }"#,
        );
        let source = FileTargetSource::new(file.path());
        let err = source.read_target("beta").await.unwrap_err();
        assert!(err.to_string().contains("alpha"));
    }

    #[tokio::test]
    async fn test_target_source_rejects_invariant_violation() {
        let file = write_temp(
            r#"{
                "id": "alpha",
                "instability": 0.5,
                "min_instability": 1.0,
                "yield_current": 900.0,
                "yield_max": 1000.0,
                "extract_fraction": 0.002,
                "extract_ms": 100,
                "fortify_ms": 400,
                "amplify_ms": 250
            }"#,
        );
        let source = FileTargetSource::new(file.path());
        assert!(source.read_target("alpha").await.is_err());
    }
}
