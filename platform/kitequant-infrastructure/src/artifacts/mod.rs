use crate::reporting;
use kitequant_domain::repositories::artifacts::{ArtifactReader, ArtifactWriter};
use kitequant_domain::services::report::RunSummary;
use kitequant_domain::value_objects::equity_point::EquityPoint;
use kitequant_domain::value_objects::trade::Trade;
use std::fs;
use std::path::Path;
use std::time::Instant;

#[derive(Debug, Default, Clone, Copy)]
pub struct FilesystemArtifactWriter;

impl FilesystemArtifactWriter {
    pub fn new() -> Self {
        Self
    }
}

/// Runs one filesystem operation and records its outcome under `op`/`kind`.
fn timed<T>(
    op: &'static str,
    kind: &'static str,
    io: impl FnOnce() -> Result<T, String>,
) -> Result<T, String> {
    let start = Instant::now();
    let result = io();
    let outcome = if result.is_ok() { "ok" } else { "err" };
    metrics::counter!(
        "kitequant.infra.artifacts.calls_total",
        "op" => op, "kind" => kind, "result" => outcome
    )
    .increment(1);
    metrics::histogram!(
        "kitequant.infra.artifacts.io_ms",
        "op" => op, "kind" => kind, "result" => outcome
    )
    .record(start.elapsed().as_millis() as f64);
    result
}

impl ArtifactWriter for FilesystemArtifactWriter {
    fn ensure_dir(&self, path: &Path) -> Result<(), String> {
        timed("write", "ensure_dir", || {
            fs::create_dir_all(path)
                .map_err(|err| format!("failed to create run dir {}: {err}", path.display()))
        })
    }

    fn write_trades_csv(&self, path: &Path, trades: &[Trade]) -> Result<(), String> {
        timed("write", "trades_csv", || reporting::write_trades_csv(path, trades))
    }

    fn write_equity_csv(&self, path: &Path, points: &[EquityPoint]) -> Result<(), String> {
        timed("write", "equity_csv", || reporting::write_equity_csv(path, points))
    }

    fn write_summary_json(
        &self,
        path: &Path,
        summary: &RunSummary,
        meta: Option<&serde_json::Value>,
        config_snapshot: Option<&serde_json::Value>,
    ) -> Result<(), String> {
        timed("write", "summary_json", || {
            reporting::write_summary_json(path, summary, meta, config_snapshot)
        })
    }

    fn write_config_snapshot_toml(&self, path: &Path, contents: &str) -> Result<(), String> {
        timed("write", "config_snapshot_toml", || {
            fs::write(path, contents)
                .map_err(|err| format!("failed to write {}: {err}", path.display()))
        })
    }
}

#[derive(Debug, Default, Clone, Copy)]
pub struct FilesystemArtifactReader;

impl FilesystemArtifactReader {
    pub fn new() -> Self {
        Self
    }
}

impl ArtifactReader for FilesystemArtifactReader {
    fn read_trades_csv(&self, path: &Path) -> Result<Vec<Trade>, String> {
        timed("read", "trades_csv", || reporting::read_trades_csv(path))
    }

    fn read_summary_json(&self, path: &Path) -> Result<serde_json::Value, String> {
        timed("read", "summary_json", || reporting::read_summary_json(path))
    }

    fn exists(&self, path: &Path) -> bool {
        path.exists()
    }
}

#[cfg(test)]
mod tests {
    use super::{FilesystemArtifactReader, FilesystemArtifactWriter};
    use kitequant_domain::repositories::artifacts::{ArtifactReader, ArtifactWriter};
    use std::time::{SystemTime, UNIX_EPOCH};

    #[test]
    fn writer_creates_nested_run_dir_and_snapshot() {
        let nanos = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|d| d.as_nanos())
            .unwrap_or(0);
        let root = std::env::temp_dir().join(format!(
            "kitequant_artifacts_{}_{nanos}",
            std::process::id()
        ));
        let run_dir = root.join("runs").join("demo");

        let writer = FilesystemArtifactWriter::new();
        writer.ensure_dir(&run_dir).expect("ensure dir");
        let snapshot = run_dir.join("config_snapshot.toml");
        writer
            .write_config_snapshot_toml(&snapshot, "[run]\nrun_id = \"demo\"\n")
            .expect("snapshot");

        let reader = FilesystemArtifactReader::new();
        assert!(reader.exists(&snapshot));
        assert!(!reader.exists(&run_dir.join("trades.csv")));
        assert!(reader.read_summary_json(&run_dir.join("summary.json")).is_err());

        let _ = std::fs::remove_dir_all(&root);
    }
}
