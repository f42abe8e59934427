//! Run reporting
//!
//! Per-node results fold into one run-level report. The report is the only
//! failure surface of a run: partial failures lower statuses and counters
//! here instead of aborting anything.

use std::fs;
use std::io::{self, BufWriter, Write};
use std::path::Path;
use std::time::Duration;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::RunError;

/// Outcome of one node; also the content of its JSON descriptor.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NodeResult {
    /// True when all three stages succeeded
    pub status: bool,
    /// Files loaded into records
    pub files_read: usize,
    /// Records carried through analysis
    pub files_analyzed: usize,
    /// Anonymized copies written
    pub files_saved: usize,
    /// Absolute path of the node's input directory
    pub path: String,
}

impl NodeResult {
    /// Result for a node that produced nothing, e.g. a panicked task.
    pub fn failed(path: &Path) -> Self {
        Self {
            status: false,
            files_read: 0,
            files_analyzed: 0,
            files_saved: 0,
            path: path.display().to_string(),
        }
    }
}

/// Aggregated outcome of one run.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RunReport {
    pub run_id: Uuid,
    /// AND over every node status; false for an empty run
    pub status: bool,
    pub started_at: DateTime<Utc>,
    pub run_time_secs: f64,
    pub nodes_total: usize,
    pub nodes_failed: usize,
    /// Node results in discovery order
    pub nodes: Vec<NodeResult>,
}

impl RunReport {
    pub fn new() -> Self {
        Self {
            run_id: Uuid::new_v4(),
            status: true,
            started_at: Utc::now(),
            run_time_secs: 0.0,
            nodes_total: 0,
            nodes_failed: 0,
            nodes: Vec::new(),
        }
    }

    /// Fold one node result into the aggregate.
    pub fn fold(&mut self, result: NodeResult) {
        self.status &= result.status;
        self.nodes_total += 1;
        if !result.status {
            self.nodes_failed += 1;
        }
        self.nodes.push(result);
    }

    /// Seal the report with the elapsed wall time.
    pub fn finalize(&mut self, elapsed: Duration) {
        self.run_time_secs = elapsed.as_secs_f64();
        if self.nodes_total == 0 {
            self.status = false;
        }
    }

    /// Persist the report as pretty JSON, atomically (temp file + rename).
    pub fn write_to(&self, path: &Path) -> Result<(), RunError> {
        let write_err = |source: io::Error| RunError::ReportWrite {
            path: path.to_path_buf(),
            source,
        };

        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() && !parent.exists() {
                fs::create_dir_all(parent).map_err(write_err)?;
            }
        }

        let temp_path = path.with_extension("tmp");
        {
            let file = fs::File::create(&temp_path).map_err(write_err)?;
            let mut writer = BufWriter::new(file);
            serde_json::to_writer_pretty(&mut writer, self)
                .map_err(|e| write_err(io::Error::new(io::ErrorKind::InvalidData, e)))?;
            writer.flush().map_err(write_err)?;
            writer.get_ref().sync_all().map_err(write_err)?;
        }
        fs::rename(&temp_path, path).map_err(write_err)
    }
}

impl Default for RunReport {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;
    use tempfile::TempDir;

    fn node(status: bool) -> NodeResult {
        NodeResult {
            status,
            files_read: 2,
            files_analyzed: 2,
            files_saved: if status { 2 } else { 0 },
            path: "/data/in/study".to_string(),
        }
    }

    #[test]
    fn fold_ands_statuses_and_counts_failures() {
        let mut report = RunReport::new();
        report.fold(node(true));
        report.fold(node(false));
        report.fold(node(true));

        assert!(!report.status);
        assert_eq!(report.nodes_total, 3);
        assert_eq!(report.nodes_failed, 1);
        assert_eq!(report.nodes.len(), 3);
    }

    #[test]
    fn all_successes_keep_status_true() {
        let mut report = RunReport::new();
        report.fold(node(true));
        report.finalize(Duration::from_millis(1500));

        assert!(report.status);
        assert!(report.run_time_secs >= 1.5);
    }

    #[test]
    fn empty_run_finalizes_failed() {
        let mut report = RunReport::new();
        report.finalize(Duration::from_secs(0));
        assert!(!report.status);
        assert_eq!(report.nodes_total, 0);
    }

    #[test]
    fn write_to_produces_parseable_json_and_no_temp_file() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("reports").join("run.json");

        let mut report = RunReport::new();
        report.fold(node(true));
        report.finalize(Duration::from_secs(2));
        report.write_to(&path).unwrap();

        let raw = fs::read_to_string(&path).unwrap();
        let back: RunReport = serde_json::from_str(&raw).unwrap();
        assert_eq!(back.run_id, report.run_id);
        assert_eq!(back.nodes_total, 1);
        assert!(raw.contains("\"filesRead\""));

        assert!(!path.with_extension("tmp").exists());
    }

    #[test]
    fn node_result_serializes_camel_case() {
        let json = serde_json::to_string(&node(true)).unwrap();
        assert!(json.contains("\"filesAnalyzed\""));
        assert!(json.contains("\"filesSaved\""));
        assert!(!json.contains("files_read"));
    }

    #[test]
    fn failed_helper_zeroes_counters() {
        let result = NodeResult::failed(&PathBuf::from("/data/in/broken"));
        assert!(!result.status);
        assert_eq!(result.files_read, 0);
        assert_eq!(result.path, "/data/in/broken");
    }
}
