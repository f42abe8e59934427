//! Node orchestration
//!
//! Drives one node through read, analyze and write, and folds the three
//! stage outcomes into the node's result. Stages run strictly in sequence;
//! concurrency happens across nodes, never inside one.

use std::fmt;
use std::path::Path;

use super::analyze::analyze_records;
use super::read::read_node;
use super::write::{write_node, WriteRequest};
use crate::config::RunConfig;
use crate::record::MetadataParser;
use crate::report::NodeResult;
use crate::walk::TreeNode;

/// Stages a node moves through. Terminal states are `Done` and `Failed`.
/// States surface only in logs, rendered through `Display`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NodeState {
    Pending,
    Read,
    Analyzed,
    Written,
    Done,
    Failed,
}

impl fmt::Display for NodeState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            NodeState::Pending => "pending",
            NodeState::Read => "read",
            NodeState::Analyzed => "analyzed",
            NodeState::Written => "written",
            NodeState::Done => "done",
            NodeState::Failed => "failed",
        };
        f.write_str(name)
    }
}

/// Run one node through the full pipeline.
pub fn process_node(config: &RunConfig, node: &TreeNode, parser: &dyn MetadataParser) -> NodeResult {
    let mut state = NodeState::Pending;
    tracing::debug!(dir = %node.dir.display(), files = node.files.len(), "Processing node");

    let read = read_node(&node.dir, &node.files, parser);
    state = advance(&node.dir, state, NodeState::Read);

    // A node with nothing readable fails outright; partial read failures
    // carry on through the remaining stages.
    if read.records.is_empty() {
        state = advance(&node.dir, state, NodeState::Failed);
        let result = NodeResult {
            status: false,
            files_read: read.files_read,
            files_analyzed: 0,
            files_saved: 0,
            path: node.dir.display().to_string(),
        };
        log_finished(node, state, &result);
        return result;
    }

    let analyze = analyze_records(read.records, &config.spec, config.anonymize, config.missing_tag);
    state = advance(&node.dir, state, NodeState::Analyzed);

    let write = write_node(&WriteRequest {
        config,
        node_dir: &node.dir,
        rel_path: &node.rel_path,
        records: &analyze.records,
        read_status: read.status,
        analyze_status: analyze.status,
        files_read: read.files_read,
        files_analyzed: analyze.files_analyzed,
    });
    state = advance(&node.dir, state, NodeState::Written);

    let status = read.status && analyze.status && write.status;
    state = advance(
        &node.dir,
        state,
        if status { NodeState::Done } else { NodeState::Failed },
    );

    let result = NodeResult {
        status,
        files_read: read.files_read,
        files_analyzed: analyze.files_analyzed,
        files_saved: write.files_saved,
        path: node.dir.display().to_string(),
    };
    log_finished(node, state, &result);
    result
}

fn advance(dir: &Path, from: NodeState, to: NodeState) -> NodeState {
    tracing::debug!(dir = %dir.display(), from = %from, to = %to, "Node state");
    to
}

fn log_finished(node: &TreeNode, state: NodeState, result: &NodeResult) {
    tracing::info!(
        dir = %node.dir.display(),
        state = %state,
        files_read = result.files_read,
        files_analyzed = result.files_analyzed,
        files_saved = result.files_saved,
        "Node finished"
    );
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::record::JsonTagParser;
    #[cfg(unix)]
    use crate::tools::stubs;
    use std::fs;
    use std::path::PathBuf;
    use tempfile::TempDir;

    fn tree_node(dir: &Path, rel: &str, files: &[&str]) -> TreeNode {
        TreeNode {
            dir: dir.to_path_buf(),
            rel_path: PathBuf::from(rel),
            files: files.iter().map(|f| f.to_string()).collect(),
        }
    }

    #[test]
    fn states_render_lowercase_for_logs() {
        let names = [
            (NodeState::Pending, "pending"),
            (NodeState::Read, "read"),
            (NodeState::Analyzed, "analyzed"),
            (NodeState::Written, "written"),
            (NodeState::Done, "done"),
            (NodeState::Failed, "failed"),
        ];
        for (state, name) in names {
            assert_eq!(state.to_string(), name);
        }
    }

    #[cfg(unix)]
    #[test]
    fn single_file_node_runs_end_to_end() {
        let input = TempDir::new().unwrap();
        let output = TempDir::new().unwrap();
        let bin = TempDir::new().unwrap();
        let node_dir = input.path().join("study1");
        fs::create_dir(&node_dir).unwrap();
        fs::write(
            node_dir.join("scan.json"),
            r#"{"PatientName": "Doe^Jane", "PatientID": "12345", "AccessionNumber": "A9"}"#,
        )
        .unwrap();

        let config = RunConfig::new(input.path().to_path_buf(), output.path().to_path_buf())
            .with_tools(stubs::tools(bin.path()));
        let node = tree_node(&node_dir, "study1", &["scan.json"]);

        let result = process_node(&config, &node, &JsonTagParser::new());

        assert!(result.status);
        assert_eq!(result.files_read, 1);
        assert_eq!(result.files_analyzed, 1);
        assert_eq!(result.files_saved, 1);
        assert_eq!(result.path, node_dir.display().to_string());

        let copy = fs::read_to_string(output.path().join("study1/scan.json")).unwrap();
        for value in ["\"PatientName\": \"anon\"", "\"PatientID\": \"anon\""] {
            assert!(copy.contains(value));
        }
        assert!(output.path().join("study1/preview.jpg").exists());
    }

    #[test]
    fn empty_node_fails_without_touching_the_output_tree() {
        let input = TempDir::new().unwrap();
        let output = TempDir::new().unwrap();
        let node_dir = input.path().join("empty");
        fs::create_dir(&node_dir).unwrap();

        let config = RunConfig::new(input.path().to_path_buf(), output.path().to_path_buf());
        let node = tree_node(&node_dir, "empty", &[]);

        let result = process_node(&config, &node, &JsonTagParser::new());

        assert!(!result.status);
        assert_eq!(result.files_read, 0);
        assert_eq!(result.files_analyzed, 0);
        assert_eq!(result.files_saved, 0);
        // Write never ran, so the node's output directory was not created.
        assert!(!output.path().join("empty").exists());
    }

    #[test]
    fn unreadable_every_file_fails_before_write() {
        let input = TempDir::new().unwrap();
        let output = TempDir::new().unwrap();
        let node_dir = input.path().join("study1");
        fs::create_dir(&node_dir).unwrap();
        fs::write(node_dir.join("broken.json"), "{nope").unwrap();

        let config = RunConfig::new(input.path().to_path_buf(), output.path().to_path_buf());
        let node = tree_node(&node_dir, "study1", &["broken.json"]);

        let result = process_node(&config, &node, &JsonTagParser::new());

        assert!(!result.status);
        assert_eq!(result.files_read, 0);
        assert!(!output.path().join("study1").exists());
    }

    #[cfg(unix)]
    #[test]
    fn partial_read_failure_still_produces_output() {
        let input = TempDir::new().unwrap();
        let output = TempDir::new().unwrap();
        let bin = TempDir::new().unwrap();
        let node_dir = input.path().join("study1");
        fs::create_dir(&node_dir).unwrap();
        fs::write(node_dir.join("bad.json"), "{nope").unwrap();
        fs::write(node_dir.join("good.json"), r#"{"PatientName": "x"}"#).unwrap();

        let config = RunConfig::new(input.path().to_path_buf(), output.path().to_path_buf())
            .with_tools(stubs::tools(bin.path()));
        let node = tree_node(&node_dir, "study1", &["bad.json", "good.json"]);

        let result = process_node(&config, &node, &JsonTagParser::new());

        // The readable file flowed through; the node still reports failure.
        assert!(!result.status);
        assert_eq!(result.files_read, 1);
        assert_eq!(result.files_analyzed, 1);
        assert_eq!(result.files_saved, 1);
        assert!(output.path().join("study1/good.json").exists());
    }

    #[cfg(unix)]
    #[test]
    fn anonymize_disabled_reproduces_failed_analysis() {
        let input = TempDir::new().unwrap();
        let output = TempDir::new().unwrap();
        let bin = TempDir::new().unwrap();
        let node_dir = input.path().join("study1");
        fs::create_dir(&node_dir).unwrap();
        fs::write(node_dir.join("scan.json"), r#"{"PatientName": "x"}"#).unwrap();

        let config = RunConfig::new(input.path().to_path_buf(), output.path().to_path_buf())
            .with_tools(stubs::tools(bin.path()))
            .with_anonymize(false);
        let node = tree_node(&node_dir, "study1", &["scan.json"]);

        let result = process_node(&config, &node, &JsonTagParser::new());

        assert!(!result.status);
        assert_eq!(result.files_read, 1);
        assert_eq!(result.files_analyzed, 0);
        assert_eq!(result.files_saved, 0);
        // Conversions still happened.
        assert!(output.path().join("study1/scan.jpg").exists());
    }
}
