//! Run driver
//!
//! Owns one run end to end: canonicalizes the roots, discovers the input
//! tree, dispatches nodes across a bounded worker pool and folds their
//! results into the report in discovery order. Node failures never abort
//! the run; only root-level problems do.

use std::fs;
use std::sync::Arc;
use std::time::Instant;

use tokio::sync::Semaphore;

use crate::config::RunConfig;
use crate::error::RunError;
use crate::pipeline::process_node;
use crate::record::{JsonTagParser, MetadataParser};
use crate::report::{NodeResult, RunReport};
use crate::walk::TreeWalker;

/// Executes runs for one configuration.
pub struct Driver {
    config: RunConfig,
    parser: Arc<dyn MetadataParser>,
}

impl Driver {
    /// Driver over the bundled JSON tag parser.
    pub fn new(config: RunConfig) -> Self {
        Self {
            config,
            parser: Arc::new(JsonTagParser::new()),
        }
    }

    /// Swap in a different metadata parser.
    pub fn with_parser(mut self, parser: Arc<dyn MetadataParser>) -> Self {
        self.parser = parser;
        self
    }

    /// Execute the run to completion and return the aggregated report.
    pub async fn run(&self) -> Result<RunReport, RunError> {
        let started = Instant::now();
        let mut report = RunReport::new();

        let input_dir = self
            .config
            .input_dir
            .canonicalize()
            .map_err(|e| RunError::InputTree {
                path: self.config.input_dir.clone(),
                reason: e.to_string(),
            })?;
        fs::create_dir_all(&self.config.output_dir).map_err(|source| RunError::OutputRoot {
            path: self.config.output_dir.clone(),
            source,
        })?;
        let output_dir = self
            .config
            .output_dir
            .canonicalize()
            .map_err(|source| RunError::OutputRoot {
                path: self.config.output_dir.clone(),
                source,
            })?;

        // Every task sees the same canonicalized configuration; stages build
        // absolute paths from it and never consult the working directory.
        let mut config = self.config.clone();
        config.input_dir = input_dir.clone();
        config.output_dir = output_dir;
        let config = Arc::new(config);

        let nodes = TreeWalker::new(input_dir.clone())
            .with_extension(config.extension.clone())
            .discover()?;
        if nodes.is_empty() {
            tracing::warn!(input = %input_dir.display(), "No nodes discovered");
        }

        tracing::info!(
            run_id = %report.run_id,
            input = %input_dir.display(),
            output = %config.output_dir.display(),
            nodes = nodes.len(),
            workers = config.workers,
            "Run started"
        );

        let semaphore = Arc::new(Semaphore::new(config.workers));
        let mut handles = Vec::with_capacity(nodes.len());

        for node in nodes {
            let sem = Arc::clone(&semaphore);
            let config = Arc::clone(&config);
            let parser = Arc::clone(&self.parser);
            let dir = node.dir.clone();

            let handle = tokio::spawn(async move {
                let _permit = match sem.acquire_owned().await {
                    Ok(permit) => permit,
                    Err(_) => return NodeResult::failed(&node.dir),
                };
                let dir = node.dir.clone();
                let task =
                    tokio::task::spawn_blocking(move || process_node(&config, &node, parser.as_ref()));
                match task.await {
                    Ok(result) => result,
                    Err(join_err) => {
                        tracing::warn!(dir = %dir.display(), error = %join_err, "Node task panicked");
                        NodeResult::failed(&dir)
                    }
                }
            });
            handles.push((dir, handle));
        }

        // Fold in dispatch order so the report lists nodes the way the walk
        // discovered them, regardless of completion order.
        for (dir, handle) in handles {
            let result = match handle.await {
                Ok(result) => result,
                Err(join_err) => {
                    tracing::warn!(dir = %dir.display(), error = %join_err, "Node task panicked");
                    NodeResult::failed(&dir)
                }
            };
            report.fold(result);
        }

        report.finalize(started.elapsed());
        tracing::info!(
            run_id = %report.run_id,
            status = report.status,
            nodes = report.nodes_total,
            failed = report.nodes_failed,
            secs = report.run_time_secs,
            "Run complete"
        );
        Ok(report)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    #[cfg(unix)]
    use crate::tags::AnonymizationSpec;
    #[cfg(unix)]
    use crate::tools::stubs;
    use std::path::Path;
    use tempfile::TempDir;

    fn write_study(root: &Path, rel: &str, file: &str) {
        let dir = root.join(rel);
        fs::create_dir_all(&dir).unwrap();
        fs::write(
            dir.join(file),
            r#"{"PatientName": "Doe^Jane", "PatientID": "777"}"#,
        )
        .unwrap();
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn run_mirrors_the_tree_in_discovery_order() {
        let input = TempDir::new().unwrap();
        let output = TempDir::new().unwrap();
        let bin = TempDir::new().unwrap();
        write_study(input.path(), "b_study", "scan.json");
        write_study(input.path(), "a_study", "scan.json");
        write_study(input.path(), "c_study/series1", "scan.json");

        let config = RunConfig::new(input.path().to_path_buf(), output.path().to_path_buf())
            .with_tools(stubs::tools(bin.path()))
            .with_workers(2);
        let report = Driver::new(config).run().await.unwrap();

        assert!(report.status);
        assert_eq!(report.nodes_total, 3);
        assert_eq!(report.nodes_failed, 0);

        let suffixes: Vec<&str> = ["a_study", "b_study", "c_study/series1"].to_vec();
        for (node, suffix) in report.nodes.iter().zip(&suffixes) {
            assert!(node.status);
            assert!(Path::new(&node.path).is_absolute());
            assert!(node.path.ends_with(suffix), "{} vs {}", node.path, suffix);
        }

        for rel in &suffixes {
            assert!(output.path().join(rel).join("scan.json").exists());
            assert!(output.path().join(rel).join("preview.jpg").exists());
            assert!(output.path().join(rel).join("description.json").exists());
        }
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn failed_node_lowers_the_run_status() {
        let input = TempDir::new().unwrap();
        let output = TempDir::new().unwrap();
        let bin = TempDir::new().unwrap();
        write_study(input.path(), "good", "scan.json");
        fs::create_dir(input.path().join("hollow")).unwrap();

        let config = RunConfig::new(input.path().to_path_buf(), output.path().to_path_buf())
            .with_tools(stubs::tools(bin.path()));
        let report = Driver::new(config).run().await.unwrap();

        assert!(!report.status);
        assert_eq!(report.nodes_total, 2);
        assert_eq!(report.nodes_failed, 1);
        assert!(output.path().join("good/scan.json").exists());
        assert!(!output.path().join("hollow").exists());
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn rerunning_produces_identical_anonymized_copies() {
        let input = TempDir::new().unwrap();
        let bin = TempDir::new().unwrap();
        write_study(input.path(), "study1", "scan.json");

        let tools = stubs::tools(bin.path());
        let mut copies = Vec::new();
        for _ in 0..2 {
            let output = TempDir::new().unwrap();
            let config = RunConfig::new(input.path().to_path_buf(), output.path().to_path_buf())
                .with_tools(tools.clone());
            let report = Driver::new(config).run().await.unwrap();
            assert!(report.status);
            copies.push(fs::read(output.path().join("study1/scan.json")).unwrap());
        }
        assert_eq!(copies[0], copies[1]);
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn later_rules_see_earlier_rewrites_in_the_output() {
        let input = TempDir::new().unwrap();
        let output = TempDir::new().unwrap();
        let bin = TempDir::new().unwrap();
        write_study(input.path(), "study1", "scan.json");

        let spec = AnonymizationSpec::from_json(
            r#"{"PatientID": "anon", "StudyDescription": "%PatientID-x"}"#,
        )
        .unwrap();
        let config = RunConfig::new(input.path().to_path_buf(), output.path().to_path_buf())
            .with_spec(spec)
            .with_tools(stubs::tools(bin.path()));
        let report = Driver::new(config).run().await.unwrap();
        assert!(report.status);

        let copy: serde_json::Value =
            serde_json::from_slice(&fs::read(output.path().join("study1/scan.json")).unwrap())
                .unwrap();
        assert_eq!(copy["PatientID"], "anon");
        // The second rule resolved against the value the first had written.
        assert_eq!(copy["StudyDescription"], "anon-x");

        let descriptor: serde_json::Value = serde_json::from_slice(
            &fs::read(output.path().join("study1/description.json")).unwrap(),
        )
        .unwrap();
        let mut keys: Vec<&str> = descriptor
            .as_object()
            .unwrap()
            .keys()
            .map(String::as_str)
            .collect();
        keys.sort_unstable();
        assert_eq!(
            keys,
            vec!["filesAnalyzed", "filesRead", "filesSaved", "path", "status"]
        );
        assert_eq!(descriptor["status"], true);
        assert_eq!(descriptor["filesRead"], 1);
        assert_eq!(descriptor["filesSaved"], 1);
    }

    #[tokio::test]
    async fn missing_input_root_aborts_the_run() {
        let scratch = TempDir::new().unwrap();
        let config = RunConfig::new(
            scratch.path().join("absent"),
            scratch.path().join("out"),
        );
        let err = Driver::new(config).run().await.unwrap_err();
        assert!(matches!(err, RunError::InputTree { .. }));
    }

    #[tokio::test]
    async fn empty_input_root_is_one_failed_node() {
        let input = TempDir::new().unwrap();
        let output = TempDir::new().unwrap();

        let config = RunConfig::new(input.path().to_path_buf(), output.path().to_path_buf());
        let report = Driver::new(config).run().await.unwrap();

        assert!(!report.status);
        assert_eq!(report.nodes_total, 1);
        assert_eq!(report.nodes_failed, 1);
    }

    #[tokio::test]
    async fn output_root_is_created_on_demand() {
        let input = TempDir::new().unwrap();
        let scratch = TempDir::new().unwrap();
        fs::write(input.path().join("scan.json"), "{nope").unwrap();

        let out = scratch.path().join("deep/nested/out");
        let config = RunConfig::new(input.path().to_path_buf(), out.clone());
        let report = Driver::new(config).run().await.unwrap();

        assert!(out.is_dir());
        // The lone root node failed to parse its file.
        assert!(!report.status);
        assert_eq!(report.nodes_total, 1);
    }
}
