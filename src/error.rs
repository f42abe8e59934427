//! Error taxonomy
//!
//! Per-file and per-stage failures are folded into stage statuses and
//! counters rather than propagated; the variants here carry the context that
//! ends up in logs and descriptors. Only `RunError` aborts a run.

use std::io;
use std::path::PathBuf;

use thiserror::Error;

/// Failure scoped to a single file or stage within one node.
#[derive(Debug, Error)]
pub enum PipelineError {
    /// The node directory offered nothing to read
    #[error("no input files in {path}")]
    EmptyInput { path: PathBuf },

    /// A file could not be loaded into a metadata record
    #[error("failed to parse metadata from {path}: {reason}")]
    MetadataParse { path: PathBuf, reason: String },

    /// A template referenced tags the record does not carry
    #[error("template for tag {tag} references missing tags {missing:?}")]
    TagResolution { tag: String, missing: Vec<String> },

    /// A tag write was rejected by the dataset's checked setter
    #[error("tag not recognized: {tag}")]
    UnknownTag { tag: String },

    /// An external executable could not be spawned or exited non-zero
    #[error("{tool} failed on {path}: {reason}")]
    ExternalTool {
        tool: String,
        path: PathBuf,
        reason: String,
    },

    /// An output artifact could not be written
    #[error("failed to write {path}: {source}")]
    OutputWrite {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
}

/// Failure that aborts the whole run before or after node dispatch.
#[derive(Debug, Error)]
pub enum RunError {
    /// The output root could not be created
    #[error("cannot create output root {path}: {source}")]
    OutputRoot {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    /// The input root is missing, unreadable or not a directory
    #[error("cannot read input tree {path}: {reason}")]
    InputTree { path: PathBuf, reason: String },

    /// The substitution spec could not be parsed
    #[error("invalid substitution spec: {reason}")]
    SpecParse { reason: String },

    /// The run report could not be persisted
    #[error("cannot write report to {path}: {source}")]
    ReportWrite {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
}
