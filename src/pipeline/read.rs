//! Read stage
//!
//! Loads every input file of a node into a metadata record, preserving input
//! order. A failed load is logged and skipped; the stage carries on with the
//! remaining files and reports the failure through its status.

use std::path::Path;

use crate::error::PipelineError;
use crate::record::{MetadataParser, MetadataRecord};

/// Outcome of reading one node's files.
#[derive(Debug)]
pub struct ReadOutcome {
    /// True when the node had files and every one of them loaded
    pub status: bool,
    /// Records in input order; failed loads contribute none
    pub records: Vec<MetadataRecord>,
    /// Files successfully loaded
    pub files_read: usize,
}

/// Load `files` from `dir` in order. `dir` must be absolute.
pub fn read_node(dir: &Path, files: &[String], parser: &dyn MetadataParser) -> ReadOutcome {
    if files.is_empty() {
        let err = PipelineError::EmptyInput {
            path: dir.to_path_buf(),
        };
        tracing::warn!(dir = %dir.display(), error = %err, "Nothing to read");
        return ReadOutcome {
            status: false,
            records: Vec::new(),
            files_read: 0,
        };
    }

    let mut status = true;
    let mut records = Vec::with_capacity(files.len());
    for name in files {
        let path = dir.join(name);
        match parser.read_one(&path) {
            Ok(dataset) => records.push(MetadataRecord::new(path, dataset)),
            Err(err) => {
                tracing::warn!(file = %path.display(), error = %err, "Failed to load metadata");
                status = false;
            }
        }
    }

    let files_read = records.len();
    ReadOutcome {
        status,
        records,
        files_read,
    }
}
