//! Write stage
//!
//! Materializes one node's artifacts under the output root: anonymized
//! copies, one converted raster per record, the preview strip and the JSON
//! descriptor. Every filesystem path handled here is absolute; the process
//! working directory is never read or changed.

use std::fs;
use std::path::{Path, PathBuf};

use crate::config::RunConfig;
use crate::error::PipelineError;
use crate::record::MetadataRecord;
use crate::report::NodeResult;

/// Name of the per-node descriptor file.
pub const DESCRIPTOR_FILENAME: &str = "description.json";

/// Base name of the per-node preview strip.
pub const PREVIEW_BASENAME: &str = "preview";

/// Everything the write stage needs for one node.
pub struct WriteRequest<'a> {
    pub config: &'a RunConfig,
    /// Absolute path of the node's input directory
    pub node_dir: &'a Path,
    /// Node path relative to the input root
    pub rel_path: &'a Path,
    /// Records surviving the analyze stage, in input order
    pub records: &'a [MetadataRecord],
    /// Stage statuses and counters folded into the descriptor
    pub read_status: bool,
    pub analyze_status: bool,
    pub files_read: usize,
    pub files_analyzed: usize,
}

/// Outcome of writing one node.
#[derive(Debug)]
pub struct WriteOutcome {
    /// True when every artifact was materialized
    pub status: bool,
    /// Anonymized copies written
    pub files_saved: usize,
}

/// Write all artifacts for one node. Individual failures are logged and
/// lower the status; the stage always pushes on to the descriptor.
pub fn write_node(req: &WriteRequest<'_>) -> WriteOutcome {
    let node_out = req.config.output_dir.join(req.rel_path);
    let mut status = true;
    let mut files_saved = 0usize;

    // The driver creates the output root up front; a standalone caller may
    // not have, so both levels are ensured here.
    if let Err(err) = ensure_dir(&req.config.output_dir).and_then(|_| ensure_dir(&node_out)) {
        tracing::error!(dir = %node_out.display(), error = %err, "Cannot create output directory");
        return WriteOutcome {
            status: false,
            files_saved: 0,
        };
    }

    // Copies and conversions, per record in input order. Rasters descend
    // from the anonymized copy when one exists, so no derived artifact is
    // built from unscrubbed data.
    let mut rasters: Vec<PathBuf> = Vec::with_capacity(req.records.len());
    for record in req.records {
        let file_name = record.file_name();
        let mut src = record.path().to_path_buf();

        if req.config.anonymize {
            let dest = node_out.join(&file_name);
            match record.save_to(&dest) {
                Ok(()) => {
                    files_saved += 1;
                    src = dest;
                }
                Err(err) => {
                    tracing::warn!(file = %dest.display(), error = %err, "Failed to save anonymized copy");
                    status = false;
                    continue;
                }
            }
        }

        let stem = record
            .path()
            .file_stem()
            .map(|s| s.to_string_lossy().into_owned())
            .unwrap_or(file_name);
        let raster = node_out.join(format!("{}.{}", stem, req.config.raster_ext));
        match req.config.tools.convert_to_raster(&src, &raster) {
            Ok(()) => rasters.push(raster),
            Err(err) => {
                tracing::warn!(file = %src.display(), error = %err, "Raster conversion failed");
                status = false;
            }
        }
    }

    // Thumbnails are resized in place, then concatenated in input order.
    let mut resized: Vec<PathBuf> = Vec::with_capacity(rasters.len());
    for raster in rasters {
        match req
            .config
            .tools
            .resize_in_place(&raster, &req.config.thumbnail_geometry)
        {
            Ok(()) => resized.push(raster),
            Err(err) => {
                tracing::warn!(file = %raster.display(), error = %err, "Thumbnail resize failed");
                status = false;
            }
        }
    }
    if !resized.is_empty() {
        let preview = node_out.join(format!("{}.{}", PREVIEW_BASENAME, req.config.raster_ext));
        if let Err(err) = req.config.tools.composite_strip(&resized, &preview) {
            tracing::warn!(file = %preview.display(), error = %err, "Preview composite failed");
            status = false;
        }
    }

    // Descriptor last, so it reflects the final counters. Its status folds
    // all three stages, matching what the run report will say.
    let descriptor = NodeResult {
        status: req.read_status && req.analyze_status && status,
        files_read: req.files_read,
        files_analyzed: req.files_analyzed,
        files_saved,
        path: req.node_dir.display().to_string(),
    };
    let descriptor_path = node_out.join(DESCRIPTOR_FILENAME);
    if let Err(err) = write_descriptor(&descriptor_path, &descriptor) {
        tracing::warn!(file = %descriptor_path.display(), error = %err, "Failed to write descriptor");
        status = false;
    }

    WriteOutcome {
        status,
        files_saved,
    }
}

fn ensure_dir(dir: &Path) -> Result<(), PipelineError> {
    fs::create_dir_all(dir).map_err(|e| PipelineError::OutputWrite {
        path: dir.to_path_buf(),
        source: e,
    })
}

fn write_descriptor(path: &Path, descriptor: &NodeResult) -> Result<(), PipelineError> {
    let payload =
        serde_json::to_vec_pretty(descriptor).map_err(|e| PipelineError::OutputWrite {
            path: path.to_path_buf(),
            source: std::io::Error::new(std::io::ErrorKind::InvalidData, e),
        })?;
    fs::write(path, payload).map_err(|e| PipelineError::OutputWrite {
        path: path.to_path_buf(),
        source: e,
    })
}
