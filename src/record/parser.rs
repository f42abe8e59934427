//! Parser boundary
//!
//! Format-specific parsing sits behind these two traits. The pipeline only
//! ever sees datasets: ordered tag values plus the handle used to rewrite
//! and re-serialize them.

use std::path::Path;

use crate::error::PipelineError;
use crate::tags::TagMap;

/// Parsed representation of one file's metadata.
pub trait TagDataset: Send {
    /// Current value of a tag, if present.
    fn get(&self, name: &str) -> Option<&str>;

    /// All tags in file order.
    fn tag_map(&self) -> &TagMap;

    /// Write a tag value. Accepts tags the file already carries and standard
    /// registry keywords; anything else is rejected with `UnknownTag`.
    fn set(&mut self, name: &str, value: &str) -> Result<(), PipelineError>;

    /// Serialize the dataset, current values included, to `path`.
    fn save_to(&self, path: &Path) -> Result<(), PipelineError>;
}

/// Reads one file into a dataset.
pub trait MetadataParser: Send + Sync {
    fn read_one(&self, path: &Path) -> Result<Box<dyn TagDataset>, PipelineError>;
}
