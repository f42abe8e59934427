//! Metadata records
//!
//! A record pairs one source file with its parsed dataset. Records are
//! created by the read stage, rewritten in place by the analyze stage and
//! serialized by the write stage.

mod json;
mod parser;

pub use json::JsonTagParser;
pub use parser::{MetadataParser, TagDataset};

use std::fmt;
use std::path::{Path, PathBuf};

use crate::error::PipelineError;
use crate::tags::TagMap;

/// One input file's metadata plus the handle used to rewrite it.
pub struct MetadataRecord {
    path: PathBuf,
    dataset: Box<dyn TagDataset>,
}

impl MetadataRecord {
    pub fn new(path: PathBuf, dataset: Box<dyn TagDataset>) -> Self {
        Self { path, dataset }
    }

    /// Absolute path of the source file.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Source file name.
    pub fn file_name(&self) -> String {
        self.path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default()
    }

    /// Current tag values, in file order.
    pub fn tags(&self) -> &TagMap {
        self.dataset.tag_map()
    }

    /// Current value of one tag.
    pub fn get(&self, name: &str) -> Option<&str> {
        self.dataset.get(name)
    }

    /// Write a tag through the dataset's checked setter.
    pub fn set_tag(&mut self, name: &str, value: &str) -> Result<(), PipelineError> {
        self.dataset.set(name, value)
    }

    /// Serialize the dataset with its current values to `path`.
    pub fn save_to(&self, path: &Path) -> Result<(), PipelineError> {
        self.dataset.save_to(path)
    }
}

impl fmt::Debug for MetadataRecord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MetadataRecord")
            .field("path", &self.path)
            .field("tags", &self.dataset.tag_map().len())
            .finish()
    }
}
