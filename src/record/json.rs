//! Flat JSON tag files
//!
//! The bundled parser reads files holding a single JSON object of tag names
//! to scalar values. Key order in the document is preserved end to end, so
//! anonymized copies diff cleanly against their sources.

use std::fs;
use std::io;
use std::path::Path;

use indexmap::IndexMap;
use serde_json::Value;

use super::parser::{MetadataParser, TagDataset};
use crate::error::PipelineError;
use crate::tags::{registry, TagMap};

/// Parser for flat JSON tag maps.
#[derive(Debug, Clone, Default)]
pub struct JsonTagParser;

impl JsonTagParser {
    pub fn new() -> Self {
        Self
    }
}

impl MetadataParser for JsonTagParser {
    fn read_one(&self, path: &Path) -> Result<Box<dyn TagDataset>, PipelineError> {
        let bytes = fs::read(path).map_err(|e| PipelineError::MetadataParse {
            path: path.to_path_buf(),
            reason: e.to_string(),
        })?;

        let raw: IndexMap<String, Value> =
            serde_json::from_slice(&bytes).map_err(|e| PipelineError::MetadataParse {
                path: path.to_path_buf(),
                reason: e.to_string(),
            })?;

        let mut tags = TagMap::with_capacity(raw.len());
        for (name, value) in raw {
            let text = match value {
                Value::String(s) => s,
                Value::Number(n) => n.to_string(),
                Value::Bool(b) => b.to_string(),
                Value::Null => String::new(),
                Value::Array(_) | Value::Object(_) => {
                    return Err(PipelineError::MetadataParse {
                        path: path.to_path_buf(),
                        reason: format!("tag {} holds a nested value", name),
                    });
                }
            };
            tags.insert(name, text);
        }

        Ok(Box::new(JsonDataset { tags }))
    }
}

/// Dataset backing a flat JSON tag file.
#[derive(Debug, Clone)]
struct JsonDataset {
    tags: TagMap,
}

impl TagDataset for JsonDataset {
    fn get(&self, name: &str) -> Option<&str> {
        self.tags.get(name).map(String::as_str)
    }

    fn tag_map(&self) -> &TagMap {
        &self.tags
    }

    fn set(&mut self, name: &str, value: &str) -> Result<(), PipelineError> {
        if !self.tags.contains_key(name) && !registry::is_standard(name) {
            return Err(PipelineError::UnknownTag {
                tag: name.to_string(),
            });
        }
        self.tags.insert(name.to_string(), value.to_string());
        Ok(())
    }

    fn save_to(&self, path: &Path) -> Result<(), PipelineError> {
        let payload =
            serde_json::to_vec_pretty(&self.tags).map_err(|e| PipelineError::OutputWrite {
                path: path.to_path_buf(),
                source: io::Error::new(io::ErrorKind::InvalidData, e),
            })?;
        fs::write(path, payload).map_err(|e| PipelineError::OutputWrite {
            path: path.to_path_buf(),
            source: e,
        })
    }
}
