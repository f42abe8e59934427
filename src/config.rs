//! Run configuration
//!
//! One immutable value built at startup and shared read-only across every
//! node task. Executable paths, policies and the substitution spec all live
//! here; nothing run-scoped is kept in globals.

use std::path::PathBuf;

use clap::ValueEnum;
use serde::{Deserialize, Serialize};

use crate::tags::AnonymizationSpec;
use crate::tools::ExternalTools;

/// What to do when a template references a tag the record does not carry.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, ValueEnum)]
#[serde(rename_all = "snake_case")]
pub enum MissingTagPolicy {
    /// The record fails and is dropped from the output set (default)
    #[default]
    #[value(name = "fail", alias = "fail_record")]
    FailRecord,
    /// The reference resolves to the empty string
    #[value(name = "empty", alias = "substitute_empty")]
    SubstituteEmpty,
}

/// Immutable settings for one run.
#[derive(Debug, Clone)]
pub struct RunConfig {
    /// Root of the input tree
    pub input_dir: PathBuf,

    /// Root of the mirrored output tree
    pub output_dir: PathBuf,

    /// Ordered tag substitution spec
    pub spec: AnonymizationSpec,

    /// Apply the spec and save anonymized copies
    pub anonymize: bool,

    /// Missing-reference policy for the analyze stage
    pub missing_tag: MissingTagPolicy,

    /// Restrict input files to one extension (dot-less, case-insensitive)
    pub extension: Option<String>,

    /// Concurrent node workers
    pub workers: usize,

    /// External executables for conversion, resizing and compositing
    pub tools: ExternalTools,

    /// Extension given to converted raster files
    pub raster_ext: String,

    /// Geometry passed to the resize executable
    pub thumbnail_geometry: String,
}

impl RunConfig {
    pub fn new(input_dir: PathBuf, output_dir: PathBuf) -> Self {
        Self {
            input_dir,
            output_dir,
            spec: AnonymizationSpec::default(),
            anonymize: true,
            missing_tag: MissingTagPolicy::default(),
            extension: None,
            workers: num_cpus::get(),
            tools: ExternalTools::default(),
            raster_ext: "jpg".to_string(),
            thumbnail_geometry: "96x96".to_string(),
        }
    }

    pub fn with_spec(mut self, spec: AnonymizationSpec) -> Self {
        self.spec = spec;
        self
    }

    pub fn with_anonymize(mut self, anonymize: bool) -> Self {
        self.anonymize = anonymize;
        self
    }

    pub fn with_missing_tag(mut self, policy: MissingTagPolicy) -> Self {
        self.missing_tag = policy;
        self
    }

    /// Set the input extension filter; a leading dot is tolerated.
    pub fn with_extension(mut self, extension: Option<String>) -> Self {
        self.extension = extension.map(|e| e.trim_start_matches('.').to_ascii_lowercase());
        self
    }

    pub fn with_workers(mut self, workers: usize) -> Self {
        self.workers = workers.max(1);
        self
    }

    pub fn with_tools(mut self, tools: ExternalTools) -> Self {
        self.tools = tools;
        self
    }

    pub fn with_raster_ext(mut self, ext: impl Into<String>) -> Self {
        self.raster_ext = ext.into();
        self
    }

    pub fn with_thumbnail_geometry(mut self, geometry: impl Into<String>) -> Self {
        self.thumbnail_geometry = geometry.into();
        self
    }
}
