//! Bulk de-identification and conversion for trees of medical image
//! metadata.
//!
//! An input tree is walked into nodes (directories of image files); each
//! node runs a read, analyze, write pipeline that anonymizes structured
//! tags, converts records to raster images, composites a preview strip and
//! drops a JSON descriptor next to the artifacts. Node outcomes aggregate
//! into a single [`report::RunReport`].
//!
//! [`driver::Driver`] is the entry point; [`config::RunConfig`] carries
//! every knob. Formats beyond the bundled JSON tag files plug in through
//! [`record::MetadataParser`].

pub mod config;
pub mod driver;
pub mod error;
pub mod pipeline;
pub mod record;
pub mod report;
pub mod tags;
pub mod tools;
pub mod walk;

pub use config::{MissingTagPolicy, RunConfig};
pub use driver::Driver;
pub use error::{PipelineError, RunError};
pub use record::{JsonTagParser, MetadataParser, MetadataRecord, TagDataset};
pub use report::{NodeResult, RunReport};
pub use tags::AnonymizationSpec;
pub use tools::ExternalTools;
