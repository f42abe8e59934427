//! Per-node pipeline
//!
//! A node is one directory of input files. Each node passes through three
//! strictly sequential stages: read loads files into records, analyze
//! rewrites tags per the substitution spec, write materializes the output
//! artifacts. Nodes themselves are dispatched concurrently by the driver.

pub mod analyze;
pub mod node;
pub mod read;
pub mod write;

pub use analyze::{analyze_records, AnalyzeOutcome};
pub use node::{process_node, NodeState};
pub use read::{read_node, ReadOutcome};
pub use write::{write_node, WriteOutcome, WriteRequest, DESCRIPTOR_FILENAME, PREVIEW_BASENAME};
