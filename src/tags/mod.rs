//! Tag domain
//!
//! Tag maps, value templates, substitution specs and the standard keyword
//! registry.

pub mod registry;
pub mod spec;
pub mod template;

pub use spec::AnonymizationSpec;
pub use template::{resolve, TemplateResolution};

/// Tag name to value mapping, in file order.
pub type TagMap = indexmap::IndexMap<String, String>;
