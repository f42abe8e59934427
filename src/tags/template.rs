//! Template resolution
//!
//! Value templates reference other tags as `%TagName`; `%%` is a literal
//! percent sign. Resolution is a pure function over the record's current tag
//! map, so callers pick the point in time the references are evaluated at.

use std::collections::BTreeSet;

use once_cell::sync::Lazy;
use regex::{Captures, Regex};

use super::TagMap;

/// Matches `%%` or `%TagName`; a `%` followed by anything else stays literal.
static TAG_REF: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"%(%|[A-Za-z][A-Za-z0-9]*)").expect("tag reference pattern"));

/// Result of resolving one template.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TemplateResolution {
    /// Fully substituted value; unresolved references contribute nothing
    pub value: String,
    /// Names of referenced tags absent from the record
    pub unresolved: BTreeSet<String>,
}

/// Resolve a template against the current tag values.
///
/// Each reference is substituted exactly once; substituted values are not
/// re-scanned, so a tag value containing `%Other` passes through verbatim.
/// Templates without placeholders resolve to themselves unchanged.
pub fn resolve(template: &str, tags: &TagMap) -> TemplateResolution {
    if !template.contains('%') {
        return TemplateResolution {
            value: template.to_string(),
            unresolved: BTreeSet::new(),
        };
    }

    let mut unresolved = BTreeSet::new();
    let value = TAG_REF
        .replace_all(template, |caps: &Captures<'_>| {
            let name = &caps[1];
            if name == "%" {
                return "%".to_string();
            }
            match tags.get(name) {
                Some(value) => value.clone(),
                None => {
                    unresolved.insert(name.to_string());
                    String::new()
                }
            }
        })
        .into_owned();

    TemplateResolution { value, unresolved }
}
