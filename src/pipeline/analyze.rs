//! Analyze stage
//!
//! Applies the substitution spec to every record, mutating tags in place.
//! Spec entries run in insertion order, so a later template resolving
//! `%PatientName` observes the value an earlier entry wrote.

use crate::config::MissingTagPolicy;
use crate::error::PipelineError;
use crate::record::MetadataRecord;
use crate::tags::{template, AnonymizationSpec};

/// Outcome of analyzing one node's records.
#[derive(Debug)]
pub struct AnalyzeOutcome {
    /// True when at least one record was processed and none failed
    pub status: bool,
    /// Surviving records; failed records are dropped, never written out
    pub records: Vec<MetadataRecord>,
    /// Records fully processed
    pub files_analyzed: usize,
}

/// Apply `spec` to `records`. With `enabled` false the records pass through
/// untouched and the stage reports zero analyzed with a false status.
pub fn analyze_records(
    records: Vec<MetadataRecord>,
    spec: &AnonymizationSpec,
    enabled: bool,
    policy: MissingTagPolicy,
) -> AnalyzeOutcome {
    if !enabled {
        return AnalyzeOutcome {
            status: false,
            records,
            files_analyzed: 0,
        };
    }

    let mut survivors = Vec::with_capacity(records.len());
    let mut failed = 0usize;
    for mut record in records {
        match apply_spec(&mut record, spec, policy) {
            Ok(()) => survivors.push(record),
            Err(err) => {
                tracing::warn!(
                    file = %record.path().display(),
                    error = %err,
                    "Dropping record from the output set"
                );
                failed += 1;
            }
        }
    }

    let files_analyzed = survivors.len();
    AnalyzeOutcome {
        status: files_analyzed > 0 && failed == 0,
        records: survivors,
        files_analyzed,
    }
}

/// Run every spec entry against one record's current tags.
fn apply_spec(
    record: &mut MetadataRecord,
    spec: &AnonymizationSpec,
    policy: MissingTagPolicy,
) -> Result<(), PipelineError> {
    for (tag, tpl) in spec.iter() {
        let resolution = template::resolve(tpl, record.tags());
        if !resolution.unresolved.is_empty() {
            if policy == MissingTagPolicy::FailRecord {
                return Err(PipelineError::TagResolution {
                    tag: tag.clone(),
                    missing: resolution.unresolved.into_iter().collect(),
                });
            }
            tracing::debug!(
                file = %record.path().display(),
                tag = %tag,
                missing = ?resolution.unresolved,
                "Substituting empty for unresolved references"
            );
        }
        record.set_tag(tag, &resolution.value)?;
    }
    Ok(())
}
