//! Validation check modules.
//!
//! Each module performs one kind of check and returns the failures it
//! found; `run_all` aggregates them into a single report.

mod confidence;
mod datatype;
mod duplicate;
mod required;

use std::collections::BTreeMap;

use tracing::debug;

use formfill_model::{
    MappingConfig, MappingOutcome, SourceField, TargetField, ValidationReport,
};

/// Run all QA checks on a mapping result.
pub fn run_all(
    outcome: &MappingOutcome,
    targets: &[TargetField],
    sources: &[SourceField],
    config: &MappingConfig,
) -> ValidationReport {
    let source_lookup = build_source_lookup(sources);
    let mut report = ValidationReport::default();

    // 1. Required target coverage
    for failure in required::check(outcome, targets) {
        report.add(failure);
    }

    // 2. Hard confidence floor (catches upstream config drift)
    for failure in confidence::check(outcome, config) {
        report.add(failure);
    }

    // 3. Value type coercibility against the declared target type
    for failure in datatype::check(outcome, targets, &source_lookup) {
        report.add(failure);
    }

    // 4. Duplicate target assignment (regression guard)
    for failure in duplicate::check(outcome, config) {
        report.add(failure);
    }

    if !report.is_valid() {
        debug!(failures = report.failures.len(), "qa gate failed");
    }
    report
}

/// Source fields keyed by (name, document id); the first occurrence wins
/// when an extractor repeats a name within one document.
fn build_source_lookup(
    sources: &[SourceField],
) -> BTreeMap<(&str, Option<&str>), &SourceField> {
    let mut lookup = BTreeMap::new();
    for source in sources {
        lookup
            .entry((source.name.as_str(), source.document_id.as_deref()))
            .or_insert(source);
    }
    lookup
}
