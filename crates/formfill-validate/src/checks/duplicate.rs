//! Duplicate assignment guard.
//!
//! Structurally impossible given the engine's occupancy discipline, but
//! validated anyway as a regression guard.

use std::collections::BTreeSet;

use formfill_model::{
    FailureKind, MappingConfig, MappingOutcome, MergeMode, ValidationFailure,
};

pub fn check(outcome: &MappingOutcome, config: &MappingConfig) -> Vec<ValidationFailure> {
    let mut seen: BTreeSet<(String, Option<String>)> = BTreeSet::new();
    let mut failures = Vec::new();
    for mapping in &outcome.mappings {
        let key = (
            mapping.target_name.clone(),
            match config.merge_mode {
                MergeMode::SingleSource => None,
                MergeMode::MultiSource => mapping.document_id.clone(),
            },
        );
        if !seen.insert(key) {
            failures.push(ValidationFailure {
                kind: FailureKind::DuplicateAssignment,
                target_name: mapping.target_name.clone(),
                message: format!(
                    "target '{}' received more than one mapping",
                    mapping.target_name
                ),
            });
        }
    }
    failures
}
