//! Hard minimum confidence floor.
//!
//! The floor sits below the assignment threshold; a mapping under it means
//! an upstream configuration drifted, not that the engine chose poorly.

use formfill_model::{FailureKind, MappingConfig, MappingOutcome, ValidationFailure};

pub fn check(outcome: &MappingOutcome, config: &MappingConfig) -> Vec<ValidationFailure> {
    let mut failures = Vec::new();
    for mapping in &outcome.mappings {
        if mapping.confidence < config.qa_min_confidence {
            failures.push(ValidationFailure {
                kind: FailureKind::BelowMinimumConfidence,
                target_name: mapping.target_name.clone(),
                message: format!(
                    "mapping '{}' -> '{}' confidence {:.3} is below the minimum {:.2}",
                    mapping.source_name,
                    mapping.target_name,
                    mapping.confidence,
                    config.qa_min_confidence
                ),
            });
        }
    }
    failures
}
