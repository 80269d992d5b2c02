//! Required-target coverage check.

use formfill_model::{
    FailureKind, MappingOutcome, TargetField, ValidationFailure,
};

/// Every `required` target field must have a mapping.
pub fn check(outcome: &MappingOutcome, targets: &[TargetField]) -> Vec<ValidationFailure> {
    let mut failures = Vec::new();
    for target in targets {
        if !target.required {
            continue;
        }
        if outcome.mapping_for(&target.name).is_none() {
            failures.push(ValidationFailure {
                kind: FailureKind::MissingRequiredField,
                target_name: target.name.clone(),
                message: format!("required target '{}' has no mapping", target.name),
            });
        }
    }
    failures
}
