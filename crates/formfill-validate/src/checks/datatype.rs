//! Value type coercibility check.
//!
//! The mapped source *value* (not the extractor's guess) must plausibly
//! coerce to the target's declared type, and must fall within the target's
//! options list when one is defined.

use std::collections::BTreeMap;

use formfill_model::{
    FailureKind, MappingOutcome, SourceField, TargetField, ValidationFailure,
};

use crate::infer::{coercible, infer_value_type};

pub fn check(
    outcome: &MappingOutcome,
    targets: &[TargetField],
    sources: &BTreeMap<(&str, Option<&str>), &SourceField>,
) -> Vec<ValidationFailure> {
    let mut failures = Vec::new();
    for mapping in &outcome.mappings {
        let Some(target) = targets.iter().find(|t| t.name == mapping.target_name) else {
            continue;
        };
        let Some(source) = sources.get(&(
            mapping.source_name.as_str(),
            mapping.document_id.as_deref(),
        )) else {
            continue;
        };

        let apparent = infer_value_type(&source.value);
        if !coercible(apparent, target.field_type) {
            failures.push(ValidationFailure {
                kind: FailureKind::TypeMismatch,
                target_name: target.name.clone(),
                message: format!(
                    "value of '{}' looks like {apparent} but target '{}' expects {}",
                    mapping.source_name, target.name, target.field_type
                ),
            });
            continue;
        }

        if let Some(options) = &target.options
            && !options.is_empty()
            && !source.value.trim().is_empty()
        {
            let value = source.value.trim();
            let allowed = options
                .iter()
                .any(|option| option.trim().eq_ignore_ascii_case(value));
            if !allowed {
                failures.push(ValidationFailure {
                    kind: FailureKind::TypeMismatch,
                    target_name: target.name.clone(),
                    message: format!(
                        "value {value:?} is not among the {} options of target '{}'",
                        options.len(),
                        target.name
                    ),
                });
            }
        }
    }
    failures
}
