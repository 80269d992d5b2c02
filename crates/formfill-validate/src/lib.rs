//! QA validation gate.
//!
//! Inspects a completed mapping result against the target schema and
//! reports structured failures. The gate never raises: malformed input
//! produces failure entries, not errors.

#![deny(unsafe_code)]

mod checks;
mod infer;

pub use infer::{coercible, infer_value_type};

use formfill_model::{
    MappingConfig, MappingOutcome, SourceField, TargetField, ValidationReport,
};

/// Validate a mapping result.
///
/// Runs every check and aggregates the failures; `report.is_valid()` is
/// true iff all checks passed.
pub fn validate(
    outcome: &MappingOutcome,
    targets: &[TargetField],
    sources: &[SourceField],
    config: &MappingConfig,
) -> ValidationReport {
    checks::run_all(outcome, targets, sources, config)
}
