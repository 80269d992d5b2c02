//! Structured validation failures reported by the QA gate.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Kind of QA check that a mapping result violated.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FailureKind {
    /// A required target field has no mapping.
    MissingRequiredField,
    /// A mapping's confidence fell below the hard minimum floor.
    BelowMinimumConfidence,
    /// The mapped value's apparent type does not coerce to the target type.
    TypeMismatch,
    /// A target field received more than one mapping.
    DuplicateAssignment,
}

impl FailureKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            FailureKind::MissingRequiredField => "missing_required_field",
            FailureKind::BelowMinimumConfidence => "below_minimum_confidence",
            FailureKind::TypeMismatch => "type_mismatch",
            FailureKind::DuplicateAssignment => "duplicate_assignment",
        }
    }
}

impl fmt::Display for FailureKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A single QA failure with the target it concerns.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ValidationFailure {
    pub kind: FailureKind,
    pub target_name: String,
    pub message: String,
}

impl fmt::Display for ValidationFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} [{}]: {}", self.kind, self.target_name, self.message)
    }
}

/// Aggregated QA result. The gate never raises; a failed check is a
/// report entry, not an error.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ValidationReport {
    pub failures: Vec<ValidationFailure>,
}

impl ValidationReport {
    pub fn add(&mut self, failure: ValidationFailure) {
        self.failures.push(failure);
    }

    /// True iff no check failed.
    #[must_use]
    pub fn is_valid(&self) -> bool {
        self.failures.is_empty()
    }

    #[must_use]
    pub fn count_of(&self, kind: FailureKind) -> usize {
        self.failures.iter().filter(|f| f.kind == kind).count()
    }

    #[must_use]
    pub fn has(&self, kind: FailureKind) -> bool {
        self.failures.iter().any(|f| f.kind == kind)
    }
}
