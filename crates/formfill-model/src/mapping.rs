//! Mapping result types produced by the field mapping engine.

use std::cmp::Ordering;
use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// An accepted assignment of one source field to one target field.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FieldMapping {
    /// Source field name from the extracted document data.
    pub source_name: String,
    /// Target form field name.
    pub target_name: String,
    /// Composite confidence score in [0, 1]; exactly 1.0 only for exact
    /// normalized-name matches.
    pub confidence: f32,
    /// Per-strategy score breakdown for explainability.
    pub strategy_breakdown: BTreeMap<String, f32>,
    /// True when the score is a weak accept just above the threshold and
    /// deserves human review.
    pub flagged: bool,
    /// Originating document, carried through for multi-source merge jobs.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub document_id: Option<String>,
}

/// Result of one mapping engine run.
///
/// Unassigned target fields appear in `unmapped_targets`, never as
/// null-valued mappings.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct MappingOutcome {
    pub mappings: Vec<FieldMapping>,
    pub unmapped_sources: Vec<String>,
    pub unmapped_targets: Vec<String>,
}

impl MappingOutcome {
    /// Mapping for a specific target, if one was assigned.
    pub fn mapping_for(&self, target_name: &str) -> Option<&FieldMapping> {
        self.mappings
            .iter()
            .find(|m| m.target_name.eq_ignore_ascii_case(target_name))
    }

    /// Mean confidence across all mappings, if any.
    #[must_use]
    pub fn mean_confidence(&self) -> Option<f32> {
        if self.mappings.is_empty() {
            return None;
        }
        let sum: f32 = self.mappings.iter().map(|m| m.confidence).sum();
        Some(sum / self.mappings.len() as f32)
    }

    /// Minimum confidence across all mappings, if any.
    #[must_use]
    pub fn min_confidence(&self) -> Option<f32> {
        self.mappings
            .iter()
            .map(|m| m.confidence)
            .min_by(|a, b| a.partial_cmp(b).unwrap_or(Ordering::Equal))
    }

    /// Number of weak accepts flagged for review.
    #[must_use]
    pub fn flagged_count(&self) -> usize {
        self.mappings.iter().filter(|m| m.flagged).count()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn mapping(target: &str, confidence: f32, flagged: bool) -> FieldMapping {
        FieldMapping {
            source_name: format!("src_{target}"),
            target_name: target.to_string(),
            confidence,
            strategy_breakdown: BTreeMap::new(),
            flagged,
            document_id: None,
        }
    }

    #[test]
    fn summary_helpers() {
        let outcome = MappingOutcome {
            mappings: vec![mapping("a", 0.8, false), mapping("b", 0.6, true)],
            unmapped_sources: vec![],
            unmapped_targets: vec!["c".to_string()],
        };
        assert_eq!(outcome.mean_confidence(), Some(0.7));
        assert_eq!(outcome.min_confidence(), Some(0.6));
        assert_eq!(outcome.flagged_count(), 1);
        assert!(outcome.mapping_for("A").is_some());
        assert!(outcome.mapping_for("c").is_none());
    }

    #[test]
    fn empty_outcome_has_no_mean() {
        assert_eq!(MappingOutcome::default().mean_confidence(), None);
    }
}
