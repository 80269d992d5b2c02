//! Error recovery policy for failed QA attempts.

use tracing::debug;

use formfill_model::{FailureKind, MappingConfig, ValidationReport};

/// Decision for the next attempt after a QA failure.
#[derive(Debug, Clone, PartialEq)]
pub enum RecoveryAction {
    /// Re-run mapping with an adjusted configuration.
    Retune(MappingConfig),
    /// Ask the extraction collaborator to re-supply source fields. The
    /// orchestrator surfaces this as a distinct status; it never calls the
    /// collaborator itself.
    RequestReextraction,
    /// Nothing left to try; finalize with the best attempt seen.
    Accept,
}

/// Deterministic retuning policy.
///
/// Missing-required failures widen acceptance so weaker candidates can
/// fill the gap; confidence and type failures tighten the threshold and
/// shift weight from lexical similarity toward type compatibility.
#[derive(Debug, Clone, Copy)]
pub struct RecoveryPolicy {
    pub threshold_step: f32,
    pub weight_shift: f32,
}

impl Default for RecoveryPolicy {
    fn default() -> Self {
        Self {
            threshold_step: 0.05,
            weight_shift: 0.10,
        }
    }
}

impl RecoveryPolicy {
    /// Plans the next attempt.
    ///
    /// `usable_sources` is the number of source fields with non-blank
    /// names; when it is zero, retuning cannot help and the policy asks
    /// for re-extraction while budget remains.
    pub fn plan(
        &self,
        report: &ValidationReport,
        config: &MappingConfig,
        attempt: u32,
        usable_sources: usize,
        reextraction_budget_left: bool,
    ) -> RecoveryAction {
        if attempt >= config.max_attempts {
            return RecoveryAction::Accept;
        }
        if usable_sources == 0 {
            return if reextraction_budget_left {
                RecoveryAction::RequestReextraction
            } else {
                RecoveryAction::Accept
            };
        }

        let mut adjusted = config.clone();
        if report.has(FailureKind::MissingRequiredField) {
            // Widen: let weaker candidates through, bounded by the QA floor.
            adjusted.assignment_threshold = (config.assignment_threshold - self.threshold_step)
                .max(config.qa_min_confidence);
            adjusted.candidate_floor = (config.candidate_floor - self.threshold_step)
                .max(0.0)
                .min(adjusted.assignment_threshold);
            debug!(
                threshold = adjusted.assignment_threshold,
                floor = adjusted.candidate_floor,
                "recovery widening acceptance"
            );
        } else {
            // Tighten: demand better matches and trust the type signal more.
            adjusted.assignment_threshold =
                (config.assignment_threshold + self.threshold_step).min(0.95);
            let shift = self.weight_shift.min(config.weights.lexical);
            adjusted.weights.lexical = config.weights.lexical - shift;
            adjusted.weights.type_compatibility = config.weights.type_compatibility + shift;
            debug!(
                threshold = adjusted.assignment_threshold,
                type_weight = adjusted.weights.type_compatibility,
                "recovery tightening acceptance"
            );
        }
        RecoveryAction::Retune(adjusted)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use formfill_model::ValidationFailure;

    fn report_with(kind: FailureKind) -> ValidationReport {
        ValidationReport {
            failures: vec![ValidationFailure {
                kind,
                target_name: "email".to_string(),
                message: "test".to_string(),
            }],
        }
    }

    #[test]
    fn missing_required_widens_threshold() {
        let policy = RecoveryPolicy::default();
        let config = MappingConfig::default();
        let action = policy.plan(
            &report_with(FailureKind::MissingRequiredField),
            &config,
            1,
            3,
            true,
        );
        match action {
            RecoveryAction::Retune(adjusted) => {
                assert!(adjusted.assignment_threshold < config.assignment_threshold);
                assert!(adjusted.assignment_threshold >= config.qa_min_confidence);
            }
            other => panic!("expected retune, got {other:?}"),
        }
    }

    #[test]
    fn type_failures_tighten_and_shift_weights() {
        let policy = RecoveryPolicy::default();
        let config = MappingConfig::default();
        let action = policy.plan(&report_with(FailureKind::TypeMismatch), &config, 1, 3, true);
        match action {
            RecoveryAction::Retune(adjusted) => {
                assert!(adjusted.assignment_threshold > config.assignment_threshold);
                assert!(adjusted.weights.type_compatibility > config.weights.type_compatibility);
                assert!(adjusted.weights.lexical < config.weights.lexical);
            }
            other => panic!("expected retune, got {other:?}"),
        }
    }

    #[test]
    fn empty_sources_request_reextraction_within_budget() {
        let policy = RecoveryPolicy::default();
        let config = MappingConfig::default();
        let report = report_with(FailureKind::MissingRequiredField);
        assert_eq!(
            policy.plan(&report, &config, 1, 0, true),
            RecoveryAction::RequestReextraction
        );
        assert_eq!(
            policy.plan(&report, &config, 1, 0, false),
            RecoveryAction::Accept
        );
    }

    #[test]
    fn exhausted_attempts_accept() {
        let policy = RecoveryPolicy::default();
        let config = MappingConfig::default();
        let report = report_with(FailureKind::MissingRequiredField);
        assert_eq!(
            policy.plan(&report, &config, config.max_attempts, 3, true),
            RecoveryAction::Accept
        );
    }

    #[test]
    fn widened_config_stays_valid() {
        let policy = RecoveryPolicy::default();
        let mut config = MappingConfig::default();
        // Repeated widening must never push the floor past the threshold.
        for attempt in 1..config.max_attempts {
            if let RecoveryAction::Retune(adjusted) = policy.plan(
                &report_with(FailureKind::MissingRequiredField),
                &config,
                attempt,
                3,
                true,
            ) {
                adjusted.validate().expect("retuned config valid");
                config = adjusted;
            }
        }
    }
}
