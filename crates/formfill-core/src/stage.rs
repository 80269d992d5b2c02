//! The pipeline state machine as a pure transition function.
//!
//! Control flow lives entirely in `next_stage(stage, event)`; the runner
//! executes whatever the current stage demands and feeds the outcome back
//! as an event. An illegal combination is a programming error surfaced as
//! [`TransitionError`], never a data-quality outcome.

use thiserror::Error;

use formfill_model::Stage;

/// Outcome of executing one pipeline stage.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StageEvent {
    /// Classification picked a config profile (or defaulted).
    Classified,
    /// The mapping engine produced an outcome.
    Mapped,
    /// QA passed with no failures.
    QaPassed,
    /// QA failed; `attempts_remaining` decides recovery vs degradation.
    QaFailed { attempts_remaining: bool },
    /// Recovery chose an adjusted config for the next attempt.
    RecoveryPlanned,
    /// Recovery asked the extraction collaborator for fresh input.
    ExtractionRequested,
    /// The stage overran its wall-clock budget.
    TimedOut { attempts_remaining: bool },
    /// The job's cancellation flag was raised.
    Cancelled,
}

impl StageEvent {
    pub fn as_str(&self) -> &'static str {
        match self {
            StageEvent::Classified => "classified",
            StageEvent::Mapped => "mapped",
            StageEvent::QaPassed => "qa_passed",
            StageEvent::QaFailed { .. } => "qa_failed",
            StageEvent::RecoveryPlanned => "recovery_planned",
            StageEvent::ExtractionRequested => "extraction_requested",
            StageEvent::TimedOut { .. } => "timed_out",
            StageEvent::Cancelled => "cancelled",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("no transition from stage '{stage}' on event '{event}'")]
pub struct TransitionError {
    pub stage: Stage,
    pub event: &'static str,
}

/// Computes the next stage for `(stage, event)`.
///
/// Stages only move forward or into the recovery loop; `Finalize` is
/// terminal and accepts no events.
pub fn next_stage(stage: Stage, event: &StageEvent) -> Result<Stage, TransitionError> {
    use StageEvent as E;
    let next = match (stage, event) {
        (_, E::Cancelled) if stage != Stage::Finalize => Stage::Finalize,

        (Stage::Classify, E::Classified) => Stage::Map,
        (Stage::Classify, E::TimedOut { attempts_remaining: true }) => Stage::Recover,
        (Stage::Classify, E::TimedOut { attempts_remaining: false }) => Stage::Finalize,

        (Stage::Map, E::Mapped) => Stage::Qa,
        (Stage::Map, E::TimedOut { attempts_remaining: true }) => Stage::Recover,
        (Stage::Map, E::TimedOut { attempts_remaining: false }) => Stage::Finalize,

        (Stage::Qa, E::QaPassed) => Stage::Finalize,
        (Stage::Qa, E::QaFailed { attempts_remaining: true }) => Stage::Recover,
        (Stage::Qa, E::QaFailed { attempts_remaining: false }) => Stage::Finalize,
        (Stage::Qa, E::TimedOut { attempts_remaining: true }) => Stage::Recover,
        (Stage::Qa, E::TimedOut { attempts_remaining: false }) => Stage::Finalize,

        (Stage::Recover, E::RecoveryPlanned) => Stage::Map,
        (Stage::Recover, E::ExtractionRequested) => Stage::Map,
        // Recovery concluded nothing more can be done; degrade.
        (Stage::Recover, E::QaFailed { attempts_remaining: false }) => Stage::Finalize,
        (Stage::Recover, E::TimedOut { .. }) => Stage::Finalize,

        _ => {
            return Err(TransitionError {
                stage,
                event: event.as_str(),
            });
        }
    };
    Ok(next)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn happy_path_walks_forward() {
        let mut stage = Stage::Classify;
        for event in [StageEvent::Classified, StageEvent::Mapped, StageEvent::QaPassed] {
            stage = next_stage(stage, &event).expect("legal transition");
        }
        assert_eq!(stage, Stage::Finalize);
    }

    #[test]
    fn qa_failure_loops_through_recovery() {
        let stage = next_stage(
            Stage::Qa,
            &StageEvent::QaFailed {
                attempts_remaining: true,
            },
        )
        .unwrap();
        assert_eq!(stage, Stage::Recover);
        let stage = next_stage(stage, &StageEvent::RecoveryPlanned).unwrap();
        assert_eq!(stage, Stage::Map);
    }

    #[test]
    fn exhausted_attempts_finalize_instead_of_recovering() {
        let stage = next_stage(
            Stage::Qa,
            &StageEvent::QaFailed {
                attempts_remaining: false,
            },
        )
        .unwrap();
        assert_eq!(stage, Stage::Finalize);
    }

    #[test]
    fn cancellation_finalizes_from_any_stage() {
        for stage in [Stage::Classify, Stage::Map, Stage::Qa, Stage::Recover] {
            assert_eq!(
                next_stage(stage, &StageEvent::Cancelled).unwrap(),
                Stage::Finalize
            );
        }
    }

    #[test]
    fn finalize_accepts_no_events() {
        assert!(next_stage(Stage::Finalize, &StageEvent::Classified).is_err());
        assert!(next_stage(Stage::Finalize, &StageEvent::Cancelled).is_err());
    }

    #[test]
    fn stages_never_move_backward_silently() {
        // Mapping results can never send the machine back to Classify.
        assert!(next_stage(Stage::Qa, &StageEvent::Classified).is_err());
        assert!(next_stage(Stage::Map, &StageEvent::QaPassed).is_err());
    }
}
