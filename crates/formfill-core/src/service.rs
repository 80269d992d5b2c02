//! Job service: submission, stage execution, status, and results.
//!
//! Schema problems are rejected at submission time, before any stage
//! runs; after that point every data-quality problem resolves to a
//! completed (possibly warned) result. Stage execution is synchronous and
//! CPU-bound; the only suspension point is between stages, after the
//! checkpoint write.

use std::collections::BTreeMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, PoisonError};
use std::time::{Instant, SystemTime, UNIX_EPOCH};

use thiserror::Error;
use tracing::{info, warn};

use formfill_map::{MappingEngine, ScoreCache};
use formfill_model::{
    JobId, JobOptions, JobResult, JobStatus, MappingConfig, ProcessingState, SourceField, Stage,
    TargetField, ValidationReport,
};
use formfill_validate::validate;

use crate::checkpoint::{CheckpointError, CheckpointStore};
use crate::classify;
use crate::recovery::{RecoveryAction, RecoveryPolicy};
use crate::stage::{StageEvent, TransitionError, next_stage};

/// Rejection at submission time. Jobs with these problems are never
/// created; this is the only path to a failed job.
#[derive(Debug, Error)]
pub enum SubmitError {
    #[error("target field name must not be blank")]
    BlankTargetName,
    #[error("duplicate target field name: {0:?}")]
    DuplicateTargetName(String),
    #[error(transparent)]
    InvalidConfig(#[from] formfill_model::ModelError),
    #[error("encode submission: {0}")]
    Encode(#[from] serde_json::Error),
    #[error(transparent)]
    Checkpoint(#[from] CheckpointError),
}

#[derive(Debug, Error)]
pub enum JobError {
    #[error("unknown job: {0}")]
    UnknownJob(JobId),
    #[error("job {0} is not awaiting extraction")]
    NotAwaitingExtraction(JobId),
    #[error(transparent)]
    Checkpoint(#[from] CheckpointError),
    #[error(transparent)]
    Transition(#[from] TransitionError),
}

/// Result of driving a job with [`JobService::run`].
#[derive(Debug)]
pub enum JobProgress {
    Finished(JobResult),
    /// The job is parked until the caller re-supplies source fields via
    /// [`JobService::resupply_sources`].
    AwaitingExtraction(JobId),
}

/// Snapshot for `get_status`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct JobStatusView {
    pub stage: Stage,
    pub attempt: u32,
    pub status: JobStatus,
}

/// Snapshot for `get_result`.
#[derive(Debug)]
pub enum JobResultView {
    Ready(JobResult),
    Pending { stage: Stage, status: JobStatus },
}

/// Orchestrates mapping jobs over a checkpoint store.
///
/// The service holds no per-job mutable state beyond cancellation flags;
/// the at-most-one-active-lease discipline for a given job id is supplied
/// by the surrounding queue infrastructure.
pub struct JobService<S: CheckpointStore> {
    store: S,
    policy: RecoveryPolicy,
    cancel_flags: Mutex<BTreeMap<JobId, Arc<AtomicBool>>>,
}

impl<S: CheckpointStore> JobService<S> {
    pub fn new(store: S) -> Self {
        Self {
            store,
            policy: RecoveryPolicy::default(),
            cancel_flags: Mutex::new(BTreeMap::new()),
        }
    }

    #[must_use]
    pub fn with_policy(mut self, policy: RecoveryPolicy) -> Self {
        self.policy = policy;
        self
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    /// Submits a new job and persists its initial checkpoint.
    pub fn submit(
        &self,
        sources: Vec<SourceField>,
        targets: Vec<TargetField>,
        options: JobOptions,
    ) -> Result<JobId, SubmitError> {
        validate_target_schema(&targets)?;

        let mut config = MappingConfig::default();
        options.apply_to(&mut config);
        config.validate()?;

        let job_id = derive_job_id(&sources, &targets, options.document_type_hint.as_deref())?;
        if usable_sources(&sources).is_empty() {
            warn!(%job_id, "job submitted with no usable source fields");
        }
        let state = ProcessingState::new(
            job_id.clone(),
            sources,
            targets,
            options.document_type_hint,
            config,
        );
        self.store.save(&state)?;
        self.cancel_flag(&job_id);
        info!(
            %job_id,
            sources = state.source_fields.len(),
            targets = state.target_fields.len(),
            "job submitted"
        );
        Ok(job_id)
    }

    /// Drives a job until it finishes or parks for re-extraction.
    ///
    /// A checkpoint is written after every stage transition, so a crash
    /// resumes exactly at the last completed stage.
    pub fn run(&self, job_id: &JobId) -> Result<JobProgress, JobError> {
        let mut state = self.load_state(job_id)?;
        if state.status.is_terminal() {
            return Ok(JobProgress::Finished(result_from_state(&state)));
        }
        if state.status == JobStatus::AwaitingExtraction {
            return Ok(JobProgress::AwaitingExtraction(state.job_id.clone()));
        }
        state.status = JobStatus::Running;
        let cancel = self.cancel_flag(job_id);
        let mut cache = ScoreCache::new();

        loop {
            // Cancellation is checked before starting any stage.
            if state.stage != Stage::Finalize && cancel.load(Ordering::Relaxed) {
                warn!(job_id = %state.job_id, stage = %state.stage, "cancellation flag raised");
                state
                    .warnings
                    .push("job cancelled before completion".to_string());
                self.transition(&mut state, StageEvent::Cancelled)?;
                continue;
            }

            let started = Instant::now();
            let mut event = match state.stage {
                Stage::Finalize => {
                    return Ok(JobProgress::Finished(self.finalize(&mut state)?));
                }
                Stage::Classify => {
                    classify::apply_profile(
                        &mut state.config,
                        state.document_type_hint.as_deref(),
                    );
                    StageEvent::Classified
                }
                Stage::Map => {
                    state.attempt += 1;
                    let usable = usable_sources(&state.source_fields);
                    let engine = MappingEngine::new(state.config.clone());
                    let outcome = engine.map(&usable, &state.target_fields, &mut cache);
                    info!(
                        job_id = %state.job_id,
                        attempt = state.attempt,
                        mapped = outcome.mappings.len(),
                        unmapped_targets = outcome.unmapped_targets.len(),
                        "mapping attempt complete"
                    );
                    state.current_mappings = Some(outcome);
                    StageEvent::Mapped
                }
                Stage::Qa => {
                    let outcome = state.current_mappings.clone().unwrap_or_default();
                    let report = validate(
                        &outcome,
                        &state.target_fields,
                        &state.source_fields,
                        &state.config,
                    );
                    state.record_attempt(outcome, report.failures.len());
                    state.validation_failures = report.failures.clone();
                    if report.is_valid() {
                        StageEvent::QaPassed
                    } else {
                        StageEvent::QaFailed {
                            attempts_remaining: state.attempt < state.config.max_attempts,
                        }
                    }
                }
                Stage::Recover => {
                    let report = ValidationReport {
                        failures: state.validation_failures.clone(),
                    };
                    let budget_left =
                        state.reextraction_requests < state.config.max_reextraction_requests;
                    let usable = usable_sources(&state.source_fields).len();
                    match self.policy.plan(
                        &report,
                        &state.config,
                        state.attempt,
                        usable,
                        budget_left,
                    ) {
                        RecoveryAction::Retune(adjusted) => {
                            state.config = adjusted;
                            StageEvent::RecoveryPlanned
                        }
                        RecoveryAction::RequestReextraction => {
                            state.reextraction_requests += 1;
                            state.status = JobStatus::AwaitingExtraction;
                            info!(job_id = %state.job_id, "requesting re-extraction");
                            StageEvent::ExtractionRequested
                        }
                        RecoveryAction::Accept => StageEvent::QaFailed {
                            attempts_remaining: false,
                        },
                    }
                }
            };

            // Per-stage wall-clock budget. Stages are synchronous, so the
            // overrun is observed after the stage returns.
            if let Some(budget) = state.config.stage_timeout_ms
                && matches!(state.stage, Stage::Classify | Stage::Map | Stage::Qa)
            {
                let elapsed = started.elapsed().as_millis() as u64;
                if elapsed >= budget {
                    warn!(
                        job_id = %state.job_id,
                        stage = %state.stage,
                        elapsed_ms = elapsed,
                        budget_ms = budget,
                        "stage exceeded wall-clock budget"
                    );
                    state.warnings.push(format!(
                        "stage {} exceeded its {budget}ms budget",
                        state.stage
                    ));
                    event = StageEvent::TimedOut {
                        attempts_remaining: state.attempt < state.config.max_attempts,
                    };
                }
            }

            let awaiting = event == StageEvent::ExtractionRequested;
            self.transition(&mut state, event)?;
            if awaiting {
                return Ok(JobProgress::AwaitingExtraction(state.job_id.clone()));
            }
        }
    }

    /// Replaces the source fields of a job parked for re-extraction.
    pub fn resupply_sources(
        &self,
        job_id: &JobId,
        sources: Vec<SourceField>,
    ) -> Result<(), JobError> {
        let mut state = self.load_state(job_id)?;
        if state.status != JobStatus::AwaitingExtraction {
            return Err(JobError::NotAwaitingExtraction(job_id.clone()));
        }
        info!(%job_id, sources = sources.len(), "source fields re-supplied");
        state.source_fields = sources;
        state.status = JobStatus::Pending;
        state.touch();
        self.store.save(&state)?;
        Ok(())
    }

    /// Raises the cancellation flag; the job finalizes degraded at its
    /// next stage boundary.
    pub fn cancel(&self, job_id: &JobId) {
        self.cancel_flag(job_id).store(true, Ordering::Relaxed);
    }

    pub fn get_status(&self, job_id: &JobId) -> Result<JobStatusView, JobError> {
        let state = self.load_state(job_id)?;
        Ok(JobStatusView {
            stage: state.stage,
            attempt: state.attempt,
            status: state.status,
        })
    }

    pub fn get_result(&self, job_id: &JobId) -> Result<JobResultView, JobError> {
        let state = self.load_state(job_id)?;
        if state.status.is_terminal() {
            Ok(JobResultView::Ready(result_from_state(&state)))
        } else {
            Ok(JobResultView::Pending {
                stage: state.stage,
                status: state.status,
            })
        }
    }

    fn load_state(&self, job_id: &JobId) -> Result<ProcessingState, JobError> {
        self.store
            .load(job_id)?
            .ok_or_else(|| JobError::UnknownJob(job_id.clone()))
    }

    fn transition(
        &self,
        state: &mut ProcessingState,
        event: StageEvent,
    ) -> Result<(), JobError> {
        let from = state.stage;
        state.stage = next_stage(from, &event)?;
        state.touch();
        self.store.save(state)?;
        info!(
            job_id = %state.job_id,
            from = %from,
            to = %state.stage,
            event = event.as_str(),
            "stage transition"
        );
        Ok(())
    }

    /// Persists the final result: the best attempt seen, with any
    /// outstanding QA failures downgraded to warnings.
    fn finalize(&self, state: &mut ProcessingState) -> Result<JobResult, JobError> {
        let outcome = state
            .best_attempt
            .as_ref()
            .map(|attempt| attempt.outcome.clone())
            .or_else(|| state.current_mappings.clone())
            .unwrap_or_default();
        let report = validate(
            &outcome,
            &state.target_fields,
            &state.source_fields,
            &state.config,
        );

        let mut warnings = state.warnings.clone();
        for failure in &report.failures {
            warnings.push(format!("unresolved {failure}"));
        }
        state.status = if report.is_valid() && warnings.is_empty() {
            JobStatus::Completed
        } else {
            JobStatus::CompletedWithWarnings
        };
        state.validation_failures = report.failures.clone();
        state.current_mappings = Some(outcome.clone());
        state.warnings = warnings.clone();
        state.touch();
        self.store.save(state)?;
        info!(
            job_id = %state.job_id,
            status = %state.status,
            mappings = outcome.mappings.len(),
            warnings = warnings.len(),
            "job finalized"
        );

        Ok(JobResult {
            job_id: state.job_id.clone(),
            status: state.status,
            mappings: outcome.mappings,
            unmapped_sources: outcome.unmapped_sources,
            unmapped_targets: outcome.unmapped_targets,
            warnings,
            failures: report.failures,
        })
    }

    fn cancel_flag(&self, job_id: &JobId) -> Arc<AtomicBool> {
        let mut flags = self
            .cancel_flags
            .lock()
            .unwrap_or_else(PoisonError::into_inner);
        Arc::clone(
            flags
                .entry(job_id.clone())
                .or_insert_with(|| Arc::new(AtomicBool::new(false))),
        )
    }
}

fn validate_target_schema(targets: &[TargetField]) -> Result<(), SubmitError> {
    let mut seen = std::collections::BTreeSet::new();
    for target in targets {
        let trimmed = target.name.trim();
        if trimmed.is_empty() {
            return Err(SubmitError::BlankTargetName);
        }
        if !seen.insert(trimmed.to_uppercase()) {
            return Err(SubmitError::DuplicateTargetName(target.name.clone()));
        }
    }
    Ok(())
}

/// Source fields the engine can work with: non-blank names per the
/// extraction contract. Blank entries are tolerated (never rejected) and
/// simply ignored.
fn usable_sources(sources: &[SourceField]) -> Vec<SourceField> {
    sources
        .iter()
        .filter(|source| !source.name.trim().is_empty())
        .cloned()
        .collect()
}

fn derive_job_id(
    sources: &[SourceField],
    targets: &[TargetField],
    hint: Option<&str>,
) -> Result<JobId, SubmitError> {
    let mut payload = serde_json::to_vec(&(sources, targets, hint))?;
    let nanos = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default()
        .as_nanos();
    payload.extend_from_slice(&nanos.to_le_bytes());
    Ok(JobId::derive(&payload))
}

fn result_from_state(state: &ProcessingState) -> JobResult {
    let outcome = state.current_mappings.clone().unwrap_or_default();
    JobResult {
        job_id: state.job_id.clone(),
        status: state.status,
        mappings: outcome.mappings,
        unmapped_sources: outcome.unmapped_sources,
        unmapped_targets: outcome.unmapped_targets,
        warnings: state.warnings.clone(),
        failures: state.validation_failures.clone(),
    }
}
