//! Job lifecycle types: pipeline stages, status, and the persistent
//! processing state checkpointed after every stage transition.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::config::{MappingConfig, MappingWeights, MergeMode};
use crate::field::{SourceField, TargetField};
use crate::ids::JobId;
use crate::mapping::{FieldMapping, MappingOutcome};
use crate::validation::ValidationFailure;

/// Pipeline stage of a processing job.
///
/// Stages only move forward or into the recovery loop; re-entering `Map`
/// always increments the attempt counter.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Stage {
    Classify,
    Map,
    Qa,
    Recover,
    Finalize,
}

impl Stage {
    pub fn as_str(&self) -> &'static str {
        match self {
            Stage::Classify => "classify",
            Stage::Map => "map",
            Stage::Qa => "qa",
            Stage::Recover => "recover",
            Stage::Finalize => "finalize",
        }
    }
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Externally visible status of a job.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum JobStatus {
    Pending,
    Running,
    /// Waiting on the extraction collaborator to re-supply source fields.
    AwaitingExtraction,
    Completed,
    CompletedWithWarnings,
    /// Reserved for schema/configuration errors, never data quality.
    Failed,
}

impl JobStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            JobStatus::Pending => "pending",
            JobStatus::Running => "running",
            JobStatus::AwaitingExtraction => "awaiting_extraction",
            JobStatus::Completed => "completed",
            JobStatus::CompletedWithWarnings => "completed_with_warnings",
            JobStatus::Failed => "failed",
        }
    }

    #[must_use]
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            JobStatus::Completed | JobStatus::CompletedWithWarnings | JobStatus::Failed
        )
    }
}

impl fmt::Display for JobStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One mapping attempt's result, kept for best-attempt selection during
/// degraded finalization.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AttemptRecord {
    pub attempt: u32,
    pub outcome: MappingOutcome,
    pub failure_count: usize,
    pub mean_confidence: f32,
}

impl AttemptRecord {
    /// Ranking: fewer validation failures wins, mean confidence breaks ties.
    #[must_use]
    pub fn is_better_than(&self, other: &AttemptRecord) -> bool {
        if self.failure_count != other.failure_count {
            return self.failure_count < other.failure_count;
        }
        self.mean_confidence > other.mean_confidence
    }
}

/// The persistent record of a processing job.
///
/// Mutated only by the orchestrator, exactly once per stage transition,
/// and overwritten in the checkpoint store keyed by `job_id`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProcessingState {
    pub job_id: JobId,
    pub stage: Stage,
    pub status: JobStatus,
    pub attempt: u32,
    pub reextraction_requests: u32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub document_type_hint: Option<String>,
    pub source_fields: Vec<SourceField>,
    pub target_fields: Vec<TargetField>,
    pub config: MappingConfig,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub current_mappings: Option<MappingOutcome>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub best_attempt: Option<AttemptRecord>,
    #[serde(default)]
    pub validation_failures: Vec<ValidationFailure>,
    #[serde(default)]
    pub warnings: Vec<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl ProcessingState {
    pub fn new(
        job_id: JobId,
        source_fields: Vec<SourceField>,
        target_fields: Vec<TargetField>,
        document_type_hint: Option<String>,
        config: MappingConfig,
    ) -> Self {
        let now = Utc::now();
        Self {
            job_id,
            stage: Stage::Classify,
            status: JobStatus::Pending,
            attempt: 0,
            reextraction_requests: 0,
            document_type_hint,
            source_fields,
            target_fields,
            config,
            current_mappings: None,
            best_attempt: None,
            validation_failures: Vec::new(),
            warnings: Vec::new(),
            created_at: now,
            updated_at: now,
        }
    }

    /// Stamps the record as modified.
    pub fn touch(&mut self) {
        self.updated_at = Utc::now();
    }

    /// Records a finished mapping attempt, keeping the best one seen.
    pub fn record_attempt(&mut self, outcome: MappingOutcome, failure_count: usize) {
        let record = AttemptRecord {
            attempt: self.attempt,
            mean_confidence: outcome.mean_confidence().unwrap_or(0.0),
            failure_count,
            outcome: outcome.clone(),
        };
        let replace = match &self.best_attempt {
            Some(best) => record.is_better_than(best),
            None => true,
        };
        if replace {
            self.best_attempt = Some(record);
        }
        self.current_mappings = Some(outcome);
    }
}

/// Final result handed to the job consumer.
///
/// Data-quality problems surface here as warnings and outstanding
/// failures on a completed result, never as errors.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JobResult {
    pub job_id: JobId,
    pub status: JobStatus,
    pub mappings: Vec<FieldMapping>,
    pub unmapped_sources: Vec<String>,
    pub unmapped_targets: Vec<String>,
    pub warnings: Vec<String>,
    /// QA failures still outstanding after the final attempt.
    #[serde(default)]
    pub failures: Vec<ValidationFailure>,
}

/// Per-job overrides supplied at submission time.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct JobOptions {
    pub document_type_hint: Option<String>,
    pub assignment_threshold: Option<f32>,
    pub candidate_floor: Option<f32>,
    pub weights: Option<MappingWeights>,
    pub max_attempts: Option<u32>,
    pub merge_mode: Option<MergeMode>,
    pub stage_timeout_ms: Option<u64>,
}

impl JobOptions {
    /// Overlays the populated overrides onto a base configuration.
    pub fn apply_to(&self, config: &mut MappingConfig) {
        if let Some(threshold) = self.assignment_threshold {
            config.assignment_threshold = threshold;
        }
        if let Some(floor) = self.candidate_floor {
            config.candidate_floor = floor;
        }
        if let Some(weights) = self.weights {
            config.weights = weights;
        }
        if let Some(max_attempts) = self.max_attempts {
            config.max_attempts = max_attempts;
        }
        if let Some(merge_mode) = self.merge_mode {
            config.merge_mode = merge_mode;
        }
        if let Some(timeout) = self.stage_timeout_ms {
            config.stage_timeout_ms = Some(timeout);
        }
    }
}
