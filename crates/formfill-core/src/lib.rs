//! Pipeline orchestration for field mapping jobs.
//!
//! The orchestrator drives each job through an explicit finite state
//! machine (`CLASSIFY -> MAP -> QA -> (RECOVER -> MAP) -> FINALIZE`),
//! persisting a full checkpoint after every stage transition so a crashed
//! worker resumes at the last completed stage. Low confidence and partial
//! extraction are absorbed into warnings on a completed result; only
//! schema and infrastructure errors propagate as failures.

#![deny(unsafe_code)]

pub mod checkpoint;
pub mod classify;
pub mod recovery;
pub mod service;
pub mod stage;
pub mod worker;

pub use checkpoint::{CheckpointError, CheckpointStore, JsonCheckpointStore, MemoryCheckpointStore};
pub use recovery::{RecoveryAction, RecoveryPolicy};
pub use service::{JobError, JobProgress, JobResultView, JobService, JobStatusView, SubmitError};
pub use stage::{StageEvent, TransitionError, next_stage};
pub use worker::process_jobs;
