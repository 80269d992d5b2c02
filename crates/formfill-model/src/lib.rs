#![deny(unsafe_code)]

pub mod config;
pub mod error;
pub mod field;
pub mod ids;
pub mod job;
pub mod mapping;
pub mod normalize;
pub mod validation;

pub use config::{AliasTable, MappingConfig, MappingWeights, MergeMode};
pub use error::ModelError;
pub use field::{FieldType, SourceField, TargetField};
pub use ids::JobId;
pub use job::{AttemptRecord, JobOptions, JobResult, JobStatus, ProcessingState, Stage};
pub use mapping::{FieldMapping, MappingOutcome};
pub use normalize::{name_tokens, normalize_name};
pub use validation::{FailureKind, ValidationFailure, ValidationReport};
