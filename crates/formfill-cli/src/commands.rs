//! Command handlers.

use std::fs;
use std::path::Path;

use anyhow::{Context, Result};
use serde::de::DeserializeOwned;
use tracing::{debug, info};

use formfill_cli::logging::redact_value;
use formfill_core::{JobProgress, JobService, JsonCheckpointStore};
use formfill_model::{FieldType, JobOptions, JobResult, MergeMode, SourceField, TargetField};

use crate::cli::RunArgs;

/// Runs one mapping job end to end and returns its result.
///
/// The CLI has no extraction collaborator, so a job that parks for
/// re-extraction gets the same fields handed back and proceeds degraded
/// once the re-extraction budget is spent.
pub fn run_job(args: &RunArgs) -> Result<Option<JobResult>> {
    let sources: Vec<SourceField> = read_json(&args.sources)
        .with_context(|| format!("read source fields from {}", args.sources.display()))?;
    let targets: Vec<TargetField> = read_json(&args.targets)
        .with_context(|| format!("read target schema from {}", args.targets.display()))?;

    for source in &sources {
        debug!(
            name = %source.name,
            value = redact_value(&source.value),
            "source field loaded"
        );
    }

    let options = JobOptions {
        document_type_hint: args.document_type.clone(),
        assignment_threshold: args.assignment_threshold,
        candidate_floor: args.candidate_floor,
        weights: None,
        max_attempts: args.max_attempts,
        merge_mode: args.merge_multi_source.then_some(MergeMode::MultiSource),
        stage_timeout_ms: args.stage_timeout_ms,
    };

    if args.dry_run {
        println!(
            "dry run: {} source field(s), {} target field(s), {} required",
            sources.len(),
            targets.len(),
            targets.iter().filter(|t| t.required).count()
        );
        return Ok(None);
    }

    let store = JsonCheckpointStore::new(&args.checkpoint_dir).with_context(|| {
        format!(
            "open checkpoint directory {}",
            args.checkpoint_dir.display()
        )
    })?;
    let service = JobService::new(store);

    let job_id = service.submit(sources.clone(), targets, options)?;
    info!(%job_id, "job submitted");

    let result = loop {
        match service.run(&job_id)? {
            JobProgress::Finished(result) => break result,
            JobProgress::AwaitingExtraction(job_id) => {
                info!(%job_id, "no extractor available, re-supplying original fields");
                service.resupply_sources(&job_id, sources.clone())?;
            }
        }
    };

    if let Some(path) = &args.output {
        let json = serde_json::to_string_pretty(&result)?;
        fs::write(path, json).with_context(|| format!("write result to {}", path.display()))?;
        info!(path = %path.display(), "result written");
    }

    Ok(Some(result))
}

/// Prints the supported field types.
pub fn run_types() {
    for field_type in FieldType::ALL {
        println!("{field_type}");
    }
}

fn read_json<T: DeserializeOwned>(path: &Path) -> Result<T> {
    let contents = fs::read_to_string(path)?;
    Ok(serde_json::from_str(&contents)?)
}
