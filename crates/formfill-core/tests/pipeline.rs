use formfill_core::{
    JobProgress, JobResultView, JobService, MemoryCheckpointStore, SubmitError, process_jobs,
};
use formfill_model::{
    FailureKind, FieldType, JobOptions, JobStatus, MappingConfig, SourceField, Stage, TargetField,
};

fn service() -> JobService<MemoryCheckpointStore> {
    JobService::new(MemoryCheckpointStore::new())
}

fn person_sources() -> Vec<SourceField> {
    vec![
        SourceField::new("firstName", "John", FieldType::Name),
        SourceField::new("email_address", "john@example.com", FieldType::Email),
        SourceField::new("dob", "1990-04-01", FieldType::Date),
    ]
}

fn person_targets() -> Vec<TargetField> {
    vec![
        TargetField::new("first_name", FieldType::Name, true),
        TargetField::new("email", FieldType::Email, true),
        TargetField::new("date_of_birth", FieldType::Date, false),
    ]
}

#[test]
fn happy_path_completes_on_first_attempt() {
    let service = service();
    let job_id = service
        .submit(person_sources(), person_targets(), JobOptions::default())
        .expect("submit");

    let progress = service.run(&job_id).expect("run");
    let result = match progress {
        JobProgress::Finished(result) => result,
        other => panic!("expected finished job, got {other:?}"),
    };

    assert_eq!(result.status, JobStatus::Completed);
    assert_eq!(result.mappings.len(), 3);
    assert!(result.warnings.is_empty());

    let status = service.get_status(&job_id).expect("status");
    assert_eq!(status.stage, Stage::Finalize);
    assert_eq!(status.attempt, 1);
    assert_eq!(status.status, JobStatus::Completed);
}

#[test]
fn unmatchable_required_target_degrades_after_max_attempts() {
    let service = service();
    let sources = vec![SourceField::new("color", "blue", FieldType::Text)];
    let targets = vec![TargetField::new("policy_number", FieldType::Numeric, true)];
    let job_id = service
        .submit(sources, targets, JobOptions::default())
        .expect("submit");

    let progress = service.run(&job_id).expect("run");
    let result = match progress {
        JobProgress::Finished(result) => result,
        other => panic!("expected finished job, got {other:?}"),
    };

    assert_eq!(result.status, JobStatus::CompletedWithWarnings);
    assert!(result.mappings.is_empty());
    assert!(
        result
            .failures
            .iter()
            .any(|f| f.kind == FailureKind::MissingRequiredField
                && f.target_name == "policy_number"),
        "expected missing-required failure naming the target: {:?}",
        result.failures
    );

    let status = service.get_status(&job_id).expect("status");
    let max_attempts = MappingConfig::default().max_attempts;
    assert_eq!(status.attempt, max_attempts);
    assert_ne!(status.status, JobStatus::Failed);
}

#[test]
fn crash_after_map_resumes_at_qa_without_remapping() {
    use formfill_core::CheckpointStore;
    use formfill_map::{MappingEngine, ScoreCache};
    use formfill_model::{JobId, ProcessingState};

    let store = MemoryCheckpointStore::new();

    // Simulate a worker that mapped, checkpointed, and crashed before QA.
    let config = MappingConfig::default();
    let sources = person_sources();
    let targets = person_targets();
    let outcome = MappingEngine::new(config.clone()).map(
        &sources,
        &targets,
        &mut ScoreCache::new(),
    );
    let mut state = ProcessingState::new(
        JobId::new("crashed-job").expect("id"),
        sources,
        targets,
        None,
        config,
    );
    state.stage = Stage::Qa;
    state.status = JobStatus::Running;
    state.attempt = 1;
    state.current_mappings = Some(outcome);
    store.save(&state).expect("seed checkpoint");

    let service = JobService::new(store);
    let job_id = JobId::new("crashed-job").expect("id");
    let progress = service.run(&job_id).expect("resume");
    let result = match progress {
        JobProgress::Finished(result) => result,
        other => panic!("expected finished job, got {other:?}"),
    };

    assert_eq!(result.status, JobStatus::Completed);
    // The Map stage never re-ran: the attempt counter is untouched.
    assert_eq!(service.get_status(&job_id).expect("status").attempt, 1);
}

#[test]
fn empty_sources_park_for_reextraction_then_complete() {
    let service = service();
    let targets = vec![TargetField::new("email", FieldType::Email, true)];
    let job_id = service
        .submit(vec![], targets, JobOptions::default())
        .expect("submit");

    let progress = service.run(&job_id).expect("first run");
    assert!(matches!(progress, JobProgress::AwaitingExtraction(_)));
    let status = service.get_status(&job_id).expect("status");
    assert_eq!(status.status, JobStatus::AwaitingExtraction);
    assert_eq!(status.stage, Stage::Map);

    service
        .resupply_sources(
            &job_id,
            vec![SourceField::new("email", "a@b.example", FieldType::Email)],
        )
        .expect("resupply");

    let progress = service.run(&job_id).expect("second run");
    let result = match progress {
        JobProgress::Finished(result) => result,
        other => panic!("expected finished job, got {other:?}"),
    };
    assert_eq!(result.status, JobStatus::Completed);
    assert_eq!(result.mappings.len(), 1);
}

#[test]
fn reextraction_budget_exhaustion_degrades_instead_of_failing() {
    let service = service();
    let targets = vec![TargetField::new("email", FieldType::Email, true)];
    let job_id = service
        .submit(vec![], targets, JobOptions::default())
        .expect("submit");

    let progress = service.run(&job_id).expect("first run");
    assert!(matches!(progress, JobProgress::AwaitingExtraction(_)));

    // The collaborator comes back empty-handed.
    service.resupply_sources(&job_id, vec![]).expect("resupply");

    let progress = service.run(&job_id).expect("second run");
    let result = match progress {
        JobProgress::Finished(result) => result,
        other => panic!("expected finished job, got {other:?}"),
    };
    assert_eq!(result.status, JobStatus::CompletedWithWarnings);
    assert!(result.failures.iter().any(|f| f.kind == FailureKind::MissingRequiredField));
}

#[test]
fn cancelled_job_finalizes_with_warning() {
    let service = service();
    let job_id = service
        .submit(person_sources(), person_targets(), JobOptions::default())
        .expect("submit");

    service.cancel(&job_id);
    let progress = service.run(&job_id).expect("run");
    let result = match progress {
        JobProgress::Finished(result) => result,
        other => panic!("expected finished job, got {other:?}"),
    };

    assert_eq!(result.status, JobStatus::CompletedWithWarnings);
    assert!(result.warnings.iter().any(|w| w.contains("cancelled")));
    assert!(result.mappings.is_empty());
}

#[test]
fn zero_stage_budget_times_out_and_still_terminates() {
    let service = service();
    let options = JobOptions {
        stage_timeout_ms: Some(0),
        ..JobOptions::default()
    };
    let job_id = service
        .submit(person_sources(), person_targets(), options)
        .expect("submit");

    let progress = service.run(&job_id).expect("run");
    let result = match progress {
        JobProgress::Finished(result) => result,
        other => panic!("expected finished job, got {other:?}"),
    };

    assert_eq!(result.status, JobStatus::CompletedWithWarnings);
    assert!(result.warnings.iter().any(|w| w.contains("budget")));
    let status = service.get_status(&job_id).expect("status");
    assert!(status.attempt <= MappingConfig::default().max_attempts);
}

#[test]
fn malformed_target_schema_is_rejected_at_submission() {
    let service = service();

    let duplicate = service.submit(
        vec![],
        vec![
            TargetField::new("email", FieldType::Email, true),
            TargetField::new("EMAIL", FieldType::Email, false),
        ],
        JobOptions::default(),
    );
    assert!(matches!(duplicate, Err(SubmitError::DuplicateTargetName(_))));

    let blank = service.submit(
        vec![],
        vec![TargetField::new("  ", FieldType::Text, false)],
        JobOptions::default(),
    );
    assert!(matches!(blank, Err(SubmitError::BlankTargetName)));

    let bad_config = service.submit(
        vec![],
        vec![TargetField::new("email", FieldType::Email, true)],
        JobOptions {
            assignment_threshold: Some(2.0),
            ..JobOptions::default()
        },
    );
    assert!(matches!(bad_config, Err(SubmitError::InvalidConfig(_))));
}

#[test]
fn get_result_reports_pending_until_run() {
    let service = service();
    let job_id = service
        .submit(person_sources(), person_targets(), JobOptions::default())
        .expect("submit");

    match service.get_result(&job_id).expect("result") {
        JobResultView::Pending { stage, status } => {
            assert_eq!(stage, Stage::Classify);
            assert_eq!(status, JobStatus::Pending);
        }
        JobResultView::Ready(result) => panic!("unexpected ready result: {result:?}"),
    }

    service.run(&job_id).expect("run");
    assert!(matches!(
        service.get_result(&job_id).expect("result"),
        JobResultView::Ready(_)
    ));
}

#[test]
fn worker_pool_processes_independent_jobs_in_parallel() {
    let service = service();
    let mut job_ids = Vec::new();
    for i in 0..4 {
        let sources = vec![SourceField::new(
            "email",
            format!("user{i}@example.com"),
            FieldType::Email,
        )];
        let targets = vec![TargetField::new("email", FieldType::Email, true)];
        job_ids.push(
            service
                .submit(sources, targets, JobOptions::default())
                .expect("submit"),
        );
    }

    let results = process_jobs(&service, job_ids.clone(), 3);
    assert_eq!(results.len(), 4);
    for (job_id, progress) in results {
        match progress.expect("job ran") {
            JobProgress::Finished(result) => assert_eq!(result.status, JobStatus::Completed),
            other => panic!("job {job_id} did not finish: {other:?}"),
        }
    }
}
