//! Synchronous worker pool over a shared job queue.
//!
//! Each job id is dequeued exactly once, which is the whole lease
//! discipline this crate needs: at most one worker ever processes a given
//! job, and jobs run fully in parallel with no shared mutable state
//! beyond the checkpoint store behind the service.

use std::collections::VecDeque;
use std::sync::{Mutex, PoisonError};

use tracing::debug;

use formfill_model::JobId;

use crate::checkpoint::CheckpointStore;
use crate::service::{JobError, JobProgress, JobService};

/// Processes `job_ids` on up to `workers` threads.
///
/// Returns one entry per job, sorted by job id for deterministic output.
pub fn process_jobs<S: CheckpointStore>(
    service: &JobService<S>,
    job_ids: Vec<JobId>,
    workers: usize,
) -> Vec<(JobId, Result<JobProgress, JobError>)> {
    let queue = Mutex::new(VecDeque::from(job_ids));
    let results = Mutex::new(Vec::new());
    let workers = workers.max(1);

    std::thread::scope(|scope| {
        for _ in 0..workers {
            scope.spawn(|| {
                loop {
                    let job_id = {
                        let mut queue = queue.lock().unwrap_or_else(PoisonError::into_inner);
                        queue.pop_front()
                    };
                    let Some(job_id) = job_id else { break };
                    debug!(%job_id, "worker picked up job");
                    let progress = service.run(&job_id);
                    results
                        .lock()
                        .unwrap_or_else(PoisonError::into_inner)
                        .push((job_id, progress));
                }
            });
        }
    });

    let mut results = results
        .into_inner()
        .unwrap_or_else(PoisonError::into_inner);
    results.sort_by(|a, b| a.0.cmp(&b.0));
    results
}
