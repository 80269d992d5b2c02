//! Checkpoint persistence for processing state.
//!
//! One record per job id, overwritten (not appended) on each stage
//! transition. The JSON store follows the convention
//! `<base_dir>/<job_id>.json`.

use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::{Mutex, PoisonError};

use thiserror::Error;

use formfill_model::{JobId, ProcessingState};

/// Infrastructure failure talking to the checkpoint store.
///
/// Retryable by the surrounding worker; invisible to the stage machine.
#[derive(Debug, Error)]
pub enum CheckpointError {
    #[error("checkpoint io: {0}")]
    Io(#[from] std::io::Error),
    #[error("checkpoint encoding: {0}")]
    Encoding(#[from] serde_json::Error),
}

/// Storage for job checkpoints, keyed uniquely by job id.
pub trait CheckpointStore: Send + Sync {
    fn save(&self, state: &ProcessingState) -> Result<(), CheckpointError>;
    fn load(&self, job_id: &JobId) -> Result<Option<ProcessingState>, CheckpointError>;
    fn delete(&self, job_id: &JobId) -> Result<bool, CheckpointError>;
    fn list(&self) -> Result<Vec<JobId>, CheckpointError>;
}

/// File-system checkpoint store writing one JSON file per job.
#[derive(Debug, Clone)]
pub struct JsonCheckpointStore {
    base_dir: PathBuf,
}

impl JsonCheckpointStore {
    /// Creates the store, creating `base_dir` if needed.
    pub fn new(base_dir: impl Into<PathBuf>) -> Result<Self, CheckpointError> {
        let base_dir = base_dir.into();
        fs::create_dir_all(&base_dir)?;
        Ok(Self { base_dir })
    }

    pub fn base_dir(&self) -> &Path {
        &self.base_dir
    }

    fn path_for(&self, job_id: &JobId) -> PathBuf {
        self.base_dir.join(format!("{job_id}.json"))
    }
}

impl CheckpointStore for JsonCheckpointStore {
    fn save(&self, state: &ProcessingState) -> Result<(), CheckpointError> {
        let json = serde_json::to_string_pretty(state)?;
        fs::write(self.path_for(&state.job_id), json)?;
        Ok(())
    }

    fn load(&self, job_id: &JobId) -> Result<Option<ProcessingState>, CheckpointError> {
        let path = self.path_for(job_id);
        if !path.exists() {
            return Ok(None);
        }
        let contents = fs::read_to_string(&path)?;
        Ok(Some(serde_json::from_str(&contents)?))
    }

    fn delete(&self, job_id: &JobId) -> Result<bool, CheckpointError> {
        let path = self.path_for(job_id);
        if !path.exists() {
            return Ok(false);
        }
        fs::remove_file(&path)?;
        Ok(true)
    }

    fn list(&self) -> Result<Vec<JobId>, CheckpointError> {
        let mut ids = Vec::new();
        for entry in fs::read_dir(&self.base_dir)? {
            let path = entry?.path();
            if path.extension().and_then(|e| e.to_str()) != Some("json") {
                continue;
            }
            if let Some(stem) = path.file_stem().and_then(|s| s.to_str())
                && let Ok(id) = JobId::new(stem)
            {
                ids.push(id);
            }
        }
        ids.sort();
        Ok(ids)
    }
}

/// In-memory checkpoint store for tests and embedded use.
#[derive(Debug, Default)]
pub struct MemoryCheckpointStore {
    inner: Mutex<BTreeMap<JobId, ProcessingState>>,
}

impl MemoryCheckpointStore {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

impl CheckpointStore for MemoryCheckpointStore {
    fn save(&self, state: &ProcessingState) -> Result<(), CheckpointError> {
        let mut inner = self.inner.lock().unwrap_or_else(PoisonError::into_inner);
        inner.insert(state.job_id.clone(), state.clone());
        Ok(())
    }

    fn load(&self, job_id: &JobId) -> Result<Option<ProcessingState>, CheckpointError> {
        let inner = self.inner.lock().unwrap_or_else(PoisonError::into_inner);
        Ok(inner.get(job_id).cloned())
    }

    fn delete(&self, job_id: &JobId) -> Result<bool, CheckpointError> {
        let mut inner = self.inner.lock().unwrap_or_else(PoisonError::into_inner);
        Ok(inner.remove(job_id).is_some())
    }

    fn list(&self) -> Result<Vec<JobId>, CheckpointError> {
        let inner = self.inner.lock().unwrap_or_else(PoisonError::into_inner);
        Ok(inner.keys().cloned().collect())
    }
}
