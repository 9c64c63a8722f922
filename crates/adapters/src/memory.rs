// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! In-memory `Orchestrator` and `ObjectStore`, used by engine unit tests and
//! by the daemon when `DRY_RUN=true`.

use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use async_trait::async_trait;
use mb_core::{JobLabels, WorkerJobSpec};
use parking_lot::Mutex;

use crate::error::{ObjectStoreError, OrchestratorError};
use crate::object_store::ObjectStore;
use crate::orchestrator::{JobPhase, JobStatusInfo, Orchestrator};

#[derive(Default)]
struct OrchestratorState {
    jobs: HashMap<String, (JobLabels, JobPhase, String)>,
    volumes: HashSet<String>,
    create_job_error: Option<String>,
}

/// Fake orchestrator. Cheap to clone; shares state via `Arc`.
#[derive(Clone, Default)]
pub struct InMemoryOrchestrator {
    state: Arc<Mutex<OrchestratorState>>,
}

impl InMemoryOrchestrator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Pre-seed a running Job with the given labels, to simulate a concurrent
    /// launch winning the race at the pre-launch recheck.
    pub fn seed_running_job(&self, job_name: &str, labels: JobLabels) {
        self.state.lock().jobs.insert(job_name.to_string(), (labels, JobPhase::Active, job_name.to_string()));
    }

    pub fn set_phase(&self, job_name: &str, phase: JobPhase) {
        if let Some(entry) = self.state.lock().jobs.get_mut(job_name) {
            entry.1 = phase;
        }
    }

    /// Force the next `create_job` call to fail, to exercise the
    /// mark-failed-on-api-rejection error path.
    pub fn fail_next_create_job(&self, reason: &str) {
        self.state.lock().create_job_error = Some(reason.to_string());
    }

    pub fn job_count(&self) -> usize {
        self.state.lock().jobs.len()
    }
}

#[async_trait]
impl Orchestrator for InMemoryOrchestrator {
    async fn find_non_terminal_job(
        &self,
        _namespace: &str,
        labels: &JobLabels,
    ) -> Result<Option<JobStatusInfo>, OrchestratorError> {
        let state = self.state.lock();
        Ok(state
            .jobs
            .values()
            .find(|(job_labels, phase, _)| job_labels == labels && !phase.is_terminal())
            .map(|(_, phase, name)| JobStatusInfo { name: name.clone(), phase: *phase }))
    }

    async fn ensure_scratch_volume(&self, spec: &WorkerJobSpec) -> Result<(), OrchestratorError> {
        self.state.lock().volumes.insert(spec.scratch_volume_name());
        Ok(())
    }

    async fn create_job(&self, spec: &WorkerJobSpec) -> Result<(), OrchestratorError> {
        let mut state = self.state.lock();
        if let Some(reason) = state.create_job_error.take() {
            return Err(OrchestratorError::ApiRejected(reason));
        }
        state.jobs.insert(
            spec.job_name.to_string(),
            (spec.labels.clone(), JobPhase::Active, spec.job_name.to_string()),
        );
        Ok(())
    }

    async fn set_volume_owner(&self, _spec: &WorkerJobSpec) -> Result<(), OrchestratorError> {
        Ok(())
    }

    async fn get_job_phase(
        &self,
        _namespace: &str,
        job_name: &str,
    ) -> Result<Option<JobPhase>, OrchestratorError> {
        Ok(self.state.lock().jobs.get(job_name).map(|(_, phase, _)| *phase))
    }
}

#[derive(Default)]
struct ObjectStoreState {
    blobs: HashMap<String, String>,
}

/// Fake object store, keyed by full blob path.
#[derive(Clone, Default)]
pub struct InMemoryObjectStore {
    state: Arc<Mutex<ObjectStoreState>>,
}

impl InMemoryObjectStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn put(&self, path: &str, contents: &str) {
        self.state.lock().blobs.insert(path.to_string(), contents.to_string());
    }

    pub fn blob_count_under(&self, prefix: &str) -> usize {
        self.state.lock().blobs.keys().filter(|k| k.starts_with(prefix)).count()
    }
}

#[async_trait]
impl ObjectStore for InMemoryObjectStore {
    async fn list(&self, prefix: &str) -> Result<Vec<String>, ObjectStoreError> {
        Ok(self.state.lock().blobs.keys().filter(|k| k.starts_with(prefix)).cloned().collect())
    }

    async fn exists(&self, path: &str) -> Result<bool, ObjectStoreError> {
        Ok(self.state.lock().blobs.contains_key(path))
    }

    async fn read_to_string(&self, path: &str) -> Result<Option<String>, ObjectStoreError> {
        Ok(self.state.lock().blobs.get(path).cloned())
    }

    async fn copy_if_absent(&self, src: &str, dst: &str) -> Result<bool, ObjectStoreError> {
        let mut state = self.state.lock();
        if state.blobs.contains_key(dst) {
            return Ok(false);
        }
        let contents = state.blobs.get(src).cloned().ok_or_else(|| ObjectStoreError::NotFound(src.to_string()))?;
        state.blobs.insert(dst.to_string(), contents);
        Ok(true)
    }
}

#[cfg(test)]
#[path = "memory_tests.rs"]
mod tests;
