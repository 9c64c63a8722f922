// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! The container orchestrator surface: labelled Job creation, label-selector
//! lookup, and per-job scratch volume lifecycle.
//!
//! Two independent dedup mechanisms exist in this system — this label
//! selector (authoritative for "is a bot currently running?") and the
//! session document (authoritative for "who is subscribed?"). They are only
//! eventually consistent with each other, which is why both the
//! pre-transaction check and the immediate-pre-launch recheck query labels
//! here rather than trusting the session document alone.

use async_trait::async_trait;
use mb_core::{JobLabels, WorkerJobSpec};

use crate::error::OrchestratorError;

/// Coarse lifecycle phase of a Worker Job, collapsed from whatever the
/// underlying orchestrator reports.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum JobPhase {
    Active,
    Succeeded,
    Failed,
}

impl JobPhase {
    pub fn is_terminal(self) -> bool {
        matches!(self, Self::Succeeded | Self::Failed)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct JobStatusInfo {
    pub name: String,
    pub phase: JobPhase,
}

/// The container orchestrator: create Jobs, look them up by label selector,
/// and manage per-job scratch volumes.
///
/// Implementations: [`crate::kubernetes::KubernetesOrchestrator`] (production)
/// and [`crate::memory::InMemoryOrchestrator`] (tests, dry-run).
#[async_trait]
pub trait Orchestrator: Send + Sync + 'static {
    /// Label-selector lookup for a non-terminal Job matching `labels`. Used
    /// both at the pre-transaction check (§4.C) and the immediate pre-launch
    /// recheck (§4.D) — both call sites must observe the same eventual
    /// consistency window.
    async fn find_non_terminal_job(
        &self,
        namespace: &str,
        labels: &JobLabels,
    ) -> Result<Option<JobStatusInfo>, OrchestratorError>;

    /// Create the per-job writable scratch volume. If one already exists
    /// from a prior failed launch attempt, delete and recreate it.
    async fn ensure_scratch_volume(&self, spec: &WorkerJobSpec) -> Result<(), OrchestratorError>;

    /// Create the Worker Job. No retry on failure; the caller marks the
    /// session `failed` if this errors.
    async fn create_job(&self, spec: &WorkerJobSpec) -> Result<(), OrchestratorError>;

    /// Patch the scratch volume's owner reference to the now-created Job, so
    /// it cascade-deletes with it.
    async fn set_volume_owner(&self, spec: &WorkerJobSpec) -> Result<(), OrchestratorError>;

    /// Fetch the current phase of a named Job, for the Lifecycle Tracker's
    /// orphan-detection pass.
    async fn get_job_phase(
        &self,
        namespace: &str,
        job_name: &str,
    ) -> Result<Option<JobPhase>, OrchestratorError>;
}
