// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! §4.E Lifecycle Tracker: orphan detection for sessions stuck in
//! `claimed`/`processing` with no matching non-terminal Job.
//!
//! The worker sidecar alone transitions a session to a terminal state; this
//! component only watches and warns.

use std::time::Duration;

use chrono::{DateTime, Utc};
use mb_adapters::Orchestrator;
use mb_core::{normalize_meeting_url, JobLabels};
use mb_store::DocumentStore;

use crate::error::EngineError;

/// Minimum age before a Job-less active session is reported as orphaned,
/// to avoid false positives in the gap between claim and job creation.
const ORPHAN_GRACE_PERIOD: Duration = Duration::from_secs(120);

pub async fn detect_orphans(
    store: &dyn DocumentStore,
    orchestrator: &dyn Orchestrator,
    namespace: &str,
    now: DateTime<Utc>,
) -> Result<(), EngineError> {
    let active = store.scan_active_sessions().await?;
    let grace = chrono::Duration::from_std(ORPHAN_GRACE_PERIOD).unwrap_or(chrono::Duration::zero());

    for session in active {
        let age = now - session.updated_at;
        if age < grace {
            continue;
        }

        let normalized_url = normalize_meeting_url(&session.join_url);
        let labels = JobLabels::new(&session.org_id, &normalized_url);
        let found = orchestrator.find_non_terminal_job(namespace, &labels).await?;

        if found.is_none() {
            tracing::warn!(
                org_id = %session.org_id,
                session_id = %session.session_id,
                status = %session.status,
                age_seconds = age.num_seconds(),
                "lifecycle tracker: orphaned session, no matching worker job — operator intervention required"
            );
        }
    }
    Ok(())
}

#[cfg(test)]
#[path = "lifecycle_tests.rs"]
mod tests;
