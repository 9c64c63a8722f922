// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! §4.C Session Coordinator: the pre-transaction label check, then the
//! create-or-requeue-or-touch transaction over session, subscriber, and
//! meeting.

use chrono::{DateTime, Utc};
use mb_core::{JobLabels, OrgId};
use mb_adapters::Orchestrator;
use mb_store::{DocumentStore, SessionUpsertInput, SessionUpsertOutcome};

use crate::discovery::DiscoveredCandidate;
use crate::error::EngineError;

/// Drive §4.C for one discovered candidate: check the label selector for an
/// already-running Job first (the cross-cluster-restart safety net for
/// invariant 1); only fall through to the session transaction if none exists.
pub async fn coordinate(
    store: &dyn DocumentStore,
    orchestrator: &dyn Orchestrator,
    namespace: &str,
    candidate: DiscoveredCandidate,
    now: DateTime<Utc>,
) -> Result<(), EngineError> {
    let labels = JobLabels::new(&candidate.org_id, &candidate.normalized_url);

    if let Some(existing) = orchestrator.find_non_terminal_job(namespace, &labels).await? {
        tracing::info!(
            org_id = %candidate.org_id,
            meeting_id = %candidate.meeting.meeting_id,
            job_name = %existing.name,
            "session coordinator: linking to already-running job, skipping session creation"
        );
        store
            .link_meeting_to_existing_job(
                &candidate.org_id,
                &candidate.meeting.meeting_id,
                &mb_core::JobName::from(existing.name),
                now,
            )
            .await?;
        return Ok(());
    }

    run_transaction(store, &candidate.org_id, &candidate, now).await
}

async fn run_transaction(
    store: &dyn DocumentStore,
    org_id: &OrgId,
    candidate: &DiscoveredCandidate,
    now: DateTime<Utc>,
) -> Result<(), EngineError> {
    let input = SessionUpsertInput {
        org_id: org_id.clone(),
        normalized_url: candidate.normalized_url.clone(),
        join_url: candidate.meeting.join_url.clone(),
        user_id: candidate.meeting.owner_user_id.clone(),
        meeting_id: candidate.meeting.meeting_id.clone(),
    };

    let outcome = store.upsert_session_for_candidate(input, now).await?;
    match &outcome {
        SessionUpsertOutcome::Created(session_id) => {
            tracing::info!(org_id = %org_id, session_id = %session_id, "session coordinator: created session");
        }
        SessionUpsertOutcome::Requeued { session_id, previous_status } => {
            tracing::info!(
                org_id = %org_id,
                session_id = %session_id,
                previous_status = %previous_status,
                "session coordinator: requeued terminal session for recurring meeting"
            );
        }
        SessionUpsertOutcome::Touched(_) | SessionUpsertOutcome::ActiveUntouched(_) => {}
    }
    Ok(())
}

#[cfg(test)]
#[path = "session_coordinator_tests.rs"]
mod tests;
