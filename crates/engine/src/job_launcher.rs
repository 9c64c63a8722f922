// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! §4.D Job Launcher: claim, resolve the canonical subscriber, build the
//! Worker Job spec, singleton re-check, then create the Job.

use chrono::{DateTime, Utc};
use mb_adapters::Orchestrator;
use mb_core::{normalize_meeting_url, ControllerConfig, JobLabels, MeetingSession, WorkerJobParams, WorkerJobSpec};
use mb_store::{ClaimOutcome, DocumentStore};

use crate::error::EngineError;

const DEFAULT_BOT_DISPLAY_NAME: &str = "Meeting Bot";

/// Attempt to claim and launch a worker Job for one queued session. A failed
/// claim (lost contention, or the session was no longer queued) is a silent
/// no-op per P4 — not an error.
pub async fn claim_and_launch(
    store: &dyn DocumentStore,
    orchestrator: &dyn Orchestrator,
    config: &ControllerConfig,
    candidate_id: &str,
    session: &MeetingSession,
    now: DateTime<Utc>,
) -> Result<(), EngineError> {
    let claimed = match store
        .claim_session(&session.org_id, &session.session_id, candidate_id, config.claim_ttl, now)
        .await?
    {
        ClaimOutcome::Claimed(session) => session,
        ClaimOutcome::AlreadyClaimed | ClaimOutcome::NotQueued => return Ok(()),
    };

    launch(store, orchestrator, config, &claimed, now).await
}

async fn launch(
    store: &dyn DocumentStore,
    orchestrator: &dyn Orchestrator,
    config: &ControllerConfig,
    session: &MeetingSession,
    now: DateTime<Utc>,
) -> Result<(), EngineError> {
    let subscribers = store.list_subscribers(&session.org_id, &session.session_id).await?;
    let Some(canonical) = subscribers.first() else {
        tracing::warn!(
            org_id = %session.org_id,
            session_id = %session.session_id,
            "job launcher: claimed session has no subscribers, marking failed"
        );
        store
            .mark_session_failed(&session.org_id, &session.session_id, "no subscribers at launch time", now)
            .await?;
        return Ok(());
    };

    let display_name = store
        .organization_bot_name(&session.org_id)
        .await?
        .unwrap_or_else(|| DEFAULT_BOT_DISPLAY_NAME.to_string());

    let normalized_url = normalize_meeting_url(&session.join_url);
    let spec = WorkerJobSpec::build(WorkerJobParams {
        org_id: &session.org_id,
        session_id: &session.session_id,
        normalized_url: &normalized_url,
        join_url: &session.join_url,
        canonical_user_id: &canonical.user_id,
        canonical_meeting_id: &canonical.meeting_id,
        namespace: config.kubernetes_namespace.clone(),
        manager_image: config.manager_image.clone(),
        meeting_bot_image: config.meeting_bot_image.clone(),
        service_account: config.job_service_account.clone(),
        display_name,
    });

    // Singleton re-check: another process may have won the race between our
    // claim and now. Abort quietly — do not mark the session failed.
    let labels = JobLabels::new(&session.org_id, &normalized_url);
    if orchestrator.find_non_terminal_job(&config.kubernetes_namespace, &labels).await?.is_some() {
        tracing::info!(
            org_id = %session.org_id,
            session_id = %session.session_id,
            "job launcher: lost singleton race at pre-launch recheck, aborting launch"
        );
        return Ok(());
    }

    orchestrator.ensure_scratch_volume(&spec).await?;

    if let Err(e) = orchestrator.create_job(&spec).await {
        tracing::error!(
            org_id = %session.org_id,
            session_id = %session.session_id,
            error = %e,
            "job launcher: orchestrator rejected job creation"
        );
        store
            .mark_session_failed(&session.org_id, &session.session_id, &e.to_string(), now)
            .await?;
        return Ok(());
    }

    orchestrator.set_volume_owner(&spec).await?;

    tracing::info!(
        org_id = %session.org_id,
        session_id = %session.session_id,
        job_name = %spec.job_name,
        "job launcher: launched worker job"
    );
    Ok(())
}

#[cfg(test)]
#[path = "job_launcher_tests.rs"]
mod tests;
