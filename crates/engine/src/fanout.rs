// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! §4.F Fanout Engine: both the session-based path (§4.F.1) and the
//! URL-based path (§4.F.2) for the K8s-only dedup mode without Sessions.
//! Both are implemented and scoped independently, per the open question in
//! the design notes about picking (or clearly scoping) a canonical path —
//! see DESIGN.md for the reasoning.

use std::collections::HashMap;
use std::time::Duration;

use chrono::{DateTime, Utc};
use mb_adapters::ObjectStore;
use mb_core::{
    recordings_prefix, AddedVia, FanoutReport, FanoutStatus, MeetingRecord, MeetingSession, OrgId,
    Subscriber, SubscriberStatus, SubscriberValidation,
};
use mb_store::{DocumentStore, MeetingArtifactPatch};

use crate::error::EngineError;

/// Time tolerance for correlating meetings by `join_url` + `start` in the
/// URL-based fanout path. A heuristic, not a strong identifier — see the
/// design notes' open question on this.
const URL_FANOUT_TOLERANCE: Duration = Duration::from_secs(300);

pub async fn run(
    store: &dyn DocumentStore,
    object_store: &dyn ObjectStore,
    now: DateTime<Utc>,
) -> Result<(), EngineError> {
    run_session_based(store, object_store, now).await?;
    run_url_based(store, object_store, now).await?;
    Ok(())
}

// -- §4.F.1 session-based fanout -----------------------------------------

async fn run_session_based(
    store: &dyn DocumentStore,
    object_store: &dyn ObjectStore,
    now: DateTime<Utc>,
) -> Result<(), EngineError> {
    for session in store.scan_sessions_pending_fanout().await? {
        if let Err(e) = fanout_one_session(store, object_store, &session, now).await {
            tracing::error!(
                org_id = %session.org_id,
                session_id = %session.session_id,
                error = %e,
                "fanout: session-based fanout failed, recording and continuing"
            );
            store
                .set_session_fanout_report(
                    &session.org_id,
                    &session.session_id,
                    FanoutStatus::Failed,
                    FanoutReport::default(),
                    Some(e.to_string()),
                    session.artifacts.clone(),
                    now,
                )
                .await?;
        }
    }
    Ok(())
}

/// Runs the §4.F.1 fanout body for a single session regardless of its
/// current `fanout_status`. `run_session_based` only reaches sessions
/// `scan_sessions_pending_fanout` surfaces; operator tooling that needs to
/// retrigger a session whose fanout is already marked complete calls this
/// directly.
pub async fn fanout_one_session(
    store: &dyn DocumentStore,
    object_store: &dyn ObjectStore,
    session: &MeetingSession,
    now: DateTime<Utc>,
) -> Result<(), EngineError> {
    let mut subscribers = store.list_subscribers(&session.org_id, &session.session_id).await?;
    let Some(canonical) = subscribers.first().cloned() else {
        return Ok(());
    };

    // a. refresh attendees of the canonical meeting
    if let Some(canonical_meeting) = store.get_meeting(&session.org_id, &canonical.meeting_id).await? {
        for email in &canonical_meeting.attendees {
            match store.lookup_user_by_email(&session.org_id, email).await {
                Ok(Some(user_id)) if user_id != canonical.user_id => {
                    if subscribers.iter().any(|s| s.user_id == user_id) {
                        continue;
                    }
                    let meeting_id = store
                        .create_adhoc_meeting(&session.org_id, &user_id, &canonical_meeting, now)
                        .await?;
                    let subscriber = Subscriber::new(user_id, meeting_id, AddedVia::AttendeeFanout, now);
                    store.create_subscriber(&session.org_id, &session.session_id, subscriber.clone()).await?;
                    subscribers.push(subscriber);
                }
                Ok(_) => {}
                Err(e) => {
                    tracing::warn!(
                        org_id = %session.org_id,
                        session_id = %session.session_id,
                        email = %email,
                        error = %e,
                        "fanout: attendee user lookup failed, skipping attendee"
                    );
                }
            }
        }
    }

    // b. resolve source
    let source_prefix = recordings_prefix(&canonical.user_id, &canonical.meeting_id);
    let source_blobs = object_store.list(&source_prefix).await?;
    if source_blobs.is_empty() {
        return Ok(());
    }
    let artifacts = blob_manifest(&source_prefix, &source_blobs);

    // c. read transcript
    let transcription = object_store.read_to_string(&format!("{source_prefix}transcript.txt")).await?;
    let recording_url = pick_recording_url(&artifacts);

    // d. update canonical subscriber
    store
        .patch_meeting(
            &session.org_id,
            &canonical.meeting_id,
            MeetingArtifactPatch {
                transcription: transcription.clone(),
                recording_url: recording_url.clone(),
                artifacts: Some(artifacts.clone()),
                ..Default::default()
            },
            now,
        )
        .await?;
    store
        .update_subscriber(
            &session.org_id,
            &session.session_id,
            Subscriber {
                status: SubscriberStatus::Complete,
                artifact_count: artifacts.len() as u32,
                updated_at: now,
                ..canonical.clone()
            },
        )
        .await?;

    // e. fan out to every non-canonical subscriber
    for subscriber in subscribers.iter().skip(1) {
        let dst_prefix = recordings_prefix(&subscriber.user_id, &subscriber.meeting_id);
        for blob in &source_blobs {
            let filename = blob.rsplit('/').next().unwrap_or(blob);
            let dst = format!("{dst_prefix}{filename}");
            if let Err(e) = object_store.copy_if_absent(blob, &dst).await {
                tracing::error!(
                    org_id = %session.org_id,
                    session_id = %session.session_id,
                    user_id = %subscriber.user_id,
                    error = %e,
                    "fanout: blob copy failed for subscriber, continuing with remaining subscribers"
                );
            }
        }
        let rewritten: HashMap<String, String> =
            artifacts.iter().map(|(k, v)| (k.clone(), v.replace(&source_prefix, &dst_prefix))).collect();
        let rewritten_recording_url = recording_url.as_ref().map(|u| u.replace(&source_prefix, &dst_prefix));

        store
            .patch_meeting(
                &session.org_id,
                &subscriber.meeting_id,
                MeetingArtifactPatch {
                    transcription: transcription.clone(),
                    recording_url: rewritten_recording_url,
                    artifacts: Some(rewritten),
                    ..Default::default()
                },
                now,
            )
            .await?;
        store
            .update_subscriber(
                &session.org_id,
                &session.session_id,
                Subscriber {
                    status: SubscriberStatus::Copied,
                    artifact_count: artifacts.len() as u32,
                    updated_at: now,
                    ..subscriber.clone()
                },
            )
            .await?;
    }

    // f. validate every subscriber
    let expected_keys: Vec<String> = artifacts.keys().cloned().collect();
    let mut validations = Vec::with_capacity(subscribers.len());
    for subscriber in &subscribers {
        validations.push(validate_subscriber(store, object_store, &session.org_id, subscriber, &expected_keys).await);
    }
    let report = FanoutReport { subscribers: validations };

    // g. terminal write. `artifacts` is the canonical subscriber's manifest
    // (step b/c), so the session's manifest always points under the
    // canonical subscriber's prefix regardless of how later subscribers fare.
    let status = if report.all_ok() { FanoutStatus::Complete } else { FanoutStatus::Partial };
    store
        .set_session_fanout_report(&session.org_id, &session.session_id, status, report, None, artifacts, now)
        .await?;
    Ok(())
}

async fn validate_subscriber(
    store: &dyn DocumentStore,
    object_store: &dyn ObjectStore,
    org_id: &OrgId,
    subscriber: &Subscriber,
    expected_artifact_keys: &[String],
) -> SubscriberValidation {
    let invalid = |reason: &str| SubscriberValidation {
        user_id: subscriber.user_id.clone(),
        ok: false,
        error: Some(reason.to_string()),
    };

    let meeting = match store.get_meeting(org_id, &subscriber.meeting_id).await {
        Ok(Some(m)) => m,
        Ok(None) => return invalid("subscriber meeting document missing"),
        Err(e) => return invalid(&format!("meeting lookup failed: {e}")),
    };
    if meeting.transcription.is_none() {
        return invalid("meeting document missing transcription");
    }
    for key in expected_artifact_keys {
        if !meeting.artifacts.contains_key(key) {
            return invalid(&format!("meeting document missing artifact key {key}"));
        }
    }

    let dst_prefix = recordings_prefix(&subscriber.user_id, &subscriber.meeting_id);
    let blobs = match object_store.list(&dst_prefix).await {
        Ok(b) => b,
        Err(e) => return invalid(&format!("destination listing failed: {e}")),
    };
    if blobs.len() < expected_artifact_keys.len() {
        return invalid("destination prefix missing expected blobs");
    }

    SubscriberValidation { user_id: subscriber.user_id.clone(), ok: true, error: None }
}

fn blob_manifest(prefix: &str, blobs: &[String]) -> HashMap<String, String> {
    blobs
        .iter()
        .map(|blob| {
            let filename = blob.rsplit('/').next().unwrap_or(blob);
            (filename.to_string(), format!("{prefix}{filename}"))
        })
        .collect()
}

fn pick_recording_url(artifacts: &HashMap<String, String>) -> Option<String> {
    ["recording.mp4", "recording.webm", "recording.m4a"]
        .iter()
        .find_map(|name| artifacts.get(*name).cloned())
}

// -- §4.F.2 URL-based fanout ----------------------------------------------

async fn run_url_based(
    store: &dyn DocumentStore,
    object_store: &dyn ObjectStore,
    now: DateTime<Utc>,
) -> Result<(), EngineError> {
    for source in store.scan_meetings_pending_url_fanout().await? {
        if let Err(e) = fanout_one_url_source(store, object_store, &source, now).await {
            tracing::error!(
                org_id = %source.org_id,
                meeting_id = %source.meeting_id,
                error = %e,
                "fanout: url-based fanout failed, recording and continuing"
            );
            store
                .patch_meeting(
                    &source.org_id,
                    &source.meeting_id,
                    MeetingArtifactPatch { fanout_status: Some(FanoutStatus::Failed), ..Default::default() },
                    now,
                )
                .await?;
        }
    }
    Ok(())
}

async fn fanout_one_url_source(
    store: &dyn DocumentStore,
    object_store: &dyn ObjectStore,
    source: &MeetingRecord,
    now: DateTime<Utc>,
) -> Result<(), EngineError> {
    let siblings = store
        .find_sibling_meetings(&source.org_id, &source.join_url, source.start, URL_FANOUT_TOLERANCE, &source.meeting_id)
        .await?;

    let source_prefix = recordings_prefix(&source.owner_user_id, &source.meeting_id);
    let source_blobs = object_store.list(&source_prefix).await?;
    if source_blobs.is_empty() {
        return Ok(());
    }
    let artifacts = blob_manifest(&source_prefix, &source_blobs);
    let transcription = object_store.read_to_string(&format!("{source_prefix}transcript.txt")).await?;
    let recording_url = pick_recording_url(&artifacts);

    let mut copied_total = 0u32;
    for sibling in &siblings {
        let dst_prefix = recordings_prefix(&sibling.owner_user_id, &sibling.meeting_id);
        for blob in &source_blobs {
            let filename = blob.rsplit('/').next().unwrap_or(blob);
            let dst = format!("{dst_prefix}{filename}");
            match object_store.copy_if_absent(blob, &dst).await {
                Ok(true) => copied_total += 1,
                Ok(false) => {}
                Err(e) => {
                    tracing::error!(
                        org_id = %source.org_id,
                        meeting_id = %sibling.meeting_id,
                        error = %e,
                        "fanout: url-based blob copy failed, continuing with remaining siblings"
                    );
                }
            }
        }
        let rewritten: HashMap<String, String> =
            artifacts.iter().map(|(k, v)| (k.clone(), v.replace(&source_prefix, &dst_prefix))).collect();
        store
            .patch_meeting(
                &source.org_id,
                &sibling.meeting_id,
                MeetingArtifactPatch {
                    transcription: transcription.clone(),
                    recording_url: recording_url.as_ref().map(|u| u.replace(&source_prefix, &dst_prefix)),
                    artifacts: Some(rewritten),
                    fanout_status: Some(FanoutStatus::Complete),
                    ..Default::default()
                },
                now,
            )
            .await?;
    }

    tracing::info!(
        org_id = %source.org_id,
        meeting_id = %source.meeting_id,
        siblings = siblings.len(),
        copied_blobs = copied_total,
        "fanout: url-based fanout complete"
    );

    store
        .patch_meeting(
            &source.org_id,
            &source.meeting_id,
            MeetingArtifactPatch { fanout_status: Some(FanoutStatus::Complete), ..Default::default() },
            now,
        )
        .await?;
    Ok(())
}

#[cfg(test)]
#[path = "fanout_tests.rs"]
mod tests;
