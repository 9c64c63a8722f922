// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use chrono::Utc;
use mb_adapters::{ObjectStore, ObjectStoreError};
use mb_core::{recordings_prefix, FanoutStatus, OrgId, SessionId};
use mb_engine::fanout::fanout_one_session;
use mb_engine::EngineError;
use mb_store::{DocumentStore, StoreError};

#[derive(Debug, thiserror::Error)]
pub enum CliError {
    #[error(transparent)]
    Store(#[from] StoreError),
    #[error(transparent)]
    ObjectStore(#[from] ObjectStoreError),
    #[error(transparent)]
    Engine(#[from] EngineError),
    #[error("session {0} not found")]
    SessionNotFound(SessionId),
}

pub async fn inspect_session(
    store: &dyn DocumentStore,
    object_store: &dyn ObjectStore,
    org_id: &str,
    session_id: &str,
    bucket: &str,
) -> Result<(), CliError> {
    let org_id = OrgId::from(org_id);
    let session_id = SessionId::from(session_id);

    println!("{}", "=".repeat(80));
    println!("INSPECTING SESSION: {}", session_id.as_str());
    println!("{}", "=".repeat(80));

    let Some(session) = store.get_session(&org_id, &session_id).await? else {
        return Err(CliError::SessionNotFound(session_id));
    };

    println!("\nSESSION DOCUMENT:");
    println!("  org_id: {}", session.org_id.as_str());
    println!("  join_url: {}", session.join_url);
    println!("  status: {:?}", session.status);
    println!("  fanout_status: {:?}", session.fanout_status);
    println!("  created_at: {}", session.created_at);
    println!("  updated_at: {}", session.updated_at);

    let subscribers = store.list_subscribers(&org_id, &session_id).await?;
    println!("\nSUBSCRIBERS: {}", subscribers.len());
    println!("{}", "=".repeat(80));

    for (idx, sub) in subscribers.iter().enumerate() {
        println!("\nSubscriber #{}: {}", idx + 1, sub.user_id.as_str());
        println!("  meeting_id: {}", sub.meeting_id.as_str());
        println!("  status: {:?}", sub.status);
        println!("  added_via: {:?}", sub.added_via);

        if let Some(meeting) = store.get_meeting(&org_id, &sub.meeting_id).await? {
            println!("  has_transcription: {}", meeting.transcription.is_some());
            if let Some(url) = &meeting.recording_url {
                println!("  recording_url: {url}");
            }
        } else {
            println!("  meeting document not found");
        }

        let prefix = recordings_prefix(&sub.user_id, &sub.meeting_id);
        println!("  gcs path: gs://{bucket}/{prefix}");
        match object_store.list(&prefix).await {
            Ok(blobs) if blobs.is_empty() => println!("  no files found"),
            Ok(blobs) => {
                println!("  found {} file(s):", blobs.len());
                for blob in &blobs {
                    println!("    - {blob}");
                }
            }
            Err(e) => println!("  error listing GCS: {e}"),
        }
    }

    println!("\n{}", "=".repeat(80));
    println!("ANALYSIS");
    println!("{}", "=".repeat(80));
    match session.fanout_status {
        Some(FanoutStatus::Complete) => println!("fanout already complete"),
        _ if subscribers.len() <= 1 => println!("only one subscriber, fanout not needed"),
        _ => println!("fanout pending, next poll cycle or `mbctl trigger-fanout` will pick this up"),
    }

    Ok(())
}

pub async fn scan_pending_fanout(store: &dyn DocumentStore, org_id: &str) -> Result<(), CliError> {
    let org_id = OrgId::from(org_id);
    let pending = store.scan_sessions_pending_fanout().await?;
    let pending: Vec<_> = pending.into_iter().filter(|s| s.org_id == org_id).collect();

    println!("{} session(s) pending fanout in {}", pending.len(), org_id.as_str());
    for session in &pending {
        println!(
            "  {} status={:?} fanout_status={:?} updated_at={}",
            session.session_id.as_str(),
            session.status,
            session.fanout_status,
            session.updated_at
        );
    }
    Ok(())
}

pub async fn trigger_fanout(
    store: &dyn DocumentStore,
    object_store: &dyn ObjectStore,
    org_id: &str,
    session_id: &str,
    force: bool,
    dry_run: bool,
) -> Result<(), CliError> {
    let org_id = OrgId::from(org_id);
    let session_id = SessionId::from(session_id);

    let Some(session) = store.get_session(&org_id, &session_id).await? else {
        return Err(CliError::SessionNotFound(session_id));
    };

    if session.fanout_status == Some(FanoutStatus::Complete) && !force {
        println!("fanout already marked complete for {}; pass --force to re-run", session.session_id);
        return Ok(());
    }

    if dry_run {
        let subscribers = store.list_subscribers(&org_id, &session_id).await?;
        println!(
            "[dry run] would fan out {} to {} subscriber(s); no changes made",
            session.session_id,
            subscribers.len()
        );
        return Ok(());
    }

    fanout_one_session(store, object_store, &session, Utc::now()).await?;

    let refreshed = store.get_session(&org_id, &session_id).await?;
    match refreshed.and_then(|s| s.fanout_status) {
        Some(FanoutStatus::Complete) => println!("fanout complete"),
        Some(other) => println!("fanout finished with status {other:?}, check mbctl inspect-session for details"),
        None => println!("fanout ran but left no status recorded (no source artifacts yet?)"),
    }
    Ok(())
}

#[cfg(test)]
#[path = "commands_tests.rs"]
mod tests;
