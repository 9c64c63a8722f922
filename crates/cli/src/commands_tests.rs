use chrono::Utc;
use mb_adapters::InMemoryObjectStore;
use mb_core::{AddedVia, MeetingId, MeetingRecord, MeetingSession, MeetingStatus, SessionStatus, Subscriber, UserId};
use mb_store::InMemoryDocumentStore;

use super::*;

async fn seed_session(store: &InMemoryDocumentStore, org: &OrgId, url: &str, user: &str, meeting: &str) -> SessionId {
    let now = Utc::now();
    let session_id = SessionId::compute(org, url);
    let mut session = MeetingSession::new(org.clone(), session_id.clone(), url.to_string(), now);
    session.status = SessionStatus::Complete;
    store.seed_session_for_test(session);

    store.seed_meeting(MeetingRecord {
        org_id: org.clone(),
        meeting_id: MeetingId::from(meeting),
        owner_user_id: UserId::from(user),
        join_url: url.to_string(),
        start: now,
        end: None,
        status: MeetingStatus::Processing,
        attendees: Vec::new(),
        ai_assistant_enabled: true,
        session_id: None,
        bot_job_name: None,
        bot_status: None,
        artifacts: Default::default(),
        transcription: None,
        recording_url: None,
        fanout_status: None,
    });

    store
        .create_subscriber(org, &session_id, Subscriber::new(UserId::from(user), MeetingId::from(meeting), AddedVia::Direct, now))
        .await
        .unwrap();

    session_id
}

#[tokio::test]
async fn inspect_session_reports_not_found() {
    let store = InMemoryDocumentStore::default();
    let object_store = InMemoryObjectStore::new();
    let err = inspect_session(&store, &object_store, "org-a", "missing-session", "bucket").await.unwrap_err();
    assert!(matches!(err, CliError::SessionNotFound(_)));
}

#[tokio::test]
async fn scan_pending_fanout_only_lists_matching_org() {
    let store = InMemoryDocumentStore::default();
    let org_a = OrgId::from("org-a");
    let org_b = OrgId::from("org-b");
    seed_session(&store, &org_a, "https://meet.example.com/a", "u1", "m1").await;
    seed_session(&store, &org_b, "https://meet.example.com/b", "u2", "m2").await;

    let pending = store.scan_sessions_pending_fanout().await.unwrap();
    let in_org_a = pending.iter().filter(|s| s.org_id == org_a).count();
    assert_eq!(in_org_a, 1);

    scan_pending_fanout(&store, "org-a").await.unwrap();
}

#[tokio::test]
async fn trigger_fanout_marks_session_complete() {
    let store = InMemoryDocumentStore::default();
    let object_store = InMemoryObjectStore::new();
    let org = OrgId::from("org-a");
    let session_id = seed_session(&store, &org, "https://meet.example.com/c", "u1", "m1").await;

    object_store.put("recordings/u1/m1/recording.webm", "video");
    object_store.put("recordings/u1/m1/transcript.txt", "hello world");

    trigger_fanout(&store, &object_store, "org-a", session_id.as_str(), false, false).await.unwrap();

    let session = store.get_session(&org, &session_id).await.unwrap().unwrap();
    assert_eq!(session.fanout_status, Some(FanoutStatus::Complete));
}

#[tokio::test]
async fn trigger_fanout_refuses_without_force_once_complete() {
    let store = InMemoryDocumentStore::default();
    let object_store = InMemoryObjectStore::new();
    let org = OrgId::from("org-a");
    let session_id = seed_session(&store, &org, "https://meet.example.com/d", "u1", "m1").await;
    object_store.put("recordings/u1/m1/recording.webm", "video");
    object_store.put("recordings/u1/m1/transcript.txt", "hello world");
    trigger_fanout(&store, &object_store, "org-a", session_id.as_str(), false, false).await.unwrap();

    let before = object_store.blob_count_under("recordings/");
    trigger_fanout(&store, &object_store, "org-a", session_id.as_str(), false, false).await.unwrap();
    let after = object_store.blob_count_under("recordings/");
    assert_eq!(before, after, "without --force, an already-complete session must be left untouched");
}
