use chrono::Utc;
use mb_adapters::InMemoryObjectStore;
use mb_core::{AddedVia, MeetingId, MeetingStatus, OrgId, SessionId, SessionStatus, Subscriber, UserId};
use mb_store::InMemoryDocumentStore;

use super::*;

fn meeting(org: &OrgId, meeting_id: &str, owner: &str, join_url: &str) -> MeetingRecord {
    MeetingRecord {
        org_id: org.clone(),
        meeting_id: MeetingId::from(meeting_id),
        owner_user_id: UserId::from(owner),
        join_url: join_url.to_string(),
        start: Utc::now(),
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
    }
}

async fn seed_complete_session(
    store: &InMemoryDocumentStore,
    org: &OrgId,
    url: &str,
    subscribers: &[(&str, &str)],
) -> SessionId {
    let now = Utc::now();
    let session_id = SessionId::compute(org, url);
    let mut session = mb_core::MeetingSession::new(org.clone(), session_id.clone(), url.to_string(), now);
    session.status = SessionStatus::Complete;
    store.seed_session_for_test(session);

    for (user, meeting_id) in subscribers {
        store.seed_meeting(meeting(org, meeting_id, user, url));
        store
            .create_subscriber(
                org,
                &session_id,
                Subscriber::new(UserId::from(*user), MeetingId::from(*meeting_id), AddedVia::Direct, now),
            )
            .await
            .unwrap();
    }
    session_id
}

#[tokio::test]
async fn single_user_schedule_fans_out_to_canonical_only() {
    let store = InMemoryDocumentStore::default();
    let object_store = InMemoryObjectStore::new();
    let org = OrgId::from("org-a");
    let session_id = seed_complete_session(&store, &org, "https://meet.example.com/abc", &[("u1", "m1")]).await;

    object_store.put("recordings/u1/m1/recording.webm", "video");
    object_store.put("recordings/u1/m1/transcript.txt", "hello world");

    run(&store, &object_store, Utc::now()).await.unwrap();

    let meeting = store.get_meeting(&org, &MeetingId::from("m1")).await.unwrap().unwrap();
    assert_eq!(meeting.transcription.as_deref(), Some("hello world"));
    assert!(meeting.artifacts.contains_key("recording.webm"));

    let session = store.get_session(&org, &session_id).await.unwrap().unwrap();
    assert_eq!(session.fanout_status, Some(FanoutStatus::Complete));
    assert_eq!(session.artifacts.get("recording.webm").unwrap(), "recordings/u1/m1/recording.webm");
}

#[tokio::test]
async fn two_users_same_url_copies_to_non_canonical_subscriber() {
    let store = InMemoryDocumentStore::default();
    let object_store = InMemoryObjectStore::new();
    let org = OrgId::from("org-a");
    let session_id =
        seed_complete_session(&store, &org, "https://meet.example.com/abc", &[("u1", "m1"), ("u2", "m2")]).await;

    object_store.put("recordings/u1/m1/recording.webm", "video");
    object_store.put("recordings/u1/m1/transcript.txt", "hello world");

    run(&store, &object_store, Utc::now()).await.unwrap();

    assert!(object_store.exists("recordings/u2/m2/recording.webm").await.unwrap());
    let m1 = store.get_meeting(&org, &MeetingId::from("m1")).await.unwrap().unwrap();
    let m2 = store.get_meeting(&org, &MeetingId::from("m2")).await.unwrap().unwrap();
    assert_eq!(m1.transcription.as_deref(), Some("hello world"));
    assert_eq!(m2.transcription.as_deref(), Some("hello world"));
    assert_eq!(m2.artifacts.get("recording.webm").unwrap(), "recordings/u2/m2/recording.webm");

    // Invariant 5: the session's manifest mirrors the canonical subscriber
    // (u1/m1), never the fanned-out copy (u2/m2).
    let session = store.get_session(&org, &session_id).await.unwrap().unwrap();
    assert_eq!(session.artifacts.get("recording.webm").unwrap(), "recordings/u1/m1/recording.webm");
}

#[tokio::test]
async fn fanout_is_idempotent_across_two_runs() {
    let store = InMemoryDocumentStore::default();
    let object_store = InMemoryObjectStore::new();
    let org = OrgId::from("org-a");
    seed_complete_session(&store, &org, "https://meet.example.com/abc", &[("u1", "m1"), ("u2", "m2")]).await;
    object_store.put("recordings/u1/m1/recording.webm", "video");
    object_store.put("recordings/u1/m1/transcript.txt", "hello world");

    run(&store, &object_store, Utc::now()).await.unwrap();
    let copies_after_first = object_store.blob_count_under("recordings/u2/");

    // Second run: session's fanout_status is now complete, so scan_sessions_pending_fanout
    // no longer surfaces it — re-running the whole engine loop performs zero additional copies.
    run(&store, &object_store, Utc::now()).await.unwrap();
    let copies_after_second = object_store.blob_count_under("recordings/u2/");

    assert_eq!(copies_after_first, copies_after_second);
}

#[tokio::test]
async fn skips_session_when_source_artifacts_not_yet_written() {
    let store = InMemoryDocumentStore::default();
    let object_store = InMemoryObjectStore::new();
    let org = OrgId::from("org-a");
    let session_id = seed_complete_session(&store, &org, "https://meet.example.com/abc", &[("u1", "m1")]).await;

    run(&store, &object_store, Utc::now()).await.unwrap();

    let session = store.get_session(&org, &session_id).await.unwrap().unwrap();
    assert_eq!(session.fanout_status, None, "fanout must not mark complete before the worker finishes writing");
}

#[tokio::test]
async fn attendee_fanout_creates_subscriber_and_adhoc_meeting() {
    let store = InMemoryDocumentStore::default();
    let object_store = InMemoryObjectStore::new();
    let org = OrgId::from("org-a");
    let session_id = seed_complete_session(&store, &org, "https://meet.example.com/abc", &[("u1", "m1")]).await;

    let mut canonical_meeting = store.get_meeting(&org, &MeetingId::from("m1")).await.unwrap().unwrap();
    canonical_meeting.attendees = vec!["x@orga.com".to_string()];
    store.seed_meeting(canonical_meeting);
    store.seed_user_email(org.clone(), "x@orga.com", UserId::from("x-user"));

    object_store.put("recordings/u1/m1/recording.webm", "video");
    object_store.put("recordings/u1/m1/transcript.txt", "hello world");

    run(&store, &object_store, Utc::now()).await.unwrap();

    let subscribers = store.list_subscribers(&org, &session_id).await.unwrap();
    let attendee_sub = subscribers.iter().find(|s| s.user_id == UserId::from("x-user"));
    assert!(attendee_sub.is_some());
    assert_eq!(attendee_sub.unwrap().added_via, AddedVia::AttendeeFanout);

    let adhoc_meeting = store.get_meeting(&org, &attendee_sub.unwrap().meeting_id).await.unwrap().unwrap();
    assert!(object_store.exists(&format!("recordings/x-user/{}/recording.webm", adhoc_meeting.meeting_id)).await.unwrap());
}

#[tokio::test]
async fn url_based_fanout_copies_to_sibling_meetings() {
    let store = InMemoryDocumentStore::default();
    let object_store = InMemoryObjectStore::new();
    let org = OrgId::from("org-a");
    let now = Utc::now();

    let mut source = meeting(&org, "src-1", "u1", "https://meet.example.com/xyz");
    source.bot_status = Some("complete".to_string());
    source.start = now;
    store.seed_meeting(source.clone());

    let mut sibling = meeting(&org, "sib-1", "u2", "https://meet.example.com/xyz");
    sibling.start = now + chrono::Duration::seconds(30);
    store.seed_meeting(sibling);

    object_store.put("recordings/u1/src-1/recording.webm", "video");
    object_store.put("recordings/u1/src-1/transcript.txt", "hello world");

    run(&store, &object_store, now).await.unwrap();

    assert!(object_store.exists("recordings/u2/sib-1/recording.webm").await.unwrap());
    let sib_after = store.get_meeting(&org, &MeetingId::from("sib-1")).await.unwrap().unwrap();
    assert_eq!(sib_after.fanout_status, Some(FanoutStatus::Complete));
    let src_after = store.get_meeting(&org, &MeetingId::from("src-1")).await.unwrap().unwrap();
    assert_eq!(src_after.fanout_status, Some(FanoutStatus::Complete));
}
