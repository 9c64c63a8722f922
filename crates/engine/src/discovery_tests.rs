use chrono::Utc;
use mb_core::{MeetingId, OrgId, UserId};
use mb_store::InMemoryDocumentStore;

use super::*;

fn meeting(org: &str, id: &str, join_url: &str, start_offset: Duration, ai_enabled: bool) -> MeetingRecord {
    let now = Utc::now();
    MeetingRecord {
        org_id: OrgId::from(org),
        meeting_id: MeetingId::from(id),
        owner_user_id: UserId::from("u1"),
        join_url: join_url.to_string(),
        start: now + chrono::Duration::from_std(start_offset).unwrap(),
        end: None,
        status: mb_core::MeetingStatus::Scheduled,
        attendees: Vec::new(),
        ai_assistant_enabled: ai_enabled,
        session_id: None,
        bot_job_name: None,
        bot_status: None,
        artifacts: Default::default(),
        transcription: None,
        recording_url: None,
        fanout_status: None,
    }
}

#[tokio::test]
async fn time_window_scan_includes_eligible_meeting_in_window() {
    let store = InMemoryDocumentStore::default();
    let now = Utc::now();
    store.seed_meeting(meeting("org-a", "m1", "https://zoom.us/j/123", Duration::from_secs(8 * 60), true));

    let candidates = scan_time_window(&store, now).await.unwrap();
    assert_eq!(candidates.len(), 1);
    assert_eq!(candidates[0].normalized_url, "https://zoom.us/j/123");
}

#[tokio::test]
async fn time_window_scan_skips_disallowed_host() {
    let store = InMemoryDocumentStore::default();
    let now = Utc::now();
    store.seed_meeting(meeting("org-a", "m1", "https://attacker.example.com/j/123", Duration::from_secs(8 * 60), true));

    let candidates = scan_time_window(&store, now).await.unwrap();
    assert!(candidates.is_empty());
}

#[tokio::test]
async fn time_window_scan_skips_meeting_without_auto_join() {
    let store = InMemoryDocumentStore::default();
    let now = Utc::now();
    store.seed_meeting(meeting("org-a", "m1", "https://zoom.us/j/123", Duration::from_secs(8 * 60), false));

    let candidates = scan_time_window(&store, now).await.unwrap();
    assert!(candidates.is_empty());
}

#[tokio::test]
async fn time_window_scan_skips_meeting_with_existing_session() {
    let store = InMemoryDocumentStore::default();
    let now = Utc::now();
    let mut m = meeting("org-a", "m1", "https://zoom.us/j/123", Duration::from_secs(8 * 60), true);
    m.session_id = Some(mb_core::SessionId::from("already-linked"));
    store.seed_meeting(m);

    let candidates = scan_time_window(&store, now).await.unwrap();
    assert!(candidates.is_empty());
}
