// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use chrono::TimeZone;
use mb_core::normalize_meeting_url;
use serde_json::json;

fn now() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2026, 7, 31, 9, 0, 0).unwrap()
}

fn seed_meeting(store: &InMemoryDocumentStore, org: &str, meeting: &str, user: &str, url: &str, start: DateTime<Utc>) {
    let raw = json!({ "join_url": url, "user_id": user, "start": start.to_rfc3339() });
    let record = MeetingRecord::from_raw(OrgId::from(org), MeetingId::from(meeting), &raw).unwrap();
    store.seed_meeting(record);
}

#[tokio::test]
async fn upsert_creates_session_on_first_candidate() {
    let store = InMemoryDocumentStore::new();
    seed_meeting(&store, "org-a", "m1", "u1", "https://meet.example.com/abc", now());

    let org_id = OrgId::from("org-a");
    let normalized = normalize_meeting_url("https://meet.example.com/abc");
    let outcome = store
        .upsert_session_for_candidate(
            SessionUpsertInput {
                org_id: org_id.clone(),
                normalized_url: normalized.clone(),
                join_url: "https://meet.example.com/abc".to_string(),
                user_id: UserId::from("u1"),
                meeting_id: MeetingId::from("m1"),
            },
            now(),
        )
        .await
        .unwrap();

    let expected_id = SessionId::compute(&org_id, &normalized);
    assert_eq!(outcome, SessionUpsertOutcome::Created(expected_id.clone()));

    let session = store.get_session(&org_id, &expected_id).await.unwrap().unwrap();
    assert_eq!(session.status, SessionStatus::Queued);

    let subs = store.list_subscribers(&org_id, &expected_id).await.unwrap();
    assert_eq!(subs.len(), 1);
    assert_eq!(subs[0].user_id, UserId::from("u1"));
}

#[tokio::test]
async fn upsert_second_subscriber_does_not_create_second_session() {
    let store = InMemoryDocumentStore::new();
    seed_meeting(&store, "org-a", "m1", "u1", "https://meet.example.com/abc", now());
    seed_meeting(&store, "org-a", "m2", "u2", "https://meet.example.com/abc", now());

    let org_id = OrgId::from("org-a");
    let normalized = normalize_meeting_url("https://meet.example.com/abc");

    for (user, meeting) in [("u1", "m1"), ("u2", "m2")] {
        store
            .upsert_session_for_candidate(
                SessionUpsertInput {
                    org_id: org_id.clone(),
                    normalized_url: normalized.clone(),
                    join_url: "https://meet.example.com/abc".to_string(),
                    user_id: UserId::from(user),
                    meeting_id: MeetingId::from(meeting),
                },
                now(),
            )
            .await
            .unwrap();
    }

    let session_id = SessionId::compute(&org_id, &normalized);
    let subs = store.list_subscribers(&org_id, &session_id).await.unwrap();
    assert_eq!(subs.len(), 2);
}

#[tokio::test]
async fn claim_session_transitions_queued_to_processing() {
    let store = InMemoryDocumentStore::new();
    let org_id = OrgId::from("org-a");
    let session_id = SessionId::from("s1");
    let mut session = MeetingSession::new(org_id.clone(), session_id.clone(), "https://x".into(), now());
    session.status = SessionStatus::Queued;
    store.seed_session_for_test(session);

    let outcome = store
        .claim_session(&org_id, &session_id, "replica-a", StdDuration::from_secs(600), now())
        .await
        .unwrap();
    match outcome {
        ClaimOutcome::Claimed(session) => {
            assert_eq!(session.status, SessionStatus::Processing);
            assert_eq!(session.claim.unwrap().claimed_by, "replica-a");
        }
        other => panic!("expected Claimed, got {other:?}"),
    }
}

#[tokio::test]
async fn claim_fails_when_already_claimed_and_not_expired() {
    let store = InMemoryDocumentStore::new();
    let org_id = OrgId::from("org-a");
    let session_id = SessionId::from("s1");
    let mut session = MeetingSession::new(org_id.clone(), session_id.clone(), "https://x".into(), now());
    session.status = SessionStatus::Queued;
    store.seed_session_for_test(session);

    store
        .claim_session(&org_id, &session_id, "replica-a", StdDuration::from_secs(600), now())
        .await
        .unwrap();

    let second = store
        .claim_session(&org_id, &session_id, "replica-b", StdDuration::from_secs(600), now())
        .await
        .unwrap();
    assert_eq!(second, ClaimOutcome::NotQueued);
}

#[tokio::test]
async fn requeue_preserves_previous_status_through_upsert() {
    let store = InMemoryDocumentStore::new();
    seed_meeting(&store, "org-a", "m1", "u1", "https://meet.example.com/abc", now());

    let org_id = OrgId::from("org-a");
    let normalized = normalize_meeting_url("https://meet.example.com/abc");
    let input = || SessionUpsertInput {
        org_id: org_id.clone(),
        normalized_url: normalized.clone(),
        join_url: "https://meet.example.com/abc".to_string(),
        user_id: UserId::from("u1"),
        meeting_id: MeetingId::from("m1"),
    };

    store.upsert_session_for_candidate(input(), now()).await.unwrap();
    let session_id = SessionId::compute(&org_id, &normalized);
    store.mark_session_failed(&org_id, &session_id, "boom", now()).await.unwrap();

    let later = now() + chrono::Duration::hours(1);
    let outcome = store.upsert_session_for_candidate(input(), later).await.unwrap();
    assert_eq!(
        outcome,
        SessionUpsertOutcome::Requeued { session_id, previous_status: SessionStatus::Failed }
    );
}

#[tokio::test]
async fn lease_acquired_then_renewed_then_blocks_other_candidate() {
    let store = InMemoryDocumentStore::new();
    let first = store.acquire_or_renew_lease("replica-a", now()).await.unwrap();
    assert!(matches!(first, LeaseOutcome::Acquired(_)));

    let blocked = store.acquire_or_renew_lease("replica-b", now()).await.unwrap();
    assert!(matches!(blocked, LeaseOutcome::HeldByOther(_)));

    let renewed = store.acquire_or_renew_lease("replica-a", now() + chrono::Duration::seconds(5)).await.unwrap();
    assert!(matches!(renewed, LeaseOutcome::Renewed(_)));
}

#[tokio::test]
async fn find_sibling_meetings_matches_within_tolerance() {
    let store = InMemoryDocumentStore::new();
    seed_meeting(&store, "org-a", "m1", "u1", "https://meet.example.com/abc", now());
    seed_meeting(&store, "org-a", "m2", "u2", "https://meet.example.com/abc", now() + chrono::Duration::seconds(120));

    let org_id = OrgId::from("org-a");
    let siblings = store
        .find_sibling_meetings(
            &org_id,
            "https://meet.example.com/abc",
            now(),
            StdDuration::from_secs(300),
            &MeetingId::from("m1"),
        )
        .await
        .unwrap();
    assert_eq!(siblings.len(), 1);
    assert_eq!(siblings[0].meeting_id, MeetingId::from("m2"));
}
