// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use serde_json::json;

fn ids() -> (OrgId, MeetingId) {
    (OrgId::from("org-a"), MeetingId::from("m1"))
}

#[yare::parameterized(
    meeting_url    = { "meeting_url" },
    meetingUrl     = { "meetingUrl" },
    join_url       = { "join_url" },
)]
fn resolves_every_known_join_url_alias(key: &str) {
    let (org, mid) = ids();
    let raw = json!({ (key): "https://meet.example.com/abc", "user_id": "u1" });
    let record = MeetingRecord::from_raw(org, mid, &raw).unwrap();
    assert_eq!(record.join_url, "https://meet.example.com/abc");
}

#[yare::parameterized(
    user_id            = { "user_id" },
    userId             = { "userId" },
    synced_by_user_id  = { "synced_by_user_id" },
    created_by         = { "created_by" },
)]
fn resolves_every_known_owner_user_id_alias(key: &str) {
    let (org, mid) = ids();
    let raw = json!({ "join_url": "https://meet.example.com/abc", (key): "u2" });
    let record = MeetingRecord::from_raw(org, mid, &raw).unwrap();
    assert_eq!(record.owner_user_id, UserId::from("u2"));
}

#[test]
fn missing_join_url_is_an_error() {
    let (org, mid) = ids();
    let raw = json!({ "user_id": "u1" });
    assert_eq!(MeetingRecord::from_raw(org, mid, &raw).unwrap_err(), MeetingParseError::MissingJoinUrl);
}

#[test]
fn missing_user_id_is_an_error() {
    let (org, mid) = ids();
    let raw = json!({ "join_url": "https://meet.example.com/abc" });
    assert_eq!(MeetingRecord::from_raw(org, mid, &raw).unwrap_err(), MeetingParseError::MissingUserId);
}

#[test]
fn parses_iso8601_start_string() {
    let (org, mid) = ids();
    let raw = json!({
        "join_url": "https://meet.example.com/abc",
        "user_id": "u1",
        "start": "2026-07-31T09:00:00Z",
    });
    let record = MeetingRecord::from_raw(org, mid, &raw).unwrap();
    assert_eq!(record.start.to_rfc3339(), "2026-07-31T09:00:00+00:00");
}

#[test]
fn defaults_status_to_scheduled() {
    let (org, mid) = ids();
    let raw = json!({ "join_url": "https://meet.example.com/abc", "user_id": "u1" });
    let record = MeetingRecord::from_raw(org, mid, &raw).unwrap();
    assert_eq!(record.status, MeetingStatus::Scheduled);
}

#[test]
fn parses_attendees_list() {
    let (org, mid) = ids();
    let raw = json!({
        "join_url": "https://meet.example.com/abc",
        "user_id": "u1",
        "attendees": ["a@org.com", "b@org.com"],
    });
    let record = MeetingRecord::from_raw(org, mid, &raw).unwrap();
    assert_eq!(record.attendees, vec!["a@org.com".to_string(), "b@org.com".to_string()]);
}
