// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use chrono::TimeZone;

fn now() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2026, 7, 31, 9, 0, 0).unwrap()
}

#[test]
fn requeue_preserves_previous_status() {
    let mut session =
        MeetingSession::new(OrgId::from("org-a"), SessionId::from("s1"), "https://x".into(), now());
    session.status = SessionStatus::Complete;
    session.requeue(now() + chrono::Duration::hours(1));
    assert_eq!(session.status, SessionStatus::Queued);
    assert_eq!(session.previous_status, Some(SessionStatus::Complete));
    assert!(session.requeued_at.is_some());
}

#[test]
fn terminal_states_match_spec() {
    for s in [SessionStatus::Complete, SessionStatus::Failed, SessionStatus::Cancelled, SessionStatus::Error] {
        assert!(s.is_terminal());
    }
    for s in [SessionStatus::Queued, SessionStatus::Claimed, SessionStatus::Processing] {
        assert!(!s.is_terminal());
    }
}

#[test]
fn active_states_exclude_queued() {
    assert!(!SessionStatus::Queued.is_active());
    assert!(SessionStatus::Claimed.is_active());
    assert!(SessionStatus::Processing.is_active());
}

#[test]
fn fanout_report_all_ok_when_empty() {
    assert!(FanoutReport::default().all_ok());
}

#[test]
fn fanout_report_not_ok_if_any_subscriber_failed() {
    let report = FanoutReport {
        subscribers: vec![
            SubscriberValidation { user_id: UserId::from("u1"), ok: true, error: None },
            SubscriberValidation { user_id: UserId::from("u2"), ok: false, error: Some("missing".into()) },
        ],
    };
    assert!(!report.all_ok());
}
