// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;

#[test]
fn build_sets_canonical_env_vars() {
    let org_id = OrgId::from("org-a");
    let session_id = SessionId::from("sess123456789");
    let canonical_user = UserId::from("u1");
    let canonical_meeting = MeetingId::from("m1");

    let spec = WorkerJobSpec::build(WorkerJobParams {
        org_id: &org_id,
        session_id: &session_id,
        normalized_url: "https://meet.example.com/abc",
        join_url: "https://meet.example.com/abc",
        canonical_user_id: &canonical_user,
        canonical_meeting_id: &canonical_meeting,
        namespace: "meeting-bots".to_string(),
        manager_image: "registry/manager:latest".to_string(),
        meeting_bot_image: "registry/bot:latest".to_string(),
        service_account: None,
        display_name: "Meeting Bot".to_string(),
    });

    assert_eq!(spec.env.get("MEETING_URL").unwrap(), "https://meet.example.com/abc");
    assert_eq!(spec.env.get("MEETING_ID").unwrap(), session_id.as_str());
    assert_eq!(spec.env.get("ORG_ID").unwrap(), "org-a");
    assert_eq!(spec.env.get("USER_ID").unwrap(), "u1");
    assert_eq!(spec.env.get("FS_MEETING_ID").unwrap(), "m1");
    assert_eq!(spec.env.get("GCS_PATH").unwrap(), "recordings/u1/m1/");
    assert_eq!(spec.env.get("MEETING_SESSION_ID").unwrap(), session_id.as_str());
}

#[test]
fn job_name_is_dns_safe() {
    let org_id = OrgId::from("org-a");
    let session_id = SessionId::from("sess123456789");
    let canonical_user = UserId::from("u1");
    let canonical_meeting = MeetingId::from("m1");

    let spec = WorkerJobSpec::build(WorkerJobParams {
        org_id: &org_id,
        session_id: &session_id,
        normalized_url: "https://meet.example.com/ABC",
        join_url: "https://meet.example.com/ABC",
        canonical_user_id: &canonical_user,
        canonical_meeting_id: &canonical_meeting,
        namespace: "meeting-bots".to_string(),
        manager_image: "registry/manager:latest".to_string(),
        meeting_bot_image: "registry/bot:latest".to_string(),
        service_account: None,
        display_name: "Meeting Bot".to_string(),
    });

    assert!(spec.job_name.as_str().chars().all(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || c == '-'));
    assert!(spec.job_name.as_str().starts_with("meeting-bot-"));
}

#[test]
fn scratch_volume_name_derives_from_job_name() {
    let org_id = OrgId::from("org-a");
    let session_id = SessionId::from("sess123456789");
    let canonical_user = UserId::from("u1");
    let canonical_meeting = MeetingId::from("m1");

    let spec = WorkerJobSpec::build(WorkerJobParams {
        org_id: &org_id,
        session_id: &session_id,
        normalized_url: "https://meet.example.com/abc",
        join_url: "https://meet.example.com/abc",
        canonical_user_id: &canonical_user,
        canonical_meeting_id: &canonical_meeting,
        namespace: "meeting-bots".to_string(),
        manager_image: "registry/manager:latest".to_string(),
        meeting_bot_image: "registry/bot:latest".to_string(),
        service_account: None,
        display_name: "Meeting Bot".to_string(),
    });

    assert_eq!(spec.scratch_volume_name(), format!("{}-scratch", spec.job_name.as_str()));
}

#[test]
fn recordings_prefix_is_user_then_meeting() {
    let user = UserId::from("u1");
    let meeting = MeetingId::from("m1");
    assert_eq!(recordings_prefix(&user, &meeting), "recordings/u1/m1/");
}
