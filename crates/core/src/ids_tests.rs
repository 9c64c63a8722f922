// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use crate::url_normalize::normalize_meeting_url;

#[test]
fn session_id_is_deterministic() {
    let org = OrgId::from("org-a");
    let url = normalize_meeting_url("https://meet.example.com/abc-def-ghi");
    assert_eq!(SessionId::compute(&org, &url), SessionId::compute(&org, &url));
}

#[test]
fn session_id_equal_for_equivalent_urls() {
    let org = OrgId::from("org-a");
    let a = normalize_meeting_url("https://TEAMS.example.com/X?utm_source=a");
    let b = normalize_meeting_url("https://teams.example.com/X/");
    assert_eq!(a, b);
    assert_eq!(SessionId::compute(&org, &a), SessionId::compute(&org, &b));
}

#[test]
fn session_id_differs_across_orgs() {
    let url = normalize_meeting_url("https://meet.example.com/abc-def-ghi");
    let a = SessionId::compute(&OrgId::from("org-a"), &url);
    let b = SessionId::compute(&OrgId::from("org-b"), &url);
    assert_ne!(a, b);
}

#[test]
fn org_id_hash_is_twelve_hex_chars() {
    let h = org_id_hash(&OrgId::from("org-a"));
    assert_eq!(h.len(), 12);
    assert!(h.chars().all(|c| c.is_ascii_hexdigit()));
}

#[test]
fn org_id_hash_empty_falls_back_to_no_org() {
    assert_eq!(org_id_hash(&OrgId::from("")), "no-org");
}

#[test]
fn url_hash_is_sixteen_hex_chars() {
    let normalized = normalize_meeting_url("https://meet.example.com/abc");
    let h = url_hash(&normalized);
    assert_eq!(h.len(), 16);
    assert!(h.chars().all(|c| c.is_ascii_hexdigit()));
}
