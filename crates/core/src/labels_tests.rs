// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use crate::url_normalize::normalize_meeting_url;

#[test]
fn selector_has_expected_shape() {
    let org = OrgId::from("org-a");
    let url = normalize_meeting_url("https://meet.example.com/abc");
    let labels = JobLabels::new(&org, &url);
    let selector = labels.selector();
    assert!(selector.starts_with("app=meeting-bot,org_id_hash="));
    assert!(selector.contains(",url_hash="));
}

#[test]
fn sanitize_replaces_invalid_chars() {
    assert_eq!(sanitize_label_value("a b/c"), "a-b-c");
}

#[test]
fn sanitize_trims_leading_trailing_dashes() {
    assert_eq!(sanitize_label_value("--abc--"), "abc");
}

#[test]
fn sanitize_caps_at_63_chars() {
    let long = "a".repeat(100);
    assert_eq!(sanitize_label_value(&long).len(), 63);
}
