// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! The label triple that makes the orchestrator the cluster-wide bot-presence
//! oracle: `{app=meeting-bot, org_id_hash, url_hash}`. Two independent
//! dedup mechanisms exist (this one, and the session document) and are only
//! eventually consistent with each other — see the design notes on why both
//! the pre-transaction check and the pre-launch recheck query these labels.

use crate::ids::{org_id_hash, url_hash, OrgId};

pub const APP_LABEL_VALUE: &str = "meeting-bot";

/// Labels attached to every Worker Job; also the selector used to look one up.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct JobLabels {
    pub org_id_hash: String,
    pub url_hash: String,
}

impl JobLabels {
    pub fn new(org_id: &OrgId, normalized_url: &str) -> Self {
        Self { org_id_hash: org_id_hash(org_id), url_hash: url_hash(normalized_url) }
    }

    /// Kubernetes `labelSelector` string: `app=meeting-bot,org_id_hash=...,url_hash=...`.
    pub fn selector(&self) -> String {
        format!(
            "app={},org_id_hash={},url_hash={}",
            APP_LABEL_VALUE,
            sanitize_label_value(&self.org_id_hash),
            sanitize_label_value(&self.url_hash),
        )
    }

    /// Label map to attach to the created Job's metadata.
    pub fn as_map(&self) -> std::collections::BTreeMap<String, String> {
        std::collections::BTreeMap::from([
            ("app".to_string(), APP_LABEL_VALUE.to_string()),
            ("org_id_hash".to_string(), sanitize_label_value(&self.org_id_hash)),
            ("url_hash".to_string(), sanitize_label_value(&self.url_hash)),
        ])
    }
}

/// Sanitize a value for use as a Kubernetes label: alphanumerics, `-`, `_`,
/// `.` only, trimmed of leading/trailing dashes, capped at 63 chars.
pub fn sanitize_label_value(value: &str) -> String {
    let sanitized: String = value
        .chars()
        .map(|c| if c.is_ascii_alphanumeric() || matches!(c, '-' | '_' | '.') { c } else { '-' })
        .collect();
    let trimmed = sanitized.trim_matches('-');
    trimmed.chars().take(63).collect()
}

#[cfg(test)]
#[path = "labels_tests.rs"]
mod tests;
