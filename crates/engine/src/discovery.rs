// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! §4.B Discovery Scanner: time-window scan plus the explicit queued scan.

use std::time::Duration;

use chrono::{DateTime, Utc};
use mb_core::{normalize_meeting_url, is_allowed_platform_host, MeetingRecord, MeetingSession, OrgId};
use mb_store::{DocumentStore, TimeWindow};

use crate::error::EngineError;

/// Meeting-platform hosts eligible for automatic bot scheduling. A join URL
/// outside this set (or a subdomain of one) is skipped during discovery.
const ALLOWED_PLATFORM_HOSTS: &[&str] =
    &["zoom.us", "meet.google.com", "teams.microsoft.com", "teams.live.com", "webex.com"];

const WINDOW_LEAD: Duration = Duration::from_secs(7 * 60 + 30);
const WINDOW_WIDTH: Duration = Duration::from_secs(60);

/// A meeting that survived discovery's filters and is ready for the Session
/// Coordinator, paired with its already-normalized URL (computed once here
/// so nobody downstream re-normalizes with a different pass).
#[derive(Debug, Clone)]
pub struct DiscoveredCandidate {
    pub org_id: OrgId,
    pub meeting: MeetingRecord,
    pub normalized_url: String,
}

fn allowed_hosts() -> Vec<String> {
    ALLOWED_PLATFORM_HOSTS.iter().map(|s| s.to_string()).collect()
}

/// Time-window scan: meetings starting in `[now+7m30s, now+8m30s)`, filtered
/// to those eligible for automatic scheduling. Candidates that fail a filter
/// are skipped silently, as the design calls for — they are not errors.
pub async fn scan_time_window(
    store: &dyn DocumentStore,
    now: DateTime<Utc>,
) -> Result<Vec<DiscoveredCandidate>, EngineError> {
    let window = TimeWindow {
        start: now + WINDOW_LEAD,
        end: now + WINDOW_LEAD + WINDOW_WIDTH,
    };
    let meetings = store.scan_meetings_in_window(window).await?;
    let hosts = allowed_hosts();

    let mut candidates = Vec::new();
    for meeting in meetings {
        if meeting.session_id.is_some() {
            continue;
        }
        if !meeting.ai_assistant_enabled {
            continue;
        }
        let normalized_url = normalize_meeting_url(&meeting.join_url);
        if normalized_url.is_empty() {
            tracing::debug!(
                org_id = %meeting.org_id,
                meeting_id = %meeting.meeting_id,
                "discovery: skipping meeting with unparseable join url"
            );
            continue;
        }
        if !is_allowed_platform_host(&normalized_url, &hosts) {
            tracing::debug!(
                org_id = %meeting.org_id,
                meeting_id = %meeting.meeting_id,
                "discovery: skipping meeting on disallowed platform host"
            );
            continue;
        }
        let org_id = meeting.org_id.clone();
        candidates.push(DiscoveredCandidate { org_id, meeting, normalized_url });
    }
    Ok(candidates)
}

/// Explicit queued scan: sessions already sitting in `queued`, surfaced via a
/// collection-group query rather than the time-window path. Feeds directly
/// into the Job Launcher's claim attempt.
pub async fn scan_queued_sessions(store: &dyn DocumentStore) -> Result<Vec<MeetingSession>, EngineError> {
    Ok(store.scan_queued_sessions().await?)
}

#[cfg(test)]
#[path = "discovery_tests.rs"]
mod tests;
