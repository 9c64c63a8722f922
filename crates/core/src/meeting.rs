// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! The meeting entity and the boundary parser that turns a loosely-typed
//! document-store payload into it.
//!
//! The source system tolerates many field-name variants for the same logical
//! value (`userId|user_id|USER_ID|fs_user_id`, `join_url|meeting_url|meetingUrl`).
//! Rather than letting that looseness leak inward, [`MeetingRecord::from_raw`]
//! resolves every known alias exactly once, at the document-store boundary,
//! and everything past that point works with a normalized, strongly typed
//! [`MeetingRecord`].

use std::collections::HashMap;

use chrono::{DateTime, Utc};
use serde_json::Value;

use crate::error::MeetingParseError;
use crate::ids::{MeetingId, OrgId, SessionId, UserId};

/// Lifecycle state of a meeting document.
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MeetingStatus {
    Scheduled,
    Queued,
    Processing,
    Complete,
    Failed,
    Cancelled,
    /// Folded into a sibling meeting by duplicate-meeting consolidation.
    Merged,
}

crate::simple_display! {
    MeetingStatus {
        Scheduled => "scheduled",
        Queued => "queued",
        Processing => "processing",
        Complete => "complete",
        Failed => "failed",
        Cancelled => "cancelled",
        Merged => "merged",
    }
}

impl MeetingStatus {
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "scheduled" => Some(Self::Scheduled),
            "queued" => Some(Self::Queued),
            "processing" => Some(Self::Processing),
            "complete" => Some(Self::Complete),
            "failed" => Some(Self::Failed),
            "cancelled" => Some(Self::Cancelled),
            "merged" => Some(Self::Merged),
            _ => None,
        }
    }
}

/// Outcome of fanning artifacts out to this meeting's subscriber record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FanoutStatus {
    Complete,
    Partial,
    Failed,
}

crate::simple_display! {
    FanoutStatus {
        Complete => "complete",
        Partial => "partial",
        Failed => "failed",
    }
}

impl FanoutStatus {
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "complete" => Some(Self::Complete),
            "partial" => Some(Self::Partial),
            "failed" => Some(Self::Failed),
            _ => None,
        }
    }
}

/// A normalized view of an `organizations/{org}/meetings/{id}` document.
///
/// Post-processing fields (`artifacts`, `transcription`, `recording_url`,
/// `fanout_status`) start empty/`None` and are populated by the fanout engine.
#[derive(Debug, Clone, PartialEq)]
pub struct MeetingRecord {
    pub org_id: OrgId,
    pub meeting_id: MeetingId,
    pub owner_user_id: UserId,
    pub join_url: String,
    pub start: DateTime<Utc>,
    pub end: Option<DateTime<Utc>>,
    pub status: MeetingStatus,
    pub attendees: Vec<String>,
    pub ai_assistant_enabled: bool,
    pub session_id: Option<SessionId>,
    pub bot_job_name: Option<String>,
    pub bot_status: Option<String>,
    pub artifacts: HashMap<String, String>,
    pub transcription: Option<String>,
    pub recording_url: Option<String>,
    pub fanout_status: Option<FanoutStatus>,
}

impl MeetingRecord {
    /// Parse a raw document-store payload into a [`MeetingRecord`].
    ///
    /// `org_id` and `meeting_id` come from the document path rather than the
    /// body, since they're never duplicated as fields in practice. Every other
    /// field goes through alias resolution against `raw`.
    pub fn from_raw(
        org_id: OrgId,
        meeting_id: MeetingId,
        raw: &Value,
    ) -> Result<Self, MeetingParseError> {
        let join_url = first_str(raw, &["join_url", "meeting_url", "meetingUrl"])
            .ok_or(MeetingParseError::MissingJoinUrl)?;

        let owner_user_id =
            first_str(raw, &["user_id", "userId", "synced_by_user_id", "created_by"])
                .map(UserId::from)
                .ok_or(MeetingParseError::MissingUserId)?;

        let start = first_value(raw, &["start"])
            .map(parse_timestamp)
            .transpose()?
            .unwrap_or_else(Utc::now);
        let end = first_value(raw, &["end"]).and_then(|v| parse_timestamp(v).ok());

        let status = first_str(raw, &["status"])
            .and_then(|s| MeetingStatus::parse(&s))
            .unwrap_or(MeetingStatus::Scheduled);

        let attendees = first_value(raw, &["attendees"])
            .and_then(|v| v.as_array())
            .map(|arr| arr.iter().filter_map(|v| v.as_str().map(str::to_string)).collect())
            .unwrap_or_default();

        let ai_assistant_enabled = first_value(raw, &["ai_assistant_enabled"])
            .and_then(|v| v.as_bool())
            .unwrap_or(false);

        let session_id = first_str(raw, &["session_id", "meeting_session_id"]).map(SessionId::from);

        let artifacts = first_value(raw, &["artifacts"])
            .and_then(|v| v.as_object())
            .map(|m| {
                m.iter()
                    .filter_map(|(k, v)| v.as_str().map(|s| (k.clone(), s.to_string())))
                    .collect()
            })
            .unwrap_or_default();

        Ok(Self {
            org_id,
            meeting_id,
            owner_user_id,
            join_url,
            start,
            end,
            status,
            attendees,
            ai_assistant_enabled,
            session_id,
            bot_job_name: first_str(raw, &["bot_job_name"]),
            bot_status: first_str(raw, &["bot_status"]),
            artifacts,
            transcription: first_str(raw, &["transcription"]),
            recording_url: first_str(raw, &["recording_url"]),
            fanout_status: first_str(raw, &["fanout_status"]).and_then(|s| FanoutStatus::parse(&s)),
        })
    }
}

fn first_value<'a>(raw: &'a Value, keys: &[&str]) -> Option<&'a Value> {
    keys.iter().find_map(|k| raw.get(k)).filter(|v| !v.is_null())
}

fn first_str(raw: &Value, keys: &[&str]) -> Option<String> {
    first_value(raw, keys).and_then(|v| v.as_str()).filter(|s| !s.is_empty()).map(str::to_string)
}

/// Meeting `start`/`end` arrive as either a native document-store timestamp
/// (serialized here as RFC3339) or an ISO-8601 string — Discovery has to
/// query both representations and union the results by document id.
fn parse_timestamp(v: &Value) -> Result<DateTime<Utc>, MeetingParseError> {
    match v {
        Value::String(s) => DateTime::parse_from_rfc3339(s)
            .map(|dt| dt.with_timezone(&Utc))
            .map_err(|_| MeetingParseError::UnparseableStartTime(s.clone())),
        Value::Number(n) => {
            let secs = n.as_i64().ok_or_else(|| MeetingParseError::UnparseableStartTime(n.to_string()))?;
            DateTime::from_timestamp(secs, 0)
                .ok_or_else(|| MeetingParseError::UnparseableStartTime(n.to_string()))
        }
        other => Err(MeetingParseError::UnparseableStartTime(other.to_string())),
    }
}

#[cfg(test)]
#[path = "meeting_tests.rs"]
mod tests;
