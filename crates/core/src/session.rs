// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! The meeting session: the unit of scheduling deduplication, and its
//! subscribers.

use std::collections::HashMap;

use chrono::{DateTime, Utc};

use crate::ids::{MeetingId, OrgId, SessionId, UserId};
use crate::meeting::FanoutStatus;

/// Lifecycle state of a [`MeetingSession`].
///
/// `Cancelled` and `Error` are legacy/operator-set terminal states inherited
/// from the original system's re-queue logic; the core scheduling path only
/// ever produces `Queued` → `Claimed`/`Processing` → `Complete`/`Failed`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SessionStatus {
    Queued,
    Claimed,
    Processing,
    Complete,
    Failed,
    Cancelled,
    Error,
}

crate::simple_display! {
    SessionStatus {
        Queued => "queued",
        Claimed => "claimed",
        Processing => "processing",
        Complete => "complete",
        Failed => "failed",
        Cancelled => "cancelled",
        Error => "error",
    }
}

impl SessionStatus {
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "queued" => Some(Self::Queued),
            "claimed" => Some(Self::Claimed),
            "processing" => Some(Self::Processing),
            "complete" => Some(Self::Complete),
            "failed" => Some(Self::Failed),
            "cancelled" => Some(Self::Cancelled),
            "error" => Some(Self::Error),
            _ => None,
        }
    }

    /// A session in one of these states has no active claim and is a
    /// candidate for the recurring-meeting re-queue rule.
    pub fn is_terminal(self) -> bool {
        matches!(self, Self::Complete | Self::Failed | Self::Cancelled | Self::Error)
    }

    /// A session in one of these states has an active (or recently active)
    /// claim and should not be interfered with by a concurrent upsert.
    pub fn is_active(self) -> bool {
        matches!(self, Self::Claimed | Self::Processing)
    }
}

/// Claim metadata recorded when a [`MeetingSession`] transitions
/// `queued → processing`.
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct Claim {
    pub claimed_by: String,
    pub claimed_at: DateTime<Utc>,
    pub claim_expires_at: DateTime<Utc>,
}

/// A meeting session: the unit of scheduling deduplication, identified by
/// [`SessionId`] (a hash of org + normalized join url).
#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct MeetingSession {
    pub org_id: OrgId,
    pub session_id: SessionId,
    pub join_url: String,
    pub status: SessionStatus,
    pub previous_status: Option<SessionStatus>,
    pub claim: Option<Claim>,
    /// Canonical subscriber's artifact manifest (filename -> object-store
    /// path), copied over at the terminal fanout write. Empty until fanout
    /// runs.
    pub artifacts: HashMap<String, String>,
    pub fanout_status: Option<FanoutStatus>,
    pub fanout_last_error: Option<String>,
    pub fanout_report: Option<FanoutReport>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub requeued_at: Option<DateTime<Utc>>,
}

impl MeetingSession {
    pub fn new(org_id: OrgId, session_id: SessionId, join_url: String, now: DateTime<Utc>) -> Self {
        Self {
            org_id,
            session_id,
            join_url,
            status: SessionStatus::Queued,
            previous_status: None,
            claim: None,
            artifacts: HashMap::new(),
            fanout_status: None,
            fanout_last_error: None,
            fanout_report: None,
            created_at: now,
            updated_at: now,
            requeued_at: None,
        }
    }

    /// Invariant 4: re-queuing a terminal session preserves the prior status.
    pub fn requeue(&mut self, now: DateTime<Utc>) {
        self.previous_status = Some(self.status);
        self.status = SessionStatus::Queued;
        self.requeued_at = Some(now);
        self.updated_at = now;
    }
}

/// How a [`Subscriber`] came to be registered against a session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AddedVia {
    Direct,
    MergeConsolidation,
    AttendeeFanout,
}

crate::simple_display! {
    AddedVia {
        Direct => "direct",
        MergeConsolidation => "merge_consolidation",
        AttendeeFanout => "attendee_fanout",
    }
}

/// Copy state of a single subscriber's fanout.
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SubscriberStatus {
    Requested,
    Copied,
    Complete,
}

crate::simple_display! {
    SubscriberStatus {
        Requested => "requested",
        Copied => "copied",
        Complete => "complete",
    }
}

/// One user's interest in a session's output.
///
/// The first subscriber added (in `requested_at` order) is the *canonical*
/// subscriber: its `meeting_id`/`user_id` determine the session's authoritative
/// artifact prefix (invariant 5).
#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct Subscriber {
    pub user_id: UserId,
    pub meeting_id: MeetingId,
    pub status: SubscriberStatus,
    pub added_via: AddedVia,
    pub artifact_count: u32,
    pub requested_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Subscriber {
    pub fn new(
        user_id: UserId,
        meeting_id: MeetingId,
        added_via: AddedVia,
        now: DateTime<Utc>,
    ) -> Self {
        Self {
            user_id,
            meeting_id,
            status: SubscriberStatus::Requested,
            added_via,
            artifact_count: 0,
            requested_at: now,
            updated_at: now,
        }
    }
}

/// Per-subscriber validation result produced at the end of fanout (§4.F.f).
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct SubscriberValidation {
    pub user_id: UserId,
    pub ok: bool,
    pub error: Option<String>,
}

/// Terminal validation report stored on the session alongside `fanout_status`.
#[derive(Debug, Clone, PartialEq, Eq, Default, serde::Serialize, serde::Deserialize)]
pub struct FanoutReport {
    pub subscribers: Vec<SubscriberValidation>,
}

impl FanoutReport {
    pub fn all_ok(&self) -> bool {
        self.subscribers.iter().all(|s| s.ok)
    }
}

#[cfg(test)]
#[path = "session_tests.rs"]
mod tests;
