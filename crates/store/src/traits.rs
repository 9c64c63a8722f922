// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! The `DocumentStore` abstraction: the one source of truth for meetings,
//! sessions, subscribers, and the leader lease.
//!
//! Per the design notes on transactions-with-pre-reads, the trait never
//! exposes a generic transaction primitive to callers. Every state
//! transition that needs read-then-write atomicity gets its own named
//! method instead (`upsert_session_for_candidate`, `claim_session`, ...),
//! so callers cannot accidentally interleave a read and a write across an
//! await point the way a raw transaction closure would allow.

use std::collections::HashMap;
use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use mb_core::{
    FanoutReport, FanoutStatus, JobName, LeaderLease, MeetingId, MeetingRecord, MeetingSession,
    OrgId, SessionId, SessionStatus, Subscriber, UserId,
};

use crate::error::StoreError;

/// Half-open instant range `[start, end)` used by the time-window scan.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TimeWindow {
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
}

/// Input to [`DocumentStore::upsert_session_for_candidate`]: one
/// `(org_id, normalized_url, user_id, meeting_id)` tuple surfaced by Discovery.
#[derive(Debug, Clone)]
pub struct SessionUpsertInput {
    pub org_id: OrgId,
    pub normalized_url: String,
    pub join_url: String,
    pub user_id: UserId,
    pub meeting_id: MeetingId,
}

/// Result of the §4.C session-coordination transaction.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionUpsertOutcome {
    /// No prior session existed; one was created in `queued`.
    Created(SessionId),
    /// A terminal session was revived per the recurring re-queue rule.
    Requeued { session_id: SessionId, previous_status: SessionStatus },
    /// A `queued` session already existed; only `updated_at` changed.
    Touched(SessionId),
    /// A `claimed`/`processing` session already existed; left untouched
    /// apart from `updated_at`, per the "do not interfere" rule.
    ActiveUntouched(SessionId),
}

/// Result of attempting [`DocumentStore::claim_session`].
#[derive(Debug, Clone, PartialEq)]
pub enum ClaimOutcome {
    Claimed(MeetingSession),
    /// Another process holds an unexpired claim. Not an error — the caller
    /// silently moves on (P4, contention-lost is a no-op).
    AlreadyClaimed,
    /// The session was not in `queued` when the claim was attempted.
    NotQueued,
}

/// Fields patched onto a meeting document by Session Coordinator or Fanout.
#[derive(Debug, Clone, Default)]
pub struct MeetingArtifactPatch {
    pub session_id: Option<SessionId>,
    pub session_status: Option<SessionStatus>,
    pub bot_job_name: Option<String>,
    pub bot_status: Option<String>,
    pub transcription: Option<String>,
    pub recording_url: Option<String>,
    pub artifacts: Option<HashMap<String, String>>,
    pub fanout_status: Option<FanoutStatus>,
}

/// Result of [`DocumentStore::acquire_or_renew_lease`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LeaseOutcome {
    Acquired(LeaderLease),
    Renewed(LeaderLease),
    HeldByOther(LeaderLease),
}

/// The document store: meetings, sessions, subscribers, and the leader lease.
///
/// Implementations: [`crate::memory::InMemoryDocumentStore`] (tests, dry-run)
/// and [`crate::firestore_store::FirestoreDocumentStore`] (production).
#[async_trait]
pub trait DocumentStore: Send + Sync + 'static {
    // -- reads --------------------------------------------------------

    /// Meetings whose `start` falls in `window`, executed against both the
    /// native-timestamp and ISO-8601-string representations and unioned by
    /// document id (discovery's time-window scan).
    async fn scan_meetings_in_window(&self, window: TimeWindow) -> Result<Vec<MeetingRecord>, StoreError>;

    /// Collection-group scan over sessions in `queued` (discovery's explicit
    /// queued scan).
    async fn scan_queued_sessions(&self) -> Result<Vec<MeetingSession>, StoreError>;

    /// Sessions in `claimed`/`processing`, for orphan detection.
    async fn scan_active_sessions(&self) -> Result<Vec<MeetingSession>, StoreError>;

    /// Sessions in `complete` with `fanout_status != complete`.
    async fn scan_sessions_pending_fanout(&self) -> Result<Vec<MeetingSession>, StoreError>;

    /// Meetings with `bot_status=complete` and `fanout_status != complete`
    /// (the URL-based fanout path).
    async fn scan_meetings_pending_url_fanout(&self) -> Result<Vec<MeetingRecord>, StoreError>;

    /// Sibling meetings in the same org sharing `join_url`, whose `start`
    /// falls within `tolerance` of `start` (URL-based fanout's time-window
    /// correlation heuristic).
    async fn find_sibling_meetings(
        &self,
        org_id: &OrgId,
        join_url: &str,
        start: DateTime<Utc>,
        tolerance: Duration,
        exclude_meeting_id: &MeetingId,
    ) -> Result<Vec<MeetingRecord>, StoreError>;

    async fn get_meeting(
        &self,
        org_id: &OrgId,
        meeting_id: &MeetingId,
    ) -> Result<Option<MeetingRecord>, StoreError>;

    async fn get_session(
        &self,
        org_id: &OrgId,
        session_id: &SessionId,
    ) -> Result<Option<MeetingSession>, StoreError>;

    /// Subscribers in `requested_at` order — index 0 is always canonical.
    async fn list_subscribers(
        &self,
        org_id: &OrgId,
        session_id: &SessionId,
    ) -> Result<Vec<Subscriber>, StoreError>;

    async fn lookup_user_by_email(
        &self,
        org_id: &OrgId,
        email: &str,
    ) -> Result<Option<UserId>, StoreError>;

    async fn organization_bot_name(&self, org_id: &OrgId) -> Result<Option<String>, StoreError>;

    // -- named transitions ---------------------------------------------

    /// §4.C steps 1-4: create-or-requeue the session, upsert the subscriber,
    /// patch the meeting. All reads in the transaction happen before any
    /// write.
    async fn upsert_session_for_candidate(
        &self,
        input: SessionUpsertInput,
        now: DateTime<Utc>,
    ) -> Result<SessionUpsertOutcome, StoreError>;

    /// Links a meeting directly to an already-running Job discovered via the
    /// pre-transaction label-selector check, bypassing session creation.
    async fn link_meeting_to_existing_job(
        &self,
        org_id: &OrgId,
        meeting_id: &MeetingId,
        job_name: &JobName,
        now: DateTime<Utc>,
    ) -> Result<(), StoreError>;

    /// §4.D claim transition: `queued` + claim absent-or-expired → `processing`.
    async fn claim_session(
        &self,
        org_id: &OrgId,
        session_id: &SessionId,
        claimed_by: &str,
        claim_ttl: Duration,
        now: DateTime<Utc>,
    ) -> Result<ClaimOutcome, StoreError>;

    async fn mark_session_failed(
        &self,
        org_id: &OrgId,
        session_id: &SessionId,
        reason: &str,
        now: DateTime<Utc>,
    ) -> Result<(), StoreError>;

    async fn create_subscriber(
        &self,
        org_id: &OrgId,
        session_id: &SessionId,
        subscriber: Subscriber,
    ) -> Result<(), StoreError>;

    async fn update_subscriber(
        &self,
        org_id: &OrgId,
        session_id: &SessionId,
        subscriber: Subscriber,
    ) -> Result<(), StoreError>;

    async fn patch_meeting(
        &self,
        org_id: &OrgId,
        meeting_id: &MeetingId,
        patch: MeetingArtifactPatch,
        now: DateTime<Utc>,
    ) -> Result<(), StoreError>;

    /// Terminal write of §4.F.1 step (g). `artifacts` is the canonical
    /// subscriber's artifact manifest, copied onto the session so invariant 5
    /// ("every artifact path in a session's manifest lies under the
    /// canonical subscriber's object-store prefix") has something to check.
    async fn set_session_fanout_report(
        &self,
        org_id: &OrgId,
        session_id: &SessionId,
        status: FanoutStatus,
        report: FanoutReport,
        error: Option<String>,
        artifacts: HashMap<String, String>,
        now: DateTime<Utc>,
    ) -> Result<(), StoreError>;

    /// Synthesize a meeting document for an attendee who lacks one, so they
    /// can be added as a subscriber (§4.F.a).
    async fn create_adhoc_meeting(
        &self,
        org_id: &OrgId,
        owner_user_id: &UserId,
        source: &MeetingRecord,
        now: DateTime<Utc>,
    ) -> Result<MeetingId, StoreError>;

    /// §4.A lease renewal: acquire if absent/expired, renew if held by
    /// `candidate_id`, otherwise report who holds it.
    async fn acquire_or_renew_lease(
        &self,
        candidate_id: &str,
        now: DateTime<Utc>,
    ) -> Result<LeaseOutcome, StoreError>;
}
