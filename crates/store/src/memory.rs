// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! In-memory `DocumentStore`, used by engine unit tests and by the daemon
//! when `DRY_RUN=true`.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration as StdDuration;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use mb_core::{
    FanoutReport, FanoutStatus, JobName, LeaderLease, MeetingId, MeetingRecord, MeetingSession,
    OrgId, SessionId, SessionStatus, Subscriber, UserId,
};
use parking_lot::Mutex;

use crate::error::StoreError;
use crate::traits::{
    ClaimOutcome, DocumentStore, LeaseOutcome, MeetingArtifactPatch, SessionUpsertInput,
    SessionUpsertOutcome, TimeWindow,
};

#[derive(Default)]
struct State {
    meetings: HashMap<(OrgId, MeetingId), MeetingRecord>,
    sessions: HashMap<(OrgId, SessionId), MeetingSession>,
    subscribers: HashMap<(OrgId, SessionId), Vec<Subscriber>>,
    emails: HashMap<(OrgId, String), UserId>,
    org_bot_names: HashMap<OrgId, String>,
    lease: Option<LeaderLease>,
    adhoc_seq: u64,
}

/// `parking_lot::Mutex`-guarded fake store. Cheap to clone (shares state via
/// `Arc`), so it can be handed to every component that needs a
/// `DocumentStore` without any lifetime gymnastics.
#[derive(Clone, Default)]
pub struct InMemoryDocumentStore {
    state: Arc<Mutex<State>>,
}

impl InMemoryDocumentStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Seed a meeting document directly, bypassing Discovery. For tests.
    pub fn seed_meeting(&self, meeting: MeetingRecord) {
        let mut state = self.state.lock();
        state.meetings.insert((meeting.org_id.clone(), meeting.meeting_id.clone()), meeting);
    }

    /// Seed an email→user mapping directly. For attendee-fanout tests.
    pub fn seed_user_email(&self, org_id: OrgId, email: &str, user_id: UserId) {
        self.state.lock().emails.insert((org_id, email.to_lowercase()), user_id);
    }

    pub fn seed_org_bot_name(&self, org_id: OrgId, name: &str) {
        self.state.lock().org_bot_names.insert(org_id, name.to_string());
    }

    /// Seed a session document directly. For tests exercising the claim
    /// transition without going through discovery first.
    pub fn seed_session_for_test(&self, session: MeetingSession) {
        let mut state = self.state.lock();
        state.sessions.insert((session.org_id.clone(), session.session_id.clone()), session);
    }
}

#[async_trait]
impl DocumentStore for InMemoryDocumentStore {
    async fn scan_meetings_in_window(&self, window: TimeWindow) -> Result<Vec<MeetingRecord>, StoreError> {
        let state = self.state.lock();
        Ok(state
            .meetings
            .values()
            .filter(|m| m.start >= window.start && m.start < window.end)
            .cloned()
            .collect())
    }

    async fn scan_queued_sessions(&self) -> Result<Vec<MeetingSession>, StoreError> {
        let state = self.state.lock();
        Ok(state.sessions.values().filter(|s| s.status == SessionStatus::Queued).cloned().collect())
    }

    async fn scan_active_sessions(&self) -> Result<Vec<MeetingSession>, StoreError> {
        let state = self.state.lock();
        Ok(state.sessions.values().filter(|s| s.status.is_active()).cloned().collect())
    }

    async fn scan_sessions_pending_fanout(&self) -> Result<Vec<MeetingSession>, StoreError> {
        let state = self.state.lock();
        Ok(state
            .sessions
            .values()
            .filter(|s| s.status == SessionStatus::Complete && s.fanout_status != Some(FanoutStatus::Complete))
            .cloned()
            .collect())
    }

    async fn scan_meetings_pending_url_fanout(&self) -> Result<Vec<MeetingRecord>, StoreError> {
        let state = self.state.lock();
        Ok(state
            .meetings
            .values()
            .filter(|m| {
                m.bot_status.as_deref() == Some("complete")
                    && m.fanout_status != Some(FanoutStatus::Complete)
            })
            .cloned()
            .collect())
    }

    async fn find_sibling_meetings(
        &self,
        org_id: &OrgId,
        join_url: &str,
        start: DateTime<Utc>,
        tolerance: StdDuration,
        exclude_meeting_id: &MeetingId,
    ) -> Result<Vec<MeetingRecord>, StoreError> {
        let tolerance = chrono::Duration::from_std(tolerance)
            .map_err(|e| StoreError::Unavailable(e.to_string()))?;
        let state = self.state.lock();
        Ok(state
            .meetings
            .values()
            .filter(|m| {
                &m.org_id == org_id
                    && &m.meeting_id != exclude_meeting_id
                    && m.join_url == join_url
                    && (m.start - start).abs() <= tolerance
            })
            .cloned()
            .collect())
    }

    async fn get_meeting(
        &self,
        org_id: &OrgId,
        meeting_id: &MeetingId,
    ) -> Result<Option<MeetingRecord>, StoreError> {
        Ok(self.state.lock().meetings.get(&(org_id.clone(), meeting_id.clone())).cloned())
    }

    async fn get_session(
        &self,
        org_id: &OrgId,
        session_id: &SessionId,
    ) -> Result<Option<MeetingSession>, StoreError> {
        Ok(self.state.lock().sessions.get(&(org_id.clone(), session_id.clone())).cloned())
    }

    async fn list_subscribers(
        &self,
        org_id: &OrgId,
        session_id: &SessionId,
    ) -> Result<Vec<Subscriber>, StoreError> {
        let mut subs = self
            .state
            .lock()
            .subscribers
            .get(&(org_id.clone(), session_id.clone()))
            .cloned()
            .unwrap_or_default();
        subs.sort_by_key(|s| s.requested_at);
        Ok(subs)
    }

    async fn lookup_user_by_email(
        &self,
        org_id: &OrgId,
        email: &str,
    ) -> Result<Option<UserId>, StoreError> {
        Ok(self.state.lock().emails.get(&(org_id.clone(), email.to_lowercase())).cloned())
    }

    async fn organization_bot_name(&self, org_id: &OrgId) -> Result<Option<String>, StoreError> {
        Ok(self.state.lock().org_bot_names.get(org_id).cloned())
    }

    async fn upsert_session_for_candidate(
        &self,
        input: SessionUpsertInput,
        now: DateTime<Utc>,
    ) -> Result<SessionUpsertOutcome, StoreError> {
        let session_id = SessionId::compute(&input.org_id, &input.normalized_url);
        let mut state = self.state.lock();

        let key = (input.org_id.clone(), session_id.clone());
        let outcome = match state.sessions.get_mut(&key) {
            None => {
                let mut session =
                    MeetingSession::new(input.org_id.clone(), session_id.clone(), input.join_url.clone(), now);
                session.status = SessionStatus::Queued;
                state.sessions.insert(key, session);
                SessionUpsertOutcome::Created(session_id.clone())
            }
            Some(session) if session.status.is_terminal() => {
                let previous = session.status;
                session.requeue(now);
                SessionUpsertOutcome::Requeued { session_id: session_id.clone(), previous_status: previous }
            }
            Some(session) if session.status == SessionStatus::Queued => {
                session.updated_at = now;
                SessionUpsertOutcome::Touched(session_id.clone())
            }
            Some(session) => {
                session.updated_at = now;
                SessionUpsertOutcome::ActiveUntouched(session_id.clone())
            }
        };

        let subs = state.subscribers.entry((input.org_id.clone(), session_id.clone())).or_default();
        match subs.iter_mut().find(|s| s.user_id == input.user_id) {
            Some(existing) => existing.updated_at = now,
            None => subs.push(Subscriber::new(
                input.user_id.clone(),
                input.meeting_id.clone(),
                mb_core::AddedVia::Direct,
                now,
            )),
        }

        if let Some(meeting) = state.meetings.get_mut(&(input.org_id.clone(), input.meeting_id.clone())) {
            meeting.session_id = Some(session_id.clone());
            meeting.status = mb_core::MeetingStatus::Queued;
        }

        Ok(outcome)
    }

    async fn link_meeting_to_existing_job(
        &self,
        org_id: &OrgId,
        meeting_id: &MeetingId,
        job_name: &JobName,
        _now: DateTime<Utc>,
    ) -> Result<(), StoreError> {
        let mut state = self.state.lock();
        let meeting = state
            .meetings
            .get_mut(&(org_id.clone(), meeting_id.clone()))
            .ok_or(StoreError::NotFound)?;
        meeting.bot_job_name = Some(job_name.to_string());
        meeting.bot_status = Some("assigned".to_string());
        Ok(())
    }

    async fn claim_session(
        &self,
        org_id: &OrgId,
        session_id: &SessionId,
        claimed_by: &str,
        claim_ttl: StdDuration,
        now: DateTime<Utc>,
    ) -> Result<ClaimOutcome, StoreError> {
        let mut state = self.state.lock();
        let session = match state.sessions.get_mut(&(org_id.clone(), session_id.clone())) {
            Some(s) => s,
            None => return Ok(ClaimOutcome::NotQueued),
        };

        if session.status != SessionStatus::Queued {
            return Ok(ClaimOutcome::NotQueued);
        }
        if let Some(claim) = &session.claim {
            if claim.claim_expires_at > now {
                return Ok(ClaimOutcome::AlreadyClaimed);
            }
        }

        let ttl = chrono::Duration::from_std(claim_ttl).map_err(|e| StoreError::Unavailable(e.to_string()))?;
        session.claim = Some(mb_core::Claim {
            claimed_by: claimed_by.to_string(),
            claimed_at: now,
            claim_expires_at: now + ttl,
        });
        session.status = SessionStatus::Processing;
        session.updated_at = now;
        Ok(ClaimOutcome::Claimed(session.clone()))
    }

    async fn mark_session_failed(
        &self,
        org_id: &OrgId,
        session_id: &SessionId,
        reason: &str,
        now: DateTime<Utc>,
    ) -> Result<(), StoreError> {
        let mut state = self.state.lock();
        let session = state
            .sessions
            .get_mut(&(org_id.clone(), session_id.clone()))
            .ok_or(StoreError::NotFound)?;
        session.status = SessionStatus::Failed;
        session.fanout_last_error = Some(reason.to_string());
        session.updated_at = now;
        Ok(())
    }

    async fn create_subscriber(
        &self,
        org_id: &OrgId,
        session_id: &SessionId,
        subscriber: Subscriber,
    ) -> Result<(), StoreError> {
        let mut state = self.state.lock();
        state.subscribers.entry((org_id.clone(), session_id.clone())).or_default().push(subscriber);
        Ok(())
    }

    async fn update_subscriber(
        &self,
        org_id: &OrgId,
        session_id: &SessionId,
        subscriber: Subscriber,
    ) -> Result<(), StoreError> {
        let mut state = self.state.lock();
        let subs = state.subscribers.entry((org_id.clone(), session_id.clone())).or_default();
        match subs.iter_mut().find(|s| s.user_id == subscriber.user_id) {
            Some(existing) => *existing = subscriber,
            None => subs.push(subscriber),
        }
        Ok(())
    }

    async fn patch_meeting(
        &self,
        org_id: &OrgId,
        meeting_id: &MeetingId,
        patch: MeetingArtifactPatch,
        _now: DateTime<Utc>,
    ) -> Result<(), StoreError> {
        let mut state = self.state.lock();
        let meeting = state
            .meetings
            .get_mut(&(org_id.clone(), meeting_id.clone()))
            .ok_or(StoreError::NotFound)?;
        if let Some(v) = patch.session_id {
            meeting.session_id = Some(v);
        }
        if let Some(v) = patch.session_status {
            meeting.status = match v {
                SessionStatus::Queued => mb_core::MeetingStatus::Queued,
                SessionStatus::Claimed | SessionStatus::Processing => mb_core::MeetingStatus::Processing,
                SessionStatus::Complete => mb_core::MeetingStatus::Complete,
                SessionStatus::Failed | SessionStatus::Error => mb_core::MeetingStatus::Failed,
                SessionStatus::Cancelled => mb_core::MeetingStatus::Cancelled,
            };
        }
        if let Some(v) = patch.bot_job_name {
            meeting.bot_job_name = Some(v);
        }
        if let Some(v) = patch.bot_status {
            meeting.bot_status = Some(v);
        }
        if let Some(v) = patch.transcription {
            meeting.transcription = Some(v);
        }
        if let Some(v) = patch.recording_url {
            meeting.recording_url = Some(v);
        }
        if let Some(v) = patch.artifacts {
            meeting.artifacts = v;
        }
        if let Some(v) = patch.fanout_status {
            meeting.fanout_status = Some(v);
        }
        Ok(())
    }

    async fn set_session_fanout_report(
        &self,
        org_id: &OrgId,
        session_id: &SessionId,
        status: FanoutStatus,
        report: FanoutReport,
        error: Option<String>,
        artifacts: HashMap<String, String>,
        now: DateTime<Utc>,
    ) -> Result<(), StoreError> {
        let mut state = self.state.lock();
        let session = state
            .sessions
            .get_mut(&(org_id.clone(), session_id.clone()))
            .ok_or(StoreError::NotFound)?;
        session.fanout_status = Some(status);
        session.fanout_last_error = error;
        session.fanout_report = Some(report);
        session.artifacts = artifacts;
        session.updated_at = now;
        Ok(())
    }

    async fn create_adhoc_meeting(
        &self,
        org_id: &OrgId,
        owner_user_id: &UserId,
        source: &MeetingRecord,
        now: DateTime<Utc>,
    ) -> Result<MeetingId, StoreError> {
        let mut state = self.state.lock();
        state.adhoc_seq += 1;
        let meeting_id = MeetingId::from(format!("adhoc-{}-{}", source.meeting_id.as_str(), state.adhoc_seq));

        let meeting = MeetingRecord {
            org_id: org_id.clone(),
            meeting_id: meeting_id.clone(),
            owner_user_id: owner_user_id.clone(),
            join_url: source.join_url.clone(),
            start: source.start,
            end: source.end,
            status: mb_core::MeetingStatus::Processing,
            attendees: Vec::new(),
            ai_assistant_enabled: source.ai_assistant_enabled,
            session_id: source.session_id.clone(),
            bot_job_name: source.bot_job_name.clone(),
            bot_status: source.bot_status.clone(),
            artifacts: HashMap::new(),
            transcription: None,
            recording_url: None,
            fanout_status: None,
        };
        state.meetings.insert((org_id.clone(), meeting_id.clone()), meeting);
        let _ = now;
        Ok(meeting_id)
    }

    async fn acquire_or_renew_lease(
        &self,
        candidate_id: &str,
        now: DateTime<Utc>,
    ) -> Result<LeaseOutcome, StoreError> {
        let mut state = self.state.lock();
        match &mut state.lease {
            None => {
                let lease = LeaderLease::new(candidate_id.to_string(), now);
                state.lease = Some(lease.clone());
                Ok(LeaseOutcome::Acquired(lease))
            }
            Some(lease) if lease.is_expired(now) => {
                *lease = LeaderLease::new(candidate_id.to_string(), now);
                Ok(LeaseOutcome::Acquired(lease.clone()))
            }
            Some(lease) if lease.leader_id == candidate_id => {
                lease.renew(now);
                Ok(LeaseOutcome::Renewed(lease.clone()))
            }
            Some(lease) => Ok(LeaseOutcome::HeldByOther(lease.clone())),
        }
    }
}

#[cfg(test)]
#[path = "memory_tests.rs"]
mod tests;
