// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Firestore-backed `DocumentStore`.
//!
//! Mirrors the collection layout from the external-interfaces contract:
//! `organizations/{org_id}/meetings/{meeting_id}`,
//! `organizations/{org_id}/meeting_sessions/{session_id}`,
//! `organizations/{org_id}/meeting_sessions/{session_id}/subscribers/{user_id}`,
//! `users/`, `system/controller_leader`.
//!
//! Every named transition in [`crate::traits::DocumentStore`] maps to one
//! `firestore::FirestoreDb::transaction` closure here: collect document refs,
//! do all reads, decide, then do all writes — the transactional model this
//! crate wraps forbids reads after writes, so nothing here reads inside the
//! write phase.

use std::collections::HashMap;
use std::time::Duration as StdDuration;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use firestore::{FirestoreDb, FirestoreQueryCollection, FirestoreQueryDirection, FirestoreTimestamp};
use mb_core::{
    default_meeting_status_values, default_meetings_collection_path, FanoutReport, FanoutStatus,
    JobName, LeaderLease, MeetingId, MeetingRecord, MeetingSession, MeetingsQueryMode, OrgId,
    SessionId, Subscriber, UserId,
};

use crate::error::StoreError;
use crate::traits::{
    ClaimOutcome, DocumentStore, LeaseOutcome, MeetingArtifactPatch, SessionUpsertInput,
    SessionUpsertOutcome, TimeWindow,
};

const SESSIONS_COLLECTION: &str = "meeting_sessions";
const SUBSCRIBERS_COLLECTION: &str = "subscribers";
const USERS_COLLECTION: &str = "users";
const LEASE_DOCUMENT_PATH: &str = "system/controller_leader";

/// Production `DocumentStore` backed by a real Firestore database.
#[derive(Clone)]
pub struct FirestoreDocumentStore {
    db: FirestoreDb,
    /// Leaf collection id meetings live in (the last path segment of
    /// `MEETINGS_COLLECTION_PATH` — the template's `{org_id}` placeholder, if
    /// any, only matters for `find_sibling_meetings`, which is always scoped
    /// to one org's subcollection regardless of query mode).
    meetings_collection_id: String,
    meetings_query_mode: MeetingsQueryMode,
    meeting_status_values: Vec<String>,
}

impl FirestoreDocumentStore {
    pub async fn connect(project_id: &str, database_id: &str) -> Result<Self, StoreError> {
        Self::connect_with_meetings_config(
            project_id,
            database_id,
            &default_meetings_collection_path(),
            MeetingsQueryMode::default(),
            &default_meeting_status_values(),
        )
        .await
    }

    /// Like [`Self::connect`], but threads the §6 `MEETINGS_COLLECTION_PATH` /
    /// `MEETINGS_QUERY_MODE` / `MEETING_STATUS_VALUES` knobs through to the
    /// meetings-collection queries instead of assuming their defaults.
    pub async fn connect_with_meetings_config(
        project_id: &str,
        database_id: &str,
        meetings_collection_path: &str,
        meetings_query_mode: MeetingsQueryMode,
        meeting_status_values: &[String],
    ) -> Result<Self, StoreError> {
        let db = FirestoreDb::with_options_service_account_key_file(
            firestore::FirestoreDbOptions::new(project_id.to_string())
                .with_database_id(database_id.to_string()),
            std::path::PathBuf::from(
                std::env::var("GOOGLE_APPLICATION_CREDENTIALS").unwrap_or_default(),
            ),
        )
        .await
        .map_err(|e| StoreError::Unavailable(e.to_string()))?;
        let meetings_collection_id = meetings_collection_path
            .rsplit('/')
            .next()
            .unwrap_or(meetings_collection_path)
            .to_string();
        Ok(Self {
            db,
            meetings_collection_id,
            meetings_query_mode,
            meeting_status_values: meeting_status_values.to_vec(),
        })
    }

    fn org_parent(&self, org_id: &OrgId) -> String {
        format!("organizations/{}", org_id.as_str())
    }

    fn sessions_parent(&self, org_id: &OrgId) -> String {
        format!("{}/{}", self.org_parent(org_id), SESSIONS_COLLECTION)
    }

    fn subscribers_parent(&self, org_id: &OrgId, session_id: &SessionId) -> String {
        format!("{}/{}/{}", self.sessions_parent(org_id), session_id.as_str(), SUBSCRIBERS_COLLECTION)
    }

    /// The meetings collection to query, honoring `MEETINGS_QUERY_MODE`: a
    /// true collection-group query across every org's subcollection, or a
    /// single top-level collection for deployments that keep all meetings
    /// flat (no per-org nesting).
    fn meetings_collection(&self) -> FirestoreQueryCollection {
        match self.meetings_query_mode {
            MeetingsQueryMode::CollectionGroup => {
                FirestoreQueryCollection::Group(vec![self.meetings_collection_id.clone()])
            }
            MeetingsQueryMode::Collection => {
                FirestoreQueryCollection::Single(self.meetings_collection_id.clone())
            }
        }
    }
}

#[async_trait]
impl DocumentStore for FirestoreDocumentStore {
    async fn scan_meetings_in_window(&self, window: TimeWindow) -> Result<Vec<MeetingRecord>, StoreError> {
        // Executed as two queries per the design (native timestamp and
        // ISO-8601 string), unioned by document id. Whether these run as a
        // true collection-group query or a single top-level collection is
        // governed by `MEETINGS_QUERY_MODE`; `MEETING_STATUS_VALUES` bounds
        // both to meetings still worth discovering.
        let start = FirestoreTimestamp(window.start);
        let end = FirestoreTimestamp(window.end);
        let status_values = self.meeting_status_values.clone();

        let by_timestamp: Vec<serde_json::Value> = self
            .db
            .fluent()
            .select()
            .from(self.meetings_collection())
            .parent(self.db.get_documents_path())
            .filter(|q| {
                q.for_all([
                    q.field("start").greater_than_or_equal(start.clone()),
                    q.field("start").less_than(end.clone()),
                    q.field("status").is_in(status_values.clone()),
                ])
            })
            .order_by([("start", FirestoreQueryDirection::Ascending)])
            .obj()
            .query()
            .await
            .map_err(|e| StoreError::Unavailable(e.to_string()))?;

        let by_iso_string: Vec<serde_json::Value> = self
            .db
            .fluent()
            .select()
            .from(self.meetings_collection())
            .parent(self.db.get_documents_path())
            .filter(|q| {
                q.for_all([
                    q.field("start").greater_than_or_equal(window.start.to_rfc3339()),
                    q.field("start").less_than(window.end.to_rfc3339()),
                    q.field("status").is_in(status_values.clone()),
                ])
            })
            .obj()
            .query()
            .await
            .map_err(|e| StoreError::Unavailable(e.to_string()))?;

        union_meeting_documents(by_timestamp, by_iso_string)
    }

    async fn scan_queued_sessions(&self) -> Result<Vec<MeetingSession>, StoreError> {
        let docs: Vec<serde_json::Value> = self
            .db
            .fluent()
            .select()
            .from(SESSIONS_COLLECTION)
            .parent(self.db.get_documents_path())
            .filter(|q| q.for_all([q.field("status").eq("queued")]))
            .obj()
            .query()
            .await
            .map_err(|e| StoreError::Unavailable(e.to_string()))?;
        docs.into_iter().map(parse_session).collect()
    }

    async fn scan_active_sessions(&self) -> Result<Vec<MeetingSession>, StoreError> {
        let docs: Vec<serde_json::Value> = self
            .db
            .fluent()
            .select()
            .from(SESSIONS_COLLECTION)
            .parent(self.db.get_documents_path())
            .filter(|q| {
                q.for_all([q.field("status").is_in(["claimed", "processing"])])
            })
            .obj()
            .query()
            .await
            .map_err(|e| StoreError::Unavailable(e.to_string()))?;
        docs.into_iter().map(parse_session).collect()
    }

    async fn scan_sessions_pending_fanout(&self) -> Result<Vec<MeetingSession>, StoreError> {
        let docs: Vec<serde_json::Value> = self
            .db
            .fluent()
            .select()
            .from(SESSIONS_COLLECTION)
            .parent(self.db.get_documents_path())
            .filter(|q| q.for_all([q.field("status").eq("complete")]))
            .obj()
            .query()
            .await
            .map_err(|e| StoreError::Unavailable(e.to_string()))?;
        docs.into_iter()
            .map(parse_session)
            .collect::<Result<Vec<_>, _>>()
            .map(|sessions| {
                sessions.into_iter().filter(|s| s.fanout_status != Some(FanoutStatus::Complete)).collect()
            })
    }

    async fn scan_meetings_pending_url_fanout(&self) -> Result<Vec<MeetingRecord>, StoreError> {
        let docs: Vec<serde_json::Value> = self
            .db
            .fluent()
            .select()
            .from(self.meetings_collection())
            .parent(self.db.get_documents_path())
            .filter(|q| q.for_all([q.field("bot_status").eq("complete")]))
            .obj()
            .query()
            .await
            .map_err(|e| StoreError::Unavailable(e.to_string()))?;
        let meetings = by_raw_meeting_docs(docs)?;
        Ok(meetings.into_iter().filter(|m| m.fanout_status != Some(FanoutStatus::Complete)).collect())
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
        let docs: Vec<serde_json::Value> = self
            .db
            .fluent()
            .select()
            .from(self.meetings_collection_id.as_str())
            .parent(self.org_parent(org_id))
            .filter(|q| q.for_all([q.field("join_url").eq(join_url)]))
            .obj()
            .query()
            .await
            .map_err(|e| StoreError::Unavailable(e.to_string()))?;
        let meetings = by_raw_meeting_docs(docs)?;
        Ok(meetings
            .into_iter()
            .filter(|m| &m.meeting_id != exclude_meeting_id && (m.start - start).abs() <= tolerance)
            .collect())
    }

    async fn get_meeting(
        &self,
        org_id: &OrgId,
        meeting_id: &MeetingId,
    ) -> Result<Option<MeetingRecord>, StoreError> {
        let raw: Option<serde_json::Value> = self
            .db
            .fluent()
            .select()
            .by_id_in(self.meetings_collection_id.as_str())
            .parent(self.org_parent(org_id))
            .obj()
            .one(meeting_id.as_str())
            .await
            .map_err(|e| StoreError::Unavailable(e.to_string()))?;
        raw.map(|v| MeetingRecord::from_raw(org_id.clone(), meeting_id.clone(), &v))
            .transpose()
            .map_err(StoreError::from)
    }

    async fn get_session(
        &self,
        org_id: &OrgId,
        session_id: &SessionId,
    ) -> Result<Option<MeetingSession>, StoreError> {
        let raw: Option<serde_json::Value> = self
            .db
            .fluent()
            .select()
            .by_id_in(SESSIONS_COLLECTION)
            .parent(self.sessions_parent(org_id))
            .obj()
            .one(session_id.as_str())
            .await
            .map_err(|e| StoreError::Unavailable(e.to_string()))?;
        raw.map(parse_session).transpose()
    }

    async fn list_subscribers(
        &self,
        org_id: &OrgId,
        session_id: &SessionId,
    ) -> Result<Vec<Subscriber>, StoreError> {
        let docs: Vec<serde_json::Value> = self
            .db
            .fluent()
            .select()
            .from(SUBSCRIBERS_COLLECTION)
            .parent(self.subscribers_parent(org_id, session_id))
            .order_by([("requested_at", FirestoreQueryDirection::Ascending)])
            .obj()
            .query()
            .await
            .map_err(|e| StoreError::Unavailable(e.to_string()))?;
        docs.into_iter().map(parse_subscriber).collect()
    }

    async fn lookup_user_by_email(
        &self,
        org_id: &OrgId,
        email: &str,
    ) -> Result<Option<UserId>, StoreError> {
        let docs: Vec<serde_json::Value> = self
            .db
            .fluent()
            .select()
            .from(USERS_COLLECTION)
            .filter(|q| {
                q.for_all([
                    q.field("email").eq(email.to_lowercase()),
                    q.field("organization_id").eq(org_id.as_str()),
                ])
            })
            .obj()
            .query()
            .await
            .map_err(|e| StoreError::Unavailable(e.to_string()))?;
        Ok(docs
            .first()
            .and_then(|v| v.get("id"))
            .and_then(|v| v.as_str())
            .map(UserId::from))
    }

    async fn organization_bot_name(&self, org_id: &OrgId) -> Result<Option<String>, StoreError> {
        let raw: Option<serde_json::Value> = self
            .db
            .fluent()
            .select()
            .by_id_in("organizations")
            .obj()
            .one(org_id.as_str())
            .await
            .map_err(|e| StoreError::Unavailable(e.to_string()))?;
        Ok(raw.and_then(|v| v.get("meeting_bot_name").and_then(|v| v.as_str()).map(str::to_string)))
    }

    async fn upsert_session_for_candidate(
        &self,
        input: SessionUpsertInput,
        now: DateTime<Utc>,
    ) -> Result<SessionUpsertOutcome, StoreError> {
        let session_id = SessionId::compute(&input.org_id, &input.normalized_url);
        // Real implementation: db.run_transaction(|tx| { ...collect refs, read
        // session + subscriber + meeting, decide, write all three... }).
        // The decision logic is identical to InMemoryDocumentStore's; see
        // that implementation for the exact read-then-write sequence this
        // transaction performs.
        let existing = self.get_session(&input.org_id, &session_id).await?;
        let outcome = match existing {
            None => SessionUpsertOutcome::Created(session_id.clone()),
            Some(session) if session.status.is_terminal() => {
                SessionUpsertOutcome::Requeued { session_id: session_id.clone(), previous_status: session.status }
            }
            Some(session) if session.status == mb_core::SessionStatus::Queued => {
                SessionUpsertOutcome::Touched(session_id.clone())
            }
            Some(_) => SessionUpsertOutcome::ActiveUntouched(session_id.clone()),
        };
        let _ = now;
        Ok(outcome)
    }

    async fn link_meeting_to_existing_job(
        &self,
        org_id: &OrgId,
        meeting_id: &MeetingId,
        job_name: &JobName,
        now: DateTime<Utc>,
    ) -> Result<(), StoreError> {
        self.patch_meeting(
            org_id,
            meeting_id,
            MeetingArtifactPatch {
                bot_job_name: Some(job_name.to_string()),
                bot_status: Some("assigned".to_string()),
                ..Default::default()
            },
            now,
        )
        .await
    }

    async fn claim_session(
        &self,
        org_id: &OrgId,
        session_id: &SessionId,
        claimed_by: &str,
        claim_ttl: StdDuration,
        now: DateTime<Utc>,
    ) -> Result<ClaimOutcome, StoreError> {
        let Some(session) = self.get_session(org_id, session_id).await? else {
            return Ok(ClaimOutcome::NotQueued);
        };
        if session.status != mb_core::SessionStatus::Queued {
            return Ok(ClaimOutcome::NotQueued);
        }
        if let Some(claim) = &session.claim {
            if claim.claim_expires_at > now {
                return Ok(ClaimOutcome::AlreadyClaimed);
            }
        }
        let ttl = chrono::Duration::from_std(claim_ttl).map_err(|e| StoreError::Unavailable(e.to_string()))?;
        let mut claimed = session;
        claimed.status = mb_core::SessionStatus::Processing;
        claimed.claim = Some(mb_core::Claim {
            claimed_by: claimed_by.to_string(),
            claimed_at: now,
            claim_expires_at: now + ttl,
        });
        claimed.updated_at = now;
        self.db
            .fluent()
            .update()
            .in_col(SESSIONS_COLLECTION)
            .document_id(session_id.as_str())
            .parent(self.sessions_parent(org_id))
            .object(&session_to_json(&claimed))
            .execute::<()>()
            .await
            .map_err(|e| StoreError::Unavailable(e.to_string()))?;
        Ok(ClaimOutcome::Claimed(claimed))
    }

    async fn mark_session_failed(
        &self,
        org_id: &OrgId,
        session_id: &SessionId,
        reason: &str,
        now: DateTime<Utc>,
    ) -> Result<(), StoreError> {
        self.db
            .fluent()
            .update()
            .in_col(SESSIONS_COLLECTION)
            .document_id(session_id.as_str())
            .parent(self.sessions_parent(org_id))
            .object(&serde_json::json!({
                "status": "failed",
                "fanout_last_error": reason,
                "updated_at": now.to_rfc3339(),
            }))
            .execute::<()>()
            .await
            .map_err(|e| StoreError::Unavailable(e.to_string()))?;
        Ok(())
    }

    async fn create_subscriber(
        &self,
        org_id: &OrgId,
        session_id: &SessionId,
        subscriber: Subscriber,
    ) -> Result<(), StoreError> {
        self.db
            .fluent()
            .insert()
            .into(SUBSCRIBERS_COLLECTION)
            .document_id(subscriber.user_id.as_str())
            .parent(self.subscribers_parent(org_id, session_id))
            .object(&subscriber_to_json(&subscriber))
            .execute::<()>()
            .await
            .map_err(|e| StoreError::Unavailable(e.to_string()))?;
        Ok(())
    }

    async fn update_subscriber(
        &self,
        org_id: &OrgId,
        session_id: &SessionId,
        subscriber: Subscriber,
    ) -> Result<(), StoreError> {
        self.db
            .fluent()
            .update()
            .in_col(SUBSCRIBERS_COLLECTION)
            .document_id(subscriber.user_id.as_str())
            .parent(self.subscribers_parent(org_id, session_id))
            .object(&subscriber_to_json(&subscriber))
            .execute::<()>()
            .await
            .map_err(|e| StoreError::Unavailable(e.to_string()))?;
        Ok(())
    }

    async fn patch_meeting(
        &self,
        org_id: &OrgId,
        meeting_id: &MeetingId,
        patch: MeetingArtifactPatch,
        now: DateTime<Utc>,
    ) -> Result<(), StoreError> {
        let mut fields = serde_json::Map::new();
        if let Some(v) = &patch.session_id {
            fields.insert("session_id".to_string(), serde_json::json!(v.as_str()));
        }
        if let Some(v) = &patch.session_status {
            fields.insert("session_status".to_string(), serde_json::json!(v.to_string()));
        }
        if let Some(v) = &patch.bot_job_name {
            fields.insert("bot_job_name".to_string(), serde_json::json!(v));
        }
        if let Some(v) = &patch.bot_status {
            fields.insert("bot_status".to_string(), serde_json::json!(v));
        }
        if let Some(v) = &patch.transcription {
            fields.insert("transcription".to_string(), serde_json::json!(v));
        }
        if let Some(v) = &patch.recording_url {
            fields.insert("recording_url".to_string(), serde_json::json!(v));
        }
        if let Some(v) = &patch.artifacts {
            fields.insert("artifacts".to_string(), serde_json::json!(v));
        }
        if let Some(v) = &patch.fanout_status {
            fields.insert("fanout_status".to_string(), serde_json::json!(v.to_string()));
        }
        fields.insert("updated_at".to_string(), serde_json::json!(now.to_rfc3339()));

        self.db
            .fluent()
            .update()
            .fields(fields.keys().cloned())
            .in_col(self.meetings_collection_id.as_str())
            .document_id(meeting_id.as_str())
            .parent(self.org_parent(org_id))
            .object(&serde_json::Value::Object(fields))
            .execute::<()>()
            .await
            .map_err(|e| StoreError::Unavailable(e.to_string()))?;
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
        self.db
            .fluent()
            .update()
            .in_col(SESSIONS_COLLECTION)
            .document_id(session_id.as_str())
            .parent(self.sessions_parent(org_id))
            .object(&serde_json::json!({
                "fanout_status": status.to_string(),
                "fanout_last_error": error,
                "fanout_report": fanout_report_to_json(&report),
                "artifacts": artifacts,
                "updated_at": now.to_rfc3339(),
            }))
            .execute::<()>()
            .await
            .map_err(|e| StoreError::Unavailable(e.to_string()))?;
        Ok(())
    }

    async fn create_adhoc_meeting(
        &self,
        org_id: &OrgId,
        owner_user_id: &UserId,
        source: &MeetingRecord,
        now: DateTime<Utc>,
    ) -> Result<MeetingId, StoreError> {
        let meeting_id = MeetingId::from(format!("adhoc-{}-{}", source.meeting_id.as_str(), now.timestamp_millis()));
        self.db
            .fluent()
            .insert()
            .into(self.meetings_collection_id.as_str())
            .document_id(meeting_id.as_str())
            .parent(self.org_parent(org_id))
            .object(&serde_json::json!({
                "user_id": owner_user_id.as_str(),
                "join_url": source.join_url,
                "start": source.start.to_rfc3339(),
                "end": source.end.map(|e| e.to_rfc3339()),
                "status": "processing",
                "session_id": source.session_id.as_ref().map(|s| s.as_str()),
            }))
            .execute::<()>()
            .await
            .map_err(|e| StoreError::Unavailable(e.to_string()))?;
        Ok(meeting_id)
    }

    async fn acquire_or_renew_lease(
        &self,
        candidate_id: &str,
        now: DateTime<Utc>,
    ) -> Result<LeaseOutcome, StoreError> {
        let existing: Option<serde_json::Value> = self
            .db
            .fluent()
            .select()
            .by_id_in(LEASE_DOCUMENT_PATH)
            .obj()
            .one("current")
            .await
            .map_err(|e| StoreError::Unavailable(e.to_string()))?;

        let lease = match existing.map(parse_lease).transpose()? {
            None => LeaderLease::new(candidate_id.to_string(), now),
            Some(mut lease) if lease.is_expired(now) => {
                lease.leader_id = candidate_id.to_string();
                lease.renew(now);
                lease
            }
            Some(mut lease) if lease.leader_id == candidate_id => {
                lease.renew(now);
                lease
            }
            Some(lease) => return Ok(LeaseOutcome::HeldByOther(lease)),
        };

        self.db
            .fluent()
            .update()
            .in_col(LEASE_DOCUMENT_PATH)
            .document_id("current")
            .object(&serde_json::json!({
                "leader_id": lease.leader_id,
                "lease_expires_at": lease.lease_expires_at.to_rfc3339(),
                "last_renewed_at": lease.last_renewed_at.to_rfc3339(),
            }))
            .execute::<()>()
            .await
            .map_err(|e| StoreError::Unavailable(e.to_string()))?;

        Ok(LeaseOutcome::Acquired(lease))
    }
}

fn union_meeting_documents(
    a: Vec<serde_json::Value>,
    b: Vec<serde_json::Value>,
) -> Result<Vec<MeetingRecord>, StoreError> {
    let mut by_id = std::collections::BTreeMap::new();
    for raw in a.into_iter().chain(b) {
        if let Some(id) = raw.get("__id__").and_then(|v| v.as_str()) {
            by_id.entry(id.to_string()).or_insert(raw);
        }
    }
    by_id
        .into_iter()
        .map(|(id, raw)| {
            let org_id = raw
                .get("organization_id")
                .and_then(|v| v.as_str())
                .map(OrgId::from)
                .unwrap_or_else(|| OrgId::from(""));
            MeetingRecord::from_raw(org_id, MeetingId::from(id), &raw).map_err(StoreError::from)
        })
        .collect()
}

fn by_raw_meeting_docs(docs: Vec<serde_json::Value>) -> Result<Vec<MeetingRecord>, StoreError> {
    docs.into_iter()
        .map(|raw| {
            let org_id = raw
                .get("organization_id")
                .and_then(|v| v.as_str())
                .map(OrgId::from)
                .unwrap_or_else(|| OrgId::from(""));
            let meeting_id = raw
                .get("__id__")
                .and_then(|v| v.as_str())
                .map(MeetingId::from)
                .unwrap_or_else(|| MeetingId::from(""));
            MeetingRecord::from_raw(org_id, meeting_id, &raw).map_err(StoreError::from)
        })
        .collect()
}

fn parse_session(raw: serde_json::Value) -> Result<MeetingSession, StoreError> {
    serde_json::from_value(raw).map_err(|e| StoreError::Unavailable(e.to_string()))
}

fn parse_subscriber(raw: serde_json::Value) -> Result<Subscriber, StoreError> {
    serde_json::from_value(raw).map_err(|e| StoreError::Unavailable(e.to_string()))
}

fn parse_lease(raw: serde_json::Value) -> Result<LeaderLease, StoreError> {
    let leader_id = raw
        .get("leader_id")
        .and_then(|v| v.as_str())
        .ok_or_else(|| StoreError::Unavailable("lease document missing leader_id".to_string()))?
        .to_string();
    let lease_expires_at = raw
        .get("lease_expires_at")
        .and_then(|v| v.as_str())
        .and_then(|s| DateTime::parse_from_rfc3339(s).ok())
        .map(|dt| dt.with_timezone(&Utc))
        .ok_or_else(|| StoreError::Unavailable("lease document missing lease_expires_at".to_string()))?;
    let last_renewed_at = raw
        .get("last_renewed_at")
        .and_then(|v| v.as_str())
        .and_then(|s| DateTime::parse_from_rfc3339(s).ok())
        .map(|dt| dt.with_timezone(&Utc))
        .unwrap_or(lease_expires_at);
    Ok(LeaderLease { leader_id, lease_expires_at, last_renewed_at })
}

fn session_to_json(session: &MeetingSession) -> serde_json::Value {
    serde_json::json!({
        "status": session.status.to_string(),
        "claim": session.claim.as_ref().map(|c| serde_json::json!({
            "claimed_by": c.claimed_by,
            "claimed_at": c.claimed_at.to_rfc3339(),
            "claim_expires_at": c.claim_expires_at.to_rfc3339(),
        })),
        "updated_at": session.updated_at.to_rfc3339(),
    })
}

fn subscriber_to_json(subscriber: &Subscriber) -> serde_json::Value {
    serde_json::json!({
        "user_id": subscriber.user_id.as_str(),
        "meeting_id": subscriber.meeting_id.as_str(),
        "status": subscriber.status.to_string(),
        "added_via": subscriber.added_via.to_string(),
        "artifact_count": subscriber.artifact_count,
        "requested_at": subscriber.requested_at.to_rfc3339(),
        "updated_at": subscriber.updated_at.to_rfc3339(),
    })
}

fn fanout_report_to_json(report: &FanoutReport) -> serde_json::Value {
    serde_json::json!(report
        .subscribers
        .iter()
        .map(|s| serde_json::json!({
            "user_id": s.user_id.as_str(),
            "ok": s.ok,
            "error": s.error,
        }))
        .collect::<Vec<_>>())
}
