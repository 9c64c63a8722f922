// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! The Worker Job spec the job launcher hands to the container orchestrator.

use std::collections::BTreeMap;
use std::time::Duration;

use crate::ids::{JobName, MeetingId, OrgId, SessionId, UserId};
use crate::labels::JobLabels;

/// Hard runtime cap for a Worker Job: ~11h, matching a very long meeting plus
/// transcoding/upload headroom.
pub const JOB_ACTIVE_DEADLINE: Duration = Duration::from_secs(11 * 3600);

/// Post-completion TTL before the orchestrator garbage-collects the Job (and,
/// via cascading ownership, its scratch volume).
pub const JOB_TTL_AFTER_FINISHED: Duration = Duration::from_secs(3600);

/// Canonical object-store prefix for a `(user_id, meeting_id)` pair.
pub fn recordings_prefix(user_id: &UserId, meeting_id: &MeetingId) -> String {
    format!("recordings/{}/{}/", user_id.as_str(), meeting_id.as_str())
}

/// Resource requests/limits for the worker container. Deliberately coarse —
/// the worker does recording + transcoding, not interactive compute.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResourceLimits {
    pub cpu: String,
    pub memory: String,
}

impl Default for ResourceLimits {
    fn default() -> Self {
        Self { cpu: "2".to_string(), memory: "4Gi".to_string() }
    }
}

/// Fully resolved parameters for a single Worker Job. Built once by the job
/// launcher from the claimed session's canonical subscriber; never mutated
/// after.
#[derive(Debug, Clone)]
pub struct WorkerJobSpec {
    pub job_name: JobName,
    pub namespace: String,
    pub labels: JobLabels,
    pub manager_image: String,
    pub meeting_bot_image: String,
    pub service_account: Option<String>,
    pub resources: ResourceLimits,
    pub env: BTreeMap<String, String>,
}

/// Builder inputs for [`WorkerJobSpec::build`].
pub struct WorkerJobParams<'a> {
    pub org_id: &'a OrgId,
    pub session_id: &'a SessionId,
    pub normalized_url: &'a str,
    pub join_url: &'a str,
    pub canonical_user_id: &'a UserId,
    pub canonical_meeting_id: &'a MeetingId,
    pub namespace: String,
    pub manager_image: String,
    pub meeting_bot_image: String,
    pub service_account: Option<String>,
    pub display_name: String,
}

impl WorkerJobSpec {
    pub fn build(params: WorkerJobParams<'_>) -> Self {
        let labels = JobLabels::new(params.org_id, params.normalized_url);
        let job_name = job_name_for(&labels, params.session_id);
        let prefix = recordings_prefix(params.canonical_user_id, params.canonical_meeting_id);

        let mut env = BTreeMap::new();
        env.insert("MEETING_URL".to_string(), params.join_url.to_string());
        env.insert("MEETING_ID".to_string(), params.session_id.to_string());
        env.insert("ORG_ID".to_string(), params.org_id.to_string());
        env.insert("USER_ID".to_string(), params.canonical_user_id.to_string());
        env.insert("FS_MEETING_ID".to_string(), params.canonical_meeting_id.to_string());
        env.insert("GCS_PATH".to_string(), prefix);
        env.insert("MEETING_SESSION_ID".to_string(), params.session_id.to_string());
        env.insert("MANAGER_IMAGE".to_string(), params.manager_image.clone());
        env.insert("MEETING_BOT_IMAGE".to_string(), params.meeting_bot_image.clone());
        env.insert("MEETING_BOT_NAME".to_string(), params.display_name);

        Self {
            job_name,
            namespace: params.namespace,
            labels,
            manager_image: params.manager_image,
            meeting_bot_image: params.meeting_bot_image,
            service_account: params.service_account,
            resources: ResourceLimits::default(),
            env,
        }
    }

    /// Name of the per-job scratch volume, derived deterministically from the
    /// job name so a retried launch can find and recreate it.
    pub fn scratch_volume_name(&self) -> String {
        format!("{}-scratch", self.job_name.as_str())
    }
}

fn job_name_for(labels: &JobLabels, session_id: &SessionId) -> JobName {
    let suffix = &session_id.as_str()[..session_id.as_str().len().min(12)];
    JobName::from(crate::labels::sanitize_label_value(&format!(
        "meeting-bot-{}-{}",
        labels.url_hash, suffix
    )))
}

#[cfg(test)]
#[path = "job_spec_tests.rs"]
mod tests;
