// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Process-wide configuration, read and validated once at startup.
//!
//! Per the design notes, poll interval, window, TTL, and the dedup-label
//! schema are not re-read at runtime — changing any of them requires a
//! restart, so all validation happens here rather than scattered through the
//! poll loop.

use std::collections::HashMap;
use std::time::Duration;

use crate::error::ConfigError;

/// How Discovery queries the meetings collection.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(test, derive(Hash))]
pub enum MeetingsQueryMode {
    Collection,
    CollectionGroup,
}

impl MeetingsQueryMode {
    fn parse(s: &str) -> Option<Self> {
        match s {
            "collection" => Some(Self::Collection),
            "collection_group" => Some(Self::CollectionGroup),
            _ => None,
        }
    }
}

impl Default for MeetingsQueryMode {
    fn default() -> Self {
        Self::Collection
    }
}

/// Default for `MEETINGS_COLLECTION_PATH`: a per-org subcollection, queried
/// as a collection group unless `meetings_query_mode` says otherwise.
pub fn default_meetings_collection_path() -> String {
    "organizations/{org_id}/meetings".to_string()
}

/// Default for `MEETING_STATUS_VALUES`: every status a meeting document can
/// carry, i.e. no filtering.
pub fn default_meeting_status_values() -> Vec<String> {
    ["scheduled", "queued", "processing", "complete", "failed", "cancelled", "merged"]
        .iter()
        .map(|s| s.to_string())
        .collect()
}

/// Fully validated controller configuration, built once in `main` and passed
/// by reference through the rest of the process.
#[derive(Debug, Clone)]
pub struct ControllerConfig {
    pub gcp_project_id: String,
    pub gcs_bucket: String,
    pub firestore_database: String,
    pub manager_image: String,
    pub meeting_bot_image: String,
    pub claim_ttl: Duration,
    pub max_claim_per_poll: u32,
    pub poll_interval: Duration,
    pub kubernetes_namespace: String,
    pub job_service_account: Option<String>,
    pub skip_leader_election: bool,
    pub meetings_collection_path: String,
    pub meetings_query_mode: MeetingsQueryMode,
    pub meeting_status_values: Vec<String>,
    pub dry_run: bool,
}

impl ControllerConfig {
    /// Read and validate configuration from the process environment. Any
    /// failure here is fatal and maps to exit code 1.
    pub fn from_env() -> Result<Self, ConfigError> {
        let vars: HashMap<String, String> = std::env::vars().collect();
        Self::from_map(&vars)
    }

    /// Testable core of [`Self::from_env`], decoupled from the real process
    /// environment.
    pub fn from_map(vars: &HashMap<String, String>) -> Result<Self, ConfigError> {
        let required = |name: &'static str| -> Result<String, ConfigError> {
            vars.get(name).filter(|v| !v.is_empty()).cloned().ok_or(ConfigError::MissingEnv(name))
        };
        let optional =
            |name: &'static str| -> Option<String> { vars.get(name).filter(|v| !v.is_empty()).cloned() };
        let parsed_u64 = |name: &'static str, default: u64| -> Result<u64, ConfigError> {
            match optional(name) {
                None => Ok(default),
                Some(raw) => raw
                    .parse()
                    .map_err(|_| ConfigError::InvalidEnv { name, value: raw }),
            }
        };
        let parsed_bool = |name: &'static str, default: bool| -> Result<bool, ConfigError> {
            match optional(name) {
                None => Ok(default),
                Some(raw) => match raw.to_ascii_lowercase().as_str() {
                    "1" | "true" | "yes" => Ok(true),
                    "0" | "false" | "no" => Ok(false),
                    _ => Err(ConfigError::InvalidEnv { name, value: raw }),
                },
            }
        };

        let meetings_query_mode = match optional("MEETINGS_QUERY_MODE") {
            None => MeetingsQueryMode::Collection,
            Some(raw) => MeetingsQueryMode::parse(&raw)
                .ok_or_else(|| ConfigError::InvalidEnv { name: "MEETINGS_QUERY_MODE", value: raw })?,
        };

        let meeting_status_values = optional("MEETING_STATUS_VALUES")
            .map(|raw| raw.split(',').map(|s| s.trim().to_string()).filter(|s| !s.is_empty()).collect())
            .unwrap_or_else(default_meeting_status_values);

        Ok(Self {
            gcp_project_id: required("GCP_PROJECT_ID")?,
            gcs_bucket: required("GCS_BUCKET")?,
            firestore_database: optional("FIRESTORE_DATABASE").unwrap_or_else(|| "(default)".to_string()),
            manager_image: required("MANAGER_IMAGE")?,
            meeting_bot_image: required("MEETING_BOT_IMAGE")?,
            claim_ttl: Duration::from_secs(parsed_u64("CLAIM_TTL_SECONDS", 600)?),
            max_claim_per_poll: parsed_u64("MAX_CLAIM_PER_POLL", 10)? as u32,
            poll_interval: Duration::from_secs(parsed_u64("POLL_INTERVAL", 10)?),
            kubernetes_namespace: optional("KUBERNETES_NAMESPACE").unwrap_or_else(|| "default".to_string()),
            job_service_account: optional("JOB_SERVICE_ACCOUNT"),
            skip_leader_election: parsed_bool("SKIP_LEADER_ELECTION", false)?,
            meetings_collection_path: optional("MEETINGS_COLLECTION_PATH")
                .unwrap_or_else(default_meetings_collection_path),
            meetings_query_mode,
            meeting_status_values,
            dry_run: parsed_bool("DRY_RUN", false)?,
        })
    }
}

#[cfg(test)]
#[path = "config_tests.rs"]
mod tests;
