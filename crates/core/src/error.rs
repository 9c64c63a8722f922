// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Shared error types for parsing and configuration.

use thiserror::Error;

/// A required field was missing or unparseable on a raw document.
///
/// Per the error-handling design, this is never a hard failure: callers log
/// a structured diagnostic and skip the document rather than propagating it.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum MeetingParseError {
    #[error("no join url on meeting document (checked join_url, meeting_url, meetingUrl)")]
    MissingJoinUrl,
    #[error("no owner user id on meeting document")]
    MissingUserId,
    #[error("no organization id on meeting document")]
    MissingOrgId,
    #[error("start time field present but unparseable: {0}")]
    UnparseableStartTime(String),
}

/// Fatal initialization failure — maps to process exit code 1.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("missing required environment variable {0}")]
    MissingEnv(&'static str),
    #[error("invalid value for environment variable {name}: {value}")]
    InvalidEnv { name: &'static str, value: String },
}
