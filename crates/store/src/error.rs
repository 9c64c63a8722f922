// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use thiserror::Error;

/// Errors surfaced by a [`crate::DocumentStore`] implementation.
///
/// Per the error-handling design, `Unavailable` is the only variant callers
/// treat as transient (log, skip, retry next cycle); everything else is a
/// logic error in the caller or a genuine data problem.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("document store unavailable: {0}")]
    Unavailable(String),
    #[error("document not found")]
    NotFound,
    #[error("transaction precondition failed: {0}")]
    PreconditionFailed(String),
    #[error("malformed document: {0}")]
    Malformed(#[from] mb_core::MeetingParseError),
}
