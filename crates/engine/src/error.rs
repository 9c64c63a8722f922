// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use thiserror::Error;

/// Errors that abort an entire poll cycle rather than being absorbed at the
/// per-item level. Per the error-handling design, nothing below this ever
/// crosses a poll-cycle boundary — callers of `run_cycle` log and continue.
#[derive(Debug, Error)]
pub enum EngineError {
    #[error("document store: {0}")]
    Store(#[from] mb_store::StoreError),
    #[error("orchestrator: {0}")]
    Orchestrator(#[from] mb_adapters::OrchestratorError),
    #[error("object store: {0}")]
    ObjectStore(#[from] mb_adapters::ObjectStoreError),
}
