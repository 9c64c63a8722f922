// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use thiserror::Error;

#[derive(Debug, Error)]
pub enum OrchestratorError {
    #[error("orchestrator api rejected the request: {0}")]
    ApiRejected(String),
    #[error("orchestrator unreachable: {0}")]
    Unavailable(String),
    #[error("job not found: {0}")]
    NotFound(String),
}

#[derive(Debug, Error)]
pub enum ObjectStoreError {
    #[error("object store unreachable: {0}")]
    Unavailable(String),
    #[error("blob not found: {0}")]
    NotFound(String),
}
