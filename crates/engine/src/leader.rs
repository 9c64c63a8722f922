// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! §4.A Leader Lease: only the elected leader runs §4.B–§4.F for a given
//! poll cycle. A `skip_leader_election` toggle lets single-node deployments
//! always act as leader.

use chrono::{DateTime, Utc};
use mb_store::{DocumentStore, LeaseOutcome};

use crate::error::EngineError;

/// Whether this cycle's caller should run the scheduling components. Wraps
/// [`DocumentStore::acquire_or_renew_lease`]; a document-store error here
/// forces the process to drop leadership pessimistically for the cycle.
pub async fn is_leader_this_cycle(
    store: &dyn DocumentStore,
    candidate_id: &str,
    skip_leader_election: bool,
    now: DateTime<Utc>,
) -> bool {
    if skip_leader_election {
        return true;
    }
    match acquire_or_renew(store, candidate_id, now).await {
        Ok(true) => true,
        Ok(false) => false,
        Err(e) => {
            tracing::error!(error = %e, "leader lease: document store unreachable, dropping leadership for this cycle");
            false
        }
    }
}

async fn acquire_or_renew(
    store: &dyn DocumentStore,
    candidate_id: &str,
    now: DateTime<Utc>,
) -> Result<bool, EngineError> {
    match store.acquire_or_renew_lease(candidate_id, now).await? {
        LeaseOutcome::Acquired(lease) => {
            tracing::info!(candidate_id, leader_id = %lease.leader_id, "leader lease: acquired");
            Ok(true)
        }
        LeaseOutcome::Renewed(_) => Ok(true),
        LeaseOutcome::HeldByOther(lease) => {
            tracing::debug!(candidate_id, leader_id = %lease.leader_id, "leader lease: held by another replica");
            Ok(false)
        }
    }
}

#[cfg(test)]
#[path = "leader_tests.rs"]
mod tests;
