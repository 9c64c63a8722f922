// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Single-writer leader election via a lease document, so that running more
//! than one controller replica for availability doesn't produce duplicate
//! claims or duplicate job launches.

use chrono::{DateTime, Duration, Utc};

/// How long a held lease is valid for before another replica may take over.
pub const LEASE_DURATION: Duration = Duration::seconds(30);

/// Renew comfortably before expiry so a GC pause or slow poll cycle doesn't
/// cost the lease.
pub const LEASE_RENEW_MARGIN: Duration = Duration::seconds(10);

/// State of the `controller/leader` lease document.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LeaderLease {
    pub leader_id: String,
    pub lease_expires_at: DateTime<Utc>,
    pub last_renewed_at: DateTime<Utc>,
}

impl LeaderLease {
    pub fn new(leader_id: String, now: DateTime<Utc>) -> Self {
        Self { leader_id, lease_expires_at: now + LEASE_DURATION, last_renewed_at: now }
    }

    pub fn is_expired(&self, now: DateTime<Utc>) -> bool {
        now >= self.lease_expires_at
    }

    pub fn is_held_by(&self, candidate_id: &str, now: DateTime<Utc>) -> bool {
        self.leader_id == candidate_id && !self.is_expired(now)
    }

    /// Whether `candidate_id` may take over: either the lease is expired, or
    /// it's already held by this candidate and due for renewal.
    pub fn may_acquire(&self, candidate_id: &str, now: DateTime<Utc>) -> bool {
        self.is_expired(now) || (self.leader_id == candidate_id && self.needs_renewal(now))
    }

    pub fn needs_renewal(&self, now: DateTime<Utc>) -> bool {
        self.lease_expires_at - now <= LEASE_RENEW_MARGIN
    }

    pub fn renew(&mut self, now: DateTime<Utc>) {
        self.lease_expires_at = now + LEASE_DURATION;
        self.last_renewed_at = now;
    }
}

#[cfg(test)]
#[path = "lease_tests.rs"]
mod tests;
