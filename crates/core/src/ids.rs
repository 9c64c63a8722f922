// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Opaque identifiers for document-store-assigned entities, plus the one
//! identifier the controller computes itself: [`SessionId`].

use sha2::{Digest, Sha256};

crate::opaque_id!(
    /// Tenant namespace. Opaque — assigned by the document store.
    pub struct OrgId;
);

crate::opaque_id!(
    /// A user within an [`OrgId`]. Opaque — assigned by the document store.
    pub struct UserId;
);

crate::opaque_id!(
    /// A meeting document id within an org's `meetings` collection.
    pub struct MeetingId;
);

crate::opaque_id!(
    /// Name of a Worker Job on the container orchestrator.
    pub struct JobName;
);

/// Deduplication identifier: `SHA256(org_id || ':' || normalize(url))`, hex.
///
/// Deterministic by construction — see [`SessionId::compute`]. Two meetings
/// in the same org with equivalent join URLs (mod case, tracking params,
/// trailing slash, fragment) always produce the same id; the same URL in a
/// different org never does (P3).
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, serde::Serialize, serde::Deserialize)]
#[serde(transparent)]
pub struct SessionId(pub String);

impl SessionId {
    /// `normalized_url` must already be the output of
    /// [`crate::url_normalize::normalize_meeting_url`] — this function does not
    /// normalize on your behalf, so callers don't accidentally hash twice with
    /// different normalization passes.
    pub fn compute(org_id: &OrgId, normalized_url: &str) -> Self {
        let mut hasher = Sha256::new();
        hasher.update(org_id.as_str().as_bytes());
        hasher.update(b":");
        hasher.update(normalized_url.as_bytes());
        Self(hex(&hasher.finalize()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for SessionId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for SessionId {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

impl From<String> for SessionId {
    fn from(s: String) -> Self {
        Self(s)
    }
}

/// 12-char org id hash for Kubernetes job labels (`H12` in the design doc).
pub fn org_id_hash(org_id: &OrgId) -> String {
    if org_id.as_str().is_empty() {
        return "no-org".to_string();
    }
    let mut hasher = Sha256::new();
    hasher.update(org_id.as_str().as_bytes());
    hex(&hasher.finalize())[..12].to_string()
}

/// 16-char normalized-url hash for Kubernetes job labels (`H16` in the design doc).
///
/// `normalized_url` must already be normalized, same caveat as [`SessionId::compute`].
pub fn url_hash(normalized_url: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(normalized_url.as_bytes());
    hex(&hasher.finalize())[..16].to_string()
}

fn hex(bytes: &[u8]) -> String {
    use std::fmt::Write;
    let mut s = String::with_capacity(bytes.len() * 2);
    for b in bytes {
        let _ = write!(s, "{:02x}", b);
    }
    s
}

#[cfg(test)]
#[path = "ids_tests.rs"]
mod tests;
