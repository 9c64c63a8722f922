// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! The object store surface: blob existence, listing, read, and
//! write-once-then-skip copy, scoped under `recordings/<user_id>/<meeting_id>/`.

use async_trait::async_trait;

use crate::error::ObjectStoreError;

/// The object store backing recorder/transcriber artifacts.
///
/// Implementations: [`crate::gcs::GcsObjectStore`] (production) and
/// [`crate::memory::InMemoryObjectStore`] (tests, dry-run).
#[async_trait]
pub trait ObjectStore: Send + Sync + 'static {
    /// List blob names directly under `prefix` (non-recursive is sufficient —
    /// the layout never nests beyond one level).
    async fn list(&self, prefix: &str) -> Result<Vec<String>, ObjectStoreError>;

    async fn exists(&self, path: &str) -> Result<bool, ObjectStoreError>;

    async fn read_to_string(&self, path: &str) -> Result<Option<String>, ObjectStoreError>;

    /// Copy `src` to `dst` unless `dst` already exists (fanout's idempotence
    /// guarantee — re-running copies zero additional blobs).
    async fn copy_if_absent(&self, src: &str, dst: &str) -> Result<bool, ObjectStoreError>;
}
