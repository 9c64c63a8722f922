// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Ties §4.A–§4.F together into the single cooperative poll loop described
//! in §5: one leader, sequential per-session work within a cycle, no hard
//! deadline but a structured warning if a cycle runs past twice the poll
//! interval.

use std::future::Future;
use std::sync::Arc;
use std::time::Instant;

use chrono::{DateTime, Utc};
use mb_adapters::{ObjectStore, Orchestrator};
use mb_core::ControllerConfig;
use mb_store::DocumentStore;

use crate::error::EngineError;
use crate::{discovery, fanout, job_launcher, leader, lifecycle, session_coordinator};

pub struct PollLoop {
    store: Arc<dyn DocumentStore>,
    orchestrator: Arc<dyn Orchestrator>,
    object_store: Arc<dyn ObjectStore>,
    config: ControllerConfig,
    candidate_id: String,
}

impl PollLoop {
    pub fn new(
        store: Arc<dyn DocumentStore>,
        orchestrator: Arc<dyn Orchestrator>,
        object_store: Arc<dyn ObjectStore>,
        config: ControllerConfig,
        candidate_id: String,
    ) -> Self {
        Self { store, orchestrator, object_store, config, candidate_id }
    }

    /// Run the poll loop until `shutdown` resolves. The current cycle always
    /// runs to completion before the loop exits — no long transaction is
    /// ever interrupted.
    pub async fn run_forever(&self, mut shutdown: impl Future<Output = ()> + Unpin) {
        let mut ticker = tokio::time::interval(self.config.poll_interval);
        loop {
            tokio::select! {
                _ = ticker.tick() => {
                    self.run_cycle(Utc::now()).await;
                }
                _ = &mut shutdown => {
                    tracing::info!("poll loop: shutdown signal received, exiting after current cycle");
                    break;
                }
            }
        }
    }

    pub async fn run_cycle(&self, now: DateTime<Utc>) {
        let started = Instant::now();

        let is_leader = leader::is_leader_this_cycle(
            self.store.as_ref(),
            &self.candidate_id,
            self.config.skip_leader_election,
            now,
        )
        .await;
        if !is_leader {
            return;
        }

        if let Err(e) = self.run_scheduling(now).await {
            tracing::error!(error = %e, "poll loop: cycle failed, will retry next cycle");
        }

        let elapsed = started.elapsed();
        if elapsed > self.config.poll_interval * 2 {
            tracing::warn!(
                elapsed_ms = elapsed.as_millis() as u64,
                poll_interval_ms = self.config.poll_interval.as_millis() as u64,
                "poll loop: cycle exceeded twice the poll interval"
            );
        }
    }

    async fn run_scheduling(&self, now: DateTime<Utc>) -> Result<(), EngineError> {
        for candidate in discovery::scan_time_window(self.store.as_ref(), now).await? {
            let org_id = candidate.org_id.clone();
            let meeting_id = candidate.meeting.meeting_id.clone();
            if let Err(e) = session_coordinator::coordinate(
                self.store.as_ref(),
                self.orchestrator.as_ref(),
                &self.config.kubernetes_namespace,
                candidate,
                now,
            )
            .await
            {
                tracing::error!(org_id = %org_id, meeting_id = %meeting_id, error = %e, "poll loop: session coordination failed, skipping candidate");
            }
        }

        let mut queued = discovery::scan_queued_sessions(self.store.as_ref()).await?;
        queued.truncate(self.config.max_claim_per_poll as usize);
        for session in queued {
            let session_id = session.session_id.clone();
            if let Err(e) = job_launcher::claim_and_launch(
                self.store.as_ref(),
                self.orchestrator.as_ref(),
                &self.config,
                &self.candidate_id,
                &session,
                now,
            )
            .await
            {
                tracing::error!(session_id = %session_id, error = %e, "poll loop: job launch failed, skipping session");
            }
        }

        if let Err(e) =
            lifecycle::detect_orphans(self.store.as_ref(), self.orchestrator.as_ref(), &self.config.kubernetes_namespace, now)
                .await
        {
            tracing::error!(error = %e, "poll loop: orphan detection failed");
        }

        if let Err(e) = fanout::run(self.store.as_ref(), self.object_store.as_ref(), now).await {
            tracing::error!(error = %e, "poll loop: fanout failed");
        }

        Ok(())
    }
}

#[cfg(test)]
#[path = "poll_loop_tests.rs"]
mod tests;
