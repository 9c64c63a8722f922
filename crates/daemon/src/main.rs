// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

#![cfg_attr(test, allow(clippy::unwrap_used))]

//! Meeting Bot Controller
//!
//! Control-plane process: discovers scheduled meetings, launches worker
//! Jobs, dedupes bot attendance, and fans out finished artifacts. See
//! `mb_engine::poll_loop` for the cooperative loop this binary drives.

use std::sync::Arc;

use mb_adapters::{GcsObjectStore, InMemoryObjectStore, InMemoryOrchestrator, KubernetesOrchestrator, ObjectStore, Orchestrator};
use mb_core::ControllerConfig;
use mb_engine::PollLoop;
use mb_store::{DocumentStore, FirestoreDocumentStore, InMemoryDocumentStore};
use tokio::signal::unix::{signal, SignalKind};
use tracing::{error, info};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

#[tokio::main]
async fn main() {
    setup_logging();

    let config = match ControllerConfig::from_env() {
        Ok(c) => c,
        Err(e) => {
            eprintln!("meeting-bot-controller: invalid configuration: {e}");
            std::process::exit(1);
        }
    };

    let candidate_id = candidate_id();
    info!(candidate_id, dry_run = config.dry_run, "meeting-bot-controller starting");

    let (store, orchestrator, object_store): (
        Arc<dyn DocumentStore>,
        Arc<dyn Orchestrator>,
        Arc<dyn ObjectStore>,
    ) = if config.dry_run {
        info!("dry run: using in-memory adapters, no Firestore/GCS/Kubernetes calls will be made");
        (
            Arc::new(InMemoryDocumentStore::default()),
            Arc::new(InMemoryOrchestrator::new()),
            Arc::new(InMemoryObjectStore::new()),
        )
    } else {
        match connect_adapters(&config).await {
            Ok(adapters) => adapters,
            Err(e) => {
                error!(error = %e, "failed to connect to backing services");
                std::process::exit(1);
            }
        }
    };

    let poll_loop = PollLoop::new(store, orchestrator, object_store, config, candidate_id);

    if let Err(e) = run_until_shutdown(poll_loop).await {
        error!(error = %e, "failed to install signal handlers");
        std::process::exit(1);
    }

    info!("meeting-bot-controller stopped");
}

async fn connect_adapters(
    config: &ControllerConfig,
) -> Result<(Arc<dyn DocumentStore>, Arc<dyn Orchestrator>, Arc<dyn ObjectStore>), Box<dyn std::error::Error>> {
    let store = FirestoreDocumentStore::connect_with_meetings_config(
        &config.gcp_project_id,
        &config.firestore_database,
        &config.meetings_collection_path,
        config.meetings_query_mode,
        &config.meeting_status_values,
    )
    .await?;
    let orchestrator = KubernetesOrchestrator::connect().await?;
    let object_store = GcsObjectStore::connect(config.gcs_bucket.clone()).await?;
    Ok((Arc::new(store), Arc::new(orchestrator), Arc::new(object_store)))
}

async fn run_until_shutdown(poll_loop: PollLoop) -> std::io::Result<()> {
    let mut sigterm = signal(SignalKind::terminate())?;
    let mut sigint = signal(SignalKind::interrupt())?;

    let shutdown = async move {
        tokio::select! {
            _ = sigterm.recv() => info!("received SIGTERM"),
            _ = sigint.recv() => info!("received SIGINT"),
        }
    };
    tokio::pin!(shutdown);

    poll_loop.run_forever(shutdown).await;
    Ok(())
}

/// Identity used for the leader lease. Kubernetes Deployments expose the pod
/// name via the downward API; fall back to a random id for local runs.
fn candidate_id() -> String {
    std::env::var("POD_NAME").unwrap_or_else(|_| nanoid::nanoid!(10))
}

fn setup_logging() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::registry().with(filter).with(fmt::layer()).init();
}

#[cfg(test)]
#[path = "main_tests.rs"]
mod tests;
