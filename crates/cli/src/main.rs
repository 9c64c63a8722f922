// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::panic))]

//! mbctl: operator tooling for the Meeting Bot Controller.
//!
//! Thin client over the same `DocumentStore`/`ObjectStore` adapters the
//! daemon uses — every subcommand here is something an on-call engineer
//! would otherwise reach for a one-off script to do: inspect a session that
//! didn't fan out, see what's stuck pending fanout, or force a retrigger.

mod commands;

use clap::{Parser, Subcommand};
use mb_adapters::GcsObjectStore;
use mb_store::FirestoreDocumentStore;

#[derive(Parser)]
#[command(name = "mbctl")]
#[command(author, version, about = "Operator tooling for the Meeting Bot Controller", long_about = None)]
struct Cli {
    /// GCP project id.
    #[arg(long, global = true)]
    project: String,

    /// Firestore database id.
    #[arg(long, global = true, default_value = "(default)")]
    firestore_database: String,

    /// GCS bucket holding recordings and transcripts.
    #[arg(long, global = true)]
    bucket: String,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Print a session's document, subscribers, and GCS artifact listing.
    InspectSession {
        #[arg(long)]
        org_id: String,
        #[arg(long)]
        session_id: String,
    },

    /// List sessions in this org that are complete but have not fanned out.
    ScanPendingFanout {
        #[arg(long)]
        org_id: String,
    },

    /// Manually retrigger §4.F.1 fanout for one session.
    TriggerFanout {
        #[arg(long)]
        org_id: String,
        #[arg(long)]
        session_id: String,
        /// Re-run even if fanout_status is already complete.
        #[arg(long)]
        force: bool,
        /// Print what would happen without writing anything.
        #[arg(long)]
        dry_run: bool,
    },
}

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt().with_env_filter(tracing_subscriber::EnvFilter::new("warn")).init();

    let cli = Cli::parse();

    let store = match FirestoreDocumentStore::connect(&cli.project, &cli.firestore_database).await {
        Ok(s) => s,
        Err(e) => {
            eprintln!("mbctl: could not connect to Firestore: {e}");
            std::process::exit(1);
        }
    };
    let object_store = match GcsObjectStore::connect(cli.bucket.clone()).await {
        Ok(s) => s,
        Err(e) => {
            eprintln!("mbctl: could not connect to GCS: {e}");
            std::process::exit(1);
        }
    };

    let result = match cli.command {
        Commands::InspectSession { org_id, session_id } => {
            commands::inspect_session(&store, &object_store, &org_id, &session_id, &cli.bucket).await
        }
        Commands::ScanPendingFanout { org_id } => commands::scan_pending_fanout(&store, &org_id).await,
        Commands::TriggerFanout { org_id, session_id, force, dry_run } => {
            commands::trigger_fanout(&store, &object_store, &org_id, &session_id, force, dry_run).await
        }
    };

    if let Err(e) = result {
        eprintln!("mbctl: {e}");
        std::process::exit(1);
    }
}
