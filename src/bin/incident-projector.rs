// Copyright (c) 2025 - Cowboy AI, Inc.
//! Incident Projector Service
//!
//! Runs the asynchronous incident snapshot projection against the NATS
//! JetStream event store:
//! - Events → JetStream → ShardWorker → IncidentDetailsSnapshot documents
//!
//! One projection daemon is started per configured database.
//!
//! Run with: cargo run --bin incident-projector
//!
//! Environment:
//! - HELPDESK_NATS_URL (default: nats://localhost:4222)
//! - HELPDESK_DATABASES (default: default)
//! - RUST_LOG (default: info)

use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use helpdesk_incidents::{
    event_store::{EventStore, NatsEventStore},
    projection::{
        IncidentDetailsSnapshotProjection, InMemoryProjectionStorage, ProjectionDaemon,
        ProjectionHost, ProjectionRegistry,
    },
    HelpdeskConfig,
};
use tracing::{info, warn};

const PROGRESS_LOG_INTERVAL: Duration = Duration::from_secs(30);

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    info!("Starting incident projector");

    let config = HelpdeskConfig::from_env().context("Invalid configuration")?;
    info!(
        servers = ?config.nats.servers,
        databases = ?config.databases,
        batch_events_max = config.daemon.batch_events_max,
        "Configuration loaded"
    );

    let store: Arc<dyn EventStore> = Arc::new(
        NatsEventStore::connect(&config.nats)
            .await
            .context("Failed to connect to the NATS event store")?,
    );

    let mut registry = ProjectionRegistry::new();
    registry
        .register(Arc::new(IncidentDetailsSnapshotProjection::new()))
        .context("Failed to register projections")?;
    let registry = Arc::new(registry);

    let mut host = ProjectionHost::new();
    for database in &config.databases {
        host.add_daemon(ProjectionDaemon::new(
            store.clone(),
            Arc::new(InMemoryProjectionStorage::new(database.as_str())),
            registry.clone(),
            config.daemon.clone(),
        ))
        .with_context(|| format!("Failed to create daemon for database {database}"))?;
    }

    host.start_all()
        .await
        .context("Failed to start projection daemons")?;
    info!("Projection daemons started; press Ctrl-C to stop");

    let mut ticker = tokio::time::interval(PROGRESS_LOG_INTERVAL);
    loop {
        tokio::select! {
            _ = ticker.tick() => log_progress(&host, store.as_ref()).await,
            signal = tokio::signal::ctrl_c() => {
                if let Err(e) = signal {
                    warn!(error = %e, "Failed to listen for Ctrl-C");
                }
                break;
            }
        }
    }

    info!("Stopping projection daemons");
    host.stop_all().await;
    info!("Incident projector stopped");

    Ok(())
}

async fn log_progress(host: &ProjectionHost, store: &dyn EventStore) {
    let watermark = match store.current_global_sequence().await {
        Ok(watermark) => watermark,
        Err(e) => {
            warn!(error = %e, "Failed to read event store watermark");
            return;
        }
    };

    match host.all_projection_progress().await {
        Ok(progress) => {
            for p in progress {
                info!(
                    database = %p.database,
                    shard = %p.shard_name,
                    sequence = p.sequence,
                    lag = watermark.saturating_sub(p.sequence),
                    "Projection progress"
                );
            }
        }
        Err(e) => warn!(error = %e, "Failed to read projection progress"),
    }
}
