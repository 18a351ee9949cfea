// Copyright (c) 2025 - Cowboy AI, Inc.
//! Projection catch-up coordinator
//!
//! Waits until a projection has processed every event that existed when the
//! wait began:
//!
//! 1. resolve the registered shard for the requested kind (and name)
//! 2. read the store watermark `S` once
//! 3. succeed immediately if any database has progress `>= S`
//! 4. start the daemons that are not running
//! 5. poll progress; between polls wait (bounded) for the shard to run and
//!    to reach `S`
//! 6. give up after the attempt budget with a [`CatchUpReport`]
//!
//! The coordinator never writes progress.

use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use futures::future::join_all;
use tracing::{debug, info, warn};

use crate::config::CatchUpConfig;
use crate::errors::HelpdeskError;
use crate::event_store::EventStore;

use super::host::ProjectionHost;
use super::registry::ProjectionRegistry;
use super::{DatabaseId, ProjectionKind, ShardName};

/// Successful catch-up
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CaughtUp {
    pub shard: ShardName,

    /// Store watermark the projection reached
    pub watermark: u64,

    /// Wait attempts used (0 when it was already caught up)
    pub attempts: u32,
}

#[derive(Debug, thiserror::Error)]
pub enum CatchUpError {
    /// No projection of this kind (and name) is registered
    #[error("No projection of kind {kind}{} is registered", named(.name))]
    UnknownProjection {
        kind: ProjectionKind,
        name: Option<String>,
    },

    /// Attempt budget spent before the projection caught up
    #[error("{0}")]
    Exhausted(CatchUpReport),

    #[error(transparent)]
    Store(#[from] HelpdeskError),
}

fn named(name: &Option<String>) -> String {
    name.as_ref()
        .map(|n| format!(" named {n}"))
        .unwrap_or_default()
}

/// State of one shard at the time the coordinator gave up
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ShardReport {
    pub database: DatabaseId,
    pub shard: ShardName,
    pub sequence: u64,
    pub running: bool,
    pub last_error: Option<String>,
}

/// Diagnostic for an exhausted catch-up
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CatchUpReport {
    pub kind: ProjectionKind,
    pub shard: ShardName,
    pub watermark: u64,
    pub attempts: u32,

    /// Every recorded progress across databases, plus shards that are
    /// running or failed without committing; empty when nothing started
    pub shards: Vec<ShardReport>,
}

impl fmt::Display for CatchUpReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(
            f,
            "It took too long to synchronise the projection {} {} to event sequence {}.",
            self.kind, self.shard.projection_name, self.watermark
        )?;

        if self.shards.is_empty() {
            return write!(
                f,
                "The Daemon found NO projections yet. This could be because it took too long to restart."
            );
        }

        write!(f, "The Daemon found the following projections:")?;
        for shard in &self.shards {
            write!(
                f,
                "\nProjection {} = {} (database: {}, running: {}",
                shard.shard, shard.sequence, shard.database, shard.running
            )?;
            if let Some(error) = &shard.last_error {
                write!(f, ", last error: {}", error)?;
            }
            write!(f, ")")?;
        }
        Ok(())
    }
}

pub struct CatchUpCoordinator {
    store: Arc<dyn EventStore>,
    registry: Arc<ProjectionRegistry>,
    host: Arc<ProjectionHost>,
    config: CatchUpConfig,
}

impl CatchUpCoordinator {
    pub fn new(
        store: Arc<dyn EventStore>,
        registry: Arc<ProjectionRegistry>,
        host: Arc<ProjectionHost>,
        config: CatchUpConfig,
    ) -> Self {
        Self {
            store,
            registry,
            host,
            config,
        }
    }

    /// Wait until the projection of `kind` (and `name`, when given) has
    /// processed every event present now
    ///
    /// `timeout` caps the number of attempts at
    /// `ceil(timeout / attempt_timeout)`, never below one and never above
    /// `max_attempts`.
    pub async fn wait_for_projection(
        &self,
        kind: ProjectionKind,
        name: Option<&str>,
        timeout: Option<Duration>,
    ) -> Result<CaughtUp, CatchUpError> {
        let projection =
            self.registry
                .find(kind, name)
                .ok_or_else(|| CatchUpError::UnknownProjection {
                    kind,
                    name: name.map(str::to_string),
                })?;
        let shard = projection.shard_name();

        let watermark = self.store.current_global_sequence().await?;
        let max_attempts = self.attempt_budget(timeout);

        if self.is_caught_up(&shard, watermark).await? {
            debug!(shard = %shard, watermark, "Projection already caught up");
            return Ok(CaughtUp {
                shard,
                watermark,
                attempts: 0,
            });
        }

        for daemon in self.host.daemons() {
            if !daemon.is_running().await {
                info!(database = %daemon.database(), "Starting projection daemon to catch up");
                daemon.start_all().await?;
            }
        }

        let attempt_timeout = self.config.attempt_timeout();
        let mut attempts = 0;

        loop {
            if self.is_caught_up(&shard, watermark).await? {
                return Ok(CaughtUp {
                    shard,
                    watermark,
                    attempts,
                });
            }
            if attempts >= max_attempts {
                break;
            }
            attempts += 1;

            debug!(shard = %shard, watermark, attempt = attempts, "Waiting for projection");

            join_all(self.host.daemons().map(|daemon| {
                let shard = &shard;
                async move {
                    daemon.wait_for_shard_running(shard, attempt_timeout).await;
                    daemon
                        .wait_for_shard_sequence(shard, watermark, attempt_timeout)
                        .await;
                }
            }))
            .await;
        }

        let report = self.report(kind, shard, watermark, attempts).await?;
        warn!(attempts, "{}", report);
        Err(CatchUpError::Exhausted(report))
    }

    fn attempt_budget(&self, timeout: Option<Duration>) -> u32 {
        let max = self.config.max_attempts.max(1);
        let per_attempt = self.config.attempt_timeout().as_millis();

        match timeout {
            Some(timeout) if per_attempt > 0 => {
                let needed = timeout.as_millis().div_ceil(per_attempt);
                u32::try_from(needed).unwrap_or(u32::MAX).clamp(1, max)
            }
            _ => max,
        }
    }

    async fn is_caught_up(&self, shard: &ShardName, watermark: u64) -> Result<bool, CatchUpError> {
        if watermark == 0 {
            return Ok(true);
        }

        let progress = self.host.all_projection_progress().await?;
        Ok(progress
            .iter()
            .any(|p| &p.shard_name == shard && p.sequence >= watermark))
    }

    async fn report(
        &self,
        kind: ProjectionKind,
        shard: ShardName,
        watermark: u64,
        attempts: u32,
    ) -> Result<CatchUpReport, CatchUpError> {
        let mut shards = Vec::new();

        for daemon in self.host.daemons() {
            let progress = daemon.all_progress().await?;

            for row in &progress {
                let last_error = daemon
                    .shard_statuses()
                    .into_iter()
                    .find(|(name, _)| name == &row.shard_name)
                    .and_then(|(_, status)| status.last_error);

                shards.push(ShardReport {
                    database: row.database.clone(),
                    shard: row.shard_name.clone(),
                    sequence: row.sequence,
                    running: daemon.is_shard_running(&row.shard_name).await,
                    last_error,
                });
            }

            // Shards that never committed a batch have no progress row
            for (name, status) in daemon.shard_statuses() {
                if progress.iter().any(|p| p.shard_name == name) {
                    continue;
                }
                let running = daemon.is_shard_running(&name).await;
                if !running && !status.running && status.last_error.is_none() {
                    continue;
                }

                shards.push(ShardReport {
                    database: daemon.database().clone(),
                    shard: name,
                    sequence: 0,
                    running,
                    last_error: status.last_error,
                });
            }
        }

        Ok(CatchUpReport {
            kind,
            shard,
            watermark,
            attempts,
            shards,
        })
    }
}
