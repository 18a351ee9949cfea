// Copyright (c) 2025 - Cowboy AI, Inc.
//! Projection daemon
//!
//! One daemon per database. It owns at most one agent (a spawned
//! [`ShardWorker`]) per registered shard; starting a shard whose agent is
//! alive does nothing, so a shard is never processed twice concurrently.
//!
//! Each shard has a `watch` channel of [`ShardStatus`] created with the
//! daemon, so callers can wait for a shard before its agent exists.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use tokio::sync::{watch, Mutex};
use tokio::task::JoinHandle;
use tracing::{info, warn};

use crate::config::DaemonConfig;
use crate::errors::{HelpdeskError, HelpdeskResult};
use crate::event_store::EventStore;

use super::progress::{ProjectionStorage, ShardProgress};
use super::registry::ProjectionRegistry;
use super::worker::{ShardStatus, ShardWorker};
use super::{DatabaseId, ShardName};

/// Result of a bounded wait
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WaitOutcome {
    Reached,
    TimedOut,
}

struct Agent {
    stop: watch::Sender<bool>,
    handle: JoinHandle<()>,
}

impl Agent {
    fn is_alive(&self) -> bool {
        !self.handle.is_finished()
    }
}

pub struct ProjectionDaemon {
    database: DatabaseId,
    store: Arc<dyn EventStore>,
    storage: Arc<dyn ProjectionStorage>,
    registry: Arc<ProjectionRegistry>,
    config: DaemonConfig,
    statuses: HashMap<ShardName, Arc<watch::Sender<ShardStatus>>>,
    agents: Mutex<HashMap<ShardName, Agent>>,
}

impl ProjectionDaemon {
    pub fn new(
        store: Arc<dyn EventStore>,
        storage: Arc<dyn ProjectionStorage>,
        registry: Arc<ProjectionRegistry>,
        config: DaemonConfig,
    ) -> Self {
        let statuses = registry
            .all_shards()
            .into_iter()
            .map(|shard| {
                let (tx, _rx) = watch::channel(ShardStatus::default());
                (shard, Arc::new(tx))
            })
            .collect();

        Self {
            database: storage.database().clone(),
            store,
            storage,
            registry,
            config,
            statuses,
            agents: Mutex::new(HashMap::new()),
        }
    }

    pub fn database(&self) -> &DatabaseId {
        &self.database
    }

    pub fn storage(&self) -> &Arc<dyn ProjectionStorage> {
        &self.storage
    }

    /// Start an agent for every registered shard that has none running
    pub async fn start_all(&self) -> HelpdeskResult<()> {
        for shard in self.registry.all_shards() {
            self.start_shard(&shard).await?;
        }
        Ok(())
    }

    /// Start the agent of one shard; no-op while it is alive
    ///
    /// # Errors
    ///
    /// - `Configuration` if the shard is not registered
    pub async fn start_shard(&self, shard: &ShardName) -> HelpdeskResult<()> {
        let (projection, status) = match (self.registry.get(shard), self.statuses.get(shard)) {
            (Some(projection), Some(status)) => (projection, status.clone()),
            _ => {
                return Err(HelpdeskError::Configuration(format!(
                    "Projection shard {} is not registered",
                    shard
                )))
            }
        };

        let mut agents = self.agents.lock().await;
        if agents.get(shard).is_some_and(Agent::is_alive) {
            return Ok(());
        }

        status.send_modify(|s| s.running = true);

        let worker = ShardWorker::new(
            projection,
            self.store.clone(),
            self.storage.clone(),
            self.config.clone(),
            status,
        );
        let (stop, stop_rx) = watch::channel(false);
        let handle = tokio::spawn(worker.run(stop_rx));

        info!(database = %self.database, shard = %shard, "Started projection agent");
        agents.insert(shard.clone(), Agent { stop, handle });

        Ok(())
    }

    /// Stop every agent and wait for it to finish its current batch
    pub async fn stop_all(&self) {
        let agents: Vec<(ShardName, Agent)> = self.agents.lock().await.drain().collect();

        for (shard, agent) in agents {
            self.stop_agent(&shard, agent).await;
        }
    }

    /// Stop one shard's agent, if any
    pub async fn stop_shard(&self, shard: &ShardName) {
        let agent = self.agents.lock().await.remove(shard);
        if let Some(agent) = agent {
            self.stop_agent(shard, agent).await;
        }
    }

    async fn stop_agent(&self, shard: &ShardName, agent: Agent) {
        let _ = agent.stop.send(true);
        if let Err(e) = agent.handle.await {
            warn!(database = %self.database, shard = %shard, error = %e, "Projection agent ended abnormally");
        }
        if let Some(status) = self.statuses.get(shard) {
            status.send_modify(|s| s.running = false);
        }
        info!(database = %self.database, shard = %shard, "Stopped projection agent");
    }

    /// Every registered shard has a live agent
    pub async fn is_running(&self) -> bool {
        let agents = self.agents.lock().await;
        !self.statuses.is_empty()
            && self
                .statuses
                .keys()
                .all(|shard| agents.get(shard).is_some_and(Agent::is_alive))
    }

    pub async fn is_shard_running(&self, shard: &ShardName) -> bool {
        self.agents
            .lock()
            .await
            .get(shard)
            .is_some_and(Agent::is_alive)
    }

    /// Wait until the shard's agent reports running
    ///
    /// Never fails: an unknown shard or an expired timeout is `TimedOut`.
    pub async fn wait_for_shard_running(&self, shard: &ShardName, timeout: Duration) -> WaitOutcome {
        self.wait_for_status(shard, timeout, |s| s.running).await
    }

    /// Wait until the shard's committed sequence reaches `sequence`
    pub async fn wait_for_shard_sequence(
        &self,
        shard: &ShardName,
        sequence: u64,
        timeout: Duration,
    ) -> WaitOutcome {
        self.wait_for_status(shard, timeout, |s| s.sequence >= sequence)
            .await
    }

    async fn wait_for_status<F>(&self, shard: &ShardName, timeout: Duration, predicate: F) -> WaitOutcome
    where
        F: FnMut(&ShardStatus) -> bool,
    {
        let Some(status) = self.statuses.get(shard) else {
            return WaitOutcome::TimedOut;
        };
        let mut rx = status.subscribe();

        let reached = matches!(
            tokio::time::timeout(timeout, rx.wait_for(predicate)).await,
            Ok(Ok(_))
        );
        if reached {
            WaitOutcome::Reached
        } else {
            WaitOutcome::TimedOut
        }
    }

    /// Current status of every registered shard
    pub fn shard_statuses(&self) -> Vec<(ShardName, ShardStatus)> {
        let mut statuses: Vec<_> = self
            .statuses
            .iter()
            .map(|(shard, status)| (shard.clone(), status.borrow().clone()))
            .collect();
        statuses.sort_by_key(|(shard, _)| shard.identity());
        statuses
    }

    /// Recorded progress of every shard in this database
    pub async fn all_progress(&self) -> HelpdeskResult<Vec<ShardProgress>> {
        self.storage.all_progress().await
    }

    /// Drop a shard's documents and progress and replay it from the first event
    ///
    /// The agent is restarted if it was running.
    pub async fn rebuild_shard(&self, shard: &ShardName) -> HelpdeskResult<()> {
        let Some(status) = self.statuses.get(shard) else {
            return Err(HelpdeskError::Configuration(format!(
                "Projection shard {} is not registered",
                shard
            )));
        };

        let was_running = self.is_shard_running(shard).await;
        self.stop_shard(shard).await;

        self.storage.reset_shard(shard).await?;
        status.send_modify(|s| {
            s.sequence = 0;
            s.last_error = None;
        });
        info!(database = %self.database, shard = %shard, "Reset projection shard for rebuild");

        if was_running {
            self.start_shard(shard).await?;
        }
        Ok(())
    }
}
