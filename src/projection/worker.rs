// Copyright (c) 2025 - Cowboy AI, Inc.
//! Shard worker
//!
//! Drains the global log for one projection shard in one database:
//!
//! ```text
//! loop {
//!     progress = storage.progress(shard)
//!     events   = store.read_all_from(progress, batch_events_max)
//!     documents = fold(events)
//!     storage.commit(documents, last sequence)     // atomic
//! }
//! ```
//!
//! A failing event aborts its whole batch: nothing is committed and the
//! worker retries the same batch after `error_backoff`.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use serde_json::Value;
use tokio::sync::{watch, Notify};
use tracing::{debug, error, info, warn};
use uuid::Uuid;

use crate::config::DaemonConfig;
use crate::errors::HelpdeskError;
use crate::event_store::EventStore;

use super::progress::{ProjectionBatch, ProjectionStorage};
use super::{AsyncProjection, DatabaseId, ProjectionError, ShardName};

/// Live state of a shard agent, published on a `watch` channel
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ShardStatus {
    /// An agent is processing this shard
    pub running: bool,

    /// Last committed sequence
    pub sequence: u64,

    /// Error of the last failed batch, cleared by the next successful one
    pub last_error: Option<String>,
}

/// Why a batch failed
#[derive(Debug, thiserror::Error)]
pub enum WorkerFailure {
    #[error(transparent)]
    Projection(#[from] ProjectionError),

    #[error(transparent)]
    Store(#[from] HelpdeskError),
}

/// A failed batch, attributed to the shard and the sequence it stopped at
#[derive(Debug, thiserror::Error)]
#[error("Shard {shard} failed at sequence {sequence}: {source}")]
pub struct WorkerError {
    pub shard: ShardName,
    pub sequence: u64,
    #[source]
    pub source: WorkerFailure,
}

/// Processes one projection shard of one database
pub struct ShardWorker {
    database: DatabaseId,
    shard: ShardName,
    projection: Arc<dyn AsyncProjection>,
    store: Arc<dyn EventStore>,
    storage: Arc<dyn ProjectionStorage>,
    config: DaemonConfig,
    status: Arc<watch::Sender<ShardStatus>>,
}

impl ShardWorker {
    pub fn new(
        projection: Arc<dyn AsyncProjection>,
        store: Arc<dyn EventStore>,
        storage: Arc<dyn ProjectionStorage>,
        config: DaemonConfig,
        status: Arc<watch::Sender<ShardStatus>>,
    ) -> Self {
        Self {
            database: storage.database().clone(),
            shard: projection.shard_name(),
            projection,
            store,
            storage,
            config,
            status,
        }
    }

    pub fn shard(&self) -> &ShardName {
        &self.shard
    }

    /// Process one batch
    ///
    /// Returns the number of events committed (0 when caught up).
    pub async fn run_once(&self) -> Result<usize, WorkerError> {
        let from = self
            .storage
            .progress(&self.shard)
            .await
            .map_err(|e| self.failure(0, e))?;

        let events = self
            .store
            .read_all_from(from, self.config.batch_events_max)
            .await
            .map_err(|e| self.failure(from, e))?;

        let Some(last) = events.last().map(|e| e.sequence) else {
            return Ok(0);
        };

        let mut documents: HashMap<Uuid, Value> = HashMap::new();
        for event in &events {
            let current = match documents.get(&event.stream_id) {
                Some(staged) => Some(staged.clone()),
                None => self
                    .storage
                    .load_document(&self.shard, event.stream_id)
                    .await
                    .map_err(|e| self.failure(event.sequence, e))?,
            };

            if let Some(document) = self
                .projection
                .apply(current, event)
                .map_err(|e| self.failure(event.sequence, e))?
            {
                documents.insert(event.stream_id, document);
            }
        }

        let document_count = documents.len();
        self.storage
            .commit(ProjectionBatch {
                shard: self.shard.clone(),
                sequence: last,
                documents,
            })
            .await
            .map_err(|e| self.failure(last, e))?;

        debug!(
            database = %self.database,
            shard = %self.shard,
            sequence = last,
            events = events.len(),
            documents = document_count,
            "Committed projection batch"
        );

        self.status.send_modify(|status| {
            status.sequence = last;
            status.last_error = None;
        });

        Ok(events.len())
    }

    /// Run until `stop` flips to `true` (or its sender is dropped)
    pub async fn run(self, mut stop: watch::Receiver<bool>) {
        let notify = self.store.append_notifier();

        let initial = match self.storage.progress(&self.shard).await {
            Ok(sequence) => sequence,
            Err(e) => {
                warn!(database = %self.database, shard = %self.shard, error = %e, "Failed to read shard progress");
                0
            }
        };
        self.status.send_modify(|status| {
            status.running = true;
            status.sequence = status.sequence.max(initial);
        });
        info!(database = %self.database, shard = %self.shard, sequence = initial, "Shard worker started");

        while !*stop.borrow() {
            let pause = match self.run_once().await {
                Ok(n) if n >= self.config.batch_events_max => continue,
                Ok(_) => self.config.poll_interval(),
                Err(e) => {
                    error!(
                        database = %self.database,
                        shard = %e.shard,
                        sequence = e.sequence,
                        error = %e.source,
                        "Projection batch failed"
                    );
                    self.status
                        .send_modify(|status| status.last_error = Some(e.to_string()));
                    self.config.error_backoff()
                }
            };

            tokio::select! {
                _ = wait_for_work(notify.as_deref(), pause) => {}
                changed = stop.changed() => {
                    if changed.is_err() {
                        break;
                    }
                }
            }
        }

        self.status.send_modify(|status| status.running = false);
        info!(database = %self.database, shard = %self.shard, "Shard worker stopped");
    }

    fn failure(&self, sequence: u64, source: impl Into<WorkerFailure>) -> WorkerError {
        WorkerError {
            shard: self.shard.clone(),
            sequence,
            source: source.into(),
        }
    }
}

async fn wait_for_work(notify: Option<&Notify>, pause: Duration) {
    match notify {
        Some(notify) => {
            tokio::select! {
                _ = notify.notified() => {}
                _ = tokio::time::sleep(pause) => {}
            }
        }
        None => tokio::time::sleep(pause).await,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::event_store::{InMemoryEventStore, StoredEvent};
    use crate::events::*;
    use crate::projection::{IncidentDetailsSnapshotProjection, InMemoryProjectionStorage};
    use chrono::Utc;

    struct FailingProjection;

    impl AsyncProjection for FailingProjection {
        fn kind(&self) -> crate::projection::ProjectionKind {
            crate::projection::ProjectionKind::new("Failing")
        }

        fn name(&self) -> &str {
            "Failing"
        }

        fn apply(
            &self,
            _current: Option<Value>,
            event: &StoredEvent,
        ) -> Result<Option<Value>, ProjectionError> {
            if event.sequence == 2 {
                return Err(ProjectionError::InvalidDocument("boom".to_string()));
            }
            Ok(Some(serde_json::json!({ "sequence": event.sequence })))
        }
    }

    fn logged(id: Uuid) -> IncidentEvent {
        IncidentEvent::IncidentLogged(IncidentLogged {
            incident_id: id,
            customer_id: Uuid::now_v7(),
            contact: Contact::via(ContactChannel::Email),
            description: "Mail bounced".to_string(),
            logged_by: Uuid::now_v7(),
            logged_at: Utc::now(),
        })
    }

    fn worker(
        projection: Arc<dyn AsyncProjection>,
        store: Arc<InMemoryEventStore>,
        storage: Arc<InMemoryProjectionStorage>,
        batch_events_max: usize,
    ) -> (ShardWorker, watch::Receiver<ShardStatus>) {
        let (tx, rx) = watch::channel(ShardStatus::default());
        let config = DaemonConfig {
            batch_events_max,
            ..DaemonConfig::default()
        };
        (
            ShardWorker::new(projection, store, storage, config, Arc::new(tx)),
            rx,
        )
    }

    #[tokio::test]
    async fn test_run_once_commits_in_batches() {
        let store = Arc::new(InMemoryEventStore::new());
        let storage = Arc::new(InMemoryProjectionStorage::new("default"));
        for _ in 0..3 {
            let id = Uuid::now_v7();
            store.append_events(id, vec![logged(id)], None).await.unwrap();
        }

        let projection = Arc::new(IncidentDetailsSnapshotProjection::new());
        let shard = projection.shard_name();
        let (worker, status) = worker(projection, store, storage.clone(), 2);

        assert_eq!(worker.run_once().await.unwrap(), 2);
        assert_eq!(storage.progress(&shard).await.unwrap(), 2);
        assert_eq!(status.borrow().sequence, 2);

        assert_eq!(worker.run_once().await.unwrap(), 1);
        assert_eq!(worker.run_once().await.unwrap(), 0);
        assert_eq!(storage.progress(&shard).await.unwrap(), 3);
        assert_eq!(storage.document_count(&shard).await, 3);
    }

    #[tokio::test]
    async fn test_failed_event_aborts_the_batch() {
        let store = Arc::new(InMemoryEventStore::new());
        let storage = Arc::new(InMemoryProjectionStorage::new("default"));
        for _ in 0..3 {
            let id = Uuid::now_v7();
            store.append_events(id, vec![logged(id)], None).await.unwrap();
        }

        let (worker, _status) = worker(Arc::new(FailingProjection), store, storage.clone(), 10);

        let err = worker.run_once().await.unwrap_err();

        assert_eq!(err.shard, ShardName::new("Failing"));
        assert_eq!(err.sequence, 2);
        assert!(matches!(err.source, WorkerFailure::Projection(_)));
        assert_eq!(storage.progress(&ShardName::new("Failing")).await.unwrap(), 0);
        assert_eq!(storage.document_count(&ShardName::new("Failing")).await, 0);
    }

    /// Storage that cannot be reached
    struct UnavailableStorage(DatabaseId);

    #[async_trait::async_trait]
    impl ProjectionStorage for UnavailableStorage {
        fn database(&self) -> &DatabaseId {
            &self.0
        }

        async fn load_document(
            &self,
            _shard: &ShardName,
            _id: Uuid,
        ) -> crate::errors::HelpdeskResult<Option<Value>> {
            Err(HelpdeskError::Storage("unavailable".to_string()))
        }

        async fn commit(&self, _batch: ProjectionBatch) -> crate::errors::HelpdeskResult<()> {
            Err(HelpdeskError::Storage("unavailable".to_string()))
        }

        async fn progress(&self, _shard: &ShardName) -> crate::errors::HelpdeskResult<u64> {
            Err(HelpdeskError::Storage("unavailable".to_string()))
        }

        async fn all_progress(
            &self,
        ) -> crate::errors::HelpdeskResult<Vec<crate::projection::ShardProgress>> {
            Err(HelpdeskError::Storage("unavailable".to_string()))
        }

        async fn reset_shard(&self, _shard: &ShardName) -> crate::errors::HelpdeskResult<()> {
            Err(HelpdeskError::Storage("unavailable".to_string()))
        }
    }

    #[tokio::test]
    async fn test_unreadable_progress_starts_from_zero_and_reports_error() {
        let (tx, mut rx) = watch::channel(ShardStatus::default());
        let worker = ShardWorker::new(
            Arc::new(IncidentDetailsSnapshotProjection::new()),
            Arc::new(InMemoryEventStore::new()),
            Arc::new(UnavailableStorage(DatabaseId::new("default"))),
            DaemonConfig {
                error_backoff_ms: 10,
                ..DaemonConfig::default()
            },
            Arc::new(tx),
        );
        let (stop, stop_rx) = watch::channel(false);
        let handle = tokio::spawn(worker.run(stop_rx));

        let status = tokio::time::timeout(
            Duration::from_secs(2),
            rx.wait_for(|s| s.last_error.is_some()),
        )
        .await
        .unwrap()
        .unwrap()
        .clone();

        assert!(status.running);
        assert_eq!(status.sequence, 0);
        assert!(status.last_error.unwrap().contains("unavailable"));

        stop.send(true).unwrap();
        handle.await.unwrap();
        assert!(!rx.borrow().running);
    }
}
