// Copyright (c) 2025 - Cowboy AI, Inc.
//! In-process event store
//!
//! Keeps the global log in a `Vec` behind a tokio `RwLock`; the index of an
//! event in the log is its global sequence minus one. Used by tests and by
//! embedded deployments that do not need durability.

use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::{Notify, RwLock};
use tracing::debug;
use uuid::Uuid;

use crate::errors::HelpdeskResult;
use crate::event_store::{check_expected_version, AppendResult, EventStore, StoredEvent};
use crate::events::IncidentEvent;

/// In-memory, append-only event store
#[derive(Default)]
pub struct InMemoryEventStore {
    log: RwLock<Vec<StoredEvent>>,
    appended: Arc<Notify>,
}

impl InMemoryEventStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl EventStore for InMemoryEventStore {
    async fn append_events(
        &self,
        stream_id: Uuid,
        events: Vec<IncidentEvent>,
        expected_version: Option<u64>,
    ) -> HelpdeskResult<AppendResult> {
        let mut log = self.log.write().await;

        let current_version = log
            .iter()
            .filter(|e| e.stream_id == stream_id)
            .map(|e| e.version)
            .max()
            .unwrap_or(0);
        check_expected_version(stream_id, current_version, expected_version)?;

        let mut result = AppendResult {
            version: current_version,
            sequence: log.len() as u64,
        };

        for event in events {
            result.version += 1;
            result.sequence += 1;

            let mut stored = StoredEvent::new(stream_id, result.version, event);
            stored.sequence = result.sequence;
            log.push(stored);
        }
        drop(log);

        debug!(
            stream_id = %stream_id,
            version = result.version,
            sequence = result.sequence,
            "Appended events"
        );
        self.appended.notify_waiters();

        Ok(result)
    }

    async fn fetch_stream(&self, stream_id: Uuid) -> HelpdeskResult<Vec<StoredEvent>> {
        let log = self.log.read().await;
        Ok(log
            .iter()
            .filter(|e| e.stream_id == stream_id)
            .cloned()
            .collect())
    }

    async fn current_global_sequence(&self) -> HelpdeskResult<u64> {
        Ok(self.log.read().await.len() as u64)
    }

    async fn read_all_from(
        &self,
        after_sequence: u64,
        max: usize,
    ) -> HelpdeskResult<Vec<StoredEvent>> {
        let log = self.log.read().await;
        let start = usize::try_from(after_sequence)
            .unwrap_or(usize::MAX)
            .min(log.len());

        Ok(log[start..].iter().take(max).cloned().collect())
    }

    fn append_notifier(&self) -> Option<Arc<Notify>> {
        Some(self.appended.clone())
    }
}
