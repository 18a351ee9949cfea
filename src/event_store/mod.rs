// Copyright (c) 2025 - Cowboy AI, Inc.
//! Event Store Abstraction
//!
//! Append-only storage for incident events. Every stored event has two
//! positions:
//!
//! - `version`: 1-based position within its stream (one incident)
//! - `sequence`: 1-based position in the store-wide log, shared by all streams
//!
//! The highest assigned `sequence` is the store watermark; 0 means the store is
//! empty. Projection workers read the log in `sequence` order and record how
//! far they got.
//!
//! # Architecture
//!
//! ```text
//! IncidentService → EventStore::append_events → log
//!                                                 │
//!                    ShardWorker ← read_all_from ←┘
//! ```

use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tokio::sync::Notify;
use uuid::Uuid;

use crate::errors::HelpdeskResult;
use crate::events::IncidentEvent;

pub mod memory;
pub mod nats;

pub use memory::InMemoryEventStore;
pub use nats::{EventStreamConfig, NatsEventStore};

/// Stored event envelope
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StoredEvent {
    /// Unique event ID (UUID v7 for time-ordering)
    pub event_id: Uuid,

    /// Stream (incident) this event belongs to
    pub stream_id: Uuid,

    /// Position within the stream, starting at 1
    pub version: u64,

    /// Position in the global log, starting at 1
    ///
    /// Assigned by the store on append; not part of the serialized payload
    /// for stores that derive it from their own log position.
    #[serde(default)]
    pub sequence: u64,

    /// When the event was appended
    pub timestamp: DateTime<Utc>,

    /// Event type name
    pub event_type: String,

    /// The domain event
    pub data: IncidentEvent,

    /// Optional metadata (e.g., user context, source system)
    pub metadata: Option<serde_json::Value>,
}

impl StoredEvent {
    /// Envelope for an event about to be appended
    pub fn new(stream_id: Uuid, version: u64, data: IncidentEvent) -> Self {
        Self {
            event_id: Uuid::now_v7(),
            stream_id,
            version,
            sequence: 0,
            timestamp: Utc::now(),
            event_type: data.event_type_name().to_string(),
            data,
            metadata: None,
        }
    }

    /// Add metadata to the event
    pub fn with_metadata(mut self, metadata: serde_json::Value) -> Self {
        self.metadata = Some(metadata);
        self
    }
}

/// Positions assigned by a successful append
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AppendResult {
    /// Stream version of the last appended event
    pub version: u64,

    /// Global sequence of the last appended event
    pub sequence: u64,
}

/// Event Store trait for persisting and retrieving incident events
///
/// Implementations must ensure:
///
/// - **Version check**: a rejected `expected_version` appends nothing
/// - **Ordering**: `version` is gapless per stream and `sequence` strictly increases
/// - **Immutability**: appended events are never updated, reordered or deleted
///
/// Whether a multi-event append is all-or-nothing depends on the backend:
/// [`InMemoryEventStore`] appends under one lock, while [`NatsEventStore`]
/// publishes event by event and can leave a prefix behind if a publish fails.
#[async_trait]
pub trait EventStore: Send + Sync {
    /// Append events to a stream
    ///
    /// `expected_version` is the stream version the caller decided against
    /// (0 for a stream that must not exist yet). `None` skips the check.
    ///
    /// # Errors
    ///
    /// - `ConcurrencyError` if `expected_version` doesn't match the stream
    /// - `NatsConnection` / `Storage` if writing fails
    async fn append_events(
        &self,
        stream_id: Uuid,
        events: Vec<IncidentEvent>,
        expected_version: Option<u64>,
    ) -> HelpdeskResult<AppendResult>;

    /// Read all events of a stream ordered by version
    ///
    /// Returns an empty vector for an unknown stream.
    async fn fetch_stream(&self, stream_id: Uuid) -> HelpdeskResult<Vec<StoredEvent>>;

    /// Highest global sequence assigned so far (0 when empty)
    async fn current_global_sequence(&self) -> HelpdeskResult<u64>;

    /// Read at most `max` events with `sequence > after_sequence`, in
    /// increasing sequence order
    async fn read_all_from(
        &self,
        after_sequence: u64,
        max: usize,
    ) -> HelpdeskResult<Vec<StoredEvent>>;

    /// Signal fired after every successful append, if the store supports it
    ///
    /// Workers use it to wake up early instead of waiting for the next poll.
    fn append_notifier(&self) -> Option<Arc<Notify>> {
        None
    }
}

/// Check an append's expected version against the stream's current one
pub(crate) fn check_expected_version(
    stream_id: Uuid,
    current: u64,
    expected: Option<u64>,
) -> HelpdeskResult<()> {
    match expected {
        Some(expected) if expected != current => {
            Err(crate::errors::HelpdeskError::ConcurrencyError(format!(
                "Stream {}: expected version {}, but current version is {}",
                stream_id, expected, current
            )))
        }
        _ => Ok(()),
    }
}
