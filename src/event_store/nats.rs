// Copyright (c) 2025 - Cowboy AI, Inc.
//! NATS JetStream Event Store Implementation
//!
//! All incident streams live in one JetStream stream. The JetStream stream
//! sequence is the global sequence, so the watermark is the stream's
//! `last_sequence` and no separate counter is kept.
//!
//! Subject layout: `helpdesk.incidents.<stream_id>.<event_type>`

use std::time::Duration;

use async_nats::jetstream::{self, consumer, stream::Stream};
use async_trait::async_trait;
use futures::StreamExt;
use tracing::{debug, info};
use uuid::Uuid;

use crate::errors::{HelpdeskError, HelpdeskResult};
use crate::event_store::{check_expected_version, AppendResult, EventStore, StoredEvent};
use crate::events::IncidentEvent;
use crate::nats::{NatsClient, NatsConfig};

const FETCH_BATCH_SIZE: usize = 10_000;

/// Configuration for the JetStream stream holding incident events
#[derive(Debug, Clone)]
pub struct EventStreamConfig {
    /// Stream name
    pub stream_name: String,

    /// Subject prefix; the stream captures `<prefix>.>`
    pub subject_prefix: String,

    /// Maximum age of events; zero (the default) keeps them forever
    ///
    /// The stream is the source of truth for aggregates and projection
    /// rebuilds, so a non-zero age loses history.
    pub max_age: Duration,

    /// Number of replicas (for clustered NATS)
    pub replicas: usize,
}

impl Default for EventStreamConfig {
    fn default() -> Self {
        Self {
            stream_name: "HELPDESK_EVENTS".to_string(),
            subject_prefix: "helpdesk.incidents".to_string(),
            max_age: Duration::ZERO,
            replicas: 1,
        }
    }
}

/// NATS JetStream-backed event store
///
/// # Example
///
/// ```rust,no_run
/// use helpdesk_incidents::event_store::NatsEventStore;
/// use helpdesk_incidents::nats::NatsConfig;
///
/// #[tokio::main]
/// async fn main() -> Result<(), Box<dyn std::error::Error>> {
///     let store = NatsEventStore::connect(&NatsConfig::default()).await?;
///     // Use store...
///     Ok(())
/// }
/// ```
pub struct NatsEventStore {
    jetstream: jetstream::Context,
    stream: Stream,
    config: EventStreamConfig,
}

impl NatsEventStore {
    /// Connect to NATS and create or get the incident event stream
    pub async fn connect(nats: &NatsConfig) -> HelpdeskResult<Self> {
        Self::connect_with_config(nats, EventStreamConfig::default()).await
    }

    /// Connect with a custom stream configuration
    pub async fn connect_with_config(
        nats: &NatsConfig,
        config: EventStreamConfig,
    ) -> HelpdeskResult<Self> {
        let client = NatsClient::new(nats).await?;
        let jetstream = client.jetstream();

        let stream = jetstream
            .get_or_create_stream(jetstream::stream::Config {
                name: config.stream_name.clone(),
                subjects: vec![format!("{}.>", config.subject_prefix)],
                max_age: config.max_age,
                storage: jetstream::stream::StorageType::File,
                num_replicas: config.replicas,
                retention: jetstream::stream::RetentionPolicy::Limits,
                ..Default::default()
            })
            .await
            .map_err(|e| HelpdeskError::NatsConnection(e.to_string()))?;

        info!(stream = %config.stream_name, "Event stream ready");

        Ok(Self {
            jetstream,
            stream,
            config,
        })
    }

    /// Format: helpdesk.incidents.<stream_id>.<event_type>
    fn build_subject(&self, stream_id: Uuid, event_type: &str) -> String {
        format!(
            "{}.{}.{}",
            self.config.subject_prefix,
            stream_id,
            event_type.to_lowercase()
        )
    }

    /// Format: helpdesk.incidents.<stream_id>.>
    fn stream_subject_filter(&self, stream_id: Uuid) -> String {
        format!("{}.{}.>", self.config.subject_prefix, stream_id)
    }

    /// Read events through a short-lived consumer until the backlog is drained
    /// or `limit` events were read
    async fn read_with(
        &self,
        config: consumer::pull::Config,
        limit: usize,
    ) -> HelpdeskResult<Vec<StoredEvent>> {
        let consumer = self
            .stream
            .create_consumer(config)
            .await
            .map_err(|e| HelpdeskError::NatsConnection(e.to_string()))?;

        let mut events = Vec::new();

        while events.len() < limit {
            let batch_size = FETCH_BATCH_SIZE.min(limit - events.len());

            let mut messages = match consumer
                .fetch()
                .max_messages(batch_size)
                .expires(Duration::from_secs(2))
                .messages()
                .await
            {
                Ok(messages) => messages,
                Err(e) => {
                    let err_msg = e.to_string().to_lowercase();
                    if err_msg.contains("timeout")
                        || err_msg.contains("timed out")
                        || err_msg.contains("no messages")
                    {
                        break;
                    }
                    return Err(HelpdeskError::NatsConnection(e.to_string()));
                }
            };

            let mut batch_count = 0;

            while let Some(message) = messages.next().await {
                let msg = message.map_err(|e| HelpdeskError::NatsConnection(e.to_string()))?;

                let mut stored: StoredEvent = serde_json::from_slice(&msg.payload)
                    .map_err(|e| HelpdeskError::Deserialization(e.to_string()))?;
                stored.sequence = msg
                    .info()
                    .map_err(|e| HelpdeskError::NatsConnection(e.to_string()))?
                    .stream_sequence;

                events.push(stored);
                batch_count += 1;
            }

            if batch_count < batch_size {
                break;
            }
        }

        Ok(events)
    }
}

#[async_trait]
impl EventStore for NatsEventStore {
    /// Check the version, then publish each event and wait for its ack
    ///
    /// JetStream has no multi-message transaction: a failed publish leaves
    /// the events acked before it in the stream, and the version check is
    /// not atomic with the publishes across concurrent writers.
    async fn append_events(
        &self,
        stream_id: Uuid,
        events: Vec<IncidentEvent>,
        expected_version: Option<u64>,
    ) -> HelpdeskResult<AppendResult> {
        let existing = self.fetch_stream(stream_id).await?;
        let current_version = existing.last().map(|e| e.version).unwrap_or(0);
        check_expected_version(stream_id, current_version, expected_version)?;

        let mut result = AppendResult {
            version: current_version,
            sequence: 0,
        };

        for event in events {
            result.version += 1;

            let stored = StoredEvent::new(stream_id, result.version, event);
            let subject = self.build_subject(stream_id, &stored.event_type);
            let payload = serde_json::to_vec(&stored)?;

            let ack = self
                .jetstream
                .publish(subject, payload.into())
                .await
                .map_err(|e| HelpdeskError::NatsConnection(e.to_string()))?
                .await
                .map_err(|e| HelpdeskError::NatsConnection(e.to_string()))?;

            result.sequence = ack.sequence;
        }

        debug!(
            stream_id = %stream_id,
            version = result.version,
            sequence = result.sequence,
            "Appended events"
        );

        Ok(result)
    }

    async fn fetch_stream(&self, stream_id: Uuid) -> HelpdeskResult<Vec<StoredEvent>> {
        let mut events = self
            .read_with(
                consumer::pull::Config {
                    filter_subject: self.stream_subject_filter(stream_id),
                    ack_policy: consumer::AckPolicy::None,
                    inactive_threshold: Duration::from_secs(30),
                    ..Default::default()
                },
                usize::MAX,
            )
            .await?;

        events.sort_by_key(|e| e.version);
        Ok(events)
    }

    async fn current_global_sequence(&self) -> HelpdeskResult<u64> {
        let mut stream = self.stream.clone();
        let info = stream
            .info()
            .await
            .map_err(|e| HelpdeskError::NatsConnection(e.to_string()))?;

        Ok(info.state.last_sequence)
    }

    async fn read_all_from(
        &self,
        after_sequence: u64,
        max: usize,
    ) -> HelpdeskResult<Vec<StoredEvent>> {
        if max == 0 || after_sequence >= self.current_global_sequence().await? {
            return Ok(Vec::new());
        }

        let mut events = self
            .read_with(
                consumer::pull::Config {
                    filter_subject: format!("{}.>", self.config.subject_prefix),
                    deliver_policy: consumer::DeliverPolicy::ByStartSequence {
                        start_sequence: after_sequence + 1,
                    },
                    ack_policy: consumer::AckPolicy::None,
                    inactive_threshold: Duration::from_secs(30),
                    ..Default::default()
                },
                max,
            )
            .await?;

        events.sort_by_key(|e| e.sequence);
        Ok(events)
    }
}
