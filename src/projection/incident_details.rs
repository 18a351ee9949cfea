// Copyright (c) 2025 - Cowboy AI, Inc.
//! Incident details snapshot projection
//!
//! Materializes [`IncidentDetails`] per incident with the same
//! [`evolve`] fold the synchronous service uses, so both views agree on
//! every event prefix.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::debug;
use uuid::Uuid;

use crate::aggregate::{evolve, IncidentDetails};
use crate::errors::{HelpdeskError, HelpdeskResult};
use crate::event_store::StoredEvent;

use super::progress::ProjectionStorage;
use super::{AsyncProjection, ProjectionError, ProjectionKind, ShardName};

/// Stored snapshot document
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IncidentDetailsSnapshot {
    /// Incident id
    pub id: Uuid,

    pub aggregated: IncidentDetails,
}

#[derive(Debug, Clone)]
pub struct IncidentDetailsSnapshotProjection {
    name: String,
}

impl IncidentDetailsSnapshotProjection {
    pub const DEFAULT_NAME: &'static str = "IncidentDetailsSnapshot";

    pub fn new() -> Self {
        Self::named(Self::DEFAULT_NAME)
    }

    /// Same projection registered under another name
    pub fn named(name: impl Into<String>) -> Self {
        Self { name: name.into() }
    }
}

impl Default for IncidentDetailsSnapshotProjection {
    fn default() -> Self {
        Self::new()
    }
}

impl AsyncProjection for IncidentDetailsSnapshotProjection {
    fn kind(&self) -> ProjectionKind {
        ProjectionKind::INCIDENT_DETAILS_SNAPSHOT
    }

    fn name(&self) -> &str {
        &self.name
    }

    fn apply(
        &self,
        current: Option<Value>,
        event: &StoredEvent,
    ) -> Result<Option<Value>, ProjectionError> {
        let current = current
            .map(serde_json::from_value::<IncidentDetailsSnapshot>)
            .transpose()
            .map_err(|e| ProjectionError::InvalidDocument(e.to_string()))?;

        let Some(aggregated) = evolve(current.map(|s| s.aggregated), &event.data) else {
            debug!(
                stream_id = %event.stream_id,
                sequence = event.sequence,
                event_type = %event.event_type,
                "Skipping event for incident that was never logged"
            );
            return Ok(None);
        };

        let snapshot = IncidentDetailsSnapshot {
            id: event.stream_id,
            aggregated,
        };
        Ok(Some(serde_json::to_value(snapshot)?))
    }
}

/// Read the snapshot of one incident
///
/// Eventually consistent: reflects events up to the shard's progress.
pub async fn load_snapshot(
    storage: &dyn ProjectionStorage,
    shard: &ShardName,
    id: Uuid,
) -> HelpdeskResult<Option<IncidentDetailsSnapshot>> {
    storage
        .load_document(shard, id)
        .await?
        .map(serde_json::from_value)
        .transpose()
        .map_err(|e| HelpdeskError::Deserialization(e.to_string()))
}
