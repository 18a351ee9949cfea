// Copyright (c) 2025 - Cowboy AI, Inc.

//! Asynchronous Projections
//!
//! A projection folds the global event log into documents stored outside the
//! event store. It runs out-of-band: a [`worker::ShardWorker`] per shard per
//! database reads events after its recorded progress, applies them, and
//! commits the documents together with the new progress.
//!
//! # Architecture
//!
//! ```text
//! EventStore ──read_all_from──> ShardWorker ──commit──> ProjectionStorage
//!                                    │                        │
//!                              ShardStatus (watch)     ShardProgress
//!                                    │                        │
//!                                    └──> CatchUpCoordinator <┘
//! ```
//!
//! Progress is written only by the worker owning the shard. Everything else
//! reads it.
//!
//! # Shard identity
//!
//! A shard is addressed as `"{projection_name}:{shard_key}"`. Every projection
//! in this crate has exactly one shard with key `All`.

pub mod coordinator;
pub mod daemon;
pub mod host;
pub mod incident_details;
pub mod progress;
pub mod registry;
pub mod worker;

use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt;

use crate::event_store::StoredEvent;

pub use coordinator::{CatchUpCoordinator, CatchUpError, CatchUpReport, CaughtUp};
pub use daemon::{ProjectionDaemon, WaitOutcome};
pub use host::ProjectionHost;
pub use incident_details::{IncidentDetailsSnapshot, IncidentDetailsSnapshotProjection};
pub use progress::{InMemoryProjectionStorage, ProjectionBatch, ProjectionStorage, ShardProgress};
pub use registry::ProjectionRegistry;
pub use worker::{ShardStatus, ShardWorker, WorkerError, WorkerFailure};

/// Default shard key of single-shard projections
pub const ALL_SHARDS: &str = "All";

/// What a projection produces, independent of the name it is registered under
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ProjectionKind(&'static str);

impl ProjectionKind {
    /// Snapshot of the incident aggregate, one document per incident
    pub const INCIDENT_DETAILS_SNAPSHOT: ProjectionKind =
        ProjectionKind("IncidentDetailsSnapshot");

    pub const fn new(kind: &'static str) -> Self {
        Self(kind)
    }

    pub fn as_str(&self) -> &'static str {
        self.0
    }
}

impl fmt::Display for ProjectionKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.0)
    }
}

/// Opaque partition scope; each database has its own daemon and progress
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct DatabaseId(String);

impl DatabaseId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<&str> for DatabaseId {
    fn from(id: &str) -> Self {
        Self::new(id)
    }
}

impl fmt::Display for DatabaseId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Identity of one projection shard
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ShardName {
    pub projection_name: String,
    pub shard_key: String,
}

impl ShardName {
    /// Single shard covering the whole log
    pub fn new(projection_name: impl Into<String>) -> Self {
        Self::with_key(projection_name, ALL_SHARDS)
    }

    pub fn with_key(projection_name: impl Into<String>, shard_key: impl Into<String>) -> Self {
        Self {
            projection_name: projection_name.into(),
            shard_key: shard_key.into(),
        }
    }

    /// `"{projection_name}:{shard_key}"`
    pub fn identity(&self) -> String {
        format!("{}:{}", self.projection_name, self.shard_key)
    }
}

impl fmt::Display for ShardName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.projection_name, self.shard_key)
    }
}

/// Errors raised while applying an event to a projected document
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ProjectionError {
    /// Stored document does not have the projection's shape
    #[error("Invalid document: {0}")]
    InvalidDocument(String),

    /// Document could not be serialized
    #[error("Serialization error: {0}")]
    Serialization(String),
}

impl From<serde_json::Error> for ProjectionError {
    fn from(err: serde_json::Error) -> Self {
        ProjectionError::Serialization(err.to_string())
    }
}

/// A projection processed asynchronously by a shard worker
///
/// `apply` must be a pure function of the current document and the event:
/// the worker may re-apply a batch after a failed commit.
pub trait AsyncProjection: Send + Sync {
    /// What this projection produces
    fn kind(&self) -> ProjectionKind;

    /// Name it is registered under (unique per registry)
    fn name(&self) -> &str;

    /// The shard this projection runs as
    fn shard_name(&self) -> ShardName {
        ShardName::new(self.name())
    }

    /// Apply one event to the document of the event's stream
    ///
    /// Returns the new document, or `None` when the event does not produce
    /// one (the stored document, if any, is left untouched).
    fn apply(
        &self,
        current: Option<Value>,
        event: &StoredEvent,
    ) -> Result<Option<Value>, ProjectionError>;
}
