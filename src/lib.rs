//! Event-sourced helpdesk incidents
//!
//! Incident state is derived from an append-only event log. The same fold
//! feeds a strongly-consistent aggregate (returned by the service in the
//! call that appended) and an asynchronous snapshot projection maintained by
//! background shard workers. The catch-up coordinator lets a caller wait
//! until the snapshot has processed everything appended so far.

pub mod aggregate;
pub mod config;
pub mod errors;
pub mod event_store;
pub mod events;
pub mod nats;
pub mod projection;
pub mod service;
pub mod state_machine;

// Re-export commonly used types
pub use aggregate::{apply_event, evolve, IncidentDetails, IncidentNote, IncidentNoteType};
pub use config::{CatchUpConfig, DaemonConfig, HelpdeskConfig};
pub use errors::{HelpdeskError, HelpdeskResult};
pub use event_store::{AppendResult, EventStore, InMemoryEventStore, NatsEventStore, StoredEvent};
pub use events::IncidentEvent;
pub use nats::{NatsClient, NatsConfig};
pub use projection::{
    CatchUpCoordinator, CatchUpError, CaughtUp, DatabaseId, ProjectionDaemon, ProjectionHost,
    ProjectionKind, ProjectionRegistry, ShardName, WaitOutcome,
};
pub use service::{EventSourcedIncidentService, IncidentService};
pub use state_machine::IncidentStatus;
