// Copyright (c) 2025 - Cowboy AI, Inc.
//! Service Layer for Incident Management
//!
//! # Architecture
//!
//! ```text
//! Client Request
//!     ↓
//! Service Layer (this module)
//!     ↓
//! Command Handler → Event
//!     ↓
//! Event Store ──> Projection workers (eventually consistent snapshots)
//!     ↓
//! IncidentDetails (strongly consistent, same call)
//! ```
//!
//! # Example
//!
//! ```rust,ignore
//! use helpdesk_incidents::service::{EventSourcedIncidentService, IncidentService};
//!
//! let service = EventSourcedIncidentService::new(event_store);
//! let outcome = service.log_incident(command).await?;
//! let current = service.get_incident(outcome.incident.id).await?;
//! ```

pub mod incident;

pub use incident::{
    CommandOutcome, EventSourcedIncidentService, IncidentService, ServiceError, ServiceResult,
};
