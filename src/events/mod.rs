// Copyright (c) 2025 - Cowboy AI, Inc.
//! Incident Domain Events
//!
//! Events are immutable facts describing something that happened to one
//! incident. They are named in the past tense and are never updated or
//! deleted once appended.
//!
//! # Event Flow
//!
//! ```text
//! Command → Handler → Event → EventStore ─┬─> Synchronous aggregate (same call)
//!                                          └─> Projection worker (out-of-band)
//! ```
//!
//! Events of one incident share a stream id (the incident id) and are totally
//! ordered within it by the stream version. Across streams they share the
//! store's global sequence.

pub mod incident;

// Re-export commonly used types
pub use incident::{
    AgentAssignedToIncident, AgentRespondedToIncident, AgentResponse, Contact, ContactChannel,
    CustomerRespondedToIncident, CustomerResponse, IncidentCategorised, IncidentCategory,
    IncidentClosed, IncidentEvent, IncidentLogged, IncidentPrioritised, IncidentPriority,
    IncidentResolved, ResolutionAcknowledgedByCustomer, ResolutionType,
};
