// Copyright (c) 2025 - Cowboy AI, Inc.
//! Incident Commands
//!
//! Commands express intent and can be rejected. Each carries the data the
//! handler needs plus an explicit timestamp: handlers never read the clock.
//!
//! ```text
//! Command → handle_*(State, Command) → Result<IncidentEvent, CommandError>
//! ```

use chrono::{DateTime, Utc};
use uuid::Uuid;

use crate::events::{Contact, IncidentCategory, IncidentPriority, ResolutionType};

/// Log a new incident (starts the stream)
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LogIncident {
    pub incident_id: Uuid,
    pub customer_id: Uuid,
    pub contact: Contact,
    pub description: String,
    pub logged_by: Uuid,
    pub timestamp: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CategoriseIncident {
    pub incident_id: Uuid,
    pub category: IncidentCategory,
    pub categorised_by: Uuid,
    pub timestamp: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PrioritiseIncident {
    pub incident_id: Uuid,
    pub priority: IncidentPriority,
    pub prioritised_by: Uuid,
    pub timestamp: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AssignAgentToIncident {
    pub incident_id: Uuid,
    pub agent_id: Uuid,
    pub timestamp: DateTime<Utc>,
}

/// Record an agent's response; internal notes set `visible_to_customer = false`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecordAgentResponseToIncident {
    pub incident_id: Uuid,
    pub agent_id: Uuid,
    pub content: String,
    pub visible_to_customer: bool,
    pub timestamp: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecordCustomerResponseToIncident {
    pub incident_id: Uuid,
    pub customer_id: Uuid,
    pub content: String,
    pub timestamp: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolveIncident {
    pub incident_id: Uuid,
    pub resolution: ResolutionType,
    pub resolved_by: Uuid,
    pub timestamp: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AcknowledgeResolution {
    pub incident_id: Uuid,
    pub acknowledged_by: Uuid,
    pub timestamp: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CloseIncident {
    pub incident_id: Uuid,
    pub closed_by: Uuid,
    pub timestamp: DateTime<Utc>,
}
