// Copyright (c) 2025 - Cowboy AI, Inc.
//! Incident Domain Events
//!
//! Every change to an incident is recorded as one of these immutable facts.
//! Each payload carries only the fields needed to apply it; stream position,
//! global sequence and timestamps of storage live on the envelope
//! ([`crate::event_store::StoredEvent`]).

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Incident Domain Events
///
/// Tagged union over every fact type of the incident stream. Adding a
/// variant forces every fold over this enum to handle it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum IncidentEvent {
    /// Incident was logged by a customer or on their behalf (stream start)
    IncidentLogged(IncidentLogged),

    /// Incident was categorised by an agent
    IncidentCategorised(IncidentCategorised),

    /// Incident priority was set
    IncidentPrioritised(IncidentPrioritised),

    /// Agent was assigned to handle the incident
    AgentAssignedToIncident(AgentAssignedToIncident),

    /// Agent responded to the incident
    AgentRespondedToIncident(AgentRespondedToIncident),

    /// Customer responded to the incident
    CustomerRespondedToIncident(CustomerRespondedToIncident),

    /// Incident was resolved by an agent
    IncidentResolved(IncidentResolved),

    /// Customer acknowledged the resolution
    ResolutionAcknowledgedByCustomer(ResolutionAcknowledgedByCustomer),

    /// Incident was closed
    IncidentClosed(IncidentClosed),
}

impl IncidentEvent {
    /// Incident (stream) this event belongs to
    pub fn incident_id(&self) -> Uuid {
        use IncidentEvent::*;

        match self {
            IncidentLogged(e) => e.incident_id,
            IncidentCategorised(e) => e.incident_id,
            IncidentPrioritised(e) => e.incident_id,
            AgentAssignedToIncident(e) => e.incident_id,
            AgentRespondedToIncident(e) => e.incident_id,
            CustomerRespondedToIncident(e) => e.incident_id,
            IncidentResolved(e) => e.incident_id,
            ResolutionAcknowledgedByCustomer(e) => e.incident_id,
            IncidentClosed(e) => e.incident_id,
        }
    }

    /// When the fact happened, as recorded by the write side
    pub fn occurred_at(&self) -> DateTime<Utc> {
        use IncidentEvent::*;

        match self {
            IncidentLogged(e) => e.logged_at,
            IncidentCategorised(e) => e.categorised_at,
            IncidentPrioritised(e) => e.prioritised_at,
            AgentAssignedToIncident(e) => e.assigned_at,
            AgentRespondedToIncident(e) => e.responded_at,
            CustomerRespondedToIncident(e) => e.responded_at,
            IncidentResolved(e) => e.resolved_at,
            ResolutionAcknowledgedByCustomer(e) => e.acknowledged_at,
            IncidentClosed(e) => e.closed_at,
        }
    }

    /// Get human-readable event type name
    pub fn event_type_name(&self) -> &'static str {
        use IncidentEvent::*;

        match self {
            IncidentLogged(_) => "IncidentLogged",
            IncidentCategorised(_) => "IncidentCategorised",
            IncidentPrioritised(_) => "IncidentPrioritised",
            AgentAssignedToIncident(_) => "AgentAssignedToIncident",
            AgentRespondedToIncident(_) => "AgentRespondedToIncident",
            CustomerRespondedToIncident(_) => "CustomerRespondedToIncident",
            IncidentResolved(_) => "IncidentResolved",
            ResolutionAcknowledgedByCustomer(_) => "ResolutionAcknowledgedByCustomer",
            IncidentClosed(_) => "IncidentClosed",
        }
    }
}

/// Incident was logged; the only event that starts a stream
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IncidentLogged {
    /// Incident (stream) id
    pub incident_id: Uuid,

    /// Customer the incident belongs to
    pub customer_id: Uuid,

    /// How the customer can be reached
    pub contact: Contact,

    /// Free-text description of the problem
    pub description: String,

    /// Who logged it (customer or agent on their behalf)
    pub logged_by: Uuid,

    pub logged_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IncidentCategorised {
    pub incident_id: Uuid,
    pub category: IncidentCategory,
    pub categorised_by: Uuid,
    pub categorised_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IncidentPrioritised {
    pub incident_id: Uuid,
    pub priority: IncidentPriority,
    pub prioritised_by: Uuid,
    pub prioritised_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AgentAssignedToIncident {
    pub incident_id: Uuid,
    pub agent_id: Uuid,
    pub assigned_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AgentRespondedToIncident {
    pub incident_id: Uuid,
    pub response: AgentResponse,
    pub responded_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CustomerRespondedToIncident {
    pub incident_id: Uuid,
    pub response: CustomerResponse,
    pub responded_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IncidentResolved {
    pub incident_id: Uuid,
    pub resolution: ResolutionType,
    pub resolved_by: Uuid,
    pub resolved_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResolutionAcknowledgedByCustomer {
    pub incident_id: Uuid,
    pub acknowledged_by: Uuid,
    pub acknowledged_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IncidentClosed {
    pub incident_id: Uuid,
    pub closed_by: Uuid,
    pub closed_at: DateTime<Utc>,
}

/// Response written by an agent
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AgentResponse {
    pub agent_id: Uuid,
    pub content: String,
    /// Internal notes are hidden from the customer
    pub visible_to_customer: bool,
}

/// Response written by the customer (always visible to them)
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CustomerResponse {
    pub customer_id: Uuid,
    pub content: String,
}

/// Customer contact details captured when the incident is logged
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Contact {
    pub channel: ContactChannel,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub email_address: Option<String>,
    pub phone_number: Option<String>,
}

impl Contact {
    /// Contact with only a channel and no personal details
    pub fn via(channel: ContactChannel) -> Self {
        Self {
            channel,
            first_name: None,
            last_name: None,
            email_address: None,
            phone_number: None,
        }
    }

    /// Set the email address
    pub fn with_email(mut self, email_address: impl Into<String>) -> Self {
        self.email_address = Some(email_address.into());
        self
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ContactChannel {
    Email,
    Phone,
    InPerson,
    GeneratedBySystem,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum IncidentCategory {
    Software,
    Hardware,
    Network,
    Database,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum IncidentPriority {
    Critical,
    High,
    Medium,
    Low,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ResolutionType {
    Temporary,
    Permanent,
    NotAnIncident,
}
