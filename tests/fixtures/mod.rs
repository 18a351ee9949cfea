// Copyright (c) 2025 - Cowboy AI, Inc.
//! Test Fixtures for helpdesk-incidents
//!
//! Deterministic incident events and projection wiring shared by the
//! integration suites. All UUIDs and timestamps are fixed constants so
//! failures are reproducible.
#![allow(dead_code)]

use std::sync::Arc;

use chrono::{DateTime, Utc};
use uuid::Uuid;

use helpdesk_incidents::config::{CatchUpConfig, DaemonConfig};
use helpdesk_incidents::event_store::InMemoryEventStore;
use helpdesk_incidents::events::*;
use helpdesk_incidents::projection::{
    CatchUpCoordinator, IncidentDetailsSnapshotProjection, InMemoryProjectionStorage,
    ProjectionDaemon, ProjectionHost, ProjectionRegistry,
};

// Fixed test UUIDs (UUID v7 format, but deterministic for testing)
pub const INCIDENT_ID_1: &str = "01934f4a-1000-7000-8000-000000001000";
pub const INCIDENT_ID_2: &str = "01934f4a-1001-7000-8000-000000001001";

pub const CUSTOMER_ID_1: &str = "01934f4a-2000-7000-8000-000000002000";

pub const AGENT_ID_1: &str = "01934f4a-3000-7000-8000-000000003000";

// Fixed test timestamp (2026-01-19T12:00:00Z)
pub const FIXED_TIMESTAMP: &str = "2026-01-19T12:00:00Z";

/// Parse a fixed UUID from a constant string
pub fn parse_uuid(s: &str) -> Uuid {
    Uuid::parse_str(s).expect("Invalid UUID in test fixture")
}

/// Parse the fixed timestamp
pub fn fixed_timestamp() -> DateTime<Utc> {
    DateTime::parse_from_rfc3339(FIXED_TIMESTAMP)
        .expect("Invalid timestamp in test fixture")
        .with_timezone(&Utc)
}

pub fn incident_id() -> Uuid {
    parse_uuid(INCIDENT_ID_1)
}

pub fn customer_id() -> Uuid {
    parse_uuid(CUSTOMER_ID_1)
}

pub fn agent_id() -> Uuid {
    parse_uuid(AGENT_ID_1)
}

pub fn logged_fixture(incident_id: Uuid) -> IncidentEvent {
    IncidentEvent::IncidentLogged(IncidentLogged {
        incident_id,
        customer_id: customer_id(),
        contact: Contact::via(ContactChannel::Email).with_email("customer@example.com"),
        description: "Cannot log in to the billing portal".to_string(),
        logged_by: customer_id(),
        logged_at: fixed_timestamp(),
    })
}

pub fn categorised_fixture(incident_id: Uuid, category: IncidentCategory) -> IncidentEvent {
    IncidentEvent::IncidentCategorised(IncidentCategorised {
        incident_id,
        category,
        categorised_by: agent_id(),
        categorised_at: fixed_timestamp(),
    })
}

pub fn prioritised_fixture(incident_id: Uuid, priority: IncidentPriority) -> IncidentEvent {
    IncidentEvent::IncidentPrioritised(IncidentPrioritised {
        incident_id,
        priority,
        prioritised_by: agent_id(),
        prioritised_at: fixed_timestamp(),
    })
}

pub fn agent_assigned_fixture(incident_id: Uuid) -> IncidentEvent {
    IncidentEvent::AgentAssignedToIncident(AgentAssignedToIncident {
        incident_id,
        agent_id: agent_id(),
        assigned_at: fixed_timestamp(),
    })
}

pub fn agent_responded_fixture(
    incident_id: Uuid,
    content: &str,
    visible_to_customer: bool,
) -> IncidentEvent {
    IncidentEvent::AgentRespondedToIncident(AgentRespondedToIncident {
        incident_id,
        response: AgentResponse {
            agent_id: agent_id(),
            content: content.to_string(),
            visible_to_customer,
        },
        responded_at: fixed_timestamp(),
    })
}

pub fn customer_responded_fixture(incident_id: Uuid, content: &str) -> IncidentEvent {
    IncidentEvent::CustomerRespondedToIncident(CustomerRespondedToIncident {
        incident_id,
        response: CustomerResponse {
            customer_id: customer_id(),
            content: content.to_string(),
        },
        responded_at: fixed_timestamp(),
    })
}

pub fn resolved_fixture(incident_id: Uuid) -> IncidentEvent {
    IncidentEvent::IncidentResolved(IncidentResolved {
        incident_id,
        resolution: ResolutionType::Permanent,
        resolved_by: agent_id(),
        resolved_at: fixed_timestamp(),
    })
}

pub fn acknowledged_fixture(incident_id: Uuid) -> IncidentEvent {
    IncidentEvent::ResolutionAcknowledgedByCustomer(ResolutionAcknowledgedByCustomer {
        incident_id,
        acknowledged_by: customer_id(),
        acknowledged_at: fixed_timestamp(),
    })
}

pub fn closed_fixture(incident_id: Uuid) -> IncidentEvent {
    IncidentEvent::IncidentClosed(IncidentClosed {
        incident_id,
        closed_by: agent_id(),
        closed_at: fixed_timestamp(),
    })
}

/// Full happy-path stream of one incident
pub fn full_lifecycle_fixture(incident_id: Uuid) -> Vec<IncidentEvent> {
    vec![
        logged_fixture(incident_id),
        categorised_fixture(incident_id, IncidentCategory::Software),
        prioritised_fixture(incident_id, IncidentPriority::High),
        agent_assigned_fixture(incident_id),
        agent_responded_fixture(incident_id, "Please clear your cookies", true),
        customer_responded_fixture(incident_id, "That worked"),
        resolved_fixture(incident_id),
        acknowledged_fixture(incident_id),
        closed_fixture(incident_id),
    ]
}

/// In-memory store, one snapshot projection, one database, fast catch-up bounds
pub struct ProjectionHarness {
    pub store: Arc<InMemoryEventStore>,
    pub registry: Arc<ProjectionRegistry>,
    pub storage: Arc<InMemoryProjectionStorage>,
    pub host: Arc<ProjectionHost>,
    pub daemon: Arc<ProjectionDaemon>,
    pub coordinator: CatchUpCoordinator,
}

pub fn fast_catch_up(max_attempts: u32) -> CatchUpConfig {
    CatchUpConfig {
        max_attempts,
        attempt_timeout_ms: 50,
    }
}

pub fn fast_daemon() -> DaemonConfig {
    DaemonConfig {
        batch_events_max: 100,
        poll_interval_ms: 10,
        error_backoff_ms: 20,
    }
}

pub fn projection_harness(catch_up: CatchUpConfig) -> ProjectionHarness {
    let store = Arc::new(InMemoryEventStore::new());

    let mut registry = ProjectionRegistry::new();
    registry
        .register(Arc::new(IncidentDetailsSnapshotProjection::new()))
        .expect("register snapshot projection");
    let registry = Arc::new(registry);

    let storage = Arc::new(InMemoryProjectionStorage::new("default"));

    let mut host = ProjectionHost::new();
    let daemon = host
        .add_daemon(ProjectionDaemon::new(
            store.clone(),
            storage.clone(),
            registry.clone(),
            fast_daemon(),
        ))
        .expect("add daemon");
    let host = Arc::new(host);

    let coordinator =
        CatchUpCoordinator::new(store.clone(), registry.clone(), host.clone(), catch_up);

    ProjectionHarness {
        store,
        registry,
        storage,
        host,
        daemon,
        coordinator,
    }
}
