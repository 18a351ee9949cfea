// Copyright (c) 2025 - Cowboy AI, Inc.
//! Incident Service Layer
//!
//! The strongly-consistent side: each command is decided against the
//! aggregate folded from the stream, appended, and the new state is
//! returned in the same call.
//!
//! # Transaction Semantics
//!
//! 1. Load the stream from the event store
//! 2. Fold it into `IncidentDetails`
//! 3. Check the caller's expected version
//! 4. Handle the command (pure function)
//! 5. Append with optimistic concurrency
//! 6. Fold the new event and return the state
//!
//! If any step fails, nothing is appended.

use std::sync::Arc;

use async_trait::async_trait;
use tracing::debug;
use uuid::Uuid;

use crate::aggregate::commands::*;
use crate::aggregate::handlers::*;
use crate::aggregate::{evolve, fold_events, IncidentDetails};
use crate::errors::HelpdeskError;
use crate::event_store::EventStore;
use crate::events::IncidentEvent;

/// Service layer result type
pub type ServiceResult<T> = Result<T, ServiceError>;

/// Service layer errors
#[derive(Debug, thiserror::Error)]
pub enum ServiceError {
    /// Command validation failed
    #[error("Command error: {0}")]
    CommandError(#[from] CommandError),

    /// Event store error
    #[error("Event store error: {0}")]
    EventStoreError(#[from] HelpdeskError),

    /// Incident not found
    #[error("Incident not found: {0}")]
    NotFound(Uuid),

    /// The caller decided against an older version of the incident
    #[error("Concurrency conflict: expected version {expected}, got {actual}")]
    ConcurrencyConflict { expected: u64, actual: u64 },
}

/// State after a successful command
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommandOutcome {
    pub incident: IncidentDetails,

    /// Global sequence of the appended event
    pub sequence: u64,
}

/// Incident application service
///
/// `expected_version` is the incident version the caller last saw; `None`
/// accepts whatever version is current.
#[async_trait]
pub trait IncidentService: Send + Sync {
    async fn log_incident(&self, command: LogIncident) -> ServiceResult<CommandOutcome>;

    async fn categorise_incident(
        &self,
        command: CategoriseIncident,
        expected_version: Option<u64>,
    ) -> ServiceResult<CommandOutcome>;

    async fn prioritise_incident(
        &self,
        command: PrioritiseIncident,
        expected_version: Option<u64>,
    ) -> ServiceResult<CommandOutcome>;

    async fn assign_agent(
        &self,
        command: AssignAgentToIncident,
        expected_version: Option<u64>,
    ) -> ServiceResult<CommandOutcome>;

    async fn record_agent_response(
        &self,
        command: RecordAgentResponseToIncident,
        expected_version: Option<u64>,
    ) -> ServiceResult<CommandOutcome>;

    async fn record_customer_response(
        &self,
        command: RecordCustomerResponseToIncident,
        expected_version: Option<u64>,
    ) -> ServiceResult<CommandOutcome>;

    async fn resolve_incident(
        &self,
        command: ResolveIncident,
        expected_version: Option<u64>,
    ) -> ServiceResult<CommandOutcome>;

    async fn acknowledge_resolution(
        &self,
        command: AcknowledgeResolution,
        expected_version: Option<u64>,
    ) -> ServiceResult<CommandOutcome>;

    async fn close_incident(
        &self,
        command: CloseIncident,
        expected_version: Option<u64>,
    ) -> ServiceResult<CommandOutcome>;

    /// Current state folded from the stream
    async fn get_incident(&self, incident_id: Uuid) -> ServiceResult<IncidentDetails>;
}

/// Event-sourced implementation over any [`EventStore`]
pub struct EventSourcedIncidentService {
    store: Arc<dyn EventStore>,
}

impl EventSourcedIncidentService {
    pub fn new(store: Arc<dyn EventStore>) -> Self {
        Self { store }
    }

    async fn load(&self, incident_id: Uuid) -> ServiceResult<(Option<IncidentDetails>, u64)> {
        let events = self.store.fetch_stream(incident_id).await?;
        let version = events.last().map(|e| e.version).unwrap_or(0);
        let state = fold_events(None, events.iter().map(|e| &e.data));
        Ok((state, version))
    }

    async fn execute<F>(
        &self,
        incident_id: Uuid,
        expected_version: Option<u64>,
        decide: F,
    ) -> ServiceResult<CommandOutcome>
    where
        F: FnOnce(Option<&IncidentDetails>) -> Result<IncidentEvent, CommandError> + Send,
    {
        let (state, version) = self.load(incident_id).await?;

        if let Some(expected) = expected_version {
            if expected != version {
                return Err(ServiceError::ConcurrencyConflict {
                    expected,
                    actual: version,
                });
            }
        }

        let event = decide(state.as_ref())?;
        let event_type = event.event_type_name();

        let appended = self
            .store
            .append_events(incident_id, vec![event.clone()], Some(version))
            .await?;

        let incident = evolve(state, &event).ok_or(ServiceError::NotFound(incident_id))?;

        debug!(
            incident_id = %incident_id,
            event_type,
            version = appended.version,
            sequence = appended.sequence,
            "Incident command applied"
        );

        Ok(CommandOutcome {
            incident,
            sequence: appended.sequence,
        })
    }
}

#[async_trait]
impl IncidentService for EventSourcedIncidentService {
    async fn log_incident(&self, command: LogIncident) -> ServiceResult<CommandOutcome> {
        self.execute(command.incident_id, Some(0), |state| {
            handle_log_incident(state, command)
        })
        .await
        .map_err(|e| match e {
            ServiceError::ConcurrencyConflict { .. } => {
                ServiceError::CommandError(CommandError::AlreadyLogged)
            }
            other => other,
        })
    }

    async fn categorise_incident(
        &self,
        command: CategoriseIncident,
        expected_version: Option<u64>,
    ) -> ServiceResult<CommandOutcome> {
        self.execute(command.incident_id, expected_version, |state| {
            handle_categorise_incident(state, command)
        })
        .await
    }

    async fn prioritise_incident(
        &self,
        command: PrioritiseIncident,
        expected_version: Option<u64>,
    ) -> ServiceResult<CommandOutcome> {
        self.execute(command.incident_id, expected_version, |state| {
            handle_prioritise_incident(state, command)
        })
        .await
    }

    async fn assign_agent(
        &self,
        command: AssignAgentToIncident,
        expected_version: Option<u64>,
    ) -> ServiceResult<CommandOutcome> {
        self.execute(command.incident_id, expected_version, |state| {
            handle_assign_agent(state, command)
        })
        .await
    }

    async fn record_agent_response(
        &self,
        command: RecordAgentResponseToIncident,
        expected_version: Option<u64>,
    ) -> ServiceResult<CommandOutcome> {
        self.execute(command.incident_id, expected_version, |state| {
            handle_record_agent_response(state, command)
        })
        .await
    }

    async fn record_customer_response(
        &self,
        command: RecordCustomerResponseToIncident,
        expected_version: Option<u64>,
    ) -> ServiceResult<CommandOutcome> {
        self.execute(command.incident_id, expected_version, |state| {
            handle_record_customer_response(state, command)
        })
        .await
    }

    async fn resolve_incident(
        &self,
        command: ResolveIncident,
        expected_version: Option<u64>,
    ) -> ServiceResult<CommandOutcome> {
        self.execute(command.incident_id, expected_version, |state| {
            handle_resolve_incident(state, command)
        })
        .await
    }

    async fn acknowledge_resolution(
        &self,
        command: AcknowledgeResolution,
        expected_version: Option<u64>,
    ) -> ServiceResult<CommandOutcome> {
        self.execute(command.incident_id, expected_version, |state| {
            handle_acknowledge_resolution(state, command)
        })
        .await
    }

    async fn close_incident(
        &self,
        command: CloseIncident,
        expected_version: Option<u64>,
    ) -> ServiceResult<CommandOutcome> {
        self.execute(command.incident_id, expected_version, |state| {
            handle_close_incident(state, command)
        })
        .await
    }

    async fn get_incident(&self, incident_id: Uuid) -> ServiceResult<IncidentDetails> {
        let (state, _) = self.load(incident_id).await?;
        state.ok_or(ServiceError::NotFound(incident_id))
    }
}
