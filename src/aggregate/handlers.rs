// Copyright (c) 2025 - Cowboy AI, Inc.
//! Pure Command Handlers for the Incident Aggregate
//!
//! ```text
//! handle_*(Option<&IncidentDetails>, Command) → Result<IncidentEvent, CommandError>
//! ```
//!
//! Handlers are the only place preconditions are enforced. They take the
//! current (possibly absent) state and never perform I/O.

use crate::aggregate::commands::*;
use crate::aggregate::incident::IncidentDetails;
use crate::events::*;
use crate::state_machine::{StateMachine, StatusTransition, TransitionError};

/// Command validation error
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum CommandError {
    /// No `IncidentLogged` event exists for this stream
    #[error("Incident not found")]
    NotFound,

    /// Stream already started
    #[error("Incident already logged")]
    AlreadyLogged,

    #[error("Incident is already closed")]
    AlreadyClosed,

    /// Status change rejected by the lifecycle
    #[error(transparent)]
    Transition(#[from] TransitionError),

    /// Business rule violation
    #[error("Business rule violation: {0}")]
    BusinessRuleViolation(String),
}

/// Handle LogIncident
///
/// # Business Rules
/// - Incident must not already exist
pub fn handle_log_incident(
    state: Option<&IncidentDetails>,
    command: LogIncident,
) -> Result<IncidentEvent, CommandError> {
    if state.is_some() {
        return Err(CommandError::AlreadyLogged);
    }

    if command.description.trim().is_empty() {
        return Err(CommandError::BusinessRuleViolation(
            "Incident description cannot be empty".to_string(),
        ));
    }

    Ok(IncidentEvent::IncidentLogged(IncidentLogged {
        incident_id: command.incident_id,
        customer_id: command.customer_id,
        contact: command.contact,
        description: command.description,
        logged_by: command.logged_by,
        logged_at: command.timestamp,
    }))
}

pub fn handle_categorise_incident(
    state: Option<&IncidentDetails>,
    command: CategoriseIncident,
) -> Result<IncidentEvent, CommandError> {
    open_incident(state)?;

    Ok(IncidentEvent::IncidentCategorised(IncidentCategorised {
        incident_id: command.incident_id,
        category: command.category,
        categorised_by: command.categorised_by,
        categorised_at: command.timestamp,
    }))
}

pub fn handle_prioritise_incident(
    state: Option<&IncidentDetails>,
    command: PrioritiseIncident,
) -> Result<IncidentEvent, CommandError> {
    open_incident(state)?;

    Ok(IncidentEvent::IncidentPrioritised(IncidentPrioritised {
        incident_id: command.incident_id,
        priority: command.priority,
        prioritised_by: command.prioritised_by,
        prioritised_at: command.timestamp,
    }))
}

pub fn handle_assign_agent(
    state: Option<&IncidentDetails>,
    command: AssignAgentToIncident,
) -> Result<IncidentEvent, CommandError> {
    open_incident(state)?;

    Ok(IncidentEvent::AgentAssignedToIncident(AgentAssignedToIncident {
        incident_id: command.incident_id,
        agent_id: command.agent_id,
        assigned_at: command.timestamp,
    }))
}

pub fn handle_record_agent_response(
    state: Option<&IncidentDetails>,
    command: RecordAgentResponseToIncident,
) -> Result<IncidentEvent, CommandError> {
    open_incident(state)?;

    Ok(IncidentEvent::AgentRespondedToIncident(AgentRespondedToIncident {
        incident_id: command.incident_id,
        response: AgentResponse {
            agent_id: command.agent_id,
            content: command.content,
            visible_to_customer: command.visible_to_customer,
        },
        responded_at: command.timestamp,
    }))
}

pub fn handle_record_customer_response(
    state: Option<&IncidentDetails>,
    command: RecordCustomerResponseToIncident,
) -> Result<IncidentEvent, CommandError> {
    open_incident(state)?;

    Ok(IncidentEvent::CustomerRespondedToIncident(CustomerRespondedToIncident {
        incident_id: command.incident_id,
        response: CustomerResponse {
            customer_id: command.customer_id,
            content: command.content,
        },
        responded_at: command.timestamp,
    }))
}

/// Handle ResolveIncident
///
/// # Business Rules
/// - Incident must exist and be Pending
pub fn handle_resolve_incident(
    state: Option<&IncidentDetails>,
    command: ResolveIncident,
) -> Result<IncidentEvent, CommandError> {
    let current = state.ok_or(CommandError::NotFound)?;
    current.status.transition(&StatusTransition::Resolve)?;

    Ok(IncidentEvent::IncidentResolved(IncidentResolved {
        incident_id: command.incident_id,
        resolution: command.resolution,
        resolved_by: command.resolved_by,
        resolved_at: command.timestamp,
    }))
}

/// Handle AcknowledgeResolution
///
/// # Business Rules
/// - Incident must be Resolved
pub fn handle_acknowledge_resolution(
    state: Option<&IncidentDetails>,
    command: AcknowledgeResolution,
) -> Result<IncidentEvent, CommandError> {
    let current = state.ok_or(CommandError::NotFound)?;
    current
        .status
        .transition(&StatusTransition::AcknowledgeResolution)?;

    Ok(IncidentEvent::ResolutionAcknowledgedByCustomer(
        ResolutionAcknowledgedByCustomer {
            incident_id: command.incident_id,
            acknowledged_by: command.acknowledged_by,
            acknowledged_at: command.timestamp,
        },
    ))
}

/// Handle CloseIncident
///
/// # Business Rules
/// - Customer must have acknowledged the resolution
pub fn handle_close_incident(
    state: Option<&IncidentDetails>,
    command: CloseIncident,
) -> Result<IncidentEvent, CommandError> {
    let current = state.ok_or(CommandError::NotFound)?;
    current.status.transition(&StatusTransition::Close)?;

    Ok(IncidentEvent::IncidentClosed(IncidentClosed {
        incident_id: command.incident_id,
        closed_by: command.closed_by,
        closed_at: command.timestamp,
    }))
}

fn open_incident(state: Option<&IncidentDetails>) -> Result<&IncidentDetails, CommandError> {
    let current = state.ok_or(CommandError::NotFound)?;
    if current.status.is_terminal() {
        return Err(CommandError::AlreadyClosed);
    }
    Ok(current)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::aggregate::incident::apply_event;
    use crate::state_machine::IncidentStatus;
    use chrono::Utc;
    use uuid::Uuid;

    fn log_command(incident_id: Uuid) -> LogIncident {
        LogIncident {
            incident_id,
            customer_id: Uuid::now_v7(),
            contact: Contact::via(ContactChannel::Phone),
            description: "VPN drops every hour".to_string(),
            logged_by: Uuid::now_v7(),
            timestamp: Utc::now(),
        }
    }

    fn logged_state(incident_id: Uuid) -> IncidentDetails {
        match handle_log_incident(None, log_command(incident_id)).unwrap() {
            IncidentEvent::IncidentLogged(e) => IncidentDetails::create(&e),
            other => panic!("unexpected event {other:?}"),
        }
    }

    #[test]
    fn test_log_rejects_existing_incident() {
        let id = Uuid::now_v7();
        let state = logged_state(id);

        let result = handle_log_incident(Some(&state), log_command(id));
        assert_eq!(result, Err(CommandError::AlreadyLogged));
    }

    #[test]
    fn test_log_rejects_empty_description() {
        let mut command = log_command(Uuid::now_v7());
        command.description = "   ".to_string();

        let result = handle_log_incident(None, command);
        assert!(matches!(result, Err(CommandError::BusinessRuleViolation(_))));
    }

    #[test]
    fn test_categorise_requires_existing_incident() {
        let command = CategoriseIncident {
            incident_id: Uuid::now_v7(),
            category: IncidentCategory::Network,
            categorised_by: Uuid::now_v7(),
            timestamp: Utc::now(),
        };

        assert_eq!(
            handle_categorise_incident(None, command),
            Err(CommandError::NotFound)
        );
    }

    #[test]
    fn test_resolve_twice_is_rejected() {
        let id = Uuid::now_v7();
        let command = ResolveIncident {
            incident_id: id,
            resolution: ResolutionType::Permanent,
            resolved_by: Uuid::now_v7(),
            timestamp: Utc::now(),
        };

        let state = logged_state(id);
        let event = handle_resolve_incident(Some(&state), command.clone()).unwrap();
        let state = apply_event(state, &event);
        assert_eq!(state.status, IncidentStatus::Resolved);

        let result = handle_resolve_incident(Some(&state), command);
        assert!(matches!(
            result,
            Err(CommandError::Transition(TransitionError::BusinessRuleViolation(_)))
        ));
    }

    #[test]
    fn test_close_requires_acknowledgement() {
        let id = Uuid::now_v7();
        let state = logged_state(id);
        let command = CloseIncident {
            incident_id: id,
            closed_by: Uuid::now_v7(),
            timestamp: Utc::now(),
        };

        let result = handle_close_incident(Some(&state), command);
        assert!(matches!(
            result,
            Err(CommandError::Transition(TransitionError::InvalidTransition { .. }))
        ));
    }

    #[test]
    fn test_closed_incident_rejects_responses() {
        let id = Uuid::now_v7();
        let state = IncidentDetails {
            status: IncidentStatus::Closed,
            ..logged_state(id)
        };
        let command = RecordAgentResponseToIncident {
            incident_id: id,
            agent_id: Uuid::now_v7(),
            content: "Reopening?".to_string(),
            visible_to_customer: true,
            timestamp: Utc::now(),
        };

        assert_eq!(
            handle_record_agent_response(Some(&state), command),
            Err(CommandError::AlreadyClosed)
        );
    }
}
