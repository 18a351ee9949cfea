// Copyright (c) 2025 - Cowboy AI, Inc.
//! Pure Functional Incident Aggregate
//!
//! The same fold is used by the synchronous service and by the asynchronous
//! snapshot projection, so both produce identical state for the same event
//! prefix.
//!
//! # Architecture
//!
//! ```text
//! IncidentLogged ──create()──> IncidentDetails
//! other events   ──apply_event()──> IncidentDetails'
//! ```

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::events::*;
use crate::state_machine::IncidentStatus;

/// Immutable incident state folded from its event stream
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IncidentDetails {
    /// Incident (stream) id
    pub id: Uuid,

    pub customer_id: Uuid,

    pub status: IncidentStatus,

    /// Responses in the order they were first recorded
    pub notes: Vec<IncidentNote>,

    pub category: Option<IncidentCategory>,

    pub priority: Option<IncidentPriority>,

    pub agent_id: Option<Uuid>,

    /// Number of events applied
    pub version: u64,
}

/// A response recorded on the incident
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct IncidentNote {
    pub note_type: IncidentNoteType,
    pub from: Uuid,
    pub content: String,
    pub visible_to_customer: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum IncidentNoteType {
    FromAgent,
    FromCustomer,
}

impl IncidentDetails {
    /// Initial state from the stream's first event
    pub fn create(logged: &IncidentLogged) -> Self {
        Self {
            id: logged.incident_id,
            customer_id: logged.customer_id,
            status: IncidentStatus::Pending,
            notes: Vec::new(),
            category: None,
            priority: None,
            agent_id: None,
            version: 1,
        }
    }

    /// Reconstruct state from an event stream
    ///
    /// ```text
    /// State = fold(Events, None, evolve)
    /// ```
    ///
    /// Returns `None` when the stream does not start with `IncidentLogged`.
    pub fn from_events(events: &[IncidentEvent]) -> Option<Self> {
        fold_events(None, events)
    }
}

/// Apply a partial-update event to existing state (pure function)
///
/// # Invariants
/// - Same event + same state = same result
/// - Never fails: events are facts, preconditions were checked on the write side
/// - `IncidentLogged` only ever creates state; applied here it is ignored
pub fn apply_event(state: IncidentDetails, event: &IncidentEvent) -> IncidentDetails {
    use IncidentEvent::*;

    let state = match event {
        IncidentLogged(_) => return state,

        IncidentCategorised(e) => IncidentDetails {
            category: Some(e.category),
            ..state
        },

        IncidentPrioritised(e) => IncidentDetails {
            priority: Some(e.priority),
            ..state
        },

        AgentAssignedToIncident(e) => IncidentDetails {
            agent_id: Some(e.agent_id),
            ..state
        },

        AgentRespondedToIncident(e) => {
            let note = IncidentNote {
                note_type: IncidentNoteType::FromAgent,
                from: e.response.agent_id,
                content: e.response.content.clone(),
                visible_to_customer: e.response.visible_to_customer,
            };
            IncidentDetails {
                notes: union_note(state.notes, note),
                ..state
            }
        }

        CustomerRespondedToIncident(e) => {
            let note = IncidentNote {
                note_type: IncidentNoteType::FromCustomer,
                from: e.response.customer_id,
                content: e.response.content.clone(),
                visible_to_customer: true,
            };
            IncidentDetails {
                notes: union_note(state.notes, note),
                ..state
            }
        }

        IncidentResolved(_) => IncidentDetails {
            status: IncidentStatus::Resolved,
            ..state
        },

        ResolutionAcknowledgedByCustomer(_) => IncidentDetails {
            status: IncidentStatus::ResolutionAcknowledgedByCustomer,
            ..state
        },

        IncidentClosed(_) => IncidentDetails {
            status: IncidentStatus::Closed,
            ..state
        },
    };

    IncidentDetails {
        version: state.version + 1,
        ..state
    }
}

/// One fold step over an optional state
///
/// `IncidentLogged` creates the state; any other event is applied to it.
/// Events arriving before the stream was logged leave the state absent.
pub fn evolve(state: Option<IncidentDetails>, event: &IncidentEvent) -> Option<IncidentDetails> {
    match (state, event) {
        (None, IncidentEvent::IncidentLogged(logged)) => Some(IncidentDetails::create(logged)),
        (None, _) => None,
        (Some(current), event) => Some(apply_event(current, event)),
    }
}

/// Fold a (possibly partial) event sequence onto a starting state
pub fn fold_events<'a, I>(state: Option<IncidentDetails>, events: I) -> Option<IncidentDetails>
where
    I: IntoIterator<Item = &'a IncidentEvent>,
{
    events.into_iter().fold(state, evolve)
}

// Set-union by full-field equality: an identical note is recorded once.
fn union_note(mut notes: Vec<IncidentNote>, note: IncidentNote) -> Vec<IncidentNote> {
    if !notes.contains(&note) {
        notes.push(note);
    }
    notes
}
