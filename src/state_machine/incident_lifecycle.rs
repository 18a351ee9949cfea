// Copyright (c) 2025 - Cowboy AI, Inc.
//! Incident Status Lifecycle
//!
//! # States
//!
//! - Pending: initial, set when the incident is logged
//! - Resolved: an agent resolved it
//! - ResolutionAcknowledgedByCustomer: the customer accepted the resolution
//! - Closed: terminal
//!
//! # Inputs
//!
//! - Resolve: Pending → Resolved
//! - AcknowledgeResolution: Resolved → ResolutionAcknowledgedByCustomer
//! - Close: ResolutionAcknowledgedByCustomer → Closed

use serde::{Deserialize, Serialize};

use super::{StateMachine, TransitionError, TransitionResult};

/// Incident status
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum IncidentStatus {
    Pending,
    Resolved,
    ResolutionAcknowledgedByCustomer,
    Closed,
}

impl IncidentStatus {
    /// Closed incidents accept no further changes
    pub fn is_terminal(&self) -> bool {
        matches!(self, IncidentStatus::Closed)
    }
}

/// Status transition requested by the write side (FSM input)
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StatusTransition {
    Resolve,
    AcknowledgeResolution,
    Close,
}

impl StateMachine for IncidentStatus {
    type Input = StatusTransition;
    type Output = ();

    fn transition(&self, input: &Self::Input) -> TransitionResult<(Self, Self::Output)> {
        use IncidentStatus::*;
        use StatusTransition::*;

        match (self, input) {
            (Pending, Resolve) => Ok((Resolved, ())),
            (Resolved, AcknowledgeResolution) => Ok((ResolutionAcknowledgedByCustomer, ())),
            (ResolutionAcknowledgedByCustomer, Close) => Ok((Closed, ())),

            (Closed, _) => Err(TransitionError::BusinessRuleViolation(
                "Incident is already closed".to_string(),
            )),
            (Resolved, Resolve) | (ResolutionAcknowledgedByCustomer, Resolve) => Err(
                TransitionError::BusinessRuleViolation(
                    "It's not possible to resolve already resolved incident".to_string(),
                ),
            ),
            (_, AcknowledgeResolution) => Err(TransitionError::BusinessRuleViolation(
                "Only resolved incident can be acknowledged".to_string(),
            )),
            (_, Close) => Err(TransitionError::InvalidTransition {
                from: format!("{:?}", self),
                to: "Closed".to_string(),
            }),
        }
    }

    fn valid_inputs(&self) -> Vec<Self::Input> {
        use IncidentStatus::*;
        use StatusTransition::*;

        match self {
            Pending => vec![Resolve],
            Resolved => vec![AcknowledgeResolution],
            ResolutionAcknowledgedByCustomer => vec![Close],
            Closed => vec![],
        }
    }
}
