// Copyright (c) 2025 - Cowboy AI, Inc.
//! Pure Functional Incident Aggregate
//!
//! - Commands are validated by pure handlers: State → Command → Result<Event, Error>
//! - State is reconstructed by folding events: [Event] → State
//! - No mutations, no side effects, no clock reads
//!
//! # Event Sourcing Pattern
//!
//! ```text
//! Command → handle_*() → IncidentEvent → EventStore
//!                              ↓
//!                 evolve(Option<State>, &Event)
//! ```
//!
//! # Fold Pattern
//!
//! ```rust,ignore
//! let state = stored
//!     .iter()
//!     .map(|e| &e.data)
//!     .fold(None, evolve);
//! ```
//!
//! Event application never validates: the write side already did, and a
//! recorded event is a fact. `apply_event` overwrites status without
//! consulting the lifecycle.

pub mod commands;
pub mod handlers;
pub mod incident;

pub use commands::*;
pub use handlers::*;
pub use incident::{
    apply_event, evolve, fold_events, IncidentDetails, IncidentNote, IncidentNoteType,
};
