// Copyright (c) 2025 - Cowboy AI, Inc.
//! Property-Based Tests Module
//!
//! Laws of the incident fold and of the asynchronous snapshot projection.

mod incident_fold;
