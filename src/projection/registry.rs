// Copyright (c) 2025 - Cowboy AI, Inc.
//! Registered projections
//!
//! Built once at startup and shared read-only by daemons and the catch-up
//! coordinator.

use std::sync::Arc;

use crate::errors::{HelpdeskError, HelpdeskResult};

use super::{AsyncProjection, ProjectionKind, ShardName};

#[derive(Default, Clone)]
pub struct ProjectionRegistry {
    projections: Vec<Arc<dyn AsyncProjection>>,
}

impl ProjectionRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a projection
    ///
    /// # Errors
    ///
    /// - `Configuration` if a projection with the same shard identity exists
    pub fn register(&mut self, projection: Arc<dyn AsyncProjection>) -> HelpdeskResult<()> {
        let shard = projection.shard_name();
        if self.get(&shard).is_some() {
            return Err(HelpdeskError::Configuration(format!(
                "Projection shard {} is already registered",
                shard
            )));
        }
        self.projections.push(projection);
        Ok(())
    }

    /// Shard names of every registered projection, in registration order
    pub fn all_shards(&self) -> Vec<ShardName> {
        self.projections.iter().map(|p| p.shard_name()).collect()
    }

    pub fn projections(&self) -> &[Arc<dyn AsyncProjection>] {
        &self.projections
    }

    /// Projection running as `shard`
    pub fn get(&self, shard: &ShardName) -> Option<Arc<dyn AsyncProjection>> {
        self.projections
            .iter()
            .find(|p| &p.shard_name() == shard)
            .cloned()
    }

    /// First projection of `kind`, restricted to an exact `name` when given
    pub fn find(&self, kind: ProjectionKind, name: Option<&str>) -> Option<Arc<dyn AsyncProjection>> {
        self.projections
            .iter()
            .find(|p| p.kind() == kind && name.map_or(true, |n| p.name() == n))
            .cloned()
    }
}
