// Copyright (c) 2025 - Cowboy AI, Inc.
//! Projection host: the daemons of every database

use std::collections::BTreeMap;
use std::sync::Arc;

use crate::errors::{HelpdeskError, HelpdeskResult};

use super::daemon::ProjectionDaemon;
use super::progress::ShardProgress;
use super::DatabaseId;

#[derive(Default)]
pub struct ProjectionHost {
    daemons: BTreeMap<DatabaseId, Arc<ProjectionDaemon>>,
}

impl ProjectionHost {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add the daemon of one database
    ///
    /// # Errors
    ///
    /// - `Configuration` if the database already has a daemon
    pub fn add_daemon(&mut self, daemon: ProjectionDaemon) -> HelpdeskResult<Arc<ProjectionDaemon>> {
        let database = daemon.database().clone();
        if self.daemons.contains_key(&database) {
            return Err(HelpdeskError::Configuration(format!(
                "Database {} already has a projection daemon",
                database
            )));
        }

        let daemon = Arc::new(daemon);
        self.daemons.insert(database, daemon.clone());
        Ok(daemon)
    }

    pub fn databases(&self) -> Vec<DatabaseId> {
        self.daemons.keys().cloned().collect()
    }

    pub fn daemon_for_database(&self, database: &DatabaseId) -> Option<Arc<ProjectionDaemon>> {
        self.daemons.get(database).cloned()
    }

    pub fn daemons(&self) -> impl Iterator<Item = &Arc<ProjectionDaemon>> {
        self.daemons.values()
    }

    /// Progress of every shard in every database
    pub async fn all_projection_progress(&self) -> HelpdeskResult<Vec<ShardProgress>> {
        let mut all = Vec::new();
        for daemon in self.daemons.values() {
            all.extend(daemon.all_progress().await?);
        }
        Ok(all)
    }

    pub async fn start_all(&self) -> HelpdeskResult<()> {
        for daemon in self.daemons.values() {
            daemon.start_all().await?;
        }
        Ok(())
    }

    pub async fn stop_all(&self) {
        for daemon in self.daemons.values() {
            daemon.stop_all().await;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::DaemonConfig;
    use crate::event_store::InMemoryEventStore;
    use crate::projection::{
        InMemoryProjectionStorage, IncidentDetailsSnapshotProjection, ProjectionRegistry,
    };

    #[test]
    fn test_one_daemon_per_database() {
        let store = Arc::new(InMemoryEventStore::new());
        let mut registry = ProjectionRegistry::new();
        registry
            .register(Arc::new(IncidentDetailsSnapshotProjection::new()))
            .unwrap();
        let registry = Arc::new(registry);

        let daemon = |db: &str| {
            ProjectionDaemon::new(
                store.clone(),
                Arc::new(InMemoryProjectionStorage::new(db)),
                registry.clone(),
                DaemonConfig::default(),
            )
        };

        let mut host = ProjectionHost::new();
        host.add_daemon(daemon("tenant_b")).unwrap();
        host.add_daemon(daemon("tenant_a")).unwrap();

        assert!(matches!(
            host.add_daemon(daemon("tenant_a")),
            Err(HelpdeskError::Configuration(_))
        ));
        assert_eq!(
            host.databases(),
            vec![DatabaseId::new("tenant_a"), DatabaseId::new("tenant_b")]
        );
        assert!(host.daemon_for_database(&"tenant_a".into()).is_some());
        assert!(host.daemon_for_database(&"missing".into()).is_none());
    }
}
