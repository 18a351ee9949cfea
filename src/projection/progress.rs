// Copyright (c) 2025 - Cowboy AI, Inc.
//! Projection documents and progress storage
//!
//! Documents and the shard's progress are committed together: after a crash
//! a worker resumes from a progress value that matches the documents on disk.

use std::collections::HashMap;

use async_trait::async_trait;
use serde_json::Value;
use tokio::sync::RwLock;
use uuid::Uuid;

use crate::errors::{HelpdeskError, HelpdeskResult};

use super::{DatabaseId, ShardName};

/// Highest global sequence a shard has fully processed in one database
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ShardProgress {
    pub database: DatabaseId,
    pub shard_name: ShardName,
    pub sequence: u64,
}

/// Document upserts and the progress they bring the shard to
#[derive(Debug, Clone, PartialEq)]
pub struct ProjectionBatch {
    pub shard: ShardName,

    /// Progress after this batch
    pub sequence: u64,

    /// Documents keyed by stream id
    pub documents: HashMap<Uuid, Value>,
}

/// Storage for projected documents and shard progress of one database
#[async_trait]
pub trait ProjectionStorage: Send + Sync {
    /// Database these documents belong to
    fn database(&self) -> &DatabaseId;

    /// Read one document of a shard
    async fn load_document(&self, shard: &ShardName, id: Uuid) -> HelpdeskResult<Option<Value>>;

    /// Write documents and progress atomically
    ///
    /// # Errors
    ///
    /// - `Storage` if the batch would move progress backwards
    async fn commit(&self, batch: ProjectionBatch) -> HelpdeskResult<()>;

    /// Recorded progress of a shard (0 when it never committed)
    async fn progress(&self, shard: &ShardName) -> HelpdeskResult<u64>;

    /// Every recorded progress in this database
    async fn all_progress(&self) -> HelpdeskResult<Vec<ShardProgress>>;

    /// Drop a shard's documents and progress so it rebuilds from the start
    async fn reset_shard(&self, shard: &ShardName) -> HelpdeskResult<()>;
}

#[derive(Default)]
struct Tables {
    documents: HashMap<(ShardName, Uuid), Value>,
    progress: HashMap<ShardName, u64>,
}

/// In-process projection storage
pub struct InMemoryProjectionStorage {
    database: DatabaseId,
    tables: RwLock<Tables>,
}

impl InMemoryProjectionStorage {
    pub fn new(database: impl Into<DatabaseId>) -> Self {
        Self {
            database: database.into(),
            tables: RwLock::new(Tables::default()),
        }
    }

    /// Number of documents stored for a shard
    pub async fn document_count(&self, shard: &ShardName) -> usize {
        self.tables
            .read()
            .await
            .documents
            .keys()
            .filter(|(s, _)| s == shard)
            .count()
    }
}

#[async_trait]
impl ProjectionStorage for InMemoryProjectionStorage {
    fn database(&self) -> &DatabaseId {
        &self.database
    }

    async fn load_document(&self, shard: &ShardName, id: Uuid) -> HelpdeskResult<Option<Value>> {
        let tables = self.tables.read().await;
        Ok(tables.documents.get(&(shard.clone(), id)).cloned())
    }

    async fn commit(&self, batch: ProjectionBatch) -> HelpdeskResult<()> {
        let mut tables = self.tables.write().await;

        let current = tables.progress.get(&batch.shard).copied().unwrap_or(0);
        if batch.sequence < current {
            return Err(HelpdeskError::Storage(format!(
                "Progress of {} would move back from {} to {}",
                batch.shard, current, batch.sequence
            )));
        }

        for (id, document) in batch.documents {
            tables.documents.insert((batch.shard.clone(), id), document);
        }
        tables.progress.insert(batch.shard, batch.sequence);

        Ok(())
    }

    async fn progress(&self, shard: &ShardName) -> HelpdeskResult<u64> {
        Ok(self
            .tables
            .read()
            .await
            .progress
            .get(shard)
            .copied()
            .unwrap_or(0))
    }

    async fn all_progress(&self) -> HelpdeskResult<Vec<ShardProgress>> {
        let tables = self.tables.read().await;
        let mut all: Vec<ShardProgress> = tables
            .progress
            .iter()
            .map(|(shard, sequence)| ShardProgress {
                database: self.database.clone(),
                shard_name: shard.clone(),
                sequence: *sequence,
            })
            .collect();
        all.sort_by_key(|p| p.shard_name.identity());
        Ok(all)
    }

    async fn reset_shard(&self, shard: &ShardName) -> HelpdeskResult<()> {
        let mut tables = self.tables.write().await;
        tables.documents.retain(|(s, _), _| s != shard);
        tables.progress.remove(shard);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn batch(shard: &ShardName, sequence: u64, id: Uuid) -> ProjectionBatch {
        ProjectionBatch {
            shard: shard.clone(),
            sequence,
            documents: HashMap::from([(id, json!({ "sequence": sequence }))]),
        }
    }

    #[tokio::test]
    async fn test_commit_writes_documents_and_progress() {
        let storage = InMemoryProjectionStorage::new("default");
        let shard = ShardName::new("Snapshot");
        let id = Uuid::now_v7();

        storage.commit(batch(&shard, 4, id)).await.unwrap();

        assert_eq!(storage.progress(&shard).await.unwrap(), 4);
        assert_eq!(
            storage.load_document(&shard, id).await.unwrap(),
            Some(json!({ "sequence": 4 }))
        );
        assert_eq!(
            storage.all_progress().await.unwrap(),
            vec![ShardProgress {
                database: DatabaseId::new("default"),
                shard_name: shard,
                sequence: 4,
            }]
        );
    }

    #[tokio::test]
    async fn test_commit_rejects_regressing_progress() {
        let storage = InMemoryProjectionStorage::new("default");
        let shard = ShardName::new("Snapshot");
        let id = Uuid::now_v7();
        storage.commit(batch(&shard, 4, id)).await.unwrap();

        let result = storage.commit(batch(&shard, 2, id)).await;

        assert!(matches!(result, Err(HelpdeskError::Storage(_))));
        assert_eq!(
            storage.load_document(&shard, id).await.unwrap(),
            Some(json!({ "sequence": 4 }))
        );
    }

    #[tokio::test]
    async fn test_reset_shard_only_touches_that_shard() {
        let storage = InMemoryProjectionStorage::new("default");
        let snapshot = ShardName::new("Snapshot");
        let report = ShardName::new("Report");
        let id = Uuid::now_v7();
        storage.commit(batch(&snapshot, 3, id)).await.unwrap();
        storage.commit(batch(&report, 3, id)).await.unwrap();

        storage.reset_shard(&snapshot).await.unwrap();

        assert_eq!(storage.progress(&snapshot).await.unwrap(), 0);
        assert_eq!(storage.document_count(&snapshot).await, 0);
        assert_eq!(storage.progress(&report).await.unwrap(), 3);
        assert_eq!(storage.document_count(&report).await, 1);
    }
}
