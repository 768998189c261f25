//! Read/write PostgreSQL table.

use std::sync::Arc;

use async_trait::async_trait;

use keyset_core::error::StorageResult;
use keyset_core::models::{NewRecord, Record, RecordId, SortKey};
use keyset_core::ports::{IdGenerator, RangeQuery, RecordSource, RecordStore, UuidV4Generator};

use super::relation::{PgData, PgRelation, PgWrite};

/// PostgreSQL table implementing both [`RecordSource`] and [`RecordStore`].
///
/// Timestamps come from the database (`now()`); ids that the caller leaves
/// out are drawn from the injected generator. The relation's scope restricts
/// reads, updates and deletes; inserts through a scoped table are not
/// filtered.
pub struct PgTable<D> {
    relation: PgRelation<D>,
    ids: Arc<dyn IdGenerator>,
}

impl<D> Clone for PgTable<D> {
    fn clone(&self) -> Self {
        Self {
            relation: self.relation.clone(),
            ids: Arc::clone(&self.ids),
        }
    }
}

impl<D: PgWrite> PgTable<D> {
    pub fn new(relation: PgRelation<D>, ids: Arc<dyn IdGenerator>) -> Self {
        Self { relation, ids }
    }

    /// Table generating random v4 ids.
    pub fn with_random_ids(relation: PgRelation<D>) -> Self {
        Self::new(relation, Arc::new(UuidV4Generator))
    }
}

#[async_trait]
impl<D: PgData> RecordSource for PgTable<D> {
    type Record = Record<D>;

    async fn get(&self, id: &RecordId) -> StorageResult<Option<Record<D>>> {
        self.relation.fetch_one(id).await
    }

    async fn range(&self, query: RangeQuery) -> StorageResult<Vec<Record<D>>> {
        self.relation.fetch_range(&query).await
    }

    async fn anchor(&self, id: &RecordId) -> StorageResult<Option<SortKey>> {
        self.relation.fetch_anchor(id).await
    }
}

#[async_trait]
impl<D: PgWrite> RecordStore for PgTable<D> {
    type Data = D;

    async fn insert(&self, new: NewRecord<D>) -> StorageResult<Record<D>> {
        let id = new.id.unwrap_or_else(|| self.ids.generate());
        self.relation.insert_row(id, &new.data).await
    }

    async fn update(&self, id: &RecordId, data: D) -> StorageResult<Option<Record<D>>> {
        self.relation.update_row(id, &data).await
    }

    async fn delete(&self, id: &RecordId) -> StorageResult<bool> {
        self.relation.delete_row(id).await
    }
}
