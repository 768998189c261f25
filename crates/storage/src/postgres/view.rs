//! Read-only PostgreSQL view.

use async_trait::async_trait;

use keyset_core::error::StorageResult;
use keyset_core::models::{Record, RecordId, SortKey};
use keyset_core::ports::{RangeQuery, RecordSource};

use super::relation::{PgData, PgRelation};

/// A relation that can only be read.
///
/// Typically a database view unioning several tables that share the record
/// columns. `PgView` implements [`RecordSource`] and nothing else, so it can
/// be paginated but never written through. Any table can also be opened as a
/// view when the caller should only read it.
pub struct PgView<D> {
    relation: PgRelation<D>,
}

impl<D> Clone for PgView<D> {
    fn clone(&self) -> Self {
        Self {
            relation: self.relation.clone(),
        }
    }
}

impl<D: PgData> PgView<D> {
    pub fn new(relation: PgRelation<D>) -> Self {
        Self { relation }
    }
}

#[async_trait]
impl<D: PgData> RecordSource for PgView<D> {
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
