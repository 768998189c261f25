//! Read-only in-memory view.

use std::collections::BTreeMap;
use std::sync::Arc;

use async_trait::async_trait;

use keyset_core::error::StorageResult;
use keyset_core::models::{PersistedRecord, Record, RecordId, SortKey};
use keyset_core::ports::{RangeQuery, RecordSource};

use super::{ScopeFilter, in_scope, scan};

type Projection<D> = Arc<dyn Fn() -> Vec<Record<D>> + Send + Sync>;

/// A read-only collection computed from other collections.
///
/// The projection is evaluated on every read, so the view always reflects
/// the current state of whatever it projects. A typical projection unions
/// several [`super::MemoryTable`]s into one record kind.
///
/// `MemoryView` implements [`RecordSource`] only:
///
/// ```compile_fail
/// use keyset_core::models::NewRecord;
/// use keyset_core::ports::RecordStore;
/// use keyset_storage::memory::MemoryView;
///
/// async fn write(view: MemoryView<u32>) {
///     view.insert(NewRecord::new(1)).await;
/// }
/// ```
pub struct MemoryView<D> {
    projection: Projection<D>,
    scope: Option<ScopeFilter<D>>,
}

impl<D> Clone for MemoryView<D> {
    fn clone(&self) -> Self {
        Self {
            projection: Arc::clone(&self.projection),
            scope: self.scope.clone(),
        }
    }
}

impl<D> MemoryView<D> {
    pub fn new(projection: impl Fn() -> Vec<Record<D>> + Send + Sync + 'static) -> Self {
        Self {
            projection: Arc::new(projection),
            scope: None,
        }
    }

    /// The same view restricted to records matching `keep`.
    pub fn scoped(&self, keep: impl Fn(&Record<D>) -> bool + Send + Sync + 'static) -> Self {
        Self {
            projection: Arc::clone(&self.projection),
            scope: Some(Arc::new(keep)),
        }
    }

    fn snapshot(&self) -> BTreeMap<SortKey, Record<D>> {
        (self.projection)()
            .into_iter()
            .map(|record| (record.sort_key(), record))
            .collect()
    }
}

#[async_trait]
impl<D: Clone + Send + Sync + 'static> RecordSource for MemoryView<D> {
    type Record = Record<D>;

    async fn get(&self, id: &RecordId) -> StorageResult<Option<Record<D>>> {
        Ok((self.projection)()
            .into_iter()
            .find(|record| record.id() == *id && in_scope(&self.scope, record)))
    }

    async fn range(&self, query: RangeQuery) -> StorageResult<Vec<Record<D>>> {
        Ok(scan(&self.snapshot(), &query, &self.scope))
    }
}
