//! Read/write in-memory table.

use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;

use async_trait::async_trait;
use parking_lot::RwLock;
use tracing::trace;

use keyset_core::error::{StorageError, StorageResult};
use keyset_core::models::{NewRecord, Record, RecordId, RecordMeta, SortKey};
use keyset_core::ports::{
    Clock, IdGenerator, RangeQuery, RecordSource, RecordStore, SystemClock, UuidV4Generator,
};

use super::{ScopeFilter, in_scope, scan};

struct TableState<D> {
    rows: BTreeMap<SortKey, Record<D>>,
    keys: HashMap<RecordId, SortKey>,
}

impl<D> Default for TableState<D> {
    fn default() -> Self {
        Self {
            rows: BTreeMap::new(),
            keys: HashMap::new(),
        }
    }
}

impl<D> TableState<D> {
    fn get(&self, id: &RecordId) -> Option<&Record<D>> {
        self.keys.get(id).and_then(|key| self.rows.get(key))
    }
}

/// In-memory table implementing [`RecordSource`] and [`RecordStore`].
///
/// Clones share the same rows. [`MemoryTable::scoped`] returns a handle over
/// the same rows that only sees (and only mutates) records matching a
/// predicate; inserts through a scoped handle are not filtered.
pub struct MemoryTable<D> {
    state: Arc<RwLock<TableState<D>>>,
    scope: Option<ScopeFilter<D>>,
    ids: Arc<dyn IdGenerator>,
    clock: Arc<dyn Clock>,
}

impl<D> Clone for MemoryTable<D> {
    fn clone(&self) -> Self {
        Self {
            state: Arc::clone(&self.state),
            scope: self.scope.clone(),
            ids: Arc::clone(&self.ids),
            clock: Arc::clone(&self.clock),
        }
    }
}

impl<D> Default for MemoryTable<D> {
    fn default() -> Self {
        Self::new(Arc::new(UuidV4Generator), Arc::new(SystemClock))
    }
}

impl<D> MemoryTable<D> {
    pub fn new(ids: Arc<dyn IdGenerator>, clock: Arc<dyn Clock>) -> Self {
        Self {
            state: Arc::new(RwLock::new(TableState::default())),
            scope: None,
            ids,
            clock,
        }
    }

    /// A handle over the same rows restricted to records matching `keep`.
    pub fn scoped(&self, keep: impl Fn(&Record<D>) -> bool + Send + Sync + 'static) -> Self {
        Self {
            scope: Some(Arc::new(keep)),
            ..self.clone()
        }
    }

    /// Number of visible records.
    pub fn len(&self) -> usize {
        let state = self.state.read();
        state
            .rows
            .values()
            .filter(|record| in_scope(&self.scope, record))
            .count()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Visible records in sort order, with data mapped through `f`.
    ///
    /// This is the building block for [`super::MemoryView`] projections.
    pub fn project<E>(&self, f: impl Fn(&D) -> E) -> Vec<Record<E>> {
        let state = self.state.read();
        state
            .rows
            .values()
            .filter(|record| in_scope(&self.scope, record))
            .map(|record| Record::new(record.meta.clone(), f(&record.data)))
            .collect()
    }
}

#[async_trait]
impl<D: Clone + Send + Sync + 'static> RecordSource for MemoryTable<D> {
    type Record = Record<D>;

    async fn get(&self, id: &RecordId) -> StorageResult<Option<Record<D>>> {
        let state = self.state.read();
        Ok(state
            .get(id)
            .filter(|record| in_scope(&self.scope, record))
            .cloned())
    }

    async fn range(&self, query: RangeQuery) -> StorageResult<Vec<Record<D>>> {
        let state = self.state.read();
        Ok(scan(&state.rows, &query, &self.scope))
    }
}

#[async_trait]
impl<D: Clone + Send + Sync + 'static> RecordStore for MemoryTable<D> {
    type Data = D;

    async fn insert(&self, new: NewRecord<D>) -> StorageResult<Record<D>> {
        let id = new.id.unwrap_or_else(|| self.ids.generate());
        let mut state = self.state.write();

        if state.keys.contains_key(&id) {
            return Err(StorageError::ConstraintViolation(format!(
                "duplicate record id {id}"
            )));
        }

        let record = Record::new(RecordMeta::created(id, self.clock.now()), new.data);
        let key = record.meta.sort_key();
        state.keys.insert(id, key);
        state.rows.insert(key, record.clone());

        trace!(%id, "Record inserted");
        Ok(record)
    }

    async fn update(&self, id: &RecordId, data: D) -> StorageResult<Option<Record<D>>> {
        let now = self.clock.now();
        let mut state = self.state.write();

        let Some(key) = state.keys.get(id).copied() else {
            return Ok(None);
        };
        let Some(record) = state.rows.get_mut(&key) else {
            return Ok(None);
        };
        if !in_scope(&self.scope, record) {
            return Ok(None);
        }

        record.meta = record.meta.touched(now);
        record.data = data;

        trace!(%id, "Record updated");
        Ok(Some(record.clone()))
    }

    async fn delete(&self, id: &RecordId) -> StorageResult<bool> {
        let mut state = self.state.write();

        let visible = state
            .get(id)
            .is_some_and(|record| in_scope(&self.scope, record));
        if !visible {
            return Ok(false);
        }

        if let Some(key) = state.keys.remove(id) {
            state.rows.remove(&key);
        }

        trace!(%id, "Record deleted");
        Ok(true)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, TimeZone, Utc};
    use keyset_core::models::PersistedRecord;
    use keyset_core::ports::{KeyBound, ManualClock, SequentialIds};

    fn table() -> (MemoryTable<String>, Arc<ManualClock>) {
        let clock = Arc::new(ManualClock::new(Utc.timestamp_opt(1_000, 0).unwrap()));
        let table = MemoryTable::new(Arc::new(SequentialIds::new()), clock.clone());
        (table, clock)
    }

    #[tokio::test]
    async fn test_insert_assigns_id_and_timestamps() {
        let (table, clock) = table();
        let record = table.insert(NewRecord::new("a".to_string())).await.unwrap();
        let next = table.insert(NewRecord::new("b".to_string())).await.unwrap();

        // Ids viennent du générateur injecté
        assert_eq!(record.id(), RecordId(uuid::Uuid::from_u128(1)));
        assert_eq!(next.id(), RecordId(uuid::Uuid::from_u128(2)));
        assert_eq!(record.created_at(), clock.now());
        assert_eq!(record.updated_at(), clock.now());
        assert_eq!(table.get(&record.id()).await.unwrap(), Some(record));
    }

    #[tokio::test]
    async fn test_insert_keeps_caller_id() {
        let (table, _) = table();
        let id = RecordId(uuid::Uuid::from_u128(99));
        let record = table
            .insert(NewRecord::with_id(id, "a".to_string()))
            .await
            .unwrap();
        assert_eq!(record.id(), id);
    }

    // Test critique: un id déjà présent est refusé
    #[tokio::test]
    async fn test_duplicate_id_is_a_constraint_violation() {
        let (table, _) = table();
        let id = RecordId(uuid::Uuid::from_u128(1));
        table
            .insert(NewRecord::with_id(id, "a".to_string()))
            .await
            .unwrap();

        let err = table
            .insert(NewRecord::with_id(id, "b".to_string()))
            .await
            .unwrap_err();
        assert!(matches!(err, StorageError::ConstraintViolation(_)));
        assert_eq!(table.len(), 1);
    }

    // Test critique: update rafraîchit updated_at sans toucher created_at
    #[tokio::test]
    async fn test_update_refreshes_updated_at_only() {
        let (table, clock) = table();
        let created = table.insert(NewRecord::new("a".to_string())).await.unwrap();

        clock.advance(Duration::seconds(5));
        let updated = table
            .update(&created.id(), "b".to_string())
            .await
            .unwrap()
            .unwrap();

        assert_eq!(updated.id(), created.id());
        assert_eq!(updated.created_at(), created.created_at());
        assert_eq!(updated.updated_at(), clock.now());
        assert_eq!(updated.data, "b");
    }

    #[tokio::test]
    async fn test_update_and_delete_unknown_id() {
        let (table, _) = table();
        let missing = RecordId(uuid::Uuid::from_u128(404));
        assert!(table.update(&missing, "x".to_string()).await.unwrap().is_none());
        assert!(!table.delete(&missing).await.unwrap());
    }

    #[tokio::test]
    async fn test_delete_removes_record() {
        let (table, _) = table();
        let record = table.insert(NewRecord::new("a".to_string())).await.unwrap();

        assert!(table.delete(&record.id()).await.unwrap());
        assert!(table.get(&record.id()).await.unwrap().is_none());
        assert!(table.is_empty());
    }

    // Test critique: même timestamp, l'ordre suit l'id
    #[tokio::test]
    async fn test_range_orders_ties_by_id() {
        let (table, _) = table();
        for label in ["a", "b", "c"] {
            table.insert(NewRecord::new(label.to_string())).await.unwrap();
        }

        let asc = table.range(RangeQuery::ascending(None, 10)).await.unwrap();
        let labels: Vec<_> = asc.iter().map(|r| r.data.as_str()).collect();
        assert_eq!(labels, ["a", "b", "c"]);

        let bound = KeyBound::before(asc[2].sort_key());
        let desc = table.range(RangeQuery::descending(Some(bound), 10)).await.unwrap();
        let labels: Vec<_> = desc.iter().map(|r| r.data.as_str()).collect();
        assert_eq!(labels, ["b", "a"]);
    }

    #[tokio::test]
    async fn test_scoped_handle_hides_and_protects_other_rows() {
        let (table, _) = table();
        let mine = table.insert(NewRecord::new("mine".to_string())).await.unwrap();
        let theirs = table.insert(NewRecord::new("theirs".to_string())).await.unwrap();

        let scoped = table.scoped(|r| r.data.starts_with("mine"));

        assert_eq!(scoped.len(), 1);
        assert!(scoped.get(&theirs.id()).await.unwrap().is_none());
        assert!(scoped.anchor(&theirs.id()).await.unwrap().is_none());
        assert!(scoped.update(&theirs.id(), "x".to_string()).await.unwrap().is_none());
        assert!(!scoped.delete(&theirs.id()).await.unwrap());
        assert!(scoped.get(&mine.id()).await.unwrap().is_some());

        // Les lignes restent partagées avec la table d'origine
        assert_eq!(table.len(), 2);
    }

    #[tokio::test]
    async fn test_project_maps_data_and_keeps_order() {
        let (table, clock) = table();
        table.insert(NewRecord::new("a".to_string())).await.unwrap();
        clock.advance(Duration::seconds(1));
        table.insert(NewRecord::new("bb".to_string())).await.unwrap();

        let lengths: Vec<usize> = table.project(String::len).into_iter().map(|r| r.data).collect();
        assert_eq!(lengths, [1, 2]);
    }
}
