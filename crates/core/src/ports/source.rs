//! Port traits for record collections.
//!
//! Reads and writes are separate traits: every collection implements
//! [`RecordSource`], while only tables implement
//! [`RecordStore`]. A read-only view is simply a type with no
//! `RecordStore` impl, so mutating it does not compile.
//!
//! Implementations live in the infrastructure layer (e.g., `keyset-storage`).
//! A source is expected to be already scoped to what the caller may see.

use async_trait::async_trait;

use crate::error::StorageResult;
use crate::models::{NewRecord, PersistedRecord, RecordId, SortKey};

use super::pagination::OrderDirection;

// =============================================================================
// Range Queries
// =============================================================================

/// Strict comparison against a sort key.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Comparison {
    GreaterThan,
    LessThan,
}

/// `(created_at, id) <comparison> key`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct KeyBound {
    pub comparison: Comparison,
    pub key: SortKey,
}

impl KeyBound {
    /// Everything strictly after `key`.
    pub fn after(key: SortKey) -> Self {
        Self {
            comparison: Comparison::GreaterThan,
            key,
        }
    }

    /// Everything strictly before `key`.
    pub fn before(key: SortKey) -> Self {
        Self {
            comparison: Comparison::LessThan,
            key,
        }
    }

    /// Whether `candidate` lies on the admitted side of the bound.
    pub fn admits(&self, candidate: &SortKey) -> bool {
        match self.comparison {
            Comparison::GreaterThan => candidate > &self.key,
            Comparison::LessThan => candidate < &self.key,
        }
    }
}

/// A bounded, ordered scan over a collection.
///
/// Results must be ordered by `(created_at, id)` in `order` and contain at
/// most `limit` records.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RangeQuery {
    pub bound: Option<KeyBound>,
    pub order: OrderDirection,
    pub limit: u32,
}

impl RangeQuery {
    /// Ascending scan from the start or from just after a bound.
    pub fn ascending(bound: Option<KeyBound>, limit: u32) -> Self {
        Self {
            bound,
            order: OrderDirection::Asc,
            limit,
        }
    }

    /// Descending scan from just before a bound.
    pub fn descending(bound: Option<KeyBound>, limit: u32) -> Self {
        Self {
            bound,
            order: OrderDirection::Desc,
            limit,
        }
    }

    /// Limit-1 existence probe in the direction of `bound`.
    pub fn probe(bound: KeyBound) -> Self {
        match bound.comparison {
            Comparison::GreaterThan => Self::ascending(Some(bound), 1),
            Comparison::LessThan => Self::descending(Some(bound), 1),
        }
    }
}

// =============================================================================
// Collection Traits
// =============================================================================

/// Read side of a record collection.
#[async_trait]
pub trait RecordSource: Send + Sync {
    type Record: PersistedRecord + Send + Sync;

    /// Get a record by id.
    async fn get(&self, id: &RecordId) -> StorageResult<Option<Self::Record>>;

    /// Run a bounded range scan.
    async fn range(&self, query: RangeQuery) -> StorageResult<Vec<Self::Record>>;

    /// Resolve a record id to its sort key.
    ///
    /// Sources backed by a database may override this with a narrower query.
    async fn anchor(&self, id: &RecordId) -> StorageResult<Option<SortKey>> {
        Ok(self.get(id).await?.map(|record| record.sort_key()))
    }
}

/// Write side of a record collection.
///
/// `update` replaces data only: neither `id` nor `created_at` can be
/// written through this trait.
#[async_trait]
pub trait RecordStore: RecordSource {
    type Data: Send + Sync;

    /// Insert a record. Timestamps are assigned by the store.
    async fn insert(&self, new: NewRecord<Self::Data>) -> StorageResult<Self::Record>;

    /// Replace a record's data and refresh `updated_at`.
    async fn update(&self, id: &RecordId, data: Self::Data) -> StorageResult<Option<Self::Record>>;

    /// Delete a record. Returns whether a record was removed.
    async fn delete(&self, id: &RecordId) -> StorageResult<bool>;
}
