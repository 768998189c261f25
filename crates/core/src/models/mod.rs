//! Domain models for paginated records.
//!
//! These models are storage-agnostic. Every paginated collection holds
//! values implementing [`PersistedRecord`], which exposes the metadata the
//! keyset ordering depends on.

use std::cmp::Ordering;
use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, SecondsFormat, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

// =============================================================================
// Record Identity
// =============================================================================

/// Globally unique, immutable record identifier.
///
/// Ordering compares the raw UUID bytes, which matches both the canonical
/// lowercase text order and PostgreSQL's `uuid` ordering.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RecordId(pub Uuid);

impl RecordId {
    /// Get the inner UUID.
    pub fn as_uuid(&self) -> &Uuid {
        &self.0
    }
}

impl fmt::Display for RecordId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0.hyphenated())
    }
}

impl FromStr for RecordId {
    type Err = uuid::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Uuid::parse_str(s).map(Self)
    }
}

impl From<Uuid> for RecordId {
    fn from(uuid: Uuid) -> Self {
        Self(uuid)
    }
}

// =============================================================================
// Sort Key
// =============================================================================

/// The `(created_at, id)` tuple every paginated collection is ordered by.
///
/// `id` breaks ties between records created at the same instant, so the
/// ordering is total as long as ids are unique.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SortKey {
    pub created_at: DateTime<Utc>,
    pub id: RecordId,
}

impl SortKey {
    pub fn new(created_at: DateTime<Utc>, id: RecordId) -> Self {
        Self { created_at, id }
    }
}

impl Ord for SortKey {
    fn cmp(&self, other: &Self) -> Ordering {
        self.created_at
            .cmp(&other.created_at)
            .then_with(|| self.id.cmp(&other.id))
    }
}

impl PartialOrd for SortKey {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

// =============================================================================
// Record Metadata
// =============================================================================

/// Identity and timestamps shared by every persisted record.
///
/// The fields are private: `id` and `created_at` are fixed when the record
/// is created, and `updated_at` only moves through [`RecordMeta::touched`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RecordMeta {
    id: RecordId,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl RecordMeta {
    /// Metadata for a record inserted at `now`.
    pub fn created(id: RecordId, now: DateTime<Utc>) -> Self {
        Self {
            id,
            created_at: now,
            updated_at: now,
        }
    }

    /// Rebuild metadata read back from storage.
    pub fn restore(id: RecordId, created_at: DateTime<Utc>, updated_at: DateTime<Utc>) -> Self {
        Self {
            id,
            created_at,
            updated_at,
        }
    }

    /// Same record, updated at `now`.
    pub fn touched(&self, now: DateTime<Utc>) -> Self {
        Self {
            updated_at: now,
            ..self.clone()
        }
    }

    pub fn id(&self) -> RecordId {
        self.id
    }

    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    pub fn updated_at(&self) -> DateTime<Utc> {
        self.updated_at
    }

    pub fn sort_key(&self) -> SortKey {
        SortKey::new(self.created_at, self.id)
    }
}

// =============================================================================
// Persisted Records
// =============================================================================

/// Entity contract every paginated collection must satisfy.
pub trait PersistedRecord {
    fn meta(&self) -> &RecordMeta;

    fn id(&self) -> RecordId {
        self.meta().id()
    }

    fn created_at(&self) -> DateTime<Utc> {
        self.meta().created_at()
    }

    fn updated_at(&self) -> DateTime<Utc> {
        self.meta().updated_at()
    }

    fn sort_key(&self) -> SortKey {
        self.meta().sort_key()
    }
}

/// A stored record: metadata plus caller-defined data.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Record<D> {
    pub meta: RecordMeta,
    pub data: D,
}

impl<D> Record<D> {
    pub fn new(meta: RecordMeta, data: D) -> Self {
        Self { meta, data }
    }

    /// Replace the data while keeping the metadata.
    ///
    /// Used to project one record kind into another, e.g. when building a
    /// combined read-only view.
    pub fn map<E>(self, f: impl FnOnce(D) -> E) -> Record<E> {
        Record {
            meta: self.meta,
            data: f(self.data),
        }
    }
}

impl<D> PersistedRecord for Record<D> {
    fn meta(&self) -> &RecordMeta {
        &self.meta
    }
}

/// Input for creating a record. A missing id is generated by the store.
#[derive(Debug, Clone)]
pub struct NewRecord<D> {
    pub id: Option<RecordId>,
    pub data: D,
}

impl<D> NewRecord<D> {
    pub fn new(data: D) -> Self {
        Self { id: None, data }
    }

    pub fn with_id(id: RecordId, data: D) -> Self {
        Self { id: Some(id), data }
    }
}

// =============================================================================
// Boundary Formatting
// =============================================================================

/// Render a timestamp for external consumers.
///
/// RFC 3339 in UTC with millisecond precision and a `Z` suffix, e.g.
/// `2024-01-01T00:00:00.000Z`.
pub fn format_timestamp(ts: &DateTime<Utc>) -> String {
    ts.to_rfc3339_opts(SecondsFormat::Millis, true)
}

// =============================================================================
// Tests
// =============================================================================
