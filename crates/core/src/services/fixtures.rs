//! In-crate test double for [`RecordSource`].

use std::sync::atomic::{AtomicUsize, Ordering};

use async_trait::async_trait;
use chrono::{TimeZone, Utc};
use uuid::Uuid;

use crate::error::{StorageError, StorageResult};
use crate::models::{PersistedRecord, Record, RecordId, RecordMeta};
use crate::ports::{OrderDirection, RangeQuery, RecordSource};

pub(crate) type Row = Record<&'static str>;

/// Record created at `secs` with id `n` and a label for assertions.
pub(crate) fn row(secs: i64, n: u128, label: &'static str) -> Row {
    let created = Utc.timestamp_opt(secs, 0).unwrap();
    Record::new(RecordMeta::created(id(n), created), label)
}

pub(crate) fn id(n: u128) -> RecordId {
    RecordId(Uuid::from_u128(n))
}

pub(crate) fn labels(rows: &[Row]) -> Vec<&'static str> {
    rows.iter().map(|r| r.data).collect()
}

/// A(1, a), B(2, b), C(3, c).
pub(crate) fn abc() -> VecSource {
    VecSource::new(vec![row(3, 0xc, "C"), row(1, 0xa, "A"), row(2, 0xb, "B")])
}

pub(crate) struct VecSource {
    rows: Vec<Row>,
    failing: bool,
    ranges: AtomicUsize,
}

impl VecSource {
    pub(crate) fn new(rows: Vec<Row>) -> Self {
        Self {
            rows,
            failing: false,
            ranges: AtomicUsize::new(0),
        }
    }

    pub(crate) fn failing(rows: Vec<Row>) -> Self {
        Self {
            failing: true,
            ..Self::new(rows)
        }
    }

    pub(crate) fn range_calls(&self) -> usize {
        self.ranges.load(Ordering::SeqCst)
    }

    fn check(&self) -> StorageResult<()> {
        if self.failing {
            return Err(StorageError::QueryError("connection reset".into()));
        }
        Ok(())
    }
}

#[async_trait]
impl RecordSource for VecSource {
    type Record = Row;

    async fn get(&self, id: &RecordId) -> StorageResult<Option<Row>> {
        self.check()?;
        Ok(self.rows.iter().find(|r| r.id() == *id).cloned())
    }

    async fn range(&self, query: RangeQuery) -> StorageResult<Vec<Row>> {
        self.ranges.fetch_add(1, Ordering::SeqCst);
        self.check()?;

        let mut rows: Vec<Row> = self
            .rows
            .iter()
            .filter(|r| query.bound.is_none_or(|b| b.admits(&r.sort_key())))
            .cloned()
            .collect();
        rows.sort_by_key(|r| r.sort_key());
        if query.order == OrderDirection::Desc {
            rows.reverse();
        }
        rows.truncate(query.limit as usize);
        Ok(rows)
    }
}
