//! In-memory storage adapter.
//!
//! Keeps records in a `BTreeMap` keyed by [`SortKey`], so range scans walk
//! the map in `(created_at, id)` order directly. Used by tests and by
//! callers that want a paginated collection without a database.

mod table;
mod view;

pub use table::MemoryTable;
pub use view::MemoryView;

use std::collections::BTreeMap;
use std::ops::Bound;
use std::sync::Arc;

use keyset_core::models::{Record, SortKey};
use keyset_core::ports::{Comparison, OrderDirection, RangeQuery};

/// Scope predicate applied to every read and mutation.
pub type ScopeFilter<D> = Arc<dyn Fn(&Record<D>) -> bool + Send + Sync>;

pub(crate) fn in_scope<D>(scope: &Option<ScopeFilter<D>>, record: &Record<D>) -> bool {
    scope.as_ref().is_none_or(|keep| keep(record))
}

/// Run a range query over records already ordered by sort key.
pub(crate) fn scan<D: Clone>(
    rows: &BTreeMap<SortKey, Record<D>>,
    query: &RangeQuery,
    scope: &Option<ScopeFilter<D>>,
) -> Vec<Record<D>> {
    let range = match query.bound {
        None => rows.range(..),
        Some(bound) => match bound.comparison {
            Comparison::GreaterThan => rows.range((Bound::Excluded(bound.key), Bound::Unbounded)),
            Comparison::LessThan => rows.range((Bound::Unbounded, Bound::Excluded(bound.key))),
        },
    };

    let limit = query.limit as usize;
    let visible = range
        .map(|(_, record)| record)
        .filter(|record| in_scope(scope, record));

    match query.order {
        OrderDirection::Asc => visible.take(limit).cloned().collect(),
        OrderDirection::Desc => visible.rev().take(limit).cloned().collect(),
    }
}
