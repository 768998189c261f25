//! Pagination types for list queries.
//!
//! These types implement Relay-style cursor pagination, commonly used
//! with GraphQL but also applicable to other APIs. A cursor is the id of a
//! record; it is opaque to clients but not encoded.

use serde::{Deserialize, Serialize};

use crate::error::{PaginationError, PaginationResult};
use crate::models::RecordId;

/// Default page size when neither `first` nor `last` is given.
pub const DEFAULT_PAGE_SIZE: i32 = 20;

/// Largest accepted page size.
pub const MAX_PAGE_SIZE: i32 = 100;

/// Opaque cursor for pagination.
///
/// The value is the id of the record the cursor points at.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Cursor {
    pub value: String,
}

impl Cursor {
    pub fn new(value: impl Into<String>) -> Self {
        Self {
            value: value.into(),
        }
    }

    /// Parse the cursor back into the record id it names.
    pub fn record_id(&self) -> PaginationResult<RecordId> {
        self.value
            .parse()
            .map_err(|_| PaginationError::InvalidCursor(self.value.clone()))
    }
}

impl From<RecordId> for Cursor {
    fn from(id: RecordId) -> Self {
        Self {
            value: id.to_string(),
        }
    }
}

/// Pagination parameters for list queries.
///
/// Supports forward pagination (`first`/`after`) and backward
/// pagination (`last`/`before`). When both cursors are present, `after`
/// wins.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Pagination {
    /// Number of items to fetch (forward pagination).
    pub first: Option<i32>,
    /// Cursor to start after (forward pagination).
    pub after: Option<Cursor>,
    /// Number of items to fetch (backward pagination).
    pub last: Option<i32>,
    /// Cursor to end before (backward pagination).
    pub before: Option<Cursor>,
}

impl Pagination {
    /// First page, `first` items.
    pub fn first(first: i32) -> Self {
        Self {
            first: Some(first),
            ..Default::default()
        }
    }

    /// `first` items after `cursor`.
    pub fn after(cursor: impl Into<Cursor>, first: i32) -> Self {
        Self {
            first: Some(first),
            after: Some(cursor.into()),
            ..Default::default()
        }
    }

    /// `last` items before `cursor`.
    pub fn before(cursor: impl Into<Cursor>, last: i32) -> Self {
        Self {
            last: Some(last),
            before: Some(cursor.into()),
            ..Default::default()
        }
    }

    /// Check limits and pick the scan direction.
    pub fn plan(&self) -> PaginationResult<PagePlan> {
        if self.before.is_none() && self.last.is_some() {
            return Err(PaginationError::BackwardWithoutAnchor);
        }

        let first = page_size("first", self.first)?;
        let last = page_size("last", self.last)?;

        let plan = match (&self.after, &self.before) {
            (Some(after), _) => PagePlan {
                direction: PageDirection::Forward {
                    after: Some(after.clone()),
                },
                limit: first,
            },
            (None, Some(before)) => PagePlan {
                direction: PageDirection::Backward {
                    before: before.clone(),
                },
                limit: last,
            },
            (None, None) => PagePlan {
                direction: PageDirection::Forward { after: None },
                limit: first,
            },
        };

        Ok(plan)
    }
}

impl From<&str> for Cursor {
    fn from(value: &str) -> Self {
        Self::new(value)
    }
}

impl From<String> for Cursor {
    fn from(value: String) -> Self {
        Self { value }
    }
}

fn page_size(argument: &'static str, value: Option<i32>) -> PaginationResult<u32> {
    match value {
        None => Ok(DEFAULT_PAGE_SIZE as u32),
        Some(v) if (1..=MAX_PAGE_SIZE).contains(&v) => Ok(v as u32),
        Some(v) => Err(PaginationError::PageSizeOutOfRange { argument, value: v }),
    }
}

/// Which way a validated request scans the collection.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PageDirection {
    /// Ascending from the start, or from just after a cursor.
    Forward { after: Option<Cursor> },
    /// Descending from just before a cursor; results are reversed afterwards.
    Backward { before: Cursor },
}

impl PageDirection {
    pub fn label(&self) -> &'static str {
        match self {
            PageDirection::Forward { .. } => "forward",
            PageDirection::Backward { .. } => "backward",
        }
    }
}

/// A validated pagination request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PagePlan {
    pub direction: PageDirection,
    pub limit: u32,
}

/// Paginated result set with edges and page info.
///
/// This is the Relay connection pattern for cursor-based pagination.
#[derive(Debug, Clone)]
pub struct Connection<T> {
    /// List of edges (node + cursor pairs).
    pub edges: Vec<Edge<T>>,
    /// Information about the current page.
    pub page_info: PageInfo,
    /// Total count of items (optional, expensive to compute).
    pub total_count: Option<i64>,
}

/// A single item in a paginated result.
#[derive(Debug, Clone)]
pub struct Edge<T> {
    /// The actual item.
    pub node: T,
    /// Cursor for this item (used for pagination).
    pub cursor: Cursor,
}

/// Information about the current page in a paginated result.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PageInfo {
    /// Whether there are more items after this page.
    pub has_next_page: bool,
    /// Whether there are items before this page.
    pub has_previous_page: bool,
    /// Cursor of the first item in this page.
    pub start_cursor: Option<Cursor>,
    /// Cursor of the last item in this page.
    pub end_cursor: Option<Cursor>,
}

/// Ordering direction for sorted queries.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum OrderDirection {
    /// Ascending order (smallest first).
    #[default]
    Asc,
    /// Descending order (largest first).
    Desc,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_to_forward_first_page() {
        let plan = Pagination::default().plan().unwrap();
        assert_eq!(plan.direction, PageDirection::Forward { after: None });
        assert_eq!(plan.limit, DEFAULT_PAGE_SIZE as u32);
    }

    // Test critique: bornes (0, 100] sur first et last
    #[test]
    fn rejects_out_of_range_sizes() {
        for first in [0, -1, 101] {
            let err = Pagination::first(first).plan().unwrap_err();
            assert!(matches!(
                err,
                PaginationError::PageSizeOutOfRange { argument: "first", .. }
            ));
        }
        for last in [0, 101] {
            let err = Pagination::before("x", last).plan().unwrap_err();
            assert!(matches!(
                err,
                PaginationError::PageSizeOutOfRange { argument: "last", .. }
            ));
        }
        assert!(Pagination::first(1).plan().is_ok());
        assert!(Pagination::first(100).plan().is_ok());
    }

    // Test critique: last sans before est toujours refusé
    #[test]
    fn rejects_last_without_before() {
        let req = Pagination {
            last: Some(5),
            ..Default::default()
        };
        assert!(matches!(
            req.plan().unwrap_err(),
            PaginationError::BackwardWithoutAnchor
        ));

        let with_after = Pagination {
            last: Some(5),
            after: Some(Cursor::new("a")),
            ..Default::default()
        };
        assert!(matches!(
            with_after.plan().unwrap_err(),
            PaginationError::BackwardWithoutAnchor
        ));
    }

    #[test]
    fn after_wins_over_before() {
        let req = Pagination {
            first: Some(3),
            after: Some(Cursor::new("a")),
            last: Some(7),
            before: Some(Cursor::new("b")),
        };
        let plan = req.plan().unwrap();
        assert_eq!(
            plan.direction,
            PageDirection::Forward {
                after: Some(Cursor::new("a"))
            }
        );
        assert_eq!(plan.limit, 3);
    }

    #[test]
    fn backward_uses_last_limit() {
        let plan = Pagination::before("c", 2).plan().unwrap();
        assert_eq!(plan.direction.label(), "backward");
        assert_eq!(plan.limit, 2);
    }

    #[test]
    fn cursor_round_trips_record_id() {
        let id = RecordId(uuid::Uuid::from_u128(42));
        assert_eq!(Cursor::from(id).record_id().unwrap(), id);
        assert!(matches!(
            Cursor::new("zzz").record_id().unwrap_err(),
            PaginationError::InvalidCursor(_)
        ));
    }
}
