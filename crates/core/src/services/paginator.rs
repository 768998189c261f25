//! Keyset paginator - turns a pagination request into one bounded range scan.

use tracing::{debug, instrument};

use crate::error::PaginationResult;
use crate::metrics::{PageFetchTimer, record_page_served, record_rejected};
use crate::models::{PersistedRecord, SortKey};
use crate::ports::{
    Connection, Cursor, Edge, KeyBound, PageDirection, PageInfo, Pagination, RangeQuery,
    RecordSource,
};

use super::page_info::PageInfoAssembler;

/// Paginates a scoped [`RecordSource`] by `(created_at, id)`.
///
/// # Flow
///
/// 1. Validate limits and pick a direction
/// 2. Resolve the cursor (if any) to its anchor sort key; an unknown
///    anchor yields an empty page
/// 3. Scan strictly past the anchor, ascending for forward requests and
///    descending for backward ones
/// 4. Reverse backward results so every page comes back ascending
///
/// The paginator borrows the source and holds no state between calls.
pub struct KeysetPaginator<'a, S: ?Sized> {
    source: &'a S,
}

impl<'a, S: RecordSource + ?Sized> KeysetPaginator<'a, S> {
    pub fn new(source: &'a S) -> Self {
        Self { source }
    }

    /// Fetch one page, ordered ascending by `(created_at, id)`.
    #[instrument(skip_all, fields(first = ?pagination.first, last = ?pagination.last))]
    pub async fn get_page(&self, pagination: &Pagination) -> PaginationResult<Vec<S::Record>> {
        let result = self.fetch(pagination).await;
        if let Err(e) = &result {
            record_rejected(e.reason());
            debug!(error = %e, "Pagination request failed");
        }
        result
    }

    /// Fetch one page and assemble its connection (edges + page info).
    pub async fn paginate(&self, pagination: &Pagination) -> PaginationResult<Connection<S::Record>> {
        let page = self.get_page(pagination).await?;
        let page_info = self.page_info(&page, pagination).await?;

        let edges = page
            .into_iter()
            .map(|node| Edge {
                cursor: Cursor::from(node.id()),
                node,
            })
            .collect();

        Ok(Connection {
            edges,
            page_info,
            total_count: None,
        })
    }

    /// Page info for a page previously returned by [`Self::get_page`].
    pub async fn page_info(
        &self,
        page: &[S::Record],
        pagination: &Pagination,
    ) -> PaginationResult<PageInfo> {
        PageInfoAssembler::new(self.source)
            .assemble(page, pagination)
            .await
    }

    async fn fetch(&self, pagination: &Pagination) -> PaginationResult<Vec<S::Record>> {
        let plan = pagination.plan()?;
        let _timer = PageFetchTimer::new();

        let mut records = match &plan.direction {
            PageDirection::Forward { after: None } => {
                self.source
                    .range(RangeQuery::ascending(None, plan.limit))
                    .await?
            }
            PageDirection::Forward { after: Some(cursor) } => match self.resolve(cursor).await? {
                Some(anchor) => {
                    self.source
                        .range(RangeQuery::ascending(Some(KeyBound::after(anchor)), plan.limit))
                        .await?
                }
                None => Vec::new(),
            },
            PageDirection::Backward { before } => match self.resolve(before).await? {
                Some(anchor) => {
                    let mut records = self
                        .source
                        .range(RangeQuery::descending(Some(KeyBound::before(anchor)), plan.limit))
                        .await?;
                    records.reverse();
                    records
                }
                None => Vec::new(),
            },
        };

        records.dedup_by_key(|r| r.id());
        records.truncate(plan.limit as usize);

        debug!(
            direction = plan.direction.label(),
            limit = plan.limit,
            returned = records.len(),
            "Page fetched"
        );
        record_page_served(plan.direction.label());

        Ok(records)
    }

    /// Anchor sort key of `cursor`, or `None` when no visible record has that id.
    async fn resolve(&self, cursor: &Cursor) -> PaginationResult<Option<SortKey>> {
        let id = cursor.record_id()?;
        Ok(self.source.anchor(&id).await?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::PaginationError;
    use crate::services::fixtures::{Row, VecSource, abc, id, labels, row};

    // Scénario: première page vers l'avant
    #[tokio::test]
    async fn forward_first_page() {
        let source = abc();
        let page = KeysetPaginator::new(&source)
            .get_page(&Pagination::first(2))
            .await
            .unwrap();
        assert_eq!(labels(&page), ["A", "B"]);
    }

    #[tokio::test]
    async fn forward_continuation() {
        let source = abc();
        let page = KeysetPaginator::new(&source)
            .get_page(&Pagination::after(id(0xb), 2))
            .await
            .unwrap();
        assert_eq!(labels(&page), ["C"]);
    }

    // Test critique: la page arrière est renversée, donc toujours croissante
    #[tokio::test]
    async fn backward_page_comes_back_ascending() {
        let source = abc();
        let page = KeysetPaginator::new(&source)
            .get_page(&Pagination::before(id(0xc), 2))
            .await
            .unwrap();
        assert_eq!(labels(&page), ["A", "B"]);
    }

    #[tokio::test]
    async fn backward_limit_keeps_closest_records() {
        let source = abc();
        let page = KeysetPaginator::new(&source)
            .get_page(&Pagination::before(id(0xc), 1))
            .await
            .unwrap();
        assert_eq!(labels(&page), ["B"]);
    }

    #[tokio::test]
    async fn empty_collection_returns_empty_page() {
        let source = VecSource::new(vec![]);
        let page = KeysetPaginator::new(&source)
            .get_page(&Pagination::default())
            .await
            .unwrap();
        assert!(page.is_empty());
    }

    #[tokio::test]
    async fn default_limit_is_twenty() {
        let rows = (0..25).map(|n| row(n, n as u128 + 1, "x")).collect();
        let source = VecSource::new(rows);
        let page = KeysetPaginator::new(&source)
            .get_page(&Pagination::default())
            .await
            .unwrap();
        assert_eq!(page.len(), 20);
    }

    // Test critique: timestamps identiques -> ordre par id, dans les deux sens
    #[tokio::test]
    async fn ties_on_created_at_resolve_by_id() {
        let source = VecSource::new(vec![
            row(5, 2, "two"),
            row(5, 3, "three"),
            row(5, 1, "one"),
        ]);
        let paginator = KeysetPaginator::new(&source);

        let forward = paginator.get_page(&Pagination::first(3)).await.unwrap();
        assert_eq!(labels(&forward), ["one", "two", "three"]);

        let after = paginator
            .get_page(&Pagination::after(id(1), 5))
            .await
            .unwrap();
        assert_eq!(labels(&after), ["two", "three"]);

        let backward = paginator
            .get_page(&Pagination::before(id(3), 5))
            .await
            .unwrap();
        assert_eq!(labels(&backward), ["one", "two"]);
    }

    #[tokio::test]
    async fn repeated_calls_are_deterministic() {
        let source = abc();
        let paginator = KeysetPaginator::new(&source);
        let request = Pagination::after(id(0xa), 2);

        let first = paginator.paginate(&request).await.unwrap();
        let second = paginator.paginate(&request).await.unwrap();

        let cursors = |c: &Connection<Row>| -> Vec<Cursor> {
            c.edges.iter().map(|e| e.cursor.clone()).collect()
        };
        assert_eq!(cursors(&first), cursors(&second));
        assert_eq!(first.page_info, second.page_info);
    }

    // Test critique: la validation échoue avant toute requête au stockage
    #[tokio::test]
    async fn validation_fails_before_touching_storage() {
        let source = abc();
        let paginator = KeysetPaginator::new(&source);

        for request in [
            Pagination::first(0),
            Pagination::first(101),
            Pagination::before(id(0xc), 0),
            Pagination::before(id(0xc), 101),
            Pagination {
                last: Some(2),
                ..Default::default()
            },
        ] {
            let err = paginator.get_page(&request).await.unwrap_err();
            assert!(err.is_client_error(), "{request:?} -> {err}");
        }
        assert_eq!(source.range_calls(), 0);
    }

    // Test critique: un curseur inconnu donne une page vide, sans balayage
    #[tokio::test]
    async fn unknown_anchor_yields_empty_page() {
        let source = abc();
        let paginator = KeysetPaginator::new(&source);

        for request in [
            Pagination::after(id(0xdead), 2),
            Pagination::before(id(0xdead), 2),
        ] {
            let connection = paginator.paginate(&request).await.unwrap();
            assert!(connection.edges.is_empty(), "{request:?}");
            assert_eq!(connection.page_info, PageInfo::default());
        }
        assert_eq!(source.range_calls(), 0);
    }

    #[tokio::test]
    async fn cursor_on_empty_collection_yields_empty_page() {
        let source = VecSource::new(vec![]);
        let paginator = KeysetPaginator::new(&source);

        for request in [Pagination::after(id(7), 2), Pagination::before(id(7), 2)] {
            let connection = paginator.paginate(&request).await.unwrap();
            assert!(connection.edges.is_empty());
            assert_eq!(connection.page_info, PageInfo::default());
        }
    }

    #[tokio::test]
    async fn malformed_cursor_is_an_error() {
        let source = abc();
        let err = KeysetPaginator::new(&source)
            .get_page(&Pagination::before("not-an-id", 2))
            .await
            .unwrap_err();
        assert!(matches!(err, PaginationError::InvalidCursor(_)));
    }

    // Test critique: les erreurs de stockage remontent telles quelles
    #[tokio::test]
    async fn storage_failures_propagate() {
        let source = VecSource::failing(vec![row(1, 1, "A")]);
        let err = KeysetPaginator::new(&source)
            .get_page(&Pagination::first(5))
            .await
            .unwrap_err();
        assert!(matches!(err, PaginationError::Storage(_)));
        assert!(!err.is_client_error());
        assert!(err.to_string().contains("connection reset"));
    }

    #[tokio::test]
    async fn paginate_builds_edges_with_id_cursors() {
        let source = abc();
        let connection = KeysetPaginator::new(&source)
            .paginate(&Pagination::first(2))
            .await
            .unwrap();

        assert_eq!(connection.edges.len(), 2);
        assert_eq!(connection.edges[0].cursor, Cursor::from(id(0xa)));
        assert_eq!(connection.edges[1].node.data, "B");
        assert_eq!(connection.total_count, None);
    }
}
