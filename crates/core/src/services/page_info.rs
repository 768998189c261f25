//! Page info assembly - cursors and next/previous flags for a returned page.

use tracing::{instrument, trace};

use crate::error::{PaginationResult, StorageResult};
use crate::metrics::record_probes;
use crate::models::PersistedRecord;
use crate::ports::{Cursor, KeyBound, PageDirection, PageInfo, Pagination, RangeQuery, RecordSource};

/// Computes [`PageInfo`] for a page.
///
/// Flags are probed against the boundaries of the page actually returned,
/// not against the request that produced it: `has_next_page` asks whether
/// anything lies strictly after the last record, `has_previous_page`
/// whether anything lies strictly before the first. Both probes are limit-1
/// scans keyed on the records' own `(created_at, id)` and run concurrently.
pub struct PageInfoAssembler<'a, S: ?Sized> {
    source: &'a S,
}

impl<'a, S: RecordSource + ?Sized> PageInfoAssembler<'a, S> {
    pub fn new(source: &'a S) -> Self {
        Self { source }
    }

    #[instrument(skip_all, fields(page_len = page.len()))]
    pub async fn assemble(
        &self,
        page: &[S::Record],
        pagination: &Pagination,
    ) -> PaginationResult<PageInfo> {
        let (Some(first), Some(last)) = (page.first(), page.last()) else {
            return self.empty_page_info(pagination).await;
        };

        let (has_next_page, has_previous_page) = tokio::try_join!(
            self.probe(KeyBound::after(last.sort_key())),
            self.probe(KeyBound::before(first.sort_key())),
        )?;
        record_probes(2);

        trace!(has_next_page, has_previous_page, "Page info assembled");

        Ok(PageInfo {
            has_next_page,
            has_previous_page,
            start_cursor: Some(Cursor::from(first.id())),
            end_cursor: Some(Cursor::from(last.id())),
        })
    }

    async fn probe(&self, bound: KeyBound) -> StorageResult<bool> {
        let hits = self.source.range(RangeQuery::probe(bound)).await?;
        Ok(!hits.is_empty())
    }

    /// An empty page has no boundaries to probe from. The only thing still
    /// known is the request's anchor: if it resolves, it lies on the far
    /// side of the empty page.
    async fn empty_page_info(&self, pagination: &Pagination) -> PaginationResult<PageInfo> {
        let plan = pagination.plan()?;
        let mut info = PageInfo::default();

        match &plan.direction {
            PageDirection::Forward { after: None } => {}
            PageDirection::Forward {
                after: Some(cursor),
            } => info.has_previous_page = self.anchor_exists(cursor).await?,
            PageDirection::Backward { before } => {
                info.has_next_page = self.anchor_exists(before).await?
            }
        }

        Ok(info)
    }

    async fn anchor_exists(&self, cursor: &Cursor) -> StorageResult<bool> {
        let Ok(id) = cursor.record_id() else {
            return Ok(false);
        };
        Ok(self.source.anchor(&id).await?.is_some())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::PaginationError;
    use crate::services::KeysetPaginator;
    use crate::services::fixtures::{VecSource, abc, id, row};

    async fn info_for(source: &VecSource, request: Pagination) -> PageInfo {
        let paginator = KeysetPaginator::new(source);
        let page = paginator.get_page(&request).await.unwrap();
        paginator.page_info(&page, &request).await.unwrap()
    }

    #[tokio::test]
    async fn forward_first_page_info() {
        let info = info_for(&abc(), Pagination::first(2)).await;
        assert_eq!(
            info,
            PageInfo {
                has_next_page: true,
                has_previous_page: false,
                start_cursor: Some(Cursor::from(id(0xa))),
                end_cursor: Some(Cursor::from(id(0xb))),
            }
        );
    }

    #[tokio::test]
    async fn continuation_page_info() {
        let info = info_for(&abc(), Pagination::after(id(0xb), 2)).await;
        assert!(!info.has_next_page);
        assert!(info.has_previous_page);
        assert_eq!(info.start_cursor, Some(Cursor::from(id(0xc))));
        assert_eq!(info.end_cursor, Some(Cursor::from(id(0xc))));
    }

    // Test critique: les drapeaux dépendent de la page renvoyée, pas de la requête
    #[tokio::test]
    async fn backward_page_info_is_relative_to_returned_page() {
        let info = info_for(&abc(), Pagination::before(id(0xc), 2)).await;
        assert!(info.has_next_page);
        assert!(!info.has_previous_page);

        let middle = info_for(&abc(), Pagination::before(id(0xc), 1)).await;
        assert!(middle.has_next_page);
        assert!(middle.has_previous_page);
    }

    #[tokio::test]
    async fn empty_collection_page_info() {
        let info = info_for(&VecSource::new(vec![]), Pagination::first(5)).await;
        assert_eq!(info, PageInfo::default());
    }

    #[tokio::test]
    async fn empty_backward_page_from_first_record_has_next() {
        let info = info_for(&abc(), Pagination::before(id(0xa), 2)).await;
        assert!(info.has_next_page);
        assert!(!info.has_previous_page);
        assert_eq!(info.start_cursor, None);
        assert_eq!(info.end_cursor, None);
    }

    #[tokio::test]
    async fn empty_forward_page_from_last_record_has_previous() {
        let info = info_for(&abc(), Pagination::after(id(0xc), 2)).await;
        assert!(!info.has_next_page);
        assert!(info.has_previous_page);
    }

    #[tokio::test]
    async fn issues_exactly_two_probes_for_non_empty_page() {
        let source = abc();
        let paginator = KeysetPaginator::new(&source);
        let request = Pagination::first(1);
        let page = paginator.get_page(&request).await.unwrap();
        let before = source.range_calls();

        paginator.page_info(&page, &request).await.unwrap();
        assert_eq!(source.range_calls() - before, 2);
    }

    #[tokio::test]
    async fn probe_failures_propagate() {
        let page = vec![row(1, 1, "A")];
        let source = VecSource::failing(page.clone());
        let err = PageInfoAssembler::new(&source)
            .assemble(&page, &Pagination::first(1))
            .await
            .unwrap_err();
        assert!(matches!(err, PaginationError::Storage(_)));
    }
}
