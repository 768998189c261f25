//! Relay-style connection types.

use keyset_core::ports::{Connection, Cursor, Pagination, RecordSource};
use keyset_core::services::KeysetPaginator;

use crate::error::graphql_error;

#[derive(Debug, Clone, PartialEq, Eq, async_graphql::SimpleObject)]
pub struct PageInfo {
    pub has_next_page: bool,
    pub has_previous_page: bool,
    pub start_cursor: Option<String>,
    pub end_cursor: Option<String>,
}

impl From<keyset_core::ports::PageInfo> for PageInfo {
    fn from(info: keyset_core::ports::PageInfo) -> Self {
        Self {
            has_next_page: info.has_next_page,
            has_previous_page: info.has_previous_page,
            start_cursor: info.start_cursor.map(|c| c.value),
            end_cursor: info.end_cursor.map(|c| c.value),
        }
    }
}

/// Generate Relay-style connection types (Edge + Connection) with From impl.
///
/// `define_connection!(Node, Data, NodeEdge, NodeConnection)` expects
/// `Node: From<Record<Data>>`.
#[macro_export]
macro_rules! define_connection {
    ($node:ty, $data:ty, $edge:ident, $connection:ident) => {
        #[derive(async_graphql::SimpleObject)]
        pub struct $edge {
            pub node: $node,
            pub cursor: String,
        }

        #[derive(async_graphql::SimpleObject)]
        pub struct $connection {
            pub edges: Vec<$edge>,
            pub page_info: $crate::PageInfo,
            pub total_count: Option<i64>,
        }

        impl From<$crate::__private::Connection<$crate::__private::Record<$data>>>
            for $connection
        {
            fn from(
                conn: $crate::__private::Connection<$crate::__private::Record<$data>>,
            ) -> Self {
                Self {
                    edges: conn
                        .edges
                        .into_iter()
                        .map(|e| $edge {
                            node: <$node>::from(e.node),
                            cursor: e.cursor.value,
                        })
                        .collect(),
                    page_info: $crate::PageInfo::from(conn.page_info),
                    total_count: conn.total_count,
                }
            }
        }
    };
}

/// Build a pagination request from the four Relay arguments.
///
/// Nothing is validated or clamped here: out-of-range sizes and a `last`
/// without `before` are rejected by the paginator and surface as
/// `BAD_USER_INPUT`.
pub fn pagination_from_args(
    first: Option<i32>,
    after: Option<String>,
    last: Option<i32>,
    before: Option<String>,
) -> Pagination {
    Pagination {
        first,
        after: after.map(Cursor::new),
        last,
        before: before.map(Cursor::new),
    }
}

/// Paginate `source` and convert the result into a GraphQL connection.
pub async fn resolve_connection<S, C>(source: &S, pagination: &Pagination) -> async_graphql::Result<C>
where
    S: RecordSource + ?Sized,
    C: From<Connection<S::Record>>,
{
    KeysetPaginator::new(source)
        .paginate(pagination)
        .await
        .map(C::from)
        .map_err(graphql_error)
}
