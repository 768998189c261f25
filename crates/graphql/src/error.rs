//! Mapping pagination failures onto GraphQL errors.

use async_graphql::ErrorExtensions;
use tracing::error;

use keyset_core::error::PaginationError;

/// Convert a pagination error into a GraphQL error.
///
/// Client errors keep their message and carry `code = BAD_USER_INPUT` plus
/// the rejection `reason`. Backend errors are logged here and reach the
/// client only as `INTERNAL_SERVER_ERROR`.
pub fn graphql_error(err: PaginationError) -> async_graphql::Error {
    if err.is_client_error() {
        let reason = err.reason();
        async_graphql::Error::new(err.to_string()).extend_with(|_, e| {
            e.set("code", "BAD_USER_INPUT");
            e.set("reason", reason);
        })
    } else {
        error!(error = %err, "Pagination failed in storage");
        async_graphql::Error::new("Internal server error")
            .extend_with(|_, e| e.set("code", "INTERNAL_SERVER_ERROR"))
    }
}
