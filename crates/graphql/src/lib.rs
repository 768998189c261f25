//! GraphQL adapter for keyset pagination.
//!
//! Exposes paginated record sources as Relay-style connections in an
//! `async-graphql` schema. The crate provides the pieces; the application
//! owns the query root.
//!
//! # Exposing a Collection
//!
//! ```ignore
//! use keyset_graphql::{define_connection, pagination_from_args, resolve_connection};
//!
//! define_connection!(Payment, PaymentData, PaymentEdge, PaymentConnection);
//!
//! #[Object]
//! impl Query {
//!     async fn payments(
//!         &self,
//!         first: Option<i32>,
//!         after: Option<String>,
//!         last: Option<i32>,
//!         before: Option<String>,
//!     ) -> Result<PaymentConnection> {
//!         let request = pagination_from_args(first, after, last, before);
//!         resolve_connection(&self.payments, &request).await
//!     }
//! }
//! ```

mod connection;
mod error;
mod schema;

pub use connection::{PageInfo, pagination_from_args, resolve_connection};
pub use error::graphql_error;
pub use schema::{MAX_QUERY_COMPLEXITY, MAX_QUERY_DEPTH, build_schema};

#[doc(hidden)]
pub mod __private {
    pub use keyset_core::models::Record;
    pub use keyset_core::ports::Connection;
}
