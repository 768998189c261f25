//! Schema construction with query limits.

use async_graphql::{EmptyMutation, EmptySubscription, ObjectType, Schema};

/// Maximum query depth to prevent deeply nested queries (DoS protection).
/// Note: GraphQL introspection requires depth ~13, so we use 15 to allow it.
pub const MAX_QUERY_DEPTH: usize = 15;

/// Maximum query complexity score (DoS protection).
/// Each field has a default complexity of 1, nested objects multiply.
pub const MAX_QUERY_COMPLEXITY: usize = 500;

/// Build a read-only schema around `query` with depth and complexity limits.
pub fn build_schema<Q>(query: Q) -> Schema<Q, EmptyMutation, EmptySubscription>
where
    Q: ObjectType + 'static,
{
    Schema::build(query, EmptyMutation, EmptySubscription)
        .limit_depth(MAX_QUERY_DEPTH)
        .limit_complexity(MAX_QUERY_COMPLEXITY)
        .finish()
}
