//! Core domain layer for keyset pagination.
//!
//! This crate contains the record contract, the port traits storage
//! adapters implement, and the pagination services. It follows hexagonal
//! architecture principles - this is the innermost layer with no
//! dependencies on infrastructure.
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │                      keyset (binary)                        │
//! ├─────────────────────────────────────────────────────────────┤
//! │        keyset-graphql          │        keyset-storage      │
//! │     (Relay connections)        │   (PostgreSQL, memory)     │
//! ├────────────────────────────────┴────────────────────────────┤
//! │                     keyset-core  ← YOU ARE HERE             │
//! │               (models, ports, services)                     │
//! └─────────────────────────────────────────────────────────────┘
//! ```
//!
//! # Modules
//!
//! - [`models`] - Record contract (`PersistedRecord`, `Record`, `SortKey`)
//! - [`ports`] - Interface traits for adapters to implement, pagination types
//! - [`services`] - `KeysetPaginator` and `PageInfoAssembler`
//! - [`error`] - Error types
//! - [`metrics`] - Metrics definitions
//!
//! # Key Concepts
//!
//! ## Keyset ordering
//!
//! Every collection is ordered by `(created_at, id)`. A cursor is a record
//! id; the paginator resolves it to that record's sort key (the anchor) and
//! scans strictly past it. No offsets are involved, so deep pages cost the
//! same as the first one.
//!
//! ## Read-only views
//!
//! [`ports::RecordSource`] is the read side, [`ports::RecordStore`] the
//! write side. Views implement only the former, so they cannot be mutated.
//!
//! ## Pagination call
//!
//! 1. Validate `first`/`last` and choose a direction
//! 2. Resolve the cursor to its anchor (an unknown cursor gives an empty page)
//! 3. Run one bounded range scan (reversed for backward requests)
//! 4. Probe for records beyond both ends of the returned page

pub mod error;
pub mod metrics;
pub mod models;
pub mod ports;
pub mod services;
