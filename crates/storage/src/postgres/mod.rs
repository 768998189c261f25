//! PostgreSQL storage adapter.
//!
//! This module implements the record traits defined in `keyset-core`
//! using PostgreSQL as the backing store.
//!
//! # Architecture
//!
//! - [`Database`] - Connection pool
//! - [`PgRelation`] - A validated, optionally scoped table or view name
//! - [`PgTable`] - Read/write relation (`RecordSource` + `RecordStore`)
//! - [`PgView`] - Read-only relation (`RecordSource` only)
//!
//! The schema is owned by the caller. Every relation must expose `id uuid`,
//! `created_at timestamptz` and `updated_at timestamptz`; an index on
//! `(created_at, id)` keeps range scans and probes cheap.
//!
//! # Usage
//!
//! ```ignore
//! let config = DatabaseConfig::for_api(&database_url);
//! let db = Database::connect(&config).await?;
//!
//! let scope = PgScope::new().eq("owner_id", user_id)?;
//! let payments = PgTable::with_random_ids(PgRelation::<Payment>::new(&db, "payments")?.scoped(scope));
//! ```

mod database;
mod helpers;
mod relation;
mod table;
mod view;

pub use database::{Database, DatabaseConfig};
pub use helpers::quote_identifier;
pub use relation::{JsonData, PgData, PgRelation, PgScope, PgWrite, ScopeValue};
pub use table::PgTable;
pub use view::PgView;
