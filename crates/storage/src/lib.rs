//! Storage layer for keyset pagination.
//!
//! This crate provides implementations of the `RecordSource` and
//! `RecordStore` traits defined in `keyset-core`:
//!
//! - [`postgres`] - Tables and views in PostgreSQL (sqlx)
//! - [`memory`] - `BTreeMap`-backed tables and projection views
//!
//! Tables implement both traits; views implement only `RecordSource`, so
//! writing through a view is a compile error.
//!
//! # Usage
//!
//! ```ignore
//! use keyset_storage::{Database, DatabaseConfig, PgRelation, PgScope, PgView};
//!
//! let db = Database::connect(&DatabaseConfig::for_api(&database_url)).await?;
//!
//! let scope = PgScope::new().eq("owner_id", user_id)?;
//! let payments = PgView::new(PgRelation::<Payment>::new(&db, "combined_payments")?.scoped(scope));
//!
//! let connection = KeysetPaginator::new(&payments).paginate(&request).await?;
//! ```

pub mod memory;
pub mod postgres;

pub use memory::{MemoryTable, MemoryView};
pub use postgres::{
    Database, DatabaseConfig, JsonData, PgData, PgRelation, PgScope, PgTable, PgView, PgWrite,
    ScopeValue,
};
