//! SQL building and row decoding shared by PostgreSQL tables and views.
//!
//! A relation is any table or view exposing `id uuid`, `created_at
//! timestamptz` and `updated_at timestamptz`. Every statement aliases the
//! relation as `r`, so [`PgData::SELECT`] and scope predicates are written
//! against `r`.

use std::marker::PhantomData;

use chrono::{DateTime, Utc};
use sqlx::postgres::PgRow;
use sqlx::query_builder::Separated;
use sqlx::{FromRow, PgPool, Postgres, QueryBuilder, Row};
use tracing::{debug, instrument};
use uuid::Uuid;

use keyset_core::error::StorageResult;
use keyset_core::models::{Record, RecordId, RecordMeta, SortKey};
use keyset_core::ports::{Comparison, OrderDirection, RangeQuery};

use super::database::Database;
use super::helpers::{query_error, quote_identifier};

// =============================================================================
// Data Mapping
// =============================================================================

/// Caller data stored alongside the record metadata.
pub trait PgData: for<'r> FromRow<'r, PgRow> + Send + Sync + Unpin + 'static {
    /// Select-list expression(s) producing the columns `FromRow` reads,
    /// written against the alias `r` (e.g. `"r.amount, r.note"`).
    const SELECT: &'static str;
}

/// Data that can be written back to a table.
pub trait PgWrite: PgData {
    /// Writable columns, in the order [`PgWrite::bind_values`] binds them.
    const COLUMNS: &'static [&'static str];

    fn bind_values<'q>(&'q self, values: &mut Separated<'_, 'q, Postgres, &'static str>);
}

/// Everything except the metadata columns, as a JSON object.
///
/// Lets any conforming relation be read without a dedicated Rust type.
#[derive(Debug, Clone, PartialEq)]
pub struct JsonData {
    pub data: serde_json::Value,
}

impl<'r> FromRow<'r, PgRow> for JsonData {
    fn from_row(row: &'r PgRow) -> Result<Self, sqlx::Error> {
        Ok(Self {
            data: row.try_get("data")?,
        })
    }
}

impl PgData for JsonData {
    const SELECT: &'static str = "to_jsonb(r) - 'id' - 'created_at' - 'updated_at' AS data";
}

/// Row decoder for a full record.
struct RecordRow<D>(Record<D>);

impl<'r, D: PgData> FromRow<'r, PgRow> for RecordRow<D> {
    fn from_row(row: &'r PgRow) -> Result<Self, sqlx::Error> {
        let id: Uuid = row.try_get("id")?;
        let created_at: DateTime<Utc> = row.try_get("created_at")?;
        let updated_at: DateTime<Utc> = row.try_get("updated_at")?;
        let data = D::from_row(row)?;

        Ok(Self(Record::new(
            RecordMeta::restore(RecordId(id), created_at, updated_at),
            data,
        )))
    }
}

// =============================================================================
// Scope
// =============================================================================

/// Right-hand side of a scope predicate.
///
/// `Text` compares against the column cast to `text`, so it matches
/// columns of any type by their text form.
#[derive(Debug, Clone, PartialEq)]
pub enum ScopeValue {
    Uuid(Uuid),
    Text(String),
    Bool(bool),
    BigInt(i64),
}

impl From<Uuid> for ScopeValue {
    fn from(v: Uuid) -> Self {
        Self::Uuid(v)
    }
}

impl From<RecordId> for ScopeValue {
    fn from(v: RecordId) -> Self {
        Self::Uuid(v.0)
    }
}

impl From<String> for ScopeValue {
    fn from(v: String) -> Self {
        Self::Text(v)
    }
}

impl From<&str> for ScopeValue {
    fn from(v: &str) -> Self {
        Self::Text(v.to_string())
    }
}

impl From<bool> for ScopeValue {
    fn from(v: bool) -> Self {
        Self::Bool(v)
    }
}

impl From<i64> for ScopeValue {
    fn from(v: i64) -> Self {
        Self::BigInt(v)
    }
}

/// Equality predicates restricting every statement on a relation.
///
/// Applied to reads, anchor lookups, updates and deletes alike.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PgScope {
    predicates: Vec<(String, ScopeValue)>,
}

impl PgScope {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add `r.<column> = value`.
    pub fn eq(mut self, column: &str, value: impl Into<ScopeValue>) -> StorageResult<Self> {
        self.predicates
            .push((quote_identifier(column)?, value.into()));
        Ok(self)
    }

    pub fn is_empty(&self) -> bool {
        self.predicates.is_empty()
    }

    fn push_into(&self, conditions: &mut Conditions<'_, '_>) {
        for (column, value) in &self.predicates {
            let qb = conditions.next();
            qb.push("r.").push(column);
            match value {
                ScopeValue::Uuid(v) => {
                    qb.push(" = ").push_bind(*v);
                }
                ScopeValue::Text(v) => {
                    qb.push("::text = ").push_bind(v.clone());
                }
                ScopeValue::Bool(v) => {
                    qb.push(" = ").push_bind(*v);
                }
                ScopeValue::BigInt(v) => {
                    qb.push(" = ").push_bind(*v);
                }
            }
        }
    }
}

/// Emits ` WHERE ` before the first condition and ` AND ` before the rest.
struct Conditions<'a, 'q> {
    qb: &'a mut QueryBuilder<'q, Postgres>,
    any: bool,
}

impl<'a, 'q> Conditions<'a, 'q> {
    fn new(qb: &'a mut QueryBuilder<'q, Postgres>) -> Self {
        Self { qb, any: false }
    }

    fn next(&mut self) -> &mut QueryBuilder<'q, Postgres> {
        self.qb.push(if self.any { " AND " } else { " WHERE " });
        self.any = true;
        &mut *self.qb
    }
}

// =============================================================================
// Statements
// =============================================================================

/// Statement builder for one relation and scope.
#[derive(Debug, Clone)]
pub(crate) struct RelationSql {
    relation: String,
    scope: PgScope,
}

impl RelationSql {
    pub(crate) fn new(name: &str) -> StorageResult<Self> {
        Ok(Self {
            relation: quote_identifier(name)?,
            scope: PgScope::new(),
        })
    }

    pub(crate) fn with_scope(self, scope: PgScope) -> Self {
        Self { scope, ..self }
    }

    fn select_list<D: PgData>() -> String {
        if D::SELECT.is_empty() {
            "r.id, r.created_at, r.updated_at".to_string()
        } else {
            format!("r.id, r.created_at, r.updated_at, {}", D::SELECT)
        }
    }

    fn select<D: PgData>(&self) -> QueryBuilder<'static, Postgres> {
        let mut qb = QueryBuilder::new("SELECT ");
        qb.push(Self::select_list::<D>())
            .push(" FROM ")
            .push(&self.relation)
            .push(" AS r");
        qb
    }

    pub(crate) fn by_id<D: PgData>(&self, id: RecordId) -> QueryBuilder<'static, Postgres> {
        let mut qb = self.select::<D>();
        let mut conditions = Conditions::new(&mut qb);
        conditions.next().push("r.id = ").push_bind(id.0);
        self.scope.push_into(&mut conditions);
        qb
    }

    pub(crate) fn anchor(&self, id: RecordId) -> QueryBuilder<'static, Postgres> {
        let mut qb = QueryBuilder::new("SELECT r.created_at, r.id FROM ");
        qb.push(&self.relation).push(" AS r");
        let mut conditions = Conditions::new(&mut qb);
        conditions.next().push("r.id = ").push_bind(id.0);
        self.scope.push_into(&mut conditions);
        qb
    }

    pub(crate) fn range<D: PgData>(&self, query: &RangeQuery) -> QueryBuilder<'static, Postgres> {
        let mut qb = self.select::<D>();
        let mut conditions = Conditions::new(&mut qb);
        self.scope.push_into(&mut conditions);

        if let Some(bound) = query.bound {
            let op = match bound.comparison {
                Comparison::GreaterThan => ">",
                Comparison::LessThan => "<",
            };
            conditions
                .next()
                .push("(r.created_at, r.id) ")
                .push(op)
                .push(" (")
                .push_bind(bound.key.created_at)
                .push(", ")
                .push_bind(bound.key.id.0)
                .push(")");
        }

        let order = match query.order {
            OrderDirection::Asc => "ASC",
            OrderDirection::Desc => "DESC",
        };
        qb.push(" ORDER BY r.created_at ")
            .push(order)
            .push(", r.id ")
            .push(order)
            .push(" LIMIT ")
            .push_bind(i64::from(query.limit));
        qb
    }

    pub(crate) fn insert<'q, D: PgWrite>(
        &self,
        id: RecordId,
        data: &'q D,
    ) -> StorageResult<QueryBuilder<'q, Postgres>> {
        let mut qb = QueryBuilder::new("INSERT INTO ");
        qb.push(&self.relation)
            .push(" AS r (id, created_at, updated_at");
        for column in D::COLUMNS {
            qb.push(", ").push(quote_identifier(column)?);
        }
        qb.push(") VALUES (")
            .push_bind(id.0)
            .push(", now(), now()");
        if !D::COLUMNS.is_empty() {
            qb.push(", ");
            data.bind_values(&mut qb.separated(", "));
        }
        qb.push(") RETURNING ").push(Self::select_list::<D>());
        Ok(qb)
    }

    pub(crate) fn update<'q, D: PgWrite>(
        &self,
        id: RecordId,
        data: &'q D,
    ) -> StorageResult<QueryBuilder<'q, Postgres>> {
        let mut qb = QueryBuilder::new("UPDATE ");
        qb.push(&self.relation).push(" AS r SET (updated_at");
        for column in D::COLUMNS {
            qb.push(", ").push(quote_identifier(column)?);
        }
        qb.push(") = ROW(now()");
        if !D::COLUMNS.is_empty() {
            qb.push(", ");
            data.bind_values(&mut qb.separated(", "));
        }
        qb.push(")");

        let mut conditions = Conditions::new(&mut qb);
        conditions.next().push("r.id = ").push_bind(id.0);
        self.scope.push_into(&mut conditions);

        qb.push(" RETURNING ").push(Self::select_list::<D>());
        Ok(qb)
    }

    pub(crate) fn delete(&self, id: RecordId) -> QueryBuilder<'static, Postgres> {
        let mut qb = QueryBuilder::new("DELETE FROM ");
        qb.push(&self.relation).push(" AS r");
        let mut conditions = Conditions::new(&mut qb);
        conditions.next().push("r.id = ").push_bind(id.0);
        self.scope.push_into(&mut conditions);
        qb
    }
}

// =============================================================================
// Relation Handle
// =============================================================================

/// A scoped PostgreSQL relation holding records with data `D`.
///
/// Carries no write capability by itself: wrap it in [`super::PgView`] to
/// read, or [`super::PgTable`] to read and write.
pub struct PgRelation<D> {
    pool: PgPool,
    name: String,
    sql: RelationSql,
    _data: PhantomData<fn() -> D>,
}

impl<D> Clone for PgRelation<D> {
    fn clone(&self) -> Self {
        Self {
            pool: self.pool.clone(),
            name: self.name.clone(),
            sql: self.sql.clone(),
            _data: PhantomData,
        }
    }
}

impl<D: PgData> PgRelation<D> {
    /// Open `name` (optionally `schema.name`). Fails on an invalid identifier.
    pub fn new(db: &Database, name: &str) -> StorageResult<Self> {
        Ok(Self {
            pool: db.pool().clone(),
            name: name.to_string(),
            sql: RelationSql::new(name)?,
            _data: PhantomData,
        })
    }

    /// Restrict every statement to rows matching `scope`.
    pub fn scoped(self, scope: PgScope) -> Self {
        Self {
            sql: self.sql.with_scope(scope),
            ..self
        }
    }

    #[instrument(skip_all, fields(relation = %self.name, id = %id))]
    pub(crate) async fn fetch_one(&self, id: &RecordId) -> StorageResult<Option<Record<D>>> {
        let mut qb = self.sql.by_id::<D>(*id);
        let row = qb
            .build_query_as::<RecordRow<D>>()
            .fetch_optional(&self.pool)
            .await
            .map_err(query_error)?;

        Ok(row.map(|r| r.0))
    }

    #[instrument(skip_all, fields(relation = %self.name, limit = query.limit))]
    pub(crate) async fn fetch_range(&self, query: &RangeQuery) -> StorageResult<Vec<Record<D>>> {
        let mut qb = self.sql.range::<D>(query);
        let rows = qb
            .build_query_as::<RecordRow<D>>()
            .fetch_all(&self.pool)
            .await
            .map_err(query_error)?;

        debug!(rows = rows.len(), "Range scan complete");
        Ok(rows.into_iter().map(|r| r.0).collect())
    }

    pub(crate) async fn fetch_anchor(&self, id: &RecordId) -> StorageResult<Option<SortKey>> {
        let mut qb = self.sql.anchor(*id);
        let row: Option<(DateTime<Utc>, Uuid)> = qb
            .build_query_as()
            .fetch_optional(&self.pool)
            .await
            .map_err(query_error)?;

        Ok(row.map(|(created_at, id)| SortKey::new(created_at, RecordId(id))))
    }
}

impl<D: PgWrite> PgRelation<D> {
    #[instrument(skip_all, fields(relation = %self.name, id = %id))]
    pub(crate) async fn insert_row(&self, id: RecordId, data: &D) -> StorageResult<Record<D>> {
        let mut qb = self.sql.insert(id, data)?;
        let row = qb
            .build_query_as::<RecordRow<D>>()
            .fetch_one(&self.pool)
            .await
            .map_err(query_error)?;

        debug!("Record inserted");
        Ok(row.0)
    }

    #[instrument(skip_all, fields(relation = %self.name, id = %id))]
    pub(crate) async fn update_row(
        &self,
        id: &RecordId,
        data: &D,
    ) -> StorageResult<Option<Record<D>>> {
        let mut qb = self.sql.update(*id, data)?;
        let row = qb
            .build_query_as::<RecordRow<D>>()
            .fetch_optional(&self.pool)
            .await
            .map_err(query_error)?;

        Ok(row.map(|r| r.0))
    }

    #[instrument(skip_all, fields(relation = %self.name, id = %id))]
    pub(crate) async fn delete_row(&self, id: &RecordId) -> StorageResult<bool> {
        let mut qb = self.sql.delete(*id);
        let result = qb
            .build()
            .execute(&self.pool)
            .await
            .map_err(query_error)?;

        Ok(result.rows_affected() > 0)
    }
}
