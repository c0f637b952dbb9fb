use chrono::{DateTime, NaiveDateTime, SecondsFormat, Utc};
use serde_json::{Map, Number, Value};
use sqlx::postgres::{PgArguments, PgRow};
use sqlx::query::Query;
use sqlx::sqlite::{SqliteArguments, SqliteRow};
use sqlx::{Column, PgPool, Postgres, Row, Sqlite, SqlitePool, TypeInfo, ValueRef};
use std::fmt;
use std::sync::Arc;
use worldforge_schema::{DATETIME_FORMAT, FieldType};

use super::backend::BackendKind;
use crate::error::WorldforgeError;

/// A row as the engine returned it: column name to JSON value, nothing renamed or dropped.
pub type RawRow = Map<String, Value>;

/// Value bound to a `?` placeholder.
#[derive(Debug, Clone, PartialEq)]
pub enum DbValue {
    Integer(i64),
    Text(String),
    Timestamp(DateTime<Utc>),
}

impl DbValue {
    /// Converts a validated JSON field value into a bindable value.
    ///
    /// `None` for null, for list-typed fields, and for values that do not fit `ty`.
    pub fn from_json(ty: FieldType, value: &Value) -> Option<Self> {
        match ty {
            FieldType::Integer => value.as_i64().map(DbValue::Integer),
            FieldType::Text | FieldType::YesNo => {
                value.as_str().map(|s| DbValue::Text(s.to_string()))
            }
            FieldType::DateTime => value
                .as_str()
                .and_then(|s| NaiveDateTime::parse_from_str(s, DATETIME_FORMAT).ok())
                .map(|naive| DbValue::Timestamp(naive.and_utc())),
            FieldType::IntegerList => None,
        }
    }
}

/// Renders a timestamp in the wire format shared by both engines.
pub fn format_timestamp(ts: DateTime<Utc>) -> String {
    ts.to_rfc3339_opts(SecondsFormat::Millis, true)
}

enum Pool {
    Sqlite(SqlitePool),
    Postgres(PgPool),
}

struct HandleInner {
    kind: BackendKind,
    pool: Pool,
}

/// Shared, cheaply cloneable handle to one backend's pool.
///
/// Clones point at the same pool; [`ConnectionHandle::same_as`] tells whether two handles
/// came from the same provisioning.
#[derive(Clone)]
pub struct ConnectionHandle {
    inner: Arc<HandleInner>,
}

impl fmt::Debug for ConnectionHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ConnectionHandle")
            .field("kind", &self.inner.kind)
            .field("closed", &self.is_closed())
            .finish()
    }
}

impl ConnectionHandle {
    pub(crate) fn embedded(pool: SqlitePool) -> Self {
        Self::from_pool(BackendKind::Embedded, Pool::Sqlite(pool))
    }

    pub(crate) fn networked(pool: PgPool) -> Self {
        Self::from_pool(BackendKind::Networked, Pool::Postgres(pool))
    }

    fn from_pool(kind: BackendKind, pool: Pool) -> Self {
        Self {
            inner: Arc::new(HandleInner { kind, pool }),
        }
    }

    pub fn kind(&self) -> BackendKind {
        self.inner.kind
    }

    pub fn same_as(&self, other: &ConnectionHandle) -> bool {
        Arc::ptr_eq(&self.inner, &other.inner)
    }

    pub fn is_closed(&self) -> bool {
        match &self.inner.pool {
            Pool::Sqlite(pool) => pool.is_closed(),
            Pool::Postgres(pool) => pool.is_closed(),
        }
    }

    pub(crate) async fn close(&self) {
        match &self.inner.pool {
            Pool::Sqlite(pool) => pool.close().await,
            Pool::Postgres(pool) => pool.close().await,
        }
    }

    /// Runs `sql` (written with `?` placeholders) and returns every row.
    pub async fn fetch_all(
        &self,
        sql: &str,
        params: &[DbValue],
    ) -> Result<Vec<RawRow>, WorldforgeError> {
        match &self.inner.pool {
            Pool::Sqlite(pool) => {
                let rows = bind_sqlite(sqlx::query(sql), params)
                    .fetch_all(pool)
                    .await?;
                rows.iter().map(sqlite_row).collect()
            }
            Pool::Postgres(pool) => {
                let sql = numbered_placeholders(sql);
                let rows = bind_postgres(sqlx::query(&sql), params)
                    .fetch_all(pool)
                    .await?;
                rows.iter().map(postgres_row).collect()
            }
        }
    }

    pub async fn fetch_optional(
        &self,
        sql: &str,
        params: &[DbValue],
    ) -> Result<Option<RawRow>, WorldforgeError> {
        match &self.inner.pool {
            Pool::Sqlite(pool) => {
                let row = bind_sqlite(sqlx::query(sql), params)
                    .fetch_optional(pool)
                    .await?;
                row.as_ref().map(sqlite_row).transpose()
            }
            Pool::Postgres(pool) => {
                let sql = numbered_placeholders(sql);
                let row = bind_postgres(sqlx::query(&sql), params)
                    .fetch_optional(pool)
                    .await?;
                row.as_ref().map(postgres_row).transpose()
            }
        }
    }

    /// Returns the number of affected rows.
    pub async fn execute(&self, sql: &str, params: &[DbValue]) -> Result<u64, WorldforgeError> {
        let affected = match &self.inner.pool {
            Pool::Sqlite(pool) => bind_sqlite(sqlx::query(sql), params)
                .execute(pool)
                .await?
                .rows_affected(),
            Pool::Postgres(pool) => {
                let sql = numbered_placeholders(sql);
                bind_postgres(sqlx::query(&sql), params)
                    .execute(pool)
                    .await?
                    .rows_affected()
            }
        };
        Ok(affected)
    }
}

/// Rewrites `?` placeholders into PostgreSQL's `$1, $2, ...`.
///
/// Question marks inside single-quoted literals are left alone.
pub(super) fn numbered_placeholders(sql: &str) -> String {
    let mut out = String::with_capacity(sql.len() + 8);
    let mut index = 0;
    let mut in_literal = false;
    for c in sql.chars() {
        match c {
            '\'' => {
                in_literal = !in_literal;
                out.push(c);
            }
            '?' if !in_literal => {
                index += 1;
                out.push('$');
                out.push_str(&index.to_string());
            }
            _ => out.push(c),
        }
    }
    out
}

fn bind_sqlite<'q>(
    mut query: Query<'q, Sqlite, SqliteArguments<'q>>,
    params: &'q [DbValue],
) -> Query<'q, Sqlite, SqliteArguments<'q>> {
    for param in params {
        query = match param {
            DbValue::Integer(v) => query.bind(*v),
            DbValue::Text(v) => query.bind(v.as_str()),
            // Stored as text so rows read back already in wire format.
            DbValue::Timestamp(v) => query.bind(format_timestamp(*v)),
        };
    }
    query
}

fn bind_postgres<'q>(
    mut query: Query<'q, Postgres, PgArguments>,
    params: &'q [DbValue],
) -> Query<'q, Postgres, PgArguments> {
    for param in params {
        query = match param {
            DbValue::Integer(v) => query.bind(*v),
            DbValue::Text(v) => query.bind(v.as_str()),
            // Columns are TIMESTAMP WITHOUT TIME ZONE holding UTC.
            DbValue::Timestamp(v) => query.bind(v.naive_utc()),
        };
    }
    query
}

fn float_value(v: f64) -> Value {
    Number::from_f64(v).map_or(Value::Null, Value::Number)
}

fn sqlite_row(row: &SqliteRow) -> Result<RawRow, WorldforgeError> {
    let mut out = Map::new();
    for (i, column) in row.columns().iter().enumerate() {
        let raw = row.try_get_raw(i)?;
        let value = if raw.is_null() {
            Value::Null
        } else if let Ok(v) = row.try_get::<i64, _>(i) {
            Value::from(v)
        } else if let Ok(v) = row.try_get::<f64, _>(i) {
            float_value(v)
        } else if let Ok(v) = row.try_get::<String, _>(i) {
            Value::String(v)
        } else {
            return Err(WorldforgeError::UnsupportedColumnType {
                column: column.name().to_string(),
                type_name: raw.type_info().name().to_string(),
            });
        };
        out.insert(column.name().to_string(), value);
    }
    Ok(out)
}

fn postgres_row(row: &PgRow) -> Result<RawRow, WorldforgeError> {
    let mut out = Map::new();
    for (i, column) in row.columns().iter().enumerate() {
        let raw = row.try_get_raw(i)?;
        let value = if raw.is_null() {
            Value::Null
        } else if let Ok(v) = row.try_get::<i64, _>(i) {
            Value::from(v)
        } else if let Ok(v) = row.try_get::<i32, _>(i) {
            Value::from(v)
        } else if let Ok(v) = row.try_get::<i16, _>(i) {
            Value::from(v)
        } else if let Ok(v) = row.try_get::<f64, _>(i) {
            float_value(v)
        } else if let Ok(v) = row.try_get::<f32, _>(i) {
            float_value(f64::from(v))
        } else if let Ok(v) = row.try_get::<bool, _>(i) {
            Value::Bool(v)
        } else if let Ok(v) = row.try_get::<DateTime<Utc>, _>(i) {
            Value::String(format_timestamp(v))
        } else if let Ok(v) = row.try_get::<NaiveDateTime, _>(i) {
            Value::String(format_timestamp(v.and_utc()))
        } else if let Ok(v) = row.try_get::<String, _>(i) {
            Value::String(v)
        } else {
            return Err(WorldforgeError::UnsupportedColumnType {
                column: column.name().to_string(),
                type_name: raw.type_info().name().to_string(),
            });
        };
        out.insert(column.name().to_string(), value);
    }
    Ok(out)
}
