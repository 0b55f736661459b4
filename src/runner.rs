//! The boundary between the engine and the database driver.
//!
//! [`QueryRunner`] is the narrow contract the engine needs: run a statement
//! with positional parameters, or fetch its rows as driver-neutral
//! [`Value`]s. It is implemented for SQLx's MySQL pool, connections and
//! transactions, the same executors the SQLx API itself accepts.

use std::future::Future;

use sqlx::mysql::{MySqlArguments, MySqlRow};
use sqlx::pool::PoolConnection;
use sqlx::query::Query;
use sqlx::{Column, Executor, MySql, MySqlConnection, MySqlPool, Row, Transaction, TypeInfo, ValueRef};

use crate::value::Value;

/// Type alias for SQLx Query with MySQL arguments
type MySqlQuery<'q> = Query<'q, MySql, MySqlArguments>;

/// A fully fetched result set.
///
/// `columns` is taken from the first row, so it is empty when `rows` is.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RowSet {
    pub columns: Vec<String>,
    pub rows: Vec<Vec<Value>>,
}

/// What a data-modifying statement reports back.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ExecOutcome {
    pub rows_affected: u64,
    pub last_insert_id: u64,
}

/// Executes assembled SQL with positional parameters.
///
/// Implemented for `&MySqlPool`, `&mut MySqlConnection`, `&mut PoolConnection<MySql>`
/// and `&mut Transaction<'_, MySql>`.
pub trait QueryRunner: Send {
    fn execute(
        &mut self,
        sql: &str,
        params: &[Value],
    ) -> impl Future<Output = Result<ExecOutcome, sqlx::Error>> + Send;

    fn fetch_all(
        &mut self,
        sql: &str,
        params: &[Value],
    ) -> impl Future<Output = Result<RowSet, sqlx::Error>> + Send;

    /// Fetches at most one row.
    fn fetch_optional(
        &mut self,
        sql: &str,
        params: &[Value],
    ) -> impl Future<Output = Result<RowSet, sqlx::Error>> + Send;
}

fn bind_value<'q>(q: MySqlQuery<'q>, value: &Value) -> MySqlQuery<'q> {
    match value {
        Value::Null => q.bind(None::<String>),
        Value::Bool(b) => q.bind(*b),
        Value::Int(i) => q.bind(*i),
        Value::UInt(u) => q.bind(*u),
        Value::Float(f) => q.bind(*f),
        Value::Text(s) => q.bind(s.clone()),
        Value::Bytes(b) => q.bind(b.clone()),
        Value::Date(d) => q.bind(*d),
        Value::DateTime(dt) => q.bind(*dt),
        Value::Time(t) => q.bind(*t),
    }
}

fn bind_all<'q>(sql: &'q str, params: &[Value]) -> MySqlQuery<'q> {
    params
        .iter()
        .fold(sqlx::query::<MySql>(sql), |q, value| bind_value(q, value))
}

/// Reads one cell into a [`Value`], picking the Rust type from the MySQL column type.
fn decode_cell(row: &MySqlRow, index: usize) -> Result<Value, sqlx::Error> {
    let raw = row.try_get_raw(index)?;
    if raw.is_null() {
        return Ok(Value::Null);
    }
    let type_name = raw.type_info().name().to_owned();

    let value = match type_name.as_str() {
        "BOOLEAN" => Value::Bool(row.try_get_unchecked(index)?),
        "TINYINT" | "SMALLINT" | "MEDIUMINT" | "INT" | "BIGINT" => {
            Value::Int(row.try_get_unchecked(index)?)
        }
        "YEAR" => Value::UInt(row.try_get_unchecked(index)?),
        name if name.ends_with(" UNSIGNED") => Value::UInt(row.try_get_unchecked(index)?),
        "FLOAT" => Value::Float(f64::from(row.try_get_unchecked::<f32, _>(index)?)),
        "DOUBLE" => Value::Float(row.try_get_unchecked(index)?),
        "DATE" => Value::Date(row.try_get_unchecked(index)?),
        "DATETIME" | "TIMESTAMP" => Value::DateTime(row.try_get_unchecked(index)?),
        "TIME" => Value::Time(row.try_get_unchecked(index)?),
        "BINARY" | "VARBINARY" | "TINYBLOB" | "BLOB" | "MEDIUMBLOB" | "LONGBLOB" | "GEOMETRY" | "BIT" => {
            Value::Bytes(row.try_get_unchecked(index)?)
        }
        _ => match row.try_get_unchecked::<String, _>(index) {
            Ok(text) => Value::Text(text),
            Err(_) => Value::Bytes(row.try_get_unchecked(index)?),
        },
    };
    Ok(value)
}

fn row_set(rows: Vec<MySqlRow>) -> Result<RowSet, sqlx::Error> {
    let columns = rows
        .first()
        .map(|row| row.columns().iter().map(|c| c.name().to_owned()).collect())
        .unwrap_or_default();
    let rows = rows
        .iter()
        .map(|row| (0..row.len()).map(|i| decode_cell(row, i)).collect())
        .collect::<Result<_, _>>()?;
    Ok(RowSet { columns, rows })
}

async fn execute_on<'e, E>(executor: E, sql: &str, params: &[Value]) -> Result<ExecOutcome, sqlx::Error>
where
    E: Executor<'e, Database = MySql>,
{
    let result = bind_all(sql, params).execute(executor).await?;
    Ok(ExecOutcome {
        rows_affected: result.rows_affected(),
        last_insert_id: result.last_insert_id(),
    })
}

async fn fetch_all_on<'e, E>(executor: E, sql: &str, params: &[Value]) -> Result<RowSet, sqlx::Error>
where
    E: Executor<'e, Database = MySql>,
{
    row_set(bind_all(sql, params).fetch_all(executor).await?)
}

async fn fetch_optional_on<'e, E>(
    executor: E,
    sql: &str,
    params: &[Value],
) -> Result<RowSet, sqlx::Error>
where
    E: Executor<'e, Database = MySql>,
{
    let row = bind_all(sql, params).fetch_optional(executor).await?;
    row_set(row.into_iter().collect())
}

impl QueryRunner for &MySqlPool {
    fn execute(
        &mut self,
        sql: &str,
        params: &[Value],
    ) -> impl Future<Output = Result<ExecOutcome, sqlx::Error>> + Send {
        execute_on(*self, sql, params)
    }

    fn fetch_all(
        &mut self,
        sql: &str,
        params: &[Value],
    ) -> impl Future<Output = Result<RowSet, sqlx::Error>> + Send {
        fetch_all_on(*self, sql, params)
    }

    fn fetch_optional(
        &mut self,
        sql: &str,
        params: &[Value],
    ) -> impl Future<Output = Result<RowSet, sqlx::Error>> + Send {
        fetch_optional_on(*self, sql, params)
    }
}

macro_rules! connection_runner {
    ($($ty:ty),+) => {
        $(
            impl QueryRunner for &mut $ty {
                fn execute(
                    &mut self,
                    sql: &str,
                    params: &[Value],
                ) -> impl Future<Output = Result<ExecOutcome, sqlx::Error>> + Send {
                    let conn: &mut MySqlConnection = self;
                    execute_on(conn, sql, params)
                }

                fn fetch_all(
                    &mut self,
                    sql: &str,
                    params: &[Value],
                ) -> impl Future<Output = Result<RowSet, sqlx::Error>> + Send {
                    let conn: &mut MySqlConnection = self;
                    fetch_all_on(conn, sql, params)
                }

                fn fetch_optional(
                    &mut self,
                    sql: &str,
                    params: &[Value],
                ) -> impl Future<Output = Result<RowSet, sqlx::Error>> + Send {
                    let conn: &mut MySqlConnection = self;
                    fetch_optional_on(conn, sql, params)
                }
            }
        )+
    };
}

connection_runner!(MySqlConnection, PoolConnection<MySql>, Transaction<'_, MySql>);
