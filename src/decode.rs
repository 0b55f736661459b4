//! Result decoders, one per [`ResultShape`].
//!
//! Every decoder consumes a fully fetched [`RowSet`]. Column names come from
//! the first row and are resolved once for the whole set. Conversion failures
//! go through [`DecodeContext`], which either aborts or logs and zero-fills
//! depending on the configured [`ConversionMode`].

use std::collections::HashMap;
use std::fmt;
use std::hash::Hash;

use tracing::{error, trace};

use crate::convert::{convert, ConversionError, ConversionMode, FromColumn};
use crate::data::ColumnValue;
use crate::error::{Error, Result};
use crate::names::to_field_names;
use crate::record::{column_at, ColumnSlot, FieldTable, Record};
use crate::runner::RowSet;
use crate::value::Value;

/// The decoding strategy selected by the caller.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ResultShape {
    Value,
    Values,
    Struct,
    Structs,
    Kvs,
    Strings,
    Map,
    Maps,
    Array,
    Arrays,
}

impl fmt::Display for ResultShape {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ResultShape::Value => "value",
            ResultShape::Values => "values",
            ResultShape::Struct => "struct",
            ResultShape::Structs => "structs",
            ResultShape::Kvs => "kvs",
            ResultShape::Strings => "strings",
            ResultShape::Map => "map",
            ResultShape::Maps => "maps",
            ResultShape::Array => "array",
            ResultShape::Arrays => "arrays",
        };
        f.write_str(name)
    }
}

/// Per-call decoding state: the template for error context and the conversion policy.
#[derive(Debug, Clone, Copy)]
pub struct DecodeContext<'a> {
    pub sql: &'a str,
    pub mode: ConversionMode,
}

impl<'a> DecodeContext<'a> {
    pub fn new(sql: &'a str, mode: ConversionMode) -> Self {
        Self { sql, mode }
    }

    /// Converts one cell, applying the conversion policy on failure.
    pub fn convert<T: FromColumn>(&self, column: &str, value: Value) -> Result<T> {
        match convert(value) {
            Ok(v) => Ok(v),
            Err(e) => self.recover(column, e).map(|()| T::default()),
        }
    }

    fn assign(&self, slot: &mut dyn ColumnSlot, column: &str, value: Value) -> Result<()> {
        if let Err(e) = slot.assign(value) {
            self.recover(column, e)?;
            slot.reset();
        }
        Ok(())
    }

    fn recover(&self, column: &str, source: ConversionError) -> Result<()> {
        match self.mode {
            ConversionMode::Strict => Err(Error::Conversion {
                sql: self.sql.to_owned(),
                column: column.to_owned(),
                source,
            }),
            ConversionMode::Lenient => {
                error!(sql = self.sql, column, error = %source, "conversion failed, storing zero value");
                Ok(())
            }
        }
    }
}

fn column_name(columns: &[String], index: usize) -> &str {
    columns.get(index).map(String::as_str).unwrap_or("")
}

/// A fixed number of typed columns, decoded from one row.
///
/// Implemented for tuples of one to eight [`FromColumn`] types. `Columns` is
/// the matching tuple of vectors used by the plural shape.
pub trait ValueTuple: Sized {
    const ARITY: usize;
    type Columns: Default;

    fn from_row(row: Vec<Value>, columns: &[String], ctx: &DecodeContext<'_>) -> Result<Self>;

    fn push_into(self, columns: &mut Self::Columns);
}

macro_rules! value_tuple {
    ($arity:literal => $($t:ident $idx:tt),+) => {
        impl<$($t: FromColumn),+> ValueTuple for ($($t,)+) {
            const ARITY: usize = $arity;
            type Columns = ($(Vec<$t>,)+);

            fn from_row(row: Vec<Value>, columns: &[String], ctx: &DecodeContext<'_>) -> Result<Self> {
                let mut cells = row.into_iter();
                Ok(($(
                    ctx.convert::<$t>(column_name(columns, $idx), cells.next().unwrap_or_default())?,
                )+))
            }

            fn push_into(self, columns: &mut Self::Columns) {
                $( columns.$idx.push(self.$idx); )+
            }
        }
    };
}

value_tuple!(1 => A 0);
value_tuple!(2 => A 0, B 1);
value_tuple!(3 => A 0, B 1, C 2);
value_tuple!(4 => A 0, B 1, C 2, D 3);
value_tuple!(5 => A 0, B 1, C 2, D 3, E 4);
value_tuple!(6 => A 0, B 1, C 2, D 3, E 4, F 5);
value_tuple!(7 => A 0, B 1, C 2, D 3, E 4, F 5, G 6);
value_tuple!(8 => A 0, B 1, C 2, D 3, E 4, F 5, G 6, H 7);

fn check_arity(set: &RowSet, ctx: &DecodeContext<'_>, shape: ResultShape, arity: usize) -> Result<()> {
    if set.rows.is_empty() || set.columns.len() == arity {
        return Ok(());
    }
    Err(Error::shape(
        ctx.sql,
        shape,
        format!(
            "expects {arity} column(s) but the query returned {}",
            set.columns.len()
        ),
    ))
}

/// First row into a tuple. `None` when there are no rows.
pub fn decode_value<T: ValueTuple>(set: RowSet, ctx: &DecodeContext<'_>) -> Result<Option<T>> {
    check_arity(&set, ctx, ResultShape::Value, T::ARITY)?;
    let RowSet { columns, rows } = set;
    rows.into_iter()
        .next()
        .map(|row| T::from_row(row, &columns, ctx))
        .transpose()
}

/// Every row into parallel column vectors.
pub fn decode_values<T: ValueTuple>(set: RowSet, ctx: &DecodeContext<'_>) -> Result<T::Columns> {
    check_arity(&set, ctx, ResultShape::Values, T::ARITY)?;
    let RowSet { columns, rows } = set;
    let mut out = T::Columns::default();
    for row in rows {
        T::from_row(row, &columns, ctx)?.push_into(&mut out);
    }
    Ok(out)
}

/// The single column of the first row; the zero value when there are no rows.
pub fn decode_scalar<T: FromColumn>(set: RowSet, ctx: &DecodeContext<'_>) -> Result<T> {
    check_arity(&set, ctx, ResultShape::Value, 1)?;
    let RowSet { columns, rows } = set;
    match rows.into_iter().next().and_then(|row| row.into_iter().next()) {
        Some(value) => ctx.convert(column_name(&columns, 0), value),
        None => Ok(T::default()),
    }
}

/// The single column of every row.
pub fn decode_scalars<T: FromColumn>(set: RowSet, ctx: &DecodeContext<'_>) -> Result<Vec<T>> {
    check_arity(&set, ctx, ResultShape::Values, 1)?;
    let RowSet { columns, rows } = set;
    let column = column_name(&columns, 0);
    rows.into_iter()
        .map(|row| ctx.convert(column, row.into_iter().next().unwrap_or_default()))
        .collect()
}

fn resolve_columns<'t>(table: &'t FieldTable, columns: &[String]) -> Vec<Option<&'t [usize]>> {
    columns
        .iter()
        .map(|column| {
            let path = table.resolve(column);
            if path.is_none() {
                trace!(column = %column, "no field matches column, discarding");
            }
            path
        })
        .collect()
}

fn fill_record<R: Record>(
    record: &mut R,
    paths: &[Option<&[usize]>],
    row: Vec<Value>,
    columns: &[String],
    ctx: &DecodeContext<'_>,
    shape: ResultShape,
) -> Result<()> {
    for ((path, value), column) in paths.iter().zip(row).zip(columns) {
        let Some(path) = path else {
            continue;
        };
        let slot = column_at(record, path).ok_or_else(|| {
            Error::shape(
                ctx.sql,
                shape,
                format!("field for column '{column}' has no slot"),
            )
        })?;
        ctx.assign(slot, column, value)?;
    }
    Ok(())
}

/// First row into a record; later rows are ignored.
pub fn decode_struct<R: Record + Default>(set: RowSet, ctx: &DecodeContext<'_>) -> Result<Option<R>> {
    let RowSet { columns, rows } = set;
    let Some(row) = rows.into_iter().next() else {
        return Ok(None);
    };
    let table = FieldTable::of::<R>();
    let paths = resolve_columns(&table, &columns);
    let mut record = R::default();
    fill_record(&mut record, &paths, row, &columns, ctx, ResultShape::Struct)?;
    Ok(Some(record))
}

/// Appends one record per row to `out`, returning the number of rows decoded.
///
/// Field resolution is computed once from the column list and reused for every row.
pub fn decode_structs_into<R: Record + Default>(
    set: RowSet,
    ctx: &DecodeContext<'_>,
    out: &mut Vec<R>,
) -> Result<usize> {
    let RowSet { columns, rows } = set;
    let table = FieldTable::of::<R>();
    let paths = resolve_columns(&table, &columns);
    let count = rows.len();
    out.reserve(count);
    for row in rows {
        let mut record = R::default();
        fill_record(&mut record, &paths, row, &columns, ctx, ResultShape::Structs)?;
        out.push(record);
    }
    Ok(count)
}

/// Two-column rows into `out`, first column as key. Duplicate keys keep the last row.
pub fn decode_kvs_into<K, V>(
    set: RowSet,
    ctx: &DecodeContext<'_>,
    out: &mut HashMap<K, V>,
) -> Result<usize>
where
    K: FromColumn + Eq + Hash,
    V: FromColumn,
{
    check_arity(&set, ctx, ResultShape::Kvs, 2)?;
    let RowSet { columns, rows } = set;
    let count = rows.len();
    for row in rows {
        let mut cells = row.into_iter();
        let key = ctx.convert(column_name(&columns, 0), cells.next().unwrap_or_default())?;
        let value = ctx.convert(column_name(&columns, 1), cells.next().unwrap_or_default())?;
        out.insert(key, value);
    }
    Ok(count)
}

/// Column names and every cell as text. `NULL` becomes the empty string.
pub fn decode_strings(set: RowSet) -> (Vec<String>, Vec<Vec<String>>) {
    let rows = set
        .rows
        .iter()
        .map(|row| row.iter().map(Value::to_text).collect())
        .collect();
    (set.columns, rows)
}

fn row_map(columns: &[String], row: Vec<Value>) -> HashMap<String, ColumnValue> {
    columns
        .iter()
        .zip(row)
        .map(|(column, value)| (to_field_names(column).plain, ColumnValue::new(value)))
        .collect()
}

/// First row keyed by the plain field name of each column.
pub fn decode_map(set: RowSet) -> Option<HashMap<String, ColumnValue>> {
    let RowSet { columns, rows } = set;
    rows.into_iter().next().map(|row| row_map(&columns, row))
}

pub fn decode_maps(set: RowSet) -> Vec<HashMap<String, ColumnValue>> {
    let RowSet { columns, rows } = set;
    rows.into_iter().map(|row| row_map(&columns, row)).collect()
}

/// First row as cells in column order.
pub fn decode_array(set: RowSet) -> Option<Vec<ColumnValue>> {
    set.rows
        .into_iter()
        .next()
        .map(|row| row.into_iter().map(ColumnValue::new).collect())
}

pub fn decode_arrays(set: RowSet) -> Vec<Vec<ColumnValue>> {
    set.rows
        .into_iter()
        .map(|row| row.into_iter().map(ColumnValue::new).collect())
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDateTime;

    const SQL: &str = "SELECT * FROM user WHERE id IN #{ids}";

    fn strict() -> DecodeContext<'static> {
        DecodeContext::new(SQL, ConversionMode::Strict)
    }

    fn set(columns: &[&str], rows: Vec<Vec<Value>>) -> RowSet {
        RowSet {
            columns: columns.iter().map(|c| c.to_string()).collect(),
            rows,
        }
    }

    #[derive(Debug, Default, PartialEq)]
    struct User {
        id: i64,
        email: String,
        create_time: NaiveDateTime,
    }

    crate::record! {
        User {
            id: i64 => "ID",
            email: String => "Email",
            create_time: NaiveDateTime => "CreateTime",
        }
    }

    fn user_rows(n: i64) -> RowSet {
        set(
            &["id", "email", "create_time", "extra_column"],
            (1..=n)
                .map(|i| {
                    vec![
                        Value::Int(i),
                        Value::Bytes(format!("user{i}@example.com").into_bytes()),
                        Value::Text("2014-06-01 12:32:40".into()),
                        Value::Text("ignored".into()),
                    ]
                })
                .collect(),
        )
    }

    #[test]
    fn test_decode_struct_takes_first_row() {
        let user: User = decode_struct(user_rows(3), &strict()).unwrap().unwrap();
        assert_eq!(user.id, 1);
        assert_eq!(user.email, "user1@example.com");
        assert_eq!(user.create_time.to_string(), "2014-06-01 12:32:40");
    }

    #[test]
    fn test_decode_struct_without_rows() {
        let user: Option<User> = decode_struct(set(&[], vec![]), &strict()).unwrap();
        assert_eq!(user, None);
    }

    #[test]
    fn test_decode_structs_yields_one_record_per_row() {
        let mut users: Vec<User> = Vec::new();
        let count = decode_structs_into(user_rows(5), &strict(), &mut users).unwrap();
        assert_eq!(count, 5);
        assert_eq!(users.len(), 5);
        assert_eq!(users[4].id, 5);
        assert_eq!(users[4].email, "user5@example.com");
    }

    #[test]
    fn test_decode_values_checks_arity() {
        let rows = set(&["id", "email"], vec![vec![Value::Int(1), Value::Text("a".into())]]);
        let err = decode_value::<(i64,)>(rows, &strict()).unwrap_err();
        match err {
            Error::Shape { shape, sql, .. } => {
                assert_eq!(shape, ResultShape::Value);
                assert_eq!(sql, SQL);
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn test_decode_values_appends_per_row() {
        let rows = set(
            &["id", "email"],
            vec![
                vec![Value::Int(1), Value::Text("a".into())],
                vec![Value::Int(2), Value::Null],
            ],
        );
        let (ids, emails): (Vec<i64>, Vec<String>) =
            decode_values::<(i64, String)>(rows, &strict()).unwrap();
        assert_eq!(ids, vec![1, 2]);
        assert_eq!(emails, vec!["a".to_owned(), String::new()]);
    }

    #[test]
    fn test_decode_value_without_rows_skips_arity_check() {
        let value = decode_value::<(i64, String, bool)>(set(&[], vec![]), &strict()).unwrap();
        assert_eq!(value, None);
    }

    #[test]
    fn test_decode_kvs_last_write_wins() {
        let rows = set(
            &["id", "email"],
            vec![
                vec![Value::Int(1), Value::Text("first".into())],
                vec![Value::Int(2), Value::Text("other".into())],
                vec![Value::Int(1), Value::Text("second".into())],
            ],
        );
        let mut map: HashMap<i64, String> = HashMap::new();
        let count = decode_kvs_into(rows, &strict(), &mut map).unwrap();
        assert_eq!(count, 3);
        assert_eq!(map.len(), 2);
        assert_eq!(map[&1], "second");
    }

    #[test]
    fn test_decode_kvs_requires_two_columns() {
        let rows = set(&["id"], vec![vec![Value::Int(1)]]);
        let mut map: HashMap<i64, String> = HashMap::new();
        let err = decode_kvs_into(rows, &strict(), &mut map).unwrap_err();
        assert!(matches!(err, Error::Shape { shape: ResultShape::Kvs, .. }));
    }

    #[test]
    fn test_decode_strings_stringifies_everything() {
        let rows = set(
            &["id", "email", "score"],
            vec![vec![Value::Int(1), Value::Null, Value::Float(1.5)]],
        );
        let (columns, rows) = decode_strings(rows);
        assert_eq!(columns, vec!["id", "email", "score"]);
        assert_eq!(rows, vec![vec!["1".to_owned(), String::new(), "1.5".to_owned()]]);
    }

    #[test]
    fn test_strict_conversion_failure_names_the_column() {
        let rows = set(&["id"], vec![vec![Value::Text("abc".into())]]);
        let err = decode_scalars::<i64>(rows, &strict()).unwrap_err();
        match err {
            Error::Conversion { column, sql, .. } => {
                assert_eq!(column, "id");
                assert_eq!(sql, SQL);
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn test_lenient_conversion_stores_zero_value() {
        let ctx = DecodeContext::new(SQL, ConversionMode::Lenient);
        let rows = set(
            &["id", "email", "create_time"],
            vec![vec![
                Value::Text("abc".into()),
                Value::Text("a@b.c".into()),
                Value::Text("not a time".into()),
            ]],
        );
        let (logs, _guard) = crate::observe::capture::install();
        let user: User = decode_struct(rows, &ctx).unwrap().unwrap();
        assert_eq!(user.id, 0);
        assert_eq!(user.email, "a@b.c");
        assert_eq!(user.create_time, NaiveDateTime::default());

        let failures = logs.matching("conversion failed");
        assert_eq!(failures.len(), 2);
        assert!(failures.iter().all(|l| l.contains("ERROR")));
        assert!(failures[0].contains(r#"column="id""#));
        assert!(failures[1].contains(r#"column="create_time""#));
    }

    #[test]
    fn test_decode_scalar_zero_when_empty() {
        assert_eq!(decode_scalar::<i64>(set(&[], vec![]), &strict()).unwrap(), 0);
        let rows = set(&["n"], vec![vec![Value::UInt(12)], vec![Value::UInt(13)]]);
        assert_eq!(decode_scalar::<u32>(rows, &strict()).unwrap(), 12);
    }

    #[test]
    fn test_decode_scalars_check_single_column() {
        let rows = || set(&["id", "email"], vec![vec![Value::Int(1), Value::Text("a".into())]]);
        match decode_scalar::<i64>(rows(), &strict()).unwrap_err() {
            Error::Shape { shape, .. } => assert_eq!(shape, ResultShape::Value),
            other => panic!("unexpected error: {other:?}"),
        }
        match decode_scalars::<i64>(rows(), &strict()).unwrap_err() {
            Error::Shape { shape, .. } => assert_eq!(shape, ResultShape::Values),
            other => panic!("unexpected error: {other:?}"),
        }
        assert!(decode_scalars::<i64>(set(&["id", "email"], vec![]), &strict())
            .unwrap()
            .is_empty());
    }

    #[test]
    fn test_decode_map_keys_by_field_name() {
        let rows = set(&["user_id", "email"], vec![vec![Value::Int(3), Value::Null]]);
        let map = decode_map(rows).unwrap();
        assert_eq!(map["UserID"].as_i64().unwrap(), 3);
        assert!(map["Email"].is_null());
    }

    #[test]
    fn test_decode_arrays_keep_column_order() {
        let rows = set(
            &["a", "b"],
            vec![
                vec![Value::Int(1), Value::Text("x".into())],
                vec![Value::Int(2), Value::Text("y".into())],
            ],
        );
        let arrays = decode_arrays(rows);
        assert_eq!(arrays.len(), 2);
        assert_eq!(arrays[1][1].as_str().unwrap(), "y");
    }
}
