use chrono::{DateTime, Local, NaiveDate, NaiveDateTime};

use crate::convert::{convert, ConversionError, FromColumn};
use crate::value::Value;

/// One decoded cell, kept in its driver-native form until a typed accessor asks for it.
///
/// Used by the weakly typed result shapes (`fetch_map`, `fetch_array`, ...).
/// Accessors apply the usual conversion rules, so `NULL` reads as the zero value.
///
/// # Examples
///
/// ```
/// use sqlx_osm::{ColumnValue, Value};
///
/// let cell = ColumnValue::new(Value::Text("42".into()));
/// assert_eq!(cell.as_i64()?, 42);
/// assert_eq!(cell.as_str()?, "42");
/// assert_eq!(ColumnValue::default().as_i64()?, 0);
/// # Ok::<(), sqlx_osm::convert::ConversionError>(())
/// ```
#[derive(Debug, Clone, PartialEq, Default)]
pub struct ColumnValue(Value);

impl ColumnValue {
    pub fn new(value: Value) -> Self {
        Self(value)
    }

    pub fn is_null(&self) -> bool {
        self.0.is_null()
    }

    pub fn value(&self) -> &Value {
        &self.0
    }

    pub fn into_value(self) -> Value {
        self.0
    }

    /// Converts a copy of the cell into any [`FromColumn`] type.
    pub fn get<T: FromColumn>(&self) -> Result<T, ConversionError> {
        convert(self.0.clone())
    }

    pub fn as_bool(&self) -> Result<bool, ConversionError> {
        self.get()
    }

    pub fn as_i64(&self) -> Result<i64, ConversionError> {
        self.get()
    }

    pub fn as_u64(&self) -> Result<u64, ConversionError> {
        self.get()
    }

    pub fn as_f64(&self) -> Result<f64, ConversionError> {
        self.get()
    }

    /// Borrows text content. Only text cells and `NULL` (as `""`) qualify;
    /// use [`get::<String>`](Self::get) to stringify other kinds.
    pub fn as_str(&self) -> Result<&str, ConversionError> {
        match &self.0 {
            Value::Text(s) => Ok(s),
            Value::Null => Ok(""),
            Value::Bytes(b) => std::str::from_utf8(b).map_err(|_| ConversionError::Parse {
                text: String::from_utf8_lossy(b).into_owned(),
                to: "str",
            }),
            other => Err(ConversionError::Incompatible {
                from: other.kind(),
                to: "str",
            }),
        }
    }

    pub fn as_bytes(&self) -> Result<Vec<u8>, ConversionError> {
        self.get()
    }

    pub fn as_date(&self) -> Result<NaiveDate, ConversionError> {
        self.get()
    }

    pub fn as_datetime(&self) -> Result<NaiveDateTime, ConversionError> {
        self.get()
    }

    pub fn as_local(&self) -> Result<DateTime<Local>, ConversionError> {
        self.get()
    }
}

impl From<Value> for ColumnValue {
    fn from(value: Value) -> Self {
        Self(value)
    }
}

impl std::fmt::Display for ColumnValue {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        self.0.fmt(f)
    }
}

impl FromColumn for ColumnValue {
    const NULLABLE: bool = true;

    fn from_value(value: Value) -> Result<Self, ConversionError> {
        Ok(Self(value))
    }
}
