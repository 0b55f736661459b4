//! Parameter shapes accepted by the binder.

use std::collections::HashMap;

use chrono::{DateTime, NaiveDate, NaiveDateTime, NaiveTime, TimeZone};

use crate::value::Value;

/// One positional argument or one named entry: a single value or a list for `IN`.
#[derive(Debug, Clone, PartialEq)]
pub enum Param {
    Value(Value),
    List(Vec<Value>),
}

impl Param {
    /// Builds a list parameter, typically bound to an `IN #{...}` placeholder.
    pub fn list<I, T>(items: I) -> Self
    where
        I: IntoIterator<Item = T>,
        T: Into<Value>,
    {
        Param::List(items.into_iter().map(Into::into).collect())
    }
}

impl<T: Into<Value>> From<T> for Param {
    fn from(v: T) -> Self {
        Param::Value(v.into())
    }
}

/// The logical parameter of one statement.
///
/// The variant decides the binding strategy:
///
/// - `Value`: the value is bound to every placeholder.
/// - `Seq`: elements are bound positionally in placeholder order; when the
///   template has exactly one placeholder and it follows `IN`, the whole
///   sequence is flattened into it.
/// - `Map`: each placeholder name is looked up as a key.
/// - `Record`: each placeholder name is looked up as an exported field.
#[derive(Clone, Default)]
pub enum Params<'a> {
    #[default]
    None,
    Value(Value),
    Seq(Vec<Param>),
    Map(HashMap<String, Param>),
    Record(&'a dyn ToParams),
}

impl<'a> Params<'a> {
    /// A sequence of plain values, e.g. the ids for `WHERE id IN #{ids}`.
    pub fn list<I, T>(items: I) -> Self
    where
        I: IntoIterator<Item = T>,
        T: Into<Value>,
    {
        Params::Seq(items.into_iter().map(|v| Param::Value(v.into())).collect())
    }

    /// Several positional arguments. See also [`params!`](crate::params!).
    pub fn positional(args: Vec<Param>) -> Self {
        Params::Seq(args)
    }

    pub fn map<I, K, P>(entries: I) -> Self
    where
        I: IntoIterator<Item = (K, P)>,
        K: Into<String>,
        P: Into<Param>,
    {
        Params::Map(
            entries
                .into_iter()
                .map(|(k, p)| (k.into(), p.into()))
                .collect(),
        )
    }

    pub fn record(record: &'a dyn ToParams) -> Self {
        Params::Record(record)
    }
}

impl<T: Into<Value>> From<T> for Params<'_> {
    fn from(v: T) -> Self {
        Params::Value(v.into())
    }
}

impl std::fmt::Debug for Params<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Params::None => f.write_str("None"),
            Params::Value(v) => f.debug_tuple("Value").field(v).finish(),
            Params::Seq(items) => f.debug_tuple("Seq").field(items).finish(),
            Params::Map(map) => f.debug_tuple("Map").field(map).finish(),
            Params::Record(_) => f.write_str("Record(..)"),
        }
    }
}

/// Builds positional [`Params`] from a list of arguments.
///
/// ```
/// use sqlx_osm::{params, Param, Params};
///
/// let params = params![Param::list([1, 2, 3]), "John"];
/// assert!(matches!(params, Params::Seq(ref args) if args.len() == 2));
/// ```
#[macro_export]
macro_rules! params {
    () => {
        $crate::Params::None
    };
    ($($arg:expr),+ $(,)?) => {
        $crate::Params::Seq(::std::vec![$($crate::Param::from($arg)),+])
    };
}

/// Field lookup for record parameters.
///
/// Names are the exported field names used in placeholders, e.g. `#{Email}`.
/// Implemented by [`record!`](crate::record!).
pub trait ToParams {
    fn param(&self, name: &str) -> Option<Param>;
}

/// Converts a record field into a parameter. `Vec<T>` becomes a list.
pub trait ToParam {
    fn to_param(&self) -> Param;
}

macro_rules! scalar_to_param {
    ($($t:ty),+) => {
        $(
            impl ToParam for $t {
                fn to_param(&self) -> Param {
                    Param::Value(Value::from(self.clone()))
                }
            }
        )+
    };
}

scalar_to_param!(
    bool, i8, i16, i32, i64, isize, u8, u16, u32, u64, usize, f32, f64, String, NaiveDate,
    NaiveDateTime, NaiveTime, Value
);

impl<Tz: TimeZone> ToParam for DateTime<Tz> {
    fn to_param(&self) -> Param {
        Param::Value(Value::from(self.clone()))
    }
}

impl<T: ToParam> ToParam for Option<T> {
    fn to_param(&self) -> Param {
        match self {
            Some(v) => v.to_param(),
            None => Param::Value(Value::Null),
        }
    }
}

impl<T: Clone + Into<Value>> ToParam for Vec<T> {
    fn to_param(&self) -> Param {
        Param::list(self.iter().cloned())
    }
}
