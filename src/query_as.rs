//! Typed fetch operations on [`PreparedQuery`], one per result shape.
//!
//! | Method | Shape | Result |
//! |---|---|---|
//! | [`fetch_struct`](PreparedQuery::fetch_struct) | struct | first row as a record |
//! | [`fetch_structs`](PreparedQuery::fetch_structs) | structs | every row as a record |
//! | [`fetch_value`](PreparedQuery::fetch_value) | value | first row as a tuple |
//! | [`fetch_values`](PreparedQuery::fetch_values) | values | one vector per column |
//! | [`fetch_scalar`](PreparedQuery::fetch_scalar) | value | the single column of the first row |
//! | [`fetch_scalars`](PreparedQuery::fetch_scalars) | values | the single column of every row |
//! | [`fetch_kvs`](PreparedQuery::fetch_kvs) | kvs | two columns as a map |
//! | [`fetch_strings`](PreparedQuery::fetch_strings) | strings | column names and text rows |
//! | [`fetch_map`](PreparedQuery::fetch_map) / [`fetch_maps`](PreparedQuery::fetch_maps) | map(s) | rows keyed by field name |
//! | [`fetch_array`](PreparedQuery::fetch_array) / [`fetch_arrays`](PreparedQuery::fetch_arrays) | array(s) | rows as cell vectors |
//!
//! Every method fails with [`Error::Database`](crate::Error::Database) when
//! the runner fails, and with `Shape` or `Conversion` errors when the rows do
//! not fit the destination. Destinations passed to the `_into` variants may be
//! partially filled when an error is returned.

use std::collections::HashMap;
use std::hash::Hash;

use crate::convert::FromColumn;
use crate::data::ColumnValue;
use crate::decode::{self, ValueTuple};
use crate::query::PreparedQuery;
use crate::record::Record;
use crate::runner::QueryRunner;

impl PreparedQuery {
    /// Decodes the first row into a record. Additional rows are ignored.
    ///
    /// # Examples
    ///
    /// ```rust,no_run
    /// use sqlx::MySqlPool;
    /// use sqlx_osm::{record, Osm};
    ///
    /// #[derive(Debug, Default)]
    /// struct User {
    ///     id: i64,
    ///     email: String,
    /// }
    ///
    /// record! {
    ///     User {
    ///         id: i64 => "ID",
    ///         email: String => "Email",
    ///     }
    /// }
    ///
    /// # async fn example() -> Result<(), Box<dyn std::error::Error>> {
    /// # let pool = MySqlPool::connect("mysql://localhost/test").await?;
    /// let osm = Osm::default();
    /// let user: Option<User> = osm
    ///     .prepare("SELECT id, email FROM user WHERE id = #{id}", 42)?
    ///     .fetch_struct(&pool)
    ///     .await?;
    /// # Ok(())
    /// # }
    /// ```
    pub async fn fetch_struct<R, X>(&self, runner: X) -> crate::Result<Option<R>>
    where
        R: Record + Default,
        X: QueryRunner,
    {
        let set = self.fetch_rows(runner, true).await?;
        decode::decode_struct(set, &self.decode_context())
    }

    /// Decodes every row into a record.
    pub async fn fetch_structs<R, X>(&self, runner: X) -> crate::Result<Vec<R>>
    where
        R: Record + Default,
        X: QueryRunner,
    {
        let mut out = Vec::new();
        self.fetch_structs_into(runner, &mut out).await?;
        Ok(out)
    }

    /// Appends one record per row to `out`, returning the number of rows.
    pub async fn fetch_structs_into<R, X>(&self, runner: X, out: &mut Vec<R>) -> crate::Result<usize>
    where
        R: Record + Default,
        X: QueryRunner,
    {
        let set = self.fetch_rows(runner, false).await?;
        decode::decode_structs_into(set, &self.decode_context(), out)
    }

    /// Decodes the first row into a tuple whose arity must match the column count.
    ///
    /// # Examples
    ///
    /// ```rust,no_run
    /// use sqlx::MySqlPool;
    /// use sqlx_osm::Osm;
    ///
    /// # async fn example() -> Result<(), Box<dyn std::error::Error>> {
    /// # let pool = MySqlPool::connect("mysql://localhost/test").await?;
    /// let row: Option<(i64, String)> = Osm::default()
    ///     .prepare("SELECT id, email FROM user WHERE id = #{id}", 1)?
    ///     .fetch_value(&pool)
    ///     .await?;
    /// # Ok(())
    /// # }
    /// ```
    pub async fn fetch_value<T, X>(&self, runner: X) -> crate::Result<Option<T>>
    where
        T: ValueTuple,
        X: QueryRunner,
    {
        let set = self.fetch_rows(runner, true).await?;
        decode::decode_value(set, &self.decode_context())
    }

    /// Decodes every row into parallel column vectors, e.g. `(Vec<i64>, Vec<String>)`.
    pub async fn fetch_values<T, X>(&self, runner: X) -> crate::Result<T::Columns>
    where
        T: ValueTuple,
        X: QueryRunner,
    {
        let set = self.fetch_rows(runner, false).await?;
        decode::decode_values::<T>(set, &self.decode_context())
    }

    /// The single column of the first row, or the zero value when there is no row.
    ///
    /// # Errors
    ///
    /// Fails with a `Shape` error when the query returns more than one column.
    pub async fn fetch_scalar<T, X>(&self, runner: X) -> crate::Result<T>
    where
        T: FromColumn,
        X: QueryRunner,
    {
        let set = self.fetch_rows(runner, true).await?;
        decode::decode_scalar(set, &self.decode_context())
    }

    /// The single column of every row.
    pub async fn fetch_scalars<T, X>(&self, runner: X) -> crate::Result<Vec<T>>
    where
        T: FromColumn,
        X: QueryRunner,
    {
        let set = self.fetch_rows(runner, false).await?;
        decode::decode_scalars(set, &self.decode_context())
    }

    /// Two-column rows as a map from the first column to the second.
    pub async fn fetch_kvs<K, V, X>(&self, runner: X) -> crate::Result<HashMap<K, V>>
    where
        K: FromColumn + Eq + Hash,
        V: FromColumn,
        X: QueryRunner,
    {
        let mut out = HashMap::new();
        self.fetch_kvs_into(runner, &mut out).await?;
        Ok(out)
    }

    /// Inserts two-column rows into `out`, overwriting existing keys.
    pub async fn fetch_kvs_into<K, V, X>(&self, runner: X, out: &mut HashMap<K, V>) -> crate::Result<usize>
    where
        K: FromColumn + Eq + Hash,
        V: FromColumn,
        X: QueryRunner,
    {
        let set = self.fetch_rows(runner, false).await?;
        decode::decode_kvs_into(set, &self.decode_context(), out)
    }

    /// Column names and every row as text.
    pub async fn fetch_strings<X>(&self, runner: X) -> crate::Result<(Vec<String>, Vec<Vec<String>>)>
    where
        X: QueryRunner,
    {
        let set = self.fetch_rows(runner, false).await?;
        Ok(decode::decode_strings(set))
    }

    pub async fn fetch_map<X>(&self, runner: X) -> crate::Result<Option<HashMap<String, ColumnValue>>>
    where
        X: QueryRunner,
    {
        let set = self.fetch_rows(runner, true).await?;
        Ok(decode::decode_map(set))
    }

    pub async fn fetch_maps<X>(&self, runner: X) -> crate::Result<Vec<HashMap<String, ColumnValue>>>
    where
        X: QueryRunner,
    {
        let set = self.fetch_rows(runner, false).await?;
        Ok(decode::decode_maps(set))
    }

    pub async fn fetch_array<X>(&self, runner: X) -> crate::Result<Option<Vec<ColumnValue>>>
    where
        X: QueryRunner,
    {
        let set = self.fetch_rows(runner, true).await?;
        Ok(decode::decode_array(set))
    }

    pub async fn fetch_arrays<X>(&self, runner: X) -> crate::Result<Vec<Vec<ColumnValue>>>
    where
        X: QueryRunner,
    {
        let set = self.fetch_rows(runner, false).await?;
        Ok(decode::decode_arrays(set))
    }
}
