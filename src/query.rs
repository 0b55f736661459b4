use std::future::Future;
use std::panic::Location;
use std::sync::Arc;
use std::time::Instant;

use crate::builder::BuiltQuery;
use crate::decode::DecodeContext;
use crate::dialect::DialectMode;
use crate::error::Error;
use crate::observe;
use crate::options::Options;
use crate::runner::{ExecOutcome, QueryRunner, RowSet};
use crate::value::Value;

/// A statement ready to run: final SQL plus its positional parameters.
///
/// Created by [`Osm::prepare`](crate::Osm::prepare). The statement owns
/// everything it needs, so it can be executed any number of times against
/// any [`QueryRunner`]: `&MySqlPool`, `&mut MySqlConnection` or a transaction.
///
/// Data-modifying operations live here; the typed fetch operations, one per
/// result shape, are in [`query_as`](crate::query_as).
///
/// # Examples
///
/// ```rust,no_run
/// use sqlx::MySqlPool;
/// use sqlx_osm::{params, Osm};
///
/// # async fn example() -> Result<(), Box<dyn std::error::Error>> {
/// # let pool = MySqlPool::connect("mysql://localhost/test").await?;
/// let osm = Osm::default();
///
/// let (id, _) = osm
///     .prepare("INSERT INTO users (name, email) VALUES (#{name}, #{email})", params!["John", "john@example.com"])?
///     .insert(&pool)
///     .await?;
///
/// let deleted = osm
///     .prepare("DELETE FROM users WHERE id = #{id}", id)?
///     .delete(&pool)
///     .await?;
/// println!("Deleted {deleted} rows");
/// # Ok(())
/// # }
/// ```
///
/// # Using with Transactions
///
/// ```rust,no_run
/// use sqlx::{MySql, MySqlPool, Transaction};
/// use sqlx_osm::{Osm, Params};
///
/// # async fn example() -> Result<(), Box<dyn std::error::Error>> {
/// # let pool = MySqlPool::connect("mysql://localhost/test").await?;
/// let osm = Osm::default();
/// let mut tx: Transaction<MySql> = pool.begin().await?;
///
/// osm.prepare(
///     "UPDATE users SET name = #{name} WHERE id IN #{ids}",
///     Params::map([("name", sqlx_osm::Param::from("Jane")), ("ids", sqlx_osm::Param::list([1, 2, 3]))]),
/// )?
/// .update(&mut *tx)
/// .await?;
///
/// tx.commit().await?;
/// # Ok(())
/// # }
/// ```
#[derive(Debug, Clone)]
pub struct PreparedQuery {
    template: String,
    sql: String,
    params: Vec<Value>,
    options: Arc<Options>,
    caller: &'static Location<'static>,
}

impl PreparedQuery {
    pub(crate) fn new(
        template: String,
        built: BuiltQuery,
        options: Arc<Options>,
        caller: &'static Location<'static>,
    ) -> Self {
        Self {
            template,
            sql: built.sql,
            params: built.params,
            options,
            caller,
        }
    }

    /// The template this statement was prepared from, after table substitution.
    pub fn template(&self) -> &str {
        &self.template
    }

    /// The assembled SQL with dialect markers.
    pub fn sql(&self) -> &str {
        &self.sql
    }

    /// Parameters in marker order.
    pub fn params(&self) -> &[Value] {
        &self.params
    }

    /// Where the statement was prepared.
    pub fn caller(&self) -> &'static Location<'static> {
        self.caller
    }

    /// Executes the statement.
    ///
    /// # Arguments
    ///
    /// * `runner` - Any [`QueryRunner`] (pool, connection, transaction)
    ///
    /// # Errors
    ///
    /// Returns [`Error::Database`] carrying the template if the database call fails.
    pub async fn execute<X: QueryRunner>(&self, mut runner: X) -> crate::Result<ExecOutcome> {
        self.timed(runner.execute(&self.sql, &self.params)).await
    }

    /// Executes an `INSERT`, returning `(last_insert_id, rows_affected)`.
    ///
    /// The insert id is reported by positional-marker (MySQL) databases only; it is 0 otherwise.
    pub async fn insert<X: QueryRunner>(&self, runner: X) -> crate::Result<(u64, u64)> {
        let outcome = self.execute(runner).await?;
        let last_insert_id = match self.options.dialect {
            DialectMode::PositionalMarker => outcome.last_insert_id,
            DialectMode::NumberedMarker => 0,
        };
        Ok((last_insert_id, outcome.rows_affected))
    }

    /// Executes an `UPDATE`, returning the number of affected rows.
    pub async fn update<X: QueryRunner>(&self, runner: X) -> crate::Result<u64> {
        Ok(self.execute(runner).await?.rows_affected)
    }

    /// Executes a `DELETE`, returning the number of affected rows.
    pub async fn delete<X: QueryRunner>(&self, runner: X) -> crate::Result<u64> {
        Ok(self.execute(runner).await?.rows_affected)
    }

    pub(crate) async fn fetch_rows<X: QueryRunner>(&self, mut runner: X, one: bool) -> crate::Result<RowSet> {
        if one {
            self.timed(runner.fetch_optional(&self.sql, &self.params)).await
        } else {
            self.timed(runner.fetch_all(&self.sql, &self.params)).await
        }
    }

    pub(crate) fn decode_context(&self) -> DecodeContext<'_> {
        DecodeContext::new(&self.template, self.options.conversion)
    }

    async fn timed<T, F>(&self, call: F) -> crate::Result<T>
    where
        F: Future<Output = Result<T, sqlx::Error>>,
    {
        let started = Instant::now();
        let result = call.await;
        observe::finished(&self.options, self.caller, &self.template, started.elapsed());
        result.map_err(|source| Error::Database {
            sql: self.template.clone(),
            source,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::runner::mock::MockRunner;
    use crate::{params, Osm, Param, Params};

    #[tokio::test]
    async fn test_execute_sends_assembled_sql() {
        let query = Osm::default()
            .prepare(
                "UPDATE users SET name = #{name} WHERE id IN #{ids}",
                Params::map([
                    ("name", crate::Param::from("Jane")),
                    ("ids", crate::Param::list([1, 2])),
                ]),
            )
            .unwrap();
        let mut runner = MockRunner::affecting(2, 0);
        let affected = query.update(&mut runner).await.unwrap();
        assert_eq!(affected, 2);
        assert_eq!(
            runner.calls,
            vec![(
                "UPDATE users SET name = ? WHERE id IN (?,?)".to_owned(),
                vec![Value::Text("Jane".into()), Value::Int(1), Value::Int(2)]
            )]
        );
    }

    #[tokio::test]
    async fn test_insert_returns_last_insert_id() {
        let query = Osm::default()
            .prepare("INSERT INTO users (name) VALUES (#{name})", "Ann")
            .unwrap();
        let mut runner = MockRunner::affecting(1, 42);
        assert_eq!(query.insert(&mut runner).await.unwrap(), (42, 1));
    }

    #[tokio::test]
    async fn test_insert_without_insert_id_support() {
        let osm = Osm::new(Options::default().with_dialect(DialectMode::NumberedMarker));
        let query = osm
            .prepare("INSERT INTO users (name) VALUES (#{name})", "Ann")
            .unwrap();
        let mut runner = MockRunner::affecting(1, 42);
        assert_eq!(query.insert(&mut runner).await.unwrap(), (0, 1));
    }

    #[tokio::test]
    async fn test_numbered_markers_reach_custom_runner() {
        let osm = Osm::new(Options::default().with_dialect(DialectMode::NumberedMarker));
        let query = osm
            .prepare("UPDATE users SET name = #{name} WHERE id IN #{ids}", params!["Ann", Param::list([3, 4])])
            .unwrap();
        let mut runner = MockRunner::affecting(2, 0);
        assert_eq!(query.update(&mut runner).await.unwrap(), 2);
        assert_eq!(runner.calls[0].0, "UPDATE users SET name = $1 WHERE id IN ($2,$3)");
        assert_eq!(
            runner.calls[0].1,
            vec![Value::Text("Ann".into()), Value::Int(3), Value::Int(4)]
        );
    }

    #[tokio::test]
    async fn test_driver_error_carries_template() {
        let sql = "DELETE FROM users WHERE id = #{id}";
        let query = Osm::default().prepare(sql, 7).unwrap();
        let mut runner = MockRunner::failing();
        let err = query.delete(&mut runner).await.unwrap_err();
        match err {
            Error::Database { sql: s, source } => {
                assert_eq!(s, sql);
                assert!(matches!(source, sqlx::Error::Protocol(_)));
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_prepared_query_is_reusable() {
        let query = Osm::default()
            .prepare("DELETE FROM sessions WHERE user_id = #{id}", 3)
            .unwrap();
        let mut runner = MockRunner::affecting(1, 0);
        query.delete(&mut runner).await.unwrap();
        query.delete(&mut runner).await.unwrap();
        assert_eq!(runner.calls.len(), 2);
    }
}
