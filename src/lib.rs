//! # sqlx-osm
//!
//! SQL templates with `#{name}` placeholders and shape-directed result mapping for SQLx.
//!
//! ## Features
//!
//! - **Named Placeholders**: Write `#{name}` in hand-written SQL; the engine emits `?` or `$1, $2, ...`
//! - **IN Expansion**: `WHERE id IN #{ids}` fans a list out into `(?,?,?)`
//! - **Flexible Parameters**: Bind a scalar, a positional list, a map, or a record
//! - **Result Shapes**: Decode rows into records, tuples, column vectors, two-column maps or text matrices
//! - **Name Matching**: `user_id` maps to a `UserID` field, `home_url` to `HomeURL`, with db tags taking priority
//! - **Generic Runner Support**: Works with `&MySqlPool`, `&mut MySqlConnection` and transactions
//! - **Configurable Conversion**: Strict by default, lenient zero-filling on request
//!
//! ## Quick Start
//!
//! Add to your `Cargo.toml`:
//!
//! ```toml
//! [dependencies]
//! sqlx = { version = "0.8", features = ["mysql", "runtime-tokio", "chrono"] }
//! sqlx-osm = "0.1"
//! ```
//!
//! ## Examples
//!
//! ### Records
//!
//! ```rust,no_run
//! use chrono::NaiveDateTime;
//! use sqlx::MySqlPool;
//! use sqlx_osm::{record, Osm, Params};
//!
//! #[derive(Debug, Default)]
//! struct User {
//!     id: i64,
//!     email: String,
//!     create_time: Option<NaiveDateTime>,
//! }
//!
//! record! {
//!     User {
//!         id: i64 => "ID",
//!         email: String => "Email",
//!         create_time: Option<NaiveDateTime> => "CreateTime",
//!     }
//! }
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let pool = MySqlPool::connect("mysql://localhost/test").await?;
//! let osm = Osm::default();
//!
//! let user = User { email: "john@example.com".into(), ..User::default() };
//! let (id, _) = osm
//!     .prepare("INSERT INTO user (email) VALUES (#{Email})", Params::record(&user))?
//!     .insert(&pool)
//!     .await?;
//!
//! let users: Vec<User> = osm
//!     .prepare("SELECT id, email, create_time FROM user WHERE id IN #{ids}", Params::list([id, 1, 2]))?
//!     .fetch_structs(&pool)
//!     .await?;
//! for user in users {
//!     println!("{}: {}", user.id, user.email);
//! }
//! # Ok(())
//! # }
//! ```
//!
//! ### Values and Maps
//!
//! ```rust,no_run
//! use std::collections::HashMap;
//! use sqlx::MySqlPool;
//! use sqlx_osm::{params, Osm, Param, Params};
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! # let pool = MySqlPool::connect("mysql://localhost/test").await?;
//! let osm = Osm::default();
//!
//! let count: i64 = osm
//!     .prepare("SELECT COUNT(*) FROM user WHERE email LIKE #{pattern}", "%@example.com")?
//!     .fetch_scalar(&pool)
//!     .await?;
//!
//! let (ids, emails) = osm
//!     .prepare("SELECT id, email FROM user WHERE id IN #{ids} AND id > #{min}", params![Param::list([1, 2, 3]), 0])?
//!     .fetch_values::<(i64, String), _>(&pool)
//!     .await?;
//!
//! let emails_by_id: HashMap<i64, String> = osm
//!     .prepare("SELECT id, email FROM user", Params::None)?
//!     .fetch_kvs(&pool)
//!     .await?;
//! # Ok(())
//! # }
//! ```
//!
//! ### Using with Transactions
//!
//! ```rust,no_run
//! use sqlx::{MySql, MySqlPool, Transaction};
//! use sqlx_osm::{params, Osm};
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! # let pool = MySqlPool::connect("mysql://localhost/test").await?;
//! let osm = Osm::default();
//! let mut tx: Transaction<MySql> = pool.begin().await?;
//!
//! osm.prepare("UPDATE account SET balance = balance - #{amount} WHERE id = #{id}", params![100, 1])?
//!     .update(&mut *tx)
//!     .await?;
//! osm.prepare("UPDATE account SET balance = balance + #{amount} WHERE id = #{id}", params![100, 2])?
//!     .update(&mut *tx)
//!     .await?;
//!
//! tx.commit().await?;
//! # Ok(())
//! # }
//! ```
//!
//! ## How It Works
//!
//! 1. **Substitute**: `[Token]` table markers are replaced from [`Options::table_names`]
//! 2. **Parse**: The template is split into text and `#{name}` fragments; a placeholder right after `IN` is marked for list expansion
//! 3. **Bind**: The parameter is resolved per placeholder, by position, map key or record field
//! 4. **Assemble**: Fragments become dialect SQL and a parameter list with exactly one entry per marker
//! 5. **Decode**: Rows are fetched through a [`QueryRunner`] and converted into the requested shape
//!
//! ## Limitations
//!
//! - `IN` detection is a suffix check: any text ending in `in` right before a placeholder counts,
//!   so `WHERE twin #{x}` is treated as an `IN` list
//! - Records are registered with [`record!`]; there is no derive macro
//! - The bundled runners target MySQL
//!
//! ## License
//!
//! Licensed under either of Apache License, Version 2.0 or MIT license at your option.

pub mod binder;
pub mod builder;
pub mod convert;
pub mod data;
pub mod decode;
pub mod dialect;
pub mod error;
pub mod names;
mod observe;
pub mod options;
pub mod osm;
pub mod params;
pub mod query;
pub mod query_as;
pub mod record;
pub mod runner;
pub mod template;
pub mod value;

pub use convert::{ConversionMode, FromColumn};
pub use data::ColumnValue;
pub use decode::ResultShape;
pub use dialect::DialectMode;
pub use error::{BindingError, Error, Result};
pub use options::Options;
pub use osm::Osm;
pub use params::{Param, Params, ToParam, ToParams};
pub use query::PreparedQuery;
pub use record::{FieldDescriptor, Record, Slot};
pub use runner::{ExecOutcome, QueryRunner, RowSet};
pub use template::Template;
pub use value::Value;

/// Convenience re-exports for common use cases
pub mod prelude {
    pub use crate::error::{Error, Result};
    pub use crate::{params, record};
    pub use crate::{ColumnValue, Osm, Options, Param, Params, PreparedQuery, Value};
}
