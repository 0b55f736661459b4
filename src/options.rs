use std::collections::HashMap;
use std::time::Duration;

use sqlx::mysql::MySqlPoolOptions;

use crate::convert::ConversionMode;
use crate::dialect::DialectMode;

/// Engine configuration, fixed once an [`Osm`](crate::Osm) is built from it.
///
/// # Examples
///
/// ```
/// use std::time::Duration;
/// use sqlx_osm::{ConversionMode, Options};
///
/// let options = Options::default()
///     .with_show_sql(true)
///     .with_slow_log_duration(Duration::from_millis(200))
///     .with_conversion(ConversionMode::Lenient)
///     .with_table_name("TablePrefix", "app_");
///
/// assert_eq!(options.table_names["TablePrefix"], "app_");
/// ```
#[derive(Debug, Clone)]
pub struct Options {
    /// Marker style of the assembled SQL. The bundled runners are MySQL, so
    /// [`DialectMode::NumberedMarker`] needs a caller-supplied
    /// [`QueryRunner`](crate::QueryRunner) for a `$n` database.
    pub dialect: DialectMode,
    pub conversion: ConversionMode,
    /// Log every prepared statement at `info` level
    pub show_sql: bool,
    /// Statements slower than this are logged at `warn` level
    pub slow_log_duration: Duration,
    /// Replacements for `[Token]` markers in templates
    pub table_names: HashMap<String, String>,
    pub max_open_conns: Option<u32>,
    pub max_idle_conns: Option<u32>,
    pub conn_max_lifetime: Option<Duration>,
    pub conn_max_idle_time: Option<Duration>,
}

impl Default for Options {
    fn default() -> Self {
        Self {
            dialect: DialectMode::default(),
            conversion: ConversionMode::default(),
            show_sql: false,
            slow_log_duration: Duration::from_secs(1),
            table_names: HashMap::new(),
            max_open_conns: None,
            max_idle_conns: None,
            conn_max_lifetime: None,
            conn_max_idle_time: None,
        }
    }
}

impl Options {
    /// See [`Options::dialect`].
    pub fn with_dialect(mut self, dialect: DialectMode) -> Self {
        self.dialect = dialect;
        self
    }

    pub fn with_conversion(mut self, conversion: ConversionMode) -> Self {
        self.conversion = conversion;
        self
    }

    pub fn with_show_sql(mut self, show_sql: bool) -> Self {
        self.show_sql = show_sql;
        self
    }

    pub fn with_slow_log_duration(mut self, duration: Duration) -> Self {
        self.slow_log_duration = duration;
        self
    }

    pub fn with_table_name(mut self, token: impl Into<String>, name: impl Into<String>) -> Self {
        self.table_names.insert(token.into(), name.into());
        self
    }

    pub fn with_max_open_conns(mut self, n: u32) -> Self {
        self.max_open_conns = Some(n);
        self
    }

    pub fn with_max_idle_conns(mut self, n: u32) -> Self {
        self.max_idle_conns = Some(n);
        self
    }

    pub fn with_conn_max_lifetime(mut self, lifetime: Duration) -> Self {
        self.conn_max_lifetime = Some(lifetime);
        self
    }

    pub fn with_conn_max_idle_time(mut self, idle: Duration) -> Self {
        self.conn_max_idle_time = Some(idle);
        self
    }

    /// Pool settings derived from the connection limits.
    ///
    /// SQLx has no cap on idle connections, so `max_idle_conns` becomes the
    /// number of connections the pool keeps open, bounded by `max_open_conns`.
    pub fn pool_options(&self) -> MySqlPoolOptions {
        let mut pool = MySqlPoolOptions::new();
        if let Some(n) = self.max_open_conns {
            pool = pool.max_connections(n);
        }
        if let Some(n) = self.max_idle_conns {
            let n = self.max_open_conns.map_or(n, |open| n.min(open));
            pool = pool.min_connections(n);
        }
        if let Some(lifetime) = self.conn_max_lifetime {
            pool = pool.max_lifetime(lifetime);
        }
        if let Some(idle) = self.conn_max_idle_time {
            pool = pool.idle_timeout(idle);
        }
        pool
    }
}
