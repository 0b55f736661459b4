use std::panic::Location;
use std::sync::Arc;

use crate::binder::bind;
use crate::builder::build_query;
use crate::observe;
use crate::options::Options;
use crate::params::Params;
use crate::query::PreparedQuery;
use crate::template::{substitute_tables, Template};

/// The query engine: turns `#{name}` templates and parameters into prepared statements.
///
/// `Osm` holds only read-only configuration and is cheap to clone, so one
/// instance can be shared by every task of an application.
///
/// # Examples
///
/// ```
/// use sqlx_osm::{params, Osm, Options, Param};
///
/// let osm = Osm::new(Options::default().with_table_name("Prefix", "app_"));
/// let query = osm.prepare(
///     "SELECT * FROM [Prefix]user WHERE id IN #{ids} AND name = #{name}",
///     params![Param::list([1, 2, 3]), "John"],
/// )?;
///
/// assert_eq!(query.sql(), "SELECT * FROM app_user WHERE id IN (?,?,?) AND name = ?");
/// assert_eq!(query.params().len(), 4);
/// # Ok::<(), sqlx_osm::Error>(())
/// ```
#[derive(Debug, Clone, Default)]
pub struct Osm {
    options: Arc<Options>,
}

impl Osm {
    pub fn new(options: Options) -> Self {
        Self {
            options: Arc::new(options),
        }
    }

    pub fn options(&self) -> &Options {
        &self.options
    }

    /// Parses a template once for repeated use with [`prepare_template`](Self::prepare_template).
    ///
    /// Table tokens are substituted before parsing.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Parse`](crate::Error::Parse) for an unterminated placeholder.
    pub fn compile(&self, sql: &str) -> crate::Result<Template> {
        let sql = substitute_tables(sql, &self.options.table_names)?;
        Template::parse(sql)
    }

    /// Parses `sql`, binds `params` and assembles the final statement.
    ///
    /// # Arguments
    ///
    /// * `sql` - SQL template with `#{name}` placeholders
    /// * `params` - A scalar, [`Params`] value or [`params!`](crate::params!) list
    ///
    /// # Errors
    ///
    /// Returns [`Error::Parse`](crate::Error::Parse) or [`Error::Binding`](crate::Error::Binding)
    /// before anything is sent to the database.
    #[track_caller]
    pub fn prepare<'p>(&self, sql: &str, params: impl Into<Params<'p>>) -> crate::Result<PreparedQuery> {
        let caller = Location::caller();
        let template = self.compile(sql)?;
        self.assemble(&template, params.into(), caller)
    }

    /// Binds an already compiled template.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Binding`](crate::Error::Binding) when `params` do not fit the placeholders.
    #[track_caller]
    pub fn prepare_template<'p>(
        &self,
        template: &Template,
        params: impl Into<Params<'p>>,
    ) -> crate::Result<PreparedQuery> {
        let caller = Location::caller();
        self.assemble(template, params.into(), caller)
    }

    fn assemble(
        &self,
        template: &Template,
        params: Params<'_>,
        caller: &'static Location<'static>,
    ) -> crate::Result<PreparedQuery> {
        let bound = bind(template, &params)?;
        let built = build_query(template, &bound, self.options.dialect)?;
        observe::show_sql(
            &self.options,
            caller,
            template.source(),
            &built.sql,
            &built.params,
        );
        Ok(PreparedQuery::new(
            template.source().to_owned(),
            built,
            Arc::clone(&self.options),
            caller,
        ))
    }
}
