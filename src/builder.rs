use crate::binder::BoundValue;
use crate::dialect::DialectMode;
use crate::error::{BindingError, Error};
use crate::template::{Fragment, Template};
use crate::value::Value;

/// Final SQL text and the parameters for its markers, in marker order.
#[derive(Debug, Clone, PartialEq)]
pub struct BuiltQuery {
    pub sql: String,
    pub params: Vec<Value>,
}

/// Converts a bound template into dialect SQL with positional markers.
///
/// Literal text is copied verbatim. A plain placeholder becomes one marker;
/// an `IN` placeholder becomes `(m,m,...)` with one marker per list element.
/// The SQL always contains exactly as many markers as `params` has entries.
///
/// This function is used internally by [`Osm::prepare`](crate::Osm::prepare).
///
/// # Examples
///
/// ```
/// use sqlx_osm::{binder::bind, builder::build_query, template::Template};
/// use sqlx_osm::{params, DialectMode, Param};
///
/// let template = Template::parse("SELECT * FROM t WHERE id IN #{ids} AND name=#{name}")?;
/// let bound = bind(&template, &params![Param::list([1, 2, 3]), "John"])?;
///
/// let built = build_query(&template, &bound, DialectMode::NumberedMarker)?;
/// assert_eq!(built.sql, "SELECT * FROM t WHERE id IN ($1,$2,$3) AND name=$4");
/// assert_eq!(built.params.len(), 4);
/// # Ok::<(), sqlx_osm::Error>(())
/// ```
///
/// # Errors
///
/// Returns [`BindingError::UnboundPlaceholder`] when a placeholder received no value.
pub fn build_query(
    template: &Template,
    bound: &[Option<BoundValue>],
    dialect: DialectMode,
) -> crate::Result<BuiltQuery> {
    let mut sql = String::with_capacity(template.source().len());
    let mut params = Vec::with_capacity(bound.len());
    let mut markers = dialect.markers();
    let mut bound = bound.iter();

    for fragment in template.fragments() {
        let placeholder = match fragment {
            Fragment::Text(text) => {
                sql.push_str(text);
                continue;
            }
            Fragment::Placeholder(p) => p,
        };

        let unbound = || {
            Error::binding(
                template.source(),
                BindingError::UnboundPlaceholder(placeholder.name.clone()),
            )
        };
        match bound.next().and_then(Option::as_ref).ok_or_else(unbound)? {
            BoundValue::Single(value) => {
                markers.write(&mut sql);
                params.push(value.clone());
            }
            BoundValue::List(values) => {
                sql.push('(');
                for (i, value) in values.iter().enumerate() {
                    if i > 0 {
                        sql.push(',');
                    }
                    markers.write(&mut sql);
                    params.push(value.clone());
                }
                sql.push(')');
            }
        }
    }

    Ok(BuiltQuery { sql, params })
}
