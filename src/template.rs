//! SQL template parsing.
//!
//! A template is raw SQL containing `#{name}` placeholders. Parsing splits it
//! into literal text and placeholder fragments once; the resulting
//! [`Template`] is immutable and can be bound any number of times, from any
//! number of threads.

use std::borrow::Cow;
use std::collections::HashMap;

use regex::{Captures, Regex};

use crate::error::Error;

const PLACEHOLDER_PATTERN: &str = r"#\{([^}]*)\}";
const TABLE_TOKEN_PATTERN: &str = r"\[([A-Za-z0-9_]+)\]";
const ERROR_MARK: &str = "[****ERROR****]->";

/// A named hole in a template.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Placeholder {
    /// Name between the braces, whitespace-trimmed
    pub name: String,
    /// Whether the preceding SQL ends with `IN`, so the bound value fans out into `(?,?,...)`
    pub in_context: bool,
}

/// One piece of a parsed template.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Fragment {
    Text(String),
    Placeholder(Placeholder),
}

/// A parsed SQL template.
///
/// # Examples
///
/// ```
/// use sqlx_osm::template::Template;
///
/// let template = Template::parse("SELECT * FROM t WHERE id IN #{ids} AND name = #{name}")?;
/// let names: Vec<_> = template.placeholders().map(|p| (p.name.as_str(), p.in_context)).collect();
/// assert_eq!(names, vec![("ids", true), ("name", false)]);
/// # Ok::<(), sqlx_osm::Error>(())
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Template {
    source: String,
    fragments: Vec<Fragment>,
}

impl Template {
    /// Parses `sql` into fragments.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Parse`] when a `#{` has no closing `}`. The error text is
    /// the template with `[****ERROR****]->` inserted right after the offending `#{`.
    pub fn parse<T>(sql: T) -> crate::Result<Self>
    where
        T: Into<String>,
    {
        let source = sql.into();
        let regex = Regex::new(PLACEHOLDER_PATTERN)?;

        let mut fragments = Vec::new();
        let mut cursor = 0;
        for caps in regex.captures_iter(&source) {
            let (Some(whole), Some(name)) = (caps.get(0), caps.get(1)) else {
                continue;
            };
            let text = &source[cursor..whole.start()];
            let in_context = is_in_context(text);
            fragments.push(Fragment::Text(text.to_owned()));
            fragments.push(Fragment::Placeholder(Placeholder {
                name: name.as_str().trim().to_owned(),
                in_context,
            }));
            cursor = whole.end();
        }

        let tail = &source[cursor..];
        if let Some(open) = tail.find("#{") {
            return Err(Error::Parse {
                marked: mark_error(&source, cursor + open + 2),
            });
        }
        fragments.push(Fragment::Text(tail.to_owned()));

        Ok(Self { source, fragments })
    }

    /// The template text as it was parsed.
    pub fn source(&self) -> &str {
        &self.source
    }

    pub fn fragments(&self) -> &[Fragment] {
        &self.fragments
    }

    /// Placeholders in discovery order.
    pub fn placeholders(&self) -> impl Iterator<Item = &Placeholder> {
        self.fragments.iter().filter_map(|fragment| match fragment {
            Fragment::Placeholder(p) => Some(p),
            Fragment::Text(_) => None,
        })
    }
}

/// Whether a placeholder preceded by `text` is an `IN (...)` placeholder.
///
/// This is a suffix check on the right-trimmed text, not a keyword check:
/// `WHERE twin #{x}` is also classified as `IN`.
pub fn is_in_context(text: &str) -> bool {
    let trimmed = text.trim_end().as_bytes();
    trimmed.len() >= 2 && trimmed[trimmed.len() - 2..].eq_ignore_ascii_case(b"in")
}

/// Replaces `[Token]` markers with entries of `tables`.
///
/// Unknown tokens are left untouched. This runs before placeholder scanning.
///
/// ```
/// use std::collections::HashMap;
/// use sqlx_osm::template::substitute_tables;
///
/// let tables = HashMap::from([("TablePrefix".to_owned(), "app_".to_owned())]);
/// let sql = substitute_tables("SELECT * FROM [TablePrefix]user WHERE id = #{id}", &tables)?;
/// assert_eq!(sql, "SELECT * FROM app_user WHERE id = #{id}");
/// # Ok::<(), sqlx_osm::Error>(())
/// ```
pub fn substitute_tables<'a>(
    sql: &'a str,
    tables: &HashMap<String, String>,
) -> crate::Result<Cow<'a, str>> {
    if tables.is_empty() {
        return Ok(Cow::Borrowed(sql));
    }
    let regex = Regex::new(TABLE_TOKEN_PATTERN)?;
    Ok(regex.replace_all(sql, |caps: &Captures<'_>| match tables.get(&caps[1]) {
        Some(name) => name.clone(),
        None => caps[0].to_owned(),
    }))
}

fn mark_error(sql: &str, index: usize) -> String {
    let (head, tail) = sql.split_at(index);
    [head, ERROR_MARK, tail].concat()
}
