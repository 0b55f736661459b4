use crate::convert::ConversionError;
use crate::decode::ResultShape;

/// Error types for sqlx-osm
///
/// Every variant except [`Error::Pattern`] carries the original SQL template,
/// so a misconfigured mapping can be traced back to the statement that caused it.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// Unterminated placeholder; `marked` is the template with the failure position flagged
    #[error("Failed to parse SQL template: {marked}")]
    Parse { marked: String },

    /// Internal placeholder pattern could not be compiled
    #[error("Invalid placeholder pattern: {0}")]
    Pattern(#[from] regex::Error),

    /// Parameters could not be bound to the template's placeholders
    #[error("sql '{sql}' error: {kind}")]
    Binding { sql: String, kind: BindingError },

    /// The requested result shape does not fit the result set
    #[error("sql '{sql}' error: {shape} result {reason}")]
    Shape {
        sql: String,
        shape: ResultShape,
        reason: String,
    },

    /// A scanned value could not be stored into its destination type
    #[error("sql '{sql}' error: column '{column}': {source}")]
    Conversion {
        sql: String,
        column: String,
        #[source]
        source: ConversionError,
    },

    /// Error from SQLx database operations
    #[error("Database error for sql '{sql}': {source}")]
    Database {
        sql: String,
        #[source]
        source: sqlx::Error,
    },
}

/// Why a parameter value could not be bound to a placeholder.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum BindingError {
    /// Map parameter has no entry for the placeholder name
    #[error("Key '{0}' does not exist")]
    MissingKey(String),

    /// Record parameter has no field with the placeholder name
    #[error("Field '{0}' does not exist")]
    MissingField(String),

    /// Placeholder names a record field that does not start with an upper-case letter
    #[error("Field '{0}' is unexported")]
    UnexportedField(String),

    /// Placeholder was referenced but no value was bound to it
    #[error("Placeholder '{0}' was not bound")]
    UnboundPlaceholder(String),

    /// A list was bound to a placeholder that does not follow `IN`
    #[error("Placeholder '{0}' does not follow IN but was bound to a list")]
    ListOutsideIn(String),
}

impl Error {
    pub(crate) fn binding(sql: &str, kind: BindingError) -> Self {
        Error::Binding {
            sql: sql.to_owned(),
            kind,
        }
    }

    pub(crate) fn shape(sql: &str, shape: ResultShape, reason: impl Into<String>) -> Self {
        Error::Shape {
            sql: sql.to_owned(),
            shape,
            reason: reason.into(),
        }
    }
}

/// Result type alias for sqlx-osm operations
pub type Result<T> = std::result::Result<T, Error>;
