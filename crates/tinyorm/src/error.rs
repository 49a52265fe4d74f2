//! Error types for tinyorm.

use miette::Diagnostic;
use thiserror::Error;

/// Error type for every tinyorm operation.
#[derive(Error, Diagnostic, Debug)]
pub enum OrmError {
    #[error("Field name is not set; assign it before requesting the schema")]
    #[diagnostic(
        code(tinyorm::missing_field_name),
        help("Declare the field through a table builder so it receives its column name")
    )]
    MissingFieldName,

    #[error("Field `{field}` is declared more than once on table `{table}`")]
    #[diagnostic(
        code(tinyorm::duplicate_field),
        help("Every column of a table needs a distinct name")
    )]
    DuplicateField { table: String, field: String },

    #[error("Table `{0}` declares more than one primary key")]
    #[diagnostic(
        code(tinyorm::duplicate_primary_key),
        help("Mark exactly one field with `.primary_key()`, or none to get an `id` column")
    )]
    DuplicatePrimaryKey(String),

    #[error("Table `{0}` declares a field named `id` but no primary key")]
    #[diagnostic(
        code(tinyorm::reserved_field_name),
        help("Mark the `id` field with `.primary_key()` or rename it")
    )]
    ReservedFieldName(String),

    #[error("Table `{table}` has no field named `{field}`")]
    #[diagnostic(
        code(tinyorm::unknown_field),
        help("Check the column name against the table declaration")
    )]
    UnknownField { table: String, field: String },

    #[error("Unknown lookup `{suffix}` in `{descriptor}`")]
    #[diagnostic(
        code(tinyorm::unknown_lookup),
        help("Supported lookups: lt, le, gt, ge, ne, in, contains, icontains")
    )]
    UnknownLookup { descriptor: String, suffix: String },

    #[error("Invalid value for field `{field}`: {message}")]
    #[diagnostic(code(tinyorm::validation))]
    Validation { field: String, message: String },

    #[error("Field `{field}` holds {found}, not {expected}")]
    #[diagnostic(code(tinyorm::type_mismatch))]
    TypeMismatch {
        field: String,
        expected: &'static str,
        found: String,
    },

    #[error("Failed to decode column `{column}`: {message}")]
    #[diagnostic(
        code(tinyorm::decode),
        help("The stored value does not match the declared field type")
    )]
    Decode { column: String, message: String },

    #[error("Database statement failed: {0}")]
    #[diagnostic(
        code(tinyorm::engine),
        help("Check the generated SQL and that the table exists")
    )]
    Engine(#[from] rusqlite::Error),

    #[error("Database connection lock poisoned")]
    #[diagnostic(
        code(tinyorm::poison),
        help("A previous statement panicked while holding the connection")
    )]
    PoisonError,
}

impl OrmError {
    pub(crate) fn validation(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Validation {
            field: field.into(),
            message: message.into(),
        }
    }

    /// Whether the error comes from the engine rather than from tinyorm itself.
    pub fn is_engine(&self) -> bool {
        matches!(self, Self::Engine(_) | Self::PoisonError)
    }
}

/// Result type alias for tinyorm operations.
pub type Result<T> = std::result::Result<T, OrmError>;
