use miette::Diagnostic;
use thiserror::Error;
use tinyorm::OrmError;

#[derive(Error, Diagnostic, Debug)]
pub enum ConfigError {
    #[error("TOML deserialization error: {0}")]
    #[diagnostic(
        code(tinyorm_config::toml_deserialize),
        help("Check your tinyorm.toml syntax and structure")
    )]
    TomlDeError(#[from] toml::de::Error),

    #[error("IO error: {0}")]
    #[diagnostic(code(tinyorm_config::io))]
    IoError(#[from] std::io::Error),

    #[error("Duplicate table name: {0}")]
    #[diagnostic(
        code(tinyorm_config::duplicate_table),
        help("Each table must have a unique name")
    )]
    DuplicateTable(String),

    #[error("Field `{table}.{field}` is a varchar without max_length")]
    #[diagnostic(
        code(tinyorm_config::missing_max_length),
        help("Add `max_length = <n>` to the field, or use `type = \"text\"`")
    )]
    MissingMaxLength { table: String, field: String },

    #[error("Field `{table}.{field}` is a foreign key without references")]
    #[diagnostic(
        code(tinyorm_config::missing_reference),
        help("Add `references = \"<table>\"` to the field")
    )]
    MissingReference { table: String, field: String },

    #[error("Field `{table}.{field}` references unknown table `{references}`")]
    #[diagnostic(
        code(tinyorm_config::unresolved_reference),
        help("Referenced tables must be declared earlier in the file")
    )]
    UnresolvedReference {
        table: String,
        field: String,
        references: String,
    },

    #[error("Field `{table}.{field}` has an unsupported default of type {kind}")]
    #[diagnostic(
        code(tinyorm_config::unsupported_default),
        help("Defaults must be a string, integer, float, boolean, or date")
    )]
    UnsupportedDefault {
        table: String,
        field: String,
        kind: String,
    },

    #[error(transparent)]
    #[diagnostic(transparent)]
    Orm(#[from] OrmError),
}

pub type Result<T> = std::result::Result<T, ConfigError>;
