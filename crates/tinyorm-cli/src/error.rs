use miette::Diagnostic;
use thiserror::Error;
use tinyorm::OrmError;
use tinyorm_config::ConfigError;

#[derive(Error, Diagnostic, Debug)]
pub enum CliError {
    #[error("Invalid argument `{0}`: expected `name=value`")]
    #[diagnostic(
        code(tinyorm_cli::invalid_assignment),
        help("Write filters and values as `column=value` or `column__op=value`")
    )]
    InvalidAssignment(String),

    #[error("Table `{0}` is not declared")]
    #[diagnostic(
        code(tinyorm_cli::unknown_table),
        help("Declare the table under [[tables]] in the configuration file")
    )]
    UnknownTable(String),

    #[error("JSON serialization error: {0}")]
    #[diagnostic(code(tinyorm_cli::json))]
    Json(#[from] serde_json::Error),

    #[error(transparent)]
    #[diagnostic(transparent)]
    Config(#[from] ConfigError),

    #[error(transparent)]
    #[diagnostic(transparent)]
    Orm(#[from] OrmError),
}

pub type CliResult<T> = std::result::Result<T, CliError>;
