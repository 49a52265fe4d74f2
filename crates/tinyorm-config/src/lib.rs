//! Configuration for tinyorm: connection options and declarative tables.

pub mod config;
pub mod declaration;
pub mod error;

#[cfg(test)]
pub mod test_utils;

pub use config::{config_path, Config};
pub use declaration::{FieldDeclaration, FieldType, TableDeclaration};
pub use error::{ConfigError, Result};
