use std::{
    collections::HashSet,
    fs,
    path::{Path, PathBuf},
};

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use tinyorm::{Database, DatabaseConfig, Table};
use tracing::{debug, info};

use crate::{
    declaration::{FieldType, TableDeclaration},
    error::{ConfigError, Result},
};

pub const CONFIG_ENV: &str = "TINYORM_CONFIG";
pub const DEFAULT_CONFIG_FILE: &str = "tinyorm.toml";

/// Application's configuration
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct Config {
    /// Connection options.
    #[serde(default)]
    pub database: DatabaseConfig,

    /// Tables registered by [`Config::declare`], in file order.
    #[serde(default)]
    pub tables: Vec<TableDeclaration>,
}

/// Picks the configuration file: `explicit`, then `$TINYORM_CONFIG`, then
/// `./tinyorm.toml`.
pub fn config_path(explicit: Option<&Path>) -> PathBuf {
    if let Some(path) = explicit {
        return path.to_path_buf();
    }
    match std::env::var(CONFIG_ENV) {
        Ok(path) if !path.is_empty() => PathBuf::from(path),
        _ => PathBuf::from(DEFAULT_CONFIG_FILE),
    }
}

impl Config {
    /// Loads and checks the configuration file.
    ///
    /// A missing file yields the default configuration: an in-memory
    /// database with no tables.
    pub fn load(explicit: Option<&Path>) -> Result<Self> {
        let path = config_path(explicit);

        let config = match fs::read_to_string(&path) {
            Ok(content) => {
                debug!("loading configuration from {}", path.display());
                Self::from_toml(&content)?
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound && explicit.is_none() => {
                debug!("{} not found, using defaults", path.display());
                Self::default()
            }
            Err(err) => return Err(ConfigError::IoError(err)),
        };

        Ok(config)
    }

    pub fn from_toml(content: &str) -> Result<Self> {
        let config: Self = toml::from_str(content)?;
        config.resolve()?;
        Ok(config)
    }

    /// Checks declarations that can be rejected without a database.
    pub fn resolve(&self) -> Result<()> {
        let mut seen = HashSet::new();

        for table in &self.tables {
            let name = table.name.to_lowercase();

            for field in &table.fields {
                if field.kind == FieldType::Varchar && field.max_length.is_none() {
                    return Err(ConfigError::MissingMaxLength {
                        table: table.name.clone(),
                        field: field.name.clone(),
                    });
                }

                if field.kind == FieldType::ForeignKey {
                    let Some(references) = &field.references else {
                        return Err(ConfigError::MissingReference {
                            table: table.name.clone(),
                            field: field.name.clone(),
                        });
                    };
                    if !seen.contains(&references.to_lowercase()) {
                        return Err(ConfigError::UnresolvedReference {
                            table: table.name.clone(),
                            field: field.name.clone(),
                            references: references.clone(),
                        });
                    }
                }
            }

            if !seen.insert(name) {
                return Err(ConfigError::DuplicateTable(table.name.clone()));
            }
        }

        Ok(())
    }

    /// Opens the configured database.
    pub fn open(&self) -> Result<Database> {
        Ok(Database::with_config(&self.database)?)
    }

    /// Registers every declared table on `db`, keyed by table name.
    pub fn declare(&self, db: &Database) -> Result<IndexMap<String, Table>> {
        let mut tables = IndexMap::with_capacity(self.tables.len());
        for declaration in &self.tables {
            let descriptor = declaration.descriptor(&tables)?;
            let table = db.register_table(descriptor)?;
            tables.insert(table.name().to_string(), table);
        }
        info!("declared {} table(s)", tables.len());
        Ok(tables)
    }
}
