use serde::{Deserialize, Serialize};

pub const MEMORY_PATH: &str = ":memory:";

/// Connection options applied once when a [`crate::Database`] is opened.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct DatabaseConfig {
    /// Path to the SQLite database file, or `:memory:`.
    /// Default: :memory:
    #[serde(default = "default_path")]
    pub path: String,

    /// Enforce foreign key constraints.
    /// Default: true
    #[serde(default = "default_foreign_keys")]
    pub foreign_keys: bool,

    /// SQLite journal mode, e.g. `wal` or `delete`.
    pub journal_mode: Option<String>,

    /// How long to wait on a locked database, in milliseconds.
    pub busy_timeout_ms: Option<u64>,
}

fn default_path() -> String {
    MEMORY_PATH.to_string()
}

fn default_foreign_keys() -> bool {
    true
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            path: default_path(),
            foreign_keys: default_foreign_keys(),
            journal_mode: None,
            busy_timeout_ms: None,
        }
    }
}

impl DatabaseConfig {
    pub fn new(path: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            ..Self::default()
        }
    }

    pub fn is_memory(&self) -> bool {
        self.path == MEMORY_PATH
    }
}
