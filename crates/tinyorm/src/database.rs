//! The database handle.
//!
//! [`Database`] owns the single SQLite connection. Statements reach the
//! engine only through [`Database::execute`]; SQLite's autocommit mode commits
//! each one as soon as it finishes.

use std::{
    path::Path,
    sync::{Arc, Mutex},
    time::Duration,
};

use rusqlite::{types::Value as SqlValue, Connection};
use tracing::{debug, info};

use crate::{
    config::DatabaseConfig,
    error::{OrmError, Result},
    schema::TableDescriptor,
    table::Table,
};

/// Raw result of one statement.
#[derive(Debug, Default, Clone)]
pub struct Rows {
    pub columns: Vec<String>,
    pub values: Vec<Vec<SqlValue>>,
    /// Rows changed by the most recent write on the connection.
    pub changes: u64,
}

impl Rows {
    pub fn column_index(&self, name: &str) -> Option<usize> {
        self.columns.iter().position(|c| c == name)
    }
}

/// Shared handle to one SQLite connection.
///
/// Cloning is cheap; clones use the same connection.
#[derive(Clone)]
pub struct Database {
    conn: Arc<Mutex<Connection>>,
}

impl std::fmt::Debug for Database {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Database").finish_non_exhaustive()
    }
}

impl Database {
    /// Opens a database file with the default options.
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        let conn = Connection::open(path)?;
        Self::from_connection(conn, &DatabaseConfig::default())
    }

    pub fn open_in_memory() -> Result<Self> {
        let conn = Connection::open_in_memory()?;
        Self::from_connection(conn, &DatabaseConfig::default())
    }

    pub fn with_config(config: &DatabaseConfig) -> Result<Self> {
        let conn = if config.is_memory() {
            Connection::open_in_memory()?
        } else {
            Connection::open(&config.path)?
        };
        Self::from_connection(conn, config)
    }

    /// Wraps an already opened connection and applies `config` to it.
    pub fn from_connection(conn: Connection, config: &DatabaseConfig) -> Result<Self> {
        if config.foreign_keys {
            conn.execute_batch("PRAGMA foreign_keys = ON;")?;
        }

        if let Some(mode) = &config.journal_mode {
            let mode: String =
                conn.query_row(&format!("PRAGMA journal_mode = {mode};"), [], |row| {
                    row.get(0)
                })?;
            debug!("journal mode set to {mode}");
        }

        if let Some(ms) = config.busy_timeout_ms {
            conn.busy_timeout(Duration::from_millis(ms))?;
        }

        Ok(Self {
            conn: Arc::new(Mutex::new(conn)),
        })
    }

    /// Executes one statement and collects every returned row.
    ///
    /// # Errors
    ///
    /// Returns [`OrmError::Engine`] when SQLite rejects the statement.
    pub fn execute(&self, sql: &str) -> Result<Rows> {
        debug!("{sql}");
        let conn = self.conn.lock().map_err(|_| OrmError::PoisonError)?;
        let mut stmt = conn.prepare(sql)?;
        let columns: Vec<String> = stmt.column_names().into_iter().map(String::from).collect();

        let mut values = Vec::new();
        let mut rows = stmt.query([])?;
        while let Some(row) = rows.next()? {
            let mut cells = Vec::with_capacity(columns.len());
            for idx in 0..columns.len() {
                cells.push(SqlValue::from(row.get_ref(idx)?));
            }
            values.push(cells);
        }
        drop(rows);
        drop(stmt);

        Ok(Rows {
            columns,
            values,
            changes: conn.changes(),
        })
    }

    /// Binds a table declaration to this database and creates the table.
    pub fn register_table(&self, descriptor: TableDescriptor) -> Result<Table> {
        self.execute(descriptor.schema())?;
        info!("registered table {}", descriptor.table_name());
        Ok(Table::new(descriptor, self.clone()))
    }

    /// Runs the `CREATE TABLE IF NOT EXISTS` statement of each table.
    pub fn create_tables_if_not_exists(&self, tables: &[&Table]) -> Result<()> {
        for table in tables {
            self.execute(table.schema())?;
        }
        Ok(())
    }

    /// Names of the tables currently present in the database file.
    pub fn table_names(&self) -> Result<Vec<String>> {
        let rows = self.execute(
            "SELECT name FROM sqlite_master WHERE type = 'table' AND name NOT LIKE 'sqlite_%' ORDER BY name;",
        )?;
        Ok(rows
            .values
            .into_iter()
            .filter_map(|mut row| match row.pop() {
                Some(SqlValue::Text(name)) => Some(name),
                _ => None,
            })
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_execute_returns_rows() {
        let db = Database::open_in_memory().unwrap();
        db.execute("CREATE TABLE t (a INTEGER, b TEXT);").unwrap();
        db.execute("INSERT INTO t (a, b) VALUES (1, 'x');").unwrap();

        let rows = db.execute("SELECT * FROM t WHERE 1;").unwrap();
        assert_eq!(rows.columns, vec!["a", "b"]);
        assert_eq!(
            rows.values,
            vec![vec![SqlValue::Integer(1), SqlValue::Text("x".into())]]
        );
        assert_eq!(rows.column_index("b"), Some(1));
    }

    #[test]
    fn test_execute_reports_changes() {
        let db = Database::open_in_memory().unwrap();
        db.execute("CREATE TABLE t (a INTEGER);").unwrap();
        db.execute("INSERT INTO t (a) VALUES (1);").unwrap();
        db.execute("INSERT INTO t (a) VALUES (2);").unwrap();

        let rows = db.execute("DELETE FROM t WHERE 1;").unwrap();
        assert_eq!(rows.changes, 2);
    }

    #[test]
    fn test_engine_error_is_propagated() {
        let db = Database::open_in_memory().unwrap();
        let err = db.execute("SELECT * FROM missing WHERE 1;").unwrap_err();
        assert!(matches!(err, OrmError::Engine(_)));
        assert!(err.is_engine());
    }

    #[test]
    fn test_foreign_keys_enabled() {
        let db = Database::open_in_memory().unwrap();
        let rows = db.execute("PRAGMA foreign_keys;").unwrap();
        assert_eq!(rows.values, vec![vec![SqlValue::Integer(1)]]);
    }

    #[test]
    fn test_file_database_with_config() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("app.db");
        let config = DatabaseConfig {
            journal_mode: Some("wal".into()),
            busy_timeout_ms: Some(500),
            ..DatabaseConfig::new(path.to_string_lossy())
        };

        let db = Database::with_config(&config).unwrap();
        db.execute("CREATE TABLE t (a INTEGER);").unwrap();
        assert!(path.exists());
        assert_eq!(db.table_names().unwrap(), vec!["t".to_string()]);
    }
}
