//! SQL statement rendering.
//!
//! Every function here is pure: it takes a table name, an already rendered
//! predicate, and value maps, and returns the statement text.

use std::fmt;

use crate::{codec, value::FieldMap};

/// Aggregate functions supported by [`aggregate`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Aggregate {
    Count,
    Sum,
    Avg,
    Max,
    Min,
}

impl fmt::Display for Aggregate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Aggregate::Count => "COUNT",
            Aggregate::Sum => "SUM",
            Aggregate::Avg => "AVG",
            Aggregate::Max => "MAX",
            Aggregate::Min => "MIN",
        };
        write!(f, "{name}")
    }
}

pub fn select(table: &str, predicate: &str) -> String {
    format!("SELECT * FROM {table} WHERE {predicate};")
}

/// Renders an `INSERT`, or `INSERT ... DEFAULT VALUES` for an empty map.
pub fn insert(table: &str, values: &FieldMap) -> String {
    if values.is_empty() {
        return format!("INSERT INTO {table} DEFAULT VALUES;");
    }

    let columns: Vec<&str> = values.keys().map(String::as_str).collect();
    let literals: Vec<String> = values.values().map(codec::encode).collect();
    format!(
        "INSERT INTO {table} ({}) VALUES ({});",
        columns.join(", "),
        literals.join(", ")
    )
}

pub fn update(table: &str, values: &FieldMap, predicate: &str) -> String {
    let assignments: Vec<String> = values
        .iter()
        .map(|(column, value)| format!("{column} = {}", codec::encode(value)))
        .collect();
    format!(
        "UPDATE {table} SET {} WHERE {predicate};",
        assignments.join(", ")
    )
}

pub fn delete(table: &str, predicate: &str) -> String {
    format!("DELETE FROM {table} WHERE {predicate};")
}

/// Renders `SELECT <FN>(<column>) ...`; `*` when no column is given.
pub fn aggregate(table: &str, function: Aggregate, column: Option<&str>, predicate: &str) -> String {
    let column = column.unwrap_or("*");
    format!("SELECT {function}({column}) FROM {table} WHERE {predicate};")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fields;

    #[test]
    fn test_select() {
        assert_eq!(select("withid", "1"), "SELECT * FROM withid WHERE 1;");
    }

    #[test]
    fn test_insert() {
        let values = fields! { "username" => "testuser", "active" => true };
        assert_eq!(
            insert("user", &values),
            "INSERT INTO user (username, active) VALUES ('testuser', TRUE);"
        );
        assert_eq!(insert("user", &fields! {}), "INSERT INTO user DEFAULT VALUES;");
    }

    #[test]
    fn test_update() {
        let values = fields! { "age" => 31, "name" => "John" };
        assert_eq!(
            update("user", &values, "id = 1"),
            "UPDATE user SET age = 31, name = 'John' WHERE id = 1;"
        );
    }

    #[test]
    fn test_delete() {
        assert_eq!(delete("user", "id = 1"), "DELETE FROM user WHERE id = 1;");
    }

    #[test]
    fn test_aggregate() {
        assert_eq!(
            aggregate("user", Aggregate::Count, None, "1"),
            "SELECT COUNT(*) FROM user WHERE 1;"
        );
        assert_eq!(
            aggregate("user", Aggregate::Avg, Some("age"), "age > 20"),
            "SELECT AVG(age) FROM user WHERE age > 20;"
        );
    }
}
