use std::{
    fmt::Display,
    sync::{LazyLock, RwLock},
};

use nu_ansi_term::Color::{self, Cyan, DarkGray};
use tabled::{
    builder::Builder,
    settings::{themes::BorderCorrection, Panel, Style},
};
use tinyorm::{FieldMap, Record, Table, Value};
use tracing::info;

use crate::error::{CliError, CliResult};

const LIST_SUFFIX: &str = "__in";

pub static COLOR: LazyLock<RwLock<bool>> = LazyLock::new(|| RwLock::new(true));

pub struct Colored<T: Display>(pub Color, pub T);

impl<T: Display> Display for Colored<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let color = COLOR.read().map(|c| *c).unwrap_or(true);
        if color {
            write!(f, "{}", self.0.prefix())?;
            self.1.fmt(f)?;
            write!(f, "{}", self.0.suffix())
        } else {
            self.1.fmt(f)
        }
    }
}

/// Reads a command-line scalar as null, boolean, integer, float, or text.
pub fn parse_value(input: &str) -> Value {
    match input {
        "null" | "NULL" => Value::Null,
        "true" => Value::Boolean(true),
        "false" => Value::Boolean(false),
        _ => {
            if let Ok(v) = input.parse::<i64>() {
                Value::Integer(v)
            } else if let Ok(v) = input.parse::<f64>() {
                Value::Real(v)
            } else {
                Value::from(input)
            }
        }
    }
}

/// Parses `name=value` arguments; `name__in=a,b` yields a list.
pub fn parse_assignments(args: &[String]) -> CliResult<FieldMap> {
    let mut map = FieldMap::with_capacity(args.len());
    for arg in args {
        let (key, raw) = arg
            .split_once('=')
            .filter(|(key, _)| !key.is_empty())
            .ok_or_else(|| CliError::InvalidAssignment(arg.clone()))?;

        let value = if key.ends_with(LIST_SUFFIX) {
            Value::List(raw.split(',').map(parse_value).collect())
        } else {
            parse_value(raw)
        };
        map.insert(key.to_string(), value);
    }
    Ok(map)
}

fn cell(value: &Value) -> String {
    match value {
        Value::Null => format!("{}", Colored(DarkGray, "NULL")),
        Value::Record(record) => record.pk().to_string(),
        other => other.to_string(),
    }
}

/// Prints records as a table, or one JSON object per line.
pub fn print_records(table: &Table, records: &[Record], json: bool) -> CliResult<()> {
    if json {
        for record in records {
            println!("{}", serde_json::to_string(&Value::from(record.clone()))?);
        }
        return Ok(());
    }

    let mut builder = Builder::new();
    builder.push_record(
        table
            .fields()
            .iter()
            .filter_map(|f| f.name())
            .map(|name| format!("{}", Colored(Cyan, name))),
    );
    for record in records {
        builder.push_record(record.attrs().values().map(cell));
    }

    let output = builder
        .build()
        .with(Panel::header(format!("{} ({} rows)", table.name(), records.len())))
        .with(Style::rounded())
        .with(BorderCorrection {})
        .to_string();

    info!("\n{output}");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_value() {
        assert_eq!(parse_value("null"), Value::Null);
        assert_eq!(parse_value("true"), Value::Boolean(true));
        assert_eq!(parse_value("42"), Value::Integer(42));
        assert_eq!(parse_value("-2.5"), Value::Real(-2.5));
        assert_eq!(parse_value("User1"), Value::Text("User1".into()));
    }

    #[test]
    fn test_parse_assignments() {
        let args = vec![
            "age__gt=20".to_string(),
            "username__in=User1,user2".to_string(),
            "note=a=b".to_string(),
        ];
        let map = parse_assignments(&args).unwrap();

        assert_eq!(map["age__gt"], Value::Integer(20));
        assert_eq!(
            map["username__in"],
            Value::List(vec!["User1".into(), "user2".into()])
        );
        assert_eq!(map["note"], Value::Text("a=b".into()));
    }

    #[test]
    fn test_parse_assignments_rejects_bare_words() {
        assert!(matches!(
            parse_assignments(&["age".to_string()]),
            Err(CliError::InvalidAssignment(_))
        ));
        assert!(matches!(
            parse_assignments(&["=1".to_string()]),
            Err(CliError::InvalidAssignment(_))
        ));
    }
}
