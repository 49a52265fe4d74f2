//! Conversion between native values and SQL literals.
//!
//! Strings and dates are single-quoted verbatim. Embedded quotes are not
//! escaped, so text containing `'` produces malformed SQL. Non-finite
//! floats render as `NaN` or `inf`, which the engine reads as identifiers;
//! float fields reject them during validation.

use chrono::{NaiveDate, NaiveDateTime};

use crate::value::Value;

pub const DATE_FORMAT: &str = "%Y-%m-%d";
pub const DATETIME_FORMAT: &str = "%Y-%m-%d %H:%M:%S%.f";

const DATETIME_INPUT_FORMATS: [&str; 4] = [
    "%Y-%m-%d %H:%M:%S%.f",
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y-%m-%d %H:%M",
    "%Y-%m-%dT%H:%M",
];

/// Encodes a value as a SQL literal.
///
/// | Value            | Literal           |
/// |------------------|-------------------|
/// | `Boolean`        | `TRUE` / `FALSE`  |
/// | `Null`           | `NULL`            |
/// | text, date-like  | `'<raw>'`         |
/// | `List`           | `(<lit>, ...)`    |
/// | `Record`         | its primary key   |
/// | numbers          | lexical form      |
pub fn encode(value: &Value) -> String {
    match value {
        Value::Boolean(true) => "TRUE".to_string(),
        Value::Boolean(false) => "FALSE".to_string(),
        Value::Null => "NULL".to_string(),
        Value::Text(_) | Value::Date(_) | Value::DateTime(_) => format!("'{}'", raw(value)),
        Value::List(values) => encode_tuple(values),
        Value::Record(record) => encode(record.pk()),
        Value::Integer(_) | Value::Real(_) => raw(value),
    }
}

/// Encodes a sequence as a parenthesized literal tuple.
pub fn encode_tuple(values: &[Value]) -> String {
    let items: Vec<String> = values.iter().map(encode).collect();
    format!("({})", items.join(", "))
}

/// Lexical form of a value without any quoting.
pub fn raw(value: &Value) -> String {
    match value {
        Value::Null => "NULL".to_string(),
        Value::Integer(v) => v.to_string(),
        Value::Real(v) => format!("{v:?}"),
        Value::Boolean(true) => "TRUE".to_string(),
        Value::Boolean(false) => "FALSE".to_string(),
        Value::Text(v) => v.clone(),
        Value::Date(v) => v.format(DATE_FORMAT).to_string(),
        Value::DateTime(v) => v.format(DATETIME_FORMAT).to_string(),
        Value::List(values) => {
            let items: Vec<String> = values.iter().map(raw).collect();
            items.join(", ")
        }
        Value::Record(record) => raw(record.pk()),
    }
}

/// Parses an ISO `YYYY-MM-DD` date.
pub fn parse_date(input: &str) -> Option<NaiveDate> {
    NaiveDate::parse_from_str(input.trim(), DATE_FORMAT).ok()
}

/// Parses an ISO datetime; a bare date is read as midnight.
pub fn parse_datetime(input: &str) -> Option<NaiveDateTime> {
    let input = input.trim();
    DATETIME_INPUT_FORMATS
        .iter()
        .find_map(|format| NaiveDateTime::parse_from_str(input, format).ok())
        .or_else(|| parse_date(input).and_then(|date| date.and_hms_opt(0, 0, 0)))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_encode_scalars() {
        assert_eq!(encode(&Value::Boolean(true)), "TRUE");
        assert_eq!(encode(&Value::Boolean(false)), "FALSE");
        assert_eq!(encode(&Value::Null), "NULL");
        assert_eq!(encode(&Value::Integer(42)), "42");
        assert_eq!(encode(&Value::Real(1.5)), "1.5");
        assert_eq!(encode(&Value::Real(40.0)), "40.0");
        assert_eq!(encode(&Value::Text("User1".into())), "'User1'");
    }

    #[test]
    fn test_encode_does_not_escape_quotes() {
        assert_eq!(encode(&Value::Text("it's".into())), "'it's'");
    }

    #[test]
    fn test_encode_dates() {
        let date = NaiveDate::from_ymd_opt(2024, 1, 31).unwrap();
        assert_eq!(encode(&Value::Date(date)), "'2024-01-31'");

        let datetime = date.and_hms_opt(8, 5, 3).unwrap();
        assert_eq!(encode(&Value::DateTime(datetime)), "'2024-01-31 08:05:03'");
    }

    #[test]
    fn test_encode_tuple() {
        let values = vec![Value::from("User1"), Value::from("User2")];
        assert_eq!(encode_tuple(&values), "('User1', 'User2')");
        assert_eq!(encode(&Value::List(vec![1.into(), 2.into()])), "(1, 2)");
    }

    #[test]
    fn test_parse_datetime_variants() {
        let expected = NaiveDate::from_ymd_opt(2024, 1, 31)
            .unwrap()
            .and_hms_opt(8, 5, 3)
            .unwrap();
        assert_eq!(parse_datetime("2024-01-31 08:05:03"), Some(expected));
        assert_eq!(parse_datetime("2024-01-31T08:05:03"), Some(expected));
        assert_eq!(
            parse_datetime("2024-01-31"),
            NaiveDate::from_ymd_opt(2024, 1, 31).unwrap().and_hms_opt(0, 0, 0)
        );
        assert_eq!(parse_datetime("InvalidDatetime"), None);
    }

    #[test]
    fn test_datetime_fraction_round_trips() {
        let datetime = NaiveDate::from_ymd_opt(2024, 1, 31)
            .unwrap()
            .and_hms_micro_opt(8, 5, 3, 250_000)
            .unwrap();
        let text = raw(&Value::DateTime(datetime));
        assert_eq!(parse_datetime(&text), Some(datetime));
    }
}
