//! Filter descriptors.
//!
//! A descriptor is a column name optionally followed by `__<op>`, e.g.
//! `age__gt`. Together with a value it renders one SQL predicate.

use std::str::FromStr;

use crate::{
    codec,
    error::{OrmError, Result},
    value::{FieldMap, Value},
};

const SEPARATOR: &str = "__";

/// The comparison selected by a descriptor suffix.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LookupOp {
    Eq,
    Lt,
    Le,
    Gt,
    Ge,
    Ne,
    In,
    Contains,
    IContains,
}

impl FromStr for LookupOp {
    type Err = ();

    fn from_str(suffix: &str) -> std::result::Result<Self, Self::Err> {
        match suffix {
            "lt" => Ok(LookupOp::Lt),
            "le" => Ok(LookupOp::Le),
            "gt" => Ok(LookupOp::Gt),
            "ge" => Ok(LookupOp::Ge),
            "ne" => Ok(LookupOp::Ne),
            "in" => Ok(LookupOp::In),
            "contains" => Ok(LookupOp::Contains),
            "icontains" => Ok(LookupOp::IContains),
            _ => Err(()),
        }
    }
}

/// A parsed descriptor.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Lookup {
    pub column: String,
    pub op: LookupOp,
}

impl Lookup {
    /// Parses `column` or `column__op`.
    ///
    /// # Errors
    ///
    /// Returns [`OrmError::UnknownLookup`] for an unrecognized suffix.
    pub fn parse(descriptor: &str) -> Result<Self> {
        let mut parts = descriptor.split(SEPARATOR);
        let column = parts.next().unwrap_or_default().to_string();

        let op = match parts.last() {
            None => LookupOp::Eq,
            Some(suffix) => suffix.parse().map_err(|_| OrmError::UnknownLookup {
                descriptor: descriptor.to_string(),
                suffix: suffix.to_string(),
            })?,
        };

        Ok(Self { column, op })
    }

    /// Renders the predicate for `value`.
    pub fn predicate(&self, value: &Value) -> String {
        let column = &self.column;
        match self.op {
            LookupOp::Eq => format!("{column} = {}", codec::encode(value)),
            LookupOp::Lt => format!("{column} < {}", codec::encode(value)),
            LookupOp::Le => format!("{column} <= {}", codec::encode(value)),
            LookupOp::Gt => format!("{column} > {}", codec::encode(value)),
            LookupOp::Ge => format!("{column} >= {}", codec::encode(value)),
            LookupOp::Ne => format!("{column} <> {}", codec::encode(value)),
            LookupOp::In => {
                let tuple = match value {
                    Value::List(values) => codec::encode_tuple(values),
                    single => codec::encode_tuple(std::slice::from_ref(single)),
                };
                format!("{column} IN {tuple}")
            }
            LookupOp::Contains => format!("instr({column}, {}) > 0", codec::encode(value)),
            LookupOp::IContains => format!("{column} LIKE lower('%{}%')", codec::raw(value)),
        }
    }
}

/// Renders a single `descriptor`/`value` predicate.
pub fn predicate(descriptor: &str, value: &Value) -> Result<String> {
    Ok(Lookup::parse(descriptor)?.predicate(value))
}

/// Joins a prior predicate and the predicates of `filters` with `AND`.
///
/// Renders `1` when there is nothing to join.
pub fn conjunction(prior: Option<&str>, filters: &FieldMap) -> Result<String> {
    let mut parts: Vec<String> = prior.map(String::from).into_iter().collect();
    for (descriptor, value) in filters {
        parts.push(predicate(descriptor, value)?);
    }

    if parts.is_empty() {
        return Ok("1".to_string());
    }
    Ok(parts.join(" AND "))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fields;

    #[test]
    fn test_parse_plain_column() {
        let lookup = Lookup::parse("username").unwrap();
        assert_eq!(lookup.column, "username");
        assert_eq!(lookup.op, LookupOp::Eq);
    }

    #[test]
    fn test_parse_unknown_suffix() {
        assert!(matches!(
            Lookup::parse("age__between"),
            Err(OrmError::UnknownLookup { .. })
        ));
    }

    #[test]
    fn test_comparison_predicates() {
        assert_eq!(predicate("username", &"User1".into()).unwrap(), "username = 'User1'");
        assert_eq!(
            predicate("username__ne", &"User1".into()).unwrap(),
            "username <> 'User1'"
        );
        assert_eq!(predicate("id__lt", &1.into()).unwrap(), "id < 1");
        assert_eq!(predicate("id__le", &1.into()).unwrap(), "id <= 1");
        assert_eq!(predicate("id__gt", &1.into()).unwrap(), "id > 1");
        assert_eq!(predicate("id__ge", &1.into()).unwrap(), "id >= 1");
        assert_eq!(predicate("active", &true.into()).unwrap(), "active = TRUE");
    }

    #[test]
    fn test_in_predicate() {
        assert_eq!(
            predicate("username__in", &vec!["User1", "User2"].into()).unwrap(),
            "username IN ('User1', 'User2')"
        );
        assert_eq!(predicate("id__in", &7.into()).unwrap(), "id IN (7)");
    }

    #[test]
    fn test_contains_predicates() {
        assert_eq!(
            predicate("username__contains", &"1".into()).unwrap(),
            "instr(username, '1') > 0"
        );
        assert_eq!(
            predicate("username__icontains", &"User".into()).unwrap(),
            "username LIKE lower('%User%')"
        );
    }

    #[test]
    fn test_conjunction() {
        assert_eq!(conjunction(None, &fields! {}).unwrap(), "1");
        assert_eq!(
            conjunction(None, &fields! { "id__gt" => 1, "id__ge" => 1 }).unwrap(),
            "id > 1 AND id >= 1"
        );
        assert_eq!(
            conjunction(Some("age > 20"), &fields! { "age__lt" => 60 }).unwrap(),
            "age > 20 AND age < 60"
        );
        assert_eq!(conjunction(Some("age > 20"), &fields! {}).unwrap(), "age > 20");
    }
}
