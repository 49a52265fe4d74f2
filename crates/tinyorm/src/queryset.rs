//! Query execution and materialized results.

use std::{fmt, ops::Index};

use rusqlite::types::Value as SqlValue;
use tracing::trace;

use crate::{
    database::Rows,
    error::{OrmError, Result},
    lookup::{self, Lookup},
    record::Record,
    statement::{self, Aggregate},
    table::Table,
    value::{FieldMap, Value},
};

/// The result of one statement against a table, and the handle used to
/// issue the next one.
///
/// A queryset produced by [`Queryset::select`] remembers its predicate;
/// calling another operation on it conjoins the new filters after it.
///
/// # Example
///
/// ```ignore
/// use tinyorm::fields;
///
/// let adults = user.objects().select(fields! { "age__gt" => 20 })?;
/// assert_eq!(adults.statement(), "SELECT * FROM user WHERE age > 20;");
///
/// // SELECT COUNT(*) FROM user WHERE age > 20 AND active = TRUE;
/// let active = adults.count(fields! { "active" => true })?;
/// ```
#[derive(Debug, Clone)]
pub struct Queryset {
    table: Table,
    statement: String,
    predicate: Option<String>,
    records: Vec<Record>,
    rows_affected: u64,
}

impl Queryset {
    pub(crate) fn new(table: Table) -> Self {
        Self {
            table,
            statement: String::new(),
            predicate: None,
            records: Vec::new(),
            rows_affected: 0,
        }
    }

    fn chained(&self, statement: String, predicate: Option<String>) -> Self {
        Self {
            table: self.table.clone(),
            statement,
            predicate,
            records: Vec::new(),
            rows_affected: 0,
        }
    }

    pub fn table(&self) -> &Table {
        &self.table
    }

    /// The text of the statement that produced this queryset, empty when
    /// nothing was executed.
    pub fn statement(&self) -> &str {
        &self.statement
    }

    /// Rows changed by an insert, update, or delete.
    pub fn rows_affected(&self) -> u64 {
        self.rows_affected
    }

    pub fn records(&self) -> &[Record] {
        &self.records
    }

    pub fn into_records(self) -> Vec<Record> {
        self.records
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn get(&self, index: usize) -> Option<&Record> {
        self.records.get(index)
    }

    pub fn first(&self) -> Option<&Record> {
        self.records.first()
    }

    pub fn last(&self) -> Option<&Record> {
        self.records.last()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Record> {
        self.records.iter()
    }

    /// Renders the predicate for `filters`, after the prior one if any.
    fn predicate(&self, filters: &FieldMap) -> Result<String> {
        let descriptor = self.table.descriptor();
        for key in filters.keys() {
            let lookup = Lookup::parse(key)?;
            descriptor.require_field(&lookup.column)?;
        }
        lookup::conjunction(self.predicate.as_deref(), filters)
    }

    /// Selects every row matching `filters`.
    ///
    /// An empty map selects every row (`WHERE 1`), or re-runs the prior
    /// predicate when chained.
    ///
    /// # Errors
    ///
    /// - [`OrmError::UnknownField`] if a filter names an undeclared column
    /// - [`OrmError::UnknownLookup`] if a filter has an unknown `__` suffix
    pub fn select(&self, filters: FieldMap) -> Result<Queryset> {
        let predicate = self.predicate(&filters)?;
        let sql = statement::select(self.table.name(), &predicate);

        let rows = self.table.database().execute(&sql)?;
        let records = self.decode(rows)?;

        let mut result = self.chained(sql, Some(predicate));
        result.records = records;
        Ok(result)
    }

    /// Re-runs the current predicate; every row on a fresh queryset.
    pub fn all(&self) -> Result<Queryset> {
        self.select(FieldMap::new())
    }

    fn decode(&self, rows: Rows) -> Result<Vec<Record>> {
        let fields = self.table.fields();
        let positions: Vec<Option<usize>> = fields
            .iter()
            .map(|f| rows.column_index(f.column()))
            .collect();

        let mut records = Vec::with_capacity(rows.values.len());
        for mut row in rows.values {
            let mut attrs = FieldMap::with_capacity(fields.len());
            for (field, position) in fields.iter().zip(&positions) {
                let raw = position
                    .and_then(|idx| row.get_mut(idx))
                    .map(|cell| std::mem::replace(cell, SqlValue::Null))
                    .unwrap_or(SqlValue::Null);
                attrs.insert(field.column().to_string(), field.decode(raw)?);
            }
            trace!("decoded {} row: {:?}", self.table.name(), attrs);
            records.push(Record::new(self.table.clone(), attrs));
        }
        Ok(records)
    }

    /// Inserts one row and reads it back.
    ///
    /// Omitted fields take their declared default. Auto-increment fields are
    /// left to the engine unless a non-null value is supplied. The row is read
    /// back by selecting on the non-null inserted values and taking the last
    /// match, so rows with identical values cannot be told apart.
    ///
    /// # Errors
    ///
    /// - [`OrmError::UnknownField`] if `fields` names an undeclared column
    /// - [`OrmError::Validation`] if a supplied or default value is invalid
    pub fn insert(&self, fields: FieldMap) -> Result<Queryset> {
        let descriptor = self.table.descriptor();
        for name in fields.keys() {
            descriptor.require_field(name)?;
        }

        let mut values = FieldMap::new();
        for field in descriptor.fields() {
            let supplied = fields.get(field.column()).filter(|v| !v.is_null());
            let value = match (field.is_auto_increment(), supplied) {
                (true, None) => continue,
                (_, Some(value)) => value,
                (false, None) => fields.get(field.column()).unwrap_or(field.default_value()),
            };
            values.insert(field.column().to_string(), field.validate(value)?);
        }

        let sql = if fields.is_empty() {
            statement::insert(self.table.name(), &FieldMap::new())
        } else {
            statement::insert(self.table.name(), &values)
        };
        let rows = self.table.database().execute(&sql)?;

        let filters: FieldMap = values.into_iter().filter(|(_, v)| !v.is_null()).collect();
        let inserted = self.table.objects().select(filters)?.into_records().pop();

        let mut result = self.chained(sql, None);
        result.records = inserted.into_iter().collect();
        result.rows_affected = rows.changes;
        Ok(result)
    }

    /// Updates every row matching `filters`; nothing is read back.
    ///
    /// An empty `values` map executes nothing.
    pub fn update(&self, values: FieldMap, filters: FieldMap) -> Result<Queryset> {
        let descriptor = self.table.descriptor();
        let mut validated = FieldMap::with_capacity(values.len());
        for (name, value) in &values {
            let field = descriptor.require_field(name)?;
            validated.insert(name.clone(), field.validate(value)?);
        }

        let predicate = self.predicate(&filters)?;
        if validated.is_empty() {
            return Ok(self.chained(String::new(), None));
        }

        let sql = statement::update(self.table.name(), &validated, &predicate);
        let rows = self.table.database().execute(&sql)?;

        let mut result = self.chained(sql, None);
        result.rows_affected = rows.changes;
        Ok(result)
    }

    /// Deletes every row matching `filters`.
    pub fn delete(&self, filters: FieldMap) -> Result<Queryset> {
        let predicate = self.predicate(&filters)?;
        let sql = statement::delete(self.table.name(), &predicate);
        let rows = self.table.database().execute(&sql)?;

        let mut result = self.chained(sql, None);
        result.rows_affected = rows.changes;
        Ok(result)
    }

    /// Runs an aggregate over the rows matching `filters`.
    ///
    /// A null result, as on an empty table, is returned as `0`.
    pub fn aggregate(
        &self,
        function: Aggregate,
        column: Option<&str>,
        filters: FieldMap,
    ) -> Result<Value> {
        if let Some(column) = column {
            self.table.descriptor().require_field(column)?;
        }

        let predicate = self.predicate(&filters)?;
        let sql = statement::aggregate(self.table.name(), function, column, &predicate);
        let rows = self.table.database().execute(&sql)?;

        let raw = rows
            .values
            .into_iter()
            .next()
            .and_then(|row| row.into_iter().next())
            .unwrap_or(SqlValue::Null);

        match raw {
            SqlValue::Null => Ok(Value::Integer(0)),
            SqlValue::Integer(v) => Ok(Value::Integer(v)),
            SqlValue::Real(v) => Ok(Value::Real(v)),
            SqlValue::Text(v) => Ok(Value::Text(v)),
            SqlValue::Blob(_) => Err(OrmError::Decode {
                column: format!("{function}({})", column.unwrap_or("*")),
                message: "blob values are not supported".to_string(),
            }),
        }
    }

    pub fn count(&self, filters: FieldMap) -> Result<i64> {
        let value = self.aggregate(Aggregate::Count, None, filters)?;
        Ok(value.as_i64().unwrap_or_default())
    }

    pub fn sum(&self, column: &str, filters: FieldMap) -> Result<Value> {
        self.aggregate(Aggregate::Sum, Some(column), filters)
    }

    pub fn avg(&self, column: &str, filters: FieldMap) -> Result<Value> {
        self.aggregate(Aggregate::Avg, Some(column), filters)
    }

    pub fn max(&self, column: &str, filters: FieldMap) -> Result<Value> {
        self.aggregate(Aggregate::Max, Some(column), filters)
    }

    pub fn min(&self, column: &str, filters: FieldMap) -> Result<Value> {
        self.aggregate(Aggregate::Min, Some(column), filters)
    }
}

impl fmt::Display for Queryset {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.statement)
    }
}

impl Index<usize> for Queryset {
    type Output = Record;

    fn index(&self, index: usize) -> &Self::Output {
        &self.records[index]
    }
}

impl<'a> IntoIterator for &'a Queryset {
    type Item = &'a Record;
    type IntoIter = std::slice::Iter<'a, Record>;

    fn into_iter(self) -> Self::IntoIter {
        self.records.iter()
    }
}

impl IntoIterator for Queryset {
    type Item = Record;
    type IntoIter = std::vec::IntoIter<Record>;

    fn into_iter(self) -> Self::IntoIter {
        self.records.into_iter()
    }
}
