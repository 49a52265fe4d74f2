//! Column declarations.
//!
//! A [`Field`] describes one column: its SQL type, constraints, default value,
//! and the rules used to validate values before they are written and to
//! decode raw values read back from the engine. The set of field kinds is
//! closed ([`FieldKind`]); behavior is dispatched per variant.

use std::borrow::Cow;

use chrono::{Local, Timelike};
use once_cell::sync::OnceCell;
use rusqlite::types::Value as SqlValue;
use tracing::trace;

use crate::{
    codec,
    error::{OrmError, Result},
    fields,
    table::Table,
    value::Value,
};

/// The value domain accepted by a field.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NativeType {
    Integer,
    Float,
    Boolean,
    Text,
    Date,
    DateTime,
}

/// Truncates toward zero, or `None` when the result does not fit an `i64`.
fn truncate(v: f64) -> Option<i64> {
    let t = v.trunc();
    (t >= i64::MIN as f64 && t < i64::MAX as f64).then_some(t as i64)
}

impl NativeType {
    pub fn as_str(&self) -> &'static str {
        match self {
            NativeType::Integer => "integer",
            NativeType::Float => "float",
            NativeType::Boolean => "boolean",
            NativeType::Text => "text",
            NativeType::Date => "date",
            NativeType::DateTime => "datetime",
        }
    }

    /// Coerces a non-null value into this native type.
    ///
    /// Returns a human readable reason when the value cannot be coerced.
    fn coerce(&self, value: &Value) -> std::result::Result<Value, String> {
        let coerced = match (self, value) {
            (NativeType::Integer, Value::Integer(v)) => Some(Value::Integer(*v)),
            (NativeType::Integer, Value::Real(v)) => truncate(*v).map(Value::Integer),
            (NativeType::Integer, Value::Boolean(v)) => Some(Value::Integer(i64::from(*v))),
            (NativeType::Integer, Value::Text(v)) => v.trim().parse().ok().map(Value::Integer),

            (NativeType::Float, Value::Real(v)) if v.is_finite() => Some(Value::Real(*v)),
            (NativeType::Float, Value::Real(v)) => return Err(format!("{v} is not a finite float")),
            (NativeType::Float, Value::Integer(v)) => Some(Value::Real(*v as f64)),
            (NativeType::Float, Value::Boolean(v)) => Some(Value::Real(f64::from(u8::from(*v)))),
            (NativeType::Float, Value::Text(v)) => v
                .trim()
                .parse::<f64>()
                .ok()
                .filter(|v| v.is_finite())
                .map(Value::Real),

            (NativeType::Boolean, value) => Some(Value::Boolean(truthy(value))),

            (NativeType::Text, Value::List(_) | Value::Record(_)) => None,
            (NativeType::Text, value) => Some(Value::Text(codec::raw(value))),

            (NativeType::Date, Value::Date(v)) => Some(Value::Date(*v)),
            (NativeType::Date, Value::DateTime(v)) => Some(Value::Date(v.date())),
            (NativeType::Date, Value::Text(v)) => {
                return codec::parse_date(v).map(Value::Date).ok_or_else(|| {
                    format!(r#"String "{v}" does not match isoformat "YYYY-MM-DD""#)
                });
            }

            (NativeType::DateTime, Value::DateTime(v)) => Some(Value::DateTime(*v)),
            (NativeType::DateTime, Value::Date(v)) => v.and_hms_opt(0, 0, 0).map(Value::DateTime),
            (NativeType::DateTime, Value::Text(v)) => {
                return codec::parse_datetime(v).map(Value::DateTime).ok_or_else(|| {
                    format!(r#"String "{v}" does not match isoformat "YYYY-MM-DD HH:MM:SS""#)
                });
            }

            _ => None,
        };

        coerced.ok_or_else(|| format!("expected {}, not {}", self.as_str(), value.kind()))
    }

    /// Converts a raw engine value into this native type.
    fn decode(&self, raw: SqlValue) -> std::result::Result<Value, String> {
        let decoded = match (self, raw) {
            (_, SqlValue::Null) => Some(Value::Null),

            (NativeType::Integer, SqlValue::Integer(v)) => Some(Value::Integer(v)),
            (NativeType::Integer, SqlValue::Real(v)) => truncate(v).map(Value::Integer),
            (NativeType::Integer, SqlValue::Text(v)) => v.trim().parse().ok().map(Value::Integer),

            (NativeType::Float, SqlValue::Real(v)) => Some(Value::Real(v)),
            (NativeType::Float, SqlValue::Integer(v)) => Some(Value::Real(v as f64)),
            (NativeType::Float, SqlValue::Text(v)) => v.trim().parse().ok().map(Value::Real),

            (NativeType::Boolean, SqlValue::Integer(v)) => Some(Value::Boolean(v != 0)),
            (NativeType::Boolean, SqlValue::Real(v)) => Some(Value::Boolean(v != 0.0)),
            (NativeType::Boolean, SqlValue::Text(v)) => {
                let v = v.trim().to_ascii_lowercase();
                Some(Value::Boolean(!matches!(v.as_str(), "" | "0" | "false")))
            }

            (NativeType::Text, SqlValue::Text(v)) => Some(Value::Text(v)),
            (NativeType::Text, SqlValue::Integer(v)) => Some(Value::Text(v.to_string())),
            (NativeType::Text, SqlValue::Real(v)) => Some(Value::Text(v.to_string())),

            (NativeType::Date, SqlValue::Text(v)) => codec::parse_date(&v).map(Value::Date),
            (NativeType::DateTime, SqlValue::Text(v)) => {
                codec::parse_datetime(&v).map(Value::DateTime)
            }

            (_, SqlValue::Blob(_)) => return Err("blob values are not supported".to_string()),
            (native, other) => {
                return Err(format!(
                    "cannot read {other:?} as {}",
                    native.as_str()
                ))
            }
        };

        decoded.ok_or_else(|| format!("malformed {} value", self.as_str()))
    }
}

/// Relaxed truthiness used by boolean fields.
fn truthy(value: &Value) -> bool {
    match value {
        Value::Null => false,
        Value::Integer(v) => *v != 0,
        Value::Real(v) => *v != 0.0,
        Value::Boolean(v) => *v,
        Value::Text(v) => !v.is_empty(),
        Value::List(v) => !v.is_empty(),
        Value::Date(_) | Value::DateTime(_) | Value::Record(_) => true,
    }
}

/// Action requested for a foreign key when the referenced row is deleted.
///
/// Stored on the field but not emitted in the generated DDL.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum OnDelete {
    #[default]
    NoAction,
    Cascade,
    SetNull,
    Restrict,
}

/// A reference to the primary key of another registered table.
#[derive(Debug, Clone)]
pub struct ForeignKey {
    table: Table,
    on_delete: OnDelete,
}

impl ForeignKey {
    pub fn table(&self) -> &Table {
        &self.table
    }

    pub fn on_delete(&self) -> OnDelete {
        self.on_delete
    }

    fn target(&self) -> &Field {
        self.table.primary_key()
    }

    /// Replaces a record of the referenced table with its primary key.
    fn extract(&self, field: &str, value: &Value) -> Result<Value> {
        match value {
            Value::Record(record) if record.table().name() == self.table.name() => {
                Ok(record.pk().clone())
            }
            Value::Record(record) => Err(OrmError::validation(
                field,
                format!(
                    "expected a record of `{}`, not of `{}`",
                    self.table.name(),
                    record.table().name()
                ),
            )),
            other => Ok(other.clone()),
        }
    }
}

/// The closed set of column kinds.
#[derive(Debug, Clone)]
pub enum FieldKind {
    Integer,
    /// An integer assigned by the engine; never supplied on insert.
    AutoIncrement,
    Float,
    Boolean,
    Text,
    BoundedText { max_length: usize },
    Date,
    DateTime,
    ForeignKey(ForeignKey),
}

/// A column declaration.
#[derive(Debug, Clone)]
pub struct Field {
    name: Option<String>,
    kind: FieldKind,
    nullable: bool,
    unique: bool,
    primary_key: bool,
    default: Value,
    schema: OnceCell<String>,
}

impl Field {
    fn new(kind: FieldKind) -> Self {
        Self {
            name: None,
            kind,
            nullable: false,
            unique: false,
            primary_key: false,
            default: Value::Null,
            schema: OnceCell::new(),
        }
    }

    pub fn integer() -> Self {
        Self::new(FieldKind::Integer)
    }

    pub fn auto_increment() -> Self {
        Self::new(FieldKind::AutoIncrement)
    }

    pub fn float() -> Self {
        Self::new(FieldKind::Float)
    }

    pub fn boolean() -> Self {
        Self::new(FieldKind::Boolean)
    }

    pub fn text() -> Self {
        Self::new(FieldKind::Text)
    }

    /// A `VARCHAR(max_length)` column; longer strings fail validation.
    pub fn bounded_text(max_length: usize) -> Self {
        Self::new(FieldKind::BoundedText { max_length })
    }

    pub fn date() -> Self {
        Self::new(FieldKind::Date)
    }

    pub fn datetime() -> Self {
        Self::new(FieldKind::DateTime)
    }

    /// A column referencing the primary key of `table`.
    ///
    /// The SQL type and native type mirror the referenced primary key.
    pub fn foreign_key(table: &Table) -> Self {
        Self::new(FieldKind::ForeignKey(ForeignKey {
            table: table.clone(),
            on_delete: OnDelete::default(),
        }))
    }

    pub fn nullable(mut self) -> Self {
        self.nullable = true;
        self
    }

    pub fn unique(mut self) -> Self {
        self.unique = true;
        self
    }

    pub fn primary_key(mut self) -> Self {
        self.primary_key = true;
        self
    }

    /// Sets the value used when an insert omits this field.
    pub fn default(mut self, value: impl Into<Value>) -> Self {
        self.default = value.into();
        self
    }

    /// Defaults a date field to the current date, taken once at declaration.
    pub fn auto_today(self) -> Self {
        self.default(Local::now().date_naive())
    }

    /// Defaults a datetime field to the current time, taken once at declaration.
    pub fn auto_now(self) -> Self {
        let now = Local::now().naive_local();
        self.default(now.with_nanosecond(0).unwrap_or(now))
    }

    pub fn on_delete(mut self, action: OnDelete) -> Self {
        if let FieldKind::ForeignKey(fk) = &mut self.kind {
            fk.on_delete = action;
        }
        self
    }

    pub(crate) fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self.schema = OnceCell::new();
        self
    }

    pub fn name(&self) -> Option<&str> {
        self.name.as_deref()
    }

    pub(crate) fn column(&self) -> &str {
        self.name.as_deref().unwrap_or_default()
    }

    pub fn kind(&self) -> &FieldKind {
        &self.kind
    }

    pub fn is_nullable(&self) -> bool {
        self.nullable
    }

    pub fn is_unique(&self) -> bool {
        self.unique
    }

    pub fn is_primary_key(&self) -> bool {
        self.primary_key
    }

    pub fn is_auto_increment(&self) -> bool {
        matches!(self.kind, FieldKind::AutoIncrement)
    }

    pub fn default_value(&self) -> &Value {
        &self.default
    }

    pub fn foreign_key_target(&self) -> Option<&ForeignKey> {
        match &self.kind {
            FieldKind::ForeignKey(fk) => Some(fk),
            _ => None,
        }
    }

    pub fn sql_type(&self) -> Cow<'_, str> {
        match &self.kind {
            FieldKind::Integer | FieldKind::AutoIncrement => Cow::Borrowed("INTEGER"),
            FieldKind::Float => Cow::Borrowed("REAL"),
            FieldKind::Boolean => Cow::Borrowed("BOOLEAN"),
            FieldKind::Text | FieldKind::Date | FieldKind::DateTime => Cow::Borrowed("TEXT"),
            FieldKind::BoundedText { max_length } => Cow::Owned(format!("VARCHAR({max_length})")),
            FieldKind::ForeignKey(fk) => fk.target().sql_type(),
        }
    }

    pub fn native_type(&self) -> NativeType {
        match &self.kind {
            FieldKind::Integer | FieldKind::AutoIncrement => NativeType::Integer,
            FieldKind::Float => NativeType::Float,
            FieldKind::Boolean => NativeType::Boolean,
            FieldKind::Text | FieldKind::BoundedText { .. } => NativeType::Text,
            FieldKind::Date => NativeType::Date,
            FieldKind::DateTime => NativeType::DateTime,
            FieldKind::ForeignKey(fk) => fk.target().native_type(),
        }
    }

    /// Validates a value and returns it coerced to the field's native type.
    ///
    /// # Errors
    ///
    /// Returns [`OrmError::Validation`] when the value is null on a
    /// non-nullable field, cannot be coerced, exceeds a bounded text length,
    /// or is a string that does not parse as an ISO date or datetime.
    pub fn validate(&self, value: &Value) -> Result<Value> {
        let name = self.name.as_deref().unwrap_or("<unnamed>");

        let value = match &self.kind {
            FieldKind::ForeignKey(fk) => fk.extract(name, value)?,
            _ => value.clone(),
        };

        if value.is_null() {
            if self.nullable {
                return Ok(Value::Null);
            }
            return Err(OrmError::validation(name, "cannot be null"));
        }

        let coerced = self
            .native_type()
            .coerce(&value)
            .map_err(|message| OrmError::validation(name, message))?;

        if let (FieldKind::BoundedText { max_length }, Value::Text(text)) = (&self.kind, &coerced) {
            let length = text.chars().count();
            if length > *max_length {
                return Err(OrmError::validation(
                    name,
                    format!("length {length} exceeds max_length {max_length}"),
                ));
            }
        }

        Ok(coerced)
    }

    /// Checks the type of a declared default, letting nulls through.
    pub(crate) fn check_default(&self) -> Result<Value> {
        if self.default.is_null() {
            return Ok(Value::Null);
        }
        self.validate(&self.default)
    }

    pub(crate) fn set_default(&mut self, value: Value) {
        self.default = value;
        self.schema = OnceCell::new();
    }

    /// Column definition used in `CREATE TABLE`, computed once per field.
    ///
    /// ```text
    /// <name> <TYPE>[ NULL][ UNIQUE][ PRIMARY KEY[ AUTOINCREMENT]][ DEFAULT <literal>]
    /// ```
    ///
    /// Foreign keys reuse the referenced primary key's definition with the
    /// `PRIMARY KEY` and `AUTOINCREMENT` tokens removed, followed by the
    /// field's own `NULL`, `UNIQUE` and `DEFAULT` options.
    pub fn compile_schema(&self) -> Result<&str> {
        let name = self.name.as_deref().ok_or(OrmError::MissingFieldName)?;
        self.schema
            .get_or_try_init(|| self.render_schema(name))
            .map(String::as_str)
    }

    fn render_schema(&self, name: &str) -> Result<String> {
        if let FieldKind::ForeignKey(fk) = &self.kind {
            let target = fk.target().compile_schema()?;
            let stripped = target.replace("PRIMARY KEY", "").replace("AUTOINCREMENT", "");
            let mut words: Vec<&str> = stripped.split_whitespace().collect();
            if let Some(first) = words.first_mut() {
                *first = name;
            }
            let mut schema = words.join(" ");
            if self.nullable && !words.contains(&"NULL") {
                schema.push_str(" NULL");
            }
            if self.unique && !words.contains(&"UNIQUE") {
                schema.push_str(" UNIQUE");
            }
            if !self.default.is_null() && !words.contains(&"DEFAULT") {
                schema.push_str(" DEFAULT ");
                schema.push_str(&codec::encode(&self.default));
            }
            return Ok(schema);
        }

        let mut schema = format!("{name} {}", self.sql_type());

        if self.nullable {
            schema.push_str(" NULL");
        }

        if self.unique {
            schema.push_str(" UNIQUE");
        }

        if self.primary_key {
            schema.push_str(" PRIMARY KEY");
            if self.is_auto_increment() {
                schema.push_str(" AUTOINCREMENT");
            }
        }

        if !self.default.is_null() {
            schema.push_str(" DEFAULT ");
            schema.push_str(&codec::encode(&self.default));
        }

        if self.is_auto_increment() && !self.primary_key {
            schema.push_str(" AUTOINCREMENT");
        }

        Ok(schema)
    }

    /// The `FOREIGN KEY (...) REFERENCES ...` clause for foreign key fields.
    pub fn foreign_key_clause(&self) -> Result<Option<String>> {
        let FieldKind::ForeignKey(fk) = &self.kind else {
            return Ok(None);
        };
        let name = self.name.as_deref().ok_or(OrmError::MissingFieldName)?;
        Ok(Some(format!(
            "FOREIGN KEY ({name}) REFERENCES {}({})",
            fk.table.name(),
            fk.target().column()
        )))
    }

    /// Decodes a raw engine value into a native value.
    ///
    /// Foreign keys are resolved by selecting the referenced row; a missing
    /// row decodes to [`Value::Null`].
    pub fn decode(&self, raw: SqlValue) -> Result<Value> {
        if let FieldKind::ForeignKey(fk) = &self.kind {
            if matches!(raw, SqlValue::Null) {
                return Ok(Value::Null);
            }
            let key = fk.target().decode(raw)?;
            trace!(
                "resolving {} -> {}({})",
                self.column(),
                fk.table.name(),
                key
            );
            let related = fk
                .table
                .objects()
                .select(fields! { fk.target().column() => key })?;
            return Ok(related.first().cloned().map_or(Value::Null, Value::from));
        }

        self.native_type()
            .decode(raw)
            .map_err(|message| OrmError::Decode {
                column: self.column().to_string(),
                message,
            })
    }
}
