//! Declarative table definitions read from the `[[tables]]` section.

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use tinyorm::{Field, Table, TableDescriptor, Value};

use crate::error::{ConfigError, Result};

/// Column kinds accepted in a declaration's `type` key.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum FieldType {
    Integer,
    Auto,
    Float,
    Boolean,
    Text,
    Varchar,
    Date,
    Datetime,
    ForeignKey,
}

/// One `[[tables]]` entry.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct TableDeclaration {
    /// Table name; stored lower-cased.
    pub name: String,

    /// Columns in declaration order.
    #[serde(default)]
    pub fields: Vec<FieldDeclaration>,
}

/// One `[[tables.fields]]` entry.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct FieldDeclaration {
    pub name: String,

    #[serde(rename = "type")]
    pub kind: FieldType,

    /// Maximum length of a `varchar` column.
    pub max_length: Option<usize>,

    /// Table referenced by a `foreign_key` column.
    pub references: Option<String>,

    /// Default a `date` column to the current date.
    #[serde(default)]
    pub auto_today: bool,

    /// Default a `datetime` column to the current time.
    #[serde(default)]
    pub auto_now: bool,

    #[serde(default)]
    pub nullable: bool,

    #[serde(default)]
    pub unique: bool,

    #[serde(default)]
    pub primary_key: bool,

    /// Value used when an insert omits the column.
    pub default: Option<toml::Value>,
}

impl TableDeclaration {
    /// Builds the descriptor, resolving foreign keys against `tables`.
    pub fn descriptor(&self, tables: &IndexMap<String, Table>) -> Result<TableDescriptor> {
        let mut builder = TableDescriptor::builder(&self.name);
        for field in &self.fields {
            builder = builder.field(&field.name, field.to_field(&self.name, tables)?);
        }
        Ok(builder.build()?)
    }
}

impl FieldDeclaration {
    pub fn to_field(&self, table: &str, tables: &IndexMap<String, Table>) -> Result<Field> {
        let mut field = match self.kind {
            FieldType::Integer => Field::integer(),
            FieldType::Auto => Field::auto_increment(),
            FieldType::Float => Field::float(),
            FieldType::Boolean => Field::boolean(),
            FieldType::Text => Field::text(),
            FieldType::Varchar => {
                let max_length = self.max_length.ok_or_else(|| ConfigError::MissingMaxLength {
                    table: table.to_string(),
                    field: self.name.clone(),
                })?;
                Field::bounded_text(max_length)
            }
            FieldType::Date => Field::date(),
            FieldType::Datetime => Field::datetime(),
            FieldType::ForeignKey => {
                let references =
                    self.references
                        .as_deref()
                        .ok_or_else(|| ConfigError::MissingReference {
                            table: table.to_string(),
                            field: self.name.clone(),
                        })?;
                let target = tables.get(&references.to_lowercase()).ok_or_else(|| {
                    ConfigError::UnresolvedReference {
                        table: table.to_string(),
                        field: self.name.clone(),
                        references: references.to_string(),
                    }
                })?;
                Field::foreign_key(target)
            }
        };

        if self.nullable {
            field = field.nullable();
        }
        if self.unique {
            field = field.unique();
        }
        if self.primary_key {
            field = field.primary_key();
        }
        if self.auto_today {
            field = field.auto_today();
        }
        if self.auto_now {
            field = field.auto_now();
        }
        if let Some(default) = &self.default {
            field = field.default(self.default_value(table, default)?);
        }

        Ok(field)
    }

    fn default_value(&self, table: &str, default: &toml::Value) -> Result<Value> {
        match default {
            toml::Value::String(v) => Ok(Value::from(v.as_str())),
            toml::Value::Integer(v) => Ok(Value::Integer(*v)),
            toml::Value::Float(v) => Ok(Value::Real(*v)),
            toml::Value::Boolean(v) => Ok(Value::Boolean(*v)),
            // Coerced by the date or datetime field when the table is built.
            toml::Value::Datetime(v) => Ok(Value::Text(v.to_string())),
            other => Err(ConfigError::UnsupportedDefault {
                table: table.to_string(),
                field: self.name.clone(),
                kind: other.type_str().to_string(),
            }),
        }
    }
}

#[cfg(test)]
mod tests {
    use tinyorm::{Database, FieldKind};

    use super::*;

    fn parse(input: &str) -> TableDeclaration {
        toml::from_str(input).unwrap()
    }

    #[test]
    fn test_field_types() {
        let declaration = parse(
            r#"
            name = "Event"

            [[fields]]
            name = "title"
            type = "varchar"
            max_length = 40
            unique = true

            [[fields]]
            name = "day"
            type = "date"
            default = 2024-05-17

            [[fields]]
            name = "seats"
            type = "integer"
            default = 10

            [[fields]]
            name = "note"
            type = "text"
            nullable = true
            "#,
        );

        let descriptor = declaration.descriptor(&IndexMap::new()).unwrap();
        assert_eq!(
            descriptor.schema(),
            "CREATE TABLE IF NOT EXISTS event (title VARCHAR(40) UNIQUE, \
             day TEXT DEFAULT '2024-05-17', seats INTEGER DEFAULT 10, note TEXT NULL, \
             id INTEGER PRIMARY KEY AUTOINCREMENT);"
        );
    }

    #[test]
    fn test_auto_now_flag() {
        let declaration = parse(
            r#"
            name = "Visit"
            [[fields]]
            name = "seen_at"
            type = "datetime"
            auto_now = true
            "#,
        );

        let descriptor = declaration.descriptor(&IndexMap::new()).unwrap();
        let field = descriptor.field("seen_at").unwrap();
        let tinyorm::Value::DateTime(at) = field.default_value().clone() else {
            panic!("seen_at should default to a datetime");
        };
        assert_eq!(
            field.compile_schema().unwrap(),
            format!("seen_at TEXT DEFAULT '{}'", at.format("%Y-%m-%d %H:%M:%S"))
        );
    }

    #[test]
    fn test_varchar_requires_max_length() {
        let declaration = parse(
            r#"
            name = "Code"
            [[fields]]
            name = "value"
            type = "varchar"
            "#,
        );
        assert!(matches!(
            declaration.descriptor(&IndexMap::new()),
            Err(ConfigError::MissingMaxLength { .. })
        ));
    }

    #[test]
    fn test_foreign_key_resolution() {
        let db = Database::open_in_memory().unwrap();
        let author = parse(
            r#"
            name = "Author"
            [[fields]]
            name = "name"
            type = "text"
            "#,
        );
        let book = parse(
            r#"
            name = "Book"
            [[fields]]
            name = "author"
            type = "foreign_key"
            references = "Author"
            "#,
        );

        assert!(matches!(
            book.descriptor(&IndexMap::new()),
            Err(ConfigError::UnresolvedReference { .. })
        ));

        let mut tables = IndexMap::new();
        let table = db
            .register_table(author.descriptor(&tables).unwrap())
            .unwrap();
        tables.insert(table.name().to_string(), table);

        let descriptor = book.descriptor(&tables).unwrap();
        let field = descriptor.field("author").unwrap();
        assert!(matches!(field.kind(), FieldKind::ForeignKey(_)));
        assert!(descriptor
            .schema()
            .ends_with("FOREIGN KEY (author) REFERENCES author(id));"));
    }

    #[test]
    fn test_unsupported_default() {
        let declaration = parse(
            r#"
            name = "Tagged"
            [[fields]]
            name = "tags"
            type = "text"
            default = ["a", "b"]
            "#,
        );
        assert!(matches!(
            declaration.descriptor(&IndexMap::new()),
            Err(ConfigError::UnsupportedDefault { .. })
        ));
    }

    #[test]
    fn test_invalid_default_surfaces_validation() {
        let declaration = parse(
            r#"
            name = "Broken"
            [[fields]]
            name = "count"
            type = "integer"
            default = "many"
            "#,
        );
        assert!(matches!(
            declaration.descriptor(&IndexMap::new()),
            Err(ConfigError::Orm(tinyorm::OrmError::Validation { .. }))
        ));
    }
}
