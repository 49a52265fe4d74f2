//! Table declarations and DDL generation.

use tracing::trace;

use crate::{
    error::{OrmError, Result},
    field::Field,
};

const SYNTHESIZED_PK: &str = "id";

/// Compiled metadata for one table.
///
/// Built with [`TableDescriptor::builder`]; the field set, primary key, and
/// `CREATE TABLE` statement are fixed once the descriptor is built.
#[derive(Debug, Clone)]
pub struct TableDescriptor {
    table_name: String,
    fields: Vec<Field>,
    primary_key: usize,
    schema: String,
}

impl TableDescriptor {
    /// Starts a declaration. The table name is the lower-cased `name`.
    pub fn builder(name: impl Into<String>) -> TableBuilder {
        TableBuilder {
            name: name.into(),
            fields: Vec::new(),
        }
    }

    pub fn table_name(&self) -> &str {
        &self.table_name
    }

    /// Fields in declaration order; a synthesized `id` comes last.
    pub fn fields(&self) -> &[Field] {
        &self.fields
    }

    pub fn field(&self, name: &str) -> Option<&Field> {
        self.fields.iter().find(|f| f.name() == Some(name))
    }

    pub fn primary_key(&self) -> &Field {
        &self.fields[self.primary_key]
    }

    pub fn column_names(&self) -> impl Iterator<Item = &str> {
        self.fields.iter().map(Field::column)
    }

    /// The `CREATE TABLE IF NOT EXISTS` statement.
    pub fn schema(&self) -> &str {
        &self.schema
    }

    pub(crate) fn require_field(&self, name: &str) -> Result<&Field> {
        self.field(name).ok_or_else(|| OrmError::UnknownField {
            table: self.table_name.clone(),
            field: name.to_string(),
        })
    }
}

/// Collects the fields of a table declaration.
#[derive(Debug)]
pub struct TableBuilder {
    name: String,
    fields: Vec<Field>,
}

impl TableBuilder {
    /// Adds a column. Column order follows the order of calls.
    pub fn field(mut self, name: impl Into<String>, field: Field) -> Self {
        self.fields.push(field.with_name(name));
        self
    }

    /// Resolves the primary key and compiles the DDL.
    ///
    /// # Errors
    ///
    /// - [`OrmError::DuplicateField`] if two fields share a name
    /// - [`OrmError::DuplicatePrimaryKey`] if more than one field is a primary key
    /// - [`OrmError::ReservedFieldName`] if `id` is declared while no primary key is
    /// - [`OrmError::Validation`] if a default does not fit its field
    pub fn build(self) -> Result<TableDescriptor> {
        let table_name = self.name.to_lowercase();
        let mut fields = self.fields;

        for (idx, field) in fields.iter().enumerate() {
            if fields[..idx].iter().any(|f| f.name() == field.name()) {
                return Err(OrmError::DuplicateField {
                    table: table_name,
                    field: field.column().to_string(),
                });
            }
        }

        for field in &mut fields {
            let default = field.check_default()?;
            field.set_default(default);
        }

        let mut keys = fields
            .iter()
            .enumerate()
            .filter(|(_, f)| f.is_primary_key())
            .map(|(idx, _)| idx);

        let primary_key = match (keys.next(), keys.next()) {
            (Some(idx), None) => idx,
            (Some(_), Some(_)) => return Err(OrmError::DuplicatePrimaryKey(table_name)),
            (None, _) => {
                if fields.iter().any(|f| f.name() == Some(SYNTHESIZED_PK)) {
                    return Err(OrmError::ReservedFieldName(table_name));
                }
                fields.push(
                    Field::auto_increment()
                        .primary_key()
                        .with_name(SYNTHESIZED_PK),
                );
                fields.len() - 1
            }
        };

        let schema = compile(&table_name, &fields)?;
        trace!("compiled schema for {table_name}: {schema}");

        Ok(TableDescriptor {
            table_name,
            fields,
            primary_key,
            schema,
        })
    }
}

/// Renders `CREATE TABLE IF NOT EXISTS <table> (<columns>[, <foreign keys>]);`.
pub fn compile(table_name: &str, fields: &[Field]) -> Result<String> {
    let mut definitions = fields
        .iter()
        .map(|f| f.compile_schema().map(String::from))
        .collect::<Result<Vec<_>>>()?;

    for field in fields {
        if let Some(clause) = field.foreign_key_clause()? {
            definitions.push(clause);
        }
    }

    Ok(format!(
        "CREATE TABLE IF NOT EXISTS {table_name} ({});",
        definitions.join(", ")
    ))
}

#[cfg(test)]
mod tests {
    use chrono::Local;

    use super::*;
    use crate::value::Value;

    #[test]
    fn test_create_simple_table() {
        let user = TableDescriptor::builder("User")
            .field("id", Field::auto_increment().primary_key())
            .field("username", Field::text().unique())
            .field("active", Field::boolean().default(true))
            .build()
            .unwrap();

        assert_eq!(
            user.schema(),
            "CREATE TABLE IF NOT EXISTS user (id INTEGER PRIMARY KEY AUTOINCREMENT, \
             username TEXT UNIQUE, active BOOLEAN DEFAULT TRUE);"
        );
        assert_eq!(user.primary_key().name(), Some("id"));
    }

    #[test]
    fn test_create_table_with_date() {
        let event = TableDescriptor::builder("Event")
            .field("id", Field::auto_increment().primary_key())
            .field("name", Field::text().unique())
            .field("event_date", Field::date().auto_today())
            .build()
            .unwrap();

        let today = Local::now().date_naive().format("%Y-%m-%d");
        assert_eq!(
            event.schema(),
            format!(
                "CREATE TABLE IF NOT EXISTS event (id INTEGER PRIMARY KEY AUTOINCREMENT, \
                 name TEXT UNIQUE, event_date TEXT DEFAULT '{today}');"
            )
        );
    }

    #[test]
    fn test_synthesized_primary_key() {
        let product = TableDescriptor::builder("Product")
            .field("name", Field::text().unique())
            .field("quantity", Field::integer().default(0))
            .build()
            .unwrap();

        let pk = product.primary_key();
        assert_eq!(pk.name(), Some("id"));
        assert!(pk.is_auto_increment());
        assert_eq!(product.fields().len(), 3);
        assert_eq!(
            product.fields().iter().filter(|f| f.is_primary_key()).count(),
            1
        );
        assert_eq!(
            product.schema(),
            "CREATE TABLE IF NOT EXISTS product (name TEXT UNIQUE, quantity INTEGER DEFAULT 0, \
             id INTEGER PRIMARY KEY AUTOINCREMENT);"
        );
    }

    #[test]
    fn test_explicit_primary_key_is_kept() {
        let tag = TableDescriptor::builder("Tag")
            .field("slug", Field::bounded_text(20).primary_key())
            .field("label", Field::text())
            .build()
            .unwrap();

        assert_eq!(tag.primary_key().name(), Some("slug"));
        assert!(tag.field("id").is_none());
        assert_eq!(
            tag.schema(),
            "CREATE TABLE IF NOT EXISTS tag (slug VARCHAR(20) PRIMARY KEY, label TEXT);"
        );
    }

    #[test]
    fn test_duplicate_primary_key_rejected() {
        let result = TableDescriptor::builder("Pair")
            .field("a", Field::integer().primary_key())
            .field("b", Field::integer().primary_key())
            .build();
        assert!(matches!(result, Err(OrmError::DuplicatePrimaryKey(_))));
    }

    #[test]
    fn test_duplicate_field_rejected() {
        let result = TableDescriptor::builder("Twice")
            .field("a", Field::integer())
            .field("a", Field::text())
            .build();
        assert!(matches!(result, Err(OrmError::DuplicateField { .. })));
    }

    #[test]
    fn test_unmarked_id_rejected() {
        let result = TableDescriptor::builder("Legacy")
            .field("id", Field::integer())
            .build();
        assert!(matches!(result, Err(OrmError::ReservedFieldName(_))));
    }

    #[test]
    fn test_invalid_default_rejected() {
        let result = TableDescriptor::builder("Broken")
            .field("count", Field::integer().default("many"))
            .build();
        assert!(matches!(result, Err(OrmError::Validation { .. })));
    }

    #[test]
    fn test_default_is_coerced() {
        let table = TableDescriptor::builder("Stock")
            .field("count", Field::integer().default("7"))
            .build()
            .unwrap();
        assert_eq!(
            table.field("count").unwrap().default_value(),
            &Value::Integer(7)
        );
        assert!(table.schema().contains("count INTEGER DEFAULT 7"));
    }
}
