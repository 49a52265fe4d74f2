use std::fmt;

use crate::{
    error::Result,
    fields,
    queryset::Queryset,
    table::Table,
    value::{self, FieldMap, FromValue, Value},
};

/// One materialized row of a table.
///
/// Attributes can be changed with [`Record::set`] and written back with
/// [`Record::save`]. The primary key is fixed when the record is built.
#[derive(Clone)]
pub struct Record {
    table: Table,
    attrs: FieldMap,
    pk: Value,
}

impl Record {
    pub(crate) fn new(table: Table, attrs: FieldMap) -> Self {
        let pk_field = table.primary_key();
        let pk = attrs
            .get(pk_field.column())
            .cloned()
            .unwrap_or_else(|| pk_field.default_value().clone());
        Self { table, attrs, pk }
    }

    pub fn table(&self) -> &Table {
        &self.table
    }

    /// The primary key value captured when the record was built.
    pub fn pk(&self) -> &Value {
        &self.pk
    }

    /// The current attribute map, including changes made with [`Record::set`].
    pub fn attrs(&self) -> &FieldMap {
        &self.attrs
    }

    pub fn get(&self, name: &str) -> Option<&Value> {
        self.attrs.get(name)
    }

    /// Reads an attribute as `T`.
    ///
    /// # Errors
    ///
    /// - [`crate::OrmError::UnknownField`] if the table has no such column
    /// - [`crate::OrmError::TypeMismatch`] if the stored value is not a `T`
    pub fn get_as<T: FromValue>(&self, name: &str) -> Result<T> {
        let Some(value) = self.attrs.get(name) else {
            self.table.descriptor().require_field(name)?;
            let null = Value::Null;
            return T::from_value(&null).ok_or_else(|| value::type_mismatch::<T>(name, &null));
        };
        T::from_value(value).ok_or_else(|| value::type_mismatch::<T>(name, value))
    }

    /// Changes an attribute in memory. Nothing is written until [`Record::save`].
    pub fn set(&mut self, name: &str, value: impl Into<Value>) -> Result<()> {
        self.table.descriptor().require_field(name)?;
        self.attrs.insert(name.to_string(), value.into());
        Ok(())
    }

    fn pk_filter(&self) -> FieldMap {
        fields! { self.table.primary_key().column() => self.pk.clone() }
    }

    /// Writes the attributes back.
    ///
    /// Updates the row with this record's primary key, or inserts one when
    /// no such row exists.
    pub fn save(&self) -> Result<Queryset> {
        let objects = self.table.objects();
        let existing = objects.select(self.pk_filter())?;
        if existing.is_empty() {
            objects.insert(self.attrs.clone())
        } else {
            objects.update(self.attrs.clone(), self.pk_filter())
        }
    }

    /// Deletes the row with this record's primary key.
    pub fn delete(&self) -> Result<Queryset> {
        self.table.objects().delete(self.pk_filter())
    }
}

impl PartialEq for Record {
    fn eq(&self, other: &Self) -> bool {
        self.table.name() == other.table.name() && self.attrs == other.attrs
    }
}

impl fmt::Debug for Record {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Record")
            .field("table", &self.table.name())
            .field("attrs", &self.attrs)
            .finish()
    }
}

impl fmt::Display for Record {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Record(table={}, pk={})", self.table.name(), self.pk)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{Database, Field, OrmError, TableDescriptor};

    fn setup_db() -> Table {
        let db = Database::open_in_memory().unwrap();
        let user = TableDescriptor::builder("User")
            .field("username", Field::text().unique())
            .field("age", Field::integer())
            .field("active", Field::boolean().default(true))
            .build()
            .unwrap();
        db.register_table(user).unwrap()
    }

    #[test]
    fn test_created_record() {
        let user = setup_db();
        let record = user
            .create(fields! { "username" => "testuser", "age" => 30 })
            .unwrap()
            .unwrap();

        assert_eq!(record.pk(), &Value::Integer(1));
        assert!(record.get_as::<bool>("active").unwrap());
        assert_eq!(record.get_as::<String>("username").unwrap(), "testuser");
        assert_eq!(record.to_string(), "Record(table=user, pk=1)");

        let keys: Vec<&str> = record.attrs().keys().map(String::as_str).collect();
        assert_eq!(keys, vec!["username", "age", "active", "id"]);
    }

    #[test]
    fn test_typed_access_errors() {
        let user = setup_db();
        let record = user
            .create(fields! { "username" => "a", "age" => 1 })
            .unwrap()
            .unwrap();

        assert!(matches!(
            record.get_as::<String>("age"),
            Err(OrmError::TypeMismatch { .. })
        ));
        assert!(matches!(
            record.get_as::<i64>("height"),
            Err(OrmError::UnknownField { .. })
        ));
        assert_eq!(record.get_as::<Option<i64>>("age").unwrap(), Some(1));
    }

    #[test]
    fn test_set_and_save_updates() {
        let user = setup_db();
        let mut record = user
            .create(fields! { "username" => "John", "age" => 30 })
            .unwrap()
            .unwrap();

        record.set("age", 31).unwrap();
        assert_eq!(record.attrs()["age"], Value::Integer(31));
        assert!(record.set("height", 180).is_err());

        let saved = record.save().unwrap();
        assert!(saved.statement().starts_with("UPDATE user SET"));
        assert!(saved.statement().ends_with("WHERE id = 1;"));

        let reloaded = user.objects().select(fields! { "id" => 1 }).unwrap();
        assert_eq!(reloaded[0].get_as::<i64>("age").unwrap(), 31);
        assert_eq!(user.objects().count(fields! {}).unwrap(), 1);
    }

    #[test]
    fn test_save_after_delete_inserts() {
        let user = setup_db();
        let record = user
            .create(fields! { "username" => "ghost", "age" => 99 })
            .unwrap()
            .unwrap();

        let deleted = record.delete().unwrap();
        assert_eq!(deleted.statement(), "DELETE FROM user WHERE id = 1;");
        assert_eq!(deleted.rows_affected(), 1);
        assert_eq!(user.objects().count(fields! {}).unwrap(), 0);

        let saved = record.save().unwrap();
        assert!(saved.statement().starts_with("INSERT INTO user"));
        assert_eq!(saved[0], record);
    }
}
