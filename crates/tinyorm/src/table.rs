use std::{fmt, sync::Arc};

use crate::{
    database::Database,
    error::Result,
    field::Field,
    queryset::Queryset,
    record::Record,
    schema::TableDescriptor,
    value::FieldMap,
};

struct TableInner {
    descriptor: TableDescriptor,
    db: Database,
}

/// A table descriptor bound to a database handle.
///
/// Obtained from [`Database::register_table`]. Cloning shares the same
/// descriptor and connection.
#[derive(Clone)]
pub struct Table {
    inner: Arc<TableInner>,
}

impl Table {
    pub(crate) fn new(descriptor: TableDescriptor, db: Database) -> Self {
        Self {
            inner: Arc::new(TableInner { descriptor, db }),
        }
    }

    pub fn name(&self) -> &str {
        self.inner.descriptor.table_name()
    }

    pub fn descriptor(&self) -> &TableDescriptor {
        &self.inner.descriptor
    }

    pub fn fields(&self) -> &[Field] {
        self.inner.descriptor.fields()
    }

    pub fn field(&self, name: &str) -> Option<&Field> {
        self.inner.descriptor.field(name)
    }

    pub fn primary_key(&self) -> &Field {
        self.inner.descriptor.primary_key()
    }

    pub fn schema(&self) -> &str {
        self.inner.descriptor.schema()
    }

    pub fn database(&self) -> &Database {
        &self.inner.db
    }

    /// A fresh, unexecuted queryset over this table.
    pub fn objects(&self) -> Queryset {
        Queryset::new(self.clone())
    }

    /// Inserts one row and returns the record read back for it.
    pub fn create(&self, fields: FieldMap) -> Result<Option<Record>> {
        Ok(self.objects().insert(fields)?.into_records().pop())
    }
}

impl fmt::Debug for Table {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Table")
            .field("name", &self.name())
            .field("schema", &self.schema())
            .finish()
    }
}
