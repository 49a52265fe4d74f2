//! A small object-relational mapper over SQLite.
//!
//! Tables are declared with [`TableDescriptor::builder`] (or [`table!`]),
//! bound to a [`Database`] with [`Database::register_table`], and queried
//! through [`Queryset`] using `column__op` filter descriptors.
//!
//! ```ignore
//! use tinyorm::{fields, table, Database, Field};
//!
//! let db = Database::open_in_memory()?;
//! let user = db.register_table(table!(User {
//!     username: Field::bounded_text(50),
//!     age: Field::integer(),
//! })?)?;
//!
//! user.create(fields! { "username" => "User1", "age" => 30 })?;
//! let adults = user.objects().select(fields! { "age__ge" => 18 })?;
//! ```

pub mod codec;
pub mod config;
pub mod database;
pub mod error;
pub mod field;
pub mod lookup;
pub mod macros;
pub mod queryset;
pub mod record;
pub mod schema;
pub mod statement;
pub mod table;
pub mod value;

pub use config::DatabaseConfig;
pub use database::{Database, Rows};
pub use error::{OrmError, Result};
pub use field::{Field, FieldKind, ForeignKey, NativeType, OnDelete};
pub use lookup::{Lookup, LookupOp};
pub use queryset::Queryset;
pub use record::Record;
pub use schema::{TableBuilder, TableDescriptor};
pub use statement::Aggregate;
pub use table::Table;
pub use value::{FieldMap, FromValue, Value};
