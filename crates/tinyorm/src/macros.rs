//! Macros for building filter maps and table declarations.
//!
//! [`fields!`] builds an insertion-ordered [`crate::FieldMap`]; [`table!`]
//! declares a table with one `name: Field` entry per column.

/// Builds a [`crate::FieldMap`] from `key => value` pairs.
///
/// Keys are column names or lookup descriptors; values are anything
/// convertible into [`crate::Value`].
///
/// # Usage
///
/// ```ignore
/// use tinyorm::fields;
///
/// let filters = fields! { "age__gt" => 20, "username__icontains" => "user" };
/// let adults = users.objects().select(filters)?;
/// ```
#[macro_export]
macro_rules! fields {
    ($($key:expr => $value:expr),* $(,)?) => {{
        #[allow(unused_mut)]
        let mut map = $crate::FieldMap::new();
        $(
            map.insert(::std::string::String::from($key), $crate::Value::from($value));
        )*
        map
    }};
}

/// Declares a table and compiles its descriptor.
///
/// Column order follows the declaration order. The table name is the
/// lower-cased identifier.
///
/// # Syntax
///
/// ```ignore
/// let user = table!(User {
///     username: Field::bounded_text(50).unique(),
///     age: Field::integer(),
/// })?;
/// ```
///
/// This expands to:
///
/// ```ignore
/// TableDescriptor::builder("User")
///     .field("username", Field::bounded_text(50).unique())
///     .field("age", Field::integer())
///     .build()
/// ```
#[macro_export]
macro_rules! table {
    ($name:ident { $($field:ident : $decl:expr),* $(,)? }) => {
        $crate::TableDescriptor::builder(stringify!($name))
            $(.field(stringify!($field), $decl))*
            .build()
    };
}

#[cfg(test)]
mod tests {
    use crate::{Field, FieldMap, Value};

    #[test]
    fn test_fields_keeps_order() {
        let map = fields! { "b" => 2, "a" => "x", "c" => None::<i64> };
        let keys: Vec<&str> = map.keys().map(String::as_str).collect();
        assert_eq!(keys, vec!["b", "a", "c"]);
        assert_eq!(map["a"], Value::Text("x".into()));
        assert_eq!(map["c"], Value::Null);
    }

    #[test]
    fn test_fields_empty() {
        let map: FieldMap = fields! {};
        assert!(map.is_empty());
    }

    #[test]
    fn test_table_macro() {
        let descriptor = table!(Product {
            name: Field::text().unique(),
            quantity: Field::integer().default(0),
        })
        .unwrap();

        assert_eq!(descriptor.table_name(), "product");
        let columns: Vec<&str> = descriptor.column_names().collect();
        assert_eq!(columns, vec!["name", "quantity", "id"]);
    }
}
