//! Catalog module
//!
//! Table, column and type metadata consumed read-only by the normalizer and
//! the DML synthesizer.

pub mod catalog;
pub mod schema;
pub mod types;

pub use catalog::{Catalog, TableBuilder};
pub use schema::{ColumnMeta, TableMeta};
pub use types::DataType;

/// Read-only metadata lookups
///
/// Implementations may block (a cache miss can query a live database); the
/// passes call them synchronously.
pub trait CatalogLookup {
    /// Find a table, optionally restricted to a schema
    fn lookup_table(&self, schema: Option<&str>, name: &str) -> Option<TableMeta>;

    /// Resolve a type name to a concrete type
    fn lookup_type(&self, name: &str) -> Option<DataType> {
        DataType::from_name(name)
    }
}
