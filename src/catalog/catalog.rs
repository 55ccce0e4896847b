//! In-memory catalog
//!
//! Holds table metadata for the normalizer and the DML synthesizer. Tables
//! keep their creation order so listings and persisted files are stable.

use super::schema::{ColumnMeta, TableMeta};
use super::types::DataType;
use super::CatalogLookup;
use crate::error::{Error, Result};
use indexmap::IndexMap;
use std::path::Path;
use tracing::debug;

/// Table metadata keyed by `schema.name` (or `name` when unqualified)
#[derive(Debug, Default, Clone)]
pub struct Catalog {
    tables: IndexMap<String, TableMeta>,
}

impl Catalog {
    /// Create a new empty catalog
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a table
    pub fn create_table(&mut self, table: TableMeta) -> Result<()> {
        let key = table.full_name();
        if self.tables.contains_key(&key) {
            return Err(Error::TableAlreadyExists(key));
        }
        for (i, column) in table.columns.iter().enumerate() {
            if table.columns[..i].iter().any(|c| c.name == column.name) {
                return Err(Error::ColumnAlreadyExists(column.name.clone(), key));
            }
        }
        debug!(table = %key, columns = table.columns.len(), "table registered");
        self.tables.insert(key, table);
        Ok(())
    }

    /// Get a table by `name` or `schema.name`
    pub fn get_table(&self, name: &str) -> Result<&TableMeta> {
        let (schema, table) = match name.split_once('.') {
            Some((s, t)) => (Some(s), t),
            None => (None, name),
        };
        self.find(schema, table)
            .ok_or_else(|| Error::TableNotFound(name.to_string()))
    }

    pub fn table_exists(&self, name: &str) -> bool {
        self.get_table(name).is_ok()
    }

    pub fn drop_table(&mut self, name: &str) -> Result<()> {
        let key = self.get_table(name)?.full_name();
        self.tables.shift_remove(&key);
        Ok(())
    }

    /// List all table names in creation order
    pub fn list_tables(&self) -> Vec<String> {
        self.tables.keys().cloned().collect()
    }

    /// Get table schema info as a formatted string (for .schema command)
    pub fn get_table_info(&self, name: &str) -> Result<String> {
        let table = self.get_table(name)?;
        let mut info = format!("Table: {}\n", table.full_name());
        info.push_str("Columns:\n");

        for col in &table.columns {
            let mut flags = Vec::new();
            if col.is_primary_key {
                flags.push("PRIMARY KEY");
            }
            if !col.nullable {
                flags.push("NOT NULL");
            }

            let flags_str = if flags.is_empty() {
                String::new()
            } else {
                format!(" [{}]", flags.join(", "))
            };

            info.push_str(&format!("  {} {}{}\n", col.name, col.type_name, flags_str));
        }

        Ok(info)
    }

    /// Save catalog to disk
    pub fn save_to_disk(&self, path: impl AsRef<Path>) -> Result<()> {
        let data = CatalogData {
            tables: self.tables.values().cloned().collect(),
        };
        let json = serde_json::to_string_pretty(&data)?;
        std::fs::write(path, json)?;
        Ok(())
    }

    /// Load catalog from disk
    pub fn load_from_disk(path: impl AsRef<Path>) -> Result<Self> {
        let json = std::fs::read_to_string(path)?;
        let data: CatalogData = serde_json::from_str(&json)?;

        let mut catalog = Self::new();
        for table in data.tables {
            catalog.create_table(table)?;
        }
        Ok(catalog)
    }

    fn find(&self, schema: Option<&str>, name: &str) -> Option<&TableMeta> {
        match schema {
            Some(schema) => self.tables.values().find(|t| {
                t.schema
                    .as_deref()
                    .is_some_and(|s| s.eq_ignore_ascii_case(schema))
                    && t.name.eq_ignore_ascii_case(name)
            }),
            None => {
                // An unqualified table wins over schema-qualified namesakes;
                // several qualified namesakes do not resolve.
                let mut candidates = self
                    .tables
                    .values()
                    .filter(|t| t.name.eq_ignore_ascii_case(name));
                let first = candidates.next()?;
                if first.schema.is_none() {
                    return Some(first);
                }
                let rest: Vec<&TableMeta> = candidates.collect();
                match rest.iter().find(|t| t.schema.is_none()) {
                    Some(unqualified) => Some(*unqualified),
                    None if rest.is_empty() => Some(first),
                    None => None,
                }
            }
        }
    }
}

impl CatalogLookup for Catalog {
    fn lookup_table(&self, schema: Option<&str>, name: &str) -> Option<TableMeta> {
        self.find(schema, name).cloned()
    }
}

/// Serializable proxy for Catalog
#[derive(serde::Serialize, serde::Deserialize)]
struct CatalogData {
    tables: Vec<TableMeta>,
}

/// Builder for creating tables with a fluent API
pub struct TableBuilder {
    table: TableMeta,
}

impl TableBuilder {
    /// Start building a new table
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            table: TableMeta::new(name),
        }
    }

    pub fn schema(mut self, schema: impl Into<String>) -> Self {
        self.table.schema = Some(schema.into());
        self
    }

    /// Add a nullable column
    pub fn column(mut self, name: impl Into<String>, data_type: DataType) -> Self {
        self.table
            .add_column(ColumnMeta::new(name, data_type.canonical_name()));
        self
    }

    /// Add a primary key column
    pub fn primary_key(mut self, name: impl Into<String>, data_type: DataType) -> Self {
        self.table
            .add_column(ColumnMeta::new(name, data_type.canonical_name()).primary_key(true));
        self
    }

    /// Add a NOT NULL column
    pub fn column_not_null(mut self, name: impl Into<String>, data_type: DataType) -> Self {
        self.table
            .add_column(ColumnMeta::new(name, data_type.canonical_name()).nullable(false));
        self
    }

    pub fn into_meta(self) -> TableMeta {
        self.table
    }

    /// Build the table in the catalog
    pub fn build(self, catalog: &mut Catalog) -> Result<()> {
        catalog.create_table(self.table)
    }
}
