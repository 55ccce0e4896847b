//! Table and column metadata handed out by a catalog

use super::types::DataType;
use serde::{Deserialize, Serialize};

/// Column metadata
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ColumnMeta {
    pub name: String,
    /// Type name as the catalog spells it
    pub type_name: String,
    #[serde(default)]
    pub is_primary_key: bool,
    #[serde(default = "default_nullable")]
    pub nullable: bool,
}

fn default_nullable() -> bool {
    true
}

impl ColumnMeta {
    /// Create a nullable, non-key column
    pub fn new(name: impl Into<String>, type_name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            type_name: type_name.into(),
            is_primary_key: false,
            nullable: true,
        }
    }

    pub fn nullable(mut self, nullable: bool) -> Self {
        self.nullable = nullable;
        self
    }

    /// Mark as part of the primary key; key columns are never nullable
    pub fn primary_key(mut self, pk: bool) -> Self {
        self.is_primary_key = pk;
        if pk {
            self.nullable = false;
        }
        self
    }

    pub fn data_type(&self) -> Option<DataType> {
        DataType::from_name(&self.type_name)
    }
}

/// Table metadata: columns in table order
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TableMeta {
    #[serde(default)]
    pub schema: Option<String>,
    pub name: String,
    pub columns: Vec<ColumnMeta>,
}

impl TableMeta {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            schema: None,
            name: name.into(),
            columns: Vec::new(),
        }
    }

    pub fn with_schema(mut self, schema: impl Into<String>) -> Self {
        self.schema = Some(schema.into());
        self
    }

    pub fn add_column(&mut self, column: ColumnMeta) {
        self.columns.push(column);
    }

    /// Look a column up; unquoted SQL names compare case-insensitively
    pub fn column(&self, name: &str) -> Option<&ColumnMeta> {
        self.columns
            .iter()
            .find(|c| c.name == name)
            .or_else(|| self.columns.iter().find(|c| c.name.eq_ignore_ascii_case(name)))
    }

    pub fn has_column(&self, name: &str) -> bool {
        self.column(name).is_some()
    }

    pub fn primary_key_columns(&self) -> Vec<&ColumnMeta> {
        self.columns.iter().filter(|c| c.is_primary_key).collect()
    }

    pub fn has_primary_key(&self) -> bool {
        self.columns.iter().any(|c| c.is_primary_key)
    }

    pub fn column_names(&self) -> Vec<&str> {
        self.columns.iter().map(|c| c.name.as_str()).collect()
    }

    /// `schema.name`, or the bare name for an unqualified table
    pub fn full_name(&self) -> String {
        match &self.schema {
            Some(schema) => format!("{}.{}", schema, self.name),
            None => self.name.clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_table_meta() {
        let mut table = TableMeta::new("users").with_schema("public");
        table.add_column(ColumnMeta::new("id", "int").primary_key(true));
        table.add_column(ColumnMeta::new("Name", "varchar(100)").nullable(false));
        table.add_column(ColumnMeta::new("email", "varchar(255)"));

        assert_eq!(table.columns.len(), 3);
        assert_eq!(table.full_name(), "public.users");
        assert!(table.has_column("name"));
        assert!(!table.has_column("unknown"));

        let id = table.column("id").unwrap();
        assert!(id.is_primary_key);
        assert!(!id.nullable);
        assert_eq!(id.data_type(), Some(DataType::Integer));
        assert_eq!(table.primary_key_columns().len(), 1);
    }

    #[test]
    fn test_column_meta_defaults_from_json() {
        let column: ColumnMeta =
            serde_json::from_str(r#"{"name":"a","type_name":"text"}"#).unwrap();
        assert!(column.nullable);
        assert!(!column.is_primary_key);
    }
}
