//! INSERT, UPDATE and DELETE statement parts

use super::expr::Expr;
use super::select::TableName;
use super::Statement;

/// Row source of an INSERT
#[derive(Debug, Clone, PartialEq)]
pub enum ValuesOrSelect {
    /// `VALUES (..), (..)`
    Values(Vec<Vec<Expr>>),
    /// `INSERT .. SELECT`; holds a SELECT or COMPOUND statement
    Select(Box<Statement>),
    /// `DEFAULT VALUES`
    DefaultValues,
}

/// INSERT statement contents
#[derive(Debug, Clone, PartialEq)]
pub struct Insert {
    pub table: TableName,
    /// Target columns, empty for "all columns in table order"
    pub fields: Vec<String>,
    pub rows: ValuesOrSelect,
    /// Conflict resolution clause, e.g. `REPLACE`
    pub on_conflict: Option<String>,
}

impl Insert {
    pub fn new(table: impl Into<TableName>) -> Self {
        Self {
            table: table.into(),
            fields: Vec::new(),
            rows: ValuesOrSelect::Values(Vec::new()),
            on_conflict: None,
        }
    }

    /// Replace the target table, returning the previous one
    pub fn set_table(&mut self, table: impl Into<TableName>) -> TableName {
        std::mem::replace(&mut self.table, table.into())
    }

    pub fn add_field(&mut self, name: impl Into<String>) {
        self.fields.push(name.into());
    }

    /// Append a VALUES row; a SELECT or DEFAULT VALUES source is replaced
    pub fn add_row(&mut self, row: Vec<Expr>) {
        match &mut self.rows {
            ValuesOrSelect::Values(rows) => rows.push(row),
            other => *other = ValuesOrSelect::Values(vec![row]),
        }
    }

    pub fn values(&self) -> Option<&[Vec<Expr>]> {
        match &self.rows {
            ValuesOrSelect::Values(rows) => Some(rows),
            _ => None,
        }
    }
}

/// `column = value` in an UPDATE
#[derive(Debug, Clone, PartialEq)]
pub struct Assignment {
    pub column: String,
    pub value: Expr,
}

impl Assignment {
    pub fn new(column: impl Into<String>, value: Expr) -> Self {
        Self {
            column: column.into(),
            value,
        }
    }
}

/// UPDATE statement contents
#[derive(Debug, Clone, PartialEq)]
pub struct Update {
    pub table: TableName,
    pub assignments: Vec<Assignment>,
    pub where_: Option<Expr>,
}

impl Update {
    pub fn new(table: impl Into<TableName>) -> Self {
        Self {
            table: table.into(),
            assignments: Vec::new(),
            where_: None,
        }
    }

    pub fn set_table(&mut self, table: impl Into<TableName>) -> TableName {
        std::mem::replace(&mut self.table, table.into())
    }

    pub fn add_assignment(&mut self, column: impl Into<String>, value: Expr) {
        self.assignments.push(Assignment::new(column, value));
    }

    pub fn set_where(&mut self, cond: Option<Expr>) -> Option<Expr> {
        std::mem::replace(&mut self.where_, cond)
    }
}

/// DELETE statement contents
#[derive(Debug, Clone, PartialEq)]
pub struct Delete {
    pub table: TableName,
    pub where_: Option<Expr>,
}

impl Delete {
    pub fn new(table: impl Into<TableName>) -> Self {
        Self {
            table: table.into(),
            where_: None,
        }
    }

    pub fn set_table(&mut self, table: impl Into<TableName>) -> TableName {
        std::mem::replace(&mut self.table, table.into())
    }

    pub fn set_where(&mut self, cond: Option<Expr>) -> Option<Expr> {
        std::mem::replace(&mut self.where_, cond)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_add_row_replaces_default_values() {
        let mut insert = Insert::new("t");
        insert.rows = ValuesOrSelect::DefaultValues;
        insert.add_row(vec![Expr::value(1)]);
        assert_eq!(insert.values().map(|v| v.len()), Some(1));
    }

    #[test]
    fn test_set_table_returns_previous() {
        let mut delete = Delete::new("old");
        let previous = delete.set_table("new");
        assert_eq!(previous.name, "old");
        assert_eq!(delete.table.name, "new");
    }
}
