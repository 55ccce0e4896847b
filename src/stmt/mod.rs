//! Statement tree model
//!
//! A [`Statement`] owns its whole tree. Nodes keep no reference to their
//! parent; passes that need the parent context receive it as an argument
//! while they walk the tree (see [`visit`]), together with a [`NodePath`]
//! naming the node for error reports.
//!
//! The statement kind is derived from the active [`Contents`] variant, so the
//! two can never disagree. Passes that transform a statement work on a clone
//! and leave their input untouched.

pub mod builder;
pub mod expr;
pub mod modify;
pub mod param;
pub mod path;
pub mod select;
pub mod visit;

pub use expr::{Arity, CaseArm, CaseExpr, ColumnRef, Expr, Literal, Operator};
pub use modify::{Assignment, Delete, Insert, Update, ValuesOrSelect};
pub use param::{parse_keyword_spec, parse_param_spec, Param, ParamSet, ParamSpec, ParamValue};
pub use path::{NodePath, PathSegment};
pub use select::{
    identifiers_match, unquote_identifier, Compound, CompoundOp, FromClause, Join, JoinKind,
    OrderItem, Select, SelectField, TableName, Target, TargetSource,
};

use crate::error::{Error, Result};
use std::fmt;

/// Statement kind
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StatementKind {
    Select,
    Insert,
    Update,
    Delete,
    Compound,
    Begin,
    Commit,
    Rollback,
    Savepoint,
    RollbackSavepoint,
    DeleteSavepoint,
}

impl StatementKind {
    /// Name used as `stmt_type` in the JSON form
    pub fn as_str(&self) -> &'static str {
        match self {
            StatementKind::Select => "SELECT",
            StatementKind::Insert => "INSERT",
            StatementKind::Update => "UPDATE",
            StatementKind::Delete => "DELETE",
            StatementKind::Compound => "COMPOUND",
            StatementKind::Begin => "BEGIN",
            StatementKind::Commit => "COMMIT",
            StatementKind::Rollback => "ROLLBACK",
            StatementKind::Savepoint => "SAVEPOINT",
            StatementKind::RollbackSavepoint => "ROLLBACK_SAVEPOINT",
            StatementKind::DeleteSavepoint => "DELETE_SAVEPOINT",
        }
    }
}

impl fmt::Display for StatementKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Transaction isolation level
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IsolationLevel {
    ReadUncommitted,
    ReadCommitted,
    RepeatableRead,
    Serializable,
}

impl IsolationLevel {
    pub fn as_str(&self) -> &'static str {
        match self {
            IsolationLevel::ReadUncommitted => "READ UNCOMMITTED",
            IsolationLevel::ReadCommitted => "READ COMMITTED",
            IsolationLevel::RepeatableRead => "REPEATABLE READ",
            IsolationLevel::Serializable => "SERIALIZABLE",
        }
    }
}

/// Payload of the transaction-control kinds
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Transaction {
    /// Transaction or savepoint name
    pub name: Option<String>,
    pub isolation: Option<IsolationLevel>,
}

impl Transaction {
    pub fn named(name: impl Into<String>) -> Self {
        Self {
            name: Some(name.into()),
            isolation: None,
        }
    }
}

/// Statement contents, one variant per kind
#[derive(Debug, Clone, PartialEq)]
pub enum Contents {
    Select(Select),
    Insert(Insert),
    Update(Update),
    Delete(Delete),
    Compound(Compound),
    Begin(Transaction),
    Commit(Transaction),
    Rollback(Transaction),
    Savepoint(Transaction),
    RollbackSavepoint(Transaction),
    DeleteSavepoint(Transaction),
}

impl Contents {
    pub fn kind(&self) -> StatementKind {
        match self {
            Contents::Select(_) => StatementKind::Select,
            Contents::Insert(_) => StatementKind::Insert,
            Contents::Update(_) => StatementKind::Update,
            Contents::Delete(_) => StatementKind::Delete,
            Contents::Compound(_) => StatementKind::Compound,
            Contents::Begin(_) => StatementKind::Begin,
            Contents::Commit(_) => StatementKind::Commit,
            Contents::Rollback(_) => StatementKind::Rollback,
            Contents::Savepoint(_) => StatementKind::Savepoint,
            Contents::RollbackSavepoint(_) => StatementKind::RollbackSavepoint,
            Contents::DeleteSavepoint(_) => StatementKind::DeleteSavepoint,
        }
    }
}

/// Root of a statement tree
#[derive(Debug, Clone, PartialEq)]
pub struct Statement {
    pub contents: Contents,
    /// SQL text the statement was parsed from
    pub source_sql: Option<String>,
}

impl Statement {
    pub fn new(contents: Contents) -> Self {
        Self {
            contents,
            source_sql: None,
        }
    }

    pub fn select(select: Select) -> Self {
        Self::new(Contents::Select(select))
    }

    pub fn insert(insert: Insert) -> Self {
        Self::new(Contents::Insert(insert))
    }

    pub fn update(update: Update) -> Self {
        Self::new(Contents::Update(update))
    }

    pub fn delete(delete: Delete) -> Self {
        Self::new(Contents::Delete(delete))
    }

    pub fn compound(compound: Compound) -> Self {
        Self::new(Contents::Compound(compound))
    }

    pub fn with_sql(mut self, sql: impl Into<String>) -> Self {
        self.source_sql = Some(sql.into());
        self
    }

    pub fn kind(&self) -> StatementKind {
        self.contents.kind()
    }

    pub fn as_select(&self) -> Option<&Select> {
        match &self.contents {
            Contents::Select(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_select_mut(&mut self) -> Option<&mut Select> {
        match &mut self.contents {
            Contents::Select(s) => Some(s),
            _ => None,
        }
    }

    /// Number of output columns for SELECT/COMPOUND, when known
    pub fn output_width(&self) -> Option<usize> {
        match &self.contents {
            Contents::Select(s) => s.output_width(),
            Contents::Compound(c) => c.output_width(),
            _ => None,
        }
    }

    /// Whether the statement can appear as a sub-select
    pub fn is_query(&self) -> bool {
        matches!(self.contents, Contents::Select(_) | Contents::Compound(_))
    }

    /// Replace the modified table of an INSERT, UPDATE or DELETE
    pub fn set_table(&mut self, table: impl Into<TableName>) -> Result<TableName> {
        match &mut self.contents {
            Contents::Insert(i) => Ok(i.set_table(table)),
            Contents::Update(u) => Ok(u.set_table(table)),
            Contents::Delete(d) => Ok(d.set_table(table)),
            _ => Err(Error::structure(
                &NodePath::root().child("contents"),
                format!("{} statement has no target table", self.kind()),
            )),
        }
    }

    /// Replace the WHERE condition of a SELECT, UPDATE or DELETE
    pub fn set_where(&mut self, cond: Option<Expr>) -> Result<Option<Expr>> {
        match &mut self.contents {
            Contents::Select(s) => Ok(s.set_where(cond)),
            Contents::Update(u) => Ok(u.set_where(cond)),
            Contents::Delete(d) => Ok(d.set_where(cond)),
            _ => Err(Error::structure(
                &NodePath::root().child("contents"),
                format!("{} statement has no WHERE clause", self.kind()),
            )),
        }
    }

    /// Parameters referenced by the statement
    pub fn params(&self) -> Result<ParamSet> {
        ParamSet::from_statement(self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_kind_follows_contents() {
        let stmt = Statement::delete(Delete::new("t"));
        assert_eq!(stmt.kind(), StatementKind::Delete);
        assert_eq!(stmt.kind().as_str(), "DELETE");

        let stmt = Statement::new(Contents::RollbackSavepoint(Transaction::named("sp")));
        assert_eq!(stmt.kind().as_str(), "ROLLBACK_SAVEPOINT");
    }

    #[test]
    fn test_clone_is_independent() {
        let mut select = Select::new();
        select.add_target(Target::table("t"));
        select.set_where(Some(Expr::value(1)));
        let original = Statement::select(select);

        let mut copy = original.clone();
        copy.set_where(None).unwrap();
        copy.as_select_mut().unwrap().add_target(Target::table("u"));

        let select = original.as_select().unwrap();
        assert!(select.where_.is_some());
        assert_eq!(select.from.as_ref().unwrap().targets.len(), 1);
    }

    #[test]
    fn test_set_table_on_select_fails() {
        let mut stmt = Statement::select(Select::new());
        assert!(stmt.set_table("t").is_err());

        let mut stmt = Statement::update(Update::new("a"));
        let old = stmt.set_table("b").unwrap();
        assert_eq!(old.name, "a");
    }
}
