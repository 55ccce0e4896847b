//! DML synthesizer
//!
//! Derives the INSERT, UPDATE and DELETE statements that write back a row
//! of a single-table SELECT. Placeholders are named after the position of
//! the selected field they stand for: `+n` carries the new value of field
//! `n`, `-n` the value it had when the row was read.

use crate::catalog::{CatalogLookup, ColumnMeta, TableMeta};
use crate::error::{Error, Result};
use crate::normalize::normalize;
use crate::stmt::{
    identifiers_match, unquote_identifier, Contents, Delete, Expr, Insert, NodePath, Operator,
    ParamSpec, Select, SelectField, Statement, StatementKind, TableName, Target, TargetSource,
    Update,
};
use tracing::{debug, trace};

/// Which statements to derive, and how
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DmlRequest {
    pub insert: bool,
    pub update: bool,
    pub delete: bool,
    /// Only identify rows by primary key
    pub require_pk: bool,
    /// Restrict INSERT/UPDATE to these selected columns
    pub columns: Option<Vec<String>>,
}

impl DmlRequest {
    pub fn all() -> Self {
        Self {
            insert: true,
            update: true,
            delete: true,
            ..Self::default()
        }
    }

    pub fn insert_only() -> Self {
        Self {
            insert: true,
            ..Self::default()
        }
    }

    pub fn update_only() -> Self {
        Self {
            update: true,
            ..Self::default()
        }
    }

    pub fn delete_only() -> Self {
        Self {
            delete: true,
            ..Self::default()
        }
    }

    pub fn require_pk(mut self, require_pk: bool) -> Self {
        self.require_pk = require_pk;
        self
    }

    pub fn restrict_to<I, S>(mut self, columns: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.columns = Some(columns.into_iter().map(Into::into).collect());
        self
    }
}

/// Derived statements; only the requested ones are present
///
/// Each statement succeeds or fails on its own: an UPDATE that has nothing
/// left to assign does not take the INSERT and DELETE down with it.
#[derive(Debug, Default)]
pub struct DmlStatements {
    pub insert: Option<Result<Statement>>,
    pub update: Option<Result<Statement>>,
    pub delete: Option<Result<Statement>>,
}

impl DmlStatements {
    fn slots(&self) -> [(StatementKind, &Option<Result<Statement>>); 3] {
        [
            (StatementKind::Insert, &self.insert),
            (StatementKind::Update, &self.update),
            (StatementKind::Delete, &self.delete),
        ]
    }

    /// The statements that could be derived, in INSERT, UPDATE, DELETE order
    pub fn statements(&self) -> Vec<&Statement> {
        self.slots()
            .into_iter()
            .filter_map(|(_, slot)| slot.as_ref()?.as_ref().ok())
            .collect()
    }

    /// Requested statements that could not be derived, with the reason
    pub fn failures(&self) -> Vec<(StatementKind, &Error)> {
        self.slots()
            .into_iter()
            .filter_map(|(kind, slot)| slot.as_ref()?.as_ref().err().map(|e| (kind, e)))
            .collect()
    }
}

/// A selected field that reads a column of the modified table
struct WritableField<'m> {
    index: usize,
    column: &'m ColumnMeta,
}

/// Derive DML statements from a SELECT
///
/// The SELECT is normalized first; it must read a single table and must not
/// aggregate.
pub fn compute_dml(
    select_stmt: &Statement,
    catalog: &dyn CatalogLookup,
    request: &DmlRequest,
) -> Result<DmlStatements> {
    debug!(kind = %select_stmt.kind(), ?request, "computing DML statements");
    let root = NodePath::root().child("contents");

    let select = match &select_stmt.contents {
        Contents::Select(select) => select,
        _ => {
            return Err(Error::unsupported(
                &NodePath::root(),
                format!(
                    "can only derive DML from a SELECT, got {}",
                    select_stmt.kind()
                ),
            ))
        }
    };
    check_select_shape(select, &root)?;

    let normalized = normalize(select_stmt, catalog)?;
    let select = normalized
        .as_select()
        .ok_or_else(|| Error::Internal("normalization changed the statement kind".to_string()))?;
    let (target, table) = single_table(select, &root)?;
    let meta = catalog
        .lookup_table(table.schema.as_deref(), &unquote_identifier(&table.name))
        .ok_or_else(|| {
            Error::missing(
                &root.child("from").child("targets").index(0),
                format!("table '{}' not found", table),
            )
        })?;

    let writable = writable_fields(select, target, &meta, request.columns.as_deref(), &root)?;

    let mut result = DmlStatements::default();

    if request.insert {
        result.insert = Some(insert_statement(table, &writable, &root));
    }

    // a missing row key only fails the statements that need one
    let condition = || row_condition(select, target, &meta, request.require_pk, &root);

    if request.update {
        result.update = Some(condition().and_then(|(condition, key)| {
            update_statement(table, &writable, condition, key, &root)
        }));
    }

    if request.delete {
        result.delete = Some(condition().map(|(condition, _)| {
            let mut delete = Delete::new(table.clone());
            delete.where_ = Some(condition);
            Statement::delete(delete)
        }));
    }

    for (kind, error) in result.failures() {
        debug!(%kind, %error, "statement not derived");
    }
    Ok(result)
}

fn insert_statement(
    table: &TableName,
    writable: &[WritableField<'_>],
    path: &NodePath,
) -> Result<Statement> {
    if writable.is_empty() {
        return Err(Error::unsupported(
            &path.child("fields"),
            "could not compute any field to insert into",
        ));
    }
    let mut insert = Insert::new(table.clone());
    insert.fields = writable.iter().map(|f| f.column.name.clone()).collect();
    insert.add_row(writable.iter().map(new_value).collect());
    Ok(Statement::insert(insert))
}

fn update_statement(
    table: &TableName,
    writable: &[WritableField<'_>],
    condition: Expr,
    key: KeyKind,
    path: &NodePath,
) -> Result<Statement> {
    let mut update = Update::new(table.clone());
    for field in writable {
        // key columns identify the row and are not rewritten
        if key == KeyKind::PrimaryKey && field.column.is_primary_key {
            continue;
        }
        update.add_assignment(field.column.name.clone(), new_value(field));
    }
    if update.assignments.is_empty() {
        return Err(Error::unsupported(
            &path.child("fields"),
            "no selected column can be updated",
        ));
    }
    update.where_ = Some(condition);
    Ok(Statement::update(update))
}

/// SELECT reading back the rows an UPDATE modifies
///
/// The result reads every column (`SELECT *`) of the updated table under the
/// UPDATE's condition; an UPDATE without WHERE gives a SELECT without WHERE.
pub fn compute_select_from_update(update_stmt: &Statement) -> Result<Statement> {
    let root = NodePath::root().child("contents");
    let Contents::Update(update) = &update_stmt.contents else {
        return Err(Error::unsupported(
            &NodePath::root(),
            format!("expected an UPDATE statement, got {}", update_stmt.kind()),
        ));
    };
    if update.table.name.is_empty() {
        return Err(Error::structure(
            &root.child("table"),
            "missing table name in UPDATE statement",
        ));
    }

    let mut select = Select::new();
    select.add_field(SelectField::new(Expr::column("*")));
    select.add_target(Target::table(update.table.clone()));
    select.where_ = update.where_.clone();
    debug!(table = %update.table, "select computed from update");
    Ok(Statement::select(select))
}

/// WHERE condition matching one row of a SELECT's result
///
/// Uses the primary key when all its columns are selected. Otherwise, unless
/// `require_pk` is set, every selected column of the table becomes part of a
/// composite match key. The SELECT must already be normalized.
pub fn compute_unique_row_condition(
    select: &Select,
    table: &TableMeta,
    require_pk: bool,
) -> Result<Expr> {
    let root = NodePath::root().child("contents");
    let (target, _) = single_table(select, &root)?;
    row_condition(select, target, table, require_pk, &root).map(|(cond, _)| cond)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum KeyKind {
    PrimaryKey,
    AllColumns,
}

fn row_condition(
    select: &Select,
    target: &Target,
    meta: &TableMeta,
    require_pk: bool,
    path: &NodePath,
) -> Result<(Expr, KeyKind)> {
    let pk_columns = meta.primary_key_columns();

    let pk_fields: Option<Vec<WritableField<'_>>> = if pk_columns.is_empty() {
        None
    } else {
        pk_columns
            .iter()
            .map(|column| {
                field_index(select, target, &column.name).map(|index| WritableField {
                    index,
                    column: *column,
                })
            })
            .collect()
    };

    let (fields, kind) = match pk_fields {
        Some(fields) => (fields, KeyKind::PrimaryKey),
        None if require_pk => {
            let message = if pk_columns.is_empty() {
                format!("table '{}' does not have any primary key", meta.name)
            } else {
                format!("primary key of table '{}' is not part of SELECT", meta.name)
            };
            return Err(Error::unsupported(path, message));
        }
        None => {
            let fields = writable_fields(select, target, meta, None, path)?;
            if fields.is_empty() {
                return Err(Error::unsupported(
                    &path.child("fields"),
                    format!("no column of table '{}' is part of SELECT", meta.name),
                ));
            }
            (fields, KeyKind::AllColumns)
        }
    };
    trace!(table = %meta.name, ?kind, columns = fields.len(), "row condition key");

    let mut operands: Vec<Expr> = fields
        .iter()
        .map(|field| Expr::Operation {
            op: Operator::Eq,
            operands: vec![Expr::column(field.column.name.clone()), old_value(field)],
        })
        .collect();

    let condition = if operands.len() == 1 {
        operands.remove(0)
    } else {
        Expr::Operation {
            op: Operator::And,
            operands,
        }
    };
    Ok((condition, kind))
}

fn check_select_shape(select: &Select, path: &NodePath) -> Result<()> {
    let from = select
        .from
        .as_ref()
        .ok_or_else(|| Error::unsupported(path, "SELECT statement has no FROM part"))?;
    if from.targets.len() != 1 || !from.joins.is_empty() {
        return Err(Error::unsupported(
            &path.child("from"),
            "SELECT statement involves more than one table or expression",
        ));
    }
    if select.is_aggregate() || select.distinct {
        return Err(Error::unsupported(
            path,
            "cannot derive DML from an aggregating or DISTINCT SELECT",
        ));
    }
    Ok(())
}

fn single_table<'s>(select: &'s Select, path: &NodePath) -> Result<(&'s Target, &'s TableName)> {
    check_select_shape(select, path)?;
    let target = select
        .from
        .as_ref()
        .and_then(|from| from.targets.first())
        .ok_or_else(|| Error::unsupported(path, "SELECT statement has no FROM part"))?;
    match &target.source {
        TargetSource::Table(table) => Ok((target, table)),
        TargetSource::Subselect(_) => Err(Error::unsupported(
            &path.child("from").child("targets").index(0),
            "SELECT statement involves more than one table or expression",
        )),
    }
}

/// Position of the first selected field reading `column` of `target`
fn field_index(select: &Select, target: &Target, column: &str) -> Option<usize> {
    select.fields.iter().position(|field| match &field.expr {
        Expr::Column(c) => {
            identifiers_match(&c.column, column)
                && c.table.as_deref().map_or(true, |q| target.answers_to(q))
        }
        _ => false,
    })
}

/// Selected fields that are plain columns of the table, first occurrence only
fn writable_fields<'m>(
    select: &Select,
    target: &Target,
    meta: &'m TableMeta,
    restrict: Option<&[String]>,
    path: &NodePath,
) -> Result<Vec<WritableField<'m>>> {
    if let Some(columns) = restrict {
        for (i, name) in columns.iter().enumerate() {
            if meta.column(&unquote_identifier(name)).is_none() {
                return Err(Error::missing(
                    &path.child("fields").index(i),
                    format!("column '{}' not found in table '{}'", name, meta.name),
                ));
            }
        }
    }

    let mut fields: Vec<WritableField<'m>> = Vec::new();
    for (index, field) in select.fields.iter().enumerate() {
        let column = match &field.expr {
            Expr::Column(c) if !c.is_star() => c,
            _ => continue,
        };
        if let Some(qualifier) = &column.table {
            if !target.answers_to(qualifier) {
                continue;
            }
        }
        let Some(meta_column) = meta.column(&unquote_identifier(&column.column)) else {
            continue;
        };
        if fields.iter().any(|f| f.column.name == meta_column.name) {
            continue;
        }
        if let Some(columns) = restrict {
            if !columns
                .iter()
                .any(|c| identifiers_match(c, &meta_column.name))
            {
                continue;
            }
        }
        fields.push(WritableField {
            index,
            column: meta_column,
        });
    }
    Ok(fields)
}

fn column_param(name: String, column: &ColumnMeta) -> Expr {
    let spec = ParamSpec {
        name,
        description: None,
        declared_type: column.type_name.clone(),
        resolved_type: column.data_type(),
        nullable: column.nullable,
    };
    Expr::Placeholder(spec)
}

fn new_value(field: &WritableField<'_>) -> Expr {
    column_param(format!("+{}", field.index), field.column)
}

fn old_value(field: &WritableField<'_>) -> Expr {
    column_param(format!("-{}", field.index), field.column)
}
