//! Structural validator
//!
//! Checks each statement kind's invariants depth-first. A node that breaks
//! one of its own rules is reported once and its children are not looked at.
//! In [`ValidationMode::FailFast`] the first error is returned; in
//! [`ValidationMode::CollectAll`] one error per failing node is gathered.

use crate::error::{Error, Result};
use crate::functions;
use crate::stmt::{
    Contents, Expr, FromClause, JoinKind, NodePath, Select, Statement, TableName, TargetSource,
    Transaction, ValuesOrSelect,
};
use serde::{Deserialize, Serialize};
use tracing::{debug, trace};

/// How many errors the validator reports
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ValidationMode {
    /// Stop at the first violation
    #[default]
    FailFast,
    /// Report one error per failing node
    CollectAll,
}

/// Whether `name` is a bare, dotted or double-quoted SQL identifier
pub fn is_valid_identifier(name: &str) -> bool {
    let mut rest = name;
    loop {
        let consumed = if let Some(after) = rest.strip_prefix('"') {
            match quoted_len(after) {
                Some(len) => len + 1,
                None => return false,
            }
        } else {
            let end = rest
                .char_indices()
                .find(|&(i, c)| {
                    let ok = if i == 0 {
                        c.is_alphabetic() || c == '_'
                    } else {
                        c.is_alphanumeric() || matches!(c, '_' | '$' | '#')
                    };
                    !ok
                })
                .map_or(rest.len(), |(i, _)| i);
            if end == 0 {
                return false;
            }
            end
        };

        rest = &rest[consumed..];
        if rest.is_empty() {
            return true;
        }
        match rest.strip_prefix('.') {
            Some(next) => rest = next,
            None => return false,
        }
    }
}

/// Bytes up to and including the closing quote; `""` inside is an escaped quote
fn quoted_len(s: &str) -> Option<usize> {
    let bytes = s.as_bytes();
    let mut i = 0;
    while i < bytes.len() {
        if bytes[i] == b'"' {
            if bytes.get(i + 1) == Some(&b'"') {
                i += 2;
                continue;
            }
            return if i == 0 { None } else { Some(i + 1) };
        }
        i += 1;
    }
    None
}

/// Validate and stop at the first violation
pub fn check_structure(stmt: &Statement) -> Result<()> {
    validate(stmt, ValidationMode::FailFast)
}

/// Validate and return every violation found
pub fn collect_structure_errors(stmt: &Statement) -> Vec<Error> {
    let mut validator = Validator::new(ValidationMode::CollectAll);
    if let Err(e) = validator.check_root(stmt) {
        validator.errors.push(e);
    }
    validator.errors
}

/// Validate in the given mode
///
/// In collect-all mode several violations come back as [`Error::Multiple`].
pub fn validate(stmt: &Statement, mode: ValidationMode) -> Result<()> {
    debug!(kind = %stmt.kind(), ?mode, "validating statement");
    match mode {
        ValidationMode::FailFast => Validator::new(mode).check_root(stmt),
        ValidationMode::CollectAll => {
            let mut errors = collect_structure_errors(stmt);
            match errors.len() {
                0 => Ok(()),
                1 => Err(errors.remove(0)),
                _ => Err(Error::Multiple(errors)),
            }
        }
    }
}

struct Validator {
    mode: ValidationMode,
    errors: Vec<Error>,
}

impl Validator {
    fn new(mode: ValidationMode) -> Self {
        Self {
            mode,
            errors: Vec::new(),
        }
    }

    fn check_root(&mut self, stmt: &Statement) -> Result<()> {
        let res = self.statement(stmt, &NodePath::root());
        self.absorb(res)
    }

    /// Keep going after a child's failure when collecting
    fn absorb(&mut self, res: Result<()>) -> Result<()> {
        match res {
            Err(e) if self.mode == ValidationMode::CollectAll => {
                trace!(error = %e, "structure violation");
                self.errors.push(e);
                Ok(())
            }
            other => other,
        }
    }

    fn child_statement(&mut self, stmt: &Statement, path: &NodePath) -> Result<()> {
        let res = self.statement(stmt, path);
        self.absorb(res)
    }

    fn child_expr(&mut self, expr: &Expr, path: &NodePath) -> Result<()> {
        let res = self.expr(expr, path);
        self.absorb(res)
    }

    fn statement(&mut self, stmt: &Statement, path: &NodePath) -> Result<()> {
        let path = path.child("contents");
        match &stmt.contents {
            Contents::Select(select) => self.select(select, &path),
            Contents::Insert(insert) => {
                check_table(&insert.table, &path.child("table"))?;
                for (i, field) in insert.fields.iter().enumerate() {
                    check_identifier(field, &path.child("fields").index(i))?;
                }
                match &insert.rows {
                    ValuesOrSelect::Values(rows) => {
                        let values_path = path.child("values");
                        if rows.is_empty() {
                            return Err(Error::structure(&values_path, "INSERT has no values"));
                        }
                        let width = if insert.fields.is_empty() {
                            rows[0].len()
                        } else {
                            insert.fields.len()
                        };
                        for (r, row) in rows.iter().enumerate() {
                            if row.is_empty() {
                                return Err(Error::structure(
                                    &values_path.index(r),
                                    "empty VALUES row",
                                ));
                            }
                            if row.len() != width {
                                return Err(Error::structure(
                                    &values_path.index(r),
                                    format!("VALUES row has {} values, expected {}", row.len(), width),
                                ));
                            }
                        }
                        for (r, row) in rows.iter().enumerate() {
                            for (c, expr) in row.iter().enumerate() {
                                self.child_expr(expr, &values_path.index(r).index(c))?;
                            }
                        }
                        Ok(())
                    }
                    ValuesOrSelect::Select(sub) => {
                        let sub_path = path.child("select");
                        if !sub.is_query() {
                            return Err(Error::structure(
                                &sub_path,
                                format!("INSERT source must be a query, got {}", sub.kind()),
                            ));
                        }
                        if let Some(width) = sub.output_width() {
                            if !insert.fields.is_empty() && width != insert.fields.len() {
                                return Err(Error::structure(
                                    &sub_path,
                                    format!(
                                        "INSERT source yields {} columns, expected {}",
                                        width,
                                        insert.fields.len()
                                    ),
                                ));
                            }
                        }
                        self.child_statement(sub, &sub_path)
                    }
                    ValuesOrSelect::DefaultValues => {
                        if insert.fields.is_empty() {
                            Ok(())
                        } else {
                            Err(Error::structure(
                                &path.child("fields"),
                                "DEFAULT VALUES takes no column list",
                            ))
                        }
                    }
                }
            }
            Contents::Update(update) => {
                check_table(&update.table, &path.child("table"))?;
                if update.assignments.is_empty() {
                    return Err(Error::structure(
                        &path.child("fields"),
                        "UPDATE has no assignments",
                    ));
                }
                for (i, assignment) in update.assignments.iter().enumerate() {
                    check_identifier(&assignment.column, &path.child("fields").index(i))?;
                }
                for (i, assignment) in update.assignments.iter().enumerate() {
                    self.child_expr(&assignment.value, &path.child("expressions").index(i))?;
                }
                if let Some(cond) = &update.where_ {
                    self.child_expr(cond, &path.child("condition"))?;
                }
                Ok(())
            }
            Contents::Delete(delete) => {
                check_table(&delete.table, &path.child("table"))?;
                if let Some(cond) = &delete.where_ {
                    self.child_expr(cond, &path.child("condition"))?;
                }
                Ok(())
            }
            Contents::Compound(compound) => {
                let members_path = path.child("select");
                if compound.members.len() < 2 {
                    return Err(Error::structure(
                        &members_path,
                        format!("{} needs at least two members", compound.op.as_str()),
                    ));
                }
                let mut width = None;
                for (i, member) in compound.members.iter().enumerate() {
                    if !member.is_query() {
                        return Err(Error::structure(
                            &members_path.index(i),
                            format!("compound member must be a query, got {}", member.kind()),
                        ));
                    }
                    match (width, member.output_width()) {
                        (Some(expected), Some(found)) if expected != found => {
                            return Err(Error::structure(
                                &members_path.index(i),
                                format!(
                                    "compound member yields {} columns, expected {}",
                                    found, expected
                                ),
                            ));
                        }
                        (None, Some(found)) => width = Some(found),
                        _ => {}
                    }
                }
                for (i, member) in compound.members.iter().enumerate() {
                    self.child_statement(member, &members_path.index(i))?;
                }
                Ok(())
            }
            Contents::Begin(trans) | Contents::Commit(trans) | Contents::Rollback(trans) => {
                check_transaction(trans, &path, false)
            }
            Contents::Savepoint(trans)
            | Contents::RollbackSavepoint(trans)
            | Contents::DeleteSavepoint(trans) => check_transaction(trans, &path, true),
        }
    }

    fn select(&mut self, select: &Select, path: &NodePath) -> Result<()> {
        if select.fields.is_empty() {
            return Err(Error::structure(&path.child("fields"), "SELECT has no fields"));
        }
        if let Some(from) = &select.from {
            check_from(from, &path.child("from"))?;
        }
        check_qualifiers(select, path)?;

        if let Some(expr) = &select.distinct_on {
            self.child_expr(expr, &path.child("distinct_on"))?;
        }
        for (i, field) in select.fields.iter().enumerate() {
            self.child_expr(&field.expr, &path.child("fields").index(i).child("expr"))?;
        }
        if let Some(from) = &select.from {
            let from_path = path.child("from");
            for (i, target) in from.targets.iter().enumerate() {
                if let TargetSource::Subselect(sub) = &target.source {
                    self.child_statement(sub, &from_path.child("targets").index(i).child("expr"))?;
                }
            }
            for (i, join) in from.joins.iter().enumerate() {
                if let Some(cond) = &join.on {
                    self.child_expr(cond, &from_path.child("joins").index(i).child("on_cond"))?;
                }
            }
        }
        if let Some(cond) = &select.where_ {
            self.child_expr(cond, &path.child("where"))?;
        }
        for (i, expr) in select.group_by.iter().enumerate() {
            self.child_expr(expr, &path.child("group_by").index(i))?;
        }
        if let Some(cond) = &select.having {
            self.child_expr(cond, &path.child("having"))?;
        }
        for (i, item) in select.order_by.iter().enumerate() {
            self.child_expr(&item.expr, &path.child("order_by").index(i).child("expr"))?;
        }
        if let Some(expr) = &select.limit {
            self.child_expr(expr, &path.child("limit"))?;
        }
        if let Some(expr) = &select.offset {
            self.child_expr(expr, &path.child("offset"))?;
        }
        Ok(())
    }

    fn expr(&mut self, expr: &Expr, path: &NodePath) -> Result<()> {
        match expr {
            Expr::Value(_) | Expr::Default | Expr::Placeholder(_) => Ok(()),
            Expr::Column(column) => {
                if let Some(table) = &column.table {
                    check_identifier(table, path)?;
                }
                if column.is_star() {
                    Ok(())
                } else {
                    check_identifier(&column.column, path)
                }
            }
            Expr::Function { name, args } => {
                if !is_valid_identifier(name) {
                    return Err(Error::malformed(
                        &path.child("function_name"),
                        format!("invalid function name '{}'", name),
                    ));
                }
                if let Some(def) = functions::get_function(name) {
                    if !def.accepts(args.len()) {
                        return Err(Error::structure(
                            path,
                            format!(
                                "function {} takes {} argument(s), got {}",
                                def.name,
                                def.arity_description(),
                                args.len()
                            ),
                        ));
                    }
                }
                for (i, arg) in args.iter().enumerate() {
                    self.child_expr(arg, &path.child("function_args").index(i))?;
                }
                Ok(())
            }
            Expr::Operation { op, operands } => {
                if !op.arity().accepts(operands.len()) {
                    return Err(Error::structure(
                        path,
                        format!(
                            "operator {} takes {} operand(s), got {}",
                            op,
                            op.arity(),
                            operands.len()
                        ),
                    ));
                }
                for (i, operand) in operands.iter().enumerate() {
                    self.child_expr(operand, &path.operand(i))?;
                }
                Ok(())
            }
            Expr::Subselect(sub) => {
                if !matches!(sub.contents, Contents::Select(_)) {
                    return Err(Error::structure(
                        path,
                        format!("sub-select holds a {} statement", sub.kind()),
                    ));
                }
                self.child_statement(sub, &path.child("select"))
            }
            Expr::Compound(sub) => {
                if !matches!(sub.contents, Contents::Compound(_)) {
                    return Err(Error::structure(
                        path,
                        format!("compound sub-select holds a {} statement", sub.kind()),
                    ));
                }
                self.child_statement(sub, &path.child("select"))
            }
            Expr::Case(case) => {
                if case.arms.is_empty() {
                    return Err(Error::structure(path, "CASE needs at least one WHEN arm"));
                }
                if let Some(subject) = &case.subject {
                    self.child_expr(subject, &path.child("base_expr"))?;
                }
                for (i, arm) in case.arms.iter().enumerate() {
                    let arm_path = path.child("body").index(i);
                    self.child_expr(&arm.when, &arm_path.child("when"))?;
                    self.child_expr(&arm.then, &arm_path.child("then"))?;
                }
                if let Some(else_) = &case.else_ {
                    self.child_expr(else_, &path.child("else_expr"))?;
                }
                Ok(())
            }
            Expr::CastAs { expr, type_name } => {
                if type_name.trim().is_empty() {
                    return Err(Error::structure(&path.child("cast"), "CAST without a type"));
                }
                self.child_expr(expr, &path.child("expr"))
            }
        }
    }
}

fn check_identifier(name: &str, path: &NodePath) -> Result<()> {
    if is_valid_identifier(name) {
        Ok(())
    } else {
        Err(Error::malformed(path, format!("invalid identifier '{}'", name)))
    }
}

fn check_table(table: &TableName, path: &NodePath) -> Result<()> {
    if table.is_empty() {
        return Err(Error::structure(path, "missing table name"));
    }
    if let Some(schema) = &table.schema {
        check_identifier(schema, path)?;
    }
    check_identifier(&table.name, path)
}

fn check_transaction(trans: &Transaction, path: &NodePath, needs_name: bool) -> Result<()> {
    let path = path.child("trans_name");
    match &trans.name {
        Some(name) => check_identifier(name, &path),
        None if needs_name => Err(Error::structure(&path, "savepoint name is required")),
        None => Ok(()),
    }
}

fn check_from(from: &FromClause, path: &NodePath) -> Result<()> {
    if from.targets.is_empty() {
        return Err(Error::structure(&path.child("targets"), "FROM has no targets"));
    }

    let mut names: Vec<&str> = Vec::new();
    for (i, target) in from.targets.iter().enumerate() {
        let target_path = path.child("targets").index(i);
        match &target.source {
            TargetSource::Table(table) => check_table(table, &target_path.child("table_name"))?,
            TargetSource::Subselect(sub) => {
                if !sub.is_query() {
                    return Err(Error::structure(
                        &target_path.child("expr"),
                        format!("derived table holds a {} statement", sub.kind()),
                    ));
                }
                if target.alias.is_none() {
                    return Err(Error::structure(
                        &target_path,
                        "derived table needs an alias",
                    ));
                }
            }
        }
        if let Some(name) = &target.alias {
            if names.iter().any(|n| crate::stmt::identifiers_match(n, name)) {
                return Err(Error::structure(
                    &target_path.child("as"),
                    format!("duplicate target alias '{}'", name),
                ));
            }
            names.push(name);
        }
    }

    for (i, join) in from.joins.iter().enumerate() {
        let join_path = path.child("joins").index(i);
        if join.position == 0 || join.position >= from.targets.len() {
            return Err(Error::structure(
                &join_path.child("join_pos"),
                format!(
                    "join position {} outside of 1..{}",
                    join.position,
                    from.targets.len()
                ),
            ));
        }
        if join.on.is_some() && !join.using.is_empty() {
            return Err(Error::structure(&join_path, "join has both ON and USING"));
        }
        if matches!(join.kind, JoinKind::Cross | JoinKind::Natural)
            && (join.on.is_some() || !join.using.is_empty())
        {
            return Err(Error::structure(
                &join_path,
                format!("{} join takes no condition", join.kind.as_str()),
            ));
        }
        for (u, column) in join.using.iter().enumerate() {
            check_identifier(column, &join_path.child("using").index(u))?;
        }
    }
    Ok(())
}

/// Qualified columns of the SELECT list and join conditions must name a target
fn check_qualifiers(select: &Select, path: &NodePath) -> Result<()> {
    let from = select.from.as_ref();
    let check = |expr: &Expr, path: &NodePath| -> Result<()> {
        let mut result = Ok(());
        visit_local_columns(expr, &mut |qualifier| {
            let known = from.is_some_and(|f| f.find_target(qualifier).is_some());
            if !known && result.is_ok() {
                result = Err(Error::structure(
                    path,
                    format!("'{}' does not name a FROM target", qualifier),
                ));
            }
        });
        result
    };

    for (i, field) in select.fields.iter().enumerate() {
        check(&field.expr, &path.child("fields").index(i).child("expr"))?;
    }
    if let Some(from) = from {
        for (i, join) in from.joins.iter().enumerate() {
            if let Some(cond) = &join.on {
                check(cond, &path.child("from").child("joins").index(i).child("on_cond"))?;
            }
        }
    }
    Ok(())
}

/// Column qualifiers of an expression, not descending into sub-selects
fn visit_local_columns(expr: &Expr, f: &mut dyn FnMut(&str)) {
    match expr {
        Expr::Column(column) => {
            if let Some(table) = &column.table {
                f(table);
            }
        }
        Expr::Function { args, .. } => args.iter().for_each(|a| visit_local_columns(a, f)),
        Expr::Operation { operands, .. } => {
            operands.iter().for_each(|o| visit_local_columns(o, f))
        }
        Expr::Case(case) => {
            if let Some(subject) = &case.subject {
                visit_local_columns(subject, f);
            }
            for arm in &case.arms {
                visit_local_columns(&arm.when, f);
                visit_local_columns(&arm.then, f);
            }
            if let Some(else_) = &case.else_ {
                visit_local_columns(else_, f);
            }
        }
        Expr::CastAs { expr, .. } => visit_local_columns(expr, f),
        _ => {}
    }
}
