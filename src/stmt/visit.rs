//! Depth-first traversal of statement trees
//!
//! Expressions are visited pre-order, clauses in declaration order, and
//! nested statements (sub-selects, derived tables, compound members,
//! `INSERT .. SELECT`) are descended into. The callback receives the path of
//! each node; paths use the key names of the JSON form.

use super::expr::Expr;
use super::modify::ValuesOrSelect;
use super::path::NodePath;
use super::select::{Select, TargetSource};
use super::{Contents, Statement};
use crate::error::Result;

type ExprFn<'f> = dyn FnMut(&Expr, &NodePath) -> Result<()> + 'f;
type ExprMutFn<'f> = dyn FnMut(&mut Expr, &NodePath) -> Result<()> + 'f;

/// Visit every expression of a statement
pub fn walk_exprs(stmt: &Statement, path: &NodePath, f: &mut ExprFn<'_>) -> Result<()> {
    let path = path.child("contents");
    match &stmt.contents {
        Contents::Select(select) => walk_select(select, &path, f),
        Contents::Insert(insert) => match &insert.rows {
            ValuesOrSelect::Values(rows) => {
                for (r, row) in rows.iter().enumerate() {
                    for (c, expr) in row.iter().enumerate() {
                        walk_expr(expr, &path.child("values").index(r).index(c), f)?;
                    }
                }
                Ok(())
            }
            ValuesOrSelect::Select(sub) => walk_exprs(sub, &path.child("select"), f),
            ValuesOrSelect::DefaultValues => Ok(()),
        },
        Contents::Update(update) => {
            for (i, assignment) in update.assignments.iter().enumerate() {
                walk_expr(&assignment.value, &path.child("expressions").index(i), f)?;
            }
            if let Some(cond) = &update.where_ {
                walk_expr(cond, &path.child("condition"), f)?;
            }
            Ok(())
        }
        Contents::Delete(delete) => match &delete.where_ {
            Some(cond) => walk_expr(cond, &path.child("condition"), f),
            None => Ok(()),
        },
        Contents::Compound(compound) => {
            for (i, member) in compound.members.iter().enumerate() {
                walk_exprs(member, &path.child("select").index(i), f)?;
            }
            Ok(())
        }
        _ => Ok(()),
    }
}

fn walk_select(select: &Select, path: &NodePath, f: &mut ExprFn<'_>) -> Result<()> {
    if let Some(expr) = &select.distinct_on {
        walk_expr(expr, &path.child("distinct_on"), f)?;
    }
    for (i, field) in select.fields.iter().enumerate() {
        walk_expr(&field.expr, &path.child("fields").index(i).child("expr"), f)?;
    }
    if let Some(from) = &select.from {
        let from_path = path.child("from");
        for (i, target) in from.targets.iter().enumerate() {
            if let TargetSource::Subselect(sub) = &target.source {
                walk_exprs(sub, &from_path.child("targets").index(i).child("expr"), f)?;
            }
        }
        for (i, join) in from.joins.iter().enumerate() {
            if let Some(cond) = &join.on {
                walk_expr(cond, &from_path.child("joins").index(i).child("on_cond"), f)?;
            }
        }
    }
    if let Some(cond) = &select.where_ {
        walk_expr(cond, &path.child("where"), f)?;
    }
    for (i, expr) in select.group_by.iter().enumerate() {
        walk_expr(expr, &path.child("group_by").index(i), f)?;
    }
    if let Some(cond) = &select.having {
        walk_expr(cond, &path.child("having"), f)?;
    }
    for (i, item) in select.order_by.iter().enumerate() {
        walk_expr(&item.expr, &path.child("order_by").index(i).child("expr"), f)?;
    }
    if let Some(expr) = &select.limit {
        walk_expr(expr, &path.child("limit"), f)?;
    }
    if let Some(expr) = &select.offset {
        walk_expr(expr, &path.child("offset"), f)?;
    }
    Ok(())
}

/// Visit an expression and everything below it
pub fn walk_expr(expr: &Expr, path: &NodePath, f: &mut ExprFn<'_>) -> Result<()> {
    f(expr, path)?;
    match expr {
        Expr::Function { args, .. } => {
            for (i, arg) in args.iter().enumerate() {
                walk_expr(arg, &path.child("function_args").index(i), f)?;
            }
        }
        Expr::Operation { operands, .. } => {
            for (i, operand) in operands.iter().enumerate() {
                walk_expr(operand, &path.operand(i), f)?;
            }
        }
        Expr::Subselect(sub) | Expr::Compound(sub) => {
            walk_exprs(sub, &path.child("select"), f)?;
        }
        Expr::Case(case) => {
            if let Some(subject) = &case.subject {
                walk_expr(subject, &path.child("base_expr"), f)?;
            }
            for (i, arm) in case.arms.iter().enumerate() {
                let arm_path = path.child("body").index(i);
                walk_expr(&arm.when, &arm_path.child("when"), f)?;
                walk_expr(&arm.then, &arm_path.child("then"), f)?;
            }
            if let Some(else_) = &case.else_ {
                walk_expr(else_, &path.child("else_expr"), f)?;
            }
        }
        Expr::CastAs { expr, .. } => walk_expr(expr, &path.child("expr"), f)?,
        Expr::Value(_) | Expr::Column(_) | Expr::Default | Expr::Placeholder(_) => {}
    }
    Ok(())
}

/// Visit every expression of a statement mutably
///
/// The callback runs before the node's children are visited, so a node it
/// replaces is walked in its new shape.
pub fn transform_exprs(
    stmt: &mut Statement,
    path: &NodePath,
    f: &mut ExprMutFn<'_>,
) -> Result<()> {
    let path = path.child("contents");
    match &mut stmt.contents {
        Contents::Select(select) => transform_select(select, &path, f),
        Contents::Insert(insert) => match &mut insert.rows {
            ValuesOrSelect::Values(rows) => {
                for (r, row) in rows.iter_mut().enumerate() {
                    for (c, expr) in row.iter_mut().enumerate() {
                        transform_expr(expr, &path.child("values").index(r).index(c), f)?;
                    }
                }
                Ok(())
            }
            ValuesOrSelect::Select(sub) => transform_exprs(sub, &path.child("select"), f),
            ValuesOrSelect::DefaultValues => Ok(()),
        },
        Contents::Update(update) => {
            for (i, assignment) in update.assignments.iter_mut().enumerate() {
                transform_expr(&mut assignment.value, &path.child("expressions").index(i), f)?;
            }
            if let Some(cond) = &mut update.where_ {
                transform_expr(cond, &path.child("condition"), f)?;
            }
            Ok(())
        }
        Contents::Delete(delete) => match &mut delete.where_ {
            Some(cond) => transform_expr(cond, &path.child("condition"), f),
            None => Ok(()),
        },
        Contents::Compound(compound) => {
            for (i, member) in compound.members.iter_mut().enumerate() {
                transform_exprs(member, &path.child("select").index(i), f)?;
            }
            Ok(())
        }
        _ => Ok(()),
    }
}

fn transform_select(select: &mut Select, path: &NodePath, f: &mut ExprMutFn<'_>) -> Result<()> {
    if let Some(expr) = &mut select.distinct_on {
        transform_expr(expr, &path.child("distinct_on"), f)?;
    }
    for (i, field) in select.fields.iter_mut().enumerate() {
        transform_expr(&mut field.expr, &path.child("fields").index(i).child("expr"), f)?;
    }
    if let Some(from) = &mut select.from {
        let from_path = path.child("from");
        for (i, target) in from.targets.iter_mut().enumerate() {
            if let TargetSource::Subselect(sub) = &mut target.source {
                transform_exprs(sub, &from_path.child("targets").index(i).child("expr"), f)?;
            }
        }
        for (i, join) in from.joins.iter_mut().enumerate() {
            if let Some(cond) = &mut join.on {
                transform_expr(cond, &from_path.child("joins").index(i).child("on_cond"), f)?;
            }
        }
    }
    if let Some(cond) = &mut select.where_ {
        transform_expr(cond, &path.child("where"), f)?;
    }
    for (i, expr) in select.group_by.iter_mut().enumerate() {
        transform_expr(expr, &path.child("group_by").index(i), f)?;
    }
    if let Some(cond) = &mut select.having {
        transform_expr(cond, &path.child("having"), f)?;
    }
    for (i, item) in select.order_by.iter_mut().enumerate() {
        transform_expr(&mut item.expr, &path.child("order_by").index(i).child("expr"), f)?;
    }
    if let Some(expr) = &mut select.limit {
        transform_expr(expr, &path.child("limit"), f)?;
    }
    if let Some(expr) = &mut select.offset {
        transform_expr(expr, &path.child("offset"), f)?;
    }
    Ok(())
}

/// Visit an expression and everything below it mutably
pub fn transform_expr(expr: &mut Expr, path: &NodePath, f: &mut ExprMutFn<'_>) -> Result<()> {
    f(expr, path)?;
    match expr {
        Expr::Function { args, .. } => {
            for (i, arg) in args.iter_mut().enumerate() {
                transform_expr(arg, &path.child("function_args").index(i), f)?;
            }
        }
        Expr::Operation { operands, .. } => {
            for (i, operand) in operands.iter_mut().enumerate() {
                transform_expr(operand, &path.operand(i), f)?;
            }
        }
        Expr::Subselect(sub) | Expr::Compound(sub) => {
            transform_exprs(sub, &path.child("select"), f)?;
        }
        Expr::Case(case) => {
            if let Some(subject) = &mut case.subject {
                transform_expr(subject, &path.child("base_expr"), f)?;
            }
            for (i, arm) in case.arms.iter_mut().enumerate() {
                let arm_path = path.child("body").index(i);
                transform_expr(&mut arm.when, &arm_path.child("when"), f)?;
                transform_expr(&mut arm.then, &arm_path.child("then"), f)?;
            }
            if let Some(else_) = &mut case.else_ {
                transform_expr(else_, &path.child("else_expr"), f)?;
            }
        }
        Expr::CastAs { expr, .. } => transform_expr(expr, &path.child("expr"), f)?,
        Expr::Value(_) | Expr::Column(_) | Expr::Default | Expr::Placeholder(_) => {}
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sql::parse;

    #[test]
    fn test_walk_reports_paths() {
        let stmt = parse("SELECT a FROM t WHERE b = ##p::int").unwrap();
        let mut seen = Vec::new();
        walk_exprs(&stmt, &NodePath::root(), &mut |expr, path| {
            if let Expr::Placeholder(spec) = expr {
                seen.push((spec.name.clone(), path.to_string()));
            }
            Ok(())
        })
        .unwrap();
        assert_eq!(
            seen,
            vec![("p".to_string(), "contents.where.operand1".to_string())]
        );
    }

    #[test]
    fn test_walk_descends_into_subselects() {
        let stmt =
            parse("SELECT a FROM t WHERE b IN (SELECT c FROM u WHERE d = ##inner)").unwrap();
        let mut count = 0;
        walk_exprs(&stmt, &NodePath::root(), &mut |expr, _| {
            if matches!(expr, Expr::Placeholder(_)) {
                count += 1;
            }
            Ok(())
        })
        .unwrap();
        assert_eq!(count, 1);
    }

    #[test]
    fn test_transform_replaces_nodes() {
        let mut stmt = parse("DELETE FROM t WHERE id = ##id::int").unwrap();
        transform_exprs(&mut stmt, &NodePath::root(), &mut |expr, _| {
            if matches!(expr, Expr::Placeholder(_)) {
                *expr = Expr::value(5);
            }
            Ok(())
        })
        .unwrap();
        assert!(stmt.params().unwrap().is_empty());
    }
}
