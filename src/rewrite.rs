//! Statement rewriters driven by parameter bindings
//!
//! * [`rewrite_defaults`] replaces parameters marked "use default" by the
//!   `DEFAULT` keyword, or drops their columns from an INSERT.
//! * [`rewrite_null_params`] turns `x = ##p` into `x IS NULL` when `p` is
//!   bound to NULL.
//! * [`alter_select_for_empty`] builds a SELECT with the same columns that
//!   returns no row.

use crate::error::{Error, Result};
use crate::stmt::visit::{transform_exprs, walk_expr};
use crate::stmt::{
    Contents, Expr, Insert, Literal, NodePath, Operator, ParamSet, Statement, Update,
    ValuesOrSelect,
};
use crate::validate::check_structure;
use serde::{Deserialize, Serialize};
use tracing::{debug, trace};

/// How defaulted parameters are rewritten
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DefaultMode {
    /// Use the `DEFAULT` keyword in place of the parameter
    #[default]
    Substitute,
    /// Remove the column; INSERT only
    Omit,
}

/// Rewrite parameters bound to "use default"
///
/// Only INSERT and UPDATE can be rewritten. In [`DefaultMode::Omit`] a column
/// is removed only when every VALUES row defaults it; a column defaulted in
/// some rows only is an error. When no column is left the INSERT becomes
/// `INSERT .. DEFAULT VALUES`.
pub fn rewrite_defaults(stmt: &Statement, params: &ParamSet, mode: DefaultMode) -> Result<Statement> {
    debug!(kind = %stmt.kind(), ?mode, "rewriting default values");
    check_structure(stmt)?;

    let root = NodePath::root().child("contents");
    let mut out = stmt.clone();
    match &mut out.contents {
        Contents::Insert(insert) => match mode {
            DefaultMode::Substitute => substitute_insert(insert, params, &root)?,
            DefaultMode::Omit => omit_insert(insert, params, &root)?,
        },
        Contents::Update(update) => match mode {
            DefaultMode::Substitute => substitute_update(update, params, &root)?,
            DefaultMode::Omit => {
                return Err(Error::unsupported(
                    &root,
                    "can't remove defaulted columns from an UPDATE statement",
                ))
            }
        },
        _ => {
            return Err(Error::unsupported(
                &NodePath::root(),
                format!("can't rewrite default values of a {} statement", stmt.kind()),
            ))
        }
    }
    Ok(out)
}

/// Whether a value is a parameter marked "use default"
///
/// Fails when the parameter has no entry in `params`.
fn is_defaulted(expr: &Expr, params: &ParamSet, path: &NodePath) -> Result<bool> {
    match expr {
        Expr::Placeholder(spec) => {
            if params.get(&spec.name).is_none() {
                return Err(Error::missing(
                    path,
                    format!("missing parameter '{}' to execute query", spec.name),
                ));
            }
            Ok(params.is_default(&spec.name))
        }
        _ => Ok(false),
    }
}

/// Defaulted parameters are only meaningful as whole values
fn reject_nested_defaults(expr: &Expr, params: &ParamSet, path: &NodePath) -> Result<()> {
    if matches!(expr, Expr::Placeholder(_)) {
        return Ok(());
    }
    walk_expr(expr, path, &mut |node, node_path| {
        if let Expr::Placeholder(spec) = node {
            if params.is_default(&spec.name) {
                return Err(Error::unsupported(
                    node_path,
                    format!("parameter '{}' set to default is part of an expression", spec.name),
                ));
            }
        }
        Ok(())
    })
}

fn substitute_insert(insert: &mut Insert, params: &ParamSet, path: &NodePath) -> Result<()> {
    let ValuesOrSelect::Values(rows) = &mut insert.rows else {
        return Ok(());
    };
    for (r, row) in rows.iter_mut().enumerate() {
        for (c, value) in row.iter_mut().enumerate() {
            let value_path = path.child("values").index(r).index(c);
            reject_nested_defaults(value, params, &value_path)?;
            if is_defaulted(value, params, &value_path)? {
                trace!(row = r, column = c, "parameter replaced by DEFAULT");
                *value = Expr::Default;
            }
        }
    }
    Ok(())
}

fn omit_insert(insert: &mut Insert, params: &ParamSet, path: &NodePath) -> Result<()> {
    let ValuesOrSelect::Values(rows) = &mut insert.rows else {
        return Ok(());
    };

    let width = rows.first().map_or(0, Vec::len);
    let mut omitted = vec![false; width];
    for (c, slot) in omitted.iter_mut().enumerate() {
        let mut defaulted = 0;
        for (r, row) in rows.iter().enumerate() {
            let value_path = path.child("values").index(r).index(c);
            let value = row.get(c).ok_or_else(|| {
                Error::structure(&value_path, "VALUES rows have different lengths")
            })?;
            reject_nested_defaults(value, params, &value_path)?;
            if is_defaulted(value, params, &value_path)? {
                defaulted += 1;
            }
        }
        if defaulted == 0 {
            continue;
        }
        if defaulted != rows.len() {
            return Err(Error::unsupported(
                &path.child("values").index(0).index(c),
                format!(
                    "column {} is set to default in {} of {} rows and can't be removed",
                    insert.fields.get(c).map_or_else(|| c.to_string(), |f| format!("'{}'", f)),
                    defaulted,
                    rows.len()
                ),
            ));
        }
        if insert.fields.len() != width {
            return Err(Error::unsupported(
                &path.child("fields"),
                "can't remove a defaulted value without an explicit column list",
            ));
        }
        *slot = true;
    }

    if !omitted.contains(&true) {
        return Ok(());
    }
    for (c, gone) in omitted.iter().enumerate() {
        if *gone {
            trace!(column = %insert.fields[c], "defaulted column removed");
        }
    }
    insert.fields = retain_columns(std::mem::take(&mut insert.fields), &omitted);
    let remaining: Vec<Vec<Expr>> = std::mem::take(rows)
        .into_iter()
        .map(|row| retain_columns(row, &omitted))
        .collect();

    if insert.fields.is_empty() {
        insert.rows = ValuesOrSelect::DefaultValues;
    } else {
        insert.rows = ValuesOrSelect::Values(remaining);
    }
    Ok(())
}

fn retain_columns<T>(items: Vec<T>, omitted: &[bool]) -> Vec<T> {
    items
        .into_iter()
        .zip(omitted)
        .filter_map(|(item, gone)| if *gone { None } else { Some(item) })
        .collect()
}

fn substitute_update(update: &mut Update, params: &ParamSet, path: &NodePath) -> Result<()> {
    for (i, assignment) in update.assignments.iter_mut().enumerate() {
        let value_path = path.child("expressions").index(i);
        reject_nested_defaults(&assignment.value, params, &value_path)?;
        if is_defaulted(&assignment.value, params, &value_path)? {
            trace!(column = %assignment.column, "parameter replaced by DEFAULT");
            assignment.value = Expr::Default;
        }
    }
    if let Some(cond) = &update.where_ {
        reject_nested_defaults(cond, params, &path.child("condition"))?;
    }
    Ok(())
}

/// Rewrite comparisons against parameters bound to NULL
///
/// `x = ##p` becomes `x IS NULL` and `x != ##p` becomes `x IS NOT NULL`
/// when `p` is bound to NULL. Other uses of the parameter are kept.
pub fn rewrite_null_params(stmt: &Statement, params: &ParamSet) -> Result<Statement> {
    debug!(kind = %stmt.kind(), "rewriting NULL parameters");
    let mut out = stmt.clone();
    let mut rewritten = 0usize;
    transform_exprs(&mut out, &NodePath::root(), &mut |expr, path| {
        let Expr::Operation { op, operands } = expr else {
            return Ok(());
        };
        let replacement = match op {
            Operator::Eq => Operator::IsNull,
            Operator::Diff => Operator::IsNotNull,
            _ => return Ok(()),
        };
        if operands.len() != 2 {
            return Ok(());
        }
        let null_param = |e: &Expr| {
            matches!(e, Expr::Placeholder(spec) if params.is_bound_to_null(&spec.name))
        };
        let kept = if null_param(&operands[1]) {
            operands.swap_remove(0)
        } else if null_param(&operands[0]) {
            operands.swap_remove(1)
        } else {
            return Ok(());
        };
        trace!(%path, operator = %replacement, "comparison with NULL parameter rewritten");
        rewritten += 1;
        *expr = Expr::Operation {
            op: replacement,
            operands: vec![kept],
        };
        Ok(())
    })?;
    debug!(rewritten, "NULL parameters rewritten");
    Ok(out)
}

/// Same SELECT, guaranteed to return no row
///
/// The source text is dropped, WHERE becomes `0 = 1` and every placeholder
/// is replaced by a zero of its type, so the result describes the columns
/// without needing parameter values.
pub fn alter_select_for_empty(stmt: &Statement) -> Result<Statement> {
    debug!(kind = %stmt.kind(), "altering SELECT for empty result");
    let mut out = stmt.clone();
    out.source_sql = None;

    let select = out.as_select_mut().ok_or_else(|| {
        Error::unsupported(
            &NodePath::root(),
            format!("can only alter a SELECT for empty result, got {}", stmt.kind()),
        )
    })?;
    select.where_ = Some(Expr::Operation {
        op: Operator::Eq,
        operands: vec![Expr::value(0), Expr::value(1)],
    });

    let mut zero_params = |expr: &mut Expr, _path: &NodePath| -> Result<()> {
        if let Expr::Placeholder(spec) = expr {
            *expr = Expr::Value(Literal::zero_for(spec.data_type().as_ref()));
        }
        Ok(())
    };
    transform_exprs(&mut out, &NodePath::root(), &mut zero_params)?;
    Ok(out)
}
