//! Programmatic construction of statements
//!
//! Expression constructors check their contract on the spot: a wrong operator
//! arity, an empty CASE or an invalid function name fails at the call that
//! introduced it instead of surfacing in a later validation pass.

use super::expr::{CaseArm, CaseExpr, Expr, Operator};
use super::modify::{Delete, Insert, Update};
use super::param::{parse_keyword_spec, ParamSpec};
use super::path::NodePath;
use super::select::{FromClause, Join, JoinKind, OrderItem, Select, SelectField, TableName, Target};
use super::Statement;
use crate::error::{Error, Result};
use crate::functions;
use crate::validate::is_valid_identifier;

// ========== Expressions ==========

/// `op(operands..)`, checked against the operator's arity
pub fn operation(op: Operator, operands: Vec<Expr>) -> Result<Expr> {
    let arity = op.arity();
    if !arity.accepts(operands.len()) {
        return Err(Error::structure(
            &NodePath::root(),
            format!(
                "operator {} takes {} operand(s), got {}",
                op,
                arity,
                operands.len()
            ),
        ));
    }
    Ok(Expr::Operation { op, operands })
}

/// `left op right`
pub fn binary(op: Operator, left: Expr, right: Expr) -> Result<Expr> {
    operation(op, vec![left, right])
}

pub fn eq(left: Expr, right: Expr) -> Expr {
    Expr::Operation {
        op: Operator::Eq,
        operands: vec![left, right],
    }
}

/// Conjunction of conditions; a single condition is returned as is
pub fn and_all(mut conds: Vec<Expr>) -> Result<Expr> {
    match conds.len() {
        0 => Err(Error::structure(
            &NodePath::root(),
            "AND needs at least one condition",
        )),
        1 => Ok(conds.remove(0)),
        _ => operation(Operator::And, conds),
    }
}

/// Placeholder `##name::type[::null]`
pub fn param(name: &str, declared_type: &str, nullable: bool) -> Result<Expr> {
    Ok(Expr::Placeholder(
        ParamSpec::new(name)?
            .with_type(declared_type)
            .nullable(nullable),
    ))
}

/// Placeholder from the keyword form `name:"n" type:T nullok:true`
pub fn param_from_keywords(text: &str) -> Result<Expr> {
    Ok(Expr::Placeholder(parse_keyword_spec(text)?))
}

/// Function call; known functions are checked for argument count
pub fn function(name: &str, args: Vec<Expr>) -> Result<Expr> {
    let path = NodePath::root();
    if !is_valid_identifier(name) {
        return Err(Error::malformed(
            &path,
            format!("invalid function name '{}'", name),
        ));
    }
    if let Some(def) = functions::get_function(name) {
        if !def.accepts(args.len()) {
            return Err(Error::structure(
                &path,
                format!(
                    "function {} takes {} argument(s), got {}",
                    def.name,
                    def.arity_description(),
                    args.len()
                ),
            ));
        }
    }
    Ok(Expr::Function {
        name: name.to_string(),
        args,
    })
}

/// `CASE [subject] WHEN .. THEN .. [ELSE ..] END`
pub fn case(subject: Option<Expr>, arms: Vec<(Expr, Expr)>, else_: Option<Expr>) -> Result<Expr> {
    if arms.is_empty() {
        return Err(Error::structure(
            &NodePath::root(),
            "CASE needs at least one WHEN arm",
        ));
    }
    Ok(Expr::Case(CaseExpr {
        subject: subject.map(Box::new),
        arms: arms
            .into_iter()
            .map(|(when, then)| CaseArm { when, then })
            .collect(),
        else_: else_.map(Box::new),
    }))
}

pub fn cast(expr: Expr, type_name: impl Into<String>) -> Expr {
    Expr::CastAs {
        expr: Box::new(expr),
        type_name: type_name.into(),
    }
}

/// Sub-select expression; only SELECT and COMPOUND statements qualify
pub fn subselect(stmt: Statement) -> Result<Expr> {
    match stmt.contents {
        super::Contents::Select(_) => Ok(Expr::Subselect(Box::new(stmt))),
        super::Contents::Compound(_) => Ok(Expr::Compound(Box::new(stmt))),
        _ => Err(Error::structure(
            &NodePath::root(),
            format!("{} statement cannot be used as a sub-select", stmt.kind()),
        )),
    }
}

// ========== Statements ==========

/// Fluent builder for SELECT statements
#[derive(Debug, Default)]
pub struct SelectBuilder {
    select: Select,
}

impl SelectBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn distinct(mut self) -> Self {
        self.select.distinct = true;
        self
    }

    pub fn field(mut self, expr: Expr) -> Self {
        self.select.add_field(SelectField::new(expr));
        self
    }

    pub fn field_as(mut self, expr: Expr, alias: impl Into<String>) -> Self {
        self.select.add_field(SelectField::aliased(expr, alias));
        self
    }

    pub fn from(mut self, table: impl Into<TableName>) -> Self {
        self.select.add_target(Target::table(table));
        self
    }

    pub fn from_as(mut self, table: impl Into<TableName>, alias: impl Into<String>) -> Self {
        self.select.add_target(Target::aliased(table, alias));
        self
    }

    /// Join a new target to the ones already added
    pub fn join(mut self, kind: JoinKind, target: Target, on: Option<Expr>) -> Result<Self> {
        let from = self.select.from.get_or_insert_with(FromClause::default);
        if from.targets.is_empty() {
            return Err(Error::structure(
                &NodePath::root().child("contents").child("from"),
                "a join needs a target to join with",
            ));
        }
        let position = from.add_target(target);
        let mut join = Join::new(kind, position);
        join.on = on;
        from.add_join(join);
        Ok(self)
    }

    pub fn where_(mut self, cond: Expr) -> Self {
        self.select.set_where(Some(cond));
        self
    }

    pub fn group_by(mut self, expr: Expr) -> Self {
        self.select.group_by.push(expr);
        self
    }

    pub fn having(mut self, cond: Expr) -> Self {
        self.select.having = Some(cond);
        self
    }

    pub fn order_by(mut self, expr: Expr, ascending: bool) -> Self {
        self.select.order_by.push(if ascending {
            OrderItem::asc(expr)
        } else {
            OrderItem::desc(expr)
        });
        self
    }

    pub fn limit(mut self, count: Expr) -> Self {
        self.select.limit = Some(count);
        self
    }

    pub fn offset(mut self, offset: Expr) -> Self {
        self.select.offset = Some(offset);
        self
    }

    pub fn build(self) -> Statement {
        Statement::select(self.select)
    }
}

/// Fluent builder for INSERT statements
#[derive(Debug)]
pub struct InsertBuilder {
    insert: Insert,
}

impl InsertBuilder {
    pub fn new(table: impl Into<TableName>) -> Self {
        Self {
            insert: Insert::new(table),
        }
    }

    /// Add a column and its value in the first VALUES row
    pub fn set(mut self, column: impl Into<String>, value: Expr) -> Self {
        self.insert.add_field(column);
        if let super::ValuesOrSelect::Values(rows) = &mut self.insert.rows {
            if let Some(first) = rows.first_mut() {
                first.push(value);
                return self;
            }
        }
        self.insert.add_row(vec![value]);
        self
    }

    pub fn row(mut self, values: Vec<Expr>) -> Self {
        self.insert.add_row(values);
        self
    }

    pub fn build(self) -> Statement {
        Statement::insert(self.insert)
    }
}

/// Fluent builder for UPDATE statements
#[derive(Debug)]
pub struct UpdateBuilder {
    update: Update,
}

impl UpdateBuilder {
    pub fn new(table: impl Into<TableName>) -> Self {
        Self {
            update: Update::new(table),
        }
    }

    pub fn set(mut self, column: impl Into<String>, value: Expr) -> Self {
        self.update.add_assignment(column, value);
        self
    }

    pub fn where_(mut self, cond: Expr) -> Self {
        self.update.set_where(Some(cond));
        self
    }

    pub fn build(self) -> Statement {
        Statement::update(self.update)
    }
}

/// Fluent builder for DELETE statements
#[derive(Debug)]
pub struct DeleteBuilder {
    delete: Delete,
}

impl DeleteBuilder {
    pub fn new(table: impl Into<TableName>) -> Self {
        Self {
            delete: Delete::new(table),
        }
    }

    pub fn where_(mut self, cond: Expr) -> Self {
        self.delete.set_where(Some(cond));
        self
    }

    pub fn build(self) -> Statement {
        Statement::delete(self.delete)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorKind;

    #[test]
    fn test_operation_arity_checked_immediately() {
        let err = operation(Operator::Between, vec![Expr::column("a"), Expr::value(1)]).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Structure);
        assert!(err.to_string().contains("BETWEEN"));

        assert!(operation(Operator::IsNull, vec![Expr::column("a")]).is_ok());
        assert!(operation(Operator::And, vec![Expr::column("a")]).is_err());
    }

    #[test]
    fn test_and_all() {
        let single = and_all(vec![Expr::column("a")]).unwrap();
        assert_eq!(single, Expr::column("a"));
        assert!(and_all(vec![]).is_err());
        assert!(matches!(
            and_all(vec![Expr::column("a"), Expr::column("b")]).unwrap(),
            Expr::Operation { op: Operator::And, .. }
        ));
    }

    #[test]
    fn test_param_builders() {
        let expr = param("id", "int", false).unwrap();
        let spec = expr.as_placeholder().unwrap();
        assert_eq!(spec.declared_type, "int");
        assert!(param("", "int", false).is_err());

        let expr = param_from_keywords(r#"name:"id" type:int null:true"#).unwrap();
        assert!(expr.as_placeholder().unwrap().nullable);
    }

    #[test]
    fn test_function_checks() {
        assert!(function("lower", vec![Expr::column("a")]).is_ok());
        assert!(function("1abc", vec![]).is_err());
        assert!(function("count", vec![]).is_err());
        assert!(function("my_udf", vec![Expr::value(1), Expr::value(2)]).is_ok());
    }

    #[test]
    fn test_case_needs_arm() {
        assert!(case(None, vec![], None).is_err());
        assert!(case(None, vec![(Expr::value(true), Expr::value(1))], None).is_ok());
    }

    #[test]
    fn test_select_builder() {
        let stmt = SelectBuilder::new()
            .field(Expr::column("name"))
            .from_as("products", "p")
            .join(
                JoinKind::Inner,
                Target::table("orders"),
                Some(eq(
                    Expr::qualified_column("p", "ref"),
                    Expr::qualified_column("orders", "product"),
                )),
            )
            .unwrap()
            .order_by(Expr::column("name"), false)
            .build();

        let select = stmt.as_select().unwrap();
        let from = select.from.as_ref().unwrap();
        assert_eq!(from.targets.len(), 2);
        assert_eq!(from.joins[0].position, 1);
        assert!(!select.order_by[0].ascending);
    }

    #[test]
    fn test_join_without_target_fails() {
        let result = SelectBuilder::new().join(JoinKind::Inner, Target::table("t"), None);
        assert!(result.is_err());
    }

    #[test]
    fn test_insert_builder_set() {
        let stmt = InsertBuilder::new("t")
            .set("a", Expr::value(1))
            .set("b", Expr::value(2))
            .build();
        match &stmt.contents {
            super::super::Contents::Insert(insert) => {
                assert_eq!(insert.fields, vec!["a", "b"]);
                assert_eq!(insert.values().unwrap()[0].len(), 2);
            }
            _ => panic!("Expected INSERT statement"),
        }
    }
}
