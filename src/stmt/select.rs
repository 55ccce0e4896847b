//! SELECT and COMPOUND statement parts

use super::expr::Expr;
use super::Statement;
use std::fmt;

/// Strip the double quotes of a quoted identifier, undoubling inner quotes
pub fn unquote_identifier(name: &str) -> String {
    match name.strip_prefix('"').and_then(|n| n.strip_suffix('"')) {
        Some(inner) => inner.replace("\"\"", "\""),
        None => name.to_string(),
    }
}

fn is_quoted(name: &str) -> bool {
    name.len() >= 2 && name.starts_with('"') && name.ends_with('"')
}

/// Compare two identifiers the way SQL does
///
/// Bare identifiers match case-insensitively; as soon as one side is quoted
/// the comparison is exact on the unquoted text.
pub fn identifiers_match(a: &str, b: &str) -> bool {
    if is_quoted(a) || is_quoted(b) {
        unquote_identifier(a) == unquote_identifier(b)
    } else {
        a.eq_ignore_ascii_case(b)
    }
}

/// Possibly schema-qualified table name
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct TableName {
    pub schema: Option<String>,
    pub name: String,
}

impl TableName {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            schema: None,
            name: name.into(),
        }
    }

    pub fn with_schema(schema: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            schema: Some(schema.into()),
            name: name.into(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.name.is_empty()
    }
}

impl fmt::Display for TableName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.schema {
            Some(schema) => write!(f, "{}.{}", schema, self.name),
            None => write!(f, "{}", self.name),
        }
    }
}

impl From<&str> for TableName {
    fn from(name: &str) -> Self {
        match name.split_once('.') {
            Some((schema, table)) => TableName::with_schema(schema, table),
            None => TableName::new(name),
        }
    }
}

/// One entry of the SELECT list
#[derive(Debug, Clone, PartialEq)]
pub struct SelectField {
    pub expr: Expr,
    /// Output alias (`AS name`)
    pub alias: Option<String>,
}

impl SelectField {
    pub fn new(expr: Expr) -> Self {
        Self { expr, alias: None }
    }

    pub fn aliased(expr: Expr, alias: impl Into<String>) -> Self {
        Self {
            expr,
            alias: Some(alias.into()),
        }
    }

    /// Name of the produced column, when it can be told statically
    pub fn output_name(&self) -> Option<&str> {
        if let Some(alias) = &self.alias {
            return Some(alias);
        }
        match &self.expr {
            Expr::Column(c) if !c.is_star() => Some(&c.column),
            _ => None,
        }
    }
}

/// What a FROM target reads from
#[derive(Debug, Clone, PartialEq)]
pub enum TargetSource {
    Table(TableName),
    /// Derived table; holds a SELECT or COMPOUND statement
    Subselect(Box<Statement>),
}

/// One FROM target
#[derive(Debug, Clone, PartialEq)]
pub struct Target {
    pub source: TargetSource,
    pub alias: Option<String>,
}

impl Target {
    pub fn table(name: impl Into<TableName>) -> Self {
        Self {
            source: TargetSource::Table(name.into()),
            alias: None,
        }
    }

    pub fn aliased(name: impl Into<TableName>, alias: impl Into<String>) -> Self {
        Self {
            source: TargetSource::Table(name.into()),
            alias: Some(alias.into()),
        }
    }

    pub fn table_name(&self) -> Option<&TableName> {
        match &self.source {
            TargetSource::Table(t) => Some(t),
            TargetSource::Subselect(_) => None,
        }
    }

    /// Name other clauses use to qualify this target's columns
    pub fn reference_name(&self) -> Option<&str> {
        match (&self.alias, &self.source) {
            (Some(alias), _) => Some(alias),
            (None, TargetSource::Table(t)) => Some(&t.name),
            (None, TargetSource::Subselect(_)) => None,
        }
    }

    /// Whether `qualifier` designates this target
    pub fn answers_to(&self, qualifier: &str) -> bool {
        match (&self.alias, &self.source) {
            (Some(alias), _) => identifiers_match(alias, qualifier),
            (None, TargetSource::Table(t)) => {
                identifiers_match(&t.name, qualifier)
                    || qualifier.split_once('.').is_some_and(|(schema, name)| {
                        t.schema
                            .as_deref()
                            .is_some_and(|s| identifiers_match(s, schema))
                            && identifiers_match(&t.name, name)
                    })
            }
            (None, TargetSource::Subselect(_)) => false,
        }
    }
}

/// Join kind
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum JoinKind {
    Cross,
    Natural,
    Inner,
    LeftOuter,
    RightOuter,
    FullOuter,
}

impl JoinKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            JoinKind::Cross => "CROSS",
            JoinKind::Natural => "NATURAL",
            JoinKind::Inner => "INNER",
            JoinKind::LeftOuter => "LEFT",
            JoinKind::RightOuter => "RIGHT",
            JoinKind::FullOuter => "FULL",
        }
    }

    /// Keyword sequence in SQL text
    pub fn sql(&self) -> &'static str {
        match self {
            JoinKind::Cross => "CROSS JOIN",
            JoinKind::Natural => "NATURAL JOIN",
            JoinKind::Inner => "INNER JOIN",
            JoinKind::LeftOuter => "LEFT JOIN",
            JoinKind::RightOuter => "RIGHT JOIN",
            JoinKind::FullOuter => "FULL JOIN",
        }
    }
}

/// Join of the target at `position` with the targets before it
#[derive(Debug, Clone, PartialEq)]
pub struct Join {
    pub kind: JoinKind,
    /// Index into `FromClause::targets`, at least 1
    pub position: usize,
    pub on: Option<Expr>,
    pub using: Vec<String>,
}

impl Join {
    pub fn new(kind: JoinKind, position: usize) -> Self {
        Self {
            kind,
            position,
            on: None,
            using: Vec::new(),
        }
    }

    pub fn on(mut self, cond: Expr) -> Self {
        self.on = Some(cond);
        self
    }

    pub fn using(mut self, columns: Vec<String>) -> Self {
        self.using = columns;
        self
    }
}

/// FROM clause
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FromClause {
    pub targets: Vec<Target>,
    pub joins: Vec<Join>,
}

impl FromClause {
    pub fn new(target: Target) -> Self {
        Self {
            targets: vec![target],
            joins: Vec::new(),
        }
    }

    /// Append a target, returning its position
    pub fn add_target(&mut self, target: Target) -> usize {
        self.targets.push(target);
        self.targets.len() - 1
    }

    pub fn add_join(&mut self, join: Join) {
        self.joins.push(join);
    }

    pub fn join_at(&self, position: usize) -> Option<&Join> {
        self.joins.iter().find(|j| j.position == position)
    }

    pub fn find_target(&self, qualifier: &str) -> Option<(usize, &Target)> {
        self.targets
            .iter()
            .enumerate()
            .find(|(_, t)| t.answers_to(qualifier))
    }
}

/// ORDER BY item
#[derive(Debug, Clone, PartialEq)]
pub struct OrderItem {
    pub expr: Expr,
    pub ascending: bool,
    pub collation: Option<String>,
}

impl OrderItem {
    pub fn asc(expr: Expr) -> Self {
        Self {
            expr,
            ascending: true,
            collation: None,
        }
    }

    pub fn desc(expr: Expr) -> Self {
        Self {
            expr,
            ascending: false,
            collation: None,
        }
    }
}

/// SELECT statement contents
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Select {
    pub distinct: bool,
    /// `DISTINCT ON (expr)`
    pub distinct_on: Option<Expr>,
    pub fields: Vec<SelectField>,
    pub from: Option<FromClause>,
    pub where_: Option<Expr>,
    pub group_by: Vec<Expr>,
    pub having: Option<Expr>,
    pub order_by: Vec<OrderItem>,
    pub limit: Option<Expr>,
    pub offset: Option<Expr>,
}

impl Select {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_field(&mut self, field: SelectField) {
        self.fields.push(field);
    }

    /// Append a FROM target, creating the FROM clause when absent
    pub fn add_target(&mut self, target: Target) -> usize {
        self.from.get_or_insert_with(FromClause::default).add_target(target)
    }

    /// Replace the WHERE condition, returning the detached one
    pub fn set_where(&mut self, cond: Option<Expr>) -> Option<Expr> {
        std::mem::replace(&mut self.where_, cond)
    }

    /// Number of output columns, unknown when a `*` is selected
    pub fn output_width(&self) -> Option<usize> {
        if self
            .fields
            .iter()
            .any(|f| matches!(&f.expr, Expr::Column(c) if c.is_star()))
        {
            None
        } else {
            Some(self.fields.len())
        }
    }

    pub fn is_aggregate(&self) -> bool {
        !self.group_by.is_empty()
            || self.having.is_some()
            || self.fields.iter().any(|f| f.expr.contains_aggregate())
    }
}

/// Set operator of a compound statement
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CompoundOp {
    Union,
    UnionAll,
    Intersect,
    IntersectAll,
    Except,
    ExceptAll,
}

impl CompoundOp {
    pub fn as_str(&self) -> &'static str {
        match self {
            CompoundOp::Union => "UNION",
            CompoundOp::UnionAll => "UNION ALL",
            CompoundOp::Intersect => "INTERSECT",
            CompoundOp::IntersectAll => "INTERSECT ALL",
            CompoundOp::Except => "EXCEPT",
            CompoundOp::ExceptAll => "EXCEPT ALL",
        }
    }
}

/// COMPOUND statement contents; members are SELECT or COMPOUND statements
#[derive(Debug, Clone, PartialEq)]
pub struct Compound {
    pub op: CompoundOp,
    pub members: Vec<Statement>,
}

impl Compound {
    pub fn new(op: CompoundOp) -> Self {
        Self {
            op,
            members: Vec::new(),
        }
    }

    pub fn output_width(&self) -> Option<usize> {
        self.members.first().and_then(Statement::output_width)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_target_reference_name() {
        let t = Target::table("products");
        assert_eq!(t.reference_name(), Some("products"));
        assert!(t.answers_to("products"));

        let t = Target::aliased("products", "p");
        assert_eq!(t.reference_name(), Some("p"));
        assert!(t.answers_to("p"));
        assert!(!t.answers_to("products"));
    }

    #[test]
    fn test_identifier_matching() {
        assert!(identifiers_match("Products", "products"));
        assert!(identifiers_match("\"Products\"", "Products"));
        assert!(!identifiers_match("\"Products\"", "products"));
        assert_eq!(unquote_identifier("\"a\"\"b\""), "a\"b");

        let t = Target::table("sales.orders");
        assert!(t.answers_to("ORDERS"));
        assert!(t.answers_to("sales.orders"));
        assert!(!t.answers_to("other.orders"));
    }

    #[test]
    fn test_table_name_from_dotted() {
        let t = TableName::from("sales.orders");
        assert_eq!(t.schema.as_deref(), Some("sales"));
        assert_eq!(t.name, "orders");
        assert_eq!(t.to_string(), "sales.orders");
    }

    #[test]
    fn test_set_where_detaches_previous() {
        let mut select = Select::new();
        assert_eq!(select.set_where(Some(Expr::value(true))), None);
        let old = select.set_where(None);
        assert_eq!(old, Some(Expr::value(true)));
        assert!(select.where_.is_none());
    }

    #[test]
    fn test_output_width() {
        let mut select = Select::new();
        select.add_field(SelectField::new(Expr::column("a")));
        select.add_field(SelectField::new(Expr::column("b")));
        assert_eq!(select.output_width(), Some(2));
        select.add_field(SelectField::new(Expr::column("*")));
        assert_eq!(select.output_width(), None);
    }
}
