//! Value and expression model

use super::param::ParamSpec;
use super::Statement;
use crate::catalog::DataType;
use std::fmt;

/// A SQL literal value
#[derive(Debug, Clone, PartialEq)]
pub enum Literal {
    Null,
    Bool(bool),
    Int64(i64),
    Float64(f64),
    Text(String),
    Bytes(Vec<u8>),
    /// Exact numeric kept as written, e.g. `12.50`
    Numeric(String),
}

impl Literal {
    /// Render as SQL literal text
    pub fn to_sql(&self) -> String {
        match self {
            Literal::Null => "NULL".to_string(),
            Literal::Bool(true) => "TRUE".to_string(),
            Literal::Bool(false) => "FALSE".to_string(),
            Literal::Int64(n) => n.to_string(),
            // Debug keeps a fractional part on whole floats
            Literal::Float64(n) if n.is_finite() => format!("{:?}", n),
            // no bare SQL token for these, spell them as a typed string
            Literal::Float64(n) => {
                let text = if n.is_nan() {
                    "NaN"
                } else if *n > 0.0 {
                    "Infinity"
                } else {
                    "-Infinity"
                };
                format!("CAST('{}' AS double precision)", text)
            }
            Literal::Text(s) => format!("'{}'", s.replace('\'', "''")),
            Literal::Bytes(bytes) => {
                let hex: String = bytes.iter().map(|b| format!("{:02X}", b)).collect();
                format!("X'{}'", hex)
            }
            Literal::Numeric(s) => s.clone(),
        }
    }

    pub fn is_null(&self) -> bool {
        matches!(self, Literal::Null)
    }

    /// The value a column of the given type holds when it is "zero"
    pub fn zero_for(data_type: Option<&DataType>) -> Literal {
        match data_type {
            None => Literal::Int64(0),
            Some(t) if t.is_integer() => Literal::Int64(0),
            Some(DataType::Float) | Some(DataType::Double) => Literal::Float64(0.0),
            Some(DataType::Decimal(..)) => Literal::Numeric("0".to_string()),
            Some(DataType::Boolean) => Literal::Bool(false),
            Some(_) => Literal::Text("0".to_string()),
        }
    }

    /// Exact integer value, if this literal holds one without loss
    pub fn to_i64(&self) -> Option<i64> {
        match self {
            Literal::Int64(n) => Some(*n),
            Literal::Bool(b) => Some(i64::from(*b)),
            Literal::Float64(f) => {
                if f.fract() == 0.0 && *f >= i64::MIN as f64 && *f < i64::MAX as f64 {
                    Some(*f as i64)
                } else {
                    None
                }
            }
            Literal::Text(s) | Literal::Numeric(s) => s.trim().parse().ok(),
            Literal::Null | Literal::Bytes(_) => None,
        }
    }

    /// Floating point value, if representable
    pub fn to_f64(&self) -> Option<f64> {
        match self {
            Literal::Int64(n) => Some(*n as f64),
            Literal::Float64(f) => Some(*f),
            Literal::Text(s) | Literal::Numeric(s) => s.trim().parse().ok(),
            _ => None,
        }
    }

    pub fn as_text(&self) -> Option<&str> {
        match self {
            Literal::Text(s) => Some(s),
            _ => None,
        }
    }
}

impl From<i64> for Literal {
    fn from(n: i64) -> Self {
        Literal::Int64(n)
    }
}

impl From<i32> for Literal {
    fn from(n: i32) -> Self {
        Literal::Int64(i64::from(n))
    }
}

impl From<f64> for Literal {
    fn from(n: f64) -> Self {
        Literal::Float64(n)
    }
}

impl From<bool> for Literal {
    fn from(b: bool) -> Self {
        Literal::Bool(b)
    }
}

impl From<&str> for Literal {
    fn from(s: &str) -> Self {
        Literal::Text(s.to_string())
    }
}

impl From<String> for Literal {
    fn from(s: String) -> Self {
        Literal::Text(s)
    }
}

impl From<Vec<u8>> for Literal {
    fn from(bytes: Vec<u8>) -> Self {
        Literal::Bytes(bytes)
    }
}

impl fmt::Display for Literal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_sql())
    }
}

/// Column reference (`col`, `t.col`, `t.*`)
#[derive(Debug, Clone, PartialEq)]
pub struct ColumnRef {
    /// Table name or alias qualifier
    pub table: Option<String>,
    /// Column name, `*` for all columns
    pub column: String,
}

impl ColumnRef {
    pub fn new(column: impl Into<String>) -> Self {
        Self {
            table: None,
            column: column.into(),
        }
    }

    pub fn qualified(table: impl Into<String>, column: impl Into<String>) -> Self {
        Self {
            table: Some(table.into()),
            column: column.into(),
        }
    }

    pub fn is_star(&self) -> bool {
        self.column == "*"
    }

    /// Dotted form as written in SQL
    pub fn full_name(&self) -> String {
        match &self.table {
            Some(t) => format!("{}.{}", t, self.column),
            None => self.column.clone(),
        }
    }
}

/// Operation arity rule
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Arity {
    Exactly(usize),
    AtLeast(usize),
}

impl Arity {
    pub fn accepts(&self, count: usize) -> bool {
        match self {
            Arity::Exactly(n) => count == *n,
            Arity::AtLeast(n) => count >= *n,
        }
    }
}

impl fmt::Display for Arity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Arity::Exactly(n) => write!(f, "exactly {}", n),
            Arity::AtLeast(n) => write!(f, "at least {}", n),
        }
    }
}

/// Operators of `Expr::Operation`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Operator {
    And,
    Or,
    Not,
    Eq,
    Is,
    IsNull,
    IsNotNull,
    In,
    NotIn,
    Like,
    NotLike,
    Ilike,
    NotIlike,
    Between,
    Gt,
    Lt,
    Geq,
    Leq,
    Diff,
    Regexp,
    RegexpCi,
    NotRegexp,
    NotRegexpCi,
    SimilarTo,
    Concat,
    Plus,
    Minus,
    Star,
    Div,
    Rem,
    BitAnd,
    BitOr,
    BitNot,
}

impl Operator {
    /// Name used in the JSON form
    pub fn as_str(&self) -> &'static str {
        match self {
            Operator::And => "AND",
            Operator::Or => "OR",
            Operator::Not => "NOT",
            Operator::Eq => "=",
            Operator::Is => "IS",
            Operator::IsNull => "IS NULL",
            Operator::IsNotNull => "IS NOT NULL",
            Operator::In => "IN",
            Operator::NotIn => "NOT IN",
            Operator::Like => "LIKE",
            Operator::NotLike => "NOT LIKE",
            Operator::Ilike => "ILIKE",
            Operator::NotIlike => "NOT ILIKE",
            Operator::Between => "BETWEEN",
            Operator::Gt => ">",
            Operator::Lt => "<",
            Operator::Geq => ">=",
            Operator::Leq => "<=",
            Operator::Diff => "!=",
            Operator::Regexp => "RE",
            Operator::RegexpCi => "CI_RE",
            Operator::NotRegexp => "!RE",
            Operator::NotRegexpCi => "!CI_RE",
            Operator::SimilarTo => "SIMILAR TO",
            Operator::Concat => "||",
            Operator::Plus => "+",
            Operator::Minus => "-",
            Operator::Star => "*",
            Operator::Div => "/",
            Operator::Rem => "%",
            Operator::BitAnd => "&",
            Operator::BitOr => "|",
            Operator::BitNot => "~",
        }
    }

    /// Token used in SQL text
    pub fn sql_token(&self) -> &'static str {
        match self {
            Operator::Regexp => "~",
            Operator::RegexpCi => "~*",
            Operator::NotRegexp => "!~",
            Operator::NotRegexpCi => "!~*",
            other => other.as_str(),
        }
    }

    pub fn arity(&self) -> Arity {
        match self {
            Operator::Not | Operator::IsNull | Operator::IsNotNull | Operator::BitNot => {
                Arity::Exactly(1)
            }
            Operator::Between => Arity::Exactly(3),
            Operator::And | Operator::Or | Operator::In | Operator::NotIn => Arity::AtLeast(2),
            Operator::Concat | Operator::Star => Arity::AtLeast(2),
            Operator::Plus | Operator::Minus => Arity::AtLeast(1),
            _ => Arity::Exactly(2),
        }
    }

    /// Binding strength, higher binds tighter
    pub fn precedence(&self) -> u8 {
        match self {
            Operator::Or => 1,
            Operator::And => 2,
            Operator::Not => 3,
            Operator::Eq
            | Operator::Is
            | Operator::IsNull
            | Operator::IsNotNull
            | Operator::In
            | Operator::NotIn
            | Operator::Like
            | Operator::NotLike
            | Operator::Ilike
            | Operator::NotIlike
            | Operator::Between
            | Operator::Gt
            | Operator::Lt
            | Operator::Geq
            | Operator::Leq
            | Operator::Diff
            | Operator::Regexp
            | Operator::RegexpCi
            | Operator::NotRegexp
            | Operator::NotRegexpCi
            | Operator::SimilarTo => 4,
            Operator::Plus
            | Operator::Minus
            | Operator::Concat
            | Operator::BitAnd
            | Operator::BitOr => 5,
            Operator::Star | Operator::Div | Operator::Rem => 6,
            Operator::BitNot => 7,
        }
    }

    /// Comparison that can be turned into an `IS [NOT] NULL` test
    pub fn is_equality(&self) -> bool {
        matches!(self, Operator::Eq | Operator::Diff)
    }
}

impl fmt::Display for Operator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// One `WHEN ... THEN ...` arm
#[derive(Debug, Clone, PartialEq)]
pub struct CaseArm {
    pub when: Expr,
    pub then: Expr,
}

/// `CASE [subject] WHEN .. THEN .. [ELSE ..] END`
#[derive(Debug, Clone, PartialEq)]
pub struct CaseExpr {
    pub subject: Option<Box<Expr>>,
    pub arms: Vec<CaseArm>,
    pub else_: Option<Box<Expr>>,
}

/// Expression node
#[derive(Debug, Clone, PartialEq)]
pub enum Expr {
    /// Literal value
    Value(Literal),
    /// Identifier value (column reference)
    Column(ColumnRef),
    /// The `DEFAULT` keyword
    Default,
    /// Parameter placeholder
    Placeholder(ParamSpec),
    /// Function call
    Function { name: String, args: Vec<Expr> },
    /// Operator application
    Operation { op: Operator, operands: Vec<Expr> },
    /// Sub-select; holds a SELECT statement
    Subselect(Box<Statement>),
    /// Compound sub-select; holds a COMPOUND statement
    Compound(Box<Statement>),
    Case(CaseExpr),
    CastAs { expr: Box<Expr>, type_name: String },
}

impl Expr {
    pub fn value(literal: impl Into<Literal>) -> Self {
        Expr::Value(literal.into())
    }

    pub fn null() -> Self {
        Expr::Value(Literal::Null)
    }

    pub fn column(name: impl Into<String>) -> Self {
        Expr::Column(ColumnRef::new(name))
    }

    pub fn qualified_column(table: impl Into<String>, column: impl Into<String>) -> Self {
        Expr::Column(ColumnRef::qualified(table, column))
    }

    pub fn as_column(&self) -> Option<&ColumnRef> {
        match self {
            Expr::Column(c) => Some(c),
            _ => None,
        }
    }

    pub fn as_placeholder(&self) -> Option<&ParamSpec> {
        match self {
            Expr::Placeholder(spec) => Some(spec),
            _ => None,
        }
    }

    /// True when the expression calls an aggregate function at any depth
    /// outside of nested sub-selects
    pub fn contains_aggregate(&self) -> bool {
        match self {
            Expr::Function { name, args } => {
                crate::functions::is_aggregate(name) || args.iter().any(Expr::contains_aggregate)
            }
            Expr::Operation { operands, .. } => operands.iter().any(Expr::contains_aggregate),
            Expr::Case(case) => {
                case.subject.as_deref().is_some_and(Expr::contains_aggregate)
                    || case
                        .arms
                        .iter()
                        .any(|arm| arm.when.contains_aggregate() || arm.then.contains_aggregate())
                    || case.else_.as_deref().is_some_and(Expr::contains_aggregate)
            }
            Expr::CastAs { expr, .. } => expr.contains_aggregate(),
            _ => false,
        }
    }
}

impl From<Literal> for Expr {
    fn from(literal: Literal) -> Self {
        Expr::Value(literal)
    }
}

impl From<ColumnRef> for Expr {
    fn from(column: ColumnRef) -> Self {
        Expr::Column(column)
    }
}

impl From<ParamSpec> for Expr {
    fn from(spec: ParamSpec) -> Self {
        Expr::Placeholder(spec)
    }
}
