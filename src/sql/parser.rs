//! SQL Parser
//!
//! This module parses SQL tokens into a statement tree. AND/OR chains become
//! one n-ary operation, parentheses leave no node behind, and a unary minus
//! applied to a numeric literal is folded into the literal.

use super::lexer::Lexer;
use super::token::Token;
use crate::error::{Error, Result};
use crate::stmt::{
    parse_keyword_spec, parse_param_spec, CaseArm, CaseExpr, ColumnRef, Compound, CompoundOp,
    Contents, Delete, Expr, FromClause, Insert, IsolationLevel, Join, JoinKind, Literal,
    Operator, OrderItem, Select, SelectField, Statement, TableName, Target, TargetSource,
    Transaction, Update, ValuesOrSelect,
};

/// SQL Parser
pub struct Parser {
    tokens: Vec<Token>,
    position: usize,
}

impl Parser {
    /// Create a new parser from a SQL string
    pub fn new(sql: &str) -> Result<Self> {
        let mut lexer = Lexer::new(sql);
        let tokens = lexer.tokenize()?;

        Ok(Self {
            tokens,
            position: 0,
        })
    }

    /// Parse a single SQL statement
    pub fn parse(&mut self) -> Result<Statement> {
        let stmt = self.parse_statement()?;

        // Consume optional semicolon
        if self.check(&Token::Semicolon) {
            self.advance();
        }

        Ok(stmt)
    }

    /// Parse multiple SQL statements
    pub fn parse_all(&mut self) -> Result<Vec<Statement>> {
        let mut statements = Vec::new();

        while !self.is_at_end() {
            if self.check(&Token::Semicolon) {
                self.advance();
                continue;
            }
            statements.push(self.parse()?);
        }

        Ok(statements)
    }

    pub fn is_at_end(&self) -> bool {
        matches!(self.current(), Token::Eof)
    }

    /// Fail unless all input has been consumed
    pub fn expect_end(&self) -> Result<()> {
        if self.is_at_end() {
            Ok(())
        } else {
            Err(Error::UnexpectedToken {
                expected: "end of statement".to_string(),
                found: format!("{}", self.current()),
            })
        }
    }

    /// Parse a single statement
    fn parse_statement(&mut self) -> Result<Statement> {
        match self.current() {
            Token::Select | Token::LParen => self.parse_query(),
            Token::Insert => self.parse_insert().map(Statement::insert),
            Token::Update => self.parse_update().map(Statement::update),
            Token::Delete => self.parse_delete().map(Statement::delete),
            Token::Begin => self.parse_begin(),
            Token::Commit => self.parse_commit(),
            Token::Rollback => self.parse_rollback(),
            Token::Savepoint => self.parse_savepoint(),
            Token::Release => self.parse_release(),
            _ => Err(self.unexpected(
                "SELECT, INSERT, UPDATE, DELETE, BEGIN, COMMIT, ROLLBACK, SAVEPOINT or RELEASE",
            )),
        }
    }

    // ========== Queries ==========

    /// SELECT, possibly combined with set operators
    ///
    /// A chain using one operator becomes a single compound; a change of
    /// operator nests what was parsed so far as the first member.
    fn parse_query(&mut self) -> Result<Statement> {
        let mut members = vec![self.parse_query_term()?];
        let mut current: Option<CompoundOp> = None;

        while let Some(op) = self.parse_compound_op() {
            let rhs = self.parse_query_term()?;
            match current {
                Some(c) if c != op => {
                    let nested = Statement::compound(Compound {
                        op: c,
                        members: std::mem::take(&mut members),
                    });
                    members.push(nested);
                }
                _ => {}
            }
            current = Some(op);
            members.push(rhs);
        }

        match current {
            Some(op) => Ok(Statement::compound(Compound { op, members })),
            None => members
                .pop()
                .ok_or_else(|| Error::Internal("empty query".to_string())),
        }
    }

    fn parse_query_term(&mut self) -> Result<Statement> {
        if self.check(&Token::LParen) {
            self.advance();
            let query = self.parse_query()?;
            self.expect(&Token::RParen)?;
            Ok(query)
        } else {
            self.parse_select().map(Statement::select)
        }
    }

    fn parse_compound_op(&mut self) -> Option<CompoundOp> {
        let (plain, all) = match self.current() {
            Token::Union => (CompoundOp::Union, CompoundOp::UnionAll),
            Token::Intersect => (CompoundOp::Intersect, CompoundOp::IntersectAll),
            Token::Except => (CompoundOp::Except, CompoundOp::ExceptAll),
            _ => return None,
        };
        self.advance();
        if self.check(&Token::All) {
            self.advance();
            Some(all)
        } else {
            if self.check(&Token::Distinct) {
                self.advance();
            }
            Some(plain)
        }
    }

    // ========== SELECT Statement ==========

    fn parse_select(&mut self) -> Result<Select> {
        self.expect(&Token::Select)?;

        let mut stmt = Select::new();

        // DISTINCT [ON (expr)]
        if self.check(&Token::Distinct) {
            self.advance();
            stmt.distinct = true;
            if self.check(&Token::On) {
                self.advance();
                self.expect(&Token::LParen)?;
                stmt.distinct_on = Some(self.parse_expr()?);
                self.expect(&Token::RParen)?;
            }
        } else if self.check(&Token::All) {
            self.advance();
        }

        // Select list
        stmt.fields = self.parse_select_list()?;

        // FROM clause
        if self.check(&Token::From) {
            stmt.from = Some(self.parse_from_clause()?);
        }

        // WHERE clause
        if self.check(&Token::Where) {
            self.advance();
            stmt.where_ = Some(self.parse_expr()?);
        }

        // GROUP BY clause
        if self.check(&Token::Group) {
            self.advance();
            self.expect(&Token::By)?;
            stmt.group_by = self.parse_expr_list()?;
        }

        // HAVING clause
        if self.check(&Token::Having) {
            self.advance();
            stmt.having = Some(self.parse_expr()?);
        }

        // ORDER BY clause
        if self.check(&Token::Order) {
            self.advance();
            self.expect(&Token::By)?;
            stmt.order_by = self.parse_order_by_list()?;
        }

        // LIMIT clause
        if self.check(&Token::Limit) {
            self.advance();
            stmt.limit = Some(self.parse_expr()?);
        }

        // OFFSET clause
        if self.check(&Token::Offset) {
            self.advance();
            stmt.offset = Some(self.parse_expr()?);
        }

        Ok(stmt)
    }

    fn parse_select_list(&mut self) -> Result<Vec<SelectField>> {
        let mut items = Vec::new();

        loop {
            items.push(self.parse_select_item()?);

            if !self.check(&Token::Comma) {
                break;
            }
            self.advance(); // consume comma
        }

        Ok(items)
    }

    fn parse_select_item(&mut self) -> Result<SelectField> {
        if self.check(&Token::Asterisk) {
            self.advance();
            return Ok(SelectField::new(Expr::Column(ColumnRef::new("*"))));
        }

        let expr = self.parse_expr()?;
        let alias = self.parse_alias()?;
        Ok(SelectField { expr, alias })
    }

    /// `AS name` or a bare identifier following an expression or target
    fn parse_alias(&mut self) -> Result<Option<String>> {
        if self.check(&Token::As) {
            self.advance();
            return match self.current().clone() {
                Token::Identifier(name) | Token::StringLiteral(name) => {
                    self.advance();
                    Ok(Some(name))
                }
                _ => Err(self.unexpected("alias")),
            };
        }
        if let Token::Identifier(name) = self.current().clone() {
            self.advance();
            return Ok(Some(name));
        }
        Ok(None)
    }

    fn parse_from_clause(&mut self) -> Result<FromClause> {
        self.expect(&Token::From)?;

        let mut from = FromClause::default();
        loop {
            let target = self.parse_target()?;
            from.add_target(target);

            // Parse JOINs
            while let Some(kind) = self.parse_join_kind()? {
                let target = self.parse_target()?;
                let position = from.add_target(target);
                let mut join = Join::new(kind, position);

                if self.check(&Token::On) {
                    self.advance();
                    join.on = Some(self.parse_expr()?);
                } else if self.check(&Token::Using) {
                    self.advance();
                    self.expect(&Token::LParen)?;
                    join.using = self.parse_identifier_list()?;
                    self.expect(&Token::RParen)?;
                }
                from.add_join(join);
            }

            if !self.check(&Token::Comma) {
                break;
            }
            self.advance();
        }

        Ok(from)
    }

    fn parse_target(&mut self) -> Result<Target> {
        let source = if self.check(&Token::LParen) {
            self.advance();
            let query = self.parse_query()?;
            self.expect(&Token::RParen)?;
            TargetSource::Subselect(Box::new(query))
        } else {
            TargetSource::Table(self.parse_table_name()?)
        };
        let alias = self.parse_alias()?;
        Ok(Target { source, alias })
    }

    fn parse_table_name(&mut self) -> Result<TableName> {
        let first = self.expect_identifier()?;
        if self.check(&Token::Dot) {
            self.advance();
            let name = self.expect_identifier()?;
            Ok(TableName::with_schema(first, name))
        } else {
            Ok(TableName::new(first))
        }
    }

    /// Join keywords up to and including JOIN, if present
    fn parse_join_kind(&mut self) -> Result<Option<JoinKind>> {
        let kind = match self.current() {
            Token::Join => JoinKind::Inner,
            Token::Inner => {
                self.advance();
                JoinKind::Inner
            }
            Token::Cross => {
                self.advance();
                JoinKind::Cross
            }
            Token::Natural => {
                self.advance();
                // NATURAL LEFT JOIN etc. keep the natural semantics
                if matches!(
                    self.current(),
                    Token::Inner | Token::Left | Token::Right | Token::Full
                ) {
                    self.advance();
                    if self.check(&Token::Outer) {
                        self.advance();
                    }
                }
                JoinKind::Natural
            }
            Token::Left | Token::Right | Token::Full => {
                let kind = match self.current() {
                    Token::Left => JoinKind::LeftOuter,
                    Token::Right => JoinKind::RightOuter,
                    _ => JoinKind::FullOuter,
                };
                self.advance();
                if self.check(&Token::Outer) {
                    self.advance();
                }
                kind
            }
            _ => return Ok(None),
        };
        self.expect(&Token::Join)?;
        Ok(Some(kind))
    }

    fn parse_order_by_list(&mut self) -> Result<Vec<OrderItem>> {
        let mut items = Vec::new();

        loop {
            let expr = self.parse_expr()?;
            let collation = if self.check(&Token::Collate) {
                self.advance();
                Some(self.expect_identifier()?)
            } else {
                None
            };
            let ascending = if self.check(&Token::Desc) {
                self.advance();
                false
            } else {
                if self.check(&Token::Asc) {
                    self.advance();
                }
                true
            };

            items.push(OrderItem {
                expr,
                ascending,
                collation,
            });

            if !self.check(&Token::Comma) {
                break;
            }
            self.advance();
        }

        Ok(items)
    }

    // ========== INSERT Statement ==========

    fn parse_insert(&mut self) -> Result<Insert> {
        self.expect(&Token::Insert)?;

        // INSERT OR REPLACE / OR IGNORE ...
        let on_conflict = if self.check(&Token::Or) {
            self.advance();
            Some(self.expect_identifier()?.to_uppercase())
        } else {
            None
        };
        self.expect(&Token::Into)?;

        let mut insert = Insert::new(self.parse_table_name()?);
        insert.on_conflict = on_conflict;

        // Optional column list
        if self.check(&Token::LParen) && self.peek() != Some(&Token::Select) {
            self.advance();
            insert.fields = self.parse_identifier_list()?;
            self.expect(&Token::RParen)?;
        }

        insert.rows = match self.current() {
            Token::Values => {
                self.advance();
                let mut rows = Vec::new();
                loop {
                    self.expect(&Token::LParen)?;
                    rows.push(self.parse_expr_list()?);
                    self.expect(&Token::RParen)?;

                    if !self.check(&Token::Comma) {
                        break;
                    }
                    self.advance();
                }
                ValuesOrSelect::Values(rows)
            }
            Token::Default => {
                self.advance();
                self.expect(&Token::Values)?;
                ValuesOrSelect::DefaultValues
            }
            Token::Select | Token::LParen => ValuesOrSelect::Select(Box::new(self.parse_query()?)),
            _ => return Err(self.unexpected("VALUES, SELECT or DEFAULT VALUES")),
        };

        Ok(insert)
    }

    // ========== UPDATE Statement ==========

    fn parse_update(&mut self) -> Result<Update> {
        self.expect(&Token::Update)?;

        let mut update = Update::new(self.parse_table_name()?);

        self.expect(&Token::Set)?;

        loop {
            let column = self.expect_identifier()?;
            self.expect(&Token::Eq)?;
            let value = self.parse_expr()?;
            update.add_assignment(column, value);

            if !self.check(&Token::Comma) {
                break;
            }
            self.advance();
        }

        if self.check(&Token::Where) {
            self.advance();
            update.where_ = Some(self.parse_expr()?);
        }

        Ok(update)
    }

    // ========== DELETE Statement ==========

    fn parse_delete(&mut self) -> Result<Delete> {
        self.expect(&Token::Delete)?;
        self.expect(&Token::From)?;

        let mut delete = Delete::new(self.parse_table_name()?);

        if self.check(&Token::Where) {
            self.advance();
            delete.where_ = Some(self.parse_expr()?);
        }

        Ok(delete)
    }

    // ========== Expression Parsing ==========

    pub fn parse_expr(&mut self) -> Result<Expr> {
        self.parse_or_expr()
    }

    fn parse_or_expr(&mut self) -> Result<Expr> {
        let mut operands = vec![self.parse_and_expr()?];

        while self.check(&Token::Or) {
            self.advance();
            operands.push(self.parse_and_expr()?);
        }

        Ok(Self::flatten(Operator::Or, operands))
    }

    fn parse_and_expr(&mut self) -> Result<Expr> {
        let mut operands = vec![self.parse_not_expr()?];

        while self.check(&Token::And) {
            self.advance();
            operands.push(self.parse_not_expr()?);
        }

        Ok(Self::flatten(Operator::And, operands))
    }

    fn flatten(op: Operator, mut operands: Vec<Expr>) -> Expr {
        if operands.len() == 1 {
            operands.remove(0)
        } else {
            Expr::Operation { op, operands }
        }
    }

    fn parse_not_expr(&mut self) -> Result<Expr> {
        if self.check(&Token::Not) {
            self.advance();
            let expr = self.parse_not_expr()?;
            Ok(Self::op(Operator::Not, vec![expr]))
        } else {
            self.parse_comparison_expr()
        }
    }

    fn op(op: Operator, operands: Vec<Expr>) -> Expr {
        Expr::Operation { op, operands }
    }

    fn parse_comparison_expr(&mut self) -> Result<Expr> {
        let left = self.parse_additive_expr()?;

        // IS [NOT] NULL, IS [NOT] expr
        if self.check(&Token::Is) {
            self.advance();
            let negated = if self.check(&Token::Not) {
                self.advance();
                true
            } else {
                false
            };
            if self.check(&Token::Null) {
                self.advance();
                let op = if negated {
                    Operator::IsNotNull
                } else {
                    Operator::IsNull
                };
                return Ok(Self::op(op, vec![left]));
            }
            let right = self.parse_additive_expr()?;
            let is = Self::op(Operator::Is, vec![left, right]);
            return Ok(if negated {
                Self::op(Operator::Not, vec![is])
            } else {
                is
            });
        }

        let negated = if self.check(&Token::Not) {
            self.advance();
            true
        } else {
            false
        };

        match self.current() {
            Token::Between => {
                self.advance();
                let low = self.parse_additive_expr()?;
                self.expect(&Token::And)?;
                let high = self.parse_additive_expr()?;
                let between = Self::op(Operator::Between, vec![left, low, high]);
                return Ok(if negated {
                    Self::op(Operator::Not, vec![between])
                } else {
                    between
                });
            }
            Token::In => {
                self.advance();
                self.expect(&Token::LParen)?;
                let mut operands = vec![left];
                if self.check(&Token::Select) {
                    operands.push(Self::query_expr(self.parse_query()?));
                } else {
                    operands.extend(self.parse_expr_list()?);
                }
                self.expect(&Token::RParen)?;
                let op = if negated { Operator::NotIn } else { Operator::In };
                return Ok(Self::op(op, operands));
            }
            Token::Like | Token::Ilike => {
                let op = match (self.current(), negated) {
                    (Token::Like, false) => Operator::Like,
                    (Token::Like, true) => Operator::NotLike,
                    (_, false) => Operator::Ilike,
                    (_, true) => Operator::NotIlike,
                };
                self.advance();
                let pattern = self.parse_additive_expr()?;
                return Ok(Self::op(op, vec![left, pattern]));
            }
            Token::Similar => {
                self.advance();
                self.expect(&Token::To)?;
                let pattern = self.parse_additive_expr()?;
                let similar = Self::op(Operator::SimilarTo, vec![left, pattern]);
                return Ok(if negated {
                    Self::op(Operator::Not, vec![similar])
                } else {
                    similar
                });
            }
            _ if negated => return Err(self.unexpected("BETWEEN, IN, LIKE, ILIKE or SIMILAR")),
            _ => {}
        }

        // Comparison operators
        let op = match self.current() {
            Token::Eq => Some(Operator::Eq),
            Token::Neq => Some(Operator::Diff),
            Token::Lt => Some(Operator::Lt),
            Token::Gt => Some(Operator::Gt),
            Token::Lte => Some(Operator::Leq),
            Token::Gte => Some(Operator::Geq),
            Token::Tilde => Some(Operator::Regexp),
            Token::TildeStar => Some(Operator::RegexpCi),
            Token::NotTilde => Some(Operator::NotRegexp),
            Token::NotTildeStar => Some(Operator::NotRegexpCi),
            _ => None,
        };

        if let Some(op) = op {
            self.advance();
            let right = self.parse_additive_expr()?;
            Ok(Self::op(op, vec![left, right]))
        } else {
            Ok(left)
        }
    }

    fn parse_additive_expr(&mut self) -> Result<Expr> {
        let mut left = self.parse_multiplicative_expr()?;

        loop {
            let op = match self.current() {
                Token::Plus => Operator::Plus,
                Token::Minus => Operator::Minus,
                Token::Concat => Operator::Concat,
                Token::Ampersand => Operator::BitAnd,
                Token::Pipe => Operator::BitOr,
                _ => break,
            };
            self.advance();
            let right = self.parse_multiplicative_expr()?;
            left = Self::op(op, vec![left, right]);
        }

        Ok(left)
    }

    fn parse_multiplicative_expr(&mut self) -> Result<Expr> {
        let mut left = self.parse_unary_expr()?;

        loop {
            let op = match self.current() {
                Token::Asterisk => Operator::Star,
                Token::Slash => Operator::Div,
                Token::Percent => Operator::Rem,
                _ => break,
            };
            self.advance();
            let right = self.parse_unary_expr()?;
            left = Self::op(op, vec![left, right]);
        }

        Ok(left)
    }

    fn parse_unary_expr(&mut self) -> Result<Expr> {
        match self.current() {
            Token::Minus => {
                self.advance();
                let expr = self.parse_unary_expr()?;
                Ok(match expr {
                    Expr::Value(Literal::Int64(n)) => Expr::Value(Literal::Int64(-n)),
                    Expr::Value(Literal::Float64(n)) => Expr::Value(Literal::Float64(-n)),
                    other => Self::op(Operator::Minus, vec![other]),
                })
            }
            Token::Plus => {
                self.advance();
                let expr = self.parse_unary_expr()?;
                Ok(match expr {
                    Expr::Value(Literal::Int64(_)) | Expr::Value(Literal::Float64(_)) => expr,
                    other => Self::op(Operator::Plus, vec![other]),
                })
            }
            Token::Tilde => {
                self.advance();
                let expr = self.parse_unary_expr()?;
                Ok(Self::op(Operator::BitNot, vec![expr]))
            }
            _ => self.parse_postfix_expr(),
        }
    }

    /// Primary expression followed by any number of `::type` casts
    fn parse_postfix_expr(&mut self) -> Result<Expr> {
        let mut expr = self.parse_primary_expr()?;
        while self.check(&Token::DoubleColon) {
            self.advance();
            let type_name = self.parse_type_name()?;
            expr = Expr::CastAs {
                expr: Box::new(expr),
                type_name,
            };
        }
        Ok(expr)
    }

    fn parse_primary_expr(&mut self) -> Result<Expr> {
        match self.current().clone() {
            // Literals
            Token::IntegerLiteral(n) => {
                self.advance();
                Ok(Expr::Value(Literal::Int64(n)))
            }
            Token::FloatLiteral(n) => {
                self.advance();
                Ok(Expr::Value(Literal::Float64(n)))
            }
            Token::StringLiteral(s) => {
                self.advance();
                Ok(Expr::Value(Literal::Text(s)))
            }
            Token::BlobLiteral(bytes) => {
                self.advance();
                Ok(Expr::Value(Literal::Bytes(bytes)))
            }
            Token::True => {
                self.advance();
                Ok(Expr::Value(Literal::Bool(true)))
            }
            Token::False => {
                self.advance();
                Ok(Expr::Value(Literal::Bool(false)))
            }
            Token::Null => {
                self.advance();
                Ok(Expr::Value(Literal::Null))
            }
            Token::Default => {
                self.advance();
                Ok(Expr::Default)
            }

            // Placeholders
            Token::Placeholder(spec) => {
                self.advance();
                Ok(Expr::Placeholder(parse_param_spec(&spec)?))
            }
            Token::LongPlaceholder(spec) => {
                self.advance();
                Ok(Expr::Placeholder(parse_keyword_spec(&spec)?))
            }

            // Parenthesized expression or subquery
            Token::LParen => {
                self.advance();
                let expr = if self.check(&Token::Select) {
                    Self::query_expr(self.parse_query()?)
                } else {
                    self.parse_expr()?
                };
                self.expect(&Token::RParen)?;
                Ok(expr)
            }

            // EXISTS
            Token::Exists => {
                self.advance();
                self.expect(&Token::LParen)?;
                let query = self.parse_query()?;
                self.expect(&Token::RParen)?;
                Ok(Expr::Function {
                    name: "EXISTS".to_string(),
                    args: vec![Self::query_expr(query)],
                })
            }

            Token::Case => self.parse_case_expr(),

            Token::Cast => {
                self.advance();
                self.expect(&Token::LParen)?;
                let expr = self.parse_expr()?;
                self.expect(&Token::As)?;
                let type_name = self.parse_type_name()?;
                self.expect(&Token::RParen)?;
                Ok(Expr::CastAs {
                    expr: Box::new(expr),
                    type_name,
                })
            }

            // Identifier (column or function)
            Token::Identifier(name) => {
                self.advance();

                if self.check(&Token::LParen) {
                    return self.parse_function_args(name);
                }

                // Qualified column: [schema.]table.column or table.*
                let mut parts = vec![name];
                while self.check(&Token::Dot) {
                    self.advance();
                    if self.check(&Token::Asterisk) {
                        self.advance();
                        parts.push("*".to_string());
                        break;
                    }
                    parts.push(self.expect_identifier()?);
                }
                let column = parts.pop().unwrap_or_default();
                Ok(Expr::Column(ColumnRef {
                    table: if parts.is_empty() {
                        None
                    } else {
                        Some(parts.join("."))
                    },
                    column,
                }))
            }

            _ => Err(self.unexpected("expression")),
        }
    }

    fn parse_function_args(&mut self, name: String) -> Result<Expr> {
        self.expect(&Token::LParen)?;

        let args = if self.check(&Token::Asterisk) {
            self.advance();
            vec![Expr::Column(ColumnRef::new("*"))]
        } else if self.check(&Token::RParen) {
            vec![]
        } else {
            self.parse_expr_list()?
        };

        self.expect(&Token::RParen)?;

        Ok(Expr::Function { name, args })
    }

    fn parse_case_expr(&mut self) -> Result<Expr> {
        self.expect(&Token::Case)?;

        // Simple CASE (CASE expr WHEN ...)
        let subject = if !self.check(&Token::When) {
            Some(Box::new(self.parse_expr()?))
        } else {
            None
        };

        let mut arms = Vec::new();
        while self.check(&Token::When) {
            self.advance();
            let when = self.parse_expr()?;
            self.expect(&Token::Then)?;
            let then = self.parse_expr()?;
            arms.push(CaseArm { when, then });
        }
        if arms.is_empty() {
            return Err(self.unexpected("WHEN"));
        }

        let else_ = if self.check(&Token::Else) {
            self.advance();
            Some(Box::new(self.parse_expr()?))
        } else {
            None
        };

        self.expect(&Token::End)?;

        Ok(Expr::Case(CaseExpr {
            subject,
            arms,
            else_,
        }))
    }

    /// Type name with an optional `(n[, m])` suffix, kept as text
    fn parse_type_name(&mut self) -> Result<String> {
        let mut name = self.expect_identifier()?;
        // multi-word names such as `double precision`
        while let Token::Identifier(word) = self.current().clone() {
            self.advance();
            name.push(' ');
            name.push_str(&word);
        }
        if self.check(&Token::LParen) {
            self.advance();
            let mut args = vec![self.expect_integer()?.to_string()];
            while self.check(&Token::Comma) {
                self.advance();
                args.push(self.expect_integer()?.to_string());
            }
            self.expect(&Token::RParen)?;
            name = format!("{}({})", name, args.join(","));
        }
        Ok(name)
    }

    fn query_expr(query: Statement) -> Expr {
        match query.contents {
            Contents::Compound(_) => Expr::Compound(Box::new(query)),
            _ => Expr::Subselect(Box::new(query)),
        }
    }

    // ========== Transaction Statements ==========

    fn parse_begin(&mut self) -> Result<Statement> {
        self.expect(&Token::Begin)?;
        if self.check(&Token::Transaction) {
            self.advance();
        }
        let mut trans = Transaction::default();
        if let Token::Identifier(name) = self.current().clone() {
            if !name.eq_ignore_ascii_case("ISOLATION") {
                self.advance();
                trans.name = Some(name);
            }
        }
        if self.check_word("ISOLATION") {
            self.advance();
            self.expect_word("LEVEL")?;
            trans.isolation = Some(self.parse_isolation_level()?);
        }
        Ok(Statement::new(Contents::Begin(trans)))
    }

    fn parse_isolation_level(&mut self) -> Result<IsolationLevel> {
        if self.check_word("SERIALIZABLE") {
            self.advance();
            Ok(IsolationLevel::Serializable)
        } else if self.check_word("REPEATABLE") {
            self.advance();
            self.expect_word("READ")?;
            Ok(IsolationLevel::RepeatableRead)
        } else {
            self.expect_word("READ")?;
            if self.check_word("COMMITTED") {
                self.advance();
                Ok(IsolationLevel::ReadCommitted)
            } else {
                self.expect_word("UNCOMMITTED")?;
                Ok(IsolationLevel::ReadUncommitted)
            }
        }
    }

    fn parse_commit(&mut self) -> Result<Statement> {
        self.expect(&Token::Commit)?;
        if self.check(&Token::Transaction) {
            self.advance();
        }
        let trans = Transaction {
            name: self.parse_optional_name(),
            isolation: None,
        };
        Ok(Statement::new(Contents::Commit(trans)))
    }

    fn parse_rollback(&mut self) -> Result<Statement> {
        self.expect(&Token::Rollback)?;
        if self.check(&Token::Transaction) {
            self.advance();
        }
        if self.check(&Token::To) {
            self.advance();
            if self.check(&Token::Savepoint) {
                self.advance();
            }
            let name = self.expect_identifier()?;
            return Ok(Statement::new(Contents::RollbackSavepoint(
                Transaction::named(name),
            )));
        }
        let trans = Transaction {
            name: self.parse_optional_name(),
            isolation: None,
        };
        Ok(Statement::new(Contents::Rollback(trans)))
    }

    fn parse_savepoint(&mut self) -> Result<Statement> {
        self.expect(&Token::Savepoint)?;
        let name = self.expect_identifier()?;
        Ok(Statement::new(Contents::Savepoint(Transaction::named(name))))
    }

    fn parse_release(&mut self) -> Result<Statement> {
        self.expect(&Token::Release)?;
        if self.check(&Token::Savepoint) {
            self.advance();
        }
        let name = self.expect_identifier()?;
        Ok(Statement::new(Contents::DeleteSavepoint(Transaction::named(
            name,
        ))))
    }

    fn parse_optional_name(&mut self) -> Option<String> {
        match self.current().clone() {
            Token::Identifier(name) => {
                self.advance();
                Some(name)
            }
            _ => None,
        }
    }

    // ========== Helper functions ==========

    fn parse_expr_list(&mut self) -> Result<Vec<Expr>> {
        let mut exprs = Vec::new();

        loop {
            exprs.push(self.parse_expr()?);

            if !self.check(&Token::Comma) {
                break;
            }
            self.advance();
        }

        Ok(exprs)
    }

    fn parse_identifier_list(&mut self) -> Result<Vec<String>> {
        let mut identifiers = Vec::new();

        loop {
            identifiers.push(self.expect_identifier()?);

            if !self.check(&Token::Comma) {
                break;
            }
            self.advance();
        }

        Ok(identifiers)
    }

    fn current(&self) -> &Token {
        self.tokens.get(self.position).unwrap_or(&Token::Eof)
    }

    fn peek(&self) -> Option<&Token> {
        self.tokens.get(self.position + 1)
    }

    fn advance(&mut self) {
        if self.position < self.tokens.len() {
            self.position += 1;
        }
    }

    fn check(&self, token: &Token) -> bool {
        std::mem::discriminant(self.current()) == std::mem::discriminant(token)
    }

    /// Non-reserved word, lexed as an identifier
    fn check_word(&self, word: &str) -> bool {
        matches!(self.current(), Token::Identifier(w) if w.eq_ignore_ascii_case(word))
    }

    fn expect_word(&mut self, word: &str) -> Result<()> {
        if self.check_word(word) {
            self.advance();
            Ok(())
        } else {
            Err(self.unexpected(word))
        }
    }

    fn unexpected(&self, expected: &str) -> Error {
        match self.current() {
            Token::Eof => Error::UnexpectedEof(expected.to_string()),
            found => Error::UnexpectedToken {
                expected: expected.to_string(),
                found: format!("{}", found),
            },
        }
    }

    fn expect(&mut self, token: &Token) -> Result<()> {
        if self.check(token) {
            self.advance();
            Ok(())
        } else {
            Err(self.unexpected(&token.to_string()))
        }
    }

    fn expect_identifier(&mut self) -> Result<String> {
        match self.current().clone() {
            Token::Identifier(name) => {
                self.advance();
                Ok(name)
            }
            _ => Err(self.unexpected("identifier")),
        }
    }

    fn expect_integer(&mut self) -> Result<i64> {
        match self.current().clone() {
            Token::IntegerLiteral(n) => {
                self.advance();
                Ok(n)
            }
            _ => Err(self.unexpected("integer")),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse_one(sql: &str) -> Statement {
        let mut parser = Parser::new(sql).unwrap();
        let stmt = parser.parse().unwrap();
        parser.expect_end().unwrap();
        stmt
    }

    #[test]
    fn test_parse_simple_select() {
        let stmt = parse_one("SELECT * FROM users");
        let s = stmt.as_select().unwrap();
        assert_eq!(s.fields.len(), 1);
        assert!(s.fields[0].expr.as_column().unwrap().is_star());
        assert_eq!(s.from.as_ref().unwrap().targets.len(), 1);
    }

    #[test]
    fn test_parse_select_with_placeholder() {
        let stmt = parse_one("SELECT id, name FROM users WHERE id = ##theid::int");
        let s = stmt.as_select().unwrap();
        assert_eq!(s.fields.len(), 2);
        match s.where_.as_ref().unwrap() {
            Expr::Operation { op, operands } => {
                assert_eq!(*op, Operator::Eq);
                let spec = operands[1].as_placeholder().unwrap();
                assert_eq!(spec.name, "theid");
                assert_eq!(spec.declared_type, "int");
            }
            other => panic!("Expected operation, got {:?}", other),
        }
    }

    #[test]
    fn test_and_chain_is_flattened() {
        let stmt = parse_one("SELECT a FROM t WHERE a = 1 AND b = 2 AND (c = 3 OR d = 4)");
        match stmt.as_select().unwrap().where_.as_ref().unwrap() {
            Expr::Operation { op, operands } => {
                assert_eq!(*op, Operator::And);
                assert_eq!(operands.len(), 3);
                assert!(matches!(
                    operands[2],
                    Expr::Operation { op: Operator::Or, .. }
                ));
            }
            other => panic!("Expected AND, got {:?}", other),
        }
    }

    #[test]
    fn test_negative_literal_folded() {
        let stmt = parse_one("SELECT -5, -a FROM t");
        let s = stmt.as_select().unwrap();
        assert_eq!(s.fields[0].expr, Expr::Value(Literal::Int64(-5)));
        assert!(matches!(
            s.fields[1].expr,
            Expr::Operation { op: Operator::Minus, .. }
        ));
    }

    #[test]
    fn test_parse_insert() {
        let stmt = parse_one("INSERT INTO users (id, name) VALUES (1, 'Alice'), (2, 'Bob')");
        match stmt.contents {
            Contents::Insert(i) => {
                assert_eq!(i.table.name, "users");
                assert_eq!(i.fields, vec!["id", "name"]);
                assert_eq!(i.values().unwrap().len(), 2);
            }
            _ => panic!("Expected INSERT statement"),
        }
    }

    #[test]
    fn test_parse_insert_variants() {
        match parse_one("INSERT INTO t DEFAULT VALUES").contents {
            Contents::Insert(i) => assert_eq!(i.rows, ValuesOrSelect::DefaultValues),
            _ => panic!("Expected INSERT statement"),
        }
        match parse_one("INSERT OR REPLACE INTO t (a) SELECT b FROM u").contents {
            Contents::Insert(i) => {
                assert_eq!(i.on_conflict.as_deref(), Some("REPLACE"));
                assert!(matches!(i.rows, ValuesOrSelect::Select(_)));
            }
            _ => panic!("Expected INSERT statement"),
        }
    }

    #[test]
    fn test_parse_update() {
        let stmt = parse_one("UPDATE users SET name = 'Charlie', age = 30 WHERE id = 1");
        match stmt.contents {
            Contents::Update(u) => {
                assert_eq!(u.table.name, "users");
                assert_eq!(u.assignments.len(), 2);
                assert!(u.where_.is_some());
            }
            _ => panic!("Expected UPDATE statement"),
        }
    }

    #[test]
    fn test_parse_delete() {
        let stmt = parse_one("DELETE FROM sales.orders WHERE id = 1");
        match stmt.contents {
            Contents::Delete(d) => {
                assert_eq!(d.table.schema.as_deref(), Some("sales"));
                assert_eq!(d.table.name, "orders");
                assert!(d.where_.is_some());
            }
            _ => panic!("Expected DELETE statement"),
        }
    }

    #[test]
    fn test_parse_join() {
        let stmt = parse_one(
            "SELECT u.name, o.total FROM users u LEFT JOIN orders o ON u.id = o.user_id",
        );
        let from = stmt.as_select().unwrap().from.clone().unwrap();
        assert_eq!(from.targets.len(), 2);
        assert_eq!(from.targets[0].alias.as_deref(), Some("u"));
        assert_eq!(from.joins.len(), 1);
        assert_eq!(from.joins[0].kind, JoinKind::LeftOuter);
        assert_eq!(from.joins[0].position, 1);
        assert!(from.joins[0].on.is_some());
    }

    #[test]
    fn test_parse_join_using() {
        let stmt = parse_one("SELECT * FROM a INNER JOIN b USING (id, code)");
        let from = stmt.as_select().unwrap().from.clone().unwrap();
        assert_eq!(from.joins[0].using, vec!["id", "code"]);
    }

    #[test]
    fn test_compound_chains() {
        let stmt = parse_one("SELECT a FROM t UNION SELECT a FROM u UNION SELECT a FROM v");
        match &stmt.contents {
            Contents::Compound(c) => {
                assert_eq!(c.op, CompoundOp::Union);
                assert_eq!(c.members.len(), 3);
            }
            _ => panic!("Expected COMPOUND statement"),
        }

        let stmt = parse_one("SELECT a FROM t UNION SELECT a FROM u EXCEPT SELECT a FROM v");
        match &stmt.contents {
            Contents::Compound(c) => {
                assert_eq!(c.op, CompoundOp::Except);
                assert_eq!(c.members.len(), 2);
                assert!(matches!(c.members[0].contents, Contents::Compound(_)));
            }
            _ => panic!("Expected COMPOUND statement"),
        }
    }

    #[test]
    fn test_subqueries() {
        let stmt = parse_one(
            "SELECT * FROM (SELECT a FROM t) AS s WHERE a IN (SELECT b FROM u) AND EXISTS (SELECT 1 FROM v)",
        );
        let s = stmt.as_select().unwrap();
        let target = &s.from.as_ref().unwrap().targets[0];
        assert!(matches!(target.source, TargetSource::Subselect(_)));
        assert_eq!(target.alias.as_deref(), Some("s"));
    }

    #[test]
    fn test_cast_forms() {
        let stmt = parse_one("SELECT CAST(a AS varchar(20)), b::int FROM t");
        let s = stmt.as_select().unwrap();
        assert!(
            matches!(&s.fields[0].expr, Expr::CastAs { type_name, .. } if type_name == "varchar(20)")
        );
        assert!(matches!(&s.fields[1].expr, Expr::CastAs { type_name, .. } if type_name == "int"));
    }

    #[test]
    fn test_count_star() {
        let stmt = parse_one("SELECT COUNT(*) FROM t");
        match &stmt.as_select().unwrap().fields[0].expr {
            Expr::Function { name, args } => {
                assert_eq!(name, "COUNT");
                assert!(args[0].as_column().unwrap().is_star());
            }
            other => panic!("Expected function, got {:?}", other),
        }
    }

    #[test]
    fn test_transactions() {
        assert_eq!(
            parse_one("BEGIN TRANSACTION ISOLATION LEVEL READ COMMITTED").contents,
            Contents::Begin(Transaction {
                name: None,
                isolation: Some(IsolationLevel::ReadCommitted)
            })
        );
        assert_eq!(
            parse_one("ROLLBACK TO SAVEPOINT sp1").contents,
            Contents::RollbackSavepoint(Transaction::named("sp1"))
        );
        assert_eq!(
            parse_one("RELEASE sp1").contents,
            Contents::DeleteSavepoint(Transaction::named("sp1"))
        );
        assert_eq!(
            parse_one("SAVEPOINT sp2").contents,
            Contents::Savepoint(Transaction::named("sp2"))
        );
    }

    #[test]
    fn test_errors() {
        let mut parser = Parser::new("SELECT a FROM").unwrap();
        assert!(matches!(parser.parse(), Err(Error::UnexpectedEof(_))));

        let mut parser = Parser::new("SELECT a b c FROM t").unwrap();
        parser.parse().unwrap();
        assert!(parser.expect_end().is_err());

        let mut parser = Parser::new("SELECT a FROM t WHERE a = ##::int").unwrap();
        let err = parser.parse().unwrap_err();
        assert_eq!(err.kind(), crate::error::ErrorKind::MalformedIdentifier);
    }
}
