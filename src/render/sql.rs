//! SQL text renderer

use super::{PlaceholderStyle, QuotePolicy, RenderOptions};
use crate::error::{Error, Result};
use crate::sql::lexer::is_spec_char;
use crate::sql::Token;
use crate::stmt::{
    unquote_identifier, CaseExpr, Compound, Contents, Delete, Expr, FromClause, Insert,
    NodePath, Operator, ParamSet, ParamSpec, ParamValue, Select, Statement, TableName, Target,
    TargetSource, Transaction, Update, ValuesOrSelect,
};

/// Render a statement as SQL text
///
/// Placeholders are rendered in the configured style without bound values;
/// [`PlaceholderStyle::Values`] therefore needs
/// [`render_sql_with_params`].
pub fn render_sql(stmt: &Statement, options: &RenderOptions) -> Result<String> {
    let params = stmt.params()?;
    SqlRenderer::new(options, &params).statement(stmt)
}

/// Render a statement, taking placeholder values and positions from `params`
pub fn render_sql_with_params(
    stmt: &Statement,
    options: &RenderOptions,
    params: &ParamSet,
) -> Result<String> {
    SqlRenderer::new(options, params).statement(stmt)
}

/// Render a single expression
pub fn render_expr(expr: &Expr, options: &RenderOptions) -> Result<String> {
    let params = ParamSet::new();
    SqlRenderer::new(options, &params).expr(expr)
}

/// Precedence shared by comparisons, `IS`, `IN`, `LIKE` and `BETWEEN`
const COMPARISON: u8 = 4;

struct SqlRenderer<'a> {
    options: &'a RenderOptions,
    params: &'a ParamSet,
}

impl<'a> SqlRenderer<'a> {
    fn new(options: &'a RenderOptions, params: &'a ParamSet) -> Self {
        Self { options, params }
    }

    /// Separator placed before a clause keyword
    fn clause(&self) -> &'static str {
        if self.options.pretty {
            "\n"
        } else {
            " "
        }
    }

    fn statement(&self, stmt: &Statement) -> Result<String> {
        match &stmt.contents {
            Contents::Select(select) => self.select(select),
            Contents::Compound(compound) => self.compound(compound),
            Contents::Insert(insert) => self.insert(insert),
            Contents::Update(update) => self.update(update),
            Contents::Delete(delete) => self.delete(delete),
            Contents::Begin(trans) => {
                let mut sql = "BEGIN".to_string();
                if let Some(name) = &trans.name {
                    sql.push_str(" TRANSACTION ");
                    sql.push_str(&self.ident(name));
                }
                if let Some(level) = trans.isolation {
                    sql.push_str(" ISOLATION LEVEL ");
                    sql.push_str(level.as_str());
                }
                Ok(sql)
            }
            Contents::Commit(trans) => Ok(self.named("COMMIT", trans, " TRANSACTION ")),
            Contents::Rollback(trans) => Ok(self.named("ROLLBACK", trans, " TRANSACTION ")),
            Contents::Savepoint(trans) => Ok(self.named("SAVEPOINT", trans, " ")),
            Contents::RollbackSavepoint(trans) => {
                Ok(self.named("ROLLBACK TO SAVEPOINT", trans, " "))
            }
            Contents::DeleteSavepoint(trans) => Ok(self.named("RELEASE SAVEPOINT", trans, " ")),
        }
    }

    fn named(&self, keyword: &str, trans: &Transaction, sep: &str) -> String {
        match &trans.name {
            Some(name) => format!("{}{}{}", keyword, sep, self.ident(name)),
            None => keyword.to_string(),
        }
    }

    // ========== Queries ==========

    fn select(&self, select: &Select) -> Result<String> {
        let mut sql = String::from("SELECT ");
        if select.distinct {
            sql.push_str("DISTINCT ");
            if let Some(on) = &select.distinct_on {
                sql.push_str(&format!("ON ({}) ", self.expr(on)?));
            }
        }

        let fields = select
            .fields
            .iter()
            .map(|field| {
                let expr = self.expr(&field.expr)?;
                Ok(match &field.alias {
                    Some(alias) => format!("{} AS {}", expr, self.ident(alias)),
                    None => expr,
                })
            })
            .collect::<Result<Vec<_>>>()?;
        sql.push_str(&fields.join(", "));

        if let Some(from) = &select.from {
            sql.push_str(self.clause());
            sql.push_str("FROM ");
            sql.push_str(&self.from(from)?);
        }
        if let Some(cond) = &select.where_ {
            sql.push_str(self.clause());
            sql.push_str("WHERE ");
            sql.push_str(&self.expr(cond)?);
        }
        if !select.group_by.is_empty() {
            sql.push_str(self.clause());
            sql.push_str("GROUP BY ");
            sql.push_str(&self.expr_list(&select.group_by)?);
        }
        if let Some(cond) = &select.having {
            sql.push_str(self.clause());
            sql.push_str("HAVING ");
            sql.push_str(&self.expr(cond)?);
        }
        if !select.order_by.is_empty() {
            let items = select
                .order_by
                .iter()
                .map(|item| {
                    let mut text = self.expr(&item.expr)?;
                    if let Some(collation) = &item.collation {
                        text.push_str(" COLLATE ");
                        text.push_str(collation);
                    }
                    if !item.ascending {
                        text.push_str(" DESC");
                    }
                    Ok(text)
                })
                .collect::<Result<Vec<_>>>()?;
            sql.push_str(self.clause());
            sql.push_str("ORDER BY ");
            sql.push_str(&items.join(", "));
        }
        if let Some(limit) = &select.limit {
            sql.push_str(self.clause());
            sql.push_str("LIMIT ");
            sql.push_str(&self.expr(limit)?);
        }
        if let Some(offset) = &select.offset {
            sql.push_str(self.clause());
            sql.push_str("OFFSET ");
            sql.push_str(&self.expr(offset)?);
        }
        Ok(sql)
    }

    fn from(&self, from: &FromClause) -> Result<String> {
        let mut sql = String::new();
        for (i, target) in from.targets.iter().enumerate() {
            let target_sql = self.target(target)?;
            if i == 0 {
                sql.push_str(&target_sql);
                continue;
            }
            let Some(join) = from.join_at(i) else {
                sql.push_str(", ");
                sql.push_str(&target_sql);
                continue;
            };
            sql.push_str(self.clause());
            sql.push_str(join.kind.sql());
            sql.push(' ');
            sql.push_str(&target_sql);
            if let Some(cond) = &join.on {
                sql.push_str(" ON ");
                sql.push_str(&self.expr(cond)?);
            } else if !join.using.is_empty() {
                let columns: Vec<String> = join.using.iter().map(|c| self.ident(c)).collect();
                sql.push_str(&format!(" USING ({})", columns.join(", ")));
            }
        }
        Ok(sql)
    }

    fn target(&self, target: &Target) -> Result<String> {
        let mut sql = match &target.source {
            TargetSource::Table(table) => self.table(table),
            TargetSource::Subselect(sub) => format!("({})", self.statement(sub)?),
        };
        if let Some(alias) = &target.alias {
            sql.push_str(" AS ");
            sql.push_str(&self.ident(alias));
        }
        Ok(sql)
    }

    fn compound(&self, compound: &Compound) -> Result<String> {
        let members = compound
            .members
            .iter()
            .map(|member| {
                let text = self.statement(member)?;
                let wrap = match &member.contents {
                    Contents::Compound(_) => true,
                    Contents::Select(s) => {
                        !s.order_by.is_empty() || s.limit.is_some() || s.offset.is_some()
                    }
                    _ => false,
                };
                Ok(if wrap { format!("({})", text) } else { text })
            })
            .collect::<Result<Vec<_>>>()?;
        let sep = format!("{}{} ", self.clause(), compound.op.as_str());
        Ok(members.join(&sep))
    }

    // ========== Modifications ==========

    fn table(&self, table: &TableName) -> String {
        match &table.schema {
            Some(schema) => format!("{}.{}", self.ident(schema), self.ident(&table.name)),
            None => self.ident(&table.name),
        }
    }

    fn insert(&self, insert: &Insert) -> Result<String> {
        let mut sql = String::from("INSERT ");
        if let Some(conflict) = &insert.on_conflict {
            sql.push_str("OR ");
            sql.push_str(conflict);
            sql.push(' ');
        }
        sql.push_str("INTO ");
        sql.push_str(&self.table(&insert.table));

        if !insert.fields.is_empty() {
            let fields: Vec<String> = insert.fields.iter().map(|f| self.ident(f)).collect();
            sql.push_str(&format!(" ({})", fields.join(", ")));
        }

        match &insert.rows {
            ValuesOrSelect::Values(rows) => {
                let rows = rows
                    .iter()
                    .map(|row| Ok(format!("({})", self.expr_list(row)?)))
                    .collect::<Result<Vec<_>>>()?;
                sql.push_str(self.clause());
                sql.push_str("VALUES ");
                sql.push_str(&rows.join(", "));
            }
            ValuesOrSelect::Select(sub) => {
                sql.push_str(self.clause());
                sql.push_str(&self.statement(sub)?);
            }
            ValuesOrSelect::DefaultValues => {
                sql.push_str(" DEFAULT VALUES");
            }
        }
        Ok(sql)
    }

    fn update(&self, update: &Update) -> Result<String> {
        let assignments = update
            .assignments
            .iter()
            .map(|a| Ok(format!("{} = {}", self.ident(&a.column), self.expr(&a.value)?)))
            .collect::<Result<Vec<_>>>()?;
        let mut sql = format!("UPDATE {}", self.table(&update.table));
        sql.push_str(self.clause());
        sql.push_str("SET ");
        sql.push_str(&assignments.join(", "));
        if let Some(cond) = &update.where_ {
            sql.push_str(self.clause());
            sql.push_str("WHERE ");
            sql.push_str(&self.expr(cond)?);
        }
        Ok(sql)
    }

    fn delete(&self, delete: &Delete) -> Result<String> {
        let mut sql = format!("DELETE FROM {}", self.table(&delete.table));
        if let Some(cond) = &delete.where_ {
            sql.push_str(self.clause());
            sql.push_str("WHERE ");
            sql.push_str(&self.expr(cond)?);
        }
        Ok(sql)
    }

    // ========== Expressions ==========

    fn expr_list(&self, exprs: &[Expr]) -> Result<String> {
        let parts = exprs
            .iter()
            .map(|e| self.expr(e))
            .collect::<Result<Vec<_>>>()?;
        Ok(parts.join(", "))
    }

    fn expr(&self, expr: &Expr) -> Result<String> {
        match expr {
            Expr::Value(literal) => Ok(literal.to_sql()),
            Expr::Column(column) => Ok(match (&column.table, column.is_star()) {
                (None, true) => "*".to_string(),
                (Some(table), true) => format!("{}.*", self.ident(table)),
                (Some(table), false) => {
                    format!("{}.{}", self.ident(table), self.ident(&column.column))
                }
                (None, false) => self.ident(&column.column),
            }),
            Expr::Default => Ok("DEFAULT".to_string()),
            Expr::Placeholder(spec) => self.placeholder(spec),
            Expr::Function { name, args } => self.function(name, args),
            Expr::Operation { op, operands } => self.operation(*op, operands),
            Expr::Subselect(sub) | Expr::Compound(sub) => Ok(format!("({})", self.statement(sub)?)),
            Expr::Case(case) => self.case(case),
            Expr::CastAs { expr, type_name } => {
                Ok(format!("CAST({} AS {})", self.expr(expr)?, type_name))
            }
        }
    }

    fn function(&self, name: &str, args: &[Expr]) -> Result<String> {
        if let [query @ (Expr::Subselect(_) | Expr::Compound(_))] = args {
            return Ok(format!("{} {}", name, self.expr(query)?));
        }
        Ok(format!("{}({})", name, self.expr_list(args)?))
    }

    fn case(&self, case: &CaseExpr) -> Result<String> {
        let mut sql = String::from("CASE");
        if let Some(subject) = &case.subject {
            sql.push(' ');
            sql.push_str(&self.expr(subject)?);
        }
        for arm in &case.arms {
            sql.push_str(&format!(
                " WHEN {} THEN {}",
                self.expr(&arm.when)?,
                self.expr(&arm.then)?
            ));
        }
        if let Some(else_) = &case.else_ {
            sql.push_str(" ELSE ");
            sql.push_str(&self.expr(else_)?);
        }
        sql.push_str(" END");
        Ok(sql)
    }

    /// Render an operand, parenthesized when it binds looser than its parent
    fn operand(&self, parent: Operator, operand: &Expr, first: bool) -> Result<String> {
        let text = self.expr(operand)?;
        let wrap = match operand {
            // comparisons do not chain: `a = b = c` and `a = b IS NULL` don't parse
            Expr::Operation { op, .. } if parent.precedence() == COMPARISON => {
                op.precedence() <= COMPARISON
            }
            Expr::Operation { op, .. } => {
                op.precedence() < parent.precedence()
                    || (op.precedence() == parent.precedence() && !first)
            }
            _ => false,
        };
        Ok(if wrap { format!("({})", text) } else { text })
    }

    fn operation(&self, op: Operator, operands: &[Expr]) -> Result<String> {
        let missing = || {
            Error::structure(
                &NodePath::root(),
                format!("operator {} is missing an operand", op),
            )
        };
        match op {
            Operator::Not => {
                let operand = operands.first().ok_or_else(missing)?;
                Ok(format!("NOT {}", self.operand(op, operand, true)?))
            }
            Operator::IsNull | Operator::IsNotNull => {
                let operand = operands.first().ok_or_else(missing)?;
                Ok(format!("{} {}", self.operand(op, operand, true)?, op.sql_token()))
            }
            Operator::BitNot | Operator::Plus | Operator::Minus if operands.len() == 1 => {
                let text = self.expr(&operands[0])?;
                // `--1` would start a comment
                let signed = text.starts_with('-') || text.starts_with('+');
                Ok(match &operands[0] {
                    Expr::Operation { .. } => format!("{}({})", op.sql_token(), text),
                    _ if signed => format!("{}({})", op.sql_token(), text),
                    _ => format!("{}{}", op.sql_token(), text),
                })
            }
            Operator::Between => {
                let [subject, low, high] = operands else {
                    return Err(missing());
                };
                Ok(format!(
                    "{} BETWEEN {} AND {}",
                    self.operand(op, subject, true)?,
                    self.operand(op, low, false)?,
                    self.operand(op, high, false)?
                ))
            }
            Operator::In | Operator::NotIn => {
                let (subject, list) = operands.split_first().ok_or_else(missing)?;
                let subject = self.operand(op, subject, true)?;
                match list {
                    [query @ (Expr::Subselect(_) | Expr::Compound(_))] => {
                        Ok(format!("{} {} {}", subject, op.sql_token(), self.expr(query)?))
                    }
                    _ => Ok(format!(
                        "{} {} ({})",
                        subject,
                        op.sql_token(),
                        self.expr_list(list)?
                    )),
                }
            }
            _ => {
                if operands.is_empty() {
                    return Err(missing());
                }
                let parts = operands
                    .iter()
                    .enumerate()
                    .map(|(i, operand)| self.operand(op, operand, i == 0))
                    .collect::<Result<Vec<_>>>()?;
                Ok(parts.join(&format!(" {} ", op.sql_token())))
            }
        }
    }

    fn placeholder(&self, spec: &ParamSpec) -> Result<String> {
        let position = || {
            self.params.position(&spec.name).ok_or_else(|| {
                Error::missing(
                    &NodePath::root(),
                    format!("parameter '{}' is not part of the statement", spec.name),
                )
            })
        };
        match self.options.placeholder_style {
            PlaceholderStyle::Spec => {
                let mut sql = format!("##{}", spec_field(&spec.name)?);
                if spec.is_typed() || spec.nullable {
                    sql.push_str("::");
                    sql.push_str(&spec_field(&spec.declared_type)?);
                }
                if spec.nullable {
                    sql.push_str("::NULL");
                }
                Ok(sql)
            }
            PlaceholderStyle::Long => {
                let mut sql = format!("## /* name:\"{}\"", spec.name);
                if spec.is_typed() {
                    if !spec.declared_type.chars().all(is_spec_char) {
                        sql.push_str(&format!(" type:\"{}\"", spec.declared_type));
                    } else {
                        sql.push_str(&format!(" type:{}", spec.declared_type));
                    }
                }
                if let Some(descr) = &spec.description {
                    sql.push_str(&format!(" descr:\"{}\"", descr));
                }
                if spec.nullable {
                    sql.push_str(" nullok:true");
                }
                sql.push_str(" */");
                Ok(sql)
            }
            PlaceholderStyle::Colon => Ok(format!(":{}", spec.name)),
            PlaceholderStyle::Dollar => Ok(format!("${}", position()?)),
            PlaceholderStyle::QuestionNumbered => Ok(format!("?{}", position()?)),
            PlaceholderStyle::Question => Ok("?".to_string()),
            PlaceholderStyle::Values => match self.params.value(&spec.name) {
                Some(ParamValue::Value(literal)) => Ok(literal.to_sql()),
                Some(ParamValue::UseDefault) => Ok("DEFAULT".to_string()),
                Some(ParamValue::Unset) | None => Err(Error::missing(
                    &NodePath::root(),
                    format!("no value bound to parameter '{}'", spec.name),
                )),
            },
        }
    }

    // ========== Identifiers ==========

    /// Render a possibly dotted identifier under the quoting policy
    fn ident(&self, name: &str) -> String {
        if self.options.quote_policy == QuotePolicy::AsIs && self.options.quote_char == '"' {
            return name.to_string();
        }
        split_identifier(name)
            .into_iter()
            .map(|part| self.ident_part(part))
            .collect::<Vec<_>>()
            .join(".")
    }

    fn ident_part(&self, part: &str) -> String {
        let quoted = part.len() >= 2 && part.starts_with('"') && part.ends_with('"');
        let quote = match self.options.quote_policy {
            QuotePolicy::AsIs => quoted,
            QuotePolicy::WhenNeeded => quoted || needs_quotes(part),
            QuotePolicy::Always => part != "*",
        };
        if !quote {
            return part.to_string();
        }
        let q = self.options.quote_char;
        let bare = unquote_identifier(part);
        let escaped = bare.replace(q, &format!("{}{}", q, q));
        format!("{}{}{}", q, escaped, q)
    }
}

/// One `::`-separated field of a `##` placeholder, double-quoted when the
/// lexer would stop inside it
fn spec_field(text: &str) -> Result<String> {
    if text.chars().all(|c| is_spec_char(c) && c != ':') {
        return Ok(text.to_string());
    }
    if text.contains('"') {
        return Err(Error::malformed(
            &NodePath::root(),
            format!("'{}' cannot be written in a ## placeholder", text),
        ));
    }
    Ok(format!("\"{}\"", text))
}

/// Split `a.b."c.d"` into its parts, keeping quotes
fn split_identifier(name: &str) -> Vec<&str> {
    let mut parts = Vec::new();
    let mut start = 0;
    let mut in_quotes = false;
    for (i, c) in name.char_indices() {
        match c {
            '"' => in_quotes = !in_quotes,
            '.' if !in_quotes => {
                parts.push(&name[start..i]);
                start = i + 1;
            }
            _ => {}
        }
    }
    parts.push(&name[start..]);
    parts
}

/// Whether a bare identifier must be quoted to survive a round trip
fn needs_quotes(part: &str) -> bool {
    let mut chars = part.chars();
    let starts_well = chars
        .next()
        .map_or(false, |c| c.is_ascii_alphabetic() || c == '_');
    let plain = starts_well && chars.all(|c| c.is_ascii_alphanumeric() || c == '_');
    !plain || Token::from_keyword(part).is_some()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sql::parse;
    use crate::stmt::builder;

    fn roundtrip(text: &str) -> String {
        render_sql(&parse(text).unwrap(), &RenderOptions::default()).unwrap()
    }

    #[test]
    fn test_select_roundtrip() {
        for text in [
            "SELECT DISTINCT a, b AS x FROM t WHERE a > 1 ORDER BY b DESC LIMIT 10 OFFSET 5",
            "SELECT count(*) FROM t GROUP BY a HAVING count(*) > 2",
            "SELECT t.* FROM s.t AS t LEFT JOIN u ON u.id = t.id",
            "SELECT a FROM t INNER JOIN u USING (id), v",
            "SELECT a FROM t WHERE a IN (1, 2, 3) AND b NOT IN (SELECT b FROM u)",
            "SELECT a FROM t WHERE EXISTS (SELECT 1 FROM u WHERE u.a = t.a)",
            "SELECT CASE a WHEN 1 THEN 'one' ELSE 'many' END FROM t",
            "SELECT a FROM t WHERE b BETWEEN 1 AND 10 OR b IS NULL",
            "SELECT a FROM t UNION ALL SELECT a FROM u",
        ] {
            assert_eq!(roundtrip(text), text);
        }
    }

    #[test]
    fn test_modification_roundtrip() {
        for text in [
            "INSERT INTO t (a, b) VALUES (1, 'x'), (2, 'y')",
            "INSERT INTO t DEFAULT VALUES",
            "INSERT INTO t (a) SELECT b FROM u",
            "UPDATE t SET a = a + 1 WHERE id = ##id::int",
            "DELETE FROM t WHERE id = ##id::int::NULL",
            "BEGIN TRANSACTION tx ISOLATION LEVEL SERIALIZABLE",
            "ROLLBACK TO SAVEPOINT sp",
        ] {
            assert_eq!(roundtrip(text), text);
        }
    }

    #[test]
    fn test_parentheses_follow_precedence() {
        assert_eq!(
            roundtrip("SELECT (a + b) * c, a - (b - c), a - b - c FROM t"),
            "SELECT (a + b) * c, a - (b - c), a - b - c FROM t"
        );
        assert_eq!(
            roundtrip("SELECT a FROM t WHERE (a = 1 OR b = 2) AND NOT (c = 3 AND d = 4)"),
            "SELECT a FROM t WHERE (a = 1 OR b = 2) AND NOT (c = 3 AND d = 4)"
        );
        assert_eq!(roundtrip("SELECT -(a + b) FROM t"), "SELECT -(a + b) FROM t");

        // Comparisons never chain, whichever side the nested one is on
        for text in [
            "SELECT a FROM t WHERE (a = b) IS NULL",
            "SELECT a FROM t WHERE (a = b) = c",
            "SELECT a FROM t WHERE a = (b = c)",
            "SELECT a FROM t WHERE (a < b) IS NOT NULL AND (a LIKE b) = c",
            "SELECT a FROM t WHERE (a = b) BETWEEN c AND d",
            "SELECT a FROM t WHERE (a = b) IN (c, d)",
        ] {
            let rendered = roundtrip(text);
            assert_eq!(rendered, text);
            assert_eq!(parse(&rendered).unwrap(), parse(text).unwrap());
        }
    }

    #[test]
    fn test_unary_sign_on_negative_operand() {
        let options = RenderOptions::default();
        let negated = Expr::Operation {
            op: Operator::Minus,
            operands: vec![Expr::value(-1)],
        };
        assert_eq!(render_expr(&negated, &options).unwrap(), "-(-1)");

        let stmt = builder::SelectBuilder::new()
            .field(negated)
            .field(Expr::value(2))
            .from("t")
            .build();
        let reparsed = parse(&render_sql(&stmt, &options).unwrap()).unwrap();
        assert_eq!(reparsed.as_select().unwrap().fields.len(), 2);
    }

    #[test]
    fn test_placeholder_fields_survive_reparse() {
        let options = RenderOptions::default();
        let cases = [
            (builder::param("p", "", true).unwrap(), "##p::::NULL"),
            (builder::param("+0", "varchar(10)", false).unwrap(), "##+0::\"varchar(10)\""),
            (
                builder::param("-2", "numeric(10,2)", true).unwrap(),
                "##-2::\"numeric(10,2)\"::NULL",
            ),
            (builder::param("p", "double precision", false).unwrap(), "##p::\"double precision\""),
        ];
        for (expr, expected) in cases {
            assert_eq!(render_expr(&expr, &options).unwrap(), expected);

            let stmt = builder::SelectBuilder::new().field(expr.clone()).from("t").build();
            let reparsed = parse(&render_sql(&stmt, &options).unwrap()).unwrap();
            assert_eq!(reparsed.as_select().unwrap().fields[0].expr, expr);
        }
    }

    #[test]
    fn test_placeholder_styles() {
        let stmt = parse("UPDATE t SET a = ##a::int, b = ##b::string::null WHERE id = ##a::int").unwrap();
        let render = |style| {
            render_sql(&stmt, &RenderOptions::default().placeholder_style(style)).unwrap()
        };
        assert_eq!(
            render(PlaceholderStyle::Long),
            "UPDATE t SET a = ## /* name:\"a\" type:int */, b = ## /* name:\"b\" type:string nullok:true */ WHERE id = ## /* name:\"a\" type:int */"
        );
        assert_eq!(render(PlaceholderStyle::Colon), "UPDATE t SET a = :a, b = :b WHERE id = :a");
        assert_eq!(render(PlaceholderStyle::Dollar), "UPDATE t SET a = $1, b = $2 WHERE id = $1");
        assert_eq!(
            render(PlaceholderStyle::QuestionNumbered),
            "UPDATE t SET a = ?1, b = ?2 WHERE id = ?1"
        );
        assert_eq!(render(PlaceholderStyle::Question), "UPDATE t SET a = ?, b = ? WHERE id = ?");
    }

    #[test]
    fn test_inline_values() {
        let stmt = parse("INSERT INTO t (a, b) VALUES (##a::int, ##b::string)").unwrap();
        let options = RenderOptions::default().placeholder_style(PlaceholderStyle::Values);
        let mut params = stmt.params().unwrap();

        assert!(render_sql_with_params(&stmt, &options, &params).is_err());

        params.set_value("a", 7).unwrap();
        params.set_default("b").unwrap();
        assert_eq!(
            render_sql_with_params(&stmt, &options, &params).unwrap(),
            "INSERT INTO t (a, b) VALUES (7, DEFAULT)"
        );
    }

    #[test]
    fn test_quote_policies() {
        let stmt = parse("SELECT \"Mixed Case\", \"order\".id, name FROM \"order\"").unwrap();
        let render = |policy, quote| {
            let options = RenderOptions::default().quote_policy(policy).quote_char(quote);
            render_sql(&stmt, &options).unwrap()
        };
        assert_eq!(
            render(QuotePolicy::AsIs, '"'),
            "SELECT \"Mixed Case\", \"order\".id, name FROM \"order\""
        );
        assert_eq!(
            render(QuotePolicy::Always, '`'),
            "SELECT `Mixed Case`, `order`.`id`, `name` FROM `order`"
        );

        let stmt = parse("SELECT a FROM t").unwrap();
        let mut select = stmt.as_select().unwrap().clone();
        select.fields[0].alias = Some("select".to_string());
        let options = RenderOptions::default().quote_policy(QuotePolicy::WhenNeeded);
        assert_eq!(
            render_sql(&Statement::select(select), &options).unwrap(),
            "SELECT a AS \"select\" FROM t"
        );
    }

    #[test]
    fn test_pretty() {
        let stmt = parse("SELECT a FROM t WHERE a = 1 ORDER BY a").unwrap();
        assert_eq!(
            render_sql(&stmt, &RenderOptions::default().pretty(true)).unwrap(),
            "SELECT a\nFROM t\nWHERE a = 1\nORDER BY a"
        );
    }

    #[test]
    fn test_render_expr() {
        let expr = builder::eq(Expr::column("id"), Expr::value(3));
        assert_eq!(render_expr(&expr, &RenderOptions::default()).unwrap(), "id = 3");
    }

    #[test]
    fn test_split_identifier() {
        assert_eq!(split_identifier("a.b"), vec!["a", "b"]);
        assert_eq!(split_identifier("\"a.b\".c"), vec!["\"a.b\"", "c"]);
        assert!(needs_quotes("select"));
        assert!(needs_quotes("two words"));
        assert!(!needs_quotes("plain_name"));
    }
}
