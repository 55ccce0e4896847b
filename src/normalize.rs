//! Catalog-driven normalizer
//!
//! Produces the canonical form of a statement:
//! - every table reference resolved to the catalog's `(schema, table)`
//! - `*` and `t.*` expanded to the catalog-ordered column list
//! - bare columns of a SELECT qualified by the one target that has them
//! - placeholder types resolved through the catalog's type table
//!
//! Normalizing an already normalized statement returns it unchanged. The
//! input is never modified; a normalized copy is returned.

use crate::catalog::{CatalogLookup, TableMeta};
use crate::error::{Error, Result};
use crate::stmt::{
    identifiers_match, unquote_identifier, ColumnRef, Contents, Expr, NodePath, Select,
    SelectField, Statement, TableName, Target, TargetSource, Update, ValuesOrSelect,
};
use crate::validate::is_valid_identifier;
use tracing::{debug, trace};

/// Normalize a statement against a catalog
pub fn normalize(stmt: &Statement, catalog: &dyn CatalogLookup) -> Result<Statement> {
    debug!(kind = %stmt.kind(), "normalizing statement");
    let mut normalized = stmt.clone();
    Normalizer::new(catalog).statement(&mut normalized, &NodePath::root())?;
    Ok(normalized)
}

/// Identifier text for a catalog name, quoted when it is not a bare identifier
fn as_identifier(name: &str) -> String {
    if is_valid_identifier(name) && !name.contains('.') && !name.starts_with('"') {
        name.to_string()
    } else {
        format!("\"{}\"", name.replace('"', "\"\""))
    }
}

fn canonical_table(meta: &TableMeta) -> TableName {
    TableName {
        schema: meta.schema.as_deref().map(as_identifier),
        name: as_identifier(&meta.name),
    }
}

/// A FROM target as seen by column references
struct ScopeEntry {
    alias: Option<String>,
    table: Option<TableName>,
    columns: Vec<String>,
    /// False when a derived table has unnamed output columns
    complete: bool,
    /// Set when the bare table name is not enough to tell this entry apart
    schema_qualified: bool,
}

impl ScopeEntry {
    fn answers_to(&self, qualifier: &str) -> bool {
        match (&self.alias, &self.table) {
            (Some(alias), _) => identifiers_match(alias, qualifier),
            (None, Some(table)) => Target::table(table.clone()).answers_to(qualifier),
            (None, None) => false,
        }
    }

    fn reference_name(&self) -> Option<String> {
        match (&self.alias, &self.table) {
            (Some(alias), _) => Some(alias.clone()),
            (None, Some(table)) if self.schema_qualified => Some(table.to_string()),
            (None, Some(table)) => Some(table.name.clone()),
            (None, None) => None,
        }
    }

    fn find_column(&self, name: &str) -> Option<&str> {
        self.columns
            .iter()
            .find(|c| identifiers_match(c, name))
            .map(String::as_str)
    }

    fn describe(&self) -> String {
        self.reference_name()
            .unwrap_or_else(|| "<derived table>".to_string())
    }
}

/// Targets of one statement level
struct Scope {
    entries: Vec<ScopeEntry>,
    /// Whether bare columns get a qualifier (SELECT) or stay bare (DML)
    qualify: bool,
}

struct Normalizer<'a> {
    catalog: &'a dyn CatalogLookup,
    scopes: Vec<Scope>,
}

impl<'a> Normalizer<'a> {
    fn new(catalog: &'a dyn CatalogLookup) -> Self {
        Self {
            catalog,
            scopes: Vec::new(),
        }
    }

    fn lookup(&self, table: &TableName, path: &NodePath) -> Result<TableMeta> {
        let schema = table.schema.as_deref().map(unquote_identifier);
        let name = unquote_identifier(&table.name);
        let meta = self
            .catalog
            .lookup_table(schema.as_deref(), &name)
            .ok_or_else(|| Error::missing(path, format!("table '{}' not found", table)))?;

        // a quoted name must match exactly
        if table.name.starts_with('"') && meta.name != name {
            return Err(Error::missing(path, format!("table '{}' not found", table)));
        }
        trace!(table = %table, resolved = %meta.full_name(), "table resolved");
        Ok(meta)
    }

    fn statement(&mut self, stmt: &mut Statement, path: &NodePath) -> Result<()> {
        let path = path.child("contents");
        match &mut stmt.contents {
            Contents::Select(select) => self.select(select, &path),
            Contents::Compound(compound) => {
                for (i, member) in compound.members.iter_mut().enumerate() {
                    self.statement(member, &path.child("select").index(i))?;
                }
                Ok(())
            }
            Contents::Insert(insert) => {
                let meta = self.lookup(&insert.table, &path.child("table"))?;
                insert.table = canonical_table(&meta);

                for (i, field) in insert.fields.iter_mut().enumerate() {
                    let resolved = resolve_column(&meta, field, &path.child("fields").index(i))?;
                    *field = resolved;
                }

                match &mut insert.rows {
                    ValuesOrSelect::Select(sub) => self.statement(sub, &path.child("select"))?,
                    ValuesOrSelect::Values(_) | ValuesOrSelect::DefaultValues => {}
                }

                // an omitted column list means every column in catalog order
                let width = match &insert.rows {
                    ValuesOrSelect::Values(rows) => rows.first().map(Vec::len),
                    ValuesOrSelect::Select(sub) => sub.output_width(),
                    ValuesOrSelect::DefaultValues => None,
                };
                if insert.fields.is_empty() {
                    if let Some(width) = width {
                        if width != meta.columns.len() {
                            return Err(Error::structure(
                                &path.child("fields"),
                                format!(
                                    "{} values given but table '{}' has {} columns",
                                    width,
                                    meta.name,
                                    meta.columns.len()
                                ),
                            ));
                        }
                        insert.fields = meta.columns.iter().map(|c| as_identifier(&c.name)).collect();
                    }
                }

                self.push_table_scope(&insert.table, &meta);
                let res = match &mut insert.rows {
                    ValuesOrSelect::Values(rows) => self.values(rows, &path.child("values")),
                    _ => Ok(()),
                };
                self.scopes.pop();
                res
            }
            Contents::Update(update) => {
                let meta = self.lookup(&update.table, &path.child("table"))?;
                update.table = canonical_table(&meta);
                for (i, assignment) in update.assignments.iter_mut().enumerate() {
                    assignment.column = resolve_column(
                        &meta,
                        &assignment.column,
                        &path.child("fields").index(i),
                    )?;
                }

                self.push_table_scope(&update.table, &meta);
                let res = self.update_exprs(update, &path);
                self.scopes.pop();
                res
            }
            Contents::Delete(delete) => {
                let meta = self.lookup(&delete.table, &path.child("table"))?;
                delete.table = canonical_table(&meta);

                self.push_table_scope(&delete.table, &meta);
                let res = match &mut delete.where_ {
                    Some(cond) => self.expr(cond, &path.child("condition"), &[]),
                    None => Ok(()),
                };
                self.scopes.pop();
                res
            }
            Contents::Begin(_)
            | Contents::Commit(_)
            | Contents::Rollback(_)
            | Contents::Savepoint(_)
            | Contents::RollbackSavepoint(_)
            | Contents::DeleteSavepoint(_) => Ok(()),
        }
    }

    fn values(&mut self, rows: &mut [Vec<Expr>], path: &NodePath) -> Result<()> {
        for (r, row) in rows.iter_mut().enumerate() {
            for (c, expr) in row.iter_mut().enumerate() {
                self.expr(expr, &path.index(r).index(c), &[])?;
            }
        }
        Ok(())
    }

    fn update_exprs(&mut self, update: &mut Update, path: &NodePath) -> Result<()> {
        for (i, assignment) in update.assignments.iter_mut().enumerate() {
            self.expr(&mut assignment.value, &path.child("expressions").index(i), &[])?;
        }
        if let Some(cond) = &mut update.where_ {
            self.expr(cond, &path.child("condition"), &[])?;
        }
        Ok(())
    }

    fn push_table_scope(&mut self, table: &TableName, meta: &TableMeta) {
        self.scopes.push(Scope {
            entries: vec![ScopeEntry {
                alias: None,
                table: Some(table.clone()),
                columns: meta.columns.iter().map(|c| as_identifier(&c.name)).collect(),
                complete: true,
                schema_qualified: false,
            }],
            qualify: false,
        });
    }

    fn select(&mut self, select: &mut Select, path: &NodePath) -> Result<()> {
        let mut scope = Scope {
            entries: Vec::new(),
            qualify: true,
        };

        if let Some(from) = &mut select.from {
            for (i, target) in from.targets.iter_mut().enumerate() {
                let target_path = path.child("from").child("targets").index(i);
                let entry = match &mut target.source {
                    TargetSource::Table(table) => {
                        let meta = self.lookup(table, &target_path.child("table_name"))?;
                        *table = canonical_table(&meta);
                        ScopeEntry {
                            alias: target.alias.clone(),
                            table: Some(table.clone()),
                            columns: meta.columns.iter().map(|c| as_identifier(&c.name)).collect(),
                            complete: true,
                            schema_qualified: false,
                        }
                    }
                    TargetSource::Subselect(sub) => {
                        self.statement(sub, &target_path.child("expr"))?;
                        let names = output_names(sub);
                        ScopeEntry {
                            alias: target.alias.clone(),
                            table: None,
                            complete: names.iter().all(Option::is_some),
                            columns: names.into_iter().flatten().collect(),
                            schema_qualified: false,
                        }
                    }
                };
                scope.entries.push(entry);
            }
        }

        qualify_shared_names(&mut scope.entries);
        select.fields = expand_stars(std::mem::take(&mut select.fields), &scope, path)?;

        self.scopes.push(scope);
        let res = self.select_clauses(select, path);
        self.scopes.pop();
        res
    }

    fn select_clauses(&mut self, select: &mut Select, path: &NodePath) -> Result<()> {
        if let Some(expr) = &mut select.distinct_on {
            self.expr(expr, &path.child("distinct_on"), &[])?;
        }
        for (i, field) in select.fields.iter_mut().enumerate() {
            self.expr(&mut field.expr, &path.child("fields").index(i).child("expr"), &[])?;
        }
        if let Some(from) = &mut select.from {
            for (i, join) in from.joins.iter_mut().enumerate() {
                let join_path = path.child("from").child("joins").index(i);
                if let Some(cond) = &mut join.on {
                    self.expr(cond, &join_path.child("on_cond"), &[])?;
                }
                for (u, column) in join.using.iter_mut().enumerate() {
                    let using_path = join_path.child("using").index(u);
                    let scope = self.scopes.last();
                    let found = scope.and_then(|s| {
                        s.entries
                            .iter()
                            .take(join.position + 1)
                            .find_map(|e| e.find_column(column))
                    });
                    match found {
                        Some(name) => *column = name.to_string(),
                        None => {
                            return Err(Error::missing(
                                &using_path,
                                format!("column '{}' not found", column),
                            ))
                        }
                    }
                }
            }
        }
        if let Some(cond) = &mut select.where_ {
            self.expr(cond, &path.child("where"), &[])?;
        }
        for (i, expr) in select.group_by.iter_mut().enumerate() {
            self.expr(expr, &path.child("group_by").index(i), &[])?;
        }
        if let Some(cond) = &mut select.having {
            self.expr(cond, &path.child("having"), &[])?;
        }

        // ORDER BY may name an output alias
        let aliases: Vec<String> = select
            .fields
            .iter()
            .filter_map(|f| f.alias.clone())
            .collect();
        for (i, item) in select.order_by.iter_mut().enumerate() {
            self.expr(&mut item.expr, &path.child("order_by").index(i).child("expr"), &aliases)?;
        }
        if let Some(expr) = &mut select.limit {
            self.expr(expr, &path.child("limit"), &[])?;
        }
        if let Some(expr) = &mut select.offset {
            self.expr(expr, &path.child("offset"), &[])?;
        }
        Ok(())
    }

    fn expr(&mut self, expr: &mut Expr, path: &NodePath, aliases: &[String]) -> Result<()> {
        match expr {
            Expr::Value(_) | Expr::Default => Ok(()),
            Expr::Column(column) => self.column(column, path, aliases),
            Expr::Placeholder(spec) => {
                if spec.is_typed() {
                    let resolved = self.catalog.lookup_type(&spec.declared_type).ok_or_else(|| {
                        Error::missing(
                            path,
                            format!(
                                "unknown type '{}' for parameter '{}'",
                                spec.declared_type, spec.name
                            ),
                        )
                    })?;
                    trace!(param = %spec.name, data_type = %resolved, "parameter type resolved");
                    spec.resolved_type = Some(resolved);
                }
                Ok(())
            }
            Expr::Function { args, .. } => {
                for (i, arg) in args.iter_mut().enumerate() {
                    self.expr(arg, &path.child("function_args").index(i), &[])?;
                }
                Ok(())
            }
            Expr::Operation { operands, .. } => {
                for (i, operand) in operands.iter_mut().enumerate() {
                    self.expr(operand, &path.operand(i), aliases)?;
                }
                Ok(())
            }
            Expr::Subselect(sub) | Expr::Compound(sub) => {
                self.statement(sub, &path.child("select"))
            }
            Expr::Case(case) => {
                if let Some(subject) = &mut case.subject {
                    self.expr(subject, &path.child("base_expr"), aliases)?;
                }
                for (i, arm) in case.arms.iter_mut().enumerate() {
                    let arm_path = path.child("body").index(i);
                    self.expr(&mut arm.when, &arm_path.child("when"), aliases)?;
                    self.expr(&mut arm.then, &arm_path.child("then"), aliases)?;
                }
                if let Some(else_) = &mut case.else_ {
                    self.expr(else_, &path.child("else_expr"), aliases)?;
                }
                Ok(())
            }
            Expr::CastAs { expr, .. } => self.expr(expr, &path.child("expr"), aliases),
        }
    }

    /// Innermost scope entry answering to a qualifier
    fn find_qualifier(&self, qualifier: &str, path: &NodePath) -> Result<&ScopeEntry> {
        for scope in self.scopes.iter().rev() {
            let mut found = scope.entries.iter().filter(|e| e.answers_to(qualifier));
            if let Some(entry) = found.next() {
                if found.next().is_some() {
                    return Err(Error::ambiguous(
                        path,
                        format!("'{}' designates more than one FROM target", qualifier),
                    ));
                }
                return Ok(entry);
            }
        }
        Err(Error::missing(
            path,
            format!("unknown table or alias '{}'", qualifier),
        ))
    }

    fn column(&self, column: &mut ColumnRef, path: &NodePath, aliases: &[String]) -> Result<()> {
        if let Some(qualifier) = column.table.clone() {
            let entry = self.find_qualifier(&qualifier, path)?;
            if !column.is_star() {
                let name = entry.find_column(&column.column).ok_or_else(|| {
                    Error::missing(
                        path,
                        format!("column '{}' not found in '{}'", column.column, qualifier),
                    )
                })?;
                column.column = name.to_string();
            }
            if let Some(reference) = entry.reference_name() {
                column.table = Some(reference);
            }
            return Ok(());
        }

        // COUNT(*)
        if column.is_star() {
            return Ok(());
        }

        for scope in self.scopes.iter().rev() {
            let matches: Vec<(&ScopeEntry, &str)> = scope
                .entries
                .iter()
                .filter_map(|e| e.find_column(&column.column).map(|c| (e, c)))
                .collect();
            match matches.as_slice() {
                [] => continue,
                [(entry, name)] => {
                    trace!(column = %column.column, target = %entry.describe(), "column resolved");
                    column.column = name.to_string();
                    if scope.qualify {
                        column.table = entry.reference_name();
                    }
                    return Ok(());
                }
                [(first, _), (second, _), ..] => {
                    return Err(Error::ambiguous(
                        path,
                        format!(
                            "column '{}' found in '{}' and '{}'",
                            column.column,
                            first.describe(),
                            second.describe()
                        ),
                    ));
                }
            }
        }

        if aliases.iter().any(|a| identifiers_match(a, &column.column)) {
            return Ok(());
        }
        Err(Error::missing(
            path,
            format!("column '{}' not found", column.column),
        ))
    }
}

/// Mark schema-qualified tables whose bare name also designates another
/// target of the same FROM clause, e.g. `s1.t, s2.t`
fn qualify_shared_names(entries: &mut [ScopeEntry]) {
    let shared: Vec<bool> = entries
        .iter()
        .enumerate()
        .map(|(i, entry)| match (&entry.alias, &entry.table) {
            (None, Some(table)) if table.schema.is_some() => entries
                .iter()
                .enumerate()
                .any(|(j, other)| j != i && other.answers_to(&table.name)),
            _ => false,
        })
        .collect();
    for (entry, shared) in entries.iter_mut().zip(shared) {
        entry.schema_qualified = shared;
    }
}

/// Canonical name of a table column
fn resolve_column(meta: &TableMeta, name: &str, path: &NodePath) -> Result<String> {
    let quoted = name.starts_with('"');
    let wanted = unquote_identifier(name);
    meta.column(&wanted)
        .filter(|c| !quoted || c.name == wanted)
        .map(|c| as_identifier(&c.name))
        .ok_or_else(|| {
            Error::missing(
                path,
                format!("column '{}' not found in table '{}'", name, meta.name),
            )
        })
}

/// Output column names of a query, `None` where not known statically
fn output_names(stmt: &Statement) -> Vec<Option<String>> {
    match &stmt.contents {
        Contents::Select(select) => select
            .fields
            .iter()
            .map(|f| f.output_name().map(str::to_string))
            .collect(),
        Contents::Compound(compound) => compound
            .members
            .first()
            .map(output_names)
            .unwrap_or_default(),
        _ => Vec::new(),
    }
}

fn expand_stars(fields: Vec<SelectField>, scope: &Scope, path: &NodePath) -> Result<Vec<SelectField>> {
    let mut expanded = Vec::with_capacity(fields.len());
    for (i, field) in fields.into_iter().enumerate() {
        let star = match &field.expr {
            Expr::Column(c) if c.is_star() => c.table.clone(),
            _ => {
                expanded.push(field);
                continue;
            }
        };
        let field_path = path.child("fields").index(i).child("expr");

        let entries: Vec<&ScopeEntry> = match &star {
            Some(qualifier) => {
                let entry = scope
                    .entries
                    .iter()
                    .find(|e| e.answers_to(qualifier))
                    .ok_or_else(|| {
                        Error::missing(&field_path, format!("unknown table or alias '{}'", qualifier))
                    })?;
                vec![entry]
            }
            None => scope.entries.iter().collect(),
        };
        if entries.is_empty() {
            return Err(Error::missing(&field_path, "'*' used without a FROM clause"));
        }

        for entry in entries {
            if !entry.complete {
                return Err(Error::unsupported(
                    &field_path,
                    format!("cannot expand '*' over '{}': unnamed columns", entry.describe()),
                ));
            }
            for column in &entry.columns {
                let expr = match entry.reference_name() {
                    Some(reference) => Expr::Column(ColumnRef::qualified(reference, column.as_str())),
                    None => Expr::Column(ColumnRef::new(column.as_str())),
                };
                expanded.push(SelectField::new(expr));
            }
        }
    }
    Ok(expanded)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::{Catalog, DataType, TableBuilder};
    use crate::error::ErrorKind;
    use crate::sql::parse;

    fn catalog() -> Catalog {
        let mut catalog = Catalog::new();
        TableBuilder::new("products")
            .primary_key("ref", DataType::Varchar(10))
            .column("name", DataType::Varchar(50))
            .column("price", DataType::Decimal(10, 2))
            .build(&mut catalog)
            .unwrap();
        TableBuilder::new("customers")
            .primary_key("id", DataType::Integer)
            .column("name", DataType::Text)
            .build(&mut catalog)
            .unwrap();
        TableBuilder::new("orders")
            .schema("sales")
            .primary_key("id", DataType::Integer)
            .column("customer", DataType::Integer)
            .column("product_ref", DataType::Varchar(10))
            .column("qty", DataType::Integer)
            .build(&mut catalog)
            .unwrap();
        catalog
    }

    fn field_names(stmt: &Statement) -> Vec<String> {
        stmt.as_select()
            .unwrap()
            .fields
            .iter()
            .map(|f| f.expr.as_column().unwrap().full_name())
            .collect()
    }

    #[test]
    fn test_star_expansion() {
        let stmt = normalize(&parse("SELECT * FROM products").unwrap(), &catalog()).unwrap();
        assert_eq!(
            field_names(&stmt),
            vec!["products.ref", "products.name", "products.price"]
        );

        let stmt = normalize(
            &parse("SELECT c.*, o.qty FROM customers c JOIN orders o ON o.customer = c.id")
                .unwrap(),
            &catalog(),
        )
        .unwrap();
        assert_eq!(field_names(&stmt), vec!["c.id", "c.name", "o.qty"]);
    }

    #[test]
    fn test_bare_columns_are_qualified() {
        let stmt = normalize(
            &parse("SELECT NAME, price FROM products WHERE ref = 'A1'").unwrap(),
            &catalog(),
        )
        .unwrap();
        assert_eq!(field_names(&stmt), vec!["products.name", "products.price"]);
        match &stmt.as_select().unwrap().where_ {
            Some(Expr::Operation { operands, .. }) => {
                assert_eq!(operands[0], Expr::qualified_column("products", "ref"));
            }
            other => panic!("Expected operation, got {:?}", other),
        }
    }

    #[test]
    fn test_schema_is_resolved() {
        let stmt = normalize(&parse("SELECT qty FROM orders").unwrap(), &catalog()).unwrap();
        let target = &stmt.as_select().unwrap().from.as_ref().unwrap().targets[0];
        assert_eq!(
            target.table_name(),
            Some(&TableName::with_schema("sales", "orders"))
        );
        assert_eq!(field_names(&stmt), vec!["orders.qty"]);
    }

    #[test]
    fn test_ambiguous_column() {
        let err = normalize(
            &parse("SELECT name FROM products, customers").unwrap(),
            &catalog(),
        )
        .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::AmbiguousReference);
        assert_eq!(err.path().unwrap().to_string(), "contents.fields[0].expr");
    }

    #[test]
    fn test_missing_elements() {
        let err = normalize(&parse("SELECT a FROM nowhere").unwrap(), &catalog()).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::DictionaryElementMissing);
        assert_eq!(
            err.path().unwrap().to_string(),
            "contents.from.targets[0].table_name"
        );

        let err = normalize(&parse("SELECT colour FROM products").unwrap(), &catalog())
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::DictionaryElementMissing);

        let err = normalize(
            &parse("SELECT name FROM products WHERE ref = ##r::geometry").unwrap(),
            &catalog(),
        )
        .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::DictionaryElementMissing);
        assert_eq!(err.path().unwrap().to_string(), "contents.where.operand1");
    }

    #[test]
    fn test_placeholder_types_resolved() {
        let stmt = normalize(
            &parse("SELECT name FROM products WHERE ref = ##r::string").unwrap(),
            &catalog(),
        )
        .unwrap();
        let params = stmt.params().unwrap();
        assert_eq!(
            params.get("r").unwrap().spec.resolved_type,
            Some(DataType::Varchar(0))
        );
    }

    #[test]
    fn test_idempotent_and_input_untouched() {
        let cat = catalog();
        for sql in [
            "SELECT * FROM products",
            "SELECT p.name FROM products p WHERE price > ##min::double ORDER BY name",
            "SELECT c.name FROM customers c WHERE EXISTS (SELECT 1 FROM orders o WHERE o.customer = c.id)",
            "SELECT s.x FROM (SELECT qty AS x FROM orders) AS s",
            "INSERT INTO products VALUES ('A1', 'pen', 1.5)",
            "UPDATE customers SET NAME = ##name::string WHERE id = ##id::int",
            "DELETE FROM orders WHERE qty = 0",
        ] {
            let original = parse(sql).unwrap();
            let once = normalize(&original, &cat).unwrap();
            let twice = normalize(&once, &cat).unwrap();
            assert_eq!(once, twice, "not idempotent: {}", sql);
            assert_eq!(original, parse(sql).unwrap());
        }
    }

    #[test]
    fn test_dml_columns_stay_bare() {
        let stmt = normalize(
            &parse("DELETE FROM customers WHERE ID = 3").unwrap(),
            &catalog(),
        )
        .unwrap();
        match &stmt.contents {
            Contents::Delete(d) => match &d.where_ {
                Some(Expr::Operation { operands, .. }) => {
                    assert_eq!(operands[0], Expr::column("id"));
                }
                other => panic!("Expected operation, got {:?}", other),
            },
            _ => panic!("Expected DELETE statement"),
        }
    }

    #[test]
    fn test_insert_column_list_filled() {
        let stmt = normalize(
            &parse("INSERT INTO customers VALUES (1, 'ann')").unwrap(),
            &catalog(),
        )
        .unwrap();
        match &stmt.contents {
            Contents::Insert(i) => assert_eq!(i.fields, vec!["id", "name"]),
            _ => panic!("Expected INSERT statement"),
        }

        let err = normalize(&parse("INSERT INTO customers VALUES (1)").unwrap(), &catalog())
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Structure);
    }

    #[test]
    fn test_same_table_name_in_two_schemas() {
        let mut cat = Catalog::new();
        TableBuilder::new("t")
            .schema("s1")
            .column("x", DataType::Integer)
            .column("id", DataType::Integer)
            .build(&mut cat)
            .unwrap();
        TableBuilder::new("t")
            .schema("s2")
            .column("y", DataType::Integer)
            .column("id", DataType::Integer)
            .build(&mut cat)
            .unwrap();

        let once = normalize(&parse("SELECT x, y FROM s1.t, s2.t").unwrap(), &cat).unwrap();
        assert_eq!(field_names(&once), vec!["s1.t.x", "s2.t.y"]);
        assert_eq!(normalize(&once, &cat).unwrap(), once);

        let stars = normalize(&parse("SELECT * FROM s1.t, s2.t").unwrap(), &cat).unwrap();
        assert_eq!(
            field_names(&stars),
            vec!["s1.t.x", "s1.t.id", "s2.t.y", "s2.t.id"]
        );
        assert_eq!(normalize(&stars, &cat).unwrap(), stars);

        // A lone schema table keeps the short qualifier
        let alone = normalize(&parse("SELECT x FROM s1.t").unwrap(), &cat).unwrap();
        assert_eq!(field_names(&alone), vec!["t.x"]);

        let err = normalize(&parse("SELECT id FROM s1.t, s2.t").unwrap(), &cat).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::AmbiguousReference);
    }

    #[test]
    fn test_order_by_alias() {
        let stmt = normalize(
            &parse("SELECT price * 2 AS doubled FROM products ORDER BY doubled").unwrap(),
            &catalog(),
        )
        .unwrap();
        assert_eq!(
            stmt.as_select().unwrap().order_by[0].expr,
            Expr::column("doubled")
        );
    }
}
