//! JSON wire form
//!
//! Key names and key order are fixed; downstream tooling compares the output
//! byte for byte. Optional clauses (`where`, `group_by`, `as`, ...) are left
//! out when empty, mandatory slots are present and `null` when unset.

use crate::error::Result;
use crate::stmt::{
    CaseExpr, Compound, Contents, Expr, FromClause, Insert, Literal, ParamSpec, Select,
    SelectField, Statement, TableName, Target, TargetSource, Transaction, ValuesOrSelect,
};
use serde_json::{json, Map, Value};

/// Serialize a statement as compact JSON
pub fn render_json(stmt: &Statement) -> Result<String> {
    Ok(serde_json::to_string(&statement_to_json(stmt))?)
}

/// Serialize a statement as indented JSON
pub fn render_json_pretty(stmt: &Statement) -> Result<String> {
    Ok(serde_json::to_string_pretty(&statement_to_json(stmt))?)
}

/// `{"statement":{"sql":..,"stmt_type":..,"contents":..}}`
pub fn statement_to_json(stmt: &Statement) -> Value {
    json!({
        "statement": {
            "sql": stmt.source_sql,
            "stmt_type": stmt.kind().as_str(),
            "contents": contents(&stmt.contents),
        }
    })
}

fn contents(contents: &Contents) -> Value {
    match contents {
        Contents::Select(select) => select_json(select),
        Contents::Compound(compound) => compound_json(compound),
        Contents::Insert(insert) => insert_json(insert),
        Contents::Update(update) => {
            let fields: Vec<Value> = update
                .assignments
                .iter()
                .map(|a| Value::from(a.column.as_str()))
                .collect();
            let exprs: Vec<Value> = update.assignments.iter().map(|a| expr(&a.value)).collect();
            json!({
                "table": table_name(&update.table),
                "fields": fields,
                "expressions": exprs,
                "condition": opt_expr(update.where_.as_ref()),
            })
        }
        Contents::Delete(delete) => json!({
            "table": table_name(&delete.table),
            "condition": opt_expr(delete.where_.as_ref()),
        }),
        Contents::Begin(trans)
        | Contents::Commit(trans)
        | Contents::Rollback(trans)
        | Contents::Savepoint(trans)
        | Contents::RollbackSavepoint(trans)
        | Contents::DeleteSavepoint(trans) => transaction_json(trans),
    }
}

fn transaction_json(trans: &Transaction) -> Value {
    let mut map = Map::new();
    map.insert("trans_name".into(), json!(trans.name));
    if let Some(level) = trans.isolation {
        map.insert("isol_level".into(), json!(level.as_str()));
    }
    Value::Object(map)
}

fn table_name(table: &TableName) -> Value {
    Value::from(table.to_string())
}

fn select_json(select: &Select) -> Value {
    let mut map = Map::new();
    map.insert("distinct".into(), json!(select.distinct));
    if let Some(on) = &select.distinct_on {
        map.insert("distinct_on".into(), expr(on));
    }
    let fields = if select.fields.is_empty() {
        Value::Null
    } else {
        Value::Array(select.fields.iter().map(field_json).collect())
    };
    map.insert("fields".into(), fields);
    if let Some(from) = &select.from {
        map.insert("from".into(), from_json(from));
    }
    if let Some(cond) = &select.where_ {
        map.insert("where".into(), expr(cond));
    }
    if !select.group_by.is_empty() {
        map.insert("group_by".into(), exprs(&select.group_by));
    }
    if let Some(cond) = &select.having {
        map.insert("having".into(), expr(cond));
    }
    if !select.order_by.is_empty() {
        let items = select
            .order_by
            .iter()
            .map(|item| {
                let mut order = Map::new();
                order.insert("expr".into(), expr(&item.expr));
                order.insert(
                    "sort".into(),
                    json!(if item.ascending { "ASC" } else { "DESC" }),
                );
                if let Some(collation) = &item.collation {
                    order.insert("collation".into(), json!(collation));
                }
                Value::Object(order)
            })
            .collect();
        map.insert("order_by".into(), Value::Array(items));
    }
    if let Some(limit) = &select.limit {
        map.insert("limit".into(), expr(limit));
    }
    if let Some(offset) = &select.offset {
        map.insert("offset".into(), expr(offset));
    }
    Value::Object(map)
}

fn field_json(field: &SelectField) -> Value {
    let mut map = Map::new();
    map.insert("expr".into(), expr(&field.expr));
    if let Expr::Column(column) = &field.expr {
        map.insert("field_name".into(), json!(column.column));
        if let Some(table) = &column.table {
            map.insert("table_name".into(), json!(table));
        }
    }
    if let Some(alias) = &field.alias {
        map.insert("as".into(), json!(alias));
    }
    Value::Object(map)
}

fn from_json(from: &FromClause) -> Value {
    let targets: Vec<Value> = from.targets.iter().map(target_json).collect();
    let joins: Vec<Value> = from
        .joins
        .iter()
        .map(|join| {
            let mut map = Map::new();
            map.insert("join_type".into(), json!(join.kind.as_str()));
            map.insert("join_pos".into(), json!(join.position.to_string()));
            if let Some(cond) = &join.on {
                map.insert("on_cond".into(), expr(cond));
            }
            if !join.using.is_empty() {
                map.insert("using".into(), json!(join.using));
            }
            Value::Object(map)
        })
        .collect();
    json!({ "targets": targets, "joins": joins })
}

fn target_json(target: &Target) -> Value {
    let mut map = Map::new();
    match &target.source {
        TargetSource::Table(table) => {
            let name = table.to_string();
            map.insert("expr".into(), json!({ "value": name, "sqlident": "TRUE" }));
            map.insert("table_name".into(), json!(name));
        }
        TargetSource::Subselect(sub) => {
            map.insert("expr".into(), query_expr(sub));
        }
    }
    if let Some(alias) = &target.alias {
        map.insert("as".into(), json!(alias));
    }
    Value::Object(map)
}

fn compound_json(compound: &Compound) -> Value {
    let members: Vec<Value> = compound
        .members
        .iter()
        .map(|m| json!({ "contents": contents(&m.contents) }))
        .collect();
    json!({
        "compound_type": compound.op.as_str().replace(' ', "_"),
        "select": members,
    })
}

fn insert_json(insert: &Insert) -> Value {
    let mut map = Map::new();
    map.insert("table".into(), table_name(&insert.table));
    map.insert("fields".into(), json!(insert.fields));
    match &insert.rows {
        ValuesOrSelect::Values(rows) => {
            let rows: Vec<Value> = rows.iter().map(|row| exprs(row)).collect();
            map.insert("values".into(), Value::Array(rows));
        }
        ValuesOrSelect::Select(sub) => {
            map.insert("values".into(), Value::Null);
            map.insert("select".into(), json!({ "contents": contents(&sub.contents) }));
        }
        ValuesOrSelect::DefaultValues => {
            map.insert("values".into(), Value::Null);
        }
    }
    if let Some(conflict) = &insert.on_conflict {
        map.insert("on_conflict".into(), json!(conflict));
    }
    Value::Object(map)
}

// ========== Expressions ==========

fn opt_expr(e: Option<&Expr>) -> Value {
    e.map_or(Value::Null, expr)
}

fn exprs(list: &[Expr]) -> Value {
    Value::Array(list.iter().map(expr).collect())
}

fn literal(value: &Literal) -> Value {
    Value::from(value.to_sql())
}

fn query_expr(stmt: &Statement) -> Value {
    json!({ "select": { "contents": contents(&stmt.contents) } })
}

fn expr(e: &Expr) -> Value {
    match e {
        Expr::Value(value) => json!({ "value": literal(value) }),
        Expr::Column(column) => json!({ "value": column.full_name(), "sqlident": "TRUE" }),
        Expr::Default => json!({ "value": "DEFAULT" }),
        Expr::Placeholder(spec) => json!({ "value": null, "param_spec": param_spec(spec) }),
        Expr::Function { name, args } => {
            let args = if args.is_empty() {
                Value::Null
            } else {
                exprs(args)
            };
            json!({ "func": { "function_name": name, "function_args": args } })
        }
        Expr::Operation { op, operands } => {
            let mut map = Map::new();
            map.insert("operator".into(), json!(op.as_str()));
            for (i, operand) in operands.iter().enumerate() {
                map.insert(format!("operand{}", i), expr(operand));
            }
            json!({ "operation": Value::Object(map) })
        }
        Expr::Subselect(sub) | Expr::Compound(sub) => query_expr(sub),
        Expr::Case(case) => json!({ "case": case_json(case) }),
        Expr::CastAs { expr: inner, type_name } => match expr(inner) {
            Value::Object(mut map) if !map.contains_key("cast") => {
                map.insert("cast".into(), json!(type_name));
                Value::Object(map)
            }
            nested => json!({ "expr": nested, "cast": type_name }),
        },
    }
}

fn case_json(case: &CaseExpr) -> Value {
    let body: Vec<Value> = case
        .arms
        .iter()
        .map(|arm| json!({ "when": expr(&arm.when), "then": expr(&arm.then) }))
        .collect();
    json!({
        "base_expr": opt_expr(case.subject.as_deref()),
        "body": body,
        "else_expr": opt_expr(case.else_.as_deref()),
    })
}

fn param_spec(spec: &ParamSpec) -> Value {
    let declared_type = if spec.is_typed() {
        Value::from(spec.declared_type.as_str())
    } else {
        Value::Null
    };
    json!({
        "name": spec.name,
        "descr": spec.description,
        "type": declared_type,
        "is_param": true,
        "nullok": spec.nullable,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rewrite::alter_select_for_empty;
    use crate::sql::parse;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_delete_golden() {
        let stmt = parse("DELETE FROM mytable WHERE id = ##id::int").unwrap();
        let mut stmt = stmt;
        stmt.source_sql = None;
        assert_eq!(
            render_json(&stmt).unwrap(),
            r#"{"statement":{"sql":null,"stmt_type":"DELETE","contents":{"table":"mytable","condition":{"operation":{"operator":"=","operand0":{"value":"id","sqlident":"TRUE"},"operand1":{"value":null,"param_spec":{"name":"id","descr":null,"type":"int","is_param":true,"nullok":false}}}}}}}"#
        );
    }

    #[test]
    fn test_empty_select_golden() {
        let stmt = parse("SELECT ref, name, price FROM products WHERE price > 10").unwrap();
        let empty = alter_select_for_empty(&stmt).unwrap();
        assert_eq!(
            render_json(&empty).unwrap(),
            concat!(
                r#"{"statement":{"sql":null,"stmt_type":"SELECT","contents":{"distinct":false,"fields":["#,
                r#"{"expr":{"value":"ref","sqlident":"TRUE"},"field_name":"ref"},"#,
                r#"{"expr":{"value":"name","sqlident":"TRUE"},"field_name":"name"},"#,
                r#"{"expr":{"value":"price","sqlident":"TRUE"},"field_name":"price"}],"#,
                r#""from":{"targets":[{"expr":{"value":"products","sqlident":"TRUE"},"table_name":"products"}],"joins":[]},"#,
                r#""where":{"operation":{"operator":"=","operand0":{"value":"0"},"operand1":{"value":"1"}}}}}}"#
            )
        );
    }

    #[test]
    fn test_select_parts() {
        let stmt = parse(
            "SELECT DISTINCT t.a AS x, count(*) FROM t JOIN u USING (id) GROUP BY t.a ORDER BY x DESC LIMIT 5",
        )
        .unwrap();
        let value = statement_to_json(&stmt);
        let contents = &value["statement"]["contents"];
        assert_eq!(contents["distinct"], json!(true));
        assert_eq!(contents["fields"][0]["table_name"], json!("t"));
        assert_eq!(contents["fields"][0]["as"], json!("x"));
        assert_eq!(
            contents["fields"][1]["expr"]["func"]["function_name"],
            json!("count")
        );
        assert_eq!(
            contents["from"]["joins"][0],
            json!({"join_type": "INNER", "join_pos": "1", "using": ["id"]})
        );
        assert_eq!(contents["order_by"][0]["sort"], json!("DESC"));
        assert_eq!(contents["limit"], json!({"value": "5"}));
        assert!(contents.get("where").is_none());
    }

    #[test]
    fn test_insert_and_update() {
        let stmt = parse("INSERT INTO t (a, b) VALUES (1, 'x')").unwrap();
        let value = statement_to_json(&stmt);
        assert_eq!(
            value["statement"]["contents"],
            json!({
                "table": "t",
                "fields": ["a", "b"],
                "values": [[{"value": "1"}, {"value": "'x'"}]],
            })
        );
        assert_eq!(value["statement"]["sql"], json!("INSERT INTO t (a, b) VALUES (1, 'x')"));

        let stmt = parse("UPDATE t SET a = DEFAULT").unwrap();
        let value = statement_to_json(&stmt);
        assert_eq!(
            value["statement"]["contents"],
            json!({
                "table": "t",
                "fields": ["a"],
                "expressions": [{"value": "DEFAULT"}],
                "condition": null,
            })
        );
    }

    #[test]
    fn test_compound_and_transaction() {
        let value = statement_to_json(&parse("SELECT a FROM t UNION ALL SELECT b FROM u").unwrap());
        assert_eq!(value["statement"]["stmt_type"], json!("COMPOUND"));
        assert_eq!(value["statement"]["contents"]["compound_type"], json!("UNION_ALL"));
        assert_eq!(
            value["statement"]["contents"]["select"].as_array().unwrap().len(),
            2
        );

        let value = statement_to_json(&parse("BEGIN ISOLATION LEVEL READ COMMITTED").unwrap());
        assert_eq!(
            value["statement"]["contents"],
            json!({"trans_name": null, "isol_level": "READ COMMITTED"})
        );
    }

    #[test]
    fn test_case_and_cast() {
        let stmt = parse("SELECT CASE WHEN a > 1 THEN 'big' END, CAST(b AS int) FROM t").unwrap();
        let value = statement_to_json(&stmt);
        let fields = &value["statement"]["contents"]["fields"];
        assert_eq!(fields[0]["expr"]["case"]["base_expr"], Value::Null);
        assert_eq!(fields[0]["expr"]["case"]["else_expr"], Value::Null);
        assert_eq!(fields[0]["expr"]["case"]["body"].as_array().unwrap().len(), 1);
        assert_eq!(
            fields[1]["expr"],
            json!({"value": "b", "sqlident": "TRUE", "cast": "int"})
        );
    }
}
