use arcsql::catalog::{Catalog, DataType, TableBuilder};
use arcsql::dml::{compute_dml, DmlRequest};
use arcsql::normalize::normalize;
use arcsql::render::{
    render_json, render_sql, render_sql_with_params, PlaceholderStyle, QuotePolicy, RenderOptions,
};
use arcsql::rewrite::{alter_select_for_empty, rewrite_defaults, rewrite_null_params, DefaultMode};
use arcsql::sql::{parse, parse_all};
use arcsql::stmt::builder::{
    binary, eq, operation, param, DeleteBuilder, InsertBuilder, SelectBuilder, UpdateBuilder,
};
use arcsql::stmt::{parse_param_spec, Expr, Literal, Operator};
use arcsql::validate::{collect_structure_errors, validate, ValidationMode};
use arcsql::{ErrorKind, Statement, StatementKind};
use pretty_assertions::assert_eq;

fn catalog() -> Catalog {
    let mut catalog = Catalog::new();
    TableBuilder::new("mytable")
        .primary_key("id", DataType::Integer)
        .column("name", DataType::Varchar(0))
        .build(&mut catalog)
        .unwrap();
    TableBuilder::new("products")
        .primary_key("ref", DataType::Varchar(10))
        .column_not_null("name", DataType::Varchar(50))
        .column("price", DataType::Decimal(10, 2))
        .build(&mut catalog)
        .unwrap();
    catalog
}

fn sql(stmt: &Statement) -> String {
    render_sql(stmt, &RenderOptions::default()).unwrap()
}

/// Parse, validate and normalize, as every caller does before the other passes
fn prepare(text: &str) -> Statement {
    let stmt = parse(text).unwrap();
    validate(&stmt, ValidationMode::CollectAll).unwrap();
    normalize(&stmt, &catalog()).unwrap()
}

#[test]
fn test_param_spec_text() {
    let spec = parse_param_spec("theid::int::null").unwrap();
    assert_eq!(spec.name, "theid");
    assert_eq!(spec.declared_type, "int");
    assert!(spec.nullable);
    assert!(spec.description.is_none());

    let err = parse_param_spec("theid::int::maybe").unwrap_err();
    assert_eq!(err.kind(), ErrorKind::MalformedIdentifier);
}

#[test]
fn test_insert_defaults() {
    let stmt = prepare("INSERT INTO mytable (name) VALUES (##name::string)");
    let mut params = stmt.params().unwrap();
    params.set_default("name").unwrap();

    let omitted = rewrite_defaults(&stmt, &params, DefaultMode::Omit).unwrap();
    assert_eq!(sql(&omitted), "INSERT INTO mytable DEFAULT VALUES");

    let substituted = rewrite_defaults(&stmt, &params, DefaultMode::Substitute).unwrap();
    assert_eq!(sql(&substituted), "INSERT INTO mytable (name) VALUES (DEFAULT)");
}

#[test]
fn test_insert_defaults_keep_other_columns() {
    let stmt = prepare("INSERT INTO mytable (id, name) VALUES (23, ##name::string)");
    let mut params = stmt.params().unwrap();
    params.set_default("name").unwrap();

    let omitted = rewrite_defaults(&stmt, &params, DefaultMode::Omit).unwrap();
    assert_eq!(sql(&omitted), "INSERT INTO mytable (id) VALUES (23)");

    // The input statement is left alone
    assert_eq!(
        sql(&stmt),
        "INSERT INTO mytable (id, name) VALUES (23, ##name::string)"
    );
}

#[test]
fn test_update_defaults_then_inline() {
    let stmt = prepare("UPDATE mytable SET name = ##name::string WHERE id = ##id::int");
    let mut params = stmt.params().unwrap();
    params.set_default("name").unwrap();
    params.set_value("id", 9).unwrap();

    let rewritten = rewrite_defaults(&stmt, &params, DefaultMode::Substitute).unwrap();
    assert_eq!(
        sql(&rewritten),
        "UPDATE mytable SET name = DEFAULT WHERE id = ##id::int"
    );

    let options = RenderOptions::default().placeholder_style(PlaceholderStyle::Values);
    assert_eq!(
        render_sql_with_params(&rewritten, &options, &params).unwrap(),
        "UPDATE mytable SET name = DEFAULT WHERE id = 9"
    );

    let err = rewrite_defaults(&stmt, &params, DefaultMode::Omit).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::UnsupportedConstruct);
}

#[test]
fn test_delete_json() {
    let stmt = DeleteBuilder::new("mytable")
        .where_(eq(Expr::column("id"), param("id", "int", false).unwrap()))
        .build();
    assert_eq!(stmt.kind(), StatementKind::Delete);
    assert_eq!(
        render_json(&stmt).unwrap(),
        r#"{"statement":{"sql":null,"stmt_type":"DELETE","contents":{"table":"mytable","condition":{"operation":{"operator":"=","operand0":{"value":"id","sqlident":"TRUE"},"operand1":{"value":null,"param_spec":{"name":"id","descr":null,"type":"int","is_param":true,"nullok":false}}}}}}}"#
    );
}

#[test]
fn test_dml_from_normalized_select() {
    let select = prepare("SELECT * FROM products");
    assert_eq!(
        sql(&select),
        "SELECT products.ref, products.name, products.price FROM products"
    );

    let dml = compute_dml(&select, &catalog(), &DmlRequest::all().require_pk(true)).unwrap();
    let rendered: Vec<String> = dml.statements().into_iter().map(sql).collect();
    assert_eq!(
        rendered,
        vec![
            r#"INSERT INTO products (ref, name, price) VALUES (##+0::"varchar(10)", ##+1::"varchar(50)", ##+2::"numeric(10,2)"::NULL)"#,
            r#"UPDATE products SET name = ##+1::"varchar(50)", price = ##+2::"numeric(10,2)"::NULL WHERE ref = ##-0::"varchar(10)""#,
            r#"DELETE FROM products WHERE ref = ##-0::"varchar(10)""#,
        ]
    );

    // Synthesized statements pass validation like hand-written ones
    for stmt in dml.statements() {
        assert!(collect_structure_errors(stmt).is_empty());
    }
    assert!(dml.failures().is_empty());
}

#[test]
fn test_dml_requires_writable_select() {
    let select = prepare("SELECT count(*) FROM products");
    let err = compute_dml(&select, &catalog(), &DmlRequest::all()).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::UnsupportedConstruct);

    let insert = prepare("INSERT INTO mytable (id) VALUES (1)");
    assert!(compute_dml(&insert, &catalog(), &DmlRequest::all()).is_err());
}

#[test]
fn test_empty_result_select() {
    let stmt = prepare("SELECT ref, name FROM products WHERE price > ##p::int ORDER BY name");
    let empty = alter_select_for_empty(&stmt).unwrap();
    assert!(empty.params().unwrap().is_empty());
    assert_eq!(
        sql(&empty),
        "SELECT products.ref, products.name FROM products WHERE 0 = 1 ORDER BY products.name"
    );
}

#[test]
fn test_null_parameters() {
    let stmt = prepare("SELECT ref FROM products WHERE price = ##p::int::null");
    let mut params = stmt.params().unwrap();
    params.set_value("p", Literal::Null).unwrap();

    let rewritten = rewrite_null_params(&stmt, &params).unwrap();
    assert_eq!(
        sql(&rewritten),
        "SELECT products.ref FROM products WHERE products.price IS NULL"
    );
}

#[test]
fn test_script_with_quoting() {
    let stmts = parse_all("SELECT \"order\" FROM t; DELETE FROM t WHERE a = 1;").unwrap();
    assert_eq!(stmts.len(), 2);

    let options = RenderOptions::default().quote_policy(QuotePolicy::Always);
    assert_eq!(
        render_sql(&stmts[1], &options).unwrap(),
        "DELETE FROM \"t\" WHERE \"a\" = 1"
    );
}

#[test]
fn test_normalize_errors() {
    let stmt = parse("SELECT nope FROM products").unwrap();
    let err = normalize(&stmt, &catalog()).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::DictionaryElementMissing);

    let stmt = parse("SELECT name FROM products, mytable").unwrap();
    let err = normalize(&stmt, &catalog()).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::AmbiguousReference);
}

/// Render, parse the text again and check both trees normalize the same
fn assert_reparses_to_same_tree(stmt: &Statement) {
    let rendered = sql(stmt);
    let reparsed = parse(&rendered).unwrap_or_else(|e| panic!("{}: {}", rendered, e));

    let mut expected = normalize(stmt, &catalog()).unwrap();
    let mut actual = normalize(&reparsed, &catalog()).unwrap();
    expected.source_sql = None;
    actual.source_sql = None;
    assert_eq!(actual, expected, "{}", rendered);
}

#[test]
fn test_parenthesized_comparisons_reparse() {
    for text in [
        "SELECT ref FROM products WHERE (price = 1) IS NULL",
        "SELECT (name = ref) = (price < 2) FROM products",
        "SELECT ref FROM products WHERE (price > ##p::\"numeric(10,2)\"::NULL) IS NOT NULL",
        "SELECT ref FROM products WHERE (name LIKE 'a%') = (price BETWEEN 1 AND 2)",
        "SELECT -(-1), price - (price - 1) FROM products",
    ] {
        assert_reparses_to_same_tree(&prepare(text));
    }
}

#[test]
fn test_dml_outputs_reparse() {
    for (table, request) in [
        ("SELECT * FROM products", DmlRequest::all()),
        ("SELECT name, price FROM products", DmlRequest::all()),
        ("SELECT id, name FROM mytable", DmlRequest::all().require_pk(true)),
    ] {
        let dml = compute_dml(&prepare(table), &catalog(), &request).unwrap();
        assert!(!dml.statements().is_empty());
        for stmt in dml.statements() {
            assert_reparses_to_same_tree(stmt);
        }
    }
}

#[test]
fn test_built_trees_reparse() {
    let nested_eq = binary(
        Operator::Eq,
        eq(Expr::column("name"), Expr::column("ref")),
        Expr::value(true),
    )
    .unwrap();
    let is_null = operation(
        Operator::IsNull,
        vec![eq(Expr::column("price"), param("p", "", true).unwrap())],
    )
    .unwrap();
    let right_nested = binary(
        Operator::Minus,
        Expr::column("price"),
        binary(Operator::Minus, Expr::column("price"), Expr::value(1)).unwrap(),
    )
    .unwrap();

    let built = [
        SelectBuilder::new()
            .field(nested_eq)
            .field(right_nested)
            .from("products")
            .where_(is_null)
            .build(),
        InsertBuilder::new("products")
            .set("ref", param("r", "varchar(10)", false).unwrap())
            .set("price", param("p", "numeric(10,2)", true).unwrap())
            .build(),
        UpdateBuilder::new("products")
            .set("price", param("p", "double precision", true).unwrap())
            .where_(eq(Expr::column("ref"), param("r", "varchar(10)", false).unwrap()))
            .build(),
        DeleteBuilder::new("mytable")
            .where_(eq(Expr::column("id"), param("id", "int", false).unwrap()))
            .build(),
    ];
    for stmt in &built {
        assert_reparses_to_same_tree(stmt);
    }
}

#[test]
fn test_rewritten_statements_reparse() {
    let insert = prepare("INSERT INTO mytable (id, name) VALUES (23, ##name::string)");
    let mut params = insert.params().unwrap();
    params.set_default("name").unwrap();
    for mode in [DefaultMode::Omit, DefaultMode::Substitute] {
        assert_reparses_to_same_tree(&rewrite_defaults(&insert, &params, mode).unwrap());
    }

    let select = prepare("SELECT ref FROM products WHERE price = ##p::int::null AND name = ##n::string");
    let mut params = select.params().unwrap();
    params.set_value("p", Literal::Null).unwrap();
    assert_reparses_to_same_tree(&rewrite_null_params(&select, &params).unwrap());
    assert_reparses_to_same_tree(&alter_select_for_empty(&select).unwrap());
}
