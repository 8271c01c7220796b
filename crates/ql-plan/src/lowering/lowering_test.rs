use super::*;
use crate::config::UnresolvedExclude;
use crate::diagnostic::Severity;
use crate::env::BuiltinEnvironment;
use crate::ir::explain::explain;
use crate::ir::rex::RexOp;
use crate::test_utils::*;
use ql_ast::{
    BinaryOp, Call, ColumnConstraint, ColumnDefinition, CreateTable, DataType, Identifier,
    JoinType, Symbol, Window, WindowFunction, WindowSpec,
};

fn lag_of(field: &str) -> Expr {
    Expr::Window(Box::new(Window {
        function: WindowFunction::Lag,
        args: vec![path("x", &[field])],
        over: WindowSpec::default(),
    }))
}

fn orders_table() -> CreateTable {
    CreateTable {
        name: Identifier::regular("orders"),
        columns: vec![
            ColumnDefinition {
                name: Symbol::regular("id"),
                ty: DataType::Int8,
                constraints: vec![ColumnConstraint::PrimaryKey],
            },
            ColumnDefinition {
                name: Symbol::regular("note"),
                ty: DataType::Varchar { length: Some(20) },
                constraints: vec![],
            },
        ],
        constraints: vec![],
    }
}

#[test]
fn test_query_statement_lowers_to_select() {
    let stmt = Statement::Query(query(select_value(
        path("x", &["a"]),
        from_as(Expr::var("t"), "x"),
    )));
    let lowered = lower_statement(&stmt, &BuiltinEnvironment::new(), &PlanConfig::default()).unwrap();
    assert!(lowered.diagnostics.is_empty());
    let Plan::Query(rex) = &lowered.plan else {
        panic!("Expected a query plan");
    };
    assert!(matches!(rex.op, RexOp::Select { .. }));
    assert_eq!(projection(rel_of(rex)).to_string(), "#0.0.a");
}

#[test]
fn test_create_table_statement_lowers_to_shape() {
    let stmt = Statement::CreateTable(orders_table());
    let lowered = lower_statement(&stmt, &BuiltinEnvironment::new(), &PlanConfig::default()).unwrap();
    let Plan::CreateTable(shape) = &lowered.plan else {
        panic!("Expected a table shape");
    };
    assert_eq!(shape.name, "orders");
    assert_eq!(shape.primary_key, vec!["id"]);
    assert!(shape.column("note").unwrap().nullable);
}

#[test]
fn test_bare_scalar_query() {
    let expr = Expr::binary(BinaryOp::Plus, Expr::int(1), Expr::int(2));
    let rex = lower_query(&expr, &BuiltinEnvironment::new()).unwrap();
    assert_eq!(rex.to_string(), "plus(1, 2)");
}

#[test]
fn test_collect_mode_gathers_every_diagnostic() {
    let sfw = select_list(
        vec![(lag_of("a"), Some("p")), (lag_of("b"), Some("q"))],
        from_as(Expr::var("t"), "x"),
    );
    let stmt = Statement::Query(query(sfw));
    let env = BuiltinEnvironment::new();

    let err = lower_statement(&stmt, &env, &PlanConfig::default()).unwrap_err();
    assert_eq!(err.code(), "PL101");

    let lowered = lower_statement(&stmt, &env, &PlanConfig::collecting()).unwrap();
    let codes: Vec<&str> = lowered.diagnostics.iter().map(|d| d.code.as_str()).collect();
    assert_eq!(codes, vec!["PL101", "PL101"]);
    assert!(lowered
        .diagnostics
        .iter()
        .all(|d| d.severity == Severity::Error));
}

#[test]
fn test_severity_override_applies_to_collected_diagnostics() {
    let qualified = Expr::Call(Call {
        function: Identifier::regular("lib").extend([Symbol::regular("sum")]),
        args: vec![path("x", &["a"])],
        set_quantifier: None,
    });
    let stmt = Statement::Query(query(select_value(qualified, from_as(Expr::var("t"), "x"))));
    let mut config = PlanConfig::collecting();
    config
        .severity_overrides
        .insert("PL103".to_string(), Severity::Warning);

    let lowered = lower_statement(&stmt, &BuiltinEnvironment::new(), &config).unwrap();
    assert_eq!(lowered.diagnostics.len(), 1);
    assert_eq!(lowered.diagnostics[0].code, "PL103");
    assert_eq!(lowered.diagnostics[0].severity, Severity::Warning);
    assert_eq!(lowered.diagnostics[0].construct.as_deref(), Some("lib.sum"));

    // Not extracted, so the call stays in the projection as a scalar call
    let Plan::Query(rex) = &lowered.plan else {
        panic!("Expected a query plan");
    };
    assert_eq!(projection(rel_of(rex)).to_string(), "lib.sum(#0.0.a)");
}

#[test]
fn test_internal_errors_abort_in_collect_mode() {
    let mut value = ql_ast::FromValue::scan(Expr::var("t"), sym("x"));
    value.as_alias = None;
    let stmt = Statement::Query(query(select_value(
        Expr::var("x"),
        ql_ast::FromClause::Value(value),
    )));
    let err = lower_statement(&stmt, &BuiltinEnvironment::new(), &PlanConfig::collecting())
        .unwrap_err();
    assert_eq!(err.code(), "PL002");
    assert!(err.is_internal());
}

#[test]
fn test_strict_exclude_collected() {
    let mut sfw = select_star(from_as(Expr::var("t"), "t"));
    sfw.exclude = vec![ql_ast::ExcludePath {
        root: Expr::var("u"),
        steps: vec![ql_ast::ExcludeStep::CollWildcard],
    }];
    let config = PlanConfig {
        error_mode: ErrorMode::Collect,
        unresolved_exclude: UnresolvedExclude::Error,
        ..PlanConfig::default()
    };
    let lowered = lower_statement(
        &Statement::Query(query(sfw)),
        &BuiltinEnvironment::new(),
        &config,
    )
    .unwrap();
    assert_eq!(lowered.diagnostics.len(), 1);
    assert_eq!(lowered.diagnostics[0].code, "PL104");
}

#[test]
fn test_lowering_is_deterministic_and_leaves_input_alone() {
    let from = join(
        from_as(Expr::var("a"), "x"),
        from_as(path("x", &["children"]), "c"),
        JoinType::Inner,
        Some(Expr::binary(BinaryOp::Eq, path("c", &["k"]), path("x", &["k"]))),
    );
    let mut sfw = select_list(
        vec![
            (path("x", &["k"]), None),
            (Expr::call("count", vec![path("c", &["v"])]), Some("n")),
        ],
        from,
    );
    sfw.group_by = Some(ql_ast::GroupBy {
        strategy: ql_ast::GroupStrategy::Full,
        keys: vec![ql_ast::GroupKey {
            expr: path("x", &["k"]),
            as_alias: None,
        }],
        as_alias: None,
    });
    let expr = query(sfw);
    let before = expr.clone();

    let first = explain(&lower(&expr));
    let second = explain(&lower(&expr));
    assert_eq!(first, second);
    assert_eq!(expr, before);
    assert!(!first.to_lowercase().contains("tupleunion"));
    assert!(first.starts_with("select(#0.0)\n  Project {'k': #0.1, 'n': #0.0} -> ($value)\n"));
}

#[test]
fn test_statement_json_lowers_like_built_tree() {
    let stmt = Statement::Query(query(select_star(from_at(Expr::var("t"), "x", "i"))));
    let json = serde_json::to_string(&stmt).unwrap();
    let parsed = Statement::from_json(&json).unwrap();
    let env = BuiltinEnvironment::new();
    let config = PlanConfig::default();
    assert_eq!(
        lower_statement(&parsed, &env, &config).unwrap(),
        lower_statement(&stmt, &env, &config).unwrap()
    );
}

#[test]
fn test_lowered_statement_serializes() {
    let stmt = Statement::CreateTable(orders_table());
    let lowered = lower_statement(&stmt, &BuiltinEnvironment::new(), &PlanConfig::default()).unwrap();
    let value = serde_json::to_value(&lowered).unwrap();
    assert_eq!(value["plan"]["CreateTable"]["name"], "orders");
    assert!(value["diagnostics"].as_array().unwrap().is_empty());
}
