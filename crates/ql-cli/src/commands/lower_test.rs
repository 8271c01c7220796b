use super::*;
use ql_ast::{
    ColumnConstraint, ColumnDefinition, CreateTable, DataType, Expr, FromClause, FromValue,
    Identifier, Select, Sfw, Symbol,
};
use std::path::Path;
use tempfile::tempdir;

fn scan_query() -> Statement {
    let from = FromClause::Value(FromValue::scan(Expr::var("t"), Symbol::regular("x")));
    Statement::Query(Expr::Sfw(Box::new(Sfw::new(
        Select::Value {
            constructor: Expr::var("x"),
            quantifier: None,
        },
        from,
    ))))
}

fn write_statement(dir: &Path, stmt: &Statement) -> std::path::PathBuf {
    let path = dir.join("stmt.json");
    fs::write(&path, serde_json::to_string(stmt).unwrap()).unwrap();
    path
}

fn global() -> GlobalArgs {
    GlobalArgs {
        verbose: false,
        config: None,
    }
}

#[test]
fn test_render_query_as_explain() {
    let lowered =
        lower_statement(&scan_query(), &BuiltinEnvironment::new(), &PlanConfig::default()).unwrap();
    let text = render(&lowered, LowerOutput::Explain).unwrap();
    assert_eq!(
        text,
        "select(#0.0)\n  Project #0.0 -> ($value)\n    Scan t -> (x)\n"
    );
}

#[test]
fn test_render_table_shape() {
    let stmt = Statement::CreateTable(CreateTable {
        name: Identifier::regular("items"),
        columns: vec![ColumnDefinition {
            name: Symbol::regular("id"),
            ty: DataType::Int4,
            constraints: vec![ColumnConstraint::PrimaryKey],
        }],
        constraints: vec![],
    });
    let lowered = lower_statement(&stmt, &BuiltinEnvironment::new(), &PlanConfig::default()).unwrap();
    let text = render(&lowered, LowerOutput::Explain).unwrap();
    assert_eq!(
        text,
        "CreateTable items\n  id INTEGER NOT NULL\n  PRIMARY KEY (id)\n"
    );
}

#[test]
fn test_render_json_includes_diagnostics() {
    let lowered =
        lower_statement(&scan_query(), &BuiltinEnvironment::new(), &PlanConfig::default()).unwrap();
    let json = render(&lowered, LowerOutput::Json).unwrap();
    let value: serde_json::Value = serde_json::from_str(&json).unwrap();
    assert!(value["plan"]["Query"].is_object());
    assert_eq!(value["diagnostics"], serde_json::json!([]));
}

#[test]
fn test_execute_reads_statement_file() {
    let dir = tempdir().unwrap();
    let path = write_statement(dir.path(), &scan_query());
    let args = LowerArgs {
        file: path,
        output: LowerOutput::Json,
    };
    assert!(execute(&args, &global()).is_ok());
}

#[test]
fn test_execute_with_config_file() {
    let dir = tempdir().unwrap();
    let path = write_statement(dir.path(), &scan_query());
    let config_path = dir.path().join("qlplan.yml");
    fs::write(&config_path, "error_mode: collect\n").unwrap();

    let args = LowerArgs {
        file: path,
        output: LowerOutput::Explain,
    };
    let global = GlobalArgs {
        verbose: true,
        config: Some(config_path),
    };
    assert!(execute(&args, &global).is_ok());
}

#[test]
fn test_execute_rejects_malformed_input() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("broken.json");
    fs::write(&path, "{\"Query\": 42}").unwrap();
    let args = LowerArgs {
        file: path,
        output: LowerOutput::Explain,
    };
    let err = execute(&args, &global()).unwrap_err();
    assert!(err.to_string().contains("Failed to decode statement"));
}

#[test]
fn test_execute_missing_config_fails() {
    let dir = tempdir().unwrap();
    let path = write_statement(dir.path(), &scan_query());
    let args = LowerArgs {
        file: path,
        output: LowerOutput::Explain,
    };
    let global = GlobalArgs {
        verbose: false,
        config: Some(dir.path().join("absent.yml")),
    };
    let err = execute(&args, &global).unwrap_err();
    assert!(err.to_string().contains("Failed to load config"));
}
