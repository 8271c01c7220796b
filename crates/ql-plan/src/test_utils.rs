//! Shared test utilities for ql-plan: AST builders and lowering shorthands

use crate::env::BuiltinEnvironment;
use crate::ir::rel::{Rel, RelOp};
use crate::ir::rex::{Rex, RexOp};
use crate::lowering::lower_query;
use ql_ast::{
    Expr, FromClause, FromJoin, FromValue, JoinType, PathStep, ProjectItem, Select, Sfw, Symbol,
};

/// Regular symbol
pub fn sym(name: &str) -> Symbol {
    Symbol::regular(name)
}

/// `root.f1.f2...` with regular symbol steps
pub fn path(root: &str, fields: &[&str]) -> Expr {
    Expr::path(
        Expr::var(root),
        fields.iter().map(|f| PathStep::Symbol(sym(f))).collect(),
    )
}

/// `source AS alias`
pub fn from_as(source: Expr, alias: &str) -> FromClause {
    FromClause::Value(FromValue::scan(source, sym(alias)))
}

/// `source AS alias AT at`
pub fn from_at(source: Expr, alias: &str, at: &str) -> FromClause {
    let mut value = FromValue::scan(source, sym(alias));
    value.at_alias = Some(sym(at));
    FromClause::Value(value)
}

/// `lhs <join_type> rhs [ON condition]`
pub fn join(lhs: FromClause, rhs: FromClause, join_type: JoinType, on: Option<Expr>) -> FromClause {
    FromClause::Join(FromJoin {
        lhs: Box::new(lhs),
        rhs: Box::new(rhs),
        join_type,
        condition: on,
    })
}

/// `SELECT * FROM ...`
pub fn select_star(from: FromClause) -> Sfw {
    Sfw::new(Select::Star { quantifier: None }, from)
}

/// `SELECT VALUE constructor FROM ...`
pub fn select_value(constructor: Expr, from: FromClause) -> Sfw {
    Sfw::new(
        Select::Value {
            constructor,
            quantifier: None,
        },
        from,
    )
}

/// `SELECT e1 [AS a1], e2 [AS a2] FROM ...`
pub fn select_list(items: Vec<(Expr, Option<&str>)>, from: FromClause) -> Sfw {
    let items = items
        .into_iter()
        .map(|(expr, alias)| ProjectItem::Expression {
            expr,
            as_alias: alias.map(sym),
        })
        .collect();
    Sfw::new(
        Select::Project {
            items,
            quantifier: None,
        },
        from,
    )
}

/// Query block as an expression
pub fn query(sfw: Sfw) -> Expr {
    Expr::Sfw(Box::new(sfw))
}

/// Lower with the builtin environment and fail-fast configuration
pub fn lower(expr: &Expr) -> Rex {
    lower_query(expr, &BuiltinEnvironment::new()).unwrap()
}

/// The relational plan under a `Select`, `Subquery` or `Pivot`
pub fn rel_of(rex: &Rex) -> &Rel {
    match &rex.op {
        RexOp::Select { rel, .. } | RexOp::Subquery { rel, .. } | RexOp::Pivot { rel, .. } => rel,
        other => panic!("Expected a query expression, got {other:?}"),
    }
}

/// The single projection of a `Project` node
pub fn projection(rel: &Rel) -> &Rex {
    match &rel.op {
        RelOp::Project { projections, .. } => &projections[0],
        other => panic!("Expected Project, got {other:?}"),
    }
}
