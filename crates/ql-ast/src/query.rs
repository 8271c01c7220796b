//! Query blocks: SELECT-FROM-WHERE and its clauses

use crate::expr::{Expr, SetOpKind, SetQuantifier, Sort};
use crate::identifier::Symbol;
use serde::{Deserialize, Serialize};

/// SELECT clause
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Select {
    /// `SELECT *`
    Star { quantifier: Option<SetQuantifier> },
    /// `SELECT a, b.*, c AS d`
    Project {
        items: Vec<ProjectItem>,
        quantifier: Option<SetQuantifier>,
    },
    /// `SELECT VALUE <constructor>`
    Value {
        constructor: Expr,
        quantifier: Option<SetQuantifier>,
    },
    /// `PIVOT value AT key`
    Pivot { key: Expr, value: Expr },
}

impl Select {
    /// The DISTINCT/ALL quantifier, if the clause carries one
    pub fn quantifier(&self) -> Option<SetQuantifier> {
        match self {
            Select::Star { quantifier }
            | Select::Project { quantifier, .. }
            | Select::Value { quantifier, .. } => *quantifier,
            Select::Pivot { .. } => None,
        }
    }

    /// True for `SELECT *` and `SELECT <list>`, which produce rows of named fields
    pub fn is_row_shaped(&self) -> bool {
        matches!(self, Select::Star { .. } | Select::Project { .. })
    }
}

/// Item of a SELECT list
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum ProjectItem {
    /// `expr.*`
    All { expr: Expr },
    /// `expr [AS alias]`
    Expression {
        expr: Expr,
        as_alias: Option<Symbol>,
    },
}

/// How a FROM item ranges over its source
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum FromKind {
    /// Iterate the elements of a collection
    Scan,
    /// `UNPIVOT expr`: iterate the fields of a struct
    Unpivot,
}

/// Join syntax
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum JoinType {
    /// `FROM a, b`
    Comma,
    Inner,
    Cross,
    Left,
    LeftOuter,
    Right,
    RightOuter,
    Full,
    FullOuter,
}

/// A single FROM source with its range-variable aliases
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FromValue {
    pub expr: Expr,
    pub kind: FromKind,
    pub as_alias: Option<Symbol>,
    pub at_alias: Option<Symbol>,
    pub by_alias: Option<Symbol>,
}

impl FromValue {
    /// `expr AS alias`
    pub fn scan(expr: Expr, as_alias: Symbol) -> Self {
        Self {
            expr,
            kind: FromKind::Scan,
            as_alias: Some(as_alias),
            at_alias: None,
            by_alias: None,
        }
    }
}

/// Two FROM items combined by a join
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FromJoin {
    pub lhs: Box<FromClause>,
    pub rhs: Box<FromClause>,
    pub join_type: JoinType,
    pub condition: Option<Expr>,
}

/// FROM clause
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum FromClause {
    Value(FromValue),
    Join(FromJoin),
}

impl FromClause {
    /// Every range-variable item, left to right
    pub fn values(&self) -> Vec<&FromValue> {
        match self {
            FromClause::Value(v) => vec![v],
            FromClause::Join(j) => {
                let mut out = j.lhs.values();
                out.extend(j.rhs.values());
                out
            }
        }
    }
}

/// GROUP BY strategy
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum GroupStrategy {
    #[default]
    Full,
    /// `GROUP PARTIAL BY`
    Partial,
}

/// One GROUP BY key
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GroupKey {
    pub expr: Expr,
    pub as_alias: Option<Symbol>,
}

/// GROUP BY clause
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GroupBy {
    pub strategy: GroupStrategy,
    pub keys: Vec<GroupKey>,
    /// `GROUP AS g`
    pub as_alias: Option<Symbol>,
}

/// One step of an EXCLUDE path
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ExcludeStep {
    /// `.field` or `."Field"`
    StructField(Symbol),
    /// `.*`
    StructWildcard,
    /// `[3]`
    CollIndex(i32),
    /// `[*]`
    CollWildcard,
}

/// `EXCLUDE root.step.step`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExcludePath {
    /// Range variable the path starts from
    pub root: Expr,
    pub steps: Vec<ExcludeStep>,
}

/// Set operator attached to a query block
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SfwSetOp {
    pub kind: SetOpKind,
    pub quantifier: Option<SetQuantifier>,
    pub outer: bool,
    pub operand: Box<Sfw>,
}

/// A SELECT-FROM-WHERE query block
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Sfw {
    pub select: Select,
    #[serde(default)]
    pub exclude: Vec<ExcludePath>,
    pub from: FromClause,
    #[serde(default)]
    pub where_clause: Option<Expr>,
    #[serde(default)]
    pub group_by: Option<GroupBy>,
    #[serde(default)]
    pub having: Option<Expr>,
    #[serde(default)]
    pub set_op: Option<SfwSetOp>,
    #[serde(default)]
    pub order_by: Vec<Sort>,
    #[serde(default)]
    pub limit: Option<Expr>,
    #[serde(default)]
    pub offset: Option<Expr>,
}

impl Sfw {
    /// Query block with only SELECT and FROM
    pub fn new(select: Select, from: FromClause) -> Self {
        Self {
            select,
            exclude: Vec::new(),
            from,
            where_clause: None,
            group_by: None,
            having: None,
            set_op: None,
            order_by: Vec::new(),
            limit: None,
            offset: None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_values_left_to_right() {
        let from = FromClause::Join(FromJoin {
            lhs: Box::new(FromClause::Value(FromValue::scan(Expr::var("a"), Symbol::regular("x")))),
            rhs: Box::new(FromClause::Value(FromValue::scan(Expr::var("b"), Symbol::regular("y")))),
            join_type: JoinType::Comma,
            condition: None,
        });
        let aliases: Vec<_> = from
            .values()
            .iter()
            .filter_map(|v| v.as_alias.as_ref().map(|s| s.text.clone()))
            .collect();
        assert_eq!(aliases, vec!["x", "y"]);
    }

    #[test]
    fn test_sfw_optional_clauses_default_when_absent() {
        let json = r#"{
            "select": {"Star": {"quantifier": null}},
            "from": {"Value": {
                "expr": {"Var": {"identifier": {"Symbol": {"text": "t", "case": "insensitive"}}, "scope": "Default"}},
                "kind": "Scan",
                "as_alias": {"text": "t", "case": "insensitive"},
                "at_alias": null,
                "by_alias": null
            }}
        }"#;
        let sfw: Sfw = serde_json::from_str(json).unwrap();
        assert!(sfw.exclude.is_empty());
        assert!(sfw.order_by.is_empty());
        assert!(sfw.group_by.is_none());
        assert!(sfw.select.is_row_shaped());
    }
}
