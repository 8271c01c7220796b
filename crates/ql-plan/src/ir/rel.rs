//! Relational operators: the nodes of the IR plan tree

use super::rex::Rex;
use super::schema::RelType;
use ql_ast::Identifier;
use serde::{Deserialize, Serialize};

/// Join kind
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum JoinKind {
    Inner,
    Left,
    Right,
    Full,
}

impl std::fmt::Display for JoinKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            JoinKind::Inner => write!(f, "INNER"),
            JoinKind::Left => write!(f, "LEFT"),
            JoinKind::Right => write!(f, "RIGHT"),
            JoinKind::Full => write!(f, "FULL"),
        }
    }
}

/// Set operator quantifier
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SetQuantifier {
    All,
    Distinct,
}

impl std::fmt::Display for SetQuantifier {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SetQuantifier::All => write!(f, "ALL"),
            SetQuantifier::Distinct => write!(f, "DISTINCT"),
        }
    }
}

/// Operands of UNION / INTERSECT / EXCEPT
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SetOp {
    pub quantifier: SetQuantifier,
    /// OUTER variant: operands need not have matching schemas
    pub is_outer: bool,
    pub lhs: Box<Rel>,
    pub rhs: Box<Rel>,
}

/// Sort order with null placement
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SortOrder {
    AscNullsFirst,
    AscNullsLast,
    DescNullsFirst,
    DescNullsLast,
}

impl std::fmt::Display for SortOrder {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SortOrder::AscNullsFirst => write!(f, "ASC NULLS FIRST"),
            SortOrder::AscNullsLast => write!(f, "ASC NULLS LAST"),
            SortOrder::DescNullsFirst => write!(f, "DESC NULLS FIRST"),
            SortOrder::DescNullsLast => write!(f, "DESC NULLS LAST"),
        }
    }
}

/// Sort key for ORDER BY
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SortSpec {
    pub rex: Rex,
    pub order: SortOrder,
}

/// Aggregation strategy
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum AggregateStrategy {
    Full,
    Partial,
}

/// One aggregate computed by an Aggregate node
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AggregateCall {
    /// Function name, left for the resolution stage
    pub function: Identifier,
    pub set_quantifier: SetQuantifier,
    pub args: Vec<Rex>,
}

/// One window function computed by a Window node
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WindowCall {
    pub function: String,
    pub args: Vec<Rex>,
}

/// Kind of one step in an exclusion trie
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum ExcludeKind {
    /// Delimited field name, matched exactly
    StructKey(String),
    /// Regular field name, matched ignoring case
    StructSymbol(String),
    StructWildcard,
    CollIndex(i32),
    CollWildcard,
}

impl ExcludeKind {
    /// True if both kinds select the same element
    pub fn same_target(&self, other: &ExcludeKind) -> bool {
        match (self, other) {
            (ExcludeKind::StructSymbol(a), ExcludeKind::StructSymbol(b)) => {
                a.eq_ignore_ascii_case(b)
            }
            _ => self == other,
        }
    }

    /// True if excluding all of `self` already excludes all of `other`
    pub fn covers(&self, other: &ExcludeKind) -> bool {
        match (self, other) {
            (ExcludeKind::StructSymbol(a), ExcludeKind::StructKey(b)) => a.eq_ignore_ascii_case(b),
            (
                ExcludeKind::StructWildcard,
                ExcludeKind::StructSymbol(_) | ExcludeKind::StructKey(_),
            ) => true,
            (ExcludeKind::CollWildcard, ExcludeKind::CollIndex(_)) => true,
            _ => self.same_target(other),
        }
    }
}

/// A node of the exclusion trie; no substeps means the whole element is excluded
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExcludeStep {
    pub kind: ExcludeKind,
    pub substeps: Vec<ExcludeStep>,
}

/// Exclusions under one root variable; no steps means the whole root is excluded
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExcludePath {
    pub root: Rex,
    pub steps: Vec<ExcludeStep>,
}

/// Relational operator
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum RelOp {
    /// Iterate the elements of a collection
    Scan { rex: Rex },
    /// Iterate elements together with their position
    ScanIndexed { rex: Rex },
    /// Iterate the (value, name) pairs of a struct
    Unpivot { rex: Rex },
    Distinct {
        input: Box<Rel>,
    },
    Filter {
        input: Box<Rel>,
        predicate: Rex,
    },
    Sort {
        input: Box<Rel>,
        specs: Vec<SortSpec>,
    },
    Union(SetOp),
    Intersect(SetOp),
    Except(SetOp),
    Limit {
        input: Box<Rel>,
        limit: Rex,
    },
    Offset {
        input: Box<Rel>,
        offset: Rex,
    },
    Project {
        input: Box<Rel>,
        projections: Vec<Rex>,
    },
    Join {
        lhs: Box<Rel>,
        rhs: Box<Rel>,
        condition: Rex,
        kind: JoinKind,
    },
    Aggregate {
        input: Box<Rel>,
        strategy: AggregateStrategy,
        calls: Vec<AggregateCall>,
        groups: Vec<Rex>,
    },
    Window {
        input: Box<Rel>,
        partitions: Vec<Rex>,
        sorts: Vec<SortSpec>,
        functions: Vec<WindowCall>,
    },
    Exclude {
        input: Box<Rel>,
        paths: Vec<ExcludePath>,
    },
    /// Placeholder for a relation that failed to lower
    Err {
        reason: String,
    },
}

/// A relational operator with its output type
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Rel {
    pub ty: RelType,
    pub op: RelOp,
}

impl Rel {
    pub fn new(ty: RelType, op: RelOp) -> Self {
        Self { ty, op }
    }

    /// The direct relational inputs of this node
    pub fn inputs(&self) -> Vec<&Rel> {
        match &self.op {
            RelOp::Scan { .. }
            | RelOp::ScanIndexed { .. }
            | RelOp::Unpivot { .. }
            | RelOp::Err { .. } => Vec::new(),
            RelOp::Distinct { input }
            | RelOp::Filter { input, .. }
            | RelOp::Sort { input, .. }
            | RelOp::Limit { input, .. }
            | RelOp::Offset { input, .. }
            | RelOp::Project { input, .. }
            | RelOp::Aggregate { input, .. }
            | RelOp::Window { input, .. }
            | RelOp::Exclude { input, .. } => vec![&**input],
            RelOp::Union(set) | RelOp::Intersect(set) | RelOp::Except(set) => {
                vec![&*set.lhs, &*set.rhs]
            }
            RelOp::Join { lhs, rhs, .. } => vec![&**lhs, &**rhs],
        }
    }

    /// Short operator name, as used by EXPLAIN
    pub fn op_name(&self) -> &'static str {
        match &self.op {
            RelOp::Scan { .. } => "Scan",
            RelOp::ScanIndexed { .. } => "ScanIndexed",
            RelOp::Unpivot { .. } => "Unpivot",
            RelOp::Distinct { .. } => "Distinct",
            RelOp::Filter { .. } => "Filter",
            RelOp::Sort { .. } => "Sort",
            RelOp::Union(_) => "Union",
            RelOp::Intersect(_) => "Intersect",
            RelOp::Except(_) => "Except",
            RelOp::Limit { .. } => "Limit",
            RelOp::Offset { .. } => "Offset",
            RelOp::Project { .. } => "Project",
            RelOp::Join { .. } => "Join",
            RelOp::Aggregate { .. } => "Aggregate",
            RelOp::Window { .. } => "Window",
            RelOp::Exclude { .. } => "Exclude",
            RelOp::Err { .. } => "Err",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_inputs_of_join() {
        let scan = |name: &str| {
            Rel::new(
                RelType::of_names([name]),
                RelOp::Scan {
                    rex: Rex::string(name),
                },
            )
        };
        let join = Rel::new(
            RelType::of_names(["a", "b"]),
            RelOp::Join {
                lhs: Box::new(scan("a")),
                rhs: Box::new(scan("b")),
                condition: Rex::bool(true),
                kind: JoinKind::Inner,
            },
        );
        assert_eq!(join.inputs().len(), 2);
        assert_eq!(join.op_name(), "Join");
        assert!(join.inputs()[0].inputs().is_empty());
    }

    #[test]
    fn test_exclude_symbol_targets_ignore_case() {
        let a = ExcludeKind::StructSymbol("Name".to_string());
        let b = ExcludeKind::StructSymbol("name".to_string());
        let key = ExcludeKind::StructKey("name".to_string());
        assert!(a.same_target(&b));
        assert!(!b.same_target(&key));
        assert!(ExcludeKind::CollIndex(1).same_target(&ExcludeKind::CollIndex(1)));
    }
}
