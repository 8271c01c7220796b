//! Scalar expressions

use crate::identifier::{Identifier, Symbol};
use crate::query::Sfw;
use crate::types::DataType;
use serde::{Deserialize, Serialize};

/// Literal value as written in the query text
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Literal {
    /// `NULL`
    Null,
    /// `MISSING`
    Missing,
    /// `TRUE` / `FALSE`
    Bool(bool),
    /// Integer literal
    Int(i64),
    /// Exact numeric literal, kept as text to preserve scale
    Decimal(String),
    /// Approximate numeric literal
    Float(f64),
    /// Character string literal
    String(String),
}

/// Variable lookup qualifier: `x` vs `@x`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum ScopeQualifier {
    /// Ordinary lookup, local bindings first then globals
    #[default]
    Default,
    /// `@x`: local bindings only
    Local,
}

/// One navigation step of a path expression
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum PathStep {
    /// `.name` or `."Name"`
    Symbol(Symbol),
    /// `[expr]`
    Index(Box<Expr>),
    /// `[*]`
    Wildcard,
    /// `.*`
    Unpivot,
}

/// Unary operator
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum UnaryOp {
    Not,
    Pos,
    Neg,
}

impl UnaryOp {
    /// Name of the function this operator lowers to
    pub fn function_name(self) -> &'static str {
        match self {
            UnaryOp::Not => "not",
            UnaryOp::Pos => "pos",
            UnaryOp::Neg => "neg",
        }
    }
}

/// Binary operator
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum BinaryOp {
    Plus,
    Minus,
    Times,
    Divide,
    Modulo,
    Concat,
    BitwiseAnd,
    And,
    Or,
    Eq,
    Ne,
    Lt,
    Lte,
    Gt,
    Gte,
}

impl BinaryOp {
    /// Name of the function this operator lowers to
    pub fn function_name(self) -> &'static str {
        match self {
            BinaryOp::Plus => "plus",
            BinaryOp::Minus => "minus",
            BinaryOp::Times => "times",
            BinaryOp::Divide => "divide",
            BinaryOp::Modulo => "modulo",
            BinaryOp::Concat => "concat",
            BinaryOp::BitwiseAnd => "bitwise_and",
            BinaryOp::And => "and",
            BinaryOp::Or => "or",
            BinaryOp::Eq => "eq",
            BinaryOp::Ne => "ne",
            BinaryOp::Lt => "lt",
            BinaryOp::Lte => "lte",
            BinaryOp::Gt => "gt",
            BinaryOp::Gte => "gte",
        }
    }

    /// True for `=`, `<>`, `<`, `<=`, `>`, `>=`
    pub fn is_comparison(self) -> bool {
        matches!(
            self,
            BinaryOp::Eq | BinaryOp::Ne | BinaryOp::Lt | BinaryOp::Lte | BinaryOp::Gt | BinaryOp::Gte
        )
    }
}

/// Kind of collection constructor
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum CollectionKind {
    /// `<< ... >>`
    Bag,
    /// `[ ... ]`
    Array,
    /// `LIST( ... )`
    List,
    /// `SEXP( ... )`
    Sexp,
}

/// `ALL` / `DISTINCT`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SetQuantifier {
    All,
    Distinct,
}

/// Function call
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Call {
    /// Function name, possibly qualified
    pub function: Identifier,
    /// Arguments in order; `COUNT(*)` is written with no arguments
    pub args: Vec<Expr>,
    /// `DISTINCT` / `ALL` written inside the parentheses
    pub set_quantifier: Option<SetQuantifier>,
}

/// `name: value` pair of a struct constructor
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StructField {
    pub name: Expr,
    pub value: Expr,
}

/// `WHEN condition THEN result`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CaseBranch {
    pub condition: Expr,
    pub result: Expr,
}

/// `LEADING` / `TRAILING` / `BOTH`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum TrimSpec {
    Both,
    Leading,
    Trailing,
}

/// Field argument of `EXTRACT`, `DATE_ADD` and `DATE_DIFF`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum DatetimeField {
    Year,
    Month,
    Day,
    Hour,
    Minute,
    Second,
    TimezoneHour,
    TimezoneMinute,
}

impl DatetimeField {
    /// Lower-case name used as a function-name suffix
    pub fn name(self) -> &'static str {
        match self {
            DatetimeField::Year => "year",
            DatetimeField::Month => "month",
            DatetimeField::Day => "day",
            DatetimeField::Hour => "hour",
            DatetimeField::Minute => "minute",
            DatetimeField::Second => "second",
            DatetimeField::TimezoneHour => "timezone_hour",
            DatetimeField::TimezoneMinute => "timezone_minute",
        }
    }
}

/// Session attribute keywords
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SessionAttribute {
    CurrentUser,
    CurrentDate,
}

/// Window functions
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum WindowFunction {
    Lag,
    Lead,
}

impl WindowFunction {
    /// Lower-case function name
    pub fn name(self) -> &'static str {
        match self {
            WindowFunction::Lag => "lag",
            WindowFunction::Lead => "lead",
        }
    }
}

/// ORDER BY direction
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum OrderDirection {
    Asc,
    Desc,
}

/// NULLS FIRST / NULLS LAST
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum NullOrder {
    First,
    Last,
}

/// One ORDER BY item
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Sort {
    pub expr: Expr,
    pub dir: Option<OrderDirection>,
    pub nulls: Option<NullOrder>,
}

impl Sort {
    /// Sort on `expr` with default ordering
    pub fn new(expr: Expr) -> Self {
        Self {
            expr,
            dir: None,
            nulls: None,
        }
    }
}

/// `OVER (PARTITION BY ... ORDER BY ...)`
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct WindowSpec {
    pub partitions: Vec<Expr>,
    pub sorts: Vec<Sort>,
}

/// A window function application
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Window {
    pub function: WindowFunction,
    pub args: Vec<Expr>,
    pub over: WindowSpec,
}

/// UNION / INTERSECT / EXCEPT
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SetOpKind {
    Union,
    Intersect,
    Except,
}

/// A bag operator used as an expression: `q1 OUTER UNION ALL q2`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BagOp {
    pub kind: SetOpKind,
    pub quantifier: Option<SetQuantifier>,
    pub outer: bool,
    pub lhs: Box<Expr>,
    pub rhs: Box<Expr>,
}

/// Scalar expression
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Expr {
    Lit(Literal),
    Var {
        identifier: Identifier,
        scope: ScopeQualifier,
    },
    Path {
        root: Box<Expr>,
        steps: Vec<PathStep>,
    },
    Call(Call),
    Unary {
        op: UnaryOp,
        expr: Box<Expr>,
    },
    Binary {
        op: BinaryOp,
        lhs: Box<Expr>,
        rhs: Box<Expr>,
    },
    Struct(Vec<StructField>),
    Collection {
        kind: CollectionKind,
        values: Vec<Expr>,
    },
    Like {
        value: Box<Expr>,
        pattern: Box<Expr>,
        escape: Option<Box<Expr>>,
        not: bool,
    },
    Between {
        value: Box<Expr>,
        from: Box<Expr>,
        to: Box<Expr>,
        not: bool,
    },
    InCollection {
        lhs: Box<Expr>,
        rhs: Box<Expr>,
        not: bool,
    },
    IsType {
        value: Box<Expr>,
        ty: DataType,
        not: bool,
    },
    Case {
        /// Present for the simple form `CASE x WHEN ...`
        operand: Option<Box<Expr>>,
        branches: Vec<CaseBranch>,
        default: Option<Box<Expr>>,
    },
    Coalesce(Vec<Expr>),
    NullIf {
        value: Box<Expr>,
        nullifier: Box<Expr>,
    },
    Cast {
        value: Box<Expr>,
        as_type: DataType,
    },
    CanCast {
        value: Box<Expr>,
        as_type: DataType,
    },
    CanLosslessCast {
        value: Box<Expr>,
        as_type: DataType,
    },
    /// `SUBSTRING(v FROM start FOR length)`
    Substring {
        value: Box<Expr>,
        start: Option<Box<Expr>>,
        length: Option<Box<Expr>>,
    },
    /// `POSITION(lhs IN rhs)`
    Position {
        lhs: Box<Expr>,
        rhs: Box<Expr>,
    },
    /// `TRIM(spec chars FROM value)`
    Trim {
        value: Box<Expr>,
        chars: Option<Box<Expr>>,
        spec: Option<TrimSpec>,
    },
    /// `OVERLAY(value PLACING overlay FROM start FOR length)`
    Overlay {
        value: Box<Expr>,
        overlay: Box<Expr>,
        start: Box<Expr>,
        length: Option<Box<Expr>>,
    },
    Extract {
        field: DatetimeField,
        source: Box<Expr>,
    },
    DateAdd {
        field: DatetimeField,
        lhs: Box<Expr>,
        rhs: Box<Expr>,
    },
    DateDiff {
        field: DatetimeField,
        lhs: Box<Expr>,
        rhs: Box<Expr>,
    },
    SessionAttribute(SessionAttribute),
    Window(Box<Window>),
    BagOp(BagOp),
    Sfw(Box<Sfw>),
}

impl Expr {
    /// Regular variable reference
    pub fn var(name: impl Into<String>) -> Self {
        Expr::Var {
            identifier: Identifier::regular(name),
            scope: ScopeQualifier::Default,
        }
    }

    /// Delimited variable reference
    pub fn delimited_var(name: impl Into<String>) -> Self {
        Expr::Var {
            identifier: Identifier::delimited(name),
            scope: ScopeQualifier::Default,
        }
    }

    /// String literal
    pub fn string(value: impl Into<String>) -> Self {
        Expr::Lit(Literal::String(value.into()))
    }

    /// Integer literal
    pub fn int(value: i64) -> Self {
        Expr::Lit(Literal::Int(value))
    }

    /// Boolean literal
    pub fn bool(value: bool) -> Self {
        Expr::Lit(Literal::Bool(value))
    }

    /// `NULL`
    pub fn null() -> Self {
        Expr::Lit(Literal::Null)
    }

    /// Call to an unqualified function
    pub fn call(name: impl Into<String>, args: Vec<Expr>) -> Self {
        Expr::Call(Call {
            function: Identifier::regular(name),
            args,
            set_quantifier: None,
        })
    }

    /// Binary operation
    pub fn binary(op: BinaryOp, lhs: Expr, rhs: Expr) -> Self {
        Expr::Binary {
            op,
            lhs: Box::new(lhs),
            rhs: Box::new(rhs),
        }
    }

    /// Path over `root`
    pub fn path(root: Expr, steps: Vec<PathStep>) -> Self {
        Expr::Path {
            root: Box::new(root),
            steps,
        }
    }

    /// Struct with string-literal field names
    pub fn struct_of(fields: Vec<(String, Expr)>) -> Self {
        Expr::Struct(
            fields
                .into_iter()
                .map(|(name, value)| StructField {
                    name: Expr::string(name),
                    value,
                })
                .collect(),
        )
    }

    /// True for a nested query block
    pub fn is_sfw(&self) -> bool {
        matches!(self, Expr::Sfw(_))
    }

    /// The nested query block, if any
    pub fn as_sfw(&self) -> Option<&Sfw> {
        match self {
            Expr::Sfw(sfw) => Some(sfw),
            _ => None,
        }
    }
}

impl From<Literal> for Expr {
    fn from(lit: Literal) -> Self {
        Expr::Lit(lit)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_operator_names() {
        assert_eq!(BinaryOp::Ne.function_name(), "ne");
        assert_eq!(BinaryOp::BitwiseAnd.function_name(), "bitwise_and");
        assert_eq!(UnaryOp::Neg.function_name(), "neg");
        assert!(BinaryOp::Lte.is_comparison());
        assert!(!BinaryOp::Concat.is_comparison());
    }

    #[test]
    fn test_struct_of_uses_string_keys() {
        let s = Expr::struct_of(vec![("a".to_string(), Expr::int(1))]);
        match s {
            Expr::Struct(fields) => {
                assert_eq!(fields.len(), 1);
                assert_eq!(fields[0].name, Expr::string("a"));
            }
            other => panic!("Expected Struct, got {other:?}"),
        }
    }

    #[test]
    fn test_expr_json_roundtrip() {
        let e = Expr::binary(
            BinaryOp::Eq,
            Expr::path(Expr::var("t"), vec![PathStep::Symbol(Symbol::regular("a"))]),
            Expr::Lit(Literal::Decimal("1.50".to_string())),
        );
        let json = serde_json::to_string(&e).unwrap();
        let back: Expr = serde_json::from_str(&json).unwrap();
        assert_eq!(e, back);
    }
}
