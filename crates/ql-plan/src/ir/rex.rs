//! Scalar expressions of the IR

use super::rel::Rel;
use super::types::{PlanType, TypeTag};
use ql_ast::Identifier;
use serde::{Deserialize, Serialize};

/// Literal value
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum LiteralValue {
    Null,
    Missing,
    Bool(bool),
    Int(i64),
    /// Exact numeric, kept as text
    Decimal(String),
    Float(f64),
    String(String),
}

impl LiteralValue {
    /// Static type of the literal
    pub fn type_tag(&self) -> TypeTag {
        match self {
            LiteralValue::Null => TypeTag::Null,
            LiteralValue::Missing => TypeTag::Missing,
            LiteralValue::Bool(_) => TypeTag::Boolean,
            LiteralValue::Int(_) => TypeTag::Int,
            LiteralValue::Decimal(_) => TypeTag::Decimal {
                precision: None,
                scale: None,
            },
            LiteralValue::Float(_) => TypeTag::Float {
                bits: super::types::FloatBitWidth::F64,
            },
            LiteralValue::String(_) => TypeTag::String,
        }
    }
}

/// Lookup scope of an unresolved variable
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum VarScope {
    Default,
    Local,
}

/// Collection constructor kind
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum CollectionKind {
    Bag,
    List,
}

/// How a subquery collapses into a value
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Coercion {
    /// Single value of the single row
    Scalar,
    /// The single row, as a list of its field values
    Row,
}

/// `name: value` of a struct constructor
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StructField {
    pub key: Rex,
    pub value: Rex,
}

/// `WHEN condition THEN result`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CaseBranch {
    pub condition: Rex,
    pub result: Rex,
}

/// Scalar expression operator
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum RexOp {
    Lit(LiteralValue),
    /// Slot `offset` of the schema `depth` query levels out
    VarLocal {
        depth: usize,
        offset: usize,
    },
    /// Name left for the resolution stage
    VarUnresolved {
        identifier: Identifier,
        scope: VarScope,
    },
    VarGlobal {
        reference: String,
    },
    /// `root.symbol`, matched by the symbol's case rules
    PathSymbol {
        root: Box<Rex>,
        key: String,
    },
    /// `root['key']`, matched exactly
    PathKey {
        root: Box<Rex>,
        key: Box<Rex>,
    },
    /// `root[index]`
    PathIndex {
        root: Box<Rex>,
        index: Box<Rex>,
    },
    CallUnresolved {
        identifier: Identifier,
        args: Vec<Rex>,
    },
    CallStatic {
        function: String,
        args: Vec<Rex>,
    },
    CallDynamic {
        candidates: Vec<String>,
        args: Vec<Rex>,
    },
    CastUnresolved {
        target: TypeTag,
        arg: Box<Rex>,
    },
    CastResolved {
        target: TypeTag,
        arg: Box<Rex>,
    },
    Struct {
        fields: Vec<StructField>,
    },
    Collection {
        kind: CollectionKind,
        values: Vec<Rex>,
    },
    /// Merge of struct-valued arguments into one struct
    TupleUnion {
        args: Vec<Rex>,
    },
    Case {
        branches: Vec<CaseBranch>,
        default: Box<Rex>,
    },
    Coalesce {
        args: Vec<Rex>,
    },
    Nullif {
        value: Box<Rex>,
        nullifier: Box<Rex>,
    },
    /// Bag of `constructor` evaluated over each row of `rel`
    Select {
        constructor: Box<Rex>,
        rel: Box<Rel>,
    },
    Subquery {
        constructor: Box<Rex>,
        rel: Box<Rel>,
        coercion: Coercion,
    },
    Pivot {
        rel: Box<Rel>,
        key: Box<Rex>,
        value: Box<Rex>,
    },
    /// Placeholder for a node that failed to lower
    Err {
        message: String,
    },
}

/// A typed scalar expression
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Rex {
    pub ty: PlanType,
    pub op: RexOp,
}

impl Rex {
    /// Expression of dynamic type
    pub fn dynamic(op: RexOp) -> Self {
        Self {
            ty: PlanType::Dynamic,
            op,
        }
    }

    /// Literal with its static type
    pub fn lit(value: LiteralValue) -> Self {
        Self {
            ty: PlanType::Static(value.type_tag()),
            op: RexOp::Lit(value),
        }
    }

    pub fn null() -> Self {
        Self::lit(LiteralValue::Null)
    }

    pub fn bool(value: bool) -> Self {
        Self::lit(LiteralValue::Bool(value))
    }

    pub fn int(value: i64) -> Self {
        Self::lit(LiteralValue::Int(value))
    }

    pub fn string(value: impl Into<String>) -> Self {
        Self::lit(LiteralValue::String(value.into()))
    }

    /// Resolved local variable
    pub fn var_local(depth: usize, offset: usize) -> Self {
        Self::dynamic(RexOp::VarLocal { depth, offset })
    }

    /// Unresolved call to a regular, unqualified function name
    pub fn call(name: &str, args: Vec<Rex>) -> Self {
        Self::dynamic(RexOp::CallUnresolved {
            identifier: Identifier::regular(name),
            args,
        })
    }

    /// `not(self)`
    pub fn not(self) -> Self {
        Self::call("not", vec![self])
    }

    /// Error placeholder
    pub fn err(message: impl Into<String>) -> Self {
        Self::dynamic(RexOp::Err {
            message: message.into(),
        })
    }

    /// True for the error placeholder
    pub fn is_err(&self) -> bool {
        matches!(self.op, RexOp::Err { .. })
    }
}
