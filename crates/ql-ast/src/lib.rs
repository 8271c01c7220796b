//! ql-ast: surface syntax tree for the query language
//!
//! The tree is produced by an external parser and consumed read-only by
//! `ql-plan`. Every node is serde-serializable so statements can be handed
//! over as JSON.

pub mod ddl;
mod display;
pub mod expr;
pub mod identifier;
pub mod query;
pub mod statement;
pub mod types;

pub use ddl::{
    ColumnConstraint, ColumnDefinition, CreateTable, TableConstraint, TableConstraintKind,
};
pub use expr::{
    BagOp, BinaryOp, Call, CaseBranch, CollectionKind, DatetimeField, Expr, Literal, NullOrder,
    OrderDirection, PathStep, ScopeQualifier, SessionAttribute, SetOpKind, SetQuantifier, Sort,
    StructField, TrimSpec, UnaryOp, Window, WindowFunction, WindowSpec,
};
pub use identifier::{CaseSensitivity, Identifier, Symbol};
pub use query::{
    ExcludePath, ExcludeStep, FromClause, FromJoin, FromKind, FromValue, GroupBy, GroupKey,
    GroupStrategy, JoinType, ProjectItem, Select, Sfw, SfwSetOp,
};
pub use statement::Statement;
pub use types::DataType;
