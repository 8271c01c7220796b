//! ql-plan: semantic lowering of query syntax trees
//!
//! This crate turns a `ql_ast::Statement` into the relational IR: a tree of
//! `Rel` operators with `Rex` scalar expressions, where every variable bound
//! by an enclosing FROM clause is a positional `(depth, offset)` reference.
//! Names the query does not bind are left for a later resolution stage.

pub(crate) mod config;
pub(crate) mod diagnostic;
pub(crate) mod env;
pub(crate) mod error;
pub mod ir;
pub(crate) mod lowering;

#[cfg(any(test, feature = "test-support"))]
pub mod test_utils;

pub use config::{ErrorMode, PlanConfig, UnresolvedExclude};
pub use diagnostic::{Diagnostic, Severity};
pub use env::{AggregateSignature, BuiltinEnvironment, Environment};
pub use error::{PlanError, PlanResult};
pub use ir::ddl::{ColumnShape, TableShape};
pub use ir::explain::{explain, explain_rel};
pub use ir::rel::{Rel, RelOp};
pub use ir::rex::{Rex, RexOp};
pub use ir::schema::{Binding, RelType};
pub use lowering::{lower_query, lower_statement, LoweredStatement, Plan};
