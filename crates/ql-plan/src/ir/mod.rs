//! Relational Algebra IR: `Rel` operator trees and `Rex` scalar expressions

pub mod ddl;
pub mod explain;
pub mod rel;
pub mod rex;
pub mod schema;
pub mod types;
