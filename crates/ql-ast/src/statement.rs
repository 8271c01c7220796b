//! Top-level statements

use crate::ddl::CreateTable;
use crate::expr::Expr;
use serde::{Deserialize, Serialize};

/// A parsed statement
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Statement {
    /// Any query expression: a query block, a bag operator, or a bare scalar
    Query(Expr),
    CreateTable(CreateTable),
}

impl Statement {
    /// Parse a statement from its JSON encoding
    pub fn from_json(text: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(text)
    }
}
