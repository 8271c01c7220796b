//! CREATE TABLE

use crate::expr::Expr;
use crate::identifier::{Identifier, Symbol};
use crate::types::DataType;
use serde::{Deserialize, Serialize};

/// Constraint attached to a single column definition
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum ColumnConstraint {
    NotNull,
    Nullable,
    PrimaryKey,
    Unique,
    Check(Expr),
}

/// `name TYPE constraints...`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ColumnDefinition {
    pub name: Symbol,
    pub ty: DataType,
    #[serde(default)]
    pub constraints: Vec<ColumnConstraint>,
}

/// Table-level constraint body
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum TableConstraintKind {
    /// `PRIMARY KEY (a, b)`
    PrimaryKey(Vec<Symbol>),
    /// `UNIQUE (a, b)`
    Unique(Vec<Symbol>),
    /// `CHECK (expr)`
    Check(Expr),
}

/// `[CONSTRAINT name] kind`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TableConstraint {
    pub name: Option<Symbol>,
    pub kind: TableConstraintKind,
}

/// `CREATE TABLE name (columns, constraints)`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CreateTable {
    pub name: Identifier,
    pub columns: Vec<ColumnDefinition>,
    #[serde(default)]
    pub constraints: Vec<TableConstraint>,
}
