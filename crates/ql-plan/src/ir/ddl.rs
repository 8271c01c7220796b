//! Table shapes produced from CREATE TABLE

use super::rex::Rex;
use super::types::TypeTag;
use serde::{Deserialize, Serialize};

/// A column of a created table
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ColumnShape {
    pub name: String,
    pub ty: TypeTag,
    pub nullable: bool,
}

/// Structure of a created table after constraint checks
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TableShape {
    pub name: String,
    pub columns: Vec<ColumnShape>,
    /// Primary-key column names; empty if none was declared
    pub primary_key: Vec<String>,
    /// One entry per UNIQUE constraint
    pub unique: Vec<Vec<String>>,
    /// CHECK predicates, with columns as slots of the row being checked
    pub checks: Vec<Rex>,
}

impl TableShape {
    /// Look up a column by name, ignoring case
    pub fn column(&self, name: &str) -> Option<&ColumnShape> {
        self.columns
            .iter()
            .find(|c| c.name.eq_ignore_ascii_case(name))
    }
}
