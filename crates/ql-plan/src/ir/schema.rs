//! Relation type: ordered output bindings plus property flags

use super::types::PlanType;
use ql_ast::Symbol;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

/// One named output slot of a relation
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Binding {
    /// Name, kept for diagnostics and offset lookup while building
    pub name: String,
    /// Type placeholder
    pub ty: PlanType,
}

impl Binding {
    /// Binding with a dynamic type
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ty: PlanType::Dynamic,
        }
    }
}

/// Relation property flags
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub enum RelProp {
    /// Rows have a defined order
    Ordered,
}

/// Output type of a relational operator
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct RelType {
    /// Ordered list of output bindings
    pub schema: Vec<Binding>,
    /// Property flags
    pub props: BTreeSet<RelProp>,
}

impl RelType {
    /// Unordered relation with the given bindings
    pub fn new(schema: Vec<Binding>) -> Self {
        Self {
            schema,
            props: BTreeSet::new(),
        }
    }

    /// Relation type from binding names
    pub fn of_names<S: Into<String>>(names: impl IntoIterator<Item = S>) -> Self {
        Self::new(names.into_iter().map(Binding::new).collect())
    }

    /// Concatenate two schemas (e.g. for JOIN output)
    pub fn concat(left: &RelType, right: &RelType) -> Self {
        let mut schema = left.schema.clone();
        schema.extend(right.schema.iter().cloned());
        Self::new(schema)
    }

    /// Offset of the first binding `symbol` refers to
    pub fn find(&self, symbol: &Symbol) -> Option<usize> {
        find_binding(&self.schema, symbol)
    }

    /// True if the ORDERED property is set
    pub fn is_ordered(&self) -> bool {
        self.props.contains(&RelProp::Ordered)
    }

    /// Copy with the ORDERED property set
    pub fn ordered(mut self) -> Self {
        self.props.insert(RelProp::Ordered);
        self
    }

    /// Copy with every property cleared
    pub fn without_props(mut self) -> Self {
        self.props.clear();
        self
    }

    /// Binding names, in order
    pub fn names(&self) -> Vec<&str> {
        self.schema.iter().map(|b| b.name.as_str()).collect()
    }
}

/// Offset of the first binding in `frame` that `symbol` refers to
pub(crate) fn find_binding(frame: &[Binding], symbol: &Symbol) -> Option<usize> {
    frame.iter().position(|b| symbol.matches(&b.name))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_find_respects_case_rules() {
        let ty = RelType::of_names(["x", "Y"]);
        assert_eq!(ty.find(&Symbol::regular("X")), Some(0));
        assert_eq!(ty.find(&Symbol::regular("y")), Some(1));
        assert_eq!(ty.find(&Symbol::delimited("y")), None);
        assert_eq!(ty.find(&Symbol::delimited("Y")), Some(1));
    }

    #[test]
    fn test_concat_and_props() {
        let left = RelType::of_names(["a"]).ordered();
        let right = RelType::of_names(["b", "c"]);
        let joined = RelType::concat(&left, &right);
        assert_eq!(joined.names(), vec!["a", "b", "c"]);
        assert!(!joined.is_ordered());
        assert!(left.is_ordered());
        assert!(!left.without_props().is_ordered());
    }
}
