//! Name-resolution environment consulted during lowering
//!
//! Lowering never binds names itself; it only asks whether a function name
//! is a scalar function or an aggregate so it knows which calls to extract.

use std::collections::{BTreeMap, BTreeSet};

/// An aggregate overload known to the environment
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AggregateSignature {
    /// Normalized function name
    pub name: String,
    /// Number of arguments
    pub arity: usize,
}

/// Read-only function lookups needed by lowering.
///
/// Names are normalized by the caller: lower-cased for regular identifiers,
/// verbatim for delimited ones.
pub trait Environment: Send + Sync {
    /// Whether `name` resolves as a scalar function
    fn is_scalar_function(&self, name: &str) -> bool;

    /// Aggregate overloads of `name` taking `arity` arguments
    fn aggregate_candidates(&self, name: &str, arity: usize) -> Vec<AggregateSignature>;
}

const BUILTIN_SCALARS: &[&str] = &[
    "abs",
    "bit_length",
    "cardinality",
    "ceil",
    "ceiling",
    "char_length",
    "character_length",
    "concat",
    "exists",
    "exp",
    "floor",
    "ln",
    "log10",
    "lower",
    "mod",
    "octet_length",
    "overlay",
    "position",
    "power",
    "size",
    "sqrt",
    "substring",
    "text_replace",
    "trim",
    "upper",
    "utcnow",
];

const BUILTIN_AGGREGATES: &[(&str, &[usize])] = &[
    ("count", &[1]),
    ("sum", &[1]),
    ("avg", &[1]),
    ("min", &[1]),
    ("max", &[1]),
    ("any", &[1]),
    ("some", &[1]),
    ("every", &[1]),
    ("bool_and", &[1]),
    ("bool_or", &[1]),
    ("array_agg", &[1]),
    ("group_concat", &[1, 2]),
    ("listagg", &[1, 2]),
    ("string_agg", &[2]),
];

/// Environment with the common SQL scalar functions and aggregates
#[derive(Debug, Clone)]
pub struct BuiltinEnvironment {
    scalars: BTreeSet<String>,
    aggregates: BTreeMap<String, BTreeSet<usize>>,
}

impl BuiltinEnvironment {
    /// Create the builtin function set
    pub fn new() -> Self {
        let scalars = BUILTIN_SCALARS.iter().map(|s| s.to_string()).collect();
        let aggregates = BUILTIN_AGGREGATES
            .iter()
            .map(|(name, arities)| (name.to_string(), arities.iter().copied().collect()))
            .collect();
        Self {
            scalars,
            aggregates,
        }
    }

    /// Register an additional scalar function
    pub fn with_scalar(mut self, name: impl Into<String>) -> Self {
        self.scalars.insert(name.into());
        self
    }

    /// Register an additional aggregate overload
    pub fn with_aggregate(mut self, name: impl Into<String>, arity: usize) -> Self {
        self.aggregates.entry(name.into()).or_default().insert(arity);
        self
    }
}

impl Default for BuiltinEnvironment {
    fn default() -> Self {
        Self::new()
    }
}

impl Environment for BuiltinEnvironment {
    fn is_scalar_function(&self, name: &str) -> bool {
        self.scalars.contains(name)
    }

    fn aggregate_candidates(&self, name: &str, arity: usize) -> Vec<AggregateSignature> {
        match self.aggregates.get(name) {
            Some(arities) if arities.contains(&arity) => vec![AggregateSignature {
                name: name.to_string(),
                arity,
            }],
            _ => Vec::new(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_builtin_aggregates_by_arity() {
        let env = BuiltinEnvironment::new();
        assert_eq!(env.aggregate_candidates("sum", 1).len(), 1);
        assert!(env.aggregate_candidates("sum", 2).is_empty());
        assert_eq!(env.aggregate_candidates("listagg", 2).len(), 1);
        assert!(env.aggregate_candidates("upper", 1).is_empty());
    }

    #[test]
    fn test_scalars_and_aggregates_disjoint() {
        let env = BuiltinEnvironment::new();
        for (name, _) in BUILTIN_AGGREGATES {
            assert!(!env.is_scalar_function(name), "{name} is both");
        }
    }

    #[test]
    fn test_extension() {
        let env = BuiltinEnvironment::new()
            .with_scalar("my_fn")
            .with_aggregate("median", 1);
        assert!(env.is_scalar_function("my_fn"));
        assert_eq!(
            env.aggregate_candidates("median", 1),
            vec![AggregateSignature {
                name: "median".to_string(),
                arity: 1
            }]
        );
    }
}
