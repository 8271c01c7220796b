//! Error types for ql-plan

use thiserror::Error;

/// Planning error type
///
/// Codes are grouped by class: `PL0xx` are internal invariant violations
/// (an earlier pass did not run, or the environment is inconsistent),
/// `PL1xx` are user-facing semantic errors, `PL2xx` are configuration errors.
#[derive(Error, Debug)]
pub enum PlanError {
    /// PL001: A SELECT * / SELECT list reached the relational builder
    #[error("[PL001] Query block was not normalized before planning: {construct}")]
    NotNormalized { construct: String },

    /// PL002: An item that must carry an alias does not
    #[error("[PL002] Missing alias for {construct}")]
    MissingAlias { construct: String },

    /// PL003: Construct this stage cannot lower
    #[error("[PL003] Unsupported construct: {construct}")]
    UnsupportedConstruct { construct: String },

    /// PL004: EXCLUDE path does not start at a variable
    #[error("[PL004] EXCLUDE path must start at a variable, found {construct}")]
    InvalidExcludeRoot { construct: String },

    /// PL005: Name registered both as a scalar function and as an aggregate
    #[error("[PL005] Function '{name}' is registered as both a scalar function and an aggregate")]
    AmbiguousFunction { name: String },

    /// PL101: LAG/LEAD without ORDER BY in its window
    #[error("[PL101] Window function '{function}' requires an ORDER BY in its OVER clause")]
    WindowMissingOrderBy { function: String },

    /// PL102: Window function outside SELECT / ORDER BY
    #[error("[PL102] Window function '{function}' is only allowed in SELECT and ORDER BY")]
    MisplacedWindow { function: String },

    /// PL103: Aggregate called through a qualified name
    #[error("[PL103] Aggregate function '{name}' cannot be referenced by a qualified name")]
    QualifiedAggregate { name: String },

    /// PL104: EXCLUDE root not bound by the FROM clause
    #[error("[PL104] EXCLUDE root '{root}' does not name a FROM variable")]
    UnresolvedExclude { root: String },

    /// PL105: More than one PRIMARY KEY declaration
    #[error("[PL105] Table '{table}' declares more than one primary key")]
    MultiplePrimaryKeys { table: String },

    /// PL106: Column defined twice
    #[error("[PL106] Column '{column}' is defined more than once in table '{table}'")]
    DuplicateColumn { table: String, column: String },

    /// PL107: Constraint lists the same column twice
    #[error("[PL107] Constraint on table '{table}' lists column '{column}' more than once")]
    DuplicateConstraintColumn { table: String, column: String },

    /// PL108: Constraint names a column the table does not define
    #[error("[PL108] Constraint on table '{table}' references undeclared column '{column}'")]
    UndeclaredConstraintColumn { table: String, column: String },

    /// PL201: Configuration file not found
    #[error("[PL201] Configuration file not found: {path}")]
    ConfigNotFound { path: String },

    /// PL202: IO error with path context
    #[error("[PL202] IO error at {path}: {source}")]
    Io {
        path: String,
        source: std::io::Error,
    },

    /// PL203: YAML parse error
    #[error("[PL203] YAML parse error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    /// PL204: Configuration parsed but is not valid
    #[error("[PL204] Invalid configuration: {message}")]
    ConfigInvalid { message: String },
}

/// Codes of the user-facing semantic errors, the only ones a diagnostic can carry
pub(crate) const SEMANTIC_CODES: &[&str] = &[
    "PL101", "PL102", "PL103", "PL104", "PL105", "PL106", "PL107", "PL108",
];

impl PlanError {
    /// Stable error code, e.g. `"PL101"`
    pub fn code(&self) -> &'static str {
        match self {
            PlanError::NotNormalized { .. } => "PL001",
            PlanError::MissingAlias { .. } => "PL002",
            PlanError::UnsupportedConstruct { .. } => "PL003",
            PlanError::InvalidExcludeRoot { .. } => "PL004",
            PlanError::AmbiguousFunction { .. } => "PL005",
            PlanError::WindowMissingOrderBy { .. } => "PL101",
            PlanError::MisplacedWindow { .. } => "PL102",
            PlanError::QualifiedAggregate { .. } => "PL103",
            PlanError::UnresolvedExclude { .. } => "PL104",
            PlanError::MultiplePrimaryKeys { .. } => "PL105",
            PlanError::DuplicateColumn { .. } => "PL106",
            PlanError::DuplicateConstraintColumn { .. } => "PL107",
            PlanError::UndeclaredConstraintColumn { .. } => "PL108",
            PlanError::ConfigNotFound { .. } => "PL201",
            PlanError::Io { .. } => "PL202",
            PlanError::Yaml(_) => "PL203",
            PlanError::ConfigInvalid { .. } => "PL204",
        }
    }

    /// True for invariant violations that indicate a bug in an earlier stage
    pub fn is_internal(&self) -> bool {
        matches!(
            self,
            PlanError::NotNormalized { .. }
                | PlanError::MissingAlias { .. }
                | PlanError::UnsupportedConstruct { .. }
                | PlanError::InvalidExcludeRoot { .. }
                | PlanError::AmbiguousFunction { .. }
        )
    }

    /// True if lowering may continue past this error with a placeholder node
    pub fn is_recoverable(&self) -> bool {
        SEMANTIC_CODES.contains(&self.code())
    }

    /// The offending construct, for diagnostics
    pub fn construct(&self) -> Option<String> {
        match self {
            PlanError::NotNormalized { construct }
            | PlanError::MissingAlias { construct }
            | PlanError::UnsupportedConstruct { construct }
            | PlanError::InvalidExcludeRoot { construct } => Some(construct.clone()),
            PlanError::AmbiguousFunction { name } | PlanError::QualifiedAggregate { name } => {
                Some(name.clone())
            }
            PlanError::WindowMissingOrderBy { function }
            | PlanError::MisplacedWindow { function } => Some(function.clone()),
            PlanError::UnresolvedExclude { root } => Some(root.clone()),
            PlanError::MultiplePrimaryKeys { table } => Some(table.clone()),
            PlanError::DuplicateColumn { table, column }
            | PlanError::DuplicateConstraintColumn { table, column }
            | PlanError::UndeclaredConstraintColumn { table, column } => {
                Some(format!("{table}.{column}"))
            }
            PlanError::ConfigNotFound { .. }
            | PlanError::Io { .. }
            | PlanError::Yaml(_)
            | PlanError::ConfigInvalid { .. } => None,
        }
    }
}

/// Result type alias for PlanError
pub type PlanResult<T> = Result<T, PlanError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_message_carries_code() {
        let err = PlanError::WindowMissingOrderBy {
            function: "lag".to_string(),
        };
        assert!(err.to_string().starts_with("[PL101]"));
        assert_eq!(err.code(), "PL101");
    }

    #[test]
    fn test_error_classes() {
        let internal = PlanError::NotNormalized {
            construct: "SELECT *".to_string(),
        };
        assert!(internal.is_internal());
        assert!(!internal.is_recoverable());

        let semantic = PlanError::MultiplePrimaryKeys {
            table: "t".to_string(),
        };
        assert!(!semantic.is_internal());
        assert!(semantic.is_recoverable());

        let config = PlanError::ConfigNotFound {
            path: "x.yml".to_string(),
        };
        assert!(!config.is_internal());
        assert!(!config.is_recoverable());
    }

    #[test]
    fn test_construct_for_column_errors() {
        let err = PlanError::DuplicateColumn {
            table: "t".to_string(),
            column: "a".to_string(),
        };
        assert_eq!(err.construct().as_deref(), Some("t.a"));
    }
}
