//! Diagnostics collected while lowering in collect mode

use crate::error::PlanError;
use serde::{Deserialize, Serialize};

/// Diagnostic severity level
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    /// Informational, no action required
    Info,
    /// Potential issue worth reviewing
    Warning,
    /// The statement is not valid as written
    Error,
}

impl std::fmt::Display for Severity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Severity::Info => write!(f, "info"),
            Severity::Warning => write!(f, "warning"),
            Severity::Error => write!(f, "error"),
        }
    }
}

/// A semantic problem found in a statement
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Diagnostic {
    /// Error code (e.g. "PL101")
    pub code: String,
    /// Severity level
    pub severity: Severity,
    /// Human-readable message
    pub message: String,
    /// The offending construct, when known
    pub construct: Option<String>,
}

impl Diagnostic {
    /// Build a diagnostic from a recoverable planning error
    pub fn from_error(err: &PlanError, severity: Severity) -> Self {
        Self {
            code: err.code().to_string(),
            severity,
            message: err.to_string(),
            construct: err.construct(),
        }
    }
}

impl std::fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}: {}", self.severity, self.message)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_error() {
        let err = PlanError::QualifiedAggregate {
            name: "lib.sum".to_string(),
        };
        let diag = Diagnostic::from_error(&err, Severity::Warning);
        assert_eq!(diag.code, "PL103");
        assert_eq!(diag.construct.as_deref(), Some("lib.sum"));
        assert!(diag.to_string().starts_with("warning: [PL103]"));
    }

    #[test]
    fn test_severity_serializes_lowercase() {
        let json = serde_json::to_string(&Severity::Error).unwrap();
        assert_eq!(json, "\"error\"");
    }
}
