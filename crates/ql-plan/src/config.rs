//! Planner configuration (`qlplan.yml`)

use crate::diagnostic::Severity;
use crate::error::{PlanError, PlanResult, SEMANTIC_CODES};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::Path;

/// How semantic errors are surfaced
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorMode {
    /// Abort the statement at the first error
    #[default]
    FailFast,
    /// Record recoverable errors as diagnostics and keep going
    Collect,
}

/// What to do with an EXCLUDE path whose root is not a FROM variable
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum UnresolvedExclude {
    /// Drop the path
    #[default]
    Drop,
    /// Report PL104
    Error,
}

/// Planner configuration
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct PlanConfig {
    /// Fail-fast or collect
    #[serde(default)]
    pub error_mode: ErrorMode,

    /// Handling of EXCLUDE paths with an unknown root
    #[serde(default)]
    pub unresolved_exclude: UnresolvedExclude,

    /// Severity to report a collected diagnostic with, keyed by code.
    /// Codes not listed are reported as errors.
    #[serde(default)]
    pub severity_overrides: BTreeMap<String, Severity>,
}

impl PlanConfig {
    /// Load configuration from a YAML file
    pub fn load(path: &Path) -> PlanResult<Self> {
        if !path.exists() {
            return Err(PlanError::ConfigNotFound {
                path: path.display().to_string(),
            });
        }

        let content = std::fs::read_to_string(path).map_err(|e| PlanError::Io {
            path: path.display().to_string(),
            source: e,
        })?;
        Self::from_yaml(&content)
    }

    /// Parse and validate configuration from YAML text
    pub fn from_yaml(text: &str) -> PlanResult<Self> {
        // An empty document means "all defaults"
        if text.trim().is_empty() {
            return Ok(Self::default());
        }
        let config: PlanConfig = serde_yaml::from_str(text)?;
        config.validate()?;
        Ok(config)
    }

    /// Configuration that records diagnostics instead of failing
    pub fn collecting() -> Self {
        Self {
            error_mode: ErrorMode::Collect,
            ..Self::default()
        }
    }

    /// Severity for a collected diagnostic with the given code
    pub fn severity_for(&self, code: &str) -> Severity {
        self.severity_overrides
            .get(code)
            .copied()
            .unwrap_or(Severity::Error)
    }

    fn validate(&self) -> PlanResult<()> {
        for code in self.severity_overrides.keys() {
            if !SEMANTIC_CODES.contains(&code.as_str()) {
                return Err(PlanError::ConfigInvalid {
                    message: format!(
                        "Unknown diagnostic code '{}' in severity_overrides. Valid codes: {}",
                        code,
                        SEMANTIC_CODES.join(", ")
                    ),
                });
            }
        }
        Ok(())
    }
}

#[cfg(test)]
#[path = "config_test.rs"]
mod tests;
