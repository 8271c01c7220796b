//! AST-to-IR lowering: converts a `ql_ast::Statement` into `Rel`/`Rex` IR

pub(crate) mod ddl;
pub(crate) mod exclude;
pub(crate) mod extract;
pub(crate) mod normalize;
pub(crate) mod rel;
pub(crate) mod rewrite;
pub(crate) mod rex;
pub(crate) mod scope;

use crate::config::{ErrorMode, PlanConfig};
use crate::diagnostic::Diagnostic;
use crate::env::Environment;
use crate::error::{PlanError, PlanResult};
use crate::ir::ddl::TableShape;
use crate::ir::rex::Rex;
use ql_ast::{Expr, Statement};
use scope::Scope;
use serde::{Deserialize, Serialize};

/// Name of the single binding produced by a query's final projection
pub(crate) const VALUE_BINDING: &str = "$value";

/// The IR produced for one statement
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Plan {
    /// A query, as one expression wrapping its relational plan
    Query(Rex),
    /// A CREATE TABLE, as the table's checked shape
    CreateTable(TableShape),
}

/// A lowered statement with the diagnostics collected along the way
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LoweredStatement {
    pub plan: Plan,
    pub diagnostics: Vec<Diagnostic>,
}

/// Per-statement lowering context.
///
/// Holds the read-only environment and configuration plus the diagnostics
/// sink; created fresh for every statement.
pub(crate) struct Lowerer<'a> {
    pub(crate) env: &'a dyn Environment,
    pub(crate) config: &'a PlanConfig,
    diagnostics: Vec<Diagnostic>,
}

impl<'a> Lowerer<'a> {
    pub(crate) fn new(env: &'a dyn Environment, config: &'a PlanConfig) -> Self {
        Self {
            env,
            config,
            diagnostics: Vec::new(),
        }
    }

    /// Surface an error.
    ///
    /// Returns it in fail-fast mode, or when it cannot be recovered from;
    /// otherwise records a diagnostic and lets the caller substitute a
    /// placeholder.
    pub(crate) fn report(&mut self, err: PlanError) -> PlanResult<()> {
        if self.config.error_mode == ErrorMode::FailFast || !err.is_recoverable() {
            return Err(err);
        }
        let severity = self.config.severity_for(err.code());
        log::warn!("{err} (continuing with a placeholder)");
        self.diagnostics.push(Diagnostic::from_error(&err, severity));
        Ok(())
    }

    /// Surface an error and return the placeholder expression for it
    pub(crate) fn report_rex(&mut self, err: PlanError) -> PlanResult<Rex> {
        let message = err.to_string();
        self.report(err)?;
        Ok(Rex::err(message))
    }

    fn finish(self, plan: Plan) -> LoweredStatement {
        LoweredStatement {
            plan,
            diagnostics: self.diagnostics,
        }
    }
}

/// Lower one statement.
///
/// Queries lower to a single `Rex` (a `Select` or `Pivot` wrapping the
/// relational plan); CREATE TABLE lowers to a `TableShape`.
pub fn lower_statement(
    stmt: &Statement,
    env: &dyn Environment,
    config: &PlanConfig,
) -> PlanResult<LoweredStatement> {
    let mut lowerer = Lowerer::new(env, config);
    let plan = match stmt {
        Statement::Query(expr) => Plan::Query(lowerer.lower_raw(expr, &Scope::empty())?),
        Statement::CreateTable(table) => Plan::CreateTable(lowerer.lower_create_table(table)?),
    };
    let lowered = lowerer.finish(plan);
    log::debug!(
        "Lowered statement with {} diagnostic(s)",
        lowered.diagnostics.len()
    );
    Ok(lowered)
}

/// Lower a query expression with the default (fail-fast) configuration
pub fn lower_query(expr: &Expr, env: &dyn Environment) -> PlanResult<Rex> {
    let config = PlanConfig::default();
    let mut lowerer = Lowerer::new(env, &config);
    lowerer.lower_raw(expr, &Scope::empty())
}

#[cfg(test)]
#[path = "lowering_test.rs"]
mod tests;
