//! Aggregate and window extraction
//!
//! Each detected call is replaced by a reference to a synthetic binding
//! (`$agg_i`, `$window_func_i`) that the Aggregate / Window operator
//! computes once per group or row. Extraction never enters a nested
//! query block.

use super::rewrite::{rewrite_expr, rewrite_select, rewrite_sorts, ExprRewriter};
use super::Lowerer;
use crate::error::{PlanError, PlanResult};
use ql_ast::{Call, Expr, Sfw, Window};

pub(crate) fn aggregate_binding(index: usize) -> String {
    format!("$agg_{index}")
}

pub(crate) fn window_binding(index: usize) -> String {
    format!("$window_func_{index}")
}

impl Lowerer<'_> {
    /// Whether `call` is an aggregate call, according to the environment.
    ///
    /// `COUNT()` is probed at arity one, since it stands for `COUNT(*)`.
    pub(crate) fn is_aggregate(&mut self, call: &Call) -> PlanResult<bool> {
        let arity = call.args.len().max(1);
        let name = call.function.last().normalized();
        if self.env.aggregate_candidates(&name, arity).is_empty() {
            return Ok(false);
        }
        if self.env.is_scalar_function(&name) {
            return Err(PlanError::AmbiguousFunction { name });
        }
        if call.function.is_qualified() {
            self.report(PlanError::QualifiedAggregate {
                name: call.function.to_string(),
            })?;
            return Ok(false);
        }
        Ok(true)
    }

    /// Pull aggregate calls out of SELECT, HAVING and ORDER BY, in that order
    pub(crate) fn extract_aggregates(&mut self, sfw: &Sfw) -> PlanResult<(Sfw, Vec<Call>)> {
        let mut extractor = AggregateExtractor {
            lowerer: self,
            calls: Vec::new(),
        };
        let mut out = sfw.clone();
        out.select = rewrite_select(&mut extractor, &sfw.select)?;
        out.having = sfw
            .having
            .as_ref()
            .map(|h| rewrite_expr(&mut extractor, h))
            .transpose()?;
        out.order_by = rewrite_sorts(&mut extractor, &sfw.order_by)?;
        Ok((out, extractor.calls))
    }

    /// Pull window functions out of SELECT and ORDER BY
    pub(crate) fn extract_windows(&mut self, sfw: &Sfw) -> PlanResult<(Sfw, Vec<Window>)> {
        let mut extractor = WindowExtractor {
            windows: Vec::new(),
        };
        let mut out = sfw.clone();
        out.select = rewrite_select(&mut extractor, &sfw.select)?;
        out.order_by = rewrite_sorts(&mut extractor, &sfw.order_by)?;
        Ok((out, extractor.windows))
    }
}

struct AggregateExtractor<'l, 'a> {
    lowerer: &'l mut Lowerer<'a>,
    calls: Vec<Call>,
}

impl ExprRewriter for AggregateExtractor<'_, '_> {
    fn rewrite(&mut self, expr: &Expr) -> PlanResult<Option<Expr>> {
        let Expr::Call(call) = expr else {
            return Ok(None);
        };
        if !self.lowerer.is_aggregate(call)? {
            return Ok(None);
        }
        let name = aggregate_binding(self.calls.len());
        log::debug!("Extracted aggregate {} as {}", expr, name);
        self.calls.push(call.clone());
        Ok(Some(Expr::delimited_var(name)))
    }

    fn enter_queries(&self) -> bool {
        false
    }
}

struct WindowExtractor {
    windows: Vec<Window>,
}

impl ExprRewriter for WindowExtractor {
    fn rewrite(&mut self, expr: &Expr) -> PlanResult<Option<Expr>> {
        let Expr::Window(window) = expr else {
            return Ok(None);
        };
        let name = window_binding(self.windows.len());
        log::debug!("Extracted window function {} as {}", window.function.name(), name);
        self.windows.push(window.as_ref().clone());
        Ok(Some(Expr::delimited_var(name)))
    }

    fn enter_queries(&self) -> bool {
        false
    }
}
