//! Relational builder: threads a `Rel` pipeline through the clauses of one
//! query block.
//!
//! Stage order is fixed: FROM, WHERE, aggregation, HAVING, windows, set
//! operator, ORDER BY, OFFSET, LIMIT, EXCLUDE, then the final projection.
//! Every clause expression is lowered against the schema of the stage it is
//! attached to, nested inside the enclosing query's scope.

use super::extract::{aggregate_binding, window_binding};
use super::normalize::normalize_sfw;
use super::rewrite::{rewrite_expr, rewrite_select, rewrite_sorts, Substitution};
use super::rex::{set_op, set_quantifier};
use super::scope::Scope;
use super::{Lowerer, VALUE_BINDING};
use crate::error::{PlanError, PlanResult};
use crate::ir::rel::{
    AggregateCall, AggregateStrategy, JoinKind, Rel, RelOp, SetOp, SetQuantifier, SortOrder,
    SortSpec, WindowCall,
};
use crate::ir::rex::{Rex, RexOp, StructField};
use crate::ir::schema::{Binding, RelType};
use ql_ast::{
    Call, Expr, FromClause, FromKind, FromValue, GroupStrategy, Identifier, JoinType,
    NullOrder, OrderDirection, ScopeQualifier, Select, Sfw, SfwSetOp, Sort,
};

/// Result of building one query block
#[derive(Debug)]
pub(crate) enum QueryPlan {
    /// Pipeline whose single output binding is the query's value
    Value(Rel),
    /// PIVOT: the pipeline plus the key and value lowered against it
    Pivot { rel: Rel, key: Rex, value: Rex },
}

fn join_kind(join_type: JoinType) -> JoinKind {
    match join_type {
        JoinType::Comma | JoinType::Inner | JoinType::Cross => JoinKind::Inner,
        JoinType::Left | JoinType::LeftOuter => JoinKind::Left,
        JoinType::Right | JoinType::RightOuter => JoinKind::Right,
        JoinType::Full | JoinType::FullOuter => JoinKind::Full,
    }
}

/// DESC defaults to NULLS FIRST, ASC to NULLS LAST
fn sort_order(sort: &Sort) -> SortOrder {
    let desc = sort.dir == Some(OrderDirection::Desc);
    let nulls = sort
        .nulls
        .unwrap_or(if desc { NullOrder::First } else { NullOrder::Last });
    match (desc, nulls) {
        (false, NullOrder::First) => SortOrder::AscNullsFirst,
        (false, NullOrder::Last) => SortOrder::AscNullsLast,
        (true, NullOrder::First) => SortOrder::DescNullsFirst,
        (true, NullOrder::Last) => SortOrder::DescNullsLast,
    }
}

fn with_input(input: Rel, ty: RelType, op: impl FnOnce(Box<Rel>) -> RelOp) -> Rel {
    Rel::new(ty, op(Box::new(input)))
}

impl Lowerer<'_> {
    /// Build the pipeline for one query block seen from `outer`
    pub(crate) fn lower_sfw(&mut self, sfw: &Sfw, outer: &Scope<'_>) -> PlanResult<QueryPlan> {
        let sfw = normalize_sfw(sfw)?;
        let mut rel = self.lower_from(&sfw.from, outer, &[])?;

        if let Some(condition) = &sfw.where_clause {
            let predicate = self.lower_rex(condition, &outer.nested(&rel.ty.schema))?;
            let ty = rel.ty.clone();
            rel = with_input(rel, ty, |input| RelOp::Filter { input, predicate });
        }

        let (sfw, mut rel) = self.lower_aggregation(sfw, rel, outer)?;

        if let Some(condition) = &sfw.having {
            let predicate = self.lower_rex(condition, &outer.nested(&rel.ty.schema))?;
            let ty = rel.ty.clone();
            rel = with_input(rel, ty, |input| RelOp::Filter { input, predicate });
        }

        let (sfw, mut rel) = self.lower_windows(sfw, rel, outer)?;

        if let Some(op) = &sfw.set_op {
            rel = self.lower_set_op(op, rel, outer)?;
        }

        if !sfw.order_by.is_empty() {
            let specs = self.lower_sorts(&sfw.order_by, &outer.nested(&rel.ty.schema))?;
            let ty = rel.ty.clone().ordered();
            rel = with_input(rel, ty, |input| RelOp::Sort { input, specs });
        }

        if let Some(offset) = &sfw.offset {
            let offset = self.lower_rex(offset, &outer.nested(&rel.ty.schema))?;
            let ty = rel.ty.clone();
            rel = with_input(rel, ty, |input| RelOp::Offset { input, offset });
        }

        if let Some(limit) = &sfw.limit {
            let limit = self.lower_rex(limit, &outer.nested(&rel.ty.schema))?;
            let ty = rel.ty.clone();
            rel = with_input(rel, ty, |input| RelOp::Limit { input, limit });
        }

        let rel = self.lower_exclude(&sfw.exclude, rel, outer)?;
        self.lower_projection(&sfw.select, rel, outer)
    }

    /// FROM items, left to right; each source sees the items to its left
    fn lower_from(
        &mut self,
        from: &FromClause,
        outer: &Scope<'_>,
        left: &[Binding],
    ) -> PlanResult<Rel> {
        match from {
            FromClause::Value(value) => self.lower_from_value(value, outer, left),
            FromClause::Join(join) => {
                let lhs = self.lower_from(&join.lhs, outer, left)?;
                let visible: Vec<Binding> = left
                    .iter()
                    .chain(lhs.ty.schema.iter())
                    .cloned()
                    .collect();
                let rhs = self.lower_from(&join.rhs, outer, &visible)?;
                let ty = RelType::concat(&lhs.ty, &rhs.ty);
                // A join on the right of a lateral FROM still sees the items to its left
                let lateral = outer.nested(left);
                let enclosing = if left.is_empty() { outer } else { &lateral };
                let condition = match &join.condition {
                    Some(condition) => self.lower_rex(condition, &enclosing.nested(&ty.schema))?,
                    None => Rex::bool(true),
                };
                Ok(Rel::new(
                    ty,
                    RelOp::Join {
                        lhs: Box::new(lhs),
                        rhs: Box::new(rhs),
                        condition,
                        kind: join_kind(join.join_type),
                    },
                ))
            }
        }
    }

    fn lower_from_value(
        &mut self,
        value: &FromValue,
        outer: &Scope<'_>,
        left: &[Binding],
    ) -> PlanResult<Rel> {
        let as_alias = value.as_alias.as_ref().ok_or_else(|| PlanError::MissingAlias {
            construct: format!("FROM item {}", value.expr),
        })?;
        if let Some(by_alias) = &value.by_alias {
            return Err(PlanError::UnsupportedConstruct {
                construct: format!("BY {by_alias} on FROM item {}", value.expr),
            });
        }
        let rex = if left.is_empty() {
            self.lower_raw(&value.expr, outer)?
        } else {
            self.lower_raw(&value.expr, &outer.nested(left))?
        };
        let mut schema = vec![Binding::new(as_alias.text.clone())];
        let op = match (value.kind, &value.at_alias) {
            (FromKind::Scan, None) => RelOp::Scan { rex },
            (FromKind::Scan, Some(at)) => {
                schema.push(Binding::new(at.text.clone()));
                RelOp::ScanIndexed { rex }
            }
            (FromKind::Unpivot, Some(at)) => {
                schema.push(Binding::new(at.text.clone()));
                RelOp::Unpivot { rex }
            }
            (FromKind::Unpivot, None) => {
                return Err(PlanError::MissingAlias {
                    construct: format!("AT alias of UNPIVOT {}", value.expr),
                })
            }
        };
        Ok(Rel::new(RelType::new(schema), op))
    }

    fn lower_aggregate_call(&mut self, call: &Call, scope: &Scope<'_>) -> PlanResult<AggregateCall> {
        let args = if call.args.is_empty() {
            vec![Rex::int(1)]
        } else {
            let mut args = Vec::with_capacity(call.args.len());
            for arg in &call.args {
                args.push(self.lower_rex(arg, scope)?);
            }
            args
        };
        Ok(AggregateCall {
            function: call.function.clone(),
            set_quantifier: match call.set_quantifier {
                Some(ql_ast::SetQuantifier::Distinct) => SetQuantifier::Distinct,
                Some(ql_ast::SetQuantifier::All) | None => SetQuantifier::All,
            },
            args,
        })
    }

    /// Aggregate stage; skipped when there are neither aggregates nor groups.
    ///
    /// Output schema is the aggregate bindings, then the GROUP AS alias, then
    /// the group key aliases. Returns the query block with aggregates and
    /// group keys replaced by references to those bindings.
    fn lower_aggregation(
        &mut self,
        sfw: Sfw,
        input: Rel,
        outer: &Scope<'_>,
    ) -> PlanResult<(Sfw, Rel)> {
        let (mut sfw, extracted) = self.extract_aggregates(&sfw)?;
        if extracted.is_empty() && sfw.group_by.is_none() {
            return Ok((sfw, input));
        }
        let frame = input.ty.schema.clone();
        let scope = outer.nested(&frame);

        let mut schema = Vec::new();
        let mut calls = Vec::with_capacity(extracted.len());
        for (i, call) in extracted.iter().enumerate() {
            schema.push(Binding::new(aggregate_binding(i)));
            calls.push(self.lower_aggregate_call(call, &scope)?);
        }

        let mut strategy = AggregateStrategy::Full;
        let mut groups = Vec::new();
        let mut pairs = Vec::new();
        if let Some(group_by) = &sfw.group_by {
            if group_by.strategy == GroupStrategy::Partial {
                strategy = AggregateStrategy::Partial;
            }
            if let Some(group_as) = &group_by.as_alias {
                schema.push(Binding::new(group_as.text.clone()));
                let fields = frame
                    .iter()
                    .enumerate()
                    .map(|(offset, binding)| StructField {
                        key: Rex::string(binding.name.clone()),
                        value: Rex::var_local(0, offset),
                    })
                    .collect();
                calls.push(AggregateCall {
                    function: Identifier::regular("group_as"),
                    set_quantifier: SetQuantifier::All,
                    args: vec![Rex::dynamic(RexOp::Struct { fields })],
                });
            }
            for key in &group_by.keys {
                let alias = key.as_alias.as_ref().ok_or_else(|| PlanError::MissingAlias {
                    construct: format!("GROUP BY key {}", key.expr),
                })?;
                schema.push(Binding::new(alias.text.clone()));
                groups.push(self.lower_rex(&key.expr, &scope)?);
                pairs.push((
                    key.expr.clone(),
                    Expr::Var {
                        identifier: alias.clone().into(),
                        scope: ScopeQualifier::Default,
                    },
                ));
            }
        }

        let mut substitution = Substitution::new(pairs);
        if !substitution.is_empty() {
            sfw.select = rewrite_select(&mut substitution, &sfw.select)?;
            sfw.having = sfw
                .having
                .as_ref()
                .map(|h| rewrite_expr(&mut substitution, h))
                .transpose()?;
            sfw.order_by = rewrite_sorts(&mut substitution, &sfw.order_by)?;
        }

        let rel = with_input(input, RelType::new(schema), |input| RelOp::Aggregate {
            input,
            strategy,
            calls,
            groups,
        });
        Ok((sfw, rel))
    }

    /// One Window operator per extracted window function, in order
    fn lower_windows(&mut self, sfw: Sfw, mut rel: Rel, outer: &Scope<'_>) -> PlanResult<(Sfw, Rel)> {
        let (sfw, windows) = self.extract_windows(&sfw)?;
        for (i, window) in windows.iter().enumerate() {
            let function = window.function.name();
            let frame = rel.ty.schema.clone();
            let scope = outer.nested(&frame);

            let mut partitions = Vec::with_capacity(window.over.partitions.len());
            for partition in &window.over.partitions {
                partitions.push(self.lower_rex(partition, &scope)?);
            }
            let sorts = self.lower_sorts(&window.over.sorts, &scope)?;
            let args = if window.over.sorts.is_empty() {
                vec![self.report_rex(PlanError::WindowMissingOrderBy {
                    function: function.to_string(),
                })?]
            } else {
                let mut args = Vec::with_capacity(window.args.len());
                for arg in &window.args {
                    args.push(self.lower_rex(arg, &scope)?);
                }
                args
            };

            let mut schema = frame;
            schema.push(Binding::new(window_binding(i)));
            rel = with_input(rel, RelType::new(schema), |input| RelOp::Window {
                input,
                partitions,
                sorts,
                functions: vec![WindowCall {
                    function: function.to_string(),
                    args,
                }],
            });
        }
        Ok((sfw, rel))
    }

    /// UNION / INTERSECT / EXCEPT with the pipeline so far as the left operand
    fn lower_set_op(&mut self, op: &SfwSetOp, lhs: Rel, outer: &Scope<'_>) -> PlanResult<Rel> {
        let rhs = match self.lower_sfw(&op.operand, outer)? {
            QueryPlan::Value(rel) => rel,
            QueryPlan::Pivot { .. } => {
                return Err(PlanError::UnsupportedConstruct {
                    construct: "PIVOT as a set operator operand".to_string(),
                })
            }
        };
        let ty = lhs.ty.clone().without_props();
        let set = SetOp {
            quantifier: set_quantifier(op.quantifier),
            is_outer: op.outer,
            lhs: Box::new(lhs),
            rhs: Box::new(rhs),
        };
        Ok(Rel::new(ty, set_op(op.kind, set)))
    }

    fn lower_sorts(&mut self, sorts: &[Sort], scope: &Scope<'_>) -> PlanResult<Vec<SortSpec>> {
        let mut specs = Vec::with_capacity(sorts.len());
        for sort in sorts {
            specs.push(SortSpec {
                rex: self.lower_rex(&sort.expr, scope)?,
                order: sort_order(sort),
            });
        }
        Ok(specs)
    }

    /// SELECT VALUE becomes a one-column Project (plus Distinct); PIVOT keeps
    /// the pipeline and lowers its key and value against it.
    fn lower_projection(
        &mut self,
        select: &Select,
        rel: Rel,
        outer: &Scope<'_>,
    ) -> PlanResult<QueryPlan> {
        match select {
            Select::Value {
                constructor,
                quantifier,
            } => {
                let projection = self.lower_rex(constructor, &outer.nested(&rel.ty.schema))?;
                let mut ty = RelType::of_names([VALUE_BINDING]);
                ty.props = rel.ty.props.clone();
                let mut out = with_input(rel, ty, |input| RelOp::Project {
                    input,
                    projections: vec![projection],
                });
                if *quantifier == Some(ql_ast::SetQuantifier::Distinct) {
                    let ty = out.ty.clone();
                    out = with_input(out, ty, |input| RelOp::Distinct { input });
                }
                Ok(QueryPlan::Value(out))
            }
            Select::Pivot { key, value } => {
                let scope = outer.nested(&rel.ty.schema);
                let value = self.lower_rex(value, &scope)?;
                let key = self.lower_rex(key, &scope)?;
                Ok(QueryPlan::Pivot { rel, key, value })
            }
            Select::Star { .. } | Select::Project { .. } => Err(PlanError::NotNormalized {
                construct: select.to_string(),
            }),
        }
    }
}

#[cfg(test)]
#[path = "rel_test.rs"]
mod tests;
