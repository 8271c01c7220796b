//! Scalar lowering: AST expressions to `Rex`

use super::normalize::TUPLE_UNION;
use super::rel::QueryPlan;
use super::scope::Scope;
use super::{Lowerer, VALUE_BINDING};
use crate::error::{PlanError, PlanResult};
use crate::ir::rel::{Rel, RelOp, SetOp, SetQuantifier};
use crate::ir::rex::{
    CaseBranch, Coercion, CollectionKind, LiteralValue, Rex, RexOp, StructField, VarScope,
};
use crate::ir::schema::{Binding, RelType};
use crate::ir::types::TypeTag;
use ql_ast::{
    BagOp, BinaryOp, Call, DataType, Expr, Identifier, Literal, PathStep, ScopeQualifier,
    SessionAttribute, SetOpKind, Symbol, TrimSpec,
};

const ELEMENT_BINDING: &str = "$elem";
const KEY_BINDING: &str = "$key";

impl From<&Literal> for LiteralValue {
    fn from(lit: &Literal) -> Self {
        match lit {
            Literal::Null => LiteralValue::Null,
            Literal::Missing => LiteralValue::Missing,
            Literal::Bool(b) => LiteralValue::Bool(*b),
            Literal::Int(i) => LiteralValue::Int(*i),
            Literal::Decimal(d) => LiteralValue::Decimal(d.clone()),
            Literal::Float(f) => LiteralValue::Float(*f),
            Literal::String(s) => LiteralValue::String(s.clone()),
        }
    }
}

pub(crate) fn set_quantifier(q: Option<ql_ast::SetQuantifier>) -> SetQuantifier {
    match q {
        Some(ql_ast::SetQuantifier::All) => SetQuantifier::All,
        Some(ql_ast::SetQuantifier::Distinct) | None => SetQuantifier::Distinct,
    }
}

pub(crate) fn set_op(kind: SetOpKind, set: SetOp) -> RelOp {
    match kind {
        SetOpKind::Union => RelOp::Union(set),
        SetOpKind::Intersect => RelOp::Intersect(set),
        SetOpKind::Except => RelOp::Except(set),
    }
}

/// Step from `root` to the field named by `symbol`
pub(crate) fn symbol_step(root: Rex, symbol: &Symbol) -> Rex {
    let root = Box::new(root);
    if symbol.is_delimited() {
        Rex::dynamic(RexOp::PathKey {
            root,
            key: Box::new(Rex::string(symbol.text.clone())),
        })
    } else {
        Rex::dynamic(RexOp::PathSymbol {
            root,
            key: symbol.text.clone(),
        })
    }
}

fn var_scope(q: ScopeQualifier) -> VarScope {
    match q {
        ScopeQualifier::Default => VarScope::Default,
        ScopeQualifier::Local => VarScope::Local,
    }
}

fn is_list_literal(expr: &Expr) -> bool {
    matches!(
        expr,
        Expr::Collection {
            kind: ql_ast::CollectionKind::Array | ql_ast::CollectionKind::List,
            ..
        }
    )
}

fn is_row_subquery(expr: &Expr) -> bool {
    expr.as_sfw().is_some_and(|sfw| sfw.select.is_row_shaped())
}

/// Coercions for the two operands of a binary operator.
///
/// A list literal compared against a SELECT-list subquery compares row-wise.
fn operand_coercions(op: BinaryOp, lhs: &Expr, rhs: &Expr) -> (Coercion, Coercion) {
    if !op.is_comparison() {
        return (Coercion::Scalar, Coercion::Scalar);
    }
    if is_list_literal(lhs) && is_row_subquery(rhs) {
        (Coercion::Scalar, Coercion::Row)
    } else if is_row_subquery(lhs) && is_list_literal(rhs) {
        (Coercion::Row, Coercion::Scalar)
    } else {
        (Coercion::Scalar, Coercion::Scalar)
    }
}

fn trim_function(spec: Option<TrimSpec>, has_chars: bool) -> &'static str {
    match (spec.unwrap_or(TrimSpec::Both), has_chars) {
        (TrimSpec::Both, false) => "trim",
        (TrimSpec::Both, true) => "trim_chars",
        (TrimSpec::Leading, false) => "trim_leading",
        (TrimSpec::Leading, true) => "trim_leading_chars",
        (TrimSpec::Trailing, false) => "trim_trailing",
        (TrimSpec::Trailing, true) => "trim_trailing_chars",
    }
}

impl Lowerer<'_> {
    /// Lower an expression in scalar position (subqueries coerce to SCALAR)
    pub(crate) fn lower_rex(&mut self, expr: &Expr, scope: &Scope<'_>) -> PlanResult<Rex> {
        self.lower_expr(expr, scope, Some(Coercion::Scalar))
    }

    /// Lower an expression where a bare collection is expected (no coercion)
    pub(crate) fn lower_raw(&mut self, expr: &Expr, scope: &Scope<'_>) -> PlanResult<Rex> {
        self.lower_expr(expr, scope, None)
    }

    fn lower_all(&mut self, exprs: &[Expr], scope: &Scope<'_>) -> PlanResult<Vec<Rex>> {
        exprs.iter().map(|e| self.lower_rex(e, scope)).collect()
    }

    fn lower_call_of<E: AsRef<Expr>>(
        &mut self,
        name: &str,
        args: &[E],
        scope: &Scope<'_>,
    ) -> PlanResult<Rex> {
        let mut lowered = Vec::with_capacity(args.len());
        for arg in args {
            lowered.push(self.lower_rex(arg.as_ref(), scope)?);
        }
        Ok(Rex::call(name, lowered))
    }

    fn lower_expr(
        &mut self,
        expr: &Expr,
        scope: &Scope<'_>,
        coercion: Option<Coercion>,
    ) -> PlanResult<Rex> {
        let rex = match expr {
            Expr::Lit(lit) => Rex::lit(lit.into()),
            Expr::Var { identifier, scope: q } => lower_var(identifier, *q, scope),
            Expr::Path { root, steps } => self.lower_path(root, steps, scope)?,
            Expr::Call(call) => self.lower_call(call, scope)?,
            Expr::Unary { op, expr } => self.lower_call_of(op.function_name(), &[expr], scope)?,
            Expr::Binary { op, lhs, rhs } => self.lower_binary(*op, lhs, rhs, scope)?,
            Expr::Struct(fields) => {
                let mut lowered = Vec::with_capacity(fields.len());
                for field in fields {
                    lowered.push(StructField {
                        key: self.lower_rex(&field.name, scope)?,
                        value: self.lower_rex(&field.value, scope)?,
                    });
                }
                Rex::dynamic(RexOp::Struct { fields: lowered })
            }
            Expr::Collection { kind, values } => {
                let kind = match kind {
                    ql_ast::CollectionKind::Bag => CollectionKind::Bag,
                    ql_ast::CollectionKind::Array
                    | ql_ast::CollectionKind::List
                    | ql_ast::CollectionKind::Sexp => CollectionKind::List,
                };
                let values = self.lower_all(values, scope)?;
                Rex::dynamic(RexOp::Collection { kind, values })
            }
            Expr::Like {
                value,
                pattern,
                escape,
                not,
            } => {
                let rex = match escape {
                    Some(escape) => {
                        self.lower_call_of("like_escape", &[value, pattern, escape], scope)?
                    }
                    None => self.lower_call_of("like", &[value, pattern], scope)?,
                };
                negate(rex, *not)
            }
            Expr::Between {
                value,
                from,
                to,
                not,
            } => negate(self.lower_call_of("between", &[value, from, to], scope)?, *not),
            Expr::InCollection { lhs, rhs, not } => {
                let lhs = self.lower_rex(lhs, scope)?;
                let rhs = match rhs.as_ref() {
                    Expr::Collection { .. }
                    | Expr::Sfw(_)
                    | Expr::BagOp(_)
                    | Expr::Var { .. }
                    | Expr::Path { .. } => self.lower_raw(rhs, scope)?,
                    single => Rex::dynamic(RexOp::Collection {
                        kind: CollectionKind::List,
                        values: vec![self.lower_rex(single, scope)?],
                    }),
                };
                negate(Rex::call("in_collection", vec![lhs, rhs]), *not)
            }
            Expr::IsType { value, ty, not } => negate(self.lower_is_type(value, ty, scope)?, *not),
            Expr::Case {
                operand,
                branches,
                default,
            } => {
                let operand = operand
                    .as_deref()
                    .map(|o| self.lower_rex(o, scope))
                    .transpose()?;
                let mut lowered = Vec::with_capacity(branches.len());
                for branch in branches {
                    let condition = self.lower_rex(&branch.condition, scope)?;
                    let condition = match &operand {
                        Some(operand) => Rex::call("eq", vec![operand.clone(), condition]),
                        None => condition,
                    };
                    lowered.push(CaseBranch {
                        condition,
                        result: self.lower_rex(&branch.result, scope)?,
                    });
                }
                let default = match default {
                    Some(default) => self.lower_rex(default, scope)?,
                    None => Rex::null(),
                };
                case(lowered, default)
            }
            Expr::Coalesce(args) => {
                let mut branches = Vec::with_capacity(args.len());
                for arg in args {
                    let arg = self.lower_rex(arg, scope)?;
                    branches.push(CaseBranch {
                        condition: Rex::call("is_null", vec![arg.clone()]).not(),
                        result: arg,
                    });
                }
                case(branches, Rex::null())
            }
            Expr::NullIf { value, nullifier } => {
                let value = self.lower_rex(value, scope)?;
                let nullifier = self.lower_rex(nullifier, scope)?;
                case(
                    vec![CaseBranch {
                        condition: Rex::call("eq", vec![value.clone(), nullifier]),
                        result: Rex::null(),
                    }],
                    value,
                )
            }
            Expr::Cast { value, as_type } => Rex::dynamic(RexOp::CastUnresolved {
                target: TypeTag::from(as_type),
                arg: Box::new(self.lower_rex(value, scope)?),
            }),
            Expr::CanCast { value, as_type } => {
                let value = self.lower_rex(value, scope)?;
                Rex::call("can_cast", vec![value, Rex::string(as_type.to_string())])
            }
            Expr::CanLosslessCast { value, as_type } => {
                let value = self.lower_rex(value, scope)?;
                Rex::call(
                    "can_lossless_cast",
                    vec![value, Rex::string(as_type.to_string())],
                )
            }
            Expr::Substring {
                value,
                start,
                length,
            } => {
                let mut args = vec![self.lower_rex(value, scope)?];
                args.push(match start {
                    Some(start) => self.lower_rex(start, scope)?,
                    None => Rex::int(1),
                });
                if let Some(length) = length {
                    args.push(self.lower_rex(length, scope)?);
                }
                Rex::call("substring", args)
            }
            Expr::Position { lhs, rhs } => self.lower_call_of("position", &[lhs, rhs], scope)?,
            Expr::Trim { value, chars, spec } => {
                let name = trim_function(*spec, chars.is_some());
                match chars {
                    Some(chars) => self.lower_call_of(name, &[value, chars], scope)?,
                    None => self.lower_call_of(name, &[value], scope)?,
                }
            }
            Expr::Overlay {
                value,
                overlay,
                start,
                length,
            } => match length {
                Some(length) => {
                    self.lower_call_of("overlay", &[value, overlay, start, length], scope)?
                }
                None => self.lower_call_of("overlay", &[value, overlay, start], scope)?,
            },
            Expr::Extract { field, source } => {
                self.lower_call_of(&format!("extract_{}", field.name()), &[source], scope)?
            }
            Expr::DateAdd { field, lhs, rhs } => {
                self.lower_call_of(&format!("date_add_{}", field.name()), &[lhs, rhs], scope)?
            }
            Expr::DateDiff { field, lhs, rhs } => {
                self.lower_call_of(&format!("date_diff_{}", field.name()), &[lhs, rhs], scope)?
            }
            Expr::SessionAttribute(attribute) => match attribute {
                SessionAttribute::CurrentUser => Rex::call("current_user", vec![]),
                SessionAttribute::CurrentDate => Rex::call("current_date", vec![]),
            },
            Expr::Window(window) => self.report_rex(PlanError::MisplacedWindow {
                function: window.function.name().to_string(),
            })?,
            Expr::BagOp(op) => self.lower_bag_op(op, scope)?,
            Expr::Sfw(sfw) => match self.lower_sfw(sfw, scope)? {
                QueryPlan::Value(rel) => {
                    let constructor = Box::new(Rex::var_local(0, 0));
                    let rel = Box::new(rel);
                    match coercion {
                        Some(coercion) => Rex::dynamic(RexOp::Subquery {
                            constructor,
                            rel,
                            coercion,
                        }),
                        None => Rex::dynamic(RexOp::Select { constructor, rel }),
                    }
                }
                QueryPlan::Pivot { rel, key, value } => Rex::dynamic(RexOp::Pivot {
                    rel: Box::new(rel),
                    key: Box::new(key),
                    value: Box::new(value),
                }),
            },
        };
        Ok(rex)
    }

    fn lower_binary(
        &mut self,
        op: BinaryOp,
        lhs: &Expr,
        rhs: &Expr,
        scope: &Scope<'_>,
    ) -> PlanResult<Rex> {
        let (lhs_coercion, rhs_coercion) = operand_coercions(op, lhs, rhs);
        let args = vec![
            self.lower_expr(lhs, scope, Some(lhs_coercion))?,
            self.lower_expr(rhs, scope, Some(rhs_coercion))?,
        ];
        Ok(match op {
            BinaryOp::Ne => Rex::call(BinaryOp::Eq.function_name(), args).not(),
            _ => Rex::call(op.function_name(), args),
        })
    }

    fn lower_call(&mut self, call: &Call, scope: &Scope<'_>) -> PlanResult<Rex> {
        let unqualified = !call.function.is_qualified();
        if unqualified && call.function.root().text.eq_ignore_ascii_case(TUPLE_UNION) {
            let args = self.lower_all(&call.args, scope)?;
            return Ok(Rex::dynamic(RexOp::TupleUnion { args }));
        }
        if call.set_quantifier == Some(ql_ast::SetQuantifier::Distinct) {
            return Err(PlanError::UnsupportedConstruct {
                construct: format!("DISTINCT argument to non-aggregate call {}", call.function),
            });
        }
        let args = if unqualified && call.function.root().normalized() == "exists" {
            let mut args = Vec::with_capacity(call.args.len());
            for arg in &call.args {
                args.push(self.lower_raw(arg, scope)?);
            }
            args
        } else {
            self.lower_all(&call.args, scope)?
        };
        Ok(Rex::dynamic(RexOp::CallUnresolved {
            identifier: call.function.clone(),
            args,
        }))
    }

    fn lower_is_type(&mut self, value: &Expr, ty: &DataType, scope: &Scope<'_>) -> PlanResult<Rex> {
        if *ty == DataType::Any {
            return Err(PlanError::UnsupportedConstruct {
                construct: "IS ANY".to_string(),
            });
        }
        let mut args: Vec<Rex> = ty
            .parameters()
            .into_iter()
            .map(|p| Rex::int(i64::from(p)))
            .collect();
        args.push(self.lower_rex(value, scope)?);
        Ok(Rex::call(&format!("is_{}", ty.name()), args))
    }

    /// Lower a path, merging leading symbol steps into an unresolved root
    fn lower_path(&mut self, root: &Expr, steps: &[PathStep], scope: &Scope<'_>) -> PlanResult<Rex> {
        match root {
            Expr::Var {
                identifier,
                scope: q,
            } if scope.resolve(identifier.root()).is_none() => {
                let leading: Vec<Symbol> = steps
                    .iter()
                    .map_while(|step| match step {
                        PathStep::Symbol(symbol) => Some(symbol.clone()),
                        _ => None,
                    })
                    .collect();
                let rest = &steps[leading.len()..];
                let merged = Rex::dynamic(RexOp::VarUnresolved {
                    identifier: identifier.clone().extend(leading),
                    scope: var_scope(*q),
                });
                self.lower_steps(merged, rest, scope)
            }
            _ => {
                let root = self.lower_rex(root, scope)?;
                self.lower_steps(root, steps, scope)
            }
        }
    }

    fn lower_steps(&mut self, mut rex: Rex, steps: &[PathStep], scope: &Scope<'_>) -> PlanResult<Rex> {
        for (i, step) in steps.iter().enumerate() {
            rex = match step {
                PathStep::Symbol(symbol) => symbol_step(rex, symbol),
                PathStep::Index(index) => self.lower_index(rex, index, scope)?,
                PathStep::Wildcard | PathStep::Unpivot => {
                    return self.lower_path_iteration(rex, step, &steps[i + 1..], scope);
                }
            };
        }
        Ok(rex)
    }

    fn lower_index(&mut self, root: Rex, index: &Expr, scope: &Scope<'_>) -> PlanResult<Rex> {
        let root = Box::new(root);
        let keyed = match index {
            Expr::Lit(Literal::String(_)) => true,
            Expr::Cast { as_type, .. } => as_type.is_text(),
            _ => false,
        };
        let index = Box::new(self.lower_rex(index, scope)?);
        Ok(Rex::dynamic(if keyed {
            RexOp::PathKey { root, key: index }
        } else {
            RexOp::PathIndex { root, index }
        }))
    }

    /// `a[*].rest` / `a.*.rest`: a select over the elements (or field values)
    /// of `a`, applying `rest` to each one.
    fn lower_path_iteration(
        &mut self,
        source: Rex,
        step: &PathStep,
        rest: &[PathStep],
        scope: &Scope<'_>,
    ) -> PlanResult<Rex> {
        let rel = match step {
            PathStep::Unpivot => Rel::new(
                RelType::of_names([ELEMENT_BINDING, KEY_BINDING]),
                RelOp::Unpivot { rex: source },
            ),
            _ => Rel::new(
                RelType::of_names([ELEMENT_BINDING]),
                RelOp::Scan { rex: source },
            ),
        };
        let frame: Vec<Binding> = rel.ty.schema.clone();
        let element = self.lower_steps(Rex::var_local(0, 0), rest, &scope.nested(&frame))?;
        Ok(Rex::dynamic(RexOp::Select {
            constructor: Box::new(element),
            rel: Box::new(rel),
        }))
    }

    /// `q1 [OUTER] UNION|INTERSECT|EXCEPT [ALL|DISTINCT] q2` used as an expression
    fn lower_bag_op(&mut self, op: &BagOp, scope: &Scope<'_>) -> PlanResult<Rex> {
        let scan = |rex: Rex| {
            Box::new(Rel::new(
                RelType::of_names([VALUE_BINDING]),
                RelOp::Scan { rex },
            ))
        };
        let lhs = scan(self.lower_raw(&op.lhs, scope)?);
        let rhs = scan(self.lower_raw(&op.rhs, scope)?);
        let set = SetOp {
            quantifier: set_quantifier(op.quantifier),
            is_outer: op.outer,
            lhs,
            rhs,
        };
        let rel = Rel::new(RelType::of_names([VALUE_BINDING]), set_op(op.kind, set));
        Ok(Rex::dynamic(RexOp::Select {
            constructor: Box::new(Rex::var_local(0, 0)),
            rel: Box::new(rel),
        }))
    }
}

/// A variable reference: bound to a visible slot, or left for resolution
fn lower_var(identifier: &Identifier, qualifier: ScopeQualifier, scope: &Scope<'_>) -> Rex {
    match scope.resolve(identifier.root()) {
        Some((depth, offset)) => identifier
            .steps()
            .iter()
            .fold(Rex::var_local(depth, offset), symbol_step),
        None => Rex::dynamic(RexOp::VarUnresolved {
            identifier: identifier.clone(),
            scope: var_scope(qualifier),
        }),
    }
}

fn negate(rex: Rex, not: bool) -> Rex {
    if not {
        rex.not()
    } else {
        rex
    }
}

fn case(branches: Vec<CaseBranch>, default: Rex) -> Rex {
    Rex::dynamic(RexOp::Case {
        branches,
        default: Box::new(default),
    })
}

#[cfg(test)]
#[path = "rex_test.rs"]
mod tests;
