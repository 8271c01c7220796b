//! Generic AST rewriting and GROUP BY key substitution

use crate::error::PlanResult;
use ql_ast::{
    BagOp, Call, CaseBranch, ExcludePath, Expr, FromClause, FromJoin, FromValue, GroupBy,
    GroupKey, PathStep, ProjectItem, Select, Sfw, SfwSetOp, Sort, StructField, Symbol, Window,
    WindowSpec,
};

/// A bottom-up tree rewrite over the AST.
///
/// `rewrite` is offered every node in pre-order; returning `Some` replaces
/// the node without descending into it, `None` rebuilds it from its
/// rewritten children.
pub(crate) trait ExprRewriter {
    fn rewrite(&mut self, expr: &Expr) -> PlanResult<Option<Expr>>;

    /// Whether nested query blocks and bag operators are descended into
    fn enter_queries(&self) -> bool {
        true
    }

    /// Called before the clauses of a nested query block are rewritten
    fn enter_sfw(&mut self, _sfw: &Sfw) {}

    /// Called once the nested query block entered last is done
    fn exit_sfw(&mut self) {}
}

pub(crate) fn rewrite_expr<R: ExprRewriter + ?Sized>(r: &mut R, expr: &Expr) -> PlanResult<Expr> {
    if let Some(replaced) = r.rewrite(expr)? {
        return Ok(replaced);
    }
    let out = match expr {
        Expr::Lit(_) | Expr::Var { .. } | Expr::SessionAttribute(_) => expr.clone(),
        Expr::Path { root, steps } => Expr::Path {
            root: boxed(r, root)?,
            steps: steps
                .iter()
                .map(|step| match step {
                    PathStep::Index(index) => Ok(PathStep::Index(boxed(r, index)?)),
                    other => Ok(other.clone()),
                })
                .collect::<PlanResult<_>>()?,
        },
        Expr::Call(call) => Expr::Call(Call {
            function: call.function.clone(),
            args: list(r, &call.args)?,
            set_quantifier: call.set_quantifier,
        }),
        Expr::Unary { op, expr } => Expr::Unary {
            op: *op,
            expr: boxed(r, expr)?,
        },
        Expr::Binary { op, lhs, rhs } => Expr::Binary {
            op: *op,
            lhs: boxed(r, lhs)?,
            rhs: boxed(r, rhs)?,
        },
        Expr::Struct(fields) => Expr::Struct(
            fields
                .iter()
                .map(|field| {
                    Ok(StructField {
                        name: rewrite_expr(r, &field.name)?,
                        value: rewrite_expr(r, &field.value)?,
                    })
                })
                .collect::<PlanResult<_>>()?,
        ),
        Expr::Collection { kind, values } => Expr::Collection {
            kind: *kind,
            values: list(r, values)?,
        },
        Expr::Like {
            value,
            pattern,
            escape,
            not,
        } => Expr::Like {
            value: boxed(r, value)?,
            pattern: boxed(r, pattern)?,
            escape: optional(r, escape)?,
            not: *not,
        },
        Expr::Between {
            value,
            from,
            to,
            not,
        } => Expr::Between {
            value: boxed(r, value)?,
            from: boxed(r, from)?,
            to: boxed(r, to)?,
            not: *not,
        },
        Expr::InCollection { lhs, rhs, not } => Expr::InCollection {
            lhs: boxed(r, lhs)?,
            rhs: boxed(r, rhs)?,
            not: *not,
        },
        Expr::IsType { value, ty, not } => Expr::IsType {
            value: boxed(r, value)?,
            ty: *ty,
            not: *not,
        },
        Expr::Case {
            operand,
            branches,
            default,
        } => Expr::Case {
            operand: optional(r, operand)?,
            branches: branches
                .iter()
                .map(|b| {
                    Ok(CaseBranch {
                        condition: rewrite_expr(r, &b.condition)?,
                        result: rewrite_expr(r, &b.result)?,
                    })
                })
                .collect::<PlanResult<_>>()?,
            default: optional(r, default)?,
        },
        Expr::Coalesce(args) => Expr::Coalesce(list(r, args)?),
        Expr::NullIf { value, nullifier } => Expr::NullIf {
            value: boxed(r, value)?,
            nullifier: boxed(r, nullifier)?,
        },
        Expr::Cast { value, as_type } => Expr::Cast {
            value: boxed(r, value)?,
            as_type: *as_type,
        },
        Expr::CanCast { value, as_type } => Expr::CanCast {
            value: boxed(r, value)?,
            as_type: *as_type,
        },
        Expr::CanLosslessCast { value, as_type } => Expr::CanLosslessCast {
            value: boxed(r, value)?,
            as_type: *as_type,
        },
        Expr::Substring {
            value,
            start,
            length,
        } => Expr::Substring {
            value: boxed(r, value)?,
            start: optional(r, start)?,
            length: optional(r, length)?,
        },
        Expr::Position { lhs, rhs } => Expr::Position {
            lhs: boxed(r, lhs)?,
            rhs: boxed(r, rhs)?,
        },
        Expr::Trim { value, chars, spec } => Expr::Trim {
            value: boxed(r, value)?,
            chars: optional(r, chars)?,
            spec: *spec,
        },
        Expr::Overlay {
            value,
            overlay,
            start,
            length,
        } => Expr::Overlay {
            value: boxed(r, value)?,
            overlay: boxed(r, overlay)?,
            start: boxed(r, start)?,
            length: optional(r, length)?,
        },
        Expr::Extract { field, source } => Expr::Extract {
            field: *field,
            source: boxed(r, source)?,
        },
        Expr::DateAdd { field, lhs, rhs } => Expr::DateAdd {
            field: *field,
            lhs: boxed(r, lhs)?,
            rhs: boxed(r, rhs)?,
        },
        Expr::DateDiff { field, lhs, rhs } => Expr::DateDiff {
            field: *field,
            lhs: boxed(r, lhs)?,
            rhs: boxed(r, rhs)?,
        },
        Expr::Window(window) => Expr::Window(Box::new(Window {
            function: window.function,
            args: list(r, &window.args)?,
            over: WindowSpec {
                partitions: list(r, &window.over.partitions)?,
                sorts: rewrite_sorts(r, &window.over.sorts)?,
            },
        })),
        Expr::BagOp(op) if r.enter_queries() => Expr::BagOp(BagOp {
            kind: op.kind,
            quantifier: op.quantifier,
            outer: op.outer,
            lhs: boxed(r, &op.lhs)?,
            rhs: boxed(r, &op.rhs)?,
        }),
        Expr::Sfw(sfw) if r.enter_queries() => Expr::Sfw(Box::new(rewrite_sfw(r, sfw)?)),
        Expr::BagOp(_) | Expr::Sfw(_) => expr.clone(),
    };
    Ok(out)
}

fn boxed<R: ExprRewriter + ?Sized>(r: &mut R, expr: &Expr) -> PlanResult<Box<Expr>> {
    Ok(Box::new(rewrite_expr(r, expr)?))
}

fn optional<R: ExprRewriter + ?Sized>(
    r: &mut R,
    expr: &Option<Box<Expr>>,
) -> PlanResult<Option<Box<Expr>>> {
    expr.as_deref().map(|e| boxed(r, e)).transpose()
}

fn list<R: ExprRewriter + ?Sized>(r: &mut R, exprs: &[Expr]) -> PlanResult<Vec<Expr>> {
    exprs.iter().map(|e| rewrite_expr(r, e)).collect()
}

pub(crate) fn rewrite_sorts<R: ExprRewriter + ?Sized>(
    r: &mut R,
    sorts: &[Sort],
) -> PlanResult<Vec<Sort>> {
    sorts
        .iter()
        .map(|s| {
            Ok(Sort {
                expr: rewrite_expr(r, &s.expr)?,
                dir: s.dir,
                nulls: s.nulls,
            })
        })
        .collect()
}

/// Rewrite a SELECT clause; PIVOT is visited value first, then key
pub(crate) fn rewrite_select<R: ExprRewriter + ?Sized>(
    r: &mut R,
    select: &Select,
) -> PlanResult<Select> {
    Ok(match select {
        Select::Star { quantifier } => Select::Star {
            quantifier: *quantifier,
        },
        Select::Project { items, quantifier } => Select::Project {
            items: items
                .iter()
                .map(|item| match item {
                    ProjectItem::All { expr } => Ok(ProjectItem::All {
                        expr: rewrite_expr(r, expr)?,
                    }),
                    ProjectItem::Expression { expr, as_alias } => Ok(ProjectItem::Expression {
                        expr: rewrite_expr(r, expr)?,
                        as_alias: as_alias.clone(),
                    }),
                })
                .collect::<PlanResult<_>>()?,
            quantifier: *quantifier,
        },
        Select::Value {
            constructor,
            quantifier,
        } => Select::Value {
            constructor: rewrite_expr(r, constructor)?,
            quantifier: *quantifier,
        },
        Select::Pivot { key, value } => {
            let value = rewrite_expr(r, value)?;
            let key = rewrite_expr(r, key)?;
            Select::Pivot { key, value }
        }
    })
}

fn rewrite_from<R: ExprRewriter + ?Sized>(r: &mut R, from: &FromClause) -> PlanResult<FromClause> {
    Ok(match from {
        FromClause::Value(v) => FromClause::Value(FromValue {
            expr: rewrite_expr(r, &v.expr)?,
            kind: v.kind,
            as_alias: v.as_alias.clone(),
            at_alias: v.at_alias.clone(),
            by_alias: v.by_alias.clone(),
        }),
        FromClause::Join(j) => FromClause::Join(FromJoin {
            lhs: Box::new(rewrite_from(r, &j.lhs)?),
            rhs: Box::new(rewrite_from(r, &j.rhs)?),
            join_type: j.join_type,
            condition: j.condition.as_ref().map(|c| rewrite_expr(r, c)).transpose()?,
        }),
    })
}

/// Rewrite every expression of a query block, clause by clause
pub(crate) fn rewrite_sfw<R: ExprRewriter + ?Sized>(r: &mut R, sfw: &Sfw) -> PlanResult<Sfw> {
    r.enter_sfw(sfw);
    let out = rewrite_sfw_clauses(r, sfw);
    r.exit_sfw();
    out
}

fn rewrite_sfw_clauses<R: ExprRewriter + ?Sized>(r: &mut R, sfw: &Sfw) -> PlanResult<Sfw> {
    let opt = |r: &mut R, e: &Option<Expr>| e.as_ref().map(|e| rewrite_expr(r, e)).transpose();
    Ok(Sfw {
        select: rewrite_select(r, &sfw.select)?,
        exclude: sfw
            .exclude
            .iter()
            .map(|p| {
                Ok(ExcludePath {
                    root: rewrite_expr(r, &p.root)?,
                    steps: p.steps.clone(),
                })
            })
            .collect::<PlanResult<_>>()?,
        from: rewrite_from(r, &sfw.from)?,
        where_clause: opt(r, &sfw.where_clause)?,
        group_by: match &sfw.group_by {
            Some(g) => Some(GroupBy {
                strategy: g.strategy,
                keys: g
                    .keys
                    .iter()
                    .map(|k| {
                        Ok(GroupKey {
                            expr: rewrite_expr(r, &k.expr)?,
                            as_alias: k.as_alias.clone(),
                        })
                    })
                    .collect::<PlanResult<_>>()?,
                as_alias: g.as_alias.clone(),
            }),
            None => None,
        },
        having: opt(r, &sfw.having)?,
        set_op: match &sfw.set_op {
            Some(op) => Some(SfwSetOp {
                kind: op.kind,
                quantifier: op.quantifier,
                outer: op.outer,
                operand: Box::new(rewrite_sfw(r, &op.operand)?),
            }),
            None => None,
        },
        order_by: rewrite_sorts(r, &sfw.order_by)?,
        limit: opt(r, &sfw.limit)?,
        offset: opt(r, &sfw.offset)?,
    })
}

/// Root symbol of a variable or path expression
fn root_symbol(expr: &Expr) -> Option<&Symbol> {
    match expr {
        Expr::Var { identifier, .. } => Some(identifier.root()),
        Expr::Path { root, .. } => root_symbol(root),
        _ => None,
    }
}

/// Every AS/AT/BY alias a FROM clause binds
fn from_aliases<'a>(from: &'a FromClause, out: &mut Vec<&'a Symbol>) {
    match from {
        FromClause::Value(v) => out.extend(
            [&v.as_alias, &v.at_alias, &v.by_alias]
                .into_iter()
                .flatten(),
        ),
        FromClause::Join(j) => {
            from_aliases(&j.lhs, out);
            from_aliases(&j.rhs, out);
        }
    }
}

/// Replaces every occurrence of a key expression with its paired replacement.
///
/// A pair is suspended inside any nested query block whose FROM clause
/// rebinds the root variable of its key.
pub(crate) struct Substitution {
    pairs: Vec<(Expr, Expr)>,
    shadowed: Vec<usize>,
    entered: Vec<Vec<usize>>,
}

impl Substitution {
    pub(crate) fn new(pairs: Vec<(Expr, Expr)>) -> Self {
        let shadowed = vec![0; pairs.len()];
        Self {
            pairs,
            shadowed,
            entered: Vec::new(),
        }
    }

    pub(crate) fn is_empty(&self) -> bool {
        self.pairs.is_empty()
    }
}

impl ExprRewriter for Substitution {
    fn rewrite(&mut self, expr: &Expr) -> PlanResult<Option<Expr>> {
        Ok(self
            .pairs
            .iter()
            .zip(&self.shadowed)
            .find(|((key, _), shadowed)| **shadowed == 0 && key == expr)
            .map(|((_, replacement), _)| replacement.clone()))
    }

    fn enter_sfw(&mut self, sfw: &Sfw) {
        let mut aliases = Vec::new();
        from_aliases(&sfw.from, &mut aliases);
        let mut hidden = Vec::new();
        for (i, (key, _)) in self.pairs.iter().enumerate() {
            let Some(root) = root_symbol(key) else {
                continue;
            };
            if aliases
                .iter()
                .any(|alias| alias.matches(&root.text) || root.matches(&alias.text))
            {
                self.shadowed[i] += 1;
                hidden.push(i);
            }
        }
        self.entered.push(hidden);
    }

    fn exit_sfw(&mut self) {
        for i in self.entered.pop().unwrap_or_default() {
            self.shadowed[i] -= 1;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ql_ast::BinaryOp;

    fn path(root: &str, field: &str) -> Expr {
        Expr::path(Expr::var(root), vec![PathStep::Symbol(Symbol::regular(field))])
    }

    #[test]
    fn test_substitution_replaces_every_occurrence() {
        let mut sub = Substitution::new(vec![(path("t", "a"), Expr::var("k"))]);
        let expr = Expr::binary(
            BinaryOp::Plus,
            path("t", "a"),
            Expr::call("upper", vec![path("t", "a"), path("t", "b")]),
        );
        let out = rewrite_expr(&mut sub, &expr).unwrap();
        let expected = Expr::binary(
            BinaryOp::Plus,
            Expr::var("k"),
            Expr::call("upper", vec![Expr::var("k"), path("t", "b")]),
        );
        assert_eq!(out, expected);
    }

    #[test]
    fn test_replacement_is_not_revisited() {
        // a -> f(a) must not loop
        let mut sub = Substitution::new(vec![(
            Expr::var("a"),
            Expr::call("f", vec![Expr::var("a")]),
        )]);
        let out = rewrite_expr(&mut sub, &Expr::var("a")).unwrap();
        assert_eq!(out, Expr::call("f", vec![Expr::var("a")]));
    }

    fn block(constructor: Expr, source: &str, alias: &str) -> Expr {
        Expr::Sfw(Box::new(Sfw::new(
            Select::Value {
                constructor,
                quantifier: None,
            },
            FromClause::Value(FromValue::scan(Expr::var(source), Symbol::regular(alias))),
        )))
    }

    #[test]
    fn test_substitution_stops_where_root_is_rebound() {
        let mut sub = Substitution::new(vec![(path("t", "a"), Expr::var("k"))]);
        let shadowing = block(path("t", "a"), "u", "T");
        assert_eq!(rewrite_expr(&mut sub, &shadowing).unwrap(), shadowing);

        let correlated = block(path("t", "a"), "u", "v");
        assert_eq!(
            rewrite_expr(&mut sub, &correlated).unwrap(),
            block(Expr::var("k"), "u", "v")
        );

        // Leaving the shadowing block restores the key
        let both = Expr::binary(BinaryOp::Eq, shadowing.clone(), path("t", "a"));
        assert_eq!(
            rewrite_expr(&mut sub, &both).unwrap(),
            Expr::binary(BinaryOp::Eq, shadowing, Expr::var("k"))
        );
    }

    struct CountVars {
        seen: usize,
    }

    impl ExprRewriter for CountVars {
        fn rewrite(&mut self, expr: &Expr) -> PlanResult<Option<Expr>> {
            if matches!(expr, Expr::Var { .. }) {
                self.seen += 1;
            }
            Ok(None)
        }

        fn enter_queries(&self) -> bool {
            false
        }
    }

    #[test]
    fn test_query_boundary_respected() {
        let sfw = Sfw::new(
            Select::Value {
                constructor: Expr::var("inner"),
                quantifier: None,
            },
            FromClause::Value(FromValue::scan(Expr::var("t"), Symbol::regular("t"))),
        );
        let expr = Expr::binary(BinaryOp::Eq, Expr::var("x"), Expr::Sfw(Box::new(sfw)));
        let mut counter = CountVars { seen: 0 };
        rewrite_expr(&mut counter, &expr).unwrap();
        assert_eq!(counter.seen, 1);
    }
}
