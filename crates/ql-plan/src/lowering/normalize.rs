//! SELECT normalization
//!
//! Every `SELECT *` and `SELECT <list>` is rewritten into a single
//! `SELECT VALUE <constructor>` before the relational builder sees it.

use crate::error::{PlanError, PlanResult};
use ql_ast::{
    CaseBranch, DataType, Expr, FromClause, GroupBy, Literal, PathStep, ProjectItem,
    ScopeQualifier, Select, Sfw, Symbol,
};

/// Reserved function name the normalizer uses for struct merging
pub(crate) const TUPLE_UNION: &str = "TUPLEUNION";

/// Assign default aliases, then rewrite the SELECT clause into VALUE form
pub(crate) fn normalize_sfw(sfw: &Sfw) -> PlanResult<Sfw> {
    let aliased = assign_default_aliases(sfw);
    normalize_select(&aliased)
}

/// Alias an un-aliased SELECT item or GROUP BY key receives.
///
/// Variables and paths take their tail name; a path ending in a string key
/// takes that key as a delimited name; anything else is positional.
pub(crate) fn default_alias(expr: &Expr, index: usize) -> Symbol {
    match expr {
        Expr::Var { identifier, .. } => identifier.last().clone(),
        Expr::Path { root, steps } => match steps.last() {
            Some(PathStep::Symbol(symbol)) => symbol.clone(),
            Some(PathStep::Index(key)) => match key.as_ref() {
                Expr::Lit(Literal::String(text)) => Symbol::delimited(text.clone()),
                _ => positional(index),
            },
            Some(_) => positional(index),
            None => default_alias(root, index),
        },
        _ => positional(index),
    }
}

fn positional(index: usize) -> Symbol {
    Symbol::regular(format!("_{}", index + 1))
}

fn assign_default_aliases(sfw: &Sfw) -> Sfw {
    let mut out = sfw.clone();
    if let Select::Project { items, .. } = &mut out.select {
        for (i, item) in items.iter_mut().enumerate() {
            if let ProjectItem::Expression { expr, as_alias } = item {
                if as_alias.is_none() {
                    *as_alias = Some(default_alias(expr, i));
                }
            }
        }
    }
    if let Some(group) = &mut out.group_by {
        for (i, key) in group.keys.iter_mut().enumerate() {
            if key.as_alias.is_none() {
                key.as_alias = Some(default_alias(&key.expr, i));
            }
        }
    }
    out
}

/// Rewrite the SELECT clause into `SELECT VALUE`; VALUE and PIVOT pass through
pub(crate) fn normalize_select(sfw: &Sfw) -> PlanResult<Sfw> {
    let constructor = match &sfw.select {
        Select::Value { .. } | Select::Pivot { .. } => return Ok(sfw.clone()),
        Select::Star { .. } => match &sfw.group_by {
            Some(group) => star_over_groups(group)?,
            None => star_over_from(&sfw.from)?,
        },
        Select::Project { items, .. } => project_list(items)?,
    };
    let mut out = sfw.clone();
    out.select = Select::Value {
        constructor,
        quantifier: sfw.select.quantifier(),
    };
    Ok(out)
}

fn alias_var(alias: &Symbol) -> Expr {
    Expr::Var {
        identifier: alias.clone().into(),
        scope: ScopeQualifier::Default,
    }
}

fn tuple_union(args: Vec<Expr>) -> Expr {
    Expr::call(TUPLE_UNION, args)
}

/// `CASE WHEN x IS STRUCT THEN x ELSE {'_<position>': x} END`
fn struct_or_positional(value: Expr, position: usize) -> Expr {
    Expr::Case {
        operand: None,
        branches: vec![CaseBranch {
            condition: Expr::IsType {
                value: Box::new(value.clone()),
                ty: DataType::Struct,
                not: false,
            },
            result: value.clone(),
        }],
        default: Some(Box::new(Expr::struct_of(vec![(
            format!("_{position}"),
            value,
        )]))),
    }
}

fn single_field(alias: &Symbol) -> Expr {
    Expr::struct_of(vec![(alias.text.clone(), alias_var(alias))])
}

fn star_over_groups(group: &GroupBy) -> PlanResult<Expr> {
    let mut fields = Vec::with_capacity(group.keys.len() + 1);
    for key in &group.keys {
        let alias = key.as_alias.as_ref().ok_or_else(|| PlanError::MissingAlias {
            construct: format!("GROUP BY key {}", key.expr),
        })?;
        fields.push((alias.text.clone(), alias_var(alias)));
    }
    if let Some(group_as) = &group.as_alias {
        fields.push((group_as.text.clone(), alias_var(group_as)));
    }
    Ok(Expr::struct_of(fields))
}

fn star_over_from(from: &FromClause) -> PlanResult<Expr> {
    let mut args = Vec::new();
    for (i, value) in from.values().into_iter().enumerate() {
        let as_alias = value.as_alias.as_ref().ok_or_else(|| PlanError::MissingAlias {
            construct: format!("FROM item {}", value.expr),
        })?;
        args.push(struct_or_positional(alias_var(as_alias), i + 1));
        for alias in [&value.at_alias, &value.by_alias].into_iter().flatten() {
            args.push(single_field(alias));
        }
    }
    Ok(tuple_union(args))
}

fn project_list(items: &[ProjectItem]) -> PlanResult<Expr> {
    let has_wildcard = items.iter().any(|i| matches!(i, ProjectItem::All { .. }));
    let mut args = Vec::with_capacity(items.len());
    let mut fields = Vec::with_capacity(items.len());
    for (i, item) in items.iter().enumerate() {
        match item {
            ProjectItem::All { expr } => args.push(struct_or_positional(expr.clone(), i + 1)),
            ProjectItem::Expression { expr, as_alias } => {
                let alias = as_alias.as_ref().ok_or_else(|| PlanError::MissingAlias {
                    construct: format!("SELECT item {expr}"),
                })?;
                if has_wildcard {
                    args.push(Expr::struct_of(vec![(alias.text.clone(), expr.clone())]));
                } else {
                    fields.push((alias.text.clone(), expr.clone()));
                }
            }
        }
    }
    if has_wildcard {
        Ok(tuple_union(args))
    } else {
        Ok(Expr::struct_of(fields))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ql_ast::{FromJoin, FromValue, GroupKey, GroupStrategy, JoinType};

    fn from_t() -> FromClause {
        FromClause::Value(FromValue::scan(Expr::var("t"), Symbol::regular("t")))
    }

    fn t_dot(field: &str) -> Expr {
        Expr::path(Expr::var("t"), vec![PathStep::Symbol(Symbol::regular(field))])
    }

    fn constructor(sfw: &Sfw) -> &Expr {
        match &sfw.select {
            Select::Value { constructor, .. } => constructor,
            other => panic!("Expected SELECT VALUE, got {other:?}"),
        }
    }

    #[test]
    fn test_default_alias_rule() {
        assert_eq!(default_alias(&Expr::var("a"), 0), Symbol::regular("a"));
        assert_eq!(default_alias(&t_dot("b"), 3), Symbol::regular("b"));
        let keyed = Expr::path(
            Expr::var("t"),
            vec![PathStep::Index(Box::new(Expr::string("Name")))],
        );
        assert_eq!(default_alias(&keyed, 0), Symbol::delimited("Name"));
        let indexed = Expr::path(Expr::var("t"), vec![PathStep::Index(Box::new(Expr::int(0)))]);
        assert_eq!(default_alias(&indexed, 1), Symbol::regular("_2"));
        assert_eq!(default_alias(&Expr::int(1), 0), Symbol::regular("_1"));
    }

    #[test]
    fn test_project_list_becomes_struct() {
        let sfw = Sfw::new(
            Select::Project {
                items: vec![
                    ProjectItem::Expression {
                        expr: t_dot("a"),
                        as_alias: None,
                    },
                    ProjectItem::Expression {
                        expr: Expr::int(1),
                        as_alias: None,
                    },
                ],
                quantifier: None,
            },
            from_t(),
        );
        let out = normalize_sfw(&sfw).unwrap();
        let expected = Expr::struct_of(vec![
            ("a".to_string(), t_dot("a")),
            ("_2".to_string(), Expr::int(1)),
        ]);
        assert_eq!(constructor(&out), &expected);
    }

    #[test]
    fn test_star_over_join_with_at_alias() {
        let mut rhs = FromValue::scan(Expr::var("b"), Symbol::regular("y"));
        rhs.at_alias = Some(Symbol::regular("i"));
        let from = FromClause::Join(FromJoin {
            lhs: Box::new(FromClause::Value(FromValue::scan(
                Expr::var("a"),
                Symbol::regular("x"),
            ))),
            rhs: Box::new(FromClause::Value(rhs)),
            join_type: JoinType::Comma,
            condition: None,
        });
        let sfw = Sfw::new(Select::Star { quantifier: None }, from);
        let out = normalize_sfw(&sfw).unwrap();
        let expected = tuple_union(vec![
            struct_or_positional(Expr::var("x"), 1),
            struct_or_positional(Expr::var("y"), 2),
            Expr::struct_of(vec![("i".to_string(), Expr::var("i"))]),
        ]);
        assert_eq!(constructor(&out), &expected);
    }

    #[test]
    fn test_star_with_group_by_lists_keys_and_group_as() {
        let mut sfw = Sfw::new(Select::Star { quantifier: None }, from_t());
        sfw.group_by = Some(GroupBy {
            strategy: GroupStrategy::Full,
            keys: vec![GroupKey {
                expr: t_dot("a"),
                as_alias: None,
            }],
            as_alias: Some(Symbol::regular("g")),
        });
        let out = normalize_sfw(&sfw).unwrap();
        let expected = Expr::struct_of(vec![
            ("a".to_string(), Expr::var("a")),
            ("g".to_string(), Expr::var("g")),
        ]);
        assert_eq!(constructor(&out), &expected);
    }

    #[test]
    fn test_mixed_projection_uses_tuple_union() {
        let sfw = Sfw::new(
            Select::Project {
                items: vec![
                    ProjectItem::All {
                        expr: Expr::var("t"),
                    },
                    ProjectItem::Expression {
                        expr: Expr::int(1),
                        as_alias: Some(Symbol::regular("one")),
                    },
                ],
                quantifier: None,
            },
            from_t(),
        );
        let out = normalize_sfw(&sfw).unwrap();
        let expected = tuple_union(vec![
            struct_or_positional(Expr::var("t"), 1),
            Expr::struct_of(vec![("one".to_string(), Expr::int(1))]),
        ]);
        assert_eq!(constructor(&out), &expected);
    }

    #[test]
    fn test_normalization_is_idempotent() {
        let sfw = Sfw::new(Select::Star { quantifier: None }, from_t());
        let once = normalize_sfw(&sfw).unwrap();
        let twice = normalize_sfw(&once).unwrap();
        assert_eq!(once, twice);
    }

    #[test]
    fn test_missing_from_alias_is_internal_error() {
        let mut value = FromValue::scan(Expr::var("t"), Symbol::regular("t"));
        value.as_alias = None;
        let sfw = Sfw::new(Select::Star { quantifier: None }, FromClause::Value(value));
        let err = normalize_sfw(&sfw).unwrap_err();
        assert_eq!(err.code(), "PL002");
        assert!(err.is_internal());
    }
}
