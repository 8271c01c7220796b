//! EXCLUDE compilation: flat paths to one step trie per root variable

use super::scope::Scope;
use super::Lowerer;
use crate::config::UnresolvedExclude;
use crate::error::{PlanError, PlanResult};
use crate::ir::rel::{ExcludeKind, ExcludePath, ExcludeStep, Rel, RelOp};
use crate::ir::rex::Rex;
use ql_ast::{Expr, Identifier, PathStep, Symbol};

/// Root variable and leading field steps of a plain EXCLUDE root
fn plain_root(expr: &Expr) -> Option<(&Identifier, Vec<Symbol>)> {
    match expr {
        Expr::Var { identifier, .. } => Some((identifier, identifier.steps().to_vec())),
        Expr::Path { root, steps } => {
            let (identifier, mut fields) = plain_root(root)?;
            for step in steps {
                match step {
                    PathStep::Symbol(symbol) => fields.push(symbol.clone()),
                    _ => return None,
                }
            }
            Some((identifier, fields))
        }
        _ => None,
    }
}

fn exclude_kind(step: &ql_ast::ExcludeStep) -> ExcludeKind {
    match step {
        ql_ast::ExcludeStep::StructField(symbol) if symbol.is_delimited() => {
            ExcludeKind::StructKey(symbol.text.clone())
        }
        ql_ast::ExcludeStep::StructField(symbol) => ExcludeKind::StructSymbol(symbol.text.clone()),
        ql_ast::ExcludeStep::StructWildcard => ExcludeKind::StructWildcard,
        ql_ast::ExcludeStep::CollIndex(index) => ExcludeKind::CollIndex(*index),
        ql_ast::ExcludeStep::CollWildcard => ExcludeKind::CollWildcard,
    }
}

/// Fold step lists sharing a root into a trie.
///
/// An empty list excludes everything below the current node, so any longer
/// list next to it is dropped. Likewise a branch is dropped when a sibling
/// that is excluded whole already covers it, such as `."a"` next to `.a`.
pub(crate) fn compile_steps(lists: &[&[ql_ast::ExcludeStep]]) -> Vec<ExcludeStep> {
    if lists.iter().any(|list| list.is_empty()) {
        return Vec::new();
    }
    let mut groups: Vec<(ExcludeKind, Vec<&[ql_ast::ExcludeStep]>)> = Vec::new();
    for list in lists {
        let Some((first, rest)) = list.split_first() else {
            continue;
        };
        let kind = exclude_kind(first);
        match groups.iter_mut().find(|(k, _)| k.same_target(&kind)) {
            Some((_, rests)) => rests.push(rest),
            None => groups.push((kind, vec![rest])),
        }
    }
    let steps: Vec<ExcludeStep> = groups
        .into_iter()
        .map(|(kind, rests)| ExcludeStep {
            kind,
            substeps: compile_steps(&rests),
        })
        .collect();
    let whole: Vec<ExcludeKind> = steps
        .iter()
        .filter(|s| s.substeps.is_empty())
        .map(|s| s.kind.clone())
        .collect();
    steps
        .into_iter()
        .filter(|step| {
            !whole
                .iter()
                .any(|kind| *kind != step.kind && kind.covers(&step.kind))
        })
        .collect()
}

impl Lowerer<'_> {
    /// Exclude stage; paths whose root names no visible binding are dropped
    /// unless configured to be reported.
    pub(crate) fn lower_exclude(
        &mut self,
        paths: &[ql_ast::ExcludePath],
        input: Rel,
        outer: &Scope<'_>,
    ) -> PlanResult<Rel> {
        if paths.is_empty() {
            return Ok(input);
        }
        let mut groups: Vec<((usize, usize), Vec<Vec<ql_ast::ExcludeStep>>)> = Vec::new();
        {
            let scope = outer.nested(&input.ty.schema);
            for path in paths {
                let (identifier, fields) =
                    plain_root(&path.root).ok_or_else(|| PlanError::InvalidExcludeRoot {
                        construct: path.root.to_string(),
                    })?;
                let Some(slot) = scope.resolve(identifier.root()) else {
                    if self.config.unresolved_exclude == UnresolvedExclude::Error {
                        self.report(PlanError::UnresolvedExclude {
                            root: identifier.to_string(),
                        })?;
                    } else {
                        log::debug!("Dropping EXCLUDE path rooted at unresolved '{}'", identifier);
                    }
                    continue;
                };
                let steps: Vec<ql_ast::ExcludeStep> = fields
                    .into_iter()
                    .map(ql_ast::ExcludeStep::StructField)
                    .chain(path.steps.iter().cloned())
                    .collect();
                match groups.iter_mut().find(|(s, _)| *s == slot) {
                    Some((_, lists)) => lists.push(steps),
                    None => groups.push((slot, vec![steps])),
                }
            }
        }
        if groups.is_empty() {
            return Ok(input);
        }
        let paths = groups
            .into_iter()
            .map(|((depth, offset), lists)| {
                let lists: Vec<&[ql_ast::ExcludeStep]> = lists.iter().map(Vec::as_slice).collect();
                ExcludePath {
                    root: Rex::var_local(depth, offset),
                    steps: compile_steps(&lists),
                }
            })
            .collect();
        let ty = input.ty.clone();
        Ok(Rel::new(
            ty,
            RelOp::Exclude {
                input: Box::new(input),
                paths,
            },
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::PlanConfig;
    use crate::env::BuiltinEnvironment;
    use crate::ir::explain::explain_rel;
    use crate::ir::schema::RelType;
    use ql_ast::ExcludeStep as Step;

    fn field(name: &str) -> Step {
        Step::StructField(Symbol::regular(name))
    }

    fn scan_t() -> Rel {
        Rel::new(
            RelType::of_names(["t"]),
            RelOp::Scan {
                rex: Rex::string("t"),
            },
        )
    }

    fn exclude(root: Expr, steps: Vec<Step>) -> ql_ast::ExcludePath {
        ql_ast::ExcludePath { root, steps }
    }

    #[test]
    fn test_prefix_path_absorbs_longer_path() {
        let short = vec![field("a")];
        let long = vec![field("a"), field("b"), Step::CollWildcard];
        let trie = compile_steps(&[long.as_slice(), short.as_slice()]);
        assert_eq!(trie.len(), 1);
        assert_eq!(trie[0].kind, ExcludeKind::StructSymbol("a".to_string()));
        assert!(trie[0].substeps.is_empty());
    }

    #[test]
    fn test_shared_prefix_branches() {
        let one = vec![field("a"), Step::CollIndex(0)];
        let two = vec![field("A"), Step::StructField(Symbol::delimited("B"))];
        let three = vec![Step::CollWildcard];
        let trie = compile_steps(&[one.as_slice(), two.as_slice(), three.as_slice()]);
        assert_eq!(trie.len(), 2);
        assert_eq!(trie[0].substeps.len(), 2);
        assert_eq!(trie[0].substeps[1].kind, ExcludeKind::StructKey("B".to_string()));
        assert_eq!(trie[1].kind, ExcludeKind::CollWildcard);
    }

    #[test]
    fn test_whole_symbol_absorbs_matching_key() {
        let symbol = vec![field("a")];
        let key = vec![Step::StructField(Symbol::delimited("A")), Step::CollWildcard];
        let other = vec![Step::StructField(Symbol::delimited("b"))];
        let trie = compile_steps(&[key.as_slice(), symbol.as_slice(), other.as_slice()]);
        let kinds: Vec<&ExcludeKind> = trie.iter().map(|s| &s.kind).collect();
        assert_eq!(
            kinds,
            vec![
                &ExcludeKind::StructSymbol("a".to_string()),
                &ExcludeKind::StructKey("b".to_string()),
            ]
        );
        assert!(trie[0].substeps.is_empty());
    }

    #[test]
    fn test_partial_symbol_keeps_whole_key() {
        // `.a[*]` does not cover every field the exact key `."a"` names
        let symbol = vec![field("a"), Step::CollWildcard];
        let key = vec![Step::StructField(Symbol::delimited("a"))];
        let trie = compile_steps(&[symbol.as_slice(), key.as_slice()]);
        assert_eq!(trie.len(), 2);
    }

    #[test]
    fn test_wildcards_absorb_specific_steps() {
        let index = vec![Step::CollIndex(3), field("x")];
        let all = vec![Step::CollWildcard];
        let trie = compile_steps(&[index.as_slice(), all.as_slice()]);
        assert_eq!(trie.len(), 1);
        assert_eq!(trie[0].kind, ExcludeKind::CollWildcard);
    }

    #[test]
    fn test_paths_grouped_by_root_variable() {
        let env = BuiltinEnvironment::new();
        let config = PlanConfig::default();
        let mut lowerer = Lowerer::new(&env, &config);
        let paths = vec![
            exclude(Expr::var("t"), vec![field("a")]),
            exclude(
                Expr::path(Expr::var("t"), vec![PathStep::Symbol(Symbol::regular("b"))]),
                vec![Step::CollWildcard],
            ),
        ];
        let rel = lowerer
            .lower_exclude(&paths, scan_t(), &Scope::empty())
            .unwrap();
        let text = explain_rel(&rel);
        assert_eq!(text.lines().next(), Some("Exclude #0.0{.a, .b[*]} -> (t)"));
    }

    #[test]
    fn test_unresolved_root_dropped_by_default() {
        let env = BuiltinEnvironment::new();
        let config = PlanConfig::default();
        let mut lowerer = Lowerer::new(&env, &config);
        let paths = vec![exclude(Expr::var("nope"), vec![field("a")])];
        let rel = lowerer
            .lower_exclude(&paths, scan_t(), &Scope::empty())
            .unwrap();
        assert!(matches!(rel.op, RelOp::Scan { .. }));
    }

    #[test]
    fn test_unresolved_root_reported_when_strict() {
        let env = BuiltinEnvironment::new();
        let config = PlanConfig {
            unresolved_exclude: UnresolvedExclude::Error,
            ..PlanConfig::default()
        };
        let mut lowerer = Lowerer::new(&env, &config);
        let paths = vec![exclude(Expr::var("nope"), vec![field("a")])];
        let err = lowerer
            .lower_exclude(&paths, scan_t(), &Scope::empty())
            .unwrap_err();
        assert_eq!(err.code(), "PL104");
    }

    #[test]
    fn test_non_variable_root_is_internal_error() {
        let env = BuiltinEnvironment::new();
        let config = PlanConfig::default();
        let mut lowerer = Lowerer::new(&env, &config);
        let paths = vec![exclude(Expr::int(1), vec![])];
        let err = lowerer
            .lower_exclude(&paths, scan_t(), &Scope::empty())
            .unwrap_err();
        assert_eq!(err.code(), "PL004");
    }
}
