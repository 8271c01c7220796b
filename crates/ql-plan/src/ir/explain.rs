//! EXPLAIN rendering: compact `Display` for `Rex` and an indented tree for `Rel`
//!
//! `VarLocal(depth, offset)` renders as `#depth.offset`; calls render as
//! `name(args)`, so `a != b` reads `not(eq(a, b))`.

use super::rel::{ExcludeKind, ExcludePath, ExcludeStep, Rel, RelOp, SortSpec};
use super::rex::{CollectionKind, Coercion, LiteralValue, Rex, RexOp, VarScope};
use std::fmt::{self, Display, Formatter, Write};

struct Commas<'a, T>(&'a [T]);

impl<T: Display> Display for Commas<'_, T> {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        for (i, item) in self.0.iter().enumerate() {
            if i > 0 {
                f.write_str(", ")?;
            }
            write!(f, "{item}")?;
        }
        Ok(())
    }
}

impl Display for LiteralValue {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        match self {
            LiteralValue::Null => f.write_str("null"),
            LiteralValue::Missing => f.write_str("missing"),
            LiteralValue::Bool(b) => write!(f, "{b}"),
            LiteralValue::Int(i) => write!(f, "{i}"),
            LiteralValue::Decimal(d) => f.write_str(d),
            LiteralValue::Float(v) => write!(f, "{v:?}"),
            LiteralValue::String(s) => write!(f, "'{}'", s.replace('\'', "''")),
        }
    }
}

impl Display for Rex {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        match &self.op {
            RexOp::Lit(value) => write!(f, "{value}"),
            RexOp::VarLocal { depth, offset } => write!(f, "#{depth}.{offset}"),
            RexOp::VarUnresolved { identifier, scope } => match scope {
                VarScope::Default => write!(f, "{identifier}"),
                VarScope::Local => write!(f, "@{identifier}"),
            },
            RexOp::VarGlobal { reference } => write!(f, "global:{reference}"),
            RexOp::PathSymbol { root, key } => write!(f, "{root}.{key}"),
            RexOp::PathKey { root, key } => write!(f, "{root}[{key}]"),
            RexOp::PathIndex { root, index } => write!(f, "{root}[{index}]"),
            RexOp::CallUnresolved { identifier, args } => {
                write!(f, "{identifier}({})", Commas(args))
            }
            RexOp::CallStatic { function, args } => write!(f, "{function}({})", Commas(args)),
            RexOp::CallDynamic { candidates, args } => {
                write!(f, "dynamic[{}]({})", candidates.join("|"), Commas(args))
            }
            RexOp::CastUnresolved { target, arg } | RexOp::CastResolved { target, arg } => {
                write!(f, "cast({arg} AS {target})")
            }
            RexOp::Struct { fields } => {
                f.write_str("{")?;
                for (i, field) in fields.iter().enumerate() {
                    if i > 0 {
                        f.write_str(", ")?;
                    }
                    write!(f, "{}: {}", field.key, field.value)?;
                }
                f.write_str("}")
            }
            RexOp::Collection { kind, values } => match kind {
                CollectionKind::Bag => write!(f, "<<{}>>", Commas(values)),
                CollectionKind::List => write!(f, "[{}]", Commas(values)),
            },
            RexOp::TupleUnion { args } => write!(f, "tupleunion({})", Commas(args)),
            RexOp::Case { branches, default } => {
                f.write_str("CASE")?;
                for branch in branches {
                    write!(f, " WHEN {} THEN {}", branch.condition, branch.result)?;
                }
                write!(f, " ELSE {default} END")
            }
            RexOp::Coalesce { args } => write!(f, "coalesce({})", Commas(args)),
            RexOp::Nullif { value, nullifier } => write!(f, "nullif({value}, {nullifier})"),
            RexOp::Select { constructor, .. } => write!(f, "select({constructor})"),
            RexOp::Subquery {
                constructor,
                coercion,
                ..
            } => {
                let mode = match coercion {
                    Coercion::Scalar => "scalar",
                    Coercion::Row => "row",
                };
                write!(f, "subquery[{mode}]({constructor})")
            }
            RexOp::Pivot { key, value, .. } => write!(f, "pivot({key}, {value})"),
            RexOp::Err { message } => write!(f, "error({message})"),
        }
    }
}

impl Display for SortSpec {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.rex, self.order)
    }
}

impl Display for ExcludeStep {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        match &self.kind {
            ExcludeKind::StructKey(key) => write!(f, ".\"{key}\"")?,
            ExcludeKind::StructSymbol(symbol) => write!(f, ".{symbol}")?,
            ExcludeKind::StructWildcard => f.write_str(".*")?,
            ExcludeKind::CollIndex(index) => write!(f, "[{index}]")?,
            ExcludeKind::CollWildcard => f.write_str("[*]")?,
        }
        write_substeps(f, &self.substeps)
    }
}

fn write_substeps(f: &mut Formatter<'_>, steps: &[ExcludeStep]) -> fmt::Result {
    match steps {
        [] => Ok(()),
        [only] => write!(f, "{only}"),
        many => write!(f, "{{{}}}", Commas(many)),
    }
}

impl Display for ExcludePath {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.root)?;
        write_substeps(f, &self.steps)
    }
}

/// Operator details shown after the operator name
fn details(rel: &Rel) -> String {
    match &rel.op {
        RelOp::Scan { rex } | RelOp::ScanIndexed { rex } | RelOp::Unpivot { rex } => {
            rex.to_string()
        }
        RelOp::Distinct { .. } => String::new(),
        RelOp::Filter { predicate, .. } => predicate.to_string(),
        RelOp::Sort { specs, .. } => Commas(specs).to_string(),
        RelOp::Union(set) | RelOp::Intersect(set) | RelOp::Except(set) => {
            if set.is_outer {
                format!("OUTER {}", set.quantifier)
            } else {
                set.quantifier.to_string()
            }
        }
        RelOp::Limit { limit, .. } => limit.to_string(),
        RelOp::Offset { offset, .. } => offset.to_string(),
        RelOp::Project { projections, .. } => Commas(projections).to_string(),
        RelOp::Join {
            condition, kind, ..
        } => format!("{kind} ON {condition}"),
        RelOp::Aggregate {
            strategy,
            calls,
            groups,
            ..
        } => {
            let calls: Vec<String> = calls
                .iter()
                .map(|c| format!("{}({})", c.function, Commas(&c.args)))
                .collect();
            format!(
                "{strategy:?} calls=[{}] groups=[{}]",
                calls.join(", "),
                Commas(groups)
            )
        }
        RelOp::Window {
            partitions,
            sorts,
            functions,
            ..
        } => {
            let functions: Vec<String> = functions
                .iter()
                .map(|w| format!("{}({})", w.function, Commas(&w.args)))
                .collect();
            format!(
                "{} partitions=[{}] sorts=[{}]",
                functions.join(", "),
                Commas(partitions),
                Commas(sorts)
            )
        }
        RelOp::Exclude { paths, .. } => Commas(paths).to_string(),
        RelOp::Err { reason } => reason.clone(),
    }
}

fn write_rel(out: &mut String, rel: &Rel, depth: usize) {
    let detail = details(rel);
    let _ = write!(out, "{}{}", "  ".repeat(depth), rel.op_name());
    if !detail.is_empty() {
        let _ = write!(out, " {detail}");
    }
    let _ = writeln!(out, " -> ({})", rel.ty.names().join(", "));
    for input in rel.inputs() {
        write_rel(out, input, depth + 1);
    }
}

/// Render a relational plan as an indented tree, one operator per line
pub fn explain_rel(rel: &Rel) -> String {
    let mut out = String::new();
    write_rel(&mut out, rel, 0);
    out
}

/// Render an expression; query-valued expressions are followed by their plan
pub fn explain(rex: &Rex) -> String {
    let mut out = format!("{rex}\n");
    match &rex.op {
        RexOp::Select { rel, .. } | RexOp::Subquery { rel, .. } | RexOp::Pivot { rel, .. } => {
            write_rel(&mut out, rel, 1);
        }
        _ => {}
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ir::rel::JoinKind;
    use crate::ir::rex::StructField;
    use crate::ir::schema::RelType;
    use ql_ast::Identifier;

    fn unresolved(name: &str) -> Rex {
        Rex::dynamic(RexOp::VarUnresolved {
            identifier: Identifier::regular(name),
            scope: VarScope::Default,
        })
    }

    #[test]
    fn test_compact_rex() {
        let rex = Rex::call("eq", vec![unresolved("a"), unresolved("b")]).not();
        assert_eq!(rex.to_string(), "not(eq(a, b))");

        let s = Rex::dynamic(RexOp::Struct {
            fields: vec![StructField {
                key: Rex::string("k"),
                value: Rex::var_local(0, 1),
            }],
        });
        assert_eq!(s.to_string(), "{'k': #0.1}");
        assert_eq!(Rex::string("it's").to_string(), "'it''s'");
    }

    #[test]
    fn test_exclude_trie_rendering() {
        let path = ExcludePath {
            root: Rex::var_local(0, 0),
            steps: vec![ExcludeStep {
                kind: ExcludeKind::StructSymbol("a".to_string()),
                substeps: vec![
                    ExcludeStep {
                        kind: ExcludeKind::CollWildcard,
                        substeps: vec![],
                    },
                    ExcludeStep {
                        kind: ExcludeKind::StructKey("B".to_string()),
                        substeps: vec![],
                    },
                ],
            }],
        };
        assert_eq!(path.to_string(), "#0.0.a{[*], .\"B\"}");
    }

    #[test]
    fn test_tree_lists_inputs_indented() {
        let scan = |name: &str| {
            Rel::new(
                RelType::of_names([name]),
                RelOp::Scan {
                    rex: unresolved(name),
                },
            )
        };
        let join = Rel::new(
            RelType::of_names(["a", "b"]),
            RelOp::Join {
                lhs: Box::new(scan("a")),
                rhs: Box::new(scan("b")),
                condition: Rex::bool(true),
                kind: JoinKind::Left,
            },
        );
        let text = explain_rel(&join);
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(lines[0], "Join LEFT ON true -> (a, b)");
        assert_eq!(lines[1], "  Scan a -> (a)");
        assert_eq!(lines[2], "  Scan b -> (b)");
    }
}
