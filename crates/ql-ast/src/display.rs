//! Query-text rendering of AST nodes, used in error messages

use crate::expr::{
    BagOp, BinaryOp, CollectionKind, Expr, Literal, NullOrder, OrderDirection, PathStep,
    ScopeQualifier, SessionAttribute, SetOpKind, SetQuantifier, Sort, TrimSpec, UnaryOp,
};
use crate::query::{
    ExcludePath, ExcludeStep, FromClause, FromKind, FromValue, GroupStrategy, JoinType,
    ProjectItem, Select, Sfw,
};
use std::fmt::{self, Display, Formatter};

fn comma_list<T: Display>(f: &mut Formatter<'_>, items: &[T]) -> fmt::Result {
    for (i, item) in items.iter().enumerate() {
        if i > 0 {
            f.write_str(", ")?;
        }
        write!(f, "{item}")?;
    }
    Ok(())
}

impl Display for Literal {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        match self {
            Literal::Null => f.write_str("NULL"),
            Literal::Missing => f.write_str("MISSING"),
            Literal::Bool(true) => f.write_str("TRUE"),
            Literal::Bool(false) => f.write_str("FALSE"),
            Literal::Int(i) => write!(f, "{i}"),
            Literal::Decimal(d) => f.write_str(d),
            Literal::Float(v) => write!(f, "{v:?}"),
            Literal::String(s) => write!(f, "'{}'", s.replace('\'', "''")),
        }
    }
}

impl BinaryOp {
    /// Operator as written in query text
    pub fn symbol(self) -> &'static str {
        match self {
            BinaryOp::Plus => "+",
            BinaryOp::Minus => "-",
            BinaryOp::Times => "*",
            BinaryOp::Divide => "/",
            BinaryOp::Modulo => "%",
            BinaryOp::Concat => "||",
            BinaryOp::BitwiseAnd => "&",
            BinaryOp::And => "AND",
            BinaryOp::Or => "OR",
            BinaryOp::Eq => "=",
            BinaryOp::Ne => "<>",
            BinaryOp::Lt => "<",
            BinaryOp::Lte => "<=",
            BinaryOp::Gt => ">",
            BinaryOp::Gte => ">=",
        }
    }
}

fn operand(f: &mut Formatter<'_>, expr: &Expr) -> fmt::Result {
    match expr {
        Expr::Binary { .. } | Expr::BagOp(_) => write!(f, "({expr})"),
        _ => write!(f, "{expr}"),
    }
}

fn not_kw(not: bool) -> &'static str {
    if not {
        "NOT "
    } else {
        ""
    }
}

impl Display for Sort {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.expr)?;
        match self.dir {
            Some(OrderDirection::Asc) => f.write_str(" ASC")?,
            Some(OrderDirection::Desc) => f.write_str(" DESC")?,
            None => {}
        }
        match self.nulls {
            Some(NullOrder::First) => f.write_str(" NULLS FIRST"),
            Some(NullOrder::Last) => f.write_str(" NULLS LAST"),
            None => Ok(()),
        }
    }
}

fn set_op_keyword(kind: SetOpKind) -> &'static str {
    match kind {
        SetOpKind::Union => "UNION",
        SetOpKind::Intersect => "INTERSECT",
        SetOpKind::Except => "EXCEPT",
    }
}

fn quantifier_suffix(q: Option<SetQuantifier>) -> &'static str {
    match q {
        Some(SetQuantifier::All) => " ALL",
        Some(SetQuantifier::Distinct) => " DISTINCT",
        None => "",
    }
}

impl Display for BagOp {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        operand(f, &self.lhs)?;
        let outer = if self.outer { " OUTER" } else { "" };
        write!(
            f,
            "{outer} {}{} ",
            set_op_keyword(self.kind),
            quantifier_suffix(self.quantifier)
        )?;
        operand(f, &self.rhs)
    }
}

impl Display for Expr {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        match self {
            Expr::Lit(lit) => write!(f, "{lit}"),
            Expr::Var { identifier, scope } => match scope {
                ScopeQualifier::Default => write!(f, "{identifier}"),
                ScopeQualifier::Local => write!(f, "@{identifier}"),
            },
            Expr::Path { root, steps } => {
                operand(f, root)?;
                for step in steps {
                    match step {
                        PathStep::Symbol(s) => write!(f, ".{s}")?,
                        PathStep::Index(e) => write!(f, "[{e}]")?,
                        PathStep::Wildcard => f.write_str("[*]")?,
                        PathStep::Unpivot => f.write_str(".*")?,
                    }
                }
                Ok(())
            }
            Expr::Call(call) => {
                write!(f, "{}(", call.function)?;
                if let Some(q) = call.set_quantifier {
                    write!(f, "{} ", quantifier_suffix(Some(q)).trim_start())?;
                }
                comma_list(f, &call.args)?;
                f.write_str(")")
            }
            Expr::Unary { op, expr } => {
                match op {
                    UnaryOp::Not => f.write_str("NOT ")?,
                    UnaryOp::Pos => f.write_str("+")?,
                    UnaryOp::Neg => f.write_str("-")?,
                }
                operand(f, expr)
            }
            Expr::Binary { op, lhs, rhs } => {
                operand(f, lhs)?;
                write!(f, " {} ", op.symbol())?;
                operand(f, rhs)
            }
            Expr::Struct(fields) => {
                f.write_str("{")?;
                for (i, field) in fields.iter().enumerate() {
                    if i > 0 {
                        f.write_str(", ")?;
                    }
                    write!(f, "{}: {}", field.name, field.value)?;
                }
                f.write_str("}")
            }
            Expr::Collection { kind, values } => {
                let (open, close) = match kind {
                    CollectionKind::Bag => ("<<", ">>"),
                    CollectionKind::Array => ("[", "]"),
                    CollectionKind::List => ("LIST(", ")"),
                    CollectionKind::Sexp => ("SEXP(", ")"),
                };
                f.write_str(open)?;
                comma_list(f, values)?;
                f.write_str(close)
            }
            Expr::Like {
                value,
                pattern,
                escape,
                not,
            } => {
                write!(f, "{value} {}LIKE {pattern}", not_kw(*not))?;
                if let Some(e) = escape {
                    write!(f, " ESCAPE {e}")?;
                }
                Ok(())
            }
            Expr::Between {
                value,
                from,
                to,
                not,
            } => write!(f, "{value} {}BETWEEN {from} AND {to}", not_kw(*not)),
            Expr::InCollection { lhs, rhs, not } => {
                write!(f, "{lhs} {}IN {rhs}", not_kw(*not))
            }
            Expr::IsType { value, ty, not } => write!(f, "{value} IS {}{ty}", not_kw(*not)),
            Expr::Case {
                operand: case_operand,
                branches,
                default,
            } => {
                f.write_str("CASE")?;
                if let Some(o) = case_operand {
                    write!(f, " {o}")?;
                }
                for b in branches {
                    write!(f, " WHEN {} THEN {}", b.condition, b.result)?;
                }
                if let Some(d) = default {
                    write!(f, " ELSE {d}")?;
                }
                f.write_str(" END")
            }
            Expr::Coalesce(args) => {
                f.write_str("COALESCE(")?;
                comma_list(f, args)?;
                f.write_str(")")
            }
            Expr::NullIf { value, nullifier } => write!(f, "NULLIF({value}, {nullifier})"),
            Expr::Cast { value, as_type } => write!(f, "CAST({value} AS {as_type})"),
            Expr::CanCast { value, as_type } => write!(f, "CAN_CAST({value} AS {as_type})"),
            Expr::CanLosslessCast { value, as_type } => {
                write!(f, "CAN_LOSSLESS_CAST({value} AS {as_type})")
            }
            Expr::Substring {
                value,
                start,
                length,
            } => {
                write!(f, "SUBSTRING({value}")?;
                if let Some(s) = start {
                    write!(f, " FROM {s}")?;
                }
                if let Some(l) = length {
                    write!(f, " FOR {l}")?;
                }
                f.write_str(")")
            }
            Expr::Position { lhs, rhs } => write!(f, "POSITION({lhs} IN {rhs})"),
            Expr::Trim { value, chars, spec } => {
                f.write_str("TRIM(")?;
                match spec {
                    Some(TrimSpec::Both) => f.write_str("BOTH ")?,
                    Some(TrimSpec::Leading) => f.write_str("LEADING ")?,
                    Some(TrimSpec::Trailing) => f.write_str("TRAILING ")?,
                    None => {}
                }
                if let Some(c) = chars {
                    write!(f, "{c} ")?;
                }
                if spec.is_some() || chars.is_some() {
                    f.write_str("FROM ")?;
                }
                write!(f, "{value})")
            }
            Expr::Overlay {
                value,
                overlay,
                start,
                length,
            } => {
                write!(f, "OVERLAY({value} PLACING {overlay} FROM {start}")?;
                if let Some(l) = length {
                    write!(f, " FOR {l}")?;
                }
                f.write_str(")")
            }
            Expr::Extract { field, source } => {
                write!(f, "EXTRACT({} FROM {source})", field.name().to_uppercase())
            }
            Expr::DateAdd { field, lhs, rhs } => {
                write!(f, "DATE_ADD({}, {lhs}, {rhs})", field.name().to_uppercase())
            }
            Expr::DateDiff { field, lhs, rhs } => {
                write!(f, "DATE_DIFF({}, {lhs}, {rhs})", field.name().to_uppercase())
            }
            Expr::SessionAttribute(SessionAttribute::CurrentUser) => f.write_str("CURRENT_USER"),
            Expr::SessionAttribute(SessionAttribute::CurrentDate) => f.write_str("CURRENT_DATE"),
            Expr::Window(w) => {
                write!(f, "{}(", w.function.name().to_uppercase())?;
                comma_list(f, &w.args)?;
                f.write_str(") OVER (")?;
                if !w.over.partitions.is_empty() {
                    f.write_str("PARTITION BY ")?;
                    comma_list(f, &w.over.partitions)?;
                    if !w.over.sorts.is_empty() {
                        f.write_str(" ")?;
                    }
                }
                if !w.over.sorts.is_empty() {
                    f.write_str("ORDER BY ")?;
                    comma_list(f, &w.over.sorts)?;
                }
                f.write_str(")")
            }
            Expr::BagOp(op) => write!(f, "{op}"),
            Expr::Sfw(sfw) => write!(f, "({sfw})"),
        }
    }
}

impl Display for ProjectItem {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        match self {
            ProjectItem::All { expr } => {
                operand(f, expr)?;
                f.write_str(".*")
            }
            ProjectItem::Expression { expr, as_alias } => {
                write!(f, "{expr}")?;
                if let Some(alias) = as_alias {
                    write!(f, " AS {alias}")?;
                }
                Ok(())
            }
        }
    }
}

impl Display for Select {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        match self {
            Select::Star { quantifier } => write!(f, "SELECT{} *", quantifier_suffix(*quantifier)),
            Select::Project { items, quantifier } => {
                write!(f, "SELECT{} ", quantifier_suffix(*quantifier))?;
                comma_list(f, items)
            }
            Select::Value {
                constructor,
                quantifier,
            } => write!(f, "SELECT{} VALUE {constructor}", quantifier_suffix(*quantifier)),
            Select::Pivot { key, value } => write!(f, "PIVOT {value} AT {key}"),
        }
    }
}

impl Display for FromValue {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        if self.kind == FromKind::Unpivot {
            f.write_str("UNPIVOT ")?;
        }
        write!(f, "{}", self.expr)?;
        if let Some(a) = &self.as_alias {
            write!(f, " AS {a}")?;
        }
        if let Some(a) = &self.at_alias {
            write!(f, " AT {a}")?;
        }
        if let Some(a) = &self.by_alias {
            write!(f, " BY {a}")?;
        }
        Ok(())
    }
}

impl Display for FromClause {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        match self {
            FromClause::Value(v) => write!(f, "{v}"),
            FromClause::Join(j) => {
                let keyword = match j.join_type {
                    JoinType::Comma => ",",
                    JoinType::Inner => " INNER JOIN",
                    JoinType::Cross => " CROSS JOIN",
                    JoinType::Left => " LEFT JOIN",
                    JoinType::LeftOuter => " LEFT OUTER JOIN",
                    JoinType::Right => " RIGHT JOIN",
                    JoinType::RightOuter => " RIGHT OUTER JOIN",
                    JoinType::Full => " FULL JOIN",
                    JoinType::FullOuter => " FULL OUTER JOIN",
                };
                write!(f, "{}{keyword} {}", j.lhs, j.rhs)?;
                if let Some(c) = &j.condition {
                    write!(f, " ON {c}")?;
                }
                Ok(())
            }
        }
    }
}

impl Display for ExcludeStep {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        match self {
            ExcludeStep::StructField(s) => write!(f, ".{s}"),
            ExcludeStep::StructWildcard => f.write_str(".*"),
            ExcludeStep::CollIndex(i) => write!(f, "[{i}]"),
            ExcludeStep::CollWildcard => f.write_str("[*]"),
        }
    }
}

impl Display for ExcludePath {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.root)?;
        for step in &self.steps {
            write!(f, "{step}")?;
        }
        Ok(())
    }
}

impl Display for Sfw {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.select)?;
        if !self.exclude.is_empty() {
            f.write_str(" EXCLUDE ")?;
            comma_list(f, &self.exclude)?;
        }
        write!(f, " FROM {}", self.from)?;
        if let Some(w) = &self.where_clause {
            write!(f, " WHERE {w}")?;
        }
        if let Some(g) = &self.group_by {
            match g.strategy {
                GroupStrategy::Full => f.write_str(" GROUP BY ")?,
                GroupStrategy::Partial => f.write_str(" GROUP PARTIAL BY ")?,
            }
            for (i, key) in g.keys.iter().enumerate() {
                if i > 0 {
                    f.write_str(", ")?;
                }
                write!(f, "{}", key.expr)?;
                if let Some(a) = &key.as_alias {
                    write!(f, " AS {a}")?;
                }
            }
            if let Some(a) = &g.as_alias {
                write!(f, " GROUP AS {a}")?;
            }
        }
        if let Some(h) = &self.having {
            write!(f, " HAVING {h}")?;
        }
        if let Some(op) = &self.set_op {
            let outer = if op.outer { " OUTER" } else { "" };
            write!(
                f,
                "{outer} {}{} {}",
                set_op_keyword(op.kind),
                quantifier_suffix(op.quantifier),
                op.operand
            )?;
        }
        if !self.order_by.is_empty() {
            f.write_str(" ORDER BY ")?;
            comma_list(f, &self.order_by)?;
        }
        if let Some(l) = &self.limit {
            write!(f, " LIMIT {l}")?;
        }
        if let Some(o) = &self.offset {
            write!(f, " OFFSET {o}")?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use crate::expr::{Expr, PathStep};
    use crate::identifier::Symbol;
    use crate::query::{FromClause, FromValue, ProjectItem, Select, Sfw};
    use crate::BinaryOp;

    #[test]
    fn test_render_path_and_binary() {
        let e = Expr::binary(
            BinaryOp::Ne,
            Expr::path(
                Expr::var("a"),
                vec![PathStep::Index(Box::new(Expr::int(0))), PathStep::Symbol(Symbol::regular("b"))],
            ),
            Expr::string("x"),
        );
        assert_eq!(e.to_string(), "a[0].b <> 'x'");
    }

    #[test]
    fn test_render_query_block() {
        let mut sfw = Sfw::new(
            Select::Project {
                items: vec![ProjectItem::Expression {
                    expr: Expr::var("a"),
                    as_alias: Some(Symbol::delimited("A")),
                }],
                quantifier: None,
            },
            FromClause::Value(FromValue::scan(Expr::var("t"), Symbol::regular("t"))),
        );
        sfw.limit = Some(Expr::int(3));
        assert_eq!(
            Expr::Sfw(Box::new(sfw)).to_string(),
            "(SELECT a AS \"A\" FROM t AS t LIMIT 3)"
        );
    }
}
