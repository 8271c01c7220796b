//! CREATE TABLE: structural constraint checks and the resulting table shape

use super::scope::Scope;
use super::Lowerer;
use crate::error::{PlanError, PlanResult};
use crate::ir::ddl::{ColumnShape, TableShape};
use crate::ir::schema::Binding;
use crate::ir::types::TypeTag;
use ql_ast::{ColumnConstraint, CreateTable, Symbol, TableConstraintKind};

impl Lowerer<'_> {
    /// Lower a CREATE TABLE into its shape.
    ///
    /// In collect mode an offending column or constraint is skipped and the
    /// rest of the table is still checked.
    pub(crate) fn lower_create_table(&mut self, table: &CreateTable) -> PlanResult<TableShape> {
        let table_name = table.name.to_string();
        let mut shape = TableShape {
            name: table_name.clone(),
            columns: Vec::with_capacity(table.columns.len()),
            primary_key: Vec::new(),
            unique: Vec::new(),
            checks: Vec::new(),
        };
        let mut key_declarations = 0usize;
        let mut checks = Vec::new();

        for column in &table.columns {
            if shape.column(&column.name.text).is_some() {
                self.report(PlanError::DuplicateColumn {
                    table: table_name.clone(),
                    column: column.name.text.clone(),
                })?;
                continue;
            }
            let mut nullable = true;
            for constraint in &column.constraints {
                match constraint {
                    ColumnConstraint::NotNull => nullable = false,
                    ColumnConstraint::Nullable => nullable = true,
                    ColumnConstraint::PrimaryKey => {
                        key_declarations += 1;
                        if key_declarations == 1 {
                            shape.primary_key = vec![column.name.text.clone()];
                        }
                    }
                    ColumnConstraint::Unique => shape.unique.push(vec![column.name.text.clone()]),
                    ColumnConstraint::Check(expr) => checks.push(expr),
                }
            }
            shape.columns.push(ColumnShape {
                name: column.name.text.clone(),
                ty: TypeTag::from(&column.ty),
                nullable,
            });
        }

        for constraint in &table.constraints {
            match &constraint.kind {
                TableConstraintKind::PrimaryKey(columns) => {
                    key_declarations += 1;
                    if let Some(columns) = self.constraint_columns(&table_name, &shape, columns)? {
                        if key_declarations == 1 {
                            shape.primary_key = columns;
                        }
                    }
                }
                TableConstraintKind::Unique(columns) => {
                    if let Some(columns) = self.constraint_columns(&table_name, &shape, columns)? {
                        shape.unique.push(columns);
                    }
                }
                TableConstraintKind::Check(expr) => checks.push(expr),
            }
        }

        if key_declarations > 1 {
            self.report(PlanError::MultiplePrimaryKeys {
                table: table_name.clone(),
            })?;
        }

        for key in &shape.primary_key {
            if let Some(column) = shape.columns.iter_mut().find(|c| &c.name == key) {
                column.nullable = false;
            }
        }

        let frame: Vec<Binding> = shape.columns.iter().map(|c| Binding::new(c.name.clone())).collect();
        let root = Scope::empty();
        let scope = root.nested(&frame);
        for check in checks {
            shape.checks.push(self.lower_rex(check, &scope)?);
        }

        log::debug!(
            "Lowered CREATE TABLE {} with {} column(s)",
            shape.name,
            shape.columns.len()
        );
        Ok(shape)
    }

    /// Column names of a table constraint, or `None` if the constraint was
    /// rejected and skipped.
    fn constraint_columns(
        &mut self,
        table: &str,
        shape: &TableShape,
        columns: &[Symbol],
    ) -> PlanResult<Option<Vec<String>>> {
        let mut names: Vec<String> = Vec::with_capacity(columns.len());
        for symbol in columns {
            let Some(column) = shape.columns.iter().find(|c| symbol.matches(&c.name)) else {
                self.report(PlanError::UndeclaredConstraintColumn {
                    table: table.to_string(),
                    column: symbol.text.clone(),
                })?;
                return Ok(None);
            };
            if names.contains(&column.name) {
                self.report(PlanError::DuplicateConstraintColumn {
                    table: table.to_string(),
                    column: symbol.text.clone(),
                })?;
                return Ok(None);
            }
            names.push(column.name.clone());
        }
        Ok(Some(names))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::PlanConfig;
    use crate::env::BuiltinEnvironment;
    use crate::ir::rex::RexOp;
    use ql_ast::{BinaryOp, ColumnDefinition, DataType, Expr, Identifier, TableConstraint};

    fn column(name: &str, constraints: Vec<ColumnConstraint>) -> ColumnDefinition {
        ColumnDefinition {
            name: Symbol::regular(name),
            ty: DataType::Int4,
            constraints,
        }
    }

    fn table(columns: Vec<ColumnDefinition>, constraints: Vec<TableConstraintKind>) -> CreateTable {
        CreateTable {
            name: Identifier::regular("orders"),
            columns,
            constraints: constraints
                .into_iter()
                .map(|kind| TableConstraint { name: None, kind })
                .collect(),
        }
    }

    #[test]
    fn test_primary_key_columns_not_nullable() {
        let env = BuiltinEnvironment::new();
        let config = PlanConfig::default();
        let mut lowerer = Lowerer::new(&env, &config);
        let t = table(
            vec![column("id", vec![]), column("qty", vec![ColumnConstraint::NotNull])],
            vec![TableConstraintKind::PrimaryKey(vec![Symbol::regular("ID")])],
        );
        let shape = lowerer.lower_create_table(&t).unwrap();
        assert_eq!(shape.primary_key, vec!["id"]);
        assert!(!shape.column("id").unwrap().nullable);
        assert!(!shape.column("qty").unwrap().nullable);
    }

    #[test]
    fn test_two_primary_keys_rejected() {
        let env = BuiltinEnvironment::new();
        let config = PlanConfig::default();
        let mut lowerer = Lowerer::new(&env, &config);
        let t = table(
            vec![column("id", vec![ColumnConstraint::PrimaryKey]), column("qty", vec![])],
            vec![TableConstraintKind::PrimaryKey(vec![Symbol::regular("qty")])],
        );
        let err = lowerer.lower_create_table(&t).unwrap_err();
        assert_eq!(err.code(), "PL105");
    }

    #[test]
    fn test_constraint_column_checks() {
        let env = BuiltinEnvironment::new();
        let config = PlanConfig::default();

        let duplicate = table(
            vec![column("a", vec![]), column("b", vec![])],
            vec![TableConstraintKind::Unique(vec![
                Symbol::regular("a"),
                Symbol::regular("A"),
            ])],
        );
        let err = Lowerer::new(&env, &config)
            .lower_create_table(&duplicate)
            .unwrap_err();
        assert_eq!(err.code(), "PL107");

        let undeclared = table(
            vec![column("a", vec![])],
            vec![TableConstraintKind::Unique(vec![Symbol::regular("zz")])],
        );
        let err = Lowerer::new(&env, &config)
            .lower_create_table(&undeclared)
            .unwrap_err();
        assert_eq!(err.code(), "PL108");

        let twice = table(vec![column("a", vec![]), column("A", vec![])], vec![]);
        let err = Lowerer::new(&env, &config)
            .lower_create_table(&twice)
            .unwrap_err();
        assert_eq!(err.code(), "PL106");
    }

    #[test]
    fn test_collect_mode_skips_bad_constraint() {
        let env = BuiltinEnvironment::new();
        let config = PlanConfig::collecting();
        let mut lowerer = Lowerer::new(&env, &config);
        let t = table(
            vec![column("a", vec![]), column("b", vec![])],
            vec![
                TableConstraintKind::Unique(vec![Symbol::regular("missing")]),
                TableConstraintKind::Unique(vec![Symbol::regular("b")]),
            ],
        );
        let shape = lowerer.lower_create_table(&t).unwrap();
        assert_eq!(shape.unique, vec![vec!["b".to_string()]]);
        let lowered = lowerer.finish(super::super::Plan::CreateTable(shape));
        assert_eq!(lowered.diagnostics.len(), 1);
        assert_eq!(lowered.diagnostics[0].code, "PL108");
    }

    #[test]
    fn test_check_resolves_columns_by_position() {
        let env = BuiltinEnvironment::new();
        let config = PlanConfig::default();
        let mut lowerer = Lowerer::new(&env, &config);
        let t = table(
            vec![column("a", vec![]), column("b", vec![])],
            vec![TableConstraintKind::Check(Expr::binary(
                BinaryOp::Gt,
                Expr::var("b"),
                Expr::int(0),
            ))],
        );
        let shape = lowerer.lower_create_table(&t).unwrap();
        assert_eq!(shape.checks.len(), 1);
        match &shape.checks[0].op {
            RexOp::CallUnresolved { args, .. } => {
                assert_eq!(args[0].op, RexOp::VarLocal { depth: 0, offset: 1 });
            }
            other => panic!("Expected call, got {other:?}"),
        }
    }
}
