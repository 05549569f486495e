//! MySQL / MariaDB reader strategies.
//!
//! MySQL has no sequences or synonyms, so only constraints and procedures
//! get dialect readers; the registry fills the rest with null objects.

use std::collections::HashMap;

use tracing::warn;

use crate::core::identifier::TableIdentifier;
use crate::core::schema::{ProcedureDef, TableConstraint};
use crate::core::traits::{Connection, ConstraintReader, ProcedureReader};
use crate::core::value::ResultRows;
use crate::error::Result;

use super::sql_literal;

fn run_degraded(conn: &dyn Connection, sql: &str, context: &str) -> ResultRows {
    match conn.query(sql) {
        Ok(rows) => rows,
        Err(e) => {
            warn!("{} query failed, returning empty result: {}", context, e);
            ResultRows::default()
        }
    }
}

/// Check constraint reader backed by `information_schema.check_constraints`
/// (MySQL 8.0.16+; earlier servers simply return no rows).
#[derive(Debug, Clone, Copy, Default)]
pub struct MysqlConstraintReader;

impl ConstraintReader for MysqlConstraintReader {
    fn column_constraints(
        &self,
        _conn: &dyn Connection,
        _table: &TableIdentifier,
    ) -> Result<HashMap<String, String>> {
        // MySQL does not associate check constraints with single columns
        // in its information schema; all checks surface as table-level.
        Ok(HashMap::new())
    }

    fn table_constraints(
        &self,
        conn: &dyn Connection,
        table: &TableIdentifier,
    ) -> Result<Vec<TableConstraint>> {
        let schema = table.schema.as_deref().unwrap_or_default();
        let sql = format!(
            "SELECT cc.constraint_name, cc.check_clause \
             FROM information_schema.check_constraints cc \
             JOIN information_schema.table_constraints tc \
               ON tc.constraint_schema = cc.constraint_schema \
              AND tc.constraint_name = cc.constraint_name \
             WHERE tc.table_schema = '{}' AND tc.table_name = '{}' \
             ORDER BY cc.constraint_name",
            sql_literal(schema),
            sql_literal(&table.name)
        );

        let rows = run_degraded(conn, &sql, "mysql table constraints");
        let mut result = Vec::with_capacity(rows.len());
        for i in 0..rows.len() {
            if let (Some(name), Some(clause)) =
                (rows.text(i, "constraint_name"), rows.text(i, "check_clause"))
            {
                result.push(TableConstraint {
                    name: name.to_string(),
                    definition: format!("CHECK ({})", clause),
                });
            }
        }
        Ok(result)
    }
}

/// Procedure reader backed by `information_schema.routines`.
#[derive(Debug, Clone, Copy, Default)]
pub struct MysqlProcedureReader;

impl ProcedureReader for MysqlProcedureReader {
    fn procedures(&self, conn: &dyn Connection, schema: &str) -> Result<Vec<ProcedureDef>> {
        let sql = format!(
            "SELECT routine_schema, routine_name \
             FROM information_schema.routines \
             WHERE routine_schema = '{}' AND routine_type = 'PROCEDURE' \
             ORDER BY routine_name",
            sql_literal(schema)
        );

        let rows = run_degraded(conn, &sql, "mysql procedures");
        let mut result = Vec::with_capacity(rows.len());
        for i in 0..rows.len() {
            if let Some(name) = rows.text(i, "routine_name") {
                result.push(ProcedureDef {
                    schema: rows.text(i, "routine_schema").map(str::to_string),
                    name: name.to_string(),
                });
            }
        }
        Ok(result)
    }

    fn procedure_source(
        &self,
        conn: &dyn Connection,
        schema: Option<&str>,
        name: &str,
    ) -> Result<Option<String>> {
        let schema = schema.unwrap_or_default();
        let sql = format!(
            "SELECT routine_definition \
             FROM information_schema.routines \
             WHERE routine_schema = '{}' AND routine_name = '{}'",
            sql_literal(schema),
            sql_literal(name)
        );

        let rows = run_degraded(conn, &sql, "mysql procedure source");
        Ok(rows.text(0, "routine_definition").map(str::to_string))
    }
}
