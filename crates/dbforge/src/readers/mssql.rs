//! SQL Server reader strategies.
//!
//! Catalog queries use the `sys` schema views.

use std::collections::HashMap;

use tracing::warn;

use crate::core::identifier::{IdentifierCase, TableIdentifier};
use crate::core::schema::{ProcedureDef, SequenceDef, SynonymDef, TableConstraint};
use crate::core::traits::{
    Connection, ConstraintReader, ProcedureReader, SequenceReader, SynonymReader,
};
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

/// Strip the bracket quoting SQL Server uses in object references.
fn strip_brackets(part: &str) -> &str {
    part.strip_prefix('[')
        .and_then(|p| p.strip_suffix(']'))
        .unwrap_or(part)
}

/// Check constraint reader backed by `sys.check_constraints`.
#[derive(Debug, Clone, Copy, Default)]
pub struct MssqlConstraintReader;

impl ConstraintReader for MssqlConstraintReader {
    fn column_constraints(
        &self,
        conn: &dyn Connection,
        table: &TableIdentifier,
    ) -> Result<HashMap<String, String>> {
        let schema = table.schema.as_deref().unwrap_or("dbo");
        let sql = format!(
            "SELECT col.name AS column_name, cc.definition \
             FROM sys.check_constraints cc \
             JOIN sys.tables t ON cc.parent_object_id = t.object_id \
             JOIN sys.schemas s ON t.schema_id = s.schema_id \
             JOIN sys.columns col \
               ON col.object_id = t.object_id AND col.column_id = cc.parent_column_id \
             WHERE cc.parent_column_id > 0 \
               AND s.name = '{}' AND t.name = '{}'",
            sql_literal(schema),
            sql_literal(&table.name)
        );

        let rows = run_degraded(conn, &sql, "mssql column constraints");
        let mut result = HashMap::new();
        for i in 0..rows.len() {
            if let (Some(col), Some(def)) = (rows.text(i, "column_name"), rows.text(i, "definition"))
            {
                result.insert(col.to_string(), format!("CHECK {}", def));
            }
        }
        Ok(result)
    }

    fn table_constraints(
        &self,
        conn: &dyn Connection,
        table: &TableIdentifier,
    ) -> Result<Vec<TableConstraint>> {
        let schema = table.schema.as_deref().unwrap_or("dbo");
        let sql = format!(
            "SELECT cc.name AS constraint_name, cc.definition \
             FROM sys.check_constraints cc \
             JOIN sys.tables t ON cc.parent_object_id = t.object_id \
             JOIN sys.schemas s ON t.schema_id = s.schema_id \
             WHERE cc.parent_column_id = 0 \
               AND s.name = '{}' AND t.name = '{}' \
             ORDER BY cc.name",
            sql_literal(schema),
            sql_literal(&table.name)
        );

        let rows = run_degraded(conn, &sql, "mssql table constraints");
        let mut result = Vec::with_capacity(rows.len());
        for i in 0..rows.len() {
            if let (Some(name), Some(def)) =
                (rows.text(i, "constraint_name"), rows.text(i, "definition"))
            {
                result.push(TableConstraint {
                    name: name.to_string(),
                    definition: format!("CHECK {}", def),
                });
            }
        }
        Ok(result)
    }
}

/// Sequence reader backed by `sys.sequences` (SQL Server 2012+).
#[derive(Debug, Clone, Copy, Default)]
pub struct MssqlSequenceReader;

impl SequenceReader for MssqlSequenceReader {
    fn sequences(&self, conn: &dyn Connection, schema: &str) -> Result<Vec<SequenceDef>> {
        let sql = format!(
            "SELECT s.name AS schema_name, sq.name AS sequence_name, \
                    CAST(sq.increment AS bigint) AS increment, \
                    CAST(sq.current_value AS bigint) AS current_value \
             FROM sys.sequences sq \
             JOIN sys.schemas s ON sq.schema_id = s.schema_id \
             WHERE s.name = '{}' \
             ORDER BY sq.name",
            sql_literal(schema)
        );

        let rows = run_degraded(conn, &sql, "mssql sequences");
        let mut result = Vec::with_capacity(rows.len());
        for i in 0..rows.len() {
            if let Some(name) = rows.text(i, "sequence_name") {
                result.push(SequenceDef {
                    schema: rows.text(i, "schema_name").map(str::to_string),
                    name: name.to_string(),
                    increment: rows
                        .value(i, "increment")
                        .and_then(|v| v.as_int())
                        .unwrap_or(1),
                    last_value: rows.value(i, "current_value").and_then(|v| v.as_int()),
                });
            }
        }
        Ok(result)
    }

    fn sequence_source(
        &self,
        conn: &dyn Connection,
        schema: Option<&str>,
        name: &str,
    ) -> Result<Option<String>> {
        let schema = schema.unwrap_or("dbo");
        let found = self.sequences(conn, schema)?;
        Ok(found.into_iter().find(|s| s.name == name).map(|s| {
            format!(
                "CREATE SEQUENCE [{}].[{}] INCREMENT BY {};",
                schema, s.name, s.increment
            )
        }))
    }
}

/// Synonym reader backed by `sys.synonyms`.
#[derive(Debug, Clone, Copy, Default)]
pub struct MssqlSynonymReader;

impl SynonymReader for MssqlSynonymReader {
    fn synonyms(&self, conn: &dyn Connection, schema: &str) -> Result<Vec<SynonymDef>> {
        let sql = format!(
            "SELECT s.name AS schema_name, sy.name AS synonym_name, sy.base_object_name \
             FROM sys.synonyms sy \
             JOIN sys.schemas s ON sy.schema_id = s.schema_id \
             WHERE s.name = '{}' \
             ORDER BY sy.name",
            sql_literal(schema)
        );

        let rows = run_degraded(conn, &sql, "mssql synonyms");
        let mut result = Vec::with_capacity(rows.len());
        for i in 0..rows.len() {
            let (name, base) = match (rows.text(i, "synonym_name"), rows.text(i, "base_object_name"))
            {
                (Some(n), Some(b)) => (n, b),
                _ => continue,
            };

            // base_object_name is a possibly catalog-qualified reference
            // like [db].[dbo].[orders]; the last two parts identify the
            // target.
            let parts: Vec<&str> = base.split('.').map(strip_brackets).collect();
            let target = match parts.as_slice() {
                [name] => TableIdentifier::new(None, None, name, IdentifierCase::Mixed),
                [schema, name] => {
                    TableIdentifier::new(None, Some(schema), name, IdentifierCase::Mixed)
                }
                [catalog, schema, name] => {
                    TableIdentifier::new(Some(catalog), Some(schema), name, IdentifierCase::Mixed)
                }
                _ => continue,
            };

            result.push(SynonymDef {
                schema: rows.text(i, "schema_name").map(str::to_string),
                name: name.to_string(),
                target,
            });
        }
        Ok(result)
    }

    fn synonym_target(
        &self,
        conn: &dyn Connection,
        schema: Option<&str>,
        name: &str,
    ) -> Result<Option<TableIdentifier>> {
        let schema = schema.unwrap_or("dbo");
        let found = self.synonyms(conn, schema)?;
        Ok(found.into_iter().find(|s| s.name == name).map(|s| s.target))
    }
}

/// Procedure reader backed by `sys.procedures`.
#[derive(Debug, Clone, Copy, Default)]
pub struct MssqlProcedureReader;

impl ProcedureReader for MssqlProcedureReader {
    fn procedures(&self, conn: &dyn Connection, schema: &str) -> Result<Vec<ProcedureDef>> {
        let sql = format!(
            "SELECT s.name AS schema_name, p.name AS procedure_name \
             FROM sys.procedures p \
             JOIN sys.schemas s ON p.schema_id = s.schema_id \
             WHERE s.name = '{}' \
             ORDER BY p.name",
            sql_literal(schema)
        );

        let rows = run_degraded(conn, &sql, "mssql procedures");
        let mut result = Vec::with_capacity(rows.len());
        for i in 0..rows.len() {
            if let Some(name) = rows.text(i, "procedure_name") {
                result.push(ProcedureDef {
                    schema: rows.text(i, "schema_name").map(str::to_string),
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
        let schema = schema.unwrap_or("dbo");
        let sql = format!(
            "SELECT OBJECT_DEFINITION(OBJECT_ID('[{}].[{}]')) AS definition",
            sql_literal(schema),
            sql_literal(name)
        );

        let rows = run_degraded(conn, &sql, "mssql procedure source");
        Ok(rows.text(0, "definition").map(str::to_string))
    }
}
