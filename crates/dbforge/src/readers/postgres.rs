//! PostgreSQL reader strategies.
//!
//! Catalog queries follow the `pg_catalog` system views; every reader
//! degrades to an empty result on failure.

use std::collections::HashMap;

use tracing::warn;

use crate::core::identifier::TableIdentifier;
use crate::core::schema::{ProcedureDef, SequenceDef, TableConstraint};
use crate::core::traits::{Connection, ConstraintReader, ProcedureReader, SequenceReader};
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

/// Check constraint reader backed by `pg_constraint`.
#[derive(Debug, Clone, Copy, Default)]
pub struct PostgresConstraintReader;

impl ConstraintReader for PostgresConstraintReader {
    fn column_constraints(
        &self,
        conn: &dyn Connection,
        table: &TableIdentifier,
    ) -> Result<HashMap<String, String>> {
        let schema = table.schema.as_deref().unwrap_or("public");
        let sql = format!(
            "SELECT a.attname AS column_name, \
                    pg_get_constraintdef(con.oid) AS definition \
             FROM pg_catalog.pg_constraint con \
             JOIN pg_catalog.pg_class t ON t.oid = con.conrelid \
             JOIN pg_catalog.pg_namespace n ON n.oid = t.relnamespace \
             JOIN pg_catalog.pg_attribute a \
               ON a.attrelid = t.oid AND a.attnum = ANY(con.conkey) \
             WHERE con.contype = 'c' \
               AND array_length(con.conkey, 1) = 1 \
               AND n.nspname = '{}' AND t.relname = '{}'",
            sql_literal(schema),
            sql_literal(&table.name)
        );

        let rows = run_degraded(conn, &sql, "pg column constraints");
        let mut result = HashMap::new();
        for i in 0..rows.len() {
            if let (Some(col), Some(def)) = (rows.text(i, "column_name"), rows.text(i, "definition"))
            {
                result.insert(col.to_string(), def.to_string());
            }
        }
        Ok(result)
    }

    fn table_constraints(
        &self,
        conn: &dyn Connection,
        table: &TableIdentifier,
    ) -> Result<Vec<TableConstraint>> {
        let schema = table.schema.as_deref().unwrap_or("public");
        let sql = format!(
            "SELECT con.conname AS constraint_name, \
                    pg_get_constraintdef(con.oid) AS definition \
             FROM pg_catalog.pg_constraint con \
             JOIN pg_catalog.pg_class t ON t.oid = con.conrelid \
             JOIN pg_catalog.pg_namespace n ON n.oid = t.relnamespace \
             WHERE con.contype = 'c' \
               AND n.nspname = '{}' AND t.relname = '{}' \
             ORDER BY con.conname",
            sql_literal(schema),
            sql_literal(&table.name)
        );

        let rows = run_degraded(conn, &sql, "pg table constraints");
        let mut result = Vec::with_capacity(rows.len());
        for i in 0..rows.len() {
            if let (Some(name), Some(def)) =
                (rows.text(i, "constraint_name"), rows.text(i, "definition"))
            {
                result.push(TableConstraint {
                    name: name.to_string(),
                    definition: def.to_string(),
                });
            }
        }
        Ok(result)
    }
}

/// Sequence reader backed by `pg_sequences`.
#[derive(Debug, Clone, Copy, Default)]
pub struct PostgresSequenceReader;

impl SequenceReader for PostgresSequenceReader {
    fn sequences(&self, conn: &dyn Connection, schema: &str) -> Result<Vec<SequenceDef>> {
        let sql = format!(
            "SELECT schemaname, sequencename, increment_by, last_value \
             FROM pg_catalog.pg_sequences \
             WHERE schemaname = '{}' \
             ORDER BY sequencename",
            sql_literal(schema)
        );

        let rows = run_degraded(conn, &sql, "pg sequences");
        let mut result = Vec::with_capacity(rows.len());
        for i in 0..rows.len() {
            if let Some(name) = rows.text(i, "sequencename") {
                result.push(SequenceDef {
                    schema: rows.text(i, "schemaname").map(str::to_string),
                    name: name.to_string(),
                    increment: rows
                        .value(i, "increment_by")
                        .and_then(|v| v.as_int())
                        .unwrap_or(1),
                    last_value: rows.value(i, "last_value").and_then(|v| v.as_int()),
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
        let schema = schema.unwrap_or("public");
        let found = self.sequences(conn, schema)?;
        Ok(found.into_iter().find(|s| s.name == name).map(|s| {
            format!(
                "CREATE SEQUENCE {}.{} INCREMENT BY {};",
                schema, s.name, s.increment
            )
        }))
    }
}

/// Procedure reader backed by `pg_proc`.
#[derive(Debug, Clone, Copy, Default)]
pub struct PostgresProcedureReader;

impl ProcedureReader for PostgresProcedureReader {
    fn procedures(&self, conn: &dyn Connection, schema: &str) -> Result<Vec<ProcedureDef>> {
        let sql = format!(
            "SELECT n.nspname AS schema_name, p.proname AS procedure_name \
             FROM pg_catalog.pg_proc p \
             JOIN pg_catalog.pg_namespace n ON n.oid = p.pronamespace \
             WHERE n.nspname = '{}' \
             ORDER BY p.proname",
            sql_literal(schema)
        );

        let rows = run_degraded(conn, &sql, "pg procedures");
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
        let schema = schema.unwrap_or("public");
        let sql = format!(
            "SELECT pg_get_functiondef(p.oid) AS definition \
             FROM pg_catalog.pg_proc p \
             JOIN pg_catalog.pg_namespace n ON n.oid = p.pronamespace \
             WHERE n.nspname = '{}' AND p.proname = '{}'",
            sql_literal(schema),
            sql_literal(name)
        );

        let rows = run_degraded(conn, &sql, "pg procedure source");
        Ok(rows.text(0, "definition").map(str::to_string))
    }
}
