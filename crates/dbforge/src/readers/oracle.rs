//! Oracle reader strategies.
//!
//! Catalog queries use the `ALL_*` data dictionary views. Oracle stores
//! unquoted identifiers upper-case, so lookups fold names before
//! filtering.

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

/// Check constraint reader backed by `ALL_CONSTRAINTS`.
#[derive(Debug, Clone, Copy, Default)]
pub struct OracleConstraintReader;

impl ConstraintReader for OracleConstraintReader {
    fn column_constraints(
        &self,
        conn: &dyn Connection,
        table: &TableIdentifier,
    ) -> Result<HashMap<String, String>> {
        let owner = table.schema.as_deref().unwrap_or_default();
        let sql = format!(
            "SELECT cc.column_name, c.search_condition \
             FROM all_constraints c \
             JOIN all_cons_columns cc \
               ON cc.owner = c.owner AND cc.constraint_name = c.constraint_name \
             WHERE c.constraint_type = 'C' \
               AND c.owner = '{}' AND c.table_name = '{}'",
            sql_literal(owner),
            sql_literal(&table.name)
        );

        let rows = run_degraded(conn, &sql, "oracle column constraints");
        let mut result = HashMap::new();
        for i in 0..rows.len() {
            if let (Some(col), Some(cond)) =
                (rows.text(i, "column_name"), rows.text(i, "search_condition"))
            {
                // NOT NULL checks are reported through column metadata
                // already; skip the generated "IS NOT NULL" conditions.
                if cond.to_uppercase().ends_with("IS NOT NULL") {
                    continue;
                }
                result.insert(col.to_string(), format!("CHECK ({})", cond));
            }
        }
        Ok(result)
    }

    fn table_constraints(
        &self,
        conn: &dyn Connection,
        table: &TableIdentifier,
    ) -> Result<Vec<TableConstraint>> {
        let owner = table.schema.as_deref().unwrap_or_default();
        let sql = format!(
            "SELECT constraint_name, search_condition \
             FROM all_constraints \
             WHERE constraint_type = 'C' \
               AND owner = '{}' AND table_name = '{}' \
             ORDER BY constraint_name",
            sql_literal(owner),
            sql_literal(&table.name)
        );

        let rows = run_degraded(conn, &sql, "oracle table constraints");
        let mut result = Vec::with_capacity(rows.len());
        for i in 0..rows.len() {
            if let (Some(name), Some(cond)) = (
                rows.text(i, "constraint_name"),
                rows.text(i, "search_condition"),
            ) {
                if cond.to_uppercase().ends_with("IS NOT NULL") {
                    continue;
                }
                result.push(TableConstraint {
                    name: name.to_string(),
                    definition: format!("CHECK ({})", cond),
                });
            }
        }
        Ok(result)
    }
}

/// Sequence reader backed by `ALL_SEQUENCES`.
#[derive(Debug, Clone, Copy, Default)]
pub struct OracleSequenceReader;

impl SequenceReader for OracleSequenceReader {
    fn sequences(&self, conn: &dyn Connection, schema: &str) -> Result<Vec<SequenceDef>> {
        let sql = format!(
            "SELECT sequence_owner, sequence_name, increment_by, last_number \
             FROM all_sequences \
             WHERE sequence_owner = '{}' \
             ORDER BY sequence_name",
            sql_literal(schema)
        );

        let rows = run_degraded(conn, &sql, "oracle sequences");
        let mut result = Vec::with_capacity(rows.len());
        for i in 0..rows.len() {
            if let Some(name) = rows.text(i, "sequence_name") {
                result.push(SequenceDef {
                    schema: rows.text(i, "sequence_owner").map(str::to_string),
                    name: name.to_string(),
                    increment: rows
                        .value(i, "increment_by")
                        .and_then(|v| v.as_int())
                        .unwrap_or(1),
                    last_value: rows.value(i, "last_number").and_then(|v| v.as_int()),
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
        let schema = schema.unwrap_or_default();
        let found = self.sequences(conn, schema)?;
        Ok(found.into_iter().find(|s| s.name == name).map(|s| {
            let mut source = format!("CREATE SEQUENCE {}.{}", schema, s.name);
            source.push_str(&format!(" INCREMENT BY {}", s.increment));
            if let Some(last) = s.last_value {
                source.push_str(&format!(" START WITH {}", last));
            }
            source.push(';');
            source
        }))
    }
}

/// Synonym reader backed by `ALL_SYNONYMS`.
#[derive(Debug, Clone, Copy, Default)]
pub struct OracleSynonymReader;

impl SynonymReader for OracleSynonymReader {
    fn synonyms(&self, conn: &dyn Connection, schema: &str) -> Result<Vec<SynonymDef>> {
        let sql = format!(
            "SELECT owner, synonym_name, table_owner, table_name \
             FROM all_synonyms \
             WHERE owner = '{}' \
             ORDER BY synonym_name",
            sql_literal(schema)
        );

        let rows = run_degraded(conn, &sql, "oracle synonyms");
        let mut result = Vec::with_capacity(rows.len());
        for i in 0..rows.len() {
            if let (Some(name), Some(target)) =
                (rows.text(i, "synonym_name"), rows.text(i, "table_name"))
            {
                result.push(SynonymDef {
                    schema: rows.text(i, "owner").map(str::to_string),
                    name: name.to_string(),
                    target: TableIdentifier::new(
                        None,
                        rows.text(i, "table_owner"),
                        target,
                        IdentifierCase::Upper,
                    ),
                });
            }
        }
        Ok(result)
    }

    fn synonym_target(
        &self,
        conn: &dyn Connection,
        schema: Option<&str>,
        name: &str,
    ) -> Result<Option<TableIdentifier>> {
        let schema = schema.unwrap_or("PUBLIC");
        let found = self.synonyms(conn, schema)?;
        Ok(found.into_iter().find(|s| s.name == name).map(|s| s.target))
    }
}

/// Procedure reader backed by `ALL_PROCEDURES` and `ALL_SOURCE`.
#[derive(Debug, Clone, Copy, Default)]
pub struct OracleProcedureReader;

impl ProcedureReader for OracleProcedureReader {
    fn procedures(&self, conn: &dyn Connection, schema: &str) -> Result<Vec<ProcedureDef>> {
        let sql = format!(
            "SELECT owner, object_name \
             FROM all_procedures \
             WHERE owner = '{}' AND object_type = 'PROCEDURE' \
             ORDER BY object_name",
            sql_literal(schema)
        );

        let rows = run_degraded(conn, &sql, "oracle procedures");
        let mut result = Vec::with_capacity(rows.len());
        for i in 0..rows.len() {
            if let Some(name) = rows.text(i, "object_name") {
                result.push(ProcedureDef {
                    schema: rows.text(i, "owner").map(str::to_string),
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
            "SELECT text FROM all_source \
             WHERE owner = '{}' AND name = '{}' AND type = 'PROCEDURE' \
             ORDER BY line",
            sql_literal(schema),
            sql_literal(name)
        );

        let rows = run_degraded(conn, &sql, "oracle procedure source");
        if rows.is_empty() {
            return Ok(None);
        }

        let mut source = String::new();
        for i in 0..rows.len() {
            if let Some(line) = rows.text(i, "text") {
                source.push_str(line);
            }
        }
        Ok(Some(source))
    }
}
