//! Per-dialect reader strategies.
//!
//! Each concern (constraints, sequences, synonyms, indexes, procedures)
//! has its own one-capability trait in [`crate::core::traits`]; this
//! module provides the implementations. Dialects without native support
//! for a concern get the null-object readers, which return empty results
//! so callers never special-case missing capabilities.
//!
//! Dialect readers issue catalog SQL through [`Connection::query`] and
//! degrade to empty results on failure, logging the error.
//!
//! [`Connection::query`]: crate::core::traits::Connection::query

mod mssql;
mod mysql;
mod oracle;
mod postgres;

pub use mssql::{MssqlConstraintReader, MssqlProcedureReader, MssqlSequenceReader, MssqlSynonymReader};
pub use mysql::{MysqlConstraintReader, MysqlProcedureReader};
pub use oracle::{
    OracleConstraintReader, OracleProcedureReader, OracleSequenceReader, OracleSynonymReader,
};
pub use postgres::{PostgresConstraintReader, PostgresProcedureReader, PostgresSequenceReader};

use std::collections::HashMap;

use crate::core::identifier::TableIdentifier;
use crate::core::schema::{ProcedureDef, SequenceDef, SynonymDef, TableConstraint};
use crate::core::traits::{
    Connection, ConstraintReader, IndexReader, ProcedureReader, ReaderSet, SequenceReader,
    SynonymReader,
};
use crate::error::Result;

/// Escape a string for embedding in a single-quoted SQL literal.
pub(crate) fn sql_literal(value: &str) -> String {
    value.replace('\'', "''")
}

/// Null-object constraint reader: no native constraint support.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoopConstraintReader;

impl ConstraintReader for NoopConstraintReader {
    fn column_constraints(
        &self,
        _conn: &dyn Connection,
        _table: &TableIdentifier,
    ) -> Result<HashMap<String, String>> {
        Ok(HashMap::new())
    }

    fn table_constraints(
        &self,
        _conn: &dyn Connection,
        _table: &TableIdentifier,
    ) -> Result<Vec<TableConstraint>> {
        Ok(Vec::new())
    }
}

/// Null-object sequence reader: no native sequences.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoopSequenceReader;

impl SequenceReader for NoopSequenceReader {
    fn sequences(&self, _conn: &dyn Connection, _schema: &str) -> Result<Vec<SequenceDef>> {
        Ok(Vec::new())
    }

    fn sequence_source(
        &self,
        _conn: &dyn Connection,
        _schema: Option<&str>,
        _name: &str,
    ) -> Result<Option<String>> {
        Ok(None)
    }
}

/// Null-object synonym reader: no native synonyms.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoopSynonymReader;

impl SynonymReader for NoopSynonymReader {
    fn synonyms(&self, _conn: &dyn Connection, _schema: &str) -> Result<Vec<SynonymDef>> {
        Ok(Vec::new())
    }

    fn synonym_target(
        &self,
        _conn: &dyn Connection,
        _schema: Option<&str>,
        _name: &str,
    ) -> Result<Option<TableIdentifier>> {
        Ok(None)
    }
}

/// Default index reader: delegates to the standard driver call.
#[derive(Debug, Clone, Copy, Default)]
pub struct DriverIndexReader;

impl IndexReader for DriverIndexReader {}

/// Null-object procedure reader: no stored procedure support.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoopProcedureReader;

impl ProcedureReader for NoopProcedureReader {
    fn procedures(&self, _conn: &dyn Connection, _schema: &str) -> Result<Vec<ProcedureDef>> {
        Ok(Vec::new())
    }

    fn procedure_source(
        &self,
        _conn: &dyn Connection,
        _schema: Option<&str>,
        _name: &str,
    ) -> Result<Option<String>> {
        Ok(None)
    }
}

/// The all-no-op reader set used for unknown dialects.
pub fn noop_readers() -> ReaderSet {
    ReaderSet {
        constraints: Box::new(NoopConstraintReader),
        sequences: Box::new(NoopSequenceReader),
        synonyms: Box::new(NoopSynonymReader),
        indexes: Box::new(DriverIndexReader),
        procedures: Box::new(NoopProcedureReader),
    }
}
