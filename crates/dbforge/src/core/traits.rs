//! Core traits for database-agnostic metadata access.
//!
//! This module defines the primary abstractions used by the engine:
//!
//! - [`Connection`]: the capability provider supplied by the caller's
//!   driver layer (product identity, quoting rules, raw introspection)
//! - One reader trait per dialect-specific concern: [`ConstraintReader`],
//!   [`SequenceReader`], [`SynonymReader`], [`IndexReader`],
//!   [`ProcedureReader`]
//!
//! # Design Patterns
//!
//! - **Strategy**: readers provide interchangeable per-dialect algorithms
//! - **Null Object**: every reader has a no-op implementation for dialects
//!   without native support
//! - **Template Method**: default trait methods define common fallbacks
//!   (e.g. index retrieval through the driver call)

use std::collections::HashMap;

use crate::error::Result;

use super::identifier::{IdentifierCase, ObjectType, TableIdentifier};
use super::schema::{
    ColumnDef, ForeignKeyRow, IndexDef, ProcedureDef, SequenceDef, SynonymDef, TableConstraint,
    TableGrant, TriggerDef,
};
use super::value::ResultRows;

/// Capability provider for one database connection.
///
/// Implemented by the caller's driver layer. All calls are synchronous and
/// block on the underlying driver; the engine adds no scheduler of its own.
///
/// Metadata calls return rows in driver order; the engine re-sorts where a
/// documented ordering is required. Implementations should translate driver
/// failures into [`ForgeError`](crate::error::ForgeError) values rather
/// than panicking.
pub trait Connection: Send + Sync {
    // ===== Capability queries =====

    /// Database product name as reported by the driver
    /// (e.g. "PostgreSQL", "Microsoft SQL Server").
    fn product_name(&self) -> String;

    /// Product version string.
    fn product_version(&self) -> String;

    /// The identifier quote character the product uses.
    fn quote_char(&self) -> char {
        '"'
    }

    /// Reserved words for the product, beyond the SQL standard set.
    fn reserved_words(&self) -> Vec<String> {
        Vec::new()
    }

    /// Case-folding behavior for unquoted identifiers.
    fn stored_case(&self) -> IdentifierCase {
        IdentifierCase::Mixed
    }

    // ===== Standard introspection =====

    /// List catalog names.
    fn catalogs(&self) -> Result<Vec<String>>;

    /// List schema names.
    fn schemas(&self) -> Result<Vec<String>>;

    /// List tables matching the given filters.
    ///
    /// `name_pattern` uses SQL LIKE syntax (`%`/`_`); `None` matches all.
    /// An empty `types` slice matches every object type.
    fn tables(
        &self,
        catalog: Option<&str>,
        schema: Option<&str>,
        name_pattern: Option<&str>,
        types: &[ObjectType],
    ) -> Result<Vec<TableIdentifier>>;

    /// Columns of a table in ordinal order. The primary-key flag may be
    /// left unset; the facade merges [`primary_key`](Self::primary_key)
    /// results in.
    fn columns(&self, table: &TableIdentifier) -> Result<Vec<ColumnDef>>;

    /// Primary key column names of a table, in key order.
    fn primary_key(&self, table: &TableIdentifier) -> Result<Vec<String>>;

    /// Indexes on a table.
    fn indexes(&self, table: &TableIdentifier) -> Result<Vec<IndexDef>>;

    /// Foreign keys declared on this table, one row per
    /// (constraint, column, referenced column).
    fn imported_keys(&self, table: &TableIdentifier) -> Result<Vec<ForeignKeyRow>>;

    /// Foreign keys in other tables that reference this table, one row per
    /// (constraint, column, referenced column).
    fn exported_keys(&self, table: &TableIdentifier) -> Result<Vec<ForeignKeyRow>>;

    /// Triggers defined on a table.
    fn triggers(&self, table: &TableIdentifier) -> Result<Vec<TriggerDef>>;

    /// Source text of a view, when available.
    fn view_source(&self, view: &TableIdentifier) -> Result<Option<String>>;

    /// Grants on a table, one row per (grantee, privilege).
    fn table_grants(&self, table: &TableIdentifier) -> Result<Vec<TableGrant>>;

    // ===== Raw access for dialect readers and the executor =====

    /// Run a catalog query and return its tabular result.
    fn query(&self, sql: &str) -> Result<ResultRows>;

    /// Execute a statement, returning the affected row count.
    fn execute(&self, sql: &str) -> Result<u64>;

    /// Begin an explicit transaction. Default: no-op for autocommit
    /// drivers.
    fn begin(&self) -> Result<()> {
        Ok(())
    }

    /// Commit the current transaction. Default: no-op.
    fn commit(&self) -> Result<()> {
        Ok(())
    }

    /// Roll back the current transaction. Default: no-op.
    fn rollback(&self) -> Result<()> {
        Ok(())
    }

    /// Best-effort interrupt of the statement currently in flight.
    /// Default: no-op for drivers without cancel support.
    fn cancel(&self) {}
}

/// Reads constraint metadata a dialect exposes beyond the standard calls.
pub trait ConstraintReader: Send + Sync {
    /// Column-level constraint fragments keyed by column name
    /// (e.g. `{"status": "CHECK (status IN ('a','b'))"}`).
    fn column_constraints(
        &self,
        conn: &dyn Connection,
        table: &TableIdentifier,
    ) -> Result<HashMap<String, String>>;

    /// Named table-level constraints.
    fn table_constraints(
        &self,
        conn: &dyn Connection,
        table: &TableIdentifier,
    ) -> Result<Vec<TableConstraint>>;
}

/// Reads sequence metadata for dialects with native sequences.
pub trait SequenceReader: Send + Sync {
    /// Sequences in a schema.
    fn sequences(&self, conn: &dyn Connection, schema: &str) -> Result<Vec<SequenceDef>>;

    /// Reconstructed CREATE SEQUENCE source, when supported.
    fn sequence_source(
        &self,
        conn: &dyn Connection,
        schema: Option<&str>,
        name: &str,
    ) -> Result<Option<String>>;
}

/// Reads synonym (alias) metadata for dialects that support them.
pub trait SynonymReader: Send + Sync {
    /// Synonyms in a schema.
    fn synonyms(&self, conn: &dyn Connection, schema: &str) -> Result<Vec<SynonymDef>>;

    /// Resolve a synonym to the object it points at.
    fn synonym_target(
        &self,
        conn: &dyn Connection,
        schema: Option<&str>,
        name: &str,
    ) -> Result<Option<TableIdentifier>>;
}

/// Reads index metadata; the default goes through the standard driver call.
pub trait IndexReader: Send + Sync {
    /// Indexes on a table.
    fn indexes(&self, conn: &dyn Connection, table: &TableIdentifier) -> Result<Vec<IndexDef>> {
        conn.indexes(table)
    }
}

/// Reads stored procedure metadata.
pub trait ProcedureReader: Send + Sync {
    /// Procedures in a schema.
    fn procedures(&self, conn: &dyn Connection, schema: &str) -> Result<Vec<ProcedureDef>>;

    /// Procedure source text, when the dialect stores it.
    fn procedure_source(
        &self,
        conn: &dyn Connection,
        schema: Option<&str>,
        name: &str,
    ) -> Result<Option<String>>;
}

/// The per-connection bundle of reader strategies, selected once at
/// connect time by the [`ReaderRegistry`](crate::core::registry::ReaderRegistry).
pub struct ReaderSet {
    pub constraints: Box<dyn ConstraintReader>,
    pub sequences: Box<dyn SequenceReader>,
    pub synonyms: Box<dyn SynonymReader>,
    pub indexes: Box<dyn IndexReader>,
    pub procedures: Box<dyn ProcedureReader>,
}

impl std::fmt::Debug for ReaderSet {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ReaderSet").finish_non_exhaustive()
    }
}
