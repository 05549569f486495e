//! Core abstractions for database-agnostic metadata access.
//!
//! This module provides the foundational types and traits used throughout
//! the engine:
//!
//! - [`identifier`]: case-normalized table identifiers
//! - [`schema`]: column, index, constraint, and key metadata types
//! - [`value`]: scalar values and tabular introspection results
//! - [`traits`]: the connection capability trait and reader strategies
//! - [`registry`]: reader registration table for dependency injection
//!
//! # Design Patterns
//!
//! - **Strategy**: readers provide interchangeable per-dialect algorithms
//! - **Null Object**: missing dialect capabilities resolve to empty-result
//!   readers instead of error paths
//! - **Registry**: reader selection happens through a registration table,
//!   not a conditional chain in the facade

pub mod identifier;
pub mod registry;
pub mod schema;
pub mod traits;
pub mod value;

// Re-export commonly used types for convenience
pub use identifier::{validate_identifier, IdentifierCase, ObjectType, TableIdentifier};
pub use registry::{ReaderFactory, ReaderRegistry};
pub use schema::{
    ColumnDef, ForeignKeyDef, ForeignKeyRow, IndexDef, KeyValue, ProcedureDef, SequenceDef,
    SynonymDef, TableConstraint, TableDefinition, TableGrant, TriggerDef,
};
pub use traits::{
    Connection, ConstraintReader, IndexReader, ProcedureReader, ReaderSet, SequenceReader,
    SynonymReader,
};
pub use value::{ResultRows, SqlValue};
