//! # dbforge
//!
//! Cross-dialect database metadata abstraction and DDL script synthesis.
//!
//! This library normalizes the differences between relational database
//! products into a uniform object model and re-emits dialect-correct SQL:
//!
//! - **Metadata facade** over a caller-supplied connection capability
//!   trait (tables, columns, indexes, foreign keys, triggers, sequences,
//!   synonyms, procedures)
//! - **DDL synthesis** for CREATE/ALTER/DROP scripts, constraints,
//!   indexes, comments, and grants, driven by per-dialect statement
//!   templates
//! - **Dependency-aware DELETE scripts** ordered along the foreign key
//!   graph
//! - **Schema object cache** for interactive name completion
//!
//! The engine is synchronous; wire-level connectivity stays in the
//! caller's driver layer behind the [`Connection`] trait.
//!
//! ## Example
//!
//! ```rust,ignore
//! use std::sync::Arc;
//! use dbforge::{DbMetadata, GeneratorOptions, ReaderRegistry, TemplateStore};
//!
//! let templates = TemplateStore::builtin();
//! let registry = ReaderRegistry::with_builtins();
//! let meta = DbMetadata::new(Arc::new(my_connection), &registry, &templates);
//!
//! let table = meta.table_id(Some("public"), "orders");
//! let script = meta.table_script(&table, &GeneratorOptions::default());
//! println!("{script}");
//! ```

pub mod cache;
pub mod config;
pub mod core;
pub mod ddl;
pub mod dialect;
pub mod error;
pub mod exec;
pub mod meta;
pub mod readers;
pub mod templates;

// Re-exports for convenient access
pub use cache::SchemaObjectCache;
pub use config::GeneratorOptions;
pub use crate::core::{
    ColumnDef, Connection, ForeignKeyDef, ForeignKeyRow, IdentifierCase, IndexDef, KeyValue,
    ObjectType, ReaderRegistry, ReaderSet, ResultRows, SqlValue, TableDefinition, TableIdentifier,
};
pub use ddl::{ColumnChangePlanner, DeleteScriptGenerator, DependencyNode, TableScriptBuilder};
pub use dialect::{Dialect, DialectId};
pub use error::{ForgeError, Result};
pub use exec::{ExecutionReport, ScriptExecutor};
pub use meta::DbMetadata;
pub use templates::{StatementTemplate, TemplateKind, TemplateStore};
