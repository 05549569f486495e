//! Reader registry for explicit dependency injection.
//!
//! The [`ReaderRegistry`] maps a dialect id to a constructor for its
//! [`ReaderSet`]. Unlike a growing if/else chain inside the facade, new
//! dialects are added by registering a factory; unknown dialects fall
//! back to the null-object readers.
//!
//! # Design Rationale
//!
//! - **No global state**: the registry is explicitly constructed and
//!   injected into the facade
//! - **Explicit registration**: clear, deterministic initialization order
//! - **Testable**: tests register factories for fake dialects

use std::collections::HashMap;

use crate::dialect::DialectId;
use crate::readers::{
    noop_readers, DriverIndexReader, MssqlConstraintReader, MssqlProcedureReader,
    MssqlSequenceReader, MssqlSynonymReader, MysqlConstraintReader, MysqlProcedureReader,
    NoopSequenceReader, NoopSynonymReader, OracleConstraintReader, OracleProcedureReader,
    OracleSequenceReader, OracleSynonymReader, PostgresConstraintReader, PostgresProcedureReader,
    PostgresSequenceReader,
};

use super::traits::ReaderSet;

/// Constructor for one dialect's reader set.
pub type ReaderFactory = fn() -> ReaderSet;

/// Registry of reader strategy constructors by dialect.
#[derive(Default)]
pub struct ReaderRegistry {
    factories: HashMap<DialectId, ReaderFactory>,
}

impl ReaderRegistry {
    /// Create a new empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a registry with the standard built-in dialect readers
    /// registered.
    pub fn with_builtins() -> Self {
        let mut registry = Self::new();

        registry.register(DialectId::Postgres, || ReaderSet {
            constraints: Box::new(PostgresConstraintReader),
            sequences: Box::new(PostgresSequenceReader),
            synonyms: Box::new(NoopSynonymReader),
            indexes: Box::new(DriverIndexReader),
            procedures: Box::new(PostgresProcedureReader),
        });

        registry.register(DialectId::Oracle, || ReaderSet {
            constraints: Box::new(OracleConstraintReader),
            sequences: Box::new(OracleSequenceReader),
            synonyms: Box::new(OracleSynonymReader),
            indexes: Box::new(DriverIndexReader),
            procedures: Box::new(OracleProcedureReader),
        });

        registry.register(DialectId::MySql, || ReaderSet {
            constraints: Box::new(MysqlConstraintReader),
            sequences: Box::new(NoopSequenceReader),
            synonyms: Box::new(NoopSynonymReader),
            indexes: Box::new(DriverIndexReader),
            procedures: Box::new(MysqlProcedureReader),
        });

        registry.register(DialectId::SqlServer, || ReaderSet {
            constraints: Box::new(MssqlConstraintReader),
            sequences: Box::new(MssqlSequenceReader),
            synonyms: Box::new(MssqlSynonymReader),
            indexes: Box::new(DriverIndexReader),
            procedures: Box::new(MssqlProcedureReader),
        });

        registry
    }

    /// Register a reader factory for a dialect.
    ///
    /// Replaces any previous registration for the same dialect.
    pub fn register(&mut self, dialect: DialectId, factory: ReaderFactory) {
        self.factories.insert(dialect, factory);
    }

    /// Build the reader set for a dialect, falling back to the
    /// null-object readers when nothing is registered.
    pub fn readers_for(&self, dialect: DialectId) -> ReaderSet {
        match self.factories.get(&dialect) {
            Some(factory) => factory(),
            None => noop_readers(),
        }
    }

    /// Check if a dialect has registered readers.
    pub fn has_dialect(&self, dialect: DialectId) -> bool {
        self.factories.contains_key(&dialect)
    }

    /// All registered dialect ids.
    pub fn dialect_ids(&self) -> Vec<DialectId> {
        let mut ids: Vec<DialectId> = self.factories.keys().copied().collect();
        ids.sort();
        ids
    }
}

impl std::fmt::Debug for ReaderRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ReaderRegistry")
            .field("dialects", &self.dialect_ids())
            .finish()
    }
}
