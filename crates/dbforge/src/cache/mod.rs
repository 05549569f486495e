//! Per-connection schema object cache for interactive name completion.
//!
//! The cache is populated lazily from the same introspection calls the
//! facade uses. A miss on a schema triggers one bulk table-list retrieval
//! that seeds every table entry for that schema with *unloaded* columns; a
//! miss on a table's column list triggers exactly one table-definition
//! retrieval. `None` ("not yet loaded") and `Some(vec![])` ("loaded, zero
//! columns") are distinct states and never conflated.
//!
//! One coarse mutex serializes all mutation; distinct connections own
//! distinct caches. Population races resolve last-write-wins, which is
//! safe because a re-fetch is cheap and idempotent. Population failures
//! leave prior entries untouched.

use std::collections::HashMap;

use parking_lot::Mutex;
use tracing::warn;

use crate::core::identifier::{ObjectType, TableIdentifier};
use crate::core::schema::ColumnDef;
use crate::core::traits::Connection;

#[derive(Debug, Default)]
struct CacheInner {
    /// schema name -> tables of that schema.
    schemas: HashMap<String, Vec<TableIdentifier>>,

    /// table -> column list; `None` means present but not loaded yet.
    columns: HashMap<TableIdentifier, Option<Vec<ColumnDef>>>,
}

/// Concurrency-safe cache of table and column listings for one
/// connection.
#[derive(Debug, Default)]
pub struct SchemaObjectCache {
    inner: Mutex<CacheInner>,
}

impl SchemaObjectCache {
    /// Create an empty cache.
    pub fn new() -> Self {
        Self::default()
    }

    /// Tables of a schema, fetched in bulk on first access.
    ///
    /// The bulk fetch seeds a column entry (`None`, unloaded) for every
    /// table so later column lookups are single-table retrievals.
    pub fn tables(&self, conn: &dyn Connection, schema: &str) -> Vec<TableIdentifier> {
        if let Some(tables) = self.inner.lock().schemas.get(schema) {
            return tables.clone();
        }

        let fetched = match conn.tables(
            None,
            Some(schema),
            None,
            &[ObjectType::Table, ObjectType::View],
        ) {
            Ok(tables) => tables,
            Err(e) => {
                warn!("table list retrieval failed for schema {}: {}", schema, e);
                return Vec::new();
            }
        };

        let mut inner = self.inner.lock();
        for table in &fetched {
            inner.columns.entry(table.clone()).or_insert(None);
        }
        inner.schemas.insert(schema.to_string(), fetched.clone());
        fetched
    }

    /// Columns of a table, fetched once on first access.
    pub fn columns(&self, conn: &dyn Connection, table: &TableIdentifier) -> Vec<ColumnDef> {
        if let Some(Some(columns)) = self.inner.lock().columns.get(table) {
            return columns.clone();
        }

        let fetched = match conn.columns(table) {
            Ok(columns) => columns,
            Err(e) => {
                warn!("column retrieval failed for {}: {}", table, e);
                return Vec::new();
            }
        };

        self.inner
            .lock()
            .columns
            .insert(table.clone(), Some(fetched.clone()));
        fetched
    }

    /// Whether a table's columns have been loaded (distinct from the
    /// table merely being known).
    pub fn columns_loaded(&self, table: &TableIdentifier) -> bool {
        matches!(self.inner.lock().columns.get(table), Some(Some(_)))
    }

    /// Add a table to the cache (e.g. after a CREATE TABLE ran).
    pub fn add_table(&self, table: TableIdentifier) {
        let mut inner = self.inner.lock();
        if let Some(schema) = table.schema.clone() {
            if let Some(tables) = inner.schemas.get_mut(&schema) {
                if !tables.contains(&table) {
                    tables.push(table.clone());
                }
            }
        }
        inner.columns.entry(table).or_insert(None);
    }

    /// Remove a table from the cache (e.g. after a DROP TABLE ran).
    pub fn remove_table(&self, table: &TableIdentifier) {
        let mut inner = self.inner.lock();
        if let Some(schema) = table.schema.as_deref() {
            if let Some(tables) = inner.schemas.get_mut(schema) {
                tables.retain(|t| t != table);
            }
        }
        inner.columns.remove(table);
    }

    /// Drop everything. Called on a connection-closed notification.
    pub fn clear(&self) {
        let mut inner = self.inner.lock();
        inner.schemas.clear();
        inner.columns.clear();
    }
}
