//! Database metadata facade.
//!
//! [`DbMetadata`] is built once per connection. It derives the dialect
//! profile from the connection's reported product identity, selects the
//! reader strategies through the [`ReaderRegistry`], and borrows the
//! process-wide [`TemplateStore`].
//!
//! Every read degrades gracefully: a capability the dialect does not
//! support yields an empty result, and a driver failure is logged and
//! degraded to an empty result as well, so "table does not exist" style
//! lookups come back empty instead of failing.
//!
//! Result ordering is fixed per call: tables sort by identifier, columns
//! by ordinal position, grouped foreign keys by first-seen constraint
//! order, everything else in driver order.

use std::collections::HashMap;
use std::sync::Arc;

use tracing::warn;

use crate::config::GeneratorOptions;
use crate::core::identifier::{ObjectType, TableIdentifier};
use crate::core::registry::ReaderRegistry;
use crate::core::schema::{
    ForeignKeyDef, ForeignKeyRow, IndexDef, ProcedureDef, SequenceDef, SynonymDef,
    TableConstraint, TableDefinition, TableGrant, TriggerDef,
};
use crate::core::traits::{Connection, ReaderSet};
use crate::ddl::TableScriptBuilder;
use crate::dialect::Dialect;
use crate::error::Result;
use crate::templates::TemplateStore;

/// Log a failed lookup and substitute the empty value.
fn degraded<T: Default>(context: &str, result: Result<T>) -> T {
    match result {
        Ok(value) => value,
        Err(e) => {
            warn!("{} failed, returning empty result: {}", context, e);
            T::default()
        }
    }
}

/// Per-connection metadata facade.
pub struct DbMetadata<'a> {
    conn: Arc<dyn Connection>,
    dialect: Dialect,
    readers: ReaderSet,
    templates: &'a TemplateStore,
}

impl<'a> DbMetadata<'a> {
    /// Build the facade for a connection.
    ///
    /// The dialect profile and reader set are fixed here; the template
    /// store is the immutable catalog loaded at process start.
    pub fn new(
        conn: Arc<dyn Connection>,
        registry: &ReaderRegistry,
        templates: &'a TemplateStore,
    ) -> Self {
        let dialect = Dialect::from_connection(conn.as_ref());
        let readers = registry.readers_for(dialect.id());
        Self {
            conn,
            dialect,
            readers,
            templates,
        }
    }

    /// The connection's dialect profile.
    pub fn dialect(&self) -> &Dialect {
        &self.dialect
    }

    /// The injected template store.
    pub fn templates(&self) -> &TemplateStore {
        self.templates
    }

    /// The underlying connection.
    pub fn connection(&self) -> Arc<dyn Connection> {
        self.conn.clone()
    }

    /// Quote a name when the dialect requires it; idempotent.
    pub fn quote_if_needed(&self, name: &str) -> String {
        self.dialect.quote_if_needed(name)
    }

    /// Construct an identifier normalized for this connection's stored
    /// case rule.
    pub fn table_id(&self, schema: Option<&str>, name: &str) -> TableIdentifier {
        TableIdentifier::new(None, schema, name, self.dialect.stored_case())
    }

    // ===== Listings =====

    /// Catalog names, driver order.
    pub fn list_catalogs(&self) -> Vec<String> {
        degraded("catalog listing", self.conn.catalogs())
    }

    /// Schema names, driver order.
    pub fn list_schemas(&self) -> Vec<String> {
        degraded("schema listing", self.conn.schemas())
    }

    /// Tables matching the filters, sorted by identifier.
    pub fn list_tables(
        &self,
        catalog: Option<&str>,
        schema: Option<&str>,
        name_pattern: Option<&str>,
        types: &[ObjectType],
    ) -> Vec<TableIdentifier> {
        let mut tables = degraded(
            "table listing",
            self.conn.tables(catalog, schema, name_pattern, types),
        );
        tables.sort();
        tables
    }

    // ===== Table details =====

    /// Full table definition: columns ordered by ordinal position with
    /// primary-key flags merged in.
    ///
    /// A table that does not exist yields a definition with no columns.
    pub fn table_definition(&self, table: &TableIdentifier) -> TableDefinition {
        let mut columns = degraded("column listing", self.conn.columns(table));
        let pk_columns = degraded("primary key lookup", self.conn.primary_key(table));
        for col in &mut columns {
            if pk_columns.iter().any(|pk| pk.eq_ignore_ascii_case(&col.name)) {
                col.is_primary_key = true;
            }
        }
        TableDefinition::new(table.clone(), columns)
    }

    /// Indexes on a table, through the dialect's index reader.
    pub fn indexes(&self, table: &TableIdentifier) -> Vec<IndexDef> {
        degraded(
            "index listing",
            self.readers.indexes.indexes(self.conn.as_ref(), table),
        )
    }

    /// Foreign keys declared on a table, grouped per constraint in
    /// deterministic order.
    pub fn foreign_keys(&self, table: &TableIdentifier) -> Vec<ForeignKeyDef> {
        let rows = degraded("foreign key listing", self.conn.imported_keys(table));
        ForeignKeyDef::group_rows(&rows)
    }

    /// Foreign keys in other tables that reference this one, grouped per
    /// constraint in deterministic order.
    pub fn referenced_by(&self, table: &TableIdentifier) -> Vec<ForeignKeyDef> {
        let rows = degraded("referencing key listing", self.conn.exported_keys(table));
        ForeignKeyDef::group_rows(&rows)
    }

    /// Triggers on a table, driver order.
    pub fn triggers(&self, table: &TableIdentifier) -> Vec<TriggerDef> {
        degraded("trigger listing", self.conn.triggers(table))
    }

    /// View source text, when the dialect exposes it.
    pub fn view_source(&self, view: &TableIdentifier) -> Option<String> {
        degraded("view source lookup", self.conn.view_source(view))
    }

    /// Column-level constraint fragments keyed by column name.
    pub fn column_constraints(&self, table: &TableIdentifier) -> HashMap<String, String> {
        degraded(
            "column constraint lookup",
            self.readers
                .constraints
                .column_constraints(self.conn.as_ref(), table),
        )
    }

    /// Named table-level constraints.
    pub fn table_constraints(&self, table: &TableIdentifier) -> Vec<TableConstraint> {
        degraded(
            "table constraint lookup",
            self.readers
                .constraints
                .table_constraints(self.conn.as_ref(), table),
        )
    }

    // ===== Schema-level objects =====

    /// Sequences in a schema; empty for dialects without sequences.
    pub fn sequences(&self, schema: &str) -> Vec<SequenceDef> {
        degraded(
            "sequence listing",
            self.readers.sequences.sequences(self.conn.as_ref(), schema),
        )
    }

    /// Reconstructed sequence source, when supported.
    pub fn sequence_source(&self, schema: Option<&str>, name: &str) -> Option<String> {
        degraded(
            "sequence source lookup",
            self.readers
                .sequences
                .sequence_source(self.conn.as_ref(), schema, name),
        )
    }

    /// Synonyms in a schema; empty for dialects without synonyms.
    pub fn synonyms(&self, schema: &str) -> Vec<SynonymDef> {
        degraded(
            "synonym listing",
            self.readers.synonyms.synonyms(self.conn.as_ref(), schema),
        )
    }

    /// Resolve a synonym to its target object.
    pub fn synonym_target(&self, schema: Option<&str>, name: &str) -> Option<TableIdentifier> {
        degraded(
            "synonym target lookup",
            self.readers
                .synonyms
                .synonym_target(self.conn.as_ref(), schema, name),
        )
    }

    /// Stored procedures in a schema.
    pub fn procedures(&self, schema: &str) -> Vec<ProcedureDef> {
        degraded(
            "procedure listing",
            self.readers
                .procedures
                .procedures(self.conn.as_ref(), schema),
        )
    }

    /// Procedure source text, when the dialect stores it.
    pub fn procedure_source(&self, schema: Option<&str>, name: &str) -> Option<String> {
        degraded(
            "procedure source lookup",
            self.readers
                .procedures
                .procedure_source(self.conn.as_ref(), schema, name),
        )
    }

    /// Grants on a table, driver order.
    pub fn table_grants(&self, table: &TableIdentifier) -> Vec<TableGrant> {
        degraded("grant listing", self.conn.table_grants(table))
    }

    // ===== Synthesis =====

    /// Raw imported-key rows, for callers that need the ungrouped form.
    pub fn imported_key_rows(&self, table: &TableIdentifier) -> Vec<ForeignKeyRow> {
        degraded("foreign key listing", self.conn.imported_keys(table))
    }

    /// Synthesize the complete CREATE TABLE script for an existing table,
    /// gathering definition, indexes, foreign keys, and grants through
    /// this facade.
    pub fn table_script(&self, table: &TableIdentifier, options: &GeneratorOptions) -> String {
        let def = self.table_definition(table);
        let indexes = self.indexes(table);
        let fk_rows = self.imported_key_rows(table);
        let grants = self.table_grants(table);

        TableScriptBuilder::new(&self.dialect, self.templates, options)
            .build(&def, &indexes, &fk_rows, &grants)
    }
}

impl std::fmt::Debug for DbMetadata<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DbMetadata")
            .field("dialect", &self.dialect.id())
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::identifier::IdentifierCase;
    use crate::core::schema::ColumnDef;
    use crate::core::value::ResultRows;
    use crate::error::ForgeError;

    fn ident(name: &str) -> TableIdentifier {
        TableIdentifier::qualified("public", name, IdentifierCase::Lower)
    }

    /// Connection double over a single canned table.
    struct FakePostgres {
        fail_triggers: bool,
    }

    impl Connection for FakePostgres {
        fn product_name(&self) -> String {
            "PostgreSQL".to_string()
        }

        fn product_version(&self) -> String {
            "16.0".to_string()
        }

        fn stored_case(&self) -> IdentifierCase {
            IdentifierCase::Lower
        }

        fn reserved_words(&self) -> Vec<String> {
            vec!["order".to_string()]
        }

        fn catalogs(&self) -> Result<Vec<String>> {
            Ok(vec!["app".to_string()])
        }

        fn schemas(&self) -> Result<Vec<String>> {
            Ok(vec!["public".to_string()])
        }

        fn tables(
            &self,
            _catalog: Option<&str>,
            _schema: Option<&str>,
            _name_pattern: Option<&str>,
            _types: &[ObjectType],
        ) -> Result<Vec<TableIdentifier>> {
            Ok(vec![ident("orders"), ident("customers")])
        }

        fn columns(&self, _table: &TableIdentifier) -> Result<Vec<ColumnDef>> {
            let mut name = ColumnDef::new("name", "varchar(100)");
            name.ordinal_pos = 2;
            name.is_nullable = false;
            let mut id = ColumnDef::new("id", "integer");
            id.ordinal_pos = 1;
            id.is_nullable = false;
            // Driver returns out of ordinal order on purpose.
            Ok(vec![name, id])
        }

        fn primary_key(&self, _table: &TableIdentifier) -> Result<Vec<String>> {
            Ok(vec!["id".to_string()])
        }

        fn indexes(&self, _table: &TableIdentifier) -> Result<Vec<IndexDef>> {
            Ok(vec![IndexDef {
                name: "idx_orders_name".to_string(),
                columns: vec!["name".to_string()],
                is_unique: false,
                is_primary: false,
            }])
        }

        fn imported_keys(&self, _table: &TableIdentifier) -> Result<Vec<ForeignKeyRow>> {
            let row = ForeignKeyRow {
                constraint: "fk_orders_customer".to_string(),
                table: ident("orders"),
                column: "customer_id".to_string(),
                ref_table: ident("customers"),
                ref_column: "id".to_string(),
                on_update: "NO ACTION".to_string(),
                on_delete: "CASCADE".to_string(),
            };
            // Duplicate row as some drivers produce.
            Ok(vec![row.clone(), row])
        }

        fn exported_keys(&self, _table: &TableIdentifier) -> Result<Vec<ForeignKeyRow>> {
            Ok(Vec::new())
        }

        fn triggers(&self, _table: &TableIdentifier) -> Result<Vec<TriggerDef>> {
            if self.fail_triggers {
                return Err(ForgeError::introspection("triggers", "not allowed"));
            }
            Ok(Vec::new())
        }

        fn view_source(&self, _view: &TableIdentifier) -> Result<Option<String>> {
            Ok(None)
        }

        fn table_grants(&self, _table: &TableIdentifier) -> Result<Vec<TableGrant>> {
            Ok(vec![TableGrant {
                grantee: "app_rw".to_string(),
                privilege: "SELECT".to_string(),
            }])
        }

        fn query(&self, _sql: &str) -> Result<ResultRows> {
            Ok(ResultRows::default())
        }

        fn execute(&self, _sql: &str) -> Result<u64> {
            Ok(0)
        }
    }

    fn facade(
        templates: &TemplateStore,
        fail_triggers: bool,
    ) -> DbMetadata<'_> {
        let conn = Arc::new(FakePostgres { fail_triggers });
        let registry = ReaderRegistry::with_builtins();
        DbMetadata::new(conn, &registry, templates)
    }

    #[test]
    fn test_table_definition_merges_pk_and_sorts() {
        let templates = TemplateStore::builtin();
        let meta = facade(&templates, false);

        let def = meta.table_definition(&ident("orders"));
        assert_eq!(def.columns.len(), 2);
        assert_eq!(def.columns[0].name, "id");
        assert!(def.columns[0].is_primary_key);
        assert!(!def.columns[1].is_primary_key);
    }

    #[test]
    fn test_foreign_keys_deduplicate_driver_rows() {
        let templates = TemplateStore::builtin();
        let meta = facade(&templates, false);

        let fks = meta.foreign_keys(&ident("orders"));
        assert_eq!(fks.len(), 1);
        assert_eq!(fks[0].columns, vec!["customer_id"]);
        assert_eq!(fks[0].ref_columns, vec!["id"]);
    }

    #[test]
    fn test_introspection_failure_degrades_to_empty() {
        let templates = TemplateStore::builtin();
        let meta = facade(&templates, true);
        assert!(meta.triggers(&ident("orders")).is_empty());
    }

    #[test]
    fn test_quote_if_needed_uses_connection_reserved_words() {
        let templates = TemplateStore::builtin();
        let meta = facade(&templates, false);
        assert_eq!(meta.quote_if_needed("order"), "\"order\"");
        assert_eq!(meta.quote_if_needed("orders"), "orders");
    }

    #[test]
    fn test_unsupported_capability_yields_empty() {
        let templates = TemplateStore::builtin();
        let meta = facade(&templates, false);
        // PostgreSQL registers no synonym reader: null object answers.
        assert!(meta.synonyms("public").is_empty());
        assert!(meta.synonym_target(None, "anything").is_none());
    }

    #[test]
    fn test_table_script_end_to_end() {
        let templates = TemplateStore::builtin();
        let meta = facade(&templates, false);
        let options = GeneratorOptions::default();

        let script = meta.table_script(&ident("orders"), &options);
        assert!(script.contains("CREATE TABLE public.orders"));
        assert!(script.contains("PRIMARY KEY (id)"));
        assert!(script.contains("FOREIGN KEY (customer_id)"));
        assert!(script.contains("CREATE INDEX idx_orders_name"));
        assert!(script.contains("GRANT SELECT ON public.orders TO app_rw"));
    }

    #[test]
    fn test_list_tables_sorted() {
        let templates = TemplateStore::builtin();
        let meta = facade(&templates, false);
        let tables = meta.list_tables(None, Some("public"), None, &[]);
        assert_eq!(tables[0].name, "customers");
        assert_eq!(tables[1].name, "orders");
    }
}
