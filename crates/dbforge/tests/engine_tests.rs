//! End-to-end tests driving the engine through the public API with an
//! in-memory connection double.

use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use indexmap::IndexMap;

use dbforge::{
    ColumnDef, Connection, DbMetadata, DeleteScriptGenerator, Dialect, ForeignKeyRow,
    GeneratorOptions, IdentifierCase, IndexDef, KeyValue, ObjectType, ReaderRegistry, ResultRows,
    SchemaObjectCache, ScriptExecutor, TableIdentifier, TemplateStore,
};

fn ident(name: &str) -> TableIdentifier {
    TableIdentifier::qualified("public", name, IdentifierCase::Lower)
}

fn fk(constraint: &str, child: &str, child_col: &str, parent: &str, parent_col: &str) -> ForeignKeyRow {
    ForeignKeyRow {
        constraint: constraint.to_string(),
        table: ident(child),
        column: child_col.to_string(),
        ref_table: ident(parent),
        ref_column: parent_col.to_string(),
        on_update: "NO ACTION".to_string(),
        on_delete: "NO ACTION".to_string(),
    }
}

/// Connection double over a three-table shop schema:
/// customers <- orders <- order_items.
#[derive(Default)]
struct ShopDb {
    executed: parking_lot::Mutex<Vec<String>>,
    column_calls: AtomicUsize,
}

impl ShopDb {
    fn columns_of(&self, table: &str) -> Vec<ColumnDef> {
        let mut id = ColumnDef::new("id", "integer");
        id.ordinal_pos = 1;
        id.is_nullable = false;

        match table {
            "customers" => {
                let mut name = ColumnDef::new("name", "varchar(200)");
                name.ordinal_pos = 2;
                name.is_nullable = false;
                vec![id, name]
            }
            "orders" => {
                let mut customer_id = ColumnDef::new("customer_id", "integer");
                customer_id.ordinal_pos = 2;
                customer_id.is_nullable = false;
                let mut status = ColumnDef::new("status", "varchar(10)");
                status.ordinal_pos = 3;
                status.default_value = Some("'new'".to_string());
                vec![id, customer_id, status]
            }
            "order_items" => {
                let mut order_id = ColumnDef::new("order_id", "integer");
                order_id.ordinal_pos = 2;
                order_id.is_nullable = false;
                vec![id, order_id]
            }
            _ => Vec::new(),
        }
    }
}

impl Connection for ShopDb {
    fn product_name(&self) -> String {
        "PostgreSQL".to_string()
    }

    fn product_version(&self) -> String {
        "16.2".to_string()
    }

    fn stored_case(&self) -> IdentifierCase {
        IdentifierCase::Lower
    }

    fn catalogs(&self) -> dbforge::Result<Vec<String>> {
        Ok(vec!["shop".to_string()])
    }

    fn schemas(&self) -> dbforge::Result<Vec<String>> {
        Ok(vec!["public".to_string()])
    }

    fn tables(
        &self,
        _catalog: Option<&str>,
        _schema: Option<&str>,
        name_pattern: Option<&str>,
        _types: &[ObjectType],
    ) -> dbforge::Result<Vec<TableIdentifier>> {
        let all = ["customers", "orders", "order_items"];
        Ok(all
            .iter()
            .copied()
            .filter(|name| match name_pattern {
                // Only the prefix form of LIKE is needed by these tests.
                Some(pattern) => match pattern.strip_suffix('%') {
                    Some(prefix) => name.starts_with(prefix),
                    None => *name == pattern,
                },
                None => true,
            })
            .map(ident)
            .collect())
    }

    fn columns(&self, table: &TableIdentifier) -> dbforge::Result<Vec<ColumnDef>> {
        self.column_calls.fetch_add(1, Ordering::SeqCst);
        Ok(self.columns_of(&table.name))
    }

    fn primary_key(&self, _table: &TableIdentifier) -> dbforge::Result<Vec<String>> {
        Ok(vec!["id".to_string()])
    }

    fn indexes(&self, table: &TableIdentifier) -> dbforge::Result<Vec<IndexDef>> {
        if table.name == "orders" {
            Ok(vec![IndexDef {
                name: "idx_orders_customer".to_string(),
                columns: vec!["customer_id".to_string()],
                is_unique: false,
                is_primary: false,
            }])
        } else {
            Ok(Vec::new())
        }
    }

    fn imported_keys(&self, table: &TableIdentifier) -> dbforge::Result<Vec<ForeignKeyRow>> {
        match table.name.as_str() {
            "orders" => Ok(vec![fk(
                "fk_orders_customer",
                "orders",
                "customer_id",
                "customers",
                "id",
            )]),
            "order_items" => Ok(vec![fk(
                "fk_items_order",
                "order_items",
                "order_id",
                "orders",
                "id",
            )]),
            _ => Ok(Vec::new()),
        }
    }

    fn exported_keys(&self, table: &TableIdentifier) -> dbforge::Result<Vec<ForeignKeyRow>> {
        match table.name.as_str() {
            "customers" => Ok(vec![fk(
                "fk_orders_customer",
                "orders",
                "customer_id",
                "customers",
                "id",
            )]),
            "orders" => Ok(vec![fk(
                "fk_items_order",
                "order_items",
                "order_id",
                "orders",
                "id",
            )]),
            _ => Ok(Vec::new()),
        }
    }

    fn triggers(&self, _table: &TableIdentifier) -> dbforge::Result<Vec<dbforge::core::TriggerDef>> {
        Ok(Vec::new())
    }

    fn view_source(&self, _view: &TableIdentifier) -> dbforge::Result<Option<String>> {
        Ok(None)
    }

    fn table_grants(
        &self,
        _table: &TableIdentifier,
    ) -> dbforge::Result<Vec<dbforge::core::TableGrant>> {
        Ok(Vec::new())
    }

    fn query(&self, _sql: &str) -> dbforge::Result<ResultRows> {
        Ok(ResultRows::default())
    }

    fn execute(&self, sql: &str) -> dbforge::Result<u64> {
        self.executed.lock().push(sql.to_string());
        Ok(0)
    }
}

#[test]
fn facade_synthesizes_executable_create_script() {
    let templates = TemplateStore::builtin();
    let registry = ReaderRegistry::with_builtins();
    let conn = Arc::new(ShopDb::default());
    let meta = DbMetadata::new(conn.clone(), &registry, &templates);

    let options = GeneratorOptions::default();
    let script = meta.table_script(&ident("orders"), &options);

    assert!(script.contains("CREATE TABLE public.orders"));
    assert!(script.contains("PRIMARY KEY (id)"));
    assert!(script.contains("CONSTRAINT fk_orders_customer FOREIGN KEY (customer_id)"));
    assert!(script.contains("CREATE INDEX idx_orders_customer ON public.orders (customer_id)"));

    // The generated script runs as-is through the executor.
    let executor = ScriptExecutor::new(conn.clone(), meta.dialect(), &options);
    let report = executor.run(&script).unwrap();
    assert!(report.statements_run >= 2);
    assert_eq!(conn.executed.lock().len(), report.statements_run);
}

#[test]
fn delete_script_orders_grandchildren_first() {
    let templates = TemplateStore::builtin();
    let registry = ReaderRegistry::with_builtins();
    let conn = Arc::new(ShopDb::default());
    let meta = DbMetadata::new(conn.clone(), &registry, &templates);

    let options = GeneratorOptions::default();
    let generator = DeleteScriptGenerator::new(meta.dialect(), &options);
    let mut keys: IndexMap<String, KeyValue> = IndexMap::new();
    keys.insert("id".to_string(), KeyValue::Int(42));

    let script = generator
        .build(conn.as_ref(), &ident("customers"), &keys)
        .unwrap();
    let lines: Vec<&str> = script.lines().collect();

    assert_eq!(lines.len(), 3);
    assert!(lines[0].starts_with("DELETE FROM public.order_items"));
    assert!(lines[0].contains("order_id IN (SELECT id FROM public.orders"));
    assert!(lines[0].contains("customer_id IN (SELECT id FROM public.customers WHERE id = 42)"));
    assert!(lines[1].starts_with("DELETE FROM public.orders"));
    assert!(lines[2].starts_with("DELETE FROM public.customers"));
}

#[test]
fn cache_serves_completion_lookups_with_one_fetch_each() {
    let conn = ShopDb::default();
    let cache = SchemaObjectCache::new();

    let tables = cache.tables(&conn, "public");
    assert_eq!(tables.len(), 3);

    let orders = ident("orders");
    let first = cache.columns(&conn, &orders);
    let second = cache.columns(&conn, &orders);
    assert_eq!(first.len(), 3);
    assert_eq!(first, second);
    assert_eq!(conn.column_calls.load(Ordering::SeqCst), 1);

    // Connection closed: everything is dropped.
    cache.clear();
    assert!(!cache.columns_loaded(&orders));
}

#[test]
fn referenced_by_and_foreign_keys_are_symmetric() {
    let templates = TemplateStore::builtin();
    let registry = ReaderRegistry::with_builtins();
    let conn = Arc::new(ShopDb::default());
    let meta = DbMetadata::new(conn, &registry, &templates);

    let outgoing = meta.foreign_keys(&ident("orders"));
    assert_eq!(outgoing.len(), 1);
    assert_eq!(outgoing[0].ref_table, ident("customers"));

    let incoming = meta.referenced_by(&ident("customers"));
    assert_eq!(incoming.len(), 1);
    assert_eq!(incoming[0].table, ident("orders"));
    assert_eq!(incoming[0].name, "fk_orders_customer");
}

#[test]
fn list_tables_honors_name_pattern() {
    let templates = TemplateStore::builtin();
    let registry = ReaderRegistry::with_builtins();
    let conn = Arc::new(ShopDb::default());
    let meta = DbMetadata::new(conn, &registry, &templates);

    let matched = meta.list_tables(None, Some("public"), Some("order%"), &[ObjectType::Table]);
    assert_eq!(matched.len(), 2);
    assert!(matched.iter().all(|t| t.name.starts_with("order")));
}

#[test]
fn mixed_case_product_still_resolves_dialect() {
    let dialect = Dialect::from_connection(&ShopDb::default());
    assert_eq!(dialect.id(), dbforge::DialectId::Postgres);
    assert_eq!(dialect.quote_if_needed("Status"), "\"Status\"");
}
