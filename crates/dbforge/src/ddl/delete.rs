//! Foreign-key dependency resolution and ordered DELETE script
//! generation.
//!
//! Starting from a root table, the resolver discovers every table with a
//! direct or transitive foreign key pointing at the root and builds a
//! dependency tree. Traversal stops at tables already in the visited set,
//! which both guards against FK cycles (including self-references) and
//! deduplicates tables reachable through more than one path.
//!
//! Emission happens in three phases: leaf tables first, then remaining
//! non-leaf parents deepest-first, then the root. A second visited check
//! at emission time guarantees each table is deleted at most once.

use indexmap::{IndexMap, IndexSet};

use crate::config::GeneratorOptions;
use crate::core::identifier::TableIdentifier;
use crate::core::schema::KeyValue;
use crate::core::traits::Connection;
use crate::dialect::{Dialect, DialectId};
use crate::error::Result;

use super::qualify;

/// One table in the FK dependency tree.
///
/// A node owns its children; the parent link is implicit in the tree
/// structure (filters are threaded down during traversal), so no back
/// reference is stored.
#[derive(Debug, Clone)]
pub struct DependencyNode {
    /// The table this node represents.
    pub table: TableIdentifier,

    /// Mapping of this table's FK columns to the parent's referenced
    /// columns. Empty for the root.
    pub column_map: IndexMap<String, String>,

    /// Tables referencing this one.
    pub children: Vec<DependencyNode>,
}

impl DependencyNode {
    /// True when no discovered table references this one.
    pub fn is_leaf(&self) -> bool {
        self.children.is_empty()
    }

    /// Total number of nodes in this subtree, the node itself included.
    pub fn node_count(&self) -> usize {
        1 + self.children.iter().map(DependencyNode::node_count).sum::<usize>()
    }
}

/// Generates dependency-ordered DELETE scripts.
pub struct DeleteScriptGenerator<'a> {
    dialect: &'a Dialect,
    options: &'a GeneratorOptions,
}

impl<'a> DeleteScriptGenerator<'a> {
    /// Create a generator over the given dialect and options.
    pub fn new(dialect: &'a Dialect, options: &'a GeneratorOptions) -> Self {
        Self { dialect, options }
    }

    /// Build the FK dependency tree rooted at `root`.
    pub fn resolve_tree(
        &self,
        conn: &dyn Connection,
        root: &TableIdentifier,
    ) -> Result<DependencyNode> {
        let mut visited: IndexSet<TableIdentifier> = IndexSet::new();
        visited.insert(root.clone());
        let children = self.resolve_children(conn, root, &mut visited)?;
        Ok(DependencyNode {
            table: root.clone(),
            column_map: IndexMap::new(),
            children,
        })
    }

    fn resolve_children(
        &self,
        conn: &dyn Connection,
        table: &TableIdentifier,
        visited: &mut IndexSet<TableIdentifier>,
    ) -> Result<Vec<DependencyNode>> {
        let rows = conn.exported_keys(table)?;

        // Group referencing rows by (child table, constraint) so composite
        // keys keep their column pairs together in first-seen order.
        let mut grouped: IndexMap<(TableIdentifier, String), IndexMap<String, String>> =
            IndexMap::new();
        for row in rows {
            grouped
                .entry((row.table.clone(), row.constraint.clone()))
                .or_default()
                .insert(row.column.clone(), row.ref_column.clone());
        }

        let mut children = Vec::new();
        for ((child_table, _), column_map) in grouped {
            // Visited check stops FK cycles and collapses multi-path
            // tables into their first discovery.
            if visited.contains(&child_table) {
                continue;
            }
            visited.insert(child_table.clone());
            let grandchildren = self.resolve_children(conn, &child_table, visited)?;
            children.push(DependencyNode {
                table: child_table,
                column_map,
                children: grandchildren,
            });
        }
        Ok(children)
    }

    /// Generate the ordered DELETE script for the rows of `root`
    /// identified by `key_values`.
    pub fn build(
        &self,
        conn: &dyn Connection,
        root: &TableIdentifier,
        key_values: &IndexMap<String, KeyValue>,
    ) -> Result<String> {
        let tree = self.resolve_tree(conn, root)?;
        let root_filter = self.root_filter(key_values);

        let mut emitted: IndexSet<TableIdentifier> = IndexSet::new();
        let mut statements: Vec<String> = Vec::new();

        self.emit_leaves(&tree, &root_filter, &mut emitted, &mut statements);
        self.emit_parents(&tree, &root_filter, true, &mut emitted, &mut statements);
        statements.push(self.delete_statement(&tree.table, &root_filter));

        let separator = &self.options.statement_separator;
        let mut script = String::new();
        for stmt in statements {
            script.push_str(&stmt);
            script.push_str(separator);
            script.push('\n');
        }
        Ok(script)
    }

    /// Phase 1: one DELETE per leaf, filters nested up to the root.
    fn emit_leaves(
        &self,
        node: &DependencyNode,
        node_filter: &str,
        emitted: &mut IndexSet<TableIdentifier>,
        out: &mut Vec<String>,
    ) {
        for child in &node.children {
            let child_filter = self.child_filter(child, &node.table, node_filter);
            if child.is_leaf() {
                if emitted.insert(child.table.clone()) {
                    out.push(self.delete_statement(&child.table, &child_filter));
                }
            } else {
                self.emit_leaves(child, &child_filter, emitted, out);
            }
        }
    }

    /// Phase 2: remaining non-leaf parents, children before parents.
    fn emit_parents(
        &self,
        node: &DependencyNode,
        node_filter: &str,
        is_root: bool,
        emitted: &mut IndexSet<TableIdentifier>,
        out: &mut Vec<String>,
    ) {
        for child in &node.children {
            if !child.is_leaf() {
                let child_filter = self.child_filter(child, &node.table, node_filter);
                self.emit_parents(child, &child_filter, false, emitted, out);
            }
        }
        if !is_root && !node.is_leaf() && emitted.insert(node.table.clone()) {
            out.push(self.delete_statement(&node.table, node_filter));
        }
    }

    /// Nest a child's filter inside its parent's.
    fn child_filter(
        &self,
        child: &DependencyNode,
        parent: &TableIdentifier,
        parent_filter: &str,
    ) -> String {
        let parent_name = qualify(self.dialect, parent);

        if child.column_map.len() == 1 {
            let (child_col, parent_col) = child.column_map.first().expect("non-empty column map");
            format!(
                "{} IN (SELECT {} FROM {} WHERE {})",
                self.dialect.quote_if_needed(child_col),
                self.dialect.quote_if_needed(parent_col),
                parent_name,
                parent_filter
            )
        } else {
            let child_cols: Vec<String> = child
                .column_map
                .keys()
                .map(|c| self.dialect.quote_if_needed(c))
                .collect();
            let parent_cols: Vec<String> = child
                .column_map
                .values()
                .map(|c| self.dialect.quote_if_needed(c))
                .collect();
            format!(
                "({}) IN (SELECT {} FROM {} WHERE {})",
                child_cols.join(", "),
                parent_cols.join(", "),
                parent_name,
                parent_filter
            )
        }
    }

    /// The root WHERE clause built from literal key values.
    fn root_filter(&self, key_values: &IndexMap<String, KeyValue>) -> String {
        key_values
            .iter()
            .map(|(column, value)| {
                let column = self.dialect.quote_if_needed(column);
                if value.is_null() {
                    format!("{} IS NULL", column)
                } else {
                    format!("{} = {}", column, self.literal(value))
                }
            })
            .collect::<Vec<_>>()
            .join(" AND ")
    }

    fn literal(&self, value: &KeyValue) -> String {
        if self.dialect.id() == DialectId::SqlServer {
            value.to_unicode_literal()
        } else {
            value.to_sql_literal()
        }
    }

    fn delete_statement(&self, table: &TableIdentifier, filter: &str) -> String {
        format!(
            "DELETE FROM {} WHERE {}",
            qualify(self.dialect, table),
            filter
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::identifier::IdentifierCase;
    use crate::core::schema::{
        ColumnDef, ForeignKeyRow, IndexDef, TableGrant, TriggerDef,
    };
    use crate::core::value::ResultRows;
    use crate::core::ObjectType;
    use std::collections::HashMap;

    fn ident(name: &str) -> TableIdentifier {
        TableIdentifier::qualified("public", name, IdentifierCase::Lower)
    }

    /// Connection double whose exported-key graph is declared up front.
    struct FkGraph {
        exported: HashMap<TableIdentifier, Vec<ForeignKeyRow>>,
    }

    impl FkGraph {
        fn new() -> Self {
            Self {
                exported: HashMap::new(),
            }
        }

        /// Declare `child.child_col` referencing `parent.parent_col`.
        fn link(mut self, parent: &str, parent_col: &str, child: &str, child_col: &str) -> Self {
            let row = ForeignKeyRow {
                constraint: format!("fk_{}_{}", child, parent),
                table: ident(child),
                column: child_col.to_string(),
                ref_table: ident(parent),
                ref_column: parent_col.to_string(),
                on_update: "NO ACTION".to_string(),
                on_delete: "NO ACTION".to_string(),
            };
            self.exported.entry(ident(parent)).or_default().push(row);
            self
        }
    }

    impl Connection for FkGraph {
        fn product_name(&self) -> String {
            "PostgreSQL".to_string()
        }

        fn product_version(&self) -> String {
            "16.0".to_string()
        }

        fn stored_case(&self) -> IdentifierCase {
            IdentifierCase::Lower
        }

        fn catalogs(&self) -> Result<Vec<String>> {
            Ok(Vec::new())
        }

        fn schemas(&self) -> Result<Vec<String>> {
            Ok(Vec::new())
        }

        fn tables(
            &self,
            _catalog: Option<&str>,
            _schema: Option<&str>,
            _name_pattern: Option<&str>,
            _types: &[ObjectType],
        ) -> Result<Vec<TableIdentifier>> {
            Ok(Vec::new())
        }

        fn columns(&self, _table: &TableIdentifier) -> Result<Vec<ColumnDef>> {
            Ok(Vec::new())
        }

        fn primary_key(&self, _table: &TableIdentifier) -> Result<Vec<String>> {
            Ok(Vec::new())
        }

        fn indexes(&self, _table: &TableIdentifier) -> Result<Vec<IndexDef>> {
            Ok(Vec::new())
        }

        fn imported_keys(&self, _table: &TableIdentifier) -> Result<Vec<ForeignKeyRow>> {
            Ok(Vec::new())
        }

        fn exported_keys(&self, table: &TableIdentifier) -> Result<Vec<ForeignKeyRow>> {
            Ok(self.exported.get(table).cloned().unwrap_or_default())
        }

        fn triggers(&self, _table: &TableIdentifier) -> Result<Vec<TriggerDef>> {
            Ok(Vec::new())
        }

        fn view_source(&self, _view: &TableIdentifier) -> Result<Option<String>> {
            Ok(None)
        }

        fn table_grants(&self, _table: &TableIdentifier) -> Result<Vec<TableGrant>> {
            Ok(Vec::new())
        }

        fn query(&self, _sql: &str) -> Result<ResultRows> {
            Ok(ResultRows::default())
        }

        fn execute(&self, _sql: &str) -> Result<u64> {
            Ok(0)
        }
    }

    fn generate(graph: &FkGraph, root: &str, keys: &[(&str, KeyValue)]) -> String {
        let dialect = Dialect::builtin(DialectId::Postgres);
        let options = GeneratorOptions::default();
        let generator = DeleteScriptGenerator::new(&dialect, &options);
        let key_values: IndexMap<String, KeyValue> = keys
            .iter()
            .map(|(k, v)| (k.to_string(), v.clone()))
            .collect();
        generator.build(graph, &ident(root), &key_values).unwrap()
    }

    #[test]
    fn test_three_level_chain_orders_deletes_bottom_up() {
        let graph = FkGraph::new()
            .link("a", "id", "b", "a_id")
            .link("b", "id", "c", "b_id");

        let script = generate(&graph, "a", &[("id", KeyValue::Int(1))]);
        let statements: Vec<&str> = script.lines().collect();

        assert_eq!(statements.len(), 3);
        assert_eq!(
            statements[0],
            "DELETE FROM public.c WHERE b_id IN (SELECT id FROM public.b \
             WHERE a_id IN (SELECT id FROM public.a WHERE id = 1));"
        );
        assert_eq!(
            statements[1],
            "DELETE FROM public.b WHERE a_id IN (SELECT id FROM public.a WHERE id = 1);"
        );
        assert_eq!(statements[2], "DELETE FROM public.a WHERE id = 1;");
    }

    #[test]
    fn test_self_referencing_fk_terminates_and_emits_once() {
        let graph = FkGraph::new().link("employee", "id", "employee", "manager_id");

        let script = generate(&graph, "employee", &[("id", KeyValue::Int(7))]);
        assert_eq!(script.matches("DELETE FROM public.employee").count(), 1);
        assert_eq!(
            script.trim_end(),
            "DELETE FROM public.employee WHERE id = 7;"
        );
    }

    #[test]
    fn test_multi_path_table_emitted_once() {
        // d is reachable through both b and c.
        let graph = FkGraph::new()
            .link("a", "id", "b", "a_id")
            .link("a", "id", "c", "a_id")
            .link("b", "id", "d", "b_id")
            .link("c", "id", "d", "c_id");

        let script = generate(&graph, "a", &[("id", KeyValue::Int(1))]);
        assert_eq!(script.matches("DELETE FROM public.d").count(), 1);
        assert_eq!(script.matches("DELETE FROM public.b").count(), 1);
        assert_eq!(script.matches("DELETE FROM public.c").count(), 1);

        // Children delete before their parents.
        let d_pos = script.find("DELETE FROM public.d").unwrap();
        let b_pos = script.find("DELETE FROM public.b").unwrap();
        let a_pos = script.find("DELETE FROM public.a WHERE id").unwrap();
        assert!(d_pos < b_pos);
        assert!(b_pos < a_pos);
    }

    #[test]
    fn test_null_key_value_uses_is_null() {
        let graph = FkGraph::new();
        let script = generate(
            &graph,
            "t",
            &[("code", KeyValue::Null), ("id", KeyValue::Int(3))],
        );
        assert_eq!(
            script.trim_end(),
            "DELETE FROM public.t WHERE code IS NULL AND id = 3;"
        );
    }

    #[test]
    fn test_string_key_is_quoted_and_escaped() {
        let graph = FkGraph::new();
        let script = generate(&graph, "t", &[("name", KeyValue::from("O'Brien"))]);
        assert!(script.contains("name = 'O''Brien'"));
    }

    #[test]
    fn test_composite_fk_uses_tuple_in() {
        let mut graph = FkGraph::new();
        // One constraint with two column pairs.
        let rows = vec![
            ForeignKeyRow {
                constraint: "fk_child_parent".to_string(),
                table: ident("child"),
                column: "p_a".to_string(),
                ref_table: ident("parent"),
                ref_column: "a".to_string(),
                on_update: "NO ACTION".to_string(),
                on_delete: "NO ACTION".to_string(),
            },
            ForeignKeyRow {
                constraint: "fk_child_parent".to_string(),
                table: ident("child"),
                column: "p_b".to_string(),
                ref_table: ident("parent"),
                ref_column: "b".to_string(),
                on_update: "NO ACTION".to_string(),
                on_delete: "NO ACTION".to_string(),
            },
        ];
        graph.exported.insert(ident("parent"), rows);

        let script = generate(&graph, "parent", &[("a", KeyValue::Int(1))]);
        assert!(script.contains(
            "DELETE FROM public.child WHERE (p_a, p_b) IN \
             (SELECT a, b FROM public.parent WHERE a = 1)"
        ));
    }

    #[test]
    fn test_resolve_tree_counts_nodes() {
        let graph = FkGraph::new()
            .link("a", "id", "b", "a_id")
            .link("b", "id", "c", "b_id");

        let dialect = Dialect::builtin(DialectId::Postgres);
        let options = GeneratorOptions::default();
        let generator = DeleteScriptGenerator::new(&dialect, &options);
        let tree = generator.resolve_tree(&graph, &ident("a")).unwrap();

        assert_eq!(tree.node_count(), 3);
        assert!(!tree.children[0].is_leaf());
        assert!(tree.children[0].children[0].is_leaf());
    }
}
