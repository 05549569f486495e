//! DDL script synthesis.
//!
//! [`TableScriptBuilder`] assembles a complete CREATE TABLE script from a
//! table definition plus index, foreign key, and grant metadata. Statement
//! order is fixed: optional DROP, CREATE TABLE (with inline constraints
//! where the dialect emits them), separate PRIMARY KEY / FOREIGN KEY
//! statements otherwise, CREATE INDEX for every non-PK index, COMMENT
//! statements, and GRANT statements grouped per grantee.

mod alter;
mod delete;

pub use alter::ColumnChangePlanner;
pub use delete::{DeleteScriptGenerator, DependencyNode};

use indexmap::IndexMap;
use indexmap::IndexSet;

use crate::config::GeneratorOptions;
use crate::core::schema::{
    ColumnDef, ForeignKeyDef, ForeignKeyRow, IndexDef, TableDefinition, TableGrant,
};
use crate::dialect::Dialect;
use crate::templates::{
    fill, TemplateKind, TemplateStore, PH_CASCADE, PH_COLUMN_LIST, PH_COLUMN_NAME,
    PH_COMMENT, PH_CONSTRAINT_NAME, PH_DATA_TYPE, PH_INDEX_NAME, PH_REF_COLUMN_LIST, PH_REF_TABLE,
    PH_TABLE_NAME, PH_UNIQUE,
};

/// Escape comment text for embedding in a single-quoted SQL literal.
fn escape_comment(text: &str) -> String {
    text.replace('\'', "''")
}

/// Render a schema-qualified, quoted-as-needed table name.
pub(crate) fn qualify(dialect: &Dialect, table: &crate::core::TableIdentifier) -> String {
    let mut parts: Vec<&str> = Vec::with_capacity(2);
    if let Some(schema) = table.schema.as_deref() {
        parts.push(schema);
    }
    parts.push(&table.name);
    dialect.quote_qualified(&parts)
}

/// Assembles CREATE TABLE scripts for one dialect.
pub struct TableScriptBuilder<'a> {
    dialect: &'a Dialect,
    templates: &'a TemplateStore,
    options: &'a GeneratorOptions,
}

impl<'a> TableScriptBuilder<'a> {
    /// Create a builder over the given dialect, template store, and
    /// options.
    pub fn new(
        dialect: &'a Dialect,
        templates: &'a TemplateStore,
        options: &'a GeneratorOptions,
    ) -> Self {
        Self {
            dialect,
            templates,
            options,
        }
    }

    /// Build the full script.
    ///
    /// `fk_rows` is the raw driver output; rows are grouped per constraint
    /// with ordered, deduplicated column sets before rendering.
    pub fn build(
        &self,
        def: &TableDefinition,
        indexes: &[IndexDef],
        fk_rows: &[ForeignKeyRow],
        grants: &[TableGrant],
    ) -> String {
        let table_name = self.qualified_name(def);
        let foreign_keys = ForeignKeyDef::group_rows(fk_rows);
        let inline = self.dialect.supports_inline_constraints();

        let mut statements: Vec<String> = Vec::new();

        if self.options.include_drop {
            if let Some(drop) = self.drop_statement(&table_name) {
                statements.push(drop);
            }
        }

        statements.push(self.create_table(def, &foreign_keys, &table_name, inline));

        if !inline {
            if let Some(pk) = self.primary_key_statement(def, &table_name) {
                statements.push(pk);
            }
            for fk in &foreign_keys {
                if let Some(stmt) = self.foreign_key_statement(fk, &table_name) {
                    statements.push(stmt);
                }
            }
        }

        for idx in indexes.iter().filter(|i| !i.is_primary) {
            if let Some(stmt) = self.index_statement(idx, &table_name) {
                statements.push(stmt);
            }
        }

        statements.extend(self.comment_statements(def, &table_name));

        if self.options.include_grants {
            statements.extend(self.grant_statements(grants, &table_name));
        }

        let separator = &self.options.statement_separator;
        let mut script = String::new();
        for stmt in statements {
            script.push_str(&stmt);
            script.push_str(separator);
            script.push('\n');
        }
        script
    }

    fn qualified_name(&self, def: &TableDefinition) -> String {
        qualify(self.dialect, &def.table)
    }

    fn drop_statement(&self, table_name: &str) -> Option<String> {
        let template = self
            .templates
            .template(TemplateKind::DropTable, self.dialect.id())?;

        let cascade = match (self.options.use_cascade, self.dialect.cascade_drop_keyword()) {
            (true, Some(keyword)) => format!(" {}", keyword),
            _ => String::new(),
        };

        Some(fill(
            template,
            &[(PH_TABLE_NAME, table_name), (PH_CASCADE, &cascade)],
        ))
    }

    fn create_table(
        &self,
        def: &TableDefinition,
        foreign_keys: &[ForeignKeyDef],
        table_name: &str,
        inline: bool,
    ) -> String {
        let quoted: Vec<String> = def
            .columns
            .iter()
            .map(|c| self.dialect.quote_if_needed(&c.name))
            .collect();
        let width = quoted.iter().map(String::len).max().unwrap_or(0);

        let mut lines: Vec<String> = def
            .columns
            .iter()
            .zip(&quoted)
            .map(|(col, name)| self.column_line(col, name, width))
            .collect();

        if inline {
            let pk_cols = def.primary_key_columns();
            if !pk_cols.is_empty() {
                lines.push(format!("PRIMARY KEY ({})", self.column_list(&pk_cols)));
            }
            for fk in foreign_keys {
                lines.push(self.inline_foreign_key(fk));
            }
        }

        format!(
            "CREATE TABLE {} (\n    {}\n)",
            table_name,
            lines.join(",\n    ")
        )
    }

    fn column_line(&self, col: &ColumnDef, quoted_name: &str, width: usize) -> String {
        let mut line = format!("{:<width$} {}", quoted_name, col.dialect_type, width = width);

        let default_clause = col
            .trimmed_default()
            .map(|d| format!(" DEFAULT {}", d))
            .unwrap_or_default();
        let null_clause = if col.is_nullable { "" } else { " NOT NULL" };

        // Some dialects require the DEFAULT clause before nullability.
        if self.dialect.default_before_null() {
            line.push_str(&default_clause);
            line.push_str(null_clause);
        } else {
            line.push_str(null_clause);
            line.push_str(&default_clause);
        }
        line
    }

    fn column_list(&self, columns: &[&str]) -> String {
        columns
            .iter()
            .map(|c| self.dialect.quote_if_needed(c))
            .collect::<Vec<_>>()
            .join(", ")
    }

    fn inline_foreign_key(&self, fk: &ForeignKeyDef) -> String {
        let columns: Vec<&str> = fk.columns.iter().map(String::as_str).collect();
        let ref_columns: Vec<&str> = fk.ref_columns.iter().map(String::as_str).collect();
        let mut ref_parts: Vec<&str> = Vec::with_capacity(2);
        if let Some(schema) = fk.ref_table.schema.as_deref() {
            ref_parts.push(schema);
        }
        ref_parts.push(&fk.ref_table.name);

        format!(
            "CONSTRAINT {} FOREIGN KEY ({}) REFERENCES {} ({})",
            self.dialect.quote_if_needed(&fk.name),
            self.column_list(&columns),
            self.dialect.quote_qualified(&ref_parts),
            self.column_list(&ref_columns)
        )
    }

    fn primary_key_statement(&self, def: &TableDefinition, table_name: &str) -> Option<String> {
        let pk_cols = def.primary_key_columns();
        if pk_cols.is_empty() {
            return None;
        }
        let template = self
            .templates
            .template(TemplateKind::CreatePrimaryKey, self.dialect.id())?;

        let constraint = format!("pk_{}", def.table.name);
        let column_list = self.column_list(&pk_cols);
        Some(fill(
            template,
            &[
                (PH_TABLE_NAME, table_name),
                (PH_CONSTRAINT_NAME, &self.dialect.quote_if_needed(&constraint)),
                (PH_COLUMN_LIST, &column_list),
            ],
        ))
    }

    fn foreign_key_statement(&self, fk: &ForeignKeyDef, table_name: &str) -> Option<String> {
        let template = self
            .templates
            .template(TemplateKind::CreateForeignKey, self.dialect.id())?;

        let columns: Vec<&str> = fk.columns.iter().map(String::as_str).collect();
        let ref_columns: Vec<&str> = fk.ref_columns.iter().map(String::as_str).collect();
        let mut ref_parts: Vec<&str> = Vec::with_capacity(2);
        if let Some(schema) = fk.ref_table.schema.as_deref() {
            ref_parts.push(schema);
        }
        ref_parts.push(&fk.ref_table.name);

        let column_list = self.column_list(&columns);
        let ref_column_list = self.column_list(&ref_columns);
        Some(fill(
            template,
            &[
                (PH_TABLE_NAME, table_name),
                (PH_CONSTRAINT_NAME, &self.dialect.quote_if_needed(&fk.name)),
                (PH_COLUMN_LIST, &column_list),
                (PH_REF_TABLE, &self.dialect.quote_qualified(&ref_parts)),
                (PH_REF_COLUMN_LIST, &ref_column_list),
            ],
        ))
    }

    fn index_statement(&self, idx: &IndexDef, table_name: &str) -> Option<String> {
        let template = self
            .templates
            .template(TemplateKind::CreateIndex, self.dialect.id())?;

        let columns: Vec<&str> = idx.columns.iter().map(String::as_str).collect();
        let column_list = self.column_list(&columns);
        let unique = if idx.is_unique { "UNIQUE " } else { "" };
        Some(fill(
            template,
            &[
                (PH_TABLE_NAME, table_name),
                (PH_INDEX_NAME, &self.dialect.quote_if_needed(&idx.name)),
                (PH_COLUMN_LIST, &column_list),
                (PH_UNIQUE, unique),
            ],
        ))
    }

    fn comment_statements(&self, def: &TableDefinition, table_name: &str) -> Vec<String> {
        let mut statements = Vec::new();

        let table_comment = def.comment.as_deref().map(str::trim).unwrap_or_default();
        if !table_comment.is_empty() || self.options.include_empty_comments {
            if let Some(template) = self
                .templates
                .template(TemplateKind::TableComment, self.dialect.id())
            {
                statements.push(fill(
                    template,
                    &[
                        (PH_TABLE_NAME, table_name),
                        (PH_COMMENT, &escape_comment(table_comment)),
                    ],
                ));
            }
        }

        for col in &def.columns {
            let comment = col.trimmed_comment().unwrap_or_default();
            if comment.is_empty() && !self.options.include_empty_comments {
                continue;
            }
            if let Some(template) = self
                .templates
                .template(TemplateKind::ColumnComment, self.dialect.id())
            {
                statements.push(fill(
                    template,
                    &[
                        (PH_TABLE_NAME, table_name),
                        (PH_COLUMN_NAME, &self.dialect.quote_if_needed(&col.name)),
                        (PH_DATA_TYPE, &col.dialect_type),
                        (PH_COMMENT, &escape_comment(comment)),
                    ],
                ));
            }
        }

        statements
    }

    fn grant_statements(&self, grants: &[TableGrant], table_name: &str) -> Vec<String> {
        // Group privileges per grantee; both levels keep first-seen order
        // so repeated synthesis yields identical scripts.
        let mut by_grantee: IndexMap<&str, IndexSet<&str>> = IndexMap::new();
        for grant in grants {
            by_grantee
                .entry(grant.grantee.as_str())
                .or_default()
                .insert(grant.privilege.as_str());
        }

        by_grantee
            .into_iter()
            .map(|(grantee, privileges)| {
                format!(
                    "GRANT {} ON {} TO {}",
                    privileges.into_iter().collect::<Vec<_>>().join(", "),
                    table_name,
                    grantee
                )
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::identifier::{IdentifierCase, TableIdentifier};
    use crate::dialect::DialectId;

    fn ident(name: &str) -> TableIdentifier {
        TableIdentifier::qualified("public", name, IdentifierCase::Lower)
    }

    fn sample_table() -> TableDefinition {
        let mut id = ColumnDef::new("id", "integer");
        id.is_nullable = false;
        id.is_primary_key = true;
        id.ordinal_pos = 1;

        let mut name = ColumnDef::new("name", "varchar(100)");
        name.is_nullable = false;
        name.ordinal_pos = 2;

        let mut status = ColumnDef::new("status", "varchar(10)");
        status.is_nullable = true;
        status.default_value = Some("'new'".to_string());
        status.ordinal_pos = 3;

        TableDefinition::new(ident("orders"), vec![id, name, status])
    }

    fn fk_row(constraint: &str, column: &str, ref_column: &str) -> ForeignKeyRow {
        ForeignKeyRow {
            constraint: constraint.to_string(),
            table: ident("orders"),
            column: column.to_string(),
            ref_table: ident("customers"),
            ref_column: ref_column.to_string(),
            on_update: "NO ACTION".to_string(),
            on_delete: "NO ACTION".to_string(),
        }
    }

    fn build(dialect: DialectId, options: &GeneratorOptions, fk_rows: &[ForeignKeyRow]) -> String {
        let dialect = Dialect::builtin(dialect);
        let templates = TemplateStore::builtin();
        let builder = TableScriptBuilder::new(&dialect, &templates, options);
        builder.build(&sample_table(), &[], fk_rows, &[])
    }

    #[test]
    fn test_create_table_round_trip_nullability_and_defaults() {
        let options = GeneratorOptions::default();
        let script = build(DialectId::Postgres, &options, &[]);

        let id_line = script.lines().find(|l| l.trim().starts_with("id")).unwrap();
        assert!(id_line.contains("NOT NULL"));
        assert!(!id_line.contains("DEFAULT"));

        let name_line = script
            .lines()
            .find(|l| l.trim().starts_with("name"))
            .unwrap();
        assert!(name_line.contains("NOT NULL"));

        let status_line = script
            .lines()
            .find(|l| l.trim().starts_with("status"))
            .unwrap();
        assert!(!status_line.contains("NOT NULL"));
        assert!(status_line.contains("DEFAULT 'new'"));
    }

    #[test]
    fn test_inline_primary_key_for_postgres() {
        let options = GeneratorOptions::default();
        let script = build(DialectId::Postgres, &options, &[]);
        assert!(script.contains("PRIMARY KEY (id)"));
        assert!(!script.contains("ADD CONSTRAINT"));
    }

    #[test]
    fn test_separate_primary_key_for_sqlserver() {
        let options = GeneratorOptions::default();
        let script = build(DialectId::SqlServer, &options, &[]);
        assert!(script
            .contains("ALTER TABLE public.orders ADD CONSTRAINT pk_orders PRIMARY KEY (id)"));
        assert!(!script.contains("PRIMARY KEY (id)\n"));
    }

    #[test]
    fn test_duplicate_fk_rows_render_each_column_once() {
        let options = GeneratorOptions::default();
        let rows = vec![
            fk_row("fk_orders_customer", "customer_id", "id"),
            fk_row("fk_orders_customer", "customer_id", "id"),
        ];
        let script = build(DialectId::Postgres, &options, &rows);

        let fk_line = script
            .lines()
            .find(|l| l.contains("FOREIGN KEY"))
            .unwrap();
        assert_eq!(fk_line.matches("customer_id").count(), 1);
        assert!(fk_line.contains("REFERENCES public.customers (id)"));
    }

    #[test]
    fn test_drop_with_cascade_keyword() {
        let options = GeneratorOptions {
            include_drop: true,
            use_cascade: true,
            ..Default::default()
        };
        let script = build(DialectId::Postgres, &options, &[]);
        assert!(script.starts_with("DROP TABLE IF EXISTS public.orders CASCADE;"));

        // SQL Server has no cascade keyword.
        let script = build(DialectId::SqlServer, &options, &[]);
        assert!(!script.contains("CASCADE"));
    }

    #[test]
    fn test_default_before_null_for_oracle() {
        let options = GeneratorOptions::default();
        let dialect = Dialect::builtin(DialectId::Oracle);
        let templates = TemplateStore::builtin();
        let builder = TableScriptBuilder::new(&dialect, &templates, &options);

        let mut col = ColumnDef::new("status", "varchar2(10)");
        col.is_nullable = false;
        col.default_value = Some("'new'".to_string());
        col.ordinal_pos = 1;
        let def = TableDefinition::new(
            TableIdentifier::qualified("HR", "T", IdentifierCase::Upper),
            vec![col],
        );

        let script = builder.build(&def, &[], &[], &[]);
        let line = script
            .lines()
            .find(|l| l.contains("DEFAULT"))
            .unwrap();
        let default_pos = line.find("DEFAULT").unwrap();
        let null_pos = line.find("NOT NULL").unwrap();
        assert!(default_pos < null_pos);
    }

    #[test]
    fn test_index_statements_skip_primary() {
        let options = GeneratorOptions::default();
        let dialect = Dialect::builtin(DialectId::Postgres);
        let templates = TemplateStore::builtin();
        let builder = TableScriptBuilder::new(&dialect, &templates, &options);

        let indexes = vec![
            IndexDef {
                name: "pk_orders".to_string(),
                columns: vec!["id".to_string()],
                is_unique: true,
                is_primary: true,
            },
            IndexDef {
                name: "idx_orders_name".to_string(),
                columns: vec!["name".to_string()],
                is_unique: false,
                is_primary: false,
            },
        ];

        let script = builder.build(&sample_table(), &indexes, &[], &[]);
        assert!(script.contains("CREATE INDEX idx_orders_name ON public.orders (name)"));
        assert!(!script.contains("CREATE INDEX pk_orders"));
        assert!(!script.contains("CREATE UNIQUE INDEX pk_orders"));
    }

    #[test]
    fn test_comments_skipped_when_empty() {
        let mut def = sample_table();
        def.comment = Some("Order headers".to_string());
        def.columns[1].comment = Some("Customer-facing name".to_string());

        let options = GeneratorOptions::default();
        let dialect = Dialect::builtin(DialectId::Postgres);
        let templates = TemplateStore::builtin();
        let builder = TableScriptBuilder::new(&dialect, &templates, &options);
        let script = builder.build(&def, &[], &[], &[]);

        assert!(script.contains("COMMENT ON TABLE public.orders IS 'Order headers'"));
        assert!(script.contains("COMMENT ON COLUMN public.orders.name IS 'Customer-facing name'"));
        // Columns without comments produce no statement.
        assert!(!script.contains("COMMENT ON COLUMN public.orders.id"));
    }

    #[test]
    fn test_comment_quote_escaping() {
        let mut def = sample_table();
        def.comment = Some("customer's orders".to_string());

        let options = GeneratorOptions::default();
        let dialect = Dialect::builtin(DialectId::Postgres);
        let templates = TemplateStore::builtin();
        let builder = TableScriptBuilder::new(&dialect, &templates, &options);
        let script = builder.build(&def, &[], &[], &[]);

        assert!(script.contains("IS 'customer''s orders'"));
    }

    #[test]
    fn test_grants_grouped_per_grantee() {
        let grants = vec![
            TableGrant {
                grantee: "app_rw".to_string(),
                privilege: "SELECT".to_string(),
            },
            TableGrant {
                grantee: "app_ro".to_string(),
                privilege: "SELECT".to_string(),
            },
            TableGrant {
                grantee: "app_rw".to_string(),
                privilege: "INSERT".to_string(),
            },
            TableGrant {
                grantee: "app_rw".to_string(),
                privilege: "SELECT".to_string(),
            },
        ];

        let options = GeneratorOptions::default();
        let dialect = Dialect::builtin(DialectId::Postgres);
        let templates = TemplateStore::builtin();
        let builder = TableScriptBuilder::new(&dialect, &templates, &options);
        let script = builder.build(&sample_table(), &[], &[], &grants);

        assert!(script.contains("GRANT SELECT, INSERT ON public.orders TO app_rw"));
        assert!(script.contains("GRANT SELECT ON public.orders TO app_ro"));
        assert_eq!(script.matches("GRANT ").count(), 2);
    }
}
