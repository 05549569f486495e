//! SQL statement templates, keyed by purpose and dialect.
//!
//! Each DDL purpose (add column, rename column, create index, ...) has one
//! [`StatementTemplate`]: a mapping from dialect id (or the `General`
//! sentinel) to a placeholder-bearing statement string. Resolution tries
//! the dialect first, then `General`; when neither exists the operation is
//! skipped by the caller.
//!
//! The [`TemplateStore`] is immutable after construction. Build it once at
//! process start with [`TemplateStore::builtin`] and pass it by reference
//! into the facade and the generators; there is no lazy global state.
//!
//! # Placeholder substitution order
//!
//! [`fill`] applies replacements strictly in the order given. Builders
//! pass the table name first, then column/constraint names, then value
//! placeholders (defaults, comments, cascade keyword), so a later
//! substitution never runs before the text it must not match has been
//! consumed.

use indexmap::IndexMap;

use crate::dialect::DialectId;

/// Placeholder for the qualified table name. Always substituted first.
pub const PH_TABLE_NAME: &str = "%table_name%";
/// Placeholder for a column name.
pub const PH_COLUMN_NAME: &str = "%column_name%";
/// Placeholder for the new column name in a rename.
pub const PH_NEW_COLUMN_NAME: &str = "%new_column_name%";
/// Placeholder for a constraint name.
pub const PH_CONSTRAINT_NAME: &str = "%constraint_name%";
/// Placeholder for an index name.
pub const PH_INDEX_NAME: &str = "%index_name%";
/// Placeholder for a comma-separated column list.
pub const PH_COLUMN_LIST: &str = "%column_list%";
/// Placeholder for the referenced table of a foreign key.
pub const PH_REF_TABLE: &str = "%ref_table%";
/// Placeholder for the referenced column list of a foreign key.
pub const PH_REF_COLUMN_LIST: &str = "%ref_column_list%";
/// Placeholder for a rendered data type.
pub const PH_DATA_TYPE: &str = "%data_type%";
/// Placeholder for a default value expression.
pub const PH_DEFAULT_VALUE: &str = "%default_value%";
/// Placeholder for comment text (already quote-escaped by the caller).
pub const PH_COMMENT: &str = "%comment%";
/// Placeholder for the UNIQUE keyword slot in CREATE INDEX.
pub const PH_UNIQUE: &str = "%unique%";
/// Placeholder for the cascade keyword slot in DROP TABLE.
pub const PH_CASCADE: &str = "%cascade%";

/// Substitute placeholders in order.
///
/// Every `(placeholder, value)` pair is applied left to right; the fixed
/// order is part of the template contract (see module docs).
pub fn fill(template: &str, values: &[(&str, &str)]) -> String {
    let mut out = template.to_string();
    for (placeholder, value) in values {
        out = out.replace(placeholder, value);
    }
    out
}

/// The DDL purposes the engine generates statements for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum TemplateKind {
    AddColumn,
    AlterColumnType,
    RenameColumn,
    SetNotNull,
    DropNotNull,
    SetDefault,
    DropDefault,
    ColumnComment,
    TableComment,
    CreateIndex,
    CreatePrimaryKey,
    CreateForeignKey,
    DropTable,
}

impl TemplateKind {
    /// Statement name used in logs.
    pub fn as_str(&self) -> &'static str {
        match self {
            TemplateKind::AddColumn => "add-column",
            TemplateKind::AlterColumnType => "alter-column-type",
            TemplateKind::RenameColumn => "rename-column",
            TemplateKind::SetNotNull => "set-not-null",
            TemplateKind::DropNotNull => "drop-not-null",
            TemplateKind::SetDefault => "set-default",
            TemplateKind::DropDefault => "drop-default",
            TemplateKind::ColumnComment => "column-comment",
            TemplateKind::TableComment => "table-comment",
            TemplateKind::CreateIndex => "create-index",
            TemplateKind::CreatePrimaryKey => "create-pk",
            TemplateKind::CreateForeignKey => "create-fk",
            TemplateKind::DropTable => "drop-table",
        }
    }
}

/// Key of one entry inside a statement template.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TemplateKey {
    /// Entry for a specific dialect.
    Dialect(DialectId),
    /// Fallback entry used when no dialect-specific one exists.
    General,
}

/// One statement purpose's templates across dialects.
#[derive(Debug, Clone, Default)]
pub struct StatementTemplate {
    entries: IndexMap<TemplateKey, String>,
}

impl StatementTemplate {
    /// Create an empty template.
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder-style insertion of one entry.
    pub fn with(mut self, key: TemplateKey, text: impl Into<String>) -> Self {
        self.entries.insert(key, text.into());
        self
    }

    /// Resolve the template text for a dialect: dialect entry first, then
    /// the `General` fallback, then `None` (operation skipped).
    pub fn resolve(&self, dialect: DialectId) -> Option<&str> {
        self.entries
            .get(&TemplateKey::Dialect(dialect))
            .or_else(|| self.entries.get(&TemplateKey::General))
            .map(String::as_str)
    }
}

/// Immutable store of per-purpose template catalogs.
#[derive(Debug, Clone, Default)]
pub struct TemplateStore {
    catalogs: IndexMap<TemplateKind, StatementTemplate>,
}

impl TemplateStore {
    /// Create an empty store (tests and fully custom setups).
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder-style insertion of one purpose's template.
    pub fn with_template(mut self, kind: TemplateKind, template: StatementTemplate) -> Self {
        self.catalogs.insert(kind, template);
        self
    }

    /// Resolve the template text for a purpose and dialect.
    pub fn template(&self, kind: TemplateKind, dialect: DialectId) -> Option<&str> {
        self.catalogs.get(&kind).and_then(|t| t.resolve(dialect))
    }

    /// Whether a purpose has any template usable for the dialect.
    pub fn has_template(&self, kind: TemplateKind, dialect: DialectId) -> bool {
        self.template(kind, dialect).is_some()
    }

    /// The standard template set shipped with the engine.
    pub fn builtin() -> Self {
        use DialectId::*;
        use TemplateKey::{Dialect, General};

        let mut store = Self::new();

        store = store.with_template(
            TemplateKind::AddColumn,
            StatementTemplate::new()
                .with(General, "ALTER TABLE %table_name% ADD COLUMN %column_name% %data_type%")
                .with(Dialect(Oracle), "ALTER TABLE %table_name% ADD (%column_name% %data_type%)")
                .with(Dialect(SqlServer), "ALTER TABLE %table_name% ADD %column_name% %data_type%"),
        );

        store = store.with_template(
            TemplateKind::AlterColumnType,
            StatementTemplate::new()
                .with(Dialect(Postgres), "ALTER TABLE %table_name% ALTER COLUMN %column_name% TYPE %data_type%")
                .with(Dialect(Oracle), "ALTER TABLE %table_name% MODIFY %column_name% %data_type%")
                .with(Dialect(MySql), "ALTER TABLE %table_name% MODIFY COLUMN %column_name% %data_type%")
                .with(Dialect(SqlServer), "ALTER TABLE %table_name% ALTER COLUMN %column_name% %data_type%"),
        );

        store = store.with_template(
            TemplateKind::RenameColumn,
            StatementTemplate::new()
                .with(Dialect(Postgres), "ALTER TABLE %table_name% RENAME COLUMN %column_name% TO %new_column_name%")
                .with(Dialect(Oracle), "ALTER TABLE %table_name% RENAME COLUMN %column_name% TO %new_column_name%")
                .with(Dialect(Sqlite), "ALTER TABLE %table_name% RENAME COLUMN %column_name% TO %new_column_name%")
                .with(Dialect(MySql), "ALTER TABLE %table_name% CHANGE %column_name% %new_column_name% %data_type%")
                .with(Dialect(SqlServer), "EXEC sp_rename '%table_name%.%column_name%', '%new_column_name%', 'COLUMN'"),
        );

        store = store.with_template(
            TemplateKind::SetNotNull,
            StatementTemplate::new()
                .with(Dialect(Postgres), "ALTER TABLE %table_name% ALTER COLUMN %column_name% SET NOT NULL")
                .with(Dialect(Oracle), "ALTER TABLE %table_name% MODIFY %column_name% NOT NULL")
                .with(Dialect(MySql), "ALTER TABLE %table_name% MODIFY COLUMN %column_name% %data_type% NOT NULL")
                .with(Dialect(SqlServer), "ALTER TABLE %table_name% ALTER COLUMN %column_name% %data_type% NOT NULL"),
        );

        store = store.with_template(
            TemplateKind::DropNotNull,
            StatementTemplate::new()
                .with(Dialect(Postgres), "ALTER TABLE %table_name% ALTER COLUMN %column_name% DROP NOT NULL")
                .with(Dialect(Oracle), "ALTER TABLE %table_name% MODIFY %column_name% NULL")
                .with(Dialect(MySql), "ALTER TABLE %table_name% MODIFY COLUMN %column_name% %data_type% NULL")
                .with(Dialect(SqlServer), "ALTER TABLE %table_name% ALTER COLUMN %column_name% %data_type% NULL"),
        );

        store = store.with_template(
            TemplateKind::SetDefault,
            StatementTemplate::new()
                .with(General, "ALTER TABLE %table_name% ALTER COLUMN %column_name% SET DEFAULT %default_value%")
                .with(Dialect(Oracle), "ALTER TABLE %table_name% MODIFY %column_name% DEFAULT %default_value%")
                .with(Dialect(SqlServer), "ALTER TABLE %table_name% ADD DEFAULT %default_value% FOR %column_name%"),
        );

        store = store.with_template(
            TemplateKind::DropDefault,
            StatementTemplate::new()
                .with(Dialect(Postgres), "ALTER TABLE %table_name% ALTER COLUMN %column_name% DROP DEFAULT")
                .with(Dialect(MySql), "ALTER TABLE %table_name% ALTER COLUMN %column_name% DROP DEFAULT")
                .with(Dialect(Oracle), "ALTER TABLE %table_name% MODIFY %column_name% DEFAULT NULL"),
        );

        store = store.with_template(
            TemplateKind::ColumnComment,
            StatementTemplate::new()
                .with(Dialect(Postgres), "COMMENT ON COLUMN %table_name%.%column_name% IS '%comment%'")
                .with(Dialect(Oracle), "COMMENT ON COLUMN %table_name%.%column_name% IS '%comment%'")
                .with(Dialect(MySql), "ALTER TABLE %table_name% MODIFY COLUMN %column_name% %data_type% COMMENT '%comment%'"),
        );

        store = store.with_template(
            TemplateKind::TableComment,
            StatementTemplate::new()
                .with(Dialect(Postgres), "COMMENT ON TABLE %table_name% IS '%comment%'")
                .with(Dialect(Oracle), "COMMENT ON TABLE %table_name% IS '%comment%'")
                .with(Dialect(MySql), "ALTER TABLE %table_name% COMMENT = '%comment%'"),
        );

        store = store.with_template(
            TemplateKind::CreateIndex,
            StatementTemplate::new().with(
                General,
                "CREATE %unique%INDEX %index_name% ON %table_name% (%column_list%)",
            ),
        );

        store = store.with_template(
            TemplateKind::CreatePrimaryKey,
            StatementTemplate::new().with(
                General,
                "ALTER TABLE %table_name% ADD CONSTRAINT %constraint_name% PRIMARY KEY (%column_list%)",
            ),
        );

        store = store.with_template(
            TemplateKind::CreateForeignKey,
            StatementTemplate::new().with(
                General,
                "ALTER TABLE %table_name% ADD CONSTRAINT %constraint_name% FOREIGN KEY (%column_list%) REFERENCES %ref_table% (%ref_column_list%)",
            ),
        );

        store = store.with_template(
            TemplateKind::DropTable,
            StatementTemplate::new()
                .with(General, "DROP TABLE %table_name%%cascade%")
                .with(Dialect(Postgres), "DROP TABLE IF EXISTS %table_name%%cascade%")
                .with(Dialect(MySql), "DROP TABLE IF EXISTS %table_name%")
                .with(Dialect(Sqlite), "DROP TABLE IF EXISTS %table_name%")
                .with(Dialect(SqlServer), "IF OBJECT_ID('%table_name%', 'U') IS NOT NULL DROP TABLE %table_name%"),
        );

        store
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_resolve_prefers_dialect_over_general() {
        let t = StatementTemplate::new()
            .with(TemplateKey::General, "GENERAL")
            .with(TemplateKey::Dialect(DialectId::Oracle), "ORACLE");

        assert_eq!(t.resolve(DialectId::Oracle), Some("ORACLE"));
        assert_eq!(t.resolve(DialectId::Postgres), Some("GENERAL"));
    }

    #[test]
    fn test_resolve_absent_yields_none() {
        let t = StatementTemplate::new().with(TemplateKey::Dialect(DialectId::Postgres), "PG");
        assert_eq!(t.resolve(DialectId::MySql), None);
    }

    #[test]
    fn test_fill_applies_in_order() {
        let out = fill(
            "ALTER TABLE %table_name% ADD %column_name% %data_type%",
            &[
                (PH_TABLE_NAME, "public.users"),
                (PH_COLUMN_NAME, "age"),
                (PH_DATA_TYPE, "integer"),
            ],
        );
        assert_eq!(out, "ALTER TABLE public.users ADD age integer");
    }

    #[test]
    fn test_builtin_store_lookup() {
        let store = TemplateStore::builtin();

        let pg = store
            .template(TemplateKind::AlterColumnType, DialectId::Postgres)
            .unwrap();
        assert!(pg.contains("TYPE %data_type%"));

        // No alter-type template for SQLite and no General fallback.
        assert!(!store.has_template(TemplateKind::AlterColumnType, DialectId::Sqlite));

        // Generic dialects pick up the General add-column form.
        let generic = store
            .template(TemplateKind::AddColumn, DialectId::Generic)
            .unwrap();
        assert!(generic.contains("ADD COLUMN"));
    }

    #[test]
    fn test_builtin_drop_default_missing_for_sqlserver() {
        let store = TemplateStore::builtin();
        assert!(!store.has_template(TemplateKind::DropDefault, DialectId::SqlServer));
        assert!(store.has_template(TemplateKind::SetDefault, DialectId::SqlServer));
    }
}
