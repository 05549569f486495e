//! Schema metadata types for tables, columns, indexes, and constraints.
//!
//! These types provide a database-agnostic representation of schema
//! metadata used throughout the engine. Raw driver rows (one per
//! constraint/column pair for foreign keys) are normalized here into
//! grouped definitions with deterministic ordering.

use indexmap::{IndexMap, IndexSet};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::identifier::TableIdentifier;

/// Represents a primary key value of various types.
///
/// This enum allows handling different key types uniformly when building
/// WHERE clauses for generated DELETE scripts.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum KeyValue {
    /// Absent value; rendered as a NULL test.
    Null,
    /// Integer key (covers int, bigint, smallint).
    Int(i64),
    /// UUID/GUID key.
    Uuid(Uuid),
    /// String key (varchar, char, etc.).
    Text(String),
}

impl KeyValue {
    /// Convert to a SQL literal string for use in generated WHERE clauses.
    ///
    /// Single quotes are doubled. Generated delete scripts embed literals
    /// so the script text stays self-contained and displayable.
    pub fn to_sql_literal(&self) -> String {
        match self {
            KeyValue::Null => "NULL".to_string(),
            KeyValue::Int(v) => v.to_string(),
            KeyValue::Uuid(v) => format!("'{}'", v),
            KeyValue::Text(v) => format!("'{}'", v.replace('\'', "''")),
        }
    }

    /// Convert to a SQL literal with the `N` Unicode prefix for string
    /// values (SQL Server).
    pub fn to_unicode_literal(&self) -> String {
        match self {
            KeyValue::Text(v) => format!("N'{}'", v.replace('\'', "''")),
            other => other.to_sql_literal(),
        }
    }

    /// True when the value is absent.
    pub fn is_null(&self) -> bool {
        matches!(self, KeyValue::Null)
    }
}

impl From<i64> for KeyValue {
    fn from(v: i64) -> Self {
        KeyValue::Int(v)
    }
}

impl From<i32> for KeyValue {
    fn from(v: i32) -> Self {
        KeyValue::Int(v as i64)
    }
}

impl From<Uuid> for KeyValue {
    fn from(v: Uuid) -> Self {
        KeyValue::Uuid(v)
    }
}

impl From<&str> for KeyValue {
    fn from(v: &str) -> Self {
        KeyValue::Text(v.to_string())
    }
}

/// Column metadata.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ColumnDef {
    /// Column name.
    pub name: String,

    /// Generic SQL type code (java.sql.Types-style numeric code as
    /// reported by the driver).
    pub type_code: i32,

    /// Dialect-specific type string (e.g. "varchar(40)", "number(10,2)").
    pub dialect_type: String,

    /// Column size for string/binary types.
    pub size: i32,

    /// Decimal digits for numeric types.
    pub decimal_digits: i32,

    /// Whether the column allows NULL.
    pub is_nullable: bool,

    /// Default value expression text, if any.
    pub default_value: Option<String>,

    /// Column comment, if any.
    pub comment: Option<String>,

    /// Ordinal position (1-based).
    pub ordinal_pos: i32,

    /// Whether the column is part of the primary key.
    pub is_primary_key: bool,
}

impl ColumnDef {
    /// Create a column with the given name and dialect type; remaining
    /// fields take neutral values.
    pub fn new(name: impl Into<String>, dialect_type: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            type_code: 0,
            dialect_type: dialect_type.into(),
            size: 0,
            decimal_digits: 0,
            is_nullable: true,
            default_value: None,
            comment: None,
            ordinal_pos: 0,
            is_primary_key: false,
        }
    }

    /// The default value with surrounding whitespace trimmed, if present
    /// and non-empty.
    pub fn trimmed_default(&self) -> Option<&str> {
        self.default_value
            .as_deref()
            .map(str::trim)
            .filter(|d| !d.is_empty())
    }

    /// The comment with surrounding whitespace trimmed, if present and
    /// non-empty.
    pub fn trimmed_comment(&self) -> Option<&str> {
        self.comment
            .as_deref()
            .map(str::trim)
            .filter(|c| !c.is_empty())
    }
}

/// Full definition of a table: identifier plus ordered columns.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TableDefinition {
    /// Table identifier.
    pub table: TableIdentifier,

    /// Columns ordered by ordinal position.
    pub columns: Vec<ColumnDef>,

    /// Table comment, if any.
    pub comment: Option<String>,
}

impl TableDefinition {
    /// Create a definition, sorting columns by ordinal position.
    pub fn new(table: TableIdentifier, mut columns: Vec<ColumnDef>) -> Self {
        columns.sort_by_key(|c| c.ordinal_pos);
        Self {
            table,
            columns,
            comment: None,
        }
    }

    /// Names of the primary key columns in ordinal order.
    pub fn primary_key_columns(&self) -> Vec<&str> {
        self.columns
            .iter()
            .filter(|c| c.is_primary_key)
            .map(|c| c.name.as_str())
            .collect()
    }

    /// Check if the table has a primary key.
    pub fn has_primary_key(&self) -> bool {
        self.columns.iter().any(|c| c.is_primary_key)
    }
}

/// Index metadata.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IndexDef {
    /// Index name.
    pub name: String,

    /// Indexed column names in key order.
    pub columns: Vec<String>,

    /// Whether the index is unique.
    pub is_unique: bool,

    /// Whether the index backs the primary key constraint.
    pub is_primary: bool,
}

/// Raw foreign key introspection row.
///
/// Drivers report one row per (constraint, column, referenced column)
/// triple; [`ForeignKeyDef::group_rows`] folds them into one definition
/// per constraint.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ForeignKeyRow {
    /// Constraint name.
    pub constraint: String,

    /// Local (referencing) table.
    pub table: TableIdentifier,

    /// Local column name.
    pub column: String,

    /// Referenced table.
    pub ref_table: TableIdentifier,

    /// Referenced column name.
    pub ref_column: String,

    /// ON UPDATE rule.
    pub on_update: String,

    /// ON DELETE rule.
    pub on_delete: String,
}

/// Grouped foreign key constraint.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ForeignKeyDef {
    /// Constraint name.
    pub name: String,

    /// Local (referencing) table.
    pub table: TableIdentifier,

    /// Local column names, deduplicated, in first-seen order.
    pub columns: Vec<String>,

    /// Referenced table.
    pub ref_table: TableIdentifier,

    /// Referenced column names, deduplicated, in first-seen order.
    pub ref_columns: Vec<String>,

    /// ON UPDATE rule.
    pub on_update: String,

    /// ON DELETE rule.
    pub on_delete: String,
}

impl ForeignKeyDef {
    /// Group raw driver rows into one definition per constraint.
    ///
    /// Rows are grouped by constraint name into ordered column sets:
    /// duplicate rows some drivers emit are collapsed, and output order is
    /// deterministic (first-seen order of constraints and columns).
    pub fn group_rows(rows: &[ForeignKeyRow]) -> Vec<ForeignKeyDef> {
        let mut grouped: IndexMap<String, (IndexSet<String>, IndexSet<String>, &ForeignKeyRow)> =
            IndexMap::new();

        for row in rows {
            let entry = grouped
                .entry(row.constraint.clone())
                .or_insert_with(|| (IndexSet::new(), IndexSet::new(), row));
            entry.0.insert(row.column.clone());
            entry.1.insert(row.ref_column.clone());
        }

        grouped
            .into_iter()
            .map(|(name, (columns, ref_columns, first))| ForeignKeyDef {
                name,
                table: first.table.clone(),
                columns: columns.into_iter().collect(),
                ref_table: first.ref_table.clone(),
                ref_columns: ref_columns.into_iter().collect(),
                on_update: first.on_update.clone(),
                on_delete: first.on_delete.clone(),
            })
            .collect()
    }
}

/// Named table-level constraint fragment (check constraints and similar).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TableConstraint {
    /// Constraint name.
    pub name: String,

    /// Constraint definition (SQL expression).
    pub definition: String,
}

/// Trigger metadata.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TriggerDef {
    /// Trigger name.
    pub name: String,

    /// Firing time and event, e.g. "BEFORE INSERT".
    pub event: String,

    /// Trigger body source, when the driver exposes it.
    pub source: Option<String>,
}

/// Sequence metadata.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SequenceDef {
    /// Owning schema, if any.
    pub schema: Option<String>,

    /// Sequence name.
    pub name: String,

    /// Increment step.
    pub increment: i64,

    /// Last/current value when the dialect exposes it.
    pub last_value: Option<i64>,
}

/// Synonym (alias) metadata.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SynonymDef {
    /// Owning schema, if any.
    pub schema: Option<String>,

    /// Synonym name.
    pub name: String,

    /// The object the synonym points at.
    pub target: TableIdentifier,
}

/// Stored procedure metadata.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProcedureDef {
    /// Owning schema, if any.
    pub schema: Option<String>,

    /// Procedure name.
    pub name: String,
}

/// A single grant row: one privilege for one grantee.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TableGrant {
    /// Account or role receiving the privilege.
    pub grantee: String,

    /// Privilege keyword (SELECT, INSERT, ...).
    pub privilege: String,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::identifier::IdentifierCase;

    fn ident(name: &str) -> TableIdentifier {
        TableIdentifier::qualified("public", name, IdentifierCase::Lower)
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

    #[test]
    fn test_key_value_literals() {
        assert_eq!(KeyValue::Int(42).to_sql_literal(), "42");
        assert_eq!(KeyValue::Null.to_sql_literal(), "NULL");
        assert_eq!(
            KeyValue::from("O'Brien").to_sql_literal(),
            "'O''Brien'"
        );
        assert_eq!(
            KeyValue::from("O'Brien").to_unicode_literal(),
            "N'O''Brien'"
        );
        assert_eq!(
            KeyValue::Uuid(Uuid::nil()).to_sql_literal(),
            "'00000000-0000-0000-0000-000000000000'"
        );
    }

    #[test]
    fn test_column_trimmed_accessors() {
        let mut col = ColumnDef::new("price", "numeric(10,2)");
        col.default_value = Some("  0.0  ".to_string());
        col.comment = Some("   ".to_string());
        assert_eq!(col.trimmed_default(), Some("0.0"));
        assert_eq!(col.trimmed_comment(), None);
    }

    #[test]
    fn test_table_definition_sorts_by_ordinal() {
        let mut a = ColumnDef::new("b", "int");
        a.ordinal_pos = 2;
        let mut b = ColumnDef::new("a", "int");
        b.ordinal_pos = 1;
        b.is_primary_key = true;

        let def = TableDefinition::new(ident("t"), vec![a, b]);
        assert_eq!(def.columns[0].name, "a");
        assert_eq!(def.primary_key_columns(), vec!["a"]);
        assert!(def.has_primary_key());
    }

    #[test]
    fn test_fk_grouping_collapses_duplicate_rows() {
        let rows = vec![
            fk_row("fk_orders_customer", "customer_id", "id"),
            fk_row("fk_orders_customer", "customer_id", "id"),
            fk_row("fk_orders_customer", "customer_region", "region"),
        ];

        let defs = ForeignKeyDef::group_rows(&rows);
        assert_eq!(defs.len(), 1);
        assert_eq!(defs[0].columns, vec!["customer_id", "customer_region"]);
        assert_eq!(defs[0].ref_columns, vec!["id", "region"]);
    }

    #[test]
    fn test_fk_grouping_is_deterministic() {
        let rows = vec![
            fk_row("fk_b", "b1", "x"),
            fk_row("fk_a", "a1", "y"),
            fk_row("fk_b", "b2", "z"),
        ];

        let defs = ForeignKeyDef::group_rows(&rows);
        // First-seen constraint order, not alphabetical.
        assert_eq!(defs[0].name, "fk_b");
        assert_eq!(defs[0].columns, vec!["b1", "b2"]);
        assert_eq!(defs[1].name, "fk_a");
    }
}
