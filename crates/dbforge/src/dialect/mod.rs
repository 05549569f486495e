//! Dialect identity and capability queries (Strategy pattern).
//!
//! A [`Dialect`] is a single immutable value object built once per
//! connection. It replaces scattered per-product boolean flags with named
//! capability queries: quoting rules, stored identifier case, inline
//! constraint support, the cascade keyword for drops, and DDL transaction
//! behavior. Everything downstream (template resolution, DDL synthesis,
//! delete generation) dispatches on it.

use std::collections::HashSet;

use serde::{Deserialize, Serialize};

use crate::core::identifier::IdentifierCase;
use crate::core::traits::Connection;

/// Identified database product family.
///
/// Derived from the connection's reported product name; products the
/// engine has no profile for map to [`DialectId::Generic`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum DialectId {
    Postgres,
    Oracle,
    MySql,
    SqlServer,
    Sqlite,
    Generic,
}

impl DialectId {
    /// Derive the dialect id from a product name.
    ///
    /// The name is lower-cased and stripped of punctuation/whitespace
    /// before matching, so "Microsoft SQL Server", "sql_server" and
    /// "SQLServer" all map the same way.
    pub fn from_product_name(product: &str) -> Self {
        let normalized: String = product
            .to_lowercase()
            .chars()
            .filter(|c| c.is_ascii_alphanumeric())
            .collect();

        if normalized.contains("postgres") {
            DialectId::Postgres
        } else if normalized.contains("oracle") {
            DialectId::Oracle
        } else if normalized.contains("mysql") || normalized.contains("mariadb") {
            DialectId::MySql
        } else if normalized.contains("sqlserver") || normalized.contains("mssql") {
            DialectId::SqlServer
        } else if normalized.contains("sqlite") {
            DialectId::Sqlite
        } else {
            DialectId::Generic
        }
    }

    /// Stable identifier string, used as the template catalog key.
    pub fn as_str(&self) -> &'static str {
        match self {
            DialectId::Postgres => "postgres",
            DialectId::Oracle => "oracle",
            DialectId::MySql => "mysql",
            DialectId::SqlServer => "sqlserver",
            DialectId::Sqlite => "sqlite",
            DialectId::Generic => "generic",
        }
    }
}

impl std::fmt::Display for DialectId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Immutable behavior profile for one connection's database product.
///
/// Built once at connect time from the product identity plus the
/// connection's reported quoting rules and reserved words.
#[derive(Debug, Clone)]
pub struct Dialect {
    id: DialectId,
    open_quote: char,
    close_quote: char,
    stored_case: IdentifierCase,
    reserved_words: HashSet<String>,
}

impl Dialect {
    /// Build the dialect profile for a connection.
    pub fn from_connection(conn: &dyn Connection) -> Self {
        let id = DialectId::from_product_name(&conn.product_name());
        Self::with_id(id, conn.quote_char(), conn.stored_case(), conn.reserved_words())
    }

    /// Build a profile from explicit parts (used by tests and callers
    /// that know the product up front).
    pub fn with_id(
        id: DialectId,
        quote_char: char,
        stored_case: IdentifierCase,
        reserved_words: Vec<String>,
    ) -> Self {
        // SQL Server brackets are asymmetric; everything else closes with
        // the opening character.
        let (open_quote, close_quote) = match id {
            DialectId::SqlServer => ('[', ']'),
            _ => (quote_char, quote_char),
        };

        let reserved_words = reserved_words
            .into_iter()
            .map(|w| w.to_lowercase())
            .collect();

        Self {
            id,
            open_quote,
            close_quote,
            stored_case,
            reserved_words,
        }
    }

    /// Profile with the product's default quoting and case rules, without
    /// a live connection.
    pub fn builtin(id: DialectId) -> Self {
        let stored_case = match id {
            DialectId::Oracle => IdentifierCase::Upper,
            DialectId::Postgres => IdentifierCase::Lower,
            _ => IdentifierCase::Mixed,
        };
        let quote = match id {
            DialectId::MySql => '`',
            _ => '"',
        };
        Self::with_id(id, quote, stored_case, Vec::new())
    }

    /// The dialect identity.
    pub fn id(&self) -> DialectId {
        self.id
    }

    /// The opening identifier quote character.
    pub fn quote_char(&self) -> char {
        self.open_quote
    }

    /// Case-folding behavior for unquoted identifiers.
    pub fn stored_case(&self) -> IdentifierCase {
        self.stored_case
    }

    /// Whether PRIMARY KEY / FOREIGN KEY clauses are emitted inside the
    /// CREATE TABLE statement rather than as separate ALTER statements.
    pub fn supports_inline_constraints(&self) -> bool {
        matches!(
            self.id,
            DialectId::Postgres | DialectId::MySql | DialectId::Sqlite
        )
    }

    /// The keyword appended to DROP TABLE to cascade to dependents, for
    /// dialects that have one.
    pub fn cascade_drop_keyword(&self) -> Option<&'static str> {
        match self.id {
            DialectId::Postgres => Some("CASCADE"),
            DialectId::Oracle => Some("CASCADE CONSTRAINTS"),
            _ => None,
        }
    }

    /// Whether the DEFAULT clause must precede NULL/NOT NULL in a column
    /// definition.
    pub fn default_before_null(&self) -> bool {
        matches!(self.id, DialectId::Oracle | DialectId::Postgres)
    }

    /// Whether DDL runs inside explicit transactions that must be
    /// committed, and rolled back on failure or cancellation.
    pub fn requires_ddl_transactions(&self) -> bool {
        matches!(self.id, DialectId::Postgres)
    }

    /// True when the name is already wrapped in this dialect's quotes.
    pub fn is_quoted(&self, name: &str) -> bool {
        name.len() >= 2 && name.starts_with(self.open_quote) && name.ends_with(self.close_quote)
    }

    /// Quote a name unconditionally, doubling embedded closing quotes.
    pub fn quote(&self, name: &str) -> String {
        let escaped = name.replace(
            self.close_quote,
            &format!("{}{}", self.close_quote, self.close_quote),
        );
        format!("{}{}{}", self.open_quote, escaped, self.close_quote)
    }

    /// Quote a name only when the product requires it.
    ///
    /// A name needs quoting when it is a reserved word, contains a
    /// character outside `[A-Za-z0-9_]`, or does not match the stored
    /// identifier case. Already-quoted names pass through unchanged, so
    /// the operation is idempotent.
    pub fn quote_if_needed(&self, name: &str) -> String {
        if self.is_quoted(name) {
            return name.to_string();
        }

        let is_reserved = self.reserved_words.contains(&name.to_lowercase());
        let has_special = name
            .chars()
            .any(|c| !c.is_ascii_alphanumeric() && c != '_');
        let case_mismatch = !self.stored_case.matches(name);

        if is_reserved || has_special || case_mismatch {
            self.quote(name)
        } else {
            name.to_string()
        }
    }

    /// Quote each part of a dotted name as needed.
    pub fn quote_qualified(&self, parts: &[&str]) -> String {
        parts
            .iter()
            .map(|p| self.quote_if_needed(p))
            .collect::<Vec<_>>()
            .join(".")
    }
}
