//! Table identifiers with dialect-aware case normalization.
//!
//! Databases fold unquoted identifiers to a stored case (upper for Oracle,
//! lower for PostgreSQL, as-entered for SQL Server). Comparing identifiers
//! without applying that rule produces spurious mismatches, so every part
//! of a [`TableIdentifier`] is normalized exactly once at construction and
//! all equality, ordering, and hashing operate on the normalized form.

use serde::{Deserialize, Serialize};

use crate::error::{ForgeError, Result};

/// Maximum identifier length (conservative limit across databases).
/// - PostgreSQL: 63 bytes
/// - SQL Server: 128 characters
/// - Oracle: 128 bytes (12.2+)
const MAX_IDENTIFIER_LENGTH: usize = 128;

/// Case-folding behavior a database applies to unquoted identifiers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum IdentifierCase {
    /// Unquoted identifiers are stored upper-case (Oracle).
    Upper,
    /// Unquoted identifiers are stored lower-case (PostgreSQL).
    Lower,
    /// Identifiers are stored as entered (SQL Server, SQLite).
    Mixed,
}

impl IdentifierCase {
    /// Apply the folding rule to a name.
    pub fn fold(&self, name: &str) -> String {
        match self {
            IdentifierCase::Upper => name.to_uppercase(),
            IdentifierCase::Lower => name.to_lowercase(),
            IdentifierCase::Mixed => name.to_string(),
        }
    }

    /// Check whether a name already matches the stored case.
    ///
    /// Mixed-case storage matches everything.
    pub fn matches(&self, name: &str) -> bool {
        match self {
            IdentifierCase::Upper => !name.chars().any(|c| c.is_lowercase()),
            IdentifierCase::Lower => !name.chars().any(|c| c.is_uppercase()),
            IdentifierCase::Mixed => true,
        }
    }
}

/// Kind of schema object an identifier refers to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum ObjectType {
    Table,
    View,
    Synonym,
    Sequence,
    Procedure,
}

impl ObjectType {
    /// The type keyword as reported by driver metadata.
    pub fn as_str(&self) -> &'static str {
        match self {
            ObjectType::Table => "TABLE",
            ObjectType::View => "VIEW",
            ObjectType::Synonym => "SYNONYM",
            ObjectType::Sequence => "SEQUENCE",
            ObjectType::Procedure => "PROCEDURE",
        }
    }
}

/// Identifier of a table-like schema object.
///
/// All parts are stored case-normalized per the dialect's stored-identifier
/// rule, so two identifiers that differ only in case under that rule
/// compare equal. Construction is the only place normalization happens.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct TableIdentifier {
    /// Catalog (database) name, if the product exposes one.
    pub catalog: Option<String>,

    /// Schema name, if the product exposes one.
    pub schema: Option<String>,

    /// Object name.
    pub name: String,

    /// Object kind.
    pub object_type: ObjectType,
}

impl TableIdentifier {
    /// Create a normalized table identifier.
    ///
    /// Each part is folded according to `case` before being stored.
    pub fn new(
        catalog: Option<&str>,
        schema: Option<&str>,
        name: &str,
        case: IdentifierCase,
    ) -> Self {
        Self {
            catalog: catalog.map(|c| case.fold(c)),
            schema: schema.map(|s| case.fold(s)),
            name: case.fold(name),
            object_type: ObjectType::Table,
        }
    }

    /// Create a normalized identifier with an explicit object type.
    pub fn with_type(
        catalog: Option<&str>,
        schema: Option<&str>,
        name: &str,
        object_type: ObjectType,
        case: IdentifierCase,
    ) -> Self {
        let mut ident = Self::new(catalog, schema, name, case);
        ident.object_type = object_type;
        ident
    }

    /// Shorthand for a schema-qualified table in tests and simple callers.
    pub fn qualified(schema: &str, name: &str, case: IdentifierCase) -> Self {
        Self::new(None, Some(schema), name, case)
    }

    /// The dotted name without quoting, e.g. `public.users`.
    pub fn full_name(&self) -> String {
        let mut parts = Vec::with_capacity(3);
        if let Some(c) = &self.catalog {
            parts.push(c.as_str());
        }
        if let Some(s) = &self.schema {
            parts.push(s.as_str());
        }
        parts.push(self.name.as_str());
        parts.join(".")
    }
}

impl std::fmt::Display for TableIdentifier {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.full_name())
    }
}

/// Validate an identifier for security issues.
///
/// Rejects:
/// - Empty identifiers
/// - Identifiers containing null bytes (injection vector)
/// - Identifiers exceeding maximum length
///
/// # Errors
///
/// Returns `ForgeError::Identifier` with a descriptive message.
pub fn validate_identifier(name: &str) -> Result<()> {
    if name.is_empty() {
        return Err(ForgeError::Identifier(
            "Identifier cannot be empty".to_string(),
        ));
    }

    if name.contains('\0') {
        return Err(ForgeError::Identifier(format!(
            "Identifier contains null byte (possible injection attempt): {:?}",
            name
        )));
    }

    if name.len() > MAX_IDENTIFIER_LENGTH {
        return Err(ForgeError::Identifier(format!(
            "Identifier exceeds maximum length of {} bytes (got {} bytes): {:?}",
            MAX_IDENTIFIER_LENGTH,
            name.len(),
            name
        )));
    }

    Ok(())
}
