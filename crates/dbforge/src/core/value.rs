//! Scalar value and tabular result types for raw introspection queries.
//!
//! Dialect readers issue catalog SQL through [`Connection::query`] and get
//! back a [`ResultRows`]: an ordered column-name list plus rows of owned
//! [`SqlValue`]s. Metadata queries move small amounts of data, so values
//! are always owned.
//!
//! [`Connection::query`]: crate::core::traits::Connection::query

use serde::{Deserialize, Serialize};

/// Owned scalar value returned by a raw introspection query.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum SqlValue {
    /// SQL NULL.
    Null,

    /// Boolean value.
    Bool(bool),

    /// Integer value (covers smallint, int, bigint).
    Int(i64),

    /// Floating point value.
    Float(f64),

    /// Text/string data.
    Text(String),
}

impl SqlValue {
    /// True when the value is SQL NULL.
    pub fn is_null(&self) -> bool {
        matches!(self, SqlValue::Null)
    }

    /// Get the value as a string slice, if it is text.
    pub fn as_str(&self) -> Option<&str> {
        match self {
            SqlValue::Text(s) => Some(s),
            _ => None,
        }
    }

    /// Get the value as an integer, if it is one.
    pub fn as_int(&self) -> Option<i64> {
        match self {
            SqlValue::Int(v) => Some(*v),
            _ => None,
        }
    }

    /// Render the value as display text, NULL included.
    ///
    /// Used for tabular output; not SQL-literal quoting.
    pub fn display(&self) -> String {
        match self {
            SqlValue::Null => String::new(),
            SqlValue::Bool(v) => v.to_string(),
            SqlValue::Int(v) => v.to_string(),
            SqlValue::Float(v) => v.to_string(),
            SqlValue::Text(v) => v.clone(),
        }
    }
}

impl From<&str> for SqlValue {
    fn from(v: &str) -> Self {
        SqlValue::Text(v.to_string())
    }
}

impl From<String> for SqlValue {
    fn from(v: String) -> Self {
        SqlValue::Text(v)
    }
}

impl From<i64> for SqlValue {
    fn from(v: i64) -> Self {
        SqlValue::Int(v)
    }
}

impl From<bool> for SqlValue {
    fn from(v: bool) -> Self {
        SqlValue::Bool(v)
    }
}

/// Tabular result of a raw introspection query.
///
/// Column order is fixed by the query that produced the result and rows
/// preserve retrieval order.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ResultRows {
    /// Column names in result order.
    pub columns: Vec<String>,

    /// Row data; every row has one value per column.
    pub rows: Vec<Vec<SqlValue>>,
}

impl ResultRows {
    /// Create an empty result with the given column names.
    pub fn new(columns: Vec<String>) -> Self {
        Self {
            columns,
            rows: Vec::new(),
        }
    }

    /// Number of rows in the result.
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    /// True when the result has no rows.
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Find the index of a column by name (case-insensitive).
    pub fn column_index(&self, name: &str) -> Option<usize> {
        self.columns
            .iter()
            .position(|c| c.eq_ignore_ascii_case(name))
    }

    /// Get a value by row index and column name.
    ///
    /// Returns `None` when the row or column does not exist.
    pub fn value(&self, row: usize, column: &str) -> Option<&SqlValue> {
        let idx = self.column_index(column)?;
        self.rows.get(row)?.get(idx)
    }

    /// Get a text value by row index and column name.
    pub fn text(&self, row: usize, column: &str) -> Option<&str> {
        self.value(row, column).and_then(SqlValue::as_str)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_value_accessors() {
        assert!(SqlValue::Null.is_null());
        assert_eq!(SqlValue::from("abc").as_str(), Some("abc"));
        assert_eq!(SqlValue::from(42i64).as_int(), Some(42));
        assert_eq!(SqlValue::Text("x".into()).as_int(), None);
    }

    #[test]
    fn test_result_rows_lookup() {
        let mut rows = ResultRows::new(vec!["name".to_string(), "kind".to_string()]);
        rows.rows
            .push(vec![SqlValue::from("users"), SqlValue::from("TABLE")]);

        assert_eq!(rows.len(), 1);
        assert_eq!(rows.column_index("KIND"), Some(1));
        assert_eq!(rows.text(0, "name"), Some("users"));
        assert_eq!(rows.text(0, "missing"), None);
        assert_eq!(rows.text(1, "name"), None);
    }

    #[test]
    fn test_display_null_is_empty() {
        assert_eq!(SqlValue::Null.display(), "");
        assert_eq!(SqlValue::Int(7).display(), "7");
    }
}
