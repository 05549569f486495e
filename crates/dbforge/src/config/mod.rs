//! Generator options loading and validation.

use serde::{Deserialize, Serialize};
use std::path::Path;

use crate::error::{ForgeError, Result};

/// Options controlling script synthesis.
///
/// Loaded once (from YAML or built in code) and shared by the generators.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GeneratorOptions {
    /// Separator appended after each generated statement.
    pub statement_separator: String,

    /// Emit a DROP TABLE before CREATE TABLE.
    pub include_drop: bool,

    /// Use the dialect's cascade keyword on generated drops, when it has
    /// one.
    pub use_cascade: bool,

    /// Emit COMMENT statements even for empty comment text.
    pub include_empty_comments: bool,

    /// Emit GRANT statements.
    pub include_grants: bool,
}

impl Default for GeneratorOptions {
    fn default() -> Self {
        Self {
            statement_separator: ";".to_string(),
            include_drop: false,
            use_cascade: false,
            include_empty_comments: false,
            include_grants: true,
        }
    }
}

impl GeneratorOptions {
    /// Load options from a YAML file.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        Self::from_yaml(&content)
    }

    /// Parse options from a YAML string.
    pub fn from_yaml(yaml: &str) -> Result<Self> {
        let options: GeneratorOptions = serde_yaml::from_str(yaml)?;
        options.validate()?;
        Ok(options)
    }

    /// Validate the options.
    pub fn validate(&self) -> Result<()> {
        if self.statement_separator.trim().is_empty() {
            return Err(ForgeError::Config(
                "statement_separator must not be empty".to_string(),
            ));
        }
        Ok(())
    }
}
