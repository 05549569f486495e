//! Error types for the metadata and script-synthesis engine.

use thiserror::Error;

/// Main error type for metadata and script generation operations.
#[derive(Error, Debug)]
pub enum ForgeError {
    /// Configuration error (invalid YAML, bad option values, etc.)
    #[error("Configuration error: {0}")]
    Config(String),

    /// The underlying connection reported a failure.
    #[error("Connection error: {0}")]
    Connection(String),

    /// A metadata lookup failed at the driver level.
    #[error("Introspection failed for {context}: {message}")]
    Introspection { context: String, message: String },

    /// A generated statement failed during execution.
    #[error("Statement execution failed: {message}\n  Statement: {statement}")]
    Execution { statement: String, message: String },

    /// An identifier failed validation (empty, null byte, too long).
    #[error("Invalid identifier: {0}")]
    Identifier(String),

    /// Script execution was cancelled by the caller.
    #[error("Script execution cancelled")]
    Cancelled,

    /// IO error (file operations)
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// YAML serialization/deserialization error
    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    /// JSON serialization/deserialization error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl ForgeError {
    /// Create an Introspection error with context about the failed lookup.
    pub fn introspection(context: impl Into<String>, message: impl Into<String>) -> Self {
        ForgeError::Introspection {
            context: context.into(),
            message: message.into(),
        }
    }

    /// Create an Execution error for a failed statement.
    pub fn execution(statement: impl Into<String>, message: impl Into<String>) -> Self {
        ForgeError::Execution {
            statement: statement.into(),
            message: message.into(),
        }
    }

    /// Format error with full details including error chain
    pub fn format_detailed(&self) -> String {
        let mut output = format!("Error: {}\n", self);

        let mut source = std::error::Error::source(self);
        let mut depth = 1;
        while let Some(err) = source {
            output.push_str(&format!("\nCaused by:\n  {}: {}", depth, err));
            source = err.source();
            depth += 1;
        }

        output
    }
}

/// Result type alias for engine operations.
pub type Result<T> = std::result::Result<T, ForgeError>;
