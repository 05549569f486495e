//! Script execution with cooperative cancellation.
//!
//! [`ScriptExecutor`] runs a statement-separated script through the
//! connection, one statement at a time. A [`CancellationToken`] is
//! checked between statements and [`Connection::cancel`] is invoked for
//! the statement in flight, so a cancel request interrupts only the
//! current statement. When the dialect requires explicit DDL
//! transactions, the run is wrapped in begin/commit and any failure or
//! cancellation rolls back before the error propagates.
//!
//! No timeout is enforced here; timeouts, if any, come from the
//! underlying driver.

use std::sync::Arc;

use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

use crate::config::GeneratorOptions;
use crate::core::traits::Connection;
use crate::dialect::Dialect;
use crate::error::{ForgeError, Result};

/// Outcome of a completed script run.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ExecutionReport {
    /// Number of statements executed.
    pub statements_run: usize,

    /// Sum of affected row counts reported by the driver.
    pub rows_affected: u64,
}

/// Split a script into statements on the separator, honoring
/// single-quoted literals and double-quoted identifiers.
pub fn split_statements(script: &str, separator: &str) -> Vec<String> {
    if separator.is_empty() {
        let trimmed = script.trim();
        return if trimmed.is_empty() {
            Vec::new()
        } else {
            vec![trimmed.to_string()]
        };
    }

    let mut statements = Vec::new();
    let mut current = String::new();
    let mut in_single = false;
    let mut in_double = false;

    let chars: Vec<char> = script.chars().collect();
    let sep: Vec<char> = separator.chars().collect();
    let mut i = 0;

    while i < chars.len() {
        let c = chars[i];
        match c {
            '\'' if !in_double => in_single = !in_single,
            '"' if !in_single => in_double = !in_double,
            _ => {}
        }

        if !in_single && !in_double && chars[i..].starts_with(sep.as_slice()) {
            statements.push(std::mem::take(&mut current));
            i += sep.len();
            continue;
        }

        current.push(c);
        i += 1;
    }
    statements.push(current);

    statements
        .into_iter()
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
        .collect()
}

/// Runs generated scripts against one connection.
pub struct ScriptExecutor {
    conn: Arc<dyn Connection>,
    requires_transaction: bool,
    separator: String,
    cancel: CancellationToken,
}

impl ScriptExecutor {
    /// Create an executor for a connection.
    pub fn new(conn: Arc<dyn Connection>, dialect: &Dialect, options: &GeneratorOptions) -> Self {
        Self {
            conn,
            requires_transaction: dialect.requires_ddl_transactions(),
            separator: options.statement_separator.clone(),
            cancel: CancellationToken::new(),
        }
    }

    /// A handle another thread can use to cancel the run.
    pub fn cancel_handle(&self) -> CancellationToken {
        self.cancel.clone()
    }

    /// Request cancellation: stop after the statement in flight, and ask
    /// the driver to interrupt that statement.
    pub fn cancel(&self) {
        self.cancel.cancel();
        self.conn.cancel();
    }

    /// Run a script, statement by statement.
    ///
    /// # Errors
    ///
    /// Returns [`ForgeError::Cancelled`] when cancellation was requested,
    /// or [`ForgeError::Execution`] for the first failing statement. In
    /// both cases an explicit rollback ran first when the dialect
    /// requires DDL transactions.
    pub fn run(&self, script: &str) -> Result<ExecutionReport> {
        let statements = split_statements(script, &self.separator);
        let mut report = ExecutionReport::default();

        if self.requires_transaction {
            self.conn.begin()?;
        }

        for stmt in &statements {
            if self.cancel.is_cancelled() {
                self.rollback_after("cancellation");
                return Err(ForgeError::Cancelled);
            }

            debug!("executing: {}", stmt);
            match self.conn.execute(stmt) {
                Ok(rows) => {
                    report.statements_run += 1;
                    report.rows_affected += rows;
                }
                Err(e) => {
                    self.rollback_after("statement failure");
                    return Err(ForgeError::execution(stmt.clone(), e.to_string()));
                }
            }
        }

        if self.requires_transaction {
            self.conn.commit()?;
        }
        Ok(report)
    }

    fn rollback_after(&self, reason: &str) {
        if !self.requires_transaction {
            return;
        }
        if let Err(e) = self.conn.rollback() {
            warn!("rollback after {} failed: {}", reason, e);
        }
    }
}
