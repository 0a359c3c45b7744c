//! Prepared statement shim.
//!
//! Statements bind a fixed SQL text to a session and forward to it.
//! Parameter binding is not interpolated client-side: arguments pass
//! through for interface compatibility only, and `?` placeholders are a
//! server-side concern. The parameter count is unknown to the driver.

use tracing::debug;

use crate::connection::Connection;
use crate::error::{LunaError, LunaResult};
use crate::result::ExecResult;
use crate::rows::Rows;
use crate::value::Value;

/// A positional argument: a value with its 1-based ordinal.
#[derive(Debug, Clone)]
pub struct Param {
    pub ordinal: usize,
    pub value: Value,
}

impl Connection {
    /// Bind SQL text to this session.
    pub fn prepare(&mut self, sql: &str) -> LunaResult<Statement<'_>> {
        if self.is_closed() {
            return Err(LunaError::Connection("connection is closed".into()));
        }
        Ok(Statement {
            conn: self,
            sql: sql.to_string(),
            closed: false,
        })
    }
}

/// A statement bound to a fixed SQL text.
pub struct Statement<'c> {
    conn: &'c mut Connection,
    sql: String,
    closed: bool,
}

impl<'c> Statement<'c> {
    fn ensure_open(&self) -> LunaResult<()> {
        if self.closed {
            return Err(LunaError::Misuse("statement is closed".into()));
        }
        Ok(())
    }

    /// Number of placeholder parameters; unknown for this protocol.
    pub fn num_input(&self) -> Option<usize> {
        None
    }

    pub fn query(&mut self, params: &[Param]) -> LunaResult<Rows> {
        self.ensure_open()?;
        if !params.is_empty() {
            debug!(count = params.len(), "parameters are not interpolated client-side");
        }
        self.conn.query(&self.sql)
    }

    pub fn exec(&mut self, params: &[Param]) -> LunaResult<ExecResult> {
        self.ensure_open()?;
        if !params.is_empty() {
            debug!(count = params.len(), "parameters are not interpolated client-side");
        }
        self.conn.exec(&self.sql)
    }

    /// Close the statement. A second close is a misuse error.
    pub fn close(&mut self) -> LunaResult<()> {
        if self.closed {
            return Err(LunaError::Misuse("statement already closed".into()));
        }
        self.closed = true;
        Ok(())
    }
}
