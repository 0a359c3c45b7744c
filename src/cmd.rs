//! Commands sent to the Luna server.

/// The two command kinds Luna understands.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CommandKind {
    /// `q:` — a statement expected to produce rows (SELECT).
    Query,
    /// `x:` — DDL/DML executed for its side effects.
    Execute,
}

impl CommandKind {
    /// Wire prefix prepended to the SQL text inside the bulk frame.
    pub(crate) fn prefix(self) -> &'static str {
        match self {
            CommandKind::Query => "q:",
            CommandKind::Execute => "x:",
        }
    }
}

/// One command, mapping to exactly one wire frame. Immutable once built.
#[derive(Debug, Clone)]
pub struct Command {
    pub kind: CommandKind,
    pub text: String,
}

impl Command {
    pub fn query(sql: &str) -> Self {
        Self {
            kind: CommandKind::Query,
            text: sql.to_string(),
        }
    }

    pub fn execute(sql: &str) -> Self {
        Self {
            kind: CommandKind::Execute,
            text: sql.to_string(),
        }
    }
}
