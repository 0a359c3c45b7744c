//! Error types for the Luna driver.

use thiserror::Error;

/// Luna driver error taxonomy.
///
/// Nothing is retried internally; every failure surfaces to the immediate
/// caller. `Misuse` marks caller bugs (closed handles, stray commits) as
/// opposed to runtime faults.
#[derive(Debug, Error)]
pub enum LunaError {
    /// Dial failure or a socket that went away mid-operation. The host
    /// pool should discard the session and redial.
    #[error("connection error: {0}")]
    Connection(String),

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    /// Unrecognized tag byte, malformed continuation marker, truncated
    /// stream block. Fatal for the session: the byte stream is no longer
    /// synchronized.
    #[error("protocol error: {0}")]
    Protocol(String),

    /// Error reported by the server in a `-` frame, surfaced verbatim.
    #[error("luna server error: {0}")]
    Server(String),

    #[error("authentication failed: {0}")]
    Auth(String),

    /// Unsupported column type or a cell that cannot be materialized.
    #[error("decode error: {0}")]
    Decode(String),

    /// Caller bug: operating on a closed handle, double commit, etc.
    #[error("misuse: {0}")]
    Misuse(String),

    #[error("not supported: {0}")]
    Unsupported(&'static str),
}

impl LunaError {
    /// True when the session backing the failed call should be discarded
    /// rather than reused.
    pub fn is_bad_connection(&self) -> bool {
        matches!(
            self,
            LunaError::Connection(_) | LunaError::Io(_) | LunaError::Protocol(_)
        )
    }
}

/// Result type for Luna driver operations.
pub type LunaResult<T> = Result<T, LunaError>;
