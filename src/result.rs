//! Execute command results.

use crate::error::{LunaError, LunaResult};

/// Result of an execute command.
///
/// The server never reports affected row counts, so `rows_affected` is
/// always 0. This is a protocol limitation, not a driver defect.
#[derive(Debug, Clone, Copy, Default)]
pub struct ExecResult {
    rows_affected: i64,
}

impl ExecResult {
    pub(crate) fn new() -> Self {
        Self { rows_affected: 0 }
    }

    pub fn rows_affected(&self) -> i64 {
        self.rows_affected
    }

    /// The server has no notion of insert ids.
    pub fn last_insert_id(&self) -> LunaResult<i64> {
        Err(LunaError::Unsupported("last insert id"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_last_insert_id_reports_unsupported() {
        let result = ExecResult::new();
        assert_eq!(result.rows_affected(), 0);
        assert!(matches!(
            result.last_insert_id(),
            Err(LunaError::Unsupported(_))
        ));
    }
}
