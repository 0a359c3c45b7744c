//! Transaction shim.
//!
//! The server keeps no session state between commands, so
//! `BEGIN TRANSACTION` / `COMMIT TRANSACTION` / `ROLLBACK` are sent as
//! literal commands and the driver only tracks a boolean flag. No
//! atomicity is provided beyond what the server itself offers
//! (documented as none).

use crate::connection::Connection;
use crate::error::{LunaError, LunaResult};

impl Connection {
    /// Start a transaction. Errors if one is already flagged open.
    pub fn begin(&mut self) -> LunaResult<Transaction<'_>> {
        if self.tx_open {
            return Err(LunaError::Misuse(
                "there is already an open transaction".into(),
            ));
        }
        self.exec("BEGIN TRANSACTION")?;
        self.tx_open = true;
        Ok(Transaction { conn: self })
    }

    /// Commit the flagged transaction. Errors if none is open.
    pub fn commit(&mut self) -> LunaResult<()> {
        if !self.tx_open {
            return Err(LunaError::Misuse("commit without an open transaction".into()));
        }
        self.tx_open = false;
        self.exec("COMMIT TRANSACTION")?;
        Ok(())
    }

    /// Roll back the flagged transaction. Errors if none is open.
    pub fn rollback(&mut self) -> LunaResult<()> {
        if !self.tx_open {
            return Err(LunaError::Misuse(
                "rollback without an open transaction".into(),
            ));
        }
        self.tx_open = false;
        self.exec("ROLLBACK")?;
        Ok(())
    }
}

/// A pass-through handle for the duration of a flagged transaction.
pub struct Transaction<'c> {
    conn: &'c mut Connection,
}

impl<'c> Transaction<'c> {
    /// Run statements inside the transaction.
    pub fn connection(&mut self) -> &mut Connection {
        self.conn
    }

    pub fn commit(self) -> LunaResult<()> {
        self.conn.commit()
    }

    pub fn rollback(self) -> LunaResult<()> {
        self.conn.rollback()
    }
}
