//! Driver entry point.
//!
//! There is no import-time registration: the host application constructs
//! a [`Driver`] value during its own startup and hands it to whatever
//! driver registry it keeps.

use crate::connection::Connection;
use crate::connector::Connector;
use crate::error::LunaResult;

/// The Luna protocol implementation, as a value.
#[derive(Debug, Clone, Copy, Default)]
pub struct Driver;

impl Driver {
    /// Suggested registry name.
    pub const NAME: &'static str = "luna";

    /// Parse a DSN and open a ready session.
    pub fn open(&self, dsn: &str) -> LunaResult<Connection> {
        self.open_connector(dsn)?.connect()
    }

    /// Parse a DSN into a reusable connector.
    pub fn open_connector(&self, dsn: &str) -> LunaResult<Connector> {
        Connector::new(dsn)
    }
}
