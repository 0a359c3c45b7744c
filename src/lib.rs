//! Native wire-protocol driver for the Luna in-memory columnar engine.
//!
//! Luna speaks a minimal line-oriented control protocol (status, error,
//! integer and bulk frames) over raw TCP and returns result data as an
//! embedded Arrow IPC stream, disambiguated purely by the first response
//! byte. Each [`Connection`] is a strictly synchronous, half-duplex
//! session: one command in flight, full response drained before the next
//! send.
//!
//! # Example
//! ```ignore
//! use luna_driver::{Connector, Value};
//!
//! let connector = Connector::new("luna://localhost:7688")?;
//! let mut conn = connector.connect()?;
//!
//! let mut rows = conn.query("SELECT id, name FROM users")?;
//! while let Some(row) = rows.next()? {
//!     println!("{:?} {:?}", row[0], row[1]);
//! }
//! rows.close();
//! conn.close()?;
//! ```

pub mod auth;
pub mod batch;
pub mod cmd;
pub mod connection;
pub mod connector;
pub mod decoder;
pub mod driver;
pub mod encoder;
pub mod error;
pub mod result;
pub mod rows;
pub mod statement;
pub mod transaction;
pub mod value;

pub use cmd::{Command, CommandKind};
pub use connection::Connection;
pub use connector::Connector;
pub use decoder::Frame;
pub use driver::Driver;
pub use error::{LunaError, LunaResult};
pub use result::ExecResult;
pub use rows::Rows;
pub use statement::{Param, Statement};
pub use transaction::Transaction;
pub use value::Value;
