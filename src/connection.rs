//! One half-duplex protocol session bound to one TCP socket.
//!
//! A session is strictly synchronous and single-caller: `&mut self` on
//! every operation plus the drain-before-return discipline in
//! `query`/`exec` make pipelining unrepresentable. Concurrency means
//! holding several independent sessions behind the host's pool.

use std::io::{BufReader, Write};
use std::net::{Shutdown, TcpStream};

use bytes::BytesMut;
use tracing::{debug, warn};

use crate::auth;
use crate::batch;
use crate::cmd::Command;
use crate::decoder::{Frame, read_frame};
use crate::encoder::encode_command;
use crate::error::{LunaError, LunaResult};
use crate::result::ExecResult;
use crate::rows::Rows;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum State {
    Ready,
    Closed,
    /// Protocol or I/O failure mid-operation: the byte stream is no
    /// longer synchronized and every subsequent operation fails fast.
    Broken,
}

/// A live (or closed) session with the Luna server.
#[derive(Debug)]
pub struct Connection {
    stream: TcpStream,
    reader: BufReader<TcpStream>,
    state: State,
    pub(crate) tx_open: bool,
}

impl Connection {
    pub(crate) fn new(stream: TcpStream) -> LunaResult<Self> {
        let reader = BufReader::new(stream.try_clone()?);
        Ok(Self {
            stream,
            reader,
            state: State::Ready,
            tx_open: false,
        })
    }

    /// Run the auth handshake over this session's socket. Closes the
    /// socket on failure.
    pub(crate) fn handshake(&mut self, password: &str) -> LunaResult<()> {
        if let Err(e) = auth::authenticate(&mut self.reader, &mut self.stream, password) {
            warn!(error = %e, "authentication failed");
            let _ = self.close();
            return Err(e);
        }
        Ok(())
    }

    fn ensure_ready(&self) -> LunaResult<()> {
        match self.state {
            State::Ready => Ok(()),
            State::Closed => Err(LunaError::Connection("connection is closed".into())),
            State::Broken => Err(LunaError::Connection("connection is broken".into())),
        }
    }

    fn mark_broken<T>(&mut self, err: LunaError) -> LunaResult<T> {
        self.state = State::Broken;
        Err(err)
    }

    /// Send one command and read the leading response frame.
    ///
    /// At most one command is in flight at any time; a send or frame-read
    /// failure leaves the session broken.
    fn round_trip(&mut self, cmd: Command) -> LunaResult<Frame> {
        self.ensure_ready()?;
        debug!(kind = ?cmd.kind, sql = %cmd.text, "sending command");

        let mut buf = BytesMut::with_capacity(cmd.text.len() + 32);
        encode_command(&mut buf, &cmd);
        if let Err(e) = self.stream.write_all(&buf) {
            return self.mark_broken(e.into());
        }

        match read_frame(&mut self.reader) {
            Ok(frame) => Ok(frame),
            Err(e) => self.mark_broken(e),
        }
    }

    /// Execute a statement expected to produce rows.
    pub fn query(&mut self, sql: &str) -> LunaResult<Rows> {
        match self.round_trip(Command::query(sql))? {
            Frame::Stream => {
                let batches = match batch::read_stream(&mut self.reader) {
                    Ok(batches) => batches,
                    Err(e) => return self.mark_broken(e),
                };
                Rows::new(batches)
            }
            Frame::Error(msg) => Err(LunaError::Server(msg)),
            Frame::Bulk(payload) if !payload.is_empty() => {
                // Legacy path: a fully buffered stream inside a bulk frame.
                Rows::new(batch::read_buffered(&payload)?)
            }
            Frame::Ok(_) | Frame::Integer(_) | Frame::Null | Frame::Bulk(_) => Ok(Rows::empty()),
        }
    }

    /// Execute a DDL/DML statement.
    ///
    /// The server may return columnar data even here; it is drained and
    /// discarded so no unread bytes leak into the next command's framing.
    pub fn exec(&mut self, sql: &str) -> LunaResult<ExecResult> {
        match self.round_trip(Command::execute(sql))? {
            Frame::Stream => {
                if let Err(e) = batch::drain_stream(&mut self.reader) {
                    return self.mark_broken(e);
                }
            }
            Frame::Error(msg) => return Err(LunaError::Server(msg)),
            Frame::Ok(_) | Frame::Integer(_) | Frame::Null | Frame::Bulk(_) => {}
        }
        Ok(ExecResult::new())
    }

    /// Validate liveness with a trivial query.
    pub fn ping(&mut self) -> LunaResult<()> {
        let mut rows = self.query("SELECT 1")?;
        rows.close();
        Ok(())
    }

    /// Close the session and release the socket. Idempotent.
    pub fn close(&mut self) -> LunaResult<()> {
        if self.state == State::Closed {
            return Ok(());
        }
        self.state = State::Closed;
        let _ = self.stream.shutdown(Shutdown::Both);
        Ok(())
    }

    pub fn is_closed(&self) -> bool {
        self.state == State::Closed
    }
}
