//! Command frame encoder.
//!
//! Commands travel as a single RESP-style bulk string:
//! `$<len>\r\n<prefix><sql>\r\n`, where `<len>` counts the prefix plus the
//! SQL text but not the trailing CRLF.

use bytes::BytesMut;

use crate::cmd::Command;

/// Encode a command into the provided buffer.
pub fn encode_command(buf: &mut BytesMut, cmd: &Command) {
    let prefix = cmd.kind.prefix();
    let len = prefix.len() + cmd.text.len();

    buf.reserve(len + 16);
    buf.extend_from_slice(b"$");
    buf.extend_from_slice(len.to_string().as_bytes());
    buf.extend_from_slice(b"\r\n");
    buf.extend_from_slice(prefix.as_bytes());
    buf.extend_from_slice(cmd.text.as_bytes());
    buf.extend_from_slice(b"\r\n");
}

/// Encode a bulk string frame: `$<len>\r\n<data>\r\n`.
///
/// Used by the auth handshake to carry the password hash.
pub fn encode_bulk(buf: &mut BytesMut, data: &[u8]) {
    buf.reserve(data.len() + 16);
    buf.extend_from_slice(b"$");
    buf.extend_from_slice(data.len().to_string().as_bytes());
    buf.extend_from_slice(b"\r\n");
    buf.extend_from_slice(data);
    buf.extend_from_slice(b"\r\n");
}
