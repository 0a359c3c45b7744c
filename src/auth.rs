//! Challenge/response authentication.
//!
//! The server sends nothing on connect unless it has a credential
//! configured, in which case the very first bytes are a `+<challenge>`
//! line. The client answers with a bulk frame carrying a bcrypt hash of
//! the password (irreversible, salted per call) and the server closes the
//! round with `+` or `-`. When no credential was supplied to the
//! connector this handshake is skipped entirely; the client must never
//! block waiting for a challenge that is not coming.

use std::io::{BufRead, Write};

use bytes::BytesMut;
use tracing::debug;

use crate::encoder::encode_bulk;
use crate::error::{LunaError, LunaResult};

/// Run the one-round handshake. Only called when a password is set.
pub(crate) fn authenticate<R, W>(reader: &mut R, writer: &mut W, password: &str) -> LunaResult<()>
where
    R: BufRead,
    W: Write,
{
    let mut tag = [0u8; 1];
    reader
        .read_exact(&mut tag)
        .map_err(|e| LunaError::Auth(format!("failed to read challenge: {e}")))?;

    match tag[0] {
        b'+' => {}
        b'-' => {
            let msg = read_line(reader)?;
            return Err(LunaError::Auth(msg));
        }
        other => {
            return Err(LunaError::Protocol(format!(
                "unexpected auth greeting: 0x{other:02X}"
            )));
        }
    }

    let challenge = read_line(reader)?;
    debug!(challenge = %challenge, "received auth challenge");

    let hash = bcrypt::hash(password, bcrypt::DEFAULT_COST)
        .map_err(|e| LunaError::Auth(format!("failed to hash password: {e}")))?;

    let mut buf = BytesMut::with_capacity(hash.len() + 16);
    encode_bulk(&mut buf, hash.as_bytes());
    writer.write_all(&buf)?;

    let mut result = [0u8; 1];
    reader
        .read_exact(&mut result)
        .map_err(|e| LunaError::Auth(format!("failed to read auth result: {e}")))?;

    match result[0] {
        b'+' => {
            read_line(reader)?;
            Ok(())
        }
        b'-' => {
            let msg = read_line(reader)?;
            Err(LunaError::Auth(msg))
        }
        other => Err(LunaError::Protocol(format!(
            "unexpected auth response: 0x{other:02X}"
        ))),
    }
}

fn read_line<R: BufRead>(reader: &mut R) -> LunaResult<String> {
    let mut line = Vec::new();
    let n = reader.read_until(b'\n', &mut line)?;
    if n == 0 {
        return Err(LunaError::Auth("connection closed during handshake".into()));
    }
    let line = std::str::from_utf8(&line)
        .map_err(|_| LunaError::Protocol("auth line is not valid UTF-8".into()))?;
    Ok(line.trim_end().to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    #[test]
    fn test_handshake_success_sends_verifiable_hash() {
        let mut input = Cursor::new(b"+challenge-123\r\n+OK auth\r\n".to_vec());
        let mut output = Vec::new();

        authenticate(&mut input, &mut output, "secret").unwrap();

        // Reply is a bulk frame: $<n>\r\n<hash>\r\n
        assert_eq!(output[0], b'$');
        let text = String::from_utf8(output).unwrap();
        let hash = text
            .split("\r\n")
            .nth(1)
            .expect("bulk frame carries the hash");
        assert!(bcrypt::verify("secret", hash).unwrap());
        assert!(!bcrypt::verify("wrong", hash).unwrap());
    }

    #[test]
    fn test_server_rejection_is_auth_error() {
        let mut input = Cursor::new(b"+challenge\r\n-invalid password\r\n".to_vec());
        let mut output = Vec::new();

        let err = authenticate(&mut input, &mut output, "secret").unwrap_err();
        match err {
            LunaError::Auth(msg) => assert_eq!(msg, "invalid password"),
            other => panic!("expected auth error, got {other:?}"),
        }
    }

    #[test]
    fn test_error_greeting_is_auth_error() {
        let mut input = Cursor::new(b"-auth disabled\r\n".to_vec());
        let mut output = Vec::new();

        let err = authenticate(&mut input, &mut output, "secret").unwrap_err();
        assert!(matches!(err, LunaError::Auth(_)));
        assert!(output.is_empty());
    }

    #[test]
    fn test_garbage_greeting_is_protocol_error() {
        let mut input = Cursor::new(b"?\r\n".to_vec());
        let mut output = Vec::new();

        let err = authenticate(&mut input, &mut output, "secret").unwrap_err();
        assert!(matches!(err, LunaError::Protocol(_)));
    }
}
