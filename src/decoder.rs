//! Response frame decoder.
//!
//! The server overlays a line-oriented control protocol (status, error,
//! integer, null, bulk frames) with a raw Arrow IPC stream for result
//! data. The two never collide: the IPC continuation marker starts with
//! `0xFF`, outside the ASCII control-tag set.

use std::io::BufRead;

use crate::error::{LunaError, LunaResult};

/// One decoded response frame. Exactly one variant is produced per
/// command; the variant is determined solely by the first byte received.
#[derive(Debug, Clone, PartialEq)]
pub enum Frame {
    /// `+` simple string (status line).
    Ok(String),
    /// `-` server-reported error.
    Error(String),
    /// `:` signed decimal integer.
    Integer(i64),
    /// `$-1` null bulk.
    Null,
    /// `$<n>` bulk payload.
    Bulk(Vec<u8>),
    /// `0xFFFFFFFF` — an Arrow IPC stream follows. The four marker bytes
    /// have been consumed; the batch reader re-prepends them.
    Stream,
}

/// Read one response frame, blocking until enough bytes arrive.
pub fn read_frame<R: BufRead>(reader: &mut R) -> LunaResult<Frame> {
    let mut tag = [0u8; 1];
    reader.read_exact(&mut tag)?;

    match tag[0] {
        0xFF => {
            let mut rest = [0u8; 3];
            reader.read_exact(&mut rest)?;
            if rest != [0xFF, 0xFF, 0xFF] {
                return Err(LunaError::Protocol(format!(
                    "invalid continuation marker: FF {:02X} {:02X} {:02X}",
                    rest[0], rest[1], rest[2]
                )));
            }
            Ok(Frame::Stream)
        }
        b'$' => {
            let line = read_line(reader)?;
            let len: i64 = line
                .parse()
                .map_err(|_| LunaError::Protocol(format!("invalid bulk length: {line}")))?;
            if len == -1 {
                return Ok(Frame::Null);
            }
            if len < 0 {
                return Err(LunaError::Protocol(format!("invalid bulk length: {len}")));
            }

            let mut data = vec![0u8; len as usize];
            reader.read_exact(&mut data)?;

            // Trailing CRLF
            let mut crlf = [0u8; 2];
            reader.read_exact(&mut crlf)?;

            Ok(Frame::Bulk(data))
        }
        b'+' => Ok(Frame::Ok(read_line(reader)?)),
        b'-' => Ok(Frame::Error(read_line(reader)?)),
        b':' => {
            let line = read_line(reader)?;
            let n: i64 = line
                .parse()
                .map_err(|_| LunaError::Protocol(format!("invalid integer: {line}")))?;
            Ok(Frame::Integer(n))
        }
        other => Err(LunaError::Protocol(format!(
            "unknown response tag: 0x{other:02X}"
        ))),
    }
}

/// Read up to `\n` and trim the trailing CRLF / whitespace.
fn read_line<R: BufRead>(reader: &mut R) -> LunaResult<String> {
    let mut buf = Vec::new();
    let n = reader.read_until(b'\n', &mut buf)?;
    if n == 0 || buf.last() != Some(&b'\n') {
        return Err(LunaError::Protocol(
            "unexpected end of stream while reading line".into(),
        ));
    }

    let line = std::str::from_utf8(&buf)
        .map_err(|_| LunaError::Protocol("response line is not valid UTF-8".into()))?;
    Ok(line.trim_end().to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    fn decode(bytes: &[u8]) -> LunaResult<Frame> {
        read_frame(&mut Cursor::new(bytes))
    }

    #[test]
    fn test_decode_ok() {
        assert_eq!(decode(b"+OK\r\n").unwrap(), Frame::Ok("OK".into()));
    }

    #[test]
    fn test_decode_error() {
        assert_eq!(
            decode(b"-no such table\r\n").unwrap(),
            Frame::Error("no such table".into())
        );
    }

    #[test]
    fn test_decode_integer() {
        assert_eq!(decode(b":1000\r\n").unwrap(), Frame::Integer(1000));
        assert_eq!(decode(b":-7\r\n").unwrap(), Frame::Integer(-7));
    }

    #[test]
    fn test_decode_bulk() {
        assert_eq!(
            decode(b"$5\r\nhello\r\n").unwrap(),
            Frame::Bulk(b"hello".to_vec())
        );
    }

    #[test]
    fn test_decode_null_bulk() {
        assert_eq!(decode(b"$-1\r\n").unwrap(), Frame::Null);
    }

    #[test]
    fn test_decode_stream_marker() {
        assert_eq!(decode(&[0xFF, 0xFF, 0xFF, 0xFF]).unwrap(), Frame::Stream);
    }

    #[test]
    fn test_bad_continuation_marker() {
        let err = decode(&[0xFF, 0xFF, 0x00, 0xFF]).unwrap_err();
        assert!(matches!(err, LunaError::Protocol(_)));
    }

    #[test]
    fn test_unknown_tag() {
        let err = decode(b"*2\r\n").unwrap_err();
        assert!(matches!(err, LunaError::Protocol(_)));
    }

    #[test]
    fn test_bulk_consumes_trailing_crlf() {
        // Two frames back to back: the bulk's CRLF must not leak into the
        // next frame.
        let mut cursor = Cursor::new(&b"$3\r\nabc\r\n+OK\r\n"[..]);
        assert_eq!(
            read_frame(&mut cursor).unwrap(),
            Frame::Bulk(b"abc".to_vec())
        );
        assert_eq!(read_frame(&mut cursor).unwrap(), Frame::Ok("OK".into()));
    }

    #[test]
    fn test_truncated_bulk() {
        let err = decode(b"$10\r\nshort").unwrap_err();
        assert!(matches!(err, LunaError::Io(_)));
    }
}
