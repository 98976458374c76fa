//! RESP2 parser and encoder
//!
//! The parser walks the buffer with a cursor and only consumes bytes once a
//! complete frame is available, so partial reads never leave the stream
//! desynchronized.

use super::types::{RespError, RespValue};
use bytes::{Buf, BufMut, Bytes, BytesMut};

const CRLF: &[u8] = b"\r\n";

/// RESP2 Parser
pub struct RespParser;

impl RespParser {
    /// Parse one RESP value from the front of the buffer
    ///
    /// Returns Ok(Some(value)) if a complete value was parsed (the buffer is
    /// advanced past it), Ok(None) if more data is needed (the buffer is left
    /// untouched), Err(e) if the stream is malformed.
    pub fn parse(buf: &mut BytesMut) -> Result<Option<RespValue>, RespError> {
        match Self::parse_at(buf, 0)? {
            Some((value, consumed)) => {
                buf.advance(consumed);
                Ok(Some(value))
            }
            None => Ok(None),
        }
    }

    /// Parse the value starting at `pos`, returning it together with the
    /// cursor position just past its final CRLF
    fn parse_at(buf: &[u8], pos: usize) -> Result<Option<(RespValue, usize)>, RespError> {
        let Some(&prefix) = buf.get(pos) else {
            return Ok(None);
        };

        match prefix {
            b'+' => Self::parse_line(buf, pos, |s| Ok(RespValue::SimpleString(s))),
            b'-' => Self::parse_line(buf, pos, |s| Ok(RespValue::Error(s))),
            b':' => Self::parse_line(buf, pos, |s| {
                s.parse::<i64>()
                    .map(RespValue::Integer)
                    .map_err(|_| RespError::InvalidInteger)
            }),
            b'$' => Self::parse_bulk(buf, pos),
            b'*' => Self::parse_array(buf, pos),
            other => Err(RespError::InvalidProtocol(format!(
                "unknown type prefix: {}",
                other as char
            ))),
        }
    }

    /// Parse a single-line frame (simple string, error, integer)
    fn parse_line(
        buf: &[u8],
        pos: usize,
        build: impl FnOnce(String) -> Result<RespValue, RespError>,
    ) -> Result<Option<(RespValue, usize)>, RespError> {
        let Some((line, next)) = Self::find_line(buf, pos + 1) else {
            return Ok(None);
        };
        let text = std::str::from_utf8(line).map_err(|_| RespError::InvalidUtf8)?;
        Ok(Some((build(text.to_string())?, next)))
    }

    /// Parse a bulk string: $6\r\nfoobar\r\n or $-1\r\n (null)
    fn parse_bulk(buf: &[u8], pos: usize) -> Result<Option<(RespValue, usize)>, RespError> {
        let Some((line, data_start)) = Self::find_line(buf, pos + 1) else {
            return Ok(None);
        };
        let len = Self::parse_len(line)?;

        if len == -1 {
            return Ok(Some((RespValue::Null, data_start)));
        }
        if len < 0 {
            return Err(RespError::InvalidProtocol(format!(
                "invalid bulk string length: {}",
                len
            )));
        }

        let len = len as usize;
        let end = data_start + len + 2;
        if buf.len() < end {
            return Ok(None);
        }
        if &buf[data_start + len..end] != CRLF {
            return Err(RespError::InvalidProtocol(
                "missing CRLF after bulk string data".to_string(),
            ));
        }

        let data = Bytes::copy_from_slice(&buf[data_start..data_start + len]);
        Ok(Some((RespValue::BulkString(data), end)))
    }

    /// Parse an array: *2\r\n$3\r\nfoo\r\n$3\r\nbar\r\n
    fn parse_array(buf: &[u8], pos: usize) -> Result<Option<(RespValue, usize)>, RespError> {
        let Some((line, mut cursor)) = Self::find_line(buf, pos + 1) else {
            return Ok(None);
        };
        let count = Self::parse_len(line)?;

        if count == -1 {
            return Ok(Some((RespValue::Null, cursor)));
        }
        if count < 0 {
            return Err(RespError::InvalidProtocol(format!(
                "invalid array count: {}",
                count
            )));
        }

        let mut elements = Vec::with_capacity(count as usize);
        for _ in 0..count {
            match Self::parse_at(buf, cursor)? {
                Some((value, next)) => {
                    elements.push(value);
                    cursor = next;
                }
                // one element still incomplete, consume nothing
                None => return Ok(None),
            }
        }

        Ok(Some((RespValue::Array(elements), cursor)))
    }

    /// Locate the CRLF-terminated line starting at `pos`
    ///
    /// Returns the line contents (without CRLF) and the position just past it.
    fn find_line(buf: &[u8], pos: usize) -> Option<(&[u8], usize)> {
        let hay = buf.get(pos..)?;
        hay.windows(2)
            .position(|pair| pair == CRLF)
            .map(|idx| (&hay[..idx], pos + idx + 2))
    }

    fn parse_len(line: &[u8]) -> Result<i64, RespError> {
        std::str::from_utf8(line)
            .map_err(|_| RespError::InvalidUtf8)?
            .parse::<i64>()
            .map_err(|_| RespError::InvalidInteger)
    }
}

/// RESP2 Encoder
pub struct RespEncoder;

impl RespEncoder {
    /// Encode a RESP value to bytes
    pub fn encode(value: &RespValue) -> Bytes {
        let mut buf = BytesMut::new();
        Self::encode_to(&mut buf, value);
        buf.freeze()
    }

    /// Encode a RESP value into an existing buffer
    pub fn encode_to(buf: &mut BytesMut, value: &RespValue) {
        match value {
            RespValue::SimpleString(s) => {
                buf.put_u8(b'+');
                buf.put_slice(s.as_bytes());
                buf.put_slice(CRLF);
            }
            RespValue::Error(e) => {
                buf.put_u8(b'-');
                buf.put_slice(e.as_bytes());
                buf.put_slice(CRLF);
            }
            RespValue::Integer(i) => {
                buf.put_u8(b':');
                buf.put_slice(i.to_string().as_bytes());
                buf.put_slice(CRLF);
            }
            RespValue::BulkString(bytes) => {
                buf.put_u8(b'$');
                buf.put_slice(bytes.len().to_string().as_bytes());
                buf.put_slice(CRLF);
                buf.put_slice(bytes);
                buf.put_slice(CRLF);
            }
            RespValue::Null => {
                buf.put_slice(b"$-1\r\n");
            }
            RespValue::Array(arr) => {
                buf.put_u8(b'*');
                buf.put_slice(arr.len().to_string().as_bytes());
                buf.put_slice(CRLF);
                for elem in arr {
                    Self::encode_to(buf, elem);
                }
            }
        }
    }
}
