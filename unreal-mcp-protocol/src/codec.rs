//! Message codec for engine channel framing
//!
//! Frames are single-line JSON documents terminated by `\n`. serde_json never
//! emits a raw newline (control characters inside strings are escaped), so
//! the terminator cannot appear inside a frame.

use bytes::{BufMut, BytesMut};
use tokio_util::codec::{Decoder, Encoder};

use crate::messages::{Command, RawReply};

/// Maximum message size (16 MB)
pub const MAX_MESSAGE_SIZE: usize = 16 * 1024 * 1024;

/// Protocol codec error
#[derive(Debug, thiserror::Error)]
pub enum CodecError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Message too large: {size} bytes (max {max})")]
    MessageTooLarge { size: usize, max: usize },

    #[error("Reply is not a JSON object (got {0})")]
    NotAnObject(&'static str),

    #[error("Stream ended inside a frame ({len} bytes buffered)")]
    Truncated { len: usize },
}

/// Codec for Command (encoding) and RawReply (decoding)
///
/// Used by the bridge side of the channel.
#[derive(Debug, Default)]
pub struct EngineCodec {
    /// Offset already scanned for a terminator in the current read buffer
    next_index: usize,
}

impl EngineCodec {
    pub fn new() -> Self {
        Self { next_index: 0 }
    }

    /// Encode a command into a standalone frame
    pub fn encode_frame(command: &Command) -> Result<BytesMut, CodecError> {
        let mut buf = BytesMut::new();
        encode_message(command, &mut buf)?;
        Ok(buf)
    }
}

impl Decoder for EngineCodec {
    type Item = RawReply;
    type Error = CodecError;

    fn decode(&mut self, src: &mut BytesMut) -> Result<Option<Self::Item>, Self::Error> {
        loop {
            let newline = src[self.next_index..].iter().position(|b| *b == b'\n');

            let Some(offset) = newline else {
                // Keep buffering, but refuse to grow without bound
                if src.len() > MAX_MESSAGE_SIZE {
                    return Err(CodecError::MessageTooLarge {
                        size: src.len(),
                        max: MAX_MESSAGE_SIZE,
                    });
                }
                self.next_index = src.len();
                return Ok(None);
            };

            let end = self.next_index + offset;
            self.next_index = 0;

            if end > MAX_MESSAGE_SIZE {
                return Err(CodecError::MessageTooLarge {
                    size: end,
                    max: MAX_MESSAGE_SIZE,
                });
            }

            let frame = src.split_to(end + 1);
            let line = trim_line(&frame[..end]);
            if line.is_empty() {
                continue;
            }

            return parse_reply(line).map(Some);
        }
    }

    fn decode_eof(&mut self, buf: &mut BytesMut) -> Result<Option<Self::Item>, Self::Error> {
        match self.decode(buf)? {
            Some(reply) => Ok(Some(reply)),
            None => {
                if trim_line(buf).is_empty() {
                    buf.clear();
                    self.next_index = 0;
                    Ok(None)
                } else {
                    Err(CodecError::Truncated { len: buf.len() })
                }
            }
        }
    }
}

impl Encoder<&Command> for EngineCodec {
    type Error = CodecError;

    fn encode(&mut self, item: &Command, dst: &mut BytesMut) -> Result<(), Self::Error> {
        encode_message(item, dst)
    }
}

/// Strip surrounding ASCII whitespace (including a trailing `\r`)
fn trim_line(bytes: &[u8]) -> &[u8] {
    let start = bytes
        .iter()
        .position(|b| !b.is_ascii_whitespace())
        .unwrap_or(bytes.len());
    let end = bytes
        .iter()
        .rposition(|b| !b.is_ascii_whitespace())
        .map_or(start, |i| i + 1);
    &bytes[start..end]
}

/// Parse one frame into a reply object
fn parse_reply(line: &[u8]) -> Result<RawReply, CodecError> {
    let value: serde_json::Value = serde_json::from_slice(line)?;
    RawReply::try_from(value).map_err(|other| {
        CodecError::NotAnObject(match other {
            serde_json::Value::Null => "null",
            serde_json::Value::Bool(_) => "boolean",
            serde_json::Value::Number(_) => "number",
            serde_json::Value::String(_) => "string",
            serde_json::Value::Array(_) => "array",
            serde_json::Value::Object(_) => "object",
        })
    })
}

/// Encode a newline-terminated message
fn encode_message<T: serde::Serialize>(item: &T, dst: &mut BytesMut) -> Result<(), CodecError> {
    let data = serde_json::to_vec(item)?;

    if data.len() + 1 > MAX_MESSAGE_SIZE {
        return Err(CodecError::MessageTooLarge {
            size: data.len() + 1,
            max: MAX_MESSAGE_SIZE,
        });
    }

    dst.reserve(data.len() + 1);
    dst.put_slice(&data);
    dst.put_u8(b'\n');
    Ok(())
}
