//! Newline framing over the response byte stream.

use memchr::memchr;
use tracing::warn;

/// Splits an incoming byte stream into newline-terminated text frames.
///
/// Bytes are buffered across chunk boundaries, so a multi-byte UTF-8
/// sequence that straddles a chunk split survives intact: a `\n` byte can
/// never occur inside a multi-byte sequence, so scanning the raw buffer for
/// newlines is safe. The trailing segment with no terminator is carried
/// over until more bytes arrive; at end of stream it is not a complete
/// frame and the caller discards it.
#[derive(Debug, Default)]
pub struct FrameBuffer {
    buf: Vec<u8>,
}

impl FrameBuffer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn extend(&mut self, chunk: &[u8]) {
        self.buf.extend_from_slice(chunk);
    }

    /// Pop the next complete frame, trimmed of surrounding whitespace.
    ///
    /// A frame that is not valid UTF-8 is dropped with a diagnostic and
    /// scanning continues at the following line.
    pub fn next_frame(&mut self) -> Option<String> {
        while let Some(newline_pos) = memchr(b'\n', &self.buf) {
            let frame = match std::str::from_utf8(&self.buf[..newline_pos]) {
                Ok(line) => Some(line.trim().to_string()),
                Err(err) => {
                    warn!(error = %err, "dropping frame with invalid UTF-8");
                    None
                }
            };
            self.buf.drain(..=newline_pos);
            if let Some(frame) = frame {
                return Some(frame);
            }
        }
        None
    }

    /// Bytes of the unterminated trailing segment currently buffered.
    pub fn trailing_len(&self) -> usize {
        self.buf.len()
    }
}
