//! Accumulating codec for the API session.
//!
//! The Group Series API has no explicit message boundaries or lengths. A
//! response is whatever text arrives between one command and the point at
//! which the framer recognises a terminating pattern, so the codec only
//! accumulates bytes and hands the text out; deciding completeness is the
//! job of [`crate::ResponseFramer`] and [`crate::HandshakeFramer`].

use bytes::BytesMut;

use crate::error::{CliError, CliResult};

/// Upper bound on a single accumulated response.
///
/// A `status` or `whoami` dump is a few kilobytes; anything far beyond that
/// means the framer never saw a terminator.
pub const MAX_RESPONSE_LENGTH: usize = 64 * 1024;

/// Terminator appended to every outgoing command.
pub const COMMAND_TERMINATOR: &str = "\r\n";

/// Line terminator the device uses at the end of a response line.
pub const RESPONSE_LINE_END: &str = "\r\r\n";

/// A codec for accumulating device output and encoding commands.
#[derive(Debug, Default)]
pub struct LineCodec {
    buffer: BytesMut,
}

impl LineCodec {
    /// Create a new codec.
    pub fn new() -> Self {
        LineCodec {
            buffer: BytesMut::with_capacity(4096),
        }
    }

    /// Add received data to the buffer.
    pub fn push(&mut self, data: &[u8]) -> CliResult<()> {
        let actual = self.buffer.len() + data.len();
        if actual > MAX_RESPONSE_LENGTH {
            return Err(CliError::BufferOverflow {
                max: MAX_RESPONSE_LENGTH,
                actual,
            });
        }
        self.buffer.extend_from_slice(data);
        Ok(())
    }

    /// The accumulated text so far, decoded lossily.
    pub fn buffer_as_str(&self) -> String {
        String::from_utf8_lossy(&self.buffer).to_string()
    }

    /// Remove and return everything accumulated so far.
    pub fn take_response(&mut self) -> String {
        let data = self.buffer.split();
        String::from_utf8_lossy(&data).to_string()
    }

    /// Encode a command for transmission.
    ///
    /// Appends [`COMMAND_TERMINATOR`].
    pub fn encode_command(cmd: &str) -> Vec<u8> {
        let mut buf = Vec::with_capacity(cmd.len() + COMMAND_TERMINATOR.len());
        buf.extend_from_slice(cmd.as_bytes());
        buf.extend_from_slice(COMMAND_TERMINATOR.as_bytes());
        buf
    }

    /// Get the number of buffered bytes.
    pub fn buffered_len(&self) -> usize {
        self.buffer.len()
    }

    /// Whether nothing has been received since the last take.
    pub fn is_empty(&self) -> bool {
        self.buffer.is_empty()
    }

    /// Clear the buffer.
    pub fn clear(&mut self) {
        self.buffer.clear();
    }
}
