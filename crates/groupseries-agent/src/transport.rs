//! The narrow seam between the driver and the wire.
//!
//! Everything above this module sees a single synchronous operation,
//! [`Transport::send`]. [`LineTransport`] implements it over any duplex
//! byte stream by accumulating output until the response framer decides the
//! response is complete.

use std::io::{ErrorKind, Read, Write};

use groupseries_cli_protocol::{FrameOutcome, HandshakeFramer, LineCodec, ResponseFramer};
use tracing::{debug, trace, warn};

use crate::error::{AgentError, AgentResult};

/// Send a command and wait for its complete response.
///
/// One command is outstanding at a time; implementations are not expected
/// to pipeline.
pub trait Transport {
    fn send(&mut self, command: &str) -> AgentResult<String>;
}

impl<T: Transport + ?Sized> Transport for &mut T {
    fn send(&mut self, command: &str) -> AgentResult<String> {
        (**self).send(command)
    }
}

impl<T: Transport + ?Sized> Transport for Box<T> {
    fn send(&mut self, command: &str) -> AgentResult<String> {
        (**self).send(command)
    }
}

const READ_CHUNK: usize = 1024;

/// [`Transport`] over a blocking duplex stream (TCP socket, SSH channel).
///
/// Read timeouts are the stream's business: a read that fails with
/// `WouldBlock` or `TimedOut` ends the exchange with [`AgentError::Timeout`].
pub struct LineTransport<S> {
    stream: S,
    host: String,
    codec: LineCodec,
    framer: ResponseFramer,
}

impl<S: Read + Write> LineTransport<S> {
    /// Wrap an already authenticated stream.
    pub fn new(stream: S, host: impl Into<String>, framer: ResponseFramer) -> Self {
        LineTransport {
            stream,
            host: host.into(),
            codec: LineCodec::new(),
            framer,
        }
    }

    pub fn host(&self) -> &str {
        &self.host
    }

    /// Run the login handshake and return the banner.
    ///
    /// The password, when given, is written before anything is read; the
    /// endpoint buffers it until its prompt.
    pub fn handshake(
        &mut self,
        framer: &HandshakeFramer,
        password: Option<&str>,
    ) -> AgentResult<String> {
        self.codec.clear();
        if let Some(password) = password {
            self.stream.write_all(&LineCodec::encode_command(password))?;
            self.stream.flush()?;
        }
        let (outcome, banner) = self.read_until("<login>", |text| framer.is_done(text))?;
        match outcome {
            FrameOutcome::Error { pattern } => {
                warn!("LineTransport[{}]: login rejected (matched {:?})", self.host, pattern);
                Err(AgentError::AuthenticationFailed {
                    host: self.host.clone(),
                    response: banner,
                })
            }
            _ => {
                debug!("LineTransport[{}]: session ready", self.host);
                Ok(banner)
            }
        }
    }

    fn read_until(
        &mut self,
        label: &str,
        mut decide: impl FnMut(&str) -> FrameOutcome,
    ) -> AgentResult<(FrameOutcome, String)> {
        let mut chunk = [0u8; READ_CHUNK];
        loop {
            let n = match self.stream.read(&mut chunk) {
                Ok(0) => {
                    return Err(AgentError::ConnectionClosed {
                        host: self.host.clone(),
                    })
                }
                Ok(n) => n,
                Err(e) if e.kind() == ErrorKind::Interrupted => continue,
                Err(e) if matches!(e.kind(), ErrorKind::WouldBlock | ErrorKind::TimedOut) => {
                    return Err(AgentError::Timeout {
                        command: label.to_string(),
                        partial: self.codec.take_response(),
                    })
                }
                Err(e) => return Err(e.into()),
            };
            self.codec.push(&chunk[..n])?;
            let text = self.codec.buffer_as_str();
            trace!("LineTransport[{}]: {} bytes buffered for '{}'", self.host, text.len(), label);
            let outcome = decide(&text);
            if outcome.is_complete() {
                self.codec.clear();
                return Ok((outcome, text));
            }
        }
    }

    pub fn into_inner(self) -> S {
        self.stream
    }
}

impl<S: Read + Write> Transport for LineTransport<S> {
    fn send(&mut self, command: &str) -> AgentResult<String> {
        self.codec.clear();
        self.stream.write_all(&LineCodec::encode_command(command))?;
        self.stream.flush()?;

        let framer = self.framer.clone();
        let (outcome, response) = self.read_until(command, |text| framer.is_done(command, text))?;
        match outcome {
            FrameOutcome::Error { .. } => Err(AgentError::CommandFailed {
                host: self.host.clone(),
                command: command.to_string(),
                response,
            }),
            _ => Ok(response),
        }
    }
}
