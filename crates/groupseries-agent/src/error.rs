//! Error types for the agent.

use groupseries_cli_protocol::CliError;
use thiserror::Error;

/// Errors raised while talking to an endpoint.
#[derive(Debug, Error)]
pub enum AgentError {
    /// The response matched an error pattern.
    #[error("command '{command}' failed on {host}: {response:?}")]
    CommandFailed {
        host: String,
        command: String,
        response: String,
    },

    /// The login handshake matched an error pattern.
    #[error("authentication failed on {host}: {response:?}")]
    AuthenticationFailed { host: String, response: String },

    /// No terminating pattern arrived before the transport timed out.
    #[error("timed out waiting for response to '{command}' (received {partial:?})")]
    Timeout { command: String, partial: String },

    /// The endpoint closed the session.
    #[error("connection to {host} closed")]
    ConnectionClosed { host: String },

    /// Transport I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// A controllable property value could not be normalized.
    #[error("invalid value for {property}: {reason}")]
    InvalidPropertyValue { property: String, reason: String },

    /// A property batch with nothing in it.
    #[error("no controllable properties supplied")]
    EmptyPropertyBatch,

    /// Protocol-level error (framing configuration, parse, overflow).
    #[error(transparent)]
    Protocol(#[from] CliError),
}

impl AgentError {
    /// True for failures the endpoint reported about the command itself,
    /// as opposed to the session breaking.
    pub fn is_command_failure(&self) -> bool {
        matches!(self, AgentError::CommandFailed { .. })
    }
}

/// Result type alias for agent operations.
pub type AgentResult<T> = Result<T, AgentError>;
