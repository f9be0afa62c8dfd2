//! Runner error types.

use groupseries_agent::AgentError;
use groupseries_cli_protocol::CliError;
use thiserror::Error;

use crate::config::ConfigError;

#[derive(Debug, Error)]
pub enum RunnerError {
    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error(transparent)]
    Agent(#[from] AgentError),

    #[error(transparent)]
    Protocol(#[from] CliError),

    #[error("cannot connect to {host}: {source}")]
    Connect {
        host: String,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid argument: {0}")]
    InvalidArgument(String),

    #[error("failed to encode output: {0}")]
    Output(#[from] serde_json::Error),
}

pub type RunnerResult<T> = Result<T, RunnerError>;
