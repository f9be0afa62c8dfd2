//! Device configuration.
//!
//! ```yaml
//! host: 172.31.254.10
//! port: 24
//! password: secret
//! read_timeout_ms: 5000
//! agent:
//!   dial:
//!     max_attempts: 20
//!     interval_ms: 1000
//! vocabulary:
//!   command_success:
//!     - "callinfo end\r\r\n"
//! ```
//!
//! Every field except `host` has a default.

use std::fs;
use std::path::Path;
use std::time::Duration;

use groupseries_agent::AgentConfig;
use groupseries_cli_protocol::Vocabulary;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// API session port (telnet).
pub const DEFAULT_PORT: u16 = 24;

pub const DEFAULT_CONNECT_TIMEOUT_MS: u64 = 10_000;

/// How long a command may stay silent before it times out.
pub const DEFAULT_READ_TIMEOUT_MS: u64 = 5_000;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse configuration: {0}")]
    Yaml(#[from] serde_yaml::Error),

    #[error("invalid configuration: {0}")]
    Invalid(String),
}

/// Connection and behaviour settings for one endpoint.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DeviceConfig {
    pub host: String,
    #[serde(default = "default_port")]
    pub port: u16,
    /// API password; endpoints without one skip the prompt.
    #[serde(default)]
    pub password: Option<String>,
    #[serde(default = "default_connect_timeout_ms")]
    pub connect_timeout_ms: u64,
    #[serde(default = "default_read_timeout_ms")]
    pub read_timeout_ms: u64,
    #[serde(default)]
    pub agent: AgentConfig,
    #[serde(default)]
    pub vocabulary: Vocabulary,
}

fn default_port() -> u16 {
    DEFAULT_PORT
}

fn default_connect_timeout_ms() -> u64 {
    DEFAULT_CONNECT_TIMEOUT_MS
}

fn default_read_timeout_ms() -> u64 {
    DEFAULT_READ_TIMEOUT_MS
}

impl DeviceConfig {
    pub fn new(host: impl Into<String>) -> Self {
        DeviceConfig {
            host: host.into(),
            port: DEFAULT_PORT,
            password: None,
            connect_timeout_ms: DEFAULT_CONNECT_TIMEOUT_MS,
            read_timeout_ms: DEFAULT_READ_TIMEOUT_MS,
            agent: AgentConfig::default(),
            vocabulary: Vocabulary::default(),
        }
    }

    pub fn connect_timeout(&self) -> Duration {
        Duration::from_millis(self.connect_timeout_ms)
    }

    pub fn read_timeout(&self) -> Duration {
        Duration::from_millis(self.read_timeout_ms)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.host.trim().is_empty() {
            return Err(ConfigError::Invalid("host is empty".to_string()));
        }
        if self.port == 0 {
            return Err(ConfigError::Invalid("port must be non-zero".to_string()));
        }
        if self.read_timeout_ms == 0 || self.connect_timeout_ms == 0 {
            return Err(ConfigError::Invalid("timeouts must be non-zero".to_string()));
        }
        for (name, poll) in [("dial", &self.agent.dial), ("mute", &self.agent.mute)] {
            if poll.max_attempts == 0 {
                return Err(ConfigError::Invalid(format!(
                    "agent.{}.max_attempts must be at least 1",
                    name
                )));
            }
        }
        // Surface bad pattern lists at load time rather than on first use.
        self.vocabulary
            .response_framer()
            .and_then(|_| self.vocabulary.handshake_framer())
            .map_err(|e| ConfigError::Invalid(e.to_string()))?;
        Ok(())
    }
}

/// Load and validate a configuration file.
pub fn load_config<P: AsRef<Path>>(path: P) -> Result<DeviceConfig, ConfigError> {
    let path = path.as_ref();
    let text = fs::read_to_string(path).map_err(|source| ConfigError::Io {
        path: path.display().to_string(),
        source,
    })?;
    load_config_from_str(&text)
}

pub fn load_config_from_str(text: &str) -> Result<DeviceConfig, ConfigError> {
    let config: DeviceConfig = serde_yaml::from_str(text)?;
    config.validate()?;
    Ok(config)
}
