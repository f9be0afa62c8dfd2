//! Command-line runner for Group Series endpoints
//!
//! Loads a YAML device configuration, opens an API session over TCP, runs a
//! single operation and prints the result as JSON.

pub mod cli;
pub mod config;
pub mod connect;
pub mod error;
pub mod output;
pub mod run;

pub use cli::{Cli, Commands};
pub use config::{load_config, load_config_from_str, ConfigError, DeviceConfig};
pub use connect::{connect, TcpDevice};
pub use error::{RunnerError, RunnerResult};
pub use output::Report;
pub use run::execute;
