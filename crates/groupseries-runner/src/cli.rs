//! Command-line arguments.

use std::path::PathBuf;

use clap::{Parser, Subcommand};
use groupseries_agent::ControllableProperty;
use groupseries_cli_protocol::{CliError, DialProtocol};

#[derive(Debug, Parser)]
#[command(name = "gsctl", version, about = "Drive a Polycom Group Series endpoint")]
pub struct Cli {
    /// Device configuration file (YAML).
    #[arg(short, long)]
    pub config: Option<PathBuf>,

    /// Endpoint address; overrides the configuration file.
    #[arg(long)]
    pub host: Option<String>,

    #[arg(long)]
    pub port: Option<u16>,

    /// API password; overrides the configuration file.
    #[arg(long)]
    pub password: Option<String>,

    /// Increase log verbosity (-v debug, -vv trace).
    #[arg(short, long, action = clap::ArgAction::Count)]
    pub verbose: u8,

    /// Print compact JSON.
    #[arg(long)]
    pub compact: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Debug, Subcommand)]
pub enum Commands {
    /// Poll statistics, registration and control values.
    Stats,

    /// Dial a destination and wait for the call to connect.
    Dial {
        address: String,
        /// Call speed in kbps.
        #[arg(long)]
        speed: Option<i32>,
        #[arg(long, value_parser = parse_protocol)]
        protocol: Option<DialProtocol>,
    },

    /// Hang up one call, or all calls.
    Hangup { call_id: Option<String> },

    /// Report whether a call is connected.
    CallStatus { call_id: Option<String> },

    /// Mute the near-end microphones.
    Mute {
        /// Wait until the endpoint reports the change.
        #[arg(long)]
        confirm: bool,
    },

    /// Unmute the near-end microphones.
    Unmute {
        #[arg(long)]
        confirm: bool,
    },

    /// Set controllable properties, e.g. `Audio#Volume=30`.
    Control {
        #[arg(required = true, value_parser = parse_assignment)]
        properties: Vec<ControllableProperty>,
    },

    /// Send a raw API command and print the response.
    Send {
        #[arg(required = true, trailing_var_arg = true)]
        command: Vec<String>,
    },
}

pub fn parse_protocol(value: &str) -> Result<DialProtocol, String> {
    value.parse().map_err(|e: CliError| e.to_string())
}

/// Parse `Name=value`.
pub fn parse_assignment(value: &str) -> Result<ControllableProperty, String> {
    match value.split_once('=') {
        Some((name, v)) if !name.trim().is_empty() => {
            Ok(ControllableProperty::new(name.trim(), v))
        }
        _ => Err(format!("expected NAME=VALUE, got '{}'", value)),
    }
}
