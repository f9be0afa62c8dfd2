//! Polycom Group Series API protocol
//!
//! This crate provides types and utilities for talking to Group Series room
//! endpoints over their line-oriented API session (telnet port 24 or SSH).
//! The session has no explicit framing: commands are plain text lines, and
//! the end of a response is recognised only by the text it ends with.
//!
//! # Protocol Overview
//!
//! - **Commands** (host → endpoint): text terminated with `\r\n`
//! - **Responses** (endpoint → host): the echoed command followed by lines
//!   terminated with `\r\r\n`
//! - **Completion**: decided by matching the accumulated response against a
//!   vocabulary of success and error patterns ([`Vocabulary`])
//! - **Login**: after connecting, the endpoint prints its `whoami` banner;
//!   the handshake is complete once `SNMP Enabled:` has been seen
//!
//! # Telemetry
//!
//! `netstats` and `advnetstats` print whitespace separated `key:value`
//! words. [`tokenize`] extracts them and [`to_int`]/[`to_float`] coerce
//! values leniently.
//!
//! # Example
//!
//! ```rust,ignore
//! use groupseries_cli_protocol::{Command, FrameOutcome, Vocabulary};
//!
//! let framer = Vocabulary::default().response_framer()?;
//! let line = Command::CallInfoAll.encode();
//!
//! // ...write `line`, then read until the framer says the response is complete
//! match framer.is_done("callinfo all", &accumulated) {
//!     FrameOutcome::Incomplete => { /* keep reading */ }
//!     FrameOutcome::Success => { /* parse */ }
//!     FrameOutcome::Error { pattern } => { /* command failed */ }
//! }
//! ```

mod codec;
mod commands;
mod error;
mod patterns;
mod responses;
mod telemetry;

pub use codec::*;
pub use commands::*;
pub use error::*;
pub use patterns::*;
pub use responses::*;
pub use telemetry::*;
