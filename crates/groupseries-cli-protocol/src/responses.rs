//! Response parsing for the API.
//!
//! Responses carry the echoed command followed by one or more lines, each
//! terminated with `\r\r\n`. Parsers here are lenient: anything they cannot
//! recognise yields `None` rather than an error, since unsupported fields
//! vary across firmware releases.

use crate::commands::CameraPosition;
use crate::error::{CliError, CliResult};
use crate::telemetry::to_int;

/// Status reported in the sixth `callinfo` field for an established call.
pub const CONNECTED: &str = "connected";

/// Lines of `response` that carry data: trimmed, non-empty, and not the
/// echo of `command`.
pub fn payload_lines<'a>(response: &'a str, command: &'a str) -> impl Iterator<Item = &'a str> {
    response
        .lines()
        .map(str::trim)
        .filter(move |line| !line.is_empty() && *line != command)
}

/// Last whitespace separated word of the last payload line.
///
/// Most get-style commands answer by echoing their own name with the value
/// appended (`volume 25`, `videomute near off`).
pub fn last_word<'a>(response: &'a str, command: &'a str) -> Option<&'a str> {
    payload_lines(response, command)
        .last()
        .and_then(|line| line.split_whitespace().last())
}

/// Value following `prefix` on a payload line, e.g. the address in
/// `gatekeeperip 172.31.254.64`.
pub fn setting_value<'a>(response: &'a str, command: &'a str, prefix: &str) -> Option<&'a str> {
    payload_lines(response, command)
        .filter_map(|line| line.strip_prefix(prefix))
        .map(str::trim)
        .filter(|value| !value.is_empty())
        .last()
}

/// Parse an `on`/`off` switch word.
pub fn parse_switch(word: &str) -> Option<bool> {
    match word.to_ascii_lowercase().as_str() {
        "on" | "true" | "yes" => Some(true),
        "off" | "false" | "no" => Some(false),
        _ => None,
    }
}

/// An active call as reported by `callinfo all`.
///
/// The device answers with
/// `callinfo:<id>:<name>:<address>:<speed>:<status>:<mute>:<direction>:<type>`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CallInfo {
    pub call_id: String,
    pub remote_name: String,
    pub remote_address: String,
    /// Raw speed field; see [`CallInfo::requested_call_rate`].
    pub speed: String,
}

impl CallInfo {
    /// Parse a `callinfo all` response.
    ///
    /// The whole response is split on `:`. Fewer than six fields, or a
    /// sixth field other than `connected`, means no active call.
    pub fn parse(response: &str) -> Option<CallInfo> {
        let fields: Vec<&str> = response.split(':').collect();
        if fields.len() < 6 || fields[5] != CONNECTED {
            return None;
        }
        Some(CallInfo {
            call_id: fields[1].to_string(),
            remote_name: fields[2].to_string(),
            remote_address: fields[3].to_string(),
            speed: fields[4].to_string(),
        })
    }

    pub fn requested_call_rate(&self) -> Option<i32> {
        to_int(&self.speed)
    }
}

/// Near-end audio mute state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MuteState {
    Muted,
    Unmuted,
}

impl MuteState {
    /// Parse a `mute near ...` response.
    pub fn parse(response: &str) -> Option<MuteState> {
        if response.contains("mute near on") {
            Some(MuteState::Muted)
        } else if response.contains("mute near off") {
            Some(MuteState::Unmuted)
        } else {
            None
        }
    }

    pub fn is_muted(&self) -> bool {
        matches!(self, MuteState::Muted)
    }
}

/// The `status` subsystem dump.
///
/// ```text
/// status
/// autoanswerp2p online
/// gatekeeper offline
/// sipserver online
/// status end
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct StatusReport {
    entries: Vec<(String, String)>,
}

impl StatusReport {
    pub fn parse(response: &str) -> StatusReport {
        let entries = payload_lines(response, "status")
            .filter(|line| *line != "status end")
            .filter_map(|line| {
                let mut words = line.split_whitespace();
                let name = words.next()?;
                let state = words.next()?;
                if words.next().is_some() {
                    return None;
                }
                Some((name.to_string(), state.to_string()))
            })
            .collect();
        StatusReport { entries }
    }

    /// Subsystem entries in reported order.
    pub fn entries(&self) -> &[(String, String)] {
        &self.entries
    }

    pub fn state(&self, subsystem: &str) -> Option<&str> {
        self.entries
            .iter()
            .find(|(name, _)| name == subsystem)
            .map(|(_, state)| state.as_str())
    }

    /// `Some(true)` for `online`, `Some(false)` for `offline`.
    pub fn is_online(&self, subsystem: &str) -> Option<bool> {
        match self.state(subsystem)? {
            "online" => Some(true),
            "offline" => Some(false),
            _ => None,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// `Label: value` facts printed by `whoami` (and at login).
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct WhoAmI {
    facts: Vec<(String, String)>,
}

/// Greeting line that carries the system name.
const GREETING: &str = "Hi, my name is";

impl WhoAmI {
    pub fn parse(response: &str) -> WhoAmI {
        let facts = payload_lines(response, "whoami")
            .filter_map(|line| line.split_once(':'))
            .map(|(label, value)| (label.trim(), value.trim()))
            .filter(|(label, value)| !label.is_empty() && !value.is_empty())
            .map(|(label, value)| {
                let label = if label.starts_with(GREETING) {
                    "System Name"
                } else {
                    label
                };
                (label.to_string(), value.to_string())
            })
            .collect();
        WhoAmI { facts }
    }

    pub fn facts(&self) -> &[(String, String)] {
        &self.facts
    }

    pub fn get(&self, label: &str) -> Option<&str> {
        self.facts
            .iter()
            .find(|(l, _)| l == label)
            .map(|(_, v)| v.as_str())
    }
}

impl CameraPosition {
    /// Parse a `camera near getposition` response: the last three integers
    /// of the last payload line are pan, tilt and zoom.
    pub fn parse(response: &str) -> CliResult<CameraPosition> {
        let line = payload_lines(response, "camera near getposition")
            .last()
            .ok_or_else(|| CliError::ParseError("empty camera position".to_string()))?;
        let values: Vec<i32> = line
            .split_whitespace()
            .filter_map(|word| word.parse::<i32>().ok())
            .collect();
        match values.as_slice() {
            [.., pan, tilt, zoom] => Ok(CameraPosition {
                pan: *pan,
                tilt: *tilt,
                zoom: *zoom,
            }),
            _ => Err(CliError::ParseError(format!(
                "expected pan, tilt and zoom in '{}'",
                line
            ))),
        }
    }
}
