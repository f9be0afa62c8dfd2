//! Commands understood by the Group Series API.
//!
//! The API accepts several families of commands:
//! - Call control (`dial`, `hangup`, `callinfo`)
//! - Telemetry (`netstats`, `advnetstats`, `status`, `whoami`)
//! - Registration settings (`gatekeeperip`, `systemsetting`)
//! - Audio/video/camera controls (`mute`, `volume`, `videomute`, `camera*`)

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::codec::LineCodec;
use crate::error::CliError;

/// Call speed used when a dial request carries none (kbps).
pub const DEFAULT_CALL_SPEED: u32 = 1920;

/// Signalling protocol that may be forced on a manual dial.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DialProtocol {
    H323,
    Sip,
    Ip,
    Isdn,
    Gateway,
}

impl DialProtocol {
    /// Protocol keyword as the dialer expects it.
    pub fn as_str(&self) -> &'static str {
        match self {
            DialProtocol::H323 => "h323",
            DialProtocol::Sip => "sip",
            DialProtocol::Ip => "ip",
            DialProtocol::Isdn => "isdn",
            DialProtocol::Gateway => "gateway",
        }
    }
}

impl FromStr for DialProtocol {
    type Err = CliError;

    /// Case-insensitive parse of a protocol keyword.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "h323" | "h.323" => Ok(DialProtocol::H323),
            "sip" => Ok(DialProtocol::Sip),
            "ip" => Ok(DialProtocol::Ip),
            "isdn" => Ok(DialProtocol::Isdn),
            "gateway" => Ok(DialProtocol::Gateway),
            _ => Err(CliError::InvalidCommand(format!("unknown dial protocol '{}'", s))),
        }
    }
}

impl fmt::Display for DialProtocol {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Settings under `cameratracking near`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TrackingSetting {
    Tracking,
    Calibrate,
    Framing,
    Mode,
    Participant,
    Pip,
    Speed,
    Wake,
}

impl TrackingSetting {
    pub fn as_str(&self) -> &'static str {
        match self {
            TrackingSetting::Tracking => "tracking",
            TrackingSetting::Calibrate => "calibrate",
            TrackingSetting::Framing => "framing",
            TrackingSetting::Mode => "mode",
            TrackingSetting::Participant => "participant",
            TrackingSetting::Pip => "pip",
            TrackingSetting::Speed => "speed",
            TrackingSetting::Wake => "wake",
        }
    }
}

/// Near-camera position as reported by `camera near getposition`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct CameraPosition {
    pub pan: i32,
    pub tilt: i32,
    pub zoom: i32,
}

/// A command that can be sent to the endpoint.
#[derive(Debug, Clone, PartialEq)]
pub enum Command {
    // ========== Call control ==========
    /// Query the active call (`callinfo all`).
    CallInfoAll,
    /// Dial a destination (`dial manual <speed> <address> [protocol]`).
    DialManual {
        speed: u32,
        address: String,
        protocol: Option<DialProtocol>,
    },
    /// Hang up every call (`hangup all`).
    HangupAll,
    /// Hang up one video call (`hangup video <id>`).
    HangupVideo { call_id: String },

    // ========== Telemetry ==========
    /// Codec/frame-size summary (`netstats`).
    NetStats,
    /// Per-medium rates, jitter and loss (`advnetstats`).
    AdvNetStats,
    /// Subsystem status dump (`status`).
    Status,
    /// Identity facts (`whoami`).
    WhoAmI,

    // ========== Registration ==========
    /// Configured gatekeeper address (`gatekeeperip get`).
    GatekeeperIpGet,
    /// Configured SIP registrar (`systemsetting get sipregistrarserver`).
    SipRegistrarServerGet,

    // ========== Audio ==========
    /// Near-end mute state (`mute near get`).
    MuteNearGet,
    /// Set near-end mute (`mute near on|off`).
    MuteNear { muted: bool },
    /// Speaker volume (`volume get`).
    VolumeGet,
    /// Set speaker volume (`volume <n>`).
    VolumeSet { level: i32 },

    // ========== Video / camera ==========
    /// Near video mute state (`videomute near get`).
    VideoMuteNearGet,
    /// Set near video mute (`videomute near on|off`).
    VideoMuteNear { muted: bool },
    /// Near camera invert state (`camerainvert near get`).
    CameraInvertNearGet,
    /// Set near camera invert (`camerainvert near on|off`).
    CameraInvertNear { inverted: bool },
    /// Current near camera position (`camera near getposition`).
    CameraGetPosition,
    /// Move the near camera (`camera near setposition <pan> <tilt> <zoom>`).
    CameraSetPosition(CameraPosition),
    /// Query a tracking setting (`cameratracking near <setting> get`).
    CameraTrackingGet { setting: TrackingSetting },
    /// Change or trigger a tracking setting (`cameratracking near <setting> [value]`).
    CameraTracking {
        setting: TrackingSetting,
        value: Option<String>,
    },

    // ========== Raw ==========
    /// Raw command string (for anything not covered above).
    Raw { command: String },
}

fn on_off(flag: bool) -> &'static str {
    if flag {
        "on"
    } else {
        "off"
    }
}

impl Command {
    /// Encode the command as bytes for transmission.
    pub fn encode(&self) -> Vec<u8> {
        LineCodec::encode_command(&self.to_command_string())
    }

    /// Convert the command to its string representation.
    pub fn to_command_string(&self) -> String {
        match self {
            // Call control
            Command::CallInfoAll => "callinfo all".to_string(),
            Command::DialManual {
                speed,
                address,
                protocol,
            } => match protocol {
                Some(p) => format!("dial manual {} {} {}", speed, address, p),
                None => format!("dial manual {} {}", speed, address),
            },
            Command::HangupAll => "hangup all".to_string(),
            Command::HangupVideo { call_id } => format!("hangup video {}", call_id),

            // Telemetry
            Command::NetStats => "netstats".to_string(),
            Command::AdvNetStats => "advnetstats".to_string(),
            Command::Status => "status".to_string(),
            Command::WhoAmI => "whoami".to_string(),

            // Registration
            Command::GatekeeperIpGet => "gatekeeperip get".to_string(),
            Command::SipRegistrarServerGet => "systemsetting get sipregistrarserver".to_string(),

            // Audio
            Command::MuteNearGet => "mute near get".to_string(),
            Command::MuteNear { muted } => format!("mute near {}", on_off(*muted)),
            Command::VolumeGet => "volume get".to_string(),
            Command::VolumeSet { level } => format!("volume {}", level),

            // Video / camera
            Command::VideoMuteNearGet => "videomute near get".to_string(),
            Command::VideoMuteNear { muted } => format!("videomute near {}", on_off(*muted)),
            Command::CameraInvertNearGet => "camerainvert near get".to_string(),
            Command::CameraInvertNear { inverted } => {
                format!("camerainvert near {}", on_off(*inverted))
            }
            Command::CameraGetPosition => "camera near getposition".to_string(),
            Command::CameraSetPosition(pos) => {
                format!("camera near setposition {} {} {}", pos.pan, pos.tilt, pos.zoom)
            }
            Command::CameraTrackingGet { setting } => {
                format!("cameratracking near {} get", setting.as_str())
            }
            Command::CameraTracking { setting, value } => match value {
                Some(v) => format!("cameratracking near {} {}", setting.as_str(), v),
                None => format!("cameratracking near {}", setting.as_str()),
            },

            // Raw
            Command::Raw { command } => command.clone(),
        }
    }
}

impl fmt::Display for Command {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_command_string())
    }
}
