//! Normalized call and media statistics.
//!
//! Every field is optional: firmware releases differ in what they report,
//! and a missing value is always preferable to a made-up one.

use std::collections::BTreeMap;

use groupseries_cli_protocol::PLACEHOLDER;
use serde::Serialize;

/// Call-level figures for the active call.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct CallStats {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub call_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub remote_address: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub protocol: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub requested_call_rate: Option<i32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub call_rate_tx: Option<i32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub call_rate_rx: Option<i32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub percent_packet_loss_tx: Option<f32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub total_packet_loss_tx: Option<i32>,
}

/// Audio channel figures.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct AudioChannelStats {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub codec: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub bit_rate_tx: Option<i32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub bit_rate_rx: Option<i32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub jitter_tx: Option<f32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub jitter_rx: Option<f32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub packet_loss_tx: Option<i32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub packet_loss_rx: Option<i32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub mute_tx: Option<bool>,
}

/// Video or content channel figures.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct VisualChannelStats {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub codec: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub bit_rate_tx: Option<i32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub bit_rate_rx: Option<i32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub jitter_tx: Option<f32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub jitter_rx: Option<f32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub packet_loss_tx: Option<i32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub packet_loss_rx: Option<i32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub frame_rate_tx: Option<f32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub frame_rate_rx: Option<f32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub frame_size_tx: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub frame_size_rx: Option<String>,
}

pub type VideoChannelStats = VisualChannelStats;
pub type ContentChannelStats = VisualChannelStats;

fn is_placeholder(value: &Option<String>) -> bool {
    value.as_deref() == Some(PLACEHOLDER)
}

fn has_value(value: &Option<String>) -> bool {
    matches!(value.as_deref(), Some(v) if v != PLACEHOLDER)
}

fn nonzero_int(value: Option<i32>) -> bool {
    value.is_some_and(|v| v != 0)
}

fn nonzero_float(value: Option<f32>) -> bool {
    value.is_some_and(|v| v != 0.0)
}

impl VisualChannelStats {
    /// Whether the channel carries anything worth reporting.
    pub fn is_not_empty(&self) -> bool {
        has_value(&self.codec)
            || nonzero_int(self.bit_rate_tx)
            || nonzero_int(self.bit_rate_rx)
            || nonzero_float(self.jitter_tx)
            || nonzero_float(self.jitter_rx)
            || nonzero_int(self.packet_loss_tx)
            || nonzero_int(self.packet_loss_rx)
            || nonzero_float(self.frame_rate_tx)
            || nonzero_float(self.frame_rate_rx)
            || has_value(&self.frame_size_tx)
            || has_value(&self.frame_size_rx)
    }

    /// Blank out the side(s) of a content channel that are not streaming.
    ///
    /// A side with no frame rate, no frame size and no bitrate reports its
    /// last packet loss forever; drop its frame rate, bitrate and loss.
    pub fn clean_disabled_sides(&mut self) {
        if !nonzero_float(self.frame_rate_tx)
            && !has_value(&self.frame_size_tx)
            && !nonzero_int(self.bit_rate_tx)
        {
            self.frame_rate_tx = None;
            self.bit_rate_tx = None;
            self.packet_loss_tx = None;
        }
        if !nonzero_float(self.frame_rate_rx)
            && !has_value(&self.frame_size_rx)
            && !nonzero_int(self.bit_rate_rx)
        {
            self.frame_rate_rx = None;
            self.bit_rate_rx = None;
            self.packet_loss_rx = None;
        }
    }

    /// Transmit frame dimensions, see [`frame_dimensions`].
    pub fn frame_size_tx_dimensions(&self) -> Option<(u32, u32)> {
        self.frame_size_tx.as_deref().and_then(frame_dimensions)
    }

    /// Receive frame dimensions, see [`frame_dimensions`].
    pub fn frame_size_rx_dimensions(&self) -> Option<(u32, u32)> {
        self.frame_size_rx.as_deref().and_then(frame_dimensions)
    }

    pub(crate) fn frame_sizes_are_placeholders(&self) -> bool {
        is_placeholder(&self.frame_size_tx) && is_placeholder(&self.frame_size_rx)
    }
}

/// Named resolutions the endpoint reports instead of `WxH`.
const NAMED_FRAME_SIZES: &[(&str, (u32, u32))] = &[
    ("QCIF", (176, 144)),
    ("QSIF", (176, 120)),
    ("SIF", (352, 240)),
    ("CIF", (352, 288)),
    ("4SIF", (704, 480)),
    ("4CIF", (704, 576)),
    ("VGA", (640, 480)),
    ("SVGA", (800, 600)),
    ("XGA", (1024, 768)),
    ("SXGA", (1280, 1024)),
    ("WXGA", (1280, 768)),
    ("480p", (854, 480)),
    ("576p", (1024, 576)),
    ("720p", (1280, 720)),
    ("1080p", (1920, 1080)),
    ("1080i", (1920, 1080)),
    ("4K", (3840, 2160)),
];

/// Width and height for a reported frame size.
///
/// Accepts `WxH` (with an optional trailing `p`) and the named sizes the
/// endpoint uses for standard resolutions.
pub fn frame_dimensions(frame_size: &str) -> Option<(u32, u32)> {
    let size = frame_size.trim();
    if let Some((w, h)) = size.split_once('x') {
        let h = h.strip_suffix('p').unwrap_or(h);
        return Some((w.parse().ok()?, h.parse().ok()?));
    }
    NAMED_FRAME_SIZES
        .iter()
        .find(|(name, _)| name.eq_ignore_ascii_case(size))
        .map(|(_, dims)| *dims)
}

/// Gatekeeper and registrar registration.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct RegistrationStatus {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub h323_gatekeeper: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sip_registrar: Option<String>,
    pub h323_registered: bool,
    pub sip_registered: bool,
}

/// Everything one statistics poll learns about the endpoint's call state.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct EndpointStatistics {
    pub in_call: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub registration_status: Option<RegistrationStatus>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub call_stats: Option<CallStats>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub audio_channel_stats: Option<AudioChannelStats>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub video_channel_stats: Option<VideoChannelStats>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub content_channel_stats: Option<ContentChannelStats>,
}

/// Device facts and current control values, keyed `Category#Name`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ExtendedStatistics {
    pub statistics: BTreeMap<String, String>,
}

impl ExtendedStatistics {
    pub fn insert(&mut self, key: impl Into<String>, value: impl Into<String>) {
        self.statistics.insert(key.into(), value.into());
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.statistics.get(key).map(String::as_str)
    }
}

/// Result of a full statistics poll.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct DeviceStatistics {
    pub extended: ExtendedStatistics,
    pub endpoint: EndpointStatistics,
}
