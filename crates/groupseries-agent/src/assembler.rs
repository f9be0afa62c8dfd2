//! Turns raw telemetry dumps into [`EndpointStatistics`].
//!
//! Tokens from `netstats` and `advnetstats` are routed through static
//! `code -> setter` tables into a draft, then a few rules decide what
//! survives:
//!
//! - a `netstats` dump with only placeholders means no media is flowing and
//!   yields the bare default aggregate;
//! - an `advnetstats` dump that fills none of the channel fields does too;
//! - call rates are the sums of the per-medium rates;
//! - video and content channels are reported only when non-trivial, and the
//!   idle side of a content channel is blanked.

use groupseries_cli_protocol::{tokenize, to_float, to_int, CallInfo, MuteState, PLACEHOLDER};
use tracing::{debug, trace};

use crate::stats::{
    AudioChannelStats, CallStats, EndpointStatistics, RegistrationStatus, VisualChannelStats,
};

/// Per-medium rates from `advnetstats`, summed into call rates.
#[derive(Debug, Clone, Default, PartialEq)]
pub(crate) struct MediaRates {
    audio_tx: Option<i32>,
    audio_rx: Option<i32>,
    video_tx: Option<i32>,
    video_rx: Option<i32>,
    content_tx: Option<i32>,
    content_rx: Option<i32>,
}

/// Missing contributors count as zero; the sum saturates.
fn sum_rates(rates: [Option<i32>; 3]) -> i32 {
    rates
        .iter()
        .map(|r| r.unwrap_or(0))
        .fold(0i32, i32::saturating_add)
}

/// Statistics under construction.
#[derive(Debug, Clone, Default, PartialEq)]
pub(crate) struct StatsDraft {
    call: CallStats,
    audio: AudioChannelStats,
    video: VisualChannelStats,
    content: VisualChannelStats,
    rates: MediaRates,
}

/// Writes one token value into the draft.
pub(crate) type Setter = fn(&mut StatsDraft, &str);

/// Frame sizes like `640x480p` lose the trailing `p`; named sizes such as
/// `720p` or `SIF` are kept verbatim.
fn frame_size(value: &str) -> String {
    if value.contains('x') {
        value.strip_suffix('p').unwrap_or(value).to_string()
    } else {
        value.to_string()
    }
}

/// Token table for `netstats`.
pub(crate) static NETSTATS_FIELDS: &[(&str, Setter)] = &[
    ("tvp", |d: &mut StatsDraft, v: &str| d.video.codec = Some(v.to_string())),
    ("tap", |d: &mut StatsDraft, v: &str| d.audio.codec = Some(v.to_string())),
    ("rctp", |d: &mut StatsDraft, v: &str| d.content.codec = Some(v.to_string())),
    ("tcp", |d: &mut StatsDraft, v: &str| d.call.protocol = Some(v.to_string())),
    ("%pktloss", |d: &mut StatsDraft, v: &str| d.call.percent_packet_loss_tx = to_float(v)),
    ("pktloss", |d: &mut StatsDraft, v: &str| d.call.total_packet_loss_tx = to_int(v)),
    ("tvf", |d: &mut StatsDraft, v: &str| d.video.frame_size_tx = Some(frame_size(v))),
    ("rvf", |d: &mut StatsDraft, v: &str| d.video.frame_size_rx = Some(frame_size(v))),
];

/// Token table for `advnetstats`.
pub(crate) static ADVNETSTATS_FIELDS: &[(&str, Setter)] = &[
    // Rates
    ("tar", |d: &mut StatsDraft, v: &str| d.rates.audio_tx = to_int(v)),
    ("rar", |d: &mut StatsDraft, v: &str| d.rates.audio_rx = to_int(v)),
    ("tvr", |d: &mut StatsDraft, v: &str| d.rates.video_tx = to_int(v)),
    ("rvr", |d: &mut StatsDraft, v: &str| d.rates.video_rx = to_int(v)),
    ("tcr", |d: &mut StatsDraft, v: &str| d.rates.content_tx = to_int(v)),
    ("rcr", |d: &mut StatsDraft, v: &str| d.rates.content_rx = to_int(v)),
    // Audio
    ("taj", |d: &mut StatsDraft, v: &str| d.audio.jitter_tx = to_float(v)),
    ("raj", |d: &mut StatsDraft, v: &str| d.audio.jitter_rx = to_float(v)),
    ("tapl", |d: &mut StatsDraft, v: &str| d.audio.packet_loss_tx = to_int(v)),
    ("rapl", |d: &mut StatsDraft, v: &str| d.audio.packet_loss_rx = to_int(v)),
    // Video
    ("tvj", |d: &mut StatsDraft, v: &str| d.video.jitter_tx = to_float(v)),
    ("rvj", |d: &mut StatsDraft, v: &str| d.video.jitter_rx = to_float(v)),
    ("tvpl", |d: &mut StatsDraft, v: &str| d.video.packet_loss_tx = to_int(v)),
    ("rvpl", |d: &mut StatsDraft, v: &str| d.video.packet_loss_rx = to_int(v)),
    ("tvru", |d: &mut StatsDraft, v: &str| d.video.bit_rate_tx = to_int(v)),
    ("rvru", |d: &mut StatsDraft, v: &str| d.video.bit_rate_rx = to_int(v)),
    ("tvfr", |d: &mut StatsDraft, v: &str| d.video.frame_rate_tx = to_float(v)),
    ("rvfr", |d: &mut StatsDraft, v: &str| d.video.frame_rate_rx = to_float(v)),
    // Content
    ("tcpl", |d: &mut StatsDraft, v: &str| d.content.packet_loss_tx = to_int(v)),
    ("rcpl", |d: &mut StatsDraft, v: &str| d.content.packet_loss_rx = to_int(v)),
    ("tcru", |d: &mut StatsDraft, v: &str| d.content.bit_rate_tx = to_int(v)),
    ("rcru", |d: &mut StatsDraft, v: &str| d.content.bit_rate_rx = to_int(v)),
    ("tcfr", |d: &mut StatsDraft, v: &str| d.content.frame_rate_tx = to_float(v)),
    ("rcfr", |d: &mut StatsDraft, v: &str| d.content.frame_rate_rx = to_float(v)),
];

pub(crate) fn setter_for(table: &[(&str, Setter)], code: &str) -> Option<Setter> {
    table
        .iter()
        .find(|(known, _)| *known == code)
        .map(|(_, setter)| *setter)
}

impl StatsDraft {
    fn from_call_info(call_info: &CallInfo) -> Self {
        let mut draft = StatsDraft::default();
        draft.call.call_id = Some(call_info.call_id.clone());
        draft.call.remote_address = Some(call_info.remote_address.clone());
        draft.call.requested_call_rate = call_info.requested_call_rate();
        draft
    }

    fn apply(&mut self, table: &[(&str, Setter)], raw: &str) {
        for token in tokenize(raw) {
            match setter_for(table, token.key) {
                Some(set) => set(self, token.value),
                None => trace!("ignoring telemetry code '{}'", token.key),
            }
        }
    }

    /// `netstats` with nothing but placeholders: no media is flowing.
    fn is_placeholder_dataset(&self) -> bool {
        let placeholder = |v: &Option<String>| v.as_deref() == Some(PLACEHOLDER);
        placeholder(&self.video.codec)
            && placeholder(&self.audio.codec)
            && placeholder(&self.call.protocol)
            && self.call.percent_packet_loss_tx.is_none()
            && self.video.frame_sizes_are_placeholders()
    }

    /// `advnetstats` filled none of the channel fields it owns.
    fn has_no_channel_data(&self) -> bool {
        let (a, v, c) = (&self.audio, &self.video, &self.content);
        a.jitter_tx.is_none()
            && a.jitter_rx.is_none()
            && a.packet_loss_tx.is_none()
            && a.packet_loss_rx.is_none()
            && v.bit_rate_tx.is_none()
            && v.bit_rate_rx.is_none()
            && v.jitter_tx.is_none()
            && v.jitter_rx.is_none()
            && v.packet_loss_tx.is_none()
            && v.packet_loss_rx.is_none()
            && v.frame_rate_tx.is_none()
            && v.frame_rate_rx.is_none()
            && c.bit_rate_tx.is_none()
            && c.bit_rate_rx.is_none()
            && c.packet_loss_tx.is_none()
            && c.packet_loss_rx.is_none()
            && c.frame_rate_tx.is_none()
            && c.frame_rate_rx.is_none()
    }

    /// Call rates are per-medium sums; a medium's rate replaces its "rate
    /// used" figure as the channel bitrate when both are reported.
    fn apply_rates(&mut self) {
        let r = &self.rates;
        self.call.call_rate_tx = Some(sum_rates([r.video_tx, r.audio_tx, r.content_tx]));
        self.call.call_rate_rx = Some(sum_rates([r.video_rx, r.audio_rx, r.content_rx]));

        self.audio.bit_rate_tx = r.audio_tx;
        self.audio.bit_rate_rx = r.audio_rx;
        self.video.bit_rate_tx = r.video_tx.or(self.video.bit_rate_tx);
        self.video.bit_rate_rx = r.video_rx.or(self.video.bit_rate_rx);
        self.content.bit_rate_tx = r.content_tx.or(self.content.bit_rate_tx);
        self.content.bit_rate_rx = r.content_rx.or(self.content.bit_rate_rx);
    }

    fn finish(self, registration: RegistrationStatus) -> EndpointStatistics {
        let StatsDraft {
            call,
            audio,
            video,
            mut content,
            ..
        } = self;
        let content = if content.is_not_empty() {
            content.clean_disabled_sides();
            Some(content)
        } else {
            None
        };
        EndpointStatistics {
            in_call: true,
            registration_status: Some(registration),
            call_stats: Some(call),
            audio_channel_stats: Some(audio),
            video_channel_stats: video.is_not_empty().then_some(video),
            content_channel_stats: content,
        }
    }
}

/// Raw command output gathered for one poll of an active call.
#[derive(Debug, Clone, Copy)]
pub struct RawTelemetry<'a> {
    pub call_info: &'a CallInfo,
    /// Parsed `mute near get`, when the probe answered.
    pub mute: Option<MuteState>,
    /// `netstats` output, when supported.
    pub netstats: Option<&'a str>,
    /// `advnetstats` output, when supported.
    pub advnetstats: Option<&'a str>,
}

fn non_blank(text: Option<&str>) -> Option<&str> {
    text.filter(|t| !t.trim().is_empty())
}

/// Assemble statistics for an active call.
///
/// Pure: the same inputs always produce the same aggregate.
pub fn assemble(telemetry: &RawTelemetry<'_>, registration: RegistrationStatus) -> EndpointStatistics {
    let mut draft = StatsDraft::from_call_info(telemetry.call_info);
    draft.audio.mute_tx = telemetry.mute.map(|m| m.is_muted());

    let Some(netstats) = non_blank(telemetry.netstats) else {
        debug!("no netstats for call {}, reporting defaults", telemetry.call_info.call_id);
        return EndpointStatistics::default();
    };
    draft.apply(NETSTATS_FIELDS, netstats);
    if draft.is_placeholder_dataset() {
        debug!("netstats carries only placeholders, reporting defaults");
        return EndpointStatistics::default();
    }

    if let Some(advnetstats) = non_blank(telemetry.advnetstats) {
        draft.apply(ADVNETSTATS_FIELDS, advnetstats);
        if draft.has_no_channel_data() {
            debug!("advnetstats carries no channel data, reporting defaults");
            return EndpointStatistics::default();
        }
        draft.apply_rates();
    }

    draft.finish(registration)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    fn call_info() -> CallInfo {
        CallInfo {
            call_id: "7".to_string(),
            remote_name: "Lobby".to_string(),
            remote_address: "10.1.1.9".to_string(),
            speed: "768".to_string(),
        }
    }

    fn telemetry<'a>(
        call_info: &'a CallInfo,
        netstats: &'a str,
        advnetstats: Option<&'a str>,
    ) -> RawTelemetry<'a> {
        RawTelemetry {
            call_info,
            mute: Some(MuteState::Unmuted),
            netstats: Some(netstats),
            advnetstats,
        }
    }

    #[test]
    fn test_table_codes_are_unique() {
        for table in [NETSTATS_FIELDS, ADVNETSTATS_FIELDS] {
            let codes: HashSet<&str> = table.iter().map(|(code, _)| *code).collect();
            assert_eq!(codes.len(), table.len());
        }
    }

    #[test]
    fn test_setter_lookup() {
        let mut draft = StatsDraft::default();
        let set = setter_for(NETSTATS_FIELDS, "tvf").unwrap();
        set(&mut draft, "1280x720p");
        assert_eq!(draft.video.frame_size_tx.as_deref(), Some("1280x720"));

        let set = setter_for(NETSTATS_FIELDS, "%pktloss").unwrap();
        set(&mut draft, "0.5");
        assert_eq!(draft.call.percent_packet_loss_tx, Some(0.5));

        assert!(setter_for(NETSTATS_FIELDS, "txrate").is_none());
        assert!(setter_for(ADVNETSTATS_FIELDS, "tvp").is_none());
    }

    #[test]
    fn test_frame_size_normalization() {
        assert_eq!(frame_size("640x480p"), "640x480");
        assert_eq!(frame_size("720p"), "720p");
        assert_eq!(frame_size("SIF"), "SIF");
        assert_eq!(frame_size("---"), "---");
    }

    #[test]
    fn test_placeholder_netstats_yields_default() {
        let info = call_info();
        let netstats = "call:0 txrate:0 K rxrate:0 K pktloss:0\r\r\ntvp:--- rvp:--- tvf:--- rvf:--- tap:--- rap:--- tcp:--- rcp:---\r\r\n";
        let stats = assemble(&telemetry(&info, netstats, None), RegistrationStatus::default());
        assert_eq!(stats, EndpointStatistics::default());
    }

    #[test]
    fn test_missing_netstats_yields_default() {
        let info = call_info();
        let raw = RawTelemetry {
            call_info: &info,
            mute: None,
            netstats: Some("  \r\r\n"),
            advnetstats: Some("tar:64 K"),
        };
        assert_eq!(assemble(&raw, RegistrationStatus::default()), EndpointStatistics::default());
    }

    #[test]
    fn test_advnetstats_without_channel_data_yields_default() {
        let info = call_info();
        let netstats = "tvp:H.264 tap:G.722 tcp:h323 tvf:720p rvf:720p %pktloss:0.0 %";
        let stats = assemble(
            &telemetry(&info, netstats, Some("call:0 tar:64 K rar:64 K ccaps:---")),
            RegistrationStatus::default(),
        );
        assert_eq!(stats, EndpointStatistics::default());
    }

    #[test]
    fn test_rates_and_empty_video_omitted() {
        let info = call_info();
        let netstats = "tvp:--- tap:G.722 tcp:h323 tvf:--- rvf:--- %pktloss:0.0 %";
        let advnetstats = "tar:64 K rar:64 K tvr:0 K rvr:0 K\r\r\ntapl:0 rapl:1 taj:2 ms raj:3 ms tvpl:0 rvpl:0\r\r\ntvj:0 ms rvj:0 ms tvfr:0 rvfr:0\r\r\n";
        let stats = assemble(&telemetry(&info, netstats, Some(advnetstats)), RegistrationStatus::default());

        assert!(stats.in_call);
        let call = stats.call_stats.as_ref().unwrap();
        assert_eq!(call.call_id.as_deref(), Some("7"));
        assert_eq!(call.requested_call_rate, Some(768));
        assert_eq!(call.call_rate_tx, Some(64));
        assert_eq!(call.call_rate_rx, Some(64));

        let audio = stats.audio_channel_stats.as_ref().unwrap();
        assert_eq!(audio.bit_rate_tx, Some(64));
        assert_eq!(audio.mute_tx, Some(false));
        assert!(stats.video_channel_stats.is_none());
        assert!(stats.content_channel_stats.is_none());
    }

    #[test]
    fn test_rate_used_kept_without_rate() {
        let info = call_info();
        let netstats = "tvp:H.264 tap:G.722 tcp:h323 tvf:720p rvf:720p %pktloss:0.0 %";
        let advnetstats = "tar:64 K tvru:700 K rvr:512 K rvru:500 K tvfr:30 rvfr:30";
        let stats = assemble(&telemetry(&info, netstats, Some(advnetstats)), RegistrationStatus::default());

        let video = stats.video_channel_stats.unwrap();
        assert_eq!(video.bit_rate_tx, Some(700));
        assert_eq!(video.bit_rate_rx, Some(512));
        let call = stats.call_stats.unwrap();
        assert_eq!(call.call_rate_tx, Some(64));
        assert_eq!(call.call_rate_rx, Some(512));
    }

    #[test]
    fn test_call_rates_zero_without_rate_tokens() {
        let info = call_info();
        let netstats = "tvp:H.264 tap:G.722 tcp:sip tvf:720p rvf:720p %pktloss:0.0 %";
        let advnetstats = "tvj:3 ms rvj:4 ms taj:1 ms raj:2 ms tvpl:1";
        let stats = assemble(&telemetry(&info, netstats, Some(advnetstats)), RegistrationStatus::default());

        let call = stats.call_stats.unwrap();
        assert_eq!(call.call_rate_tx, Some(0));
        assert_eq!(call.call_rate_rx, Some(0));
    }

    #[test]
    fn test_call_rate_sum_saturates() {
        assert_eq!(sum_rates([Some(i32::MAX), Some(1), None]), i32::MAX);
        assert_eq!(sum_rates([None, None, None]), 0);

        let info = call_info();
        let netstats = "tvp:H.264 tap:G.722 tcp:sip tvf:720p rvf:720p %pktloss:0.0 %";
        let advnetstats = "tvr:2000000000 tar:2000000000 tcr:1 rvr:1 rar:1 rcr:1 tvj:2";
        let stats = assemble(&telemetry(&info, netstats, Some(advnetstats)), RegistrationStatus::default());

        let call = stats.call_stats.unwrap();
        assert_eq!(call.call_rate_tx, Some(i32::MAX));
        assert_eq!(call.call_rate_rx, Some(3));
    }

    #[test]
    fn test_content_rate_used_kept_without_rate() {
        let info = call_info();
        let netstats = "tvp:H.264 tap:G.722 rctp:H.264 tcp:sip tvf:720p rvf:720p %pktloss:0.0 %";
        let advnetstats = "tvr:512 K rvr:512 K tcru:300 K rcr:256 K rcru:200 K tcfr:5 rcfr:5";
        let stats = assemble(&telemetry(&info, netstats, Some(advnetstats)), RegistrationStatus::default());

        let content = stats.content_channel_stats.unwrap();
        assert_eq!(content.bit_rate_tx, Some(300));
        assert_eq!(content.bit_rate_rx, Some(256));
        let call = stats.call_stats.unwrap();
        assert_eq!(call.call_rate_tx, Some(512));
        assert_eq!(call.call_rate_rx, Some(768));
    }

    #[test]
    fn test_netstats_without_advnetstats() {
        let info = call_info();
        let netstats = "tvp:H.264 tap:G.722 tcp:sip tvf:720p rvf:640x480p pktloss:2 %pktloss:0.3 %";
        let stats = assemble(&telemetry(&info, netstats, None), RegistrationStatus::default());

        let call = stats.call_stats.unwrap();
        assert_eq!(call.protocol.as_deref(), Some("sip"));
        assert_eq!(call.total_packet_loss_tx, Some(2));
        assert_eq!(call.call_rate_tx, None);
        let video = stats.video_channel_stats.unwrap();
        assert_eq!(video.frame_size_rx.as_deref(), Some("640x480"));
        assert_eq!(video.bit_rate_tx, None);
    }
}
