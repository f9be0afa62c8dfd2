//! One Group Series endpoint: statistics, call control and properties over a
//! single session.

use groupseries_cli_protocol::{Command, MuteState, StatusReport, WhoAmI};
use groupseries_metrics::metric_defs;
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::assembler::{assemble, RawTelemetry};
use crate::call::{self, CallStatus, DialTarget};
use crate::error::AgentResult;
use crate::poll::{BoundedPoll, CancelToken, Pause, PollSettings, ThreadPause};
use crate::properties::{self, ControllableProperty};
use crate::registration;
use crate::session::{Probe, Session};
use crate::stats::{DeviceStatistics, EndpointStatistics, ExtendedStatistics, RegistrationStatus};
use crate::transport::Transport;

/// Poll budgets for operations that wait on the endpoint.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct AgentConfig {
    /// Waiting for a dialled call to appear.
    pub dial: PollSettings,
    /// Waiting for a mute change to take effect.
    pub mute: PollSettings,
}

/// A Group Series endpoint.
pub struct GroupSeries<T, P = ThreadPause> {
    session: Session<T>,
    config: AgentConfig,
    cancel: CancelToken,
    pause: P,
}

impl<T: Transport> GroupSeries<T> {
    pub fn new(host: impl Into<String>, transport: T) -> Self {
        GroupSeries {
            session: Session::new(host, transport),
            config: AgentConfig::default(),
            cancel: CancelToken::new(),
            pause: ThreadPause,
        }
    }
}

impl<T: Transport, P: Pause> GroupSeries<T, P> {
    pub fn with_config(mut self, config: AgentConfig) -> Self {
        self.config = config;
        self
    }

    /// Share a cancel token, e.g. with a signal handler.
    pub fn with_cancel_token(mut self, cancel: CancelToken) -> Self {
        self.cancel = cancel;
        self
    }

    /// Swap how polls wait between attempts.
    pub fn with_pause<Q: Pause>(self, pause: Q) -> GroupSeries<T, Q> {
        GroupSeries {
            session: self.session,
            config: self.config,
            cancel: self.cancel,
            pause,
        }
    }

    pub fn cancel_token(&self) -> CancelToken {
        self.cancel.clone()
    }

    pub fn config(&self) -> &AgentConfig {
        &self.config
    }

    pub fn host(&self) -> &str {
        self.session.host()
    }

    pub fn session(&self) -> &Session<T> {
        &self.session
    }

    pub fn session_mut(&mut self) -> &mut Session<T> {
        &mut self.session
    }

    pub fn pause(&self) -> &P {
        &self.pause
    }

    /// Send a raw command line.
    pub fn send(&mut self, command: &str) -> AgentResult<String> {
        self.session.execute(&Command::Raw {
            command: command.to_string(),
        })
    }

    // ========================================================================
    // Statistics
    // ========================================================================

    /// Full poll: extended facts and control values plus call statistics.
    pub fn statistics(&mut self) -> AgentResult<DeviceStatistics> {
        let status = self.status();
        let extended = self.collect_extended(&status);
        let endpoint = self.collect_endpoint(&status)?;

        let labels = self.session.labels().to_labels();
        metrics::counter!(metric_defs::STATS_POLLS.name, &labels).increment(1);
        metrics::gauge!(metric_defs::STATS_IN_CALL.name, &labels)
            .set(if endpoint.in_call { 1.0 } else { 0.0 });

        Ok(DeviceStatistics { extended, endpoint })
    }

    /// Call statistics only.
    pub fn endpoint_statistics(&mut self) -> AgentResult<EndpointStatistics> {
        let status = self.status();
        self.collect_endpoint(&status)
    }

    /// Device facts, subsystem states and control values.
    pub fn extended_statistics(&mut self) -> ExtendedStatistics {
        let status = self.status();
        self.collect_extended(&status)
    }

    pub fn retrieve_registration_status(&mut self) -> RegistrationStatus {
        let status = self.status();
        registration::retrieve(&mut self.session, &status)
    }

    fn status(&mut self) -> Probe<StatusReport> {
        self.session
            .probe(&Command::Status)
            .map(|response| StatusReport::parse(&response))
    }

    fn collect_endpoint(&mut self, status: &Probe<StatusReport>) -> AgentResult<EndpointStatistics> {
        let registration = registration::retrieve(&mut self.session, status);

        let Some(call_info) = call::active_call(&mut self.session)? else {
            debug!("Session[{}]: not in a call", self.session.host());
            return Ok(EndpointStatistics {
                in_call: false,
                registration_status: Some(registration),
                ..EndpointStatistics::default()
            });
        };

        let mute = self
            .session
            .probe(&Command::MuteNearGet)
            .ok()
            .and_then(|response| MuteState::parse(&response));
        let netstats = self.session.probe(&Command::NetStats).ok();
        let advnetstats = self.session.probe(&Command::AdvNetStats).ok();

        let telemetry = RawTelemetry {
            call_info: &call_info,
            mute,
            netstats: netstats.as_deref(),
            advnetstats: advnetstats.as_deref(),
        };
        Ok(assemble(&telemetry, registration))
    }

    fn collect_extended(&mut self, status: &Probe<StatusReport>) -> ExtendedStatistics {
        let mut extended = ExtendedStatistics::default();

        if let Probe::Ok(response) = self.session.probe(&Command::WhoAmI) {
            for (label, value) in WhoAmI::parse(&response).facts() {
                extended.insert(format!("Device#{}", label.replace(' ', "")), value.as_str());
            }
        }
        if let Probe::Ok(report) = status {
            for (subsystem, state) in report.entries() {
                extended.insert(format!("Status#{}", subsystem), state.as_str());
            }
        }
        properties::read_properties(&mut self.session, &mut extended);
        extended
    }

    // ========================================================================
    // Call control
    // ========================================================================

    /// Dial and wait for the call; see [`call::dial`].
    pub fn dial(&mut self, target: &DialTarget) -> AgentResult<Option<String>> {
        self.cancel.reset();
        let poll = BoundedPoll::new(self.config.dial, &self.cancel, &self.pause);
        call::dial(&mut self.session, target, &poll)
    }

    pub fn hangup(&mut self, call_id: Option<&str>) -> AgentResult<()> {
        call::hangup(&mut self.session, call_id)
    }

    pub fn retrieve_call_status(&mut self, call_id: Option<&str>) -> AgentResult<CallStatus> {
        call::retrieve_call_status(&mut self.session, call_id)
    }

    pub fn mute(&mut self) -> AgentResult<()> {
        info!("Session[{}]: muting", self.session.host());
        call::set_mute(&mut self.session, true)
    }

    pub fn unmute(&mut self) -> AgentResult<()> {
        info!("Session[{}]: unmuting", self.session.host());
        call::set_mute(&mut self.session, false)
    }

    pub fn retrieve_mute_status(&mut self) -> AgentResult<Option<MuteState>> {
        call::retrieve_mute_status(&mut self.session)
    }

    /// Change the mute state and wait until the endpoint reports it.
    pub fn set_mute_confirmed(&mut self, muted: bool) -> AgentResult<Option<MuteState>> {
        self.cancel.reset();
        let poll = BoundedPoll::new(self.config.mute, &self.cancel, &self.pause);
        call::set_mute_confirmed(&mut self.session, muted, &poll)
    }

    // ========================================================================
    // Controllable properties
    // ========================================================================

    pub fn control_property(&mut self, property: &str, value: &str) -> AgentResult<()> {
        properties::apply_property(&mut self.session, property, value)
    }

    pub fn control_properties(&mut self, batch: &[ControllableProperty]) -> AgentResult<()> {
        properties::apply_properties(&mut self.session, batch)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::poll::tests::RecordingPause;
    use crate::scripted::ScriptedTransport;

    const IDLE: &str = "callinfo all\r\r\nsystem is not in a call\r\r\n";

    #[test]
    fn test_idle_statistics() {
        let transport = ScriptedTransport::new()
            .respond("callinfo all", IDLE)
            .respond("status", "status\r\r\ngatekeeper offline\r\r\nsipserver online\r\r\nstatus end\r\r\n")
            .respond("volume get", "volume get\r\r\nvolume 40\r\r\n");
        let mut device = GroupSeries::new("10.0.0.5", transport);

        let stats = device.statistics().unwrap();

        assert!(!stats.endpoint.in_call);
        let registration = stats.endpoint.registration_status.unwrap();
        assert!(registration.sip_registered);
        assert!(!registration.h323_registered);
        assert!(stats.endpoint.call_stats.is_none());
        assert_eq!(stats.extended.get("Status#sipserver"), Some("online"));
        assert_eq!(stats.extended.get("Audio#Volume"), Some("40"));
        assert_eq!(device.session().transport().count("status"), 1);
        assert_eq!(device.session().transport().count("netstats"), 0);
    }

    #[test]
    fn test_whoami_facts() {
        let transport = ScriptedTransport::new().respond(
            "whoami",
            "whoami\r\r\nHi, my name is : Room 101\r\r\nModel: GROUP500\r\r\nSNMP Enabled: True\r\r\n",
        );
        let mut device = GroupSeries::new("10.0.0.5", transport);

        let extended = device.extended_statistics();
        assert_eq!(extended.get("Device#SystemName"), Some("Room 101"));
        assert_eq!(extended.get("Device#Model"), Some("GROUP500"));
        assert_eq!(extended.get("Device#SNMPEnabled"), Some("True"));
    }

    #[test]
    fn test_dial_uses_configured_budget() {
        let transport = ScriptedTransport::new()
            .respond("dial manual 1920 10.1.1.9", "dial manual 1920 10.1.1.9\r\r\n")
            .respond("callinfo all", IDLE);
        let config = AgentConfig {
            dial: PollSettings {
                max_attempts: 3,
                interval_ms: 5,
            },
            ..AgentConfig::default()
        };
        let mut device = GroupSeries::new("10.0.0.5", transport)
            .with_config(config)
            .with_pause(RecordingPause::default());

        assert_eq!(device.dial(&DialTarget::new("10.1.1.9")).unwrap(), None);
        assert_eq!(device.session().transport().count("callinfo all"), 3);
        assert_eq!(device.pause().pauses.borrow().len(), 2);
    }

    #[test]
    fn test_raw_send() {
        let transport = ScriptedTransport::new().respond("version", "version\r\r\nversion \"6.2.2\"\r\r\n");
        let mut device = GroupSeries::new("10.0.0.5", transport);
        assert!(device.send("version").unwrap().contains("6.2.2"));
    }
}
