//! Logged, metered command session on top of a [`Transport`].

use std::time::Instant;

use groupseries_cli_protocol::Command;
use groupseries_metrics::{metric_defs, MetricLabels};
use tracing::{debug, trace, warn};

use crate::error::AgentResult;
use crate::transport::Transport;

/// Text the firmware prints when a command exists but is not available on
/// this model or software level.
pub const CAPABILITY_REJECTION: &str = "only supported";

/// Outcome of an optional query.
///
/// Optional queries (registration, extended properties, secondary
/// statistics) must never abort a poll, so their failures are carried as
/// values instead of errors.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Probe<T> {
    /// The endpoint answered.
    Ok(T),
    /// The endpoint rejected or does not know the command.
    Unsupported,
    /// The session failed while probing.
    Failed(String),
}

impl<T> Probe<T> {
    pub fn ok(self) -> Option<T> {
        match self {
            Probe::Ok(v) => Some(v),
            _ => None,
        }
    }

    pub fn map<U>(self, f: impl FnOnce(T) -> U) -> Probe<U> {
        match self {
            Probe::Ok(v) => Probe::Ok(f(v)),
            Probe::Unsupported => Probe::Unsupported,
            Probe::Failed(reason) => Probe::Failed(reason),
        }
    }

    pub fn is_ok(&self) -> bool {
        matches!(self, Probe::Ok(_))
    }
}

/// First word of a command line, used as a low-cardinality metric label.
fn command_label(command: &str) -> String {
    command.split_whitespace().next().unwrap_or_default().to_string()
}

/// A command session with one endpoint.
pub struct Session<T> {
    transport: T,
    host: String,
    labels: MetricLabels,
    commands_sent: u32,
    commands_failed: u32,
}

impl<T: Transport> Session<T> {
    pub fn new(host: impl Into<String>, transport: T) -> Self {
        let host = host.into();
        Session {
            transport,
            labels: MetricLabels::new(host.clone()),
            host,
            commands_sent: 0,
            commands_failed: 0,
        }
    }

    pub fn host(&self) -> &str {
        &self.host
    }

    pub fn labels(&self) -> &MetricLabels {
        &self.labels
    }

    pub fn transport(&self) -> &T {
        &self.transport
    }

    pub fn transport_mut(&mut self) -> &mut T {
        &mut self.transport
    }

    pub fn into_transport(self) -> T {
        self.transport
    }

    /// Commands sent and commands failed since the session was created.
    pub fn counters(&self) -> (u32, u32) {
        (self.commands_sent, self.commands_failed)
    }

    /// Send a typed command.
    pub fn execute(&mut self, command: &Command) -> AgentResult<String> {
        self.send(&command.to_command_string())
    }

    /// Send a command whose support is optional.
    pub fn probe(&mut self, command: &Command) -> Probe<String> {
        let line = command.to_command_string();
        let outcome = match self.send(&line) {
            Ok(response) if response.trim().is_empty() => Probe::Unsupported,
            Ok(response) if response.contains(CAPABILITY_REJECTION) => Probe::Unsupported,
            Ok(response) => Probe::Ok(response),
            Err(e) if e.is_command_failure() => Probe::Unsupported,
            Err(e) => {
                warn!("Session[{}]: probe '{}' failed: {}", self.host, line, e);
                Probe::Failed(e.to_string())
            }
        };
        if outcome == Probe::Unsupported {
            debug!("Session[{}]: '{}' is not supported", self.host, line);
            let labels = self.labels.with(&[("command", command_label(&line))]);
            metrics::counter!(metric_defs::PROBE_UNSUPPORTED.name, &labels).increment(1);
        }
        outcome
    }
}

impl<T: Transport> Transport for Session<T> {
    fn send(&mut self, command: &str) -> AgentResult<String> {
        let labels = self.labels.with(&[("command", command_label(command))]);
        self.commands_sent += 1;
        metrics::counter!(metric_defs::SESSION_COMMANDS_SENT.name, &labels).increment(1);

        trace!("Session[{}]: -> {}", self.host, command);
        let started = Instant::now();
        match self.transport.send(command) {
            Ok(response) => {
                metrics::histogram!(metric_defs::SESSION_RESPONSE_SIZE.name, &labels)
                    .record(response.len() as f64);
                metrics::histogram!(metric_defs::SESSION_RESPONSE_TIME.name, &labels)
                    .record(started.elapsed().as_secs_f64() * 1000.0);
                trace!("Session[{}]: <- {:?}", self.host, response);
                Ok(response)
            }
            Err(e) => {
                self.commands_failed += 1;
                metrics::counter!(metric_defs::SESSION_COMMAND_FAILURES.name, &labels).increment(1);
                debug!("Session[{}]: '{}' failed: {}", self.host, command, e);
                Err(e)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::AgentError;
    use crate::scripted::ScriptedTransport;

    fn session(transport: ScriptedTransport) -> Session<ScriptedTransport> {
        Session::new("10.0.0.5", transport)
    }

    #[test]
    fn test_command_label() {
        assert_eq!(command_label("mute near get"), "mute");
        assert_eq!(command_label(""), "");
    }

    #[test]
    fn test_probe_ok() {
        let mut session = session(ScriptedTransport::new().respond("volume get", "volume 25\r\r\n"));
        assert_eq!(
            session.probe(&Command::VolumeGet),
            Probe::Ok("volume 25\r\r\n".to_string())
        );
    }

    #[test]
    fn test_probe_unknown_command_is_unsupported() {
        let mut session = session(ScriptedTransport::new());
        assert_eq!(session.probe(&Command::WhoAmI), Probe::Unsupported);
        assert_eq!(session.counters(), (1, 1));
    }

    #[test]
    fn test_probe_capability_rejection_is_unsupported() {
        let mut session = session(ScriptedTransport::new().respond(
            "cameratracking near mode get",
            "only supported on EagleEye Director\r\r\n",
        ));
        let probe = session.probe(&Command::CameraTrackingGet {
            setting: groupseries_cli_protocol::TrackingSetting::Mode,
        });
        assert_eq!(probe, Probe::Unsupported);
    }

    #[test]
    fn test_probe_session_failure_is_failed() {
        let mut session = session(ScriptedTransport::new().fail(
            "status",
            AgentError::ConnectionClosed { host: "10.0.0.5".to_string() },
        ));
        assert!(matches!(session.probe(&Command::Status), Probe::Failed(_)));
    }

    #[test]
    fn test_execute_propagates_command_failure() {
        let mut session = session(ScriptedTransport::new());
        let err = session.execute(&Command::HangupAll).unwrap_err();
        assert!(err.is_command_failure());
    }

    #[test]
    fn test_probe_map() {
        assert_eq!(Probe::Ok(2).map(|v| v * 2), Probe::Ok(4));
        assert_eq!(Probe::<i32>::Unsupported.map(|v| v * 2), Probe::Unsupported);
        assert_eq!(Probe::Ok("x").ok(), Some("x"));
        assert!(!Probe::<()>::Failed("down".to_string()).is_ok());
    }
}
