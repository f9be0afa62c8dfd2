//! Call lifecycle: dial, hang up, status, and near-end mute.

use groupseries_cli_protocol::{CallInfo, CliError, Command, DialProtocol, MuteState, DEFAULT_CALL_SPEED};
use groupseries_metrics::metric_defs;
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::error::{AgentError, AgentResult};
use crate::poll::{BoundedPoll, Pause, PollOutcome};
use crate::session::Session;
use crate::transport::Transport;

/// What to dial.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DialTarget {
    pub dial_string: String,
    /// Call speed in kbps; absent or non-positive means the default.
    #[serde(default)]
    pub call_speed: Option<i32>,
    #[serde(default)]
    pub protocol: Option<DialProtocol>,
}

impl DialTarget {
    pub fn new(dial_string: impl Into<String>) -> Self {
        DialTarget {
            dial_string: dial_string.into(),
            call_speed: None,
            protocol: None,
        }
    }

    pub fn with_speed(mut self, speed: i32) -> Self {
        self.call_speed = Some(speed);
        self
    }

    pub fn with_protocol(mut self, protocol: DialProtocol) -> Self {
        self.protocol = Some(protocol);
        self
    }

    /// Speed actually dialled.
    pub fn effective_speed(&self) -> u32 {
        match self.call_speed {
            Some(speed) if speed > 0 => speed as u32,
            _ => DEFAULT_CALL_SPEED,
        }
    }

    fn command(&self) -> Command {
        Command::DialManual {
            speed: self.effective_speed(),
            address: self.dial_string.trim().to_string(),
            protocol: self.protocol,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum CallState {
    Connected,
    Disconnected,
}

/// Answer to a call status query.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CallStatus {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub call_id: Option<String>,
    pub state: CallState,
}

/// The active call, if any.
pub fn active_call<T: Transport>(session: &mut Session<T>) -> AgentResult<Option<CallInfo>> {
    let response = session.execute(&Command::CallInfoAll)?;
    Ok(CallInfo::parse(&response))
}

/// Dial `target` and wait until the call appears in `callinfo`.
///
/// Returns the new call id, or `None` if the call never showed up within
/// the poll budget or the poll was cancelled.
pub fn dial<T: Transport, P: Pause + ?Sized>(
    session: &mut Session<T>,
    target: &DialTarget,
    poll: &BoundedPoll<'_, P>,
) -> AgentResult<Option<String>> {
    let address = target.dial_string.trim();
    if address.is_empty() {
        return Err(AgentError::Protocol(CliError::InvalidCommand(
            "dial string is empty".to_string(),
        )));
    }

    info!("Session[{}]: dialling {} at {} kbps", session.host(), address, target.effective_speed());
    session.execute(&target.command())?;

    let outcome = poll.run(|attempt| {
        let call = active_call(session)?;
        debug!("Session[{}]: dial poll {} sees {:?}", session.host(), attempt, call);
        Ok(call
            .filter(|c| c.remote_address.trim() == address)
            .map(|c| c.call_id))
    })?;

    let labels = session.labels().to_labels();
    metrics::histogram!(metric_defs::DIAL_POLL_ATTEMPTS.name, &labels).record(outcome.attempts() as f64);

    match outcome {
        PollOutcome::Found { value, attempts } => {
            info!("Session[{}]: call {} up after {} checks", session.host(), value, attempts);
            Ok(Some(value))
        }
        PollOutcome::Exhausted { attempts } => {
            warn!("Session[{}]: no call to {} after {} checks", session.host(), address, attempts);
            Ok(None)
        }
        PollOutcome::Cancelled { attempts } => {
            info!("Session[{}]: dial poll cancelled after {} checks", session.host(), attempts);
            Ok(None)
        }
    }
}

/// Hang up one call, or every call when `call_id` is absent or empty.
pub fn hangup<T: Transport>(session: &mut Session<T>, call_id: Option<&str>) -> AgentResult<()> {
    let command = match call_id.map(str::trim) {
        Some(id) if !id.is_empty() => Command::HangupVideo {
            call_id: id.to_string(),
        },
        _ => Command::HangupAll,
    };
    info!("Session[{}]: {}", session.host(), command);
    session.execute(&command)?;
    Ok(())
}

/// Whether the call `call_id` (or any call, when absent) is connected.
pub fn retrieve_call_status<T: Transport>(
    session: &mut Session<T>,
    call_id: Option<&str>,
) -> AgentResult<CallStatus> {
    let requested = call_id.map(str::trim).filter(|id| !id.is_empty());
    let status = match active_call(session)? {
        Some(call) if requested.map_or(true, |id| id == call.call_id) => CallStatus {
            call_id: Some(call.call_id),
            state: CallState::Connected,
        },
        _ => CallStatus {
            call_id: requested.map(str::to_string),
            state: CallState::Disconnected,
        },
    };
    Ok(status)
}

/// Current near-end mute state, `None` if the answer is unrecognised.
pub fn retrieve_mute_status<T: Transport>(session: &mut Session<T>) -> AgentResult<Option<MuteState>> {
    let response = session.execute(&Command::MuteNearGet)?;
    Ok(MuteState::parse(&response))
}

pub fn set_mute<T: Transport>(session: &mut Session<T>, muted: bool) -> AgentResult<()> {
    session.execute(&Command::MuteNear { muted })?;
    Ok(())
}

/// Change the mute state and poll until the endpoint reports it.
///
/// Returns the confirmed state, or `None` when the poll ran out or was
/// cancelled before the endpoint agreed.
pub fn set_mute_confirmed<T: Transport, P: Pause + ?Sized>(
    session: &mut Session<T>,
    muted: bool,
    poll: &BoundedPoll<'_, P>,
) -> AgentResult<Option<MuteState>> {
    set_mute(session, muted)?;
    let outcome = poll.run(|_| {
        Ok(retrieve_mute_status(session)?.filter(|state| state.is_muted() == muted))
    })?;
    if outcome.found().is_none() {
        warn!("Session[{}]: mute {} not confirmed", session.host(), muted);
        return Ok(None);
    }
    Ok(Some(if muted { MuteState::Muted } else { MuteState::Unmuted }))
}
