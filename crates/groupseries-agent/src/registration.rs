//! Gatekeeper and SIP registrar registration.
//!
//! Each source is probed independently; a source that is unsupported or
//! fails leaves its field at the default and never aborts the poll.

use groupseries_cli_protocol::{setting_value, Command, StatusReport};
use tracing::{debug, warn};

use crate::session::{Probe, Session};
use crate::stats::RegistrationStatus;
use crate::transport::Transport;

const GATEKEEPER_PREFIX: &str = "gatekeeperip ";
const SIP_REGISTRAR_PREFIX: &str = "systemsetting sipregistrarserver ";

/// `status` subsystem names carrying registration state.
const GATEKEEPER_SUBSYSTEM: &str = "gatekeeper";
const SIP_SUBSYSTEM: &str = "sipserver";

fn absorb<T>(host: &str, source: &str, probe: Probe<T>) -> Option<T> {
    match probe {
        Probe::Ok(value) => Some(value),
        Probe::Unsupported => {
            debug!("Session[{}]: {} not available", host, source);
            None
        }
        Probe::Failed(reason) => {
            warn!("Session[{}]: could not read {}: {}", host, source, reason);
            None
        }
    }
}

/// Address configured by a get-style setting command.
fn configured_address<T: Transport>(
    session: &mut Session<T>,
    command: Command,
    prefix: &str,
) -> Option<String> {
    let line = command.to_command_string();
    let host = session.host().to_string();
    let response = absorb(&host, &line, session.probe(&command))?;
    setting_value(&response, &line, prefix).map(str::to_string)
}

/// Read registration state.
///
/// `status` is passed in so a poll that also builds extended statistics
/// sends it only once.
pub fn retrieve<T: Transport>(
    session: &mut Session<T>,
    status: &Probe<StatusReport>,
) -> RegistrationStatus {
    let mut registration = RegistrationStatus {
        sip_registrar: configured_address(
            session,
            Command::SipRegistrarServerGet,
            SIP_REGISTRAR_PREFIX,
        ),
        h323_gatekeeper: configured_address(session, Command::GatekeeperIpGet, GATEKEEPER_PREFIX),
        ..RegistrationStatus::default()
    };

    if let Some(report) = absorb(session.host(), "status", status.clone()) {
        registration.h323_registered = report.is_online(GATEKEEPER_SUBSYSTEM).unwrap_or(false);
        registration.sip_registered = report.is_online(SIP_SUBSYSTEM).unwrap_or(false);
    }
    registration
}
