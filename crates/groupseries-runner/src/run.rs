//! Executes one subcommand against a device.

use groupseries_agent::{DialTarget, GroupSeries, Pause, Transport};
use serde_json::{json, Value};
use tracing::info;

use crate::cli::Commands;
use crate::error::RunnerResult;
use crate::output::Report;

fn operation(command: &Commands) -> &'static str {
    match command {
        Commands::Stats => "stats",
        Commands::Dial { .. } => "dial",
        Commands::Hangup { .. } => "hangup",
        Commands::CallStatus { .. } => "call-status",
        Commands::Mute { .. } => "mute",
        Commands::Unmute { .. } => "unmute",
        Commands::Control { .. } => "control",
        Commands::Send { .. } => "send",
    }
}

fn set_mute<T: Transport, P: Pause>(
    device: &mut GroupSeries<T, P>,
    muted: bool,
    confirm: bool,
) -> RunnerResult<Value> {
    if confirm {
        let state = device.set_mute_confirmed(muted)?;
        return Ok(json!({
            "confirmed": state.is_some(),
            "muted": state.map(|s| s.is_muted()),
        }));
    }
    if muted {
        device.mute()?;
    } else {
        device.unmute()?;
    }
    Ok(json!({ "muted": muted }))
}

/// Run `command` and wrap its result in a [`Report`].
pub fn execute<T: Transport, P: Pause>(
    device: &mut GroupSeries<T, P>,
    command: &Commands,
) -> RunnerResult<Report<Value>> {
    let result = match command {
        Commands::Stats => serde_json::to_value(device.statistics()?)?,
        Commands::Dial {
            address,
            speed,
            protocol,
        } => {
            let target = DialTarget {
                dial_string: address.clone(),
                call_speed: *speed,
                protocol: *protocol,
            };
            let call_id = device.dial(&target)?;
            json!({ "connected": call_id.is_some(), "call_id": call_id })
        }
        Commands::Hangup { call_id } => {
            device.hangup(call_id.as_deref())?;
            json!({ "call_id": call_id })
        }
        Commands::CallStatus { call_id } => {
            serde_json::to_value(device.retrieve_call_status(call_id.as_deref())?)?
        }
        Commands::Mute { confirm } => set_mute(device, true, *confirm)?,
        Commands::Unmute { confirm } => set_mute(device, false, *confirm)?,
        Commands::Control { properties } => {
            device.control_properties(properties)?;
            json!({ "applied": properties.len() })
        }
        Commands::Send { command } => {
            let line = command.join(" ");
            info!("sending raw command '{}'", line);
            let response = device.send(&line)?;
            json!({ "command": line, "response": response })
        }
    };
    Ok(Report::new(device.host(), operation(command), result))
}

#[cfg(test)]
mod tests {
    use super::*;
    use groupseries_agent::{ControllableProperty, ScriptedTransport};

    #[test]
    fn test_call_status_report() {
        let transport = ScriptedTransport::new()
            .respond("callinfo all", "callinfo all\r\r\nsystem is not in a call\r\r\n");
        let mut device = GroupSeries::new("10.0.0.5", transport);

        let report = execute(&mut device, &Commands::CallStatus { call_id: None }).unwrap();
        assert_eq!(report.operation, "call-status");
        assert_eq!(report.result["state"], "disconnected");
    }

    #[test]
    fn test_control_report() {
        let transport = ScriptedTransport::new().respond("volume 12", "volume 12\r\r\n");
        let mut device = GroupSeries::new("10.0.0.5", transport);

        let command = Commands::Control {
            properties: vec![ControllableProperty::new("Audio#Volume", "12.5")],
        };
        let report = execute(&mut device, &command).unwrap();
        assert_eq!(report.result["applied"], 1);
    }

    #[test]
    fn test_send_report() {
        let transport = ScriptedTransport::new().respond("volume get", "volume get\r\r\nvolume 12\r\r\n");
        let mut device = GroupSeries::new("10.0.0.5", transport);

        let command = Commands::Send {
            command: vec!["volume".to_string(), "get".to_string()],
        };
        let report = execute(&mut device, &command).unwrap();
        assert_eq!(report.host, "10.0.0.5");
        assert!(report.result["response"].as_str().unwrap().contains("volume 12"));
    }

    #[test]
    fn test_agent_errors_propagate() {
        let mut device = GroupSeries::new("10.0.0.5", ScriptedTransport::new());
        assert!(execute(&mut device, &Commands::Hangup { call_id: None }).is_err());
    }
}
